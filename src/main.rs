//! Modelreg CLI - Command-line interface for the model registry

use clap::{Parser, Subcommand};
use modelreg::config::{self, RegistryConfig};
use modelreg::request::{
    self, AddEventRequest, AddModelRequest, AddModelVersionRequest, AddRoleRequest,
    AddTaskRequest, AddUserLogRequest, AddUserRequest, ErrorResponse, GetModelRequest,
    GetUserRequest, Request, Response,
};
use modelreg::storage::RegistryStore;
use modelreg::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "modelreg")]
#[command(version)]
#[command(about = "Model registry - roles, users, tasks, models and versions on SQLite")]
#[command(long_about = r#"
Modelreg keeps the bookkeeping for a model-serving API:
  • Roles and users
  • Tasks, models and model versions
  • Events and a per-user activity log

Example usage:
  modelreg add-role admin
  modelreg add-user alice admin
  modelreg add-task cv
  modelreg add-model resnet cv
  modelreg add-version resnet v1 alice
  modelreg model resnet v1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides modelreg.toml)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write modelreg.toml and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Add a role
    AddRole { name: String },

    /// Add a task
    AddTask { name: String },

    /// Add an event kind
    AddEvent { name: String },

    /// Add a user with an existing role
    AddUser { username: String, role: String },

    /// Add a model for an existing task
    AddModel { model: String, task: String },

    /// Add a version to an existing model
    AddVersion {
        model: String,
        version: String,
        /// Username of the version's creator
        creator: String,
    },

    /// Record an event for a user
    Log { username: String, event: String },

    /// Show a user and its role
    User { username: String },

    /// Show a model version and its task
    Model { model: String, version: String },

    /// Show row counts for every table
    Stats,

    /// Serve the registry over HTTP
    Serve {
        /// Address to bind (overrides modelreg.toml)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides modelreg.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Commands {
    /// Map a one-shot command onto its typed request
    fn into_request(self) -> Option<Request> {
        let req = match self {
            Commands::AddRole { name } => Request::AddRole(AddRoleRequest { name }),
            Commands::AddTask { name } => Request::AddTask(AddTaskRequest { name }),
            Commands::AddEvent { name } => Request::AddEvent(AddEventRequest { name }),
            Commands::AddUser { username, role } => Request::AddUser(AddUserRequest { username, role }),
            Commands::AddModel { model, task } => Request::AddModel(AddModelRequest { model, task }),
            Commands::AddVersion { model, version, creator } => {
                Request::AddModelVersion(AddModelVersionRequest { model, version, creator })
            }
            Commands::Log { username, event } => Request::AddUserLog(AddUserLogRequest { username, event }),
            Commands::User { username } => Request::GetUser(GetUserRequest { username }),
            Commands::Model { model, version } => Request::GetModel(GetModelRequest { model, version }),
            Commands::Stats => Request::Stats,
            Commands::Init { .. } | Commands::Serve { .. } => return None,
        };
        Some(req)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(Some(&config_path))?.unwrap_or_default();
    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| cfg.database_path_in(Path::new(".")));

    match cli.command {
        Commands::Init { force } => {
            let new_cfg = RegistryConfig {
                database: Some(db_path.to_string_lossy().to_string()),
                ..cfg.clone()
            };
            config::write_config(&config_path, &new_cfg, force)?;
            config::ensure_db_dir(&db_path)?;
            let store = RegistryStore::open_with_timeout(&db_path, cfg.busy_timeout())?;
            store.close()?;

            ui::success(&format!("Initialized registry at {}", db_path.display()));
            ui::info("Config", &config_path.display().to_string());
        }

        Commands::Serve { bind, port } => {
            let serve_cfg = RegistryConfig {
                bind: bind.or(cfg.bind.clone()),
                port: port.or(cfg.port),
                ..cfg.clone()
            };
            config::ensure_db_dir(&db_path)?;
            let store = Arc::new(RegistryStore::open_with_timeout(&db_path, cfg.busy_timeout())?);

            ui::header(&format!("Serving {} on http://{}", db_path.display(), serve_cfg.bind_addr()));
            if serve_cfg.bind_addr().starts_with("0.0.0.0") {
                ui::warn("Listening on all interfaces; the registry has no authentication");
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(modelreg::server::start_server(&serve_cfg.bind_addr(), store))?;
        }

        command => {
            let Some(req) = command.into_request() else {
                return Ok(());
            };
            config::ensure_db_dir(&db_path)?;
            let store = RegistryStore::open_with_timeout(&db_path, cfg.busy_timeout())?;

            let result = request::dispatch(&store, req);
            store.close()?;

            match result {
                Ok(response) => print_response(&response, cli.json)?,
                Err(e) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
                    } else {
                        ui::failure(&e);
                    }
                    std::process::exit(if e.is_not_found() { 2 } else { 1 });
                }
            }
        }
    }

    Ok(())
}

fn print_response(response: &Response, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    match response {
        Response::Added(added) => ui::added(added),
        Response::User(user) => ui::user_view(user),
        Response::Model(model) => ui::model_view(model),
        Response::Stats(stats) => {
            println!("{} Registry Statistics", ui::Icons::STATS);
            println!("{}", ui::stats_table(stats));
        }
    }
    Ok(())
}
