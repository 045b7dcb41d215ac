use crate::entity::{AddResult, ModelView, Outcome, UserView};
use crate::ui::{theme, Icons};
use crate::Error;
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().heading.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().created.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().caution.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("  {} {}", format!("{}:", label).style(theme().label.clone()), value);
}

/// Print the outcome of an `add_*` call
pub fn added(result: &AddResult) {
    match result.outcome {
        Outcome::Created => success(&result.message()),
        Outcome::AlreadyExists => {
            println!("{} {}", Icons::SKIP, result.message().style(theme().unchanged.clone()))
        }
    }
}

pub fn failure(err: &Error) {
    eprintln!(
        "{} {} {}",
        Icons::CROSS,
        format!("[{}]", err.code()).style(theme().label.clone()),
        err.to_string().style(theme().failure.clone())
    );
}

pub fn user_view(user: &UserView) {
    println!("{} {}", Icons::PERSON, user.username.style(theme().heading.clone()));
    info("Role", &user.role);
}

pub fn model_view(model: &ModelView) {
    println!("{} {}", Icons::PACKAGE, model.model.style(theme().heading.clone()));
    info("Task", &model.task);
    info("Version", &model.version);
}
