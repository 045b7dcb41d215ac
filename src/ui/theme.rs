use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles keyed by what the CLI reports, not by color
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub created: Style,
    pub unchanged: Style,
    pub failure: Style,
    pub caution: Style,
    pub label: Style,
}

impl Theme {
    /// Colors only when both output streams are terminals
    pub fn detect() -> Self {
        let tty = console::Term::stdout().is_term() && console::Term::stderr().is_term();
        if tty { Self::colored() } else { Self::plain() }
    }

    pub fn colored() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            created: Style::new().green().bold(),
            unchanged: Style::new().bright_black(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow(),
            label: Style::new().white().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            heading: Style::new(),
            created: Style::new(),
            unchanged: Style::new(),
            failure: Style::new(),
            caution: Style::new(),
            label: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
