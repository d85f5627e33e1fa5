use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for the parts of a rendered post and the command outcomes around it
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub field: Style,
    pub timestamp: Style,
    pub done: Style,
    pub notice: Style,
}

impl Theme {
    /// Colors only on a color-capable terminal, and never when `NO_COLOR` is set
    pub fn detect() -> Self {
        let term = console::Term::stdout();
        if std::env::var_os("NO_COLOR").is_some() || !term.is_term() || !term.features().colors_supported() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            field: Style::new().white().dimmed(),
            timestamp: Style::new().blue(),
            done: Style::new().green().bold(),
            notice: Style::new().yellow(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            title: none,
            field: none,
            timestamp: none,
            done: none,
            notice: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
