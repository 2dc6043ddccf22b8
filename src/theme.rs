use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Colors loaded from `themes/<name>.toml`. Every entry is optional and falls
/// back to a terminal default.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Theme {
    #[serde(default)]
    pub transparent_backgrounds: bool,

    // Backgrounds
    pub base: Option<[u8; 3]>,
    pub surface0: Option<[u8; 3]>,
    pub surface1: Option<[u8; 3]>,

    // Content
    pub text: Option<[u8; 3]>,
    pub subtext0: Option<[u8; 3]>,
    pub subtext1: Option<[u8; 3]>,

    // Accents
    pub mauve: Option<[u8; 3]>,
    pub red: Option<[u8; 3]>,
    pub peach: Option<[u8; 3]>,
    pub yellow: Option<[u8; 3]>,
    pub green: Option<[u8; 3]>,

    // Grid
    pub header_bg: Option<[u8; 3]>,
    pub header_fg: Option<[u8; 3]>,
    pub row_even_bg: Option<[u8; 3]>,
    pub row_odd_bg: Option<[u8; 3]>,
    pub changed_fg: Option<[u8; 3]>,
    pub null_fg: Option<[u8; 3]>,
}

impl Theme {
    fn color(&self, rgb: Option<[u8; 3]>, default: Color) -> Color {
        rgb.map_or(default, |[r, g, b]| Color::Rgb(r, g, b))
    }

    pub fn bg_color(&self, rgb: Option<[u8; 3]>) -> Color {
        if self.transparent_backgrounds {
            Color::Reset
        } else {
            self.color(rgb, Color::Reset)
        }
    }

    pub fn base_color(&self) -> Color {
        self.bg_color(self.base)
    }

    pub fn surface0_color(&self) -> Color {
        self.bg_color(self.surface0)
    }

    pub fn surface1_color(&self) -> Color {
        self.bg_color(self.surface1)
    }

    pub fn text_color(&self) -> Color {
        self.color(self.text, Color::White)
    }

    pub fn subtext0_color(&self) -> Color {
        self.color(self.subtext0, Color::Gray)
    }

    pub fn subtext1_color(&self) -> Color {
        self.color(self.subtext1, Color::DarkGray)
    }

    pub fn accent_color(&self) -> Color {
        self.color(self.mauve, Color::Cyan)
    }

    pub fn error_color(&self) -> Color {
        self.color(self.red, Color::Red)
    }

    pub fn warning_color(&self) -> Color {
        self.color(self.peach, Color::Yellow)
    }

    pub fn success_color(&self) -> Color {
        self.color(self.green, Color::Green)
    }

    pub fn header_bg_color(&self) -> Color {
        self.bg_color(self.header_bg)
    }

    pub fn header_fg_color(&self) -> Color {
        self.color(self.header_fg, Color::White)
    }

    pub fn row_even_bg_color(&self) -> Color {
        self.bg_color(self.row_even_bg)
    }

    pub fn row_odd_bg_color(&self) -> Color {
        self.bg_color(self.row_odd_bg)
    }

    /// Cells edited since the last load or save.
    pub fn changed_color(&self) -> Color {
        self.color(self.changed_fg.or(self.yellow), Color::Yellow)
    }

    pub fn null_color(&self) -> Color {
        self.color(self.null_fg, Color::DarkGray)
    }
}
