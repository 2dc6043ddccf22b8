use crate::selection::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Focusable areas of the screen, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Selector(Level),
    Grid,
}

impl Default for Pane {
    fn default() -> Self {
        Pane::Selector(Level::Role)
    }
}

impl Pane {
    pub const ORDER: [Pane; 5] = [
        Pane::Selector(Level::Role),
        Pane::Selector(Level::Database),
        Pane::Selector(Level::Schema),
        Pane::Selector(Level::Table),
        Pane::Grid,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Pane {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Pane {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}
