use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::app::App;
use crate::ui;

/// How often the screen is redrawn while no key arrives, so notices expire.
const TICK: Duration = Duration::from_millis(250);

pub struct Runner<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    app: App,
}

impl<'a, B: Backend> Runner<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, app: App) -> Self {
        Self { terminal, app }
    }

    /// Draws and handles keys until the user quits, then returns the app so
    /// the caller can close its session.
    pub async fn run(mut self) -> Result<App, io::Error> {
        loop {
            self.tick().await?;

            if self.app.should_quit {
                return Ok(self.app);
            }
        }
    }

    async fn tick(&mut self) -> Result<(), io::Error> {
        self.terminal.draw(|frame| ui::render(frame, &self.app))?;

        if !event::poll(TICK)? {
            return Ok(());
        }
        match event::read()? {
            // Every action runs to completion before the next key is read.
            Event::Key(key) => self.app.handle_key(key).await,
            Event::Resize(_, _) => self.terminal.autoresize()?,
            _ => {}
        }
        Ok(())
    }
}
