//! Raw-mode lifecycle for the interactive shell.
//!
//! The screen is put back exactly once, whether the shell exits normally or a
//! panic unwinds through it, so a crash never leaves the user's terminal in
//! raw mode.

use std::io::{self, Stdout};
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::logging;

pub type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Set while raw mode and the alternate screen are active.
static SCREEN_TAKEN: AtomicBool = AtomicBool::new(false);

/// Writes the panic to the log, gives the screen back, then lets the default
/// hook print to the restored terminal.
pub fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        logging::error(&describe_panic(info));
        if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v != "0") {
            logging::error(&format!(
                "Backtrace:\n{}",
                std::backtrace::Backtrace::force_capture()
            ));
        }
        release_screen();
        default_hook(info);
    }));
}

fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    match info.location() {
        Some(at) => format!("Panic at {}:{}: {}", at.file(), at.line(), message),
        None => format!("Panic: {}", message),
    }
}

/// Leaves the alternate screen and raw mode if this process entered them.
fn release_screen() {
    if !SCREEN_TAKEN.swap(false, Ordering::SeqCst) {
        return;
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
        logging::warn(&format!("Could not leave the alternate screen: {}", err));
    }
    if let Err(err) = disable_raw_mode() {
        logging::warn(&format!("Could not disable raw mode: {}", err));
    }
}

/// Owns the screen for as long as it lives.
pub struct TerminalSession {
    terminal: AppTerminal,
}

impl TerminalSession {
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        SCREEN_TAKEN.store(true, Ordering::SeqCst);

        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            release_screen();
            return Err(err).context("Failed to enter alternate screen");
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                release_screen();
                return Err(err).context("Failed to create terminal");
            }
        };
        logging::debug("Terminal in raw mode on the alternate screen");
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut AppTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        release_screen();
        if let Err(err) = self.terminal.show_cursor() {
            logging::warn(&format!("Could not show the cursor: {}", err));
        }
        logging::debug("Terminal restored");
    }
}
