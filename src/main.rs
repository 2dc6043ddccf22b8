use anyhow::{Context, Result};

use lazyedit::app::App;
use lazyedit::config::Config;
use lazyedit::database;
use lazyedit::logging;
use lazyedit::runtime::Runner;
use lazyedit::session::SessionContext;
use lazyedit::terminal::{self, TerminalSession};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init_logger().context("Failed to initialize logger")?;
    logging::info("Starting LazyEdit");
    terminal::install_panic_hook();

    let config = Config::load().context("Failed to load configuration")?;
    let wanted = std::env::args().nth(1);
    let connection = config.pick_connection(wanted.as_deref())?;
    let connection_name = connection.name.clone();

    let session = database::open_session(connection)
        .await
        .with_context(|| format!("Failed to connect to {}", connection_name))?;
    let session = SessionContext::attach(session, config.catalog.clone())
        .await
        .context("Failed to read the session role")?;

    let app = App::new(config, connection_name, session).await;

    let mut terminal_session = TerminalSession::new()?;
    let res = Runner::new(terminal_session.terminal_mut(), app).run().await;
    drop(terminal_session);

    let app = match res {
        Ok(app) => app,
        Err(err) => {
            logging::error(&format!("Application error: {}", err));
            return Err(anyhow::Error::new(err).context(format!("See {}", log_path.display())));
        }
    };

    if let Err(err) = app.into_session().close().await {
        logging::warn(&format!("Error closing session: {}", err));
    }

    logging::info("Application terminated successfully");
    Ok(())
}
