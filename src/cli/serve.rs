//! Handler for the `serve` command.

use tokio::signal;
use tracing::info;

use super::ServeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::mock::{load_stubs, MockServerBuilder};

/// Load settings, start the mock server and run until ctrl-c.
///
/// # Errors
///
/// Returns an error for an unreadable config or stub file, an invalid bind
/// address, or a failure to bind.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);
    config.init_logging();

    let stubs = match &config.server.stubs {
        Some(path) => {
            let stubs = load_stubs(path)?;
            info!(path = %path.display(), count = stubs.len(), "Stubs loaded");
            stubs
        }
        None => Vec::new(),
    };

    let server = MockServerBuilder::from_config(&config.server)?
        .stubs(stubs)
        .start()
        .await?;

    println!("{}", server.uri());
    info!(uri = %server.uri(), "Serving; press ctrl-c to stop");

    signal::ctrl_c().await?;
    info!("Shutdown signal received");
    server.stop().await
}

fn apply_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(bind) = &args.bind {
        config.server.bind.clone_from(bind);
    }
    if let Some(stubs) = &args.stubs {
        config.server.stubs = Some(stubs.clone());
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }
}
