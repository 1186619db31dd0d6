use anyhow::Context;
use clap::Parser;

use arbor::{config::AppConfig, engine::Engine};

fn main() -> anyhow::Result<()> {
    log4rs::init_file("log4rs.yml", Default::default())
        .context("failed to load logging config file")?;

    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::layer::SubscriberExt;

        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(tracing_tracy::TracyLayer::default()),
        )
        .context("failed to install tracy subscriber")?;
    }

    let config = AppConfig::parse();
    log::info!("starting with {}", config);

    let mut engine = Engine::new(&config).context("failed to start engine")?;
    engine.wait();
    engine.shutdown()?;

    Ok(())
}
