use std::{net::TcpListener, time::Duration};

use anyhow::Context;
use env_logger::Env;
use mapscout::{
    configuration::get_configuration, dal::establishment_db::PgStore, services::Monitor,
    startup::run,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let pool_options = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .context("Failed to run database migrations.")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on {}", address);

    let monitor = Monitor::new(
        configuration.collector.executable(),
        configuration.collector.results_path.clone(),
    );
    let store = PgStore::new(connection_pool);

    run(
        listener,
        monitor,
        store,
        &configuration.application.static_dir,
    )?
    .await?;

    Ok(())
}
