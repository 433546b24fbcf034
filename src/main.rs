use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use authors_haven::config::Config;
use authors_haven::http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // This returns an error if the `.env` file doesn't exist, but that's not what we want
    // since we're not going to use a `.env` file if we deploy this application.
    dotenvy::dotenv().ok();

    // Initialize the logger.
    env_logger::init();

    // Parse our configuration from the environment.
    // This will exit with a help message if something is wrong.
    let config = Config::parse();

    // A single connection pool for SQLx that's shared across the whole application.
    let db = PgPoolOptions::new()
        .max_connections(50)
        .connect(&config.database_url)
        .await
        .context("could not connect to database_url")?;

    // The migrations are embedded in the binary at compile time.
    sqlx::migrate!()
        .run(&db)
        .await
        .context("failed to run database migrations")?;

    // Finally, we spin up our API.
    http::serve(config, db).await?;

    Ok(())
}
