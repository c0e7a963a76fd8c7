#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod cli;
pub mod domain;
pub mod handlers;
pub mod procedures;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    system::tracing::initialize()?;

    let config = shared::config::load_config(cli.config.as_deref())?;
    let db_path = shared::config::get_database_path(&config)?;
    shared::data::db::initialize_database(&db_path).await?;

    cli::run(cli.command, config).await
}
