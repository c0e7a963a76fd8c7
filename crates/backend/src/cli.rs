use clap::{Parser, Subcommand};
use contracts::domain::a001_jd_account::aggregate::JdAccountDto;
use contracts::usecases::u501_sync_from_jd::request::{SyncRequest, SyncTarget};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::a001_jd_account;
use crate::handlers::json_rpc::RpcState;
use crate::procedures::{ProcedureContext, Registry};
use crate::shared::config::Config;
use crate::shared::jd_cloud::{Client, OAuthClient};
use crate::usecases::u501_sync_from_jd::SyncExecutor;
use crate::usecases::u502_refresh_tokens::RefreshTokensExecutor;

#[derive(Debug, Parser)]
#[command(name = "jd-trade", version, about = "JD Cloud Trade integration backend")]
pub struct Cli {
    /// Path to config.toml (default: next to the executable)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the JSON-RPC server
    Serve,
    /// Pull data from JD into the local database
    Sync {
        /// skus | details | prices | stocks | categories | orders | all
        target: SyncScope,
        /// Only this account id
        #[arg(long)]
        account: Option<String>,
        /// Ignore the freshness window
        #[arg(long)]
        force: bool,
        /// Override the freshness window (hours)
        #[arg(long)]
        fresh_hours: Option<i64>,
    },
    /// Refresh OAuth access tokens that are about to expire
    RefreshTokens {
        #[arg(long)]
        force: bool,
    },
    /// Manage JD accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        app_key: String,
        #[arg(long)]
        app_secret: String,
        #[arg(long)]
        code: Option<String>,
    },
    List,
}

/// Цель синхронизации из командной строки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    All,
    One(SyncTarget),
}

impl SyncScope {
    pub fn targets(&self) -> Vec<SyncTarget> {
        match self {
            Self::All => SyncTarget::ALL.to_vec(),
            Self::One(target) => vec![*target],
        }
    }
}

impl FromStr for SyncScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::One)
    }
}

pub async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Serve => serve(config).await,
        Command::Sync {
            target,
            account,
            force,
            fresh_hours,
        } => sync(config, target, account, force, fresh_hours).await,
        Command::RefreshTokens { force } => refresh_tokens(config, force).await,
        Command::Account { action } => account(config, action).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(RpcState {
        registry: Registry::with_default_groups(),
        ctx: ProcedureContext::new(&config)?,
    });
    tracing::info!("{} JSON-RPC procedures registered", state.registry.methods().len());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = crate::routes::configure_routes(state).layer(cors);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server.bind {}: {}", config.server.bind, e))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("JSON-RPC server listening on http://{}/json-rpc", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn sync(
    config: Config,
    scope: SyncScope,
    account: Option<String>,
    force: bool,
    fresh_hours: Option<i64>,
) -> anyhow::Result<()> {
    let client = Arc::new(Client::new(&config.jd)?);
    let executor = SyncExecutor::new(client, config.sync.clone());

    for target in scope.targets() {
        let request = SyncRequest {
            target,
            account_id: account.clone(),
            force,
            fresh_hours,
        };
        let report = executor.run(&request).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.has_errors() {
            tracing::warn!("Sync '{}' finished with {} error(s)", target, report.errors.len());
        }
    }
    Ok(())
}

async fn refresh_tokens(config: Config, force: bool) -> anyhow::Result<()> {
    let executor = RefreshTokensExecutor::new(
        OAuthClient::new(&config.jd)?,
        config.sync.token_refresh_before_hours,
    );
    let report = executor.run(force).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn account(config: Config, action: AccountCommand) -> anyhow::Result<()> {
    match action {
        AccountCommand::Add {
            name,
            app_key,
            app_secret,
            code,
        } => {
            let dto = JdAccountDto {
                id: None,
                code,
                description: name,
                comment: None,
                app_key: app_key.clone(),
                app_secret: Some(app_secret),
                is_valid: true,
            };
            let id = a001_jd_account::service::create(dto).await?;
            let oauth = OAuthClient::new(&config.jd)?;
            println!("Account created: {}", id);
            println!("Authorize it at: {}", oauth.authorize_url(&app_key, &id.to_string()));
        }
        AccountCommand::List => {
            let accounts = a001_jd_account::service::list_all().await?;
            println!("{:<38} {:<14} {:<24} {:<6} token expires", "id", "code", "name", "valid");
            for a in accounts {
                println!(
                    "{:<38} {:<14} {:<24} {:<6} {}",
                    a.to_string_id(),
                    a.base.code,
                    a.base.description,
                    a.is_valid,
                    a.access_token_expires_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".into())
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from([
            "jd-trade", "sync", "prices", "--force", "--fresh-hours", "3", "--config", "/etc/jd.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/jd.toml")));
        match cli.command {
            Command::Sync {
                target,
                force,
                fresh_hours,
                account,
            } => {
                assert_eq!(target, SyncScope::One(SyncTarget::Prices));
                assert!(force);
                assert_eq!(fresh_hours, Some(3));
                assert!(account.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_sync_scope() {
        assert_eq!("all".parse::<SyncScope>().unwrap().targets().len(), 6);
        assert!(Cli::try_parse_from(["jd-trade", "sync", "everything"]).is_err());
    }
}
