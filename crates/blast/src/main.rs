use anyhow::{Context, Result};
use clap::Parser;
use database::Database;
use server::{
    app::ApplicationServer,
    services::{member_service::MemberServiceTrait, Services},
};
use std::sync::Arc;
use timer::SettlementTimer;
use tokio::{signal, task::JoinSet};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use utils::{AppConfig, LedgerConfig, Logger};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let blast = Blast::new().await?;
    blast.run().await.context("🔴 Blast backend error")?;

    Ok(())
}

pub struct Blast {
    services: Services,
    timer: SettlementTimer,
    config: Arc<AppConfig>,
    _log_guard: WorkerGuard,
}

impl Blast {
    pub async fn new() -> Result<Self> {
        let config = Blast::with_config();
        let log_guard = Logger::new(config.cargo_env);
        let services = Blast::with_services(config.clone()).await?;
        let timer = Blast::with_timer(config.clone(), services.clone());

        Ok(Self {
            services,
            timer,
            config,
            _log_guard: log_guard,
        })
    }

    pub async fn run(self) -> Result<()> {
        // seed the sponsorless root member so the first referral link exists
        if let Some(telegram_id) = self.config.root_telegram_id {
            let root = self.services.member.ensure_root(telegram_id).await?;
            info!("🌱 root referral code: {}", root.public_id);
        }

        let mut set = JoinSet::new();

        // 1. start the settlement timer
        // 2. start api & services

        let timer = Arc::new(self.timer);
        set.spawn(async move {
            timer.run().await;
        });

        let config = self.config.clone();
        set.spawn(async move {
            if let Err(e) = ApplicationServer::serve(config).await {
                tracing::error!("🔴 server exited: {:?}", e);
            }
        });

        tokio::select! {
            _ = async {
                while set.join_next().await.is_some() {
                    info!("🔔 Task completed");
                }
            } => {},
            _ = shutdown_signal() => {
                info!("🔔 Shutdown signal received, stopping all tasks...");
            },
        }

        Ok(())
    }
}

impl Blast {
    fn with_config() -> Arc<AppConfig> {
        // pick the env file matching CARGO_ENV, then parse flags/env
        utils::EnvLoader::load_env_file().ok();
        Arc::new(AppConfig::parse())
    }

    async fn with_services(config: Arc<AppConfig>) -> Result<Services> {
        let ledger_config = Arc::new(LedgerConfig::from_app_config(&config)?);
        let mongodb = Database::new(config.clone()).await?;

        Ok(Services::new(mongodb, ledger_config))
    }

    fn with_timer(config: Arc<AppConfig>, services: Services) -> SettlementTimer {
        SettlementTimer::new(Some(config.settlement_cron.clone()), services)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("🔴 Failed to install Ctrl+C handler");
        info!("🔔 Ctrl+C received");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("🔴 Failed to install signal handler")
            .recv()
            .await;
        info!("🔔 Terminate signal received");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!("❌ Signal received, starting graceful shutdown...");
}
