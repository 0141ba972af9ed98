// Timer: fires once per settlement cycle boundary (default 00:00:00 UTC)
// - runs the ROI accrual pass over every active investment; catch-up after
//   downtime is handled by the pass itself, not by the timer
use chrono::Utc;
use cron::Schedule;
use server::services::{accrual_service::AccrualServiceTrait, Services};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::{task, time::sleep_until};
use tracing::{error, info};

#[derive(Clone)]
pub struct SettlementTimer {
    pub cron: String,
    pub services: Services,
}

impl SettlementTimer {
    // "0 0 0 * * *": every day at 00:00:00 UTC
    pub fn new(cron: Option<String>, services: Services) -> Self {
        match cron {
            Some(cron) => SettlementTimer { cron, services },
            None => SettlementTimer {
                cron: "0 0 0 * * *".to_string(),
                services,
            },
        }
    }

    pub async fn run(self: Arc<Self>) {
        info!("⏳ settlement timer armed: {}", self.cron);

        let schedule = match Schedule::from_str(&self.cron) {
            Ok(schedule) => schedule,
            Err(e) => {
                error!("🔴 invalid settlement cron {:?}: {}", self.cron, e);
                return;
            }
        };

        loop {
            let now = Utc::now();
            let Some(next_run_time) = schedule.upcoming(Utc).next() else {
                break;
            };

            let duration_until_next_run = (next_run_time - now).to_std().unwrap_or(Duration::from_secs(0));

            sleep_until(tokio::time::Instant::now() + duration_until_next_run).await;

            let this = Arc::clone(&self);
            task::spawn(async move {
                this.settle().await;
            })
            .await
            .ok();
        }
    }

    async fn settle(&self) {
        match self.services.accrual.settle_due_investments().await {
            Ok(report) => info!(
                "✅ settlement pass done: {}/{} settled, {} completed, {} failed",
                report.settled, report.scanned, report.completed, report.failed
            ),
            // the next firing retries from persisted state
            Err(e) => error!("🔴 settlement pass failed: {}", e),
        }
    }
}
