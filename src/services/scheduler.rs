use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::StatsService;

const STATS_JOB: &str = "aggregate_daily_stats";

pub struct Scheduler {
    stats: Arc<dyn StatsService>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(stats: Arc<dyn StatsService>, config: SchedulerConfig) -> Self {
        Self {
            stats,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let stats = Arc::clone(&stats);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_stats_job(stats.as_ref()).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.stats_interval_minutes.max(1);

        info!("Scheduler running: daily stats every {}m", interval_mins);

        let mut stats_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            stats_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            run_stats_job(self.stats.as_ref()).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs the stats job once, returning its error instead of logging it.
    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual stats aggregation...");
        self.stats.aggregate_today().await?;
        Ok(())
    }
}

async fn run_stats_job(stats: &dyn StatsService) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = STATS_JOB, "Starting daily stats aggregation");

    if let Err(e) = stats.aggregate_today().await {
        error!(event = "job_failed", job_name = STATS_JOB, error = %e, "Daily stats aggregation failed");
        return;
    }

    info!(
        event = "job_finished",
        job_name = STATS_JOB,
        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Daily stats aggregation finished"
    );
}
