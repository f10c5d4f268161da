//! One-shot daily stats aggregation

use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmStatsService, StatsService};

pub async fn cmd_aggregate(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    let snapshot = SeaOrmStatsService::new(store).aggregate_today().await?;

    println!("Daily stats for {}", snapshot.date);
    println!("{:-<40}", "");
    println!("  Total:       {}", snapshot.total_issues);
    println!("  Open:        {}", snapshot.open_issues);
    println!("  Triaged:     {}", snapshot.triaged_issues);
    println!("  In progress: {}", snapshot.in_progress_issues);
    println!("  Done:        {}", snapshot.done_issues);
    println!(
        "  Severity:    {} critical, {} high, {} medium, {} low",
        snapshot.critical_count, snapshot.high_count, snapshot.medium_count, snapshot.low_count
    );

    Ok(())
}
