//! Cron-driven scheduler loop

use chrono::{DateTime, Utc};
use cron::Schedule;
use mtdigest_core::{today_utc, Error, Result, RunTrigger};
use tracing::{error, info};

use super::pipeline::Pipeline;

/// Convert a 5-field cron expression to the 7-field format the `cron` crate expects.
///
/// Standard cron: `min hour day month weekday`
/// Cron crate:    `sec min hour day month weekday year`
fn normalize_cron_expression(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => format!("0 {expr} *"),
        6 => format!("0 {expr}"),
        _ => expr.to_string(),
    }
}

pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    normalize_cron_expression(expr)
        .parse()
        .map_err(|e| Error::ConfigError(format!("invalid cron expression '{expr}': {e}")))
}

/// The first tick strictly after `now`.
pub fn next_fire(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Fire the pipeline on every tick of `schedule` (UTC), forever.
///
/// Each run finishes before the next tick is computed, so runs never
/// overlap. A failed run is logged and the loop carries on.
pub async fn run_schedule(pipeline: Pipeline, schedule: Schedule) -> Result<()> {
    info!("Scheduler started: {}", schedule);

    loop {
        let now = Utc::now();
        let fire = next_fire(&schedule, now)
            .ok_or_else(|| Error::ConfigError("cron schedule has no upcoming occurrences".into()))?;
        let wait = (fire - now).to_std().unwrap_or_default();
        info!("Next run at {}", fire.format("%Y-%m-%dT%H:%M:%SZ"));
        tokio::time::sleep(wait).await;

        match pipeline.run(RunTrigger::Scheduled, today_utc()).await {
            Ok(report) => info!(
                "Scheduled run for {} complete: {}",
                report.target_date,
                serde_json::to_string(&report).unwrap_or_default()
            ),
            Err(e) => error!("Scheduled run failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn daily() -> Schedule {
        parse_schedule("20 6 * * *").unwrap()
    }

    #[test]
    fn normalizes_five_and_six_fields() {
        assert_eq!(normalize_cron_expression("20 6 * * *"), "0 20 6 * * * *");
        assert_eq!(normalize_cron_expression("20 6 * * * 2030"), "0 20 6 * * * 2030");
        assert_eq!(normalize_cron_expression("0 20 6 * * * *"), "0 20 6 * * * *");
    }

    #[test]
    fn fires_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        assert_eq!(next_fire(&daily(), now), Some(Utc.with_ymd_and_hms(2024, 3, 10, 6, 20, 0).unwrap()));
    }

    #[test]
    fn fires_tomorrow_when_past() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap();
        assert_eq!(next_fire(&daily(), now), Some(Utc.with_ymd_and_hms(2024, 3, 11, 6, 20, 0).unwrap()));
    }

    #[test]
    fn exact_fire_time_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 2, 28, 6, 20, 0).unwrap();
        assert_eq!(next_fire(&daily(), now), Some(Utc.with_ymd_and_hms(2024, 2, 29, 6, 20, 0).unwrap()));
    }

    #[test]
    fn invalid_expression_is_config_error() {
        let err = parse_schedule("every morning").unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref m) if m.contains("every morning")));
    }
}
