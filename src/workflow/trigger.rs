//! Target date selection for a run

use chrono::NaiveDate;
use mtdigest_core::{Error, Result, RunTrigger, TargetDate};
use tracing::{info, warn};

/// Pick the target date for this run.
///
/// Manual input is used verbatim. A value that is not `YYYY-MM-DD` is
/// passed through with a warning, or rejected when `strict` is set.
pub fn resolve_target_date(
    trigger: &RunTrigger,
    today: NaiveDate,
    offset_days: i64,
    strict: bool,
) -> Result<TargetDate> {
    let target = TargetDate::resolve(trigger, today, offset_days)?;

    if trigger.explicit_date().is_some() && !target.is_well_formed() {
        if strict {
            return Err(Error::invalid_date(target.as_str()));
        }
        warn!("Manual date {:?} is not YYYY-MM-DD; passing it through unchanged", target.as_str());
    }

    info!("Trigger: {}, target date: {}", trigger, target);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn lenient_passes_malformed_through() {
        let t = RunTrigger::manual(Some("03/01/2024".into()));
        let target = resolve_target_date(&t, today(), 4, false).unwrap();
        assert_eq!(target.as_str(), "03/01/2024");
    }

    #[test]
    fn strict_rejects_malformed() {
        let t = RunTrigger::manual(Some("03/01/2024".into()));
        let err = resolve_target_date(&t, today(), 4, true).unwrap_err();
        assert!(matches!(err, Error::InvalidDate { ref input } if input == "03/01/2024"));
    }

    #[test]
    fn strict_rejects_space_padded_date() {
        for input in [" 2024-3-01", "2024-3- 01"] {
            let t = RunTrigger::manual(Some(input.into()));
            let err = resolve_target_date(&t, today(), 4, true).unwrap_err();
            assert!(matches!(err, Error::InvalidDate { input: ref i } if i == input));
        }
    }

    #[test]
    fn huge_offset_is_config_error() {
        let err = resolve_target_date(&RunTrigger::Scheduled, today(), 1_000_000_000, false).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn strict_accepts_valid_and_computed_dates() {
        let t = RunTrigger::manual(Some("2024-03-01".into()));
        assert_eq!(resolve_target_date(&t, today(), 4, true).unwrap().as_str(), "2024-03-01");
        let s = resolve_target_date(&RunTrigger::Scheduled, today(), 4, true).unwrap();
        assert_eq!(s.as_str(), "2024-03-06");
    }
}
