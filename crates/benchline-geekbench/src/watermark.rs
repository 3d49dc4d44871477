//! Per-model upload-time watermark

use anyhow::{Result, bail};
use chrono::{NaiveDateTime, TimeDelta};

/// Lookback applied to models with no stored results
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Check a lookback setting: non-negative and representable as a duration.
pub fn validate_lookback(lookback_days: i64) -> Result<TimeDelta> {
    if lookback_days < 0 {
        bail!("lookback_days must not be negative (got {lookback_days})");
    }
    TimeDelta::try_days(lookback_days)
        .ok_or_else(|| anyhow::anyhow!("lookback_days out of range (got {lookback_days})"))
}

/// Effective watermark for one model: the latest stored upload time, or
/// `now - lookback_days` when nothing has been stored yet.
pub fn resolve(
    last: Option<NaiveDateTime>,
    now: NaiveDateTime,
    lookback_days: i64,
) -> Result<NaiveDateTime> {
    if let Some(last) = last {
        return Ok(last);
    }
    let lookback = validate_lookback(lookback_days)?;
    match now.checked_sub_signed(lookback) {
        Some(wm) => Ok(wm),
        None => bail!("lookback of {lookback_days} days reaches before the earliest date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, m, d)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn stored_time_wins() {
        assert_eq!(resolve(Some(at(1, 2)), at(6, 1), 30).unwrap(), at(1, 2));
    }

    #[test]
    fn empty_model_looks_back() {
        assert_eq!(
            resolve(None, at(3, 31), DEFAULT_LOOKBACK_DAYS).unwrap(),
            at(3, 1)
        );
    }

    #[test]
    fn zero_lookback_is_now() {
        assert_eq!(resolve(None, at(3, 31), 0).unwrap(), at(3, 31));
    }

    #[test]
    fn huge_lookback_is_an_error() {
        assert!(resolve(None, at(3, 31), i64::MAX / 1000).is_err());
        assert!(resolve(None, at(3, 31), 100_000_000).is_err());
    }

    #[test]
    fn negative_lookback_is_an_error() {
        let err = resolve(None, at(3, 31), -1).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }
}
