//! Repeat cadences and next-occurrence computation.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a reminder repeats after firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    /// A fixed 30-day period, not a calendar month. Callers must not
    /// assume "same day next month" semantics.
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown repeat kind: {0}")]
pub struct ParseRepeatError(String);

impl Repeat {
    pub fn as_str(self) -> &'static str {
        match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        }
    }

    /// Compute when the successor of a fired reminder comes due, or `None`
    /// for one-shot reminders.
    ///
    /// `fired_at` is the instant the dispatcher observed the reminder as
    /// due, not the stored `due_at`, so polling latency drifts the schedule
    /// forward instead of causing an immediate re-fire.
    pub fn next_occurrence(self, fired_at: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        match self {
            Repeat::None => None,
            Repeat::Daily => Some(fired_at + Duration::days(1)),
            Repeat::Weekly => Some(fired_at + Duration::days(7)),
            Repeat::Monthly => Some(fired_at + Duration::days(30)),
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Repeat {
    type Err = ParseRepeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Repeat::None),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            "monthly" => Ok(Repeat::Monthly),
            other => Err(ParseRepeatError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn fired_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 8, 30, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_none_has_no_successor() {
        assert_eq!(Repeat::None.next_occurrence(fired_at()), None);
    }

    #[test]
    fn test_daily_adds_one_day() {
        let next = Repeat::Daily.next_occurrence(fired_at()).unwrap();
        assert_eq!(next - fired_at(), Duration::days(1));
    }

    #[test]
    fn test_weekly_adds_seven_days() {
        let next = Repeat::Weekly.next_occurrence(fired_at()).unwrap();
        assert_eq!(next - fired_at(), Duration::days(7));
    }

    #[test]
    fn test_monthly_is_a_fixed_thirty_days() {
        let next = Repeat::Monthly.next_occurrence(fired_at()).unwrap();
        assert_eq!(next - fired_at(), Duration::days(30));
        // 2026-08-30 + 30d lands on 2026-09-29, not "the 30th next month".
        assert_eq!(next.format("%Y-%m-%d").to_string(), "2026-09-29");
    }

    #[test]
    fn test_successor_keeps_the_offset() {
        let next = Repeat::Daily.next_occurrence(fired_at()).unwrap();
        assert_eq!(next.offset(), fired_at().offset());
    }

    #[test]
    fn test_round_trips_through_str() {
        for repeat in [Repeat::None, Repeat::Daily, Repeat::Weekly, Repeat::Monthly] {
            assert_eq!(repeat.as_str().parse::<Repeat>().unwrap(), repeat);
        }
        assert!("hourly".parse::<Repeat>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Repeat::Weekly).unwrap(), "\"weekly\"");
        let parsed: Repeat = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(parsed, Repeat::None);
    }
}
