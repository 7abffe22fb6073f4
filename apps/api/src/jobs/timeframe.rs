use chrono::{DateTime, Duration, Utc};

/// Window on match-result creation time used by job lists and dashboard
/// statistics: `all`, `<n>d` or `48h`. Anything unrecognised means `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    All,
    Days(u32),
    Hours(u32),
}

impl Timeframe {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "48h" {
            return Timeframe::Hours(48);
        }
        raw.strip_suffix('d')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(Timeframe::Days)
            .unwrap_or(Timeframe::All)
    }

    pub fn from_query(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Lower bound on `created_at`, or `None` for no filter.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = match self {
            Timeframe::All => return None,
            Timeframe::Days(days) => Duration::days(i64::from(*days)),
            Timeframe::Hours(hours) => Duration::hours(i64::from(*hours)),
        };
        now.checked_sub_signed(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_variants() {
        assert_eq!(Timeframe::parse("all"), Timeframe::All);
        assert_eq!(Timeframe::parse("7d"), Timeframe::Days(7));
        assert_eq!(Timeframe::parse("30d"), Timeframe::Days(30));
        assert_eq!(Timeframe::parse("48h"), Timeframe::Hours(48));
    }

    #[test]
    fn test_unrecognised_means_all() {
        for raw in ["", "d", "-3d", "7 days", "12h", "1.5d"] {
            assert_eq!(Timeframe::parse(raw), Timeframe::All, "input {raw:?}");
        }
        assert_eq!(Timeframe::from_query(None), Timeframe::All);
    }

    #[test]
    fn test_since() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        assert_eq!(Timeframe::All.since(now), None);
        assert_eq!(
            Timeframe::Days(2).since(now),
            Some(Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap())
        );
        assert_eq!(
            Timeframe::Hours(48).since(now),
            Some(Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_absurd_window_does_not_panic() {
        assert_eq!(Timeframe::Days(u32::MAX).since(Utc::now()), None);
    }
}
