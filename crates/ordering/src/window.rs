//! Daily ordering window configuration.
//!
//! The window is stored externally as two `HH:MM` strings under
//! [`START_KEY`] and [`END_KEY`]. Reads go through
//! [`WindowConfig::from_settings`], which never fails: absent or malformed
//! values are replaced by the built-in defaults. Administrator input goes
//! through the strict [`WindowConfig::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings key holding the window start.
pub const START_KEY: &str = "ordering_start_time";
/// Settings key holding the window end.
pub const END_KEY: &str = "ordering_end_time";

/// Wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build from hour and minute, `None` when out of range.
    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = WindowConfigError;

    /// Accepts `HH:MM`, and `HH:MM:SS` with the seconds ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WindowConfigError::Malformed(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(malformed());
        }

        let mut fields = [0u16; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            *slot = part.parse().map_err(|_| malformed())?;
        }
        if fields[2] >= 60 {
            return Err(malformed());
        }

        Self::from_hm(fields[0], fields[1]).ok_or_else(malformed)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = WindowConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Errors from strict window validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowConfigError {
    #[error("Both start and end times are required")]
    Missing,

    #[error("Invalid time of day: {0:?} (expected HH:MM)")]
    Malformed(String),

    #[error("Start time must be before end time ({start} >= {end})")]
    StartNotBeforeEnd { start: TimeOfDay, end: TimeOfDay },
}

/// Daily ordering window, `start` strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct WindowConfig {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<RawWindow> for WindowConfig {
    type Error = WindowConfigError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl WindowConfig {
    /// 09:00 to 12:30.
    pub const DEFAULT: WindowConfig = WindowConfig {
        start: TimeOfDay(9 * 60),
        end: TimeOfDay(12 * 60 + 30),
    };

    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, WindowConfigError> {
        if start >= end {
            return Err(WindowConfigError::StartNotBeforeEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Strict parse of administrator input.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowConfigError> {
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(WindowConfigError::Missing);
        }
        Self::new(start.parse()?, end.parse()?)
    }

    /// Lenient construction from stored settings.
    ///
    /// Each absent or malformed value falls back to its default; if the
    /// combination is then not a valid window, the whole default is used.
    pub fn from_settings(start: Option<&str>, end: Option<&str>) -> Self {
        let start = resolve(START_KEY, start, Self::DEFAULT.start);
        let end = resolve(END_KEY, end, Self::DEFAULT.end);

        match Self::new(start, end) {
            Ok(window) => window,
            Err(e) => {
                warn!(error = %e, default = %Self::DEFAULT, "stored ordering window invalid, using default");
                Self::DEFAULT
            }
        }
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains_minute(&self, minute_of_day: u32) -> bool {
        self.start.minutes_since_midnight() <= minute_of_day
            && minute_of_day <= self.end.minutes_since_midnight()
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WindowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

fn resolve(key: &str, raw: Option<&str>, default: TimeOfDay) -> TimeOfDay {
    match raw {
        None => {
            warn!(key, default = %default, "ordering window setting missing, using default");
            default
        }
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value, default = %default, "ordering window setting malformed, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(tod("09:00").minutes_since_midnight(), 540);
        assert_eq!(tod("12:30").minutes_since_midnight(), 750);
        assert_eq!(tod("9:05").minutes_since_midnight(), 545);
        assert_eq!(tod("23:59").minutes_since_midnight(), 1439);
        assert_eq!(tod("12:30:00"), tod("12:30"));
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        for bad in ["", "9", "24:00", "12:60", "ab:cd", "12:3a", "-1:00", "12:30:99", "1:2:3:4", "123:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_display_pads() {
        assert_eq!(tod("9:05").to_string(), "09:05");
        assert_eq!(WindowConfig::DEFAULT.to_string(), "09:00–12:30");
    }

    #[test]
    fn test_strict_parse() {
        let w = WindowConfig::parse("10:00", "11:15").unwrap();
        assert_eq!(w.start(), tod("10:00"));
        assert_eq!(w.end(), tod("11:15"));

        assert_eq!(WindowConfig::parse("", "11:00"), Err(WindowConfigError::Missing));
        assert!(matches!(
            WindowConfig::parse("11:00", "11:00"),
            Err(WindowConfigError::StartNotBeforeEnd { .. })
        ));
        assert!(matches!(
            WindowConfig::parse("12:00", "09:00"),
            Err(WindowConfigError::StartNotBeforeEnd { .. })
        ));
        assert!(matches!(
            WindowConfig::parse("noon", "13:00"),
            Err(WindowConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_settings_missing_uses_defaults() {
        assert_eq!(WindowConfig::from_settings(None, None), WindowConfig::DEFAULT);
    }

    #[test]
    fn test_from_settings_substitutes_per_key() {
        let w = WindowConfig::from_settings(Some("10:00"), None);
        assert_eq!(w.start(), tod("10:00"));
        assert_eq!(w.end(), tod("12:30"));

        let w = WindowConfig::from_settings(Some("garbage"), Some("14:00"));
        assert_eq!(w.start(), tod("09:00"));
        assert_eq!(w.end(), tod("14:00"));
    }

    #[test]
    fn test_from_settings_inverted_falls_back_entirely() {
        let w = WindowConfig::from_settings(Some("13:00"), None);
        assert_eq!(w, WindowConfig::DEFAULT);
    }

    #[test]
    fn test_contains_minute_inclusive() {
        let w = WindowConfig::DEFAULT;
        assert!(!w.contains_minute(539));
        assert!(w.contains_minute(540));
        assert!(w.contains_minute(750));
        assert!(!w.contains_minute(751));
    }

    #[test]
    fn test_serde_round_trip_shape() {
        let json = serde_json::to_value(WindowConfig::DEFAULT).unwrap();
        assert_eq!(json, serde_json::json!({"start": "09:00", "end": "12:30"}));

        let bad: Result<WindowConfig, _> =
            serde_json::from_value(serde_json::json!({"start": "12:00", "end": "08:00"}));
        assert!(bad.is_err());
    }
}
