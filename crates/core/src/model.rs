use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique order identifier.
pub type OrderId = Uuid;

/// The civil date identifying one weekly ordering cycle.
///
/// Always the date of that week's target weekday; produced by the recurrence
/// clock, never chosen freely by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleKey(NaiveDate);

impl CycleKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CycleKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

/// Identity-provider subject id of a team member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a member submits from the ordering form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub item: String,
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderDraft {
    pub fn new(item: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            variant: variant.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Insert payload for a member's first order in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub cycle: CycleKey,
    pub item: String,
    pub variant: String,
    pub notes: Option<String>,
}

/// An order as held by external storage.
///
/// `locked` is applied cycle-wide by an administrator, never per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(rename = "friday_date")]
    pub cycle: CycleKey,
    pub item: String,
    pub variant: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team member profile, as far as ordering needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub whitelisted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_key_display_and_parse() {
        let key = CycleKey::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(key.to_string(), "2026-10-16");
        assert_eq!("2026-10-16".parse::<CycleKey>().unwrap(), key);
        assert!("16/10/2026".parse::<CycleKey>().is_err());
    }

    #[test]
    fn test_order_record_uses_friday_date_field() {
        let record = OrderRecord {
            id: Uuid::nil(),
            user_id: UserId::new("u1"),
            cycle: "2026-10-16".parse().unwrap(),
            item: "Pizza".into(),
            variant: "Margherita".into(),
            notes: None,
            locked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["friday_date"], "2026-10-16");
        assert_eq!(json["user_id"], "u1");
    }
}
