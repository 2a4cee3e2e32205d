use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{format_description::FormatItem, macros::format_description, Date};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// One logged food. Persisted with the field names below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub food: String,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub serving_qty: Option<f64>,
    #[serde(default)]
    pub serving_unit: Option<String>,
}

impl FoodEntry {
    #[cfg(test)]
    pub fn new(food: impl Into<String>, carbs: f64) -> Self {
        Self {
            food: food.into(),
            carbs,
            serving_qty: None,
            serving_unit: None,
        }
    }
}

/// Calendar day key, `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogDate(pub Date);

impl LogDate {
    pub fn date(self) -> Date {
        self.0
    }
}

impl fmt::Display for LogDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for LogDate {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s, DATE_FORMAT).map(Self)
    }
}

impl Serialize for LogDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Every day a user has logged, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserLogs {
    days: BTreeMap<LogDate, Vec<FoodEntry>>,
}

impl UserLogs {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[cfg(test)]
    pub fn contains(&self, date: LogDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Entries for `date`; empty when nothing was logged.
    pub fn day(&self, date: LogDate) -> &[FoodEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Days in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (LogDate, &[FoodEntry])> {
        self.days.iter().map(|(d, e)| (*d, e.as_slice()))
    }

    /// Newest first, for history listings.
    pub fn dates_desc(&self) -> Vec<LogDate> {
        self.days.keys().rev().copied().collect()
    }

    pub fn append(&mut self, date: LogDate, entries: impl IntoIterator<Item = FoodEntry>) -> bool {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return false;
        }
        self.days.entry(date).or_default().extend(entries);
        true
    }

    pub fn undo_last(&mut self, date: LogDate) -> bool {
        self.days
            .get_mut(&date)
            .map(|entries| entries.pop().is_some())
            .unwrap_or(false)
    }

    /// Out-of-range indexes and unknown dates leave the logs untouched.
    pub fn remove_entry(&mut self, date: LogDate, index: usize) -> bool {
        match self.days.get_mut(&date) {
            Some(entries) if index < entries.len() => {
                entries.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn clear_day(&mut self, date: LogDate) -> bool {
        self.days.remove(&date).is_some()
    }

    /// Keeps only the days for which `keep` returns true. Returns how many were dropped.
    pub fn retain_days(&mut self, mut keep: impl FnMut(LogDate) -> bool) -> usize {
        let before = self.days.len();
        self.days.retain(|d, _| keep(*d));
        before - self.days.len()
    }
}

#[cfg(test)]
mod log_types_tests {
    use super::*;
    use time::macros::date;

    fn logs_with(date: LogDate, foods: &[(&str, f64)]) -> UserLogs {
        let mut logs = UserLogs::new();
        logs.append(date, foods.iter().map(|(f, c)| FoodEntry::new(*f, *c)));
        logs
    }

    #[test]
    fn log_date_parses_and_displays() {
        let d: LogDate = "2026-03-07".parse().unwrap();
        assert_eq!(d.date(), date!(2026 - 03 - 07));
        assert_eq!(d.to_string(), "2026-03-07");
        assert!("2026-3-7x".parse::<LogDate>().is_err());
        assert!("2026-02-30".parse::<LogDate>().is_err());
    }

    #[test]
    fn persisted_json_uses_date_keys_and_field_names() {
        let d = LogDate(date!(2026 - 10 - 19));
        let logs = logs_with(d, &[("apple", 25.0)]);
        let json = serde_json::to_value(&logs).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "2026-10-19": [
                    { "food": "apple", "carbs": 25.0, "serving_qty": null, "serving_unit": null }
                ]
            })
        );
    }

    #[test]
    fn missing_carbs_defaults_to_zero() {
        let raw = r#"{"2026-10-19": [{"food": "water", "serving_qty": 1, "serving_unit": "cup"}]}"#;
        let logs: UserLogs = serde_json::from_str(raw).unwrap();
        let entries = logs.day(LogDate(date!(2026 - 10 - 19)));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].carbs, 0.0);
        assert_eq!(entries[0].serving_qty, Some(1.0));
        assert_eq!(entries[0].serving_unit.as_deref(), Some("cup"));
    }

    #[test]
    fn invalid_date_key_fails_to_parse() {
        let raw = r#"{"yesterday": []}"#;
        assert!(serde_json::from_str::<UserLogs>(raw).is_err());
    }

    #[test]
    fn remove_entry_out_of_range_is_noop() {
        let d = LogDate(date!(2026 - 10 - 19));
        let mut logs = logs_with(d, &[("apple", 25.0), ("rice", 45.0)]);
        let before = logs.clone();

        assert!(!logs.remove_entry(d, 2));
        assert!(!logs.remove_entry(LogDate(date!(2026 - 10 - 18)), 0));
        assert_eq!(logs, before);

        assert!(logs.remove_entry(d, 0));
        assert_eq!(logs.day(d), &[FoodEntry::new("rice", 45.0)]);
    }

    #[test]
    fn clear_day_absent_is_noop() {
        let d = LogDate(date!(2026 - 10 - 19));
        let mut logs = logs_with(d, &[("apple", 25.0)]);
        assert!(!logs.clear_day(LogDate(date!(2026 - 10 - 01))));
        assert_eq!(logs.len(), 1);
        assert!(logs.clear_day(d));
        assert!(logs.is_empty());
    }

    #[test]
    fn undo_pops_last_entry_only() {
        let d = LogDate(date!(2026 - 10 - 19));
        let mut logs = logs_with(d, &[("apple", 25.0), ("rice", 45.0)]);
        assert!(logs.undo_last(d));
        assert_eq!(logs.day(d), &[FoodEntry::new("apple", 25.0)]);
        assert!(logs.undo_last(d));
        assert!(!logs.undo_last(d));
        assert!(!logs.undo_last(LogDate(date!(2026 - 10 - 18))));
    }

    #[test]
    fn append_nothing_does_not_create_day() {
        let d = LogDate(date!(2026 - 10 - 19));
        let mut logs = UserLogs::new();
        assert!(!logs.append(d, Vec::new()));
        assert!(!logs.contains(d));
    }

    #[test]
    fn dates_desc_is_newest_first() {
        let mut logs = UserLogs::new();
        for d in [date!(2026 - 10 - 02), date!(2026 - 10 - 19), date!(2026 - 09 - 30)] {
            logs.append(LogDate(d), [FoodEntry::new("x", 1.0)]);
        }
        let dates: Vec<String> = logs.dates_desc().iter().map(ToString::to_string).collect();
        assert_eq!(dates, ["2026-10-19", "2026-10-02", "2026-09-30"]);
    }
}
