use std::collections::HashMap;

use time::{Date, Duration};

use crate::logs::repo_types::{FoodEntry, LogDate, UserLogs};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

pub fn daily_total(entries: &[FoodEntry]) -> f64 {
    entries.iter().map(|e| e.carbs).sum()
}

/// Mean daily carbs over the `window_days` days ending on `today`.
///
/// Days without a log count as zero, so the divisor is always `window_days`.
/// Rounded to one decimal.
pub fn trailing_average(logs: &UserLogs, today: Date, window_days: u32) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let sum: f64 = (0..i64::from(window_days))
        .filter_map(|ago| today.checked_sub(Duration::days(ago)))
        .map(|d| daily_total(logs.day(LogDate(d))))
        .sum();
    round_tenths(sum / f64::from(window_days))
}

/// The `limit` most frequently logged foods, title-cased, most frequent first.
/// Equal counts keep the order in which the names were first seen.
pub fn suggestions(logs: &UserLogs, limit: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (_, entries) in logs.iter() {
        for entry in entries {
            let name = title_case(&entry.food);
            match index.get(&name) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(name.clone(), counts.len());
                    counts.push((name, 1));
                }
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(name, _)| name).collect()
}

/// Upper-cases the first letter of every word and lower-cases the rest.
/// A word starts after any non-alphabetic character, so "mcdonald's" becomes "Mcdonald'S".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Rounds on the exact binary value, so exact halves go to the even digit
/// and 3.15 (stored as 3.1499...) becomes 3.1.
fn round_tenths(v: f64) -> f64 {
    format!("{:.1}", v).parse().unwrap_or(v)
}
