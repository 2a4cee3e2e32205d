use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::logs::repo::DEFAULT_RETENTION_DAYS;
use crate::logs::services::{DEFAULT_SUGGESTION_LIMIT, DEFAULT_WINDOW_DAYS};

pub const DEFAULT_NUTRITIONIX_ENDPOINT: &str =
    "https://trackapi.nutritionix.com/v2/natural/nutrients";

const RETENTION_DAYS_RANGE: RangeInclusive<u16> = 1..=3650;
const WINDOW_DAYS_RANGE: RangeInclusive<u32> = 1..=366;
const SUGGESTION_LIMIT_RANGE: RangeInclusive<usize> = 1..=100;

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionixConfig {
    pub endpoint: String,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub timezone: String,
    pub retention_days: u16,
    pub average_window_days: u32,
    pub suggestion_limit: usize,
    pub nutritionix: NutritionixConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let timezone =
            std::env::var("APP_TIMEZONE").unwrap_or_else(|_| "America/New_York".into());
        time_tz::timezones::get_by_name(&timezone)
            .with_context(|| format!("unknown APP_TIMEZONE {}", timezone))?;

        let bind_addr = format!(
            "{}:{}",
            std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
        )
        .parse()
        .context("APP_HOST / APP_PORT")?;

        let nutritionix = NutritionixConfig {
            endpoint: std::env::var("NUTRITIONIX_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_NUTRITIONIX_ENDPOINT.into()),
            app_id: non_empty_var("NUTRITIONIX_APP_ID"),
            api_key: non_empty_var("NUTRITIONIX_API_KEY"),
        };

        Ok(Self {
            bind_addr,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            timezone,
            retention_days: bounded(
                "RETENTION_DAYS",
                non_empty_var("RETENTION_DAYS"),
                DEFAULT_RETENTION_DAYS,
                RETENTION_DAYS_RANGE,
            )?,
            average_window_days: bounded(
                "AVERAGE_WINDOW_DAYS",
                non_empty_var("AVERAGE_WINDOW_DAYS"),
                DEFAULT_WINDOW_DAYS,
                WINDOW_DAYS_RANGE,
            )?,
            suggestion_limit: bounded(
                "SUGGESTION_LIMIT",
                non_empty_var("SUGGESTION_LIMIT"),
                DEFAULT_SUGGESTION_LIMIT,
                SUGGESTION_LIMIT_RANGE,
            )?,
            nutritionix,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `default` when unset; otherwise the value must parse and fall inside `range`.
fn bounded<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    range: RangeInclusive<T>,
) -> anyhow::Result<T>
where
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .with_context(|| format!("{} must be a number in {}..={}", key, range.start(), range.end()))?;
    anyhow::ensure!(
        range.contains(&value),
        "{} = {} is outside {}..={}",
        key,
        value,
        range.start(),
        range.end()
    );
    Ok(value)
}
