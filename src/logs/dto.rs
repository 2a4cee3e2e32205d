use serde::{Deserialize, Serialize};

use crate::logs::repo_types::{FoodEntry, LogDate};

#[derive(Debug, Serialize)]
pub struct DayView {
    pub date: LogDate,
    pub display_date: String,
    pub viewing_today: bool,
    pub entries: Vec<FoodEntry>,
    pub total_carbs: f64,
    pub trailing_average: f64,
    pub window_days: u32,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub dates: Vec<LogDate>,
}

#[derive(Debug, Deserialize)]
pub struct LogFoodRequest {
    #[serde(default)]
    pub food_query: String,
}
