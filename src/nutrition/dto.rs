use serde::{Deserialize, Serialize};

use crate::logs::repo_types::FoodEntry;

#[derive(Debug, Serialize)]
pub struct NutrientsRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct NutrientsResponse {
    #[serde(default)]
    pub foods: Vec<NutritionixFood>,
}

/// The subset of a Nutritionix food item we keep.
#[derive(Debug, Deserialize)]
pub struct NutritionixFood {
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub nf_total_carbohydrate: Option<f64>,
    #[serde(default)]
    pub serving_qty: Option<f64>,
    #[serde(default)]
    pub serving_unit: Option<String>,
}

impl From<NutritionixFood> for FoodEntry {
    fn from(f: NutritionixFood) -> Self {
        Self {
            food: f.food_name.unwrap_or_default(),
            carbs: f.nf_total_carbohydrate.unwrap_or(0.0),
            serving_qty: f.serving_qty,
            serving_unit: f.serving_unit,
        }
    }
}
