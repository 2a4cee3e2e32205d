use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::dto::{NutrientsRequest, NutrientsResponse};
use crate::config::NutritionixConfig;
use crate::logs::repo_types::FoodEntry;

/// Failures a caller shows to the user. None of them mutate any log.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("API keys are not configured.")]
    NotConfigured,
    #[error("Could not connect to nutrition service.")]
    Unavailable(#[source] reqwest::Error),
    #[error("Couldn't find that food. Please try again.")]
    NotFound,
}

#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Resolves a free-text query ("2 eggs and toast") into one entry per food.
    /// Never returns an empty list; no matches is `LookupError::NotFound`.
    async fn lookup(&self, query: &str) -> Result<Vec<FoodEntry>, LookupError>;
}

struct Credentials {
    app_id: String,
    api_key: String,
}

/// Client for the Nutritionix natural-language nutrients endpoint.
pub struct NutritionixClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Option<Credentials>,
}

impl NutritionixClient {
    pub fn new(config: &NutritionixConfig) -> Self {
        let credentials = match (&config.app_id, &config.api_key) {
            (Some(app_id), Some(api_key)) => Some(Credentials {
                app_id: app_id.clone(),
                api_key: api_key.clone(),
            }),
            _ => None,
        };
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl NutritionLookup for NutritionixClient {
    async fn lookup(&self, query: &str) -> Result<Vec<FoodEntry>, LookupError> {
        let creds = self.credentials.as_ref().ok_or(LookupError::NotConfigured)?;

        let res = self
            .http
            .post(&self.endpoint)
            .header("x-app-id", creds.app_id.as_str())
            .header("x-app-key", creds.api_key.as_str())
            .json(&NutrientsRequest { query })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(error = %e, "nutritionix request failed");
                LookupError::Unavailable(e)
            })?;

        let body: NutrientsResponse = res.json().await.map_err(|e| {
            warn!(error = %e, "nutritionix response undecodable");
            LookupError::Unavailable(e)
        })?;

        debug!(query, matches = body.foods.len(), "nutritionix lookup");
        if body.foods.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(body.foods.into_iter().map(FoodEntry::from).collect())
    }
}
