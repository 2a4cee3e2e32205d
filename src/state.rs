use std::sync::Arc;

use anyhow::Context;
use time::PrimitiveDateTime;
use time_tz::{OffsetDateTimeExt, Tz};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::logs::repo::LogStore;
use crate::nutrition::{NutritionLookup, NutritionixClient};
use crate::storage::{FileStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub logs: LogStore,
    pub nutrition: Arc<dyn NutritionLookup>,
    pub clock: Arc<dyn Clock>,
    pub tz: &'static Tz,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let storage = Arc::new(FileStorage::new(&config.data_dir)) as Arc<dyn StorageClient>;
        let nutrition = NutritionixClient::new(&config.nutritionix);
        if !nutrition.is_configured() {
            tracing::warn!("NUTRITIONIX_APP_ID / NUTRITIONIX_API_KEY not set; lookups will fail");
        }

        Self::from_parts(
            config,
            storage,
            Arc::new(nutrition),
            Arc::new(SystemClock),
        )
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        nutrition: Arc<dyn NutritionLookup>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let tz = time_tz::timezones::get_by_name(&config.timezone)
            .with_context(|| format!("unknown time zone {}", config.timezone))?;
        Ok(Self {
            logs: LogStore::new(storage, config.retention_days),
            config,
            nutrition,
            clock,
            tz,
        })
    }

    /// Current wall-clock time in the configured zone.
    pub fn local_now(&self) -> PrimitiveDateTime {
        let local = self.clock.now_utc().to_timezone(self.tz);
        PrimitiveDateTime::new(local.date(), local.time())
    }

    #[cfg(test)]
    pub fn fake(nutrition: Arc<dyn NutritionLookup>, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(AppConfig {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            data_dir: std::path::PathBuf::from("unused"),
            timezone: "America/New_York".into(),
            retention_days: 30,
            average_window_days: 7,
            suggestion_limit: 10,
            nutritionix: crate::config::NutritionixConfig {
                endpoint: "http://fake.local/nutrients".into(),
                app_id: None,
                api_key: None,
            },
        });
        let storage = Arc::new(crate::storage::MemoryStorage::new()) as Arc<dyn StorageClient>;
        Self::from_parts(config, storage, nutrition, clock).expect("fake state ok")
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::logs::repo_types::FoodEntry;
    use crate::nutrition::LookupError;
    use async_trait::async_trait;
    use time::macros::datetime;

    struct NoLookup;

    #[async_trait]
    impl NutritionLookup for NoLookup {
        async fn lookup(&self, _query: &str) -> Result<Vec<FoodEntry>, LookupError> {
            Err(LookupError::NotConfigured)
        }
    }

    #[test]
    fn local_now_follows_configured_zone_not_utc() {
        // 02:30 UTC is still the previous evening in New York
        let clock = FixedClock(datetime!(2026-10-20 2:30 UTC));
        let state = AppState::fake(Arc::new(NoLookup), Arc::new(clock));
        assert_eq!(state.local_now(), datetime!(2026-10-19 22:30));
    }
}
