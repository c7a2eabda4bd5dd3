//! Settings repository.

use std::future::Future;

use crate::model::{Settings, UpdateSettings};
use crate::{Store, StoreResult, TRACING_TARGET_QUERY};

/// Repository for the process-wide settings singleton.
pub trait SettingsRepository {
    /// Returns a snapshot of the current settings.
    fn get_settings(&self) -> impl Future<Output = Settings> + Send;

    /// Validates and atomically applies a settings update.
    ///
    /// On failure the current settings are left untouched.
    fn update_settings(
        &self,
        updates: UpdateSettings,
    ) -> impl Future<Output = StoreResult<Settings>> + Send;
}

impl SettingsRepository for Store {
    async fn get_settings(&self) -> Settings {
        self.settings().read().await.clone()
    }

    async fn update_settings(&self, updates: UpdateSettings) -> StoreResult<Settings> {
        let mut settings = self.settings().write().await;
        let next = updates.apply_to(&settings);
        next.validate()?;
        *settings = next.clone();

        tracing::info!(
            target: TRACING_TARGET_QUERY,
            llm_model = %next.llm_model,
            llm_base_url = %next.llm_base_url,
            has_llm_api_key = next.has_llm_api_key(),
            storage_path = %next.storage_path.display(),
            "Settings updated",
        );

        Ok(next)
    }
}
