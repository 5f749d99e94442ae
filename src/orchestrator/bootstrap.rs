//! Session start: service health and preset discovery.

use crate::engine::PunchService;
use crate::model::{HealthStatus, PresetCatalog};

/// Fetch health and presets concurrently. Neither fetch can fail the other and
/// neither surfaces an error: health degrades to "unreachable", presets to the default.
pub(crate) async fn bootstrap(service: &dyn PunchService) -> (HealthStatus, PresetCatalog) {
    tokio::join!(load_health(service), load_presets(service))
}

async fn load_health(service: &dyn PunchService) -> HealthStatus {
    match service.health().await {
        Ok(resp) => {
            let health = HealthStatus::from_status(resp.status_text());
            log::info!("health: {}", health.text);
            health
        }
        Err(e) => {
            log::warn!("health check failed: {e}");
            HealthStatus::unreachable()
        }
    }
}

async fn load_presets(service: &dyn PunchService) -> PresetCatalog {
    match service.settings_presets().await {
        Ok(resp) => {
            let names = resp.preset_names();
            if names.is_empty() {
                log::debug!("service offered no presets, keeping default");
            }
            PresetCatalog::from_names(names)
        }
        Err(e) => {
            log::debug!("preset fetch failed, keeping default: {e}");
            PresetCatalog::default()
        }
    }
}
