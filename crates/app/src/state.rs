use std::time::Instant;

use services::AppServices;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    services: AppServices,
    started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            started_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }

    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
