pub mod supabase;

use shared_config::AppConfig;
use std::sync::Arc;

use crate::supabase::SupabaseClient;

/// Process-wide state: configuration plus the single storage client,
/// constructed once in main and handed to every cell router.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SupabaseClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(SupabaseClient::new(&config));
        Self { config, store }
    }
}
