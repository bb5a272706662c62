use std::sync::Arc;

use crate::{configs::Config, scheduler::PlaybackScheduler};

/// Top-level application state.
pub struct AppState {
    pub config: Config,
    pub scheduler: Arc<PlaybackScheduler>,
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
