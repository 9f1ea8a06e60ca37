use std::sync::Arc;

use crate::fonts::FontSet;
use crate::settings::Settings;

use super::rate_limit::RateLimiter;

pub(crate) struct ServerState {
    pub(crate) settings: Settings,
    pub(crate) fonts: Arc<FontSet>,
    pub(crate) limiter: RateLimiter,
}
