use std::sync::Arc;

use sqlx::MySqlPool;

use crate::model::status::AttendanceWindows;
use crate::utils::sms::Notifier;

/// Everything a request handler needs, constructed once in `main`.
/// Storage and notification sit behind this so tests can swap doubles in.
#[derive(Clone)]
pub struct AppContext {
    pub pool: MySqlPool,
    pub notifier: Arc<dyn Notifier>,
    pub windows: AttendanceWindows,
}

impl AppContext {
    pub fn new(pool: MySqlPool, notifier: Arc<dyn Notifier>, windows: AttendanceWindows) -> Self {
        Self {
            pool,
            notifier,
            windows,
        }
    }
}
