use std::sync::Arc;

use crate::config::Config;
use crate::db::MongoDB;

pub struct AppState {
    pub mongodb: Arc<MongoDB>,
    pub config: Config,
}
