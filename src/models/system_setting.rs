use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single configuration row, keyed by (category, setting_key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub id: String,
    pub category: String,
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}
