use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Static lookup row describing a terminal/location. Read-only to the
/// escalation engine; maintained through the admin import surface.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferenceRecord {
    pub id: i64,
    pub tid: Option<String>,
    pub pengelola: Option<String>,
    pub kc_supervisi: Option<String>,
    pub lokasi: Option<String>,
}
