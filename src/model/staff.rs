use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Staff {
    pub id: u64,
    pub name: String,
    pub department: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub barcode: String,
    pub created_at: Option<NaiveDateTime>,
}
