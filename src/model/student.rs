use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Asha Rahman",
        "reg_no": "S100",
        "department": "Science",
        "parent_phone": "+8801712345678",
        "barcode": "A1B2C3D4",
        "created_at": "2026-01-01T09:00:00"
    })
)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Asha Rahman")]
    pub name: String,

    #[schema(example = "S100")]
    pub reg_no: String,

    #[schema(example = "Science")]
    pub department: String,

    #[schema(example = "+8801712345678")]
    pub parent_phone: String,

    #[schema(example = "A1B2C3D4")]
    pub barcode: String,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<NaiveDateTime>,
}
