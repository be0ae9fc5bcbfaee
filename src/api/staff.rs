use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::context::AppContext;
use crate::model::attendance::{StaffAttendance, attendance_percentage};
use crate::model::staff::Staff;
use crate::utils::{code_filter, scan_code::generate_scan_code};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterStaff {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Mathematics")]
    pub department: String,
    #[schema(example = "s3cret")]
    pub password: String,
}

/// Staff record without the credential column.
#[derive(Serialize, ToSchema)]
pub struct StaffResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Mathematics")]
    pub department: String,
    #[schema(example = "A1B2C3D4")]
    pub barcode: String,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<NaiveDateTime>,
}

impl From<Staff> for StaffResponse {
    fn from(s: Staff) -> Self {
        Self {
            id: s.id,
            name: s.name,
            department: s.department,
            barcode: s.barcode,
            created_at: s.created_at,
        }
    }
}

/// Register Staff (admin only)
#[utoipa::path(
    post,
    path = "/register_staff",
    request_body = RegisterStaff,
    responses(
        (status = 201, description = "Staff registered, scan code issued"),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn register_staff(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<RegisterStaff>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    let department = payload.department.trim();
    let password = payload.password.as_str();

    if name.is_empty() || department.is_empty() || password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Please fill in all fields"
        })));
    }

    let barcode = generate_scan_code();
    let hashed = hash_password(password);

    let result = sqlx::query(
        r#"
        INSERT INTO staff (name, department, password, barcode)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(department)
    .bind(&hashed)
    .bind(&barcode)
    .execute(&ctx.pool)
    .await;

    match result {
        Ok(res) => {
            code_filter::insert(&barcode);
            debug!(staff = name, id = res.last_insert_id(), "Staff registered");

            Ok(HttpResponse::Created().json(json!({
                "message": "Staff registered successfully",
                "staff_id": res.last_insert_id(),
                "staff_name": name,
                "barcode": barcode,
            })))
        }
        Err(e) => {
            error!(error = %e, "Failed to register staff");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Registration failed"
            })))
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StaffDetailsResponse {
    pub staff: StaffResponse,
    pub attendance_records: Vec<StaffAttendance>,
    #[schema(example = 5)]
    pub total_days: i64,
    #[schema(example = 3)]
    pub present_days: i64,
    #[schema(example = 1)]
    pub late_days: i64,
    #[schema(example = 1)]
    pub absent_days: i64,
    #[schema(example = 80.0)]
    pub attendance_percentage: f64,
}

/// Staff details with per-status day counts (admin only)
#[utoipa::path(
    get,
    path = "/staff_details/{id}",
    params(("id", Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Staff found", body = StaffDetailsResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Staff not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn staff_details(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let staff_id = path.into_inner();

    let staff = sqlx::query_as::<_, Staff>(
        r#"
        SELECT id, name, department, password, barcode, created_at
        FROM staff
        WHERE id = ?
        "#,
    )
    .bind(staff_id)
    .fetch_optional(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, staff_id, "Failed to fetch staff");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(staff) = staff else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Staff not found"
        })));
    };

    let records = sqlx::query_as::<_, StaffAttendance>(
        r#"
        SELECT id, staff_id, date, time, status, created_at
        FROM staff_attendance
        WHERE staff_id = ?
        ORDER BY date DESC
        LIMIT 30
        "#,
    )
    .bind(staff_id)
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, staff_id, "Failed to fetch staff attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let (total_days, present_days, late_days, absent_days) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(id),
                   COUNT(CASE WHEN status = 'present' THEN id END),
                   COUNT(CASE WHEN status = 'late' THEN id END),
                   COUNT(CASE WHEN status = 'absent' THEN id END)
            FROM staff_attendance
            WHERE staff_id = ?
            "#,
        )
        .bind(staff_id)
        .fetch_one(&ctx.pool)
        .await
        .map_err(|e| {
            error!(error = %e, staff_id, "Failed to count staff attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(StaffDetailsResponse {
        staff: staff.into(),
        attendance_records: records,
        total_days,
        present_days,
        late_days,
        absent_days,
        attendance_percentage: attendance_percentage(present_days + late_days, total_days),
    }))
}

#[derive(sqlx::FromRow)]
struct StaffSummaryRow {
    id: u64,
    name: String,
    department: String,
    total_days: i64,
    attended_days: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StaffSummary {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Mathematics")]
    pub department: String,
    #[schema(example = 80.0)]
    pub attendance_percentage: f64,
    #[schema(example = 5)]
    pub total_days: i64,
}

/// Per-staff attendance summary (admin only)
#[utoipa::path(
    get,
    path = "/staff_attendance",
    responses(
        (status = 200, description = "Staff summaries", body = [StaffSummary]),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn staff_attendance(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, StaffSummaryRow>(
        r#"
        SELECT s.id, s.name, s.department,
               COUNT(a.id) AS total_days,
               COUNT(CASE WHEN a.status IN ('present', 'late') THEN a.id END) AS attended_days
        FROM staff s
        LEFT JOIN staff_attendance a ON a.staff_id = s.id
        GROUP BY s.id, s.name, s.department
        ORDER BY s.name
        "#,
    )
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch staff summaries");
        ErrorInternalServerError("Database error")
    })?;

    let summaries: Vec<StaffSummary> = rows
        .into_iter()
        .map(|r| StaffSummary {
            id: r.id,
            name: r.name,
            department: r.department,
            attendance_percentage: attendance_percentage(r.attended_days, r.total_days),
            total_days: r.total_days,
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}
