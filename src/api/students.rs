use crate::context::AppContext;
use crate::model::attendance::{Attendance, attendance_percentage};
use crate::model::student::Student;
use crate::utils::{code_filter, regno_cache, scan_code::generate_scan_code};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterStudent {
    #[schema(example = "Asha Rahman")]
    pub name: String,
    #[schema(example = "S100")]
    pub reg_no: String,
    #[schema(example = "Science")]
    pub department: String,
    #[schema(example = "+8801712345678")]
    pub parent_phone: String,
}

/// true  => registration number AVAILABLE
/// false => registration number TAKEN
pub async fn is_reg_no_available(reg_no: &str, pool: &sqlx::MySqlPool) -> bool {
    // Fast in-memory positive check
    if regno_cache::is_taken(reg_no).await {
        return false;
    }

    // Database fallback
    let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE reg_no = ?")
        .bind(reg_no)
        .fetch_one(pool)
        .await
        .map(|count| count > 0)
        .unwrap_or(true); // fail-safe

    !taken
}

/// Register Student
///
/// Open to both admins and staff. Returns the issued scan code; clients
/// render the QR image themselves.
#[utoipa::path(
    post,
    path = "/register_student",
    request_body = RegisterStudent,
    responses(
        (status = 201, description = "Student registered, scan code issued"),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Registration number already exists"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn register_student(
    ctx: web::Data<AppContext>,
    payload: web::Json<RegisterStudent>,
) -> impl Responder {
    let name = payload.name.trim();
    let reg_no = payload.reg_no.trim();
    let department = payload.department.trim();
    let parent_phone = payload.parent_phone.trim();

    if name.is_empty() || reg_no.is_empty() || department.is_empty() || parent_phone.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Please fill in all fields"
        }));
    }

    if !is_reg_no_available(reg_no, &ctx.pool).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Student with this registration number already exists"
        }));
    }

    let barcode = generate_scan_code();

    let result = sqlx::query(
        r#"
        INSERT INTO students (name, reg_no, department, parent_phone, barcode)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(reg_no)
    .bind(department)
    .bind(parent_phone)
    .bind(&barcode)
    .execute(&ctx.pool)
    .await;

    match result {
        Ok(res) => {
            code_filter::insert(&barcode);
            regno_cache::mark_taken(reg_no).await;

            HttpResponse::Created().json(json!({
                "message": "Student registered successfully",
                "student_id": res.last_insert_id(),
                "student_name": name,
                "barcode": barcode,
            }))
        }
        Err(e) => {
            // The UNIQUE keys catch the race the availability check can miss
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return HttpResponse::Conflict().json(json!({
                        "error": "Student with this registration number already exists"
                    }));
                }
            }

            error!(error = %e, "Failed to register student");
            HttpResponse::InternalServerError().json(json!({
                "error": "Registration failed"
            }))
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StudentDetailsResponse {
    pub student: Student,
    pub attendance_records: Vec<Attendance>,
    #[schema(example = 80.0)]
    pub attendance_percentage: f64,
}

/// Student details with the last 30 attendance rows
#[utoipa::path(
    get,
    path = "/student_details/{id}",
    params(("id", Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found", body = StudentDetailsResponse),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn student_details(
    ctx: web::Data<AppContext>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let student = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, reg_no, department, parent_phone, barcode, created_at
        FROM students
        WHERE id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(student) = student else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Student not found"
        })));
    };

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, student_id, date, time, status, created_at
        FROM attendance
        WHERE student_id = ?
        ORDER BY date DESC
        LIMIT 30
        "#,
    )
    .bind(student_id)
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let (total_days, attended_days) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(id),
               COUNT(CASE WHEN status IN ('present', 'late') THEN id END)
        FROM attendance
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .fetch_one(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to count attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(StudentDetailsResponse {
        student,
        attendance_records: records,
        attendance_percentage: attendance_percentage(attended_days, total_days),
    }))
}

#[derive(sqlx::FromRow)]
struct StudentSummaryRow {
    id: u64,
    name: String,
    reg_no: String,
    department: String,
    parent_phone: String,
    total_days: i64,
    attended_days: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StudentSummary {
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
    #[schema(example = 80.0)]
    pub attendance_percentage: f64,
    #[schema(example = 5)]
    pub total_days: i64,
}

/// All students with per-student attendance percentage
#[utoipa::path(
    get,
    path = "/all_students",
    responses(
        (status = 200, description = "Student summaries", body = [StudentSummary]),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn all_students(ctx: web::Data<AppContext>) -> actix_web::Result<impl Responder> {
    debug!("Fetching student summaries");

    let rows = sqlx::query_as::<_, StudentSummaryRow>(
        r#"
        SELECT s.id, s.name, s.reg_no, s.department, s.parent_phone,
               COUNT(a.id) AS total_days,
               COUNT(CASE WHEN a.status IN ('present', 'late') THEN a.id END) AS attended_days
        FROM students s
        LEFT JOIN attendance a ON a.student_id = s.id
        GROUP BY s.id, s.name, s.reg_no, s.department, s.parent_phone
        ORDER BY s.name
        "#,
    )
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch student summaries");
        ErrorInternalServerError("Database error")
    })?;

    let students: Vec<StudentSummary> = rows
        .into_iter()
        .map(|r| StudentSummary {
            id: r.id,
            name: r.name,
            reg_no: r.reg_no,
            department: r.department,
            parent_phone: r.parent_phone,
            attendance_percentage: attendance_percentage(r.attended_days, r.total_days),
            total_days: r.total_days,
        })
        .collect();

    Ok(HttpResponse::Ok().json(students))
}
