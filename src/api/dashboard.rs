use crate::auth::auth::AuthUser;
use crate::context::AppContext;
use crate::model::student::Student;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::Local;
use serde_json::json;
use tracing::error;

/// Admin dashboard counters (admin only)
#[utoipa::path(
    get,
    path = "/admin_dashboard",
    responses(
        (status = 200, description = "Totals for the admin landing page"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn admin_dashboard(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let total_students = count(&ctx, "SELECT COUNT(*) FROM students").await?;
    let total_staff = count(&ctx, "SELECT COUNT(*) FROM staff").await?;

    let today = Local::now().date_naive();
    let today_attendance = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE date = ?",
    )
    .bind(today)
    .fetch_one(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count today's attendance");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "total_students": total_students,
        "total_staff": total_staff,
        "today_attendance": today_attendance,
    })))
}

/// Staff dashboard: the full student roster
#[utoipa::path(
    get,
    path = "/staff_dashboard",
    responses(
        (status = 200, description = "All students", body = [Student]),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn staff_dashboard(ctx: web::Data<AppContext>) -> actix_web::Result<impl Responder> {
    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, reg_no, department, parent_phone, barcode, created_at
        FROM students
        ORDER BY name
        "#,
    )
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch students");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(students))
}

async fn count(ctx: &web::Data<AppContext>, sql: &str) -> actix_web::Result<i64> {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(&ctx.pool)
        .await
        .map_err(|e| {
            error!(error = %e, sql, "Count query failed");
            ErrorInternalServerError("Database error")
        })
}
