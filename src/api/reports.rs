use crate::auth::auth::AuthUser;
use crate::context::AppContext;
use crate::model::staff::Staff;
use crate::model::student::Student;
use crate::utils::csv;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

/// Share of the whole roster marked present or late today, one decimal.
fn attendance_rate(attended: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = attended as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

fn db_error(e: sqlx::Error, what: &str) -> actix_web::Error {
    error!(error = %e, what, "Report query failed");
    ErrorInternalServerError("Database error")
}

#[derive(sqlx::FromRow, Serialize, ToSchema)]
pub struct StudentMarkRow {
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "Asha Rahman")]
    pub name: String,
    #[schema(example = "S100")]
    pub reg_no: String,
    #[schema(example = "Science")]
    pub department: String,
    #[schema(example = "+8801712345678")]
    pub parent_phone: String,
    #[schema(example = "09:10:00", value_type = String)]
    pub time: NaiveTime,
    #[schema(example = "present")]
    pub status: String,
}

#[derive(sqlx::FromRow, Serialize, ToSchema)]
pub struct StaffMarkRow {
    #[schema(example = 1)]
    pub staff_id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "Mathematics")]
    pub department: String,
    #[schema(example = "09:10:00", value_type = String)]
    pub time: NaiveTime,
    #[schema(example = "present")]
    pub status: String,
}

async fn todays_student_marks(
    pool: &MySqlPool,
    today: NaiveDate,
    order: &str,
) -> Result<Vec<StudentMarkRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT a.student_id, s.name, s.reg_no, s.department, s.parent_phone, a.time, a.status
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        WHERE a.date = ?
        ORDER BY {}
        "#,
        order
    );
    sqlx::query_as::<_, StudentMarkRow>(&sql)
        .bind(today)
        .fetch_all(pool)
        .await
}

async fn todays_staff_marks(
    pool: &MySqlPool,
    today: NaiveDate,
    order: &str,
) -> Result<Vec<StaffMarkRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT a.staff_id, s.name, s.department, a.time, a.status
        FROM staff_attendance a
        JOIN staff s ON s.id = a.staff_id
        WHERE a.date = ?
        ORDER BY {}
        "#,
        order
    );
    sqlx::query_as::<_, StaffMarkRow>(&sql)
        .bind(today)
        .fetch_all(pool)
        .await
}

async fn unmarked_students(
    pool: &MySqlPool,
    today: NaiveDate,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, reg_no, department, parent_phone, barcode, created_at
        FROM students
        WHERE id NOT IN (SELECT student_id FROM attendance WHERE date = ?)
        ORDER BY name
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await
}

async fn unmarked_staff(pool: &MySqlPool, today: NaiveDate) -> Result<Vec<Staff>, sqlx::Error> {
    sqlx::query_as::<_, Staff>(
        r#"
        SELECT id, name, department, password, barcode, created_at
        FROM staff
        WHERE id NOT IN (SELECT staff_id FROM staff_attendance WHERE date = ?)
        ORDER BY name
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await
}

/// Today's student attendance: marked rows, the unmarked complement, counts
#[utoipa::path(
    get,
    path = "/todays_students",
    responses(
        (status = 200, description = "Today's student attendance view"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn todays_students(ctx: web::Data<AppContext>) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let records = todays_student_marks(&ctx.pool, today, "a.time DESC")
        .await
        .map_err(|e| db_error(e, "todays student marks"))?;
    let absent_students = unmarked_students(&ctx.pool, today)
        .await
        .map_err(|e| db_error(e, "unmarked students"))?;

    let total_students = records.len() as i64 + absent_students.len() as i64;
    let present_count = records.iter().filter(|r| r.status == "present").count() as i64;
    let late_count = records.iter().filter(|r| r.status == "late").count() as i64;
    let absent_count = absent_students.len() as i64;

    Ok(HttpResponse::Ok().json(json!({
        "todays_records": records,
        "absent_students": absent_students,
        "total_students": total_students,
        "present_count": present_count,
        "late_count": late_count,
        "absent_count": absent_count,
        "attendance_rate": attendance_rate(present_count + late_count, total_students),
        "date": today,
    })))
}

/// Today's staff attendance (admin only)
#[utoipa::path(
    get,
    path = "/todays_staff",
    responses(
        (status = 200, description = "Today's staff attendance view"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn todays_staff(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Local::now().date_naive();

    let records = todays_staff_marks(&ctx.pool, today, "a.time DESC")
        .await
        .map_err(|e| db_error(e, "todays staff marks"))?;
    let absent_staff = unmarked_staff(&ctx.pool, today)
        .await
        .map_err(|e| db_error(e, "unmarked staff"))?;

    // Staff rows carry the password hash; strip them down for the response.
    let absent_staff: Vec<_> = absent_staff
        .into_iter()
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.name,
                "department": s.department,
            })
        })
        .collect();

    let total_staff = records.len() as i64 + absent_staff.len() as i64;
    let present_count = records.iter().filter(|r| r.status == "present").count() as i64;
    let late_count = records.iter().filter(|r| r.status == "late").count() as i64;
    let absent_count = absent_staff.len() as i64;

    Ok(HttpResponse::Ok().json(json!({
        "todays_records": records,
        "absent_staff": absent_staff,
        "total_staff": total_staff,
        "present_count": present_count,
        "late_count": late_count,
        "absent_count": absent_count,
        "attendance_rate": attendance_rate(present_count + late_count, total_staff),
        "date": today,
    })))
}

/// Real-time attendance counters for the dashboards
#[utoipa::path(
    get,
    path = "/attendance_statistics",
    responses(
        (status = 200, description = "Today's counters for students and staff"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_statistics(
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now();
    let today = now.date_naive();

    let (total_students, students_present, students_late, students_marked) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT (SELECT COUNT(*) FROM students),
                   COUNT(CASE WHEN status = 'present' THEN id END),
                   COUNT(CASE WHEN status = 'late' THEN id END),
                   COUNT(id)
            FROM attendance
            WHERE date = ?
            "#,
        )
        .bind(today)
        .fetch_one(&ctx.pool)
        .await
        .map_err(|e| db_error(e, "student statistics"))?;

    let (total_staff, staff_present, staff_late, staff_marked) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT (SELECT COUNT(*) FROM staff),
                   COUNT(CASE WHEN status = 'present' THEN id END),
                   COUNT(CASE WHEN status = 'late' THEN id END),
                   COUNT(id)
            FROM staff_attendance
            WHERE date = ?
            "#,
        )
        .bind(today)
        .fetch_one(&ctx.pool)
        .await
        .map_err(|e| db_error(e, "staff statistics"))?;

    Ok(HttpResponse::Ok().json(json!({
        "students": {
            "total": total_students,
            "present": students_present,
            "late": students_late,
            "absent": total_students - students_marked,
            "marked": students_marked,
        },
        "staff": {
            "total": total_staff,
            "present": staff_present,
            "late": staff_late,
            "absent": total_staff - staff_marked,
            "marked": staff_marked,
        },
        "date": today.format("%Y-%m-%d").to_string(),
        "time": now.format("%H:%M:%S").to_string(),
    })))
}

fn csv_download(filename: String, content: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", format!("attachment; filename={}", filename)))
        .body(content)
}

/// Today's student report as CSV
#[utoipa::path(
    get,
    path = "/student_daily_report",
    responses(
        (status = 200, description = "CSV attachment, one row per student"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn student_daily_report(
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();

    let marked = todays_student_marks(&ctx.pool, today, "s.name")
        .await
        .map_err(|e| db_error(e, "todays student marks"))?;
    let unmarked = unmarked_students(&ctx.pool, today)
        .await
        .map_err(|e| db_error(e, "unmarked students"))?;

    let mut lines = Vec::with_capacity(marked.len() + unmarked.len());

    for r in &marked {
        lines.push(csv::line(&[
            &r.name,
            &r.reg_no,
            &r.department,
            &r.time.format("%H:%M:%S").to_string(),
            &r.status,
            &r.parent_phone,
        ]));
    }

    for s in &unmarked {
        lines.push(csv::line(&[
            &s.name,
            &s.reg_no,
            &s.department,
            "Not Marked",
            "Absent",
            &s.parent_phone,
        ]));
    }

    let content = csv::document(
        "Student Name,Registration No,Department,Time,Status,Parent Phone",
        &lines,
    );

    Ok(csv_download(
        format!("student_daily_report_{}.csv", today.format("%Y%m%d")),
        content,
    ))
}

/// Today's staff report as CSV (admin only)
#[utoipa::path(
    get,
    path = "/staff_daily_report",
    responses(
        (status = 200, description = "CSV attachment, one row per staff member"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn staff_daily_report(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = Local::now().date_naive();

    let marked = todays_staff_marks(&ctx.pool, today, "s.name")
        .await
        .map_err(|e| db_error(e, "todays staff marks"))?;
    let unmarked = unmarked_staff(&ctx.pool, today)
        .await
        .map_err(|e| db_error(e, "unmarked staff"))?;

    let mut lines = Vec::with_capacity(marked.len() + unmarked.len());

    for r in &marked {
        lines.push(csv::line(&[
            &r.name,
            &r.department,
            &r.time.format("%H:%M:%S").to_string(),
            &r.status,
        ]));
    }

    for s in &unmarked {
        lines.push(csv::line(&[&s.name, &s.department, "Not Marked", "Absent"]));
    }

    let content = csv::document("Staff Name,Department,Time,Status", &lines);

    Ok(csv_download(
        format!("staff_daily_report_{}.csv", today.format("%Y%m%d")),
        content,
    ))
}

#[derive(sqlx::FromRow)]
struct StudentHistoryRow {
    name: String,
    reg_no: String,
    department: String,
    parent_phone: String,
    date: NaiveDate,
    time: NaiveTime,
    status: String,
}

#[derive(sqlx::FromRow)]
struct StaffHistoryRow {
    id: u64,
    name: String,
    department: String,
    date: NaiveDate,
    time: NaiveTime,
    status: String,
}

/// Full attendance history for students and staff as CSV (admin only)
#[utoipa::path(
    get,
    path = "/download_reports",
    responses(
        (status = 200, description = "CSV attachment with the complete ledger"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn download_reports(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_records = sqlx::query_as::<_, StudentHistoryRow>(
        r#"
        SELECT s.name, s.reg_no, s.department, s.parent_phone, a.date, a.time, a.status
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        ORDER BY a.date, s.name
        "#,
    )
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| db_error(e, "student history"))?;

    let staff_records = sqlx::query_as::<_, StaffHistoryRow>(
        r#"
        SELECT s.id, s.name, s.department, a.date, a.time, a.status
        FROM staff_attendance a
        JOIN staff s ON s.id = a.staff_id
        ORDER BY a.date, s.name
        "#,
    )
    .fetch_all(&ctx.pool)
    .await
    .map_err(|e| db_error(e, "staff history"))?;

    let mut lines = Vec::with_capacity(student_records.len() + staff_records.len());

    for r in &student_records {
        lines.push(csv::line(&[
            "Student",
            &r.name,
            &r.reg_no,
            &r.department,
            &r.date.format("%Y-%m-%d").to_string(),
            &r.time.format("%H:%M:%S").to_string(),
            &r.status,
            &r.parent_phone,
        ]));
    }

    for r in &staff_records {
        lines.push(csv::line(&[
            "Staff",
            &r.name,
            &r.id.to_string(),
            &r.department,
            &r.date.format("%Y-%m-%d").to_string(),
            &r.time.format("%H:%M:%S").to_string(),
            &r.status,
            "N/A",
        ]));
    }

    let content = csv::document(
        "Type,Name,ID/Reg No,Department,Date,Time,Status,Contact Phone",
        &lines,
    );

    Ok(csv_download(
        format!(
            "comprehensive_attendance_report_{}.csv",
            Local::now().format("%Y%m%d")
        ),
        content,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_of_empty_roster_is_zero() {
        assert_eq!(attendance_rate(0, 0), 0.0);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        // 2 of 3 attended
        assert_eq!(attendance_rate(2, 3), 66.7);
        assert_eq!(attendance_rate(1, 8), 12.5);
    }

    #[test]
    fn full_house_is_hundred() {
        assert_eq!(attendance_rate(12, 12), 100.0);
    }
}
