use crate::context::AppContext;
use crate::model::staff::Staff;
use crate::model::status::AttendanceStatus;
use crate::model::student::Student;
use crate::utils::sms::{absent_message, late_message};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScanReq {
    #[schema(example = "A1B2C3D4")]
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum PersonKind {
    #[display(fmt = "student")]
    Student,
    #[display(fmt = "staff")]
    Staff,
}

enum ScanOutcome {
    Recorded,
    AlreadyMarked { time: NaiveTime, status: String },
}

#[derive(sqlx::FromRow)]
struct ExistingMark {
    time: NaiveTime,
    status: String,
}

/// Insert today's row and let the UNIQUE (person, date) key arbitrate
/// concurrent scans: a 23000 conflict means the person is already marked,
/// and the existing row is read back for the warning payload.
async fn mark_attendance(
    pool: &MySqlPool,
    table: &str,
    person_col: &str,
    person_id: u64,
    date: NaiveDate,
    time: NaiveTime,
    status: AttendanceStatus,
) -> Result<ScanOutcome, sqlx::Error> {
    let insert_sql = format!(
        "INSERT INTO {} ({}, date, time, status) VALUES (?, ?, ?, ?)",
        table, person_col
    );

    let insert_result = sqlx::query(&insert_sql)
        .bind(person_id)
        .bind(date)
        .bind(time)
        .bind(status.to_string())
        .execute(pool)
        .await;

    match insert_result {
        Ok(_) => Ok(ScanOutcome::Recorded),
        Err(e) => {
            let is_duplicate = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000")
            );
            if !is_duplicate {
                return Err(e);
            }

            let select_sql = format!(
                "SELECT time, status FROM {} WHERE {} = ? AND date = ?",
                table, person_col
            );
            let existing = sqlx::query_as::<_, ExistingMark>(&select_sql)
                .bind(person_id)
                .bind(date)
                .fetch_optional(pool)
                .await?;

            match existing {
                Some(mark) => Ok(ScanOutcome::AlreadyMarked {
                    time: mark.time,
                    status: mark.status,
                }),
                None => Err(e),
            }
        }
    }
}

fn already_marked_response(
    name: &str,
    kind: PersonKind,
    time: NaiveTime,
    status: &str,
) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "warning",
        "message": "Already Marked Today",
        "subtitle": format!(
            "{} ({}) attendance already recorded at {}",
            name,
            kind,
            time.format("%H:%M")
        ),
        "person_name": name,
        "person_type": kind.to_string(),
        "already_marked": true,
        "existing_time": time.format("%H:%M").to_string(),
        "existing_status": status,
    }))
}

fn storage_error_response() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "status": "error",
        "message": "Database Error",
        "subtitle": "Failed to mark attendance. Please try again."
    }))
}

/// Scan endpoint for both students and staff
///
/// Students are checked before staff; scan codes are unique across both.
#[utoipa::path(
    post,
    path = "/scan_barcode",
    request_body = ScanReq,
    responses(
        (status = 201, description = "Attendance recorded"),
        (status = 200, description = "Already marked today (warning, carries the prior time and status)"),
        (status = 400, description = "No scan code in the request"),
        (status = 404, description = "Scan code not registered"),
        (status = 500, description = "Storage failure, nothing written")
    ),
    tag = "Scan"
)]
pub async fn scan_barcode(
    ctx: web::Data<AppContext>,
    payload: web::Json<ScanReq>,
) -> impl Responder {
    let barcode = match payload.barcode.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => b,
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": "No QR code data received"
            }));
        }
    };

    info!(barcode, "QR code scan attempt");

    let student = match sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, reg_no, department, parent_phone, barcode, created_at
        FROM students
        WHERE barcode = ?
        "#,
    )
    .bind(barcode)
    .fetch_optional(&ctx.pool)
    .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, barcode, "Failed to look up student by scan code");
            return storage_error_response();
        }
    };

    let staff = if student.is_none() {
        match sqlx::query_as::<_, Staff>(
            r#"
            SELECT id, name, department, password, barcode, created_at
            FROM staff
            WHERE barcode = ?
            "#,
        )
        .bind(barcode)
        .fetch_optional(&ctx.pool)
        .await
        {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, barcode, "Failed to look up staff by scan code");
                return storage_error_response();
            }
        }
    } else {
        None
    };

    let (person_id, person_name, department, parent_phone, kind) = match (&student, &staff) {
        (Some(s), _) => (
            s.id,
            s.name.clone(),
            s.department.clone(),
            Some(s.parent_phone.clone()),
            PersonKind::Student,
        ),
        (None, Some(s)) => (
            s.id,
            s.name.clone(),
            s.department.clone(),
            None,
            PersonKind::Staff,
        ),
        (None, None) => {
            info!(barcode, "No person found for scan code");
            return HttpResponse::NotFound().json(json!({
                "status": "error",
                "message": "Invalid QR Code - Person not found in system",
                "subtitle": "Please ensure the QR code belongs to a registered student or staff member"
            }));
        }
    };

    let now = Local::now();
    let today = now.date_naive();
    let now_time = now.time();
    let status = AttendanceStatus::classify(now_time, &ctx.windows);

    let (table, person_col) = match kind {
        PersonKind::Student => ("attendance", "student_id"),
        PersonKind::Staff => ("staff_attendance", "staff_id"),
    };

    let outcome = match mark_attendance(
        &ctx.pool, table, person_col, person_id, today, now_time, status,
    )
    .await
    {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, person_id, "Failed to mark attendance");
            return storage_error_response();
        }
    };

    if let ScanOutcome::AlreadyMarked { time, status } = outcome {
        return already_marked_response(&person_name, kind, time, &status);
    }

    info!(person = %person_name, %kind, %status, "Attendance marked");

    // Parent SMS for late/absent students, detached from the request so the
    // recorded row never depends on the provider.
    let mut sms_queued = false;
    if kind == PersonKind::Student
        && matches!(status, AttendanceStatus::Late | AttendanceStatus::Absent)
    {
        if let Some(phone) = parent_phone.filter(|p| !p.is_empty()) {
            let message = match status {
                AttendanceStatus::Late => late_message(&person_name, now_time),
                _ => absent_message(&person_name),
            };
            let notifier = ctx.notifier.clone();
            let student_name = person_name.clone();
            actix_web::rt::spawn(async move {
                if let Err(e) = notifier.send_sms(phone, message).await {
                    warn!(error = %e, student = %student_name, "Attendance notification failed");
                }
            });
            sms_queued = true;
        }
    }

    let title = match status {
        AttendanceStatus::Present => "Attendance Marked Successfully",
        AttendanceStatus::Late => "Marked as Late",
        AttendanceStatus::Absent => "Marked as Absent",
    };

    HttpResponse::Created().json(json!({
        "status": "success",
        "message": title,
        "subtitle": format!(
            "{} ({}) - {} at {}",
            person_name,
            kind,
            status.to_string().to_uppercase(),
            now_time.format("%H:%M")
        ),
        "person_name": person_name,
        "person_type": kind.to_string(),
        "attendance_status": status,
        "time": now_time.format("%H:%M").to_string(),
        "date": today.format("%B %d, %Y").to_string(),
        "sms_queued": sms_queued,
        "department": department,
    }))
}

/// Staff-only scan endpoint used by the staff attendance page
#[utoipa::path(
    post,
    path = "/scan_staff_barcode",
    request_body = ScanReq,
    responses(
        (status = 201, description = "Staff attendance recorded"),
        (status = 200, description = "Already marked today"),
        (status = 400, description = "No scan code in the request"),
        (status = 404, description = "Unknown staff scan code"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Scan"
)]
pub async fn scan_staff_barcode(
    ctx: web::Data<AppContext>,
    payload: web::Json<ScanReq>,
) -> impl Responder {
    let barcode = match payload.barcode.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => b,
        _ => {
            return HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": "No barcode data received"
            }));
        }
    };

    info!(barcode, "Staff scan attempt");

    let staff = match sqlx::query_as::<_, Staff>(
        r#"
        SELECT id, name, department, password, barcode, created_at
        FROM staff
        WHERE barcode = ?
        "#,
    )
    .bind(barcode)
    .fetch_optional(&ctx.pool)
    .await
    {
        Ok(Some(s)) => s,
        Ok(None) => {
            info!(barcode, "Staff not found for scan code");
            return HttpResponse::NotFound().json(json!({
                "status": "error",
                "message": "Invalid staff barcode"
            }));
        }
        Err(e) => {
            error!(error = %e, barcode, "Failed to look up staff by scan code");
            return storage_error_response();
        }
    };

    let now = Local::now();
    let today = now.date_naive();
    let now_time = now.time();
    let status = AttendanceStatus::classify(now_time, &ctx.windows);

    let outcome = match mark_attendance(
        &ctx.pool,
        "staff_attendance",
        "staff_id",
        staff.id,
        today,
        now_time,
        status,
    )
    .await
    {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, staff_id = staff.id, "Failed to mark staff attendance");
            return storage_error_response();
        }
    };

    if let ScanOutcome::AlreadyMarked { time, status } = outcome {
        return HttpResponse::Ok().json(json!({
            "status": "warning",
            "message": format!(
                "Attendance already marked for {} today at {}",
                staff.name,
                time.format("%H:%M")
            ),
            "existing_time": time.format("%H:%M").to_string(),
            "existing_status": status,
        }));
    }

    info!(staff = %staff.name, %status, "Staff attendance marked");

    HttpResponse::Created().json(json!({
        "status": "success",
        "message": format!(
            "Staff attendance marked for {} - Status: {}",
            staff.name,
            status.to_string().to_uppercase()
        ),
        "staff_name": staff.name,
        "attendance_status": status,
        "time": now_time.format("%H:%M").to_string(),
    }))
}
