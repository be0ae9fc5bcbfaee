use crate::api::reports::{StaffMarkRow, StudentMarkRow};
use crate::api::scan::ScanReq;
use crate::api::staff::{RegisterStaff, StaffDetailsResponse, StaffResponse, StaffSummary};
use crate::api::students::{RegisterStudent, StudentDetailsResponse, StudentSummary};
use crate::model::attendance::{Attendance, StaffAttendance};
use crate::model::status::AttendanceStatus;
use crate::model::student::Student;
use crate::models::{LoginReqDto, PrincipalKind};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance API",
        version = "1.0.0",
        description = r#"
## School Attendance Management System

Staff and students are registered with a unique scan code; scanning the code
marks daily attendance, classified as **present**, **late**, or **absent**
from the scan time.

### 🔹 Key Features
- **Registration**
  - Register staff and students, each issued a unique scan code
- **Attendance Marking**
  - QR/barcode scan endpoints with automatic status classification
  - One record per person per day, enforced by the database
- **Notifications**
  - Parents of late/absent students are notified by SMS, best effort
- **Reports**
  - Today's views, per-person percentages, CSV downloads

### 🔐 Security
Dashboard and report endpoints are protected with **JWT Bearer
authentication**; admin-only operations check the principal's role.
The scan endpoints are open for kiosk use and rate limited.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::scan::scan_barcode,
        crate::api::scan::scan_staff_barcode,

        crate::api::students::register_student,
        crate::api::students::student_details,
        crate::api::students::all_students,

        crate::api::staff::register_staff,
        crate::api::staff::staff_details,
        crate::api::staff::staff_attendance,

        crate::api::dashboard::admin_dashboard,
        crate::api::dashboard::staff_dashboard,

        crate::api::reports::todays_students,
        crate::api::reports::todays_staff,
        crate::api::reports::attendance_statistics,
        crate::api::reports::student_daily_report,
        crate::api::reports::staff_daily_report,
        crate::api::reports::download_reports
    ),
    components(
        schemas(
            LoginReqDto,
            PrincipalKind,
            ScanReq,
            AttendanceStatus,
            Student,
            Attendance,
            StaffAttendance,
            RegisterStudent,
            StudentDetailsResponse,
            StudentSummary,
            RegisterStaff,
            StaffResponse,
            StaffDetailsResponse,
            StaffSummary,
            StudentMarkRow,
            StaffMarkRow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token APIs"),
        (name = "Scan", description = "Attendance marking APIs"),
        (name = "Students", description = "Student management APIs"),
        (name = "Staff", description = "Staff management APIs"),
        (name = "Dashboard", description = "Dashboard APIs"),
        (name = "Reports", description = "Reporting and CSV export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
