use crate::{
    api::{dashboard, reports, scan, staff, students},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes: login/token handling and the scanner kiosk endpoints
    cfg.service(
        web::resource("/login")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::login)),
    )
    .service(
        web::resource("/refresh")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::refresh_token)),
    )
    .service(
        web::resource("/logout")
            .wrap(login_limiter.clone())
            .route(web::get().to(handlers::logout)),
    )
    .service(
        web::resource("/scan_barcode")
            .wrap(scan_limiter.clone())
            .route(web::post().to(scan::scan_barcode)),
    )
    .service(
        web::resource("/scan_staff_barcode")
            .wrap(scan_limiter)
            .route(web::post().to(scan::scan_staff_barcode)),
    );

    // Protected routes
    cfg.service(
        web::scope("")
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/admin_dashboard").route(web::get().to(dashboard::admin_dashboard)))
            .service(web::resource("/staff_dashboard").route(web::get().to(dashboard::staff_dashboard)))
            .service(web::resource("/register_staff").route(web::post().to(staff::register_staff)))
            .service(
                web::resource("/register_student").route(web::post().to(students::register_student)),
            )
            .service(
                web::resource("/student_details/{id}")
                    .route(web::get().to(students::student_details)),
            )
            .service(
                web::resource("/staff_details/{id}").route(web::get().to(staff::staff_details)),
            )
            .service(
                web::resource("/staff_attendance").route(web::get().to(staff::staff_attendance)),
            )
            .service(web::resource("/todays_students").route(web::get().to(reports::todays_students)))
            .service(web::resource("/todays_staff").route(web::get().to(reports::todays_staff)))
            .service(web::resource("/all_students").route(web::get().to(students::all_students)))
            .service(
                web::resource("/attendance_statistics")
                    .route(web::get().to(reports::attendance_statistics)),
            )
            .service(
                web::resource("/student_daily_report")
                    .route(web::get().to(reports::student_daily_report)),
            )
            .service(
                web::resource("/staff_daily_report")
                    .route(web::get().to(reports::staff_daily_report)),
            )
            .service(
                web::resource("/download_reports").route(web::get().to(reports::download_reports)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
