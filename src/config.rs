use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_scan_per_min: u32,
    pub rate_protected_per_min: u32,

    // Attendance windows (minutes after the 09:00 opening)
    pub attendance_time_limit: u32,
    pub late_time_limit: u32,

    // SMS provider (optional; notifications are skipped when unset)
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,

    // Bootstrap admin
    pub default_admin_username: String,
    pub default_admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_scan_per_min: env::var("RATE_SCAN_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            attendance_time_limit: env::var("ATTENDANCE_TIME_LIMIT")
                .unwrap_or_else(|_| "30".to_string()) // present until 09:30
                .parse()
                .unwrap(),
            late_time_limit: env::var("LATE_TIME_LIMIT")
                .unwrap_or_else(|_| "60".to_string()) // late until 10:00
                .parse()
                .unwrap(),

            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").ok().filter(|v| !v.is_empty()),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").ok().filter(|v| !v.is_empty()),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER").ok().filter(|v| !v.is_empty()),

            default_admin_username: env::var("DEFAULT_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
        }
    }
}
