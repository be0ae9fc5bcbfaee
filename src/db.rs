use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Statements are idempotent; the UNIQUE keys on (person, date) make the
/// one-row-per-day rule a database guarantee instead of a read-then-insert.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(80) NOT NULL,
        password VARCHAR(255) NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT TRUE,
        UNIQUE KEY uq_admins_username (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staff (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        department VARCHAR(100) NOT NULL,
        password VARCHAR(255) NOT NULL,
        barcode VARCHAR(50) NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_staff_barcode (barcode)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        reg_no VARCHAR(50) NOT NULL,
        department VARCHAR(100) NOT NULL,
        parent_phone VARCHAR(20) NOT NULL,
        barcode VARCHAR(50) NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_students_reg_no (reg_no),
        UNIQUE KEY uq_students_barcode (barcode)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        student_id BIGINT UNSIGNED NOT NULL,
        date DATE NOT NULL,
        time TIME NOT NULL,
        status VARCHAR(20) NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_attendance_student_date (student_id, date),
        CONSTRAINT fk_attendance_student FOREIGN KEY (student_id) REFERENCES students (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staff_attendance (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        staff_id BIGINT UNSIGNED NOT NULL,
        date DATE NOT NULL,
        time TIME NOT NULL,
        status VARCHAR(20) NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE KEY uq_staff_attendance_staff_date (staff_id, date),
        CONSTRAINT fk_staff_attendance_staff FOREIGN KEY (staff_id) REFERENCES staff (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        role_id TINYINT UNSIGNED NOT NULL,
        jti VARCHAR(64) NOT NULL,
        expires_at DATETIME NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT FALSE,
        UNIQUE KEY uq_refresh_tokens_jti (jti)
    )
    "#,
];

pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
