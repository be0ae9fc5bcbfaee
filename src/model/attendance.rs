use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub student_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:10:00", value_type = String)]
    pub time: NaiveTime,
    #[schema(example = "present")]
    pub status: String,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct StaffAttendance {
    pub id: u64,
    pub staff_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:10:00", value_type = String)]
    pub time: NaiveTime,
    #[schema(example = "present")]
    pub status: String,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<NaiveDateTime>,
}

/// Share of recorded days counted as attended (present or late), as a
/// percentage rounded to two decimals. No records means 0.
pub fn attendance_percentage(attended_days: i64, total_days: i64) -> f64 {
    if total_days <= 0 {
        return 0.0;
    }
    let pct = attended_days as f64 / total_days as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_records_is_zero_percent() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
    }

    #[test]
    fn three_present_one_late_one_absent_is_eighty() {
        // 3 present + 1 late attended, out of 5 recorded days
        assert_eq!(attendance_percentage(4, 5), 80.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(attendance_percentage(1, 3), 33.33);
        assert_eq!(attendance_percentage(2, 3), 66.67);
    }

    #[test]
    fn full_attendance_is_hundred() {
        assert_eq!(attendance_percentage(30, 30), 100.0);
    }
}
