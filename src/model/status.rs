use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Attendance buckets. Stored in the database as lowercase text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

/// Time-of-day boundaries for classification.
///
/// The school day opens at 09:00; the window sizes come from config
/// (minutes after opening).
#[derive(Debug, Clone, Copy)]
pub struct AttendanceWindows {
    pub start: NaiveTime,
    pub present_until: NaiveTime,
    pub late_until: NaiveTime,
}

const DAY_START_HOUR: u32 = 9;

impl AttendanceWindows {
    pub fn from_limits(attendance_limit_min: u32, late_limit_min: u32) -> Self {
        let start = NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0)
            .expect("valid opening time");
        Self {
            start,
            present_until: start + Duration::minutes(i64::from(attendance_limit_min)),
            late_until: start + Duration::minutes(i64::from(late_limit_min)),
        }
    }
}

impl Default for AttendanceWindows {
    fn default() -> Self {
        Self::from_limits(30, 60)
    }
}

impl AttendanceStatus {
    /// Bucket a wall-clock time. Boundary times fall in the earlier bucket.
    pub fn classify(time: NaiveTime, windows: &AttendanceWindows) -> Self {
        if windows.start <= time && time <= windows.present_until {
            AttendanceStatus::Present
        } else if windows.present_until < time && time <= windows.late_until {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Absent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn boundaries_belong_to_earlier_bucket() {
        let w = AttendanceWindows::default();
        assert_eq!(AttendanceStatus::classify(t(9, 0, 0), &w), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::classify(t(9, 30, 0), &w), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::classify(t(9, 30, 1), &w), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::classify(t(10, 0, 0), &w), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::classify(t(10, 0, 1), &w), AttendanceStatus::Absent);
    }

    #[test]
    fn before_opening_is_absent() {
        let w = AttendanceWindows::default();
        assert_eq!(AttendanceStatus::classify(t(0, 0, 0), &w), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::classify(t(8, 59, 59), &w), AttendanceStatus::Absent);
    }

    #[test]
    fn every_second_of_the_day_gets_exactly_one_bucket() {
        let w = AttendanceWindows::default();
        // Sampling each minute of the day is enough to cover all three ranges.
        for h in 0..24 {
            for m in 0..60 {
                let status = AttendanceStatus::classify(t(h, m, 0), &w);
                let expected = if (9, 0) <= (h, m) && (h, m) <= (9, 30) {
                    AttendanceStatus::Present
                } else if (h, m) <= (10, 0) && (h, m) > (9, 30) {
                    AttendanceStatus::Late
                } else {
                    AttendanceStatus::Absent
                };
                assert_eq!(status, expected, "at {:02}:{:02}", h, m);
            }
        }
    }

    #[test]
    fn custom_window_sizes() {
        let w = AttendanceWindows::from_limits(15, 45);
        assert_eq!(AttendanceStatus::classify(t(9, 15, 0), &w), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::classify(t(9, 16, 0), &w), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::classify(t(9, 45, 0), &w), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::classify(t(9, 46, 0), &w), AttendanceStatus::Absent);
    }

    #[test]
    fn status_round_trips_as_lowercase_text() {
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
        assert_eq!(AttendanceStatus::Absent.to_string(), "absent");
        assert_eq!(
            AttendanceStatus::from_str("late").unwrap(),
            AttendanceStatus::Late
        );
    }
}
