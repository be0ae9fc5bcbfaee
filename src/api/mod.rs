pub mod dashboard;
pub mod reports;
pub mod scan;
pub mod staff;
pub mod students;
