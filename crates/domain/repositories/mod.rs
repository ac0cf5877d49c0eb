pub mod entitlements;
pub mod lesson_progress;
pub mod payments;
pub mod users;
