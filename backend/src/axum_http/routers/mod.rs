pub mod payments;
pub mod progress;
pub mod users;
pub mod webhooks;
