pub mod enums;
pub mod gateway_webhook;
pub mod payments;
pub mod progress;
pub mod users;
