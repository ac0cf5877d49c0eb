pub mod payment_broadcaster;
pub mod payment_stream;
