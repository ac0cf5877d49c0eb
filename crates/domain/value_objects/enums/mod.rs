pub mod payment_methods;
pub mod payment_statuses;
pub mod purchase_types;
pub mod user_roles;
