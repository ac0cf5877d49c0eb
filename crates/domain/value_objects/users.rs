use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{entities::users::UserEntity, value_objects::enums::user_roles::UserRole};

/// Identity details the provisioner needs to find or mint an account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRequest {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

impl AccountRequest {
    pub fn student(email: &str, full_name: &str, phone: Option<&str>) -> Self {
        Self {
            email: email.trim().to_owned(),
            full_name: full_name.trim().to_owned(),
            phone: phone.map(str::to_owned),
            role: UserRole::Student,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub has_access: bool,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for UserDto {
    fn from(value: UserEntity) -> Self {
        let role = value.role();
        Self {
            id: value.id,
            email: value.email,
            full_name: value.full_name,
            phone: value.phone,
            avatar_url: value.avatar_url,
            role,
            has_access: value.has_access,
            email_notifications: value.email_notifications,
            sms_notifications: value.sms_notifications,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserStats {
    pub lessons: i64,
    pub courses: i64,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSettingsDto {
    pub phone: Option<String>,
    pub email_notifications: bool,
    pub sms_notifications: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserStatsDto {
    pub stats: UserStats,
    pub settings: UserSettingsDto,
}

/// Whole days since `joined`, rounded up, so a same-day signup counts as day one.
pub fn days_since(joined: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (now - joined).num_seconds().abs();
    (seconds + 86_399) / 86_400
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserProfileModel {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn days_since_rounds_up_partial_days() {
        let joined = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(days_since(joined, joined), 0);
        assert_eq!(days_since(joined, joined + Duration::hours(1)), 1);
        assert_eq!(days_since(joined, joined + Duration::days(3)), 3);
        assert_eq!(days_since(joined, joined + Duration::days(3) + Duration::minutes(1)), 4);
    }
}
