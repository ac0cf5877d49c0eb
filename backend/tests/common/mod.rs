#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use backend::{
    services::payment_broadcaster::PaymentBroadcaster,
    usecases::{
        account_provisioner::AccountProvisioner, payment_completion::PaymentCompletion,
        payment_reconciliation::PaymentReconciliationUseCase, payments::PaymentUseCase,
    },
};
use chrono::Utc;
use crates::{
    domain::{
        entities::{
            entitlements::{InsertEnrollmentEntity, InsertProjectPurchaseEntity},
            payments::{InsertPaymentEntity, PaymentEntity},
            users::{InsertUserEntity, UpdateUserProfileEntity, UserEntity},
        },
        repositories::{
            entitlements::EntitlementRepository,
            payments::PaymentRepository,
            users::{UserRepository, UserStoreError},
        },
        value_objects::{
            enums::{payment_statuses::PaymentStatus, user_roles::UserRole},
            gateway_webhook::GatewayWebhook,
            payments::PaymentChanges,
        },
    },
    infra::identity::supabase_auth::IdentityProvider,
    notifications::{EmailSender, PaymentPendingEmail, WelcomeEmail},
    payments::{ChargeRequest, ChargeResponse, PaymentGateway},
};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DASHBOARD_URL: &str = "https://app.example.com/dashboard";

/// Payment rows keyed by id, with the same conditional-update semantics as the SQL store.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<Uuid, PaymentEntity>>>,
}

impl InMemoryPaymentStore {
    pub async fn get(&self, external_id: &str) -> Option<PaymentEntity> {
        let payments = self.payments.read().await;
        payments
            .values()
            .find(|payment| payment.external_id == external_id)
            .cloned()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentStore {
    async fn create(&self, payment: InsertPaymentEntity) -> Result<PaymentEntity> {
        let now = Utc::now();
        let row = PaymentEntity {
            id: Uuid::new_v4(),
            external_id: payment.external_id,
            user_id: payment.user_id,
            customer_name: payment.customer_name,
            customer_email: payment.customer_email,
            customer_phone: payment.customer_phone,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            payment_method: payment.payment_method,
            status: payment.status,
            reference_code: None,
            entity_code: None,
            metadata: payment.metadata,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        let mut payments = self.payments.write().await;
        if payments.values().any(|p| p.external_id == row.external_id) {
            return Err(anyhow!("duplicate external_id {}", row.external_id));
        }
        payments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_any_id(&self, id: &str) -> Result<Option<PaymentEntity>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .find(|p| p.id.to_string() == id || p.external_id == id)
            .cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PaymentEntity>> {
        Ok(self.get(external_id).await)
    }

    async fn update(&self, payment_id: Uuid, changes: PaymentChanges) -> Result<PaymentEntity> {
        let mut payments = self.payments.write().await;
        let row = payments
            .get_mut(&payment_id)
            .ok_or_else(|| anyhow!("payment {payment_id} not found"))?;
        changes.apply(row, Utc::now());
        Ok(row.clone())
    }

    async fn transition(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        changes: PaymentChanges,
    ) -> Result<Option<PaymentEntity>> {
        let mut payments = self.payments.write().await;
        let row = payments
            .get_mut(&payment_id)
            .ok_or_else(|| anyhow!("payment {payment_id} not found"))?;
        if row.status() != from {
            return Ok(None);
        }
        changes.apply(row, Utc::now());
        Ok(Some(row.clone()))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserEntity>>>,
}

impl InMemoryUserStore {
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn get(&self, user_id: Uuid) -> Option<UserEntity> {
        self.users.read().await.get(&user_id).cloned()
    }

    pub async fn seed(&self, email: &str, has_access: bool) -> UserEntity {
        let now = Utc::now();
        let user = UserEntity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: Some("Existing Student".to_string()),
            phone: None,
            avatar_url: None,
            role: UserRole::Student.to_string(),
            has_access,
            email_notifications: true,
            sms_notifications: false,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.insert(user.id, user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.get(user_id).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, user: InsertUserEntity) -> Result<UserEntity, UserStoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id)
            || users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(UserStoreError::DuplicateKey);
        }
        let now = Utc::now();
        let row = UserEntity {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            avatar_url: None,
            role: user.role,
            has_access: user.has_access,
            email_notifications: true,
            sms_notifications: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn grant_access(&self, user_id: Uuid) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow!("user {user_id} not found"))?;
        user.has_access = true;
        Ok(())
    }

    async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow!("user {user_id} not found"))?;
        user.role = role.to_string();
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        profile: UpdateUserProfileEntity,
    ) -> Result<Option<UserEntity>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(full_name) = profile.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(phone) = profile.phone {
            user.phone = Some(phone);
        }
        if let Some(updated_at) = profile.updated_at {
            user.updated_at = updated_at;
        }
        Ok(Some(user.clone()))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryEntitlementStore {
    projects: Arc<RwLock<HashSet<(Uuid, Uuid)>>>,
    courses: Arc<RwLock<HashSet<(Uuid, Uuid)>>>,
}

impl InMemoryEntitlementStore {
    pub async fn enrollments(&self) -> usize {
        self.courses.read().await.len()
    }

    pub async fn project_purchases(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> bool {
        self.courses.read().await.contains(&(user_id, course_id))
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementStore {
    async fn grant_project(&self, purchase: InsertProjectPurchaseEntity) -> Result<bool> {
        let mut projects = self.projects.write().await;
        Ok(projects.insert((purchase.user_id, purchase.project_id)))
    }

    async fn enroll_course(&self, enrollment: InsertEnrollmentEntity) -> Result<bool> {
        let mut courses = self.courses.write().await;
        Ok(courses.insert((enrollment.user_id, enrollment.course_id)))
    }
}

#[derive(Default, Clone)]
pub struct FakeIdentityProvider {
    created: Arc<Mutex<Vec<String>>>,
}

impl FakeIdentityProvider {
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_auth_user(
        &self,
        email: &str,
        _password: &str,
        _full_name: &str,
        _phone: Option<String>,
    ) -> Result<Uuid> {
        self.created.lock().unwrap().push(email.to_string());
        Ok(Uuid::new_v4())
    }
}

#[derive(Default, Clone)]
pub struct RecordingEmailSender {
    welcome: Arc<Mutex<Vec<WelcomeEmail>>>,
    pending: Arc<Mutex<Vec<PaymentPendingEmail>>>,
}

impl RecordingEmailSender {
    pub fn welcome(&self) -> Vec<WelcomeEmail> {
        self.welcome.lock().unwrap().clone()
    }

    pub fn pending(&self) -> Vec<PaymentPendingEmail> {
        self.pending.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_welcome(&self, email: WelcomeEmail) -> Result<()> {
        self.welcome.lock().unwrap().push(email);
        Ok(())
    }

    async fn send_payment_pending(&self, email: PaymentPendingEmail) -> Result<()> {
        self.pending.lock().unwrap().push(email);
        Ok(())
    }
}

/// Answers every charge with the same body, or the same error.
#[derive(Clone)]
pub struct FakeGateway {
    outcome: std::result::Result<Value, String>,
    charges: Arc<Mutex<Vec<ChargeRequest>>>,
}

impl FakeGateway {
    pub fn reference(reference_number: &str) -> Self {
        Self::answering(json!({
            "responseStatus": {
                "status": "Pending",
                "successful": true,
                "reference": {"referenceNumber": reference_number, "entity": "11424"}
            }
        }))
    }

    pub fn answering(body: Value) -> Self {
        Self {
            outcome: Ok(body),
            charges: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            charges: Arc::default(),
        }
    }

    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_charge(&self, charge: ChargeRequest) -> Result<ChargeResponse> {
        self.charges.lock().unwrap().push(charge);
        match &self.outcome {
            Ok(body) => Ok(ChargeResponse::from_raw(body.clone())),
            Err(message) => Err(anyhow!(message.clone())),
        }
    }
}

/// The payment workflow wired against in-memory stores.
pub struct World {
    pub payments: InMemoryPaymentStore,
    pub users: InMemoryUserStore,
    pub entitlements: InMemoryEntitlementStore,
    pub identity: FakeIdentityProvider,
    pub emails: RecordingEmailSender,
    pub gateway: FakeGateway,
    pub broadcaster: Arc<PaymentBroadcaster>,
    pub payment_usecase: PaymentUseCase,
    pub reconciliation: PaymentReconciliationUseCase,
}

impl World {
    pub fn new(gateway: FakeGateway) -> Self {
        let payments = InMemoryPaymentStore::default();
        let users = InMemoryUserStore::default();
        let entitlements = InMemoryEntitlementStore::default();
        let identity = FakeIdentityProvider::default();
        let emails = RecordingEmailSender::default();
        let broadcaster = Arc::new(PaymentBroadcaster::new());

        let payment_repository: Arc<dyn PaymentRepository> = Arc::new(payments.clone());
        let user_repository: Arc<dyn UserRepository> = Arc::new(users.clone());
        let email_sender: Arc<dyn EmailSender> = Arc::new(emails.clone());

        let provisioner =
            AccountProvisioner::new(Arc::clone(&user_repository), Arc::new(identity.clone()));
        let completion = PaymentCompletion::new(
            Arc::clone(&payment_repository),
            user_repository,
            Arc::new(entitlements.clone()),
            Arc::new(provisioner),
            Arc::clone(&email_sender),
            DASHBOARD_URL.to_string(),
        );

        Self {
            payment_usecase: PaymentUseCase::new(
                Arc::clone(&payment_repository),
                Arc::new(gateway.clone()),
                Arc::clone(&broadcaster),
            ),
            reconciliation: PaymentReconciliationUseCase::new(
                payment_repository,
                Arc::new(completion),
                email_sender,
                Arc::clone(&broadcaster),
            ),
            payments,
            users,
            entitlements,
            identity,
            emails,
            gateway,
            broadcaster,
        }
    }
}

pub fn create_request(method: &str, email: &str, course_id: Uuid) -> Value {
    json!({
        "amount": 15000,
        "customerName": "Ana Silva",
        "customerEmail": email,
        "customerPhone": "923000000",
        "paymentMethod": method,
        "courseId": course_id.to_string()
    })
}

pub fn webhook(external_id: &str, status: &str) -> GatewayWebhook {
    serde_json::from_value(json!({
        "merchantTransactionId": external_id,
        "responseStatus": {"status": status, "successful": true}
    }))
    .unwrap()
}
