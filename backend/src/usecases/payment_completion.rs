use std::sync::Arc;

use anyhow::Result;
use crates::{
    domain::{
        entities::{
            entitlements::{InsertEnrollmentEntity, InsertProjectPurchaseEntity},
            payments::PaymentEntity,
        },
        repositories::{
            entitlements::EntitlementRepository, payments::PaymentRepository,
            users::UserRepository,
        },
        value_objects::{
            payments::{EntitlementTarget, PaymentChanges},
            users::AccountRequest,
        },
    },
    notifications::{EmailSender, WelcomeEmail},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::account_provisioner::{AccountProvisioner, ProvisionedAccount};

/// What the completion step did, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub user_id: Uuid,
    pub account_created: bool,
    pub entitlement: Option<EntitlementTarget>,
    pub welcome_sent: bool,
}

/// Side effects of a payment reaching `completed`: account, access, entitlement, welcome email.
pub struct PaymentCompletion {
    payment_repository: Arc<dyn PaymentRepository>,
    user_repository: Arc<dyn UserRepository>,
    entitlement_repository: Arc<dyn EntitlementRepository>,
    account_provisioner: Arc<AccountProvisioner>,
    email_sender: Arc<dyn EmailSender>,
    dashboard_url: String,
}

impl PaymentCompletion {
    pub fn new(
        payment_repository: Arc<dyn PaymentRepository>,
        user_repository: Arc<dyn UserRepository>,
        entitlement_repository: Arc<dyn EntitlementRepository>,
        account_provisioner: Arc<AccountProvisioner>,
        email_sender: Arc<dyn EmailSender>,
        dashboard_url: String,
    ) -> Self {
        Self {
            payment_repository,
            user_repository,
            entitlement_repository,
            account_provisioner,
            email_sender,
            dashboard_url,
        }
    }

    /// Never fails: errors are logged and reported as `false`.
    pub async fn complete(&self, payment: &PaymentEntity) -> bool {
        match self.try_complete(payment).await {
            Ok(report) => {
                info!(
                    payment_id = %payment.id,
                    external_id = %payment.external_id,
                    user_id = %report.user_id,
                    account_created = report.account_created,
                    welcome_sent = report.welcome_sent,
                    "payment_completion: side effects applied"
                );
                true
            }
            Err(err) => {
                error!(
                    payment_id = %payment.id,
                    external_id = %payment.external_id,
                    error = ?err,
                    "payment_completion: side effects failed"
                );
                false
            }
        }
    }

    pub async fn try_complete(&self, payment: &PaymentEntity) -> Result<CompletionReport> {
        let (user_id, new_password) = match payment.user_id {
            Some(user_id) => (user_id, None),
            None => {
                let request = AccountRequest::student(
                    &payment.customer_email,
                    &payment.customer_name,
                    payment.customer_phone.as_deref(),
                );
                let account = self.account_provisioner.provision(&request).await?;
                let user_id = account.user().id;

                self.payment_repository
                    .update(payment.id, PaymentChanges::default().with_user(user_id))
                    .await?;

                match account {
                    ProvisionedAccount::Existing(_) => (user_id, None),
                    ProvisionedAccount::Created { password, .. } => (user_id, Some(password)),
                }
            }
        };

        self.user_repository.grant_access(user_id).await?;

        let entitlement = payment.purchase_metadata().entitlement_target();
        match entitlement {
            Some(EntitlementTarget::Project(project_id)) => {
                let inserted = self
                    .entitlement_repository
                    .grant_project(InsertProjectPurchaseEntity {
                        user_id,
                        project_id,
                        payment_id: Some(payment.id),
                    })
                    .await?;
                info!(%user_id, %project_id, inserted, "payment_completion: project access granted");
            }
            Some(EntitlementTarget::Course(course_id)) => {
                let inserted = self
                    .entitlement_repository
                    .enroll_course(InsertEnrollmentEntity {
                        user_id,
                        course_id,
                        payment_id: Some(payment.id),
                    })
                    .await?;
                info!(%user_id, %course_id, inserted, "payment_completion: course enrollment granted");
            }
            None => warn!(
                payment_id = %payment.id,
                "payment_completion: no purchase target in metadata"
            ),
        }

        // Existing accounts already know their password, so only new ones get mail.
        let mut welcome_sent = false;
        if let Some(password) = new_password.as_ref() {
            let email = WelcomeEmail {
                to: payment.customer_email.clone(),
                name: payment.customer_name.clone(),
                password: password.clone(),
                dashboard_url: self.dashboard_url.clone(),
            };
            match self.email_sender.send_welcome(email).await {
                Ok(()) => welcome_sent = true,
                Err(err) => error!(
                    payment_id = %payment.id,
                    %user_id,
                    error = ?err,
                    "payment_completion: welcome email failed"
                ),
            }
        }

        Ok(CompletionReport {
            user_id,
            account_created: new_password.is_some(),
            entitlement,
            welcome_sent,
        })
    }
}
