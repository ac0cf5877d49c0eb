use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payments},
};
use domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity, PaymentRowUpdate},
    repositories::payments::PaymentRepository,
    value_objects::{enums::payment_statuses::PaymentStatus, payments::PaymentChanges},
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Locks the row, applies `changes` when the status guard holds, and writes it back.
fn apply_changes_locked(
    conn: &mut PgConnection,
    payment_id: Uuid,
    from: Option<PaymentStatus>,
    changes: &PaymentChanges,
) -> Result<Option<PaymentEntity>, diesel::result::Error> {
    conn.transaction::<Option<PaymentEntity>, diesel::result::Error, _>(|conn| {
        let Some(mut payment) = payments::table
            .filter(payments::id.eq(payment_id))
            .select(PaymentEntity::as_select())
            .for_update()
            .first::<PaymentEntity>(conn)
            .optional()?
        else {
            return Ok(None);
        };

        if from.is_some_and(|from| payment.status() != from) {
            return Ok(None);
        }

        changes.apply(&mut payment, Utc::now());

        let updated = update(payments::table.find(payment_id))
            .set(PaymentRowUpdate::from(&payment))
            .returning(PaymentEntity::as_select())
            .get_result::<PaymentEntity>(conn)?;

        Ok(Some(updated))
    })
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn create(&self, payment: InsertPaymentEntity) -> Result<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payments::table)
            .values(&payment)
            .returning(PaymentEntity::as_select())
            .get_result::<PaymentEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_any_id(&self, id: &str) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = payments::table
            .select(PaymentEntity::as_select())
            .into_boxed();

        query = match Uuid::parse_str(id) {
            Ok(payment_id) => query.filter(
                payments::id
                    .eq(payment_id)
                    .or(payments::external_id.eq(id.to_owned())),
            ),
            Err(_) => query.filter(payments::external_id.eq(id.to_owned())),
        };

        let result = query.first::<PaymentEntity>(&mut conn).optional()?;

        Ok(result)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::external_id.eq(external_id))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update(&self, payment_id: Uuid, changes: PaymentChanges) -> Result<PaymentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        apply_changes_locked(&mut conn, payment_id, None, &changes)?
            .ok_or_else(|| anyhow::anyhow!("payment {payment_id} not found"))
    }

    async fn transition(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        changes: PaymentChanges,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = apply_changes_locked(&mut conn, payment_id, Some(from), &changes)?;

        Ok(result)
    }
}
