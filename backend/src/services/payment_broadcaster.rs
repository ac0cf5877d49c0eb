use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crates::domain::{
    entities::payments::PaymentEntity,
    value_objects::{enums::payment_statuses::PaymentStatus, payments::PaymentDto},
};
use serde::Serialize;
use tracing::debug;

pub type ListenerId = u64;
pub type Listener = Arc<dyn Fn(&PaymentUpdate) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub payment: PaymentDto,
}

impl From<&PaymentEntity> for PaymentUpdate {
    fn from(value: &PaymentEntity) -> Self {
        Self {
            status: value.status(),
            payment: PaymentDto::from(value.clone()),
        }
    }
}

/// In-process fan-out of payment status changes, keyed by the identifier a client
/// subscribed with. Nothing is buffered: listeners only see updates published while
/// they are registered.
#[derive(Default)]
pub struct PaymentBroadcaster {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
}

impl PaymentBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, key: &str, listener: Listener) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(key.to_string())
            .or_default()
            .push((id, listener));
        debug!(key, listener_id = id, "broadcaster: listener registered");
        id
    }

    /// Returns whether the listener was still registered.
    pub fn unsubscribe(&self, key: &str, listener_id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(key) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|(id, _)| *id != listener_id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(key);
        }
        removed
    }

    /// Registers a listener that is removed when the returned guard is dropped.
    pub fn watch(self: &Arc<Self>, key: &str, listener: Listener) -> Subscription {
        let id = self.subscribe(key, listener);
        Subscription {
            broadcaster: Arc::clone(self),
            key: key.to_string(),
            id,
        }
    }

    /// Invokes the listeners registered for `key` in registration order and returns how
    /// many ran. Listeners are called outside the lock so they may unsubscribe themselves.
    pub fn publish(&self, key: &str, update: &PaymentUpdate) -> usize {
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners
                .get(key)
                .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };

        for listener in &snapshot {
            listener(update);
        }
        snapshot.len()
    }

    /// Publishes under both the internal id and the gateway transaction id.
    pub fn publish_payment(&self, payment: &PaymentEntity) -> usize {
        let update = PaymentUpdate::from(payment);
        let delivered = self.publish(&payment.id.to_string(), &update)
            + self.publish(&payment.external_id, &update);
        debug!(
            payment_id = %payment.id,
            external_id = %payment.external_id,
            status = %update.status,
            delivered,
            "broadcaster: payment update published"
        );
        delivered
    }

    pub fn listener_count(&self, key: &str) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.get(key).map_or(0, Vec::len)
    }
}

pub struct Subscription {
    broadcaster: Arc<PaymentBroadcaster>,
    key: String,
    id: ListenerId,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(&self.key, self.id);
    }
}
