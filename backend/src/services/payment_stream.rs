use std::{collections::VecDeque, sync::Arc};

use crates::domain::{
    repositories::payments::PaymentRepository,
    value_objects::{enums::payment_statuses::PaymentStatus, payments::PaymentDto},
};
use futures_util::{StreamExt, stream::BoxStream};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::services::payment_broadcaster::{PaymentBroadcaster, PaymentUpdate, Subscription};

/// Events pushed to a client watching one payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentStreamEvent {
    Connected {
        #[serde(rename = "paymentId")]
        payment_id: String,
    },
    Status {
        status: PaymentStatus,
        payment: PaymentDto,
    },
    Final {
        status: PaymentStatus,
        payment: PaymentDto,
    },
}

impl PaymentStreamEvent {
    /// `status`, plus `final` when the status is terminal.
    fn for_update(update: PaymentUpdate) -> Vec<Self> {
        let mut events = vec![PaymentStreamEvent::Status {
            status: update.status,
            payment: update.payment.clone(),
        }];
        if update.status.is_terminal() {
            events.push(PaymentStreamEvent::Final {
                status: update.status,
                payment: update.payment,
            });
        }
        events
    }
}

struct StreamState {
    queued: VecDeque<PaymentStreamEvent>,
    updates: mpsc::UnboundedReceiver<PaymentUpdate>,
    subscription: Option<Subscription>,
}

/// Opens the live view of a payment. The listener is registered before the current row is
/// read so no transition can fall between the two. The stream ends after a `final` event;
/// dropping it early (client disconnect) unregisters the listener.
pub async fn open_payment_stream(
    broadcaster: &Arc<PaymentBroadcaster>,
    payment_repository: &Arc<dyn PaymentRepository>,
    id: &str,
) -> BoxStream<'static, PaymentStreamEvent> {
    let (tx, updates) = mpsc::unbounded_channel::<PaymentUpdate>();
    let subscription = broadcaster.watch(
        id,
        Arc::new(move |update: &PaymentUpdate| {
            let _ = tx.send(update.clone());
        }),
    );
    info!(payment_id = %id, listener_id = subscription.id(), "payment_stream: client subscribed");

    let mut state = StreamState {
        queued: VecDeque::from([PaymentStreamEvent::Connected {
            payment_id: id.to_string(),
        }]),
        updates,
        subscription: Some(subscription),
    };

    match payment_repository.find_by_any_id(id).await {
        Ok(Some(payment)) => {
            let events = PaymentStreamEvent::for_update(PaymentUpdate::from(&payment));
            if events.len() > 1 {
                state.subscription = None;
            }
            state.queued.extend(events);
        }
        Ok(None) => info!(payment_id = %id, "payment_stream: payment not found yet, waiting for updates"),
        Err(err) => warn!(payment_id = %id, db_error = ?err, "payment_stream: initial read failed"),
    }

    futures_util::stream::unfold(state, |mut state| async move {
        if let Some(event) = state.queued.pop_front() {
            return Some((event, state));
        }
        state.subscription.as_ref()?;

        let update = state.updates.recv().await?;
        let mut events = PaymentStreamEvent::for_update(update);
        if events.len() > 1 {
            state.subscription = None;
        }
        let first = events.remove(0);
        state.queued.extend(events);
        Some((first, state))
    })
    .boxed()
}
