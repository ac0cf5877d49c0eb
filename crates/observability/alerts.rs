use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use url::Url;

const QUEUE_CAPACITY: usize = 256;
const DISCORD_CONTENT_LIMIT: usize = 2000;

/// A log event worth paging someone about.
#[derive(Debug, Clone)]
pub(crate) struct Alert {
    pub(crate) level: Level,
    pub(crate) at: DateTime<Utc>,
    pub(crate) target: String,
    pub(crate) message: String,
    pub(crate) payment_id: Option<String>,
    pub(crate) external_id: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
}

/// Hands alerts to a background task so logging never waits on Discord.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<Alert>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(webhook_url: Url, service: String, environment: String) -> Self {
        let (tx, mut rx) = mpsc::channel::<Alert>(QUEUE_CAPACITY);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                let content = render(&alert, &service, &environment);
                let sent = client
                    .post(webhook_url.clone())
                    .json(&json!({ "content": content }))
                    .send()
                    .await;

                match sent {
                    Ok(resp) if resp.status().is_success() => {}
                    Ok(resp) => warn!(status = %resp.status(), "alerts: discord rejected alert"),
                    // The request error can carry the webhook URL, so only its kind is logged.
                    Err(err) => warn!(timeout = err.is_timeout(), "alerts: discord unreachable"),
                }
            }
        });

        Self { tx }
    }

    fn dispatch(&self, alert: Alert) {
        if self.tx.try_send(alert).is_err() {
            warn!("alerts: queue full or closed, dropping alert");
        }
    }
}

pub(crate) struct AlertLayer {
    dispatcher: AlertDispatcher,
    min_level: Level,
}

impl AlertLayer {
    pub(crate) fn new(dispatcher: AlertDispatcher, min_level: Level) -> Self {
        Self {
            dispatcher,
            min_level,
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        let value = if is_secret(field.name()) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for AlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Also keeps the dispatcher's own warnings from feeding back into the queue.
        if *metadata.level() > self.min_level || metadata.target().starts_with(module_path!()) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let mut fields = collector.fields;

        let message = fields.remove("message").unwrap_or_default();
        let payment_id = fields.remove("payment_id");
        let external_id = fields.remove("external_id");

        self.dispatcher.dispatch(Alert {
            level: *metadata.level(),
            at: Utc::now(),
            target: metadata.target().to_string(),
            message,
            payment_id,
            external_id,
            fields,
        });
    }
}

fn is_secret(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["secret", "password", "token", "authorization", "api_key", "webhook_url"]
        .iter()
        .any(|needle| name.contains(needle))
}

pub(crate) fn render(alert: &Alert, service: &str, environment: &str) -> String {
    let mut headline = format!("**{service}** `{environment}` `{}`", alert.level);
    if let Some(payment_id) = &alert.payment_id {
        headline.push_str(&format!(" payment `{payment_id}`"));
    }
    if let Some(external_id) = &alert.external_id {
        headline.push_str(&format!(" tx `{external_id}`"));
    }

    let mut lines = vec![
        headline,
        format!(
            "`{}` `{}`",
            alert.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            alert.target
        ),
    ];
    if !alert.message.trim().is_empty() {
        lines.push(format!("> {}", alert.message.trim()));
    }
    for (key, value) in &alert.fields {
        lines.push(format!("- `{key}` = `{value}`"));
    }

    let content = lines.join("\n");
    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }
    let mut truncated: String = content.chars().take(DISCORD_CONTENT_LIMIT - 2).collect();
    truncated.push_str(" …");
    truncated
}
