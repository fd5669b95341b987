//! Fire-and-forget audit trail. Events are pushed onto an in-process channel
//! and written to the `audit_log` table by a background consumer, so the
//! request path never waits on (or fails because of) audit persistence.

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub actor_id: Uuid,
    pub action: &'static str,
    pub entity_id: Uuid,
    pub detail: JsonValue,
}

#[derive(Clone)]
pub struct AuditLogger {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl AuditLogger {
    /// Spawns the database consumer and returns a cloneable handle.
    pub fn spawn(pool: PgPool) -> Self {
        let (logger, mut rx) = Self::channel();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = write_event(&pool, &event).await {
                    tracing::warn!(
                        "audit write failed: action={} entity={}: {}",
                        event.action,
                        event.entity_id,
                        e
                    );
                }
            }
        });
        logger
    }

    /// Builds a logger without a consumer; the caller owns the receiver and
    /// decides what to do with the events.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Non-blocking; a closed channel is downgraded to a warning so the
    /// triggering business operation is never affected.
    pub fn record(&self, event: AuditEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("audit channel closed, dropping event");
        }
    }
}

async fn write_event(pool: &PgPool, event: &AuditEvent) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (actor_id, action, entity_id, detail)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(event.actor_id)
    .bind(event.action)
    .bind(event.entity_id)
    .bind(&event.detail)
    .execute(pool)
    .await?;

    tracing::info!(
        "audit: actor={} action={} entity={}",
        event.actor_id,
        event.action,
        event.entity_id
    );

    Ok(())
}
