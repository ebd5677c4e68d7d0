//! Audit trail for host directory changes.

use std::sync::Mutex;

use log::info;

/// Log target for audit records, so they can be routed separately.
pub const AUDIT_TARGET: &str = "netconfig::audit";

/// Receives audit events. Storage and rotation belong to the sink.
pub trait AuditSink: Send + Sync {
    fn record(&self, message: &str, actor: Option<&str>);
}

/// Writes audit events through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, message: &str, actor: Option<&str>) {
        match actor {
            Some(actor) => info!(target: AUDIT_TARGET, "{} - {}", actor, message),
            None => info!(target: AUDIT_TARGET, "{}", message),
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub message: String,
    pub actor: Option<String>,
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, message: &str, actor: Option<&str>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(AuditEvent {
                message: message.to_string(),
                actor: actor.map(str::to_string),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order_and_actor() {
        let sink = MemoryAuditSink::new();
        sink.record("Added new host sw1 to database", Some("alice"));
        sink.record("Deleted host sw1 from database", None);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].actor.as_deref(), Some("alice"));
        assert_eq!(events[1].actor, None);
        assert_eq!(
            sink.messages(),
            vec![
                "Added new host sw1 to database",
                "Deleted host sw1 from database"
            ]
        );
    }
}
