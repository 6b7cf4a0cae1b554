//! Audit events emitted for each committed permission change

use serde::Serialize;

use crate::identity::Identity;
use crate::permission::Cid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum AccessEvent {
    #[serde(rename = "AccessGranted")]
    Granted {
        owner: Identity,
        requester: Identity,
        cid: Cid,
        scope: String,
        expiry: u64,
    },
    #[serde(rename = "AccessRevoked")]
    Revoked {
        owner: Identity,
        requester: Identity,
        cid: Cid,
    },
}

/// Append-only receiver of audit events, called in commit order
///
/// Publishing cannot fail: a change that has been committed stays committed.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: AccessEvent);
}

/// Discards events
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: AccessEvent) {}
}

/// Writes each event as a structured tracing record
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: AccessEvent) {
        match event {
            AccessEvent::Granted {
                owner,
                requester,
                cid,
                scope,
                expiry,
            } => tracing::info!(
                target: "welli_access::audit",
                %owner,
                %requester,
                cid = %cid,
                scope = %scope,
                expiry,
                "AccessGranted"
            ),
            AccessEvent::Revoked {
                owner,
                requester,
                cid,
            } => tracing::info!(
                target: "welli_access::audit",
                %owner,
                %requester,
                cid = %cid,
                "AccessRevoked"
            ),
        }
    }
}
