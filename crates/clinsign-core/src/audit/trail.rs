//! Best-effort audit trail built on a tokio broadcast channel.
//!
//! The trail is the hand-off point between the consent core and the external
//! access-log/event collaborators. Sending is synchronous, non-blocking, and
//! infallible from the caller's perspective: a full buffer drops the oldest
//! records for lagging receivers rather than slowing the request that
//! produced them.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{AccessEvent, AuditEvent, ConsentEvent};

/// Default buffer size for the broadcast channel. Records beyond this limit
/// cause older records to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for audit events.
///
/// Cloneable and shareable; multiple sinks can subscribe to one trail.
/// Zero subscribers is a valid state (e.g. in unit tests) and sends simply
/// report zero receivers.
#[derive(Clone)]
pub struct AuditTrail {
    sender: broadcast::Sender<AuditEvent>,
}

impl AuditTrail {
    /// Create a new trail with the default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new trail with a custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new trail wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Offer an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; zero means no
    /// sink is attached, which is not an error.
    pub fn offer(&self, event: AuditEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                // No receivers. Surfaced to operational telemetry only;
                // never escalated to the caller.
                tracing::trace!("audit event dropped: no subscribers");
                0
            }
        }
    }

    /// Offer an access decision record.
    pub fn offer_access(&self, event: AccessEvent) -> usize {
        self.offer(AuditEvent::Access(event))
    }

    /// Offer a consent lifecycle record.
    pub fn offer_consent(&self, event: ConsentEvent) -> usize {
        self.offer(AuditEvent::Consent(event))
    }

    /// Subscribe to the trail. Events offered before subscription are not
    /// received.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Whether any sink is attached.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{AuditOutcome, ConsentEventKind};
    use crate::types::{Action, ResourceKind, Role};
    use uuid::Uuid;

    fn access_event() -> AccessEvent {
        AccessEvent::new(
            Uuid::new_v4(),
            vec![Role::Doctor],
            ResourceKind::Patient,
            Some("p-1".to_string()),
            Action::Read,
            AuditOutcome::Allowed,
            "test",
        )
    }

    #[test]
    fn test_offer_without_subscribers_is_fine() {
        let trail = AuditTrail::new();
        assert!(!trail.has_subscribers());
        assert_eq!(trail.offer_access(access_event()), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let trail = AuditTrail::new();
        let mut rx = trail.subscribe();
        assert_eq!(trail.subscriber_count(), 1);

        assert_eq!(trail.offer_access(access_event()), 1);
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, AuditEvent::Access(_)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let trail = AuditTrail::new();
        let mut rx1 = trail.subscribe();
        let mut rx2 = trail.subscribe();

        let event = ConsentEvent::new("d-1", "p-1", Uuid::new_v4(), ConsentEventKind::Created);
        assert_eq!(trail.offer_consent(event), 2);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_buffer_overflow_drops_oldest_not_caller() {
        let trail = AuditTrail::with_capacity(2);
        let mut rx = trail.subscribe();

        // Overfill: offering never fails even when the receiver lags.
        for _ in 0..5 {
            assert_eq!(trail.offer_access(access_event()), 1);
        }

        // The lagging receiver observes the lag, then catches up.
        let err = rx.recv().await.unwrap_err();
        assert!(matches!(err, broadcast::error::RecvError::Lagged(_)));
        assert!(rx.recv().await.is_ok());
    }
}
