use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::CurrentUser;

/// Session transitions, published by the session manager on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    LoggedIn(CurrentUser),
    TwoFactorRequired { methods: Vec<String> },
    LoggedOut,
}

impl SessionEvent {
    /// Whether this event leaves the session able to make remote calls.
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionEvent::LoggedIn(_))
    }
}

#[derive(Debug, Clone)]
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> CurrentUser {
        CurrentUser::new("usr_alice", "Alice")
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = SessionEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::LoggedIn(alice()));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::LoggedIn(ref u) if u.user_id == "usr_alice"));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = SessionEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(SessionEvent::LoggedOut);

        assert_eq!(rx1.recv().await.unwrap(), SessionEvent::LoggedOut);
        assert_eq!(rx2.recv().await.unwrap(), SessionEvent::LoggedOut);
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = SessionEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::TwoFactorRequired {
            methods: vec!["totp".into()],
        });
        bus.publish(SessionEvent::LoggedIn(alice()));
        bus.publish(SessionEvent::LoggedOut);

        let e1 = rx.recv().await.unwrap();
        assert!(matches!(
            e1,
            SessionEvent::TwoFactorRequired { ref methods } if methods == &["totp"]
        ));
        assert!(rx.recv().await.unwrap().is_ready());
        assert!(!rx.recv().await.unwrap().is_ready());
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus = SessionEventBus::new(16);
        assert_eq!(bus.publish(SessionEvent::LoggedOut), 0);
    }

    #[tokio::test]
    async fn publish_returns_subscriber_count() {
        let bus = SessionEventBus::new(16);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();

        assert_eq!(bus.publish(SessionEvent::LoggedOut), 2);
    }

    #[test]
    fn event_serializes_with_tag() {
        let json = serde_json::to_string(&SessionEvent::LoggedOut).unwrap();
        assert_eq!(json, r#"{"type":"LoggedOut"}"#);
    }
}
