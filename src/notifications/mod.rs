//! User-facing notifications raised by the state core
//!
//! The presentation layer subscribes to a broadcast channel and turns each
//! [`Notification`] into a toast and, where asked for, a sound.

use crate::core::{RequestId, TicketId, TicketNumber};
use tokio::sync::broadcast;

/// Buffered notifications per subscriber
const NOTIFICATION_CAPACITY: usize = 100;

/// Something staff or customers should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A customer asked for their car
    NewRequest {
        request_id: RequestId,
        ticket_id: TicketId,
        play_sound: bool,
    },
    /// A valet accepted a request and is fetching the car
    RequestAccepted { ticket_number: TicketNumber },
    /// The car is ready for pick-up
    CarReady { ticket_number: TicketNumber },
}

impl Notification {
    /// Toast title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::NewRequest { .. } => "New car retrieval request",
            Self::RequestAccepted { .. } => "Car request accepted",
            Self::CarReady { .. } => "Car ready",
        }
    }

    /// Toast body
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NewRequest { .. } => {
                "A new car retrieval request is waiting for a valet.".to_string()
            },
            Self::RequestAccepted { ticket_number } => {
                format!("Your car with ticket #{ticket_number} is being retrieved.")
            },
            Self::CarReady { ticket_number } => {
                format!("Your car with ticket #{ticket_number} is ready for pick-up.")
            },
        }
    }
}

/// Which optional side effects are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationOptions {
    pub play_sound: bool,
    pub show_toast: bool,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            play_sound: true,
            show_toast: true,
        }
    }
}

/// Fan-out of notifications to every subscribed view
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    options: NotificationOptions,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("sender", &"broadcast::Sender<Notification>")
            .field("options", &self.options)
            .finish()
    }
}

impl Notifier {
    #[must_use]
    pub fn new(options: NotificationOptions) -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { sender, options }
    }

    /// Get a notification receiver
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Announce a new pending request, if sound or toast is enabled
    pub fn notify_new_request(&self, request_id: RequestId, ticket_id: TicketId) {
        if !self.options.play_sound && !self.options.show_toast {
            return;
        }
        self.send(Notification::NewRequest {
            request_id,
            ticket_id,
            play_sound: self.options.play_sound,
        });
    }

    /// Announce that a car is on its way
    pub fn notify_accepted(&self, ticket_number: TicketNumber) {
        self.send(Notification::RequestAccepted { ticket_number });
    }

    /// Announce that a car is ready
    pub fn notify_ready(&self, ticket_number: TicketNumber) {
        self.send(Notification::CarReady { ticket_number });
    }

    fn send(&self, notification: Notification) {
        tracing::info!("Notification: {} - {}", notification.title(), notification.message());
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notifications_reach_subscribers() {
        let notifier = Notifier::new(NotificationOptions::default());
        let mut receiver = notifier.subscribe();

        notifier.notify_ready(TicketNumber::new("00003"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(
            received,
            Notification::CarReady {
                ticket_number: TicketNumber::new("00003")
            }
        );
        assert_eq!(received.message(), "Your car with ticket #00003 is ready for pick-up.");
    }

    #[test]
    fn test_new_request_respects_options() {
        let silent = Notifier::new(NotificationOptions {
            play_sound: false,
            show_toast: false,
        });
        let mut receiver = silent.subscribe();
        silent.notify_new_request(RequestId::new(), TicketId::new());
        assert!(receiver.try_recv().is_err());

        let toast_only = Notifier::new(NotificationOptions {
            play_sound: false,
            show_toast: true,
        });
        let mut receiver = toast_only.subscribe();
        toast_only.notify_new_request(RequestId::new(), TicketId::new());
        assert!(matches!(
            receiver.try_recv().unwrap(),
            Notification::NewRequest { play_sound: false, .. }
        ));
    }
}
