//! Subscription table and broadcast channel behind [`EventBus`].
//!
//! An explicit subscription table keyed by [`SubscriptionId`]. Every
//! subscriber is recorded so its owner can release it on teardown; there
//! is no process-global instance.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Returned by [`EventBus::subscribe`]; pass it back to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.0.simple().to_string();
        write!(f, "sub-{}", &id[..8])
    }
}

/// Which events a subscription is handed
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Any event whose category is listed
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Arc<dyn Fn(AppEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Events buffered per async receiver before it lags
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    #[error("event {0} reached no subscriber")]
    NoSubscribers(String),
}

/// Publish/subscribe hub shared by the visualizer and its event sources
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>,
    config: EventBusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Deliver `event` to matching handlers and async receivers.
    ///
    /// Synchronous handlers run on the publishing thread, without the
    /// subscription table locked, so a handler may itself publish.
    /// Returns how many handlers and receivers saw the event.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        tracing::trace!("Publishing {}", event.description());

        let matching: Vec<EventHandler> = self
            .handlers
            .read()
            .values()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &matching {
            handler(event.clone());
        }

        let description = event.description();
        let received = self.sender.send(event).unwrap_or(0);
        match matching.len() + received {
            0 => Err(EventBusError::NoSubscribers(description)),
            delivered => Ok(delivered),
        }
    }

    /// Register `handler` for events passing `filter`.
    ///
    /// The handler is called on the publishing thread, so it should
    /// return quickly; the visualizer's handlers only enqueue.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let handler: EventHandler = Arc::new(handler);
        self.handlers.write().insert(id, (filter, handler));
        tracing::debug!("Registered {}", id);
        id
    }

    /// Broadcast receiver for tasks that await events instead
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// False when `id` was already released
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Released {}", id);
        }
        removed
    }

    /// Number of synchronous subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{ToolpathEvent, UiEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_is_idempotent() {
        let bus = EventBus::default();
        let first = bus.subscribe(EventFilter::All, |_| {});
        let second = bus.subscribe(EventFilter::All, |_| {});
        assert_ne!(first, second);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert!(matches!(
            bus.publish(AppEvent::Ui(UiEvent::Resize)),
            Err(EventBusError::NoSubscribers(_))
        ));
    }

    #[test]
    fn test_categories_route_events() {
        let bus = EventBus::new();
        let ui_count = Arc::new(AtomicUsize::new(0));
        let toolpath_count = Arc::new(AtomicUsize::new(0));

        let uc = ui_count.clone();
        bus.subscribe(EventFilter::Categories(vec![EventCategory::Ui]), move |_| {
            uc.fetch_add(1, Ordering::SeqCst);
        });

        let tc = toolpath_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Toolpath]),
            move |_| {
                tc.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.publish(AppEvent::Ui(UiEvent::Resize)).ok();
        bus.publish(AppEvent::Ui(UiEvent::Busy(true))).ok();
        bus.publish(AppEvent::Toolpath(ToolpathEvent::Unload)).ok();

        assert_eq!(ui_count.load(Ordering::SeqCst), 2);
        assert_eq!(toolpath_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_publish() {
        let bus = Arc::new(EventBus::new());
        let unloads = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&bus);
        bus.subscribe(EventFilter::Categories(vec![EventCategory::Ui]), move |_| {
            inner.publish(AppEvent::Toolpath(ToolpathEvent::Unload)).ok();
        });
        let u = unloads.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Toolpath]),
            move |_| {
                u.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.publish(AppEvent::Ui(UiEvent::Resize)).ok();
        assert_eq!(unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus = EventBus::with_config(EventBusConfig {
            channel_capacity: 4,
        });
        let mut events = bus.receiver();

        bus.publish(AppEvent::Toolpath(ToolpathEvent::Progress { sent: 7 }))
            .ok();

        match events.recv().await {
            Ok(AppEvent::Toolpath(ToolpathEvent::Progress { sent })) => assert_eq!(sent, 7),
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}
