//! # Event Bus Module
//!
//! Typed publish/subscribe for decoupled communication between the
//! visualizer and its event sources (controller connection, workflow,
//! file loading, window, settings).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scenesync_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter, UiEvent};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Ui]),
//!     |event| println!("{}", event.description()),
//! );
//!
//! bus.publish(AppEvent::Ui(UiEvent::Resize)).ok();
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
