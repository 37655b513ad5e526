//! Domain & integration events.
//!
//! The event bus is the narrow seam through which out-of-scope
//! collaborators (notification dispatch, analytics aggregation) consume
//! facts produced by the order pipeline.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
