use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for a published event.
///
/// Notes:
/// - `topic` is the stable event type ("order.placed", ...), used by
///   consumers to route without deserializing the payload.
/// - `subject_id` is the id of the entity the event is about (order id,
///   product id).
/// - `payload` is the domain-agnostic event body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    topic: String,
    subject_id: Uuid,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        topic: impl Into<String>,
        subject_id: Uuid,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            topic: topic.into(),
            subject_id,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<serde_json::Value> {
    /// Wrap a typed event into a JSON envelope for publication.
    ///
    /// Keeps the bus decoupled from domain event types while preserving
    /// the metadata consumers route on.
    pub fn from_typed<E>(subject_id: Uuid, event: &E) -> Result<Self, serde_json::Error>
    where
        E: Event + Serialize,
    {
        Ok(Self {
            event_id: Uuid::now_v7(),
            topic: event.event_type().to_string(),
            subject_id,
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)?,
        })
    }
}
