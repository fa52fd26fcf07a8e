//! Typed domain events emitted by every mutation.
//!
//! Services return the events they produced alongside the mutated value and
//! hand them to an injected [`EventSink`]. Transport is the sink's concern.

use chrono::{DateTime, Utc};
use coopbank_shared::types::{Scope, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

labeled_enum! {
    /// The kind of mutation an event reports.
    pub enum EventAction {
        /// A record was created.
        Create => "create",
        /// A record was updated.
        Update => "update",
        /// A record was soft-deleted.
        Delete => "delete",
        /// A batch was printed.
        Print => "print",
        /// A batch was posted.
        Post => "post",
    }
}

labeled_enum! {
    /// The entity an event is about.
    pub enum EntityKind {
        /// An account configuration.
        Account => "account",
        /// A generated savings interest batch.
        SavingsInterestBatch => "generated_savings_interest",
    }
}

/// A mutation notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// What happened.
    pub action: EventAction,
    /// What it happened to.
    pub entity: EntityKind,
    /// Identifier of the mutated record.
    pub entity_id: Uuid,
    /// Scope of the mutated record.
    pub scope: Scope,
    /// Who did it.
    pub actor: UserId,
    /// When it was committed.
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(
        action: EventAction,
        entity: EntityKind,
        entity_id: Uuid,
        scope: Scope,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            entity,
            entity_id,
            scope,
            actor,
            occurred_at,
        }
    }

    /// Returns the deterministic topic identifiers for this event.
    ///
    /// Order: global, by id, by branch, by organization.
    #[must_use]
    pub fn topics(&self) -> [String; 4] {
        let base = format!("{}.{}", self.entity, self.action);
        [
            base.clone(),
            format!("{base}.{}", self.entity_id),
            format!("{base}.branch.{}", self.scope.branch_id),
            format!("{base}.organization.{}", self.scope.organization_id),
        ]
    }
}

/// The value produced by a mutation plus the events it emitted.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    /// The mutated value as committed.
    pub value: T,
    /// Events emitted, in commit order.
    pub events: Vec<DomainEvent>,
}

impl<T> Mutation<T> {
    /// Wraps a value with a single event.
    #[must_use]
    pub fn with_event(value: T, event: DomainEvent) -> Self {
        Self {
            value,
            events: vec![event],
        }
    }
}

/// Receives domain events after their mutation committed.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    /// Publishes one event. Delivery failures are the sink's concern.
    fn publish(&self, event: &DomainEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: &DomainEvent) {}
}

/// Sink that logs every topic at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &DomainEvent) {
        for topic in event.topics() {
            tracing::debug!(%topic, actor = %event.actor, "domain event");
        }
    }
}
