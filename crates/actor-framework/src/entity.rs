//! # ActorEntity Trait
//!
//! The contract a resource must satisfy to be owned by a [`ResourceActor`](crate::ResourceActor).
//!
//! Entities are stored under a natural key chosen by the caller (a product key, a queue
//! name, ...). The trait's associated types keep every payload strongly typed: a stock
//! counter cannot be sent a queue action, and the compiler enforces it.
//!
//! # Provided Methods
//! - [`ActorEntity::vacant`] defaults to `None`, meaning actions against an unknown key
//!   fail with [`FrameworkError::NotFound`](crate::FrameworkError::NotFound).

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// Hooks are `#[async_trait]` and receive the actor's `Context`, which is injected when
/// the actor starts running rather than when it is constructed. Use `()` when the entity
/// needs nothing from its surroundings.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The key this entity is stored under.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// Payload used to create the entity, or to overwrite it through `on_put`.
    type Seed: Send + Sync + Debug;

    /// Enum representing resource-specific operations (e.g., `ReserveOne`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies, settings) injected into the actor.
    type Context: Send + Sync;

    /// One error enum per entity; the framework boxes it into
    /// [`FrameworkError::EntityError`](crate::FrameworkError::EntityError).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a fresh entity for a key that has no entry yet.
    fn from_seed(id: Self::Id, seed: Self::Seed) -> Result<Self, Self::Error>;

    /// Entity to materialise when an action targets a key that was never written.
    ///
    /// Returning `Some` makes "never initialised" a valid state with well-defined
    /// behaviour instead of an error.
    fn vacant(_id: &Self::Id) -> Option<Self> {
        None
    }

    /// Apply a seed to an entity that already exists.
    async fn on_put(&mut self, seed: Self::Seed, _ctx: &Self::Context) -> Result<(), Self::Error>;

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
