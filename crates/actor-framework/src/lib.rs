//! # Actor Framework
//!
//! Building blocks for keyed, single-owner resources on top of Tokio.
//!
//! A [`ResourceActor`] is one task that owns a `HashMap` of entities and drains a
//! request channel sequentially. Entities are addressed by a natural key (a product
//! key, a queue name) supplied by the caller. Because only the actor task touches the
//! map, every custom [`ActorEntity`] action is an indivisible read-modify-write: a
//! "check then decrement" inside an action cannot interleave with any other request.
//!
//! ## Layers
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - domain state and the hooks that mutate it
//! 2. **Runtime Layer** ([`ResourceActor`]) - message loop, logging, error boxing
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - typed async calls
//!
//! ## Requests
//!
//! - `Get` returns a clone of the entity, or `None` when the key was never written.
//! - `Put` creates the entity from a seed or overwrites it through [`ActorEntity::on_put`].
//! - `Action` runs [`ActorEntity::handle_action`]; unknown keys are materialised with
//!   [`ActorEntity::vacant`] or rejected with [`FrameworkError::NotFound`].
//!
//! ## Context Injection
//!
//! Dependencies and settings reach the entity through `run(context)` rather than the
//! constructor, so actors can be created first and wired afterwards.
//!
//! ## Shutdown
//!
//! The run loop exits when the last client is dropped. Messages already queued are
//! still handled first.
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers requests from a list of expectations without running
//! an actor, which makes it easy to inject failures such as [`FrameworkError::ActorClosed`].

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
