//! # Generic Messages
//!
//! Requests sent from a [`ResourceClient`](crate::ResourceClient) to its
//! [`ResourceActor`](crate::ResourceActor).

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// Resources are addressed by a caller-supplied key rather than a generated id, so
/// the set of operations is small:
///
/// - **Get**: read a snapshot of the entity stored under `id` (if any).
/// - **Put**: create the entity from a [`ActorEntity::Seed`], or hand the seed to
///   [`ActorEntity::on_put`] when the key already exists.
/// - **Action**: run a resource-specific [`ActorEntity::Action`]. Unknown keys fall
///   back to [`ActorEntity::vacant`].
///
/// Because a single task drains these messages one by one, every `Action` is a
/// read-modify-write that no other request can interleave with.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Put {
        id: T::Id,
        seed: T::Seed,
        respond_to: Response<T>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
