//! # ActorClient Trait
//!
//! Common surface for domain clients that wrap a [`ResourceClient`]: they pick their
//! own error type and say how framework failures map into it, and get a typed `get`
//! for free.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients built on a generic `ResourceClient`.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Seat { row: String, taken: bool }
/// #[derive(Debug)] enum SeatAction { Take }
/// #[derive(Debug, thiserror::Error)] #[error("seat error: {0}")] struct SeatError(String);
///
/// impl From<String> for SeatError {
///     fn from(s: String) -> Self { SeatError(s) }
/// }
///
/// #[async_trait]
/// impl ActorEntity for Seat {
///     type Id = String;
///     type Seed = bool;
///     type Action = SeatAction;
///     type ActionResult = bool;
///     type Context = ();
///     type Error = SeatError;
///
///     fn from_seed(row: String, taken: bool) -> Result<Self, Self::Error> { Ok(Self { row, taken }) }
///     async fn on_put(&mut self, taken: bool, _: &()) -> Result<(), Self::Error> { self.taken = taken; Ok(()) }
///     async fn handle_action(&mut self, _: SeatAction, _: &()) -> Result<bool, Self::Error> {
///         let was_free = !self.taken;
///         self.taken = true;
///         Ok(was_free)
///     }
/// }
///
/// struct SeatClient {
///     inner: ResourceClient<Seat>,
/// }
///
/// #[async_trait]
/// impl ActorClient<Seat> for SeatClient {
///     type Error = SeatError;
///
///     fn inner(&self) -> &ResourceClient<Seat> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         SeatError(e.to_string())
///     }
/// }
///
/// async fn usage(client: SeatClient) {
///     // get() is provided by the trait
///     let _ = client.get("A1".to_string()).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a snapshot of the entity stored under `id`.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }
}
