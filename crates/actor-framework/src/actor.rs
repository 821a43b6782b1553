//! # Generic Actor Server
//!
//! [`ResourceActor`] owns a keyed store of entities and is the only code that ever
//! touches it. Requests are drained from an `mpsc` channel one at a time, so each
//! request observes the effects of every request before it and none after it.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of keyed entities.
///
/// **Concurrency Model**:
/// The store is a plain `HashMap` with no `Mutex` around it. Exclusive ownership by
/// the actor task is what makes a `Get`-then-mutate inside an `Action` indivisible:
/// any number of clients may send concurrently, the actor still handles them in
/// sequence.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new()` returns the actor and its first client.
/// 2.  **Wire**: pass the entity's `Context` to `actor.run(context)`.
/// 3.  **Run**: spawn the run loop; it ends once every client has been dropped.
///
/// ```rust
/// use actor_framework::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Tally { key: String, count: u64 }
/// #[derive(Debug)] enum TallyAction { Bump }
/// #[derive(Debug, thiserror::Error)] #[error("tally error")] struct TallyError;
///
/// #[async_trait]
/// impl ActorEntity for Tally {
///     type Id = String;
///     type Seed = u64;
///     type Action = TallyAction;
///     type ActionResult = u64;
///     type Context = ();
///     type Error = TallyError;
///
///     fn from_seed(key: String, count: u64) -> Result<Self, Self::Error> { Ok(Self { key, count }) }
///     fn vacant(key: &String) -> Option<Self> { Some(Self { key: key.clone(), count: 0 }) }
///     async fn on_put(&mut self, count: u64, _: &()) -> Result<(), Self::Error> { self.count = count; Ok(()) }
///     async fn handle_action(&mut self, _: TallyAction, _: &()) -> Result<u64, Self::Error> {
///         self.count += 1;
///         Ok(self.count)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Tally>::new(10);
///     tokio::spawn(actor.run(()));
///
///     let bumped = client.perform_action("visits".to_string(), TallyAction::Bump).await.unwrap();
///     assert_eq!(bumped, 1);
/// }
/// ```
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full, client
    /// calls wait for space, which gives natural backpressure under load.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    ///
    /// The `context` is handed to every entity hook.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let found = item.is_some();
                    debug!(entity_type, %id, found, "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Put {
                    id,
                    seed,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?seed, "Put");
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item
                            .on_put(seed, &context)
                            .await
                            .map(|()| item.clone()),
                        None => match T::from_seed(id.clone(), seed) {
                            Ok(item) => {
                                self.store.insert(id.clone(), item.clone());
                                Ok(item)
                            }
                            Err(e) => Err(e),
                        },
                    };
                    match result {
                        Ok(item) => {
                            info!(entity_type, %id, size = self.store.len(), "Put ok");
                            let _ = respond_to.send(Ok(item));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Put failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    if !self.store.contains_key(&id) {
                        if let Some(fresh) = T::vacant(&id) {
                            debug!(entity_type, %id, "Materialised vacant entity");
                            self.store.insert(id.clone(), fresh);
                        }
                    }
                    if let Some(item) = self.store.get_mut(&id) {
                        let result = item
                            .handle_action(action, &context)
                            .await
                            .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                        match &result {
                            Ok(_) => debug!(entity_type, %id, "Action ok"),
                            Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                        }
                        let _ = respond_to.send(result);
                    } else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
