//! # Mock Framework & Testing Guide
//!
//! [`MockClient<T>`] hands out a real [`ResourceClient<T>`] whose requests are answered
//! from a queue of expectations instead of by an actor. Code under test cannot tell the
//! difference, which makes it the easiest way to reproduce failures that a live actor
//! would rarely produce (a closed channel, an entity error at exactly the wrong moment).
//!
//! | | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None, scripted replies | Real entity state |
//! | **Determinism** | Fully scripted | Subject to scheduler |
//! | **Error Injection** | `return_err` | Requires contriving state |
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Gauge { key: String, level: u64 }
//! #[derive(Debug)] enum GaugeAction { Read }
//! #[derive(Debug, thiserror::Error)] #[error("gauge error")] struct GaugeError;
//!
//! #[async_trait]
//! impl ActorEntity for Gauge {
//!     type Id = String; type Seed = u64; type Action = GaugeAction;
//!     type ActionResult = u64; type Context = (); type Error = GaugeError;
//!     fn from_seed(key: String, level: u64) -> Result<Self, Self::Error> { Ok(Self { key, level }) }
//!     async fn on_put(&mut self, level: u64, _: &()) -> Result<(), Self::Error> { self.level = level; Ok(()) }
//!     async fn handle_action(&mut self, _: GaugeAction, _: &()) -> Result<u64, Self::Error> { Ok(self.level) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Gauge>::new();
//!     mock.expect_action("boiler".to_string()).return_ok(7);
//!     mock.expect_action("boiler".to_string()).return_err(FrameworkError::ActorClosed);
//!
//!     let client = mock.client();
//!     assert_eq!(client.perform_action("boiler".to_string(), GaugeAction::Read).await.unwrap(), 7);
//!     assert!(matches!(
//!         client.perform_action("boiler".to_string(), GaugeAction::Read).await,
//!         Err(FrameworkError::ActorClosed)
//!     ));
//!     mock.verify();
//! }
//! ```
//!
//! ## Mocking Utilities
//!
//! For step-by-step control use [`create_mock_client`] and the `expect_*` receiver
//! helpers: the test itself receives each request and decides when and how to answer.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted reply, consumed in FIFO order by the mock's responder task.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Put {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
///
/// Requests are matched against expectations in the order the expectations were
/// registered. A request whose kind differs from the next expectation panics the
/// responder task, after which every further call fails with `ActorClosed`. A request
/// whose key differs is answered with [`FrameworkError::NotFound`].
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone.lock().unwrap().pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Get { id, respond_to },
                        Some(Expectation::Get {
                            id: expected,
                            response,
                        }),
                    ) => reply(respond_to, id, expected, response),
                    (
                        ResourceRequest::Put { id, respond_to, .. },
                        Some(Expectation::Put {
                            id: expected,
                            response,
                        }),
                    ) => reply(respond_to, id, expected, response),
                    (
                        ResourceRequest::Action { id, respond_to, .. },
                        Some(Expectation::Action {
                            id: expected,
                            response,
                        }),
                    ) => reply(respond_to, id, expected, response),
                    _ => {
                        panic!("Unexpected request or expectation mismatch");
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` operation.
    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        ExpectationBuilder::new(id, self.expectations.clone(), |id, response| {
            Expectation::Get { id, response }
        })
    }

    /// Expects a `put` operation.
    pub fn expect_put(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        ExpectationBuilder::new(id, self.expectations.clone(), |id, response| {
            Expectation::Put { id, response }
        })
    }

    /// Expects an `action` operation.
    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        ExpectationBuilder::new(id, self.expectations.clone(), |id, response| {
            Expectation::Action { id, response }
        })
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        self.expectations.lock().unwrap().len()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.remaining();
        if remaining != 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

fn reply<I, R>(
    respond_to: oneshot::Sender<Result<R, FrameworkError>>,
    id: I,
    expected: I,
    response: Result<R, FrameworkError>,
) where
    I: PartialEq + std::fmt::Display,
{
    if id == expected {
        let _ = respond_to.send(response);
    } else {
        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
    }
}

/// Builder that registers one scripted reply.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    id: T::Id,
    expectations: Expectations<T>,
    build: fn(T::Id, Result<R, FrameworkError>) -> Expectation<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    fn new(
        id: T::Id,
        expectations: Expectations<T>,
        build: fn(T::Id, Result<R, FrameworkError>) -> Expectation<T>,
    ) -> Self {
        Self {
            id,
            expectations,
            build,
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        let expectation = (self.build)(self.id, Ok(value));
        self.expectations.lock().unwrap().push_back(expectation);
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        let expectation = (self.build)(self.id, Err(error));
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

// =============================================================================
// RECEIVER HELPERS
// =============================================================================

/// Creates a client and the receiver its requests land on.
///
/// The test plays the actor: it pulls each request with one of the `expect_*`
/// helpers below and answers through the returned responder, at whatever moment
/// suits the scenario (including never).
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Put request
pub async fn expect_put<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Seed, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Put {
            id,
            seed,
            respond_to,
        }) => Some((id, seed, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
