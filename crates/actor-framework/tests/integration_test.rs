use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
use async_trait::async_trait;

// --- Test Entities ---

#[derive(Clone, Debug, PartialEq)]
struct Seats {
    venue: String,
    free: u32,
}

#[derive(Debug)]
enum SeatAction {
    Claim,
    Free,
}

#[derive(Debug, thiserror::Error)]
enum SeatError {
    #[error("Venue capacity must be positive")]
    ZeroCapacity,
}

#[async_trait]
impl ActorEntity for Seats {
    type Id = String;
    type Seed = u32;
    type Action = SeatAction;
    type ActionResult = bool;
    type Context = ();
    type Error = SeatError;

    fn from_seed(venue: String, free: u32) -> Result<Self, Self::Error> {
        if free == 0 {
            return Err(SeatError::ZeroCapacity);
        }
        Ok(Self { venue, free })
    }

    async fn on_put(&mut self, free: u32, _ctx: &Self::Context) -> Result<(), Self::Error> {
        self.free = free;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: SeatAction,
        _ctx: &Self::Context,
    ) -> Result<bool, Self::Error> {
        match action {
            SeatAction::Claim => {
                if self.free == 0 {
                    Ok(false)
                } else {
                    self.free -= 1;
                    Ok(true)
                }
            }
            SeatAction::Free => {
                self.free += 1;
                Ok(true)
            }
        }
    }
}

/// Unknown keys start at zero; each hit adds the step injected as context.
#[derive(Clone, Debug)]
struct Counter {
    hits: u64,
}

#[derive(Debug)]
struct Hit;

#[derive(Debug, thiserror::Error)]
#[error("Counter error")]
struct CounterError;

#[async_trait]
impl ActorEntity for Counter {
    type Id = String;
    type Seed = u64;
    type Action = Hit;
    type ActionResult = u64;
    type Context = u64;
    type Error = CounterError;

    fn from_seed(_key: String, hits: u64) -> Result<Self, Self::Error> {
        Ok(Self { hits })
    }

    fn vacant(_key: &String) -> Option<Self> {
        Some(Self { hits: 0 })
    }

    async fn on_put(&mut self, hits: u64, _ctx: &u64) -> Result<(), Self::Error> {
        self.hits = hits;
        Ok(())
    }

    async fn handle_action(&mut self, _action: Hit, step: &u64) -> Result<u64, Self::Error> {
        self.hits += *step;
        Ok(self.hits)
    }
}

// --- Tests ---

#[tokio::test]
async fn test_framework_full_lifecycle() {
    // Start Actor
    let (actor, client) = ResourceActor::<Seats>::new(10);
    tokio::spawn(actor.run(()));

    // 1. Put creates
    let stored = client.put("hall".to_string(), 1).await.unwrap();
    assert_eq!(stored.venue, "hall");
    assert_eq!(stored.free, 1);

    // 2. Claim the only seat, then fail to claim another
    assert!(client
        .perform_action("hall".to_string(), SeatAction::Claim)
        .await
        .unwrap());
    assert!(!client
        .perform_action("hall".to_string(), SeatAction::Claim)
        .await
        .unwrap());

    // 3. Free brings it back
    client
        .perform_action("hall".to_string(), SeatAction::Free)
        .await
        .unwrap();
    let seats = client.get("hall".to_string()).await.unwrap().unwrap();
    assert_eq!(seats.free, 1);

    // 4. Put on an existing key overwrites through on_put
    let overwritten = client.put("hall".to_string(), 50).await.unwrap();
    assert_eq!(overwritten.free, 50);

    // 5. Unknown keys
    assert!(client.get("arena".to_string()).await.unwrap().is_none());
    let missing = client
        .perform_action("arena".to_string(), SeatAction::Claim)
        .await;
    assert!(matches!(missing, Err(FrameworkError::NotFound(key)) if key == "arena"));
}

#[tokio::test]
async fn test_seed_errors_are_boxed() {
    let (actor, client) = ResourceActor::<Seats>::new(10);
    tokio::spawn(actor.run(()));

    let result = client.put("closet".to_string(), 0).await;
    match result {
        Err(FrameworkError::EntityError(e)) => {
            assert!(e.downcast_ref::<SeatError>().is_some());
        }
        other => panic!("Expected EntityError, got {:?}", other.map(|s| s.free)),
    }
    assert!(client.get("closet".to_string()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_vacant_entity_and_context() {
    let (actor, client) = ResourceActor::<Counter>::new(10);
    tokio::spawn(actor.run(5));

    assert_eq!(client.perform_action("page".to_string(), Hit).await.unwrap(), 5);
    assert_eq!(client.perform_action("page".to_string(), Hit).await.unwrap(), 10);
    assert_eq!(client.get("page".to_string()).await.unwrap().unwrap().hits, 10);
}

#[tokio::test]
async fn test_concurrent_claims_never_oversell() {
    let (actor, client) = ResourceActor::<Seats>::new(32);
    tokio::spawn(actor.run(()));
    client.put("hall".to_string(), 25).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..200 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .perform_action("hall".to_string(), SeatAction::Claim)
                .await
                .unwrap()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 25);
    assert_eq!(client.get("hall".to_string()).await.unwrap().unwrap().free, 0);
}

#[tokio::test]
async fn test_closed_actor_reports_closed() {
    let (actor, client) = ResourceActor::<Seats>::new(1);
    drop(actor);

    let result = client.get("hall".to_string()).await;
    assert!(matches!(result, Err(FrameworkError::ActorClosed)));
}
