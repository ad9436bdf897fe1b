//! Integration tests for the game service.

use std::sync::Arc;

use stellar_core::catalog::ObjectId;
use stellar_core::clock::ManualClock;
use stellar_core::error::GameError;
use stellar_core::math::Amount;
use stellar_core::planet::PlanetId;
use stellar_core::production::QueueKind;
use stellar_core::research::PlayerId;
use stellar_server::protocol::{decode_request, encode_response, Request, Response};
use stellar_server::service::GameService;
use stellar_server::store::{GameStore, MemoryStore};
use stellar_test_utils::fixtures::{self, resources, START};

fn service() -> (Arc<GameService<MemoryStore>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let service = GameService::new(
        fixtures::engine(),
        MemoryStore::new(),
        clock.clone(),
        resources(5_000, 5_000, 5_000),
        40,
    );
    (Arc::new(service), clock)
}

fn object(service: &GameService<MemoryStore>, name: &str) -> ObjectId {
    service.engine().catalog().id_of(name).unwrap()
}

/// A player with two planets, each with a research lab.
async fn two_labs(service: &GameService<MemoryStore>) -> (PlayerId, PlanetId, PlanetId) {
    let player = service.create_player("ada").unwrap();
    let home = service.create_planet(player, "Home").await.unwrap();
    let colony = service.create_planet(player, "Colony").await.unwrap();
    for planet in [home, colony] {
        service
            .set_object_level(planet, "research_lab", 1)
            .await
            .unwrap();
    }
    (player, home, colony)
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency {
    use super::*;

    /// Research on one planet blocks research on another planet of the same
    /// player, even when both requests race.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_research_from_two_planets() {
        let (service, _clock) = service();
        let (player, home, colony) = two_labs(&service).await;
        let energy = object(&service, "energy_technology");

        let (a, b) = tokio::join!(
            {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.enqueue(home, energy, 1).await })
            },
            {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.enqueue(colony, energy, 1).await })
            },
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(succeeded, 1, "outcomes: {outcomes:?}");
        assert!(outcomes.iter().any(|o| matches!(
            o,
            Err(GameError::QueueFull {
                queue: QueueKind::Research,
                limit: 1
            })
        )));

        // Only the winning planet paid.
        let spent: Vec<bool> = [home, colony]
            .iter()
            .map(|p| {
                let planet = service.store().load_planet(*p).unwrap();
                planet.ledger().stored().crystal() < Amount::from_num(5_000)
            })
            .collect();
        assert_eq!(spent.iter().filter(|s| **s).count(), 1);
        assert_eq!(
            service.store().load_player(player).unwrap().queue().len(),
            1
        );
    }

    /// Requests for different planets of different players run side by side.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_planets_do_not_interfere() {
        let (service, _clock) = service();
        let mut planets = Vec::new();
        for name in ["ada", "bo", "cy", "di"] {
            let player = service.create_player(name).unwrap();
            planets.push(service.create_planet(player, "Home").await.unwrap());
        }
        let mine = object(&service, "metal_mine");

        let handles: Vec<_> = planets
            .iter()
            .map(|&planet| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.enqueue(planet, mine, 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for planet in planets {
            let view = service.state(planet).await.unwrap();
            assert!(view.object("metal_mine").unwrap().in_queue);
        }
    }

    /// Many concurrent deductions from one planet never overdraw it.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deductions_serialize() {
        let (service, _clock) = service();
        let player = service.create_player("ada").unwrap();
        let planet = service.create_planet(player, "Home").await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .deduct_resources(planet, resources(1_000, 0, 0))
                        .await
                })
            })
            .collect();
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        let view = service.state(planet).await.unwrap();
        assert_eq!(view.resources.floor().metal(), Amount::ZERO);
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_research_completes_for_every_planet() {
        let (service, clock) = service();
        let (_player, home, colony) = two_labs(&service).await;
        let energy = object(&service, "energy_technology");

        service.enqueue(home, energy, 1).await.unwrap();
        let finish = service
            .state(home)
            .await
            .unwrap()
            .object("energy_technology")
            .unwrap()
            .queue_finish
            .unwrap();
        clock.set(finish);

        let view = service.state(colony).await.unwrap();
        assert_eq!(view.object("energy_technology").unwrap().level, 1);
    }

    /// A pending batch comes back in full and the refund is saved.
    #[tokio::test]
    async fn test_cancel_refunds_through_service() {
        let (service, _clock) = service();
        let player = service.create_player("ada").unwrap();
        let planet = service.create_planet(player, "Home").await.unwrap();
        service.set_object_level(planet, "shipyard", 1).await.unwrap();
        let launcher = object(&service, "rocket_launcher");

        service.enqueue(planet, launcher, 1).await.unwrap();
        let pending = service.enqueue(planet, launcher, 1).await.unwrap();
        let refund = service.cancel(planet, launcher, pending).await.unwrap();
        assert_eq!(refund, resources(2_000, 0, 0));

        let view = service.state(planet).await.unwrap();
        assert_eq!(
            view.resources.floor().without_energy(),
            resources(3_000, 5_000, 5_000)
        );
    }

    #[tokio::test]
    async fn test_research_cancel_from_other_planet_is_rejected() {
        let (service, _clock) = service();
        let (_player, home, colony) = two_labs(&service).await;
        let computer = object(&service, "computer_technology");

        let item = service.enqueue(home, computer, 1).await.unwrap();
        assert_eq!(
            service.cancel(colony, computer, item).await.unwrap_err(),
            GameError::ItemNotFound(item)
        );
    }
}

// =============================================================================
// Protocol
// =============================================================================

mod protocol {
    use super::*;

    async fn send(service: &GameService<MemoryStore>, line: &str) -> String {
        let response = match decode_request(line) {
            Ok(request) => service.handle(request).await,
            Err(response) => response,
        };
        encode_response(&response)
    }

    #[tokio::test]
    async fn test_json_session() {
        let (service, clock) = service();
        assert_eq!(
            send(&service, r#"{"cmd":"create_player","name":"ada"}"#).await,
            r#"{"type":"player_created","player_id":1}"#
        );
        assert_eq!(
            send(
                &service,
                r#"{"cmd":"create_planet","player_id":1,"name":"Home"}"#
            )
            .await,
            r#"{"type":"planet_created","planet_id":1}"#
        );

        let mine = object(&service, "metal_mine").0;
        let line = format!(r#"{{"cmd":"add_build_request","planet_id":1,"object_id":{mine}}}"#);
        assert_eq!(
            send(&service, &line).await,
            r#"{"type":"queued","item_id":1}"#
        );

        // Already in progress, and the default in-progress refund is zero.
        let line = format!(
            r#"{{"cmd":"cancel_build_request","planet_id":1,"object_id":{mine},"item_id":1}}"#
        );
        assert_eq!(
            send(&service, &line).await,
            r#"{"type":"cancelled","refund":{"metal":0,"crystal":0,"deuterium":0}}"#
        );

        clock.advance(60);
        let state = send(&service, r#"{"cmd":"state","planet_id":1}"#).await;
        assert!(state.starts_with(r#"{"type":"state","view":"#));
    }

    #[tokio::test]
    async fn test_error_kinds_are_distinct() {
        let (service, _clock) = service();
        send(&service, r#"{"cmd":"create_player","name":"ada"}"#).await;
        send(
            &service,
            r#"{"cmd":"create_planet","player_id":1,"name":"Home"}"#,
        )
        .await;

        let cases = [
            (
                r#"{"cmd":"set_object_level","planet_id":1,"machine_name":"metal_mine","level":-1}"#,
                "invalid_level",
            ),
            (
                r#"{"cmd":"set_object_level","planet_id":1,"machine_name":"death_ray","level":1}"#,
                "unknown_object",
            ),
            (
                r#"{"cmd":"deduct_resources","planet_id":1,"metal":999999}"#,
                "insufficient_resources",
            ),
            (
                r#"{"cmd":"cancel_build_request","planet_id":1,"object_id":1,"item_id":77}"#,
                "item_not_found",
            ),
            (r#"{"cmd":"state","planet_id":5}"#, "unknown_planet"),
            (
                r#"{"cmd":"set_research_level","player_id":8,"machine_name":"energy_technology","level":1}"#,
                "unknown_player",
            ),
            (r#"{"cmd":"bogus"}"#, "bad_request"),
        ];
        for (line, kind) in cases {
            let response = send(&service, line).await;
            assert!(
                response.contains(&format!(r#""kind":"{kind}""#)),
                "{line} -> {response}"
            );
        }
    }

    #[tokio::test]
    async fn test_add_resources_request() {
        let (service, _clock) = service();
        let player = service.create_player("ada").unwrap();
        let planet = service.create_planet(player, "Home").await.unwrap();

        let response = service
            .handle(Request::AddResources {
                planet_id: planet,
                metal: 1_000,
                crystal: 0,
                deuterium: 0,
                allow_overflow: false,
            })
            .await;
        assert_eq!(response, Response::Ok);
        let view = service.state(planet).await.unwrap();
        assert_eq!(
            view.resources.floor().without_energy(),
            resources(6_000, 5_000, 5_000)
        );
    }
}
