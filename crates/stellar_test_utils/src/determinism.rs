//! Determinism testing utilities.
//!
//! Two servers that load the same stored state and read it at the same
//! instant must agree to the last fractional bit. This module provides a
//! harness for checking that.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism guarded against:
//!
//! - **Floating-point math**: amounts use [`stellar_core::math::Amount`]
//!   fixed-point arithmetic throughout.
//!
//! - **HashMap iteration order**: levels, percents and catalog definitions
//!   are kept in `BTreeMap`s and iterated in id order.
//!
//! - **Wall-clock reads**: the engine takes `now` as an argument; tests use
//!   [`stellar_core::clock::ManualClock`].
//!
//! - **Lossy snapshots**: stored state is serialized with raw fixed-point
//!   bits, so a reload reproduces the exact stock.

use std::fmt::Debug;

use stellar_core::clock::Timestamp;
use stellar_core::engine::Engine;
use stellar_core::planet::Planet;
use stellar_core::research::Player;
use stellar_core::view::PlanetView;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult<T> {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Outcome of each run.
    pub outcomes: Vec<T>,
}

impl<T: Debug + PartialEq> DeterminismResult<T> {
    /// Assert that every run agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if any two runs produced different outcomes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let first_diff = self
                .outcomes
                .windows(2)
                .position(|w| w[0] != w[1])
                .unwrap_or(0);
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 First difference between run {} and {}:\n{:#?}\n{:#?}",
                self.outcomes.len(),
                first_diff,
                first_diff + 1,
                self.outcomes.get(first_diff),
                self.outcomes.get(first_diff + 1),
            );
        }
    }
}

/// Run `scenario` `runs` times from fresh state and compare outcomes.
///
/// # Example
///
/// ```ignore
/// use stellar_test_utils::determinism::verify_determinism;
/// use stellar_test_utils::scenario::Scenario;
///
/// let result = verify_determinism(3, || {
///     let mut s = Scenario::new(resources(500, 500, 0));
///     s.enqueue("metal_mine", 1).unwrap();
///     s.advance(3_600);
///     s.state()
/// });
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<T, F>(runs: usize, scenario: F) -> DeterminismResult<T>
where
    T: PartialEq,
    F: Fn() -> T,
{
    let outcomes: Vec<T> = (0..runs).map(|_| scenario()).collect();
    let is_deterministic = outcomes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        outcomes,
    }
}

/// Check that snapshotting planet and player to RON and restoring them
/// yields the same view at `now` as the originals.
///
/// # Panics
///
/// Panics if serialization itself fails or the view cannot be built.
pub fn verify_snapshot_roundtrip(
    engine: &Engine,
    planet: &Planet,
    player: &Player,
    now: Timestamp,
) -> bool {
    let planet_text = ron::to_string(planet).expect("planet serializes");
    let player_text = ron::to_string(player).expect("player serializes");
    let Ok(restored_planet) = ron::from_str::<Planet>(&planet_text) else {
        return false;
    };
    let Ok(restored_player) = ron::from_str::<Player>(&player_text) else {
        return false;
    };

    let view = |planet: &Planet, player: &Player| -> PlanetView {
        let (mut planet, mut player) = (planet.clone(), player.clone());
        engine
            .current_state(&mut planet, &mut player, now)
            .expect("view builds")
    };
    restored_planet == *planet
        && restored_player == *player
        && view(&restored_planet, &restored_player) == view(planet, player)
}

/// Proptest strategies for economy testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the ledger and queues.
pub mod strategies {
    use proptest::prelude::*;
    use stellar_core::resources::Resources;

    /// Storable building names a test can freely set levels of.
    pub const ECONOMY_BUILDINGS: [&str; 7] = [
        "metal_mine",
        "crystal_mine",
        "deuterium_synthesizer",
        "solar_plant",
        "metal_store",
        "crystal_store",
        "deuterium_store",
    ];

    /// A ledger mutation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LedgerOp {
        /// Add resources, optionally past capacity.
        Add {
            /// Amount added.
            delta: Resources,
            /// Ignore storage capacity.
            allow_overflow: bool,
        },
        /// Deduct resources, all or nothing.
        Deduct(Resources),
    }

    /// Whole-unit resources, each component in `0..max`, no energy.
    pub fn arb_resources(max: i64) -> impl Strategy<Value = Resources> {
        (0..max, 0..max, 0..max).prop_map(|(m, c, d)| Resources::new(m, c, d, 0))
    }

    /// Generate a ledger mutation with components below `max`.
    pub fn arb_ledger_op(max: i64) -> impl Strategy<Value = LedgerOp> {
        prop_oneof![
            (arb_resources(max), any::<bool>()).prop_map(|(delta, allow_overflow)| {
                LedgerOp::Add {
                    delta,
                    allow_overflow,
                }
            }),
            arb_resources(max).prop_map(LedgerOp::Deduct),
        ]
    }

    /// Generate a sequence of ledger mutations.
    pub fn arb_ledger_ops(max_len: usize, max: i64) -> impl Strategy<Value = Vec<LedgerOp>> {
        proptest::collection::vec(arb_ledger_op(max), 0..max_len)
    }

    /// Generate building levels for the economy buildings (0-25).
    pub fn arb_economy_levels() -> impl Strategy<Value = Vec<(&'static str, u32)>> {
        proptest::collection::vec(0u32..25, ECONOMY_BUILDINGS.len()).prop_map(|levels| {
            ECONOMY_BUILDINGS
                .iter()
                .copied()
                .zip(levels)
                .collect()
        })
    }

    /// Generate planet temperatures seen in the game (-130 to 260).
    pub fn arb_temperature() -> impl Strategy<Value = i32> {
        -130i32..260
    }

    /// Generate elapsed seconds up to a week.
    pub fn arb_elapsed() -> impl Strategy<Value = u64> {
        0u64..7 * 24 * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{self, resources, START};
    use crate::scenario::Scenario;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, || 40 + 2);
        assert!(result.is_deterministic);
        assert_eq!(result.outcomes, vec![42, 42, 42]);
    }

    #[test]
    fn test_queue_scenario_determinism() {
        let result = verify_determinism(3, || {
            let mut s = Scenario::new(resources(5_000, 5_000, 1_000));
            s.set_level("robot_factory", 2).set_level("shipyard", 1);
            s.enqueue("metal_mine", 1).unwrap();
            s.enqueue("rocket_launcher", 2).unwrap();
            s.advance(2_000);
            s.state()
        });
        result.assert_deterministic();
    }

    // =========================================================================
    // Snapshot round-trip tests
    // =========================================================================

    #[test]
    fn test_snapshot_preserves_queued_state() {
        let mut s = Scenario::new(resources(500, 500, 0));
        s.enqueue("metal_mine", 1).unwrap();
        s.advance(50);
        assert!(verify_snapshot_roundtrip(
            &s.engine,
            &s.planet,
            &s.player,
            s.now()
        ));
    }

    #[test]
    fn test_snapshot_preserves_developed_planet() {
        let engine = fixtures::engine();
        let planet = fixtures::developed_planet(engine.catalog(), 1, 1);
        let player = fixtures::player(1);
        assert!(verify_snapshot_roundtrip(
            &engine,
            &planet,
            &player,
            START.plus(12_345)
        ));
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_reads_are_deterministic(
            levels in arb_economy_levels(),
            temperature in arb_temperature(),
            elapsed in arb_elapsed(),
        ) {
            let result = verify_determinism(2, || {
                let mut s = Scenario::new(resources(1_000, 1_000, 0));
                for &(name, level) in &levels {
                    s.set_level(name, level);
                }
                s.planet.max_temperature = temperature;
                s.advance(elapsed);
                s.state()
            });
            prop_assert!(result.is_deterministic);
        }
    }
}
