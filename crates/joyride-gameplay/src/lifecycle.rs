//! Per-tick crowd orchestration: spawn scheduling, behavior updates
//! and despawn predicates.
//!
//! [`CrowdManager`] owns every crowd subsystem and a single seeded RNG,
//! so identical seeds and tick sequences replay identically. The host
//! calls [`CrowdManager::tick`] once per frame.

use crate::behavior::BehaviorSystem;
use crate::config::{BehaviorConfig, ConfigError, CrowdConfig};
use crate::events::{CrowdEvent, DespawnReason, EventBus};
use crate::registry::PedestrianRegistry;
use crate::sidewalk::SidewalkMap;
use crate::spawn::SpawnPlanner;
use crate::world::WorldServices;
use glam::Vec3;
use joyride_common::ids::AgentId;
use joyride_common::pose::{horizontal_delta, Pose};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Interval timer gating spawn attempts.
///
/// The timer keeps accumulating while spawning is blocked (population
/// at cap), so a freed slot is refilled on the next tick rather than a
/// full interval later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    interval: f32,
    elapsed: f32,
}

impl SpawnScheduler {
    /// Creates a scheduler firing every `interval` seconds.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Accumulates elapsed time.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Returns `true` once the interval has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.elapsed > self.interval
    }

    /// Restarts the interval after a successful spawn.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Seconds accumulated toward the next fire.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

/// Population snapshot plus cumulative lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdStats {
    /// Live agents right now
    pub live: usize,
    /// Population cap
    pub capacity: usize,
    /// Agents spawned since construction
    pub spawned: u64,
    /// Agents removed for leaving the despawn radius
    pub despawned_out_of_range: u64,
    /// Agents removed for lingering behind the player
    pub despawned_behind: u64,
}

/// Owns and orchestrates the whole pedestrian crowd.
#[derive(Debug)]
pub struct CrowdManager {
    config: CrowdConfig,
    behavior: BehaviorSystem,
    planner: SpawnPlanner,
    registry: PedestrianRegistry,
    scheduler: SpawnScheduler,
    sidewalks: SidewalkMap,
    events: EventBus,
    rng: fastrand::Rng,
    stats: CrowdStats,
}

impl CrowdManager {
    /// Creates a manager with default tuning over `sidewalks`.
    #[must_use]
    pub fn new(sidewalks: SidewalkMap) -> Self {
        Self::build(CrowdConfig::default(), BehaviorConfig::default(), sidewalks)
    }

    /// Creates a manager with custom tuning, validating both configs.
    pub fn with_config(
        crowd: CrowdConfig,
        behavior: BehaviorConfig,
        sidewalks: SidewalkMap,
    ) -> Result<Self, ConfigError> {
        crowd.validate()?;
        behavior.validate()?;
        Ok(Self::build(crowd, behavior, sidewalks))
    }

    fn build(crowd: CrowdConfig, behavior: BehaviorConfig, sidewalks: SidewalkMap) -> Self {
        info!(
            "Crowd manager ready: cap {}, spawn interval {}s, {} sidewalk surfaces",
            crowd.max_pedestrians,
            crowd.spawn_interval,
            sidewalks.len()
        );
        Self {
            behavior: BehaviorSystem::new(behavior),
            planner: SpawnPlanner::new(&crowd),
            registry: PedestrianRegistry::new(&crowd),
            scheduler: SpawnScheduler::new(crowd.spawn_interval),
            rng: fastrand::Rng::with_seed(crowd.seed),
            events: EventBus::default(),
            stats: CrowdStats::default(),
            sidewalks,
            config: crowd,
        }
    }

    /// Advances the whole crowd by one frame.
    ///
    /// Order within the tick: spawn timer, per-agent behavior, despawn
    /// predicates. Agents whose predicate fires are gone before the
    /// call returns.
    pub fn tick<W: WorldServices>(&mut self, dt: f32, world: &mut W) {
        // Bound the step during frame hitches
        let dt = dt.min(self.config.max_time_step);
        let player = world.player_pose();

        self.try_spawn(dt, world, &player);
        self.behavior
            .update(&mut self.rng, world, &self.sidewalks, &mut self.registry, dt);
        self.despawn_expired(dt, world, &player);
    }

    /// Spawns an agent at `position` immediately, bypassing the spawn
    /// timer but not the population cap.
    ///
    /// For scripted moments; the regular flow plans positions through
    /// the timer. Returns `None` at cap.
    pub fn spawn_at<W: WorldServices>(&mut self, world: &mut W, position: Vec3) -> Option<AgentId> {
        let agent = self.registry.spawn(&mut self.rng, world, position)?;
        self.stats.spawned += 1;
        self.events.publish(CrowdEvent::Spawned { agent, position });
        Some(agent)
    }

    fn try_spawn<W: WorldServices>(&mut self, dt: f32, world: &mut W, player: &Pose) {
        self.scheduler.advance(dt);
        if !self.scheduler.is_ready() || !self.registry.has_room() {
            return;
        }
        let position = self.planner.plan(&mut self.rng, player, &self.sidewalks);
        if self.spawn_at(world, position).is_some() {
            self.scheduler.reset();
        }
    }

    fn despawn_expired<W: WorldServices>(&mut self, dt: f32, world: &mut W, player: &Pose) {
        let despawn_distance_squared = self.config.despawn_distance * self.config.despawn_distance;
        let forward = player.forward();
        let mut expired: Vec<(usize, DespawnReason)> = Vec::new();

        for (index, pedestrian) in self.registry.iter_mut().enumerate() {
            let Some(pose) = world.body_pose(pedestrian.id) else {
                continue;
            };

            // Distance first; it short-circuits the behind check
            if player.position.distance_squared(pose.position) > despawn_distance_squared {
                expired.push((index, DespawnReason::OutOfRange));
                continue;
            }

            let behind = horizontal_delta(player.position, pose.position)
                .try_normalize()
                .is_some_and(|direction| direction.dot(forward) < self.config.behind_dot_threshold);
            if behind {
                pedestrian.time_behind += dt;
                if pedestrian.time_behind >= self.config.behind_despawn_delay {
                    expired.push((index, DespawnReason::BehindPlayer));
                }
            } else {
                pedestrian.time_behind = 0.0;
            }
        }

        // Remove back to front so earlier indices stay valid
        for (index, reason) in expired.into_iter().rev() {
            if let Some(agent) = self.registry.despawn(world, index) {
                match reason {
                    DespawnReason::OutOfRange => self.stats.despawned_out_of_range += 1,
                    DespawnReason::BehindPlayer => self.stats.despawned_behind += 1,
                }
                self.events.publish(CrowdEvent::Despawned { agent, reason });
            }
        }
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` when no agents are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Population and lifecycle counters.
    #[must_use]
    pub fn stats(&self) -> CrowdStats {
        CrowdStats {
            live: self.registry.len(),
            capacity: self.registry.capacity(),
            ..self.stats
        }
    }

    /// Live agent collection.
    #[must_use]
    pub const fn registry(&self) -> &PedestrianRegistry {
        &self.registry
    }

    /// Lifecycle event bus; drain once per frame.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Crowd tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &CrowdConfig {
        &self.config
    }

    /// Walkable surfaces used for spawning and wandering.
    #[must_use]
    pub const fn sidewalks(&self) -> &SidewalkMap {
        &self.sidewalks
    }

    /// Mutable surface access so the host can stream geometry in and
    /// out as the city loads.
    pub fn sidewalks_mut(&mut self) -> &mut SidewalkMap {
        &mut self.sidewalks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;
    use proptest::prelude::*;

    const TICK: f32 = 1.0 / 60.0;

    fn manager_with(cap: usize, interval: f32) -> CrowdManager {
        let config = CrowdConfig::with_seed(404)
            .with_max_pedestrians(cap)
            .with_spawn_interval(interval);
        CrowdManager::with_config(config, BehaviorConfig::default(), SidewalkMap::new())
            .expect("config is valid")
    }

    /// Ticks until the first agent exists, returning its id.
    fn run_until_first_spawn(manager: &mut CrowdManager, world: &mut MemoryWorld) -> AgentId {
        for _ in 0..400 {
            manager.tick(TICK, world);
            if let Some(pedestrian) = manager.registry().get(0) {
                return pedestrian.id;
            }
        }
        panic!("no spawn within 400 ticks");
    }

    #[test]
    fn test_scheduler_fires_after_interval() {
        let mut scheduler = SpawnScheduler::new(3.0);
        scheduler.advance(2.9);
        assert!(!scheduler.is_ready());
        scheduler.advance(0.2);
        assert!(scheduler.is_ready());
        scheduler.reset();
        assert!(!scheduler.is_ready());
        assert!(scheduler.elapsed().abs() < f32::EPSILON);
    }

    #[test]
    fn test_scheduler_stays_ready_until_reset() {
        let mut scheduler = SpawnScheduler::new(1.0);
        scheduler.advance(5.0);
        assert!(scheduler.is_ready());
        scheduler.advance(1.0);
        assert!(scheduler.is_ready());
    }

    #[test]
    fn test_first_spawn_after_interval() {
        let mut manager = manager_with(5, 3.0);
        let mut world = MemoryWorld::new();

        // Just past the 3 second interval at 60 Hz
        for _ in 0..190 {
            manager.tick(TICK, &mut world);
        }

        assert_eq!(manager.len(), 1);
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.visual_count(), 1);
        let stats = manager.stats();
        assert_eq!(stats.spawned, 1);
        assert_eq!(stats.live, 1);

        let events = manager.events().drain();
        assert_eq!(events.len(), 1);
        let CrowdEvent::Spawned { agent, position } = events[0] else {
            panic!("expected a spawn event");
        };
        let pose = world.body_pose(agent).expect("body exists");
        assert!((pose.position - position).length() < 1e-6);
    }

    #[test]
    fn test_no_spawn_before_interval() {
        let mut manager = manager_with(5, 3.0);
        let mut world = MemoryWorld::new();

        for _ in 0..170 {
            manager.tick(TICK, &mut world);
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_population_never_exceeds_cap() {
        let mut manager = manager_with(3, 0.5);
        let mut world = MemoryWorld::new();

        for _ in 0..600 {
            manager.tick(TICK, &mut world);
            world.step(TICK);
            assert!(manager.len() <= 3);
        }
        assert_eq!(manager.len(), 3);
        assert_eq!(world.body_count(), 3);
    }

    /// Manager whose timer never fires within a test, so the only
    /// agents are the ones placed explicitly.
    fn scripted_manager(cap: usize) -> CrowdManager {
        manager_with(cap, 1000.0)
    }

    #[test]
    fn test_distance_despawn_is_immediate() {
        let mut manager = scripted_manager(5);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::facing(Vec3::ZERO, Vec3::Z));

        // Ahead of the player but beyond the despawn radius
        manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 160.0))
            .expect("under cap");
        manager.tick(TICK, &mut world);

        assert!(manager.is_empty());
        assert_eq!(world.body_count(), 0);
        assert_eq!(manager.stats().despawned_out_of_range, 1);
        let events = manager.events().drain();
        assert!(events.iter().any(|event| matches!(
            event,
            CrowdEvent::Despawned {
                reason: DespawnReason::OutOfRange,
                ..
            }
        )));
    }

    #[test]
    fn test_behind_despawn_fires_after_delay() {
        let mut manager = scripted_manager(1);
        let mut world = MemoryWorld::new();
        // Player faces -Z, so +Z is directly behind
        world.set_player_pose(Pose::at(Vec3::ZERO));
        manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 30.0))
            .expect("under cap");

        let mut despawn_tick = None;
        for tick in 1..=250 {
            manager.tick(TICK, &mut world);
            if manager.is_empty() {
                despawn_tick = Some(tick);
                break;
            }
        }

        // 4.0s at 60 Hz is 240 ticks; float accumulation may push the
        // crossing one tick later
        let tick = despawn_tick.expect("agent should despawn");
        assert!((240..=241).contains(&tick), "despawned at tick {tick}");
        assert_eq!(manager.stats().despawned_behind, 1);
    }

    #[test]
    fn test_behind_timer_resets_when_seen() {
        let mut manager = scripted_manager(1);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::at(Vec3::ZERO));
        let agent = manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 30.0))
            .expect("under cap");

        // Two seconds behind the player accumulates the timer
        for _ in 0..120 {
            manager.tick(TICK, &mut world);
        }
        let accumulated = manager.registry().get(0).expect("still live").time_behind;
        assert!(accumulated > 1.9 && accumulated < 2.1);

        // One tick in front resets it to exactly zero
        world.set_body_pose(agent, Pose::at(Vec3::new(0.0, 0.0, -30.0)));
        manager.tick(TICK, &mut world);
        let reset = manager.registry().get(0).expect("still live").time_behind;
        assert!(reset.abs() < f32::EPSILON);

        // Back behind: the full delay applies again
        world.set_body_pose(agent, Pose::at(Vec3::new(0.0, 0.0, 30.0)));
        for _ in 0..239 {
            manager.tick(TICK, &mut world);
        }
        assert_eq!(manager.len(), 1);
        for _ in 0..3 {
            manager.tick(TICK, &mut world);
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_behind_timer_grows_by_dt() {
        let mut manager = scripted_manager(1);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::at(Vec3::ZERO));
        manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 30.0))
            .expect("under cap");

        manager.tick(TICK, &mut world);
        let first = manager.registry().get(0).expect("live").time_behind;
        manager.tick(TICK, &mut world);
        let second = manager.registry().get(0).expect("live").time_behind;

        assert!(first > 0.0);
        assert!((second - first - TICK).abs() < 1e-6);
    }

    #[test]
    fn test_freed_slot_refills_next_tick() {
        // Cap 1 and a long-expired timer: despawning the only agent
        // must allow a spawn on the very next tick
        let mut manager = manager_with(1, 0.1);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::facing(Vec3::ZERO, Vec3::Z));
        let agent = run_until_first_spawn(&mut manager, &mut world);

        // Hold the cap for a while so the timer accumulates well past
        // its interval
        for _ in 0..120 {
            manager.tick(TICK, &mut world);
        }
        assert_eq!(manager.len(), 1);

        world.set_body_pose(agent, Pose::at(Vec3::new(0.0, 0.0, 200.0)));
        manager.tick(TICK, &mut world);
        assert!(manager.is_empty());

        manager.tick(TICK, &mut world);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CrowdConfig::default().with_spawn_interval(0.0);
        let result = CrowdManager::with_config(config, BehaviorConfig::default(), SidewalkMap::new());
        assert!(matches!(result, Err(ConfigError::NotPositive { .. })));
    }

    #[test]
    fn test_stats_track_both_reasons() {
        let mut manager = scripted_manager(2);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::at(Vec3::ZERO));

        // One agent far out of range, one lingering behind
        manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 400.0))
            .expect("under cap");
        manager
            .spawn_at(&mut world, Vec3::new(0.0, 0.0, 40.0))
            .expect("under cap");

        for _ in 0..245 {
            manager.tick(TICK, &mut world);
        }

        let stats = manager.stats();
        assert_eq!(stats.spawned, 2);
        assert_eq!(stats.despawned_out_of_range, 1);
        assert_eq!(stats.despawned_behind, 1);
        assert_eq!(stats.live, 0);
        assert_eq!(stats.capacity, 2);
    }

    proptest! {
        #[test]
        fn test_population_bounded_for_any_seed(
            seed in any::<u64>(),
            cap in 1usize..6,
            steps in 1usize..300,
        ) {
            let config = CrowdConfig::with_seed(seed)
                .with_max_pedestrians(cap)
                .with_spawn_interval(0.2);
            let mut manager = CrowdManager::with_config(
                config,
                BehaviorConfig::default(),
                SidewalkMap::new(),
            )
            .expect("config is valid");
            let mut world = MemoryWorld::new();

            for _ in 0..steps {
                manager.tick(TICK, &mut world);
                world.step(TICK);
                prop_assert!(manager.len() <= cap);
                prop_assert!(world.body_count() <= cap);
            }
        }
    }
}
