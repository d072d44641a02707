//! Scripted skirmish host for headless runs.
//!
//! [`SkirmishHost`] plays the game side of the loop on the default skirmish
//! map. It reads the batches the controller dispatched through the channel
//! sink, applies them with a little movement jitter, advances a crude combat
//! model, sends enemy waves from the enemy natural toward the friendly ramp,
//! and reports the result as the next [`Observation`].

use overmind_types::{
    AbilityId, AbilityTarget, Agent, Command, CommandBatch, Enemy, IssuedCommand, Point, UnitClass,
    UnitTag, Vec2,
};
use overmind_world::{
    GridTerrain, Observation, SkirmishMap, SnapshotProvider, TerrainOracle, WorldError,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info};

/// Longest distance a unit covers for one move order.
const MAX_STEP: f64 = 3.0;

/// A move ends the unit's order once it is this close to the target.
const ARRIVAL_RADIUS: f64 = 0.5;

/// Enemy walking distance per tick.
const ENEMY_STEP: f64 = 0.12;

/// Health fraction removed by one friendly attack.
const ATTACK_DAMAGE: f64 = 0.1;

/// Health fraction removed by one enemy attack.
const ENEMY_DAMAGE: f64 = 0.04;

/// Weapon cooldown after any attack, in seconds.
const WEAPON_COOLDOWN: f64 = 0.6;

/// Baneling detonation radius and damage.
const EXPLODE_RADIUS: f64 = 2.2;
const EXPLODE_DAMAGE: f64 = 0.6;

/// Fungal Growth radius and damage.
const FUNGAL_RADIUS: f64 = 2.25;
const FUNGAL_DAMAGE: f64 = 0.3;

/// Caster energy regeneration per second, and its cap.
const ENERGY_PER_SECOND: f64 = 0.7875;
const MAX_ENERGY: f64 = 200.0;

/// First tag handed to spawned enemies.
const FIRST_ENEMY_TAG: u64 = 10_000;

/// Units per row of the starting army block.
const ARMY_COLUMNS: u32 = 6;

/// Enemy wave composition, cycled.
const WAVE_CLASSES: [UnitClass; 5] = [
    UnitClass::Marine,
    UnitClass::Marine,
    UnitClass::Marauder,
    UnitClass::Hellion,
    UnitClass::SiegeTank,
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The `skirmish` section of `overmind-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkirmishConfig {
    /// Seed for movement jitter and wave scatter.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Starting zerglings.
    #[serde(default = "default_zerglings")]
    pub zerglings: u32,

    /// Starting banelings.
    #[serde(default = "default_banelings")]
    pub banelings: u32,

    /// Starting roaches.
    #[serde(default = "default_roaches")]
    pub roaches: u32,

    /// Starting hydralisks.
    #[serde(default = "default_hydralisks")]
    pub hydralisks: u32,

    /// Starting mutalisks.
    #[serde(default = "default_mutalisks")]
    pub mutalisks: u32,

    /// Starting lurkers.
    #[serde(default = "default_lurkers")]
    pub lurkers: u32,

    /// Starting infestors.
    #[serde(default = "default_infestors")]
    pub infestors: u32,

    /// Enemies per wave.
    #[serde(default = "default_wave_size")]
    pub wave_size: u32,

    /// Ticks between waves.
    #[serde(default = "default_wave_interval_ticks")]
    pub wave_interval_ticks: u64,

    /// Waves sent before the enemy stops reinforcing.
    #[serde(default = "default_max_waves")]
    pub max_waves: u32,

    /// Maximum per-axis movement jitter in map units.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            zerglings: default_zerglings(),
            banelings: default_banelings(),
            roaches: default_roaches(),
            hydralisks: default_hydralisks(),
            mutalisks: default_mutalisks(),
            lurkers: default_lurkers(),
            infestors: default_infestors(),
            wave_size: default_wave_size(),
            wave_interval_ticks: default_wave_interval_ticks(),
            max_waves: default_max_waves(),
            jitter: default_jitter(),
        }
    }
}

const fn default_seed() -> u64 {
    7
}

const fn default_zerglings() -> u32 {
    8
}

const fn default_banelings() -> u32 {
    6
}

const fn default_roaches() -> u32 {
    4
}

const fn default_hydralisks() -> u32 {
    4
}

const fn default_mutalisks() -> u32 {
    4
}

const fn default_lurkers() -> u32 {
    2
}

const fn default_infestors() -> u32 {
    1
}

const fn default_wave_size() -> u32 {
    6
}

const fn default_wave_interval_ticks() -> u64 {
    224
}

const fn default_max_waves() -> u32 {
    5
}

const fn default_jitter() -> f64 {
    0.1
}

impl SkirmishConfig {
    fn army(&self) -> [(UnitClass, u32); 7] {
        [
            (UnitClass::Zergling, self.zerglings),
            (UnitClass::Baneling, self.banelings),
            (UnitClass::Roach, self.roaches),
            (UnitClass::Hydralisk, self.hydralisks),
            (UnitClass::Mutalisk, self.mutalisks),
            (UnitClass::Lurker, self.lurkers),
            (UnitClass::Infestor, self.infestors),
        ]
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// A toy game world that obeys the controller's batches.
#[derive(Debug)]
pub struct SkirmishHost {
    config: SkirmishConfig,
    rng: SmallRng,
    commands: mpsc::Receiver<CommandBatch>,
    terrain: GridTerrain,
    world: Observation,
    spawn_point: Point,
    seconds_per_tick: f64,
    next_enemy_tag: u64,
    waves_spawned: u32,
    batches_applied: u64,
}

impl SkirmishHost {
    /// Place the starting army in the friendly main and wait for orders on
    /// `commands`.
    pub fn new(
        map: &SkirmishMap,
        config: SkirmishConfig,
        commands: mpsc::Receiver<CommandBatch>,
        ticks_per_second: f64,
    ) -> Self {
        let home = map.own_bases.first().copied().unwrap_or(Point::new(10.0, 10.0));
        let origin = home - Vec2::new(6.0, 6.0);
        let mut agents = Vec::new();
        let mut slot: u32 = 0;
        for (class, count) in config.army() {
            for _ in 0..count {
                let col = f64::from(slot % ARMY_COLUMNS);
                let row = f64::from(slot / ARMY_COLUMNS);
                let tag = UnitTag::new(u64::from(slot).saturating_add(1));
                let mut agent = Agent::new(tag, class, origin + Vec2::new(col * 1.5, row * 1.5));
                if class == UnitClass::Infestor {
                    agent.energy = 100.0;
                }
                agents.push(agent);
                slot = slot.saturating_add(1);
            }
        }

        let spawn_point = map
            .enemy_bases
            .get(1)
            .or_else(|| map.enemy_bases.first())
            .copied()
            .unwrap_or_else(|| map.terrain.map_center());
        let seconds_per_tick = if ticks_per_second > 0.0 { 1.0 / ticks_per_second } else { 0.0 };

        info!(agents = agents.len(), spawn = %spawn_point, "skirmish host ready");
        Self {
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            commands,
            terrain: map.terrain.clone(),
            world: Observation {
                agents,
                enemies: Vec::new(),
                own_bases: map.own_bases.clone(),
                enemy_bases: map.enemy_bases.clone(),
                friendly_structures: map.own_bases.clone(),
                objective: Some(map.own_ramp),
            },
            spawn_point,
            seconds_per_tick,
            next_enemy_tag: FIRST_ENEMY_TAG,
            waves_spawned: 0,
            batches_applied: 0,
        }
    }

    /// Friendly units still alive.
    pub fn agents_alive(&self) -> usize {
        self.world.agents.len()
    }

    /// Enemy units still alive.
    pub fn enemies_alive(&self) -> usize {
        self.world.enemies.len()
    }

    /// Waves sent so far.
    pub const fn waves_spawned(&self) -> u32 {
        self.waves_spawned
    }

    /// Batches received and applied so far.
    pub const fn batches_applied(&self) -> u64 {
        self.batches_applied
    }

    fn jitter(&mut self) -> Vec2 {
        let j = self.config.jitter.max(0.0);
        if j <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.rng.random_range(-j..=j), self.rng.random_range(-j..=j))
    }

    fn apply(&mut self, batch: &CommandBatch) {
        let mut detonated = Vec::new();
        for issued in &batch.commands {
            if let Some(tag) = self.apply_command(issued) {
                detonated.push(tag);
            }
        }
        self.world.agents.retain(|a| !detonated.contains(&a.tag));
        self.batches_applied = self.batches_applied.saturating_add(1);
    }

    /// Apply one order. Returns the tag of a unit that blew itself up.
    fn apply_command(&mut self, issued: &IssuedCommand) -> Option<UnitTag> {
        let jitter = self.jitter();
        let agent = self.world.agents.iter_mut().find(|a| a.tag == issued.tag)?;
        match issued.command {
            Command::MoveTo(target) => {
                if agent.is_burrowed && agent.class != UnitClass::Infestor {
                    return None;
                }
                let step = (target - agent.position).clamp_length(MAX_STEP);
                let next = agent.position + step + jitter;
                if agent.is_flying() || self.terrain.is_traversable(next) {
                    agent.position = next;
                }
                agent.is_idle = agent.position.distance(target) <= ARRIVAL_RADIUS;
            }
            Command::AttackTarget(target) => {
                agent.is_idle = false;
                let reach = agent.class.attack_range() + 1.0;
                let Some(enemy) = self
                    .world
                    .enemies
                    .iter_mut()
                    .find(|e| e.tag == target && e.position.distance(agent.position) <= reach)
                else {
                    return None;
                };
                if agent.weapon_ready() {
                    enemy.health_ratio -= ATTACK_DAMAGE;
                    agent.weapon_cooldown = WEAPON_COOLDOWN;
                }
            }
            Command::CastAbility { ability, target } => match ability {
                AbilityId::BurrowDown => {
                    agent.is_burrowed = true;
                    agent.is_idle = true;
                }
                AbilityId::BurrowUp => {
                    agent.is_burrowed = false;
                    agent.is_idle = true;
                }
                AbilityId::Explode => {
                    damage_area(
                        &mut self.world.enemies,
                        agent.position,
                        EXPLODE_RADIUS,
                        EXPLODE_DAMAGE,
                    );
                    debug!(tag = %agent.tag, "baneling detonated");
                    return Some(agent.tag);
                }
                AbilityId::FungalGrowth => {
                    let center = match target {
                        AbilityTarget::Point(point) => point,
                        AbilityTarget::Unit(tag) => self
                            .world
                            .enemies
                            .iter()
                            .find(|e| e.tag == tag)
                            .map_or(agent.position, |e| e.position),
                        AbilityTarget::None => agent.position,
                    };
                    agent.energy = (agent.energy - ability.energy_cost()).max(0.0);
                    damage_area(&mut self.world.enemies, center, FUNGAL_RADIUS, FUNGAL_DAMAGE);
                }
            },
        }
        None
    }

    /// One tick of the combat model and the enemy script.
    fn advance(&mut self, tick: u64) {
        let dt = self.seconds_per_tick;
        for agent in &mut self.world.agents {
            agent.weapon_cooldown = (agent.weapon_cooldown - dt).max(0.0);
            let regen = if agent.is_burrowed {
                0.01
            } else if agent.class.regen_dances() {
                0.004
            } else {
                0.001
            };
            agent.health_ratio = (agent.health_ratio + regen).min(1.0);
            if agent.class == UnitClass::Infestor {
                agent.energy = (agent.energy + ENERGY_PER_SECOND * dt).min(MAX_ENERGY);
            }
        }

        for enemy in &mut self.world.enemies {
            enemy.weapon_cooldown = (enemy.weapon_cooldown - dt).max(0.0);
            let class = enemy.class;
            let Some(victim) = self
                .world
                .agents
                .iter_mut()
                .filter(|a| !a.is_burrowed && class.can_target(a.domain))
                .min_by(|a, b| {
                    a.position
                        .distance(enemy.position)
                        .total_cmp(&b.position.distance(enemy.position))
                })
            else {
                continue;
            };
            let distance = victim.position.distance(enemy.position);
            if distance > class.attack_range() {
                enemy.position = enemy.position.towards(victim.position, ENEMY_STEP);
            } else if enemy.weapon_cooldown <= 0.0 {
                victim.health_ratio -= ENEMY_DAMAGE;
                enemy.weapon_cooldown = WEAPON_COOLDOWN;
            }
        }

        self.world.agents.retain(|a| a.health_ratio > 0.0);
        self.world.enemies.retain(|e| e.health_ratio > 0.0);

        let interval = self.config.wave_interval_ticks.max(1);
        if tick % interval == 0 && self.waves_spawned < self.config.max_waves {
            self.spawn_wave(tick);
        }
    }

    fn spawn_wave(&mut self, tick: u64) {
        for i in 0..self.config.wave_size {
            let class = WAVE_CLASSES
                .get(usize::try_from(i).unwrap_or(0) % WAVE_CLASSES.len())
                .copied()
                .unwrap_or(UnitClass::Marine);
            let scatter = Vec2::new(
                self.rng.random_range(-3.0..=3.0),
                self.rng.random_range(-3.0..=3.0),
            );
            let tag = UnitTag::new(self.next_enemy_tag);
            self.next_enemy_tag = self.next_enemy_tag.saturating_add(1);
            self.world.enemies.push(Enemy::new(tag, class, self.spawn_point + scatter));
        }
        self.waves_spawned = self.waves_spawned.saturating_add(1);
        info!(tick, wave = self.waves_spawned, size = self.config.wave_size, "enemy wave spawned");
    }
}

impl SnapshotProvider for SkirmishHost {
    fn observe(&mut self, tick: u64) -> Result<Observation, WorldError> {
        loop {
            match self.commands.try_recv() {
                Ok(batch) => self.apply(&batch),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(WorldError::ProviderFailed {
                        reason: String::from("command channel closed"),
                    });
                }
            }
        }
        self.advance(tick);
        Ok(self.world.clone())
    }
}

fn damage_area(enemies: &mut [Enemy], center: Point, radius: f64, amount: f64) {
    for enemy in enemies.iter_mut().filter(|e| e.position.distance(center) <= radius) {
        enemy.health_ratio -= amount;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use overmind_types::{BatchId, CommandOrigin};
    use overmind_world::create_skirmish_map;

    use super::*;

    fn quiet() -> SkirmishConfig {
        SkirmishConfig {
            jitter: 0.0,
            max_waves: 0,
            ..SkirmishConfig::default()
        }
    }

    fn host(config: SkirmishConfig) -> (SkirmishHost, mpsc::Sender<CommandBatch>) {
        let map = create_skirmish_map().unwrap();
        let (tx, rx) = mpsc::channel(8);
        (SkirmishHost::new(&map, config, rx, 22.4), tx)
    }

    fn order(tick: u64, tag: u64, command: Command) -> CommandBatch {
        CommandBatch {
            id: BatchId::new(),
            tick,
            dispatched_at: Utc::now(),
            commands: vec![IssuedCommand {
                tag: UnitTag::new(tag),
                command,
                origin: CommandOrigin::Movement,
            }],
        }
    }

    #[test]
    fn army_starts_inside_the_main() {
        let (mut host, _tx) = host(quiet());
        let world = host.observe(0).unwrap();
        assert_eq!(world.agents.len(), 29);
        let map = create_skirmish_map().unwrap();
        for agent in &world.agents {
            assert!(map.terrain.is_traversable(agent.position), "{}", agent.position);
        }
        let infestor = world.agents.iter().find(|a| a.class == UnitClass::Infestor).unwrap();
        assert!(infestor.energy >= 100.0);
    }

    #[test]
    fn moves_are_capped_per_order() {
        let (mut host, tx) = host(quiet());
        let start = host.observe(0).unwrap().agents.first().unwrap().position;
        let target = start + Vec2::new(10.0, 0.0);
        tx.try_send(order(0, 1, Command::MoveTo(target))).unwrap();
        let moved = host.observe(1).unwrap().agents.first().unwrap().position;
        assert!((moved.distance(start) - MAX_STEP).abs() < 1e-9);
        assert_eq!(host.batches_applied(), 1);
    }

    #[test]
    fn detonation_removes_the_baneling_and_hurts_neighbors() {
        let (mut host, tx) = host(quiet());
        let world = host.observe(0).unwrap();
        let baneling = world
            .agents
            .iter()
            .find(|a| a.class == UnitClass::Baneling)
            .unwrap()
            .clone();
        let beside = baneling.position + Vec2::new(1.0, 0.0);
        host.world
            .enemies
            .push(Enemy::new(UnitTag::new(77), UnitClass::Marine, beside));

        tx.try_send(order(0, u64::from(baneling.tag), Command::cast(AbilityId::Explode)))
            .unwrap();
        let after = host.observe(1).unwrap();
        assert!(after.agents.iter().all(|a| a.tag != baneling.tag));
        let marine = after.enemies.iter().find(|e| e.tag == UnitTag::new(77)).unwrap();
        assert!(marine.health_ratio < 0.5);
    }

    #[test]
    fn waves_follow_the_interval_up_to_the_cap() {
        let config = SkirmishConfig {
            wave_interval_ticks: 10,
            max_waves: 2,
            ..quiet()
        };
        let size = usize::try_from(config.wave_size).unwrap();
        let (mut host, _tx) = host(config);
        for tick in 0..35 {
            host.observe(tick).unwrap();
        }
        assert_eq!(host.waves_spawned(), 2);
        assert!(host.enemies_alive() <= size * 2);
    }

    #[test]
    fn same_seed_replays_the_same_world() {
        let config = SkirmishConfig::default();
        let (mut a, tx_a) = host(config.clone());
        let (mut b, tx_b) = host(config);
        for tick in 0..20 {
            let command = Command::MoveTo(Point::new(20.0, 15.0));
            tx_a.try_send(order(tick, 3, command)).unwrap();
            tx_b.try_send(order(tick, 3, command)).unwrap();
            assert_eq!(a.observe(tick).unwrap(), b.observe(tick).unwrap());
        }
    }

    #[test]
    fn closed_channel_fails_the_observation() {
        let (mut host, tx) = host(quiet());
        drop(tx);
        assert!(matches!(host.observe(0), Err(WorldError::ProviderFailed { .. })));
    }
}
