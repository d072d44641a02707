//! Shared sandbox for scheduler integration tests.
//!
//! The sandbox holds the world the provider would report and applies each
//! dispatched batch to it directly: moves teleport, burrow toggles flip the
//! flag, attacks are ignored. That is enough to walk the tactical state
//! machines through their phases tick by tick.

#![allow(dead_code, clippy::unwrap_used)]

use overmind_core::{MicroConfig, MicroController, TickOutput};
use overmind_types::{AbilityId, Agent, Command, CommandBatch, Enemy, Point, UnitClass, UnitTag};
use overmind_world::{GridTerrain, Observation, SkirmishMap, create_skirmish_map};

/// A controller, a terrain, and the world it observes.
pub struct Sandbox {
    pub controller: MicroController,
    pub terrain: GridTerrain,
    pub world: Observation,
}

impl Sandbox {
    /// An empty world on an open 64x64 grid.
    pub fn open(config: MicroConfig) -> Self {
        Self {
            controller: MicroController::new(config).unwrap(),
            terrain: GridTerrain::new(64, 64).unwrap(),
            world: Observation::default(),
        }
    }

    /// The default skirmish map with its bases filled in.
    pub fn skirmish(config: MicroConfig) -> Self {
        let SkirmishMap {
            terrain,
            own_bases,
            enemy_bases,
            ..
        } = create_skirmish_map().unwrap();
        Self {
            controller: MicroController::new(config).unwrap(),
            terrain,
            world: Observation {
                own_bases,
                enemy_bases,
                ..Observation::default()
            },
        }
    }

    /// Run one scheduler step and apply its batch to the world.
    pub fn step(&mut self) -> TickOutput {
        let out = self.controller.step(self.world.clone(), &self.terrain).unwrap();
        apply(&mut self.world, &out.batch);
        out
    }

    /// Step until the clock reaches `tick`, returning every output.
    pub fn run_until(&mut self, tick: u64) -> Vec<TickOutput> {
        let mut outputs = Vec::new();
        while self.controller.clock().tick() < tick {
            outputs.push(self.step());
        }
        outputs
    }

    /// The agent with `tag`, as the world currently stands.
    pub fn agent(&self, tag: UnitTag) -> Option<&Agent> {
        self.world.agents.iter().find(|a| a.tag == tag)
    }
}

/// Apply a batch to the world the way an obedient game would.
pub fn apply(world: &mut Observation, batch: &CommandBatch) {
    let mut detonated = Vec::new();
    for issued in &batch.commands {
        let Some(agent) = world.agents.iter_mut().find(|a| a.tag == issued.tag) else {
            continue;
        };
        match issued.command {
            Command::MoveTo(target) => agent.position = target,
            Command::AttackTarget(_) => {}
            Command::CastAbility { ability, .. } => match ability {
                AbilityId::BurrowDown => agent.is_burrowed = true,
                AbilityId::BurrowUp => agent.is_burrowed = false,
                AbilityId::Explode => detonated.push(agent.tag),
                AbilityId::FungalGrowth => agent.energy -= AbilityId::FungalGrowth.energy_cost(),
            },
        }
    }
    world.agents.retain(|a| !detonated.contains(&a.tag));
}

/// A healthy agent of `class`.
pub fn agent(tag: u64, class: UnitClass, x: f64, y: f64) -> Agent {
    Agent::new(UnitTag::new(tag), class, Point::new(x, y))
}

/// A full-health enemy of `class`.
pub fn enemy(tag: u64, class: UnitClass, x: f64, y: f64) -> Enemy {
    Enemy::new(UnitTag::new(tag), class, Point::new(x, y))
}
