//! The per-tick World Snapshot and neighborhood queries.
//!
//! A [`WorldSnapshot`] is rebuilt from scratch every tick from the
//! provider's [`Observation`]. It is the read-only world context passed by
//! shared reference into every steering and tactics computation; nothing
//! holds onto it across ticks. Neighborhoods are derived on demand and never
//! cached.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use overmind_types::{Agent, Enemy, Point, UnitTag};
use serde::{Deserialize, Serialize};

use crate::terrain::TerrainOracle;

/// Raw per-tick data returned by a snapshot provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Every controllable friendly unit.
    pub agents: Vec<Agent>,
    /// Every visible hostile unit and structure.
    pub enemies: Vec<Enemy>,
    /// Owned town-hall positions, main base first.
    pub own_bases: Vec<Point>,
    /// Known enemy town-hall positions, main base first, natural second.
    pub enemy_bases: Vec<Point>,
    /// Footprint centers of friendly structures (ground obstacles).
    pub friendly_structures: Vec<Point>,
    /// Current attack objective from the strategy layer, if any.
    pub objective: Option<Point>,
}

/// Read-only view of the world for one tick.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    tick: u64,
    agents: BTreeMap<UnitTag, Agent>,
    enemies: Vec<Enemy>,
    own_bases: Vec<Point>,
    enemy_bases: Vec<Point>,
    friendly_structures: Vec<Point>,
    objective: Option<Point>,
    map_center: Point,
    duplicate_tags: Vec<UnitTag>,
}

/// Friendly agents within a radius of one agent, excluding the agent itself.
#[derive(Debug, Clone)]
pub struct Neighborhood<'a> {
    /// The agent the neighborhood is centered on.
    pub center: &'a Agent,
    /// Query radius.
    pub radius: f64,
    /// Neighbors in tag order.
    pub members: Vec<&'a Agent>,
}

impl Neighborhood<'_> {
    /// Number of neighbors.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the agent has no neighbors.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean neighbor position, or `None` with no neighbors.
    pub fn centroid(&self) -> Option<Point> {
        Point::centroid(self.members.iter().map(|a| a.position))
    }
}

impl WorldSnapshot {
    /// Build a snapshot from an observation.
    ///
    /// The map center is taken from the terrain oracle. When two agents
    /// share a tag the first one reported wins; later copies are dropped and
    /// listed in [`WorldSnapshot::duplicate_tags`].
    pub fn build(tick: u64, observation: Observation, terrain: &dyn TerrainOracle) -> Self {
        let mut agents = BTreeMap::new();
        let mut duplicate_tags = Vec::new();
        for agent in observation.agents {
            match agents.entry(agent.tag) {
                Entry::Vacant(slot) => {
                    slot.insert(agent);
                }
                Entry::Occupied(_) => duplicate_tags.push(agent.tag),
            }
        }

        let mut enemies = observation.enemies;
        enemies.sort_by_key(|e| e.tag);

        Self {
            tick,
            agents,
            enemies,
            own_bases: observation.own_bases,
            enemy_bases: observation.enemy_bases,
            friendly_structures: observation.friendly_structures,
            objective: observation.objective,
            map_center: terrain.map_center(),
            duplicate_tags,
        }
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The tick this snapshot describes.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Look up one agent by tag.
    pub fn agent(&self, tag: UnitTag) -> Option<&Agent> {
        self.agents.get(&tag)
    }

    /// All agents in tag order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Tags of every agent present this tick.
    pub fn agent_tags(&self) -> BTreeSet<UnitTag> {
        self.agents.keys().copied().collect()
    }

    /// All visible enemies, units and structures.
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Look up one enemy by tag.
    pub fn enemy(&self, tag: UnitTag) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.tag == tag)
    }

    /// Owned base positions, main first.
    pub fn own_bases(&self) -> &[Point] {
        &self.own_bases
    }

    /// Known enemy base positions, main first.
    pub fn enemy_bases(&self) -> &[Point] {
        &self.enemy_bases
    }

    /// The enemy main base, if known.
    pub fn enemy_main(&self) -> Option<Point> {
        self.enemy_bases.first().copied()
    }

    /// The enemy natural expansion, if known.
    pub fn enemy_natural(&self) -> Option<Point> {
        self.enemy_bases.get(1).copied()
    }

    /// Friendly structure footprint centers.
    pub fn friendly_structures(&self) -> &[Point] {
        &self.friendly_structures
    }

    /// The strategy layer's current objective.
    pub const fn objective(&self) -> Option<Point> {
        self.objective
    }

    /// Center of the map as reported by the terrain oracle.
    pub const fn map_center(&self) -> Point {
        self.map_center
    }

    /// Tags whose later copies were dropped while building, in report order.
    pub fn duplicate_tags(&self) -> &[UnitTag] {
        &self.duplicate_tags
    }

    // -------------------------------------------------------------------
    // Spatial queries
    // -------------------------------------------------------------------

    /// Friendly agents within `radius` of `agent`, excluding `agent`.
    ///
    /// Agents with non-finite positions are never neighbors.
    pub fn neighborhood<'a>(&'a self, agent: &'a Agent, radius: f64) -> Neighborhood<'a> {
        let members = self
            .agents
            .values()
            .filter(|other| other.tag != agent.tag && other.position.is_finite())
            .filter(|other| other.position.distance(agent.position) <= radius)
            .collect();
        Neighborhood {
            center: agent,
            radius,
            members,
        }
    }

    /// Mobile hostile units (not structures).
    pub fn hostile_units(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| !e.is_structure())
    }

    /// Hostile structures.
    pub fn hostile_structures(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_structure())
    }

    /// Visible enemy units of a splash-damage class.
    pub fn splash_threats(&self) -> impl Iterator<Item = &Enemy> {
        self.hostile_units().filter(|e| e.class.is_splash_threat())
    }

    /// Enemies (units and structures) within `radius` of `point`.
    pub fn enemies_within(&self, point: Point, radius: f64) -> impl Iterator<Item = &Enemy> {
        self.enemies
            .iter()
            .filter(move |e| e.position.distance(point) <= radius)
    }

    /// Hostile ground units within `radius` of `point`.
    pub fn ground_units_within(&self, point: Point, radius: f64) -> impl Iterator<Item = &Enemy> {
        self.hostile_units()
            .filter(move |e| e.is_ground() && e.position.distance(point) <= radius)
    }

    /// Nearest enemy accepted by `filter`, with its distance.
    pub fn nearest_enemy<F>(&self, point: Point, filter: F) -> Option<(&Enemy, f64)>
    where
        F: Fn(&Enemy) -> bool,
    {
        self.enemies
            .iter()
            .filter(|e| filter(e))
            .map(|e| (e, e.position.distance(point)))
            .filter(|(_, d)| d.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Centroid of hostile units within `radius` of `point`.
    pub fn enemy_centroid_near(&self, point: Point, radius: f64) -> Option<Point> {
        Point::centroid(
            self.hostile_units()
                .filter(|e| e.position.distance(point) <= radius)
                .map(|e| e.position),
        )
    }

    /// Nearest owned base to `point`.
    pub fn nearest_own_base(&self, point: Point) -> Option<Point> {
        self.own_bases
            .iter()
            .copied()
            .min_by(|a, b| a.distance(point).total_cmp(&b.distance(point)))
    }
}
