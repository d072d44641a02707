//! Enumeration types: unit classes, movement domains, and ability ids.
//!
//! Unit class data (ranges, domains, burrow capability, splash classification)
//! is resolved through `match` on the closed [`UnitClass`] enum so every
//! per-class decision is checked at compile time.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// Movement domain of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Walks on terrain; blocked by obstacles and chokepoints.
    Ground,
    /// Flies over terrain; ignores terrain repulsion.
    Flying,
}

// ---------------------------------------------------------------------------
// Unit classes
// ---------------------------------------------------------------------------

/// Every unit class the engine knows about, friendly or hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    // --- Zerg ground ---
    /// Worker.
    Drone,
    /// Fast melee swarm unit.
    Zergling,
    /// Suicide splash unit; the land-mine ambusher.
    Baneling,
    /// Armored ranged unit that regenerates quickly while burrowed.
    Roach,
    /// Roach morph with corrosive bile.
    Ravager,
    /// Ranged anti-everything unit.
    Hydralisk,
    /// Siege unit that can only fire while burrowed.
    Lurker,
    /// Support caster with a ranged attack.
    Queen,
    /// Caster; travels burrowed and casts Fungal Growth.
    Infestor,
    /// Locust spawner.
    SwarmHost,
    /// Heavy melee unit.
    Ultralisk,

    // --- Zerg air ---
    /// Harassment flyer that dances out of combat to regenerate.
    Mutalisk,
    /// Anti-air flyer.
    Corruptor,
    /// Long-range siege flyer.
    BroodLord,
    /// Detector.
    Overseer,
    /// Air caster.
    Viper,

    // --- Terran ---
    /// Basic infantry.
    Marine,
    /// Armored infantry.
    Marauder,
    /// Light raider.
    Reaper,
    /// Fast light vehicle.
    Hellion,
    /// Tank in mobile mode.
    SiegeTank,
    /// Tank in siege mode.
    SiegeTankSieged,
    /// Burrowed splash mine.
    WidowMine,
    /// Heavy walker with splash anti-air.
    Thor,
    /// Lock-on vehicle.
    Cyclone,
    /// Transforming fighter.
    Viking,
    /// Healer dropship.
    Medivac,
    /// Zone-control gunship.
    Liberator,

    // --- Protoss ---
    /// Melee infantry.
    Zealot,
    /// Blinking ranged walker.
    Stalker,
    /// Shade-teleporting attacker.
    Adept,
    /// Support caster.
    Sentry,
    /// Psionic Storm caster.
    HighTemplar,
    /// Merged splash unit.
    Archon,
    /// Anti-armor walker.
    Immortal,
    /// Cliff-walking beam unit.
    Colossus,
    /// Purification Nova caster.
    Disruptor,
    /// Anti-air harasser.
    Phoenix,
    /// Beam flyer.
    VoidRay,
    /// Worker harasser.
    Oracle,

    // --- Static defense ---
    /// Protoss static defense.
    PhotonCannon,
    /// Terran infantry bunker.
    Bunker,
    /// Terran anti-air turret.
    MissileTurret,
    /// Fortified Terran town hall.
    PlanetaryFortress,
    /// Zerg ground static defense.
    SpineCrawler,
    /// Zerg anti-air static defense.
    SporeCrawler,
}

impl UnitClass {
    /// Domain a unit of this class normally occupies.
    pub const fn default_domain(self) -> Domain {
        match self {
            Self::Mutalisk
            | Self::Corruptor
            | Self::BroodLord
            | Self::Overseer
            | Self::Viper
            | Self::Viking
            | Self::Medivac
            | Self::Liberator
            | Self::Phoenix
            | Self::VoidRay
            | Self::Oracle => Domain::Flying,
            _ => Domain::Ground,
        }
    }

    /// Weapon range in map units. Zero for units without a weapon.
    pub const fn attack_range(self) -> f64 {
        match self {
            Self::Drone | Self::Zergling | Self::Zealot => 0.1,
            Self::Baneling => 0.25,
            Self::Ultralisk => 1.0,
            Self::Mutalisk | Self::Archon => 3.0,
            Self::Roach | Self::Adept | Self::Oracle => 4.0,
            Self::Hydralisk
            | Self::Queen
            | Self::Marine
            | Self::Reaper
            | Self::Hellion
            | Self::WidowMine
            | Self::Cyclone
            | Self::Liberator
            | Self::Sentry
            | Self::Phoenix => 5.0,
            Self::Ravager
            | Self::Corruptor
            | Self::Marauder
            | Self::Stalker
            | Self::Immortal
            | Self::VoidRay
            | Self::Bunker
            | Self::PlanetaryFortress => 6.0,
            Self::SiegeTank
            | Self::Thor
            | Self::Colossus
            | Self::PhotonCannon
            | Self::MissileTurret
            | Self::SpineCrawler
            | Self::SporeCrawler => 7.0,
            Self::Lurker => 8.0,
            Self::Viking => 9.0,
            Self::BroodLord => 10.0,
            Self::SiegeTankSieged => 13.0,
            Self::Infestor
            | Self::SwarmHost
            | Self::Overseer
            | Self::Viper
            | Self::Medivac
            | Self::HighTemplar
            | Self::Disruptor => 0.0,
        }
    }

    /// Whether the class has a weapon at all.
    pub const fn has_weapon(self) -> bool {
        self.attack_range() > 0.0
    }

    /// Ranged weapon users (eligible for concave formation).
    pub const fn is_ranged(self) -> bool {
        self.attack_range() > 1.5
    }

    /// Melee weapon users.
    pub const fn is_melee(self) -> bool {
        self.has_weapon() && !self.is_ranged()
    }

    /// Whether this class can shoot targets in `domain`.
    pub const fn can_target(self, domain: Domain) -> bool {
        match domain {
            Domain::Ground => !matches!(
                self,
                Self::Corruptor
                    | Self::Viking
                    | Self::Phoenix
                    | Self::MissileTurret
                    | Self::SporeCrawler
                    | Self::Infestor
                    | Self::SwarmHost
                    | Self::Overseer
                    | Self::Viper
                    | Self::Medivac
                    | Self::HighTemplar
                    | Self::Disruptor
            ),
            Domain::Flying => matches!(
                self,
                Self::Hydralisk
                    | Self::Queen
                    | Self::Mutalisk
                    | Self::Corruptor
                    | Self::Marine
                    | Self::Thor
                    | Self::Cyclone
                    | Self::Viking
                    | Self::Liberator
                    | Self::Stalker
                    | Self::Sentry
                    | Self::Archon
                    | Self::Phoenix
                    | Self::VoidRay
                    | Self::PhotonCannon
                    | Self::Bunker
                    | Self::MissileTurret
                    | Self::SporeCrawler
            ),
        }
    }

    /// Classes that can toggle burrow.
    pub const fn can_burrow(self) -> bool {
        matches!(
            self,
            Self::Drone
                | Self::Zergling
                | Self::Baneling
                | Self::Roach
                | Self::Ravager
                | Self::Hydralisk
                | Self::Lurker
                | Self::Queen
                | Self::Infestor
                | Self::SwarmHost
                | Self::Ultralisk
        )
    }

    /// Area-damage classes that punish clumped units.
    pub const fn is_splash_threat(self) -> bool {
        matches!(
            self,
            Self::SiegeTank
                | Self::SiegeTankSieged
                | Self::HighTemplar
                | Self::Disruptor
                | Self::Baneling
                | Self::WidowMine
                | Self::Colossus
                | Self::Archon
                | Self::Thor
                | Self::Liberator
        )
    }

    /// Stationary buildings.
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::PhotonCannon
                | Self::Bunker
                | Self::MissileTurret
                | Self::PlanetaryFortress
                | Self::SpineCrawler
                | Self::SporeCrawler
        )
    }

    /// Flyers that retreat to regenerate instead of fighting at low health.
    pub const fn regen_dances(self) -> bool {
        matches!(self, Self::Mutalisk)
    }

    /// Flyers that must spread out aggressively under splash fire.
    pub const fn is_splash_sensitive_air(self) -> bool {
        matches!(self, Self::Mutalisk)
    }
}

// ---------------------------------------------------------------------------
// Abilities
// ---------------------------------------------------------------------------

/// Abilities the tactical layer may cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    /// Burrow into the ground.
    BurrowDown,
    /// Surface from burrow.
    BurrowUp,
    /// Baneling detonation.
    Explode,
    /// Infestor area root.
    FungalGrowth,
}

impl AbilityId {
    /// Energy cost of a cast (zero for free abilities).
    pub const fn energy_cost(self) -> f64 {
        match self {
            Self::FungalGrowth => 75.0,
            Self::BurrowDown | Self::BurrowUp | Self::Explode => 0.0,
        }
    }
}
