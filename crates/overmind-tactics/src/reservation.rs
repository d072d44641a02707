//! Tactical reservation table for land-mine ambush slots.
//!
//! Each agent holds at most one reservation. No two reservations may be
//! closer than `spacing`, pending or armed, so the spacing invariant holds
//! for armed mines by construction.
//!
//! Lifecycle:
//!
//! - created when a baneling commits to a slot (`reserve`)
//! - armed when it burrows on station (`arm`)
//! - refreshed every evaluation while held (`touch`)
//! - removed on unburrow (`release`), or by the scheduler's `sweep` when the
//!   owner disappears from the snapshot or stops refreshing

use std::collections::{BTreeMap, BTreeSet};

use overmind_types::{Point, UnitTag};
use serde::{Deserialize, Serialize};

use crate::error::TacticsError;

/// One reserved ambush slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// The agent holding the slot.
    pub owner: UnitTag,
    /// Slot position.
    pub position: Point,
    /// Whether the owner has burrowed on station.
    pub armed: bool,
    /// Tick the reservation was taken.
    pub created_tick: u64,
    /// Tick the owner last confirmed it.
    pub refreshed_tick: u64,
}

/// Why a reservation was removed during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepReason {
    /// The owner is no longer in the snapshot.
    OwnerMissing,
    /// The owner stopped refreshing the reservation.
    Stale,
}

/// All active reservations, keyed by owner.
#[derive(Debug, Clone)]
pub struct ReservationTable {
    by_owner: BTreeMap<UnitTag, Reservation>,
    spacing: f64,
    capacity: usize,
}

impl ReservationTable {
    /// Create an empty table with the given spacing and capacity.
    pub const fn new(spacing: f64, capacity: usize) -> Self {
        Self {
            by_owner: BTreeMap::new(),
            spacing,
            capacity,
        }
    }

    /// Required distance between reservations.
    pub const fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Number of active reservations.
    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    /// Whether there are no reservations.
    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }

    /// Whether the table is at capacity.
    pub fn is_full(&self) -> bool {
        self.by_owner.len() >= self.capacity
    }

    /// Number of armed reservations.
    pub fn armed_count(&self) -> usize {
        self.by_owner.values().filter(|r| r.armed).count()
    }

    /// The reservation held by `owner`.
    pub fn get(&self, owner: UnitTag) -> Option<&Reservation> {
        self.by_owner.get(&owner)
    }

    /// All reservations in owner order.
    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.by_owner.values()
    }

    /// The nearest reservation not held by `owner` that is closer than the
    /// spacing to `position`, with its distance.
    fn conflict(&self, position: Point, owner: UnitTag) -> Option<(&Reservation, f64)> {
        self.by_owner
            .values()
            .filter(|r| r.owner != owner)
            .map(|r| (r, r.position.distance(position)))
            .filter(|(_, d)| d.is_nan() || *d < self.spacing)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Whether `owner` could reserve `position` now.
    ///
    /// An owner's own existing reservation never blocks it.
    pub fn can_reserve(&self, position: Point, owner: UnitTag) -> bool {
        if !position.is_finite() {
            return false;
        }
        let replacing = self.by_owner.contains_key(&owner);
        (replacing || !self.is_full()) && self.conflict(position, owner).is_none()
    }

    /// Reserve `position` for `owner`, replacing any reservation it held.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::ReservationTooClose`] if another agent's
    /// reservation is closer than the spacing, or
    /// [`TacticsError::TableFull`] if a new owner would exceed capacity, or
    /// [`TacticsError::InvalidPosition`] for a non-finite position.
    pub fn reserve(
        &mut self,
        owner: UnitTag,
        position: Point,
        tick: u64,
    ) -> Result<(), TacticsError> {
        if !position.is_finite() {
            return Err(TacticsError::InvalidPosition(position));
        }
        if let Some((holder, distance)) = self.conflict(position, owner) {
            return Err(TacticsError::ReservationTooClose {
                position,
                holder: holder.owner,
                distance,
                spacing: self.spacing,
            });
        }
        if !self.by_owner.contains_key(&owner) && self.is_full() {
            return Err(TacticsError::TableFull {
                capacity: self.capacity,
            });
        }
        self.by_owner.insert(
            owner,
            Reservation {
                owner,
                position,
                armed: false,
                created_tick: tick,
                refreshed_tick: tick,
            },
        );
        Ok(())
    }

    /// Mark `owner`'s reservation armed.
    ///
    /// # Errors
    ///
    /// Returns [`TacticsError::NoReservation`] if `owner` holds none.
    pub fn arm(&mut self, owner: UnitTag, tick: u64) -> Result<(), TacticsError> {
        let reservation = self
            .by_owner
            .get_mut(&owner)
            .ok_or(TacticsError::NoReservation(owner))?;
        reservation.armed = true;
        reservation.refreshed_tick = tick;
        Ok(())
    }

    /// Refresh `owner`'s reservation. Returns whether one was held.
    pub fn touch(&mut self, owner: UnitTag, tick: u64) -> bool {
        self.by_owner.get_mut(&owner).is_some_and(|r| {
            r.refreshed_tick = tick;
            true
        })
    }

    /// Remove and return `owner`'s reservation.
    pub fn release(&mut self, owner: UnitTag) -> Option<Reservation> {
        self.by_owner.remove(&owner)
    }

    /// Evict reservations whose owner is absent from `present`, or whose last
    /// refresh is more than `timeout` ticks before `tick`.
    pub fn sweep(
        &mut self,
        present: &BTreeSet<UnitTag>,
        tick: u64,
        timeout: u64,
    ) -> Vec<(Reservation, SweepReason)> {
        let doomed: Vec<(UnitTag, SweepReason)> = self
            .by_owner
            .values()
            .filter_map(|r| {
                if !present.contains(&r.owner) {
                    Some((r.owner, SweepReason::OwnerMissing))
                } else if tick.saturating_sub(r.refreshed_tick) > timeout {
                    Some((r.owner, SweepReason::Stale))
                } else {
                    None
                }
            })
            .collect();

        doomed
            .into_iter()
            .filter_map(|(owner, reason)| self.by_owner.remove(&owner).map(|r| (r, reason)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn tag(raw: u64) -> UnitTag {
        UnitTag::new(raw)
    }

    #[test]
    fn reservations_closer_than_spacing_are_refused() {
        let mut table = ReservationTable::new(6.0, 8);
        table.reserve(tag(1), Point::new(10.0, 10.0), 0).unwrap();
        let err = table.reserve(tag(2), Point::new(14.0, 10.0), 0).unwrap_err();
        assert!(matches!(
            err,
            TacticsError::ReservationTooClose { holder, .. } if holder == tag(1)
        ));
        assert!(table.reserve(tag(2), Point::new(16.0, 10.0), 0).is_ok());
    }

    #[test]
    fn owner_may_move_its_own_reservation() {
        let mut table = ReservationTable::new(6.0, 8);
        table.reserve(tag(1), Point::new(10.0, 10.0), 0).unwrap();
        assert!(table.can_reserve(Point::new(11.0, 10.0), tag(1)));
        table.reserve(tag(1), Point::new(11.0, 10.0), 5).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(tag(1)).unwrap().created_tick, 5);
    }

    #[test]
    fn capacity_limits_new_owners_only() {
        let mut table = ReservationTable::new(1.0, 1);
        table.reserve(tag(1), Point::new(0.0, 0.0), 0).unwrap();
        assert!(matches!(
            table.reserve(tag(2), Point::new(50.0, 50.0), 0),
            Err(TacticsError::TableFull { capacity: 1 })
        ));
        assert!(table.reserve(tag(1), Point::new(50.0, 50.0), 0).is_ok());
    }

    #[test]
    fn arm_touch_and_release() {
        let mut table = ReservationTable::new(6.0, 8);
        assert!(matches!(table.arm(tag(9), 0), Err(TacticsError::NoReservation(_))));
        table.reserve(tag(9), Point::new(1.0, 1.0), 0).unwrap();
        table.arm(tag(9), 3).unwrap();
        assert_eq!(table.armed_count(), 1);
        assert!(table.touch(tag(9), 7));
        assert_eq!(table.get(tag(9)).unwrap().refreshed_tick, 7);
        assert!(table.release(tag(9)).is_some());
        assert!(!table.touch(tag(9), 8));
    }

    #[test]
    fn sweep_removes_missing_and_stale_owners() {
        let mut table = ReservationTable::new(2.0, 8);
        table.reserve(tag(1), Point::new(0.0, 0.0), 0).unwrap();
        table.reserve(tag(2), Point::new(10.0, 0.0), 0).unwrap();
        table.reserve(tag(3), Point::new(20.0, 0.0), 0).unwrap();
        table.touch(tag(3), 95);

        let present: BTreeSet<UnitTag> = [tag(2), tag(3)].into_iter().collect();
        let swept = table.sweep(&present, 100, 50);
        let reasons: Vec<(u64, SweepReason)> = swept
            .iter()
            .map(|(r, why)| (r.owner.into_inner(), *why))
            .collect();
        assert_eq!(
            reasons,
            vec![(1, SweepReason::OwnerMissing), (2, SweepReason::Stale)]
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn random_deployments_never_violate_spacing() {
        let spacing = 6.0;
        let mut table = ReservationTable::new(spacing, 64);
        let mut rng = SmallRng::seed_from_u64(7);

        for step in 0..500_u64 {
            let owner = tag(rng.random_range(0..40));
            let position = Point::new(rng.random_range(0.0..60.0), rng.random_range(0.0..60.0));
            match rng.random_range(0..4) {
                0 => {
                    table.release(owner);
                }
                1 => {
                    let _ = table.arm(owner, step);
                }
                _ => {
                    let _ = table.reserve(owner, position, step);
                }
            }

            let all: Vec<&Reservation> = table.iter().collect();
            for (i, a) in all.iter().enumerate() {
                for b in all.iter().skip(i + 1) {
                    assert!(a.position.distance(b.position) >= spacing, "step {step}");
                }
            }
        }
    }
}
