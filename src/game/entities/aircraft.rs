//! Aircraft entity logic.
//!
//! An aircraft is a fixed 10-cell shape anchored at its head:
//!
//! ```text
//!     H        (0,0)        head
//!   WWBWW      (-2..=2,+1)  wings, body in the middle
//!     B        (0,+2)       body
//!    TTT       (-1..=1,+3)  tail
//! ```
//!
//! Every orientation is a rotation of this baseline around the head, computed by
//! `Orientation::rotate`. Placement validation and any preview must go through
//! `Aircraft::footprint` so both sides agree on the covered cells.

use serde::{Serialize, Deserialize};

use crate::config::game::AIRCRAFT_CELLS;
use crate::game::error::PlacementError;
use crate::game::types::{AircraftId, Coordinate, Orientation, ShipPart};

/// Baseline shape, in part order. The head is always first.
const BASELINE: [(i16, i16, ShipPart); AIRCRAFT_CELLS] = [
    (0, 0, ShipPart::Head),
    (-2, 1, ShipPart::Wing),
    (-1, 1, ShipPart::Wing),
    (0, 1, ShipPart::Body),
    (1, 1, ShipPart::Wing),
    (2, 1, ShipPart::Wing),
    (0, 2, ShipPart::Body),
    (-1, 3, ShipPart::Tail),
    (0, 3, ShipPart::Tail),
    (1, 3, ShipPart::Tail),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftPart {
    pub coordinate: Coordinate,
    pub kind: ShipPart,
}

/// A placed aircraft. Parts are derived from head + orientation and never change;
/// `destroyed` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aircraft {
    pub id: AircraftId,
    pub head: Coordinate,
    pub orientation: Orientation,
    parts: Vec<AircraftPart>,
    destroyed: bool,
}

impl Aircraft {
    /// Build an aircraft, failing if any of its cells would leave the board.
    pub fn new(id: AircraftId, head: Coordinate, orientation: Orientation) -> Result<Self, PlacementError> {
        let parts = Self::footprint(head, orientation)
            .ok_or(PlacementError::OutOfBounds { index: id as usize })?;
        Ok(Self {
            id,
            head,
            orientation,
            parts,
            destroyed: false,
        })
    }

    /// The 10 cells covered by an aircraft with this head and orientation,
    /// or `None` if any of them falls outside the board.
    pub fn footprint(head: Coordinate, orientation: Orientation) -> Option<Vec<AircraftPart>> {
        BASELINE
            .iter()
            .map(|&(dx, dy, kind)| {
                let (rx, ry) = orientation.rotate(dx, dy);
                head.offset(rx, ry).map(|coordinate| AircraftPart { coordinate, kind })
            })
            .collect()
    }

    /// Check a candidate against bounds and already-occupied cells. No side effects.
    /// `index` is the candidate's position in the submitted list, used in the error.
    pub fn can_place(
        index: usize,
        head: Coordinate,
        orientation: Orientation,
        occupied: &[Coordinate],
    ) -> Result<(), PlacementError> {
        let parts = Self::footprint(head, orientation).ok_or(PlacementError::OutOfBounds { index })?;
        match parts.iter().find(|p| occupied.contains(&p.coordinate)) {
            Some(part) => Err(PlacementError::Overlap { index, at: part.coordinate }),
            None => Ok(()),
        }
    }

    pub fn parts(&self) -> &[AircraftPart] {
        &self.parts
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.parts.iter().map(|p| p.coordinate)
    }

    pub fn part_at(&self, coordinate: Coordinate) -> Option<ShipPart> {
        self.parts.iter().find(|p| p.coordinate == coordinate).map(|p| p.kind)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}
