//! Ship classes and placed ships, tracked with `BitBoard` masks.

use alloc::vec::Vec;
use core::fmt;

use crate::bitboard::BitBoard;
use crate::common::{BoardError, Coord};
use crate::config::{BOARD_SIZE, FLEET, MAX_SHIP_LENGTH};

type Grid = BitBoard<u128, BOARD_SIZE>;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// `length` cells starting at `origin`, growing right or down.
    pub fn line(self, origin: Coord, length: usize) -> Vec<Coord> {
        (0..length as i32)
            .map(|i| match self {
                Orientation::Horizontal => origin.offset(i, 0),
                Orientation::Vertical => origin.offset(0, i),
            })
            .collect()
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipClass {
    name: &'static str,
    length: usize,
}

impl ShipClass {
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Fleet class for a ship of `length` cells.
    pub fn for_length(length: usize) -> Option<ShipClass> {
        FLEET.iter().copied().find(|c| c.length == length)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

/// A ship placed on the board, with hits tracked in a mask.
#[derive(Clone, PartialEq, Eq)]
pub struct Ship {
    class: ShipClass,
    cells: Vec<Coord>,
    mask: Grid,
    hits: Grid,
}

impl Ship {
    /// Builds a ship from its cells, checking length, bounds, uniqueness and
    /// straightness. Occupancy is the board's concern.
    pub fn from_cells(cells: &[Coord]) -> Result<Self, BoardError> {
        let class = if cells.is_empty() || cells.len() > MAX_SHIP_LENGTH {
            None
        } else {
            ShipClass::for_length(cells.len())
        }
        .ok_or(BoardError::InvalidShipLength { len: cells.len() })?;

        if let Some(&c) = cells.iter().find(|c| !c.in_bounds()) {
            return Err(BoardError::OutOfBounds(c));
        }

        let mut mask = Grid::new();
        for &c in cells {
            if mask.contains(c) {
                return Err(BoardError::DuplicateCell(c));
            }
            mask.insert(c)?;
        }

        if !is_straight_line(cells) {
            return Err(BoardError::NotStraight);
        }

        Ok(Ship {
            class,
            cells: cells.to_vec(),
            mask,
            hits: Grid::new(),
        })
    }

    /// Records a hit at `coord`. Returns `false` if the ship does not cover it.
    pub fn register_hit(&mut self, coord: Coord) -> bool {
        if self.mask.contains(coord) {
            let _ = self.hits.insert(coord);
            true
        } else {
            false
        }
    }

    /// Every cell has been hit.
    pub fn is_sunk(&self) -> bool {
        self.hits.count() == self.cells.len()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.mask.contains(coord)
    }

    pub fn class(&self) -> ShipClass {
        self.class
    }

    pub fn length(&self) -> usize {
        self.cells.len()
    }

    /// Cells in the order they were given at placement.
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn hit_count(&self) -> usize {
        self.hits.count()
    }

    pub fn mask(&self) -> Grid {
        self.mask
    }
}

fn is_straight_line(cells: &[Coord]) -> bool {
    if cells.len() <= 1 {
        return true;
    }
    let horizontal = cells.iter().all(|c| c.y == cells[0].y);
    let vertical = cells.iter().all(|c| c.x == cells[0].x);
    let along = |c: &Coord| if horizontal { c.x } else { c.y };
    if !horizontal && !vertical {
        return false;
    }
    let min = cells.iter().map(along).min().unwrap_or(0);
    let max = cells.iter().map(along).max().unwrap_or(0);
    // Cells are unique at this point, so a span equal to the count means no gaps.
    (max - min + 1) as usize == cells.len()
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ class: \"{}\", cells: {:?}, hits: {} }}",
            self.class.name(),
            self.cells,
            self.hits.count(),
        )
    }
}
