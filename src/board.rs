//! One player's board: ship placement, attack resolution and win detection.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::bitboard::BitBoard;
use crate::common::{BoardError, Coord};
use crate::config::{BOARD_SIZE, FLEET, FLEET_SIZE, MAX_FLEET_RESTARTS, PLACEMENT_ATTEMPTS};
use crate::ship::{Orientation, Ship};

type Grid = BitBoard<u128, BOARD_SIZE>;

/// Observable state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Cell {
    Empty,
    Ship,
    Hit,
    Miss,
}

/// Details of a shot that struck a ship.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct HitReport {
    /// Index of the ship in placement order.
    pub ship_id: usize,
    pub ship_length: usize,
    /// Every cell of the ship, present only on the shot that sank it.
    pub sunk_cells: Option<Vec<Coord>>,
    /// The shot sank the last afloat ship on the board.
    pub game_over: bool,
}

impl HitReport {
    pub fn sunk(&self) -> bool {
        self.sunk_cells.is_some()
    }
}

/// Outcome of firing at a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Shot {
    Hit(HitReport),
    Miss,
    /// Coordinate off the board; nothing changed.
    Invalid,
}

impl Shot {
    pub fn is_hit(&self) -> bool {
        matches!(self, Shot::Hit(_))
    }

    pub fn sunk(&self) -> bool {
        matches!(self, Shot::Hit(report) if report.sunk())
    }

    pub fn sunk_cells(&self) -> Option<&[Coord]> {
        match self {
            Shot::Hit(report) => report.sunk_cells.as_deref(),
            _ => None,
        }
    }

    pub fn game_over(&self) -> bool {
        matches!(self, Shot::Hit(report) if report.game_over)
    }
}

#[derive(Clone, Default)]
pub struct Board {
    ships: Vec<Ship>,
    ship_map: Grid,
    hits: Grid,
    misses: Grid,
}

impl Board {
    /// Empty board with no ships.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// Ships not yet sunk.
    pub fn ships_remaining(&self) -> usize {
        self.ships.iter().filter(|s| !s.is_sunk()).count()
    }

    /// `true` once ships exist and every one of them is sunk.
    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }

    pub fn ship_map(&self) -> Grid {
        self.ship_map
    }

    pub fn hits(&self) -> Grid {
        self.hits
    }

    pub fn misses(&self) -> Grid {
        self.misses
    }

    /// Whether `coord` has already been fired upon.
    pub fn fired(&self, coord: Coord) -> bool {
        self.hits.contains(coord) || self.misses.contains(coord)
    }

    pub fn cell(&self, coord: Coord) -> Cell {
        if self.hits.contains(coord) {
            Cell::Hit
        } else if self.misses.contains(coord) {
            Cell::Miss
        } else if self.ship_map.contains(coord) {
            Cell::Ship
        } else {
            Cell::Empty
        }
    }

    /// Row-major cell states, ships included.
    pub fn grid(&self) -> Vec<Cell> {
        all_coords().map(|c| self.cell(c)).collect()
    }

    /// Row-major cell states as the opponent may see them: intact ship cells
    /// read as empty.
    pub fn public_grid(&self) -> Vec<Cell> {
        all_coords()
            .map(|c| match self.cell(c) {
                Cell::Ship => Cell::Empty,
                other => other,
            })
            .collect()
    }

    /// All occupied cells, ship by ship.
    pub fn ship_cells(&self) -> Vec<Coord> {
        self.ships.iter().flat_map(|s| s.cells().iter().copied()).collect()
    }

    /// Cells of every sunk ship.
    pub fn sunk_ships(&self) -> Vec<Vec<Coord>> {
        self.ships
            .iter()
            .filter(|s| s.is_sunk())
            .map(|s| s.cells().to_vec())
            .collect()
    }

    /// Removes every ship and shot.
    pub fn clear(&mut self) {
        *self = Board::new();
    }

    /// Checks `cells` against the placement rules without touching the board.
    pub fn validate(&self, cells: &[Coord]) -> Result<Ship, BoardError> {
        let ship = Ship::from_cells(cells)?;
        if let Some(&c) = cells.iter().find(|&&c| self.ship_map.contains(c)) {
            return Err(BoardError::Occupied(c));
        }
        let halo = self.ship_map.dilate();
        if let Some(&c) = cells.iter().find(|&&c| halo.contains(c)) {
            return Err(BoardError::Adjacent(c));
        }
        Ok(ship)
    }

    /// Places a ship over `cells`, returning the new ship count. On error the
    /// board is unchanged.
    pub fn place(&mut self, cells: &[Coord]) -> Result<usize, BoardError> {
        let ship = self.validate(cells)?;
        self.ship_map |= ship.mask();
        self.ships.push(ship);
        Ok(self.ships.len())
    }

    /// A random legal line of `length` cells, or `None` after
    /// `PLACEMENT_ATTEMPTS` tries.
    pub fn random_line<R: Rng + ?Sized>(&self, rng: &mut R, length: usize) -> Option<Vec<Coord>> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_x, max_y) = match orient {
                Orientation::Horizontal => (BOARD_SIZE - length, BOARD_SIZE - 1),
                Orientation::Vertical => (BOARD_SIZE - 1, BOARD_SIZE - length),
            };
            let origin = Coord::new(
                rng.random_range(0..=max_x) as i32,
                rng.random_range(0..=max_y) as i32,
            );
            let cells = orient.line(origin, length);
            if self.validate(&cells).is_ok() {
                return Some(cells);
            }
        }
        None
    }

    /// Clears the board and places the standard fleet at random. A ship that
    /// exhausts its attempts restarts the whole fleet, up to
    /// `MAX_FLEET_RESTARTS` times.
    pub fn auto_place_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        for restart in 0..MAX_FLEET_RESTARTS {
            self.clear();
            if self.try_place_fleet(rng) {
                if restart > 0 {
                    log::debug!("fleet placed after {} restarts", restart);
                }
                return Ok(());
            }
        }
        self.clear();
        log::error!("auto placement failed after {} restarts", MAX_FLEET_RESTARTS);
        Err(BoardError::PlacementImpossible {
            restarts: MAX_FLEET_RESTARTS,
        })
    }

    fn try_place_fleet<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        for class in FLEET.iter() {
            let Some(cells) = self.random_line(rng, class.length()) else {
                return false;
            };
            if self.place(&cells).is_err() {
                return false;
            }
        }
        self.ships.len() == FLEET_SIZE
    }

    /// Fires at `coord`.
    ///
    /// Off-board coordinates yield `Shot::Invalid` without any change. Firing
    /// at a previous miss reports `Miss` again and changes nothing; firing at
    /// a cell that was already hit is refused.
    pub fn attack(&mut self, coord: Coord) -> Result<Shot, BoardError> {
        if !coord.in_bounds() {
            return Ok(Shot::Invalid);
        }
        if self.hits.contains(coord) {
            return Err(BoardError::AlreadyAttacked(coord));
        }
        let Some(ship_id) = self.ships.iter().position(|s| s.contains(coord)) else {
            self.misses.insert(coord)?;
            return Ok(Shot::Miss);
        };

        self.hits.insert(coord)?;
        let ship = &mut self.ships[ship_id];
        ship.register_hit(coord);
        let sunk_cells = ship.is_sunk().then(|| ship.cells().to_vec());
        let ship_length = ship.length();
        Ok(Shot::Hit(HitReport {
            ship_id,
            ship_length,
            sunk_cells,
            game_over: self.all_sunk(),
        }))
    }
}

fn all_coords() -> impl Iterator<Item = Coord> {
    (0..BOARD_SIZE as i32).flat_map(|y| (0..BOARD_SIZE as i32).map(move |x| Coord::new(x, y)))
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ ships: {:?} }}", self.ships)?;
        for y in 0..BOARD_SIZE as i32 {
            for x in 0..BOARD_SIZE as i32 {
                let mark = match self.cell(Coord::new(x, y)) {
                    Cell::Empty => '~',
                    Cell::Ship => 'S',
                    Cell::Hit => 'X',
                    Cell::Miss => 'O',
                };
                write!(f, "{} ", mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
