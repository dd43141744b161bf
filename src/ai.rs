//! Hunt/target opponent: randomized parity search until something is hit,
//! then follow the hit line until the ship sinks.

use alloc::vec::Vec;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::bitboard::BitBoard;
use crate::board::Shot;
use crate::common::Coord;
use crate::config::BOARD_SIZE;

type Grid = BitBoard<u128, BOARD_SIZE>;

/// Orthogonal step used while hunting along a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn reversed(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub const fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    fn step(self, from: Coord) -> Coord {
        let (dx, dy) = self.delta();
        from.offset(dx, dy)
    }
}

/// Per-match state of an agent-controlled participant.
#[derive(Debug, Clone, Default)]
pub struct OpponentAgent {
    shots: Grid,
    hits: Vec<Coord>,
    misses: Grid,
    /// Hits on the ship currently pursued.
    lead: Vec<Coord>,
    hunting: bool,
    direction: Option<Direction>,
    /// Cells that cannot hold a ship: the halo of every sunk ship.
    forbidden: Grid,
    sunk_ships: Vec<Vec<Coord>>,
}

impl OpponentAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shots(&self) -> Grid {
        self.shots
    }

    pub fn hits(&self) -> &[Coord] {
        &self.hits
    }

    pub fn misses(&self) -> Grid {
        self.misses
    }

    pub fn forbidden(&self) -> Grid {
        self.forbidden
    }

    pub fn lead(&self) -> &[Coord] {
        &self.lead
    }

    pub fn is_hunting(&self) -> bool {
        self.hunting
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn sunk_ships(&self) -> &[Vec<Coord>] {
        &self.sunk_ships
    }

    /// A cell the agent may still usefully fire at.
    pub fn is_open(&self, coord: Coord) -> bool {
        coord.in_bounds() && !self.shots.contains(coord) && !self.forbidden.contains(coord)
    }

    /// Picks the next target.
    pub fn next_shot<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Coord {
        if self.hunting {
            if let Some(target) = self.continue_hunt(rng) {
                return target;
            }
            log::debug!("hunt around {:?} exhausted, back to search", self.lead);
            self.abandon_hunt();
        }
        self.search(rng)
    }

    fn search<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        let open = !(self.shots | self.forbidden);
        let parity: Vec<Coord> = (open & Grid::parity_even()).cells().collect();
        if let Some(&c) = parity.choose(rng) {
            return c;
        }
        let any: Vec<Coord> = open.cells().collect();
        if let Some(&c) = any.choose(rng) {
            return c;
        }
        let blind = Coord::new(
            rng.random_range(0..BOARD_SIZE as i32),
            rng.random_range(0..BOARD_SIZE as i32),
        );
        log::error!("no open cell left for the agent, firing blind at {}", blind);
        blind
    }

    fn continue_hunt<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Coord> {
        match self.lead.len() {
            0 => None,
            1 => {
                let origin = self.lead[0];
                let mut dirs = Direction::ALL;
                dirs.shuffle(rng);
                let dir = dirs.into_iter().find(|d| self.is_open(d.step(origin)))?;
                self.direction = Some(dir);
                Some(dir.step(origin))
            }
            _ => self.extend_line(),
        }
    }

    /// Target along a run of two or more hits.
    fn extend_line(&mut self) -> Option<Coord> {
        // A committed direction off the run's axis is a perpendicular try;
        // those stay anchored at the first hit below.
        let dir = match (self.direction, self.infer_axis()) {
            (Some(d), Some(axis)) if d.is_horizontal() == axis.is_horizontal() => d,
            (_, Some(axis)) => axis,
            (Some(d), None) => d,
            (None, None) => return None,
        };

        let forward = self.run_end(dir).map(|end| dir.step(end));
        if let Some(target) = forward.filter(|&c| self.is_open(c)) {
            self.direction = Some(dir);
            return Some(target);
        }

        let back = dir.reversed();
        let backward = self.run_end(back).map(|end| back.step(end));
        if let Some(target) = backward.filter(|&c| self.is_open(c)) {
            self.direction = Some(back);
            return Some(target);
        }

        let first = self.lead[0];
        for side in dir.perpendicular() {
            let target = side.step(first);
            if self.is_open(target) {
                self.direction = Some(side);
                return Some(target);
            }
        }
        None
    }

    fn infer_axis(&self) -> Option<Direction> {
        let first = self.lead.first()?;
        if self.lead.iter().all(|c| c.y == first.y) {
            Some(Direction::Right)
        } else if self.lead.iter().all(|c| c.x == first.x) {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Lead hit furthest in `dir`.
    fn run_end(&self, dir: Direction) -> Option<Coord> {
        let key = |c: &&Coord| {
            let (dx, dy) = dir.delta();
            if dir.is_horizontal() {
                c.x * dx
            } else {
                c.y * dy
            }
        };
        self.lead.iter().max_by_key(key).copied()
    }

    fn abandon_hunt(&mut self) {
        self.lead.clear();
        self.direction = None;
        self.hunting = false;
    }

    /// Feeds back the outcome of a shot fired at `coord`.
    pub fn record_shot(&mut self, coord: Coord, shot: &Shot) {
        match shot {
            Shot::Invalid => {}
            Shot::Miss => {
                let _ = self.shots.insert(coord);
                let _ = self.misses.insert(coord);
                if self.hunting && self.lead.len() >= 2 {
                    self.direction = self.direction.map(Direction::reversed);
                }
            }
            Shot::Hit(report) => {
                let _ = self.shots.insert(coord);
                self.hits.push(coord);
                self.lead.push(coord);
                self.hunting = true;
                if let Some(cells) = &report.sunk_cells {
                    if let Ok(ship) = Grid::from_cells(cells.iter().copied()) {
                        self.forbidden |= ship.dilate();
                    }
                    self.sunk_ships.push(cells.clone());
                    self.abandon_hunt();
                }
            }
        }
    }
}
