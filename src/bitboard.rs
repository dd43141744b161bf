//! Fixed-size cell sets for the game grid, using const generics.
//!
//! A set is an `N×N` grid packed into the unsigned integer `T`, addressed by
//! [`Coord`] in row-major order (`y * N + x`). Besides membership the type
//! supports the two grid operations the rules need: growing a set by its
//! 8-neighbourhood (ship spacing, sunk-ship exclusion) and the checkerboard
//! parity mask used by the opponent's search.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use core::{fmt, mem};
use num_traits::{PrimInt, Unsigned, Zero};

use crate::common::Coord;

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitBoardError {
    /// Requested board size N*N exceeds capacity of `T::BITS`.
    SizeTooLarge { n: usize, capacity: usize },
    /// Coordinate lies outside `[0, N)×[0, N)`.
    OutOfBounds { x: i32, y: i32 },
}

impl fmt::Display for BitBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitBoardError::SizeTooLarge { n, capacity } => {
                write!(f, "board of {}x{} cells exceeds {} bits", n, n, capacity)
            }
            BitBoardError::OutOfBounds { x, y } => {
                write!(f, "cell ({}, {}) is outside the board", x, y)
            }
        }
    }
}

/// A set of cells on an `N×N` grid stored in `T`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    const BOARD_BITS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::BOARD_BITS == mem::size_of::<T>() * 8 {
            !T::zero()
        } else {
            (T::one() << Self::BOARD_BITS) - T::one()
        }
    }

    #[inline]
    fn index(coord: Coord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x >= N || y >= N {
            None
        } else {
            Some(y * N + x)
        }
    }

    /// Empty set.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Fallible constructor: returns `Err(SizeTooLarge)` if N*N > T::BITS.
    pub fn try_new() -> Result<Self, BitBoardError> {
        let capacity = mem::size_of::<T>() * 8;
        if Self::BOARD_BITS > capacity {
            Err(BitBoardError::SizeTooLarge { n: N, capacity })
        } else {
            Ok(Self::new())
        }
    }

    /// Every cell of the board.
    #[inline]
    pub fn full() -> Self {
        BitBoard { bits: Self::mask() }
    }

    /// Cells whose coordinate sum is even.
    pub fn parity_even() -> Self {
        let mut board = Self::new();
        for idx in 0..Self::BOARD_BITS {
            if (idx / N + idx % N) % 2 == 0 {
                board.bits = board.bits | (T::one() << idx);
            }
        }
        board
    }

    /// Number of cells in the set.
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// Membership test. Out-of-range coordinates are never members.
    pub fn contains(&self, coord: Coord) -> bool {
        match Self::index(coord) {
            Some(idx) => ((self.bits >> idx) & T::one()) != T::zero(),
            None => false,
        }
    }

    /// Adds `coord` to the set.
    pub fn insert(&mut self, coord: Coord) -> Result<(), BitBoardError> {
        let idx = Self::index(coord).ok_or(BitBoardError::OutOfBounds {
            x: coord.x,
            y: coord.y,
        })?;
        self.bits = self.bits | (T::one() << idx);
        Ok(())
    }

    /// Removes `coord` from the set.
    pub fn remove(&mut self, coord: Coord) -> Result<(), BitBoardError> {
        let idx = Self::index(coord).ok_or(BitBoardError::OutOfBounds {
            x: coord.x,
            y: coord.y,
        })?;
        self.bits = self.bits & !(T::one() << idx);
        Ok(())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bits = T::zero();
    }

    /// Builds a set from coordinates, failing on the first out-of-range one.
    pub fn from_cells<I>(cells: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut board = Self::new();
        for c in cells {
            board.insert(c)?;
        }
        Ok(board)
    }

    /// The set grown by one step in all eight directions (members included),
    /// clipped to the board.
    pub fn dilate(&self) -> Self {
        let mut out = *self;
        for cell in self.cells() {
            for n in cell.neighbors8() {
                let _ = out.insert(n);
            }
        }
        out
    }

    /// Members in row-major order.
    #[inline]
    pub fn cells(&self) -> Cells<'_, T, N> {
        Cells {
            board: self,
            idx: 0,
        }
    }

    /// Creates a set from the raw integer, masking out bits beyond the board.
    #[inline]
    pub fn from_raw(raw: T) -> Self {
        BitBoard {
            bits: raw & Self::mask(),
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", N)?;
        for y in 0..N {
            for x in 0..N {
                let mark = if self.contains(Coord::new(x as i32, y as i32)) {
                    '■'
                } else {
                    '□'
                };
                write!(f, "{} ", mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the members of a bitboard.
#[derive(Clone, Copy)]
pub struct Cells<'a, T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    board: &'a BitBoard<T, N>,
    idx: usize,
}

impl<'a, T, const N: usize> Iterator for Cells<'a, T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = Coord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if ((self.board.bits >> idx) & T::one()) != T::zero() {
                return Some(Coord::new((idx % N) as i32, (idx / N) as i32));
            }
        }
        None
    }
}

impl<T, const N: usize> BitAnd for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits & rhs.bits)
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits | rhs.bits)
    }
}

/// Complement within the board.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self::from_raw(!self.bits)
    }
}

impl<T, const N: usize> BitAndAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits = self.bits & rhs.bits;
    }
}

impl<T, const N: usize> BitOrAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}
