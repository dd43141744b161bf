use seabattle::{BitBoard, BitBoardError, Coord, BOARD_SIZE};

type Grid = BitBoard<u128, BOARD_SIZE>;

#[test]
fn insert_contains_and_remove() {
    let mut grid = Grid::new();
    assert!(grid.is_empty());
    grid.insert(Coord::new(3, 4)).unwrap();
    assert!(grid.contains(Coord::new(3, 4)));
    assert!(!grid.contains(Coord::new(4, 3)));
    assert_eq!(grid.count(), 1);
    grid.remove(Coord::new(3, 4)).unwrap();
    assert!(grid.is_empty());
}

#[test]
fn out_of_bounds_is_never_a_member() {
    let mut grid = Grid::full();
    assert_eq!(grid.count(), BOARD_SIZE * BOARD_SIZE);
    assert!(!grid.contains(Coord::new(-1, 0)));
    assert!(!grid.contains(Coord::new(10, 10)));
    assert_eq!(
        grid.insert(Coord::new(10, 0)),
        Err(BitBoardError::OutOfBounds { x: 10, y: 0 })
    );
}

#[test]
fn too_small_backing_integer_is_rejected() {
    let err = BitBoard::<u64, 10>::try_new().unwrap_err();
    assert_eq!(err, BitBoardError::SizeTooLarge { n: 10, capacity: 64 });
    assert!(BitBoard::<u128, 10>::try_new().is_ok());
}

#[test]
fn parity_mask_is_a_checkerboard() {
    let parity = Grid::parity_even();
    assert_eq!(parity.count(), 50);
    assert!(parity.contains(Coord::new(0, 0)));
    assert!(!parity.contains(Coord::new(1, 0)));
    assert!(parity.contains(Coord::new(1, 1)));
    assert_eq!((parity | !parity), Grid::full());
}

#[test]
fn dilate_covers_the_eight_neighbourhood() {
    let ship = Grid::from_cells([Coord::new(5, 5), Coord::new(6, 5)]).unwrap();
    let halo = ship.dilate();
    // 4 x 3 block around a horizontal pair.
    assert_eq!(halo.count(), 12);
    assert!(halo.contains(Coord::new(4, 4)));
    assert!(halo.contains(Coord::new(7, 6)));
    assert!(!halo.contains(Coord::new(8, 5)));
}

#[test]
fn dilate_is_clipped_at_the_corner() {
    let corner = Grid::from_cells([Coord::new(0, 0)]).unwrap();
    assert_eq!(corner.dilate().count(), 4);
}

#[test]
fn cells_are_row_major() {
    let grid = Grid::from_cells([Coord::new(2, 1), Coord::new(9, 0), Coord::new(0, 1)]).unwrap();
    let cells: Vec<Coord> = grid.cells().collect();
    assert_eq!(
        cells,
        vec![Coord::new(9, 0), Coord::new(0, 1), Coord::new(2, 1)]
    );
}

#[test]
fn complement_stays_on_the_board() {
    let empty = Grid::new();
    assert_eq!((!empty).count(), 100);
    assert_eq!(Grid::from_raw(u128::MAX).count(), 100);
}
