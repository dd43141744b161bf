use rand::rngs::SmallRng;
use rand::SeedableRng;
use seabattle::{
    Board, BoardError, Cell, Coord, GameError, HitReport, Orientation, Shot, FLEET_SIZE,
};

fn line(x: i32, y: i32, len: usize, orient: Orientation) -> Vec<Coord> {
    orient.line(Coord::new(x, y), len)
}

#[test]
fn single_cell_ship_scenario() {
    let mut board = Board::new();
    assert_eq!(board.place(&[Coord::new(5, 5)]).unwrap(), 1);

    assert_eq!(board.attack(Coord::new(0, 0)).unwrap(), Shot::Miss);
    assert_eq!(board.attack(Coord::new(10, 10)).unwrap(), Shot::Invalid);

    let shot = board.attack(Coord::new(5, 5)).unwrap();
    assert_eq!(
        shot,
        Shot::Hit(HitReport {
            ship_id: 0,
            ship_length: 1,
            sunk_cells: Some(vec![Coord::new(5, 5)]),
            game_over: true,
        })
    );
    assert!(shot.sunk());
    assert!(board.all_sunk());
}

#[test]
fn invalid_attack_changes_nothing() {
    let mut board = Board::new();
    board.place(&[Coord::new(0, 0)]).unwrap();
    let before = board.grid();
    assert_eq!(board.attack(Coord::new(-1, 3)).unwrap(), Shot::Invalid);
    assert_eq!(board.attack(Coord::new(3, 10)).unwrap(), Shot::Invalid);
    assert_eq!(board.grid(), before);
}

#[test]
fn repeated_miss_is_idempotent() {
    let mut board = Board::new();
    board.place(&[Coord::new(5, 5)]).unwrap();
    assert_eq!(board.attack(Coord::new(1, 1)).unwrap(), Shot::Miss);
    let misses = board.misses();
    assert_eq!(board.attack(Coord::new(1, 1)).unwrap(), Shot::Miss);
    assert_eq!(board.misses(), misses);
    assert_eq!(board.cell(Coord::new(1, 1)), Cell::Miss);
}

#[test]
fn hit_cell_cannot_be_attacked_again() {
    let mut board = Board::new();
    board.place(&line(2, 2, 2, Orientation::Horizontal)).unwrap();
    assert!(board.attack(Coord::new(2, 2)).unwrap().is_hit());
    assert_eq!(
        board.attack(Coord::new(2, 2)).unwrap_err(),
        BoardError::AlreadyAttacked(Coord::new(2, 2))
    );
    assert_eq!(board.cell(Coord::new(2, 2)), Cell::Hit);
    assert_eq!(board.ships_remaining(), 1);
}

#[test]
fn sunk_cells_only_on_the_sinking_hit() {
    let mut board = Board::new();
    board.place(&line(0, 0, 3, Orientation::Vertical)).unwrap();
    board.place(&[Coord::new(9, 9)]).unwrap();

    let first = board.attack(Coord::new(0, 1)).unwrap();
    assert!(first.is_hit() && !first.sunk());
    assert_eq!(first.sunk_cells(), None);
    board.attack(Coord::new(0, 0)).unwrap();
    let last = board.attack(Coord::new(0, 2)).unwrap();
    assert_eq!(last.sunk_cells(), Some(&line(0, 0, 3, Orientation::Vertical)[..]));
    assert!(!last.game_over());
    assert_eq!(board.sunk_ships().len(), 1);
    assert_eq!(board.ships_remaining(), 1);
}

#[test]
fn overlapping_placement_is_rejected_without_change() {
    let mut board = Board::new();
    board.place(&line(3, 3, 3, Orientation::Horizontal)).unwrap();
    let before = board.grid();
    assert_eq!(
        board.place(&line(4, 1, 3, Orientation::Vertical)).unwrap_err(),
        BoardError::Occupied(Coord::new(4, 3))
    );
    assert_eq!(board.grid(), before);
    assert_eq!(board.ship_count(), 1);
}

#[test]
fn touching_placement_is_rejected_without_change() {
    let mut board = Board::new();
    board.place(&line(3, 3, 3, Orientation::Horizontal)).unwrap();
    let before = board.grid();
    // Diagonal contact at (6, 4).
    assert_eq!(
        board.place(&line(6, 4, 2, Orientation::Vertical)).unwrap_err(),
        BoardError::Adjacent(Coord::new(6, 4))
    );
    // Side contact directly below.
    assert!(matches!(
        board.place(&[Coord::new(4, 4)]),
        Err(BoardError::Adjacent(_))
    ));
    assert_eq!(board.grid(), before);
    // One clear cell of water is enough.
    assert_eq!(board.place(&line(7, 3, 2, Orientation::Vertical)).unwrap(), 2);
}

#[test]
fn out_of_range_placement_is_rejected() {
    let mut board = Board::new();
    assert!(matches!(
        board.place(&line(9, 9, 2, Orientation::Horizontal)),
        Err(BoardError::OutOfBounds(_))
    ));
    assert_eq!(board.ship_count(), 0);
}

#[test]
fn public_grid_hides_intact_ships() {
    let mut board = Board::new();
    board.place(&line(0, 0, 2, Orientation::Horizontal)).unwrap();
    board.attack(Coord::new(0, 0)).unwrap();
    board.attack(Coord::new(5, 5)).unwrap();

    let public = board.public_grid();
    assert_eq!(public[0], Cell::Hit);
    assert_eq!(public[1], Cell::Empty);
    assert_eq!(public[5 * 10 + 5], Cell::Miss);
    assert!(!public.contains(&Cell::Ship));
    assert_eq!(board.grid()[1], Cell::Ship);
}

#[test]
fn empty_board_is_not_defeated() {
    let board = Board::new();
    assert!(!board.all_sunk());
}

#[test]
fn auto_place_builds_the_standard_fleet() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut board = Board::new();
    board.place(&[Coord::new(0, 0)]).unwrap();
    board.auto_place_all(&mut rng).unwrap();

    assert_eq!(board.ship_count(), FLEET_SIZE);
    let mut lengths: Vec<usize> = board.ships().iter().map(|s| s.length()).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![1, 1, 2, 2, 3, 3, 4]);
    assert_eq!(board.ship_cells().len(), 16);
}

#[test]
fn random_line_fits_the_board() {
    let mut rng = SmallRng::seed_from_u64(99);
    let board = Board::new();
    for len in 1..=4 {
        let cells = board.random_line(&mut rng, len).unwrap();
        assert_eq!(cells.len(), len);
        assert!(cells.iter().all(|c| c.in_bounds()));
    }
}

#[test]
fn placement_rejections_are_validation_errors() {
    let bad_input = [
        BoardError::InvalidShipLength { len: 5 },
        BoardError::OutOfBounds(Coord::new(10, 0)),
        BoardError::NotStraight,
        BoardError::Occupied(Coord::new(1, 1)),
        BoardError::Adjacent(Coord::new(2, 2)),
    ];
    for err in bad_input {
        assert!(matches!(GameError::from(err), GameError::Validation(_)));
    }
    let bad_state = [
        BoardError::AlreadyAttacked(Coord::new(3, 3)),
        BoardError::PlacementImpossible { restarts: 1000 },
    ];
    for err in bad_state {
        assert!(matches!(GameError::from(err), GameError::IllegalState(_)));
    }
}
