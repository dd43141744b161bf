use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use seabattle::{Board, Coord, HitReport, OpponentAgent, Shot};

fn hit(ship_id: usize, ship_length: usize, sunk_cells: Option<Vec<Coord>>) -> Shot {
    Shot::Hit(HitReport {
        ship_id,
        ship_length,
        sunk_cells,
        game_over: false,
    })
}

fn is_orthogonal_neighbour(a: Coord, b: Coord) -> bool {
    (a.x - b.x).abs() + (a.y - b.y).abs() == 1
}

#[test]
fn search_prefers_parity_cells() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut agent = OpponentAgent::new();
    for _ in 0..30 {
        let target = agent.next_shot(&mut rng);
        assert!(target.is_parity_even(), "{} is off parity", target);
        agent.record_shot(target, &Shot::Miss);
    }
}

#[test]
fn search_falls_back_to_odd_cells_when_parity_is_exhausted() {
    let mut rng = SmallRng::seed_from_u64(4);
    let mut agent = OpponentAgent::new();
    for y in 0..10 {
        for x in 0..10 {
            let c = Coord::new(x, y);
            if c.is_parity_even() {
                agent.record_shot(c, &Shot::Miss);
            }
        }
    }
    let target = agent.next_shot(&mut rng);
    assert!(!target.is_parity_even());
    assert!(agent.is_open(target));
}

#[test]
fn first_hit_starts_a_hunt_on_its_neighbours() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut agent = OpponentAgent::new();
    let origin = Coord::new(4, 4);
    agent.record_shot(origin, &hit(0, 3, None));
    assert!(agent.is_hunting());

    let target = agent.next_shot(&mut rng);
    assert!(is_orthogonal_neighbour(origin, target));
    assert!(agent.direction().is_some());
}

#[test]
fn corner_hit_only_tries_cells_on_the_board() {
    let mut rng = SmallRng::seed_from_u64(6);
    let mut agent = OpponentAgent::new();
    agent.record_shot(Coord::new(0, 0), &hit(0, 2, None));
    let target = agent.next_shot(&mut rng);
    assert!(target == Coord::new(1, 0) || target == Coord::new(0, 1));
}

#[test]
fn two_hits_extend_along_the_line() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut agent = OpponentAgent::new();
    agent.record_shot(Coord::new(4, 4), &hit(0, 4, None));
    agent.record_shot(Coord::new(5, 4), &hit(0, 4, None));

    let target = agent.next_shot(&mut rng);
    assert_eq!(target.y, 4);
    assert!(target == Coord::new(6, 4) || target == Coord::new(3, 4));
}

#[test]
fn miss_at_one_end_turns_to_the_other() {
    let mut rng = SmallRng::seed_from_u64(9);
    let mut agent = OpponentAgent::new();
    agent.record_shot(Coord::new(4, 4), &hit(0, 4, None));
    agent.record_shot(Coord::new(5, 4), &hit(0, 4, None));
    let first = agent.next_shot(&mut rng);
    agent.record_shot(first, &Shot::Miss);

    let second = agent.next_shot(&mut rng);
    let expected = if first == Coord::new(6, 4) {
        Coord::new(3, 4)
    } else {
        Coord::new(6, 4)
    };
    assert_eq!(second, expected);
}

#[test]
fn sinking_forbids_the_halo_and_ends_the_hunt() {
    let mut agent = OpponentAgent::new();
    let cells = vec![Coord::new(2, 2), Coord::new(2, 3)];
    agent.record_shot(cells[0], &hit(0, 2, None));
    agent.record_shot(cells[1], &hit(0, 2, Some(cells.clone())));

    assert!(!agent.is_hunting());
    assert!(agent.lead().is_empty());
    assert_eq!(agent.sunk_ships(), &[cells.clone()][..]);
    // 3 x 4 block around the ship.
    assert_eq!(agent.forbidden().count(), 12);
    assert!(!agent.is_open(Coord::new(1, 1)));
    assert!(!agent.is_open(Coord::new(3, 4)));
    assert!(agent.is_open(Coord::new(4, 2)));
}

#[test]
fn invalid_outcome_is_ignored() {
    let mut agent = OpponentAgent::new();
    agent.record_shot(Coord::new(10, 10), &Shot::Invalid);
    assert_eq!(agent.shots().count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn agent_never_repeats_or_fires_into_forbidden_cells(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::new();
        board.auto_place_all(&mut rng).unwrap();
        let mut agent = OpponentAgent::new();

        let mut shots = 0;
        while !board.all_sunk() {
            let target = agent.next_shot(&mut rng);
            prop_assert!(agent.is_open(target), "agent picked closed cell {}", target);
            let shot = board.attack(target).unwrap();
            agent.record_shot(target, &shot);
            shots += 1;
            prop_assert!(shots <= 100);
        }
        prop_assert_eq!(agent.sunk_ships().len(), 7);
        prop_assert_eq!(agent.hits().len(), 16);
    }
}

fn agent_with_blocked_run() -> OpponentAgent {
    let mut agent = OpponentAgent::new();
    agent.record_shot(Coord::new(4, 4), &hit(0, 3, None));
    agent.record_shot(Coord::new(5, 4), &hit(0, 3, None));
    agent.record_shot(Coord::new(6, 4), &Shot::Miss);
    agent.record_shot(Coord::new(3, 4), &Shot::Miss);
    agent
}

#[test]
fn blocked_run_tries_across_the_first_hit() {
    let mut rng = SmallRng::seed_from_u64(8);
    let mut agent = agent_with_blocked_run();
    assert_eq!(agent.next_shot(&mut rng), Coord::new(4, 3));

    // The other side is still taken from the first hit, not the run end.
    agent.record_shot(Coord::new(4, 3), &Shot::Miss);
    assert_eq!(agent.next_shot(&mut rng), Coord::new(4, 5));
    assert!(agent.is_hunting());
}

#[test]
fn boxed_in_hunt_goes_back_to_search() {
    let mut rng = SmallRng::seed_from_u64(9);
    let mut agent = agent_with_blocked_run();
    agent.record_shot(Coord::new(4, 3), &Shot::Miss);
    agent.record_shot(Coord::new(4, 5), &Shot::Miss);

    let target = agent.next_shot(&mut rng);
    assert!(!agent.is_hunting());
    assert!(agent.lead().is_empty());
    assert_eq!(agent.direction(), None);
    assert!(agent.is_open(target));
}
