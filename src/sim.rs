//! Agent-versus-agent games played through a real `Match`.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ai::OpponentAgent;
use crate::common::{GameError, MatchId, Role};
use crate::config::BOARD_SIZE;
use crate::domain::MatchStatus;
use crate::game::Match;
use crate::player::ParticipantId;

/// Outcome of one simulated game.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SimReport {
    pub seed: u64,
    pub winner: Role,
    pub player1_shots: usize,
    pub player2_shots: usize,
}

/// Plays a full game: an external agent drives player1 against the match's
/// built-in agent as player2. Deterministic for a given seed.
pub fn simulate(seed: u64) -> Result<SimReport, GameError> {
    let driver_id = ParticipantId::from("sim");
    let mut game = Match::against_agent(MatchId::standalone(seed as u32), driver_id, seed)?;
    game.auto_place(Role::Player1)?;
    game.set_ready(Role::Player1)?;

    let mut driver = OpponentAgent::new();
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let mut player1_shots = 0;
    let mut player2_shots = 0;

    // Each side fires at most once per cell.
    let max_shots = BOARD_SIZE * BOARD_SIZE;
    while game.status() == MatchStatus::Active {
        if player1_shots >= max_shots {
            return Err(GameError::illegal("simulation did not terminate"));
        }
        let target = driver.next_shot(&mut rng);
        let summary = game.attack(Role::Player1, target)?;
        driver.record_shot(target, &summary.shot);
        player1_shots += 1;
        player2_shots += summary.agent_shots.len();
    }

    let winner = game
        .winner()
        .ok_or_else(|| GameError::illegal("finished match has no winner"))?;
    log::debug!(
        "seed {}: {} wins after {}/{} shots",
        seed,
        winner,
        player1_shots,
        player2_shots
    );
    Ok(SimReport {
        seed,
        winner,
        player1_shots,
        player2_shots,
    })
}
