//! A two-board match: placement, readiness, turn-taking and the agent volley.

use alloc::format;
use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ai::OpponentAgent;
use crate::board::{Board, Shot};
use crate::common::{Coord, EntityKind, GameError, MatchId, Role};
use crate::config::{fleet_quota, FLEET_SIZE, MAX_SHIP_LENGTH};
use crate::domain::{AgentShot, AttackSummary, LastMove, MatchStatus, MatchView};
use crate::player::{Participant, ParticipantId};

#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    boards: [Board; 2],
    seats: [Option<Participant>; 2],
    current_turn: Role,
    status: MatchStatus,
    winner: Option<Role>,
    ready: [bool; 2],
    last_move: Option<LastMove>,
    rng: SmallRng,
}

impl Match {
    /// Open match with `player1` seated and the second seat free.
    pub fn new(id: MatchId, player1: Participant, seed: u64) -> Self {
        Match {
            id,
            boards: [Board::new(), Board::new()],
            seats: [Some(player1), None],
            current_turn: Role::Player1,
            status: MatchStatus::Placement,
            winner: None,
            ready: [false; 2],
            last_move: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Human against the agent. The agent's fleet is placed and it is ready
    /// immediately.
    pub fn against_agent(id: MatchId, human: ParticipantId, seed: u64) -> Result<Self, GameError> {
        let mut game = Match::new(id, Participant::Human(human), seed);
        game.join(Participant::agent())?;
        Ok(game)
    }

    /// Two humans, both seated.
    pub fn between(id: MatchId, player1: ParticipantId, player2: ParticipantId, seed: u64) -> Self {
        let mut game = Match::new(id, Participant::Human(player1), seed);
        game.seats[Role::Player2.index()] = Some(Participant::Human(player2));
        game
    }

    /// Fills the open seat.
    pub fn join(&mut self, participant: Participant) -> Result<Role, GameError> {
        if self.status != MatchStatus::Placement {
            return Err(GameError::illegal("match has already started"));
        }
        if self.seats[Role::Player2.index()].is_some() {
            return Err(GameError::illegal("match is full"));
        }
        if let Some(id) = participant.id() {
            if self.seats[Role::Player1.index()]
                .as_ref()
                .is_some_and(|p| p.matches(id))
            {
                return Err(GameError::illegal("cannot join your own match"));
            }
        }
        // The agent's fleet goes down before it takes the seat, so a failed
        // placement leaves the seat open.
        let is_agent = participant.is_agent();
        if is_agent {
            self.boards[Role::Player2.index()].auto_place_all(&mut self.rng)?;
        }
        self.seats[Role::Player2.index()] = Some(participant);
        self.ready[Role::Player2.index()] = is_agent;
        Ok(Role::Player2)
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn current_turn(&self) -> Role {
        self.current_turn
    }

    pub fn winner(&self) -> Option<Role> {
        self.winner
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    pub fn board(&self, role: Role) -> &Board {
        &self.boards[role.index()]
    }

    pub fn seat(&self, role: Role) -> Option<&Participant> {
        self.seats[role.index()].as_ref()
    }

    pub fn is_ready(&self, role: Role) -> bool {
        self.ready[role.index()]
    }

    pub fn ready_roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.is_ready(*r)).collect()
    }

    pub fn agent(&self, role: Role) -> Option<&OpponentAgent> {
        match self.seat(role)? {
            Participant::Agent(agent) => Some(agent),
            Participant::Human(_) => None,
        }
    }

    /// Seat held by the human `id`.
    pub fn role_of(&self, id: &ParticipantId) -> Result<Role, GameError> {
        Role::ALL
            .into_iter()
            .find(|r| self.seat(*r).is_some_and(|p| p.matches(id)))
            .ok_or_else(|| GameError::not_found(EntityKind::Participant, id))
    }

    fn ensure_can_place(&self, role: Role) -> Result<(), GameError> {
        if self.status != MatchStatus::Placement {
            return Err(GameError::illegal("ships can only be placed during placement"));
        }
        if self.is_ready(role) {
            return Err(GameError::illegal("fleet is locked once ready"));
        }
        Ok(())
    }

    /// Places one ship for `role`, returning that board's ship count.
    pub fn place_ship(&mut self, role: Role, cells: &[Coord]) -> Result<usize, GameError> {
        self.ensure_can_place(role)?;
        let board = &mut self.boards[role.index()];
        if board.ship_count() >= FLEET_SIZE {
            return Err(GameError::illegal(format!(
                "all {} ships are already placed",
                FLEET_SIZE
            )));
        }
        let len = cells.len();
        if (1..=MAX_SHIP_LENGTH).contains(&len) {
            let placed = board.ships().iter().filter(|s| s.length() == len).count();
            if placed >= fleet_quota(len) {
                return Err(GameError::illegal(format!(
                    "no {}-cell ships left to place",
                    len
                )));
            }
        }
        Ok(board.place(cells)?)
    }

    /// Replaces `role`'s fleet with a random legal one and returns every
    /// occupied cell.
    pub fn auto_place(&mut self, role: Role) -> Result<Vec<Coord>, GameError> {
        self.ensure_can_place(role)?;
        let board = &mut self.boards[role.index()];
        board.auto_place_all(&mut self.rng)?;
        Ok(board.ship_cells())
    }

    /// Marks `role` ready. Once both are, battle begins with player1 to move.
    pub fn set_ready(&mut self, role: Role) -> Result<MatchStatus, GameError> {
        if self.is_ready(role) {
            return Ok(self.status);
        }
        if self.status != MatchStatus::Placement {
            return Err(GameError::illegal("match is not in placement"));
        }
        let count = self.boards[role.index()].ship_count();
        if count != FLEET_SIZE {
            return Err(GameError::illegal(format!(
                "{} ships required, you have {}",
                FLEET_SIZE, count
            )));
        }
        self.ready[role.index()] = true;
        if self.ready.iter().all(|r| *r) {
            self.status = MatchStatus::Active;
            self.current_turn = Role::Player1;
            log::info!("match {} is active", self.id);
        }
        Ok(self.status)
    }

    /// `role` fires at `target` on the opponent's board. If the turn passes
    /// to an agent, it answers within the same call.
    pub fn attack(&mut self, role: Role, target: Coord) -> Result<AttackSummary, GameError> {
        if self.status != MatchStatus::Active {
            return Err(GameError::illegal("match is not active"));
        }
        if self.current_turn != role {
            return Err(GameError::illegal("not your turn"));
        }
        let shot = self.fire(role, target)?;
        let agent_shots = self.agent_volley();
        Ok(AttackSummary {
            attacker: role,
            target,
            shot,
            next_turn: (self.status == MatchStatus::Active).then_some(self.current_turn),
            winner: self.winner,
            agent_shots,
        })
    }

    fn fire(&mut self, role: Role, target: Coord) -> Result<Shot, GameError> {
        if !target.in_bounds() {
            return Ok(Shot::Invalid);
        }
        let defender = &mut self.boards[role.opponent().index()];
        if defender.fired(target) {
            return Err(GameError::illegal(format!("{} was already attacked", target)));
        }
        let shot = defender.attack(target)?;
        self.last_move = Some(LastMove {
            role,
            target,
            hit: shot.is_hit(),
        });
        if shot.game_over() {
            self.finish(role);
        } else if !shot.is_hit() {
            self.current_turn = role.opponent();
        }
        Ok(shot)
    }

    /// Lets an agent on turn keep firing until it misses or wins.
    fn agent_volley(&mut self) -> Vec<AgentShot> {
        let mut shots = Vec::new();
        while self.status == MatchStatus::Active {
            let role = self.current_turn;
            let Some(Participant::Agent(agent)) = self.seats[role.index()].as_mut() else {
                break;
            };
            let target = agent.next_shot(&mut self.rng);
            if !target.in_bounds() || self.boards[role.opponent().index()].fired(target) {
                log::error!("agent chose unusable cell {} in match {}", target, self.id);
                self.current_turn = role.opponent();
                break;
            }
            let shot = match self.fire(role, target) {
                Ok(shot) => shot,
                Err(e) => {
                    log::error!("agent shot at {} failed in match {}: {}", target, self.id, e);
                    self.current_turn = role.opponent();
                    break;
                }
            };
            if let Some(agent) = self.seats[role.index()]
                .as_mut()
                .and_then(Participant::agent_mut)
            {
                agent.record_shot(target, &shot);
            }
            shots.push(AgentShot { target, shot });
        }
        shots
    }

    fn finish(&mut self, winner: Role) {
        self.status = MatchStatus::Finished;
        self.winner = Some(winner);
        log::info!("match {} finished, {} wins", self.id, winner);
    }

    /// `role` gives up; the opponent wins.
    pub fn surrender(&mut self, role: Role) -> Result<Role, GameError> {
        if self.status != MatchStatus::Active {
            return Err(GameError::illegal("can only surrender an active match"));
        }
        let winner = role.opponent();
        self.finish(winner);
        Ok(winner)
    }

    pub fn view(&self, role: Role) -> MatchView {
        let own = &self.boards[role.index()];
        let theirs = &self.boards[role.opponent().index()];
        MatchView {
            match_id: self.id.clone(),
            role,
            status: self.status,
            current_turn: self.current_turn,
            winner: self.winner,
            own_grid: own.grid(),
            opponent_grid: theirs.public_grid(),
            opponent_sunk_ships: theirs.sunk_ships(),
            own_ship_count: own.ship_count(),
            own_ships_remaining: own.ships_remaining(),
            opponent_ships_remaining: theirs.ships_remaining(),
            ready: self.ready_roles(),
            last_move: self.last_move,
            opponent: self.seat(role.opponent()).map(Participant::label),
        }
    }
}
