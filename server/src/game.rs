//! Round state machine for one hide-and-seek game
//!
//! A [`Session`] owns its roster and grid outright. Nothing here locks or
//! awaits: the coordinator serializes every call, and all outbound traffic is
//! a non-blocking enqueue into player mailboxes.
//!
//! Phases run `AwaitingStart → SettingUp → Active → RoundResolved →
//! SettingUp → ...`; the session is dropped from any phase once its roster
//! empties.

use crate::error::{GameError, InvariantViolation};
use crate::grid::{self, Grid};
use crate::identity::{identity_capacity, IdentityPool};
use crate::mailbox::{fan_out, Mailbox};
use crate::placement;
use log::{debug, info};
use rand::Rng;
use shared::{
    Position, RosterEntry, RoundOverReason, ServerEvent, SetupEntry, SetupPayload, Welcome,
};
use std::collections::HashMap;

/// Fewest players a round can be set up with
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, waiting for the first successful start
    AwaitingStart,
    /// Setup sent, hiders are hiding until everyone is ready to go
    SettingUp,
    /// "go!" sent, the seeker is seeking
    Active,
    /// Winner decided or the seeker left; waiting for the next setup
    RoundResolved,
}

/// Counters that survive across rounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub score: u32,
    pub total_moves: u32,
    pub moves_this_round: u32,
    pub times_seeker: u32,
    pub times_hider: u32,
    pub times_earned_seeker: u32,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub identity: char,
    pub seeker: bool,
    pub found: bool,
    pub ready: bool,
    /// Joined mid-round; inert until the next setup
    pub pending_join: bool,
    pub position: Position,
    pub stats: PlayerStats,
    mailbox: Mailbox,
}

impl Player {
    fn new(identity: char, mailbox: Mailbox) -> Self {
        Self {
            identity,
            seeker: false,
            found: false,
            ready: false,
            pending_join: false,
            position: None,
            stats: PlayerStats::default(),
            mailbox,
        }
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Still hiding and taking part in this round
    fn is_unfound_hider(&self) -> bool {
        !self.seeker && !self.found && !self.pending_join
    }

    /// Blocks `cell` for hiders and can be found there by the seeker
    fn occupies(&self, cell: (usize, usize)) -> bool {
        !self.found && !self.pending_join && self.position == Some(cell)
    }
}

#[derive(Debug)]
pub struct Session {
    code: String,
    players: HashMap<String, Player>,
    started: bool,
    round: u32,
    grid: Option<Grid>,
    multi_hider: bool,
    identities: IdentityPool,
    phase: Phase,
}

impl Session {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            players: HashMap::new(),
            started: false,
            round: 0,
            grid: None,
            multi_hider: false,
            identities: IdentityPool::new(),
            phase: Phase::AwaitingStart,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, &Player)> {
        self.players.iter().map(|(name, player)| (name.as_str(), player))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn multi_hider(&self) -> bool {
        self.multi_hider
    }

    pub fn santa_reserved(&self) -> bool {
        self.identities.santa_reserved()
    }

    /// Grid of the current round, `None` before the first setup
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Name of the seeker, if one is assigned
    pub fn seeker(&self) -> Option<&str> {
        self.players
            .iter()
            .find(|(_, player)| player.seeker)
            .map(|(name, _)| name.as_str())
    }

    /// Whether `name` may move onto (row, col) this round
    pub fn can_move(&self, name: &str, row: usize, col: usize) -> bool {
        let active = self
            .players
            .get(name)
            .is_some_and(|player| !player.pending_join);
        let open = self
            .grid
            .as_ref()
            .is_some_and(|grid| grid.is_occupiable(row, col));
        active && open
    }

    /// At most one seeker, and never one that is still waiting to join
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seekers: Vec<&String> = self
            .players
            .iter()
            .filter(|(_, player)| player.seeker)
            .map(|(name, _)| name)
            .collect();
        seekers.sort();

        match seekers.as_slice() {
            [] => Ok(()),
            [name] if self.players[*name].pending_join => Err(InvariantViolation::PendingSeeker {
                code: self.code.clone(),
                name: name.to_string(),
            }),
            [_] => Ok(()),
            names => Err(InvariantViolation::MultipleSeekers {
                code: self.code.clone(),
                names: names.iter().map(|name| name.to_string()).collect(),
            }),
        }
    }

    /// Adds a player and grants their identity.
    ///
    /// The first player of a game becomes its seeker; anyone arriving after
    /// the game started waits for the next setup.
    pub fn admit<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        mailbox: Mailbox,
        rng: &mut R,
    ) -> Result<char, GameError> {
        if self.players.contains_key(name) {
            return Err(GameError::NameTaken(name.to_string()));
        }
        if self.players.len() >= identity_capacity() {
            return Err(GameError::GameFull(self.code.clone()));
        }

        let identity = self
            .identities
            .allocate(name, rng)
            .ok_or_else(|| GameError::GameFull(self.code.clone()))?;

        let mut player = Player::new(identity, mailbox);
        player.seeker = self.players.is_empty();
        player.pending_join = self.started;
        self.players.insert(name.to_string(), player);

        info!("Player {}/{} joined as {}", self.code, name, identity);
        Ok(identity)
    }

    /// Tells the rest of the roster about a newcomer and sends the newcomer
    /// the current roster
    pub fn announce_join(&self, name: &str) {
        let Some(joiner) = self.players.get(name) else {
            return;
        };

        self.broadcast_except(
            name,
            ServerEvent::Joined {
                identity: joiner.identity,
                name: name.to_string(),
            },
        );

        let welcome = Welcome {
            code: self.code.clone(),
            identity: joiner.identity,
            name: name.to_string(),
            others: self
                .players
                .iter()
                .filter(|(other, _)| other.as_str() != name)
                .map(|(other, player)| RosterEntry {
                    identity: player.identity,
                    name: other.clone(),
                })
                .collect(),
        };

        joiner.mailbox.deliver(if self.started {
            ServerEvent::WaitForNextRound(welcome)
        } else {
            ServerEvent::WaitForStart(welcome)
        });
    }

    /// Runs the first setup. The game only counts as started if it succeeds.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool, InvariantViolation> {
        let set_up = self.setup(rng)?;
        if set_up {
            self.started = true;
        }
        Ok(set_up)
    }

    /// Readiness barrier in front of "go!". Only counts while hiders hide.
    pub fn ready_to_go(&mut self, name: &str) {
        if self.phase != Phase::SettingUp {
            debug!("{}/{} is ready to go outside setup", self.code, name);
            return;
        }
        if !self.mark_ready(name) {
            return;
        }

        for player in self.players.values_mut().filter(|p| !p.pending_join) {
            player.ready = false;
        }
        self.phase = Phase::Active;
        self.broadcast_active(ServerEvent::Go);
        debug!("Game {} round {} is on", self.code, self.round);
    }

    /// Readiness barrier in front of the next setup
    pub fn ready_for_next_setup<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        rng: &mut R,
    ) -> Result<(), InvariantViolation> {
        if self.mark_ready(name) {
            self.setup(rng)?;
        }
        Ok(())
    }

    /// Marks `name` ready and reports whether every active player now is
    fn mark_ready(&mut self, name: &str) -> bool {
        if let Some(player) = self.players.get_mut(name) {
            player.ready = true;
        }
        self.players
            .values()
            .filter(|player| !player.pending_join)
            .all(|player| player.ready)
    }

    /// Applies a move the caller has already checked with [`Session::can_move`]
    pub fn move_to(&mut self, name: &str, row: usize, col: usize) {
        let Some(mover) = self.players.get(name) else {
            return;
        };
        let (identity, from, seeking) = (mover.identity, mover.position, mover.seeker);
        let target = (row, col);

        let occupant = self
            .players
            .iter()
            .find(|(other, player)| other.as_str() != name && player.occupies(target))
            .map(|(other, _)| other.clone());

        if seeking {
            if let Some(occupant) = occupant {
                self.mark_found(&occupant, target);
                self.detect_winner();
            }
        } else if let Some(occupant) = occupant {
            debug!(
                "{}/{} can't hide with {} at {:?}",
                self.code, name, occupant, target
            );
            return;
        }

        self.broadcast_all(ServerEvent::Moved {
            identity,
            from,
            to: target,
        });

        if let Some(mover) = self.players.get_mut(name) {
            mover.position = Some(target);
            mover.stats.total_moves += 1;
            mover.stats.moves_this_round += 1;
        }
    }

    fn mark_found(&mut self, name: &str, (row, col): (usize, usize)) {
        let Some(player) = self.players.get_mut(name) else {
            return;
        };
        player.found = true;

        let event = ServerEvent::Found {
            identity: player.identity,
            name: name.to_string(),
            row,
            col,
        };
        info!("{}/{} was found at ({}, {})", self.code, name, row, col);
        self.broadcast_all(event);
    }

    /// Starts a new round: appoints a seeker if needed, regrows the grid,
    /// places everyone and broadcasts the layout.
    ///
    /// Returns `Ok(false)` without touching state when the roster is too
    /// small.
    pub fn setup<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<bool, InvariantViolation> {
        if self.players.len() < MIN_PLAYERS {
            self.broadcast_all(ServerEvent::TooFewHiders);
            return Ok(false);
        }

        self.check_invariants()?;
        self.multi_hider = self.players.len() > MIN_PLAYERS;

        let seeker = match self.seeker() {
            Some(name) => name.to_string(),
            None => self.appoint_seeker(rng),
        };

        let grid = grid::generate(self.players.keys().map(String::as_str), rng);
        placement::place(
            self.players.values_mut().map(|player| &mut player.position),
            &grid,
            rng,
        );

        for player in self.players.values_mut() {
            player.found = false;
            player.ready = false;
            player.pending_join = false;
            player.stats.moves_this_round = 0;
            if player.seeker {
                player.stats.times_seeker += 1;
            } else {
                player.stats.times_hider += 1;
            }
        }

        self.round += 1;
        self.phase = Phase::SettingUp;

        let payload = SetupPayload {
            seeker: self.players[&seeker].identity,
            width: grid.width(),
            terrain: grid.terrain(),
            players: self
                .players
                .iter()
                .map(|(name, player)| SetupEntry {
                    identity: player.identity,
                    name: name.clone(),
                    position: player.position,
                    score: player.stats.score,
                })
                .collect(),
        };
        self.grid = Some(grid);

        info!(
            "Game {} round {}: {} players, {} seeking",
            self.code,
            self.round,
            self.players.len(),
            seeker
        );
        self.broadcast_all(ServerEvent::Setup(payload));
        Ok(true)
    }

    /// Draws an index over the whole roster and redraws whenever it lands on
    /// a pending player. If everyone is pending, anyone may be drawn.
    fn appoint_seeker<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let anyone_active = self.players.values().any(|player| !player.pending_join);

        let name = loop {
            let draw = rng.gen_range(0..self.players.len());
            if let Some((name, player)) = self.players.iter().nth(draw) {
                if !player.pending_join || !anyone_active {
                    break name.clone();
                }
            }
        };

        if let Some(player) = self.players.get_mut(&name) {
            player.seeker = true;
        }
        info!("Randomly appointed {}/{} as seeker", self.code, name);
        name
    }

    /// Ends the round if its win condition holds. Returns whether it did.
    ///
    /// With several hiders, the last one standing wins and seeks next. With
    /// a single hider, the round ends once they are found and the two
    /// players swap roles.
    pub fn detect_winner(&mut self) -> bool {
        if !matches!(self.phase, Phase::SettingUp | Phase::Active) {
            return false;
        }

        if self.multi_hider {
            let remaining: Vec<&String> = self
                .players
                .iter()
                .filter(|(_, player)| player.is_unfound_hider())
                .map(|(name, _)| name)
                .collect();
            let [last] = remaining.as_slice() else {
                return false;
            };
            let last = last.to_string();

            for player in self.players.values_mut().filter(|p| !p.pending_join) {
                player.seeker = false;
            }
            let Some(winner) = self.players.get_mut(&last) else {
                return false;
            };
            winner.seeker = true;
            winner.stats.score += 1;
            winner.stats.times_earned_seeker += 1;
            let event = ServerEvent::Winner {
                identity: winner.identity,
                name: last.clone(),
            };

            info!("{}/{} wins round {}", self.code, last, self.round);
            self.broadcast_active(event);
        } else {
            let mut hiders = self
                .players
                .values()
                .filter(|player| !player.seeker && !player.pending_join)
                .peekable();
            let everyone_found = hiders.peek().is_some() && hiders.all(|player| player.found);
            if !everyone_found {
                return false;
            }

            for player in self.players.values_mut().filter(|p| !p.pending_join) {
                if player.seeker {
                    player.stats.score += 1;
                }
                player.seeker = !player.seeker;
            }

            info!("Game {} two player round {} over", self.code, self.round);
            self.broadcast_active(ServerEvent::RoundOver(RoundOverReason::TwoPlayerGame));
        }

        self.phase = Phase::RoundResolved;
        true
    }

    /// Removes a disconnected player and tells whoever is left.
    ///
    /// The caller drops the session once it reports empty.
    pub fn depart(&mut self, name: &str) -> Option<Player> {
        let roster = self.players.len();
        let departed = self.players.remove(name)?;
        let in_round = matches!(self.phase, Phase::SettingUp | Phase::Active);

        match roster {
            1 => {}
            2 => {
                if in_round {
                    self.phase = Phase::RoundResolved;
                }
                self.broadcast_all(ServerEvent::TooFewHiders);
            }
            _ => {
                self.broadcast_all(ServerEvent::Left {
                    identity: departed.identity,
                    name: name.to_string(),
                    position: departed.position,
                });

                if departed.seeker {
                    if in_round {
                        self.phase = Phase::RoundResolved;
                    }
                    self.broadcast_active(ServerEvent::RoundOver(RoundOverReason::SeekerLeft));
                } else {
                    self.detect_winner();
                }
            }
        }

        info!("Player {}/{} left", self.code, name);
        Some(departed)
    }

    fn broadcast_all(&self, event: ServerEvent) {
        fan_out(self.players.values().map(|player| &player.mailbox), &event);
    }

    /// Everyone except players waiting for the next round
    fn broadcast_active(&self, event: ServerEvent) {
        fan_out(
            self.players
                .values()
                .filter(|player| !player.pending_join)
                .map(|player| &player.mailbox),
            &event,
        );
    }

    fn broadcast_except(&self, excluded: &str, event: ServerEvent) {
        fan_out(
            self.players
                .iter()
                .filter(|(name, _)| name.as_str() != excluded)
                .map(|(_, player)| &player.mailbox),
            &event,
        );
    }
}
