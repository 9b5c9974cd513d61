//! Table of live games and the command entry points into them
//!
//! The registry is plain synchronous state. [`crate::coordinator`] wraps it
//! in the process-wide lock; everything here assumes that lock is held.

use crate::error::{GameError, InvariantViolation};
use crate::game::Session;
use crate::mailbox::Mailbox;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ClientCommand, ServerEvent};
use std::collections::HashMap;

/// Uppercase letters without the easily confused I and O
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// The game a connection has joined, under which name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seat {
    pub code: String,
    pub name: String,
}

/// Random game codes of a fixed length
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct codes, saturating at `usize::MAX`
    pub fn capacity(&self) -> usize {
        let length = u32::try_from(self.length).unwrap_or(u32::MAX);
        CODE_ALPHABET.len().saturating_pow(length)
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

#[derive(Debug)]
pub struct Registry {
    sessions: HashMap<String, Session>,
    codes: CodeGenerator,
    max_games: usize,
    rng: StdRng,
}

impl Registry {
    /// Creates an empty registry. Without a seed the RNG comes from entropy.
    pub fn new(max_games: usize, code_length: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            sessions: HashMap::new(),
            codes: CodeGenerator::new(code_length),
            max_games,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_games(&self) -> usize {
        self.max_games
    }

    pub fn session(&self, code: &str) -> Option<&Session> {
        self.sessions.get(code)
    }

    pub fn create(&mut self, code: &str) -> Result<&mut Session, GameError> {
        if self.sessions.contains_key(code) {
            return Err(GameError::CodeCollision(code.to_string()));
        }
        info!("Created game {}", code);
        Ok(self
            .sessions
            .entry(code.to_string())
            .or_insert_with(|| Session::new(code)))
    }

    pub fn lookup(&mut self, code: &str) -> Result<&mut Session, GameError> {
        self.sessions
            .get_mut(code)
            .ok_or_else(|| GameError::NoSuchGame(code.to_string()))
    }

    pub fn delete(&mut self, code: &str) -> Option<Session> {
        let session = self.sessions.remove(code);
        if session.is_some() {
            info!("Deleted game {} ({} games left)", code, self.sessions.len());
        }
        session
    }

    /// A code no live game uses
    fn fresh_code(&mut self) -> Result<String, GameError> {
        if self.sessions.len() >= self.max_games {
            return Err(GameError::TooManyGames);
        }
        loop {
            let code = self.codes.generate(&mut self.rng);
            if !self.sessions.contains_key(&code) {
                return Ok(code);
            }
        }
    }

    /// Opens a game with `name` as its creator and seeker
    pub fn new_game(&mut self, name: &str, mailbox: &Mailbox) -> Result<Seat, GameError> {
        let code = self.fresh_code()?;
        self.create(&code)?;

        let Some(session) = self.sessions.get_mut(&code) else {
            return Err(GameError::NoSuchGame(code));
        };
        let identity = match session.admit(name, mailbox.clone(), &mut self.rng) {
            Ok(identity) => identity,
            Err(err) => {
                self.delete(&code);
                return Err(err);
            }
        };

        mailbox.deliver(ServerEvent::GameInitialized {
            code: code.clone(),
            identity,
            name: name.to_string(),
        });
        Ok(Seat {
            code,
            name: name.to_string(),
        })
    }

    /// Seats `name` in an existing game
    pub fn join(&mut self, code: &str, name: &str, mailbox: &Mailbox) -> Result<Seat, GameError> {
        let session = self
            .sessions
            .get_mut(code)
            .ok_or_else(|| GameError::NoSuchGame(code.to_string()))?;

        session.admit(name, mailbox.clone(), &mut self.rng)?;
        session.announce_join(name);

        Ok(Seat {
            code: code.to_string(),
            name: name.to_string(),
        })
    }

    /// Runs an in-session command for the player in `seat`.
    ///
    /// Commands for vanished seats, and moves onto cells the player can't
    /// use, are dropped.
    pub fn dispatch(
        &mut self,
        seat: &Seat,
        command: ClientCommand,
    ) -> Result<(), InvariantViolation> {
        let Some(session) = self.sessions.get_mut(&seat.code) else {
            debug!("Dropping {:?} for vanished game {}", command.tag(), seat.code);
            return Ok(());
        };
        if session.player(&seat.name).is_none() {
            debug!(
                "Dropping {:?} for unknown player {}/{}",
                command.tag(),
                seat.code,
                seat.name
            );
            return Ok(());
        }

        match command {
            ClientCommand::MoveTo { row, col } => {
                if session.can_move(&seat.name, row, col) {
                    session.move_to(&seat.name, row, col);
                } else {
                    debug!(
                        "Dropping move of {}/{} to ({}, {})",
                        seat.code, seat.name, row, col
                    );
                }
            }
            ClientCommand::ReadyToGo => session.ready_to_go(&seat.name),
            ClientCommand::ReadyForNextSetup => {
                session.ready_for_next_setup(&seat.name, &mut self.rng)?
            }
            ClientCommand::Start => {
                session.start(&mut self.rng)?;
            }
            ClientCommand::Join { .. } | ClientCommand::NewGame { .. } => {
                debug!("{}/{} already has a seat", seat.code, seat.name);
            }
        }

        session.check_invariants()
    }

    /// Removes the player in `seat`, dropping the game once it is empty
    pub fn disconnect(&mut self, seat: &Seat) -> Result<(), InvariantViolation> {
        let Some(session) = self.sessions.get_mut(&seat.code) else {
            return Ok(());
        };
        session.depart(&seat.name);

        if session.is_empty() {
            self.delete(&seat.code);
            return Ok(());
        }
        session.check_invariants()
    }
}
