//! Wire protocol shared by the hide-and-seek server and its clients.
//!
//! Every frame is a block of text lines separated by `\n`. The first line is
//! the tag, the remaining lines are positional arguments. Separators inside
//! arguments are not escaped, so names and codes can never contain a newline.
//!
//! Inbound frames decode once into [`ClientCommand`] through [`FromStr`];
//! outbound [`ServerEvent`]s encode through [`fmt::Display`]. Nothing past
//! this boundary looks at raw text again.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const FRAME_SEPARATOR: char = '\n';

/// Grid coordinate of a player, `None` until the player has been placed.
/// Encoded as `-1`/`-1` on the wire.
pub type Position = Option<(usize, usize)>;

pub const TAG_JOIN: &str = "join";
pub const TAG_MOVE_TO: &str = "move to";
pub const TAG_NEW_GAME: &str = "new game";
pub const TAG_READY_TO_GO: &str = "ready to go";
pub const TAG_READY_FOR_NEXT_SETUP: &str = "ready for next setup";
pub const TAG_START: &str = "start";

/// Commands a connected client can issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Join { code: String, name: String },
    MoveTo { row: usize, col: usize },
    NewGame { name: String },
    ReadyToGo,
    ReadyForNextSetup,
    Start,
}

/// Reasons an inbound frame could not be decoded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty frame")]
    EmptyFrame,

    #[error("unknown command tag {0:?}")]
    UnknownTag(String),

    #[error("command {tag:?} is missing argument `{argument}`")]
    MissingArgument {
        tag: &'static str,
        argument: &'static str,
    },

    #[error("argument `{argument}` of {tag:?} is not a grid index: {value:?}")]
    InvalidNumber {
        tag: &'static str,
        argument: &'static str,
        value: String,
    },

    #[error("command {0:?} needs a non-empty name")]
    EmptyName(&'static str),
}

struct Arguments<'a> {
    tag: &'static str,
    lines: std::str::Split<'a, char>,
}

impl<'a> Arguments<'a> {
    fn new(tag: &'static str, lines: std::str::Split<'a, char>) -> Self {
        Self { tag, lines }
    }

    fn next(&mut self, argument: &'static str) -> Result<&'a str, ProtocolError> {
        self.lines
            .next()
            .map(|line| line.trim_end_matches('\r'))
            .ok_or(ProtocolError::MissingArgument {
                tag: self.tag,
                argument,
            })
    }

    fn name(&mut self) -> Result<String, ProtocolError> {
        let name = self.next("name")?;
        if name.trim().is_empty() {
            return Err(ProtocolError::EmptyName(self.tag));
        }
        Ok(name.to_string())
    }

    fn index(&mut self, argument: &'static str) -> Result<usize, ProtocolError> {
        let value = self.next(argument)?;
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| ProtocolError::InvalidNumber {
                tag: self.tag,
                argument,
                value: value.to_string(),
            })
    }
}

impl FromStr for ClientCommand {
    type Err = ProtocolError;

    fn from_str(frame: &str) -> Result<Self, Self::Err> {
        let mut lines = frame.split(FRAME_SEPARATOR);
        let tag = lines.next().unwrap_or_default().trim_end_matches('\r');

        match tag {
            "" => Err(ProtocolError::EmptyFrame),
            TAG_JOIN => {
                let mut args = Arguments::new(TAG_JOIN, lines);
                let code = args.next("code")?.to_string();
                let name = args.name()?;
                Ok(ClientCommand::Join { code, name })
            }
            TAG_MOVE_TO => {
                let mut args = Arguments::new(TAG_MOVE_TO, lines);
                let row = args.index("row")?;
                let col = args.index("col")?;
                Ok(ClientCommand::MoveTo { row, col })
            }
            TAG_NEW_GAME => {
                let name = Arguments::new(TAG_NEW_GAME, lines).name()?;
                Ok(ClientCommand::NewGame { name })
            }
            TAG_READY_TO_GO => Ok(ClientCommand::ReadyToGo),
            TAG_READY_FOR_NEXT_SETUP => Ok(ClientCommand::ReadyForNextSetup),
            TAG_START => Ok(ClientCommand::Start),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

impl ClientCommand {
    pub fn tag(&self) -> &'static str {
        match self {
            ClientCommand::Join { .. } => TAG_JOIN,
            ClientCommand::MoveTo { .. } => TAG_MOVE_TO,
            ClientCommand::NewGame { .. } => TAG_NEW_GAME,
            ClientCommand::ReadyToGo => TAG_READY_TO_GO,
            ClientCommand::ReadyForNextSetup => TAG_READY_FOR_NEXT_SETUP,
            ClientCommand::Start => TAG_START,
        }
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Join { code, name } => write!(f, "{TAG_JOIN}\n{code}\n{name}"),
            ClientCommand::MoveTo { row, col } => write!(f, "{TAG_MOVE_TO}\n{row}\n{col}"),
            ClientCommand::NewGame { name } => write!(f, "{TAG_NEW_GAME}\n{name}"),
            ClientCommand::ReadyToGo => f.write_str(TAG_READY_TO_GO),
            ClientCommand::ReadyForNextSetup => f.write_str(TAG_READY_FOR_NEXT_SETUP),
            ClientCommand::Start => f.write_str(TAG_START),
        }
    }
}

/// Identity and name of one roster member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub identity: char,
    pub name: String,
}

/// Reply sent to a player that just joined an existing game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Welcome {
    pub code: String,
    pub identity: char,
    pub name: String,
    /// Everybody else already in the game
    pub others: Vec<RosterEntry>,
}

/// One player's line in a setup broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupEntry {
    pub identity: char,
    pub name: String,
    pub position: Position,
    pub score: u32,
}

/// Everything a client needs to draw a fresh round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPayload {
    pub seeker: char,
    /// Cells per grid row
    pub width: usize,
    /// All rows concatenated, one `char` per cell, blanks as spaces
    pub terrain: String,
    pub players: Vec<SetupEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOverReason {
    SeekerLeft,
    TwoPlayerGame,
}

/// Events the server pushes into player mailboxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    NoSuchGame {
        code: String,
    },
    NameTaken {
        name: String,
    },
    GameFull {
        code: String,
    },
    Joined {
        identity: char,
        name: String,
    },
    WaitForStart(Welcome),
    WaitForNextRound(Welcome),
    Moved {
        identity: char,
        from: Position,
        to: (usize, usize),
    },
    Found {
        identity: char,
        name: String,
        row: usize,
        col: usize,
    },
    Winner {
        identity: char,
        name: String,
    },
    RoundOver(RoundOverReason),
    TooFewHiders,
    GameInitialized {
        code: String,
        identity: char,
        name: String,
    },
    Go,
    Setup(SetupPayload),
    Left {
        identity: char,
        name: String,
        position: Position,
    },
    TooManyGames,
}

impl ServerEvent {
    /// First line of the encoded frame
    pub fn tag(&self) -> &'static str {
        match self {
            ServerEvent::NoSuchGame { .. } => "no such game",
            ServerEvent::NameTaken { .. } => "name is taken",
            ServerEvent::GameFull { .. } => "game is full",
            ServerEvent::Joined { .. } => "joined",
            ServerEvent::WaitForStart(_) => "wait for start",
            ServerEvent::WaitForNextRound(_) => "wait for next round",
            ServerEvent::Moved { .. } => "moved",
            ServerEvent::Found { .. } => "found",
            ServerEvent::Winner { .. } => "winner",
            ServerEvent::RoundOver(_) => "round over",
            ServerEvent::TooFewHiders => "too few hiders",
            ServerEvent::GameInitialized { .. } => "game initialized",
            ServerEvent::Go => "go!",
            ServerEvent::Setup(_) => "setup",
            ServerEvent::Left { .. } => "left",
            ServerEvent::TooManyGames => "too many games in session",
        }
    }
}

struct Coordinate(Position);

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((row, col)) => write!(f, "{row}\n{col}"),
            None => f.write_str("-1\n-1"),
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())?;

        match self {
            ServerEvent::NoSuchGame { code } | ServerEvent::GameFull { code } => {
                write!(f, "\n{code}")
            }
            ServerEvent::NameTaken { name } => write!(f, "\n{name}"),
            ServerEvent::Joined { identity, name } | ServerEvent::Winner { identity, name } => {
                write!(f, "\n{identity}\n{name}")
            }
            ServerEvent::WaitForStart(welcome) | ServerEvent::WaitForNextRound(welcome) => {
                write!(f, "\n{}\n{}\n{}", welcome.code, welcome.identity, welcome.name)?;
                for other in &welcome.others {
                    write!(f, "\n{}\n{}", other.identity, other.name)?;
                }
                Ok(())
            }
            ServerEvent::Moved { identity, from, to } => write!(
                f,
                "\n{identity}\nfrom\n{}\nto\n{}",
                Coordinate(*from),
                Coordinate(Some(*to))
            ),
            ServerEvent::Found {
                identity,
                name,
                row,
                col,
            } => write!(f, "\n{identity}\n{name}\n{row}\n{col}"),
            ServerEvent::RoundOver(RoundOverReason::SeekerLeft) => f.write_str("\nseeker left"),
            ServerEvent::RoundOver(RoundOverReason::TwoPlayerGame) => {
                f.write_str("\n2 player game")
            }
            ServerEvent::GameInitialized {
                code,
                identity,
                name,
            } => write!(f, "\n{code}\n{identity}\n{name}"),
            ServerEvent::Setup(setup) => {
                write!(
                    f,
                    "\nseeker {}\nforest\n{}\n{}",
                    setup.seeker, setup.width, setup.terrain
                )?;
                for entry in &setup.players {
                    write!(
                        f,
                        "\n{}\n{}\n{}\n{}",
                        entry.identity,
                        entry.name,
                        Coordinate(entry.position),
                        entry.score
                    )?;
                }
                Ok(())
            }
            ServerEvent::Left {
                identity,
                name,
                position,
            } => write!(f, "\n{identity}\n{name}\n{}", Coordinate(*position)),
            ServerEvent::TooFewHiders | ServerEvent::Go | ServerEvent::TooManyGames => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_join() {
        let command: ClientCommand = "join\nABCD\nMallory".parse().unwrap();
        assert_eq!(
            command,
            ClientCommand::Join {
                code: "ABCD".to_string(),
                name: "Mallory".to_string()
            }
        );
    }

    #[test]
    fn test_decode_move_to() {
        let command: ClientCommand = "move to\n3\n12".parse().unwrap();
        assert_eq!(command, ClientCommand::MoveTo { row: 3, col: 12 });
    }

    #[test]
    fn test_decode_argumentless_commands() {
        assert_eq!("start".parse::<ClientCommand>(), Ok(ClientCommand::Start));
        assert_eq!(
            "ready to go".parse::<ClientCommand>(),
            Ok(ClientCommand::ReadyToGo)
        );
        assert_eq!(
            "ready for next setup".parse::<ClientCommand>(),
            Ok(ClientCommand::ReadyForNextSetup)
        );
    }

    #[test]
    fn test_decode_tolerates_carriage_returns() {
        let command: ClientCommand = "new game\r\nAlice\r".parse().unwrap();
        assert_eq!(
            command,
            ClientCommand::NewGame {
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert_eq!("".parse::<ClientCommand>(), Err(ProtocolError::EmptyFrame));
        assert_eq!(
            "dance".parse::<ClientCommand>(),
            Err(ProtocolError::UnknownTag("dance".to_string()))
        );
        assert_eq!(
            "join\nABCD".parse::<ClientCommand>(),
            Err(ProtocolError::MissingArgument {
                tag: TAG_JOIN,
                argument: "name"
            })
        );
        assert_eq!(
            "new game\n   ".parse::<ClientCommand>(),
            Err(ProtocolError::EmptyName(TAG_NEW_GAME))
        );
        assert!(matches!(
            "move to\n-1\n2".parse::<ClientCommand>(),
            Err(ProtocolError::InvalidNumber { argument: "row", .. })
        ));
    }

    #[test]
    fn test_command_encoding_matches_decoding() {
        let commands = [
            ClientCommand::Join {
                code: "WXYZ".to_string(),
                name: "Bob".to_string(),
            },
            ClientCommand::MoveTo { row: 0, col: 7 },
            ClientCommand::Start,
        ];

        for command in commands {
            let frame = command.to_string();
            assert_eq!(frame.parse::<ClientCommand>().as_ref(), Ok(&command));
        }
    }

    #[test]
    fn test_encode_simple_events() {
        assert_eq!(ServerEvent::Go.to_string(), "go!");
        assert_eq!(ServerEvent::TooFewHiders.to_string(), "too few hiders");
        assert_eq!(
            ServerEvent::TooManyGames.to_string(),
            "too many games in session"
        );
        assert_eq!(
            ServerEvent::RoundOver(RoundOverReason::SeekerLeft).to_string(),
            "round over\nseeker left"
        );
        assert_eq!(
            ServerEvent::RoundOver(RoundOverReason::TwoPlayerGame).to_string(),
            "round over\n2 player game"
        );
        assert_eq!(
            ServerEvent::NoSuchGame {
                code: "QQQQ".to_string()
            }
            .to_string(),
            "no such game\nQQQQ"
        );
    }

    #[test]
    fn test_encode_moved_from_unplaced_position() {
        let event = ServerEvent::Moved {
            identity: '👽',
            from: None,
            to: (2, 3),
        };
        assert_eq!(event.to_string(), "moved\n👽\nfrom\n-1\n-1\nto\n2\n3");
    }

    #[test]
    fn test_encode_welcome() {
        let event = ServerEvent::WaitForStart(Welcome {
            code: "ABCD".to_string(),
            identity: '🐶',
            name: "Bob".to_string(),
            others: vec![RosterEntry {
                identity: '🎅',
                name: "Santa".to_string(),
            }],
        });
        assert_eq!(event.to_string(), "wait for start\nABCD\n🐶\nBob\n🎅\nSanta");
    }

    #[test]
    fn test_encode_setup() {
        let event = ServerEvent::Setup(SetupPayload {
            seeker: '🐷',
            width: 2,
            terrain: "🌲 🌳🌲".to_string(),
            players: vec![
                SetupEntry {
                    identity: '🐷',
                    name: "Ann".to_string(),
                    position: Some((0, 0)),
                    score: 1,
                },
                SetupEntry {
                    identity: '🐸',
                    name: "Ben".to_string(),
                    position: Some((1, 1)),
                    score: 0,
                },
            ],
        });
        assert_eq!(
            event.to_string(),
            "setup\nseeker 🐷\nforest\n2\n🌲 🌳🌲\n🐷\nAnn\n0\n0\n1\n🐸\nBen\n1\n1\n0"
        );
    }
}
