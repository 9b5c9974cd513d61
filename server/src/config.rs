//! Command line configuration for the server binary

use crate::error::{Result, ServerError};
use crate::registry::CodeGenerator;
use clap::Parser;

pub const DEFAULT_MAX_GAMES: usize = 1000;
pub const DEFAULT_CODE_LENGTH: usize = 4;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on (0 picks a free port)
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Most games that may run at once
    #[arg(short, long, default_value_t = DEFAULT_MAX_GAMES)]
    pub max_games: usize,

    /// Letters per game code
    #[arg(short, long, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    /// Seed for maps, identities and codes; random when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_games: DEFAULT_MAX_GAMES,
            code_length: DEFAULT_CODE_LENGTH,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rejects settings the registry could never honour
    pub fn validate(&self) -> Result<()> {
        if self.max_games == 0 {
            return Err(ServerError::Config("--max-games must be at least 1".into()));
        }
        if self.code_length == 0 {
            return Err(ServerError::Config("--code-length must be at least 1".into()));
        }

        let codes = CodeGenerator::new(self.code_length).capacity();
        if codes < self.max_games {
            return Err(ServerError::Config(format!(
                "{} letter codes allow only {} games, fewer than --max-games {}",
                self.code_length, codes, self.max_games
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["server"]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let config = ServerConfig::parse_from([
            "server",
            "-H",
            "0.0.0.0",
            "--port",
            "9000",
            "--max-games",
            "20",
            "--code-length",
            "2",
            "--seed",
            "17",
        ]);
        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.max_games, 20);
        assert_eq!(config.code_length, 2);
        assert_eq!(config.seed, Some(17));
    }

    #[test]
    fn test_code_space_must_cover_max_games() {
        let config = ServerConfig {
            code_length: 1,
            max_games: 25,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));

        let config = ServerConfig {
            code_length: 1,
            max_games: 24,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        for config in [
            ServerConfig {
                max_games: 0,
                ..ServerConfig::default()
            },
            ServerConfig {
                code_length: 0,
                ..ServerConfig::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }
}
