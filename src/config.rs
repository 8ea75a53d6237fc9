use serde_derive::Deserialize;
use crate::core_models::errors::ConfigError;

pub const DEFAULT_BLOCKS_PER_PIECE: usize = 4;
pub const DEFAULT_NUM_PIECES: usize = 16;
pub const DEFAULT_UP_BW: u32 = 40;
pub const DEFAULT_MAX_REQUESTS: usize = 4;

// Share of the upload capacity kept aside for a non-reciprocating requester
pub const DEFAULT_UNCHOKE_PORTION: f64 = 0.1;
// Reciprocity slots plus the optimistic one
pub const DEFAULT_UNCHOKE_SLOTS: usize = 4;
// Price raise factor while probing for reciprocation
pub const DEFAULT_ALPHA: f64 = 0.2;
// Price decay factor once reciprocation is stable
pub const DEFAULT_GAMMA: f64 = 0.1;
// Consecutive reciprocated rounds after which a neighbor counts as stable
pub const DEFAULT_STABLE_ROUNDS: usize = 3;
// First-contact price is the upload capacity divided by this
pub const INITIAL_PRICE_DIVISOR: f64 = 4.0;
// Lower bound for estimated prices and values
pub const MIN_RATE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    ProportionalShare { unchoke_portion: f64 },
    Reciprocity { unchoke_slots: usize },
    Auction { alpha: f64, gamma: f64, stable_rounds: usize },
}

impl Strategy {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        return match name {
            "propshare" => Ok(Strategy::ProportionalShare { unchoke_portion: DEFAULT_UNCHOKE_PORTION }),
            "std" => Ok(Strategy::Reciprocity { unchoke_slots: DEFAULT_UNCHOKE_SLOTS }),
            "tyrant" => Ok(Strategy::Auction {
                alpha: DEFAULT_ALPHA,
                gamma: DEFAULT_GAMMA,
                stable_rounds: DEFAULT_STABLE_ROUNDS,
            }),
            other => Err(ConfigError::Invalid(format!("unknown strategy {}", other))),
        };
    }

    pub fn name(&self) -> &'static str {
        return match self {
            Strategy::ProportionalShare { .. } => "propshare",
            Strategy::Reciprocity { .. } => "std",
            Strategy::Auction { .. } => "tyrant",
        };
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Strategy::ProportionalShare { unchoke_portion } => {
                if !(0.0..=1.0).contains(&unchoke_portion) {
                    return Err(ConfigError::Invalid(format!("unchoke portion {} outside [0, 1]", unchoke_portion)));
                }
            }
            Strategy::Reciprocity { unchoke_slots } => {
                if unchoke_slots == 0 {
                    return Err(ConfigError::Invalid("at least one unchoke slot is required".to_string()));
                }
            }
            Strategy::Auction { alpha, gamma, stable_rounds } => {
                if !(alpha > 0.0) {
                    return Err(ConfigError::Invalid(format!("alpha {} must be positive", alpha)));
                }
                if !(gamma > 0.0 && gamma < 1.0) {
                    return Err(ConfigError::Invalid(format!("gamma {} outside (0, 1)", gamma)));
                }
                if stable_rounds == 0 {
                    return Err(ConfigError::Invalid("stable rounds must be at least 1".to_string()));
                }
            }
        }
        return Ok(());
    }
}

// Run-wide constants shared by every peer
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub blocks_per_piece: usize,
    pub num_pieces: usize,
}

impl Config {
    pub fn init() -> Self {
        return Config {
            blocks_per_piece: DEFAULT_BLOCKS_PER_PIECE,
            num_pieces: DEFAULT_NUM_PIECES,
        };
    }

    pub fn from_bencode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_bencode::from_bytes(bytes)
            .map_err(|err| ConfigError::Decode(err.to_string()))?;
        let config = Config {
            blocks_per_piece: raw.blocks_per_piece as usize,
            num_pieces: raw.num_pieces as usize,
        };
        config.validate()?;
        return Ok(config);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blocks_per_piece == 0 {
            return Err(ConfigError::Invalid("blocks per piece must be at least 1".to_string()));
        }
        return Ok(());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PeerConfig {
    pub up_bw: u32,
    pub max_requests: usize,
    // None draws a fresh seed
    pub seed: Option<u64>,
    pub strategy: Strategy,
}

impl PeerConfig {
    pub fn init(strategy: Strategy) -> Self {
        return PeerConfig {
            up_bw: DEFAULT_UP_BW,
            max_requests: DEFAULT_MAX_REQUESTS,
            seed: None,
            strategy,
        };
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        return self;
    }

    pub fn from_bencode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let raw: RawPeerConfig = serde_bencode::from_bytes(bytes)
            .map_err(|err| ConfigError::Decode(err.to_string()))?;
        let strategy = match Strategy::from_name(&raw.strategy)? {
            Strategy::ProportionalShare { unchoke_portion } => Strategy::ProportionalShare {
                unchoke_portion: raw.unchoke_portion_pct.map_or(unchoke_portion, percent),
            },
            Strategy::Reciprocity { unchoke_slots } => Strategy::Reciprocity {
                unchoke_slots: raw.unchoke_slots.map_or(unchoke_slots, |slots| slots as usize),
            },
            Strategy::Auction { alpha, gamma, stable_rounds } => Strategy::Auction {
                alpha: raw.alpha_pct.map_or(alpha, percent),
                gamma: raw.gamma_pct.map_or(gamma, percent),
                stable_rounds: raw.stable_rounds.map_or(stable_rounds, |rounds| rounds as usize),
            },
        };

        let config = PeerConfig {
            up_bw: u32::try_from(raw.up_bw)
                .map_err(|_| ConfigError::Invalid(format!("upload bandwidth {} too large", raw.up_bw)))?,
            max_requests: raw.max_requests as usize,
            seed: raw.seed,
            strategy,
        };
        config.validate()?;
        return Ok(config);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid("max requests must be at least 1".to_string()));
        }
        return self.strategy.validate();
    }
}

fn percent(value: u64) -> f64 {
    return value as f64 / 100.0;
}

// Bencode carries no floats, fractions travel as whole percentages
#[derive(Deserialize)]
struct RawConfig {
    blocks_per_piece: u64,
    num_pieces: u64,
}

#[derive(Deserialize)]
struct RawPeerConfig {
    up_bw: u64,
    max_requests: u64,
    strategy: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    unchoke_portion_pct: Option<u64>,
    #[serde(default)]
    unchoke_slots: Option<u64>,
    #[serde(default)]
    alpha_pct: Option<u64>,
    #[serde(default)]
    gamma_pct: Option<u64>,
    #[serde(default)]
    stable_rounds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, PeerConfig, Strategy, DEFAULT_GAMMA, DEFAULT_STABLE_ROUNDS};
    use crate::core_models::errors::ConfigError;

    #[test]
    fn test_config_from_bencode() {
        let config = Config::from_bencode(b"d16:blocks_per_piecei8e10:num_piecesi32ee").unwrap();
        assert_eq!(config.blocks_per_piece, 8);
        assert_eq!(config.num_pieces, 32);
    }

    #[test]
    fn test_config_rejects_zero_blocks_per_piece() {
        let result = Config::from_bencode(b"d16:blocks_per_piecei0e10:num_piecesi32ee");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_rejects_garbage() {
        assert!(matches!(Config::from_bencode(b"not bencode"), Err(ConfigError::Decode(_))));
    }

    #[test]
    fn test_peer_config_from_bencode_with_percentages() {
        let bytes = b"d9:alpha_pcti30e12:max_requestsi2e4:seedi7e8:strategy6:tyrant5:up_bwi50ee";
        let config = PeerConfig::from_bencode(bytes).unwrap();

        assert_eq!(config.up_bw, 50);
        assert_eq!(config.max_requests, 2);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.strategy, Strategy::Auction {
            alpha: 0.3,
            gamma: DEFAULT_GAMMA,
            stable_rounds: DEFAULT_STABLE_ROUNDS,
        });
    }

    #[test]
    fn test_peer_config_unknown_strategy() {
        let bytes = b"d12:max_requestsi2e8:strategy5:bogus5:up_bwi50ee";
        assert!(matches!(PeerConfig::from_bencode(bytes), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_strategy_validation() {
        assert!(Strategy::ProportionalShare { unchoke_portion: 1.5 }.validate().is_err());
        assert!(Strategy::Reciprocity { unchoke_slots: 0 }.validate().is_err());
        assert!(Strategy::Auction { alpha: 0.2, gamma: 1.0, stable_rounds: 3 }.validate().is_err());
        assert!(Strategy::from_name("std").unwrap().validate().is_ok());
    }

    #[test]
    fn test_peer_config_rejects_zero_max_requests() {
        let mut config = PeerConfig::init(Strategy::from_name("propshare").unwrap());
        config.max_requests = 0;
        assert!(config.validate().is_err());
    }
}
