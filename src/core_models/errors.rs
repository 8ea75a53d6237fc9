use std::fmt;
use crate::core_models::entities::{PeerId, PieceIndex};

// Malformed round input handed over by the harness
#[derive(Debug, PartialEq, Eq)]
pub enum PeerError {
    DuplicateNeighbor(PeerId),
    MisaddressedRequest { responder: PeerId },
    UnknownPiece(PieceIndex),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            PeerError::DuplicateNeighbor(id) => write!(f, "neighbor {} listed more than once", id),
            PeerError::MisaddressedRequest { responder } => write!(f, "request addressed to {}", responder),
            PeerError::UnknownPiece(piece_idx) => write!(f, "piece {} is outside the piece vector", piece_idx),
        };
    }
}

impl std::error::Error for PeerError {}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(String),
    Decode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            ConfigError::Invalid(reason) => write!(f, "invalid configuration: {}", reason),
            ConfigError::Decode(reason) => write!(f, "could not decode configuration: {}", reason),
        };
    }
}

impl std::error::Error for ConfigError {}
