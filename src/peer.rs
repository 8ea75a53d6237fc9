use std::collections::HashSet;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::choke::allocator::{allocator_for, UploadAllocator};
use crate::config::{Config, PeerConfig};
use crate::core_models::entities::{NeighborView, PeerId, Request, Upload};
use crate::core_models::errors::{ConfigError, PeerError};
use crate::core_models::history::RoundHistory;
use crate::piece_picker::RequestPlanner;

/// One swarm participant. The harness owns the clock and the piece store and
/// hands in fresh snapshots every round; the peer keeps only its own decision state.
pub struct Peer {
    pub id: PeerId,
    blocks_per_piece: usize,
    up_bw: u32,
    pieces: Vec<usize>,
    planner: RequestPlanner,
    allocator: Box<dyn UploadAllocator>,
    rng: StdRng,
}

impl Peer {
    pub fn init(id: &str, conf: &Config, peer_conf: &PeerConfig) -> Result<Self, ConfigError> {
        conf.validate()?;
        peer_conf.validate()?;
        let seed = peer_conf.seed.unwrap_or_else(rand::random);
        debug!("{} starts as {} with seed {}", id, peer_conf.strategy.name(), seed);

        return Ok(Peer {
            id: id.to_string(),
            blocks_per_piece: conf.blocks_per_piece,
            up_bw: peer_conf.up_bw,
            pieces: vec![0; conf.num_pieces],
            planner: RequestPlanner::init(conf.blocks_per_piece, peer_conf.max_requests),
            allocator: allocator_for(id, peer_conf.up_bw, peer_conf.strategy),
            rng: StdRng::seed_from_u64(seed),
        });
    }

    pub fn with_allocator(mut self, allocator: Box<dyn UploadAllocator>) -> Self {
        self.allocator = allocator;
        return self;
    }

    pub fn update_pieces(&mut self, pieces: &[usize]) {
        self.pieces = pieces.to_vec();
    }

    pub fn pieces(&self) -> &[usize] {
        return &self.pieces;
    }

    pub fn up_bw(&self) -> u32 {
        return self.up_bw;
    }

    pub fn strategy_name(&self) -> &'static str {
        return self.allocator.name();
    }

    pub fn is_complete(&self) -> bool {
        return self.pieces.iter().all(|blocks| *blocks >= self.blocks_per_piece);
    }

    pub fn plan_requests(&mut self, peers: &[NeighborView], history: &dyn RoundHistory)
                         -> Result<Vec<Request>, PeerError> {
        self.validate_neighbors(peers)?;
        debug!("{} planning requests for round {}", self.id, history.current_round());
        return Ok(self.planner.plan(&self.id, &self.pieces, peers, &mut self.rng));
    }

    pub fn plan_uploads(&mut self, requests: &[Request], peers: &[NeighborView], history: &dyn RoundHistory)
                        -> Result<Vec<Upload>, PeerError> {
        self.validate_neighbors(peers)?;
        if let Some(request) = requests.iter().find(|request| request.responder != self.id) {
            warn!("{} received a request meant for {}", self.id, request.responder);
            return Err(PeerError::MisaddressedRequest { responder: request.responder.clone() });
        }
        return Ok(self.allocator.plan_uploads(requests, peers, history, &mut self.rng));
    }

    fn validate_neighbors(&self, peers: &[NeighborView]) -> Result<(), PeerError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for peer in peers {
            if !seen.insert(peer.id.as_str()) {
                warn!("{} got neighbor {} twice", self.id, peer.id);
                return Err(PeerError::DuplicateNeighbor(peer.id.clone()));
            }
            if let Some(piece_idx) = peer.available_pieces.iter().find(|piece_idx| **piece_idx >= self.pieces.len()) {
                warn!("{} got piece {} from {} outside the torrent", self.id, piece_idx, peer.id);
                return Err(PeerError::UnknownPiece(*piece_idx));
            }
        }
        return Ok(());
    }
}
