use std::collections::HashSet;

pub type PeerId = String;
pub type PieceIndex = usize;

// Per-round snapshot of a neighbor, owned by the harness
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborView {
    pub id: PeerId,
    pub available_pieces: HashSet<PieceIndex>,
    // harness scratch counter; planning keeps its own counters and never reads or writes this
    pub requests_this_round: usize,
}

impl NeighborView {
    pub fn new(id: &str, available_pieces: impl IntoIterator<Item=PieceIndex>) -> Self {
        return NeighborView {
            id: id.to_string(),
            available_pieces: available_pieces.into_iter().collect(),
            requests_this_round: 0,
        };
    }

    pub fn has_piece(&self, piece_idx: PieceIndex) -> bool {
        return self.available_pieces.contains(&piece_idx);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Request {
    pub requester: PeerId,
    pub responder: PeerId,
    pub piece: PieceIndex,
    pub start_block: usize,
}

impl Request {
    pub fn new(requester: &str, responder: &str, piece: PieceIndex, start_block: usize) -> Self {
        return Request {
            requester: requester.to_string(),
            responder: responder.to_string(),
            piece,
            start_block,
        };
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Upload {
    pub from: PeerId,
    pub to: PeerId,
    pub bandwidth: f64,
}

impl Upload {
    pub fn new(from: &str, to: &str, bandwidth: f64) -> Self {
        return Upload { from: from.to_string(), to: to.to_string(), bandwidth };
    }
}

// Blocks received by this peer from one neighbor during a round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRecord {
    pub from: PeerId,
    pub blocks: usize,
}

impl DownloadRecord {
    pub fn new(from: &str, blocks: usize) -> Self {
        return DownloadRecord { from: from.to_string(), blocks };
    }
}

pub fn total_bandwidth(uploads: &[Upload]) -> f64 {
    return uploads.iter().map(|upload| upload.bandwidth).sum();
}
