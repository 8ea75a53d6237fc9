use std::collections::{HashMap, HashSet};
use log::{debug, info};
use crate::config::{Config, PeerConfig};
use crate::core_models::entities::{DownloadRecord, NeighborView, PeerId, PieceIndex, Request, Upload};
use crate::core_models::errors::{ConfigError, PeerError};
use crate::core_models::history::AgentHistory;
use crate::peer::Peer;

struct SwarmMember {
    peer: Peer,
    pieces: Vec<usize>,
    history: AgentHistory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: usize,
    pub requests: usize,
    pub uploads: usize,
    pub blocks_delivered: usize,
}

/// Minimal round-synchronous harness: every round each peer plans requests,
/// every peer then allocates its upload capacity to the requests it received,
/// and each unit of granted bandwidth delivers one block of a requested piece.
pub struct Swarm {
    conf: Config,
    members: Vec<SwarmMember>,
    lookup: HashMap<PeerId, usize>,
    round: usize,
}

impl Swarm {
    pub fn init(conf: Config) -> Self {
        return Swarm { conf, members: Vec::new(), lookup: HashMap::new(), round: 0 };
    }

    pub fn add_peer(&mut self, id: &str, peer_conf: &PeerConfig) -> Result<(), ConfigError> {
        return self.add_member(id, peer_conf, 0);
    }

    // seeds start with every piece
    pub fn add_seed(&mut self, id: &str, peer_conf: &PeerConfig) -> Result<(), ConfigError> {
        return self.add_member(id, peer_conf, self.conf.blocks_per_piece);
    }

    fn add_member(&mut self, id: &str, peer_conf: &PeerConfig, blocks: usize) -> Result<(), ConfigError> {
        if self.lookup.contains_key(id) {
            return Err(ConfigError::Invalid(format!("peer {} already in the swarm", id)));
        }
        let peer = Peer::init(id, &self.conf, peer_conf)?;
        self.lookup.insert(id.to_string(), self.members.len());
        self.members.push(SwarmMember {
            peer,
            pieces: vec![blocks; self.conf.num_pieces],
            history: AgentHistory::init(id),
        });
        return Ok(());
    }

    pub fn current_round(&self) -> usize {
        return self.round;
    }

    pub fn pieces_of(&self, id: &str) -> Option<&[usize]> {
        return self.member(id).map(|member| member.pieces.as_slice());
    }

    pub fn history_of(&self, id: &str) -> Option<&AgentHistory> {
        return self.member(id).map(|member| &member.history);
    }

    pub fn is_complete(&self, id: &str) -> bool {
        return self.member(id).map_or(false, |member| self.complete(&member.pieces));
    }

    pub fn all_complete(&self) -> bool {
        return self.members.iter().all(|member| self.complete(&member.pieces));
    }

    fn member(&self, id: &str) -> Option<&SwarmMember> {
        return self.lookup.get(id).map(|idx| &self.members[*idx]);
    }

    fn complete(&self, pieces: &[usize]) -> bool {
        return pieces.iter().all(|blocks| *blocks >= self.conf.blocks_per_piece);
    }

    /// Runs rounds until every member holds every piece. Returns the number of
    /// rounds played, or None when `max_rounds` ran out first.
    pub fn run_until_complete(&mut self, max_rounds: usize) -> Result<Option<usize>, PeerError> {
        let start = self.round;
        while !self.all_complete() {
            if self.round - start >= max_rounds {
                return Ok(None);
            }
            self.run_round()?;
        }
        return Ok(Some(self.round - start));
    }

    pub fn run_round(&mut self) -> Result<RoundSummary, PeerError> {
        let up_rates: Vec<(PeerId, f64)> = self.members.iter()
            .map(|member| (member.peer.id.clone(), member.peer.up_bw() as f64))
            .collect();
        let available: Vec<HashSet<PieceIndex>> = self.members.iter()
            .map(|member| {
                (0..member.pieces.len())
                    .filter(|piece_idx| member.pieces[*piece_idx] >= self.conf.blocks_per_piece)
                    .collect()
            })
            .collect();
        let views: Vec<Vec<NeighborView>> = (0..self.members.len())
            .map(|idx| self.neighbor_views(idx, &available))
            .collect();

        let mut requests: Vec<Request> = Vec::new();
        for (idx, member) in self.members.iter_mut().enumerate() {
            for (peer_id, rate) in up_rates.iter().filter(|(peer_id, _rate)| *peer_id != member.peer.id) {
                member.history.set_upload_rate(peer_id, *rate);
            }
            member.peer.update_pieces(&member.pieces);
            requests.extend(member.peer.plan_requests(&views[idx], &member.history)?);
        }

        let mut uploads: Vec<Upload> = Vec::new();
        for (idx, member) in self.members.iter_mut().enumerate() {
            let inbox: Vec<Request> = requests.iter()
                .filter(|request| request.responder == member.peer.id)
                .cloned()
                .collect();
            uploads.extend(member.peer.plan_uploads(&inbox, &views[idx], &member.history)?);
        }

        let mut downloads = self.deliver(&requests, &uploads, &available);
        let blocks_delivered: usize = downloads.values().flatten().map(|record| record.blocks).sum();

        for member in self.members.iter_mut() {
            let received = downloads.remove(&member.peer.id).unwrap_or_default();
            let sent: Vec<Upload> = uploads.iter().filter(|upload| upload.from == member.peer.id).cloned().collect();
            member.history.record_round(received, sent);
        }

        let summary = RoundSummary {
            round: self.round,
            requests: requests.len(),
            uploads: uploads.len(),
            blocks_delivered,
        };
        info!("round {}: {} requests, {} uploads, {} blocks delivered",
            summary.round, summary.requests, summary.uploads, summary.blocks_delivered);
        // peer.pieces() still holds the snapshot taken before this round's deliveries
        for member in self.members.iter().filter(|member| self.complete(&member.pieces) && !self.complete(member.peer.pieces())) {
            info!("{} ({}) finished in round {}", member.peer.id, member.peer.strategy_name(), self.round);
        }
        self.round += 1;
        return Ok(summary);
    }

    fn neighbor_views(&self, idx: usize, available: &[HashSet<PieceIndex>]) -> Vec<NeighborView> {
        return self.members.iter()
            .enumerate()
            .filter(|(other, _member)| *other != idx)
            .map(|(other, member)| NeighborView {
                id: member.peer.id.clone(),
                available_pieces: available[other].clone(),
                requests_this_round: 0,
            })
            .collect();
    }

    // Turns granted bandwidth into blocks, serving the receiver's requests to the uploader in order
    fn deliver(&mut self, requests: &[Request], uploads: &[Upload], available: &[HashSet<PieceIndex>])
               -> HashMap<PeerId, Vec<DownloadRecord>> {
        let mut downloads: HashMap<PeerId, Vec<DownloadRecord>> = HashMap::new();
        for upload in uploads {
            let (Some(from_idx), Some(to_idx)) = (self.lookup.get(&upload.from), self.lookup.get(&upload.to)) else {
                continue;
            };
            let mut budget = upload.bandwidth.max(0.0).floor() as usize;
            let mut blocks = 0;
            let receiver = &mut self.members[*to_idx];
            for request in requests.iter().filter(|request| request.requester == upload.to && request.responder == upload.from) {
                if budget == 0 {
                    break;
                }
                if !available[*from_idx].contains(&request.piece) {
                    continue;
                }
                while budget > 0 && receiver.pieces[request.piece] < self.conf.blocks_per_piece {
                    receiver.pieces[request.piece] += 1;
                    budget -= 1;
                    blocks += 1;
                }
            }
            if blocks > 0 {
                debug!("{} sent {} blocks to {}", upload.from, blocks, upload.to);
                downloads.entry(upload.to.clone()).or_default().push(DownloadRecord::new(&upload.from, blocks));
            }
        }
        return downloads;
    }
}
