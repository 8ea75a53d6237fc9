use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::choke::allocator::UploadAllocator;
use crate::choke::models::{even_split, requesters};
use crate::core_models::entities::{NeighborView, PeerId, Request, Upload};
use crate::core_models::history::{previous_round_blocks, RoundHistory};

/// Shares upload capacity in proportion to the blocks each requester sent us
/// last round, keeping `unchoke_portion` of it for one requester that sent
/// nothing.
pub struct ProportionalShareAllocator {
    peer_id: PeerId,
    up_bw: u32,
    unchoke_portion: f64,
}

impl ProportionalShareAllocator {
    pub fn init(peer_id: &str, up_bw: u32, unchoke_portion: f64) -> Self {
        return ProportionalShareAllocator { peer_id: peer_id.to_string(), up_bw, unchoke_portion };
    }

    fn split_evenly(&self, chosen: &[PeerId]) -> Vec<Upload> {
        return chosen.iter()
            .zip(even_split(self.up_bw, chosen.len()))
            .map(|(peer_id, bw)| Upload::new(&self.peer_id, peer_id, bw as f64))
            .collect();
    }
}

impl UploadAllocator for ProportionalShareAllocator {
    fn name(&self) -> &'static str {
        return "propshare";
    }

    fn plan_uploads(&mut self, requests: &[Request], _peers: &[NeighborView], history: &dyn RoundHistory,
                    rng: &mut StdRng) -> Vec<Upload> {
        let requesters = requesters(requests);
        if requesters.is_empty() {
            return vec![];
        }
        if history.current_round() == 0 {
            return self.split_evenly(&requesters);
        }

        let received = previous_round_blocks(history);
        // vec of (requester, blocks it sent us last round)
        let mut shared: Vec<(PeerId, u64)> = requesters.iter()
            .filter_map(|peer_id| received.get(peer_id).map(|blocks| (peer_id.clone(), *blocks as u64)))
            .collect();
        shared.sort_by(|a, b| a.0.cmp(&b.0));
        let total: u64 = shared.iter().map(|(_peer_id, blocks)| blocks).sum();
        if total == 0 {
            debug!("{} has no proportional basis, splitting evenly", self.peer_id);
            return self.split_evenly(&requesters);
        }

        let unshared: Vec<&PeerId> = requesters.iter()
            .filter(|peer_id| !received.contains_key(*peer_id))
            .collect();
        let optimistic = unshared.choose(rng).map(|peer_id| (*peer_id).clone());

        // without an unshared requester the reserved slack joins the proportional pool
        let pool = match optimistic {
            Some(_) => (self.up_bw as f64 * (1.0 - self.unchoke_portion)).floor() as u32,
            None => self.up_bw,
        };

        let mut bws: Vec<u32> = shared.iter()
            .map(|(_peer_id, blocks)| (pool as u64 * blocks / total) as u32)
            .collect();
        let assigned: u32 = bws.iter().sum();
        if let Some(last) = bws.last_mut() {
            *last += pool - assigned;
        }

        let mut uploads: Vec<Upload> = shared.iter()
            .zip(bws)
            .map(|((peer_id, _blocks), bw)| Upload::new(&self.peer_id, peer_id, bw as f64))
            .collect();
        if let Some(peer_id) = optimistic {
            uploads.push(Upload::new(&self.peer_id, &peer_id, (self.up_bw - pool) as f64));
        }
        uploads.retain(|upload| upload.bandwidth > 0.0);

        debug!("{} proportional share: {:?}", self.peer_id, uploads);
        return uploads;
    }
}
