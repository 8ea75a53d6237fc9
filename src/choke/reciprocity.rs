use std::cmp::Ordering;
use log::debug;
use rand::prelude::IteratorRandom;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::choke::allocator::UploadAllocator;
use crate::choke::models::{even_split, requesters};
use crate::core_models::entities::{NeighborView, PeerId, Request, Upload};
use crate::core_models::history::RoundHistory;

pub struct ReciprocityAllocator {
    peer_id: PeerId,
    up_bw: u32,
    unchoke_slots: usize,
    last_optimistic: Option<PeerId>,
}

impl ReciprocityAllocator {
    pub fn init(peer_id: &str, up_bw: u32, unchoke_slots: usize) -> Self {
        return ReciprocityAllocator {
            peer_id: peer_id.to_string(),
            up_bw,
            unchoke_slots,
            last_optimistic: None,
        };
    }

    pub fn last_optimistic(&self) -> Option<&PeerId> {
        return self.last_optimistic.as_ref();
    }

    fn reciprocity_slots(&self) -> usize {
        return self.unchoke_slots.saturating_sub(1).max(1);
    }

    // blocks we sent the neighbor last round, scaled by its observed upload rate when known
    fn download_speed(&self, peer_id: &str, round: usize, history: &dyn RoundHistory) -> f64 {
        let delivered: f64 = history.uploads(peer_id, round - 1).iter().map(|upload| upload.bandwidth).sum();
        return match history.upload_rate(peer_id) {
            Some(rate) if rate > 0.0 => delivered / rate,
            _ => delivered,
        };
    }

    fn choose(&mut self, peers: &[NeighborView], round: usize, history: &dyn RoundHistory, rng: &mut StdRng)
              -> Vec<PeerId> {
        let mut ranked: Vec<(f64, &PeerId)> = peers.iter()
            .map(|peer| (self.download_speed(&peer.id, round, history), &peer.id))
            .collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(b.1)));

        let top = self.reciprocity_slots().min(peers.len());
        let mut chosen: Vec<PeerId> = ranked.iter().take(top).map(|(_speed, peer_id)| (*peer_id).clone()).collect();

        self.last_optimistic = peers.iter().choose(rng).map(|peer| peer.id.clone());
        if let Some(optimistic) = &self.last_optimistic {
            if !chosen.contains(optimistic) {
                chosen.push(optimistic.clone());
            }
        }
        return chosen;
    }
}

impl UploadAllocator for ReciprocityAllocator {
    fn name(&self) -> &'static str {
        return "std";
    }

    fn plan_uploads(&mut self, requests: &[Request], peers: &[NeighborView], history: &dyn RoundHistory,
                    rng: &mut StdRng) -> Vec<Upload> {
        let requesters = requesters(requests);
        if requesters.is_empty() {
            return vec![];
        }

        let round = history.current_round();
        let chosen: Vec<PeerId> = if round == 0 {
            requesters.choose_multiple(rng, self.reciprocity_slots()).cloned().collect()
        } else {
            self.choose(peers, round, history, rng)
                .into_iter()
                .filter(|peer_id| requesters.contains(peer_id))
                .collect()
        };

        let uploads: Vec<Upload> = chosen.iter()
            .zip(even_split(self.up_bw, chosen.len()))
            .map(|(peer_id, bw)| Upload::new(&self.peer_id, peer_id, bw as f64))
            .collect();
        debug!("{} unchoked {:?} (optimistic {:?})", self.peer_id, chosen, self.last_optimistic);
        return uploads;
    }
}
