use std::cmp::Ordering;
use std::collections::HashMap;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::choke::allocator::UploadAllocator;
use crate::choke::models::{requesters, PeerStats, ReciprocationState};
use crate::config::{INITIAL_PRICE_DIVISOR, MIN_RATE};
use crate::core_models::entities::{NeighborView, PeerId, Request, Upload};
use crate::core_models::history::{previous_round_blocks, RoundHistory};

/// Tit-for-tat allocator that treats unchoking as an auction.
///
/// Every neighbor carries a price (what we believe we must upload to it before
/// it reciprocates) and a value (what it gives back). Each round the neighbors
/// with the best value per price are bought until the capacity runs out.
/// Prices rise while a neighbor is still being courted and decay once it has
/// reciprocated for `stable_rounds` rounds in a row.
pub struct AuctionAllocator {
    peer_id: PeerId,
    cap: f64,
    alpha: f64,
    gamma: f64,
    stable_rounds: usize,
    stats: HashMap<PeerId, PeerStats>,
}

impl AuctionAllocator {
    pub fn init(peer_id: &str, up_bw: u32, alpha: f64, gamma: f64, stable_rounds: usize) -> Self {
        return AuctionAllocator {
            peer_id: peer_id.to_string(),
            cap: up_bw as f64,
            alpha,
            gamma,
            stable_rounds,
            stats: HashMap::new(),
        };
    }

    pub fn stats(&self, peer_id: &str) -> Option<&PeerStats> {
        return self.stats.get(peer_id);
    }

    pub fn state_of(&self, peer_id: &str) -> ReciprocationState {
        return ReciprocationState::of(self.stats.get(peer_id), self.stable_rounds);
    }

    fn register(&mut self, peer: &NeighborView) {
        let initial_price = (self.cap / INITIAL_PRICE_DIVISOR).max(MIN_RATE);
        self.stats.entry(peer.id.clone())
            .or_insert_with(|| PeerStats::new(initial_price, 1.0, peer.available_pieces.len()));
    }

    // Greedy buy in decreasing value per price; ties are shuffled
    fn select(&self, peers: &[NeighborView], requesters: &[PeerId], rng: &mut StdRng) -> Vec<(PeerId, f64)> {
        let mut candidates: Vec<(&PeerId, &PeerStats)> = peers.iter()
            .filter_map(|peer| self.stats.get_key_value(&peer.id))
            .collect();
        candidates.shuffle(rng);
        candidates.sort_by(|a, b| b.1.ratio().partial_cmp(&a.1.ratio()).unwrap_or(Ordering::Equal));

        let mut chosen: Vec<(PeerId, f64)> = Vec::new();
        let mut spent = 0.0;
        for (peer_id, stats) in candidates {
            if spent + stats.price >= self.cap {
                break;
            }
            // non-requesting neighbors still use up capacity
            spent += stats.price;
            if requesters.contains(peer_id) {
                chosen.push((peer_id.clone(), stats.price));
            }
        }
        return chosen;
    }

    // Reciprocation bookkeeping and value estimates from the round that just ended
    fn observe(&mut self, peers: &[NeighborView], history: &dyn RoundHistory) {
        let round = history.current_round();
        let received = previous_round_blocks(history);
        for peer in peers {
            let Some(stats) = self.stats.get_mut(&peer.id) else {
                continue;
            };
            let available = peer.available_pieces.len();
            if round > 0 {
                match received.get(&peer.id) {
                    Some(blocks) => {
                        stats.consecutive_unchoked_rounds += 1;
                        stats.reciprocated_last_round = Some(true);
                        stats.value = (*blocks as f64).max(MIN_RATE);
                    }
                    None => {
                        stats.consecutive_unchoked_rounds = 0;
                        stats.reciprocated_last_round = Some(false);
                        stats.value = (available.abs_diff(stats.last_seen_available_count) as f64).max(MIN_RATE);
                    }
                }
            }
            stats.last_seen_available_count = available;
        }
    }

    fn reprice(&mut self, chosen: &[(PeerId, f64)]) {
        for (peer_id, _bw) in chosen {
            let Some(stats) = self.stats.get_mut(peer_id) else {
                continue;
            };
            let before = stats.price;
            match stats.reciprocated_last_round {
                None => continue,
                Some(true) if stats.consecutive_unchoked_rounds >= self.stable_rounds => {
                    stats.price = (stats.price * (1.0 - self.gamma)).max(MIN_RATE);
                }
                Some(_) => {
                    stats.price *= 1.0 + self.alpha;
                }
            }
            debug!("{} repriced {}: {:.3} -> {:.3}", self.peer_id, peer_id, before, stats.price);
        }
    }
}

impl UploadAllocator for AuctionAllocator {
    fn name(&self) -> &'static str {
        return "tyrant";
    }

    fn plan_uploads(&mut self, requests: &[Request], peers: &[NeighborView], history: &dyn RoundHistory,
                    rng: &mut StdRng) -> Vec<Upload> {
        peers.iter().for_each(|peer| self.register(peer));

        let requesters = requesters(requests);
        let chosen = if requesters.is_empty() {
            vec![]
        } else {
            self.select(peers, &requesters, rng)
        };

        self.observe(peers, history);
        self.reprice(&chosen);

        debug!("{} auction bought {:?}", self.peer_id, chosen);
        return chosen.into_iter()
            .map(|(peer_id, bw)| Upload::new(&self.peer_id, &peer_id, bw))
            .collect();
    }
}
