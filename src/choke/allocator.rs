use rand::rngs::StdRng;
use crate::choke::auction::AuctionAllocator;
use crate::choke::prop_share::ProportionalShareAllocator;
use crate::choke::reciprocity::ReciprocityAllocator;
use crate::config::Strategy;
use crate::core_models::entities::{NeighborView, Request, Upload};
use crate::core_models::history::RoundHistory;

/// Splits this peer's upload capacity among the peers that requested from it.
///
/// Implementations must return uploads with distinct targets whose bandwidth
/// sums to at most the peer's capacity, and nothing when no request arrived.
pub trait UploadAllocator {
    fn name(&self) -> &'static str;
    fn plan_uploads(&mut self, requests: &[Request], peers: &[NeighborView], history: &dyn RoundHistory,
                    rng: &mut StdRng) -> Vec<Upload>;
}

pub fn allocator_for(peer_id: &str, up_bw: u32, strategy: Strategy) -> Box<dyn UploadAllocator> {
    return match strategy {
        Strategy::ProportionalShare { unchoke_portion } => {
            Box::new(ProportionalShareAllocator::init(peer_id, up_bw, unchoke_portion))
        }
        Strategy::Reciprocity { unchoke_slots } => {
            Box::new(ReciprocityAllocator::init(peer_id, up_bw, unchoke_slots))
        }
        Strategy::Auction { alpha, gamma, stable_rounds } => {
            Box::new(AuctionAllocator::init(peer_id, up_bw, alpha, gamma, stable_rounds))
        }
    };
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::choke::allocator::allocator_for;
    use crate::config::Strategy;
    use crate::core_models::entities::total_bandwidth;
    use crate::mocks;

    #[test]
    fn test_allocator_for_every_strategy() {
        for name in ["propshare", "std", "tyrant"] {
            let strategy = Strategy::from_name(name).unwrap();
            let allocator = allocator_for("me", 40, strategy);
            assert_eq!(allocator.name(), name);
        }
    }

    #[test]
    fn test_no_requests_no_uploads() {
        let peers = mocks::neighbors(vec![("a", vec![0]), ("b", vec![1])]);
        let history = mocks::history_with_downloads("me", vec![vec![("a", 3)], vec![("b", 1)]]);

        for name in ["propshare", "std", "tyrant"] {
            let mut allocator = allocator_for("me", 40, Strategy::from_name(name).unwrap());
            let uploads = allocator.plan_uploads(&[], &peers, &history, &mut StdRng::seed_from_u64(2));
            assert!(uploads.is_empty());
        }
    }

    #[test]
    fn test_capacity_respected_by_every_strategy() {
        let peers = mocks::neighbors(vec![("a", vec![0]), ("b", vec![1]), ("c", vec![2]), ("d", vec![3]), ("e", vec![])]);
        let requests = mocks::requests_from(&["a", "b", "c", "d", "e"], "me");
        let rounds: Vec<Vec<(&str, usize)>> = vec![vec![], vec![("a", 3), ("b", 1)], vec![("c", 7)], vec![("a", 1), ("d", 2)]];

        for name in ["propshare", "std", "tyrant"] {
            let mut allocator = allocator_for("me", 37, Strategy::from_name(name).unwrap());
            let mut rng = StdRng::seed_from_u64(11);
            for recorded in 0..=rounds.len() {
                let history = mocks::history_with_downloads("me", rounds[..recorded].to_vec());
                let uploads = allocator.plan_uploads(&requests, &peers, &history, &mut rng);
                assert!(total_bandwidth(&uploads) <= 37.0, "{} overshot with {:?}", name, uploads);
                assert!(uploads.iter().all(|upload| upload.bandwidth >= 0.0 && upload.from == "me"));
            }
        }
    }
}
