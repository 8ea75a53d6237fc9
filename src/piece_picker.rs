use std::collections::HashMap;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::core_models::entities::{NeighborView, PeerId, PieceIndex, Request};

pub fn needed_pieces(pieces: &[usize], blocks_per_piece: usize) -> Vec<PieceIndex> {
    return (0..pieces.len())
        .filter(|piece_idx| pieces[*piece_idx] < blocks_per_piece)
        .collect();
}

/// Orders the needed pieces by how many neighbors advertise them, rarest first.
///
/// The needed set is shuffled before ranking and ties keep their shuffled
/// position, so equally rare pieces are not biased by index while a fixed
/// seed still yields a fixed order. Pieces no neighbor has are left out.
pub fn rarest_first(pieces: &[usize], blocks_per_piece: usize, neighbors: &[NeighborView], rng: &mut StdRng)
                    -> Vec<PieceIndex> {
    let mut needed = needed_pieces(pieces, blocks_per_piece);
    needed.shuffle(rng);

    // vec of (shuffled position, piece_idx, availability)
    let mut ranked: Vec<(usize, PieceIndex, usize)> = needed.iter()
        .enumerate()
        .map(|(position, piece_idx)| {
            let availability = neighbors.iter().filter(|neighbor| neighbor.has_piece(*piece_idx)).count();
            (position, *piece_idx, availability)
        })
        .filter(|(_position, _piece_idx, availability)| *availability > 0)
        .collect();
    ranked.sort_by_key(|(position, _piece_idx, availability)| (*availability, *position));

    return ranked.into_iter().map(|(_position, piece_idx, _availability)| piece_idx).collect();
}

pub struct RequestPlanner {
    blocks_per_piece: usize,
    max_requests: usize,
}

impl RequestPlanner {
    pub fn init(blocks_per_piece: usize, max_requests: usize) -> Self {
        return RequestPlanner { blocks_per_piece, max_requests };
    }

    /// Walks the pieces rarest first and asks every neighbor holding a piece for
    /// its next missing block, until each neighbor has `max_requests` requests.
    pub fn plan(&self, requester: &str, pieces: &[usize], neighbors: &[NeighborView], rng: &mut StdRng)
                -> Vec<Request> {
        let ordering = rarest_first(pieces, self.blocks_per_piece, neighbors, rng);
        if ordering.is_empty() {
            return vec![];
        }
        debug!("{} rarest-first order: {:?}", requester, ordering);

        let mut sorted_neighbors: Vec<&NeighborView> = neighbors.iter().collect();
        sorted_neighbors.sort_by(|a, b| a.id.cmp(&b.id));

        let mut issued: HashMap<&PeerId, usize> = HashMap::new();
        let mut requests: Vec<Request> = Vec::new();
        for piece_idx in ordering {
            for neighbor in sorted_neighbors.iter().filter(|neighbor| neighbor.has_piece(piece_idx)) {
                let count = issued.entry(&neighbor.id).or_insert(0);
                if *count >= self.max_requests {
                    continue;
                }
                // blocks inside a piece are fetched in order
                requests.push(Request::new(requester, &neighbor.id, piece_idx, pieces[piece_idx]));
                *count += 1;
            }
        }

        debug!("{} planned {} requests", requester, requests.len());
        return requests;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::core_models::entities::NeighborView;
    use crate::mocks;
    use crate::piece_picker::{needed_pieces, rarest_first, RequestPlanner};

    #[test]
    fn test_needed_pieces() {
        assert_eq!(needed_pieces(&[4, 0, 3, 4], 4), vec![1, 2]);
        assert!(needed_pieces(&[4, 4], 4).is_empty());
    }

    #[test]
    fn test_rarest_piece_first() {
        let neighbors = mocks::neighbors(vec![("a", vec![0, 1]), ("b", vec![1, 2]), ("c", vec![0])]);
        let mut rng = StdRng::seed_from_u64(1);

        let ordering = rarest_first(&[0, 0, 0], 4, &neighbors, &mut rng);

        assert_eq!(ordering.len(), 3);
        assert_eq!(ordering[0], 2);
    }

    #[test]
    fn test_unavailable_pieces_skipped() {
        let neighbors = mocks::neighbors(vec![("a", vec![0])]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(rarest_first(&[0, 0], 4, &neighbors, &mut rng), vec![0]);
    }

    #[test]
    fn test_ties_are_shuffled_but_reproducible() {
        let neighbors = mocks::neighbors(vec![("a", (0..20).collect())]);
        let pieces = vec![0; 20];

        let first = rarest_first(&pieces, 4, &neighbors, &mut StdRng::seed_from_u64(9));
        let again = rarest_first(&pieces, 4, &neighbors, &mut StdRng::seed_from_u64(9));
        assert_eq!(first, again);

        let mut orders = (0..10)
            .map(|seed| rarest_first(&pieces, 4, &neighbors, &mut StdRng::seed_from_u64(seed)))
            .collect::<Vec<_>>();
        orders.dedup();
        assert!(orders.len() > 1);
    }

    #[test]
    fn test_plan_nothing_needed() {
        let planner = RequestPlanner::init(4, 2);
        let neighbors = mocks::neighbors(vec![("a", vec![0, 1])]);

        let requests = planner.plan("me", &[4, 4], &neighbors, &mut StdRng::seed_from_u64(1));
        assert!(requests.is_empty());
    }

    #[test]
    fn test_plan_respects_max_requests() {
        let planner = RequestPlanner::init(4, 2);
        let neighbors = mocks::neighbors(vec![("a", vec![0, 1, 2, 3, 4]), ("b", vec![3, 4])]);

        let requests = planner.plan("me", &[0; 5], &neighbors, &mut StdRng::seed_from_u64(3));

        let mut per_responder: HashMap<String, usize> = HashMap::new();
        requests.iter().for_each(|request| *per_responder.entry(request.responder.clone()).or_insert(0) += 1);
        assert_eq!(per_responder.get("a"), Some(&2));
        assert_eq!(per_responder.get("b"), Some(&2));
        assert!(requests.iter().all(|request| request.requester == "me"));
    }

    #[test]
    fn test_plan_requests_next_block_in_order() {
        let planner = RequestPlanner::init(4, 3);
        let neighbors = mocks::neighbors(vec![("a", vec![0, 1, 2])]);

        let requests = planner.plan("me", &[2, 4, 0], &neighbors, &mut StdRng::seed_from_u64(5));

        assert_eq!(requests.len(), 2);
        for request in requests {
            match request.piece {
                0 => assert_eq!(request.start_block, 2),
                2 => assert_eq!(request.start_block, 0),
                other => panic!("piece {} is complete and must not be requested", other),
            }
        }
    }

    #[test]
    fn test_plan_leaves_neighbor_views_untouched() {
        let planner = RequestPlanner::init(4, 1);
        let neighbors: Vec<NeighborView> = mocks::neighbors(vec![("a", vec![0, 1]), ("b", vec![1])]);
        let before = neighbors.clone();

        planner.plan("me", &[0, 0], &neighbors, &mut StdRng::seed_from_u64(5));
        assert_eq!(neighbors, before);
    }

    #[test]
    fn test_plan_rarest_piece_requested_first() {
        let planner = RequestPlanner::init(4, 2);
        let neighbors = mocks::neighbors(vec![("a", vec![0, 1]), ("b", vec![1, 2]), ("c", vec![0])]);

        for seed in 0..20 {
            let requests = planner.plan("me", &[0, 0, 0], &neighbors, &mut StdRng::seed_from_u64(seed));
            assert_eq!(requests[0].piece, 2);
            assert_eq!(requests[0].responder, "b");
        }
    }
}
