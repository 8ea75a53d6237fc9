use std::collections::HashSet;
use crate::core_models::entities::{PeerId, Request};

/// What the auction allocator believes about one neighbor.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerStats {
    // u_j: bandwidth we expect to offer before the neighbor reciprocates
    pub price: f64,
    // d_j: bandwidth we expect back from the neighbor
    pub value: f64,
    pub consecutive_unchoked_rounds: usize,
    pub last_seen_available_count: usize,
    // None until a full round has been observed
    pub reciprocated_last_round: Option<bool>,
}

impl PeerStats {
    pub fn new(price: f64, value: f64, available_count: usize) -> Self {
        return PeerStats {
            price,
            value,
            consecutive_unchoked_rounds: 0,
            last_seen_available_count: available_count,
            reciprocated_last_round: None,
        };
    }

    pub fn ratio(&self) -> f64 {
        return self.value / self.price;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReciprocationState {
    Unknown,
    Probing,
    Stable,
    Choked,
}

impl ReciprocationState {
    pub fn of(stats: Option<&PeerStats>, stable_rounds: usize) -> Self {
        return match stats.and_then(|stats| stats.reciprocated_last_round.map(|r| (r, stats))) {
            None => ReciprocationState::Unknown,
            Some((false, _)) => ReciprocationState::Choked,
            Some((true, stats)) if stats.consecutive_unchoked_rounds >= stable_rounds => ReciprocationState::Stable,
            Some((true, _)) => ReciprocationState::Probing,
        };
    }
}

/// Splits `n` units over `k` parts; the first `n % k` parts get one extra unit.
pub fn even_split(n: u32, k: usize) -> Vec<u32> {
    if k == 0 {
        return vec![];
    }
    let k32 = k as u32;
    return (0..k32)
        .map(|idx| n / k32 + if idx < n % k32 { 1 } else { 0 })
        .collect();
}

// Distinct requesters in the order their first request arrived
pub fn requesters(requests: &[Request]) -> Vec<PeerId> {
    let mut seen: HashSet<&str> = HashSet::new();
    return requests.iter()
        .filter(|request| seen.insert(request.requester.as_str()))
        .map(|request| request.requester.clone())
        .collect();
}

#[cfg(test)]
mod tests {
    use crate::choke::models::{even_split, requesters, PeerStats, ReciprocationState};
    use crate::core_models::entities::Request;

    #[test]
    fn test_even_split() {
        assert_eq!(even_split(10, 3), vec![4, 3, 3]);
        assert_eq!(even_split(2, 4), vec![1, 1, 0, 0]);
        assert!(even_split(10, 0).is_empty());
        assert_eq!(even_split(10, 3).iter().sum::<u32>(), 10);
    }

    #[test]
    fn test_requesters_deduplicated() {
        let requests = vec![
            Request::new("b", "me", 0, 0),
            Request::new("a", "me", 1, 0),
            Request::new("b", "me", 2, 1),
        ];
        assert_eq!(requesters(&requests), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_reciprocation_state() {
        let mut stats = PeerStats::new(10.0, 1.0, 0);
        assert_eq!(ReciprocationState::of(None, 3), ReciprocationState::Unknown);
        assert_eq!(ReciprocationState::of(Some(&stats), 3), ReciprocationState::Unknown);

        stats.reciprocated_last_round = Some(false);
        assert_eq!(ReciprocationState::of(Some(&stats), 3), ReciprocationState::Choked);

        stats.reciprocated_last_round = Some(true);
        stats.consecutive_unchoked_rounds = 2;
        assert_eq!(ReciprocationState::of(Some(&stats), 3), ReciprocationState::Probing);

        stats.consecutive_unchoked_rounds = 3;
        assert_eq!(ReciprocationState::of(Some(&stats), 3), ReciprocationState::Stable);
    }
}
