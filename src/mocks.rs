use crate::core_models::entities::{DownloadRecord, NeighborView, Request, Upload};
use crate::core_models::history::AgentHistory;

pub fn neighbors(layout: Vec<(&str, Vec<usize>)>) -> Vec<NeighborView> {
    return layout.into_iter()
        .map(|(id, pieces)| NeighborView::new(id, pieces))
        .collect();
}

// One request to `responder` from each requester
pub fn requests_from(requesters: &[&str], responder: &str) -> Vec<Request> {
    return requesters.iter()
        .map(|requester| Request::new(requester, responder, 0, 0))
        .collect();
}

/// History for `peer_id` with one recorded round per entry of `rounds`,
/// each entry listing (sender, blocks) received that round.
pub fn history_with_downloads(peer_id: &str, rounds: Vec<Vec<(&str, usize)>>) -> AgentHistory {
    let mut history = AgentHistory::init(peer_id);
    for round in rounds {
        let downloads = round.into_iter()
            .map(|(from, blocks)| DownloadRecord::new(from, blocks))
            .collect();
        history.record_round(downloads, vec![]);
    }
    return history;
}

pub fn uploaded_to<'a>(uploads: &'a [Upload], to: &str) -> Option<&'a Upload> {
    return uploads.iter().find(|upload| upload.to == to);
}
