use std::collections::HashMap;
use mockall::automock;
use crate::core_models::entities::{DownloadRecord, PeerId, Upload};

/// Read-only view over the rounds a peer has already lived through.
///
/// Round indices start at 0; `current_round()` is the round being planned, so
/// `downloads(current_round() - 1)` is the latest complete round when one exists.
#[automock]
pub trait RoundHistory {
    fn current_round(&self) -> usize;
    /// Blocks this peer received during `round`, one record per delivery.
    fn downloads(&self, round: usize) -> Vec<DownloadRecord>;
    /// Uploads this peer made to `peer_id` during `round`.
    fn uploads(&self, peer_id: &str, round: usize) -> Vec<Upload>;
    /// Observed upload capacity of `peer_id`, when the harness knows it.
    fn upload_rate(&self, peer_id: &str) -> Option<f64>;
}

// Append-only round log kept by the harness for one peer
#[derive(Clone, Debug, Default)]
pub struct AgentHistory {
    pub peer_id: PeerId,
    downloads: Vec<Vec<DownloadRecord>>,
    uploads: Vec<Vec<Upload>>,
    upload_rates: HashMap<PeerId, f64>,
}

impl AgentHistory {
    pub fn init(peer_id: &str) -> Self {
        return AgentHistory {
            peer_id: peer_id.to_string(),
            downloads: Vec::new(),
            uploads: Vec::new(),
            upload_rates: HashMap::new(),
        };
    }

    pub fn record_round(&mut self, downloads: Vec<DownloadRecord>, uploads: Vec<Upload>) {
        self.downloads.push(downloads);
        self.uploads.push(uploads);
    }

    pub fn set_upload_rate(&mut self, peer_id: &str, rate: f64) {
        self.upload_rates.insert(peer_id.to_string(), rate);
    }

    // every upload this peer made during `round`
    pub fn uploads_in(&self, round: usize) -> &[Upload] {
        return self.uploads.get(round).map(|uploads| uploads.as_slice()).unwrap_or(&[]);
    }

    pub fn total_downloaded(&self) -> usize {
        return self.downloads.iter().flatten().map(|record| record.blocks).sum();
    }
}

impl RoundHistory for AgentHistory {
    fn current_round(&self) -> usize {
        return self.downloads.len();
    }

    fn downloads(&self, round: usize) -> Vec<DownloadRecord> {
        return self.downloads.get(round).cloned().unwrap_or_default();
    }

    fn uploads(&self, peer_id: &str, round: usize) -> Vec<Upload> {
        return self.uploads.get(round)
            .map(|uploads| uploads.iter().filter(|upload| upload.to == peer_id).cloned().collect())
            .unwrap_or_default();
    }

    fn upload_rate(&self, peer_id: &str) -> Option<f64> {
        return self.upload_rates.get(peer_id).copied();
    }
}

/// Downloads of the round preceding the current one, summed per sender.
/// Empty at round 0.
pub fn previous_round_blocks(history: &dyn RoundHistory) -> HashMap<PeerId, usize> {
    let round = history.current_round();
    let mut blocks: HashMap<PeerId, usize> = HashMap::new();
    if round == 0 {
        return blocks;
    }
    for record in history.downloads(round - 1) {
        *blocks.entry(record.from).or_insert(0) += record.blocks;
    }
    return blocks;
}
