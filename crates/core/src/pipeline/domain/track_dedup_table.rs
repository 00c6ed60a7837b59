use std::collections::HashMap;

use super::detection_record::DetectionRecord;

/// Per-video record of which tracks have already been captured.
///
/// Insert-once: a track id that is already present keeps its first record.
/// Records are kept in insertion order, which is frame-encounter order.
#[derive(Debug, Default)]
pub struct TrackDedupTable {
    index: HashMap<u32, usize>,
    records: Vec<DetectionRecord>,
}

impl TrackDedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, track_id: u32) -> bool {
        self.index.contains_key(&track_id)
    }

    /// Stores the record unless its track id is already present. Returns
    /// whether the record was stored.
    pub fn insert(&mut self, record: DetectionRecord) -> bool {
        if self.contains(record.track_id) {
            return false;
        }
        self.index.insert(record.track_id, self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, track_id: u32) -> Option<&DetectionRecord> {
        self.index.get(&track_id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Track ids in the order they were first captured.
    pub fn track_ids(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.track_id).collect()
    }

    pub fn into_records(self) -> Vec<DetectionRecord> {
        self.records
    }
}
