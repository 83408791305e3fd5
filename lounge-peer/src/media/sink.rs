use lounge_core::{TrackId, TrackKind};
use std::collections::BTreeMap;

/// Render-side state for one inbound track.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkInfo {
    pub track_id: TrackId,
    pub kind: TrackKind,
    pub stream_id: String,
    pub volume: f32,
    pub muted: bool,
}

impl SinkInfo {
    pub fn new(track_id: TrackId, kind: TrackKind, stream_id: impl Into<String>) -> Self {
        Self {
            track_id,
            kind,
            stream_id: stream_id.into(),
            volume: 1.0,
            muted: false,
        }
    }
}

/// Sinks keyed by transport track id.
#[derive(Debug, Default, Clone)]
pub struct SinkRegistry {
    sinks: BTreeMap<TrackId, SinkInfo>,
    all_muted: bool,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sink, inheriting the registry-wide mute. Returns false if
    /// one already exists for the track.
    pub fn insert(&mut self, mut info: SinkInfo) -> bool {
        if self.sinks.contains_key(&info.track_id) {
            return false;
        }
        info.muted |= self.all_muted;
        self.sinks.insert(info.track_id.clone(), info);
        true
    }

    /// Idempotent: a second removal of the same track returns `None`.
    pub fn remove(&mut self, track_id: &TrackId) -> Option<SinkInfo> {
        self.sinks.remove(track_id)
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&SinkInfo> {
        self.sinks.get(track_id)
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.sinks.contains_key(track_id)
    }

    /// Returns the new muted state, or `None` for an unknown track.
    pub fn toggle_mute(&mut self, track_id: &TrackId) -> Option<bool> {
        let sink = self.sinks.get_mut(track_id)?;
        sink.muted = !sink.muted;
        Some(sink.muted)
    }

    pub fn set_volume(&mut self, track_id: &TrackId, volume: f32) -> Option<f32> {
        let sink = self.sinks.get_mut(track_id)?;
        sink.volume = volume.clamp(0.0, 1.0);
        Some(sink.volume)
    }

    pub fn set_all_muted(&mut self, muted: bool) {
        self.all_muted = muted;
        for sink in self.sinks.values_mut() {
            sink.muted = muted;
        }
    }

    pub fn all_muted(&self) -> bool {
        self.all_muted
    }

    pub fn drain(&mut self) -> Vec<SinkInfo> {
        std::mem::take(&mut self.sinks).into_values().collect()
    }

    pub fn snapshot(&self) -> Vec<SinkInfo> {
        self.sinks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
