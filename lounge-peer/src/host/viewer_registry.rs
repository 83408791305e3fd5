use crate::media::{LocalTrack, SinkInfo, SinkRegistry};
use crate::session::{ConnectionState, PeerSession};
use crate::transport::SessionKey;
use lounge_core::{Identity, ParticipantId};
use std::collections::BTreeMap;

/// Everything the host keeps for one viewer.
pub struct ViewerEntry {
    pub identity: Identity,
    /// Key of the transport behind `session`; events under any other key
    /// belong to a replaced session.
    pub key: SessionKey,
    pub session: PeerSession,
    /// Render sinks for the viewer's inbound tracks.
    pub sinks: SinkRegistry,
    /// Mirrors of the viewer's inbound tracks, attached to the other sessions.
    pub relayed: Vec<LocalTrack>,
    pub joined: bool,
}

impl ViewerEntry {
    pub fn new(key: SessionKey, session: PeerSession, all_muted: bool) -> Self {
        let mut sinks = SinkRegistry::new();
        sinks.set_all_muted(all_muted);

        Self {
            identity: session.viewer().clone(),
            key,
            session,
            sinks,
            relayed: Vec::new(),
            joined: false,
        }
    }
}

/// Read-only view of a viewer for callers outside the host actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerInfo {
    pub identity: Identity,
    pub state: ConnectionState,
    pub joined: bool,
    pub sinks: Vec<SinkInfo>,
}

/// The host's one authoritative `viewer id -> entry` map.
#[derive(Default)]
pub struct ViewerRegistry {
    entries: BTreeMap<ParticipantId, ViewerEntry>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry it replaced, if any.
    pub fn insert(&mut self, entry: ViewerEntry) -> Option<ViewerEntry> {
        self.entries.insert(entry.identity.id, entry)
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<ViewerEntry> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&ViewerEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Option<&mut ViewerEntry> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains_key(id)
    }

    /// Snapshot of the current ids. Iterate over this while mutating.
    pub fn ids(&self) -> Vec<ParticipantId> {
        self.entries.keys().copied().collect()
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.entries.values().map(|e| e.identity.clone()).collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &ViewerEntry> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ViewerEntry> {
        self.entries.values_mut()
    }

    pub fn info(&self) -> Vec<ViewerInfo> {
        self.entries
            .values()
            .map(|e| ViewerInfo {
                identity: e.identity.clone(),
                state: e.session.state(),
                joined: e.joined,
                sinks: e.sinks.snapshot(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
