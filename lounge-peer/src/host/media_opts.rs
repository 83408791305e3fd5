use crate::media::LocalTrack;

/// The host's local media switches.
#[derive(Debug, Clone, Default)]
pub struct MediaOpts {
    pub screen: bool,
    pub voice: bool,
    pub all_remote_muted: bool,
    pub local_muted: bool,
    pub screen_tracks: Vec<LocalTrack>,
    pub voice_tracks: Vec<LocalTrack>,
}

impl MediaOpts {
    pub fn with_voice(voice_tracks: Vec<LocalTrack>) -> Self {
        Self {
            voice: !voice_tracks.is_empty(),
            voice_tracks,
            ..Default::default()
        }
    }

    /// Every track a fresh session starts with.
    pub fn outbound_tracks(&self) -> Vec<LocalTrack> {
        self.voice_tracks
            .iter()
            .chain(self.screen_tracks.iter())
            .cloned()
            .collect()
    }
}
