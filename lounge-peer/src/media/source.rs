use crate::media::LocalTrack;
use anyhow::{Result, bail};
use async_trait::async_trait;
use lounge_core::Identity;

/// Supplies local capture tracks. Permission prompts and device choice
/// live behind this seam.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire_microphone(&self, owner: &Identity) -> Result<Vec<LocalTrack>>;
}

#[derive(Clone)]
enum Supply {
    Synthetic,
    Fixed(Vec<LocalTrack>),
    Denied,
}

/// A media source without capture devices: a synthetic microphone per
/// acquisition, a fixed set of tracks, or a permanent denial.
#[derive(Clone)]
pub struct StaticMedia {
    supply: Supply,
}

impl StaticMedia {
    pub fn microphone() -> Self {
        Self {
            supply: Supply::Synthetic,
        }
    }

    pub fn with_tracks(tracks: Vec<LocalTrack>) -> Self {
        Self {
            supply: Supply::Fixed(tracks),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            supply: Supply::Denied,
        }
    }
}

impl Default for StaticMedia {
    fn default() -> Self {
        Self::microphone()
    }
}

#[async_trait]
impl MediaSource for StaticMedia {
    async fn acquire_microphone(&self, owner: &Identity) -> Result<Vec<LocalTrack>> {
        match &self.supply {
            Supply::Synthetic => Ok(vec![LocalTrack::microphone(owner.id)]),
            Supply::Fixed(tracks) => Ok(tracks.clone()),
            Supply::Denied => bail!("microphone permission denied"),
        }
    }
}
