mod local_track;
mod remote_track;
mod sink;
mod source;

pub use local_track::{LocalTrack, TrackSource};
pub use remote_track::RemoteTrack;
pub use sink::{SinkInfo, SinkRegistry};
pub use source::{MediaSource, StaticMedia};
