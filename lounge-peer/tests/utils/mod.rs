pub mod mock_signaling;
pub mod raw_peer;

pub use fake_transport::*;
pub use memory_relay::*;
pub use mock_signaling::*;
pub use raw_peer::*;
pub use test_behavior::*;
pub use wait::*;
