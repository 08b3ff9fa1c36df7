//! Network coding implementations

/// Cauchy-matrix combination generator
pub mod cauchy;
/// Coded packet algebra
pub mod packet;
/// Incremental decoding set
pub mod packet_set;
/// Core coding traits and error types
pub mod traits;
/// Sliding-window combination generator
pub mod window;

pub use cauchy::CauchyGenerator;
pub use packet::CodedPacket;
pub use packet_set::{DecodeRecorder, PacketId, PacketSet, ReductionStats};
pub use traits::{CodingError, CombinationGenerator, DecodeObserver};
pub use window::{SlidingWindowGenerator, WindowConfig};
