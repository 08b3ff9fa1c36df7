#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod coding;
pub mod field;
pub mod storage;
pub mod utils;

pub use coding::{CodedPacket, CodingError, DecodeObserver, PacketSet};
