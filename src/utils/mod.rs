//! Shared helpers

mod rand;

pub use self::rand::CodingRng;
