use crate::coding::packet::CodedPacket;
use thiserror::Error;

/// Error type for field, vector, packet and decoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodingError {
    /// Operands belong to different fields
    #[error("Field mismatch: operand built for l={left}, other for l={right}")]
    FieldMismatch {
        /// Field parameter of the receiving operand
        left: u8,
        /// Field parameter of the other operand
        right: u8,
    },

    /// Coefficient index past the end of a vector
    #[error("Coefficient index {index} out of range for a {size}-byte vector")]
    IndexOutOfRange {
        /// Requested coefficient index
        index: usize,
        /// Vector size in bytes
        size: usize,
    },

    /// Inverse of zero requested
    #[error("Zero has no multiplicative inverse")]
    ZeroInverse,

    /// Query for a position that has not been recovered
    #[error("Source position {0} is not decoded yet")]
    Undecoded(usize),

    /// More source positions than a header can address
    #[error("{requested} source positions requested, header addresses at most {max}")]
    CapacityExceeded {
        /// Number of positions asked for
        requested: usize,
        /// Most positions the header can address
        max: usize,
    },

    /// Field parameter outside `0..=MAX_LOG2_COEF_BITS`
    #[error("Unsupported field parameter l={0}")]
    UnsupportedField(u8),

    /// Value wider than the field's coefficient width
    #[error("Invalid coefficient {0:#04x} for this field")]
    InvalidCoefficient(u8),

    /// Generator input of the wrong shape
    #[error("Invalid parameters provided")]
    InvalidParameters,
}

/// Receives one notification per source position, the moment it becomes decoded
pub trait DecodeObserver {
    /// Called synchronously from [`PacketSet::insert`](crate::coding::PacketSet::insert)
    fn notify_decoded(&mut self, position: usize);
}

impl DecodeObserver for () {
    fn notify_decoded(&mut self, _position: usize) {}
}

impl<O: DecodeObserver + ?Sized> DecodeObserver for &mut O {
    fn notify_decoded(&mut self, position: usize) {
        (**self).notify_decoded(position);
    }
}

/// Produces coded packets from a list of source packets
pub trait CombinationGenerator {
    /// Generate coded packets combining `sources`
    fn generate(&mut self, sources: &[CodedPacket]) -> Result<Vec<CodedPacket>, CodingError>;
}
