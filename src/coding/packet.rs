//! Coded packets: a coefficient header paired with a payload

use crate::coding::traits::CodingError;
use crate::field::{self, coef_bits, coef_mask, max_coefs, HEADER_CAPACITY_BYTES};
use crate::storage::vector;
use std::fmt;

/// A linear combination of source packets over GF(2^(2^l))
///
/// The header holds one coefficient per source position, packed at `2^l` bits
/// each; the payload is the same combination applied to the source payloads,
/// packed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedPacket {
    l: u8,
    header: [u8; HEADER_CAPACITY_BYTES],
    /// Header length with trailing zero bytes trimmed
    header_size: usize,
    payload: Vec<u8>,
    coef_pos_min: Option<usize>,
    coef_pos_max: Option<usize>,
}

impl CodedPacket {
    /// All-zero packet with a `payload_len`-byte payload
    pub fn new(l: u8, payload_len: usize) -> Result<Self, CodingError> {
        field::check_field(l)?;
        Ok(Self {
            l,
            header: [0u8; HEADER_CAPACITY_BYTES],
            header_size: 0,
            payload: vec![0u8; payload_len],
            coef_pos_min: None,
            coef_pos_max: None,
        })
    }

    /// Uncoded source packet: coefficient 1 at `position`, 0 elsewhere
    pub fn source(l: u8, position: usize, payload: Vec<u8>) -> Result<Self, CodingError> {
        field::check_field(l)?;
        if position >= max_coefs(l) {
            return Err(CodingError::CapacityExceeded {
                requested: position + 1,
                max: max_coefs(l),
            });
        }
        let mut packet = Self::new(l, 0)?;
        packet.payload = payload;
        packet.set_coef(position, 1)?;
        Ok(packet)
    }

    /// Packet from a raw packed header and a payload
    pub fn from_parts(l: u8, header: &[u8], payload: Vec<u8>) -> Result<Self, CodingError> {
        field::check_field(l)?;
        if header.len() > HEADER_CAPACITY_BYTES {
            return Err(CodingError::CapacityExceeded {
                requested: vector::coefs_in(header.len(), l),
                max: max_coefs(l),
            });
        }
        let mut packet = Self::new(l, 0)?;
        packet.header[..header.len()].copy_from_slice(header);
        packet.payload = payload;
        packet.refresh();
        Ok(packet)
    }

    /// Field parameter this packet was built for
    pub fn l(&self) -> u8 {
        self.l
    }

    /// Packed header, trailing zero bytes trimmed
    pub fn header(&self) -> &[u8] {
        &self.header[..self.header_size]
    }

    /// Payload view
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload out of the packet
    pub fn into_data(self) -> Vec<u8> {
        self.payload
    }

    /// Coefficient of source position `pos`
    pub fn coef(&self, pos: usize) -> Result<u8, CodingError> {
        vector::get(&self.header, self.l, pos)
    }

    /// Overwrite the coefficient of source position `pos`
    pub fn set_coef(&mut self, pos: usize, value: u8) -> Result<(), CodingError> {
        vector::set(&mut self.header, self.l, pos, value)?;
        self.refresh();
        Ok(())
    }

    /// Lowest source position with a nonzero coefficient
    pub fn pivot_min(&self) -> Option<usize> {
        self.coef_pos_min
    }

    /// Highest source position with a nonzero coefficient
    pub fn pivot_max(&self) -> Option<usize> {
        self.coef_pos_max
    }

    /// Whether every header coefficient is zero
    pub fn is_zero(&self) -> bool {
        self.header_size == 0
    }

    /// Nonzero header coefficients as `(position, value)`, in increasing position
    pub fn nonzero_coefs(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        let end = vector::coefs_in(self.header_size, self.l);
        (0..end).filter_map(move |pos| match self.coef(pos) {
            Ok(c) if c != 0 => Some((pos, c)),
            _ => None,
        })
    }

    /// A packet is decoded when its header is exactly one coefficient equal to 1
    pub fn is_decoded(&self) -> bool {
        match (self.coef_pos_min, self.coef_pos_max) {
            (Some(lo), Some(hi)) if lo == hi => matches!(self.coef(lo), Ok(1)),
            _ => false,
        }
    }

    fn check_same_field(&self, other: &Self) -> Result<(), CodingError> {
        if self.l != other.l {
            return Err(CodingError::FieldMismatch {
                left: self.l,
                right: other.l,
            });
        }
        Ok(())
    }

    fn check_scalar(&self, c: u8) -> Result<(), CodingError> {
        if c & !coef_mask(self.l) != 0 {
            return Err(CodingError::InvalidCoefficient(c));
        }
        Ok(())
    }

    fn refresh(&mut self) {
        let size = vector::logical_size(&self.header);
        let per_byte = 8 / coef_bits(self.l);
        let is_set = |pos: usize| matches!(vector::get(&self.header, self.l, pos), Ok(c) if c != 0);

        let min = self.header[..size]
            .iter()
            .position(|&b| b != 0)
            .and_then(|byte| (byte * per_byte..(byte + 1) * per_byte).find(|&pos| is_set(pos)));
        let max = size
            .checked_sub(1)
            .and_then(|byte| (byte * per_byte..(byte + 1) * per_byte).rev().find(|&pos| is_set(pos)));

        self.header_size = size;
        self.coef_pos_min = min;
        self.coef_pos_max = max;
    }

    /// Scale by a field element already known to fit the field
    fn scale_by(&mut self, c: u8) -> Result<(), CodingError> {
        vector::scale_in_place(c, &mut self.header, self.l)?;
        vector::scale_in_place(c, &mut self.payload, self.l)?;
        if c == 0 {
            self.refresh();
        }
        Ok(())
    }

    /// Scale header and payload in place by `c`
    pub fn scale(&mut self, c: u8) -> Result<(), CodingError> {
        self.check_scalar(c)?;
        self.scale_by(c)
    }

    /// New packet equal to `c` times this one
    pub fn scaled(&self, c: u8) -> Result<Self, CodingError> {
        let mut result = self.clone();
        result.scale(c)?;
        Ok(result)
    }

    /// `self += other`
    pub fn add_assign(&mut self, other: &Self) -> Result<(), CodingError> {
        self.add_scaled_assign(other, 1)
    }

    /// New packet equal to `self + other`
    pub fn add(&self, other: &Self) -> Result<Self, CodingError> {
        self.check_same_field(other)?;
        let mut header = [0u8; HEADER_CAPACITY_BYTES];
        vector::add(&self.header, &other.header, &mut header)?;

        let mut payload = vec![0u8; self.payload.len().max(other.payload.len())];
        vector::add(&self.payload, &other.payload, &mut payload)?;

        let mut result = Self {
            l: self.l,
            header,
            header_size: 0,
            payload,
            coef_pos_min: None,
            coef_pos_max: None,
        };
        result.refresh();
        Ok(result)
    }

    /// `self += c * other`, the row operation of Gaussian elimination
    pub fn add_scaled_assign(&mut self, other: &Self, c: u8) -> Result<(), CodingError> {
        self.check_same_field(other)?;
        self.check_scalar(c)?;
        if c == 0 {
            return Ok(());
        }
        if self.payload.len() < other.payload.len() {
            self.payload.resize(other.payload.len(), 0);
        }
        vector::add_scaled_assign(&mut self.header, &other.header, c, self.l);
        vector::add_scaled_assign(&mut self.payload, &other.payload, c, self.l);
        self.refresh();
        Ok(())
    }

    /// Normalize so that the pivot coefficient becomes 1; no-op on a zero packet
    pub fn adjust(&mut self) -> Result<(), CodingError> {
        let Some(pivot) = self.coef_pos_min else {
            return Ok(());
        };
        let inverse = field::invert(self.coef(pivot)?, self.l)?;
        self.scale_by(inverse)
    }

    /// Whether both packets are identical once normalized
    ///
    /// Payloads are compared with trailing zero bytes ignored.
    pub fn is_similar(&self, other: &Self) -> Result<bool, CodingError> {
        self.check_same_field(other)?;
        let mut a = self.clone();
        let mut b = other.clone();
        a.adjust()?;
        b.adjust()?;

        let pa = &a.payload[..vector::logical_size(&a.payload)];
        let pb = &b.payload[..vector::logical_size(&b.payload)];
        Ok(a.header == b.header && pa == pb)
    }
}

impl fmt::Display for CodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodedPacket{{l={}, coefs=[", self.l)?;
        for (i, (pos, c)) in self.nonzero_coefs().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pos}:{c:x}")?;
        }
        write!(f, "], data=")?;
        for byte in &self.payload {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "}}")
    }
}
