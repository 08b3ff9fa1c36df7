//! Arithmetic in the binary fields GF(2^(2^l))
//!
//! Every supported field is a subfield of the canonical 8-bit binary tower
//! field: GF(2), GF(4), GF(16) and GF(256) are the tower elements whose value
//! fits in 1, 2, 4 and 8 bits respectively. A single product table over the
//! 8-bit field therefore answers `multiply(a, b, l)` for every `l`, as long as
//! the operands are reduced to their low `2^l` bits.

use crate::coding::traits::CodingError;
use binius_field::underlier::WithUnderlier;
use binius_field::BinaryField8b;
use std::sync::OnceLock;

/// Largest supported field parameter: coefficients are at most `2^3 = 8` bits wide
pub const MAX_LOG2_COEF_BITS: u8 = 3;

/// log2 of the number of bits in a byte
pub const LOG2_BITS_PER_BYTE: u8 = 3;

/// Size in bytes of the coefficient header carried by every coded packet
pub const HEADER_CAPACITY_BYTES: usize = 32;

struct FieldTables {
    mul: Box<[[u8; 256]; 256]>,
    inv: [u8; 256],
}

static TABLES: OnceLock<FieldTables> = OnceLock::new();

fn tables() -> &'static FieldTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> FieldTables {
    let mut mul = Box::new([[0u8; 256]; 256]);
    let mut inv = [0u8; 256];

    for a in 0..=255u8 {
        let fa = BinaryField8b::from_underlier(a);
        for b in 0..=255u8 {
            let product = (fa * BinaryField8b::from_underlier(b)).to_underlier();
            mul[a as usize][b as usize] = product;
            if product == 1 {
                inv[a as usize] = b;
            }
        }
    }

    FieldTables { mul, inv }
}

/// Verify that `l` names a supported field
pub fn check_field(l: u8) -> Result<(), CodingError> {
    if l > MAX_LOG2_COEF_BITS {
        return Err(CodingError::UnsupportedField(l));
    }
    Ok(())
}

/// Width in bits of one coefficient of GF(2^(2^l))
///
/// # Panics
///
/// The shift overflows for `l` of 64 or more; callers validate `l` with
/// [`check_field`] first.
#[inline]
pub const fn coef_bits(l: u8) -> usize {
    1 << l
}

/// Number of elements of GF(2^(2^l))
///
/// # Panics
///
/// The shift overflows once `2^l` reaches the width of `usize`, i.e. `l >= 6`
/// on 64-bit targets.
#[inline]
pub const fn field_size(l: u8) -> usize {
    1 << coef_bits(l)
}

/// Mask selecting the low `2^l` bits of a byte
#[inline]
pub const fn coef_mask(l: u8) -> u8 {
    if l >= MAX_LOG2_COEF_BITS {
        return 0xff;
    }
    (1u8 << coef_bits(l)) - 1
}

/// Maximum number of source positions a packet header can address for `l`
///
/// # Panics
///
/// Same as [`coef_bits`].
#[inline]
pub const fn max_coefs(l: u8) -> usize {
    HEADER_CAPACITY_BYTES * 8 / coef_bits(l)
}

/// log2 of [`max_coefs`], the widest coding window a header supports
pub fn log2_window_size(l: u8) -> u32 {
    max_coefs(l).trailing_zeros()
}

/// Multiply two elements of GF(2^(2^l))
///
/// Operands are reduced to their low `2^l` bits, so the result is always a
/// valid element of the same field.
#[inline]
pub fn multiply(a: u8, b: u8, l: u8) -> u8 {
    let mask = coef_mask(l);
    tables().mul[(a & mask) as usize][(b & mask) as usize]
}

/// Multiplicative inverse in GF(2^(2^l))
pub fn invert(a: u8, l: u8) -> Result<u8, CodingError> {
    check_field(l)?;
    let a = a & coef_mask(l);
    if a == 0 {
        return Err(CodingError::ZeroInverse);
    }
    Ok(tables().inv[a as usize])
}

/// Field addition (and subtraction): bitwise XOR
#[inline]
pub const fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Product row for a fixed scalar, used by the vector engine to scale whole bytes
#[inline]
pub(crate) fn mul_row(scalar: u8, l: u8) -> &'static [u8; 256] {
    &tables().mul[(scalar & coef_mask(l)) as usize]
}
