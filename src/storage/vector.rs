//! Packed coefficient vectors
//!
//! A coefficient vector stores elements of GF(2^(2^l)) at `w = 2^l` bits each.
//! Coefficient `i` lives in byte `i / (8 / w)` at bit offset `(i % (8 / w)) * w`,
//! so the lowest-indexed coefficient of a byte occupies its least significant
//! bits. Every packed access goes through [`SlotAddress`].

use crate::coding::traits::CodingError;
use crate::field::{self, coef_bits, coef_mask, LOG2_BITS_PER_BYTE};

/// Location of one coefficient slot inside a packed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddress {
    /// Byte holding the slot
    pub byte: usize,
    /// Bit offset of the slot inside that byte
    pub shift: u32,
    /// Mask of the slot bits, already shifted into place
    pub mask: u8,
}

impl SlotAddress {
    /// Address of coefficient `index` in a buffer of `size` bytes
    pub fn locate(size: usize, l: u8, index: usize) -> Result<Self, CodingError> {
        field::check_field(l)?;
        if index >= coefs_in(size, l) {
            return Err(CodingError::IndexOutOfRange { index, size });
        }
        let per_byte_log2 = LOG2_BITS_PER_BYTE - l;
        let in_byte = index & ((1 << per_byte_log2) - 1);
        let shift = (in_byte << l) as u32;
        Ok(Self {
            byte: index >> per_byte_log2,
            shift,
            mask: coef_mask(l) << shift,
        })
    }

    #[inline]
    fn read(&self, buf: &[u8]) -> u8 {
        (buf[self.byte] & self.mask) >> self.shift
    }

    #[inline]
    fn write(&self, buf: &mut [u8], value: u8) {
        buf[self.byte] = (buf[self.byte] & !self.mask) | ((value << self.shift) & self.mask);
    }
}

/// Number of coefficient slots in a buffer of `size` bytes
#[inline]
pub fn coefs_in(size: usize, l: u8) -> usize {
    (size * 8) >> l
}

/// Read coefficient `index`
pub fn get(buf: &[u8], l: u8, index: usize) -> Result<u8, CodingError> {
    Ok(SlotAddress::locate(buf.len(), l, index)?.read(buf))
}

/// Overwrite coefficient `index`; every other bit of `buf` is left untouched
pub fn set(buf: &mut [u8], l: u8, index: usize, value: u8) -> Result<(), CodingError> {
    let addr = SlotAddress::locate(buf.len(), l, index)?;
    if value & !coef_mask(l) != 0 {
        return Err(CodingError::InvalidCoefficient(value));
    }
    addr.write(buf, value);
    Ok(())
}

/// Scale every packed coefficient of one byte
#[inline]
fn scale_byte(row: &[u8; 256], byte: u8, l: u8) -> u8 {
    if l == field::MAX_LOG2_COEF_BITS {
        return row[byte as usize];
    }
    let w = coef_bits(l);
    let mask = coef_mask(l);
    let mut out = 0u8;
    let mut shift = 0;
    while shift < 8 {
        let coef = (byte >> shift) & mask;
        out |= row[coef as usize] << shift;
        shift += w;
    }
    out
}

/// `dst[i] = multiply(scalar, src[i])` for every slot of `src`
pub fn scalar_multiply(scalar: u8, src: &[u8], l: u8, dst: &mut [u8]) -> Result<(), CodingError> {
    field::check_field(l)?;
    if dst.len() < src.len() {
        return Err(CodingError::IndexOutOfRange {
            index: coefs_in(src.len(), l),
            size: dst.len(),
        });
    }
    let row = field::mul_row(scalar, l);
    for (d, s) in dst.iter_mut().zip(src) {
        *d = scale_byte(row, *s, l);
    }
    Ok(())
}

/// In-place variant of [`scalar_multiply`]
pub fn scale_in_place(scalar: u8, buf: &mut [u8], l: u8) -> Result<(), CodingError> {
    field::check_field(l)?;
    if scalar & coef_mask(l) == 1 {
        return Ok(());
    }
    let row = field::mul_row(scalar, l);
    for byte in buf.iter_mut() {
        *byte = scale_byte(row, *byte, l);
    }
    Ok(())
}

/// Length of `buf` once trailing zero bytes are dropped
pub fn logical_size(buf: &[u8]) -> usize {
    buf.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1)
}

/// Coefficient-wise field addition of `a` and `b` into `out`
///
/// Addition is XOR whatever the coefficient width. The shorter operand is
/// treated as zero-extended. Returns the logical size of the result, with
/// trailing zero bytes trimmed; bytes of `out` beyond `max(a.len(), b.len())`
/// are not written.
pub fn add(a: &[u8], b: &[u8], out: &mut [u8]) -> Result<usize, CodingError> {
    let size = a.len().max(b.len());
    if out.len() < size {
        return Err(CodingError::IndexOutOfRange {
            index: size,
            size: out.len(),
        });
    }
    for (i, o) in out[..size].iter_mut().enumerate() {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        *o = x ^ y;
    }
    Ok(logical_size(&out[..size]))
}

/// `acc += scalar * other`, zero-extending `other` up to `acc.len()`
///
/// `acc` must be at least as long as `other`.
pub(crate) fn add_scaled_assign(acc: &mut [u8], other: &[u8], scalar: u8, l: u8) {
    let row = field::mul_row(scalar, l);
    for (a, o) in acc.iter_mut().zip(other) {
        *a ^= scale_byte(row, *o, l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{field_size, multiply, MAX_LOG2_COEF_BITS};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn all_fields() -> impl Iterator<Item = u8> {
        0..=MAX_LOG2_COEF_BITS
    }

    fn bit_diff(a: &[u8], b: &[u8]) -> u32 {
        a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
    }

    fn byte_diff(a: &[u8], b: &[u8]) -> usize {
        a.iter().zip(b).filter(|(x, y)| x != y).count()
    }

    #[test]
    fn test_slot_address_layout() {
        // l = 0: coefficient 9 is bit 1 of byte 1
        let addr = SlotAddress::locate(4, 0, 9).unwrap();
        assert_eq!(addr, SlotAddress { byte: 1, shift: 1, mask: 0b10 });

        // l = 2: coefficient 3 is the high nibble of byte 1
        let addr = SlotAddress::locate(4, 2, 3).unwrap();
        assert_eq!(addr, SlotAddress { byte: 1, shift: 4, mask: 0xf0 });

        let addr = SlotAddress::locate(4, 3, 2).unwrap();
        assert_eq!(addr, SlotAddress { byte: 2, shift: 0, mask: 0xff });
    }

    #[test]
    fn test_slot_address_out_of_range() {
        assert_eq!(
            SlotAddress::locate(2, 0, 16),
            Err(CodingError::IndexOutOfRange { index: 16, size: 2 })
        );
        assert!(SlotAddress::locate(2, 3, 1).is_ok());
        assert!(SlotAddress::locate(2, 3, 2).is_err());
        assert!(SlotAddress::locate(0, 1, 0).is_err());
        assert_eq!(
            SlotAddress::locate(8, 4, 0),
            Err(CodingError::UnsupportedField(4))
        );
    }

    #[test]
    fn test_get_set_round_trip_exhaustive() {
        let size = 256;
        for l in all_fields() {
            let full = coef_mask(l);
            for (coef, fill) in [(full, 0x00u8), (0, 0xff)] {
                let reference = vec![fill; size];
                for i in 0..coefs_in(size, l) {
                    let mut v = reference.clone();
                    set(&mut v, l, i, coef).unwrap();
                    assert_eq!(get(&v, l, i).unwrap(), coef);
                    assert_eq!(byte_diff(&v, &reference), 1);
                    assert_eq!(bit_diff(&v, &reference), coef_bits(l) as u32);
                }
            }
        }
    }

    #[test]
    fn test_set_rejects_wide_values() {
        let mut v = [0u8; 2];
        assert_eq!(set(&mut v, 1, 0, 4), Err(CodingError::InvalidCoefficient(4)));
        assert_eq!(v, [0, 0]);
    }

    #[test]
    fn test_get_out_of_range() {
        let v = [0u8; 3];
        assert!(get(&v, 0, 23).is_ok());
        assert!(get(&v, 0, 24).is_err());
        assert!(get(&v, 3, 3).is_err());
    }

    #[test]
    fn test_scalar_multiply_consistency() {
        let src: Vec<u8> = (0..=255u8).collect();
        let mut dst = vec![0u8; src.len()];
        for l in all_fields() {
            for scalar in (0..field_size(l)).map(|s| s as u8) {
                scalar_multiply(scalar, &src, l, &mut dst).unwrap();
                for i in 0..coefs_in(src.len(), l) {
                    let before = get(&src, l, i).unwrap();
                    let after = get(&dst, l, i).unwrap();
                    assert_eq!(after, multiply(scalar, before, l));
                }
            }
        }
        assert!(src.iter().enumerate().all(|(i, &b)| b as usize == i));
    }

    #[test]
    fn test_scale_in_place_matches_copy() {
        let src: Vec<u8> = (0..=255u8).rev().collect();
        for l in all_fields() {
            for scalar in (0..field_size(l)).map(|s| s as u8) {
                let mut expected = vec![0u8; src.len()];
                scalar_multiply(scalar, &src, l, &mut expected).unwrap();
                let mut buf = src.clone();
                scale_in_place(scalar, &mut buf, l).unwrap();
                assert_eq!(buf, expected);
            }
        }
    }

    #[test]
    fn test_scalar_multiply_short_destination() {
        let mut dst = [0u8; 1];
        assert!(scalar_multiply(3, &[1, 2], 3, &mut dst).is_err());
    }

    #[test]
    fn test_scale_in_place_unsupported_field() {
        let mut buf = [0x03, 0x11];
        assert_eq!(
            scale_in_place(2, &mut buf, 4),
            Err(CodingError::UnsupportedField(4))
        );
        assert_eq!(buf, [0x03, 0x11]);
        assert_eq!(
            scale_in_place(2, &mut [1], 70),
            Err(CodingError::UnsupportedField(70))
        );
    }

    fn set_vector(values: &BTreeSet<usize>, size: usize) -> (Vec<u8>, usize) {
        let mut v = vec![0u8; size];
        for &i in values {
            set(&mut v, 0, i, 1).unwrap();
        }
        let logical = values.iter().next_back().map_or(0, |m| m / 8 + 1);
        (v, logical)
    }

    fn vector_set(v: &[u8]) -> BTreeSet<usize> {
        (0..coefs_in(v.len(), 0))
            .filter(|&i| get(v, 0, i).unwrap() == 1)
            .collect()
    }

    #[test]
    fn test_add_symmetric_difference() {
        let mut sets: Vec<BTreeSet<usize>> = vec![
            BTreeSet::new(),
            (0..256).collect(),
            (0..256).step_by(2).collect(),
            (1..256).step_by(2).collect(),
            (0..256).step_by(4).collect(),
        ];
        sets.extend((0..32).map(|i| BTreeSet::from([i])));
        for i in 0..8 {
            for j in 0..8 {
                sets.push(BTreeSet::from([7 * i, 9 * j]));
            }
        }
        let size = 32;

        for s1 in &sets {
            for s2 in &sets {
                let (v1, n1) = set_vector(s1, size);
                let (v2, n2) = set_vector(s2, size);
                let mut out = vec![0u8; size];
                let n = add(&v1[..n1], &v2[..n2], &mut out).unwrap();
                let expected: BTreeSet<usize> = s1.symmetric_difference(s2).copied().collect();
                assert_eq!(vector_set(&out[..n]), expected);
                assert_eq!(n, logical_size(&out[..n1.max(n2)]));
                assert!(n <= n1.max(n2));
            }
        }
    }

    #[test]
    fn test_add_keeps_larger_size() {
        let mut out = [0u8; 4];
        assert_eq!(add(&[1, 2], &[0, 0, 3], &mut out).unwrap(), 3);
        assert_eq!(out[..3], [1, 2, 3]);
        assert_eq!(add(&[1, 2], &[1, 2], &mut out).unwrap(), 0);
        assert!(add(&[1; 5], &[], &mut out).is_err());
    }

    #[test]
    fn test_logical_size() {
        assert_eq!(logical_size(&[]), 0);
        assert_eq!(logical_size(&[0, 0]), 0);
        assert_eq!(logical_size(&[1, 0, 2, 0, 0]), 3);
    }

    proptest! {
        #[test]
        fn prop_set_touches_only_one_slot(
            l in 0u8..=MAX_LOG2_COEF_BITS,
            buf in proptest::collection::vec(any::<u8>(), 1..64),
            index_seed in any::<usize>(),
            value_seed in any::<u8>(),
        ) {
            let index = index_seed % coefs_in(buf.len(), l);
            let value = value_seed & coef_mask(l);
            let mut v = buf.clone();
            set(&mut v, l, index, value).unwrap();
            prop_assert_eq!(get(&v, l, index).unwrap(), value);
            for i in 0..coefs_in(buf.len(), l) {
                if i != index {
                    prop_assert_eq!(get(&v, l, i).unwrap(), get(&buf, l, i).unwrap());
                }
            }
        }

        #[test]
        fn prop_add_scaled_matches_scalar_ops(
            l in 0u8..=MAX_LOG2_COEF_BITS,
            a in proptest::collection::vec(any::<u8>(), 0..32),
            b in proptest::collection::vec(any::<u8>(), 0..32),
            scalar_seed in any::<u8>(),
        ) {
            let scalar = scalar_seed & coef_mask(l);
            let size = a.len().max(b.len());
            let mut acc = a.clone();
            acc.resize(size, 0);
            add_scaled_assign(&mut acc, &b, scalar, l);

            let mut scaled = vec![0u8; b.len()];
            scalar_multiply(scalar, &b, l, &mut scaled).unwrap();
            let mut expected = vec![0u8; size];
            add(&a, &scaled, &mut expected).unwrap();
            prop_assert_eq!(acc, expected);
        }
    }
}
