//! Cauchy-matrix combinations with the MDS property
//!
//! For distinct field elements `x_i` and `y_j`, the matrix `c_ij = 1 / (x_i + y_j)`
//! has every square submatrix invertible. Stacking it under the identity gives
//! a code in which any `m` of the `2m` rows recover all `m` sources.

use crate::coding::packet::CodedPacket;
use crate::coding::traits::{CodingError, CombinationGenerator};
use crate::field::{self, coef_mask, field_size, max_coefs};
use log::debug;

/// Cauchy matrix `invert(x_i ^ y_j)` over GF(2^(2^l)), one row per `x_i`
pub fn cauchy_matrix(xs: &[u8], ys: &[u8], l: u8) -> Result<Vec<Vec<u8>>, CodingError> {
    field::check_field(l)?;
    let mut seen = vec![false; field_size(l)];
    for &v in xs.iter().chain(ys) {
        if v & !coef_mask(l) != 0 || seen[v as usize] {
            return Err(CodingError::InvalidCoefficient(v));
        }
        seen[v as usize] = true;
    }

    xs.iter()
        .map(|&x| {
            ys.iter()
                .map(|&y| field::invert(field::add(x, y), l))
                .collect::<Result<Vec<u8>, _>>()
        })
        .collect()
}

/// Generator of Cauchy-matrix combinations
///
/// Built from `2m` distinct field values: the first `m` are the row
/// elements `x_i`, the last `m` the column elements `y_j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauchyGenerator {
    coefs: Vec<u8>,
}

impl CauchyGenerator {
    /// Create a generator from the `2m` Cauchy values
    pub fn new(coefs: Vec<u8>) -> Self {
        Self { coefs }
    }

    /// The Cauchy values, rows first
    pub fn coefs(&self) -> &[u8] {
        &self.coefs
    }

    fn check_sources(&self, sources: &[CodedPacket]) -> Result<u8, CodingError> {
        let m = sources.len();
        if m == 0 || self.coefs.len() != 2 * m {
            return Err(CodingError::InvalidParameters);
        }
        let l = sources[0].l();
        if let Some(other) = sources.iter().find(|p| p.l() != l) {
            return Err(CodingError::FieldMismatch {
                left: l,
                right: other.l(),
            });
        }
        let max = max_coefs(l).min(field_size(l) / 2);
        if m > max {
            return Err(CodingError::CapacityExceeded { requested: m, max });
        }
        Ok(l)
    }

    /// The `m` Cauchy combinations alone, without the systematic rows
    pub fn generate_square(&self, sources: &[CodedPacket]) -> Result<Vec<CodedPacket>, CodingError> {
        let l = self.check_sources(sources)?;
        let m = sources.len();
        let matrix = cauchy_matrix(&self.coefs[..m], &self.coefs[m..], l)?;
        let payload_len = sources.iter().map(|p| p.data().len()).max().unwrap_or(0);

        matrix
            .iter()
            .map(|row| {
                let mut coded = CodedPacket::new(l, payload_len)?;
                for (source, &c) in sources.iter().zip(row) {
                    coded.add_scaled_assign(source, c)?;
                }
                Ok(coded)
            })
            .collect()
    }
}

impl CombinationGenerator for CauchyGenerator {
    /// The `m` sources followed by the `m` Cauchy combinations
    fn generate(&mut self, sources: &[CodedPacket]) -> Result<Vec<CodedPacket>, CodingError> {
        let square = self.generate_square(sources)?;
        debug!("generated {} Cauchy combinations", 2 * sources.len());
        let mut coded = sources.to_vec();
        coded.extend(square);
        Ok(coded)
    }
}
