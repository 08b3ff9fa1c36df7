//! Incremental decoding set
//!
//! A [`PacketSet`] keeps the coded packets received so far as a basis in
//! reduced row-echelon form: every row is normalized so its pivot coefficient
//! is 1, and no other row has a nonzero coefficient in that pivot column. Each
//! insertion runs one step of online Gauss-Jordan elimination, so a source
//! position is recovered the moment its row reduces to a single coefficient.

use crate::coding::packet::CodedPacket;
use crate::coding::traits::{CodingError, DecodeObserver};
use crate::field;
use crate::utils::CodingRng;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fmt;

/// Slot of a basis row inside a [`PacketSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketId(pub usize);

/// Counters describing what a [`PacketSet`] did with its input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReductionStats {
    /// Packets handed to [`PacketSet::insert`]
    pub received: usize,
    /// Rows currently satisfying the decoded predicate
    pub decoded: usize,
    /// Packets discarded as linearly dependent on the basis
    pub redundant: usize,
}

/// Observer keeping every decoded position, in notification order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeRecorder {
    /// Decoded source positions
    pub decoded: Vec<usize>,
}

impl DecodeObserver for DecodeRecorder {
    fn notify_decoded(&mut self, position: usize) {
        self.decoded.push(position);
    }
}

struct BasisRow {
    packet: CodedPacket,
    position: usize,
    decoded: bool,
}

/// Reduced basis of coded packets with online decoding
pub struct PacketSet<O: DecodeObserver = ()> {
    l: u8,
    /// Basis rows indexed by [`PacketId`]; slots are never released
    rows: Vec<BasisRow>,
    /// Pivot position to slot, iterated in increasing pivot order
    pos_to_slot: BTreeMap<usize, PacketId>,
    stats: ReductionStats,
    observer: O,
}

impl PacketSet<()> {
    /// Empty set for GF(2^(2^l)) without observer
    pub fn new(l: u8) -> Result<Self, CodingError> {
        Self::with_observer(l, ())
    }
}

impl<O: DecodeObserver> PacketSet<O> {
    /// Empty set for GF(2^(2^l)) reporting decoded positions to `observer`
    pub fn with_observer(l: u8, observer: O) -> Result<Self, CodingError> {
        field::check_field(l)?;
        Ok(Self {
            l,
            rows: Vec::new(),
            pos_to_slot: BTreeMap::new(),
            stats: ReductionStats::default(),
            observer,
        })
    }

    /// Field parameter of the set
    pub fn l(&self) -> u8 {
        self.l
    }

    /// Number of basis rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the basis is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rank of the received packets; equal to [`len`](Self::len)
    pub fn rank(&self) -> usize {
        self.rows.len()
    }

    /// Reduction counters
    pub fn stats(&self) -> &ReductionStats {
        &self.stats
    }

    /// The decode observer
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Mutable access to the decode observer
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the set, returning the observer
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Eliminate column `pos` of `target` using `row`, whose coefficient at `pos` is nonzero
    fn eliminate(
        target: &mut CodedPacket,
        row: &CodedPacket,
        pos: usize,
        l: u8,
    ) -> Result<(), CodingError> {
        let c = target.coef(pos)?;
        if c == 0 {
            return Ok(());
        }
        let factor = field::multiply(c, field::invert(row.coef(pos)?, l)?, l);
        target.add_scaled_assign(row, factor)
    }

    /// Insert a coded packet, taking ownership of it
    ///
    /// Returns the slot of the new basis row, or `None` when the packet is
    /// linearly dependent on the basis. The observer is notified once for
    /// every source position this insertion decodes: the inserted row first,
    /// then rows updated by back-substitution in increasing pivot order.
    pub fn insert(&mut self, mut packet: CodedPacket) -> Result<Option<PacketId>, CodingError> {
        if packet.l() != self.l {
            return Err(CodingError::FieldMismatch {
                left: self.l,
                right: packet.l(),
            });
        }
        self.stats.received += 1;

        for (&pos, &PacketId(slot)) in &self.pos_to_slot {
            if packet.coef(pos)? != 0 {
                trace!("reducing incoming packet on column {pos} with slot {slot}");
                Self::eliminate(&mut packet, &self.rows[slot].packet, pos, self.l)?;
            }
        }

        let Some(pivot) = packet.pivot_min() else {
            self.stats.redundant += 1;
            debug!(
                "redundant packet discarded (received={}, redundant={})",
                self.stats.received, self.stats.redundant
            );
            return Ok(None);
        };
        packet.adjust()?;

        let mut newly_decoded = Vec::new();
        for (&pos, &PacketId(slot)) in &self.pos_to_slot {
            let row = &mut self.rows[slot];
            if row.packet.coef(pivot)? == 0 {
                continue;
            }
            trace!("back-substituting column {pivot} into slot {slot}");
            Self::eliminate(&mut row.packet, &packet, pivot, self.l)?;
            if !row.decoded && row.packet.is_decoded() {
                row.decoded = true;
                newly_decoded.push(pos);
            }
        }

        let id = PacketId(self.rows.len());
        let decoded = packet.is_decoded();
        if decoded {
            newly_decoded.insert(0, pivot);
        }
        self.rows.push(BasisRow {
            packet,
            position: pivot,
            decoded,
        });
        self.pos_to_slot.insert(pivot, id);
        debug!(
            "innovative packet stored in slot {} with pivot {pivot} (rank {})",
            id.0,
            self.rows.len()
        );

        for pos in newly_decoded {
            self.stats.decoded += 1;
            trace!("source position {pos} decoded");
            self.observer.notify_decoded(pos);
        }

        Ok(Some(id))
    }

    /// Slot of the basis row whose pivot is source position `pos`
    pub fn id_at_position(&self, pos: usize) -> Option<PacketId> {
        self.pos_to_slot.get(&pos).copied()
    }

    /// Source position (pivot) of the row stored in slot `id`
    pub fn position_of(&self, id: PacketId) -> Option<usize> {
        self.rows.get(id.0).map(|row| row.position)
    }

    /// Current content of slot `id`, possibly still a mix of several sources
    pub fn packet(&self, id: PacketId) -> Option<&CodedPacket> {
        self.rows.get(id.0).map(|row| &row.packet)
    }

    /// Whether source position `pos` has been recovered
    pub fn is_position_decoded(&self, pos: usize) -> bool {
        self.id_at_position(pos)
            .is_some_and(|PacketId(slot)| self.rows[slot].decoded)
    }

    /// Recovered packet for source position `pos`
    pub fn decoded_packet(&self, pos: usize) -> Result<&CodedPacket, CodingError> {
        match self.id_at_position(pos) {
            Some(PacketId(slot)) if self.rows[slot].decoded => Ok(&self.rows[slot].packet),
            _ => Err(CodingError::Undecoded(pos)),
        }
    }

    /// Recovered source positions in increasing order
    pub fn decoded_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.pos_to_slot
            .iter()
            .filter(|(_, PacketId(slot))| self.rows[*slot].decoded)
            .map(|(&pos, _)| pos)
    }

    /// Random nonzero combination of the basis rows, for relaying
    ///
    /// Returns `Ok(None)` when the set is empty.
    pub fn recode(&self, rng: &mut CodingRng) -> Result<Option<CodedPacket>, CodingError> {
        let Some(payload_len) = self.rows.iter().map(|row| row.packet.data().len()).max() else {
            return Ok(None);
        };
        let mut recoded = CodedPacket::new(self.l, payload_len)?;
        for row in &self.rows {
            let c = rng.generate_nonzero_coefficient(self.l);
            recoded.add_scaled_assign(&row.packet, c)?;
        }
        Ok(Some(recoded))
    }
}

impl<O: DecodeObserver> fmt::Display for PacketSet<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PacketSet{{l={}, received={}, decoded={}, redundant={}}}",
            self.l, self.stats.received, self.stats.decoded, self.stats.redundant
        )?;
        for (pos, PacketId(slot)) in &self.pos_to_slot {
            writeln!(f, "  {pos} -> #{slot}: {}", self.rows[*slot].packet)?;
        }
        Ok(())
    }
}
