//! Undelivered-SDU store for AM DRBs.
//!
//! Maps each transmitted SDU's TX COUNT to an owned copy of the plaintext,
//! ordered by key. The store feeds the status report (first missing SN and
//! bitmap) and the reestablishment replay, and shrinks on delivery
//! notifications, status-report ACKs and discard-timer expiry.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::config::SnLen;
use crate::error::PdcpError;
use crate::types::{Count, SequenceNumber};

/// Ordered store of not-yet-acknowledged SDUs, keyed by TX COUNT.
#[derive(Debug, Default)]
pub struct UndeliveredStore {
    entries: BTreeMap<Count, Bytes>,
}

impl UndeliveredStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an SDU copy under its TX COUNT.
    ///
    /// # Errors
    /// - [`PdcpError::DuplicateStoreEntry`] - an SDU is already stored for
    ///   this COUNT. The caller treats this as an upstream bug; the stored
    ///   SDU is left untouched.
    pub fn insert(&mut self, tx_count: Count, sdu: Bytes) -> Result<(), PdcpError> {
        if self.entries.contains_key(&tx_count) {
            return Err(PdcpError::DuplicateStoreEntry(tx_count));
        }
        self.entries.insert(tx_count, sdu);
        Ok(())
    }

    /// Removes the entry stored under `tx_count`.
    pub fn remove(&mut self, tx_count: Count) -> Option<Bytes> {
        self.entries.remove(&tx_count)
    }

    /// Removes the oldest entry whose COUNT carries the given SN.
    ///
    /// Delivery notifications and status-report ACKs identify SDUs by SN
    /// only; the COUNT is resolved against the stored keys.
    pub fn remove_by_sn(&mut self, sn: SequenceNumber, sn_len: SnLen) -> Option<(Count, Bytes)> {
        let key = self
            .entries
            .keys()
            .find(|count| count.sn(sn_len.bits()) == sn)
            .copied()?;
        let sdu = self.entries.remove(&key)?;
        Some((key, sdu))
    }

    /// Removes every entry whose SN part is below `fms` and returns the
    /// removed COUNTs so the caller can cancel their discard timers.
    pub fn remove_sn_below(&mut self, fms: SequenceNumber, sn_len: SnLen) -> Vec<Count> {
        let bits = sn_len.bits();
        let removed: Vec<Count> = self
            .entries
            .keys()
            .filter(|count| count.sn(bits) < fms)
            .copied()
            .collect();
        for count in &removed {
            self.entries.remove(count);
        }
        removed
    }

    /// First Missing SN: the SN part of the smallest stored key, or
    /// `next_tx_sn` if nothing is outstanding.
    pub fn fms(&self, sn_len: SnLen, next_tx_sn: u32) -> SequenceNumber {
        match self.entries.keys().next() {
            Some(count) => count.sn(sn_len.bits()),
            None => SequenceNumber::new(next_tx_sn),
        }
    }

    /// SN parts of all stored keys, in COUNT order.
    pub fn stored_sns(&self, sn_len: SnLen) -> Vec<u32> {
        let bits = sn_len.bits();
        self.entries.keys().map(|count| count.sn(bits).value()).collect()
    }

    /// Moves the whole store out, leaving it empty. Used by the
    /// reestablishment replay.
    pub fn take_all(&mut self) -> BTreeMap<Count, Bytes> {
        std::mem::take(&mut self.entries)
    }

    /// Copy of the store, for `get_buffered_pdus` at handover.
    pub fn snapshot(&self) -> BTreeMap<Count, Bytes> {
        self.entries.clone()
    }

    pub fn contains(&self, tx_count: Count) -> bool {
        self.entries.contains_key(&tx_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
