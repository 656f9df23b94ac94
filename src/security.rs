//! Security gate: per-direction activation state for ciphering and
//! integrity protection.
//!
//! Activation is edge-triggered. RRC arms a latch per direction via
//! `config_security`; the first SDU whose TX COUNT (respectively received
//! SN) matches the latch is the first protected SDU, and the latch clears.

use tracing::debug;

use crate::constants::PDCP_MAC_LEN;
use crate::traits::{SecurityKeys, SecurityPrimitives};
use crate::types::{Count, SequenceNumber};

/// Directions for which a protection function is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    None,
    Tx,
    Rx,
    TxRx,
}

impl Direction {
    #[inline]
    pub fn tx_enabled(self) -> bool {
        matches!(self, Direction::Tx | Direction::TxRx)
    }

    #[inline]
    pub fn rx_enabled(self) -> bool {
        matches!(self, Direction::Rx | Direction::TxRx)
    }

    /// Promotes this direction to include TX.
    #[inline]
    pub fn with_tx(self) -> Self {
        match self {
            Direction::None | Direction::Tx => Direction::Tx,
            Direction::Rx | Direction::TxRx => Direction::TxRx,
        }
    }

    /// Promotes this direction to include RX.
    #[inline]
    pub fn with_rx(self) -> Self {
        match self {
            Direction::None | Direction::Rx => Direction::Rx,
            Direction::Tx | Direction::TxRx => Direction::TxRx,
        }
    }
}

/// Holds the keys, direction flags and pending-activation latches, and
/// dispatches to the cipher/integrity primitives.
pub struct SecurityGate {
    integrity: Direction,
    ciphering: Direction,
    /// TX activation latch, compared against the TX COUNT of each SDU.
    activate_tx_at: Option<u32>,
    /// RX activation latch, compared against the SN of each received PDU.
    activate_rx_at: Option<u32>,
    keys: SecurityKeys,
    primitives: Box<dyn SecurityPrimitives>,
}

impl std::fmt::Debug for SecurityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGate")
            .field("integrity", &self.integrity)
            .field("ciphering", &self.ciphering)
            .field("activate_tx_at", &self.activate_tx_at)
            .field("activate_rx_at", &self.activate_rx_at)
            .finish_non_exhaustive()
    }
}

impl SecurityGate {
    pub fn new(primitives: Box<dyn SecurityPrimitives>, keys: SecurityKeys) -> Self {
        SecurityGate {
            integrity: Direction::None,
            ciphering: Direction::None,
            activate_tx_at: None,
            activate_rx_at: None,
            keys,
            primitives,
        }
    }

    /// Arms the activation latches. Integrity and ciphering turn on for TX
    /// at the SDU assigned `tx_count`, and for RX at the PDU carrying
    /// `rx_sn`.
    pub fn arm(&mut self, tx_count: u32, rx_sn: u32) {
        self.activate_tx_at = Some(tx_count);
        self.activate_rx_at = Some(rx_sn);
    }

    /// Replaces the key material. Takes effect from the next protected SDU.
    pub fn set_keys(&mut self, keys: SecurityKeys) {
        self.keys = keys;
    }

    /// Turns integrity and ciphering on for TX if `tx_count` matches the
    /// pending latch. Exactly one SDU triggers this.
    pub fn activate_tx_if_pending(&mut self, tx_count: Count) {
        if self.activate_tx_at == Some(tx_count.value()) {
            debug!(%tx_count, "activating TX security");
            self.integrity = self.integrity.with_tx();
            self.ciphering = self.ciphering.with_tx();
            self.activate_tx_at = None;
        }
    }

    /// Turns integrity and ciphering on for RX if `sn` matches the pending
    /// latch.
    pub fn activate_rx_if_pending(&mut self, sn: SequenceNumber) {
        if self.activate_rx_at == Some(sn.value()) {
            debug!(%sn, "activating RX security");
            self.integrity = self.integrity.with_rx();
            self.ciphering = self.ciphering.with_rx();
            self.activate_rx_at = None;
        }
    }

    #[inline]
    pub fn integrity(&self) -> Direction {
        self.integrity
    }

    #[inline]
    pub fn ciphering(&self) -> Direction {
        self.ciphering
    }

    pub fn encrypt(&self, count: Count, data: &mut [u8]) {
        self.primitives.cipher_encrypt(&self.keys, count, data);
    }

    pub fn decrypt(&self, count: Count, data: &mut [u8]) {
        self.primitives.cipher_decrypt(&self.keys, count, data);
    }

    pub fn integrity_generate(&self, count: Count, data: &[u8]) -> [u8; PDCP_MAC_LEN] {
        self.primitives.integrity_generate(&self.keys, count, data)
    }

    pub fn integrity_verify(&self, count: Count, data: &[u8], mac: [u8; PDCP_MAC_LEN]) -> bool {
        self.primitives.integrity_verify(&self.keys, count, data, mac)
    }
}
