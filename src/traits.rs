//! Seams between the PDCP entity and its collaborators.
//!
//! The entity talks to the RLC layer below it, to RRC or the IP gateway
//! above it, to the security primitives and to a buffer pool, all through
//! trait objects supplied at construction. Tests substitute mocks here; a
//! real stack wires in its RLC entities, crypto backend and pool.

use bytes::{Bytes, BytesMut};

use crate::constants::{PDCP_KEY_LEN, PDCP_MAC_LEN};
use crate::types::{Count, Lcid, SequenceNumber};

/// A PDU handed down to RLC, with the metadata RLC-AM needs to report
/// delivery per PDCP SN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPdu {
    pub bytes: Bytes,
    /// PDCP SN of the contained data PDU; `None` for control PDUs.
    pub pdcp_sn: Option<SequenceNumber>,
}

/// Downward interface consumed by the entity; implemented by RLC.
pub trait RlcInterface {
    /// Enqueues a PDCP PDU for transmission. Non-blocking hand-off of an
    /// owned buffer.
    fn write_sdu(&mut self, lcid: Lcid, pdu: TxPdu);

    /// Asks RLC to drop a not-yet-transmitted SDU after discard-timer
    /// expiry. RLC may ignore this if a segment is already on air.
    fn discard_sdu(&mut self, lcid: Lcid, sn: SequenceNumber);

    /// Whether the bearer is mapped to RLC UM (as opposed to AM).
    fn rb_is_um(&self, lcid: Lcid) -> bool;

    /// Whether RLC's SDU queue for this bearer is full.
    fn sdu_queue_is_full(&self, lcid: Lcid) -> bool;
}

/// Upward interface consumed by the entity; implemented by RRC for SRBs
/// and by the IP gateway for DRBs.
pub trait UpperSink {
    /// Delivers a decoded SDU to the upper layer.
    fn deliver(&mut self, lcid: Lcid, sdu: Bytes);

    /// Human-readable bearer name used in log output.
    fn rb_name(&self, lcid: Lcid) -> String {
        format!("{}", lcid)
    }
}

/// Key material held by the entity and passed into the primitives.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityKeys {
    pub k_int: [u8; PDCP_KEY_LEN],
    pub k_enc: [u8; PDCP_KEY_LEN],
}

impl SecurityKeys {
    /// All-zero keys, for bearers configured before key derivation.
    pub fn zeroed() -> Self {
        SecurityKeys {
            k_int: [0; PDCP_KEY_LEN],
            k_enc: [0; PDCP_KEY_LEN],
        }
    }
}

impl std::fmt::Debug for SecurityKeys {
    // Key material stays out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityKeys").finish_non_exhaustive()
    }
}

/// Ciphering and integrity primitives (EEA/EIA). The entity owns keys and
/// activation state; the algorithms live behind this seam.
pub trait SecurityPrimitives {
    /// Encrypts `data` in place using `count` as the per-packet nonce.
    fn cipher_encrypt(&self, keys: &SecurityKeys, count: Count, data: &mut [u8]);

    /// Decrypts `data` in place.
    fn cipher_decrypt(&self, keys: &SecurityKeys, count: Count, data: &mut [u8]);

    /// Computes the 4-byte MAC-I over `data`.
    fn integrity_generate(&self, keys: &SecurityKeys, count: Count, data: &[u8])
        -> [u8; PDCP_MAC_LEN];

    /// Verifies a received MAC-I over `data`.
    fn integrity_verify(
        &self,
        keys: &SecurityKeys,
        count: Count,
        data: &[u8],
        mac: [u8; PDCP_MAC_LEN],
    ) -> bool;
}

/// Pass-through primitives for bearers that never activate security.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSecurity;

impl SecurityPrimitives for NullSecurity {
    fn cipher_encrypt(&self, _keys: &SecurityKeys, _count: Count, _data: &mut [u8]) {}

    fn cipher_decrypt(&self, _keys: &SecurityKeys, _count: Count, _data: &mut [u8]) {}

    fn integrity_generate(
        &self,
        _keys: &SecurityKeys,
        _count: Count,
        _data: &[u8],
    ) -> [u8; PDCP_MAC_LEN] {
        [0; PDCP_MAC_LEN]
    }

    fn integrity_verify(
        &self,
        _keys: &SecurityKeys,
        _count: Count,
        _data: &[u8],
        _mac: [u8; PDCP_MAC_LEN],
    ) -> bool {
        true
    }
}

/// Process-wide byte-buffer pool. Allocation may fail; the entity surfaces
/// that as a logged drop, never as a panic.
pub trait BufferPool {
    fn allocate(&self, capacity: usize) -> Option<BytesMut>;
}

/// Default pool backed by the heap. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapPool;

impl BufferPool for HeapPool {
    fn allocate(&self, capacity: usize) -> Option<BytesMut> {
        Some(BytesMut::with_capacity(capacity))
    }
}
