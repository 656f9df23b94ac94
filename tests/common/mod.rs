//! Shared test harness for the PDCP integration tests.
//!
//! Provides recording mocks for the RLC and upper-layer seams, a toy
//! cipher/MAC whose output depends on the COUNT (so count-reconstruction
//! bugs show up as garbled payloads), and entity builders.

#![allow(dead_code)] // Not every test file uses every helper.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use pdcplte::{
    Count, HeapPool, Lcid, MockClock, PdcpConfig, PdcpEntity, SecurityGate, SecurityKeys,
    SequenceNumber, SystemClock,
};
use pdcplte::constants::{PDCP_KEY_LEN, PDCP_MAC_LEN};
use pdcplte::traits::{BufferPool, RlcInterface, SecurityPrimitives, TxPdu, UpperSink};

pub const TEST_LCID: u32 = 3;

/// Recording RLC mock. Cloning shares the recorded state, so tests keep a
/// handle while the entity owns a boxed clone.
#[derive(Debug, Clone, Default)]
pub struct MockRlc {
    inner: Rc<RefCell<RlcInner>>,
}

#[derive(Debug, Default)]
struct RlcInner {
    um: bool,
    queue_full: bool,
    written: Vec<TxPdu>,
    discarded: Vec<SequenceNumber>,
}

impl MockRlc {
    pub fn new(um: bool) -> Self {
        MockRlc {
            inner: Rc::new(RefCell::new(RlcInner {
                um,
                ..RlcInner::default()
            })),
        }
    }

    pub fn set_queue_full(&self, full: bool) {
        self.inner.borrow_mut().queue_full = full;
    }

    /// Copy of everything written so far.
    pub fn written(&self) -> Vec<TxPdu> {
        self.inner.borrow().written.clone()
    }

    /// Drains the written PDUs.
    pub fn take_written(&self) -> Vec<TxPdu> {
        std::mem::take(&mut self.inner.borrow_mut().written)
    }

    pub fn discarded(&self) -> Vec<SequenceNumber> {
        self.inner.borrow().discarded.clone()
    }
}

impl RlcInterface for MockRlc {
    fn write_sdu(&mut self, _lcid: Lcid, pdu: TxPdu) {
        self.inner.borrow_mut().written.push(pdu);
    }

    fn discard_sdu(&mut self, _lcid: Lcid, sn: SequenceNumber) {
        self.inner.borrow_mut().discarded.push(sn);
    }

    fn rb_is_um(&self, _lcid: Lcid) -> bool {
        self.inner.borrow().um
    }

    fn sdu_queue_is_full(&self, _lcid: Lcid) -> bool {
        self.inner.borrow().queue_full
    }
}

/// Recording upper-layer mock (RRC or gateway, depending on the bearer).
#[derive(Debug, Clone, Default)]
pub struct MockUpper {
    delivered: Rc<RefCell<Vec<Bytes>>>,
}

impl MockUpper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Bytes> {
        self.delivered.borrow().clone()
    }
}

impl UpperSink for MockUpper {
    fn deliver(&mut self, _lcid: Lcid, sdu: Bytes) {
        self.delivered.borrow_mut().push(sdu);
    }
}

/// Toy security primitives: an XOR keystream cipher and a fold MAC, both
/// keyed by the COUNT. Encrypt and decrypt are the same operation, and a
/// payload decrypted under the wrong COUNT comes out garbled.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorSecurity;

fn keystream_byte(keys: &SecurityKeys, count: Count, index: usize) -> u8 {
    let count_byte = (count.value() >> ((index % 4) * 8)) as u8;
    keys.k_enc[index % PDCP_KEY_LEN] ^ count_byte ^ 0x5A
}

impl SecurityPrimitives for XorSecurity {
    fn cipher_encrypt(&self, keys: &SecurityKeys, count: Count, data: &mut [u8]) {
        for (i, byte) in data.iter_mut().enumerate() {
            *byte ^= keystream_byte(keys, count, i);
        }
    }

    fn cipher_decrypt(&self, keys: &SecurityKeys, count: Count, data: &mut [u8]) {
        self.cipher_encrypt(keys, count, data);
    }

    fn integrity_generate(
        &self,
        keys: &SecurityKeys,
        count: Count,
        data: &[u8],
    ) -> [u8; PDCP_MAC_LEN] {
        let mut acc = count.value().wrapping_mul(0x9E37_79B9);
        for (i, &byte) in data.iter().enumerate() {
            acc = acc
                .rotate_left(5)
                .wrapping_add(byte as u32 ^ keys.k_int[i % PDCP_KEY_LEN] as u32);
        }
        acc.to_be_bytes()
    }

    fn integrity_verify(
        &self,
        keys: &SecurityKeys,
        count: Count,
        data: &[u8],
        mac: [u8; PDCP_MAC_LEN],
    ) -> bool {
        self.integrity_generate(keys, count, data) == mac
    }
}

/// A pool that always reports exhaustion, for the allocation-failure path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustedPool;

impl BufferPool for ExhaustedPool {
    fn allocate(&self, _capacity: usize) -> Option<BytesMut> {
        None
    }
}

pub fn test_keys() -> SecurityKeys {
    SecurityKeys {
        k_int: [0x11; PDCP_KEY_LEN],
        k_enc: [0x22; PDCP_KEY_LEN],
    }
}

pub fn xor_gate() -> SecurityGate {
    SecurityGate::new(Box::new(XorSecurity), test_keys())
}

/// Builds an entity wired to fresh mocks. `um` selects the RLC mode
/// reported for the bearer.
pub fn build_entity(cfg: PdcpConfig, um: bool) -> (PdcpEntity, MockRlc, MockUpper) {
    let rlc = MockRlc::new(um);
    let upper = MockUpper::new();
    let entity = PdcpEntity::new(
        Lcid::new(TEST_LCID),
        cfg,
        Box::new(rlc.clone()),
        Box::new(upper.clone()),
        xor_gate(),
        Box::new(HeapPool),
        Arc::new(SystemClock),
    );
    (entity, rlc, upper)
}

/// Like [`build_entity`], with a controllable clock for timer tests.
pub fn build_entity_with_clock(
    cfg: PdcpConfig,
    um: bool,
) -> (PdcpEntity, MockRlc, MockUpper, Arc<MockClock>) {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let rlc = MockRlc::new(um);
    let upper = MockUpper::new();
    let entity = PdcpEntity::new(
        Lcid::new(TEST_LCID),
        cfg,
        Box::new(rlc.clone()),
        Box::new(upper.clone()),
        xor_gate(),
        Box::new(HeapPool),
        clock.clone(),
    );
    (entity, rlc, upper, clock)
}

/// Builds a data PDU as the peer would: header, payload, optional MAC over
/// header+payload, then ciphering of everything after the header.
pub fn build_peer_data_pdu(
    cfg: &PdcpConfig,
    sn: u32,
    count: Count,
    payload: &[u8],
    with_mac: bool,
    ciphered: bool,
) -> BytesMut {
    let mut pdu = BytesMut::new();
    pdcplte::pdu::header::pack_data_header(cfg.bearer, cfg.sn_len, sn, &mut pdu).unwrap();
    pdu.extend_from_slice(payload);
    if with_mac {
        let mac = XorSecurity.integrity_generate(&test_keys(), count, &pdu);
        pdu.extend_from_slice(&mac);
    }
    if ciphered {
        let hdr_len = cfg.header_len();
        XorSecurity.cipher_encrypt(&test_keys(), count, &mut pdu[hdr_len..]);
    }
    pdu
}
