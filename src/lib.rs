//! `pdcplte`: an LTE PDCP (Packet Data Convergence Protocol) entity per
//! 3GPP TS 36.323.
//!
//! A [`PdcpEntity`] is instantiated per radio bearer. It sits between the
//! upper layers (RRC for signalling bearers, the IP gateway for data
//! bearers) and RLC, and owns header assembly and parsing, the per-direction
//! SN/HFN counters, ciphering and integrity protection, the
//! undelivered-SDU store with its discard timers, the status-report
//! control PDU and the reestablishment procedure.
//!
//! ## Core Concepts
//!
//! - **[`PdcpEntity`]**: one bearer's transmit/receive state machine. The
//!   entity is single-threaded cooperative: every entry point runs to
//!   completion and no two run concurrently for the same bearer.
//! - **COUNT**: the 32-bit security nonce `(HFN << sn_len) | SN`. It is
//!   derived on every transmit and reconstructed on every receive from the
//!   short wire SN plus the hidden hyper frame number.
//! - **Seams**: RLC, the upper-layer sink, the security primitives, the
//!   buffer pool and the clock are traits ([`traits`], [`time`]) supplied
//!   at construction, so the entity is testable without a radio stack.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use pdcplte::{
//!     HeapPool, Lcid, NullSecurity, PdcpConfig, PdcpEntity, SecurityGate, SecurityKeys,
//!     SystemClock,
//! };
//! use pdcplte::traits::{RlcInterface, TxPdu, UpperSink};
//! use pdcplte::types::SequenceNumber;
//!
//! // A stack supplies its real RLC entity and upper-layer sink here.
//! #[derive(Debug, Default)]
//! struct LoopbackRlc(Vec<TxPdu>);
//!
//! impl RlcInterface for LoopbackRlc {
//!     fn write_sdu(&mut self, _lcid: Lcid, pdu: TxPdu) {
//!         self.0.push(pdu);
//!     }
//!     fn discard_sdu(&mut self, _lcid: Lcid, _sn: SequenceNumber) {}
//!     fn rb_is_um(&self, _lcid: Lcid) -> bool {
//!         false
//!     }
//!     fn sdu_queue_is_full(&self, _lcid: Lcid) -> bool {
//!         false
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Rrc;
//!
//! impl UpperSink for Rrc {
//!     fn deliver(&mut self, _lcid: Lcid, sdu: Bytes) {
//!         println!("SDU up: {:?}", sdu);
//!     }
//! }
//!
//! let mut srb = PdcpEntity::new(
//!     Lcid::new(1),
//!     PdcpConfig::srb(),
//!     Box::new(LoopbackRlc::default()),
//!     Box::new(Rrc),
//!     SecurityGate::new(Box::new(NullSecurity), SecurityKeys::zeroed()),
//!     Box::new(HeapPool),
//!     Arc::new(SystemClock),
//! );
//!
//! // Protect everything from SN 0 on, then transmit.
//! srb.config_security(0, 0);
//! srb.write_sdu(Bytes::from_static(b"rrc message"), None);
//! ```

pub mod bearers;
pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod pdu;
pub mod security;
pub mod state;
pub mod store;
pub mod time;
pub mod timers;
pub mod traits;
pub mod types;

pub use bearers::PdcpBearers;
pub use config::{BearerKind, DiscardTimer, PdcpConfig, SnLen};
pub use entity::PdcpEntity;
pub use error::{ConfigError, PdcpBuildingError, PdcpError, PdcpParsingError};
pub use pdu::status::StatusReport;
pub use security::{Direction, SecurityGate};
pub use state::PdcpState;
pub use time::mock_clock::MockClock;
pub use time::{Clock, SystemClock};
pub use traits::{
    BufferPool, HeapPool, NullSecurity, RlcInterface, SecurityKeys, SecurityPrimitives, TxPdu,
    UpperSink,
};
pub use types::{Count, Lcid, SequenceNumber};
