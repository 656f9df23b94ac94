//! The per-bearer PDCP entity.
//!
//! One entity serves one radio bearer. It assembles and parses PDU
//! headers, maintains the SN/HFN counters, applies ciphering and integrity
//! protection through the security gate, retains unacknowledged SDUs for
//! AM DRBs, emits and consumes status reports, and drives the per-SDU
//! discard timers.
//!
//! Every entry point runs to completion on the caller's task; no two run
//! concurrently for the same bearer, so the entity carries no locking.
//! Faults (malformed PDUs, integrity failures, full queues, failed
//! allocations) never escape the entry points; they are logged and the
//! traffic is dropped, leaving recovery to RLC retransmission and
//! upper-layer timeouts.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, error, info, warn};

use crate::config::{DiscardTimer, PdcpConfig};
use crate::constants::{PDCP_MAC_LEN, PDCP_PDU_TYPE_STATUS_REPORT};
use crate::pdu::header::{control_pdu_type, is_control_pdu, pack_data_header, read_data_sn};
use crate::pdu::status::{decode_status_report, encode_status_report};
use crate::security::SecurityGate;
use crate::state::PdcpState;
use crate::store::UndeliveredStore;
use crate::time::Clock;
use crate::timers::DiscardTimers;
use crate::traits::{BufferPool, RlcInterface, SecurityKeys, TxPdu, UpperSink};
use crate::types::{Count, Lcid, SequenceNumber};

/// Retention state of an AM DRB: the undelivered SDUs and their discard
/// timers. Other bearer modes have neither.
#[derive(Debug, Default)]
struct AmState {
    store: UndeliveredStore,
    timers: DiscardTimers,
}

/// Bearer mode, fixed at construction from the bearer kind and the RLC
/// mode the bearer is mapped to.
#[derive(Debug)]
enum BearerMode {
    Srb,
    DrbUm,
    DrbAm(AmState),
}

/// PDCP entity for one LTE radio bearer (TS 36.323).
pub struct PdcpEntity {
    lcid: Lcid,
    cfg: PdcpConfig,
    active: bool,
    st: PdcpState,
    mode: BearerMode,
    security: SecurityGate,
    rlc: Box<dyn RlcInterface>,
    upper: Box<dyn UpperSink>,
    pool: Box<dyn BufferPool>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PdcpEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdcpEntity")
            .field("lcid", &self.lcid)
            .field("cfg", &self.cfg)
            .field("active", &self.active)
            .field("st", &self.st)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl PdcpEntity {
    /// Creates the entity for `lcid` with the given configuration and
    /// collaborators.
    ///
    /// An invalid bearer/SN-length combination is logged and leaves the
    /// entity constructed but inactive: it drops all traffic, and only the
    /// state accessors remain useful for diagnostics.
    pub fn new(
        lcid: Lcid,
        cfg: PdcpConfig,
        rlc: Box<dyn RlcInterface>,
        upper: Box<dyn UpperSink>,
        security: SecurityGate,
        pool: Box<dyn BufferPool>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let active = match cfg.check_valid_config(rlc.rb_is_um(lcid)) {
            Ok(()) => true,
            Err(e) => {
                warn!(%lcid, error = %e, "invalid PDCP config, entity will not activate");
                false
            }
        };

        let mode = if cfg.is_srb() {
            BearerMode::Srb
        } else if rlc.rb_is_um(lcid) {
            BearerMode::DrbUm
        } else {
            BearerMode::DrbAm(AmState::default())
        };

        info!(
            rb = %upper.rb_name(lcid),
            sn_len = cfg.sn_len.bits(),
            hdr_len = cfg.header_len(),
            reordering_window = cfg.reordering_window(),
            maximum_pdcp_sn = cfg.sn_len.max_sn(),
            discard_timer = ?cfg.discard_timer,
            status_report_required = cfg.status_report_required,
            "init PDCP entity"
        );

        PdcpEntity {
            lcid,
            st: PdcpState::initial(cfg.sn_len),
            cfg,
            active,
            mode,
            security,
            rlc,
            upper,
            pool,
            clock,
        }
    }

    #[inline]
    pub fn lcid(&self) -> Lcid {
        self.lcid
    }

    #[inline]
    pub fn config(&self) -> &PdcpConfig {
        &self.cfg
    }

    /// Whether the entity accepts traffic. False after `reset()` or when
    /// the configuration was rejected at construction.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn rb_name(&self) -> String {
        self.upper.rb_name(self.lcid)
    }

    #[inline]
    fn max_sn(&self) -> u32 {
        self.cfg.sn_len.max_sn()
    }

    #[inline]
    fn sn_bits(&self) -> u8 {
        self.cfg.sn_len.bits()
    }

    // ------------------------------------------------------------------
    // Security configuration
    // ------------------------------------------------------------------

    /// Arms the pending security activation: TX protection starts with the
    /// SDU assigned COUNT `tx_sn`, RX protection with the PDU carrying SN
    /// `rx_sn`. Activation is edge-triggered; exactly one SDU is the first
    /// protected one per direction.
    pub fn config_security(&mut self, tx_sn: u32, rx_sn: u32) {
        debug!(rb = %self.rb_name(), tx_sn, rx_sn, "security activation armed");
        self.security.arm(tx_sn, rx_sn);
    }

    /// Replaces the key material used from the next protected SDU on.
    pub fn set_security_keys(&mut self, keys: SecurityKeys) {
        self.security.set_keys(keys);
    }

    // ------------------------------------------------------------------
    // Transmit path
    // ------------------------------------------------------------------

    /// Accepts a plaintext SDU from the upper layer for transmission.
    ///
    /// `upper_sn` is only supplied during handover (and by the
    /// reestablishment replay): the SDU is sent under that SN and the TX
    /// counters are not advanced.
    pub fn write_sdu(&mut self, sdu: Bytes, upper_sn: Option<u32>) {
        let rb = self.rb_name();
        if !self.active {
            debug!(%rb, "entity inactive, dropping SDU");
            return;
        }
        if self.rlc.sdu_queue_is_full(self.lcid) {
            info!(%rb, "dropping SDU due to full RLC queue");
            return;
        }

        let used_sn = upper_sn.unwrap_or(self.st.next_pdcp_tx_sn);
        if used_sn > self.max_sn() {
            error!(%rb, sn = used_sn, "SN outside the configured SN space, dropping SDU");
            return;
        }
        let tx_count = self.st.tx_count(used_sn, self.cfg.sn_len);

        let hdr_len = self.cfg.header_len();
        let Some(mut pdu) = self.pool.allocate(hdr_len + sdu.len() + PDCP_MAC_LEN) else {
            error!(%rb, sn = used_sn, "buffer unavailable, dropping SDU");
            return;
        };

        // AM DRBs keep a plaintext copy until the peer confirms delivery.
        // The copy feeds the status report FMS and the reestablishment
        // replay.
        if let BearerMode::DrbAm(am) = &mut self.mode {
            if let Err(e) = am.store.insert(tx_count, sdu.clone()) {
                error!(%rb, error = %e, "undelivered store rejected SDU");
            }
        }

        self.security.activate_tx_if_pending(tx_count);

        if let Err(e) = pack_data_header(self.cfg.bearer, self.cfg.sn_len, used_sn, &mut pdu) {
            error!(%rb, error = %e, "dropping SDU");
            // The stored copy must not outlive the PDU it was made for.
            if let BearerMode::DrbAm(am) = &mut self.mode {
                am.store.remove(tx_count);
            }
            return;
        }
        pdu.extend_from_slice(&sdu);

        if let DiscardTimer::After(timeout) = self.cfg.discard_timer {
            if let BearerMode::DrbAm(am) = &mut self.mode {
                am.timers.arm(tx_count, self.clock.now() + timeout);
                debug!(sn = used_sn, timeout_ms = timeout.as_millis() as u64, "discard timer armed");
            }
        }

        // MAC-I over header and payload, appended before ciphering so the
        // MAC itself goes out encrypted (SRBs only).
        if self.security.integrity().tx_enabled() && self.cfg.is_srb() {
            let mac = self.security.integrity_generate(tx_count, &pdu);
            pdu.extend_from_slice(&mac);
        }
        if self.security.ciphering().tx_enabled() {
            self.security.encrypt(tx_count, &mut pdu[hdr_len..]);
        }

        info!(
            %rb,
            sn = used_sn,
            len = pdu.len(),
            integrity = ?self.security.integrity(),
            ciphering = ?self.security.ciphering(),
            "TX PDU"
        );

        // Counters advance only when the SN came from this entity.
        if upper_sn.is_none() {
            self.st.next_pdcp_tx_sn += 1;
            if self.st.next_pdcp_tx_sn > self.max_sn() {
                self.st.next_pdcp_tx_sn = 0;
                self.st.tx_hfn += 1;
            }
        }

        self.rlc.write_sdu(
            self.lcid,
            TxPdu {
                bytes: pdu.freeze(),
                pdcp_sn: Some(SequenceNumber::new(used_sn)),
            },
        );
    }

    // ------------------------------------------------------------------
    // Receive path
    // ------------------------------------------------------------------

    /// Accepts a PDU delivered upward by RLC.
    pub fn write_pdu(&mut self, pdu: BytesMut) {
        let rb = self.rb_name();
        if !self.active {
            debug!(%rb, "entity inactive, dropping PDU");
            return;
        }
        if pdu.is_empty() {
            error!(%rb, "empty PDCP PDU");
            return;
        }

        // Control PDUs are recognized before the data-header length check:
        // a bitmap-less status report is exactly header-sized.
        if self.cfg.is_drb() && is_control_pdu(pdu[0]) {
            info!(%rb, "handling PDCP control PDU");
            self.handle_control_pdu(pdu);
            return;
        }

        if pdu.len() <= self.cfg.header_len() {
            error!(%rb, len = pdu.len(), "PDU smaller than its header");
            return;
        }

        let sn = match read_data_sn(self.cfg.sn_len, &pdu) {
            Ok(sn) => sn,
            Err(e) => {
                error!(%rb, error = %e, "malformed PDU");
                return;
            }
        };

        self.security.activate_rx_if_pending(sn);

        info!(
            %rb,
            %sn,
            len = pdu.len(),
            integrity = ?self.security.integrity(),
            ciphering = ?self.security.ciphering(),
            "RX PDU"
        );

        match self.mode {
            BearerMode::Srb => self.handle_srb_pdu(sn, pdu),
            BearerMode::DrbUm => self.handle_um_drb_pdu(sn, pdu),
            BearerMode::DrbAm(_) => self.handle_am_drb_pdu(sn, pdu),
        }
    }

    /// SRB receive (TS 36.323, 5.1.2.2).
    ///
    /// The reordering window is zero, so an SN below the expected one can
    /// only mean the HFN rolled over.
    fn handle_srb_pdu(&mut self, sn: SequenceNumber, mut pdu: BytesMut) {
        debug!(next_pdcp_rx_sn = self.st.next_pdcp_rx_sn, %sn, "RX SRB PDU");

        let hfn = if sn.value() < self.st.next_pdcp_rx_sn {
            self.st.rx_hfn + 1
        } else {
            self.st.rx_hfn
        };
        let count = Count::from_parts(hfn, sn.value(), self.sn_bits());

        let hdr_len = self.cfg.header_len();
        if self.security.ciphering().rx_enabled() {
            self.security.decrypt(count, &mut pdu[hdr_len..]);
        }

        if pdu.len() < hdr_len + PDCP_MAC_LEN {
            error!(rb = %self.rb_name(), len = pdu.len(), "SRB PDU too short for MAC-I");
            return;
        }
        let mac_offset = pdu.len() - PDCP_MAC_LEN;
        let mut mac = [0u8; PDCP_MAC_LEN];
        mac.copy_from_slice(&pdu[mac_offset..]);
        pdu.truncate(mac_offset);

        if self.security.integrity().rx_enabled()
            && !self.security.integrity_verify(count, &pdu, mac)
        {
            error!(rb = %self.rb_name(), %sn, "integrity check failed, dropping PDU");
            return;
        }

        let _ = pdu.split_to(hdr_len);

        if sn.value() < self.st.next_pdcp_rx_sn {
            self.st.rx_hfn += 1;
        }
        self.st.next_pdcp_rx_sn = sn.value() + 1;
        if self.st.next_pdcp_rx_sn > self.max_sn() {
            self.st.next_pdcp_rx_sn = 0;
            self.st.rx_hfn += 1;
        }

        self.upper.deliver(self.lcid, pdu.freeze());
    }

    /// UM DRB receive (TS 36.323, 5.1.2.1.3): no reordering, no integrity.
    fn handle_um_drb_pdu(&mut self, sn: SequenceNumber, mut pdu: BytesMut) {
        let _ = pdu.split_to(self.cfg.header_len());

        if sn.value() < self.st.next_pdcp_rx_sn {
            self.st.rx_hfn += 1;
        }
        let count = Count::from_parts(self.st.rx_hfn, sn.value(), self.sn_bits());

        if self.security.ciphering().rx_enabled() {
            self.security.decrypt(count, &mut pdu);
        }

        debug!(rb = %self.rb_name(), %sn, "RX SDU");

        self.st.next_pdcp_rx_sn = sn.value() + 1;
        if self.st.next_pdcp_rx_sn > self.max_sn() {
            self.st.next_pdcp_rx_sn = 0;
            self.st.rx_hfn += 1;
        }

        self.upper.deliver(self.lcid, pdu.freeze());
    }

    /// AM DRB receive without PDCP reordering (TS 36.323, 5.1.2.1.2).
    ///
    /// RLC AM already delivers in order; this path only detects
    /// out-of-window duplicates and reconstructs the COUNT across SN
    /// wraps. The window comparisons are u32 subtractions reinterpreted as
    /// signed; SN values outside `[0, 2^sn_len)` are invalid inputs.
    fn handle_am_drb_pdu(&mut self, sn: SequenceNumber, mut pdu: BytesMut) {
        let _ = pdu.split_to(self.cfg.header_len());

        let sn = sn.value();
        let window = self.cfg.reordering_window() as i32;
        let last_submit_diff_sn = self.st.last_submitted_pdcp_rx_sn.wrapping_sub(sn) as i32;
        let sn_diff_last_submit = sn.wrapping_sub(self.st.last_submitted_pdcp_rx_sn) as i32;
        let sn_diff_next_pdcp_rx_sn = sn.wrapping_sub(self.st.next_pdcp_rx_sn) as i32;

        debug!(
            rx_hfn = self.st.rx_hfn,
            sn,
            last_submitted_pdcp_rx_sn = self.st.last_submitted_pdcp_rx_sn,
            next_pdcp_rx_sn = self.st.next_pdcp_rx_sn,
            "RX AM PDU"
        );

        // Late duplicates: far ahead of the last delivered SN, or within
        // window below it.
        if (sn_diff_last_submit >= 0 && sn_diff_last_submit > window)
            || (last_submit_diff_sn >= 0 && last_submit_diff_sn < window)
        {
            debug!(
                sn,
                sn_diff_last_submit, last_submit_diff_sn, window, "duplicate out of window, discarding"
            );
            return;
        }

        let count;
        if (self.st.next_pdcp_rx_sn.wrapping_sub(sn) as i32) > window {
            // SN wrapped upward past the window; the PDU is from the next HFN.
            self.st.rx_hfn += 1;
            count = Count::from_parts(self.st.rx_hfn, sn, self.sn_bits());
            self.st.next_pdcp_rx_sn = sn + 1;
        } else if sn_diff_next_pdcp_rx_sn >= window {
            // PDU still belongs to the previous HFN.
            count = Count::from_parts(self.st.rx_hfn.wrapping_sub(1), sn, self.sn_bits());
        } else if sn >= self.st.next_pdcp_rx_sn {
            count = Count::from_parts(self.st.rx_hfn, sn, self.sn_bits());
            self.st.next_pdcp_rx_sn = sn + 1;
            if self.st.next_pdcp_rx_sn > self.max_sn() {
                self.st.next_pdcp_rx_sn = 0;
                self.st.rx_hfn += 1;
            }
        } else {
            count = Count::from_parts(self.st.rx_hfn, sn, self.sn_bits());
        }

        if self.security.ciphering().rx_enabled() {
            self.security.decrypt(count, &mut pdu);
        }

        self.st.last_submitted_pdcp_rx_sn = sn;

        self.upper.deliver(self.lcid, pdu.freeze());
    }

    // ------------------------------------------------------------------
    // Control PDUs (status report)
    // ------------------------------------------------------------------

    fn handle_control_pdu(&mut self, pdu: BytesMut) {
        match control_pdu_type(pdu[0]) {
            PDCP_PDU_TYPE_STATUS_REPORT => self.handle_status_report_pdu(pdu),
            pdu_type => {
                warn!(rb = %self.rb_name(), pdu_type, "unhandled control PDU");
            }
        }
    }

    /// Emits a status report (TS 36.323, 5.3.1): the First Missing SN plus
    /// a bitmap of the still-undelivered SDUs beyond it.
    pub fn send_status_report(&mut self) {
        let rb = self.rb_name();
        let (fms, stored_sns) = match &self.mode {
            BearerMode::DrbAm(am) => (
                am.store.fms(self.cfg.sn_len, self.st.next_pdcp_tx_sn),
                am.store.stored_sns(self.cfg.sn_len),
            ),
            _ => {
                error!(%rb, "status report requires RLC AM");
                return;
            }
        };
        debug!(%fms, outstanding = stored_sns.len(), "status report");

        let bitmap_len = match stored_sns.last() {
            Some(&last_sn) => (last_sn - fms.value() + 1).div_ceil(8) as usize,
            None => 0,
        };
        let Some(mut pdu) = self.pool.allocate(self.cfg.header_len() + bitmap_len) else {
            error!(%rb, "buffer unavailable, dropping status report");
            return;
        };

        if let Err(e) = encode_status_report(self.cfg.sn_len, fms.value(), &stored_sns, &mut pdu) {
            error!(%rb, error = %e, "cannot encode status report");
            return;
        }

        self.rlc.write_sdu(
            self.lcid,
            TxPdu {
                bytes: pdu.freeze(),
                pdcp_sn: None,
            },
        );
    }

    /// Consumes a peer status report (TS 36.323, 5.3.2): evicts everything
    /// below the FMS, then every SN the bitmap acknowledges. Unset bitmap
    /// bits are NACKs and their SDUs stay stored.
    fn handle_status_report_pdu(&mut self, pdu: BytesMut) {
        let rb = self.rb_name();
        let sn_len = self.cfg.sn_len;
        let report = match decode_status_report(sn_len, &pdu) {
            Ok(report) => report,
            Err(e) => {
                error!(%rb, error = %e, "malformed status report");
                return;
            }
        };
        info!(%rb, fms = %report.fms, acked = report.acked.len(), "RX status report");

        let BearerMode::DrbAm(am) = &mut self.mode else {
            warn!(%rb, "status report on a bearer without an undelivered store");
            return;
        };
        for count in am.store.remove_sn_below(report.fms, sn_len) {
            am.timers.cancel(count);
        }
        for sn in report.acked {
            if let Some((count, _)) = am.store.remove_by_sn(sn, sn_len) {
                am.timers.cancel(count);
                debug!(%sn, "status report ACKed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Reestablishment / reset
    // ------------------------------------------------------------------

    /// Reestablishment procedure (TS 36.323, 5.2).
    ///
    /// SRBs and UM DRBs reset their counters. AM DRBs keep counters, emit
    /// a status report if so configured and retransmit every undelivered
    /// SDU under its original SN.
    pub fn reestablish(&mut self) {
        info!(rb = %self.rb_name(), "reestablish");

        if !matches!(self.mode, BearerMode::DrbAm(_)) {
            self.st.reset_counters();
            return;
        }

        if self.cfg.status_report_required {
            self.send_status_report();
        }

        // Replay: the stored SDUs move out wholesale (their timers die
        // with the move) and re-enter through the normal TX path, which
        // stores them again and arms fresh timers. The original SN keeps
        // the counters untouched.
        let BearerMode::DrbAm(am) = &mut self.mode else {
            return;
        };
        am.timers.clear();
        let undelivered = am.store.take_all();
        for (count, sdu) in undelivered {
            self.write_sdu(sdu, Some(count.sn(self.sn_bits()).value()));
        }
    }

    /// Stops the entity (RRC connection release). Idempotent. All pending
    /// discard timers are cancelled so no callback can fire afterwards;
    /// the undelivered store is kept for `get_buffered_pdus`.
    pub fn reset(&mut self) {
        if self.active {
            debug!(rb = %self.rb_name(), "reset");
        }
        self.active = false;
        if let BearerMode::DrbAm(am) = &mut self.mode {
            am.timers.clear();
        }
    }

    // ------------------------------------------------------------------
    // RLC notifications and timers
    // ------------------------------------------------------------------

    /// Handles a batch of PDCP SNs whose transmission RLC has confirmed.
    /// A missing entry is not an error; its discard timer may have fired
    /// first.
    pub fn notify_delivery(&mut self, sns: &[u32]) {
        debug!(rb = %self.rb_name(), notified = sns.len(), "delivery notification from RLC");
        let sn_len = self.cfg.sn_len;
        let BearerMode::DrbAm(am) = &mut self.mode else {
            return;
        };
        for &sn in sns {
            match am.store.remove_by_sn(SequenceNumber::new(sn), sn_len) {
                Some((count, _)) => {
                    am.timers.cancel(count);
                }
                None => warn!(sn, "no stored SDU for delivery notification"),
            }
        }
    }

    /// Sweeps expired discard timers: each expiry evicts the stored SDU
    /// and tells RLC to drop the SDU if no segment went out yet. The
    /// embedding stack calls this periodically.
    pub fn run_pending_timers(&mut self) {
        let now = self.clock.now();
        let sn_bits = self.sn_bits();
        let BearerMode::DrbAm(am) = &mut self.mode else {
            return;
        };
        for count in am.timers.take_expired(now) {
            let sn = count.sn(sn_bits);
            debug!(%sn, "discard timer expired");
            if am.store.remove(count).is_some() {
                debug!(%count, "removed undelivered SDU");
            } else {
                debug!(%count, "no stored SDU to discard");
            }
            self.rlc.discard_sdu(self.lcid, sn);
        }
    }

    // ------------------------------------------------------------------
    // State accessors (handover support)
    // ------------------------------------------------------------------

    /// Copy of the counter block.
    pub fn get_bearer_state(&self) -> PdcpState {
        self.st
    }

    /// Replaces the counter block, e.g. when resuming a bearer after
    /// handover.
    pub fn set_bearer_state(&mut self, state: PdcpState) {
        self.st = state;
    }

    /// Copy of the undelivered store, keyed by TX COUNT. Empty for
    /// bearers without one.
    pub fn get_buffered_pdus(&self) -> BTreeMap<Count, Bytes> {
        match &self.mode {
            BearerMode::DrbAm(am) => am.store.snapshot(),
            _ => BTreeMap::new(),
        }
    }
}
