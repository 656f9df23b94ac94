//! Per-direction counter block of a PDCP entity.

use serde::{Deserialize, Serialize};

use crate::config::SnLen;
use crate::types::Count;

/// The mutable counters of one PDCP entity.
///
/// `tx_hfn`/`next_pdcp_tx_sn` together form the next TX COUNT;
/// `rx_hfn`/`next_pdcp_rx_sn` track the next expected SN on receive.
/// `last_submitted_pdcp_rx_sn` is only meaningful for AM DRBs and starts
/// at the maximum SN so that SN 0 is in sequence.
///
/// The block is plain data so it can be extracted and re-applied wholesale
/// during handover (`get_bearer_state`/`set_bearer_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdcpState {
    pub tx_hfn: u32,
    pub next_pdcp_tx_sn: u32,
    pub rx_hfn: u32,
    pub next_pdcp_rx_sn: u32,
    pub last_submitted_pdcp_rx_sn: u32,
}

impl PdcpState {
    /// Initial state for a bearer with the given SN width.
    pub fn initial(sn_len: SnLen) -> Self {
        PdcpState {
            tx_hfn: 0,
            next_pdcp_tx_sn: 0,
            rx_hfn: 0,
            next_pdcp_rx_sn: 0,
            last_submitted_pdcp_rx_sn: sn_len.max_sn(),
        }
    }

    /// The COUNT that the given SN would be assigned on transmit.
    #[inline]
    pub fn tx_count(&self, sn: u32, sn_len: SnLen) -> Count {
        Count::from_parts(self.tx_hfn, sn, sn_len.bits())
    }

    /// Resets the four SN/HFN counters to zero, as reestablishment does for
    /// SRBs and UM DRBs. `last_submitted_pdcp_rx_sn` is left alone; it is
    /// only consulted on AM bearers, which never take this path.
    pub fn reset_counters(&mut self) {
        self.tx_hfn = 0;
        self.next_pdcp_tx_sn = 0;
        self.rx_hfn = 0;
        self.next_pdcp_rx_sn = 0;
    }
}
