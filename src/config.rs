//! Per-bearer PDCP configuration.
//!
//! A [`PdcpConfig`] is fixed for the lifetime of an entity. Header length
//! and maximum SN are derived from the SN width; validity of the
//! bearer/SN-length combination depends on the RLC mode the bearer is
//! mapped to and is checked at entity construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DRB_REORDERING_WINDOW, SRB_REORDERING_WINDOW};
use crate::error::ConfigError;

/// Radio bearer kind served by a PDCP entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BearerKind {
    /// Signalling radio bearer; SDUs come from and go to RRC.
    Srb,
    /// Data radio bearer; SDUs come from and go to the IP gateway.
    Drb,
}

/// PDCP SN width carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnLen {
    Len5,
    Len7,
    Len12,
    Len18,
}

impl SnLen {
    /// SN width in bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            SnLen::Len5 => 5,
            SnLen::Len7 => 7,
            SnLen::Len12 => 12,
            SnLen::Len18 => 18,
        }
    }

    /// Data-PDU header length in bytes for this SN width.
    #[inline]
    pub const fn header_len(self) -> usize {
        match self {
            SnLen::Len5 | SnLen::Len7 => 1,
            SnLen::Len12 => 2,
            SnLen::Len18 => 3,
        }
    }

    /// Largest representable SN, `2^bits - 1`.
    #[inline]
    pub const fn max_sn(self) -> u32 {
        (1u32 << self.bits()) - 1
    }
}

/// Discard timer configuration for transmitted SDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardTimer {
    /// SDUs are retained until acknowledged; no timer is armed.
    Infinity,
    /// SDUs not confirmed within this duration are discarded.
    After(Duration),
}

/// Immutable configuration of one PDCP entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdcpConfig {
    pub bearer: BearerKind,
    pub sn_len: SnLen,
    pub discard_timer: DiscardTimer,
    /// Whether a status report is sent on reestablishment (AM DRBs).
    pub status_report_required: bool,
}

impl PdcpConfig {
    /// Configuration of an SRB: 5-bit SNs, no discard timer, no reports.
    pub fn srb() -> Self {
        PdcpConfig {
            bearer: BearerKind::Srb,
            sn_len: SnLen::Len5,
            discard_timer: DiscardTimer::Infinity,
            status_report_required: false,
        }
    }

    /// Configuration of a DRB with the given SN width.
    pub fn drb(sn_len: SnLen) -> Self {
        PdcpConfig {
            bearer: BearerKind::Drb,
            sn_len,
            discard_timer: DiscardTimer::Infinity,
            status_report_required: false,
        }
    }

    #[inline]
    pub fn is_srb(&self) -> bool {
        self.bearer == BearerKind::Srb
    }

    #[inline]
    pub fn is_drb(&self) -> bool {
        self.bearer == BearerKind::Drb
    }

    /// Data-PDU header length in bytes.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.sn_len.header_len()
    }

    /// Reordering window for this bearer kind.
    #[inline]
    pub fn reordering_window(&self) -> u32 {
        if self.is_srb() {
            SRB_REORDERING_WINDOW
        } else {
            DRB_REORDERING_WINDOW
        }
    }

    /// Checks the bearer/SN-length combination against the RLC mode.
    ///
    /// Valid combinations (TS 36.323): SRB with 5-bit SNs; UM DRBs with 7-
    /// or 12-bit SNs; AM DRBs with 12- or 18-bit SNs.
    ///
    /// # Errors
    /// - [`ConfigError`] naming the offending combination.
    pub fn check_valid_config(&self, rb_is_um: bool) -> Result<(), ConfigError> {
        let sn_bits = self.sn_len.bits();
        match (self.bearer, rb_is_um) {
            (BearerKind::Srb, _) => {
                if self.sn_len != SnLen::Len5 {
                    return Err(ConfigError::SrbSnLength { sn_bits });
                }
            }
            (BearerKind::Drb, true) => {
                if self.sn_len != SnLen::Len7 && self.sn_len != SnLen::Len12 {
                    return Err(ConfigError::UmDrbSnLength { sn_bits });
                }
            }
            (BearerKind::Drb, false) => {
                if self.sn_len != SnLen::Len12 && self.sn_len != SnLen::Len18 {
                    return Err(ConfigError::AmDrbSnLength { sn_bits });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sn_len_derivations() {
        assert_eq!(SnLen::Len5.header_len(), 1);
        assert_eq!(SnLen::Len7.header_len(), 1);
        assert_eq!(SnLen::Len12.header_len(), 2);
        assert_eq!(SnLen::Len18.header_len(), 3);

        assert_eq!(SnLen::Len5.max_sn(), 31);
        assert_eq!(SnLen::Len7.max_sn(), 127);
        assert_eq!(SnLen::Len12.max_sn(), 4095);
        assert_eq!(SnLen::Len18.max_sn(), 262_143);
    }

    #[test]
    fn srb_accepts_only_5_bit_sn() {
        assert!(PdcpConfig::srb().check_valid_config(false).is_ok());

        let mut cfg = PdcpConfig::srb();
        cfg.sn_len = SnLen::Len12;
        assert_eq!(
            cfg.check_valid_config(false),
            Err(ConfigError::SrbSnLength { sn_bits: 12 })
        );
    }

    #[test]
    fn um_drb_accepts_7_and_12_bit_sn() {
        assert!(PdcpConfig::drb(SnLen::Len7).check_valid_config(true).is_ok());
        assert!(PdcpConfig::drb(SnLen::Len12).check_valid_config(true).is_ok());
        assert_eq!(
            PdcpConfig::drb(SnLen::Len18).check_valid_config(true),
            Err(ConfigError::UmDrbSnLength { sn_bits: 18 })
        );
    }

    #[test]
    fn am_drb_accepts_12_and_18_bit_sn() {
        assert!(PdcpConfig::drb(SnLen::Len12).check_valid_config(false).is_ok());
        assert!(PdcpConfig::drb(SnLen::Len18).check_valid_config(false).is_ok());
        assert_eq!(
            PdcpConfig::drb(SnLen::Len7).check_valid_config(false),
            Err(ConfigError::AmDrbSnLength { sn_bits: 7 })
        );
        assert_eq!(
            PdcpConfig::drb(SnLen::Len5).check_valid_config(false),
            Err(ConfigError::AmDrbSnLength { sn_bits: 5 })
        );
    }

    #[test]
    fn reordering_window_by_bearer_kind() {
        assert_eq!(PdcpConfig::srb().reordering_window(), 0);
        assert_eq!(PdcpConfig::drb(SnLen::Len12).reordering_window(), 2048);
    }
}
