//! Status Report control-PDU codec.
//!
//! Wire format (TS 36.323 section 6.2.6): first octet carries D/C = 0, the
//! 3-bit PDU type (0 = Status Report) and the high bits of the First
//! Missing SN; one or two further octets carry the remaining FMS bits. An
//! optional bitmap follows, MSB-first within each octet, where bit
//! position `sn - fms` reports the SDU with that SN.

use bytes::{BufMut, BytesMut};

use crate::config::SnLen;
use crate::constants::{
    PDCP_CONTROL_PDU_TYPE_SHIFT, PDCP_DC_FIELD_CONTROL, PDCP_PDU_TYPE_STATUS_REPORT,
    PDCP_SN12_HI_MASK, PDCP_SN18_HI_MASK,
};
use crate::error::{ParseContext, PdcpBuildingError, PdcpParsingError};
use crate::types::SequenceNumber;

/// Decoded Status Report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// First Missing SN: every SN below it is acknowledged.
    pub fms: SequenceNumber,
    /// SNs at or above FMS acknowledged by set bitmap bits.
    pub acked: Vec<SequenceNumber>,
}

/// Encodes a Status Report into `out`.
///
/// `stored_sns` are the SNs of the still-undelivered SDUs in ascending
/// order; each sets one bitmap bit. When nothing is outstanding the report
/// is just the FMS field.
///
/// # Errors
/// - [`PdcpBuildingError::StatusReportSnLength`] - SN width has no status
///   report format (only 12 and 18 bits do).
pub fn encode_status_report(
    sn_len: SnLen,
    fms: u32,
    stored_sns: &[u32],
    out: &mut BytesMut,
) -> Result<(), PdcpBuildingError> {
    let type_octet =
        (PDCP_DC_FIELD_CONTROL << 7) | (PDCP_PDU_TYPE_STATUS_REPORT << PDCP_CONTROL_PDU_TYPE_SHIFT);

    match sn_len {
        SnLen::Len12 => {
            out.put_u8(type_octet | ((fms >> 8) as u8 & PDCP_SN12_HI_MASK));
            out.put_u8(fms as u8);
        }
        SnLen::Len18 => {
            out.put_u8(type_octet | ((fms >> 16) as u8 & PDCP_SN18_HI_MASK));
            out.put_u8((fms >> 8) as u8);
            out.put_u8(fms as u8);
        }
        other => {
            return Err(PdcpBuildingError::StatusReportSnLength {
                sn_bits: other.bits(),
            });
        }
    }

    if let Some(&last_sn) = stored_sns.last() {
        let bitmap_len = (last_sn - fms + 1).div_ceil(8) as usize;
        let mut bitmap = vec![0u8; bitmap_len];
        for &sn in stored_sns {
            let offset = sn - fms;
            bitmap[(offset / 8) as usize] |= 1 << (7 - offset % 8);
        }
        out.put_slice(&bitmap);
    }

    Ok(())
}

/// Decodes a Status Report. `pdu` starts at the control-PDU type octet.
///
/// # Errors
/// - [`PdcpParsingError::NotEnoughData`] - PDU shorter than the FMS field.
/// - [`PdcpParsingError::StatusReportSnLength`] - SN width has no status
///   report format.
pub fn decode_status_report(sn_len: SnLen, pdu: &[u8]) -> Result<StatusReport, PdcpParsingError> {
    let (fms, bitmap_offset) = match sn_len {
        SnLen::Len12 => {
            if pdu.len() < 2 {
                return Err(PdcpParsingError::NotEnoughData {
                    needed: 2,
                    got: pdu.len(),
                    context: ParseContext::StatusReportFms,
                });
            }
            let fms = (((pdu[0] & PDCP_SN12_HI_MASK) as u32) << 8) | pdu[1] as u32;
            (fms, 2)
        }
        SnLen::Len18 => {
            if pdu.len() < 3 {
                return Err(PdcpParsingError::NotEnoughData {
                    needed: 3,
                    got: pdu.len(),
                    context: ParseContext::StatusReportFms,
                });
            }
            let fms = (((pdu[0] & PDCP_SN18_HI_MASK) as u32) << 16)
                | ((pdu[1] as u32) << 8)
                | pdu[2] as u32;
            (fms, 3)
        }
        other => {
            return Err(PdcpParsingError::StatusReportSnLength {
                sn_bits: other.bits(),
            });
        }
    };

    let mut acked = Vec::new();
    for (i, octet) in pdu[bitmap_offset..].iter().enumerate() {
        for j in 0..8u32 {
            if octet & (1 << (7 - j)) != 0 {
                acked.push(SequenceNumber::new(fms + 8 * i as u32 + j));
            }
        }
    }

    Ok(StatusReport {
        fms: SequenceNumber::new(fms),
        acked,
    })
}
