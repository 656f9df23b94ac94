//! Data-PDU header codec.
//!
//! Header layouts per TS 36.323 section 6.2: SRBs carry a bare 5-bit SN in
//! one octet; DRB headers start with the D/C bit and spread the SN over
//! one, two or three octets depending on the configured width.

use bytes::{BufMut, BytesMut};

use crate::config::{BearerKind, SnLen};
use crate::constants::{
    PDCP_CONTROL_PDU_TYPE_MASK, PDCP_CONTROL_PDU_TYPE_SHIFT, PDCP_DC_BIT_MASK, PDCP_SN12_HI_MASK,
    PDCP_SN18_HI_MASK, PDCP_SN5_MASK, PDCP_SN7_MASK,
};
use crate::error::{ParseContext, PdcpBuildingError, PdcpParsingError};
use crate::types::SequenceNumber;

/// Appends the data-PDU header for `sn` to `out`.
///
/// # Errors
/// - [`PdcpBuildingError::SnOutOfRange`] - `sn` does not fit the SN width.
pub fn pack_data_header(
    bearer: BearerKind,
    sn_len: SnLen,
    sn: u32,
    out: &mut BytesMut,
) -> Result<(), PdcpBuildingError> {
    if sn > sn_len.max_sn() {
        return Err(PdcpBuildingError::SnOutOfRange {
            sn,
            sn_bits: sn_len.bits(),
        });
    }

    let dc_bit = match bearer {
        BearerKind::Srb => 0,
        BearerKind::Drb => PDCP_DC_BIT_MASK,
    };

    match sn_len {
        SnLen::Len5 => {
            out.put_u8(sn as u8 & PDCP_SN5_MASK);
        }
        SnLen::Len7 => {
            out.put_u8(dc_bit | (sn as u8 & PDCP_SN7_MASK));
        }
        SnLen::Len12 => {
            out.put_u8(dc_bit | ((sn >> 8) as u8 & PDCP_SN12_HI_MASK));
            out.put_u8(sn as u8);
        }
        SnLen::Len18 => {
            out.put_u8(dc_bit | ((sn >> 16) as u8 & PDCP_SN18_HI_MASK));
            out.put_u8((sn >> 8) as u8);
            out.put_u8(sn as u8);
        }
    }
    Ok(())
}

/// Reads the SN from a data-PDU header without consuming it.
///
/// # Errors
/// - [`PdcpParsingError::NotEnoughData`] - PDU shorter than the header.
pub fn read_data_sn(sn_len: SnLen, pdu: &[u8]) -> Result<SequenceNumber, PdcpParsingError> {
    let hdr_len = sn_len.header_len();
    if pdu.len() < hdr_len {
        return Err(PdcpParsingError::NotEnoughData {
            needed: hdr_len,
            got: pdu.len(),
            context: ParseContext::DataHeader,
        });
    }

    let sn = match sn_len {
        SnLen::Len5 => (pdu[0] & PDCP_SN5_MASK) as u32,
        SnLen::Len7 => (pdu[0] & PDCP_SN7_MASK) as u32,
        SnLen::Len12 => (((pdu[0] & PDCP_SN12_HI_MASK) as u32) << 8) | pdu[1] as u32,
        SnLen::Len18 => {
            (((pdu[0] & PDCP_SN18_HI_MASK) as u32) << 16)
                | ((pdu[1] as u32) << 8)
                | pdu[2] as u32
        }
    };
    Ok(SequenceNumber::new(sn))
}

/// Whether the first octet of a DRB PDU marks a control PDU (D/C = 0).
#[inline]
pub fn is_control_pdu(first_octet: u8) -> bool {
    first_octet & PDCP_DC_BIT_MASK == 0
}

/// The 3-bit PDU-type field of a control PDU's first octet.
#[inline]
pub fn control_pdu_type(first_octet: u8) -> u8 {
    (first_octet >> PDCP_CONTROL_PDU_TYPE_SHIFT) & PDCP_CONTROL_PDU_TYPE_MASK
}
