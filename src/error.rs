//! PDCP error types.
//!
//! Distinguishes between PDU parsing errors, PDU building errors and bearer
//! configuration errors, consolidated under [`PdcpError`]. The `thiserror`
//! crate is used for ergonomic error definitions.
//!
//! None of these cross the entity's public entry points: a malformed PDU or
//! a failed allocation is logged and dropped there (TS 36.323 leaves
//! recovery to RLC retransmission and upper-layer timeouts). The codecs and
//! construction-time validation return them internally.

use thiserror::Error;

use crate::types::{Count, Lcid};

/// Context types for parsing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    DataHeader,
    StatusReportFms,
}

impl std::fmt::Display for ParseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DataHeader => "data PDU header",
            Self::StatusReportFms => "status report FMS field",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised while parsing a received PDCP PDU.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdcpParsingError {
    /// Insufficient data to parse a complete field or structure.
    #[error("incomplete PDU: needed {needed} bytes, got {got} for {context}")]
    NotEnoughData {
        needed: usize,
        got: usize,
        context: ParseContext,
    },

    /// Status reports exist only for the 12- and 18-bit SN formats.
    #[error("status report not defined for {sn_bits}-bit SNs")]
    StatusReportSnLength { sn_bits: u8 },
}

/// Errors raised while building a PDCP PDU.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdcpBuildingError {
    /// Status reports exist only for the 12- and 18-bit SN formats.
    #[error("status report not defined for {sn_bits}-bit SNs")]
    StatusReportSnLength { sn_bits: u8 },

    /// SN value does not fit the configured SN width.
    #[error("SN {sn} exceeds the {sn_bits}-bit SN space")]
    SnOutOfRange { sn: u32, sn_bits: u8 },
}

/// Bearer/SN-length combinations rejected by `check_valid_config`.
///
/// TS 36.323 allows: SRB with 5-bit SNs, UM DRBs with 7- or 12-bit SNs,
/// AM DRBs with 12- or 18-bit SNs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SRB requires a 5-bit SN, got {sn_bits} bits")]
    SrbSnLength { sn_bits: u8 },

    #[error("UM DRB requires a 7- or 12-bit SN, got {sn_bits} bits")]
    UmDrbSnLength { sn_bits: u8 },

    #[error("AM DRB requires a 12- or 18-bit SN, got {sn_bits} bits")]
    AmDrbSnLength { sn_bits: u8 },
}

/// Main error type for PDCP operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdcpError {
    /// Error while parsing a received PDU.
    #[error("parsing error: {0}")]
    Parsing(#[from] PdcpParsingError),

    /// Error while building a PDU.
    #[error("building error: {0}")]
    Building(#[from] PdcpBuildingError),

    /// Invalid bearer configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An SDU is already stored for this TX COUNT. Indicates a bug upstream:
    /// an SDU must never overwrite an earlier undelivered one.
    #[error("SDU already stored for {0}")]
    DuplicateStoreEntry(Count),

    /// No entity registered for the given logical channel.
    #[error("no PDCP entity for {0}")]
    UnknownBearer(Lcid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enough_data_display() {
        let err = PdcpParsingError::NotEnoughData {
            needed: 3,
            got: 1,
            context: ParseContext::DataHeader,
        };
        assert_eq!(
            format!("{}", err),
            "incomplete PDU: needed 3 bytes, got 1 for data PDU header"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::UmDrbSnLength { sn_bits: 18 };
        assert_eq!(
            format!("{}", err),
            "UM DRB requires a 7- or 12-bit SN, got 18 bits"
        );
    }

    #[test]
    fn pdcp_error_from_parsing_error() {
        let parsing = PdcpParsingError::StatusReportSnLength { sn_bits: 7 };
        let err = PdcpError::from(parsing.clone());
        match err {
            PdcpError::Parsing(inner) => assert_eq!(inner, parsing),
            _ => panic!("incorrect PdcpError variant"),
        }
    }

    #[test]
    fn duplicate_store_entry_display() {
        let err = PdcpError::DuplicateStoreEntry(Count::new(42));
        assert_eq!(format!("{}", err), "SDU already stored for COUNT42");
    }
}
