//! Core type definitions for the PDCP entity.
//!
//! Provides zero-cost newtypes so that logical channel IDs, sequence
//! numbers and COUNT values cannot be mixed up at call sites. All types
//! are `#[repr(transparent)]` wrappers around their wire representation.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Macro to generate PDCP newtype wrappers with common implementations.
macro_rules! pdcp_newtype {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty) => $prefix:literal
        $(, custom_methods: { $($custom:tt)* })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[derive(Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Creates a new instance.
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Raw value.
            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }

            $($($custom)*)?
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl Deref for $name {
            type Target = $inner;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(value: $name) -> $inner {
                value.0
            }
        }

        impl PartialEq<$inner> for $name {
            #[inline]
            fn eq(&self, other: &$inner) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for $inner {
            #[inline]
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }
    };
}

pdcp_newtype!(
    /// Logical channel identifier naming the radio bearer an entity serves.
    Lcid(u32) => "LCID"
);

pdcp_newtype!(
    /// PDCP sequence number as carried on the wire (5, 7, 12 or 18 bits).
    SequenceNumber(u32) => "SN"
);

pdcp_newtype!(
    /// 32-bit COUNT: the hyper frame number concatenated with the SN.
    ///
    /// COUNT is never stored by the entity; it is derived on every transmit
    /// and reconstructed on every receive, and feeds the security primitives
    /// as their per-packet nonce.
    Count(u32) => "COUNT",
    custom_methods: {
        /// Builds a COUNT from its HFN and SN parts for a given SN width.
        #[inline]
        pub const fn from_parts(hfn: u32, sn: u32, sn_bits: u8) -> Self {
            Self((hfn << sn_bits) | sn)
        }

        /// The SN part of this COUNT for a given SN width.
        #[inline]
        pub const fn sn(self, sn_bits: u8) -> SequenceNumber {
            SequenceNumber::new(self.0 & ((1u32 << sn_bits) - 1))
        }

        /// The HFN part of this COUNT for a given SN width.
        #[inline]
        pub const fn hfn(self, sn_bits: u8) -> u32 {
            self.0 >> sn_bits
        }
    }
);
