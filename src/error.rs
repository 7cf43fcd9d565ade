//! Error types for amf-rs

use std::fmt;

/// Result type alias using the library's error type
pub type Result<T> = std::result::Result<T, AmfError>;

/// AMF encoding/decoding errors
///
/// Every failure is fatal to the call that produced it. Decode never
/// returns a partially populated tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmfError {
    /// Input is shorter than the field being decoded.
    ///
    /// The caller may retry once more bytes are available.
    Underflow { needed: usize, available: usize },
    /// Output buffer is too small for the field being encoded
    Overflow { needed: usize, available: usize },
    /// Reserved marker (MovieClip, RecordSet)
    UnsupportedType(u8),
    /// Marker outside the AMF0 type table
    UnknownType(u8),
    /// Reference index past the end of the reference table
    InvalidReference { index: u16, len: usize },
    /// Extension point with no implementation (AMF3, reference encoding)
    NotImplemented(&'static str),
    /// Container nesting exceeded the configured limit
    NestingTooDeep(usize),
    /// String, key or type name too long for its length prefix
    LengthOverflow { len: usize, max: usize },
    /// Container property wrapping a node in the wrong storage mode, or a
    /// class name on anything but a typed object
    ContainerMismatch(u8),
    /// Integer does not fit in AMF3's 29-bit encoding
    ValueOutOfRange(u32),
}

impl fmt::Display for AmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmfError::Underflow { needed, available } => write!(
                f,
                "Unexpected end of AMF data: need {} bytes, {} available",
                needed, available
            ),
            AmfError::Overflow { needed, available } => write!(
                f,
                "AMF output buffer too small: need {} bytes, {} available",
                needed, available
            ),
            AmfError::UnsupportedType(m) => write!(f, "Unsupported AMF marker: 0x{:02x}", m),
            AmfError::UnknownType(m) => write!(f, "Unknown AMF marker: 0x{:02x}", m),
            AmfError::InvalidReference { index, len } => write!(
                f,
                "Invalid AMF reference: {} (table holds {})",
                index, len
            ),
            AmfError::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            AmfError::NestingTooDeep(max) => write!(f, "AMF nesting too deep (max {})", max),
            AmfError::LengthOverflow { len, max } => {
                write!(f, "AMF string length {} exceeds prefix maximum {}", len, max)
            }
            AmfError::ContainerMismatch(m) => {
                write!(f, "Container storage mode does not match marker 0x{:02x}", m)
            }
            AmfError::ValueOutOfRange(v) => write!(f, "Value {} out of 29-bit range", v),
        }
    }
}

impl std::error::Error for AmfError {}

impl AmfError {
    /// Whether more input could make the failed decode succeed
    pub fn is_underflow(&self) -> bool {
        matches!(self, AmfError::Underflow { .. })
    }
}
