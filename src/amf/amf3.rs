//! AMF3 extension point
//!
//! AMF3 is the ActionScript 3.0 serialization format. Inside an AMF0
//! stream it is introduced by the avmplus-object marker (0x11). Only the
//! U29 integer primitive (see [`super::primitive`]) and the marker table
//! exist so far; value decoding and encoding fail explicitly with
//! [`AmfError::NotImplemented`] rather than skipping data.
//!
//! Type Markers:
//! ```text
//! 0x00 - Undefined
//! 0x01 - Null
//! 0x02 - False
//! 0x03 - True
//! 0x04 - Integer (U29, sign-extended)
//! 0x05 - Double
//! 0x06 - String (U29 length/reference header)
//! 0x07 - XML Document
//! 0x08 - Date
//! 0x09 - Array
//! 0x0A - Object
//! 0x0B - XML
//! 0x0C - ByteArray
//! 0x0D - Vector<int>
//! 0x0E - Vector<uint>
//! 0x0F - Vector<Number>
//! 0x10 - Vector<Object>
//! 0x11 - Dictionary
//! ```

use bytes::BufMut;

use super::value::Node;
use crate::error::{AmfError, Result};

/// AMF3 type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Amf3Marker {
    Undefined = 0x00,
    Null = 0x01,
    False = 0x02,
    True = 0x03,
    Integer = 0x04,
    Double = 0x05,
    String = 0x06,
    XmlDocument = 0x07,
    Date = 0x08,
    Array = 0x09,
    Object = 0x0A,
    Xml = 0x0B,
    ByteArray = 0x0C,
    VectorInt = 0x0D,
    VectorUint = 0x0E,
    VectorDouble = 0x0F,
    VectorObject = 0x10,
    Dictionary = 0x11,
}

impl Amf3Marker {
    /// Markers whose payload starts with a U29 length-or-reference header
    pub fn has_reference_header(self) -> bool {
        !matches!(
            self,
            Amf3Marker::Undefined
                | Amf3Marker::Null
                | Amf3Marker::False
                | Amf3Marker::True
                | Amf3Marker::Integer
                | Amf3Marker::Double
        )
    }
}

impl TryFrom<u8> for Amf3Marker {
    type Error = AmfError;

    fn try_from(value: u8) -> Result<Self> {
        let marker = match value {
            0x00 => Amf3Marker::Undefined,
            0x01 => Amf3Marker::Null,
            0x02 => Amf3Marker::False,
            0x03 => Amf3Marker::True,
            0x04 => Amf3Marker::Integer,
            0x05 => Amf3Marker::Double,
            0x06 => Amf3Marker::String,
            0x07 => Amf3Marker::XmlDocument,
            0x08 => Amf3Marker::Date,
            0x09 => Amf3Marker::Array,
            0x0A => Amf3Marker::Object,
            0x0B => Amf3Marker::Xml,
            0x0C => Amf3Marker::ByteArray,
            0x0D => Amf3Marker::VectorInt,
            0x0E => Amf3Marker::VectorUint,
            0x0F => Amf3Marker::VectorDouble,
            0x10 => Amf3Marker::VectorObject,
            0x11 => Amf3Marker::Dictionary,
            _ => return Err(AmfError::UnknownType(value)),
        };
        Ok(marker)
    }
}

/// AMF3 decoder
#[derive(Debug, Default)]
pub struct Amf3Decoder {}

impl Amf3Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one AMF3 value from the head of `buf`
    ///
    /// The marker is validated, then decoding fails with
    /// `NotImplemented`. `buf` is not advanced on failure.
    pub fn decode<'a>(&mut self, buf: &mut &'a [u8]) -> Result<Node<'a>> {
        let byte = *buf.first().ok_or(AmfError::Underflow {
            needed: 1,
            available: 0,
        })?;
        let marker = Amf3Marker::try_from(byte)?;
        tracing::debug!(?marker, "AMF3 value in AMF0 stream");
        Err(AmfError::NotImplemented("AMF3 decoding"))
    }
}

/// AMF3 encoder
#[derive(Debug, Default)]
pub struct Amf3Encoder {}

impl Amf3Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode<B: BufMut>(&mut self, _node: &Node<'_>, _out: &mut B) -> Result<usize> {
        Err(AmfError::NotImplemented("AMF3 encoding"))
    }
}
