//! AMF0 encoder and decoder
//!
//! AMF0 is the original Action Message Format used in Flash/RTMP.
//! Reference: AMF0 File Format Specification (amf0-file-format-specification.pdf)
//!
//! Type Markers:
//! ```text
//! 0x00 - Number (IEEE 754 double)
//! 0x01 - Boolean
//! 0x02 - String (16-bit length prefix)
//! 0x03 - Object (key-value pairs until 0x000009)
//! 0x04 - MovieClip (reserved, not supported)
//! 0x05 - Null
//! 0x06 - Undefined
//! 0x07 - Reference (16-bit index)
//! 0x08 - ECMA Array (associative array)
//! 0x09 - Object End (0x000009 sequence)
//! 0x0A - Strict Array (dense array)
//! 0x0B - Date (double + timezone)
//! 0x0C - Long String (32-bit length prefix)
//! 0x0D - Unsupported
//! 0x0E - RecordSet (reserved, not supported)
//! 0x0F - XML Document
//! 0x10 - Typed Object (class name + properties)
//! 0x11 - AVM+ (switch to AMF3)
//! ```
//!
//! Decoding is zero-copy: strings and keys in the returned tree borrow
//! the input slice. Complex values are recorded in a [`ReferenceTable`]
//! as soon as they are fully decoded, in completion order, and a
//! Reference marker resolves to a second handle on the recorded node.
//!
//! Encoding writes into a caller-provided buffer. [`encoded_size`] gives
//! an upper bound on the bytes needed, exact unless the tree contains
//! [`Property::Reference`] values (which the encoder refuses). Aliased
//! nodes are always written out in full.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::amf3::{Amf3Decoder, Amf3Encoder};
use super::primitive::{decode_double, decode_u16, decode_u32, encode_double, encode_u16, encode_u32};
use super::value::{AmfStr, Entries, Node, Property};
use crate::config::DecoderConfig;
use crate::error::{AmfError, Result};

// AMF0 type markers
pub const MARKER_NUMBER: u8 = 0x00;
pub const MARKER_BOOLEAN: u8 = 0x01;
pub const MARKER_STRING: u8 = 0x02;
pub const MARKER_OBJECT: u8 = 0x03;
pub const MARKER_MOVIECLIP: u8 = 0x04;
pub const MARKER_NULL: u8 = 0x05;
pub const MARKER_UNDEFINED: u8 = 0x06;
pub const MARKER_REFERENCE: u8 = 0x07;
pub const MARKER_ECMA_ARRAY: u8 = 0x08;
pub const MARKER_OBJECT_END: u8 = 0x09;
pub const MARKER_STRICT_ARRAY: u8 = 0x0A;
pub const MARKER_DATE: u8 = 0x0B;
pub const MARKER_LONG_STRING: u8 = 0x0C;
pub const MARKER_UNSUPPORTED: u8 = 0x0D;
pub const MARKER_RECORDSET: u8 = 0x0E;
pub const MARKER_XML_DOCUMENT: u8 = 0x0F;
pub const MARKER_TYPED_OBJECT: u8 = 0x10;
pub const MARKER_AVMPLUS: u8 = 0x11;

/// Terminates every map-mode body
pub const OBJECT_END: [u8; 3] = [0x00, 0x00, MARKER_OBJECT_END];

/// Complex values seen so far in one decode call
///
/// Indices are positions in completion order. The table lives for a
/// single top-level decode and is threaded through every nested call.
#[derive(Debug, Default)]
pub struct ReferenceTable<'a> {
    entries: Vec<Property<'a>>,
}

impl<'a> ReferenceTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a fully decoded complex value and hand it back
    pub fn register(&mut self, prop: Property<'a>) -> Property<'a> {
        self.entries.push(prop.clone());
        prop
    }

    /// Second handle on a recorded value
    pub fn resolve(&self, index: u16) -> Result<Property<'a>> {
        self.entries
            .get(index as usize)
            .cloned()
            .ok_or(AmfError::InvalidReference {
                index,
                len: self.entries.len(),
            })
    }
}

/// Bounds-checked cursor over the decode input
///
/// Movement goes through [`Buf`]; slices handed out borrow the input.
struct Reader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn consumed(&self) -> usize {
        self.len - self.buf.remaining()
    }

    fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(AmfError::Underflow {
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let buf: &'a [u8] = self.buf;
        let head = &buf[..len];
        self.buf.advance(len);
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(decode_u16(self.take_array()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(decode_u32(self.take_array()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(decode_double(self.take_array()?))
    }

    /// Consume the object-end marker if it is next
    fn eat_object_end(&mut self) -> bool {
        if self.buf.starts_with(&OBJECT_END) {
            self.buf.advance(OBJECT_END.len());
            true
        } else {
            false
        }
    }

    fn read_str16(&mut self) -> Result<AmfStr<'a>> {
        let len = self.read_u16()? as usize;
        Ok(AmfStr::borrowed(self.take(len)?))
    }

    fn read_str32(&mut self) -> Result<AmfStr<'a>> {
        let len = self.read_u32()? as usize;
        Ok(AmfStr::borrowed(self.take(len)?))
    }
}

/// AMF0 decoder
#[derive(Debug, Clone, Default)]
pub struct Amf0Decoder {
    config: DecoderConfig,
}

impl Amf0Decoder {
    /// Create a new decoder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create decoder with explicit limits
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a complete AMF0 payload as a top-level list
    ///
    /// Returns the tree and the number of bytes consumed. Decoding stops
    /// at the end of input or at a top-level object-end marker.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> Result<(Node<'a>, usize)> {
        let mut references = ReferenceTable::new();
        let result = self.decode_body(buf, false, None, &mut references);
        match &result {
            Ok((node, consumed)) => tracing::trace!(
                consumed,
                values = node.len(),
                references = references.len(),
                "Decoded AMF0 payload"
            ),
            Err(e) => tracing::debug!(error = %e, "AMF0 decode failed"),
        }
        result
    }

    /// Decode one container body against an existing reference table
    ///
    /// `is_map` selects key/value pairs terminated by the object-end
    /// marker. `limit` caps the number of list elements (strict arrays);
    /// `None` reads list elements until the input is exhausted.
    pub fn decode_body<'a>(
        &self,
        buf: &'a [u8],
        is_map: bool,
        limit: Option<u32>,
        references: &mut ReferenceTable<'a>,
    ) -> Result<(Node<'a>, usize)> {
        let mut reader = Reader::new(buf);
        let node = self.decode_node(&mut reader, is_map, limit, references, 0)?;
        Ok((node, reader.consumed()))
    }

    fn decode_node<'a>(
        &self,
        reader: &mut Reader<'a>,
        is_map: bool,
        limit: Option<u32>,
        references: &mut ReferenceTable<'a>,
        depth: usize,
    ) -> Result<Node<'a>> {
        if depth > self.config.max_depth {
            return Err(AmfError::NestingTooDeep(self.config.max_depth));
        }

        tracing::trace!(
            is_map,
            limit = ?limit,
            remaining = reader.remaining(),
            depth,
            "Decoding AMF0 container"
        );

        let mut entries = if is_map {
            Entries::Map(BTreeMap::new())
        } else {
            let hint = limit.map_or(0, |n| self.config.prealloc_hint(n));
            Entries::List(Vec::with_capacity(hint))
        };
        let mut count: u32 = 0;

        loop {
            if limit.is_some_and(|max| count >= max) {
                break;
            }

            if reader.is_empty() {
                if is_map {
                    // Map bodies must close with the end marker
                    return Err(AmfError::Underflow {
                        needed: OBJECT_END.len(),
                        available: 0,
                    });
                }
                if limit.is_some() {
                    return Err(AmfError::Underflow {
                        needed: 1,
                        available: 0,
                    });
                }
                break;
            }

            if reader.eat_object_end() {
                break;
            }

            match &mut entries {
                Entries::Map(map) => {
                    // Key prefix plus at least a one-byte value
                    reader.ensure(4)?;
                    let key = reader.read_str16()?;
                    let value = self.decode_property(reader, references, depth)?;
                    map.insert(key, value);
                }
                Entries::List(items) => {
                    let value = self.decode_property(reader, references, depth)?;
                    items.push(value);
                }
            }
            count = count.saturating_add(1);
        }

        Ok(Node::from_entries(entries))
    }

    fn decode_property<'a>(
        &self,
        reader: &mut Reader<'a>,
        references: &mut ReferenceTable<'a>,
        depth: usize,
    ) -> Result<Property<'a>> {
        let marker = reader.read_u8()?;
        match marker {
            MARKER_NUMBER => Ok(Property::Number(reader.read_double()?)),
            MARKER_BOOLEAN => Ok(Property::Boolean(reader.read_u8()? != 0)),
            MARKER_STRING => Ok(Property::String(reader.read_str16()?)),
            MARKER_OBJECT => {
                let node = self.decode_node(reader, true, None, references, depth + 1)?;
                Ok(references.register(Property::Object(Arc::new(node))))
            }
            MARKER_ECMA_ARRAY => {
                // Count hint, not always accurate
                let _count = reader.read_u32()?;
                let node = self.decode_node(reader, true, None, references, depth + 1)?;
                Ok(references.register(Property::EcmaArray(Arc::new(node))))
            }
            MARKER_STRICT_ARRAY => {
                let count = reader.read_u32()?;
                let node = self.decode_node(reader, false, Some(count), references, depth + 1)?;
                Ok(references.register(Property::StrictArray(Arc::new(node))))
            }
            MARKER_TYPED_OBJECT => {
                let class_name = reader.read_str16()?;
                let mut node = self.decode_node(reader, true, None, references, depth + 1)?;
                node.set_name(class_name);
                Ok(references.register(Property::TypedObject(Arc::new(node))))
            }
            MARKER_REFERENCE => {
                let index = reader.read_u16()?;
                references.resolve(index).map_err(|e| {
                    tracing::debug!(index, table = references.len(), "Dangling AMF0 reference");
                    e
                })
            }
            MARKER_DATE => {
                reader.ensure(10)?;
                let timestamp = reader.read_double()?;
                // Timezone offset (deprecated, always discarded)
                reader.take(2)?;
                Ok(Property::Date(timestamp))
            }
            MARKER_LONG_STRING => Ok(Property::LongString(reader.read_str32()?)),
            MARKER_XML_DOCUMENT => Ok(Property::XmlDocument(reader.read_str32()?)),
            MARKER_NULL | MARKER_UNDEFINED | MARKER_UNSUPPORTED => Ok(Property::Null),
            MARKER_MOVIECLIP | MARKER_RECORDSET => {
                tracing::debug!(marker, "Reserved AMF0 marker");
                Err(AmfError::UnsupportedType(marker))
            }
            MARKER_AVMPLUS => {
                // AMF3 decodes in place and advances the cursor past its value
                Amf3Decoder::new()
                    .decode(&mut reader.buf)
                    .map(|node| Property::Avmplus(Arc::new(node)))
            }
            _ => {
                tracing::debug!(marker, "Unknown AMF0 marker");
                Err(AmfError::UnknownType(marker))
            }
        }
    }
}

/// Bytes needed to encode one property, marker included
pub fn property_size(prop: &Property<'_>) -> usize {
    match prop {
        Property::Number(_) => 9,
        Property::Boolean(_) => 2,
        Property::String(s) => 3 + s.len(),
        Property::Object(node) | Property::Avmplus(node) => 1 + encoded_size(node),
        Property::EcmaArray(node) | Property::StrictArray(node) => 5 + encoded_size(node),
        Property::TypedObject(node) => 3 + node.name().len() + encoded_size(node),
        Property::Reference(_) => 3,
        Property::ObjectEnd => 3,
        Property::Null | Property::Undefined | Property::Unsupported => 1,
        Property::Date(_) => 11,
        Property::LongString(s) | Property::XmlDocument(s) => 5 + s.len(),
    }
}

/// Upper bound on the bytes `encode` writes for `node`
///
/// Walks the whole tree, so size once and reuse the result.
pub fn encoded_size(node: &Node<'_>) -> usize {
    match node.entries() {
        Entries::Map(map) => {
            map.iter()
                .map(|(key, value)| key.len() + 2 + property_size(value))
                .sum::<usize>()
                + OBJECT_END.len()
        }
        Entries::List(items) => items.iter().map(property_size).sum(),
    }
}

/// Encode `node` into `out`, returning bytes written
///
/// A list-mode node (the usual top level) is written as a bare sequence
/// of values. A map-mode node is written as key/value pairs followed by
/// the object-end marker.
pub fn encode(node: &Node<'_>, out: &mut [u8]) -> Result<usize> {
    let mut buf = out;
    encode_node(node, &mut buf)
}

/// Encode a single property into `out`, returning bytes written
pub fn encode_property(prop: &Property<'_>, out: &mut [u8]) -> Result<usize> {
    let mut buf = out;
    encode_value(prop, &mut buf)
}

/// Encode `node` into a freshly allocated buffer
pub fn encode_to_bytes(node: &Node<'_>) -> Result<Bytes> {
    let size = encoded_size(node);
    tracing::trace!(size, "Encoding AMF0 payload");
    let mut buf = BytesMut::with_capacity(size);
    encode_node(node, &mut buf)?;
    Ok(buf.freeze())
}

/// Convenience function to decode a payload with default settings
pub fn decode(data: &[u8]) -> Result<(Node<'_>, usize)> {
    Amf0Decoder::new().decode(data)
}

fn reserve<B: BufMut>(out: &B, needed: usize) -> Result<()> {
    let available = out.remaining_mut();
    if available < needed {
        return Err(AmfError::Overflow { needed, available });
    }
    Ok(())
}

fn check_len(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(AmfError::LengthOverflow { len, max });
    }
    Ok(())
}

/// Only typed objects carry a class name on the wire
fn check_container(node: &Node<'_>, marker: u8) -> Result<()> {
    let fits = match marker {
        MARKER_TYPED_OBJECT => node.is_map(),
        MARKER_STRICT_ARRAY => !node.is_map() && node.name().is_empty(),
        _ => node.is_map() && node.name().is_empty(),
    };
    if !fits {
        return Err(AmfError::ContainerMismatch(marker));
    }
    Ok(())
}

fn encode_node<B: BufMut>(node: &Node<'_>, out: &mut B) -> Result<usize> {
    match node.entries() {
        Entries::Map(map) => {
            let mut written = 0;
            for (key, value) in map {
                check_len(key.len(), u16::MAX as usize)?;
                reserve(out, 2 + key.len())?;
                out.put_slice(&encode_u16(key.len() as u16));
                out.put_slice(key.as_bytes());
                written += 2 + key.len();
                written += encode_value(value, out)?;
            }
            reserve(out, OBJECT_END.len())?;
            out.put_slice(&OBJECT_END);
            Ok(written + OBJECT_END.len())
        }
        Entries::List(items) => {
            let mut written = 0;
            for value in items {
                written += encode_value(value, out)?;
            }
            Ok(written)
        }
    }
}

fn encode_value<B: BufMut>(prop: &Property<'_>, out: &mut B) -> Result<usize> {
    let marker = prop.marker();
    match prop {
        Property::ObjectEnd => {
            reserve(out, OBJECT_END.len())?;
            out.put_slice(&OBJECT_END);
            Ok(OBJECT_END.len())
        }
        Property::Number(n) => {
            reserve(out, 9)?;
            out.put_u8(marker);
            out.put_slice(&encode_double(*n));
            Ok(9)
        }
        Property::Boolean(b) => {
            reserve(out, 2)?;
            out.put_u8(marker);
            out.put_u8(u8::from(*b));
            Ok(2)
        }
        Property::String(s) => {
            check_len(s.len(), u16::MAX as usize)?;
            reserve(out, 3 + s.len())?;
            out.put_u8(marker);
            out.put_slice(&encode_u16(s.len() as u16));
            out.put_slice(s.as_bytes());
            Ok(3 + s.len())
        }
        Property::LongString(s) | Property::XmlDocument(s) => {
            check_len(s.len(), u32::MAX as usize)?;
            reserve(out, 5 + s.len())?;
            out.put_u8(marker);
            out.put_slice(&encode_u32(s.len() as u32));
            out.put_slice(s.as_bytes());
            Ok(5 + s.len())
        }
        Property::Null | Property::Undefined | Property::Unsupported => {
            reserve(out, 1)?;
            out.put_u8(marker);
            Ok(1)
        }
        Property::Date(timestamp) => {
            reserve(out, 11)?;
            out.put_u8(marker);
            out.put_slice(&encode_double(*timestamp));
            out.put_slice(&[0x00, 0x00]); // Timezone (deprecated)
            Ok(11)
        }
        Property::Object(node) => {
            check_container(node, marker)?;
            reserve(out, 1)?;
            out.put_u8(marker);
            Ok(1 + encode_node(node, out)?)
        }
        Property::EcmaArray(node) => {
            check_container(node, marker)?;
            check_len(node.len(), u32::MAX as usize)?;
            reserve(out, 5)?;
            out.put_u8(marker);
            out.put_slice(&encode_u32(node.len() as u32));
            Ok(5 + encode_node(node, out)?)
        }
        Property::TypedObject(node) => {
            check_container(node, marker)?;
            let name = node.name();
            check_len(name.len(), u16::MAX as usize)?;
            reserve(out, 3 + name.len())?;
            out.put_u8(marker);
            out.put_slice(&encode_u16(name.len() as u16));
            out.put_slice(name.as_bytes());
            Ok(3 + name.len() + encode_node(node, out)?)
        }
        Property::StrictArray(node) => {
            check_container(node, marker)?;
            check_len(node.len(), u32::MAX as usize)?;
            reserve(out, 5)?;
            out.put_u8(marker);
            out.put_slice(&encode_u32(node.len() as u32));
            Ok(5 + encode_node(node, out)?)
        }
        Property::Reference(_) => Err(AmfError::NotImplemented("AMF0 reference encoding")),
        Property::Avmplus(node) => {
            reserve(out, 1)?;
            out.put_u8(marker);
            let written = Amf3Encoder::new().encode(node, out)?;
            Ok(1 + written)
        }
    }
}
