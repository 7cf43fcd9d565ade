//! AMF (Action Message Format) implementation
//!
//! AMF is Adobe's binary serialization format used in RTMP and Flash
//! remoting for encoding command parameters and metadata. This module
//! implements AMF0 (original format) over a zero-copy value tree. AMF3
//! (ActionScript 3.0 format) is encapsulated inside AMF0 via the
//! avmplus-object marker (0x11); only its integer primitive and marker
//! table are implemented.

pub mod amf0;
pub mod amf3;
pub mod primitive;
pub mod value;

#[cfg(test)]
mod proptests;

pub use amf0::{decode, encode, encode_property, encode_to_bytes, encoded_size, property_size};
pub use amf0::{Amf0Decoder, ReferenceTable};
pub use amf3::{Amf3Decoder, Amf3Encoder, Amf3Marker};
pub use value::{AmfStr, Entries, Node, NodeRef, Property};
