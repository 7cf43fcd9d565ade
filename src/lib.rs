//! amf-rs: Zero-copy AMF0 decoder and encoder
//!
//! This library provides the Action Message Format codec used by RTMP
//! and Flash remoting:
//! - Recursive AMF0 decoding into a tree that borrows the input buffer
//! - Reference (back-pointer) resolution with shared node identity
//! - Exact size estimation and encoding into caller-provided buffers
//! - Network byte order primitives, including AMF3's U29 integer
//!
//! # Example
//!
//! ```
//! use amf_rs::amf::{self, Node, Property};
//!
//! let mut meta = Node::map();
//! meta.insert("width", 1280.0).insert("encoder", "obs");
//!
//! let mut root = Node::list();
//! root.push("onMetaData").push(Property::ecma_array(meta));
//!
//! let mut buf = vec![0u8; amf::encoded_size(&root)];
//! let written = amf::encode(&root, &mut buf)?;
//!
//! let (decoded, consumed) = amf::decode(&buf)?;
//! assert_eq!(consumed, written);
//! assert_eq!(decoded, root);
//! # Ok::<(), amf_rs::AmfError>(())
//! ```

pub mod amf;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use amf::{Amf0Decoder, AmfStr, Node, Property};
pub use config::DecoderConfig;
pub use error::{AmfError, Result};
