//! AMF value types
//!
//! A decoded payload is a tree of [`Node`]s. Each node holds either an
//! ordered list of [`Property`] values or a key→value map, never both.
//! String payloads and keys are [`AmfStr`] views that borrow the input
//! buffer, so a decoded tree cannot outlive the bytes it was decoded from.
//! Use [`Node::to_static`] to detach a tree from its buffer.
//!
//! Complex values (objects, ECMA arrays, strict arrays, typed objects) are
//! held through a shared handle ([`NodeRef`]). A REFERENCE on the wire
//! resolves to a second handle to the same node.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{AmfError, Result};

use super::amf0::{
    MARKER_AVMPLUS, MARKER_BOOLEAN, MARKER_DATE, MARKER_ECMA_ARRAY, MARKER_LONG_STRING,
    MARKER_NULL, MARKER_NUMBER, MARKER_OBJECT, MARKER_OBJECT_END, MARKER_REFERENCE,
    MARKER_STRICT_ARRAY, MARKER_STRING, MARKER_TYPED_OBJECT, MARKER_UNDEFINED,
    MARKER_UNSUPPORTED, MARKER_XML_DOCUMENT,
};

/// Shared handle to a complex value
pub type NodeRef<'a> = Arc<Node<'a>>;

/// Length-prefixed AMF string: borrowed from the input on decode, owned
/// when built by hand.
///
/// Ordering is not lexicographic: a shorter string always sorts before a
/// longer one, and only equal-length strings compare byte by byte. Map
/// keys encode in this order.
#[derive(Clone, Default, Hash)]
pub struct AmfStr<'a>(Cow<'a, [u8]>);

impl<'a> AmfStr<'a> {
    /// View into an existing buffer
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        AmfStr(Cow::Borrowed(bytes))
    }

    /// Owned string not tied to any buffer
    pub fn owned(bytes: impl Into<Vec<u8>>) -> Self {
        AmfStr(Cow::Owned(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The bytes as UTF-8, if valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this string still points into a decode buffer
    pub fn is_borrowed(&self) -> bool {
        matches!(self.0, Cow::Borrowed(_))
    }

    /// Copy the bytes out so the string no longer borrows anything
    pub fn into_owned(self) -> AmfStr<'static> {
        AmfStr(Cow::Owned(self.0.into_owned()))
    }

    fn to_static(&self) -> AmfStr<'static> {
        AmfStr(Cow::Owned(self.0.to_vec()))
    }
}

impl PartialEq for AmfStr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0[..] == other.0[..]
    }
}

impl Eq for AmfStr<'_> {}

impl Ord for AmfStr<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0[..].cmp(&other.0[..]))
    }
}

impl PartialOrd for AmfStr<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for AmfStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => fmt::Debug::fmt(s, f),
            None => write!(f, "{:02x?}", &self.0[..]),
        }
    }
}

impl<'a> From<&'a str> for AmfStr<'a> {
    fn from(v: &'a str) -> Self {
        AmfStr::borrowed(v.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for AmfStr<'a> {
    fn from(v: &'a [u8]) -> Self {
        AmfStr::borrowed(v)
    }
}

impl From<String> for AmfStr<'_> {
    fn from(v: String) -> Self {
        AmfStr::owned(v.into_bytes())
    }
}

impl From<Vec<u8>> for AmfStr<'_> {
    fn from(v: Vec<u8>) -> Self {
        AmfStr::owned(v)
    }
}

/// Storage for a node's children
#[derive(Debug, Clone, PartialEq)]
pub enum Entries<'a> {
    /// Ordered values (top level, strict arrays)
    List(Vec<Property<'a>>),
    /// Keyed values with unique keys (objects, ECMA arrays, typed objects)
    Map(BTreeMap<AmfStr<'a>, Property<'a>>),
}

/// A decoded AMF0 object or array
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    /// Class name, non-empty only for typed objects
    name: AmfStr<'a>,
    entries: Entries<'a>,
}

impl<'a> Node<'a> {
    /// Empty list-mode node
    pub fn list() -> Self {
        Self::from_entries(Entries::List(Vec::new()))
    }

    /// Empty map-mode node
    pub fn map() -> Self {
        Self::from_entries(Entries::Map(BTreeMap::new()))
    }

    /// Empty map-mode node carrying a class name
    pub fn typed(name: impl Into<AmfStr<'a>>) -> Self {
        Self {
            name: name.into(),
            entries: Entries::Map(BTreeMap::new()),
        }
    }

    pub fn from_entries(entries: Entries<'a>) -> Self {
        Self {
            name: AmfStr::default(),
            entries,
        }
    }

    pub fn name(&self) -> &AmfStr<'a> {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<AmfStr<'a>>) {
        self.name = name.into();
    }

    pub fn entries(&self) -> &Entries<'a> {
        &self.entries
    }

    pub fn is_map(&self) -> bool {
        matches!(self.entries, Entries::Map(_))
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::List(items) => items.len(),
            Entries::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try to get the list storage
    pub fn as_list(&self) -> Option<&[Property<'a>]> {
        match &self.entries {
            Entries::List(items) => Some(items),
            Entries::Map(_) => None,
        }
    }

    /// List elements in order; empty for a map-mode node
    pub fn iter(&self) -> std::slice::Iter<'_, Property<'a>> {
        self.as_list().unwrap_or(&[]).iter()
    }

    /// Try to get the list storage mutably
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Property<'a>>> {
        match &mut self.entries {
            Entries::List(items) => Some(items),
            Entries::Map(_) => None,
        }
    }

    /// Try to get the map storage
    pub fn as_map(&self) -> Option<&BTreeMap<AmfStr<'a>, Property<'a>>> {
        match &self.entries {
            Entries::Map(map) => Some(map),
            Entries::List(_) => None,
        }
    }

    /// Try to get the map storage mutably
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<AmfStr<'a>, Property<'a>>> {
        match &mut self.entries {
            Entries::Map(map) => Some(map),
            Entries::List(_) => None,
        }
    }

    /// Append a value to a list-mode node
    ///
    /// # Panics
    ///
    /// Panics if the node is in map mode. See [`Node::try_push`].
    pub fn push(&mut self, value: impl Into<Property<'a>>) -> &mut Self {
        match &mut self.entries {
            Entries::List(items) => items.push(value.into()),
            Entries::Map(_) => panic!("push on a map-mode node"),
        }
        self
    }

    /// Insert a keyed value into a map-mode node, replacing any previous
    /// value under the same key
    ///
    /// # Panics
    ///
    /// Panics if the node is in list mode. See [`Node::try_insert`].
    pub fn insert(
        &mut self,
        key: impl Into<AmfStr<'a>>,
        value: impl Into<Property<'a>>,
    ) -> &mut Self {
        match &mut self.entries {
            Entries::Map(map) => {
                map.insert(key.into(), value.into());
            }
            Entries::List(_) => panic!("insert on a list-mode node"),
        }
        self
    }

    /// Append a value, failing with `ContainerMismatch` on a map-mode node
    pub fn try_push(&mut self, value: impl Into<Property<'a>>) -> Result<&mut Self> {
        match &mut self.entries {
            Entries::List(items) => items.push(value.into()),
            Entries::Map(_) => return Err(AmfError::ContainerMismatch(MARKER_STRICT_ARRAY)),
        }
        Ok(self)
    }

    /// Insert a keyed value, failing with `ContainerMismatch` on a
    /// list-mode node
    pub fn try_insert(
        &mut self,
        key: impl Into<AmfStr<'a>>,
        value: impl Into<Property<'a>>,
    ) -> Result<&mut Self> {
        match &mut self.entries {
            Entries::Map(map) => {
                map.insert(key.into(), value.into());
            }
            Entries::List(_) => return Err(AmfError::ContainerMismatch(MARKER_OBJECT)),
        }
        Ok(self)
    }

    /// List element by position
    pub fn get_index(&self, index: usize) -> Option<&Property<'a>> {
        self.as_list()?.get(index)
    }

    /// Map value by key
    pub fn get(&self, key: &str) -> Option<&Property<'a>> {
        // Owned probe: a borrowed one would narrow the map's lifetime
        self.as_map()?.get(&AmfStr::owned(key.as_bytes()))
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn get_node(&self, key: &str) -> Option<&Node<'a>> {
        self.get(key)?.as_node()
    }

    /// Deep copy that no longer borrows the decode buffer
    ///
    /// Nodes shared by several handles in this tree stay shared in the copy.
    pub fn to_static(&self) -> Node<'static> {
        let mut seen = HashMap::new();
        self.to_static_with(&mut seen)
    }

    fn to_static_with(&self, seen: &mut HashMap<usize, NodeRef<'static>>) -> Node<'static> {
        let entries = match &self.entries {
            Entries::List(items) => {
                Entries::List(items.iter().map(|p| p.to_static_with(seen)).collect())
            }
            Entries::Map(map) => Entries::Map(
                map.iter()
                    .map(|(k, v)| (k.to_static(), v.to_static_with(seen)))
                    .collect(),
            ),
        };
        Node {
            name: self.name.to_static(),
            entries,
        }
    }
}

impl<'a> FromIterator<Property<'a>> for Node<'a> {
    fn from_iter<I: IntoIterator<Item = Property<'a>>>(iter: I) -> Self {
        Node::from_entries(Entries::List(iter.into_iter().collect()))
    }
}

impl<'a, K: Into<AmfStr<'a>>> FromIterator<(K, Property<'a>)> for Node<'a> {
    fn from_iter<I: IntoIterator<Item = (K, Property<'a>)>>(iter: I) -> Self {
        Node::from_entries(Entries::Map(
            iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }
}

fn detach(node: &NodeRef<'_>, seen: &mut HashMap<usize, NodeRef<'static>>) -> NodeRef<'static> {
    let key = Arc::as_ptr(node) as *const () as usize;
    if let Some(copy) = seen.get(&key) {
        return Arc::clone(copy);
    }
    let copy = Arc::new(node.to_static_with(seen));
    seen.insert(key, Arc::clone(&copy));
    copy
}

/// A single AMF0 value, one variant per wire marker
///
/// MovieClip and RecordSet are reserved on the wire and have no variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Property<'a> {
    /// IEEE 754 double (0x00)
    Number(f64),

    /// Boolean (0x01)
    Boolean(bool),

    /// String with 16-bit length prefix (0x02)
    String(AmfStr<'a>),

    /// Anonymous object (0x03)
    Object(NodeRef<'a>),

    /// Null (0x05)
    Null,

    /// Undefined (0x06), decoded as Null
    Undefined,

    /// Back-reference by index (0x07). Never produced by decode, which
    /// resolves references to the target node.
    Reference(u16),

    /// Associative array (0x08)
    EcmaArray(NodeRef<'a>),

    /// Object end sentinel (0x09)
    ObjectEnd,

    /// Dense array with explicit count (0x0A)
    StrictArray(NodeRef<'a>),

    /// Milliseconds since the Unix epoch (0x0B)
    Date(f64),

    /// String with 32-bit length prefix (0x0C)
    LongString(AmfStr<'a>),

    /// Unsupported (0x0D), decoded as Null
    Unsupported,

    /// XML document, wire-identical to LongString (0x0F)
    XmlDocument(AmfStr<'a>),

    /// Object with a class name (0x10)
    TypedObject(NodeRef<'a>),

    /// Switch to AMF3 (0x11)
    Avmplus(NodeRef<'a>),
}

impl<'a> Property<'a> {
    /// Anonymous object; the node must be in map mode with no class name,
    /// or encoding fails with `ContainerMismatch`
    pub fn object(node: Node<'a>) -> Self {
        Property::Object(Arc::new(node))
    }

    pub fn ecma_array(node: Node<'a>) -> Self {
        Property::EcmaArray(Arc::new(node))
    }

    pub fn strict_array(node: Node<'a>) -> Self {
        Property::StrictArray(Arc::new(node))
    }

    pub fn typed_object(node: Node<'a>) -> Self {
        Property::TypedObject(Arc::new(node))
    }

    pub fn string(s: impl Into<AmfStr<'a>>) -> Self {
        Property::String(s.into())
    }

    /// Wire marker for this value
    pub fn marker(&self) -> u8 {
        match self {
            Property::Number(_) => MARKER_NUMBER,
            Property::Boolean(_) => MARKER_BOOLEAN,
            Property::String(_) => MARKER_STRING,
            Property::Object(_) => MARKER_OBJECT,
            Property::Null => MARKER_NULL,
            Property::Undefined => MARKER_UNDEFINED,
            Property::Reference(_) => MARKER_REFERENCE,
            Property::EcmaArray(_) => MARKER_ECMA_ARRAY,
            Property::ObjectEnd => MARKER_OBJECT_END,
            Property::StrictArray(_) => MARKER_STRICT_ARRAY,
            Property::Date(_) => MARKER_DATE,
            Property::LongString(_) => MARKER_LONG_STRING,
            Property::Unsupported => MARKER_UNSUPPORTED,
            Property::XmlDocument(_) => MARKER_XML_DOCUMENT,
            Property::TypedObject(_) => MARKER_TYPED_OBJECT,
            Property::Avmplus(_) => MARKER_AVMPLUS,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Property::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get this value as a date timestamp
    pub fn as_date(&self) -> Option<f64> {
        match self {
            Property::Date(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Property::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Raw bytes of any string-shaped value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Property::String(s) | Property::LongString(s) | Property::XmlDocument(s) => {
                Some(s.as_bytes())
            }
            _ => None,
        }
    }

    /// Try to get this value as UTF-8 text
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()?).ok()
    }

    /// Shared handle of a complex value
    pub fn node_ref(&self) -> Option<&NodeRef<'a>> {
        match self {
            Property::Object(n)
            | Property::EcmaArray(n)
            | Property::StrictArray(n)
            | Property::TypedObject(n)
            | Property::Avmplus(n) => Some(n),
            _ => None,
        }
    }

    /// Try to get this value as a node
    pub fn as_node(&self) -> Option<&Node<'a>> {
        self.node_ref().map(|n| &**n)
    }

    /// Check if this value is null, undefined or unsupported
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Property::Null | Property::Undefined | Property::Unsupported
        )
    }

    /// Number of other handles sharing this value's node
    pub fn alias_count(&self) -> usize {
        self.node_ref()
            .map_or(0, |n| Arc::strong_count(n).saturating_sub(1))
    }

    /// Whether both values hold the same node (identity, not equality)
    pub fn same_node(&self, other: &Property<'_>) -> bool {
        match (self.node_ref(), other.node_ref()) {
            (Some(a), Some(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }

    /// Deep copy that no longer borrows the decode buffer
    pub fn to_static(&self) -> Property<'static> {
        let mut seen = HashMap::new();
        self.to_static_with(&mut seen)
    }

    fn to_static_with(&self, seen: &mut HashMap<usize, NodeRef<'static>>) -> Property<'static> {
        match self {
            Property::Number(n) => Property::Number(*n),
            Property::Boolean(b) => Property::Boolean(*b),
            Property::String(s) => Property::String(s.to_static()),
            Property::Object(n) => Property::Object(detach(n, seen)),
            Property::Null => Property::Null,
            Property::Undefined => Property::Undefined,
            Property::Reference(i) => Property::Reference(*i),
            Property::EcmaArray(n) => Property::EcmaArray(detach(n, seen)),
            Property::ObjectEnd => Property::ObjectEnd,
            Property::StrictArray(n) => Property::StrictArray(detach(n, seen)),
            Property::Date(ms) => Property::Date(*ms),
            Property::LongString(s) => Property::LongString(s.to_static()),
            Property::Unsupported => Property::Unsupported,
            Property::XmlDocument(s) => Property::XmlDocument(s.to_static()),
            Property::TypedObject(n) => Property::TypedObject(detach(n, seen)),
            Property::Avmplus(n) => Property::Avmplus(detach(n, seen)),
        }
    }
}

impl Default for Property<'_> {
    fn default() -> Self {
        Property::Null
    }
}

impl From<bool> for Property<'_> {
    fn from(v: bool) -> Self {
        Property::Boolean(v)
    }
}

impl From<f64> for Property<'_> {
    fn from(v: f64) -> Self {
        Property::Number(v)
    }
}

impl From<i32> for Property<'_> {
    fn from(v: i32) -> Self {
        Property::Number(v as f64)
    }
}

impl From<u32> for Property<'_> {
    fn from(v: u32) -> Self {
        Property::Number(v as f64)
    }
}

impl<'a> From<&'a str> for Property<'a> {
    fn from(v: &'a str) -> Self {
        Property::String(v.into())
    }
}

impl<'a> From<AmfStr<'a>> for Property<'a> {
    fn from(v: AmfStr<'a>) -> Self {
        Property::String(v)
    }
}

impl From<String> for Property<'_> {
    fn from(v: String) -> Self {
        Property::String(v.into())
    }
}
