//! Decoder configuration

/// Maximum nesting depth for objects/arrays (prevent stack overflow)
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Initial allocation cap for strict arrays with an untrusted count
pub const DEFAULT_MAX_PREALLOC: usize = 1024;

/// Decoder configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum container nesting depth accepted on decode
    pub max_depth: usize,

    /// Upper bound on the capacity reserved from a strict array's declared count
    pub max_prealloc: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_prealloc: DEFAULT_MAX_PREALLOC,
        }
    }
}

impl DecoderConfig {
    /// Set maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set strict array preallocation cap
    pub fn max_prealloc(mut self, count: usize) -> Self {
        self.max_prealloc = count;
        self
    }

    /// Capacity to reserve for a strict array declaring `count` elements
    pub fn prealloc_hint(&self, count: u32) -> usize {
        usize::try_from(count).map_or(self.max_prealloc, |n| n.min(self.max_prealloc))
    }
}
