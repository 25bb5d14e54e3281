//! Configuration for the mapper

use serde::{Deserialize, Serialize};

use super::error::MappingResult;

/// Default bound on nested Composition / Relation / Child levels
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for a [`Mapper`](super::Mapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Maximum nesting depth below the root object, `None` for no limit
    ///
    /// The relation graph is not checked for cycles; this bound is what stops a
    /// self-referencing mapping from recursing forever.
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<usize>,
}

fn default_max_depth() -> Option<usize> {
    Some(DEFAULT_MAX_DEPTH)
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl MapperConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config without a depth limit
    pub fn unbounded() -> Self {
        Self { max_depth: None }
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Parse a config from JSON, filling in defaults for missing keys
    pub fn from_json(json: &str) -> MappingResult<Self> {
        serde_json::from_str(json).map_err(|e| super::MappingError::validation(e.to_string()))
    }
}
