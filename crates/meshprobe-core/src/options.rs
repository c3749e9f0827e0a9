//! Configuration options for meshprobe.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables shared by the queries and the session tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial point capacity of the cross-section segment buffer.
    pub clip_reserve_points: usize,

    /// Distance under which two cross-section points count as the same point.
    pub duplicate_tolerance: f32,

    /// Whether sphere selections record boundary vertices.
    pub find_boundary: bool,

    /// Initial point capacity of a new point collection.
    pub point_collection_reserve: usize,

    /// Degree of curves fitted through point collections.
    pub curve_degree: usize,

    /// Decimal places written by point exports.
    pub export_precision: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            clip_reserve_points: 32_000,
            duplicate_tolerance: 1e-6,
            find_boundary: false,
            point_collection_reserve: 32,
            curve_degree: 3,
            export_precision: 6,
        }
    }
}

impl Options {
    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            Options::from_json(r#"{ "find_boundary": true, "curve_degree": 2 }"#).unwrap();
        assert!(options.find_boundary);
        assert_eq!(options.curve_degree, 2);
        assert_eq!(options.clip_reserve_points, 32_000);
    }

    #[test]
    fn test_json_roundtrip() {
        let options = Options {
            duplicate_tolerance: 1e-4,
            ..Options::default()
        };
        let parsed = Options::from_json(&options.to_json().unwrap()).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_invalid_json() {
        assert!(Options::from_json("{ not json").is_err());
    }
}
