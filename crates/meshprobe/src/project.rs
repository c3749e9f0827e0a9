//! Project persistence.
//!
//! A project stores every point collection as a flat coordinate array keyed by its tree node.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use meshprobe_core::{ProbeError, Result};
use serde::{Deserialize, Serialize};

use crate::points::{NodeKey, PointCollections};

/// Version written by [`Project::to_json`]. Other versions are rejected on load.
pub const PROJECT_VERSION: u32 = 1;

/// Saved points of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPoints {
    /// `x y z` triples, one per point.
    pub data: Vec<f32>,
}

/// Serializable project state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub version: u32,
    #[serde(default)]
    pub points: BTreeMap<NodeKey, ProjectPoints>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION,
            points: BTreeMap::new(),
        }
    }
}

impl Project {
    /// Captures the points of every collection.
    pub fn from_collections(collections: &PointCollections) -> Self {
        let points = collections
            .iter()
            .map(|(node, c)| {
                (
                    node.to_string(),
                    ProjectPoints {
                        data: c.points().to_flat(),
                    },
                )
            })
            .collect();
        Self {
            version: PROJECT_VERSION,
            points,
        }
    }

    /// Replaces the collections with the saved ones.
    pub fn apply_to(&self, collections: &mut PointCollections) {
        collections.load_from_project(
            self.points
                .iter()
                .map(|(node, p)| (node.as_str(), p.data.as_slice())),
        );
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a project, rejecting versions other than [`PROJECT_VERSION`].
    pub fn from_json(json: &str) -> Result<Self> {
        let project: Self = serde_json::from_str(json)?;
        if project.version != PROJECT_VERSION {
            return Err(ProbeError::UnsupportedProjectVersion {
                expected: PROJECT_VERSION,
                found: project.version,
            });
        }
        Ok(project)
    }

    /// Writes the project as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("project saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reads a project from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let project = Self::from_json(&json)?;
        log::info!(
            "project loaded from {} ({} point collections)",
            path.as_ref().display(),
            project.points.len()
        );
        Ok(project)
    }
}
