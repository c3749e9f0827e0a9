//! Point collections picked on a surface.
//!
//! Every collection belongs to one node of the project tree and stores its points in a
//! [`PointBuffer`]. Points also carry stable keys so that a UI can keep referring to a point while
//! others are inserted or removed around it.

use std::collections::BTreeMap;

use meshprobe_core::{PointBuffer, ProbeError, Result, Vec3};

/// Key of a project tree node.
pub type NodeKey = String;

/// Stable key of one point inside a collection.
pub type PointKey = u32;

/// The points of one tree node.
#[derive(Debug, Clone)]
pub struct PointCollection {
    points: PointBuffer,
    point_keys: Vec<PointKey>,
    last_point_key: PointKey,
    selected_key: Option<PointKey>,
}

impl PointCollection {
    fn new(points: PointBuffer) -> Self {
        let count = points.len() as PointKey;
        Self {
            points,
            point_keys: (0..count).collect(),
            last_point_key: count,
            selected_key: None,
        }
    }

    fn next_key(&mut self) -> PointKey {
        let key = self.last_point_key;
        self.last_point_key += 1;
        key
    }

    fn position_of(&self, key: PointKey) -> Option<usize> {
        self.point_keys.iter().position(|&k| k == key)
    }

    pub fn points(&self) -> &PointBuffer {
        &self.points
    }

    /// Keys of the points, in point order.
    pub fn point_keys(&self) -> &[PointKey] {
        &self.point_keys
    }

    pub fn selected_key(&self) -> Option<PointKey> {
        self.selected_key
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the points as positions.
    pub fn positions(&self) -> Vec<Vec3> {
        self.points.map(|p, _| Vec3::from_slice(p))
    }
}

/// All point collections of a project, keyed by tree node.
#[derive(Debug, Clone)]
pub struct PointCollections {
    collections: BTreeMap<NodeKey, PointCollection>,
    reserve: usize,
}

impl Default for PointCollections {
    fn default() -> Self {
        Self::new(32)
    }
}

impl PointCollections {
    /// Creates an empty set whose new collections reserve room for `reserve` points.
    pub fn new(reserve: usize) -> Self {
        Self {
            collections: BTreeMap::new(),
            reserve,
        }
    }

    /// Creates an empty collection for `node`, replacing any existing one.
    pub fn create_for(&mut self, node: impl Into<NodeKey>) {
        let node = node.into();
        log::debug!("creating point collection '{node}'");
        self.collections.insert(
            node,
            PointCollection::new(PointBuffer::new(3, self.reserve)),
        );
    }

    /// Replaces the points of `node`, creating the collection if needed.
    ///
    /// Existing keys are kept for the leading points; extra points get fresh keys and missing
    /// points drop their keys.
    pub fn update_points(&mut self, node: impl Into<NodeKey>, points: PointBuffer) {
        let node = node.into();
        match self.collections.get_mut(&node) {
            Some(collection) => {
                collection.point_keys.truncate(points.len());
                while collection.point_keys.len() < points.len() {
                    let key = collection.next_key();
                    collection.point_keys.push(key);
                }
                collection.points = points;
            }
            None => {
                self.collections.insert(node, PointCollection::new(points));
            }
        }
    }

    /// Adds a point to `node` and returns its key.
    ///
    /// With a selected point, the new point goes right after it and becomes the selection.
    /// Otherwise it is appended.
    pub fn add_point(&mut self, node: &str, point: Vec3) -> Result<PointKey> {
        let collection = self.get_mut(node)?;
        let key = collection.next_key();
        let p = point.to_array();

        let selected = collection
            .selected_key
            .and_then(|k| collection.position_of(k));
        match selected {
            Some(position) => {
                collection.points.insert_point(position + 1, &p);
                collection.point_keys.insert(position + 1, key);
                collection.selected_key = Some(key);
            }
            None => {
                collection.points.add_point(&p);
                collection.point_keys.push(key);
            }
        }
        Ok(key)
    }

    /// Removes the point `key` from `node`.
    ///
    /// Returns the key of the point before it, if any, so a UI can move its selection there.
    pub fn remove_point_by_key(&mut self, node: &str, key: PointKey) -> Result<Option<PointKey>> {
        let collection = self.get_mut(node)?;
        let Some(position) = collection.position_of(key) else {
            return Ok(None);
        };

        let previous = position.checked_sub(1).map(|p| collection.point_keys[p]);
        collection.point_keys.remove(position);
        collection.points.splice(position, 1);
        if collection.selected_key == Some(key) {
            collection.selected_key = None;
        }
        Ok(previous)
    }

    /// Returns the point with `key` in `node`.
    pub fn point_with_key(&self, node: &str, key: PointKey) -> Option<Vec3> {
        let collection = self.collections.get(node)?;
        let position = collection.position_of(key)?;
        Some(collection.points.vec3_at(position))
    }

    /// Selects a point of `node`, or clears the selection with `None`.
    ///
    /// Selecting an unknown key clears the selection.
    pub fn select(&mut self, node: &str, key: Option<PointKey>) -> Result<()> {
        let collection = self.get_mut(node)?;
        collection.selected_key = key.filter(|&k| collection.position_of(k).is_some());
        Ok(())
    }

    /// Drops the collection of `node`.
    pub fn remove(&mut self, node: &str) -> Option<PointCollection> {
        self.collections.remove(node)
    }

    pub fn get(&self, node: &str) -> Option<&PointCollection> {
        self.collections.get(node)
    }

    fn get_mut(&mut self, node: &str) -> Result<&mut PointCollection> {
        self.collections
            .get_mut(node)
            .ok_or_else(|| ProbeError::CollectionNotFound(node.to_string()))
    }

    /// Iterates over the collections in node key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PointCollection)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces every collection with the flat coordinate arrays of a saved project.
    pub fn load_from_project<'a>(&mut self, saved: impl IntoIterator<Item = (&'a str, &'a [f32])>) {
        self.collections.clear();
        for (node, data) in saved {
            if data.len() % 3 != 0 {
                log::warn!("point collection '{node}' has a trailing partial point, dropping it");
            }
            self.update_points(node, PointBuffer::from_flat(3, data));
        }
        log::debug!("loaded {} point collections", self.collections.len());
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn clear(&mut self) {
        self.collections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_with(points: &[Vec3]) -> PointCollections {
        let mut collections = PointCollections::default();
        collections.create_for("a");
        for &p in points {
            collections.add_point("a", p).unwrap();
        }
        collections
    }

    #[test]
    fn test_append_without_selection() {
        let collections = collection_with(&[Vec3::X, Vec3::Y]);
        let a = collections.get("a").unwrap();
        assert_eq!(a.positions(), vec![Vec3::X, Vec3::Y]);
        assert_eq!(a.point_keys(), &[0, 1]);
    }

    #[test]
    fn test_insert_after_selection() {
        let mut collections = collection_with(&[Vec3::X, Vec3::Y]);
        collections.select("a", Some(0)).unwrap();
        let key = collections.add_point("a", Vec3::Z).unwrap();

        let a = collections.get("a").unwrap();
        assert_eq!(a.positions(), vec![Vec3::X, Vec3::Z, Vec3::Y]);
        assert_eq!(a.point_keys(), &[0, 2, 1]);
        assert_eq!(a.selected_key(), Some(key));
    }

    #[test]
    fn test_remove_returns_previous_key() {
        let mut collections = collection_with(&[Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(collections.remove_point_by_key("a", 1).unwrap(), Some(0));
        assert_eq!(collections.remove_point_by_key("a", 0).unwrap(), None);
        assert_eq!(collections.remove_point_by_key("a", 7).unwrap(), None);

        let a = collections.get("a").unwrap();
        assert_eq!(a.positions(), vec![Vec3::Z]);
        assert_eq!(collections.point_with_key("a", 2), Some(Vec3::Z));
        assert_eq!(collections.point_with_key("a", 1), None);
    }

    #[test]
    fn test_select_unknown_key_clears() {
        let mut collections = collection_with(&[Vec3::X]);
        collections.select("a", Some(0)).unwrap();
        collections.select("a", Some(9)).unwrap();
        assert_eq!(collections.get("a").unwrap().selected_key(), None);
    }

    #[test]
    fn test_missing_collection() {
        let mut collections = PointCollections::default();
        assert!(matches!(
            collections.add_point("nope", Vec3::X),
            Err(ProbeError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_project() {
        let mut collections = collection_with(&[Vec3::X]);
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        collections.load_from_project([("b", &data[..])]);

        assert!(collections.get("a").is_none());
        let b = collections.get("b").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.point_keys(), &[0, 1]);
        assert_eq!(
            collections.point_with_key("b", 1),
            Some(Vec3::new(4.0, 5.0, 6.0))
        );
    }
}
