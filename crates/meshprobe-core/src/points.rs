//! Growable fixed-stride point storage.
//!
//! A [`PointBuffer`] stores a sequence of points of `stride` components each in one flat `f32`
//! array, so renderers can upload [`PointBuffer::view`] without copying. Capacity doubles on
//! overflow and only the used prefix is carried over.
//!
//! Every reallocation bumps [`PointBuffer::generation`]. Consumers that copied a view (GPU
//! buffers, for instance) compare generations to know when to re-fetch.

/// Growable buffer of fixed-dimension points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBuffer {
    stride: usize,
    capacity: usize,
    used: usize,
    storage: Vec<f32>,
    generation: u64,
}

impl PointBuffer {
    /// Creates a buffer for points of `stride` components with room for `reserve` points.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn new(stride: usize, reserve: usize) -> Self {
        assert!(stride > 0, "point stride must be positive");
        Self {
            stride,
            capacity: reserve,
            used: 0,
            storage: vec![0.0; reserve * stride],
            generation: 0,
        }
    }

    /// Creates a buffer from a flat array of components. Trailing components that do not form a
    /// whole point are dropped.
    pub fn from_flat(stride: usize, data: &[f32]) -> Self {
        let mut buffer = Self::new(stride, data.len() / stride);
        buffer.add_points(data);
        buffer
    }

    /// Creates a buffer from an iterator of points.
    pub fn from_points<'a, I>(stride: usize, points: I) -> Self
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let points = points.into_iter();
        let mut buffer = Self::new(stride, points.size_hint().0);
        for p in points {
            buffer.add_point(p);
        }
        buffer
    }

    /// Adopts `data` as backing storage with `used` valid points.
    ///
    /// The storage is truncated to whole points and grown when `used` exceeds it.
    pub fn init_with(&mut self, mut data: Vec<f32>, used: usize) {
        let capacity = data.len() / self.stride;
        data.truncate(capacity * self.stride);
        self.storage = data;
        self.capacity = capacity;
        self.generation += 1;
        self.used = used.min(capacity);
        if used > capacity {
            self.reserve(used);
        }
        self.used = used;
    }

    /// Returns the number of components per point.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the number of points the storage can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of valid points.
    pub fn len(&self) -> usize {
        self.used
    }

    /// Returns true if no point is stored.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Returns the reallocation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ensures room for at least `count` points, preserving the used prefix. Never shrinks.
    pub fn reserve(&mut self, count: usize) {
        if count <= self.capacity {
            return;
        }
        let mut storage = vec![0.0; count * self.stride];
        let used_len = self.used * self.stride;
        storage[..used_len].copy_from_slice(&self.storage[..used_len]);
        self.storage = storage;
        self.capacity = count;
        self.generation += 1;
    }

    /// Sets the number of valid points, clamped to `[0, capacity]`. Storage is left untouched.
    pub fn set_used_count(&mut self, count: usize) {
        self.used = count.min(self.capacity);
    }

    /// Writes a point at `index`, growing the storage when needed.
    ///
    /// The used count becomes `max(used, index + 1)`.
    ///
    /// # Panics
    ///
    /// Panics if `point` has fewer than `stride` components.
    pub fn set_point_at(&mut self, index: usize, point: &[f32]) {
        if index >= self.capacity {
            self.reserve((self.capacity * 2).max(index + 1));
        }
        self.write(index, point);
        self.used = self.used.max(index + 1);
    }

    /// Appends a point.
    pub fn add_point(&mut self, point: &[f32]) {
        self.set_point_at(self.used, point);
    }

    /// Appends every whole point contained in the flat `points` array.
    pub fn add_points(&mut self, points: &[f32]) {
        let count = points.len() / self.stride;
        self.reserve(self.used + count);
        let start = self.used * self.stride;
        let len = count * self.stride;
        self.storage[start..start + len].copy_from_slice(&points[..len]);
        self.used += count;
    }

    /// Inserts a point at `index`, shifting later points forward.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_point(&mut self, index: usize, point: &[f32]) {
        assert!(
            index <= self.used,
            "insert index {index} out of range for {} points",
            self.used
        );
        if self.used == self.capacity {
            self.reserve((self.capacity * 2).max(1));
        }
        let s = self.stride;
        self.storage
            .copy_within(index * s..self.used * s, (index + 1) * s);
        self.write(index, point);
        self.used += 1;
    }

    /// Removes `count` points starting at `index`, shifting the tail down.
    ///
    /// `count` is clamped to the number of points after `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn splice(&mut self, index: usize, count: usize) {
        assert!(
            index <= self.used,
            "splice index {index} out of range for {} points",
            self.used
        );
        let count = count.min(self.used - index);
        let s = self.stride;
        self.storage
            .copy_within((index + count) * s..self.used * s, index * s);
        self.used -= count;
    }

    /// Exchanges two points in place.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below `len()`.
    pub fn swap(&mut self, first: usize, second: usize) {
        self.check_index(first);
        self.check_index(second);
        let s = self.stride;
        for i in 0..s {
            self.storage.swap(first * s + i, second * s + i);
        }
    }

    /// Borrows the components of one point.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `len()`.
    pub fn point_at(&self, index: usize) -> &[f32] {
        self.check_index(index);
        let offset = index * self.stride;
        &self.storage[offset..offset + self.stride]
    }

    /// Copies one point into caller-provided scratch and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `len()` or `out` is shorter than `stride`.
    pub fn copy_point_to<'a>(&self, index: usize, out: &'a mut [f32]) -> &'a [f32] {
        let out = &mut out[..self.stride];
        out.copy_from_slice(self.point_at(index));
        out
    }

    /// Reads a point as a `Vec3`. Requires a stride of at least 3.
    pub fn vec3_at(&self, index: usize) -> glam::Vec3 {
        glam::Vec3::from_slice(self.point_at(index))
    }

    /// Iterates over the valid points.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.view().chunks_exact(self.stride)
    }

    /// Collects `f(point, index)` for every valid point.
    pub fn map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(&[f32], usize) -> T,
    {
        self.iter().enumerate().map(|(i, p)| f(p, i)).collect()
    }

    /// Borrows the valid prefix of the storage.
    pub fn view(&self) -> &[f32] {
        &self.storage[..self.used * self.stride]
    }

    /// Borrows the whole backing storage, unused capacity included.
    pub fn storage(&self) -> &[f32] {
        &self.storage
    }

    /// Borrows the valid prefix as raw bytes, ready for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.view())
    }

    /// Copies the valid points into a flat vector.
    pub fn to_flat(&self) -> Vec<f32> {
        self.view().to_vec()
    }

    /// Releases the storage. Capacity and used count become zero.
    pub fn dispose(&mut self) {
        if self.capacity > 0 {
            self.storage = Vec::new();
            self.capacity = 0;
            self.used = 0;
            self.generation += 1;
        }
    }

    fn write(&mut self, index: usize, point: &[f32]) {
        let s = self.stride;
        assert!(
            point.len() >= s,
            "point has {} components, stride is {s}",
            point.len()
        );
        self.storage[index * s..(index + 1) * s].copy_from_slice(&point[..s]);
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.used,
            "point index {index} out of range for {} points",
            self.used
        );
    }
}

impl<'a> IntoIterator for &'a PointBuffer {
    type Item = &'a [f32];
    type IntoIter = std::slice::ChunksExact<'a, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
