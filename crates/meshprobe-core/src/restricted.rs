//! Vertices excluded from sphere selections.
//!
//! The restricted set comes from an asynchronous provider. [`RestrictedPoints`] holds the
//! provider's future until it resolves and is assigned exactly once: it is polled without
//! blocking when a query starts and awaited before any filtering reads it, so no query can
//! silently filter against a half-loaded set.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use crate::mesh::{Face, TriangleMesh};

/// Future produced by a [`RestrictedPointsProvider`].
pub type RestrictedPointsFuture = Pin<Box<dyn Future<Output = Vec<Face>> + Send>>;

/// Source of the triangles whose vertices must never be selected.
pub trait RestrictedPointsProvider: Send + Sync {
    /// Starts loading the restricted triangles of `mesh`.
    fn load(&self, mesh: &TriangleMesh) -> RestrictedPointsFuture;
}

impl<F> RestrictedPointsProvider for F
where
    F: Fn(&TriangleMesh) -> RestrictedPointsFuture + Send + Sync,
{
    fn load(&self, mesh: &TriangleMesh) -> RestrictedPointsFuture {
        self(mesh)
    }
}

/// Provider for meshes without protected regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestrictedPoints;

impl RestrictedPointsProvider for NoRestrictedPoints {
    fn load(&self, _mesh: &TriangleMesh) -> RestrictedPointsFuture {
        Box::pin(std::future::ready(Vec::new()))
    }
}

struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

/// Single-assignment cell for the restricted vertex set.
#[derive(Default)]
pub struct RestrictedPoints {
    pending: Option<RestrictedPointsFuture>,
    points: HashSet<u32>,
}

impl fmt::Debug for RestrictedPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestrictedPoints")
            .field("pending", &self.pending.is_some())
            .field("points", &self.points.len())
            .finish()
    }
}

impl RestrictedPoints {
    /// Creates a cell waiting on `future`. The future is not polled yet.
    pub fn pending(future: RestrictedPointsFuture) -> Self {
        Self {
            pending: Some(future),
            points: HashSet::new(),
        }
    }

    /// Polls the loader once without blocking. Returns true once the set is resolved.
    pub fn poll_ready(&mut self) -> bool {
        let Some(future) = self.pending.as_mut() else {
            return true;
        };
        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(faces) => {
                self.pending = None;
                self.absorb(faces);
                true
            }
            Poll::Pending => false,
        }
    }

    /// Returns true once the set is resolved.
    pub fn is_ready(&self) -> bool {
        self.pending.is_none()
    }

    /// Blocks until the loader resolves, then returns the set.
    pub fn wait(&mut self) -> &HashSet<u32> {
        if let Some(future) = self.pending.take() {
            let faces = pollster::block_on(future);
            self.absorb(faces);
            log::debug!("{} restricted points loaded", self.points.len());
        }
        &self.points
    }

    /// Returns whether `vertex` is restricted. Only reflects a resolved set.
    pub fn contains(&self, vertex: u32) -> bool {
        self.points.contains(&vertex)
    }

    fn absorb(&mut self, faces: Vec<Face>) {
        self.points.extend(faces.iter().flat_map(|f| f.vertices()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Future that needs `polls` polls before resolving.
    struct Delayed {
        polls: usize,
        faces: Vec<Face>,
    }

    impl Future for Delayed {
        type Output = Vec<Face>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Vec<Face>> {
            if self.polls == 0 {
                Poll::Ready(std::mem::take(&mut self.faces))
            } else {
                self.polls -= 1;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    #[test]
    fn test_ready_provider() {
        let mesh = TriangleMesh::new(vec![glam::Vec3::ZERO; 3], &[Face::new(0, 1, 2)]);
        let mut cell = RestrictedPoints::pending(NoRestrictedPoints.load(&mesh));
        assert!(!cell.is_ready());
        assert!(cell.poll_ready());
        assert!(cell.wait().is_empty());
    }

    #[test]
    fn test_pending_then_wait() {
        let mut cell = RestrictedPoints::pending(Box::pin(Delayed {
            polls: 3,
            faces: vec![Face::new(3, 4, 5)],
        }));
        assert!(!cell.poll_ready());
        assert!(!cell.contains(3));

        let points = cell.wait();
        assert_eq!(points.len(), 3);
        assert!(cell.contains(4));
        assert!(cell.is_ready());
    }

    #[test]
    fn test_closure_provider() {
        let provider = |_: &TriangleMesh| -> RestrictedPointsFuture {
            Box::pin(std::future::ready(vec![Face::new(1, 2, 3)]))
        };
        let mesh = TriangleMesh::new(vec![glam::Vec3::ZERO; 4], &[Face::new(1, 2, 3)]);
        let mut cell = RestrictedPoints::pending(provider.load(&mesh));
        assert!(cell.wait().contains(&2));
    }
}
