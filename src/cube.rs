//! The cube facade: hooks, validation, and the two public operations.

use crate::access::AccessController;
use crate::cancel::CancelToken;
use crate::error::CubeError;
use crate::geometry;
use crate::grid::{Face, FacetGrid};

type RotationHook = Box<dyn Fn(usize, usize) + Send + Sync>;
type InspectionHook = Box<dyn Fn() + Send + Sync>;

struct Hooks {
    before_rotation: RotationHook,
    after_rotation: RotationHook,
    before_inspection: InspectionHook,
    after_inspection: InspectionHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            before_rotation: Box::new(|_, _| {}),
            after_rotation: Box::new(|_, _| {}),
            before_inspection: Box::new(|| {}),
            after_inspection: Box::new(|| {}),
        }
    }
}

/// Configures a [`Cube`] before construction.
///
/// Each hook is invoked synchronously by the calling thread, after
/// admission and before release, with the layer lock (for rotations)
/// held. Hook bodies are opaque to the cube and may block, but must not
/// re-enter the cube's own operations; doing so may deadlock.
pub struct CubeBuilder {
    size: usize,
    hooks: Hooks,
}

impl CubeBuilder {
    /// Installs a hook called before each rotation's grid mutation, with
    /// the rotation's `(face, layer)`.
    #[must_use]
    pub fn before_rotation(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.hooks.before_rotation = Box::new(hook);
        self
    }

    /// Installs a hook called after each rotation's grid mutation, with
    /// the rotation's `(face, layer)`.
    #[must_use]
    pub fn after_rotation(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.hooks.after_rotation = Box::new(hook);
        self
    }

    /// Installs a hook called before each inspection's snapshot.
    #[must_use]
    pub fn before_inspection(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.before_inspection = Box::new(hook);
        self
    }

    /// Installs a hook called after each inspection's snapshot.
    #[must_use]
    pub fn after_inspection(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.after_inspection = Box::new(hook);
        self
    }

    /// Builds the cube in the solved state.
    ///
    /// # Panics
    ///
    /// Panics if the configured size is zero.
    #[must_use]
    pub fn build(self) -> Cube {
        Cube {
            grid: FacetGrid::new(self.size),
            access: AccessController::new(self.size),
            hooks: self.hooks,
        }
    }
}

/// A concurrently rotatable and inspectable cube puzzle.
///
/// All operations take `&self`; the cube is meant to be shared across
/// threads (e.g. behind an `Arc`). See the crate documentation for the
/// admission rules that decide which operations run in parallel.
pub struct Cube {
    grid: FacetGrid,
    access: AccessController,
    hooks: Hooks,
}

impl Cube {
    /// Creates a solved cube of edge length `size` with no hooks.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self::builder(size).build()
    }

    /// Starts building a cube of edge length `size`.
    #[must_use]
    pub fn builder(size: usize) -> CubeBuilder {
        CubeBuilder {
            size,
            hooks: Hooks::default(),
        }
    }

    /// The cube's edge length N.
    #[must_use]
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Rotates `layer` of `face` clockwise (as seen from that face).
    ///
    /// Blocks until the rotation is admitted and its physical layer is
    /// free. Rotations on the same axis run in parallel; everything else
    /// is serialized by the admission protocol, which is no-overtake: a
    /// rotation arriving while anyone is queued joins the queue.
    ///
    /// # Errors
    ///
    /// - [`CubeError::FaceOutOfRange`] / [`CubeError::LayerOutOfRange`]
    ///   for bad arguments, rejected before any locking.
    /// - [`CubeError::Cancelled`] if `token` fires while the thread is
    ///   blocked. The grid is then either fully rotated (cancellation
    ///   arrived after the mutation) or untouched, never partial, and
    ///   all internal bookkeeping has been unwound.
    pub fn rotate(&self, face: usize, layer: usize, token: &CancelToken) -> Result<(), CubeError> {
        let face = Face::from_index(face).ok_or(CubeError::FaceOutOfRange(face))?;
        let size = self.grid.size();
        if layer >= size {
            return Err(CubeError::LayerOutOfRange { layer, size });
        }

        self.access.enter_rotation(face, layer, token)?;
        let session = RotationSession {
            access: &self.access,
            face,
            layer,
            armed: true,
        };
        (self.hooks.before_rotation)(face.index(), layer);
        geometry::rotate_layer(&self.grid, face, layer);
        (self.hooks.after_rotation)(face.index(), layer);
        session.disarm();
        self.access.exit_rotation(face, layer, token)
    }

    /// Takes a full snapshot: `6 * size²` color digits, faces in
    /// canonical order (top, left, front, right, back, bottom), each
    /// face row-major.
    ///
    /// Blocks while any rotation is active or queued; concurrent
    /// inspections run in parallel with each other.
    ///
    /// # Errors
    ///
    /// [`CubeError::Cancelled`] if `token` fires while the thread is
    /// blocked (or before release; the snapshot is then discarded).
    pub fn inspect(&self, token: &CancelToken) -> Result<String, CubeError> {
        self.access.enter_inspection(token)?;
        let session = InspectionSession {
            access: &self.access,
            armed: true,
        };
        (self.hooks.before_inspection)();
        let snapshot = self.grid.snapshot();
        (self.hooks.after_inspection)();
        session.disarm();
        self.access.exit_inspection(token)?;
        Ok(snapshot)
    }
}

impl std::fmt::Debug for CubeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeBuilder").field("size", &self.size).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube").field("size", &self.size()).finish_non_exhaustive()
    }
}

// Unwind guards: a panicking hook must still release the layer slot and
// the admission counters, or every other thread blocks forever.

struct RotationSession<'a> {
    access: &'a AccessController,
    face: Face,
    layer: usize,
    armed: bool,
}

impl RotationSession<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RotationSession<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.access.release_rotation(self.face, self.layer);
        }
    }
}

struct InspectionSession<'a> {
    access: &'a AccessController,
    armed: bool,
}

impl InspectionSession<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InspectionSession<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.access.finish_inspection();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fresh_cube_is_solved() {
        let cube = Cube::new(2);
        let token = CancelToken::new();
        assert_eq!(cube.inspect(&token).expect("snapshot"), "000011112222333344445555");
        assert_eq!(cube.size(), 2);
    }

    #[test]
    fn bad_arguments_fail_fast_without_firing_hooks() {
        let fired = Arc::new(AtomicUsize::new(0));
        let cube = {
            let fired = Arc::clone(&fired);
            Cube::builder(4)
                .before_rotation(move |_, _| {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };
        let token = CancelToken::new();
        assert_eq!(cube.rotate(6, 0, &token), Err(CubeError::FaceOutOfRange(6)));
        assert_eq!(
            cube.rotate(0, 4, &token),
            Err(CubeError::LayerOutOfRange { layer: 4, size: 4 })
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hooks_fire_once_per_operation_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cube = {
            let c1 = Arc::clone(&counter);
            let c2 = Arc::clone(&counter);
            let c3 = Arc::clone(&counter);
            let c4 = Arc::clone(&counter);
            Cube::builder(4)
                .before_rotation(move |_, _| {
                    c1.fetch_add(1, Ordering::SeqCst);
                })
                .after_rotation(move |_, _| {
                    c2.fetch_add(1, Ordering::SeqCst);
                })
                .before_inspection(move || {
                    c3.fetch_add(1, Ordering::SeqCst);
                })
                .after_inspection(move || {
                    c4.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };
        let token = CancelToken::new();
        cube.rotate(2, 0, &token).expect("rotation");
        cube.rotate(5, 1, &token).expect("rotation");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        cube.inspect(&token).expect("snapshot");
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn pre_cancelled_token_rejects_without_mutation() {
        let cube = Cube::new(3);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(cube.rotate(0, 0, &token), Err(CubeError::Cancelled));
        assert_eq!(cube.inspect(&token), Err(CubeError::Cancelled));
        let fresh = CancelToken::new();
        assert_eq!(
            cube.inspect(&fresh).expect("snapshot"),
            FacetGrid::new(3).snapshot()
        );
    }

    #[test]
    fn cancellation_after_mutation_surfaces_but_applies() {
        let token = CancelToken::new();
        let cube = {
            let token = token.clone();
            Cube::builder(2)
                .after_rotation(move |_, _| token.cancel())
                .build()
        };
        assert_eq!(cube.rotate(0, 0, &token), Err(CubeError::Cancelled));

        // Bookkeeping was unwound; the mutation is visible.
        let fresh = CancelToken::new();
        assert_eq!(cube.inspect(&fresh).expect("snapshot"), "000022113322443311445555");
    }

    #[test]
    fn panicking_hook_releases_the_protocol() {
        let cube = Arc::new(
            Cube::builder(2)
                .before_rotation(|_, _| panic!("hook exploded"))
                .build(),
        );
        let token = CancelToken::new();
        let result = {
            let cube = Arc::clone(&cube);
            std::thread::spawn(move || {
                let token = CancelToken::new();
                cube.rotate(0, 0, &token)
            })
            .join()
        };
        assert!(result.is_err(), "hook panic propagates");

        // The cube is still usable afterwards.
        assert_eq!(cube.inspect(&token).expect("snapshot"), "000011112222333344445555");
    }
}
