//! Concurrent cube puzzle with a fair, cancellable access protocol.
//!
//! A [`Cube`] holds 6×N×N facelets and supports two operations from any
//! number of threads: [`Cube::rotate`] turns one layer, [`Cube::inspect`]
//! takes a full snapshot. The interesting part is not the geometry; it
//! is the admission protocol that decides who runs, who queues, and in
//! what order queued threads are released:
//!
//! - Rotations are partitioned into three compatibility classes, one per
//!   rotation axis (each axis pairs two opposite faces). Rotations on
//!   the same axis run in parallel, serialized only by a bank of
//!   per-physical-layer locks; a face/layer pair and its mirrored
//!   opposite address the same lock because they move the same slice.
//! - Inspections run in parallel with each other and exclude every
//!   rotation, and vice versa.
//! - Admission is **no-overtake**: the moment any thread queues, every
//!   later arrival of any class queues behind it, even one that would
//!   be compatible with the active class. This is what makes starvation
//!   impossible under a steady stream of compatible work.
//!
//! # Cancellation
//!
//! Every blocking point is cancellable through a [`CancelToken`].
//! Cancelling a blocked thread unwinds exactly the bookkeeping it had
//! contributed, wakes anyone who might have been waiting on its
//! departure, and surfaces [`CubeError::Cancelled`]; a thread cancelled
//! after its rotation was admitted completes its exit bookkeeping before
//! the failure is surfaced, so counters and locks never leak.
//!
//! # Instrumentation
//!
//! [`Cube::builder`] accepts four hooks (`before_rotation`,
//! `after_rotation`, `before_inspection`, `after_inspection`) invoked
//! synchronously between admission and release. Hook bodies may block
//! but must not re-enter the cube.
//!
//! # Example
//!
//! ```
//! use cubesync::{CancelToken, Cube};
//!
//! let cube = Cube::new(4);
//! let token = CancelToken::new();
//!
//! cube.rotate(2, 0, &token)?;
//! cube.rotate(5, 1, &token)?;
//!
//! let snapshot = cube.inspect(&token)?;
//! assert_eq!(snapshot.len(), 6 * 4 * 4);
//! # Ok::<(), cubesync::CubeError>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod access;
mod cancel;
mod cube;
mod error;
mod geometry;
mod grid;

pub use cancel::CancelToken;
pub use cube::{Cube, CubeBuilder};
pub use error::CubeError;
pub use grid::{Axis, Face, FacetGrid, FACE_COUNT};
