//! Facelet storage: six N×N faces of color values.
//!
//! [`FacetGrid`] is pure data: it carries no admission logic. Rotations
//! admitted on the same axis write disjoint strips concurrently, so the
//! cell type is `AtomicU8` rather than `u8` behind a lock. Every
//! happens-before edge between conflicting accesses is supplied by the
//! access controller's critical section and the layer locks; cell
//! operations therefore use `Ordering::Relaxed` throughout.
//!
//! Serialization order is fixed: faces in [`Face`] declaration order,
//! each face row-major from its near-top-left facelet. A fresh grid of
//! size N serializes as N² `0`s, then N² `1`s, through N² `5`s.

use std::sync::atomic::{AtomicU8, Ordering};

use smallvec::SmallVec;

/// Number of faces on a cube.
pub const FACE_COUNT: usize = 6;

/// A strip of facelet values (one row or column). Inline up to the
/// common small cube sizes.
pub(crate) type Strip = SmallVec<[u8; 8]>;

/// One of the six cube faces, in canonical order.
///
/// The discriminant doubles as the face's solved-state color digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    /// Face 0.
    Top = 0,
    /// Face 1.
    Left = 1,
    /// Face 2.
    Front = 2,
    /// Face 3.
    Right = 3,
    /// Face 4.
    Back = 4,
    /// Face 5.
    Bottom = 5,
}

impl Face {
    /// All faces in canonical (serialization) order.
    pub const ALL: [Face; FACE_COUNT] = [
        Face::Top,
        Face::Left,
        Face::Front,
        Face::Right,
        Face::Back,
        Face::Bottom,
    ];

    /// Maps a face index in `0..6` to a `Face`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Face> {
        Self::ALL.get(index).copied()
    }

    /// The canonical index of this face.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The face on the opposite side of the cube.
    #[must_use]
    pub fn opposite(self) -> Face {
        match self {
            Face::Top => Face::Bottom,
            Face::Left => Face::Right,
            Face::Front => Face::Back,
            Face::Right => Face::Left,
            Face::Back => Face::Front,
            Face::Bottom => Face::Top,
        }
    }

    /// The rotation axis this face belongs to.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Face::Top | Face::Bottom => Axis::Y,
            Face::Left | Face::Right => Axis::X,
            Face::Front | Face::Back => Axis::Z,
        }
    }

    /// Maps a layer depth measured from this face to the physical layer
    /// shared with the mirrored rotation of the opposite face.
    ///
    /// Top, Left and Front count layers in storage order; their opposites
    /// count from the other end, so `(F, L)` and `(F.opposite(), N-1-L)`
    /// land on the same physical layer.
    #[must_use]
    pub fn physical_layer(self, layer: usize, size: usize) -> usize {
        match self {
            Face::Top | Face::Left | Face::Front => layer,
            Face::Right | Face::Back | Face::Bottom => size - 1 - layer,
        }
    }
}

/// One of the three rotation axes, each pairing two opposite faces.
///
/// Rotations sharing an axis touch disjoint facelets (apart from the
/// physical layer itself) and may run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left/Right pair.
    X,
    /// Top/Bottom pair.
    Y,
    /// Front/Back pair.
    Z,
}

impl Axis {
    /// Number of axes.
    pub const COUNT: usize = 3;

    /// Dense index for per-axis counters.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// The 6×N×N facelet store.
///
/// All accessors take `&self`: exclusivity of conflicting accesses is
/// the access protocol's job, not the grid's.
pub struct FacetGrid {
    size: usize,
    cells: Box<[AtomicU8]>,
}

impl FacetGrid {
    /// Creates a solved grid: every facelet of face F holds color F.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "cube size must be positive");
        let per_face = size * size;
        let cells = (0..FACE_COUNT * per_face)
            .map(|cell| AtomicU8::new((cell / per_face) as u8))
            .collect();
        Self { size, cells }
    }

    /// The cube's edge length N.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    fn cell_index(&self, face: Face, row: usize, col: usize) -> usize {
        debug_assert!(row < self.size && col < self.size);
        (face.index() * self.size + row) * self.size + col
    }

    /// Reads one facelet.
    #[must_use]
    pub fn get(&self, face: Face, row: usize, col: usize) -> u8 {
        self.cells[self.cell_index(face, row, col)].load(Ordering::Relaxed)
    }

    /// Writes one facelet.
    pub fn set(&self, face: Face, row: usize, col: usize, value: u8) {
        self.cells[self.cell_index(face, row, col)].store(value, Ordering::Relaxed);
    }

    pub(crate) fn row(&self, face: Face, row: usize) -> Strip {
        (0..self.size).map(|col| self.get(face, row, col)).collect()
    }

    pub(crate) fn column(&self, face: Face, col: usize) -> Strip {
        (0..self.size).map(|row| self.get(face, row, col)).collect()
    }

    pub(crate) fn set_row(&self, face: Face, row: usize, values: &[u8]) {
        for (col, &value) in values.iter().enumerate() {
            self.set(face, row, col, value);
        }
    }

    pub(crate) fn set_column(&self, face: Face, col: usize, values: &[u8]) {
        for (row, &value) in values.iter().enumerate() {
            self.set(face, row, col, value);
        }
    }

    /// Serializes the full grid: `6 * N * N` color digits, faces in
    /// canonical order, each face row-major.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.cells
            .iter()
            .map(|cell| char::from(b'0' + cell.load(Ordering::Relaxed)))
            .collect()
    }
}

impl std::fmt::Debug for FacetGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetGrid")
            .field("size", &self.size)
            .field("cells", &self.snapshot())
            .finish()
    }
}
