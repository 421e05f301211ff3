//! The pure layer-rotation transformation.
//!
//! [`rotate_layer`] permutes the four border strips around a pivot face
//! at a given depth, and on edge layers additionally turns the pivot (or
//! opposite) face in place. The strip cycle for each pivot face is
//! enumerated explicitly; the mirrored positions (`M = N-1-L`) follow
//! the same mapping as [`Face::physical_layer`], so a rotation of face F
//! at depth L and of its opposite at depth N-1-L move the same physical
//! slice.
//!
//! The four source strips are read into scratch buffers before any write
//! happens, so a rotation never observes its own partial output.
//!
//! This is pure data transformation: callers must already hold
//! active-rotation status for the face's axis and the physical layer's
//! lock.

use crate::grid::{Face, FacetGrid, Strip};

/// Rotates `layer` of `face` clockwise (as seen from that face).
pub(crate) fn rotate_layer(grid: &FacetGrid, face: Face, layer: usize) {
    let size = grid.size();
    debug_assert!(layer < size);
    let near = layer;
    let far = size - 1 - layer;

    match face {
        Face::Top => {
            let a = grid.row(Face::Front, near);
            let b = grid.row(Face::Right, near);
            let c = grid.row(Face::Back, near);
            let d = grid.row(Face::Left, near);
            grid.set_row(Face::Left, near, &a);
            grid.set_row(Face::Front, near, &b);
            grid.set_row(Face::Right, near, &c);
            grid.set_row(Face::Back, near, &d);
        }
        Face::Bottom => {
            let a = grid.row(Face::Back, far);
            let b = grid.row(Face::Left, far);
            let c = grid.row(Face::Front, far);
            let d = grid.row(Face::Right, far);
            grid.set_row(Face::Left, far, &a);
            grid.set_row(Face::Front, far, &b);
            grid.set_row(Face::Right, far, &c);
            grid.set_row(Face::Back, far, &d);
        }
        Face::Left => {
            let mut a = grid.column(Face::Back, far);
            let b = grid.column(Face::Top, near);
            let mut c = grid.column(Face::Bottom, near);
            let d = grid.column(Face::Front, near);
            a.reverse();
            c.reverse();
            grid.set_column(Face::Top, near, &a);
            grid.set_column(Face::Front, near, &b);
            grid.set_column(Face::Back, far, &c);
            grid.set_column(Face::Bottom, near, &d);
        }
        Face::Right => {
            let a = grid.column(Face::Front, far);
            let b = grid.column(Face::Bottom, far);
            let mut c = grid.column(Face::Top, far);
            let mut d = grid.column(Face::Back, near);
            c.reverse();
            d.reverse();
            grid.set_column(Face::Top, far, &a);
            grid.set_column(Face::Front, far, &b);
            grid.set_column(Face::Back, near, &c);
            grid.set_column(Face::Bottom, far, &d);
        }
        Face::Front => {
            let mut a = grid.column(Face::Left, far);
            let b = grid.row(Face::Bottom, near);
            let c = grid.row(Face::Top, far);
            let mut d = grid.column(Face::Right, near);
            a.reverse();
            d.reverse();
            grid.set_row(Face::Top, far, &a);
            grid.set_column(Face::Left, far, &b);
            grid.set_column(Face::Right, near, &c);
            grid.set_row(Face::Bottom, near, &d);
        }
        Face::Back => {
            let a = grid.column(Face::Right, far);
            let mut b = grid.row(Face::Top, near);
            let mut c = grid.row(Face::Bottom, far);
            let d = grid.column(Face::Left, near);
            b.reverse();
            c.reverse();
            grid.set_row(Face::Top, near, &a);
            grid.set_column(Face::Left, near, &b);
            grid.set_column(Face::Right, far, &c);
            grid.set_row(Face::Bottom, far, &d);
        }
    }

    // Edge layers also turn a face in place. For size 1 both ends apply.
    if layer == 0 {
        rotate_face_clockwise(grid, face);
    }
    if layer == size - 1 {
        rotate_face_counterclockwise(grid, face.opposite());
    }
}

fn read_face(grid: &FacetGrid, face: Face) -> Vec<Strip> {
    (0..grid.size()).map(|row| grid.row(face, row)).collect()
}

fn rotate_face_clockwise(grid: &FacetGrid, face: Face) {
    let size = grid.size();
    let old = read_face(grid, face);
    for row in 0..size {
        for col in 0..size {
            grid.set(face, row, col, old[size - 1 - col][row]);
        }
    }
}

fn rotate_face_counterclockwise(grid: &FacetGrid, face: Face) {
    let size = grid.size();
    let old = read_face(grid, face);
    for row in 0..size {
        for col in 0..size {
            grid.set(face, row, col, old[col][size - 1 - row]);
        }
    }
}
