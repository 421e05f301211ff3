//! Admission bookkeeping for rotations and inspections.
//!
//! One mutex guards the counters below; one condvar carries every wake.
//! Blocked threads re-check their own predicate in a loop, so correctness
//! never depends on wake order, only on the predicates:
//!
//! - a fresh rotation queues behind any active/waiting inspection, any
//!   active rotation on another axis, or any waiting rotation at all;
//!   once parked it resumes when no inspection is active and the active
//!   axis is its own (or none);
//! - a fresh inspection queues behind any active or waiting rotation;
//!   once parked it resumes when no rotation is active.
//!
//! The asymmetry between the queue rule and the resume predicate is what
//! makes the protocol no-overtake: waiting counts gate fresh arrivals
//! but never keep an already-parked thread blocked.
//!
//! Cancellation can fire at either suspension point (admission wait,
//! layer-lock wait). The unwind discipline is strict: remove exactly the
//! counter contributions made so far, broadcast if the departure left
//! the cube idle, and only then surface the failure. A thread cancelled
//! after admission runs the full exit bookkeeping first.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::cancel::{CancelToken, WaitSite};
use crate::error::CubeError;
use crate::grid::{Axis, Face};

use super::layers::LayerBank;

pub(crate) struct AccessController {
    shared: Arc<ControllerShared>,
    layers: LayerBank,
    size: usize,
}

struct ControllerShared {
    state: Mutex<ControllerState>,
    changed: Condvar,
}

#[derive(Debug, Default, Clone)]
struct ControllerState {
    waiting_rotations: usize,
    waiting_per_axis: [usize; Axis::COUNT],
    active_rotations: usize,
    /// The single axis rotations are currently admitted for. `None`
    /// exactly when `active_rotations == 0`.
    active_axis: Option<Axis>,
    waiting_inspections: usize,
    active_inspections: usize,
}

impl ControllerState {
    fn must_queue_rotation(&self, axis: Axis) -> bool {
        self.active_inspections > 0
            || self.waiting_inspections > 0
            || self.active_axis.is_some_and(|active| active != axis)
            || self.waiting_rotations > 0
    }

    fn may_rotate(&self, axis: Axis) -> bool {
        self.active_inspections == 0 && self.active_axis.map_or(true, |active| active == axis)
    }

    fn must_queue_inspection(&self) -> bool {
        self.active_rotations > 0 || self.waiting_rotations > 0
    }

    fn may_inspect(&self) -> bool {
        self.active_rotations == 0
    }

    fn is_idle(&self) -> bool {
        self.active_rotations == 0 && self.active_inspections == 0
    }

    fn admit_rotation(&mut self, axis: Axis) {
        self.active_rotations += 1;
        self.active_axis = Some(axis);
    }
}

impl WaitSite for ControllerShared {
    fn interrupt(&self) {
        // Taking the state mutex orders this broadcast after any
        // waiter's flag check; a waiter past its check is parked.
        let _state = self.state.lock();
        self.changed.notify_all();
    }
}

impl AccessController {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            shared: Arc::new(ControllerShared {
                state: Mutex::new(ControllerState::default()),
                changed: Condvar::new(),
            }),
            layers: LayerBank::new(size),
            size,
        }
    }

    /// Admits a rotation of `face`/`layer`: waits out the admission rule,
    /// then takes the physical layer's lock.
    ///
    /// On success the caller owns active-rotation status plus the layer
    /// slot and must release both through [`Self::exit_rotation`] or
    /// [`Self::release_rotation`].
    pub(crate) fn enter_rotation(
        &self,
        face: Face,
        layer: usize,
        token: &CancelToken,
    ) -> Result<(), CubeError> {
        let axis = face.axis();
        let registration = token.register(Arc::clone(&self.shared) as Arc<dyn WaitSite>);
        {
            let mut state = self.shared.state.lock();
            if token.is_cancelled() {
                return Err(CubeError::Cancelled);
            }
            if state.must_queue_rotation(axis) {
                state.waiting_rotations += 1;
                state.waiting_per_axis[axis.index()] += 1;
                debug!(
                    axis = ?axis,
                    waiting_rotations = state.waiting_rotations,
                    waiting_on_axis = state.waiting_per_axis[axis.index()],
                    waiting_inspections = state.waiting_inspections,
                    "rotation queued"
                );
                loop {
                    self.shared.changed.wait(&mut state);
                    if token.is_cancelled() {
                        state.waiting_rotations -= 1;
                        state.waiting_per_axis[axis.index()] -= 1;
                        if state.is_idle() {
                            // This departure may be the event another
                            // waiter was blocked behind.
                            self.shared.changed.notify_all();
                        }
                        debug!(axis = ?axis, "rotation wait cancelled");
                        return Err(CubeError::Cancelled);
                    }
                    if state.may_rotate(axis) {
                        break;
                    }
                    trace!(axis = ?axis, "rotation woken, still blocked");
                }
                state.waiting_rotations -= 1;
                state.waiting_per_axis[axis.index()] -= 1;
                state.admit_rotation(axis);
                // Co-waiting rotations on this axis can pass their
                // predicate now that the axis is set.
                self.shared.changed.notify_all();
            } else {
                state.admit_rotation(axis);
            }
            debug!(
                axis = ?axis,
                active_rotations = state.active_rotations,
                "rotation admitted"
            );
        }
        drop(registration);

        if token.is_cancelled() {
            // Admitted but cancelled before touching the grid: unwind as
            // a completed rotation that did no work.
            self.finish_rotation(axis);
            return Err(CubeError::Cancelled);
        }

        let physical = face.physical_layer(layer, self.size);
        if let Err(err) = self.layers.acquire(physical, token) {
            // Admitted to the axis but never got the layer; the active
            // count must not stay incremented.
            self.finish_rotation(axis);
            return Err(err);
        }
        Ok(())
    }

    /// Releases the layer slot, runs exit bookkeeping, and surfaces a
    /// pending cancellation only after both.
    pub(crate) fn exit_rotation(
        &self,
        face: Face,
        layer: usize,
        token: &CancelToken,
    ) -> Result<(), CubeError> {
        self.release_rotation(face, layer);
        if token.is_cancelled() {
            Err(CubeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The unconditional exit path; also runs when a hook panics so the
    /// slot and counters cannot leak.
    pub(crate) fn release_rotation(&self, face: Face, layer: usize) {
        let physical = face.physical_layer(layer, self.size);
        self.layers.release(physical);
        self.finish_rotation(face.axis());
    }

    fn finish_rotation(&self, axis: Axis) {
        let mut state = self.shared.state.lock();
        state.active_rotations -= 1;
        if state.active_rotations == 0 {
            state.active_axis = None;
            self.shared.changed.notify_all();
        }
        debug!(
            axis = ?axis,
            active_rotations = state.active_rotations,
            "rotation exited"
        );
    }

    /// Admits an inspection: waits while any rotation is active or
    /// queued.
    pub(crate) fn enter_inspection(&self, token: &CancelToken) -> Result<(), CubeError> {
        let registration = token.register(Arc::clone(&self.shared) as Arc<dyn WaitSite>);
        {
            let mut state = self.shared.state.lock();
            if token.is_cancelled() {
                return Err(CubeError::Cancelled);
            }
            if state.must_queue_inspection() {
                state.waiting_inspections += 1;
                debug!(
                    waiting_inspections = state.waiting_inspections,
                    waiting_rotations = state.waiting_rotations,
                    "inspection queued"
                );
                loop {
                    self.shared.changed.wait(&mut state);
                    if token.is_cancelled() {
                        state.waiting_inspections -= 1;
                        if state.is_idle() {
                            self.shared.changed.notify_all();
                        }
                        debug!("inspection wait cancelled");
                        return Err(CubeError::Cancelled);
                    }
                    if state.may_inspect() {
                        break;
                    }
                    trace!("inspection woken, still blocked");
                }
                state.waiting_inspections -= 1;
                state.active_inspections += 1;
                // Co-waiting inspectors share the same predicate.
                self.shared.changed.notify_all();
            } else {
                state.active_inspections += 1;
            }
            debug!(
                active_inspections = state.active_inspections,
                "inspection admitted"
            );
        }
        drop(registration);

        if token.is_cancelled() {
            self.finish_inspection();
            return Err(CubeError::Cancelled);
        }
        Ok(())
    }

    /// Runs exit bookkeeping, then surfaces a pending cancellation.
    pub(crate) fn exit_inspection(&self, token: &CancelToken) -> Result<(), CubeError> {
        self.finish_inspection();
        if token.is_cancelled() {
            Err(CubeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The unconditional inspection exit; also the hook-panic path.
    pub(crate) fn finish_inspection(&self) {
        let mut state = self.shared.state.lock();
        state.active_inspections -= 1;
        if state.active_inspections == 0 {
            self.shared.changed.notify_all();
        }
        debug!(
            active_inspections = state.active_inspections,
            "inspection exited"
        );
    }

    #[cfg(test)]
    fn debug_state(&self) -> ControllerState {
        self.shared.state.lock().clone()
    }
}
