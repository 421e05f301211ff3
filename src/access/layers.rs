//! The per-physical-layer lock bank.
//!
//! N boolean slots behind one mutex/condvar pair. A slot is identified
//! by physical layer index (see [`Face::physical_layer`](crate::Face::physical_layer)),
//! so the mirrored face/layer pair of a rotation contends on the same
//! slot. Acquisition is cancellable with the same wait-site mechanism as
//! the admission queue.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::cancel::{CancelToken, WaitSite};
use crate::error::CubeError;

pub(super) struct LayerBank {
    shared: Arc<BankShared>,
}

struct BankShared {
    /// `true` while the slot's physical layer is being rotated.
    held: Mutex<Box<[bool]>>,
    released: Condvar,
}

impl WaitSite for BankShared {
    fn interrupt(&self) {
        // Taking the slot mutex orders this broadcast after any waiter's
        // flag check; a waiter past its check is parked and gets woken.
        let _held = self.held.lock();
        self.released.notify_all();
    }
}

impl LayerBank {
    pub(super) fn new(size: usize) -> Self {
        Self {
            shared: Arc::new(BankShared {
                held: Mutex::new(vec![false; size].into_boxed_slice()),
                released: Condvar::new(),
            }),
        }
    }

    /// Blocks until the slot for `layer` is free, then takes it.
    ///
    /// On cancellation the slot is not taken; the caller owns the
    /// surrounding rotation bookkeeping and must unwind it.
    pub(super) fn acquire(&self, layer: usize, token: &CancelToken) -> Result<(), CubeError> {
        let registration = token.register(Arc::clone(&self.shared) as Arc<dyn WaitSite>);
        let mut held = self.shared.held.lock();
        loop {
            if token.is_cancelled() {
                return Err(CubeError::Cancelled);
            }
            if !held[layer] {
                break;
            }
            trace!(layer, "physical layer contended, waiting");
            self.shared.released.wait(&mut held);
        }
        held[layer] = true;
        drop(held);
        drop(registration);
        Ok(())
    }

    /// Frees the slot for `layer` and wakes contenders.
    pub(super) fn release(&self, layer: usize) {
        let mut held = self.shared.held.lock();
        debug_assert!(held[layer], "released a layer that was not held");
        held[layer] = false;
        self.shared.released.notify_all();
    }
}
