//! Cancellation of blocked callers: unwind, wake-ups, and no leaks.
//!
//! Each scenario parks one operation inside a hook (hooks run between
//! admission and release, so the cube stays busy), queues victims
//! behind it, cancels them, and then checks that the survivors and all
//! later operations still complete; the counters must have been fully
//! unwound.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use cubesync::{CancelToken, Cube, CubeError};

const PAUSE: Duration = Duration::from_millis(50);

/// A latch hooks can park on; stays open once opened.
struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            changed: Condvar::new(),
        })
    }

    fn wait(&self) {
        let mut open = self.open.lock().expect("gate lock");
        while !*open {
            open = self.changed.wait(open).expect("gate wait");
        }
    }

    fn open(&self) {
        *self.open.lock().expect("gate lock") = true;
        self.changed.notify_all();
    }
}

#[test]
fn cancelling_a_blocked_rotator_leaves_the_cube_functional() {
    let gate = Gate::new();
    let cube = {
        let gate = Arc::clone(&gate);
        Arc::new(
            Cube::builder(4)
                .before_inspection(move || gate.wait())
                .build(),
        )
    };

    let inspector = {
        let cube = Arc::clone(&cube);
        thread::spawn(move || {
            let token = CancelToken::new();
            cube.inspect(&token).expect("snapshot succeeds")
        })
    };
    thread::sleep(PAUSE);

    let token = CancelToken::new();
    let rotator = {
        let cube = Arc::clone(&cube);
        let token = token.clone();
        thread::spawn(move || cube.rotate(2, 0, &token))
    };
    thread::sleep(PAUSE);

    token.cancel();
    assert_eq!(rotator.join().expect("join"), Err(CubeError::Cancelled));

    gate.open();
    // The cancelled rotator never touched the grid.
    assert_eq!(
        inspector.join().expect("join"),
        Cube::new(4).inspect(&CancelToken::new()).expect("snapshot"),
    );

    // And the protocol state drained: a later rotation is admitted.
    cube.rotate(2, 0, &CancelToken::new()).expect("rotation succeeds");
}

#[test]
fn cancelling_a_blocked_inspector_leaves_the_cube_functional() {
    let gate = Gate::new();
    let cube = {
        let gate = Arc::clone(&gate);
        Arc::new(
            Cube::builder(4)
                .before_rotation(move |_, _| gate.wait())
                .build(),
        )
    };

    let rotator = {
        let cube = Arc::clone(&cube);
        thread::spawn(move || {
            let token = CancelToken::new();
            cube.rotate(1, 1, &token).expect("rotation succeeds");
        })
    };
    thread::sleep(PAUSE);

    let token = CancelToken::new();
    let inspector = {
        let cube = Arc::clone(&cube);
        let token = token.clone();
        thread::spawn(move || cube.inspect(&token))
    };
    thread::sleep(PAUSE);

    token.cancel();
    assert_eq!(inspector.join().expect("join"), Err(CubeError::Cancelled));

    gate.open();
    rotator.join().expect("join");

    let reference = {
        let other = Cube::new(4);
        let token = CancelToken::new();
        other.rotate(1, 1, &token).expect("rotation succeeds");
        other.inspect(&token).expect("snapshot")
    };
    assert_eq!(
        cube.inspect(&CancelToken::new()).expect("snapshot"),
        reference
    );
}

#[test]
fn cancelling_a_layer_waiter_unwinds_its_admission() {
    let gate = Gate::new();
    let cube = {
        let gate = Arc::clone(&gate);
        Arc::new(
            Cube::builder(4)
                .before_rotation(move |_, _| gate.wait())
                .build(),
        )
    };

    // Holder: front face, layer 0, which is physical layer 0 on axis Z.
    let holder = {
        let cube = Arc::clone(&cube);
        thread::spawn(move || {
            let token = CancelToken::new();
            cube.rotate(2, 0, &token).expect("rotation succeeds");
        })
    };
    thread::sleep(PAUSE);

    // Same axis, mirrored depth: admitted to the axis, then blocks on
    // the same physical layer slot.
    let token = CancelToken::new();
    let contender = {
        let cube = Arc::clone(&cube);
        let token = token.clone();
        thread::spawn(move || cube.rotate(4, 3, &token))
    };
    thread::sleep(PAUSE);

    token.cancel();
    assert_eq!(contender.join().expect("join"), Err(CubeError::Cancelled));

    gate.open();
    holder.join().expect("join");

    // Only the holder's rotation is visible, and the mirrored pair's
    // slot is free again for the exact move that was cancelled.
    cube.rotate(4, 3, &CancelToken::new()).expect("rotation succeeds");
    let reference = {
        let other = Cube::new(4);
        let token = CancelToken::new();
        other.rotate(2, 0, &token).expect("rotation succeeds");
        other.rotate(4, 3, &token).expect("rotation succeeds");
        other.inspect(&token).expect("snapshot")
    };
    assert_eq!(
        cube.inspect(&CancelToken::new()).expect("snapshot"),
        reference
    );
}

#[test]
fn mass_cancellation_unblocks_nobody_and_deadlocks_nothing() {
    let gate = Gate::new();
    let cube = {
        let gate = Arc::clone(&gate);
        Arc::new(
            Cube::builder(4)
                .before_rotation(move |face, _| {
                    // Only the holder's face parks; victims never get here.
                    if face == 0 {
                        gate.wait();
                    }
                })
                .build(),
        )
    };

    let holder = {
        let cube = Arc::clone(&cube);
        thread::spawn(move || {
            let token = CancelToken::new();
            cube.rotate(0, 0, &token).expect("rotation succeeds");
        })
    };
    thread::sleep(PAUSE);

    let mut tokens = Vec::new();
    let mut victims = Vec::new();
    for face in [1usize, 2, 3] {
        let token = CancelToken::new();
        tokens.push(token.clone());
        let cube = Arc::clone(&cube);
        victims.push(thread::spawn(move || cube.rotate(face, 1, &token)));
    }
    for _ in 0..3 {
        let token = CancelToken::new();
        tokens.push(token.clone());
        let cube = Arc::clone(&cube);
        victims.push(thread::spawn(move || cube.inspect(&token).map(|_| ())));
    }
    thread::sleep(PAUSE);

    for token in &tokens {
        token.cancel();
    }
    for victim in victims {
        assert_eq!(victim.join().expect("join"), Err(CubeError::Cancelled));
    }

    gate.open();
    holder.join().expect("join");

    // Everything drained: fresh operations of every class still run.
    let token = CancelToken::new();
    cube.rotate(1, 1, &token).expect("rotation succeeds");
    let snapshot = cube.inspect(&token).expect("snapshot succeeds");
    let mut counts = [0usize; 6];
    for b in snapshot.bytes() {
        counts[usize::from(b - b'0')] += 1;
    }
    assert_eq!(counts, [16; 6]);
}
