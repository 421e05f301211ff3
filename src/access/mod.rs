//! The access-control protocol.
//!
//! This module decides, for every calling thread, whether it may proceed
//! immediately, must queue, and in what order queued threads are
//! released. It is a readers–writers variant: writers (rotations) are
//! partitioned into three compatibility classes (axes) that may run in
//! parallel within a class; readers (inspections) exclude every writer
//! class.
//!
//! # Fairness
//!
//! Admission is no-overtake: once any thread is queued, every
//! later-arriving thread of any class queues behind it, even when it
//! would be compatible with the active class. A steady stream of
//! same-class writers can therefore never starve readers or another
//! writer class.
//!
//! # Wake discipline
//!
//! One exclusive section guards explicit counters; blocked threads park
//! on a single condvar and re-check their own predicate on every wake
//! (broadcast-and-recheck, no baton passing). Layer-level exclusion is a
//! separate bank of per-physical-layer locks acquired after admission.

mod controller;
mod layers;

pub(crate) use controller::AccessController;
