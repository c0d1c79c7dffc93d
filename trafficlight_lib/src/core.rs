//! Phases of a traffic light.
//!
//! This module provides the `Phase` enum, the `Cyclic` trait that describes how a phase advances, and
//! `AtomicPhase`, a lock-free cell that lets any thread read the phase while a single writer advances it.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Represents a finite set of states visited in a fixed order. It can be derived using `#[derive(Cyclic)]`
/// for enums whose variants carry no data.
pub trait Cyclic: Copy + 'static {
    /// The number of states in the cycle.
    const COUNT: usize;
    /// Returns the state the cycle starts in.
    fn initial() -> Self;
    /// Returns the state that follows `self`. The last state is followed by the initial one.
    fn next(self) -> Self;
    /// Returns the position of `self` in the cycle.
    fn index(self) -> u8;
    /// Returns the state at `index`, or `None` if the index is out of range.
    fn from_index(index: u8) -> Option<Self>;
}

/// The phase of a traffic light.
///
/// A light starts `Red` and alternates between the two phases forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Cyclic)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Traffic must stop.
    Red,
    /// Traffic may go.
    Green,
}

impl Phase {
    /// Returns the opposite phase.
    pub fn toggled(self) -> Self {
        self.next()
    }

    /// Returns `true` if the phase is `Green`.
    pub fn is_green(self) -> bool {
        self == Phase::Green
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::initial()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => f.write_str("red"),
            Phase::Green => f.write_str("green"),
        }
    }
}

/// A `Cyclic` value that can be shared between threads without a lock.
///
/// The value is stored as its cycle index in an `AtomicU8`, so a reader always observes one of the states
/// that was actually stored, never a torn value.
pub struct AtomicPhase<P: Cyclic> {
    index: AtomicU8,
    phantom: PhantomData<P>,
}

impl<P: Cyclic> AtomicPhase<P> {
    /// Constructs a cell holding `phase`.
    pub fn new(phase: P) -> Self {
        AtomicPhase {
            index: AtomicU8::new(phase.index()),
            phantom: PhantomData,
        }
    }

    /// Returns the current state.
    pub fn load(&self) -> P {
        let index = self.index.load(Ordering::Acquire);
        match P::from_index(index) {
            Some(phase) => phase,
            // only indices produced by `Cyclic::index` are ever stored
            None => unreachable!("invalid phase index {}", index),
        }
    }

    /// Replaces the current state.
    pub fn store(&self, phase: P) {
        self.index.store(phase.index(), Ordering::Release);
    }

    /// Moves to the next state and returns it.
    ///
    /// The load and the store are not a single atomic step, so only one thread may advance a given cell.
    pub fn advance(&self) -> P {
        let next = self.load().next();
        self.store(next);
        next
    }
}

impl<P: Cyclic> Default for AtomicPhase<P> {
    fn default() -> Self {
        AtomicPhase::new(P::initial())
    }
}

impl<P: Cyclic + fmt::Debug> fmt::Debug for AtomicPhase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicPhase").field(&self.load()).finish()
    }
}

extern crate trafficlight_derive;
pub use trafficlight_derive::Cyclic;
