// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Change gate and cycle state machine
//!
//! The dirty flag decides whether a trigger does anything at all. The phase
//! guarantees at most one batch in flight: triggers arriving while a cycle
//! runs collapse into a single pending re-run.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    InFlight,
    /// In flight with one re-run pending
    DirtyWhileInFlight,
}

/// Answer to a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing changed since the last successful cycle
    Unchanged,
    /// The caller owns a new cycle and must call [`ChangeGate::complete`]
    Start,
    /// A cycle is already running; it will run once more when done
    Queued,
}

/// What the cycle owner does after [`ChangeGate::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Idle,
    Rerun,
}

#[derive(Debug)]
struct GateState {
    has_changed: bool,
    phase: CyclePhase,
}

#[derive(Debug)]
pub struct ChangeGate {
    state: Mutex<GateState>,
}

impl Default for ChangeGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeGate {
    /// New gate; starts dirty so the first trigger runs a cycle
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                has_changed: true,
                phase: CyclePhase::Idle,
            }),
        }
    }

    pub fn has_changed(&self) -> bool {
        self.state.lock().has_changed
    }

    pub fn phase(&self) -> CyclePhase {
        self.state.lock().phase
    }

    /// Record that the inputs of the result query changed
    pub fn mark_changed(&self) {
        let mut state = self.state.lock();
        state.has_changed = true;
        if state.phase == CyclePhase::InFlight {
            state.phase = CyclePhase::DirtyWhileInFlight;
        }
    }

    pub fn try_begin(&self) -> GateDecision {
        let mut state = self.state.lock();
        if !state.has_changed {
            return GateDecision::Unchanged;
        }

        match state.phase {
            CyclePhase::Idle => {
                state.phase = CyclePhase::InFlight;
                GateDecision::Start
            }
            CyclePhase::InFlight | CyclePhase::DirtyWhileInFlight => {
                state.phase = CyclePhase::DirtyWhileInFlight;
                GateDecision::Queued
            }
        }
    }

    /// Clear the dirty flag after a successful cycle
    ///
    /// A change or trigger seen while the cycle was in flight keeps the flag
    /// set for the pending re-run.
    pub fn mark_clean(&self) {
        let mut state = self.state.lock();
        if state.phase == CyclePhase::InFlight {
            state.has_changed = false;
        }
    }

    /// End the running cycle, consuming the pending re-run if there is one
    pub fn complete(&self) -> Completion {
        let mut state = self.state.lock();
        match state.phase {
            CyclePhase::DirtyWhileInFlight => {
                state.phase = CyclePhase::InFlight;
                Completion::Rerun
            }
            CyclePhase::InFlight | CyclePhase::Idle => {
                state.phase = CyclePhase::Idle;
                Completion::Idle
            }
        }
    }

    /// Return to `Idle` when the cycle owner went away mid-flight, dropping
    /// any pending re-run; the dirty flag is left as it is
    pub fn abandon(&self) {
        self.state.lock().phase = CyclePhase::Idle;
    }
}
