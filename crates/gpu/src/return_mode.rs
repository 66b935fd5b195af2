//! Round-trip mode switching.
//!
//! `preferred` is what the caller asked for, `enabled` is what the shader sees. Turning the
//! mode on is immediate. Turning it off lets every pane that is already flying home land
//! first: those panes are `Draining`, and `enabled` stays on until none are left.

use tracing::debug;

use crate::motion::{Motion, ROUND_TRIP_PERIOD};

/// Window before the outbound/return flip inside which a disable request sends the pane
/// back to its departure instead of letting it turn around.
pub const FLIP_EPSILON: f64 = 1e-3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PaneReturnState {
    #[default]
    Idle,
    /// On its return leg; must finish before round trips switch off.
    Draining,
}

/// Per-instance motion the state machine reads and rewinds.
pub trait MotionTable {
    fn motion(&self, index: usize) -> Motion;
    fn set_phase(&mut self, index: usize, phase: f64);
    fn is_visible(&self, index: usize) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct ReturnMode {
    preferred: bool,
    enabled: bool,
    states: Vec<PaneReturnState>,
}

impl ReturnMode {
    pub fn new(enabled: bool) -> Self {
        Self {
            preferred: enabled,
            enabled,
            states: Vec::new(),
        }
    }

    pub fn preferred(&self) -> bool {
        self.preferred
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self, index: usize) -> PaneReturnState {
        self.states.get(index).copied().unwrap_or_default()
    }

    pub fn is_draining(&self) -> bool {
        self.states.contains(&PaneReturnState::Draining)
    }

    pub fn draining_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == PaneReturnState::Draining)
            .count()
    }

    /// Records a request. Returns `true` when `enabled` changed.
    pub fn request(
        &mut self,
        preferred: bool,
        time: f64,
        active: usize,
        table: &mut dyn MotionTable,
    ) -> bool {
        self.preferred = preferred;
        if preferred {
            self.states.clear();
            if self.enabled {
                return false;
            }
            // One-way cycles live in [0, 1); keep them on the outbound leg of [0, 2).
            for i in 0..active {
                let motion = table.motion(i);
                if motion.cycle(time, ROUND_TRIP_PERIOD) >= 1.0 {
                    table.set_phase(i, motion.rewound(ROUND_TRIP_PERIOD).phase);
                }
            }
            self.enabled = true;
            debug!(active, "return mode enabled");
            return true;
        }

        if !self.enabled {
            return false;
        }
        self.states.clear();
        self.states.resize(active, PaneReturnState::Idle);
        for i in 0..active {
            if !table.is_visible(i) {
                continue;
            }
            let motion = table.motion(i);
            let cycle = motion.cycle(time, ROUND_TRIP_PERIOD);
            if cycle > 1.0 && motion.speed > 0.0 {
                self.states[i] = PaneReturnState::Draining;
            } else if cycle >= 1.0 - FLIP_EPSILON {
                // Rewinding one unit from just below 1 would wrap into the return half.
                // A stopped or reversed pane never lands on its own, so it starts over too.
                table.set_phase(i, motion.restarted(time, ROUND_TRIP_PERIOD).phase);
            }
        }
        debug!(draining = self.draining_count(), "return mode disable requested");
        false
    }

    /// Per-frame step while a disable is pending. Returns `true` when `enabled` flipped off.
    pub fn reconcile(&mut self, time: f64, active: usize, table: &mut dyn MotionTable) -> bool {
        if !self.enabled || self.preferred {
            return false;
        }
        self.states.truncate(active);
        for i in 0..active {
            if !table.is_visible(i) {
                if let Some(state) = self.states.get_mut(i) {
                    *state = PaneReturnState::Idle;
                }
                continue;
            }
            let motion = table.motion(i);
            let cycle = motion.cycle(time, ROUND_TRIP_PERIOD);
            match self.state(i) {
                PaneReturnState::Draining => {
                    if cycle < 1.0 || motion.speed <= 0.0 {
                        self.states[i] = PaneReturnState::Idle;
                        table.set_phase(i, motion.restarted(time, ROUND_TRIP_PERIOD).phase);
                    }
                }
                PaneReturnState::Idle => {
                    if cycle > 1.0 {
                        table.set_phase(i, motion.rewound(ROUND_TRIP_PERIOD).phase);
                    }
                }
            }
        }

        if self.is_draining() {
            return false;
        }
        self.states.clear();
        self.enabled = false;
        debug!("return mode disabled");
        true
    }
}
