//! [`PidSnapshot`] – a serializable copy of a controller's public state.
//!
//! Recorded by history-style observers so that a captured event stream can be
//! replayed or analysed offline next to the controller state that produced
//! it.

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the controller state a modifier is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidSnapshot {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Current setpoint.
    pub setpoint: f64,
    /// Last observed process variable.
    pub pv: f64,
    /// Running integration sum.
    pub integration: f64,
    /// Unweighted `(p, i, d)` terms of the most recent tick, if any.
    pub last_pid: Option<(f64, f64, f64)>,
}
