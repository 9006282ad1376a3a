//! [`PidPlus`] – the observable, extensible controller.
//!
//! Wraps the plain [`Pid`] computation and announces every lifecycle point
//! to an ordered chain of [`Modifier`]s:
//!
//! - construction emits one [`Attached`][pidplus_types::Attached] per
//!   modifier, then a single [`InitialConditions`],
//! - a setpoint write emits [`SetpointChange`] *before* the store,
//! - every tick emits [`BaseTerms`] → [`ModifyTerms`] → [`CalculateU`],
//!   filling in whatever the handlers left unset.
//!
//! A term supplied by a handler during [`BaseTerms`] replaces the internal
//! calculation *and its side effect*; a control value supplied anywhere
//! short-circuits the weighted sum.  Propagation, short-circuiting, and
//! failure fan-out are the dispatcher's business (see `dispatch.rs`).
//!
//! # Example
//!
//! ```rust
//! use pidplus_core::PidPlus;
//!
//! let mut pid = PidPlus::new(1.0, 0.0, 0.0, ()).unwrap();
//! pid.set_setpoint(4.0).unwrap();
//!
//! let u = pid.pid(1.0, Some(0.1)).unwrap();
//! assert!((u - 3.0).abs() < 1e-12);
//! ```

use std::fmt;

use pidplus_types::{
    BaseTerms, CalculateU, Event, InitialConditions, ModifyTerms, PidError, PidSnapshot,
    SetpointChange,
};
use uuid::Uuid;

use crate::modifier::{IntoModifiers, Modifier};
use crate::pid::Pid;

/// PID controller with an observable, modifiable control loop.
///
/// Construct with [`PidPlus::new`] or [`PidPlus::with_dt`], passing anything
/// that converts via [`IntoModifiers`]: `()` for a bare controller, a single
/// modifier, or a `Vec<Box<dyn Modifier>>` for an ordered chain.
pub struct PidPlus {
    pub(crate) id: Uuid,
    pub(crate) base: Pid,
    pub(crate) modifiers: Vec<Box<dyn Modifier>>,
    pub(crate) depth: usize,
}

impl fmt::Debug for PidPlus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidPlus")
            .field("id", &self.id)
            .field("base", &self.base)
            .field("modifiers", &self.modifier_names())
            .field("depth", &self.depth)
            .finish()
    }
}

impl PidPlus {
    /// Create a controller with the given gains and modifier chain.
    ///
    /// Emits one [`Attached`][pidplus_types::Attached] per modifier (each
    /// modifier sees only its own), then applies the zero initial
    /// conditions, which emits a single
    /// [`InitialConditions`][pidplus_types::InitialConditions] through the
    /// whole chain.
    ///
    /// # Errors
    ///
    /// Any failure a modifier raises during the construction events is
    /// returned after the remaining modifiers have been notified.
    pub fn new(kp: f64, ki: f64, kd: f64, modifiers: impl IntoModifiers) -> Result<Self, PidError> {
        Self::build(Pid::new(kp, ki, kd), modifiers)
    }

    /// Like [`PidPlus::new`], with a preconfigured tick length so callers
    /// may pass `None` for `dt`.
    pub fn with_dt(
        kp: f64,
        ki: f64,
        kd: f64,
        dt: f64,
        modifiers: impl IntoModifiers,
    ) -> Result<Self, PidError> {
        Self::build(Pid::with_dt(kp, ki, kd, dt), modifiers)
    }

    fn build(base: Pid, modifiers: impl IntoModifiers) -> Result<Self, PidError> {
        let mut plus = Self {
            id: Uuid::new_v4(),
            base,
            modifiers: modifiers.into_modifiers(),
            depth: 0,
        };
        plus.announce_attachments()?;
        plus.initial_conditions(Some(0.0), Some(0.0))?;
        Ok(plus)
    }

    /// Identity of this controller, as recorded by attachment guards.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Proportional gain.
    pub fn kp(&self) -> f64 {
        self.base.kp
    }

    /// Integral gain.
    pub fn ki(&self) -> f64 {
        self.base.ki
    }

    /// Derivative gain.
    pub fn kd(&self) -> f64 {
        self.base.kd
    }

    /// Replace all three gains at once.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.base.set_gains(kp, ki, kd);
    }

    /// Current setpoint.
    pub fn setpoint(&self) -> f64 {
        self.base.setpoint
    }

    /// Last observed process variable.
    pub fn pv(&self) -> f64 {
        self.base.pv
    }

    /// Running integration sum.
    pub fn integration(&self) -> f64 {
        self.base.integration
    }

    /// Overwrite the integration sum (used by windup and reset modifiers).
    pub fn set_integration(&mut self, integration: f64) {
        self.base.integration = integration;
    }

    /// Error of the previous tick.
    pub fn prev_e(&self) -> f64 {
        self.base.prev_e
    }

    /// Preconfigured tick length, if any.
    pub fn dt_default(&self) -> Option<f64> {
        self.base.dt_default
    }

    /// Set or clear the preconfigured tick length.
    pub fn set_dt_default(&mut self, dt: Option<f64>) {
        self.base.dt_default = dt;
    }

    /// Unweighted `(p, i, d)` terms of the most recent tick.
    pub fn last_pid(&self) -> Option<(f64, f64, f64)> {
        self.base.last_pid
    }

    /// Names of the attached modifiers, in chain order.
    pub fn modifier_names(&self) -> Vec<String> {
        self.modifiers.iter().map(|m| m.name().to_string()).collect()
    }

    /// How many events deep the current emission is nested.
    ///
    /// `1` while a top-level event is being dispatched, `2` for an event a
    /// handler emitted from inside that dispatch, and so on.  Replacement
    /// events after a stop or failure keep the depth of the event they
    /// replace.
    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    /// A serializable copy of the state modifiers are allowed to observe.
    pub fn snapshot(&self) -> PidSnapshot {
        PidSnapshot {
            kp: self.base.kp,
            ki: self.base.ki,
            kd: self.base.kd,
            setpoint: self.base.setpoint,
            pv: self.base.pv,
            integration: self.base.integration,
            last_pid: self.base.last_pid,
        }
    }

    /// Request a setpoint write.
    ///
    /// Emits [`SetpointChange`] through the chain first; the stored value is
    /// the handler override ([`SetpointChange::sp`]) when one was set, the
    /// requested target otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing handler after the remaining modifiers
    /// have been notified.
    pub fn set_setpoint(&mut self, setpoint: f64) -> Result<(), PidError> {
        let event = SetpointChange::new(self.base.setpoint, setpoint);
        self.write_setpoint(event)
    }

    /// Write the setpoint with the change flagged as controller-internal.
    ///
    /// Ramping modifiers use this for the per-tick steps they re-issue, so
    /// the chain (including history observers) still sees every step while
    /// the ramp itself passes the flagged events through untouched.
    pub fn ramp_setpoint(&mut self, setpoint: f64) -> Result<(), PidError> {
        let event = SetpointChange::internal(self.base.setpoint, setpoint);
        self.write_setpoint(event)
    }

    fn write_setpoint(&mut self, event: SetpointChange) -> Result<(), PidError> {
        let mut event = Event::SetpointChange(event);
        self.dispatch(&mut event)?;
        let Event::SetpointChange(change) = event else {
            unreachable!("dispatch preserves the event variant");
        };
        self.base.setpoint = change.sp.unwrap_or_else(|| change.sp_to());
        Ok(())
    }

    /// Re-seed the controller and notify the chain.
    ///
    /// The state changes are applied exactly as on the plain
    /// [`Pid`][crate::Pid] – in particular, assigning a setpoint here does
    /// **not** emit a [`SetpointChange`] – and a single
    /// [`InitialConditions`] is emitted afterwards.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing handler after the remaining modifiers
    /// have been notified.
    pub fn initial_conditions(
        &mut self,
        pv: Option<f64>,
        setpoint: Option<f64>,
    ) -> Result<(), PidError> {
        self.base.initial_conditions(pv, setpoint);
        let mut event = Event::InitialConditions(InitialConditions::new(setpoint, pv));
        self.dispatch(&mut event)?;
        Ok(())
    }

    /// Advance one tick and return the control value.
    ///
    /// The three stage events fire in order; between them the controller
    /// fills in whatever the handlers left unset:
    ///
    /// 1. [`BaseTerms`] – handlers may supply any of `e`, `p`, `i`, `d`,
    ///    `u`.  A supplied `i` or `d` also suppresses the matching internal
    ///    side effect (integration advance, previous-pv update).  A supplied
    ///    `u` suppresses nothing here.
    /// 2. [`ModifyTerms`] – terms are resolved; handlers may rewrite them or
    ///    supply `u`.
    /// 3. [`CalculateU`] – the weighted sum (or the supplied `u`) is final
    ///    unless a handler replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::MissingTimeStep`] when `dt` is `None` and no
    /// default was configured, or the error of a failing handler after the
    /// remaining modifiers have been notified.
    pub fn pid(&mut self, pv: f64, dt: Option<f64>) -> Result<f64, PidError> {
        let dt = self.base.resolve_dt(dt)?;
        self.base.pv = pv;

        let mut event = Event::BaseTerms(BaseTerms::new(dt));
        self.dispatch(&mut event)?;
        let Event::BaseTerms(base) = event else {
            unreachable!("dispatch preserves the event variant");
        };

        let e = base.e.unwrap_or(self.base.setpoint - pv);
        let i = match base.i {
            Some(i) => i,
            None => {
                self.base.integration += e * dt;
                self.base.integration
            }
        };
        let d = match base.d {
            Some(d) => d,
            None => {
                let d = -(pv - self.base.prev_pv) / dt;
                self.base.prev_pv = pv;
                d
            }
        };
        let p = base.p.unwrap_or(e);

        let mut event = Event::ModifyTerms(ModifyTerms::new(dt, e, p, i, d, base.u, base.extras));
        self.dispatch(&mut event)?;
        let Event::ModifyTerms(modify) = event else {
            unreachable!("dispatch preserves the event variant");
        };

        let u = modify
            .u
            .unwrap_or(self.base.kp * modify.p + self.base.ki * modify.i + self.base.kd * modify.d);

        let mut event =
            Event::CalculateU(CalculateU::new(dt, e, modify.p, modify.i, modify.d, u, modify.extras));
        self.dispatch(&mut event)?;
        let Event::CalculateU(calc) = event else {
            unreachable!("dispatch preserves the event variant");
        };

        self.base.last_pid = Some((modify.p, modify.i, modify.d));
        self.base.prev_e = e;
        Ok(calc.u)
    }
}
