//! [`Pid`] – the plain, fast controller.
//!
//! Computes the classic three-term control value with derivative on
//! measurement.  All time is the caller's: every tick is advanced by the
//! `dt` supplied to (or preconfigured for) [`Pid::pid`]; the controller
//! never consults a clock.
//!
//! # Example
//!
//! ```rust
//! use pidplus_core::Pid;
//!
//! let mut pid = Pid::new(1.0, 0.0, 0.0);
//! pid.set_setpoint(4.0);
//!
//! // Pure proportional control: u = Kp * (setpoint - pv).
//! let u = pid.pid(1.0, Some(0.1)).unwrap();
//! assert!((u - 3.0).abs() < 1e-12);
//! ```

use pidplus_types::PidError;

/// Proportional–integral–derivative controller.
///
/// Gains may be zero or negative; no clamping or sanity checking is applied
/// to the inputs or to the computed output.  For the observable, extensible
/// variant see [`PidPlus`][crate::PidPlus].
#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    pub(crate) kp: f64,
    pub(crate) ki: f64,
    pub(crate) kd: f64,
    pub(crate) setpoint: f64,
    pub(crate) pv: f64,
    pub(crate) integration: f64,
    pub(crate) prev_pv: f64,
    pub(crate) prev_e: f64,
    pub(crate) last_pid: Option<(f64, f64, f64)>,
    pub(crate) dt_default: Option<f64>,
}

impl Pid {
    /// Create a controller with the given gains and no default `dt`.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            pv: 0.0,
            integration: 0.0,
            prev_pv: 0.0,
            prev_e: 0.0,
            last_pid: None,
            dt_default: None,
        }
    }

    /// Create a controller with a preconfigured tick length, so callers may
    /// pass `None` for `dt`.
    pub fn with_dt(kp: f64, ki: f64, kd: f64, dt: f64) -> Self {
        let mut pid = Self::new(kp, ki, kd);
        pid.dt_default = Some(dt);
        pid
    }

    /// Proportional gain.
    pub fn kp(&self) -> f64 {
        self.kp
    }

    /// Integral gain.
    pub fn ki(&self) -> f64 {
        self.ki
    }

    /// Derivative gain.
    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Replace all three gains at once.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Current setpoint.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Change the setpoint.  Takes effect on the next tick.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// Last observed process variable.
    pub fn pv(&self) -> f64 {
        self.pv
    }

    /// Running integration sum.
    pub fn integration(&self) -> f64 {
        self.integration
    }

    /// Overwrite the integration sum (used by windup and reset modifiers).
    pub fn set_integration(&mut self, integration: f64) {
        self.integration = integration;
    }

    /// Error of the previous tick.
    pub fn prev_e(&self) -> f64 {
        self.prev_e
    }

    /// Preconfigured tick length, if any.
    pub fn dt_default(&self) -> Option<f64> {
        self.dt_default
    }

    /// Set or clear the preconfigured tick length.
    pub fn set_dt_default(&mut self, dt: Option<f64>) {
        self.dt_default = dt;
    }

    /// Unweighted `(p, i, d)` terms of the most recent tick.
    ///
    /// `None` before the first tick and after [`Pid::initial_conditions`].
    pub fn last_pid(&self) -> Option<(f64, f64, f64)> {
        self.last_pid
    }

    /// Re-seed the controller.
    ///
    /// Arguments left as `None` keep their current value.  Assigning `pv`
    /// also resets the derivative memory so the next tick's derivative term
    /// is zero.  The integration sum, the previous-error memory, and
    /// [`Pid::last_pid`] are reset on every call.
    pub fn initial_conditions(&mut self, pv: Option<f64>, setpoint: Option<f64>) {
        if let Some(sp) = setpoint {
            self.setpoint = sp;
        }
        if let Some(pv) = pv {
            self.pv = pv;
            self.prev_pv = pv;
        }
        self.integration = 0.0;
        self.prev_e = self.setpoint - self.pv;
        self.last_pid = None;
    }

    /// Advance one tick and return the control value.
    ///
    /// The derivative is taken on the measurement, so a rising process
    /// variable lowers the output regardless of setpoint motion.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::MissingTimeStep`] when `dt` is `None` and no
    /// default was configured.
    pub fn pid(&mut self, pv: f64, dt: Option<f64>) -> Result<f64, PidError> {
        let dt = self.resolve_dt(dt)?;
        self.pv = pv;

        let e = self.setpoint - pv;
        self.integration += e * dt;
        let d = -(pv - self.prev_pv) / dt;
        let p = e;
        let u = self.kp * p + self.ki * self.integration + self.kd * d;

        self.last_pid = Some((p, self.integration, d));
        self.prev_pv = pv;
        self.prev_e = e;
        Ok(u)
    }

    pub(crate) fn resolve_dt(&self, dt: Option<f64>) -> Result<f64, PidError> {
        dt.or(self.dt_default).ok_or(PidError::MissingTimeStep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn zero_gains_give_zero_output() {
        let mut pid = Pid::new(0.0, 0.0, 0.0);
        pid.set_setpoint(10.0);
        let u = pid.pid(3.0, Some(0.1)).unwrap();
        assert_eq!(u, 0.0);
        // The terms are still computed and recorded.
        let (p, i, d) = pid.last_pid().unwrap();
        assert!((p - 7.0).abs() < EPS);
        assert!((i - 0.7).abs() < EPS);
        assert!((d - (-30.0)).abs() < EPS);
    }

    #[test]
    fn proportional_term_tracks_error() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        pid.set_setpoint(10.0);
        let u = pid.pid(4.0, Some(1.0)).unwrap();
        assert!((u - 12.0).abs() < EPS);
    }

    #[test]
    fn holding_at_setpoint_freezes_integration() {
        let mut pid = Pid::new(1.0, 1.0, 1.0);
        pid.set_setpoint(5.0);
        // Build up some integration first.
        pid.pid(4.0, Some(1.0)).unwrap();
        let accumulated = pid.integration();

        // At the setpoint: e = 0, d = -(5-4)/1 on the first hold tick, then 0.
        pid.pid(5.0, Some(1.0)).unwrap();
        pid.pid(5.0, Some(1.0)).unwrap();
        assert!((pid.integration() - accumulated).abs() < EPS);

        let u = pid.pid(5.0, Some(1.0)).unwrap();
        let (p, i, d) = pid.last_pid().unwrap();
        assert_eq!(p, 0.0);
        assert_eq!(d, 0.0);
        assert!((u - pid.ki() * i).abs() < EPS);
    }

    #[test]
    fn derivative_is_taken_on_measurement() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        pid.pid(1.0, Some(0.5)).unwrap();
        pid.pid(2.0, Some(0.5)).unwrap();
        let (_, _, d) = pid.last_pid().unwrap();
        // d = -(2.0 - 1.0) / 0.5
        assert!((d - (-2.0)).abs() < EPS);
    }

    #[test]
    fn rising_pv_lowers_output() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        pid.pid(0.0, Some(1.0)).unwrap();
        let u = pid.pid(3.0, Some(1.0)).unwrap();
        assert!(u < 0.0);
    }

    #[test]
    fn initial_conditions_zero_the_next_derivative() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        pid.pid(0.0, Some(1.0)).unwrap();
        pid.pid(10.0, Some(1.0)).unwrap();

        pid.initial_conditions(Some(3.0), None);
        let u = pid.pid(3.0, Some(1.0)).unwrap();
        assert_eq!(u, 0.0);
        let (_, _, d) = pid.last_pid().unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn initial_conditions_reset_integration_and_last_pid() {
        let mut pid = Pid::new(1.0, 1.0, 0.0);
        pid.set_setpoint(2.0);
        pid.pid(0.0, Some(1.0)).unwrap();
        assert!(pid.integration() > 0.0);
        assert!(pid.last_pid().is_some());

        pid.initial_conditions(None, None);
        assert_eq!(pid.integration(), 0.0);
        assert!(pid.last_pid().is_none());
    }

    #[test]
    fn initial_conditions_assign_setpoint_without_ramping() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        pid.initial_conditions(Some(0.75), Some(0.5));
        assert_eq!(pid.setpoint(), 0.5);
        assert_eq!(pid.pv(), 0.75);
        let u = pid.pid(0.75, Some(1.0)).unwrap();
        assert!((u - (-0.25)).abs() < EPS);
    }

    #[test]
    fn missing_dt_without_default_is_an_error() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        assert_eq!(pid.pid(0.0, None), Err(PidError::MissingTimeStep));
    }

    #[test]
    fn configured_default_dt_is_used_when_omitted() {
        let mut pid = Pid::with_dt(0.0, 1.0, 0.0, 0.5);
        pid.set_setpoint(2.0);
        pid.pid(0.0, None).unwrap();
        // integration = e * dt = 2.0 * 0.5
        assert!((pid.integration() - 1.0).abs() < EPS);
    }

    #[test]
    fn explicit_dt_overrides_the_default() {
        let mut pid = Pid::with_dt(0.0, 1.0, 0.0, 0.5);
        pid.set_setpoint(2.0);
        pid.pid(0.0, Some(2.0)).unwrap();
        assert!((pid.integration() - 4.0).abs() < EPS);
    }

    #[test]
    fn integration_accumulates_across_ticks() {
        let mut pid = Pid::new(0.0, 1.0, 0.0);
        pid.set_setpoint(10.0);
        let u1 = pid.pid(0.0, Some(1.0)).unwrap();
        let u2 = pid.pid(0.0, Some(1.0)).unwrap();
        assert!((u1 - 10.0).abs() < EPS);
        assert!((u2 - 20.0).abs() < EPS);
    }

    #[test]
    fn negative_gains_are_accepted() {
        let mut pid = Pid::new(-1.0, 0.0, 0.0);
        pid.set_setpoint(1.0);
        let u = pid.pid(0.0, Some(1.0)).unwrap();
        assert!((u - (-1.0)).abs() < EPS);
    }

    #[test]
    fn set_gains_changes_future_ticks() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        pid.set_setpoint(3.0);
        pid.set_gains(2.0, 0.0, 0.0);
        let u = pid.pid(0.0, Some(1.0)).unwrap();
        assert!((u - 6.0).abs() < EPS);
    }
}
