//! [`DerivativeOnError`] – derivative on error instead of measurement.
//!
//! The stock derivative is taken on the measurement, which ignores setpoint
//! motion entirely.  Some loops want the textbook derivative of the *error*
//! instead – at the cost of a one-tick spike (the "derivative kick") every
//! time the setpoint steps.  The optional kick filter watches setpoint
//! changes and swallows exactly that one tick, reporting a zero derivative
//! and resuming normally on the next.
//!
//! Supplying the derivative also suppresses the stock calculation's
//! previous-pv bookkeeping; this modifier keeps its own frame of reference
//! through the controller's previous-error memory.

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{Attached, BaseTerms, SetpointChange};

/// Replaces the derivative term with `(e − prev_e) / dt`.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::DerivativeOnError;
///
/// let mut pid = PidPlus::new(0.0, 0.0, 1.0, DerivativeOnError::new()).unwrap();
///
/// pid.pid(1.0, Some(1.0)).unwrap();
/// let u = pid.pid(2.0, Some(1.0)).unwrap();
/// // With a constant setpoint this matches derivative-on-measurement.
/// assert!((u - (-1.0)).abs() < 1e-12);
/// ```
#[derive(Debug, Default)]
pub struct DerivativeOnError {
    kick_filter: bool,
    kick_pending: bool,
    guard: AttachmentGuard,
}

impl DerivativeOnError {
    /// Plain derivative on error; setpoint steps will kick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derivative on error with the one-tick kick filter enabled.
    pub fn with_kick_filter() -> Self {
        Self {
            kick_filter: true,
            ..Self::default()
        }
    }

    /// `true` when the kick filter is enabled.
    pub fn kick_filter(&self) -> bool {
        self.kick_filter
    }
}

impl Modifier for DerivativeOnError {
    fn name(&self) -> &str {
        "derivative_on_error"
    }

    fn on_attached(&mut self, _pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.guard.claim(event.pid_id(), "derivative_on_error")?;
        Ok(())
    }

    fn on_setpoint_change(
        &mut self,
        _pid: &mut PidPlus,
        _event: &mut SetpointChange,
    ) -> HookResult {
        self.kick_pending = true;
        Ok(())
    }

    fn on_base_terms(&mut self, pid: &mut PidPlus, event: &mut BaseTerms) -> HookResult {
        let e_now = event.e.unwrap_or(pid.setpoint() - pid.pv());
        if self.kick_filter && self.kick_pending {
            // Swallow the step-induced spike for exactly this tick.
            event.d = Some(0.0);
        } else {
            event.d = Some((e_now - pid.prev_e()) / event.dt());
        }
        self.kick_pending = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn matches_measurement_derivative_while_setpoint_is_constant() {
        let mut on_error = PidPlus::new(0.0, 0.0, 1.0, DerivativeOnError::new()).unwrap();
        let mut stock = PidPlus::new(0.0, 0.0, 1.0, ()).unwrap();

        for &pv in &[0.0, 1.0, 3.0, 2.0, 2.0] {
            let a = on_error.pid(pv, Some(0.5)).unwrap();
            let b = stock.pid(pv, Some(0.5)).unwrap();
            assert!((a - b).abs() < EPS, "diverged at pv={pv}: {a} vs {b}");
        }
    }

    #[test]
    fn setpoint_step_kicks_without_the_filter() {
        let mut pid = PidPlus::new(0.0, 0.0, 1.0, DerivativeOnError::new()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();

        pid.set_setpoint(5.0).unwrap();
        // e jumps 0 → 5 in one tick: the derivative spikes.
        let u = pid.pid(0.0, Some(1.0)).unwrap();
        assert!((u - 5.0).abs() < EPS);
    }

    #[test]
    fn kick_filter_swallows_exactly_one_tick() {
        let mut pid = PidPlus::new(0.0, 0.0, 1.0, DerivativeOnError::with_kick_filter()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();

        pid.set_setpoint(5.0).unwrap();
        // The spike tick reports a zero derivative...
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
        // ...and the next tick is back to normal (e unchanged → d = 0).
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
        // A moving pv shows the derivative is live again.
        let u = pid.pid(1.0, Some(1.0)).unwrap();
        assert!((u - (-1.0)).abs() < EPS);
    }

    #[test]
    fn measurement_motion_still_differentiates_with_the_filter() {
        let mut pid = PidPlus::new(0.0, 0.0, 1.0, DerivativeOnError::with_kick_filter()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        let u = pid.pid(2.0, Some(1.0)).unwrap();
        // No setpoint change involved: d = (e - prev_e) / dt = (-2 - 0) / 1.
        assert!((u - (-2.0)).abs() < EPS);
    }

    #[test]
    fn second_attachment_is_rejected() {
        // The modifier is stateful, so sharing is rejected; a fresh value
        // per controller is the supported pattern.
        let mut first = DerivativeOnError::new();
        let mut pid_a = PidPlus::new(0.0, 0.0, 1.0, ()).unwrap();
        let mut pid_b = PidPlus::new(0.0, 0.0, 1.0, ()).unwrap();
        let mut event = pidplus_types::Attached::new(pid_a.id());
        assert!(first.on_attached(&mut pid_a, &mut event).is_ok());
        let mut event = pidplus_types::Attached::new(pid_b.id());
        assert!(first.on_attached(&mut pid_b, &mut event).is_err());
    }
}
