//! [`IntegralSetpointReset`] – zero the integration sum on setpoint changes.
//!
//! Integration accumulated while chasing the old setpoint is momentum in a
//! possibly wrong direction once the target moves.  This modifier zeroes the
//! sum on every setpoint change and then holds accumulation off for a
//! configured number of seconds, so the loop re-settles before integral
//! action resumes.
//!
//! Note the interplay with ramping: a ramp re-issues internal setpoint
//! writes every tick, and each of those re-arms the pause.  Placing this
//! modifier before a ramp in the chain (or using a hidden ramp) avoids the
//! repeated resets when that is not what you want.

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{Attached, BaseTerms, PidError, SetpointChange};

/// Zeroes the integration sum on setpoint changes and pauses accumulation
/// for `delay` seconds afterwards.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::IntegralSetpointReset;
///
/// let reset = IntegralSetpointReset::new(2.0).unwrap();
/// let mut pid = PidPlus::new(0.0, 1.0, 0.0, reset).unwrap();
/// pid.set_setpoint(10.0).unwrap();
///
/// // Two paused ticks, then accumulation resumes.
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 10.0);
/// ```
#[derive(Debug)]
pub struct IntegralSetpointReset {
    delay: f64,
    pause_remaining: f64,
    guard: AttachmentGuard,
}

impl IntegralSetpointReset {
    /// Pause integral accumulation for `delay` seconds after each setpoint
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `delay`.
    pub fn new(delay: f64) -> Result<Self, PidError> {
        if delay >= 0.0 {
            Ok(Self {
                delay,
                pause_remaining: 0.0,
                guard: AttachmentGuard::new(),
            })
        } else {
            Err(PidError::invalid_parameter(
                "delay",
                format!("must be a non-negative number, got {delay}"),
            ))
        }
    }

    /// Configured pause length in seconds.
    pub fn delay(&self) -> f64 {
        self.delay
    }
}

impl Modifier for IntegralSetpointReset {
    fn name(&self) -> &str {
        "integral_setpoint_reset"
    }

    fn on_attached(&mut self, _pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.guard
            .claim(event.pid_id(), "integral_setpoint_reset")?;
        Ok(())
    }

    fn on_setpoint_change(&mut self, pid: &mut PidPlus, _event: &mut SetpointChange) -> HookResult {
        pid.set_integration(0.0);
        self.pause_remaining = self.delay;
        Ok(())
    }

    fn on_base_terms(&mut self, pid: &mut PidPlus, event: &mut BaseTerms) -> HookResult {
        if self.pause_remaining > 0.0 {
            // Reporting the stored sum suppresses this tick's accumulation.
            event.i = Some(pid.integration());
            self.pause_remaining = (self.pause_remaining - event.dt()).max(0.0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulation_pauses_for_the_configured_delay() {
        let mut pid =
            PidPlus::new(0.0, 1.0, 0.0, IntegralSetpointReset::new(2.0).unwrap()).unwrap();
        pid.set_setpoint(10.0).unwrap();

        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
        // Pause over: accumulation resumes.
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 10.0);
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 20.0);
    }

    #[test]
    fn setpoint_change_zeroes_accumulated_integration() {
        let mut pid =
            PidPlus::new(0.0, 1.0, 0.0, IntegralSetpointReset::new(0.0).unwrap()).unwrap();
        pid.set_setpoint(10.0).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        assert_eq!(pid.integration(), 20.0);

        pid.set_setpoint(1.0).unwrap();
        assert_eq!(pid.integration(), 0.0);
    }

    #[test]
    fn zero_delay_resets_without_pausing() {
        let mut pid =
            PidPlus::new(0.0, 1.0, 0.0, IntegralSetpointReset::new(0.0).unwrap()).unwrap();
        pid.set_setpoint(10.0).unwrap();
        // No pause: the first tick already accumulates.
        assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 10.0);
    }

    #[test]
    fn fractional_dt_counts_the_pause_down() {
        let mut pid =
            PidPlus::new(0.0, 1.0, 0.0, IntegralSetpointReset::new(1.0).unwrap()).unwrap();
        pid.set_setpoint(4.0).unwrap();

        // Two half-second ticks consume the pause.
        assert_eq!(pid.pid(0.0, Some(0.5)).unwrap(), 0.0);
        assert_eq!(pid.pid(0.0, Some(0.5)).unwrap(), 0.0);
        // 4 * 0.5 accumulated on the third tick.
        assert_eq!(pid.pid(0.0, Some(0.5)).unwrap(), 2.0);
    }

    #[test]
    fn negative_delay_is_rejected() {
        assert!(matches!(
            IntegralSetpointReset::new(-1.0),
            Err(PidError::InvalidParameter { .. })
        ));
    }
}
