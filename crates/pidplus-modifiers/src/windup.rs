//! [`IntegralWindup`] – clamp the integration term.
//!
//! A sustained error makes the integration sum grow without bound, and the
//! accumulated "momentum" then drives a long overshoot once the error
//! finally closes.  This modifier clamps both the reported integration term
//! and the controller's stored sum, so the accumulation cannot drift outside
//! the clamp between ticks.
//!
//! Stateless: one value can be shared across controllers.

use pidplus_core::{HookResult, Modifier, PidPlus};
use pidplus_types::ModifyTerms;

/// Clamps the integration term (and the stored sum) into a closed range.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::IntegralWindup;
///
/// let mut pid = PidPlus::new(0.0, 1.0, 0.0, IntegralWindup::symmetric(2.0)).unwrap();
/// pid.set_setpoint(10.0).unwrap();
///
/// // A huge error accumulates fast, but the term never leaves the clamp.
/// for _ in 0..3 {
///     let u = pid.pid(0.0, Some(1.0)).unwrap();
///     assert_eq!(u, 2.0);
/// }
/// assert_eq!(pid.integration(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralWindup {
    lo: f64,
    hi: f64,
}

impl IntegralWindup {
    /// Symmetric clamp `[-|limit|, |limit|]`.
    pub fn symmetric(limit: f64) -> Self {
        let magnitude = limit.abs();
        Self {
            lo: -magnitude,
            hi: magnitude,
        }
    }

    /// Clamp into `[a, b]`; the bounds are sorted for you.
    pub fn range(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// The clamp as `(lo, hi)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

impl Modifier for IntegralWindup {
    fn name(&self) -> &str {
        "integral_windup"
    }

    fn on_modify_terms(&mut self, pid: &mut PidPlus, event: &mut ModifyTerms) -> HookResult {
        event.i = event.i.clamp(self.lo, self.hi);
        // Keep the stored sum inside the clamp too, otherwise the hidden
        // accumulation diverges from the reported term across ticks.
        pid.set_integration(pid.integration().clamp(self.lo, self.hi));
        Ok(())
    }
}
