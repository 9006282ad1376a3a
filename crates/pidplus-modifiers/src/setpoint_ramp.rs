//! [`SetpointRamp`] – walk setpoint changes in over time.
//!
//! A large setpoint step makes the proportional term jump and, with
//! derivative-on-error variants, kicks the derivative.  This modifier
//! intercepts the step and advances the effective setpoint linearly over a
//! configured number of seconds (measured purely in accumulated `dt`).
//!
//! Two presentations:
//!
//! - **Visible** ([`SetpointRamp::new`]): the stored setpoint itself walks
//!   to the target.  Each tick the ramp re-issues a controller-internal
//!   setpoint write, so history observers see every step and
//!   `pid.setpoint()` reads back the intermediate values.
//! - **Hidden** ([`SetpointRamp::hidden`]): the stored setpoint jumps to the
//!   target immediately; the ramp instead overrides the tick's error from
//!   the interpolated value, so only the control output reveals the ramp.
//!
//! The ramp keeps per-controller state and enforces single attachment.

use std::cell::RefCell;
use std::rc::Rc;

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{Attached, BaseTerms, InitialConditions, PidError, SetpointChange};
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Ramp state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ActiveRamp {
    start: f64,
    target: f64,
    progress: f64,
}

impl ActiveRamp {
    fn interpolated(&self, secs: f64) -> f64 {
        let fraction = if secs <= 0.0 {
            1.0
        } else {
            (self.progress / secs).min(1.0)
        };
        self.start + fraction * (self.target - self.start)
    }

    fn finished(&self, secs: f64) -> bool {
        secs <= 0.0 || self.progress >= secs
    }
}

#[derive(Debug)]
struct RampInner {
    secs: f64,
    threshold: f64,
    hidden: bool,
    active: Option<ActiveRamp>,
    guard: AttachmentGuard,
}

fn validate_secs(secs: f64) -> Result<f64, PidError> {
    if secs >= 0.0 {
        Ok(secs)
    } else {
        Err(PidError::invalid_parameter(
            "secs",
            format!("must be a non-negative number, got {secs}"),
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SetpointRamp
// ─────────────────────────────────────────────────────────────────────────────

/// Ramps setpoint changes over `secs` seconds of accumulated `dt`.
///
/// The value is a cheap handle over shared state: clone it before attaching
/// to keep a control surface ([`SetpointRamp::set_secs`],
/// [`SetpointRamp::is_ramping`]) on the caller's side.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::SetpointRamp;
///
/// let ramp = SetpointRamp::new(5.0).unwrap();
/// let mut pid = PidPlus::new(1.0, 0.0, 0.0, ramp.clone()).unwrap();
///
/// pid.set_setpoint(4.0).unwrap();
/// // One second in: the stored setpoint has advanced a fifth of the way.
/// pid.pid(0.0, Some(1.0)).unwrap();
/// assert!((pid.setpoint() - 0.8).abs() < 1e-9);
/// assert!(ramp.is_ramping());
/// ```
#[derive(Debug, Clone)]
pub struct SetpointRamp {
    inner: Rc<RefCell<RampInner>>,
}

impl SetpointRamp {
    /// Visible ramp: the stored setpoint walks to the target.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `secs`.
    pub fn new(secs: f64) -> Result<Self, PidError> {
        Self::build(secs, false)
    }

    /// Hidden ramp: the stored setpoint jumps immediately; the tick error is
    /// computed from the interpolated value instead.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `secs`.
    pub fn hidden(secs: f64) -> Result<Self, PidError> {
        Self::build(secs, true)
    }

    fn build(secs: f64, hidden: bool) -> Result<Self, PidError> {
        let secs = validate_secs(secs)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(RampInner {
                secs,
                threshold: 0.0,
                hidden,
                active: None,
                guard: AttachmentGuard::new(),
            })),
        })
    }

    /// Let changes of at most `threshold` through without ramping.
    pub fn with_threshold(self, threshold: f64) -> Self {
        self.inner.borrow_mut().threshold = threshold.abs();
        self
    }

    /// Current ramp duration in seconds.
    pub fn secs(&self) -> f64 {
        self.inner.borrow().secs
    }

    /// Change the ramp duration, mid-ramp included.
    ///
    /// An in-progress ramp restarts from its current interpolated value
    /// toward the unchanged target at the new rate; a duration of zero makes
    /// the next tick snap to the target.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `secs`.
    pub fn set_secs(&self, secs: f64) -> Result<(), PidError> {
        let secs = validate_secs(secs)?;
        let mut inner = self.inner.borrow_mut();
        let old_secs = inner.secs;
        if let Some(ramp) = inner.active.as_mut() {
            ramp.start = ramp.interpolated(old_secs);
            ramp.progress = 0.0;
        }
        inner.secs = secs;
        Ok(())
    }

    /// `true` while a ramp is in progress.
    pub fn is_ramping(&self) -> bool {
        self.inner.borrow().active.is_some()
    }

    /// Target of the ramp in progress, if any.
    pub fn target(&self) -> Option<f64> {
        self.inner.borrow().active.map(|ramp| ramp.target)
    }
}

impl Modifier for SetpointRamp {
    fn name(&self) -> &str {
        "setpoint_ramp"
    }

    fn on_attached(&mut self, _pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.inner
            .borrow_mut()
            .guard
            .claim(event.pid_id(), "setpoint_ramp")?;
        Ok(())
    }

    fn on_initial_conditions(
        &mut self,
        _pid: &mut PidPlus,
        _event: &mut InitialConditions,
    ) -> HookResult {
        // Re-seeding the controller abandons any ramp in progress.
        self.inner.borrow_mut().active = None;
        Ok(())
    }

    fn on_setpoint_change(&mut self, _pid: &mut PidPlus, event: &mut SetpointChange) -> HookResult {
        if event.is_internal() {
            return Ok(());
        }
        let mut inner = self.inner.borrow_mut();
        if (event.sp_to() - event.sp_from()).abs() <= inner.threshold || inner.secs <= 0.0 {
            // Small enough (or instant): pass the write through directly.
            inner.active = None;
            return Ok(());
        }
        inner.active = Some(ActiveRamp {
            start: event.sp_from(),
            target: event.sp_to(),
            progress: 0.0,
        });
        debug!(
            from = event.sp_from(),
            to = event.sp_to(),
            secs = inner.secs,
            "setpoint ramp engaged"
        );
        if !inner.hidden {
            // Hold the store at the old value; the per-tick steps advance it.
            event.sp = Some(event.sp_from());
        }
        Ok(())
    }

    fn on_base_terms(&mut self, pid: &mut PidPlus, event: &mut BaseTerms) -> HookResult {
        let (value, hidden) = {
            let mut inner = self.inner.borrow_mut();
            let secs = inner.secs;
            let hidden = inner.hidden;
            let step = match inner.active.as_mut() {
                None => None,
                Some(ramp) => {
                    ramp.progress += event.dt();
                    Some((ramp.interpolated(secs), ramp.finished(secs)))
                }
            };
            match step {
                None => return Ok(()),
                Some((value, finished)) => {
                    if finished {
                        inner.active = None;
                    }
                    (value, hidden)
                }
            }
        };

        if hidden {
            event.e = Some(value - pid.pv());
        } else {
            pid.ramp_setpoint(value)?;
        }
        Ok(())
    }
}
