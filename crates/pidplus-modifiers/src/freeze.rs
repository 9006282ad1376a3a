//! [`IntegralFreeze`] – explicitly pause integral accumulation.
//!
//! Sometimes the caller knows the loop is about to be disturbed (an actuator
//! is saturated, a mode switch is in progress) and wants integral action
//! held still for a while.  This modifier exposes a freeze switch on a
//! shared handle: clone the handle before attaching and flip it from
//! anywhere in the program.

use std::cell::RefCell;
use std::rc::Rc;

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{Attached, BaseTerms, PidError};
use tracing::debug;

#[derive(Debug)]
struct FreezeInner {
    frozen: bool,
    remaining: Option<f64>,
    guard: AttachmentGuard,
}

/// Pauses integral accumulation while frozen, indefinitely or for a
/// duration counted down in accumulated `dt`.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::IntegralFreeze;
///
/// let freeze = IntegralFreeze::new();
/// let mut pid = PidPlus::new(0.0, 1.0, 0.0, freeze.clone()).unwrap();
/// pid.set_setpoint(10.0).unwrap();
///
/// freeze.freeze();
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 0.0);
///
/// freeze.unfreeze();
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct IntegralFreeze {
    inner: Rc<RefCell<FreezeInner>>,
}

impl Default for IntegralFreeze {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegralFreeze {
    /// Create an unfrozen switch.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(FreezeInner {
                frozen: false,
                remaining: None,
                guard: AttachmentGuard::new(),
            })),
        }
    }

    /// Freeze until [`IntegralFreeze::unfreeze`] is called.
    pub fn freeze(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.frozen = true;
        inner.remaining = None;
        debug!("integral accumulation frozen");
    }

    /// Freeze for `secs` seconds of accumulated `dt`, then thaw on its own.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `secs`.
    pub fn freeze_for(&self, secs: f64) -> Result<(), PidError> {
        if !(secs >= 0.0) {
            return Err(PidError::invalid_parameter(
                "secs",
                format!("must be a non-negative number, got {secs}"),
            ));
        }
        let mut inner = self.inner.borrow_mut();
        inner.frozen = true;
        inner.remaining = Some(secs);
        Ok(())
    }

    /// Resume accumulation immediately.
    pub fn unfreeze(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.frozen = false;
        inner.remaining = None;
    }

    /// `true` while accumulation is held still.
    pub fn is_frozen(&self) -> bool {
        let inner = self.inner.borrow();
        inner.frozen && inner.remaining.is_none_or(|rem| rem > 0.0)
    }
}

impl Modifier for IntegralFreeze {
    fn name(&self) -> &str {
        "integral_freeze"
    }

    fn on_attached(&mut self, _pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.inner
            .borrow_mut()
            .guard
            .claim(event.pid_id(), "integral_freeze")?;
        Ok(())
    }

    fn on_base_terms(&mut self, pid: &mut PidPlus, event: &mut BaseTerms) -> HookResult {
        let mut inner = self.inner.borrow_mut();
        if !inner.frozen {
            return Ok(());
        }
        if let Some(remaining) = inner.remaining {
            if remaining <= 0.0 {
                inner.frozen = false;
                inner.remaining = None;
                return Ok(());
            }
            inner.remaining = Some(remaining - event.dt());
        }
        // Reporting the stored sum suppresses this tick's accumulation.
        event.i = Some(pid.integration());
        Ok(())
    }
}
