//! [`Modifier`] – the hook interface of the observable control loop.
//!
//! A modifier subscribes to the controller lifecycle by overriding one hook
//! per event kind it cares about, or [`Modifier::on_default`] to catch
//! everything it did not handle specifically.  Every unoverridden dedicated
//! hook forwards to `on_default`, which does nothing, so implementors only
//! write the hooks they need.
//!
//! A hook may:
//!
//! - mutate the writable fields of its event,
//! - attach extra attributes to the per-tick events,
//! - read and write the exposed controller state through the `pid`
//!   parameter ([`integration`][crate::PidPlus::integration], setpoint, …),
//! - return `Err(HookSignal::Stop)` to halt propagation of the event, or
//! - return `Err(HookSignal::Fail(_))` to abort the surrounding call.
//!
//! Handlers run to completion on the caller's thread; nothing here is
//! `Send`/`Sync` because a controller and its chain belong to one thread.

use pidplus_types::{
    AnyEvent, Attached, BaseTerms, CalculateU, Failure, HookStopped, InitialConditions,
    ModifyTerms, PidError, SetpointChange,
};
use uuid::Uuid;

use crate::plus::PidPlus;

// ─────────────────────────────────────────────────────────────────────────────
// Hook signalling
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one hook invocation.
pub type HookResult = Result<(), HookSignal>;

/// Out-of-band outcome a hook can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum HookSignal {
    /// Cooperative halt: the event stops propagating and the remaining
    /// modifiers are notified with a
    /// [`HookStopped`][pidplus_types::HookStopped] replacement.  Not an
    /// error – the surrounding call continues normally.
    Stop,

    /// Handler failure: wrapped in a [`Failure`][pidplus_types::Failure]
    /// replacement for the remaining modifiers, then returned to the caller
    /// of the surrounding operation.
    Fail(PidError),
}

impl From<PidError> for HookSignal {
    fn from(err: PidError) -> Self {
        HookSignal::Fail(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modifier
// ─────────────────────────────────────────────────────────────────────────────

/// A participant in the controller's modifier chain.
///
/// Implementations override the hooks for the events they react to.  The
/// `pid` parameter is the controller that emitted the event; the modifier's
/// own slot in the chain is inert while its hook runs, so hooks may freely
/// call back into the controller (e.g. re-issue a setpoint write).
pub trait Modifier {
    /// Stable name used in stop/failure reporting and diagnostics,
    /// e.g. `"setpoint_ramp"`.
    fn name(&self) -> &str;

    /// The controller is being built and this modifier has just been added.
    fn on_attached(&mut self, pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.on_default(pid, event)
    }

    /// `initial_conditions` has mutated the controller.
    fn on_initial_conditions(
        &mut self,
        pid: &mut PidPlus,
        event: &mut InitialConditions,
    ) -> HookResult {
        self.on_default(pid, event)
    }

    /// A setpoint write is about to be stored.
    fn on_setpoint_change(&mut self, pid: &mut PidPlus, event: &mut SetpointChange) -> HookResult {
        self.on_default(pid, event)
    }

    /// A tick has started; terms are still unset.
    fn on_base_terms(&mut self, pid: &mut PidPlus, event: &mut BaseTerms) -> HookResult {
        self.on_default(pid, event)
    }

    /// Terms are resolved; the output is still open.
    fn on_modify_terms(&mut self, pid: &mut PidPlus, event: &mut ModifyTerms) -> HookResult {
        self.on_default(pid, event)
    }

    /// The output is decided; last chance to replace it.
    fn on_calculate_u(&mut self, pid: &mut PidPlus, event: &mut CalculateU) -> HookResult {
        self.on_default(pid, event)
    }

    /// An earlier modifier halted the in-flight event.
    fn on_hook_stopped(&mut self, pid: &mut PidPlus, event: &mut HookStopped) -> HookResult {
        self.on_default(pid, event)
    }

    /// An earlier modifier failed on the in-flight event.
    fn on_failure(&mut self, pid: &mut PidPlus, event: &mut Failure) -> HookResult {
        self.on_default(pid, event)
    }

    /// Catch-all for events without a dedicated override.  Does nothing.
    fn on_default(&mut self, pid: &mut PidPlus, event: &mut dyn AnyEvent) -> HookResult {
        let _ = (pid, event);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IntoModifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Anything accepted as the modifier argument of
/// [`PidPlus::new`][crate::PidPlus::new]: nothing, a single modifier, a
/// boxed modifier, or an ordered list.
pub trait IntoModifiers {
    /// Normalize to the ordered chain the controller stores.
    fn into_modifiers(self) -> Vec<Box<dyn Modifier>>;
}

impl IntoModifiers for Vec<Box<dyn Modifier>> {
    fn into_modifiers(self) -> Vec<Box<dyn Modifier>> {
        self
    }
}

impl IntoModifiers for Box<dyn Modifier> {
    fn into_modifiers(self) -> Vec<Box<dyn Modifier>> {
        vec![self]
    }
}

impl IntoModifiers for () {
    fn into_modifiers(self) -> Vec<Box<dyn Modifier>> {
        Vec::new()
    }
}

impl<M: Modifier + 'static> IntoModifiers for M {
    fn into_modifiers(self) -> Vec<Box<dyn Modifier>> {
        vec![Box::new(self)]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AttachmentGuard
// ─────────────────────────────────────────────────────────────────────────────

/// Records the first controller a modifier is attached to and rejects any
/// later attachment to a different one.
///
/// Modifiers that keep per-controller state embed one of these and call
/// [`AttachmentGuard::claim`] from their `on_attached` hook; shared
/// (stateless) modifiers simply skip the guard.
///
/// # Example
///
/// ```
/// use pidplus_core::AttachmentGuard;
/// use uuid::Uuid;
///
/// let mut guard = AttachmentGuard::new();
/// let first = Uuid::new_v4();
///
/// assert!(guard.claim(first, "dead_band").is_ok());
/// // Re-claiming for the same controller is fine.
/// assert!(guard.claim(first, "dead_band").is_ok());
/// // A different controller is rejected.
/// assert!(guard.claim(Uuid::new_v4(), "dead_band").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentGuard {
    owner: Option<Uuid>,
}

impl AttachmentGuard {
    /// Create an unclaimed guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim ownership for the controller identified by `pid_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::AlreadyAttached`] when a different controller
    /// claimed the guard earlier.
    pub fn claim(&mut self, pid_id: Uuid, modifier: &str) -> Result<(), PidError> {
        match self.owner {
            None => {
                self.owner = Some(pid_id);
                Ok(())
            }
            Some(owner) if owner == pid_id => Ok(()),
            Some(owner) => Err(PidError::AlreadyAttached {
                modifier: modifier.to_string(),
                owner,
            }),
        }
    }

    /// The owning controller, once claimed.
    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }
}
