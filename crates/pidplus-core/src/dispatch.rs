//! Event dispatch: ordered propagation, short-circuit, failure fan-out.
//!
//! Modifiers are notified in chain order.  A hook that returns
//! [`HookSignal::Stop`] ends the in-flight event's propagation; the
//! remaining modifiers are notified with a
//! [`HookStopped`][pidplus_types::HookStopped] replacement instead.  A hook
//! that returns [`HookSignal::Fail`] produces a
//! [`Failure`][pidplus_types::Failure] replacement the same way, and the
//! error is returned to the caller once the fan-out has finished.  Each
//! replacement wraps a copy of the event that was in flight, so repeated
//! stops build a reconstructible chain – and since every replacement starts
//! at the next index, the walk always terminates.
//!
//! While a hook runs, its slot in the chain holds an inert stand-in.  The
//! hook therefore has the controller to itself and may emit further events
//! (a ramp re-issuing a setpoint write); the nested emission runs the full
//! chain – minus the emitter – to completion before the outer walk resumes.
//! The nesting counter only grows for such handler-emitted events:
//! replacements are delivered at the depth of the event they replace.

use std::mem;

use pidplus_types::{Attached, Event, Failure, HookStopped, PidError};
use tracing::{debug, trace};

use crate::modifier::{HookResult, HookSignal, Modifier};
use crate::plus::PidPlus;

/// How the original event is handed to the chain.
enum Delivery {
    /// Every modifier from the start index on receives the event.
    Broadcast,
    /// Only the modifier at the start index receives the event; later ones
    /// are reached by replacements alone.  Used for attachment announcements.
    Single,
}

/// Inert stand-in occupying a modifier's slot while its hook runs.
struct Detached;

impl Modifier for Detached {
    fn name(&self) -> &str {
        "detached"
    }
}

impl PidPlus {
    /// Run `event` through the whole chain.
    pub(crate) fn dispatch(&mut self, event: &mut Event) -> Result<(), PidError> {
        self.depth += 1;
        trace!(kind = event.name(), depth = self.depth, "dispatching event");
        let result = self.run_chain(event, 0, Delivery::Broadcast);
        self.depth -= 1;
        result
    }

    /// Emit one `Attached` per modifier, each delivered only to its own
    /// modifier; stop/failure replacements fan out over the rest of the
    /// construction pass.
    pub(crate) fn announce_attachments(&mut self) -> Result<(), PidError> {
        for idx in 0..self.modifiers.len() {
            let mut event = Event::Attached(Attached::new(self.id));
            self.depth += 1;
            let result = self.run_chain(&mut event, idx, Delivery::Single);
            self.depth -= 1;
            result?;
        }
        Ok(())
    }

    fn run_chain(
        &mut self,
        event: &mut Event,
        first: usize,
        delivery: Delivery,
    ) -> Result<(), PidError> {
        let count = self.modifiers.len();
        let mut replacement: Option<Event> = None;
        let mut failure: Option<PidError> = None;

        for idx in first..count {
            if matches!(delivery, Delivery::Single) && idx > first && replacement.is_none() {
                break;
            }

            let outcome = {
                let target = match replacement.as_mut() {
                    Some(replaced) => replaced,
                    None => &mut *event,
                };
                self.notify(idx, target)
            };

            match outcome {
                Ok(()) => {}
                Err(HookSignal::Stop) => {
                    let in_flight = replacement.clone().unwrap_or_else(|| event.clone());
                    let stopper = self.modifiers[idx].name().to_string();
                    trace!(stopper = %stopper, nth = idx, "event propagation stopped");
                    replacement = Some(Event::HookStopped(HookStopped::new(
                        in_flight,
                        stopper,
                        idx,
                        self.modifier_names(),
                    )));
                }
                Err(HookSignal::Fail(err)) => {
                    if failure.is_some() {
                        // Fan-out is best effort: a failure while reporting a
                        // failure halts further notification.  The original
                        // error still surfaces below.
                        debug!(
                            modifier = self.modifiers[idx].name(),
                            nth = idx,
                            "failure during failure fan-out; notification halted"
                        );
                        break;
                    }
                    let in_flight = replacement.clone().unwrap_or_else(|| event.clone());
                    let stopper = self.modifiers[idx].name().to_string();
                    debug!(modifier = %stopper, nth = idx, error = %err, "modifier failure");
                    replacement = Some(Event::Failure(Failure::new(
                        in_flight,
                        err.clone(),
                        stopper,
                        idx,
                        self.modifier_names(),
                    )));
                    failure = Some(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Hand `event` to the modifier at `idx`, with that slot detached for
    /// the duration of the call.
    fn notify(&mut self, idx: usize, event: &mut Event) -> HookResult {
        let mut active = mem::replace(&mut self.modifiers[idx], Box::new(Detached));
        let result = match event {
            Event::Attached(ev) => active.on_attached(self, ev),
            Event::InitialConditions(ev) => active.on_initial_conditions(self, ev),
            Event::SetpointChange(ev) => active.on_setpoint_change(self, ev),
            Event::BaseTerms(ev) => active.on_base_terms(self, ev),
            Event::ModifyTerms(ev) => active.on_modify_terms(self, ev),
            Event::CalculateU(ev) => active.on_calculate_u(self, ev),
            Event::HookStopped(ev) => active.on_hook_stopped(self, ev),
            Event::Failure(ev) => active.on_failure(self, ev),
        };
        self.modifiers[idx] = active;
        result
    }
}
