//! Event types for the observable control loop.
//!
//! Every lifecycle point of the extended controller is announced to the
//! modifier chain as one of the typed events below.  Fields a handler may
//! mutate are public; fields the controller owns are private behind getters,
//! so the read-only contract is enforced by the compiler rather than at
//! run time.
//!
//! The three per-tick events ([`BaseTerms`], [`ModifyTerms`], [`CalculateU`])
//! share an open [`Extras`] bag: the controller moves the bag forward from
//! stage to stage, so custom attributes attached early in a tick are visible
//! to every later stage of the same tick.
//!
//! [`HookStopped`] and [`Failure`] are *replacement* events: when a handler
//! halts or fails mid-chain, the remaining modifiers are notified with a
//! replacement that wraps a copy of the event that was in flight.  The
//! wrapped copy may itself be a replacement, so the full stop chain stays
//! reconstructible.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PidError;
use crate::extras::Extras;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminant of an [`Event`], usable as a map key (e.g. per-kind counters).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EventKind {
    /// Emitted once per modifier while the controller is being built.
    Attached,
    /// Emitted after `initial_conditions` has mutated the controller.
    InitialConditions,
    /// Emitted before a setpoint write is stored.
    SetpointChange,
    /// First stage of a control tick: all terms still unset.
    BaseTerms,
    /// Second stage: terms filled in, output still open.
    ModifyTerms,
    /// Final stage: output computed, last chance to replace it.
    CalculateU,
    /// Replacement delivered after a handler halted propagation.
    HookStopped,
    /// Replacement delivered after a handler failed.
    Failure,
}

impl EventKind {
    /// The event's type name as used in textual renderings.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Attached => "Attached",
            EventKind::InitialConditions => "InitialConditions",
            EventKind::SetpointChange => "SetpointChange",
            EventKind::BaseTerms => "BaseTerms",
            EventKind::ModifyTerms => "ModifyTerms",
            EventKind::CalculateU => "CalculateU",
            EventKind::HookStopped => "HookStopped",
            EventKind::Failure => "Failure",
        }
    }

    /// Name of the modifier hook that receives this kind of event.
    ///
    /// The hook interface lives in the core crate; the names are fixed here
    /// so observers can label counters without depending on it.
    pub fn handler_name(self) -> &'static str {
        match self {
            EventKind::Attached => "on_attached",
            EventKind::InitialConditions => "on_initial_conditions",
            EventKind::SetpointChange => "on_setpoint_change",
            EventKind::BaseTerms => "on_base_terms",
            EventKind::ModifyTerms => "on_modify_terms",
            EventKind::CalculateU => "on_calculate_u",
            EventKind::HookStopped => "on_hook_stopped",
            EventKind::Failure => "on_failure",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AnyEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased view of an event, handed to catch-all handlers.
///
/// A catch-all handler can identify the event, render it, read or write the
/// extras bag when the event carries one, and take an owned [`Event`] copy
/// for recording.  Mutating the typed fields requires the matching dedicated
/// hook – that restriction is what makes the read-only contract hold for
/// observers.
pub trait AnyEvent: fmt::Debug + fmt::Display {
    /// Which event this is.
    fn kind(&self) -> EventKind;

    /// The extras bag, for the per-tick events that carry one.
    fn extras(&self) -> Option<&Extras> {
        None
    }

    /// Mutable extras bag access.
    fn extras_mut(&mut self) -> Option<&mut Extras> {
        None
    }

    /// An owned deep copy, for recorders.
    fn snapshot(&self) -> Event;
}

// ─────────────────────────────────────────────────────────────────────────────
// Display helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Renders an optional term the way the event repr spells absent values.
struct Maybe(Option<f64>);

impl fmt::Display for Maybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("None"),
        }
    }
}

fn write_extras(f: &mut fmt::Formatter<'_>, extras: &Extras) -> fmt::Result {
    for (key, value) in extras.iter() {
        write!(f, ", {key}={value}")?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Attached
// ─────────────────────────────────────────────────────────────────────────────

/// Sent to each modifier, individually, while the controller is being built.
///
/// The controller is not fully initialized at this point: initial conditions
/// have not been applied yet, so handlers should only claim ownership and set
/// up internal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attached {
    pid_id: Uuid,
}

impl Attached {
    /// Build the event for the controller identified by `pid_id`.
    pub fn new(pid_id: Uuid) -> Self {
        Self { pid_id }
    }

    /// Identity of the attaching controller.
    pub fn pid_id(&self) -> Uuid {
        self.pid_id
    }
}

impl fmt::Display for Attached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Attached()")
    }
}

impl AnyEvent for Attached {
    fn kind(&self) -> EventKind {
        EventKind::Attached
    }

    fn snapshot(&self) -> Event {
        Event::Attached(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InitialConditions
// ─────────────────────────────────────────────────────────────────────────────

/// Announces that `initial_conditions` has just mutated the controller.
///
/// Both fields mirror the arguments of the call; an argument the caller left
/// out is `None` here too.  The event fires *after* the state change, so
/// handlers observe the new values on the controller itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    setpoint: Option<f64>,
    pv: Option<f64>,
}

impl InitialConditions {
    /// Build the event from the arguments `initial_conditions` received.
    pub fn new(setpoint: Option<f64>, pv: Option<f64>) -> Self {
        Self { setpoint, pv }
    }

    /// Setpoint supplied to the call, if any.
    pub fn setpoint(&self) -> Option<f64> {
        self.setpoint
    }

    /// Process variable supplied to the call, if any.
    pub fn pv(&self) -> Option<f64> {
        self.pv
    }
}

impl fmt::Display for InitialConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InitialConditions(setpoint={}, pv={})",
            Maybe(self.setpoint),
            Maybe(self.pv)
        )
    }
}

impl AnyEvent for InitialConditions {
    fn kind(&self) -> EventKind {
        EventKind::InitialConditions
    }

    fn snapshot(&self) -> Event {
        Event::InitialConditions(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SetpointChange
// ─────────────────────────────────────────────────────────────────────────────

/// Announces a pending setpoint write, before it is stored.
///
/// After the chain has run, the controller stores [`sp`][SetpointChange::sp]
/// when a handler set it, and [`sp_to`][SetpointChange::sp_to] otherwise.
/// Ramping modifiers use that override to hold the stored value back while
/// they walk it toward the target with controller-internal re-issues; those
/// re-issues are flagged [`is_internal`][SetpointChange::is_internal] so the
/// ramp itself passes them through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointChange {
    sp_from: f64,
    sp_to: f64,
    internal: bool,
    /// Replacement value to store instead of `sp_to`, if a handler sets it.
    pub sp: Option<f64>,
}

impl SetpointChange {
    /// Build the event for a caller-requested setpoint write.
    pub fn new(sp_from: f64, sp_to: f64) -> Self {
        Self {
            sp_from,
            sp_to,
            internal: false,
            sp: None,
        }
    }

    /// Build the event for a controller-internal write (e.g. one ramp step).
    pub fn internal(sp_from: f64, sp_to: f64) -> Self {
        Self {
            sp_from,
            sp_to,
            internal: true,
            sp: None,
        }
    }

    /// Setpoint currently stored on the controller.
    pub fn sp_from(&self) -> f64 {
        self.sp_from
    }

    /// Setpoint the write is requesting.
    pub fn sp_to(&self) -> f64 {
        self.sp_to
    }

    /// `true` for writes issued by a modifier rather than the caller.
    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

impl fmt::Display for SetpointChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SetpointChange(sp_from={}, sp_to={}, sp={}",
            self.sp_from,
            self.sp_to,
            Maybe(self.sp)
        )?;
        if self.internal {
            f.write_str(", internal=true")?;
        }
        f.write_str(")")
    }
}

impl AnyEvent for SetpointChange {
    fn kind(&self) -> EventKind {
        EventKind::SetpointChange
    }

    fn snapshot(&self) -> Event {
        Event::SetpointChange(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BaseTerms
// ─────────────────────────────────────────────────────────────────────────────

/// First stage of a control tick.
///
/// Every term starts out unset.  A term a handler fills in is taken as-is and
/// the controller skips the matching internal calculation *and its side
/// effect*: supplying `i` leaves the stored integration sum untouched, and
/// supplying `d` leaves the previous-pv memory untouched.  Supplying `u`
/// short-circuits the weighted sum later but does **not** suppress the term
/// calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseTerms {
    dt: f64,
    /// Error override; when unset the controller computes `setpoint − pv`.
    pub e: Option<f64>,
    /// Proportional term override.
    pub p: Option<f64>,
    /// Integration term override; suppresses the integration side effect.
    pub i: Option<f64>,
    /// Derivative term override; suppresses the previous-pv side effect.
    pub d: Option<f64>,
    /// Control value override; skips the weighted sum if still set later.
    pub u: Option<f64>,
    /// Open attribute bag, carried through the rest of the tick.
    pub extras: Extras,
}

impl BaseTerms {
    /// Build the stage event for a tick of length `dt`.
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            e: None,
            p: None,
            i: None,
            d: None,
            u: None,
            extras: Extras::new(),
        }
    }

    /// Tick length in effect for this call.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

impl fmt::Display for BaseTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BaseTerms(dt={}, e={}, p={}, i={}, d={}, u={}",
            self.dt,
            Maybe(self.e),
            Maybe(self.p),
            Maybe(self.i),
            Maybe(self.d),
            Maybe(self.u)
        )?;
        write_extras(f, &self.extras)?;
        f.write_str(")")
    }
}

impl AnyEvent for BaseTerms {
    fn kind(&self) -> EventKind {
        EventKind::BaseTerms
    }

    fn extras(&self) -> Option<&Extras> {
        Some(&self.extras)
    }

    fn extras_mut(&mut self) -> Option<&mut Extras> {
        Some(&mut self.extras)
    }

    fn snapshot(&self) -> Event {
        Event::BaseTerms(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModifyTerms
// ─────────────────────────────────────────────────────────────────────────────

/// Second stage of a control tick: all terms resolved, output still open.
///
/// The term fields are plain numbers here – the controller guarantees they
/// are filled in before this stage fires.  Handlers may rewrite `p`, `i`,
/// `d`, or supply `u`; the error is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyTerms {
    dt: f64,
    e: f64,
    /// Proportional term, rewritable.
    pub p: f64,
    /// Integration term, rewritable.
    pub i: f64,
    /// Derivative term, rewritable.
    pub d: f64,
    /// Control value override; when still unset the controller computes the
    /// weighted sum after this stage.
    pub u: Option<f64>,
    /// Attribute bag carried over from [`BaseTerms`].
    pub extras: Extras,
}

impl ModifyTerms {
    /// Build the stage event from the resolved terms.
    pub fn new(dt: f64, e: f64, p: f64, i: f64, d: f64, u: Option<f64>, extras: Extras) -> Self {
        Self {
            dt,
            e,
            p,
            i,
            d,
            u,
            extras,
        }
    }

    /// Tick length in effect for this call.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Resolved error for this tick.
    pub fn e(&self) -> f64 {
        self.e
    }
}

impl fmt::Display for ModifyTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModifyTerms(dt={}, e={}, p={}, i={}, d={}, u={}",
            self.dt,
            self.e,
            self.p,
            self.i,
            self.d,
            Maybe(self.u)
        )?;
        write_extras(f, &self.extras)?;
        f.write_str(")")
    }
}

impl AnyEvent for ModifyTerms {
    fn kind(&self) -> EventKind {
        EventKind::ModifyTerms
    }

    fn extras(&self) -> Option<&Extras> {
        Some(&self.extras)
    }

    fn extras_mut(&mut self) -> Option<&mut Extras> {
        Some(&mut self.extras)
    }

    fn snapshot(&self) -> Event {
        Event::ModifyTerms(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CalculateU
// ─────────────────────────────────────────────────────────────────────────────

/// Final stage of a control tick: the output is decided, terms are fixed.
///
/// This is where output-shaping modifiers (dead bands, bang-bang conversion)
/// replace `u`.  Whatever `u` holds after the chain has run is what the tick
/// returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateU {
    dt: f64,
    e: f64,
    p: f64,
    i: f64,
    d: f64,
    /// Control value about to be returned, rewritable.
    pub u: f64,
    /// Attribute bag carried over from the earlier stages.
    pub extras: Extras,
}

impl CalculateU {
    /// Build the stage event from the finished terms and output.
    pub fn new(dt: f64, e: f64, p: f64, i: f64, d: f64, u: f64, extras: Extras) -> Self {
        Self {
            dt,
            e,
            p,
            i,
            d,
            u,
            extras,
        }
    }

    /// Tick length in effect for this call.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Resolved error for this tick.
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Final proportional term.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Final integration term.
    pub fn i(&self) -> f64 {
        self.i
    }

    /// Final derivative term.
    pub fn d(&self) -> f64 {
        self.d
    }
}

impl fmt::Display for CalculateU {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalculateU(dt={}, e={}, p={}, i={}, d={}, u={}",
            self.dt, self.e, self.p, self.i, self.d, self.u
        )?;
        write_extras(f, &self.extras)?;
        f.write_str(")")
    }
}

impl AnyEvent for CalculateU {
    fn kind(&self) -> EventKind {
        EventKind::CalculateU
    }

    fn extras(&self) -> Option<&Extras> {
        Some(&self.extras)
    }

    fn extras_mut(&mut self) -> Option<&mut Extras> {
        Some(&mut self.extras)
    }

    fn snapshot(&self) -> Event {
        Event::CalculateU(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookStopped
// ─────────────────────────────────────────────────────────────────────────────

/// Replacement event delivered to the modifiers after a stop.
///
/// Carries a copy of the event that was in flight, the position and name of
/// the modifier that stopped it, and the names of the full chain.  The
/// wrapped event may itself be a `HookStopped` when a stop handler stops
/// again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookStopped {
    event: Box<Event>,
    stopper: String,
    nth: usize,
    modifiers: Vec<String>,
}

impl HookStopped {
    /// Build the replacement for `event`, stopped by `stopper` at index `nth`.
    pub fn new(event: Event, stopper: impl Into<String>, nth: usize, modifiers: Vec<String>) -> Self {
        Self {
            event: Box::new(event),
            stopper: stopper.into(),
            nth,
            modifiers,
        }
    }

    /// The event whose propagation was halted.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Name of the modifier that raised the stop.
    pub fn stopper(&self) -> &str {
        &self.stopper
    }

    /// Chain index of the stopping modifier.
    pub fn nth(&self) -> usize {
        self.nth
    }

    /// Names of every modifier in the chain, in order.
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }
}

impl fmt::Display for HookStopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HookStopped(event={}, stopper={}, nth={}, modifiers=[{}])",
            self.event,
            self.stopper,
            self.nth,
            self.modifiers.join(", ")
        )
    }
}

impl AnyEvent for HookStopped {
    fn kind(&self) -> EventKind {
        EventKind::HookStopped
    }

    fn snapshot(&self) -> Event {
        Event::HookStopped(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure
// ─────────────────────────────────────────────────────────────────────────────

/// Replacement event delivered to the modifiers after a handler failure.
///
/// The wrapped error is also returned to the caller once the remaining
/// modifiers have been notified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    event: Box<Event>,
    error: PidError,
    stopper: String,
    nth: usize,
    modifiers: Vec<String>,
}

impl Failure {
    /// Build the replacement for `event`, failed by `stopper` at index `nth`.
    pub fn new(
        event: Event,
        error: PidError,
        stopper: impl Into<String>,
        nth: usize,
        modifiers: Vec<String>,
    ) -> Self {
        Self {
            event: Box::new(event),
            error,
            stopper: stopper.into(),
            nth,
            modifiers,
        }
    }

    /// The event whose handler failed.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The error the handler raised.
    pub fn error(&self) -> &PidError {
        &self.error
    }

    /// Name of the failing modifier.
    pub fn stopper(&self) -> &str {
        &self.stopper
    }

    /// Chain index of the failing modifier.
    pub fn nth(&self) -> usize {
        self.nth
    }

    /// Names of every modifier in the chain, in order.
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failure(event={}, error={}, stopper={}, nth={}, modifiers=[{}])",
            self.event,
            self.error,
            self.stopper,
            self.nth,
            self.modifiers.join(", ")
        )
    }
}

impl AnyEvent for Failure {
    fn kind(&self) -> EventKind {
        EventKind::Failure
    }

    fn snapshot(&self) -> Event {
        Event::Failure(self.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event
// ─────────────────────────────────────────────────────────────────────────────

/// Any event the controller can emit, as an owned value.
///
/// The dispatcher routes on the variant; recorders store the enum whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// See [`Attached`].
    Attached(Attached),
    /// See [`InitialConditions`].
    InitialConditions(InitialConditions),
    /// See [`SetpointChange`].
    SetpointChange(SetpointChange),
    /// See [`BaseTerms`].
    BaseTerms(BaseTerms),
    /// See [`ModifyTerms`].
    ModifyTerms(ModifyTerms),
    /// See [`CalculateU`].
    CalculateU(CalculateU),
    /// See [`HookStopped`].
    HookStopped(HookStopped),
    /// See [`Failure`].
    Failure(Failure),
}

impl Event {
    /// Discriminant of the wrapped event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Attached(_) => EventKind::Attached,
            Event::InitialConditions(_) => EventKind::InitialConditions,
            Event::SetpointChange(_) => EventKind::SetpointChange,
            Event::BaseTerms(_) => EventKind::BaseTerms,
            Event::ModifyTerms(_) => EventKind::ModifyTerms,
            Event::CalculateU(_) => EventKind::CalculateU,
            Event::HookStopped(_) => EventKind::HookStopped,
            Event::Failure(_) => EventKind::Failure,
        }
    }

    /// The event's type name as used in textual renderings.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The extras bag, for the per-tick events that carry one.
    pub fn extras(&self) -> Option<&Extras> {
        match self {
            Event::BaseTerms(ev) => Some(&ev.extras),
            Event::ModifyTerms(ev) => Some(&ev.extras),
            Event::CalculateU(ev) => Some(&ev.extras),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Attached(ev) => ev.fmt(f),
            Event::InitialConditions(ev) => ev.fmt(f),
            Event::SetpointChange(ev) => ev.fmt(f),
            Event::BaseTerms(ev) => ev.fmt(f),
            Event::ModifyTerms(ev) => ev.fmt(f),
            Event::CalculateU(ev) => ev.fmt(f),
            Event::HookStopped(ev) => ev.fmt(f),
            Event::Failure(ev) => ev.fmt(f),
        }
    }
}

impl From<Attached> for Event {
    fn from(ev: Attached) -> Self {
        Event::Attached(ev)
    }
}

impl From<InitialConditions> for Event {
    fn from(ev: InitialConditions) -> Self {
        Event::InitialConditions(ev)
    }
}

impl From<SetpointChange> for Event {
    fn from(ev: SetpointChange) -> Self {
        Event::SetpointChange(ev)
    }
}

impl From<BaseTerms> for Event {
    fn from(ev: BaseTerms) -> Self {
        Event::BaseTerms(ev)
    }
}

impl From<ModifyTerms> for Event {
    fn from(ev: ModifyTerms) -> Self {
        Event::ModifyTerms(ev)
    }
}

impl From<CalculateU> for Event {
    fn from(ev: CalculateU) -> Self {
        Event::CalculateU(ev)
    }
}

impl From<HookStopped> for Event {
    fn from(ev: HookStopped) -> Self {
        Event::HookStopped(ev)
    }
}

impl From<Failure> for Event {
    fn from(ev: Failure) -> Self {
        Event::Failure(ev)
    }
}
