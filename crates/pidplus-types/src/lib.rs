//! `pidplus-types` – events, attribute bag, and errors.
//!
//! Shared vocabulary of the workspace.  The controller and the modifier
//! chain communicate exclusively through the types defined here.
//!
//! # Modules
//!
//! - [`event`] – the typed lifecycle events ([`Attached`], [`BaseTerms`],
//!   [`HookStopped`], …), the owned [`Event`] enum the dispatcher routes on,
//!   and the [`AnyEvent`] view handed to catch-all handlers.
//! - [`extras`] – [`Extras`]: the open attribute bag the per-tick events
//!   carry from stage to stage.
//! - [`state`] – [`PidSnapshot`]: a serializable copy of the controller
//!   state, recorded by history observers.
//! - [`error`] – [`PidError`]: usage errors and handler failures.

pub mod error;
pub mod event;
pub mod extras;
pub mod state;

pub use error::PidError;
pub use event::{
    AnyEvent, Attached, BaseTerms, CalculateU, Event, EventKind, Failure, HookStopped,
    InitialConditions, ModifyTerms, SetpointChange,
};
pub use extras::Extras;
pub use state::PidSnapshot;
