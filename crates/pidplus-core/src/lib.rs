//! `pidplus-core` – controllers and the modifier chain.
//!
//! Two controllers share the same control math:
//!
//! - [`Pid`] – the plain, fast three-term controller.  No events, no
//!   observers, just arithmetic.
//! - [`PidPlus`] – wraps the same math and announces every lifecycle point
//!   (attachment, initial conditions, setpoint writes, and the three stages
//!   of every tick) to an ordered chain of [`Modifier`]s that may observe or
//!   rewrite the calculation in flight.
//!
//! # Modules
//!
//! - [`pid`] – [`Pid`]: integrator, differentiator, error calculation.
//! - [`plus`] – [`PidPlus`]: the event-emitting controller.
//! - [`modifier`] – [`Modifier`]: the hook interface, [`HookSignal`] for
//!   stop/failure signalling, [`AttachmentGuard`] for single-attachment
//!   enforcement, and [`IntoModifiers`] for chain construction.
//!
//! Event dispatch (ordered propagation, short-circuit, failure fan-out)
//! lives in a private module; its behavior is part of [`PidPlus`]'s
//! documented contract.
//!
//! All time is the caller's `dt`; nothing here reads a clock, and nothing
//! here is thread-safe – a controller and its chain belong to one thread.

pub mod modifier;
pub mod pid;
pub mod plus;

mod dispatch;

pub use modifier::{AttachmentGuard, HookResult, HookSignal, IntoModifiers, Modifier};
pub use pid::Pid;
pub use plus::PidPlus;
