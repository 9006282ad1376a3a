//! `pidplus-modifiers` – the built-in modifier library.
//!
//! Ready-made [`Modifier`][pidplus_core::Modifier] implementations for the
//! [`PidPlus`][pidplus_core::PidPlus] controller, one file per modifier:
//!
//! - [`SetpointRamp`] – walk setpoint changes in over time, visibly or
//!   hidden.
//! - [`IntegralWindup`] – clamp the integration term and the stored sum.
//! - [`IntegralSetpointReset`] – zero the sum on setpoint changes, pause
//!   accumulation briefly.
//! - [`IntegralFreeze`] – caller-controlled freeze switch for accumulation.
//! - [`DeadBand`] – suppress small output changes.
//! - [`BangBang`] – discretize the output to on/off drive levels.
//! - [`DerivativeOnError`] – derivative on error with an optional kick
//!   filter.
//! - [`PidHistory`] – record the event stream (and optionally controller
//!   state) for later analysis.
//! - [`EventPrint`] – render every event to a pluggable sink.
//!
//! Modifiers with a post-attachment control surface (`SetpointRamp`,
//! `IntegralFreeze`, `DeadBand`, `PidHistory`) are cheap cloneable handles
//! over shared state: clone before attaching, keep the clone.  Those with
//! per-controller state reject attachment to a second controller.
//!
//! # Example
//!
//! ```
//! use pidplus_core::{Modifier, PidPlus};
//! use pidplus_modifiers::{IntegralWindup, SetpointRamp};
//!
//! let chain: Vec<Box<dyn Modifier>> = vec![
//!     Box::new(SetpointRamp::new(5.0).unwrap()),
//!     Box::new(IntegralWindup::symmetric(2.0)),
//! ];
//! let mut pid = PidPlus::new(1.0, 0.1, 0.0, chain).unwrap();
//! pid.set_setpoint(4.0).unwrap();
//! let _u = pid.pid(0.0, Some(0.1)).unwrap();
//! ```

pub mod bangbang;
pub mod deadband;
pub mod derivative;
pub mod freeze;
pub mod history;
pub mod print;
pub mod setpoint_ramp;
pub mod setpoint_reset;
pub mod windup;

pub use bangbang::BangBang;
pub use deadband::DeadBand;
pub use derivative::DerivativeOnError;
pub use freeze::IntegralFreeze;
pub use history::{HistoryEntry, PidHistory};
pub use print::EventPrint;
pub use setpoint_ramp::SetpointRamp;
pub use setpoint_reset::IntegralSetpointReset;
pub use windup::IntegralWindup;
