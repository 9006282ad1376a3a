//! [`BangBang`] – convert the continuous output into discrete drive levels.
//!
//! Heaters, relays, and solenoid valves do not take a continuum; they are on
//! or off.  This modifier classifies the computed output against an on and
//! an off threshold and replaces it with the configured drive value.  With
//! both thresholds present and apart, the region between them is a dead
//! zone: the output maps to [`BangBang::dead_value`] when one is configured
//! and passes through unchanged otherwise.
//!
//! Stateless: one value can be shared across controllers.

use pidplus_core::{HookResult, Modifier, PidPlus};
use pidplus_types::CalculateU;

/// Replaces the output with discrete on/off (or dead-zone) drive values.
///
/// A threshold set to `None` disables that side of the classification: with
/// only `on_threshold`, everything below it is off; with only
/// `off_threshold`, everything above it is on.  When both are present the
/// on test wins at the boundary.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::BangBang;
///
/// let bang = BangBang {
///     on_threshold: Some(1.0),
///     off_threshold: Some(-1.0),
///     dead_value: Some(0.5),
///     ..BangBang::default()
/// };
/// let mut pid = PidPlus::new(1.0, 0.0, 0.0, bang).unwrap();
/// pid.set_setpoint(10.0).unwrap();
///
/// // Raw u = 10 → classified on.
/// assert_eq!(pid.pid(0.0, Some(1.0)).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BangBang {
    /// Output at or above this drives [`BangBang::on_value`].
    pub on_threshold: Option<f64>,
    /// Output at or below this drives [`BangBang::off_value`].
    pub off_threshold: Option<f64>,
    /// Drive level for the on classification.
    pub on_value: f64,
    /// Drive level for the off classification.
    pub off_value: f64,
    /// Drive level between the thresholds; `None` leaves the output as-is.
    pub dead_value: Option<f64>,
}

impl Default for BangBang {
    /// Both thresholds at zero, driving 1 when on and 0 when off.
    fn default() -> Self {
        Self {
            on_threshold: Some(0.0),
            off_threshold: Some(0.0),
            on_value: 1.0,
            off_value: 0.0,
            dead_value: None,
        }
    }
}

impl Modifier for BangBang {
    fn name(&self) -> &str {
        "bang_bang"
    }

    fn on_calculate_u(&mut self, _pid: &mut PidPlus, event: &mut CalculateU) -> HookResult {
        let u = event.u;
        match (self.on_threshold, self.off_threshold) {
            (Some(on), None) => {
                event.u = if u >= on { self.on_value } else { self.off_value };
            }
            (None, Some(off)) => {
                event.u = if u <= off { self.off_value } else { self.on_value };
            }
            (Some(on), Some(off)) => {
                if u >= on {
                    event.u = self.on_value;
                } else if u <= off {
                    event.u = self.off_value;
                } else if let Some(dead) = self.dead_value {
                    event.u = dead;
                }
            }
            (None, None) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(bang: BangBang, setpoint: f64) -> f64 {
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, bang).unwrap();
        pid.set_setpoint(setpoint).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap()
    }

    #[test]
    fn default_classifies_around_zero() {
        assert_eq!(run(BangBang::default(), 10.0), 1.0);
        assert_eq!(run(BangBang::default(), -10.0), 0.0);
        // At the shared boundary the on test wins.
        assert_eq!(run(BangBang::default(), 0.0), 1.0);
    }

    #[test]
    fn dead_zone_maps_to_the_dead_value() {
        let bang = BangBang {
            on_threshold: Some(1.0),
            off_threshold: Some(-1.0),
            dead_value: Some(0.5),
            ..BangBang::default()
        };
        assert_eq!(run(bang.clone(), 5.0), 1.0);
        assert_eq!(run(bang.clone(), -5.0), 0.0);
        assert_eq!(run(bang, 0.2), 0.5);
    }

    #[test]
    fn dead_zone_without_dead_value_passes_through() {
        let bang = BangBang {
            on_threshold: Some(1.0),
            off_threshold: Some(-1.0),
            dead_value: None,
            ..BangBang::default()
        };
        let u = run(bang, 0.2);
        assert!((u - 0.2).abs() < 1e-12);
    }

    #[test]
    fn only_on_threshold_splits_at_that_level() {
        let bang = BangBang {
            on_threshold: Some(2.0),
            off_threshold: None,
            ..BangBang::default()
        };
        assert_eq!(run(bang.clone(), 3.0), 1.0);
        assert_eq!(run(bang.clone(), 2.0), 1.0);
        assert_eq!(run(bang, 1.0), 0.0);
    }

    #[test]
    fn only_off_threshold_splits_at_that_level() {
        let bang = BangBang {
            on_threshold: None,
            off_threshold: Some(-2.0),
            ..BangBang::default()
        };
        assert_eq!(run(bang.clone(), -3.0), 0.0);
        assert_eq!(run(bang.clone(), -2.0), 0.0);
        assert_eq!(run(bang, 0.5), 1.0);
    }

    #[test]
    fn custom_drive_values_are_used() {
        let bang = BangBang {
            on_value: 255.0,
            off_value: -255.0,
            ..BangBang::default()
        };
        assert_eq!(run(bang.clone(), 1.0), 255.0);
        assert_eq!(run(bang, -1.0), -255.0);
    }

    #[test]
    fn no_thresholds_leaves_the_output_alone() {
        let bang = BangBang {
            on_threshold: None,
            off_threshold: None,
            ..BangBang::default()
        };
        assert_eq!(run(bang, 7.0), 7.0);
    }
}
