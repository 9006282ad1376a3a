//! [`DeadBand`] – suppress small output changes.
//!
//! Physical actuators wear out when the control value dithers around a
//! slowly moving level.  This modifier snaps the output back to the
//! previously returned value whenever the new one is within `size` of it,
//! so only movements that matter reach the actuator.

use std::cell::RefCell;
use std::rc::Rc;

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{Attached, CalculateU, InitialConditions, PidError};

#[derive(Debug)]
struct DeadBandInner {
    size: f64,
    last_u: Option<f64>,
    snapped: bool,
    guard: AttachmentGuard,
}

/// Holds the output at its previous value while changes stay below `size`.
///
/// The first tick after construction or after `initial_conditions` always
/// passes through (there is no previous value to hold).  The value is a
/// cheap handle over shared state: clone it before attaching to keep the
/// [`DeadBand::deadbanded`] read-out on the caller's side.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::DeadBand;
///
/// let band = DeadBand::new(0.05).unwrap();
/// let mut pid = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
/// pid.set_setpoint(1.0).unwrap();
///
/// pid.pid(0.0, Some(1.0)).unwrap();
/// assert!(!band.deadbanded());
///
/// // A change of 0.01 is held back.
/// let u = pid.pid(0.01, Some(1.0)).unwrap();
/// assert_eq!(u, 1.0);
/// assert!(band.deadbanded());
/// ```
#[derive(Debug, Clone)]
pub struct DeadBand {
    inner: Rc<RefCell<DeadBandInner>>,
}

impl DeadBand {
    /// Suppress output changes smaller than `size`.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidParameter`] for a negative or NaN `size`.
    pub fn new(size: f64) -> Result<Self, PidError> {
        if !(size >= 0.0) {
            return Err(PidError::invalid_parameter(
                "size",
                format!("must be a non-negative number, got {size}"),
            ));
        }
        Ok(Self {
            inner: Rc::new(RefCell::new(DeadBandInner {
                size,
                last_u: None,
                snapped: false,
                guard: AttachmentGuard::new(),
            })),
        })
    }

    /// Configured band size.
    pub fn size(&self) -> f64 {
        self.inner.borrow().size
    }

    /// `true` when the most recent tick was held at the previous output.
    pub fn deadbanded(&self) -> bool {
        self.inner.borrow().snapped
    }
}

impl Modifier for DeadBand {
    fn name(&self) -> &str {
        "dead_band"
    }

    fn on_attached(&mut self, _pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.inner
            .borrow_mut()
            .guard
            .claim(event.pid_id(), "dead_band")?;
        Ok(())
    }

    fn on_initial_conditions(
        &mut self,
        _pid: &mut PidPlus,
        _event: &mut InitialConditions,
    ) -> HookResult {
        let mut inner = self.inner.borrow_mut();
        inner.last_u = None;
        inner.snapped = false;
        Ok(())
    }

    fn on_calculate_u(&mut self, _pid: &mut PidPlus, event: &mut CalculateU) -> HookResult {
        let mut inner = self.inner.borrow_mut();
        match inner.last_u {
            Some(last) if (event.u - last).abs() < inner.size => {
                event.u = last;
                inner.snapped = true;
            }
            _ => {
                inner.last_u = Some(event.u);
                inner.snapped = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn small_changes_snap_back_until_a_large_one_escapes() {
        let band = DeadBand::new(0.05).unwrap();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
        pid.initial_conditions(Some(0.75), Some(0.5)).unwrap();

        let inputs = [0.75, 0.76, 0.77, 0.71, 0.77, 0.81];
        let expected_u = [-0.25, -0.25, -0.25, -0.25, -0.25, -0.31];
        let expected_snap = [false, true, true, true, true, false];

        for ((&pv, &want), &snap) in inputs
            .iter()
            .zip(expected_u.iter())
            .zip(expected_snap.iter())
        {
            let u = pid.pid(pv, Some(1.0)).unwrap();
            assert!((u - want).abs() < EPS, "pv={pv}: u={u}, want {want}");
            assert_eq!(band.deadbanded(), snap, "pv={pv}");
        }
    }

    #[test]
    fn first_tick_is_never_snapped() {
        let band = DeadBand::new(10.0).unwrap();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        assert!(!band.deadbanded());
    }

    #[test]
    fn initial_conditions_clear_the_held_value() {
        let band = DeadBand::new(0.5).unwrap();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
        pid.set_setpoint(1.0).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        pid.pid(0.1, Some(1.0)).unwrap();
        assert!(band.deadbanded());

        // Re-seeding forgets the previous output, so nothing to snap to.
        pid.initial_conditions(Some(0.0), None).unwrap();
        pid.pid(0.05, Some(1.0)).unwrap();
        assert!(!band.deadbanded());
    }

    #[test]
    fn changes_at_exactly_the_band_size_escape() {
        let band = DeadBand::new(0.5).unwrap();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
        pid.set_setpoint(1.0).unwrap();
        let u1 = pid.pid(0.0, Some(1.0)).unwrap();
        assert!((u1 - 1.0).abs() < EPS);
        // u would be 0.5; |0.5 - 1.0| == size → not inside the band.
        let u2 = pid.pid(0.5, Some(1.0)).unwrap();
        assert!((u2 - 0.5).abs() < EPS);
        assert!(!band.deadbanded());
    }

    #[test]
    fn negative_size_is_rejected() {
        assert!(matches!(
            DeadBand::new(-0.1),
            Err(PidError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn second_attachment_is_rejected() {
        let band = DeadBand::new(0.1).unwrap();
        let _first = PidPlus::new(1.0, 0.0, 0.0, band.clone()).unwrap();
        assert!(matches!(
            PidPlus::new(1.0, 0.0, 0.0, band),
            Err(PidError::AlreadyAttached { .. })
        ));
    }
}
