//! [`EventPrint`] – render every event to a pluggable sink.
//!
//! The poor engineer's oscilloscope: attach one of these while bringing a
//! loop up and every event is printed as it happens, indented by nesting
//! depth so handler-emitted events (e.g. a ramp's internal setpoint steps)
//! read as children of the tick that produced them.  Replacement events
//! after a stop or failure print at the depth of the event they replaced.

use std::fmt;

use pidplus_core::{HookResult, Modifier, PidPlus};
use pidplus_types::AnyEvent;

/// Prints each event on its own line, through a caller-supplied sink.
///
/// The default sink is standard output.  Tests (and log integrations) swap
/// it with [`EventPrint::with_sink`].
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::EventPrint;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let lines = Rc::new(RefCell::new(Vec::new()));
/// let captured = Rc::clone(&lines);
/// let printer = EventPrint::new()
///     .with_sink(move |line: &str| captured.borrow_mut().push(line.to_string()));
///
/// let _pid = PidPlus::new(0.0, 0.0, 0.0, printer).unwrap();
/// assert_eq!(
///     *lines.borrow(),
///     vec!["Attached()", "InitialConditions(setpoint=0, pv=0)"]
/// );
/// ```
pub struct EventPrint {
    prefix: String,
    sink: Box<dyn FnMut(&str)>,
}

impl fmt::Debug for EventPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPrint")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Default for EventPrint {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPrint {
    /// Print to standard output with no prefix.
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            sink: Box::new(|line| println!("{line}")),
        }
    }

    /// Print with `prefix` in front of every line.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    /// Replace the sink.
    pub fn with_sink(mut self, sink: impl FnMut(&str) + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }
}

impl Modifier for EventPrint {
    fn name(&self) -> &str {
        "event_print"
    }

    fn on_default(&mut self, pid: &mut PidPlus, event: &mut dyn AnyEvent) -> HookResult {
        let indent = pid.nesting_depth().saturating_sub(1);
        let line = format!("{}{}{}", self.prefix, "  ".repeat(indent), event);
        (self.sink)(&line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SetpointRamp;
    use pidplus_core::HookSignal;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Lines = Rc<RefCell<Vec<String>>>;

    fn capturing_printer() -> (EventPrint, Lines) {
        let lines: Lines = Rc::new(RefCell::new(Vec::new()));
        let captured = Rc::clone(&lines);
        let printer = EventPrint::new()
            .with_sink(move |line: &str| captured.borrow_mut().push(line.to_string()));
        (printer, lines)
    }

    #[test]
    fn construction_prints_attachment_then_initial_seeding() {
        let (printer, lines) = capturing_printer();
        let _pid = PidPlus::new(0.0, 0.0, 0.0, printer).unwrap();
        assert_eq!(
            *lines.borrow(),
            vec![
                "Attached()".to_string(),
                "InitialConditions(setpoint=0, pv=0)".to_string(),
            ]
        );
    }

    #[test]
    fn top_level_events_are_not_indented() {
        let (printer, lines) = capturing_printer();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, printer).unwrap();
        lines.borrow_mut().clear();
        pid.pid(0.0, Some(1.0)).unwrap();

        let lines = lines.borrow();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("BaseTerms("));
        assert!(lines[1].starts_with("ModifyTerms("));
        assert!(lines[2].starts_with("CalculateU("));
    }

    #[test]
    fn prefix_is_prepended_to_every_line() {
        let lines: Lines = Rc::new(RefCell::new(Vec::new()));
        let captured = Rc::clone(&lines);
        let printer = EventPrint::with_prefix("loop1: ")
            .with_sink(move |line: &str| captured.borrow_mut().push(line.to_string()));
        let _pid = PidPlus::new(0.0, 0.0, 0.0, printer).unwrap();
        assert!(lines.borrow().iter().all(|line| line.starts_with("loop1: ")));
    }

    #[test]
    fn handler_emitted_events_are_indented_one_level() {
        let (printer, lines) = capturing_printer();
        let chain: Vec<Box<dyn Modifier>> = vec![
            Box::new(SetpointRamp::new(5.0).unwrap()),
            Box::new(printer),
        ];
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, chain).unwrap();
        pid.set_setpoint(4.0).unwrap();
        lines.borrow_mut().clear();
        pid.pid(0.0, Some(1.0)).unwrap();

        let lines = lines.borrow();
        // The ramp's internal setpoint step fires from inside the tick, so
        // it prints indented and before the tick's own line.
        assert!(lines[0].starts_with("  SetpointChange("));
        assert!(lines[0].contains("internal=true"));
        assert!(lines[1].starts_with("BaseTerms("));
    }

    #[test]
    fn replacement_events_print_at_unchanged_depth() {
        /// Halts every setpoint change.
        struct Muzzle;

        impl Modifier for Muzzle {
            fn name(&self) -> &str {
                "muzzle"
            }

            fn on_setpoint_change(
                &mut self,
                _pid: &mut PidPlus,
                _event: &mut pidplus_types::SetpointChange,
            ) -> HookResult {
                Err(HookSignal::Stop)
            }
        }

        let (printer, lines) = capturing_printer();
        let chain: Vec<Box<dyn Modifier>> = vec![Box::new(Muzzle), Box::new(printer)];
        let mut pid = PidPlus::new(0.0, 0.0, 0.0, chain).unwrap();
        lines.borrow_mut().clear();
        pid.set_setpoint(1.0).unwrap();

        let lines = lines.borrow();
        assert_eq!(lines.len(), 1);
        // Replaces the stopped event at top level: no indentation.
        assert!(lines[0].starts_with("HookStopped("));
    }
}
