//! [`PidHistory`] – record the event stream for later analysis.
//!
//! Attach one of these at the end of the chain (or anywhere, to see events
//! as they looked at that position) and every event the controller emits is
//! copied into a bounded FIFO, optionally together with a snapshot of the
//! controller state at that moment.  Per-kind counters are kept for every
//! recorded event, replacements included.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use pidplus_core::{AttachmentGuard, HookResult, Modifier, PidPlus};
use pidplus_types::{AnyEvent, Attached, Event, EventKind, PidError, PidSnapshot};
use serde::{Deserialize, Serialize};

/// One recorded event, with the optional detail snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The recorded event.
    pub event: Event,
    /// Controller state at recording time; only in detail mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PidSnapshot>,
}

#[derive(Debug)]
struct HistoryInner {
    capacity: Option<usize>,
    detail: bool,
    entries: VecDeque<HistoryEntry>,
    counts: BTreeMap<EventKind, u64>,
    guard: AttachmentGuard,
}

/// Records every event into a bounded FIFO.
///
/// The value is a cheap handle over shared state: clone it before attaching
/// and read the recording from the caller's side.
///
/// # Example
///
/// ```
/// use pidplus_core::PidPlus;
/// use pidplus_modifiers::PidHistory;
///
/// let history = PidHistory::new(1000);
/// let _pid = PidPlus::new(0.0, 0.0, 0.0, history.clone()).unwrap();
///
/// // Construction alone produces the attachment and the initial seeding.
/// let rendered: Vec<String> = history.events().iter().map(|e| e.to_string()).collect();
/// assert_eq!(
///     rendered,
///     vec!["Attached()", "InitialConditions(setpoint=0, pv=0)"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PidHistory {
    inner: Rc<RefCell<HistoryInner>>,
}

impl PidHistory {
    /// Keep at most `capacity` entries, dropping the oldest beyond that.
    pub fn new(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    /// Keep every entry; memory is the only limit.
    pub fn unbounded() -> Self {
        Self::build(None)
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HistoryInner {
                capacity,
                detail: false,
                entries: VecDeque::new(),
                counts: BTreeMap::new(),
                guard: AttachmentGuard::new(),
            })),
        }
    }

    /// Also snapshot the controller state with every entry.
    pub fn with_detail(self) -> Self {
        self.inner.borrow_mut().detail = true;
        self
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// The recorded entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.borrow().entries.iter().cloned().collect()
    }

    /// The recorded events, oldest first, without the detail snapshots.
    pub fn events(&self) -> Vec<Event> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    /// Per-kind counters over everything recorded so far.
    ///
    /// Counters keep growing when old entries are evicted from the FIFO.
    pub fn event_counts(&self) -> BTreeMap<EventKind, u64> {
        self.inner.borrow().counts.clone()
    }

    /// Drop all recorded entries and counters.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.clear();
        inner.counts.clear();
    }

    /// Serialize the recorded entries as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::Serialization`] when encoding fails.
    pub fn export_json(&self) -> Result<String, PidError> {
        let inner = self.inner.borrow();
        let entries: Vec<&HistoryEntry> = inner.entries.iter().collect();
        serde_json::to_string(&entries).map_err(|err| PidError::Serialization(err.to_string()))
    }

    fn record(&self, pid: &PidPlus, event: &dyn AnyEvent) {
        let mut inner = self.inner.borrow_mut();
        *inner.counts.entry(event.kind()).or_insert(0) += 1;
        let state = inner.detail.then(|| pid.snapshot());
        inner.entries.push_back(HistoryEntry {
            event: event.snapshot(),
            state,
        });
        if let Some(capacity) = inner.capacity {
            while inner.entries.len() > capacity {
                inner.entries.pop_front();
            }
        }
    }
}

impl Modifier for PidHistory {
    fn name(&self) -> &str {
        "pid_history"
    }

    fn on_attached(&mut self, pid: &mut PidPlus, event: &mut Attached) -> HookResult {
        self.inner
            .borrow_mut()
            .guard
            .claim(event.pid_id(), "pid_history")?;
        self.record(pid, &*event);
        Ok(())
    }

    fn on_default(&mut self, pid: &mut PidPlus, event: &mut dyn AnyEvent) -> HookResult {
        self.record(pid, &*event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_records_attachment_then_initial_seeding() {
        let history = PidHistory::new(1000);
        let _pid = PidPlus::new(0.0, 0.0, 0.0, history.clone()).unwrap();

        let rendered: Vec<String> = history.events().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Attached()".to_string(),
                "InitialConditions(setpoint=0, pv=0)".to_string(),
            ]
        );
    }

    #[test]
    fn a_tick_records_the_three_stages() {
        let history = PidHistory::unbounded();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        history.clear();
        pid.pid(0.0, Some(1.0)).unwrap();

        let kinds: Vec<EventKind> = history.events().iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::BaseTerms,
                EventKind::ModifyTerms,
                EventKind::CalculateU
            ]
        );
    }

    #[test]
    fn capacity_evicts_the_oldest_entries() {
        let history = PidHistory::new(2);
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();

        assert_eq!(history.len(), 2);
        let kinds: Vec<EventKind> = history.events().iter().map(Event::kind).collect();
        // Only the newest two survive.
        assert_eq!(kinds, vec![EventKind::ModifyTerms, EventKind::CalculateU]);
    }

    #[test]
    fn counters_survive_eviction() {
        let history = PidHistory::new(1);
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();

        let counts = history.event_counts();
        assert_eq!(counts.get(&EventKind::Attached), Some(&1));
        assert_eq!(counts.get(&EventKind::InitialConditions), Some(&1));
        assert_eq!(counts.get(&EventKind::BaseTerms), Some(&2));
        assert_eq!(counts.get(&EventKind::CalculateU), Some(&2));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn detail_mode_snapshots_controller_state() {
        let history = PidHistory::unbounded().with_detail();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.set_setpoint(4.0).unwrap();
        history.clear();
        pid.pid(1.0, Some(1.0)).unwrap();

        let entries = history.entries();
        assert!(!entries.is_empty());
        for entry in &entries {
            let state = entry.state.as_ref().expect("detail snapshot missing");
            assert_eq!(state.setpoint, 4.0);
            assert_eq!(state.pv, 1.0);
        }
    }

    #[test]
    fn plain_mode_has_no_snapshots() {
        let history = PidHistory::unbounded();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        assert!(history.entries().iter().all(|entry| entry.state.is_none()));
    }

    #[test]
    fn export_json_is_a_well_formed_array() {
        let history = PidHistory::unbounded();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();

        let json = history.export_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let array = value.as_array().expect("expected a JSON array");
        assert_eq!(array.len(), history.len());
    }

    #[test]
    fn clear_drops_entries_and_counters() {
        let history = PidHistory::unbounded();
        let mut pid = PidPlus::new(1.0, 0.0, 0.0, history.clone()).unwrap();
        pid.pid(0.0, Some(1.0)).unwrap();
        history.clear();
        assert!(history.is_empty());
        assert!(history.event_counts().is_empty());
    }

    #[test]
    fn second_attachment_is_rejected() {
        let history = PidHistory::new(10);
        let _first = PidPlus::new(0.0, 0.0, 0.0, history.clone()).unwrap();
        assert!(matches!(
            PidPlus::new(0.0, 0.0, 0.0, history),
            Err(PidError::AlreadyAttached { .. })
        ));
    }
}
