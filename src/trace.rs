use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{self, Debug};
use std::iter::FusedIterator;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::SortError;
use crate::sorter::{Incomparable, Passes, SortStats};

/// A single step of a sort run. Passes are numbered from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SortEvent {
    PassStarted {
        pass: usize,
    },
    /// The pair at `index` and `index + 1` was compared.
    Compared {
        pass: usize,
        index: usize,
        swapped: bool,
    },
    /// `sorted` is set when the pass made no swaps, which ends the run.
    PassFinished {
        pass: usize,
        swaps: usize,
        sorted: bool,
    },
}

impl SortEvent {
    pub fn pass(&self) -> usize {
        match *self {
            Self::PassStarted { pass }
            | Self::Compared { pass, .. }
            | Self::PassFinished { pass, .. } => pass,
        }
    }
}

impl fmt::Display for SortEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PassStarted { pass } => write!(f, "pass {} started", pass + 1),
            Self::Compared {
                pass,
                index,
                swapped,
            } => write!(
                f,
                "pass {}: compared positions {} and {}, {}",
                pass + 1,
                index,
                index + 1,
                if swapped { "swapped" } else { "kept" }
            ),
            Self::PassFinished {
                pass,
                swaps,
                sorted,
            } => {
                write!(f, "pass {} finished with {} swaps", pass + 1, swaps)?;
                if sorted {
                    write!(f, ", sorted")?;
                }
                Ok(())
            }
        }
    }
}

/// Receives every [`SortEvent`] of an eager sort run.
pub trait TraceSink {
    fn record(&mut self, event: &SortEvent);
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    #[inline]
    fn record(&mut self, _event: &SortEvent) {}
}

impl<F> TraceSink for F
where
    F: FnMut(&SortEvent),
{
    fn record(&mut self, event: &SortEvent) {
        self(event)
    }
}

/// Collects events in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<SortEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SortEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SortEvent> {
        self.events
    }

    pub fn passes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SortEvent::PassStarted { .. }))
            .count()
    }

    pub fn comparisons(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SortEvent::Compared { .. }))
            .count()
    }

    pub fn swaps(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SortEvent::Compared { swapped: true, .. }))
            .count()
    }
}

impl TraceSink for EventLog {
    fn record(&mut self, event: &SortEvent) {
        self.events.push(*event);
    }
}

/// Forwards events to `tracing`: comparisons at TRACE, pass boundaries at
/// DEBUG.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&mut self, event: &SortEvent) {
        match *event {
            SortEvent::PassStarted { pass } => debug!(pass, "pass started"),
            SortEvent::Compared {
                pass,
                index,
                swapped,
            } => trace!(pass, index, swapped, "compared adjacent pair"),
            SortEvent::PassFinished {
                pass,
                swaps,
                sorted,
            } => debug!(pass, swaps, sorted, "pass finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    Initial,
    Step(SortEvent),
    Final(SortStats),
}

/// One human-readable line of a [`SortTrace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub kind: TraceKind,
    pub message: String,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Initial,
    Running,
    Finished,
}

struct Tracer<'a, T> {
    passes: Passes<'a, T>,
    stage: Stage,
}

impl<'a, T: Debug> Tracer<'a, T> {
    fn new(data: &'a mut [T]) -> Self {
        Self {
            passes: Passes::new(data),
            stage: Stage::Initial,
        }
    }

    fn advance<E, F>(&mut self, greater: &mut F) -> Result<Option<TraceRecord>, E>
    where
        F: FnMut(&T, &T) -> Result<bool, E>,
    {
        match self.stage {
            Stage::Initial => {
                self.stage = Stage::Running;
                Ok(Some(TraceRecord {
                    kind: TraceKind::Initial,
                    message: format!("Initial array: {:?}", self.passes.data()),
                }))
            }
            Stage::Running => match self.passes.step(greater) {
                Ok(Some(event)) => Ok(Some(TraceRecord {
                    kind: TraceKind::Step(event),
                    message: render(self.passes.data(), event),
                })),
                Ok(None) => {
                    self.stage = Stage::Finished;
                    Ok(Some(TraceRecord {
                        kind: TraceKind::Final(self.passes.stats()),
                        message: format!("Final sorted array: {:?}", self.passes.data()),
                    }))
                }
                Err(err) => {
                    self.stage = Stage::Finished;
                    Err(err)
                }
            },
            Stage::Finished => Ok(None),
        }
    }
}

impl<'a, T: Debug> Debug for Tracer<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("data", &self.passes.data())
            .field("stage", &self.stage)
            .field("stats", &self.passes.stats())
            .finish()
    }
}

fn render<T: Debug>(data: &[T], event: SortEvent) -> String {
    match event {
        SortEvent::PassStarted { pass } => format!("Pass {}:", pass + 1),
        SortEvent::Compared {
            index,
            swapped: true,
            ..
        } => format!(
            "  Comparing {:?} and {:?}: swapped! Array: {:?}",
            data[index + 1],
            data[index],
            data
        ),
        SortEvent::Compared {
            index,
            swapped: false,
            ..
        } => format!(
            "  Comparing {:?} and {:?}: no swap needed",
            data[index],
            data[index + 1]
        ),
        SortEvent::PassFinished { sorted: true, .. } => {
            "  No swaps in this pass - array is sorted!".to_string()
        }
        SortEvent::PassFinished { pass, .. } => {
            format!("  End of pass {}: {:?}", pass + 1, data)
        }
    }
}

/// Lazy step-by-step trace of a bubble sort.
///
/// Each call to `next` advances the sort by at most one comparison, so
/// dropping the trace early leaves the slice partially sorted. Once the
/// final record is produced the trace is exhausted for good.
#[derive(Debug)]
pub struct SortTrace<'a, T> {
    tracer: Tracer<'a, T>,
}

/// Starts a lazy, step-by-step sort of `data`.
///
/// ```
/// let mut values = [3, 1, 2];
/// let lines: Vec<String> = bubble_tutor::trace_sort(&mut values)
///     .map(|record| record.to_string())
///     .collect();
/// assert_eq!(lines.first().map(String::as_str), Some("Initial array: [3, 1, 2]"));
/// assert_eq!(lines.last().map(String::as_str), Some("Final sorted array: [1, 2, 3]"));
/// ```
pub fn trace_sort<T: Ord + Debug>(data: &mut [T]) -> SortTrace<'_, T> {
    SortTrace {
        tracer: Tracer::new(data),
    }
}

impl<'a, T: Ord + Debug> SortTrace<'a, T> {
    /// Counters for the steps taken so far.
    pub fn stats(&self) -> SortStats {
        self.tracer.passes.stats()
    }

    pub fn is_finished(&self) -> bool {
        self.tracer.stage == Stage::Finished
    }
}

impl<'a, T: Ord + Debug> Iterator for SortTrace<'a, T> {
    type Item = TraceRecord;

    fn next(&mut self) -> Option<TraceRecord> {
        let mut greater = |a: &T, b: &T| Ok::<bool, Infallible>(a > b);
        match self.tracer.advance(&mut greater) {
            Ok(record) => record,
            Err(never) => match never {},
        }
    }
}

impl<'a, T: Ord + Debug> FusedIterator for SortTrace<'a, T> {}

/// Lazy trace over partially ordered values.
///
/// Yields the same records as [`SortTrace`]. If a pair cannot be ordered,
/// the error is the last item and no `Final` record follows.
#[derive(Debug)]
pub struct TrySortTrace<'a, T> {
    tracer: Tracer<'a, T>,
}

/// Starts a lazy, step-by-step sort of partially ordered `data`.
///
/// ```
/// use bubble_tutor::{try_trace_sort, SortError};
///
/// let mut values = [1.5, f64::NAN];
/// let last = try_trace_sort(&mut values).last();
/// assert_eq!(last, Some(Err(SortError::IncomparableElements { index: 0 })));
/// ```
pub fn try_trace_sort<T: PartialOrd + Debug>(data: &mut [T]) -> TrySortTrace<'_, T> {
    TrySortTrace {
        tracer: Tracer::new(data),
    }
}

impl<'a, T: PartialOrd + Debug> TrySortTrace<'a, T> {
    /// Counters for the steps taken so far.
    pub fn stats(&self) -> SortStats {
        self.tracer.passes.stats()
    }

    pub fn is_finished(&self) -> bool {
        self.tracer.stage == Stage::Finished
    }
}

impl<'a, T: PartialOrd + Debug> Iterator for TrySortTrace<'a, T> {
    type Item = Result<TraceRecord, SortError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut greater = |a: &T, b: &T| match a.partial_cmp(b) {
            Some(ordering) => Ok(ordering == Ordering::Greater),
            None => Err(Incomparable),
        };
        match self.tracer.advance(&mut greater) {
            Ok(record) => record.map(Ok),
            Err(Incomparable) => Some(Err(SortError::IncomparableElements {
                index: self.tracer.passes.cursor(),
            })),
        }
    }
}

impl<'a, T: PartialOrd + Debug> FusedIterator for TrySortTrace<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorter::{bubble_sort, bubble_sort_with};

    #[test]
    fn full_trace_matches_plain_sort() {
        let input = [64, 34, 25, 12, 22, 11, 90];

        let mut plain = input;
        let expected = bubble_sort(&mut plain);

        let mut traced = input;
        let mut trace = trace_sort(&mut traced);
        let records: Vec<_> = trace.by_ref().collect();
        assert_eq!(trace.stats(), expected);
        assert!(trace.is_finished());
        drop(trace);

        assert_eq!(traced, plain);
        // Initial and final records bracket one record per comparison and
        // two per pass.
        assert_eq!(
            records.len(),
            2 + expected.comparisons + 2 * expected.passes
        );
        assert_eq!(records[0].kind, TraceKind::Initial);
        assert_eq!(
            records.last().map(|r| &r.kind),
            Some(&TraceKind::Final(expected))
        );
    }

    #[test]
    fn trace_and_sink_see_the_same_events() {
        let mut a = [5, 1, 4, 2, 8];
        let mut b = a;

        let mut log = EventLog::new();
        bubble_sort_with(&mut a, &mut log);

        let steps: Vec<SortEvent> = trace_sort(&mut b)
            .filter_map(|record| match record.kind {
                TraceKind::Step(event) => Some(event),
                _ => None,
            })
            .collect();

        assert_eq!(log.into_events(), steps);
    }

    #[test]
    fn messages_follow_the_lesson_format() {
        let mut values = [2, 1, 3];
        let lines: Vec<String> = trace_sort(&mut values).map(|r| r.to_string()).collect();
        assert_eq!(
            lines,
            [
                "Initial array: [2, 1, 3]",
                "Pass 1:",
                "  Comparing 2 and 1: swapped! Array: [1, 2, 3]",
                "  Comparing 2 and 3: no swap needed",
                "  End of pass 1: [1, 2, 3]",
                "Pass 2:",
                "  Comparing 1 and 2: no swap needed",
                "  No swaps in this pass - array is sorted!",
                "Final sorted array: [1, 2, 3]",
            ]
        );
    }

    #[test]
    fn trace_is_lazy() {
        let mut values = [3, 2, 1];
        {
            let mut trace = trace_sort(&mut values);
            // Initial, pass start, first comparison.
            for _ in 0..3 {
                trace.next();
            }
        }
        assert_eq!(values, [2, 3, 1]);
    }

    #[test]
    fn trace_cannot_restart() {
        let mut values: [u8; 0] = [];
        let mut trace = trace_sort(&mut values);
        assert_eq!(trace.next().map(|r| r.kind), Some(TraceKind::Initial));
        assert_eq!(
            trace.next().map(|r| r.kind),
            Some(TraceKind::Final(SortStats::default()))
        );
        assert!(trace.next().is_none());
        assert!(trace.next().is_none());
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        let mut values = [3, 2, 1];
        bubble_sort_with(&mut values, &mut |event: &SortEvent| seen.push(event.pass()));
        // Two passes of start, comparisons and finish; the second pass is
        // the last one a three-element slice can need.
        assert_eq!(seen, [0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn tracing_sink_does_not_change_the_outcome() {
        let mut values = [3, 1, 4, 1, 5, 9, 2, 6, 5];
        bubble_sort_with(&mut values, &mut TracingSink);
        assert_eq!(values, [1, 1, 2, 3, 4, 5, 5, 6, 9]);
    }

    #[test]
    fn events_render_one_based_passes() {
        let event = SortEvent::Compared {
            pass: 0,
            index: 2,
            swapped: true,
        };
        assert_eq!(event.to_string(), "pass 1: compared positions 2 and 3, swapped");
        let finished = SortEvent::PassFinished {
            pass: 3,
            swaps: 0,
            sorted: true,
        };
        assert_eq!(finished.to_string(), "pass 4 finished with 0 swaps, sorted");
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let json = serde_json::to_value(SortEvent::PassStarted { pass: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "pass_started", "pass": 2 }));
    }

    #[test]
    fn fallible_trace_renders_values_like_the_ordered_trace() {
        let mut floats = [3.0, 1.0, 2.0];
        let lines: Vec<String> = try_trace_sort(&mut floats)
            .map(|record| record.unwrap().to_string())
            .collect();
        assert_eq!(
            lines,
            [
                "Initial array: [3.0, 1.0, 2.0]",
                "Pass 1:",
                "  Comparing 3.0 and 1.0: swapped! Array: [1.0, 3.0, 2.0]",
                "  Comparing 3.0 and 2.0: swapped! Array: [1.0, 2.0, 3.0]",
                "  End of pass 1: [1.0, 2.0, 3.0]",
                "Pass 2:",
                "  Comparing 1.0 and 2.0: no swap needed",
                "  No swaps in this pass - array is sorted!",
                "Final sorted array: [1.0, 2.0, 3.0]",
            ]
        );
        assert_eq!(floats, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn fallible_trace_matches_the_ordered_trace_for_integers() {
        let mut a = [5, 1, 4, 2, 8];
        let mut b = a;
        let ordered: Vec<TraceRecord> = trace_sort(&mut a).collect();
        let fallible: Vec<TraceRecord> = try_trace_sort(&mut b)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ordered, fallible);
    }

    #[test]
    fn fallible_trace_ends_at_the_incomparable_pair() {
        let mut values = [1.0, 2.0, f64::NAN, 0.0];
        let mut trace = try_trace_sort(&mut values);
        let kinds: Vec<_> = trace
            .by_ref()
            .map(|item| item.map(|record| record.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                Ok(TraceKind::Initial),
                Ok(TraceKind::Step(SortEvent::PassStarted { pass: 0 })),
                Ok(TraceKind::Step(SortEvent::Compared {
                    pass: 0,
                    index: 0,
                    swapped: false,
                })),
                Err(SortError::IncomparableElements { index: 1 }),
            ]
        );
        assert!(trace.is_finished());
        assert!(trace.next().is_none());
        assert_eq!(trace.stats().comparisons, 1);
    }
}
