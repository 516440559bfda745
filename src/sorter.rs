//! In-place, stable bubble sort with early exit.
//!
//! Every entry point drives the same [`Passes`] state machine, so the plain
//! sort, the sink-instrumented sort and the lazy trace cannot disagree about
//! which pairs get compared or swapped.

use std::cmp::Ordering;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::error::SortError;
use crate::trace::{NoTrace, SortEvent, TraceSink};

/// Counters collected while sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortStats {
    pub passes: usize,
    pub comparisons: usize,
    pub swaps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Scanning,
    Done,
}

/// Step-wise bubble sort over a borrowed slice.
///
/// Each call to [`Passes::step`] performs at most one comparison and reports
/// what happened as a [`SortEvent`].
pub(crate) struct Passes<'a, T> {
    data: &'a mut [T],
    pass: usize,
    index: usize,
    pass_swaps: usize,
    phase: Phase,
    stats: SortStats,
}

impl<'a, T> Passes<'a, T> {
    pub(crate) fn new(data: &'a mut [T]) -> Self {
        Self {
            data,
            pass: 0,
            index: 0,
            pass_swaps: 0,
            phase: Phase::Idle,
            stats: SortStats::default(),
        }
    }

    pub(crate) fn data(&self) -> &[T] {
        &self.data[..]
    }

    pub(crate) fn stats(&self) -> SortStats {
        self.stats
    }

    /// Left index of the pair the next comparison will look at.
    pub(crate) fn cursor(&self) -> usize {
        self.index
    }

    /// Advances the sort by one event. `greater(a, b)` must be a strict
    /// greater-than test; ties never swap, which keeps the sort stable.
    ///
    /// Returns `Ok(None)` once the slice is sorted. A comparator error stops
    /// the run for good, leaving the slice a permutation of its input.
    pub(crate) fn step<E, F>(&mut self, greater: &mut F) -> Result<Option<SortEvent>, E>
    where
        F: FnMut(&T, &T) -> Result<bool, E>,
    {
        let len = self.data.len();
        match self.phase {
            Phase::Done => Ok(None),
            Phase::Idle => {
                if self.pass + 1 >= len {
                    self.phase = Phase::Done;
                    return Ok(None);
                }
                self.phase = Phase::Scanning;
                self.index = 0;
                self.pass_swaps = 0;
                self.stats.passes += 1;
                Ok(Some(SortEvent::PassStarted { pass: self.pass }))
            }
            Phase::Scanning => {
                // The last `pass` elements already hold their final values.
                let boundary = len - 1 - self.pass;
                if self.index < boundary {
                    let index = self.index;
                    let swapped = match greater(&self.data[index], &self.data[index + 1]) {
                        Ok(out_of_order) => out_of_order,
                        Err(err) => {
                            self.phase = Phase::Done;
                            return Err(err);
                        }
                    };
                    self.stats.comparisons += 1;
                    if swapped {
                        self.data.swap(index, index + 1);
                        self.pass_swaps += 1;
                        self.stats.swaps += 1;
                    }
                    self.index += 1;
                    return Ok(Some(SortEvent::Compared {
                        pass: self.pass,
                        index,
                        swapped,
                    }));
                }

                let pass = self.pass;
                let sorted = self.pass_swaps == 0;
                self.pass += 1;
                self.phase = if sorted { Phase::Done } else { Phase::Idle };
                Ok(Some(SortEvent::PassFinished {
                    pass,
                    swaps: self.pass_swaps,
                    sorted,
                }))
            }
        }
    }
}

fn drive<T, E, F, S>(passes: &mut Passes<'_, T>, greater: &mut F, sink: &mut S) -> Result<(), E>
where
    F: FnMut(&T, &T) -> Result<bool, E>,
    S: TraceSink + ?Sized,
{
    while let Some(event) = passes.step(greater)? {
        sink.record(&event);
    }
    Ok(())
}

fn infallible(result: Result<SortStats, Infallible>) -> SortStats {
    match result {
        Ok(stats) => stats,
        Err(never) => match never {},
    }
}

/// Generic engine behind every other entry point: sorts `data` using the
/// strict greater-than test `greater`, reporting each step to `sink`.
pub fn try_sort_with<T, E, F, S>(
    data: &mut [T],
    mut greater: F,
    sink: &mut S,
) -> Result<SortStats, E>
where
    F: FnMut(&T, &T) -> Result<bool, E>,
    S: TraceSink + ?Sized,
{
    let mut passes = Passes::new(data);
    drive(&mut passes, &mut greater, sink)?;
    Ok(passes.stats())
}

/// Sorts `data` in place in non-decreasing order.
///
/// ```
/// let mut values = [64, 34, 25, 12, 22, 11, 90];
/// let stats = bubble_tutor::bubble_sort(&mut values);
/// assert_eq!(values, [11, 12, 22, 25, 34, 64, 90]);
/// assert_eq!(stats.swaps, 14);
/// ```
pub fn bubble_sort<T: Ord>(data: &mut [T]) -> SortStats {
    bubble_sort_with(data, &mut NoTrace)
}

/// Like [`bubble_sort`], reporting every step to `sink`.
pub fn bubble_sort_with<T: Ord, S: TraceSink + ?Sized>(
    data: &mut [T],
    sink: &mut S,
) -> SortStats {
    infallible(try_sort_with(data, |a: &T, b: &T| Ok(a > b), sink))
}

/// Sorts `data` and hands it back, for chaining.
pub fn sorted<T: Ord>(data: &mut [T]) -> &mut [T] {
    bubble_sort(data);
    data
}

/// Sorts `data` with a total-order comparator; `Equal` never swaps.
pub fn bubble_sort_by<T, F>(data: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    infallible(try_sort_with(
        data,
        |a: &T, b: &T| Ok(compare(a, b) == Ordering::Greater),
        &mut NoTrace,
    ))
}

/// Sorts `data` by the key `key` extracts, keeping equal keys in input order.
pub fn bubble_sort_by_key<T, K, F>(data: &mut [T], mut key: F) -> SortStats
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    bubble_sort_by(data, |a, b| key(a).cmp(&key(b)))
}

/// Sorts partially ordered values, failing on the first pair that cannot
/// be ordered.
///
/// ```
/// use bubble_tutor::{try_bubble_sort, SortError};
///
/// let mut values = [2.5, f64::NAN, 1.0];
/// assert_eq!(
///     try_bubble_sort(&mut values),
///     Err(SortError::IncomparableElements { index: 0 })
/// );
/// ```
pub fn try_bubble_sort<T: PartialOrd>(data: &mut [T]) -> Result<SortStats, SortError> {
    try_bubble_sort_with(data, &mut NoTrace)
}

/// Like [`try_bubble_sort`], reporting every step to `sink`.
pub fn try_bubble_sort_with<T, S>(data: &mut [T], sink: &mut S) -> Result<SortStats, SortError>
where
    T: PartialOrd,
    S: TraceSink + ?Sized,
{
    try_bubble_sort_by_with(data, |a: &T, b: &T| a.partial_cmp(b), sink)
}

/// Sorts with a comparator that returns `None` for pairs it cannot order.
pub fn try_bubble_sort_by<T, F>(data: &mut [T], compare: F) -> Result<SortStats, SortError>
where
    F: FnMut(&T, &T) -> Option<Ordering>,
{
    try_bubble_sort_by_with(data, compare, &mut NoTrace)
}

/// Marker for a pair the comparator could not order.
pub(crate) struct Incomparable;

/// Like [`try_bubble_sort_by`], reporting every step to `sink`. Events stop
/// before the pair that could not be ordered.
pub fn try_bubble_sort_by_with<T, F, S>(
    data: &mut [T],
    mut compare: F,
    sink: &mut S,
) -> Result<SortStats, SortError>
where
    F: FnMut(&T, &T) -> Option<Ordering>,
    S: TraceSink + ?Sized,
{
    let mut greater = |a: &T, b: &T| match compare(a, b) {
        Some(ordering) => Ok(ordering == Ordering::Greater),
        None => Err(Incomparable),
    };
    let mut passes = Passes::new(data);
    match drive(&mut passes, &mut greater, sink) {
        Ok(()) => Ok(passes.stats()),
        Err(Incomparable) => Err(SortError::IncomparableElements {
            index: passes.cursor(),
        }),
    }
}
