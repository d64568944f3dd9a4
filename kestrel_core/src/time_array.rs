// kestrel_core/src/time_array.rs

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use nalgebra::DVector;

use crate::error::{ObserverError, ObserverResult};
use crate::types::{TimeIndex, VectorKind};

/// A chronological, gap-free sequence of vectors keyed by time index.
///
/// Entries are stored back to back, so the entry for `k` lives at
/// `k - first_time`. The array remembers the index of the last value ever
/// appended, even after consumed entries have been dropped from the front,
/// which keeps the "no gaps" rule intact across eviction.
#[derive(Debug, Clone)]
pub struct DiscreteTimeArray {
    kind: VectorKind,
    first: TimeIndex,
    last_pushed: Option<TimeIndex>,
    values: VecDeque<DVector<f64>>,
}

impl DiscreteTimeArray {
    /// Creates an empty array. `kind` only labels the errors it produces.
    pub fn new(kind: VectorKind) -> Self {
        Self {
            kind,
            first: 0,
            last_pushed: None,
            values: VecDeque::new(),
        }
    }

    /// Appends `value` at time `k`.
    ///
    /// The first value may carry any index; every later one must be exactly
    /// one past the previous. Once `TimeIndex::MAX` has been appended nothing
    /// can follow it until the array is cleared. On error the array is left
    /// untouched.
    pub fn push_back(&mut self, value: DVector<f64>, k: TimeIndex) -> ObserverResult<()> {
        if let Some(last) = self.last_pushed {
            if last.checked_add(1) != Some(k) {
                return Err(ObserverError::Ordering {
                    kind: self.kind,
                    expected: last.saturating_add(1),
                    got: k,
                });
            }
        }

        // Either the very first value or the first one after the front was consumed.
        if self.values.is_empty() {
            self.first = k;
        }
        self.values.push_back(value);
        self.last_pushed = Some(k);
        Ok(())
    }

    /// The value stored at time `k`, if it is still buffered.
    pub fn get(&self, k: TimeIndex) -> Option<&DVector<f64>> {
        if k < self.first {
            return None;
        }
        let offset = usize::try_from(k - self.first).ok()?;
        self.values.get(offset)
    }

    /// Index of the oldest buffered value.
    pub fn first_time(&self) -> Option<TimeIndex> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.first)
        }
    }

    /// Index of the newest buffered value.
    pub fn last_time(&self) -> Option<TimeIndex> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.first + (self.values.len() - 1) as TimeIndex)
        }
    }

    /// Index of the last value ever appended since the last `clear`, whether
    /// or not it is still buffered.
    pub fn last_pushed(&self) -> Option<TimeIndex> {
        self.last_pushed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first index of `span` that has no buffered value, or `None` when
    /// the whole span is covered. An empty span is always covered.
    pub fn first_missing(&self, span: RangeInclusive<TimeIndex>) -> Option<TimeIndex> {
        if span.is_empty() {
            return None;
        }
        let (start, end) = span.into_inner();
        match (self.first_time(), self.last_time()) {
            (Some(first), Some(last)) => {
                if start < first {
                    Some(start)
                } else if end > last {
                    Some(start.max(last + 1))
                } else {
                    None
                }
            }
            _ => Some(start),
        }
    }

    /// Whether every index of `span` has a buffered value.
    pub fn contains_span(&self, span: RangeInclusive<TimeIndex>) -> bool {
        self.first_missing(span).is_none()
    }

    /// Drops every value with an index strictly below `k`.
    pub fn truncate_before(&mut self, k: TimeIndex) {
        while !self.values.is_empty() && self.first < k {
            self.values.pop_front();
            self.first += 1;
        }
    }

    /// Drops every value with an index at or below `k`.
    pub fn truncate_through(&mut self, k: TimeIndex) {
        match k.checked_add(1) {
            Some(next) => self.truncate_before(next),
            None => self.values.clear(),
        }
    }

    /// Empties the array and forgets its last index, so the next value may
    /// start anywhere.
    pub fn clear(&mut self) {
        self.values.clear();
        self.first = 0;
        self.last_pushed = None;
    }

    /// Iterates over `(k, value)` pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeIndex, &DVector<f64>)> + '_ {
        let first = self.first;
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (first + i as TimeIndex, v))
    }
}

impl std::ops::Index<TimeIndex> for DiscreteTimeArray {
    type Output = DVector<f64>;

    fn index(&self, k: TimeIndex) -> &Self::Output {
        match self.get(k) {
            Some(v) => v,
            None => panic!("no {} stored at time index {}", self.kind, k),
        }
    }
}
