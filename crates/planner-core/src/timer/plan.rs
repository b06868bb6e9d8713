use serde::{Deserialize, Serialize};

use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Focus,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub kind: IntervalKind,
    /// Duration in minutes.
    pub minutes: u32,
}

impl Interval {
    pub fn focus(minutes: u32) -> Self {
        Self {
            kind: IntervalKind::Focus,
            minutes,
        }
    }

    pub fn rest(minutes: u32) -> Self {
        Self {
            kind: IntervalKind::Rest,
            minutes,
        }
    }

    /// Get interval duration in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.minutes).saturating_mul(60)
    }
}

/// Ordered focus/rest spans for one session. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalPlan {
    intervals: Vec<Interval>,
}

impl IntervalPlan {
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn get(&self, idx: usize) -> Option<&Interval> {
        self.intervals.get(idx)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn total_minutes(&self) -> u32 {
        self.intervals.iter().map(|i| i.minutes).sum()
    }

    pub fn minutes_of(&self, kind: IntervalKind) -> u32 {
        self.intervals
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.minutes)
            .sum()
    }

    pub fn focus_count(&self) -> usize {
        self.intervals
            .iter()
            .filter(|i| i.kind == IntervalKind::Focus)
            .count()
    }

    /// Interleave a rest after every focus span, then strip zero-length
    /// spans and any rest left dangling at the end.
    fn interleave(focus_spans: impl IntoIterator<Item = u32>, rest: u32) -> Self {
        let mut intervals: Vec<Interval> = focus_spans
            .into_iter()
            .filter(|&m| m > 0)
            .flat_map(|m| [Interval::focus(m), Interval::rest(rest)])
            .filter(|i| i.minutes > 0)
            .collect();
        while intervals
            .last()
            .is_some_and(|i| i.kind == IntervalKind::Rest)
        {
            intervals.pop();
        }
        Self { intervals }
    }
}

impl<'a> IntoIterator for &'a IntervalPlan {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

/// Split `total_minutes` of work into focus spans of `settings.focused_time`
/// separated by rests of `settings.rest_time`.
///
/// The last focus span carries the remainder. Zero-length spans are dropped
/// and the plan never ends on a rest. A zero focus length puts the whole
/// duration into a single focus span.
pub fn build_plan(total_minutes: u32, settings: &Settings) -> IntervalPlan {
    let focus = settings.focused_time;
    if focus == 0 {
        return IntervalPlan::interleave([total_minutes], settings.rest_time);
    }
    let full = total_minutes / focus;
    let remainder = total_minutes % focus;
    let spans = std::iter::repeat(focus)
        .take(full as usize)
        .chain(std::iter::once(remainder));
    IntervalPlan::interleave(spans, settings.rest_time)
}

/// `repetitions` focus/rest pairs with the trailing rest removed.
pub fn build_repeated_plan(focus_minutes: u32, rest_minutes: u32, repetitions: u32) -> IntervalPlan {
    let spans = std::iter::repeat(focus_minutes).take(repetitions as usize);
    IntervalPlan::interleave(spans, rest_minutes)
}
