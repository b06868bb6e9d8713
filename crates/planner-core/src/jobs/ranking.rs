//! Scoring strategies for live jobs.
//!
//! A strategy maps the live jobs to one score each; the store sorts by that
//! score, descending and stable. Finished jobs never reach a strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Job;
use crate::storage::RankingConfig;

/// Score given to the only live job when `single_job_max` is on.
pub const SOLO_SCORE: f64 = 10.0;

/// Upper bound of the relative scales.
const SCALE: f64 = 10.0;

pub trait RankingStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// One score per job, in input order.
    fn score(&self, live: &[&Job]) -> Vec<f64>;
}

/// Selectable strategies, as written in `config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Priority,
    RelativePriority,
    DeadlineWeighted,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Priority => "priority",
            StrategyKind::RelativePriority => "relative_priority",
            StrategyKind::DeadlineWeighted => "deadline_weighted",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(StrategyKind::Priority),
            "relative_priority" => Ok(StrategyKind::RelativePriority),
            "deadline_weighted" => Ok(StrategyKind::DeadlineWeighted),
            other => Err(format!(
                "unknown strategy '{other}' (expected priority, relative_priority or deadline_weighted)"
            )),
        }
    }
}

fn priority_of(job: &Job) -> i64 {
    job.priority().unwrap_or_default()
}

/// Score is the raw user priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScore;

impl RankingStrategy for PriorityScore {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn score(&self, live: &[&Job]) -> Vec<f64> {
        live.iter().map(|job| priority_of(job) as f64).collect()
    }
}

/// Priority rescaled onto 0..=10 across the live jobs. When every priority
/// is equal each job scores the truncated mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativePriority;

impl RankingStrategy for RelativePriority {
    fn name(&self) -> &'static str {
        "relative_priority"
    }

    fn score(&self, live: &[&Job]) -> Vec<f64> {
        relative_priorities(live)
    }
}

pub fn relative_priorities(live: &[&Job]) -> Vec<f64> {
    let priorities: Vec<i64> = live.iter().map(|job| priority_of(job)).collect();
    let (Some(&min), Some(&max)) = (priorities.iter().min(), priorities.iter().max()) else {
        return Vec::new();
    };
    if min == max {
        let mean = priorities.iter().sum::<i64>() as f64 / priorities.len() as f64;
        return vec![mean.trunc(); priorities.len()];
    }
    let span = (max - min) as f64;
    priorities
        .iter()
        .map(|&p| SCALE * (p - min) as f64 / span)
        .collect()
}

/// Weighted sum of relative priority and relative deadline, rounded to one
/// decimal. Jobs are laid out by deadline, longest first, so the job due
/// soonest gets the full deadline weight.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineWeighted {
    pub priority_weight: f64,
    pub deadline_weight: f64,
}

impl Default for DeadlineWeighted {
    fn default() -> Self {
        Self {
            priority_weight: 0.5,
            deadline_weight: 0.5,
        }
    }
}

impl RankingStrategy for DeadlineWeighted {
    fn name(&self) -> &'static str {
        "deadline_weighted"
    }

    fn score(&self, live: &[&Job]) -> Vec<f64> {
        let n = live.len();
        let relative = relative_priorities(live);

        // Ties on deadline fall back to name so the layout does not depend
        // on the current order.
        let mut by_deadline: Vec<usize> = (0..n).collect();
        by_deadline.sort_by(|&a, &b| {
            live[b]
                .deadline()
                .cmp(&live[a].deadline())
                .then_with(|| live[a].name().cmp(live[b].name()))
        });

        let mut scores = vec![0.0; n];
        for (position, &index) in by_deadline.iter().enumerate() {
            let relative_deadline = SCALE * (position + 1) as f64 / n as f64;
            let value =
                self.priority_weight * relative[index] + self.deadline_weight * relative_deadline;
            scores[index] = (value * 10.0).round() / 10.0;
        }
        scores
    }
}

/// Gives a lone live job the maximum score regardless of its priority.
#[derive(Debug)]
pub struct SoloMaximum<S> {
    inner: S,
}

impl<S: RankingStrategy> SoloMaximum<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: RankingStrategy> RankingStrategy for SoloMaximum<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn score(&self, live: &[&Job]) -> Vec<f64> {
        if live.len() == 1 {
            return vec![SOLO_SCORE];
        }
        self.inner.score(live)
    }
}

impl RankingStrategy for Box<dyn RankingStrategy> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn score(&self, live: &[&Job]) -> Vec<f64> {
        self.as_ref().score(live)
    }
}

/// Build the strategy selected in the `[ranking]` config section.
pub fn from_config(config: &RankingConfig) -> Box<dyn RankingStrategy> {
    let base: Box<dyn RankingStrategy> = match config.strategy {
        StrategyKind::Priority => Box::new(PriorityScore),
        StrategyKind::RelativePriority => Box::new(RelativePriority),
        StrategyKind::DeadlineWeighted => Box::new(DeadlineWeighted {
            priority_weight: config.priority_weight,
            deadline_weight: config.deadline_weight,
        }),
    };
    if config.single_job_max {
        Box::new(SoloMaximum::new(base))
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{SessionTotals, Task};
    use chrono::{TimeZone, Utc};

    fn task(name: &str, priority: i64, deadline: u64) -> Job {
        Job::Task(Task {
            name: name.into(),
            priority,
            deadline,
            duration: 30,
            rank: 0,
            value: 0.0,
            creation: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            done: false,
            totals: SessionTotals::default(),
        })
    }

    #[test]
    fn priority_is_the_raw_value() {
        let jobs = [task("a", 1, 60), task("b", 9, 60)];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(PriorityScore.score(&refs), vec![1.0, 9.0]);
    }

    #[test]
    fn relative_priority_spans_zero_to_ten() {
        let jobs = [task("a", 2, 60), task("b", 4, 60), task("c", 6, 60)];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(RelativePriority.score(&refs), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn equal_priorities_score_the_truncated_mean() {
        let jobs = [task("a", 3, 60), task("b", 3, 60)];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert_eq!(RelativePriority.score(&refs), vec![3.0, 3.0]);
    }

    #[test]
    fn sooner_deadline_scores_higher_at_equal_priority() {
        let jobs = [task("later", 5, 7200), task("sooner", 5, 600)];
        let refs: Vec<&Job> = jobs.iter().collect();
        let scores = DeadlineWeighted::default().score(&refs);
        // relative priority 5 for both; deadline positions 5.0 and 10.0
        assert_eq!(scores, vec![5.0, 7.5]);
    }

    #[test]
    fn solo_maximum_only_applies_to_a_lone_job() {
        let strategy = SoloMaximum::new(PriorityScore);
        let one = [task("a", -4, 60)];
        let refs: Vec<&Job> = one.iter().collect();
        assert_eq!(strategy.score(&refs), vec![SOLO_SCORE]);

        let two = [task("a", -4, 60), task("b", 2, 60)];
        let refs: Vec<&Job> = two.iter().collect();
        assert_eq!(strategy.score(&refs), vec![-4.0, 2.0]);
    }

    #[test]
    fn config_selects_strategy() {
        let config = RankingConfig {
            strategy: StrategyKind::DeadlineWeighted,
            single_job_max: true,
            ..RankingConfig::default()
        };
        let strategy = from_config(&config);
        assert_eq!(strategy.name(), "deadline_weighted");
        let one = [task("a", 1, 60)];
        let refs: Vec<&Job> = one.iter().collect();
        assert_eq!(strategy.score(&refs), vec![SOLO_SCORE]);
    }

    #[test]
    fn strategy_kind_parses_config_names() {
        assert_eq!(
            "relative_priority".parse::<StrategyKind>(),
            Ok(StrategyKind::RelativePriority)
        );
        assert!("fifo".parse::<StrategyKind>().is_err());
    }
}
