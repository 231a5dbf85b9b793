//! Per-run and cross-run statistics archive.
//!
//! Grounded on `examples/original_source/src/lib/core/History.{hpp,cpp}`
//! and the `Stat` enum in `examples/original_source/src/lib/aux/Enum.hpp`
//! (`SuccessRate`, `Generations`, `Evaluations`, `Species`, `Nets`,
//! `Layers`, `Nodes`, `Links`). The original keys a
//! `hmap<uint, hmap<Stat, Record>>` by run index and tabulates via a
//! custom `dlog` formatter; here a `Vec` of per-run maps plus a `Display`
//! impl cover the same ground idiomatically.

use std::collections::HashMap;
use std::fmt;

use evo_core::{SimpleStat, Statistics};

/// Variables tracked once per run by [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    /// Fraction of runs that solved the task.
    SuccessRate,
    /// Epochs elapsed before the run ended.
    Generations,
    /// Network evaluations performed during the run.
    Evaluations,
    /// Species count at the end of the run.
    Species,
    /// Network count at the end of the run.
    Nets,
    /// Mean layer count per network.
    Layers,
    /// Mean node count per network.
    Nodes,
    /// Mean link count per network.
    Links,
}

impl Stat {
    fn label(self) -> &'static str {
        match self {
            Stat::SuccessRate => "Success rate",
            Stat::Generations => "Generations",
            Stat::Evaluations => "Evaluations",
            Stat::Species => "Species",
            Stat::Nets => "Networks",
            Stat::Layers => "Layers",
            Stat::Nodes => "Nodes",
            Stat::Links => "Links",
        }
    }

    /// Every tracked variable, in report order.
    pub const ALL: [Stat; 8] = [
        Stat::SuccessRate,
        Stat::Generations,
        Stat::Evaluations,
        Stat::Species,
        Stat::Nets,
        Stat::Layers,
        Stat::Nodes,
        Stat::Links,
    ];
}

/// One run's worth of per-epoch values for a single [`Stat`].
#[derive(Debug, Clone, Default)]
struct Record {
    stats: SimpleStat,
    archive: Vec<f64>,
}

impl Record {
    fn add(&mut self, value: f64) {
        self.archive.push(value);
        self.stats.update(value);
    }
}

/// Archive of per-run statistics across a whole task
/// (`conf.task.runs` repetitions), closed into global mean/SD once the
/// task finishes.
#[derive(Debug, Default)]
pub struct History {
    closed: bool,
    global: HashMap<Stat, SimpleStat>,
    runs: Vec<HashMap<Stat, Record>>,
}

impl History {
    /// A fresh, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run's record. A no-op once `close` has been called.
    pub fn new_run(&mut self) {
        if !self.closed {
            self.runs.push(HashMap::new());
        }
    }

    /// Record one value for `stat` in the current run.
    pub fn add(&mut self, stat: Stat, value: f64) {
        if self.closed {
            return;
        }
        if let Some(run) = self.runs.last_mut() {
            run.entry(stat).or_default().add(value);
        }
    }

    /// Fold each run's last recorded value per stat into the global
    /// statistics, and freeze the history against further `add`/`new_run`
    /// calls.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for run in &self.runs {
            for (stat, record) in run {
                if let Some(&last) = record.archive.last() {
                    self.global.entry(*stat).or_default().update(last);
                }
            }
        }
        self.closed = true;
    }

    /// Number of runs recorded so far.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Global mean/SD for `stat`, once `close` has folded it in.
    pub fn summary(&self, stat: Stat) -> Option<(f64, f64)> {
        self.global.get(&stat).map(|s| (s.mean(), s.sd()))
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!(
            "--------------------[ Task statistics ({} run{}) ]--------------------",
            self.runs.len(),
            if self.runs.len() == 1 { "" } else { "s" }
        );
        writeln!(f, "{header}")?;
        writeln!(f, "{:<22}| {:>12}| {:>12}", "Variable", "Mean", "SD")?;
        writeln!(f, "{}", "-".repeat(header.len()))?;
        for stat in Stat::ALL {
            if let Some(tracker) = self.global.get(&stat) {
                writeln!(
                    f,
                    "{:<22}| {:>12.4}| {:>12.4}",
                    stat.label(),
                    tracker.mean(),
                    tracker.sd()
                )?;
            }
        }
        write!(f, "{}", "-".repeat(header.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_folds_last_value_per_run_into_global_stats() {
        let mut h = History::new();
        h.new_run();
        h.add(Stat::Nets, 10.0);
        h.add(Stat::Nets, 12.0);
        h.new_run();
        h.add(Stat::Nets, 8.0);
        h.close();
        let (mean, _) = h.summary(Stat::Nets).unwrap();
        assert!((mean - 10.0).abs() < 1e-9);
    }

    #[test]
    fn add_after_close_is_a_no_op() {
        let mut h = History::new();
        h.new_run();
        h.add(Stat::Evaluations, 5.0);
        h.close();
        h.add(Stat::Evaluations, 999.0);
        h.new_run();
        assert_eq!(h.run_count(), 1);
    }

    #[test]
    fn display_includes_every_tracked_variable() {
        let mut h = History::new();
        h.new_run();
        h.add(Stat::SuccessRate, 1.0);
        h.close();
        let rendered = format!("{h}");
        assert!(rendered.contains("Success rate"));
    }
}
