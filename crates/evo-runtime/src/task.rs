//! Task runner: drives `conf.task.runs` independent repetitions of the
//! evolutionary loop over a shared worker pool, recording per-run
//! statistics into a [`History`].
//!
//! Grounded on `examples/original_source/src/lib/cortex/Task.{hpp,cpp}`'s
//! `Task::setup`/`Task::execute`/`Task::is_solved`: a static mutex-guarded
//! "solved" flag that the first network to cross the final stage sets,
//! which also tells the thread pool to stop draining further work. Here
//! the flag is owned by the `Task` value itself rather than a class
//! static, since nothing in this workspace is global except the PRNG
//! (`evo_core::rng`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use evo_core::Network;

use crate::config::Config;
use crate::env::{Env, Evaluator};
use crate::error::{Result, RuntimeError};
use crate::history::{History, Stat};
use crate::pool::WorkerPool;

/// Outcome of a single `conf.task.runs` repetition.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// Whether any network crossed the final stage within the epoch cap.
    pub solved: bool,
    /// Epochs actually elapsed (`<= conf.task.epochs`).
    pub generations: u32,
    /// Network evaluations performed during this run.
    pub evaluations: u64,
}

/// Owns the worker pool and statistics archive across every run of one
/// experiment. Grounded on `Task::setup`'s one-time pool construction
/// reused across `Task::execute`'s per-run loop.
pub struct Task {
    conf: Config,
    pool: WorkerPool,
    history: History,
    last_champion: Option<Network>,
}

impl Task {
    /// Validate `conf` and build a task ready to execute. Fails with
    /// [`RuntimeError::Configuration`] carrying every failed check at
    /// once, per spec.md §7.
    pub fn new(conf: Config) -> Result<Self> {
        conf.validate().map_err(RuntimeError::configuration)?;
        let pool = WorkerPool::new(conf.task.threads.max(1));
        Ok(Self {
            conf,
            pool,
            history: History::new(),
            last_champion: None,
        })
    }

    /// Run `conf.task.runs` independent repetitions, each evaluated against
    /// `evaluator`. Returns the per-run outcomes; the task's [`History`] is
    /// closed (frozen, global mean/SD folded in) once every run completes.
    /// Grounded on `Task::execute`'s per-run loop:
    /// reset registries → `initialise()` → epoch loop → record stats.
    pub fn execute(&mut self, evaluator: Evaluator) -> Result<Vec<RunOutcome>> {
        let mut outcomes = Vec::with_capacity(self.conf.task.runs as usize);

        for run in 0..self.conf.task.runs {
            let outcome = self.execute_run(Arc::clone(&evaluator))?;
            info!(
                "run {}/{}: solved={} generations={} evaluations={}",
                run + 1,
                self.conf.task.runs,
                outcome.solved,
                outcome.generations,
                outcome.evaluations
            );
            outcomes.push(outcome);
        }

        self.history.close();
        Ok(outcomes)
    }

    fn execute_run(&mut self, evaluator: Evaluator) -> Result<RunOutcome> {
        self.pool.resume();
        self.history.new_run();

        let params = Arc::new(self.conf.to_network_params());
        let mut env = Env::new(
            params,
            self.conf.species.enabled,
            self.conf.species.max.count,
            self.conf.net.max.count,
            self.conf.net.max.age,
        );
        env.initialise(
            self.conf.initial_layers(),
            self.conf.net.init.count,
            self.conf.species.init.count,
        )?;

        let solved_flag = Arc::new(AtomicBool::new(false));
        let evals_at_start = self.pool.tasks_completed();
        let mut generations = 0u32;

        for epoch in 0..self.conf.task.epochs {
            generations = epoch + 1;
            env.evaluate_epoch(&self.pool, Arc::clone(&evaluator), Arc::clone(&solved_flag));
            if solved_flag.load(Ordering::SeqCst) {
                self.pool.stop();
                break;
            }
            env.evolve_epoch();
        }

        let solved = solved_flag.load(Ordering::SeqCst);
        let evaluations = self.pool.tasks_completed() - evals_at_start;

        self.history.add(Stat::SuccessRate, if solved { 1.0 } else { 0.0 });
        self.history.add(Stat::Generations, generations as f64);
        self.history.add(Stat::Evaluations, evaluations as f64);
        self.history.add(Stat::Species, env.species_count() as f64);
        self.history.add(Stat::Nets, env.net_count() as f64);
        self.history.add(Stat::Layers, env.mean_layer_count());
        self.history.add(Stat::Nodes, env.mean_node_count());
        self.history.add(Stat::Links, env.mean_link_count());

        self.last_champion = env.champion().map(|net| net.lock().clone());

        Ok(RunOutcome {
            solved,
            generations,
            evaluations,
        })
    }

    /// The accumulated statistics archive. Only meaningful for reporting
    /// once [`Task::execute`] has returned.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Number of worker threads backing this task's pool.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// The fittest network from the most recently completed run, if any
    /// network was ever spawned. Overwritten at the end of each
    /// repetition in [`Task::execute`]; reflects only the *last* run.
    pub fn champion(&self) -> Option<&Network> {
        self.last_champion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn tiny_config() -> Config {
        let mut conf = Config::defaults();
        conf.net.init.count = 4;
        conf.net.max.count = 8;
        conf.species.init.count = 1;
        conf.species.enabled = false;
        conf.task.runs = 2;
        conf.task.epochs = 3;
        conf.task.threads = 2;
        conf.fitness.target = 1.0;
        conf
    }

    #[test]
    fn execute_runs_the_configured_number_of_repetitions() {
        let conf = tiny_config();
        let mut task = Task::new(conf).unwrap();
        let calls = Arc::new(AtomicU64::new(0));
        let calls2 = Arc::clone(&calls);
        let evaluator: Evaluator = Arc::new(move |net| {
            calls2.fetch_add(1, Ordering::SeqCst);
            net.set_fitness(0.1, 1.0);
        });

        let outcomes = task.execute(evaluator).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(calls.load(Ordering::SeqCst) > 0);
        assert_eq!(task.history().run_count(), 2);
    }

    #[test]
    fn a_network_reaching_target_stops_the_run_early() {
        let mut conf = tiny_config();
        conf.task.epochs = 50;
        let mut task = Task::new(conf).unwrap();
        let evaluator: Evaluator = Arc::new(move |net| {
            net.set_fitness(1.0, 1.0);
            net.set_fitness(1.0, 1.0);
            net.set_fitness(1.0, 1.0);
        });

        let outcomes = task.execute(evaluator).unwrap();
        for outcome in outcomes {
            assert!(outcome.generations <= 50);
        }
    }

    #[test]
    fn champion_is_populated_after_a_run() {
        let conf = tiny_config();
        let mut task = Task::new(conf).unwrap();
        let evaluator: Evaluator = Arc::new(move |net| {
            net.set_fitness(0.5, 1.0);
        });
        task.execute(evaluator).unwrap();
        assert!(task.champion().is_some());
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        let mut conf = Config::defaults();
        conf.net.init.count = 0;
        assert!(Task::new(conf).is_err());
    }
}
