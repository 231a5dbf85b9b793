//! `evo run` — run an experiment configuration document to completion.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use evo_core::{LayerDef, Network, Stage};
use evo_runtime::config::TaskTypeDoc;
use evo_runtime::{Config, Evaluator, History, Stat, Task};
use serde::Serialize;

use crate::error::{CliError, CliResult};

/// Run a configuration document to completion and report its [`History`].
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Configuration document to run.
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Write the fittest network from the last run to this path as JSON.
    #[arg(long = "dump-champion")]
    dump_champion: Option<PathBuf>,

    /// Write the run statistics archive to this path as JSON.
    #[arg(long = "dump-history")]
    dump_history: Option<PathBuf>,
}

impl RunCommand {
    /// Validate, build the built-in evaluator for `conf.task.type`, and
    /// run `conf.task.runs` repetitions via [`Task::execute`].
    pub fn execute(self) -> CliResult<()> {
        let text = std::fs::read_to_string(&self.config)?;
        let conf = Config::from_json(&text)?;
        conf.validate().map_err(CliError::configuration)?;

        let evaluator = builtin_evaluator(&conf)?;
        let mut task = Task::new(conf)?;
        let outcomes = task.execute(evaluator)?;

        println!("completed {} run(s)", outcomes.len());
        println!("{}", task.history());

        if let Some(path) = &self.dump_history {
            let doc = HistoryDoc::from_history(task.history());
            let json = serde_json::to_string_pretty(&doc).map_err(|e| anyhow::anyhow!(e))?;
            std::fs::write(path, json)?;
            tracing::info!("wrote history to {}", path.display());
        }

        if let Some(path) = &self.dump_champion {
            match task.champion() {
                Some(net) => {
                    let doc = champion_doc(net);
                    let json = serde_json::to_string_pretty(&doc).map_err(|e| anyhow::anyhow!(e))?;
                    std::fs::write(path, json)?;
                    tracing::info!("wrote champion to {}", path.display());
                }
                None => tracing::warn!("no champion recorded; skipping --dump-champion"),
            }
        }

        Ok(())
    }
}

/// Select the one built-in scenario this binary ships for `conf.task.type`.
/// Most task types are meant to be driven by a dedicated experiment
/// front-end (e.g. `demos/cart-pole` for `control`); `evo run` only
/// executes the literal XOR scenario (spec.md §8.10) out of the box.
fn builtin_evaluator(conf: &Config) -> CliResult<Evaluator> {
    match conf.task.kind {
        TaskTypeDoc::Classification => Ok(xor_evaluator()),
        other => Err(CliError::unsupported_task(format!(
            "{other:?} has no built-in evaluator; write a dedicated front-end \
             (see demos/cart-pole for an example) and call evo_runtime::Task directly"
        ))),
    }
}

/// The 2-input XOR scenario from spec.md §8.10: four fixed input rows, a
/// score of `4.0` minus the summed absolute error, `Network::set_fitness`
/// called once against `fitness.target`.
fn xor_evaluator() -> Evaluator {
    const ROWS: [([f64; 2], f64); 4] = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    Arc::new(|net: &mut Network| {
        let mut error = 0.0;
        for (input, expected) in ROWS {
            match net.evaluate(&input) {
                Ok(output) => {
                    let actual = output.first().copied().unwrap_or(0.0);
                    error += (actual - expected).abs();
                }
                Err(_) => error += 1.0,
            }
        }
        let score = (4.0 - error).max(0.0);
        net.set_fitness(score, 3.9);
    })
}

/// Serializable mirror of the parts of [`Network`] that actually persist
/// across the process boundary — see `Network`'s own doc comment on why
/// it isn't `serde`-serializable directly.
#[derive(Debug, Serialize)]
struct ChampionDoc {
    stage: Stage,
    age: u64,
    fitness_abs: f64,
    fitness_mean: f64,
    fitness_rel: f64,
    node_count: usize,
    link_count: usize,
    shape: Vec<LayerDef>,
}

fn champion_doc(net: &Network) -> ChampionDoc {
    ChampionDoc {
        stage: net.stage(),
        age: net.age(),
        fitness_abs: net.fitness().value(),
        fitness_mean: net.fitness().mean(),
        fitness_rel: net.fitness().rel,
        node_count: net.node_count(),
        link_count: net.link_count(),
        shape: net.shape(),
    }
}

#[derive(Debug, Serialize)]
struct HistoryDoc {
    runs: usize,
    stats: BTreeMap<String, (f64, f64)>,
}

impl HistoryDoc {
    fn from_history(history: &History) -> Self {
        let mut stats = BTreeMap::new();
        for stat in Stat::ALL {
            if let Some(summary) = history.summary(stat) {
                stats.insert(format!("{stat:?}"), summary);
            }
        }
        Self {
            runs: history.run_count(),
            stats,
        }
    }
}
