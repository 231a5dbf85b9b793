//! Pole-balancing control scenario: an example experiment front-end
//! exercising `evo_runtime`'s [`Evaluator`] contract directly, the way
//! `evo run` exercises it for the built-in XOR scenario.
//!
//! Grounded on `examples/original_source/src/bin/cart_pole/{main.cpp,eval.cpp}`'s
//! `setup`/`eval` split: load (or default) a configuration, build the
//! network population, and score each network by how long it keeps the
//! pole upright.

mod physics;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use evo_core::{rng, Network};
use evo_runtime::config::{
    Config, DataSection, DataSets, DataTypeDoc, FitnessSection, FitnessStat, LayerDefDoc, LayerKindDoc, NetInit,
    NetTypeDoc, NodeDefDoc, SpeciesCount, SpeciesSection, TaskSection, TaskTypeDoc,
};
use evo_runtime::{Evaluator, Task};

use physics::{CartPole, SOLVED_STEPS};

/// Run the pole-balance control scenario.
#[derive(Debug, Parser)]
#[command(name = "cart-pole")]
struct Args {
    /// Experiment configuration document; the built-in control-tuned
    /// defaults are used when omitted.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let conf = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).expect("failed to read configuration file");
            Config::from_json(&text).expect("failed to parse configuration file")
        }
        None => default_config(),
    };

    if let Err(reasons) = conf.validate() {
        for reason in &reasons {
            eprintln!("{reason}");
        }
        std::process::exit(1);
    }

    let mut task = Task::new(conf).expect("configuration already validated above");
    let evaluator: Evaluator = Arc::new(evaluate);

    let outcomes = task.execute(evaluator).expect("evaluator never errors");
    for (run, outcome) in outcomes.iter().enumerate() {
        println!(
            "run {}: solved={} generations={} evaluations={}",
            run + 1,
            outcome.solved,
            outcome.generations,
            outcome.evaluations
        );
    }
    println!("{}", task.history());
}

/// Score `net` by how many steps it keeps the pole within bounds,
/// starting from a small random tilt.
fn evaluate(net: &mut Network) {
    let theta0 = rng::rnd_real(-0.05, 0.05);
    let mut cart = CartPole::new(theta0);
    let mut steps = 0u64;

    while steps < SOLVED_STEPS && cart.in_range() {
        let output = match net.evaluate(&cart.normalized_state()) {
            Ok(output) => output,
            Err(_) => break,
        };
        let action = output.first().copied().unwrap_or(0.0);
        cart.step(action);
        steps += 1;
    }

    net.set_fitness(steps as f64, SOLVED_STEPS as f64);
}

/// A classical, 4-input/1-output network population tuned for the
/// control task rather than the library's generic classification
/// defaults.
fn default_config() -> Config {
    let mut conf = Config::defaults();

    conf.net.kind = NetTypeDoc::Classical;
    conf.net.init = NetInit {
        count: 150,
        layers: vec![
            LayerDefDoc {
                kind: LayerKindDoc::Regular,
                nodes: vec![NodeDefDoc { dim: (1, 1, 1), tau: 1.0 }; 4],
                fixed: true,
            },
            LayerDefDoc {
                kind: LayerKindDoc::Regular,
                nodes: vec![NodeDefDoc { dim: (1, 1, 1), tau: 1.0 }],
                fixed: true,
            },
        ],
    };

    conf.species = SpeciesSection {
        enabled: false,
        init: SpeciesCount { count: 1 },
        max: SpeciesCount { count: 1 },
    };

    conf.fitness = FitnessSection {
        target: SOLVED_STEPS as f64,
        stat: FitnessStat { alpha: 0.0 },
    };

    conf.task = TaskSection {
        kind: TaskTypeDoc::Control,
        runs: 5,
        epochs: 200,
        threads: 4,
    };

    conf.data = DataSection {
        kind: DataTypeDoc::RealValued,
        samples: 0,
        sets: DataSets { train: 1.0, dev: 0.0, test: 0.0 },
    };

    conf
}
