mod cli;
mod demo;

use anyhow::{Context as _, Result};
use cli::expect_arg;
use concolic::{
    engine::{defaults, ConcreteExecutor, ExecutionOptions},
    instrument::{instrument_module, InstrumentOptions, SequentialNumbering},
    path_exploration::{Exploration, StrategyKind, VisitedSet},
    runtime::Runtime,
};
use log::info;
use std::str::FromStr;
use z3_solver::{Config, Context};

fn main() -> Result<()> {
    let matches = cli::args().get_matches();

    let level = expect_arg::<String>(&matches, "verbose");
    env_logger::Builder::new().parse_filters(level).init();

    match matches.subcommand() {
        Some(("instrument", args)) => {
            let options = InstrumentOptions {
                entry_function: expect_arg::<String>(args, "entry").clone(),
            };

            let mut module = demo::sample_module();
            println!("{}", module);

            let mut oracle = SequentialNumbering::new();
            let inserted = instrument_module(&mut module, &mut oracle, &options);
            println!("; {} hook calls inserted\n", inserted);
            println!("{}", module);

            Ok(())
        }
        Some(("demo", args)) => {
            let kind = StrategyKind::from_str(expect_arg::<String>(args, "strategy"))
                .context("unsupported strategy")?;
            let first_input = *expect_arg::<i64>(args, "input");
            let runs = *expect_arg::<u64>(args, "runs");
            let options = ExecutionOptions {
                max_execution_depth: args
                    .get_one::<u64>("max-execution-depth")
                    .copied()
                    .unwrap_or(defaults::MAX_EXECUTION_DEPTH),
                ..Default::default()
            };

            let mut module = demo::sample_module();
            let mut oracle = SequentialNumbering::new();
            instrument_module(&mut module, &mut oracle, &InstrumentOptions::default());

            let config = Config::new();
            let context = Context::new(&config);
            let strategy = kind.strategy();
            let mut visited = VisitedSet::new();

            for run in 0..runs {
                let input = first_input.wrapping_add(run as i64);
                let mut runtime = Runtime::new(&context);

                let result = ConcreteExecutor::new(&module, &mut runtime, &options, vec![input])
                    .run()
                    .with_context(|| format!("run {} with input {} failed", run, input))?;

                let session = runtime.session()?;
                let mut conditions = session.path_condition();

                println!("run {}: input={} result={:?}", run, input, result);
                for (record, condition) in session.trace().iter().zip(conditions.iter()) {
                    println!("  branch {} taken={}: {}", record.branch, record.taken, condition);
                }

                match strategy.next_path(&mut conditions, &mut visited) {
                    Exploration::Flipped { index } => {
                        println!("  next target (flipped condition {}):", index);
                        for condition in conditions.iter() {
                            println!("    {}", condition);
                        }
                    }
                    Exploration::Empty => println!("  no branches recorded"),
                    Exploration::Exhausted => println!("  finished, no new target on this path"),
                }
            }

            info!("visited {} branch outcomes", visited.len());

            Ok(())
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}
