use clap::{command, value_parser, Arg, ArgMatches, Command};

pub const LOGGING_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const STRATEGIES: [&str; 2] = ["dfs", "bfs"];

pub fn expect_arg<'a, T>(m: &'a ArgMatches, arg: &str) -> &'a T
where
    T: Clone + Send + Sync + 'static,
{
    m.get_one::<T>(arg)
        .unwrap_or_else(|| panic!("argument \"{}\" has to be set in CLI at all times", arg))
}

pub fn args() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("configure logging level to use")
                .value_name("LEVEL")
                .value_parser(LOGGING_LEVELS)
                .default_value(LOGGING_LEVELS[2])
                .global(true),
        )
        .subcommand(
            Command::new("instrument")
                .about("Print the sample program before and after instrumentation")
                .arg(
                    Arg::new("entry")
                        .help("Function that receives the initialization hook")
                        .long("entry")
                        .value_name("NAME")
                        .default_value(concolic::instrument::defaults::ENTRY_FUNCTION),
                ),
        )
        .subcommand(
            Command::new("demo")
                .about("Run the instrumented sample program and explore its paths")
                .arg(
                    Arg::new("strategy")
                        .help("Path exploration strategy")
                        .short('s')
                        .long("strategy")
                        .value_name("STRATEGY")
                        .value_parser(STRATEGIES)
                        .default_value(STRATEGIES[0]),
                )
                .arg(
                    Arg::new("input")
                        .help("Concrete input of the first run")
                        .short('i')
                        .long("input")
                        .value_name("NUMBER")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("runs")
                        .help("Number of runs, each one uses the next input")
                        .short('r')
                        .long("runs")
                        .value_name("NUMBER")
                        .value_parser(value_parser!(u64).range(1..))
                        .default_value("4"),
                )
                .arg(
                    Arg::new("max-execution-depth")
                        .help("Number of instructions after which a run is aborted")
                        .short('d')
                        .long("max-execution-depth")
                        .value_name("NUMBER")
                        .value_parser(value_parser!(u64)),
                ),
        )
}
