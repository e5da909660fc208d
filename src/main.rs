use clap::{Args, Parser as ClapParser, Subcommand};
use fuzzy_query::cli::{self, CliError, Operation, OutputFormat, PipelineOptions};
use fuzzy_query::{Defuzzifier, EvalConfig, Hedge, Stream};
use std::io::{self, Read};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(ClapParser)]
#[command(name = "fuzzyq")]
#[command(about = "fuzzyq - Rank and filter JSON documents with fuzzy-logic queries")]
#[command(version)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every stream command
#[derive(Args)]
struct StreamArgs {
    /// Drop results whose membership is below this value
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    format: OutputFormat,

    /// Print bare documents instead of {"doc", "membership"} records
    #[arg(long)]
    no_membership: bool,

    /// Relative width of the fuzzy comparison curves
    #[arg(long, default_value_t = 0.01)]
    tolerance: f64,

    /// Case-insensitive string predicates
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Print the pipeline description instead of evaluating it
    #[arg(long)]
    describe: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep documents matching a fuzzy query
    Filter {
        /// Input file ('-' for stdin)
        source: String,
        /// Query as an S-expression, a JSON AST or a :field reference
        query: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Replace each document with a derived value, keeping its membership
    Map {
        source: String,
        /// Field path, $ for the whole document, or a query
        expression: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Fuzzy intersection (minimum membership) of two inputs
    And {
        left: String,
        right: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Fuzzy union (maximum membership) of two inputs
    Or {
        left: String,
        right: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Fuzzy complement (1 - membership)
    Not {
        source: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Square every membership
    Very {
        source: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Square root of every membership
    Somewhat {
        source: String,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Keep documents with membership at or above a minimum (alpha-cut)
    Threshold {
        source: String,
        min_membership: f64,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Keep the k documents with the highest membership
    Top {
        source: String,
        k: usize,
        #[command(flatten)]
        args: StreamArgs,
    },

    /// Parse a query and print its JSON AST
    Parse {
        query: String,
        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Format a JSON AST as an S-expression
    Format {
        ast: String,
        /// Indent nested expressions
        #[arg(short, long)]
        pretty: bool,
    },

    /// Reduce the input memberships to one crisp value
    Defuzz {
        source: String,
        /// centroid, bisector, mom, lom or som
        #[arg(short, long, default_value = "centroid")]
        method: Defuzzifier,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Filter {
            source,
            query,
            args,
        } => cli::parse_query_arg(&query)
            .and_then(|expr| run_stream(&source, None, Operation::Filter(expr), args)),
        Commands::Map {
            source,
            expression,
            args,
        } => cli::parse_map_arg(&expression)
            .and_then(|expr| run_stream(&source, None, Operation::Map(expr), args)),
        Commands::And { left, right, args } => run_stream(&left, Some(&right), Operation::And, args),
        Commands::Or { left, right, args } => run_stream(&left, Some(&right), Operation::Or, args),
        Commands::Not { source, args } => run_stream(&source, None, Operation::Not, args),
        Commands::Very { source, args } => {
            run_stream(&source, None, Operation::Hedge(Hedge::Very), args)
        }
        Commands::Somewhat { source, args } => {
            run_stream(&source, None, Operation::Hedge(Hedge::Somewhat), args)
        }
        Commands::Threshold {
            source,
            min_membership,
            args,
        } => run_stream(&source, None, Operation::Threshold(min_membership), args),
        Commands::Top { source, k, args } => run_stream(&source, None, Operation::Top(k), args),
        Commands::Parse { query, pretty } => {
            cli::execute_parse(&query, pretty).map(|out| println!("{}", out))
        }
        Commands::Format { ast, pretty } => {
            cli::execute_format(&ast, pretty).map(|out| println!("{}", out))
        }
        Commands::Defuzz { source, method } => run_defuzz(&source, method),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_input(source: &str) -> Result<String, CliError> {
    if source != "-" {
        return Ok(std::fs::read_to_string(source)?);
    }
    if atty::is(atty::Stream::Stdin) {
        return Err(CliError::NoInput);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn load(source: &str) -> Result<Stream, CliError> {
    let text = read_input(source)?;
    Ok(Stream::from_pairs(cli::read_pairs(&text)?)?)
}

fn run_stream(
    source: &str,
    other: Option<&str>,
    operation: Operation,
    args: StreamArgs,
) -> Result<(), CliError> {
    let input = load(source)?;
    let other = other.map(load).transpose()?;

    let options = PipelineOptions {
        operation,
        threshold: args.threshold,
        config: EvalConfig::default()
            .with_tolerance(args.tolerance)
            .with_case_insensitive_strings(args.ignore_case),
    };
    let stream = cli::build_pipeline(input, other, &options)?;

    if args.describe {
        println!("{}", stream.describe());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = cli::write_results(&stream, args.format, !args.no_membership, &mut out)?;
    tracing::info!(written, "done");
    Ok(())
}

fn run_defuzz(source: &str, method: Defuzzifier) -> Result<(), CliError> {
    let value = load(source)?.defuzzify(method)?;
    println!("{}", value);
    Ok(())
}
