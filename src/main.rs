use clap::{Parser as ClapParser, Subcommand};
use ogel_lang::cli::{self, CliError, EvalOptions, SourceOptions};
use std::io::{self, Read};
use tracing::Level;

#[derive(ClapParser)]
#[command(name = "ogel")]
#[command(about = "Ogel - evaluate and compile object-graph expressions against JSON")]
#[command(version)]
struct Cli {
    /// Log evaluation steps to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression tree
    Eval {
        /// The expression tree, as JSON
        ast: String,

        /// JSON root object (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Bind a variable: name=<json>
        #[arg(long = "var")]
        variables: Vec<String>,

        /// JSON value substituted for nulls met during navigation
        #[arg(long)]
        null_default: Option<String>,

        /// Allow access to non-public members
        #[arg(long)]
        allow_all: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the source fragment generated for an expression tree
    Source {
        /// The expression tree, as JSON
        ast: String,

        /// JSON root object (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Bind a variable: name=<json>
        #[arg(long = "var")]
        variables: Vec<String>,

        /// Wrap the fragment into a routine with this name
        #[arg(long)]
        routine: Option<String>,

        /// Allow access to non-public members
        #[arg(long)]
        allow_all: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Eval {
            ast,
            input,
            variables,
            null_default,
            allow_all,
            pretty,
        } => read_input(input).and_then(|input| {
            run_eval(
                EvalOptions {
                    ast,
                    input,
                    variables,
                    null_default,
                    allow_all,
                },
                pretty,
            )
        }),
        Commands::Source {
            ast,
            input,
            variables,
            routine,
            allow_all,
        } => read_input(input).and_then(|input| {
            run_source(SourceOptions {
                ast,
                input,
                variables,
                routine,
                allow_all,
            })
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer).filter(|b| !b.trim().is_empty()))
        }
        None => Ok(None),
    }
}

fn run_eval(options: EvalOptions, pretty: bool) -> Result<(), CliError> {
    let output = cli::execute_eval(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_source(options: SourceOptions) -> Result<(), CliError> {
    let output = cli::execute_source(&options)?;
    println!("{}", output.source);
    if let Some(hint) = output.type_hint {
        tracing::debug!(%hint, "fragment type");
    }
    Ok(())
}
