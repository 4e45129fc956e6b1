use std::{
    fs,
    io::{self, Read},
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::debug;
use rustyline::{error::ReadlineError, Editor};

use clast::{parse, tokenize, Error as ParseError, Node};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Sexp,
    Debug,
    Json,
}

/// Reads Clojure-style source into a language-agnostic syntax tree.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// File to read once instead of starting the REPL, `-` for stdin
    file: Option<String>,

    /// How to print the tree
    #[arg(long, value_enum, default_value_t = Format::Sexp)]
    format: Format,

    /// Where the REPL keeps its history
    #[arg(long, default_value = "history.txt")]
    history: String,

    /// Print the token stream instead of the tree
    #[arg(long)]
    tokens: bool,
}

#[derive(Debug)]
enum ReplError {
    Incomplete,
    Parse(ParseError),
}

#[derive(Clone, Debug, Default)]
struct ReplState {
    line_number: usize,
    lines: Vec<String>,
}

fn read(state: &mut ReplState, text: String) -> Result<(String, Vec<Node>), ReplError> {
    state.lines.push(text);

    let current_lines = state.lines.join("\n");

    debug!("reading {:?}", current_lines);

    match parse(&current_lines) {
        Ok(nodes) => {
            state.lines.clear();

            Ok((current_lines, nodes))
        }
        Err(err) if err.is_incomplete() => Err(ReplError::Incomplete),
        Err(err) => {
            state.lines.clear();

            Err(ReplError::Parse(err))
        }
    }
}

fn print_tokens(source: &str) -> anyhow::Result<()> {
    for token in tokenize(source)? {
        println!("{}", token);
    }

    Ok(())
}

fn print_nodes(nodes: &[Node], format: Format) -> anyhow::Result<()> {
    match format {
        Format::Sexp => {
            for node in nodes {
                println!("{}", node);
            }
        }
        Format::Debug => println!("{:#?}", nodes),
        Format::Json => println!("{}", serde_json::to_string_pretty(nodes)?),
    }

    Ok(())
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;

        Ok(source)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
    }
}

fn run_file(path: &str, args: &Args) -> anyhow::Result<()> {
    let source = read_source(path)?;

    if args.tokens {
        return print_tokens(&source);
    }

    let nodes = parse(&source)?;

    debug!("read {} forms from {}", nodes.len(), path);

    print_nodes(&nodes, args.format)
}

fn repl(args: &Args) -> anyhow::Result<()> {
    let mut rl = Editor::<()>::new();
    let version = env!("CARGO_PKG_VERSION");

    println!("clast v{} - Clojure reader", version);

    if rl.load_history(&args.history).is_err() {
        println!("No previous history.");
    }

    let mut state = ReplState::default();

    loop {
        let prefix = if state.lines.is_empty() {
            state.line_number += 1;
            format!("clast({})> ", state.line_number)
        } else {
            format!(".....({})> ", state.line_number)
        };

        match rl.readline(&prefix) {
            Ok(line) => {
                if !line.is_empty() {
                    rl.add_history_entry(line.as_str());
                }

                let next_line = line.trim_end().to_string();

                match read(&mut state, next_line) {
                    Ok((source, nodes)) => {
                        let printed = if args.tokens {
                            print_tokens(&source)
                        } else {
                            print_nodes(&nodes, args.format)
                        };

                        if let Err(err) = printed {
                            println!("Error: {}", err);
                        }
                    }
                    Err(ReplError::Incomplete) => (),
                    Err(ReplError::Parse(err)) => println!("{}", err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(&args.history)
        .map_err(|err| anyhow::anyhow!("failed to save history to {}: {}", args.history, err))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match &args.file {
        Some(path) => run_file(path, &args),
        None => repl(&args),
    }
}
