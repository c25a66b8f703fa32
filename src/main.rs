use caballa::ast::{Function, Value};
use caballa::builtinops::Builtin;
use caballa::evaluator::{self, Environment};
use caballa::parser::ParseConfig;
use caballa::read_eval_with_config;
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io;
use std::panic;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "caballa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An interactive Q-expression Lisp", long_about = None)]
struct Cli {
    /// Evaluate an expression and print the result instead of starting the REPL.
    /// May be given several times; all expressions share one environment.
    #[arg(short, long, value_name = "EXPR")]
    eval: Vec<String>,

    /// Do not print the banner on startup
    #[arg(long)]
    no_banner: bool,

    /// Disable ';' line comments
    #[arg(long)]
    no_comments: bool,

    /// Enable debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = panic::catch_unwind(move || run(&cli));

    match result {
        Ok(code) => code,
        Err(panic_info) => {
            eprintln!("The REPL encountered an unexpected error and must exit.");

            if let Some(msg) = panic_info.downcast_ref::<&str>() {
                eprintln!("Error: {msg}");
            } else if let Some(msg) = panic_info.downcast_ref::<String>() {
                eprintln!("Error: {msg}");
            } else {
                eprintln!("Error: Unknown panic occurred");
            }

            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> ExitCode {
    let config = ParseConfig {
        handle_comments: !cli.no_comments,
        ..ParseConfig::default()
    };
    let mut env = evaluator::create_global_env();

    if !cli.eval.is_empty() {
        for input in &cli.eval {
            eval_and_print(input, &mut env, config);
        }
        return ExitCode::SUCCESS;
    }

    run_repl(&mut env, config, !cli.no_banner)
}

fn eval_and_print(input: &str, env: &mut Environment, config: ParseConfig) {
    match read_eval_with_config(input, env, config) {
        Ok(value) => println!("{value}"),
        Err(e) => println!("{e}"),
    }
}

fn run_repl(env: &mut Environment, config: ParseConfig, banner: bool) -> ExitCode {
    if banner {
        println!("Caballa Version 0.0.0.0.1");
        println!("Press Ctrl+c to Exit");
        println!();
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match rl.readline("caballa> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                // Handle special commands
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                eval_and_print(line, env, config);
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn print_help() {
    println!("Caballa, a Lisp with Q-expressions:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Each line is one expression; the outer parentheses are optional.");
    println!("  Numbers: 42, -5");
    println!("  Q-expressions (quoted lists): {{1 2 3}}");
    println!("  Comments: ; to end of line");
    println!();
    println!("Builtins:");
    for builtin in Builtin::ALL {
        println!("  {:<8} arguments: {}", builtin.name(), builtin.arity());
    }
    println!();
    println!("Examples:");
    println!("  + 1 2 3");
    println!("  def {{add}} (\\ {{x y}} {{+ x y}})");
    println!("  def {{inc}} (add 1)");
    println!("  (\\ {{x & xs}} {{xs}}) 1 2 3");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.visible_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Function(Function::Builtin(_)) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        for row in builtins.chunks(6) {
            let row: String = row.iter().map(|name| format!("  {name:<10}")).collect();
            println!("{}", row.trim_end());
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
