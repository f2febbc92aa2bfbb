//! Typer CLI — the `typer` binary.
//!
//! Commands:
//!   typer check <files...>        Type-check files and print diagnostics
//!   typer lsp [--root <dir>] [files...]
//!                                 Serve the language protocol on stdin/stdout

use std::env;
use std::io;
use std::process;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use typer_core::{ErrorQueue, File, GlobalState, SourceType};
use typer_lsp::LspLoop;
use typer_pipeline::Options;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(0);
    }

    let verbose = args.iter().any(|a| a == "--verbose");
    init_logging(verbose);

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "lsp" => cmd_lsp(&args[2..], verbose),
        "--version" | "-V" => {
            println!("typer {}", VERSION);
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{}'", cmd);
            eprintln!("Run 'typer --help' for usage.");
            Err(1)
        }
    };

    match result {
        Ok(()) => process::exit(0),
        Err(code) => process::exit(code),
    }
}

fn print_usage() {
    println!("typer {} — a type checker for Ruby-style programs", VERSION);
    println!();
    println!("USAGE:");
    println!("    typer <command> [options] [files]");
    println!();
    println!("COMMANDS:");
    println!("    check <files...>           Type-check files and print diagnostics");
    println!("    lsp [--root <dir>] [files] Serve the language protocol on stdin/stdout");
    println!();
    println!("OPTIONS:");
    println!("    --verbose           Log pipeline phases to stderr");
    println!("    --help, -h          Show this help");
    println!("    --version, -V       Show version");
}

/// Logs go to stderr; stdout belongs to the protocol in lsp mode.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_check(args: &[String]) -> Result<(), i32> {
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    if files.is_empty() {
        eprintln!("error: no input files");
        eprintln!("Usage: typer check <files...>");
        return Err(1);
    }

    let queue = Arc::new(ErrorQueue::default());
    let mut gs = GlobalState::new(queue);
    typer_pipeline::bootstrap(&mut gs);

    let mut frefs = Vec::new();
    {
        let mut file_table = typer_core::UnfreezeFileTable::new(&mut gs);
        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|err| {
                eprintln!("error: cannot read {}: {}", path, err);
                1
            })?;
            frefs.push(
                file_table.enter_file(Arc::new(File::new(
                    path.as_str(),
                    content,
                    SourceType::Normal,
                ))),
            );
        }
    }

    let trees = typer_pipeline::index(&gs, &frefs);
    typer_pipeline::resolve(&mut gs, &trees);
    typer_pipeline::typecheck(&gs, &trees);

    let errors = gs.error_queue.flush_errors(&gs);
    if errors > 0 {
        eprintln!("{} errors found", errors);
        Err(1)
    } else {
        eprintln!("No errors! Great job.");
        Ok(())
    }
}

fn cmd_lsp(args: &[String], verbose: bool) -> Result<(), i32> {
    let mut input_file_names = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--root" => {
                let Some(dir) = iter.next() else {
                    eprintln!("error: --root requires a directory");
                    return Err(1);
                };
                env::set_current_dir(dir).map_err(|err| {
                    eprintln!("error: cannot enter {}: {}", dir, err);
                    1
                })?;
            }
            "--verbose" => {}
            other if other.starts_with('-') => {
                eprintln!("error: unknown option '{}'", other);
                return Err(1);
            }
            file => input_file_names.push(file.to_string()),
        }
    }

    let opts = Options {
        input_file_names,
        verbose,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut lsp = LspLoop::new(opts, stdin.lock(), stdout.lock());
    lsp.run().map_err(|err| {
        eprintln!("typer: {}", err);
        1
    })
}
