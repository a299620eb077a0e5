use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::info;

use lazyc::cli::Cli;
use lazyc::codegen::{build_binary, resolve_compiler};
use lazyc::diagnostics::render_error;
use lazyc::{EmitKind, Error};

/// 64 MB stack: lowering, closure conversion and `--emit run` all recurse
/// over the program.
const STACK_SIZE: usize = 64 * 1024 * 1024;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let builder = std::thread::Builder::new().stack_size(STACK_SIZE);
    let handler = match builder.spawn(move || run(cli)) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: failed to spawn compiler thread: {}", e);
            process::exit(1);
        }
    };
    match handler.join() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {:?}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> i32 {
    let source = match std::fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", cli.input.display(), e);
            return 1;
        }
    };

    let mut options = cli.compile_options();
    if cli.build {
        options.emit = EmitKind::C;
    }

    let output = match lazyc::compile(&source, &options) {
        Ok(out) => out,
        Err(e) => {
            report(&source, &e);
            return 1;
        }
    };

    if cli.build {
        let output_path = cli.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!("a.out{}", std::env::consts::EXE_SUFFIX))
        });
        let cc = resolve_compiler(cli.cc.as_deref());
        return match build_binary(&output, &output_path, &cc) {
            Ok(path) => {
                info!("built {}", path.display());
                eprintln!("wrote binary: {}", path.display());
                0
            }
            Err(e) => {
                report(&source, &Error::from(e));
                1
            }
        };
    }

    match cli.output {
        Some(out_path) => {
            if let Err(e) = std::fs::write(&out_path, &output) {
                eprintln!("error: cannot write '{}': {}", out_path.display(), e);
                return 1;
            }
        }
        None => print!("{}", output),
    }
    0
}

fn report(source: &str, err: &Error) {
    eprint!("{}", render_error(source, err));
}
