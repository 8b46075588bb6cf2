// Copyright 2014 Nick Fitzgerald
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A Scheme implementation, in Rust.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub mod arena;
pub mod bootstrap;
pub mod context;
pub mod copy;
pub mod environment;
pub mod error;
pub mod eval;
pub mod primitives;
pub mod print;
pub mod read;
pub mod value;

use context::Context;
use error::DriverError;

/// rascheme: a small Scheme-family interpreter.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Source file to run. Starts an interactive REPL when omitted.
    file: Option<PathBuf>,
}

const PROMPT: &str = "> ";

/// Evaluate one top-level form, printing its result (or, indistinguishably,
/// the `Value::Error` it produced) and resetting the scratch arena
/// afterward. This reset is the crux of the two-arena discipline: nothing
/// still reachable from `global_env` can be scratch-resident by the time
/// it runs, because `define`/`set!` already deep-copied anything they
/// bound into the permanent arena.
fn run_one(ctx: &mut Context, form: value::Value) {
    let env = ctx.global_env;
    let result = match eval::eval(ctx, form, env) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("eval failed: {}", print::format_value(ctx, e));
            e
        }
    };
    println!("{}", print::format_value(ctx, result));
    ctx.reset_scratch();
}

fn repl(ctx: &mut Context) -> Result<(), DriverError> {
    println!("rascheme");
    println!("Ctrl-D to exit.");

    let mut editor = DefaultEditor::new()?;
    let mut last_was_interrupt = false;
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                last_was_interrupt = false;
                let _ = editor.add_history_entry(line.as_str());
                match read::read_one(ctx, &line) {
                    Ok(Some(form)) => run_one(ctx, form),
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("parse failed: {}", e);
                        println!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Eof) => {
                log::trace!("repl: received EOF, exiting");
                return Ok(());
            }
            Err(ReadlineError::Interrupted) => {
                // A single Ctrl-C aborts the current line. A second one in
                // a row (nothing typed in between) ends the session, same
                // as most REPLs.
                if last_was_interrupt {
                    log::trace!("repl: received a second consecutive interrupt, exiting");
                    return Ok(());
                }
                last_was_interrupt = true;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn run_file(ctx: &mut Context, path: &PathBuf) -> Result<(), DriverError> {
    let src = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.display().to_string(),
        source,
    })?;

    // Read one top-level form, evaluate and print it, then reset the
    // scratch arena (inside `run_one`) before reading the next one.
    // Reading every form up front would leave later forms as scratch
    // indices that the first reset invalidates.
    let mut reader = read::Reader::new(&src);
    let mut forms_read = 0usize;
    let start = Instant::now();
    loop {
        match reader.read_value(ctx)? {
            Some(form) => {
                forms_read += 1;
                run_one(ctx, form);
            }
            None => break,
        }
    }
    log::debug!(
        "driver: read and evaluated {} top-level form(s) from {:?} in {:?}",
        forms_read,
        path,
        start.elapsed()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    // `Cli::parse()` would exit with clap's own usage-error code (2) on
    // more than one positional argument; this driver's contract is a
    // uniform exit code of 1 for every top-level failure, so the error
    // path is handled explicitly instead.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            use clap::error::ErrorKind;
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    };
    let mut ctx = bootstrap::new_context();

    let result = match &cli.file {
        Some(path) => run_file(&mut ctx, path),
        None => repl(&mut ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
