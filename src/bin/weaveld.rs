// Aspect override-chain linker
//
//  Copyright (C) 2014-2023 Ryan Specialty Group, LLC.
//
//  This file is part of Weaver.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! This is the aspect linker,
//!   so named after the traditional `ld` Unix utility.
//! Its job is to take a weave manifest describing every layer that every
//!   aspect contributes and produce the linked override chain of each
//!   declaration.
//!
//! For more information about the linker,
//!   see the [`weaver::ld`] module.

extern crate weaver;

use getopts::{Fail, Options};
use std::{
    env,
    error::Error,
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};
use weaver::{
    diagnose::{AnnotatedSpan, Diagnostic, Reporter, VisualReporter},
    ld::{link_pass, CancelToken, LinkOptions, PassOutput, Registry},
    obj::weave::{WeaveError, WeaveReader},
    span::Context,
    sym::GlobalSymbolIntern,
};

/// Types of commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Link {
        input: String,
        output: Option<String>,
        verbose: bool,
        options: LinkOptions,
    },
    Usage,
}

/// Read the manifest at `input` into a new [`Registry`].
fn load(input: &str) -> Result<Registry, WeaveldError> {
    let path = Path::new(input);
    let file = BufReader::new(File::open(path)?);
    let ctx = Context::from(input.intern());

    let mut registry = Registry::new();
    WeaveReader::new(file, ctx).read_into(&mut registry)?;

    Ok(registry)
}

/// Write each linked chain to `out`,
///   rendering a report for each failed declaration to stderr.
///
/// Reports are rendered to a string before being written so that they are
///   not interleaved with the output of other processes.
fn write_output<W: Write, R: Reporter>(
    pass: &PassOutput,
    mut out: W,
    reporter: &mut R,
) -> Result<(), WeaveldError> {
    for (_, result) in pass.results.iter() {
        match result {
            Ok(chain) => writeln!(out, "{chain}")?,
            Err(e) => {
                let report = reporter.render(e).to_string();
                eprintln!("{report}");
            }
        }
    }

    out.flush()?;

    Ok(())
}

/// Link the manifest at `input`,
///   writing linked chains to `output` or stdout.
///
/// Declarations that fail to link do not fail the linker;
///   the caller inspects the returned [`PassOutput`].
fn link<R: Reporter>(
    input: &str,
    output: Option<&str>,
    options: LinkOptions,
    reporter: &mut R,
) -> Result<PassOutput, WeaveldError> {
    let registry = load(input)?;
    let pass = link_pass(&registry, &(), options, &CancelToken::new());

    match output {
        Some(dest) => {
            let fout = BufWriter::new(File::create(Path::new(dest))?);
            write_output(&pass, fout, reporter)?
        }
        None => write_output(&pass, io::stdout().lock(), reporter)?,
    }

    Ok(pass)
}

/// Log to stderr,
///   filtered by `RUST_LOG` if set.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = tracing_fmt::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Entrypoint for the linker
pub fn main() -> Result<(), WeaveldError> {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = get_opts();
    let usage = opts.usage(&format!("Usage: {} [OPTIONS] FILE", program));

    match parse_options(opts, args) {
        Ok(Command::Link {
            input,
            output,
            verbose,
            options,
        }) => {
            init_tracing(verbose);

            let mut reporter = VisualReporter::new();

            match link(&input, output.as_deref(), options, &mut reporter) {
                Ok(pass) if pass.is_complete() => Ok(()),

                Ok(pass) => {
                    eprintln!(
                        "fatal: failed to link {} of {} declaration(s) \
                           in `{input}`",
                        pass.failed_count(),
                        pass.results.len() + pass.cancelled.len(),
                    );
                    std::process::exit(1);
                }

                Err(e) => {
                    let report = reporter.render(&e).to_string();
                    eprintln!("{report}\nfatal: failed to link `{input}`");
                    std::process::exit(1);
                }
            }
        }
        Ok(Command::Usage) => {
            println!("{}", usage);
            std::process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("{}", e);
            println!("{}", usage);
            std::process::exit(exitcode::USAGE);
        }
    }
}

/// Get 'Options'
fn get_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt("o", "output", "set output file name", "NAME");
    opts.optflag("", "sequential", "link on a single thread");
    opts.optflag("v", "verbose", "log progress to stderr");
    opts.optflag("h", "help", "print this help menu");

    opts
}

/// Option parser
fn parse_options(opts: Options, args: Vec<String>) -> Result<Command, Fail> {
    let matches = opts.parse(&args[1..])?;

    if matches.opt_present("h") {
        return Ok(Command::Usage);
    }

    let input = match matches.free.len() {
        0 => return Err(Fail::OptionMissing(String::from("FILE"))),
        1 => matches.free[0].clone(),
        _ => return Err(Fail::UnrecognizedOption(matches.free[1].clone())),
    };

    Ok(Command::Link {
        input,
        output: matches.opt_str("o"),
        verbose: matches.opt_present("v"),
        options: LinkOptions {
            parallel: !matches.opt_present("sequential"),
        },
    })
}

/// Linker (`weaveld`) error.
///
/// This represents errors that prevent linking from taking place at all.
/// Failures to link individual declarations are not errors of the linker;
///   they are reported individually and summarized in `main`.
#[derive(Debug)]
pub enum WeaveldError {
    Io(io::Error),
    Weave(WeaveError),
}

impl From<io::Error> for WeaveldError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<WeaveError> for WeaveldError {
    fn from(e: WeaveError) -> Self {
        Self::Weave(e)
    }
}

impl Display for WeaveldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => Display::fmt(e, f),
            Self::Weave(e) => Display::fmt(e, f),
        }
    }
}

impl Error for WeaveldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Weave(e) => Some(e),
        }
    }
}

impl Diagnostic for WeaveldError {
    fn describe(&self) -> Vec<AnnotatedSpan> {
        match self {
            Self::Weave(e) => e.describe(),

            // Falls back to rendering just the error `Display`.
            Self::Io(_) => vec![],
        }
    }
}
