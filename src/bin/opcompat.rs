//! Runs the compatibility filter over a textual IR program.
//!
//! Prints one line per op with its canonical name, the support decision and
//! the fusion pattern kind of supported ops, and flags ops that carry a
//! denied parameter.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use opcompat::core::{
    CompatibilityFilter, CompatResult, FilterConfig, OpAdaptor, OperatorRegistry, ALLOW_OPS_ENV,
    DENY_OPS_ENV,
};
use opcompat::program::Program;

#[derive(Parser, Debug)]
#[command(name = "opcompat", about = "Report which IR ops the kernel compiler backend can take")]
struct Args {
    /// Program file; reads stdin when omitted.
    file: Option<PathBuf>,

    /// Semicolon-delimited allow list (defaults to $OPCOMPAT_ALLOW_OPS).
    #[arg(long)]
    allow_ops: Option<String>,

    /// Semicolon-delimited deny list (defaults to $OPCOMPAT_DENY_OPS).
    #[arg(long)]
    deny_ops: Option<String>,

    /// Also print converted attributes of supported ops.
    #[arg(long)]
    attrs: bool,
}

fn read_input(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn build_config(args: &Args) -> FilterConfig {
    let allow = args
        .allow_ops
        .clone()
        .unwrap_or_else(|| std::env::var(ALLOW_OPS_ENV).unwrap_or_default());
    let deny = args
        .deny_ops
        .clone()
        .unwrap_or_else(|| std::env::var(DENY_OPS_ENV).unwrap_or_default());
    FilterConfig::from_lists(&allow, &deny)
}

fn report(program: &Program, filter: &CompatibilityFilter<'_>, with_attrs: bool) -> CompatResult<()> {
    for op in program.op_ids() {
        let name = program.op_name(op);
        let canonical = filter.canonical_name(program, op)?;
        let supported = filter.is_supported(program, op);
        let kind = if supported {
            filter.op_kind(program, op)?.to_string()
        } else {
            "-".to_string()
        };
        println!("{} -> {} supported={} kind={}", name, canonical, supported, kind);
        if filter.has_denied_param(program, op) {
            println!("    carries a denied parameter");
        }

        if with_attrs && supported {
            for (key, attr) in filter.convert_attributes(program, op)? {
                println!("    {} = {}", key, attr);
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let text = match read_input(args.file.as_ref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let program = match Program::parse(&text) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let registry = OperatorRegistry::with_builtin_ops();
    let filter = CompatibilityFilter::new(build_config(&args), &registry);
    if let Err(e) = report(&program, &filter, args.attrs) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
