//! # objinfo - Main Entry Point
//!
//! - `show <PIN>`: metadata of one pinned object
//! - `list`: every loaded map and program
//! - `ident <NAME>...`: identifier normalization

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;
use serde::Serialize;
use std::path::Path;

use objinfo::cli::{Args, Command, ObjectReport};
use objinfo::domain::ObjectKind;
use objinfo::info::{Backend, Resolver};
use objinfo::naming::identifier;
use objinfo::sys;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") || msg.contains("operation not permitted") {
        EXIT_NOPERM
    } else if msg.contains("not a map or program") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Show { pin, backend } => {
            let report = show(&pin, backend.forced())?;
            if args.json {
                print_json(&report)
            } else {
                println!("{report}");
                Ok(())
            }
        }
        Command::List { maps, programs } => {
            // Neither flag means both
            let reports = list(maps || !programs, programs || !maps)?;
            if args.json {
                print_json(&reports)
            } else {
                for report in &reports {
                    println!("{report}");
                }
                Ok(())
            }
        }
        Command::Ident { names } => {
            for name in names {
                println!("{}", identifier(&name));
            }
            Ok(())
        }
    }
}

/// Open a pin and resolve whatever object sits behind it.
fn show(pin: &Path, backend: Option<Backend>) -> Result<ObjectReport> {
    let fd = sys::obj_get(pin)
        .with_context(|| format!("Failed to open pinned object {}", pin.display()))?;
    let resolver = Resolver::global();

    let kind = resolver.object_kind(&fd)?;
    let report = match kind {
        ObjectKind::Map => ObjectReport::Map {
            id: None,
            info: match backend {
                Some(backend) => resolver.map_info_with(&fd, backend)?,
                None => resolver.map_info(&fd)?,
            },
        },
        ObjectKind::Program => ObjectReport::Program {
            id: None,
            info: match backend {
                Some(backend) => resolver.program_info_with(&fd, backend)?,
                None => resolver.program_info(&fd)?,
            },
        },
        other => bail!("{} is a {other}, not a map or program", pin.display()),
    };

    Ok(report)
}

/// Walk all loaded objects. Objects that vanish mid-walk are skipped.
fn list(maps: bool, programs: bool) -> Result<Vec<ObjectReport>> {
    let resolver = Resolver::global();
    let mut reports = Vec::new();

    if maps {
        for loaded in aya::maps::loaded_maps() {
            let loaded = loaded.context("Failed to enumerate loaded maps")?;
            let id = loaded.id();
            let fd = match loaded.fd() {
                Ok(fd) => fd,
                Err(e) => {
                    warn!("Skipping map {id}: {e}");
                    continue;
                }
            };
            match resolver.map_info(&fd) {
                Ok(info) => reports.push(ObjectReport::Map { id: Some(id), info }),
                Err(e) => warn!("Skipping map {id}: {e}"),
            }
        }
    }

    if programs {
        for loaded in aya::programs::loaded_programs() {
            let loaded = loaded.context("Failed to enumerate loaded programs")?;
            let id = loaded.id();
            let fd = match loaded.fd() {
                Ok(fd) => fd,
                Err(e) => {
                    warn!("Skipping program {id}: {e}");
                    continue;
                }
            };
            match resolver.program_info(&fd) {
                Ok(info) => reports.push(ObjectReport::Program { id: Some(id), info }),
                Err(e) => warn!("Skipping program {id}: {e}"),
            }
        }
    }

    Ok(reports)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}
