//! CLI argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::info::Backend;

#[derive(Parser, Debug)]
#[command(
    name = "objinfo",
    about = "Inspect loaded BPF maps and programs",
    after_help = "\
EXAMPLES:
    sudo objinfo show /sys/fs/bpf/my_map             Metadata of a pinned object
    sudo objinfo show --backend fdinfo /sys/fs/bpf/p  Force the /proc fdinfo backend
    sudo objinfo list --programs --json              All loaded programs as JSON
    objinfo ident .rodata ipv6_test                  Normalize raw names"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show metadata of an object pinned in bpffs
    Show {
        /// Path of the pin (e.g. /sys/fs/bpf/my_map)
        #[arg(value_name = "PIN")]
        pin: PathBuf,

        /// Where to read metadata from
        #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
        backend: BackendArg,
    },

    /// List every loaded map and program
    List {
        /// Only list maps
        #[arg(long)]
        maps: bool,

        /// Only list programs
        #[arg(long)]
        programs: bool,
    },

    /// Normalize raw names into generated-code identifiers
    Ident {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },
}

/// `--backend` values
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Native query, falling back to fdinfo on old kernels
    Auto,
    /// `BPF_OBJ_GET_INFO_BY_FD` only
    Native,
    /// `/proc/<pid>/fdinfo/<fd>` only
    Fdinfo,
}

impl BackendArg {
    /// The forced backend, `None` for automatic selection.
    #[must_use]
    pub fn forced(self) -> Option<Backend> {
        match self {
            Self::Auto => None,
            Self::Native => Some(Backend::Native),
            Self::Fdinfo => Some(Backend::FdInfo),
        }
    }
}
