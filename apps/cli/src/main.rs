//! mempool CLI - drive the first-fit pool and the pool-backed list.

mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mempool::CoalescePolicy;

/// Self-managed first-fit memory pool.
#[derive(Parser)]
#[command(name = "mempool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file with a `[pool]` table
    #[arg(short, long, global = true, env = "MEMPOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Coalescing policy; overrides the config file
    #[arg(long, global = true, value_enum)]
    coalesce: Option<CoalesceArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a pool-backed list and print it
    List {
        /// Pool size in bytes
        #[arg(short, long, default_value = "1024")]
        size: usize,

        /// Values appended in order
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        insert: Vec<u16>,

        /// Values deleted after all inserts
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        delete: Vec<u16>,

        /// Value to look up
        #[arg(long)]
        search: Option<u16>,
    },

    /// Hammer one pool from several threads and verify it afterwards
    Stress {
        /// Pool size in bytes
        #[arg(short, long, default_value = "65536")]
        size: usize,

        /// Worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Operations per thread
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },

    /// Print the block directory after a scripted allocation sequence
    Inspect {
        /// Pool size in bytes
        #[arg(short, long, default_value = "256")]
        size: usize,

        /// Block sizes allocated in order
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        alloc: Vec<usize>,

        /// Positions (0-based) in the `--alloc` list to free afterwards
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        free: Vec<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CoalesceArg {
    Forward,
    Bidirectional,
}

impl From<CoalesceArg> for CoalescePolicy {
    fn from(arg: CoalesceArg) -> Self {
        match arg {
            CoalesceArg::Forward => Self::Forward,
            CoalesceArg::Bidirectional => Self::Bidirectional,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let mut pool_config = config::load(cli.config.as_deref())?;
    if let Some(coalesce) = cli.coalesce {
        pool_config.coalesce = coalesce.into();
    }

    match cli.command {
        Commands::List {
            size,
            insert,
            delete,
            search,
        } => commands::list::run(pool_config, size, &insert, &delete, search),
        Commands::Stress {
            size,
            threads,
            iterations,
        } => commands::stress::run(pool_config, size, threads, iterations),
        Commands::Inspect { size, alloc, free } => {
            commands::inspect::run(pool_config, size, &alloc, &free)
        }
    }
}
