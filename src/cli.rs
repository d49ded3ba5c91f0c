//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use relgen_core::Schema;
use relgen_pipeline::PipelineConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relgen")]
#[command(about = "Generate referentially consistent rows for related tables")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate every table of a schema into CSV files
    Generate(GenerateArgs),

    /// Print the order in which tables are generated
    Order {
        /// Path to the schema YAML file
        #[arg(long, short = 's')]
        schema: PathBuf,

        /// Print dependents first instead
        #[arg(long)]
        reverse: bool,
    },

    /// Validate a schema and its table references
    Validate {
        /// Path to the schema YAML file
        #[arg(long, short = 's')]
        schema: PathBuf,
    },
}

/// Arguments of the `generate` command.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Path to the schema YAML file
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Output directory for CSV files (one file per table)
    #[arg(long, short = 'o')]
    pub output_dir: PathBuf,

    /// Seed for reproducible output (overrides the schema seed)
    #[arg(long, env = "RELGEN_SEED")]
    pub seed: Option<u64>,

    /// Worker threads (overrides `settings.workers`)
    #[arg(long, env = "RELGEN_WORKERS")]
    pub workers: Option<usize>,

    /// Bound of every topic queue (overrides `settings.queue_capacity`)
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// PostgreSQL connection string for `database_sequence` columns
    #[arg(long, env = "RELGEN_DATABASE_URL")]
    pub database_url: Option<String>,
}

impl GenerateArgs {
    /// Build the pipeline configuration: schema settings overridden by flags.
    pub fn pipeline_config(&self, schema: &Schema) -> PipelineConfig {
        let mut config = PipelineConfig::from_schema(schema);
        if self.seed.is_some() {
            config = config.with_seed(self.seed);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        config
    }

    /// Worker threads: flag, then schema setting, then available parallelism.
    pub fn worker_threads(&self, schema: &Schema) -> usize {
        self.workers
            .or(schema.settings.workers)
            .filter(|workers| *workers > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(usize::from)
                    .unwrap_or(1)
            })
    }
}
