//! Command implementations behind the CLI.

use crate::cli::GenerateArgs;
use crate::csv_sink::CsvSinkFactory;
use anyhow::Context;
use relgen_core::Schema;
use relgen_generator::{GeneratorContext, PostgresSequenceSource};
use relgen_graph::Topology;
use relgen_pipeline::{Orchestrator, PipelineOutcome};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load and validate a schema file.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    Schema::from_file(path).with_context(|| format!("Failed to load schema from {path:?}"))
}

/// Run the pipeline for `schema`, writing CSV files into the output directory.
///
/// Ctrl+C cancels the run; cancelled tables are reported in the outcome.
pub async fn generate(schema: Schema, args: &GenerateArgs) -> anyhow::Result<PipelineOutcome> {
    let config = args.pipeline_config(&schema);

    let mut context = GeneratorContext::new();
    if let Some(url) = &args.database_url {
        let source = PostgresSequenceSource::connect(url)
            .await
            .context("Failed to connect to the identifier database")?;
        context = context.with_database_ids(Arc::new(source));
    }

    let sinks = CsvSinkFactory::new(&args.output_dir);
    let orchestrator =
        Orchestrator::new(schema, config, Arc::new(sinks)).with_generator_context(context);

    let cancel = orchestrator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal (Ctrl+C)");
            cancel.cancel();
        }
    });

    let outcome = orchestrator.run().await;
    interrupt.abort();
    outcome.context("Failed to start pipeline")
}

/// Table names in generation order, or dependents first when `reverse`.
pub fn order(schema: &Schema, reverse: bool) -> anyhow::Result<Vec<String>> {
    let topology = Topology::build(schema).context("Invalid table references")?;
    Ok(if reverse {
        topology.dependency_order()
    } else {
        topology.generation_order().to_vec()
    })
}

/// Validate references and describe the stream wiring.
pub fn validate(schema: &Schema) -> anyhow::Result<Vec<String>> {
    let topology = Topology::build(schema).context("Invalid table references")?;

    let mut lines = vec![format!(
        "Schema is valid: {} tables, {} streams",
        schema.tables.len(),
        topology.stream_keys().len()
    )];
    for subscription in topology.subscriptions() {
        lines.push(format!(
            "  {}.{} <- {} ({:?})",
            subscription.table, subscription.column, subscription.key, subscription.policy
        ));
    }
    Ok(lines)
}
