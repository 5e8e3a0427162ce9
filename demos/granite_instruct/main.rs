//! # Granite Instruct
//!
//! Asks the instruct model a single question with no retrieved context and
//! prints latency and throughput.
//!
//! Run: `cargo run --release --bin granite_instruct`

use std::sync::Arc;

use anyhow::Context;
use granite_mistralrs::MistralRsGenerator;
use granite_rag::telemetry::init_logging;
use granite_rag::{DirectPipeline, GenerationRunner, RagSettings, Reporter};

const SETTINGS_FILE: &str = "granite-rag.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let settings = RagSettings::load_or_default(SETTINGS_FILE)?;
    let generator = MistralRsGenerator::from_generation_config(&settings.generation)
        .await
        .context("failed to load the instruct model")?;
    let runner = GenerationRunner::new(Arc::new(generator), settings.generation.options())?;

    let outcome = DirectPipeline::new(runner).run(&settings.question).await?;

    let mut report = Reporter::stdout();
    report.inference_stats(&outcome.generation.stats)?;
    report.generated_output(&outcome.generation.text)?;
    Ok(())
}
