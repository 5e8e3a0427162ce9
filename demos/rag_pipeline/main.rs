//! # RAG Pipeline
//!
//! Loads the index written by `build_index`, retrieves the top-K chunks for
//! the question, prepends them to the prompt and generates an answer. Each
//! stage is timed and reported as it finishes.
//!
//! Run: `cargo run --release --bin build_index && cargo run --release --bin rag_pipeline`

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use granite_mistralrs::{MistralRsEmbedder, MistralRsGenerator};
use granite_rag::telemetry::init_logging;
use granite_rag::{FlatIndex, GenerationRunner, RagPipeline, RagSettings, Reporter, Retriever};
use tracing::info;

const SETTINGS_FILE: &str = "granite-rag.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let settings = RagSettings::load_or_default(SETTINGS_FILE)?;
    settings.retrieval.validate()?;

    // A missing index must fail before any model loads.
    let index = FlatIndex::load_trusted(&settings.index_path).await.with_context(|| {
        format!(
            "failed to open the index at '{}'; run build_index first",
            settings.index_path.display()
        )
    })?;

    let embedder = MistralRsEmbedder::load(
        &settings.index.embedding_model,
        settings.index.embedding_dimensions,
    )
    .await
    .context("failed to load the embedding model")?;
    let retriever = Retriever::from_index(index, Arc::new(embedder), settings.retrieval.clone())?;

    let generator = MistralRsGenerator::from_generation_config(&settings.generation)
        .await
        .context("failed to load the instruct model")?;
    let pipeline = RagPipeline::builder()
        .retriever(retriever)
        .runner(GenerationRunner::new(Arc::new(generator), settings.generation.options())?)
        .build()?;

    let question = settings.question.as_str();
    let mut report = Reporter::stdout();

    let started = Instant::now();
    report.header("A. RETRIEVING CONTEXT FROM VECTOR STORE")?;
    let retrieval = pipeline.retrieve(question).await?;
    report.time_metric("Retrieval time", retrieval.elapsed)?;
    report.metric("Retrieved", format!("{} document(s)", retrieval.results.len()))?;
    report.line("Context:")?;
    report.content(&retrieval.context)?;

    report.blank()?;
    report.header("B. BUILDING QUESTION WITH CONTEXT PROMPT")?;
    let prompt = pipeline.compose(question, &retrieval)?;
    report.time_metric("Prompt building time", prompt.elapsed)?;
    report.line("Full prompt:")?;
    report.content(&prompt.rendered)?;

    report.blank()?;
    report.header("C. INFERENCE USING GRANITE")?;
    let generation = pipeline.generate(&prompt).await?;
    report.inference_stats(&generation.stats)?;
    report.generated_output(&generation.text)?;

    let total = started.elapsed();
    info!(total_ms = total.as_millis() as u64, "rag pipeline completed");
    report.blank()?;
    report.time_metric("End-to-end time", total)?;
    Ok(())
}
