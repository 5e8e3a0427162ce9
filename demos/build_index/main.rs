//! # Build Index
//!
//! Reads the source document, splits it into overlapping chunks, embeds every
//! chunk with the Granite embedding model and saves the index to disk.
//!
//! Settings come from `granite-rag.json` in the working directory when it
//! exists; otherwise `demos/data/mtv.md` is indexed into `vector_index/`.
//!
//! Run: `cargo run --release --bin build_index`

use std::sync::Arc;

use anyhow::Context;
use granite_mistralrs::MistralRsEmbedder;
use granite_rag::telemetry::init_logging;
use granite_rag::{Document, IndexBuilder, RagSettings, Reporter};
use tracing::info;

const SETTINGS_FILE: &str = "granite-rag.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Bad chunking parameters and an unreadable source must fail before the
    // embedding model loads.
    let settings = RagSettings::load_or_default(SETTINGS_FILE)?;
    settings.index.validate()?;
    info!(source = %settings.source_document.display(), "building index");
    let document = Document::load(&settings.source_document).await?;

    let embedder = MistralRsEmbedder::load(
        &settings.index.embedding_model,
        settings.index.embedding_dimensions,
    )
    .await
    .context("failed to load the embedding model")?;

    let builder = IndexBuilder::new(settings.index.clone(), Arc::new(embedder))?;
    let summary = builder.build_document(&document, &settings.index_path).await?;

    Reporter::stdout().success(&format!(
        "Vector store created and saved to '{}'.",
        summary.path.display()
    ))?;
    Ok(())
}
