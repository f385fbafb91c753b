//! Offline index construction: describe every entity, embed, persist.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::graphrag::{DescriptionSynthesizer, EntityStore, VectorIndex};
use crate::Error;

/// Default number of descriptions per embedding call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Embed the description of every entity, in store order.
///
/// The index dimension is taken from the embedder when it is known up
/// front, otherwise from the first returned vector.
pub async fn build_index(
    store: &EntityStore,
    embedder: &dyn Embedder,
    batch_size: usize,
    label_key: &str,
) -> crate::Result<VectorIndex> {
    let synth = DescriptionSynthesizer::new(store).with_label_key(label_key);
    let entries: Vec<(&str, String)> = store
        .iter()
        .map(|(id, attrs)| (id, synth.describe_attributes(attrs)))
        .collect();

    let mut index = VectorIndex::new(embedder.dimension().unwrap_or(0));
    if entries.is_empty() {
        return Ok(index);
    }

    let batch_size = batch_size.max(1);
    for (idx, chunk) in entries.chunks(batch_size).enumerate() {
        let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "batch {}: expected {} embeddings, got {}",
                idx + 1,
                chunk.len(),
                vectors.len()
            )));
        }

        if index.dimension() == 0 {
            let dimension = vectors.first().map(Vec::len).unwrap_or(0);
            index = VectorIndex::new(dimension);
        }

        for ((id, _), vector) in chunk.iter().zip(&vectors) {
            index.add(id.to_string(), vector)?;
        }
        debug!(
            "Indexed batch {} ({} entities), total: {}",
            idx + 1,
            chunk.len(),
            index.len()
        );
    }

    info!(
        "Index ready: {} entities, dimension {}",
        index.len(),
        index.dimension()
    );
    Ok(index)
}

/// `build-index` command.
pub async fn run(config: &Config, batch_size: usize) -> Result<()> {
    let store = EntityStore::load(&config.data.entities)
        .with_context(|| format!("failed to load {}", config.data.entities.display()))?;
    let embedder = config.embedder().context("failed to set up embedder")?;

    let index = build_index(
        &store,
        embedder.as_ref(),
        batch_size,
        &config.vocabulary.label_key,
    )
    .await
    .context("failed to build index")?;

    index
        .save(&config.data.index, &config.data.ids)
        .context("failed to save index")?;

    println!(
        "Indexed {} entities (dim {}) -> {}, {}",
        index.len(),
        index.dimension(),
        config.data.index.display(),
        config.data.ids.display()
    );
    Ok(())
}
