//! Query-side commands: describe, retrieve, context, ask.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::Config;
use crate::graphrag::{
    ContextAssembler, DescriptionSynthesizer, EntityStore, QaPipeline, RetrievalResult, Retriever,
    VectorIndex,
};
use crate::prompts::Prompt;

/// Load the entity store and its index together.
pub fn load_data(config: &Config) -> Result<(EntityStore, VectorIndex)> {
    let store = EntityStore::load(&config.data.entities)
        .with_context(|| format!("failed to load {}", config.data.entities.display()))?;
    let index = VectorIndex::load(&config.data.index, &config.data.ids).with_context(|| {
        format!(
            "failed to load index {} / {}",
            config.data.index.display(),
            config.data.ids.display()
        )
    })?;
    Ok((store, index))
}

/// Full pipeline with the configured backends and prompt.
pub fn load_pipeline(config: &Config) -> Result<QaPipeline> {
    let (store, index) = load_data(config)?;
    let embedder = config.embedder().context("failed to set up embedder")?;
    let generator = config.generator().context("failed to set up generator")?;

    let pipeline = QaPipeline::new(
        store,
        index,
        config.vocabulary.clone(),
        embedder,
        generator,
    )?
    .with_top_k(config.top_k)
    .with_max_tokens(config.generation.max_tokens)
    .with_template(Prompt::GroundedAnswer.load_or_builtin());

    Ok(pipeline)
}

/// `describe` command.
pub fn describe(config: &Config, id: &str) -> Result<()> {
    let store = EntityStore::load(&config.data.entities)
        .with_context(|| format!("failed to load {}", config.data.entities.display()))?;
    let synth = DescriptionSynthesizer::new(&store).with_label_key(&config.vocabulary.label_key);

    match synth.describe(id) {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => bail!("unknown entity id: {}", id),
    }
}

async fn retrieve_detailed(
    config: &Config,
    store: &EntityStore,
    index: &VectorIndex,
    question: &str,
    top_k: usize,
) -> Result<RetrievalResult> {
    let embedder = config.embedder().context("failed to set up embedder")?;
    index.ensure_compatible(embedder.dimension())?;

    let retriever = Retriever::new(store, index, &config.vocabulary, embedder.as_ref());
    Ok(retriever.retrieve_detailed(question, top_k).await?)
}

fn label<'a>(store: &'a EntityStore, config: &Config, id: &str) -> &'a str {
    store
        .get(id)
        .and_then(|attrs| attrs.first(&config.vocabulary.label_key))
        .unwrap_or("-")
}

/// `retrieve` command.
pub async fn retrieve(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let (store, index) = load_data(config)?;
    let top_k = top_k.unwrap_or(config.top_k);
    let result = retrieve_detailed(config, &store, &index, question, top_k).await?;

    println!("Semantic matches (top {}):", top_k);
    for (rank, hit) in result.semantic.iter().enumerate() {
        println!(
            "{:>3}. {:.4}  {}  {}",
            rank + 1,
            hit.score,
            hit.id,
            label(&store, config, &hit.id)
        );
    }

    if let Some(country) = &result.country {
        println!("\nLanguages of {} ({}):", country.name, country.id);
        if result.expanded.is_empty() {
            println!("  (none in store)");
        }
        for id in &result.expanded {
            println!("  {}  {}", id, label(&store, config, id));
        }
    }

    Ok(())
}

/// `context` command.
pub async fn context(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let (store, index) = load_data(config)?;
    let top_k = top_k.unwrap_or(config.top_k);
    let ids = retrieve_detailed(config, &store, &index, question, top_k)
        .await?
        .ids();

    let (context, has_real_info) =
        ContextAssembler::new(&store, &config.vocabulary).build_context(question, &ids);

    println!("{}", context);
    println!("has_real_info: {}", has_real_info);
    Ok(())
}

/// `ask` command.
pub async fn ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let pipeline = load_pipeline(config)?;
    let top_k = top_k.unwrap_or(pipeline.top_k());

    let answer = pipeline
        .answer_with(question, top_k)
        .await
        .context("failed to answer question")?;

    info!(
        "Answered from {} retrieved entities (has_real_info: {})",
        answer.retrieved.len(),
        answer.has_real_info
    );
    println!("{}", answer.text);
    Ok(())
}
