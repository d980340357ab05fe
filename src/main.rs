use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ragset::args::{self, Config};
use ragset::generate::OpenAiGenerator;
use ragset::{chunk, export, normalize, pipeline};

fn main() -> anyhow::Result<()> {
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .worker_threads(std::thread::available_parallelism()?.get())
        .thread_name("ragset-worker")
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let config = args::parse()?;

    if config.raw_only {
        return build_raw_only(&config);
    }
    if config.corpus_only {
        return build_corpus_only(&config);
    }

    let generator = OpenAiGenerator::new(config.api_key()?, &config.model, config.temperature);
    let dataset = pipeline::run_build(&config, Arc::new(generator))
        .await
        .context("building QA dataset")?;

    println!(
        "Saved QA dataset to {} (samples: {}), corpus to {}",
        config.qa_output.display(),
        dataset.qa.len(),
        config.corpus_output.display()
    );
    Ok(())
}

fn build_raw_only(config: &Config) -> anyhow::Result<()> {
    let raw = normalize::build_raw(&config.data_root)
        .with_context(|| format!("normalizing documents under {}", config.data_root.display()))?;
    export::write_raw(&raw, &config.raw_output)
        .with_context(|| format!("writing raw table to {}", config.raw_output.display()))?;

    println!(
        "Saved {} documents to {}",
        raw.len(),
        config.raw_output.display()
    );
    Ok(())
}

fn build_corpus_only(config: &Config) -> anyhow::Result<()> {
    let raw = if config.from_raw {
        export::read_raw(&config.raw_output)
            .with_context(|| format!("reading raw table from {}", config.raw_output.display()))?
    } else {
        normalize::build_raw(&config.data_root)
            .with_context(|| format!("normalizing documents under {}", config.data_root.display()))?
    };

    let settings = chunk::ChunkSettings::load(&config.chunk_config).with_context(|| {
        format!(
            "loading chunk config from {}",
            config.chunk_config.display()
        )
    })?;
    let corpus = chunk::run_chunking(&raw, &settings).context("splitting documents into passages")?;
    corpus
        .validate_against(&raw)
        .context("validating corpus back-references")?;

    if !config.from_raw {
        export::write_raw(&raw, &config.raw_output)
            .with_context(|| format!("writing raw table to {}", config.raw_output.display()))?;
    }
    export::write_corpus(&corpus, &config.corpus_output).with_context(|| {
        format!(
            "writing corpus table to {}",
            config.corpus_output.display()
        )
    })?;

    info!(
        documents = raw.len(),
        passages = corpus.len(),
        "corpus build finished"
    );
    println!(
        "Saved {} passages to {}",
        corpus.len(),
        config.corpus_output.display()
    );
    Ok(())
}
