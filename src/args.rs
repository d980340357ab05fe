use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::BuildError;
use crate::qa::dontknow;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Root directory containing <topic>/<file>.json inputs
    #[arg(long, default_value = "data")]
    pub data_root: PathBuf,

    /// Chunking configuration YAML
    #[arg(long, default_value = "configs/chunk_config.yaml")]
    pub chunk_config: PathBuf,

    /// Destination for the raw document table
    #[arg(long, default_value = "raw.parquet")]
    pub raw_output: PathBuf,

    /// Destination for the passage corpus table
    #[arg(long, default_value = "corpus.parquet")]
    pub corpus_output: PathBuf,

    /// Destination for the QA table
    #[arg(long, default_value = "qa.parquet")]
    pub qa_output: PathBuf,

    /// Number of passages to sample for QA synthesis
    #[arg(long, default_value_t = 200)]
    pub samples: usize,

    /// Sampling seed for reproducible runs (omit for a fresh draw)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Language for generated queries and answers
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Model used for query/answer generation
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// Temperature passed to the generation model
    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    /// Concurrent generation calls within one batch stage
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// API key for the generation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Stop after writing the raw document table (no generation needed)
    #[arg(long)]
    pub raw_only: bool,

    /// Stop after writing the corpus table (no generation needed)
    #[arg(long)]
    pub corpus_only: bool,

    /// Read the raw table from --raw-output instead of normalizing --data-root
    #[arg(long)]
    pub from_raw: bool,
}

impl Config {
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        if self.samples == 0 {
            return Err(BuildError::Configuration(
                "--samples must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(BuildError::Configuration(
                "--concurrency must be greater than zero".to_string(),
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(BuildError::Configuration(format!(
                "--temperature must be between 0.0 and 2.0 (got {})",
                self.temperature
            )));
        }
        if !dontknow::supported_languages().contains(&self.lang.as_str()) {
            return Err(BuildError::Configuration(format!(
                "unsupported language `{}`; expected one of {}",
                self.lang,
                dontknow::supported_languages().join(", ")
            )));
        }
        if self.raw_only && self.corpus_only {
            return Err(BuildError::Configuration(
                "--raw-only and --corpus-only are mutually exclusive".to_string(),
            ));
        }
        if self.raw_only && self.from_raw {
            return Err(BuildError::Configuration(
                "--raw-only does nothing when combined with --from-raw".to_string(),
            ));
        }
        if !self.raw_only && !self.corpus_only {
            self.api_key()?;
        }

        ensure_parent(&self.raw_output)?;
        ensure_parent(&self.corpus_output)?;
        if !self.raw_only && !self.corpus_only {
            ensure_parent(&self.qa_output)?;
        }
        Ok(())
    }

    pub fn api_key(&self) -> Result<&str, BuildError> {
        match self.openai_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(BuildError::Configuration(
                "an API key is required for QA generation; pass --openai-api-key or set OPENAI_API_KEY"
                    .to_string(),
            )),
        }
    }
}

pub fn parse() -> Result<Config, BuildError> {
    let mut config = Config::parse();
    config.finalize()?;
    Ok(config)
}

pub fn ensure_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config::parse_from(["ragset", "--openai-api-key", "test-key"])
    }

    #[test]
    fn defaults_pass_validation() {
        let mut config = base_config();
        assert!(config.finalize().is_ok());
        assert_eq!(config.samples, 200);
        assert_eq!(config.lang, "en");
    }

    #[test]
    fn zero_samples_is_rejected() {
        let mut config = Config::parse_from(["ragset", "--samples", "0"]);
        assert!(matches!(
            config.finalize(),
            Err(BuildError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let mut config = Config::parse_from(["ragset", "--lang", "tlh"]);
        assert!(matches!(
            config.finalize(),
            Err(BuildError::Configuration(_))
        ));
    }

    #[test]
    fn missing_api_key_fails_unless_generation_is_skipped() {
        let mut config = Config::parse_from(["ragset"]);
        config.openai_api_key = None;
        assert!(matches!(
            config.finalize(),
            Err(BuildError::Configuration(_))
        ));

        let mut raw_only = Config::parse_from(["ragset", "--raw-only"]);
        raw_only.openai_api_key = None;
        assert!(raw_only.finalize().is_ok());
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        let mut config = Config::parse_from(["ragset", "--raw-only", "--corpus-only"]);
        assert!(matches!(
            config.finalize(),
            Err(BuildError::Configuration(_))
        ));
    }
}
