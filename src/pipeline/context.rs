use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::args::Config;
use crate::generate::QueryAnswerGenerator;
use crate::qa::QaTable;
use crate::schema::{CorpusStore, QaDataset, RawStore, SampledPassage};

/// State threaded through the build stages. Each stage fills in the slot
/// the next one depends on.
pub struct BuildContext<'a> {
    config: &'a Config,
    pub generator: Arc<dyn QueryAnswerGenerator>,
    pub raw: Option<RawStore>,
    pub corpus: Option<CorpusStore>,
    pub samples: Option<Vec<SampledPassage>>,
    pub table: Option<QaTable>,
    pub dataset: Option<QaDataset>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Config, generator: Arc<dyn QueryAnswerGenerator>) -> Self {
        Self {
            config,
            generator,
            raw: None,
            corpus: None,
            samples: None,
            table: None,
            dataset: None,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn raw(&self) -> Result<&RawStore> {
        self.raw
            .as_ref()
            .ok_or_else(|| anyhow!("raw store not prepared yet"))
    }

    pub fn corpus(&self) -> Result<&CorpusStore> {
        self.corpus
            .as_ref()
            .ok_or_else(|| anyhow!("corpus not prepared yet"))
    }

    pub fn samples(&self) -> Result<&[SampledPassage]> {
        self.samples
            .as_deref()
            .ok_or_else(|| anyhow!("passages not sampled yet"))
    }

    pub fn table(&self) -> Result<&QaTable> {
        self.table
            .as_ref()
            .ok_or_else(|| anyhow!("QA table not synthesized yet"))
    }

    pub fn into_dataset(self) -> Result<QaDataset> {
        self.dataset
            .ok_or_else(|| anyhow!("build finished without producing a dataset"))
    }
}
