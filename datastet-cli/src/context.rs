use datastet::config::{ConfigLoader, DatastetConfig};
use datastet::prelude::*;
use std::path::Path;
use std::sync::Arc;

pub struct DatastetCliContext {
    pub config: DatastetConfig,
    pub lexicon: Arc<Lexicon>,
}

impl DatastetCliContext {
    /// Load the configuration (explicit file, else default locations, then
    /// environment) and the lexicon it names.
    pub fn new(config_file: Option<&Path>) -> datastet::Result<Self> {
        let mut loader = ConfigLoader::new();
        match config_file {
            Some(path) => {
                loader.load_file(path)?;
            }
            None => {
                loader.load_default_files();
            }
        }
        let config = loader.load_env().extract()?;
        Self::with_config(config)
    }

    pub fn with_config(config: DatastetConfig) -> datastet::Result<Self> {
        let lexicon = Arc::new(Lexicon::from_config(&config.lexicon)?);
        Ok(Self { config, lexicon })
    }

    /// A processor for documents that carry their own labels.
    pub fn processor(&self, propagation: bool) -> datastet::Result<DocumentProcessor> {
        let mut config = self.config.clone();
        config.propagation.enabled &= propagation;
        DocumentProcessor::from_config(&config, Arc::clone(&self.lexicon), Arc::new(FixedTagger::new()))
    }
}
