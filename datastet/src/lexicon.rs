//! Read-only lexical resources shared by all pipeline stages.
//!
//! A [`Lexicon`] is built once, either from the files named in
//! [`LexiconConfig`] or from the built-in lists, and then shared behind an
//! `Arc` by every document processed.

use crate::config::LexiconConfig;
use crate::{DatastetError, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

const BUILTIN_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "et", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "may",
    "me", "more", "most", "must", "my", "no", "nor", "not", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "us", "very", "via",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "within", "without", "would", "you", "your", "yours",
];

const BUILTIN_DOI_PREFIXES: &[&str] = &[
    "10.5281", "10.5061", "10.6084", "10.1594", "10.17632", "10.7910", "10.17605", "10.15468",
    "10.3886", "10.34740",
];

const BUILTIN_URL_DOMAINS: &[&str] = &[
    "zenodo.org",
    "datadryad.org",
    "figshare.com",
    "osf.io",
    "github.com",
    "identifiers.org",
    "pangaea.de",
    "dataverse.harvard.edu",
    "data.mendeley.com",
    "kaggle.com",
    "ncbi.nlm.nih.gov",
    "ebi.ac.uk",
    "gbif.org",
    "icpsr.umich.edu",
    "openneuro.org",
    "physionet.org",
    "huggingface.co",
];

const BUILTIN_BLACKLIST: &[&str] = &[
    "data", "dataset", "datasets", "database", "databases", "data set", "data sets", "corpus",
    "sample", "samples", "table", "figure", "supplementary", "supplementary material",
];

const DOI_PREFIXES_TO_STRIP: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

/// Term statistics and word lists used to judge dataset mentions
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    idf: HashMap<String, f64>,
    stopwords: HashSet<String>,
    doi_prefixes: HashSet<String>,
    url_domains: Vec<String>,
    blacklist: HashSet<String>,
}

impl Lexicon {
    /// Lexicon made of the built-in lists and an empty idf table.
    pub fn builtin() -> Self {
        Self {
            idf: HashMap::new(),
            stopwords: BUILTIN_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            doi_prefixes: BUILTIN_DOI_PREFIXES.iter().map(|s| s.to_string()).collect(),
            url_domains: BUILTIN_URL_DOMAINS.iter().map(|s| s.to_string()).collect(),
            blacklist: BUILTIN_BLACKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build the lexicon from configured files, falling back to the built-in
    /// list for every file that is not configured.
    pub fn from_config(config: &LexiconConfig) -> Result<Self> {
        let mut lexicon = Self::builtin();

        if let Some(path) = &config.idf_file {
            lexicon.idf = load_idf(path)?;
        }
        if let Some(path) = &config.stopwords_file {
            lexicon.stopwords = load_list(path)?.into_iter().collect();
        }
        if let Some(path) = &config.doi_prefixes_file {
            lexicon.doi_prefixes = load_list(path)?.into_iter().collect();
        }
        if let Some(path) = &config.url_domains_file {
            lexicon.url_domains = load_list(path)?
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect();
        }
        if let Some(path) = &config.blacklist_file {
            lexicon.blacklist = load_list(path)?
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect();
        }

        info!(
            idf_terms = lexicon.idf.len(),
            stopwords = lexicon.stopwords.len(),
            doi_prefixes = lexicon.doi_prefixes.len(),
            url_domains = lexicon.url_domains.len(),
            "Lexicon loaded"
        );
        Ok(lexicon)
    }

    /// Add or replace one idf entry.
    pub fn with_idf(mut self, term: impl Into<String>, idf: f64) -> Self {
        self.idf.insert(term.into(), idf);
        self
    }

    /// Add one stopword.
    pub fn with_stopword(mut self, word: impl Into<String>) -> Self {
        self.stopwords.insert(word.into());
        self
    }

    /// Idf of a term, if the corpus statistics know it.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Idf of a term, 0.0 when unknown.
    pub fn term_idf(&self, term: &str) -> f64 {
        self.idf(term).unwrap_or(0.0)
    }

    /// Stopword lookup. Single characters are compared lower-cased, longer
    /// words exactly.
    pub fn is_english_stopword(&self, word: &str) -> bool {
        if word.chars().count() == 1 {
            self.stopwords.contains(&word.to_lowercase())
        } else {
            self.stopwords.contains(word)
        }
    }

    /// Whether a dataset name is too generic to be kept.
    pub fn is_blacklisted_named_dataset(&self, name: &str) -> bool {
        self.blacklist.contains(&name.trim().to_lowercase())
    }

    /// Whether a DOI (bare, `doi:` or resolver URL) has a data repository prefix.
    pub fn is_dataset_doi(&self, doi: &str) -> bool {
        let mut doi = doi.trim().to_lowercase();
        for prefix in DOI_PREFIXES_TO_STRIP {
            if let Some(rest) = doi.strip_prefix(prefix) {
                doi = rest.to_string();
                break;
            }
        }
        let prefix = doi.split('/').next().unwrap_or_default();
        !prefix.is_empty() && self.doi_prefixes.contains(prefix)
    }

    /// Whether a URL points to a known data repository.
    pub fn is_dataset_url(&self, url: &str) -> bool {
        let mut host = url.trim().to_lowercase();
        for protocol in ["https://", "http://", "ftp://"] {
            if let Some(rest) = host.strip_prefix(protocol) {
                host = rest.to_string();
                break;
            }
        }
        if let Some(rest) = host.strip_prefix("www.") {
            host = rest.to_string();
        }
        let host = host.split(['/', '?', '#']).next().unwrap_or_default();
        let host = host.split(':').next().unwrap_or_default();
        if host.is_empty() {
            return false;
        }

        self.url_domains
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{}", domain)))
    }

    pub fn is_dataset_url_or_doi(&self, value: &str) -> bool {
        self.is_dataset_doi(value) || self.is_dataset_url(value)
    }

    /// Drop the stopwords a string starts with, compared case-insensitively.
    pub fn remove_leading_english_stopwords(&self, text: &str) -> String {
        let mut rest = text.trim_start();
        while let Some(word) = rest.split_whitespace().next() {
            if !self.stopwords.contains(&word.to_lowercase()) {
                break;
            }
            rest = rest[word.len()..].trim_start();
        }
        rest.to_string()
    }
}

/// Read a `term<TAB>idf` table. Blank lines and `#` comments are skipped.
fn load_idf(path: &Path) -> Result<HashMap<String, f64>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DatastetError::Lexicon(format!("cannot read idf file {}: {}", path.display(), e))
    })?;

    let mut table = HashMap::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (term, value) = line.rsplit_once('\t').ok_or_else(|| {
            DatastetError::Lexicon(format!(
                "{}:{}: expected term<TAB>idf",
                path.display(),
                number + 1
            ))
        })?;
        let idf: f64 = value.trim().parse().map_err(|_| {
            DatastetError::Lexicon(format!(
                "{}:{}: invalid idf value {:?}",
                path.display(),
                number + 1,
                value
            ))
        })?;
        table.insert(term.to_string(), idf);
    }

    debug!(path = %path.display(), terms = table.len(), "Loaded idf table");
    Ok(table)
}

/// Read one entry per line. Blank lines and `#` comments are skipped.
fn load_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DatastetError::Lexicon(format!("cannot read {}: {}", path.display(), e))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
