use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// A loaded piece of text plus its source metadata. Chunks produced by the
/// splitter reuse this type, with metadata copied from the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: HashMap<String, String>) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Read one schema DDL file into a single document, recording the source
/// path in its metadata.
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;

    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), path.display().to_string());

    Ok(Document::new(text, metadata))
}
