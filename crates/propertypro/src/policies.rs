//! Policy documents used to ground ticket replies.
//!
//! Every file in the policy directory is one document. Retrieval ranks
//! documents by how many distinct query words they contain.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::info;

const SAMPLE_POLICIES: [(&str, &str); 5] = [
    (
        "maintenance.txt",
        "Maintenance requests should be submitted through the portal. Emergency maintenance is available 24/7.",
    ),
    (
        "billing.txt",
        "Rent is due on the 1st of each month. Late fees apply after the 5th.",
    ),
    (
        "noise.txt",
        "Quiet hours are from 10 PM to 7 AM. Excessive noise complaints may result in lease violations.",
    ),
    (
        "security.txt",
        "All visitors must be registered at the front desk. Security cameras are in operation 24/7.",
    ),
    (
        "general.txt",
        "Office hours are Monday-Friday 9 AM to 5 PM. Emergency contact available after hours.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    pub source: String,
    pub content: String,
}

/// Retrieval over the policy set.
pub trait PolicySearch: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Vec<PolicyDocument>;
}

#[derive(Debug, Clone, Default)]
pub struct PolicyLibrary {
    documents: Vec<(PolicyDocument, BTreeSet<String>)>,
}

impl PolicyLibrary {
    /// Loads every file in `dir`, creating and seeding it with the sample
    /// policies when it does not exist yet.
    pub fn load(dir: &Path) -> io::Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            for (name, content) in SAMPLE_POLICIES {
                fs::write(dir.join(name), content)?;
            }
            info!(directory = %dir.display(), "seeded sample policies");
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            documents.push(PolicyDocument {
                source: entry.file_name().to_string_lossy().into_owned(),
                content: fs::read_to_string(entry.path())?,
            });
        }

        info!(count = documents.len(), "loaded policy documents");
        Ok(Self::from_documents(documents))
    }

    pub fn from_documents(documents: Vec<PolicyDocument>) -> Self {
        let mut documents: Vec<_> = documents
            .into_iter()
            .map(|document| {
                let terms = terms(&document.content);
                (document, terms)
            })
            .collect();
        documents.sort_by(|(a, _), (b, _)| a.source.cmp(&b.source));
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PolicySearch for PolicyLibrary {
    fn search(&self, query: &str, limit: usize) -> Vec<PolicyDocument> {
        let query = terms(query);
        let mut scored: Vec<(usize, &PolicyDocument)> = self
            .documents
            .iter()
            .map(|(document, doc_terms)| (query.intersection(doc_terms).count(), document))
            .collect();
        // Stable sort keeps file-name order between equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, document)| document.clone())
            .collect()
    }
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 2)
        .map(str::to_lowercase)
        .collect()
}
