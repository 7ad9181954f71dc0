use crate::error::{IndexError, Result};
use crate::postings::{DocId, Posting, PostingsList};
use crate::score;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Mutable, ingestion-phase inverted index. Finalizing consumes the
/// builder and yields the read-only [`Index`], so querying a
/// half-built index or ingesting into a finalized one is not
/// representable.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: HashMap<String, PostingsList>,
    documents: HashSet<DocId>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one tokenized document. Each distinct term contributes
    /// exactly one posting carrying its full-document TF, no matter
    /// how many times it occurs. A document that tokenized to nothing
    /// contributes no postings but still counts toward the corpus
    /// size.
    pub fn add_document(&mut self, doc_id: DocId, terms: &[String]) {
        self.documents.insert(doc_id);
        if terms.is_empty() {
            tracing::debug!(doc_id, "document empty after normalization");
            return;
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for term in terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
        for (term, occurrences) in counts {
            let tf = score::term_frequency(occurrences, terms.len());
            self.postings
                .entry(term.to_string())
                .or_default()
                .insert(doc_id, tf);
        }
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    /// Sort terms lexicographically and build every list's skip
    /// overlay. Skip placement depends on final list lengths, which
    /// is why this runs once, after all ingestion.
    pub fn finalize(self) -> Index {
        let num_docs = self.documents.len();
        let mut postings: BTreeMap<String, PostingsList> = self.postings.into_iter().collect();
        for list in postings.values_mut() {
            list.build_skips();
        }
        tracing::info!(num_docs, num_terms = postings.len(), "index finalized");
        Index { postings, num_docs }
    }
}

/// Finalized, read-only inverted index. Never mutated after
/// construction, so concurrent queries can share it freely.
#[derive(Debug)]
pub struct Index {
    postings: BTreeMap<String, PostingsList>,
    num_docs: usize,
}

impl Index {
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    /// Terms in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn postings_list(&self, term: &str) -> Result<&PostingsList> {
        self.postings
            .get(term)
            .ok_or_else(|| IndexError::TermNotFound(term.to_string()))
    }

    /// Materialized postings for a term, traversed plainly or via the
    /// skip overlay. Both paths yield the same sequence.
    pub fn get_postings(&self, term: &str, use_skips: bool) -> Result<Vec<Posting>> {
        let list = self.postings_list(term)?;
        if use_skips {
            list.traverse_with_skips()
        } else {
            Ok(list.traverse().to_vec())
        }
    }

    /// Query-time IDF for a term, with the document frequency taken
    /// from the postings-list length.
    pub fn idf(&self, term: &str) -> Result<f32> {
        let list = self.postings_list(term)?;
        Ok(score::inverse_document_frequency(self.num_docs, list.len()))
    }
}
