//! TF-IDF weighting. TF is computed eagerly at ingestion time and
//! stored on each posting; IDF is applied lazily at query time using
//! the finalized document count and postings-list length.

/// Document-normalized term frequency: occurrences over document
/// length. Callers guarantee `doc_len > 0` (empty documents never
/// reach TF computation).
pub fn term_frequency(occurrences: usize, doc_len: usize) -> f32 {
    occurrences as f32 / doc_len as f32
}

/// `ln(total_docs / (1 + containing_docs))`. The +1 damping keeps the
/// ratio finite; a term with no postings never reaches this function
/// because it has no index key.
pub fn inverse_document_frequency(total_docs: usize, containing_docs: usize) -> f32 {
    (total_docs as f32 / (1 + containing_docs) as f32).ln()
}
