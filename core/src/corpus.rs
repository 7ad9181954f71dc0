//! Corpus ingestion: tab-separated lines of `doc_id \t body`.

use crate::error::{IndexError, Result};
use crate::index::{Index, IndexBuilder};
use crate::postings::DocId;
use crate::tokenizer::tokenize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Split one corpus line into `(doc_id, body)`.
pub fn parse_line(line: &str) -> Result<(DocId, String)> {
    let (id, body) = line
        .split_once('\t')
        .ok_or_else(|| IndexError::MalformedLine(line.to_string()))?;
    let doc_id: DocId = id
        .trim()
        .parse()
        .map_err(|_| IndexError::MalformedLine(line.to_string()))?;
    Ok((doc_id, body.to_string()))
}

/// Read a corpus file, skipping blank lines.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<(DocId, String)>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(parse_line(&line)?);
    }
    Ok(docs)
}

/// Read, tokenize, ingest, and finalize a corpus file in one pass.
pub fn build_index<P: AsRef<Path>>(path: P) -> anyhow::Result<Index> {
    let docs = read_corpus(path.as_ref())?;
    tracing::info!(path = %path.as_ref().display(), num_docs = docs.len(), "ingesting corpus");
    let mut builder = IndexBuilder::new();
    for (doc_id, body) in docs {
        builder.add_document(doc_id, &tokenize(&body));
    }
    Ok(builder.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_lines() {
        let (doc_id, body) = parse_line("42\tthe cat sat on the mat").unwrap();
        assert_eq!(doc_id, 42);
        assert_eq!(body, "the cat sat on the mat");
    }

    #[test]
    fn rejects_lines_without_a_tab() {
        assert!(matches!(
            parse_line("no separator here"),
            Err(IndexError::MalformedLine(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(matches!(
            parse_line("abc\tbody"),
            Err(IndexError::MalformedLine(_))
        ));
    }
}
