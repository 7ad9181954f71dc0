use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type DocId = u32;

/// One entry in a term's postings list. The weight starts out as the
/// document-normalized term frequency and may be scaled by IDF or
/// summed with other weights during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32,
}

/// A forward jump between two array positions in the same list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipLink {
    pub from: usize,
    pub to: usize,
}

/// Ordered postings for a single term, strictly ascending by doc id,
/// with a sparse skip overlay stored as array indices. Postings live
/// in one contiguous arena so skip links never dangle.
#[derive(Debug, Clone, Default)]
pub struct PostingsList {
    postings: Vec<Posting>,
    // Ascending by `from`; only skip sources appear here.
    skips: Vec<SkipLink>,
}

impl PostingsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping ascending doc-id order via a positional scan.
    /// Re-inserting an existing id is a no-op and returns `false`;
    /// the original weight is kept.
    pub fn insert(&mut self, doc_id: DocId, weight: f32) -> bool {
        let mut pos = 0;
        while pos < self.postings.len() {
            match self.postings[pos].doc_id.cmp(&doc_id) {
                Ordering::Equal => return false,
                Ordering::Greater => break,
                Ordering::Less => pos += 1,
            }
        }
        self.postings.insert(pos, Posting { doc_id, weight });
        true
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Full forward traversal.
    pub fn traverse(&self) -> &[Posting] {
        &self.postings
    }

    /// Forward traversal that follows skip links where they exist and
    /// steps to the immediate next position otherwise. Every posting
    /// passed over by a hop is still emitted, so the output sequence
    /// is identical to [`traverse`](Self::traverse); the walk also
    /// validates the overlay and fails on a non-forward link.
    pub fn traverse_with_skips(&self) -> Result<Vec<Posting>> {
        let len = self.postings.len();
        let mut out = Vec::with_capacity(len);
        let mut pos = 0;
        while pos < len {
            out.push(self.postings[pos]);
            match self.skip_target(pos) {
                Some(to) => {
                    if to <= pos || to >= len {
                        return Err(IndexError::MalformedSkipList { from: pos, to, len });
                    }
                    out.extend_from_slice(&self.postings[pos + 1..to]);
                    pos = to;
                }
                None => pos += 1,
            }
        }
        Ok(out)
    }

    /// The chain of skip targets reachable from position 0. This is
    /// the diagnostic sequence reported alongside the plain postings
    /// so callers can see where the skip hops land.
    pub fn skip_targets(&self) -> Vec<Posting> {
        let mut out = Vec::with_capacity(self.skips.len());
        let mut pos = 0;
        while let Some(to) = self.skip_target(pos) {
            if to >= self.postings.len() {
                break;
            }
            out.push(self.postings[to]);
            pos = to;
        }
        out
    }

    /// Skip target for a position, if that position is a skip source.
    pub fn skip_target(&self, pos: usize) -> Option<usize> {
        self.skips
            .binary_search_by_key(&pos, |link| link.from)
            .ok()
            .map(|i| self.skips[i].to)
    }

    pub fn skip_count(&self) -> usize {
        self.skips.len()
    }

    /// One-shot skip placement over the finished list. Idempotent:
    /// the overlay is discarded and recomputed from scratch.
    ///
    /// For a list of length L the target count is floor(sqrt(L)),
    /// minus one when L is a perfect square (a skip landing exactly
    /// on the last element is useless). The stride is L / count
    /// rounded to the nearest integer, and sources chain from
    /// position 0: each skip target is the next source. No skip is
    /// placed when its target would reach the end of the list.
    pub fn build_skips(&mut self) {
        self.skips.clear();
        let len = self.postings.len();
        let mut n_skips = (len as f64).sqrt().floor() as usize;
        if n_skips * n_skips == len {
            n_skips = n_skips.saturating_sub(1);
        }
        if n_skips == 0 {
            return;
        }
        let stride = (len as f64 / n_skips as f64).round() as usize;
        let mut from = 0;
        loop {
            let to = from + stride;
            if to >= len {
                break;
            }
            self.skips.push(SkipLink { from, to });
            from = to;
        }
    }

    #[cfg(test)]
    fn inject_skip(&mut self, from: usize, to: usize) {
        self.skips.push(SkipLink { from, to });
        self.skips.sort_by_key(|link| link.from);
    }
}
