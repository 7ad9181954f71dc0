//! Document-At-A-Time AND evaluation over the finalized index.
//!
//! Each call is a pure function of the query terms and the index
//! snapshot; nothing persists between queries and no shared state is
//! mutated, so concurrent callers need no coordination.

use crate::error::{IndexError, Result};
use crate::index::Index;
use crate::postings::{DocId, Posting, PostingsList};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// How per-term weights enter the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    /// Raw document-normalized term frequencies, as stored.
    TermFrequency,
    /// Term frequencies scaled by query-time IDF.
    TfIdf,
}

/// One side of a pairwise merge: the materialized postings plus the
/// owning list when skip hops are allowed on this side. Intermediate
/// merge results carry no skip overlay.
struct MergeSide<'a> {
    postings: &'a [Posting],
    skips: Option<&'a PostingsList>,
}

/// Classic two-pointer ordered merge by doc id. Equal ids emit one
/// posting with the summed weight and advance both sides; otherwise
/// the side with the smaller id advances, hopping over a skip link
/// when one exists and its target does not overshoot the other side.
/// Every advance decision, matches included, counts one comparison.
fn merge(a: MergeSide<'_>, b: MergeSide<'_>) -> Result<(u64, Vec<Posting>)> {
    let mut merged = Vec::new();
    let mut comparisons = 0u64;
    let mut i = 0;
    let mut j = 0;
    while i < a.postings.len() && j < b.postings.len() {
        comparisons += 1;
        let da = a.postings[i].doc_id;
        let db = b.postings[j].doc_id;
        if da == db {
            merged.push(Posting {
                doc_id: da,
                weight: a.postings[i].weight + b.postings[j].weight,
            });
            i += 1;
            j += 1;
        } else if da < db {
            i = advance(&a, i, db)?;
        } else {
            j = advance(&b, j, da)?;
        }
    }
    Ok((comparisons, merged))
}

/// Next position for the lagging side: the skip target when hopping
/// stays at or below `bound`, the immediate next position otherwise.
fn advance(side: &MergeSide<'_>, pos: usize, bound: DocId) -> Result<usize> {
    if let Some(list) = side.skips {
        if let Some(to) = list.skip_target(pos) {
            if to <= pos || to >= side.postings.len() {
                return Err(IndexError::MalformedSkipList {
                    from: pos,
                    to,
                    len: side.postings.len(),
                });
            }
            if side.postings[to].doc_id <= bound {
                return Ok(to);
            }
        }
    }
    Ok(pos + 1)
}

/// Left-to-right DAAT AND reduction across all query terms. Any term
/// absent from the index short-circuits to an empty result with zero
/// comparisons.
fn daat_and(
    index: &Index,
    terms: &[String],
    use_skips: bool,
    ranking: Ranking,
) -> Result<(u64, Vec<Posting>)> {
    let mut lists: Vec<(Vec<Posting>, &PostingsList)> = Vec::with_capacity(terms.len());
    for term in terms {
        let list = match index.postings_list(term) {
            Ok(list) => list,
            Err(IndexError::TermNotFound(_)) => return Ok((0, Vec::new())),
            Err(e) => return Err(e),
        };
        let scale = match ranking {
            Ranking::TermFrequency => 1.0,
            Ranking::TfIdf => index.idf(term)?,
        };
        let postings = list
            .traverse()
            .iter()
            .map(|p| Posting {
                doc_id: p.doc_id,
                weight: p.weight * scale,
            })
            .collect();
        lists.push((postings, list));
    }

    let mut lists = lists.into_iter();
    let (mut current, first_list) = match lists.next() {
        Some(first) => first,
        None => return Ok((0, Vec::new())),
    };
    let mut current_skips = use_skips.then_some(first_list);
    let mut comparisons = 0u64;
    for (postings, list) in lists {
        let (count, next) = merge(
            MergeSide {
                postings: &current,
                skips: current_skips,
            },
            MergeSide {
                postings: &postings,
                skips: use_skips.then_some(list),
            },
        )?;
        comparisons += count;
        current = next;
        // Intermediate results are plain vectors; only the original
        // term lists carry skip overlays.
        current_skips = None;
        if current.is_empty() {
            break;
        }
    }
    Ok((comparisons, current))
}

/// Highest-weight N entries, ties broken by ascending doc id, scores
/// dropped from the result. Bounded min-heap, O(n log N).
fn top_n(merged: &[Posting], n: usize) -> Vec<DocId> {
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<DocId>)>> =
        BinaryHeap::with_capacity(n + 1);
    for p in merged {
        heap.push(Reverse((OrderedFloat(p.weight), Reverse(p.doc_id))));
        if heap.len() > n {
            heap.pop();
        }
    }
    let mut keys: Vec<(OrderedFloat<f32>, Reverse<DocId>)> =
        heap.into_iter().map(|Reverse(key)| key).collect();
    keys.sort_by(|a, b| b.cmp(a));
    keys.into_iter().map(|(_, Reverse(doc_id))| doc_id).collect()
}

/// Result of one AND evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct AndEvaluation {
    pub results: Vec<DocId>,
    pub num_docs: usize,
    pub num_comparisons: u64,
}

fn evaluate(index: &Index, terms: &[String], use_skips: bool, ranking: Ranking, n: usize) -> Result<AndEvaluation> {
    let (num_comparisons, merged) = daat_and(index, terms, use_skips, ranking)?;
    let results = top_n(&merged, n);
    Ok(AndEvaluation {
        num_docs: results.len(),
        results,
        num_comparisons,
    })
}

/// The core AND query surface: ranked doc ids plus comparison counts
/// for the plain and skip-accelerated traversals of the same query.
#[derive(Debug, Clone, Serialize)]
pub struct AndQueryReport {
    pub results: Vec<DocId>,
    pub result_count: usize,
    pub comparisons_plain: u64,
    pub comparisons_skip: u64,
}

pub fn execute_and_query(index: &Index, terms: &[String], top_n: usize) -> Result<AndQueryReport> {
    let plain = evaluate(index, terms, false, Ranking::TermFrequency, top_n)?;
    let skip = evaluate(index, terms, true, Ranking::TermFrequency, top_n)?;
    Ok(AndQueryReport {
        result_count: plain.results.len(),
        results: plain.results,
        comparisons_plain: plain.num_comparisons,
        comparisons_skip: skip.num_comparisons,
    })
}

/// Per-term diagnostic sequences: the plain postings and the chain of
/// skip-target doc ids.
#[derive(Debug, Clone, Serialize)]
pub struct TermPostingsReport {
    pub term: String,
    pub postings: Vec<DocId>,
    pub skip_postings: Vec<DocId>,
}

/// Everything the serving layer reports for one query: per-term
/// postings plus the four AND evaluations (plain/skip, each with raw
/// TF and TF-IDF ranking).
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub terms: Vec<TermPostingsReport>,
    pub and_plain: AndEvaluation,
    pub and_skip: AndEvaluation,
    pub and_plain_tfidf: AndEvaluation,
    pub and_skip_tfidf: AndEvaluation,
}

pub fn run_query(index: &Index, terms: &[String], top_n: usize) -> Result<QueryReport> {
    let mut term_reports = Vec::with_capacity(terms.len());
    for term in terms {
        let (postings, skip_postings) = match index.postings_list(term) {
            Ok(list) => (
                list.traverse().iter().map(|p| p.doc_id).collect(),
                list.skip_targets().iter().map(|p| p.doc_id).collect(),
            ),
            Err(IndexError::TermNotFound(_)) => (Vec::new(), Vec::new()),
            Err(e) => return Err(e),
        };
        term_reports.push(TermPostingsReport {
            term: term.clone(),
            postings,
            skip_postings,
        });
    }
    Ok(QueryReport {
        terms: term_reports,
        and_plain: evaluate(index, terms, false, Ranking::TermFrequency, top_n)?,
        and_skip: evaluate(index, terms, true, Ranking::TermFrequency, top_n)?,
        and_plain_tfidf: evaluate(index, terms, false, Ranking::TfIdf, top_n)?,
        and_skip_tfidf: evaluate(index, terms, true, Ranking::TfIdf, top_n)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn tiny_index() -> Index {
        let mut builder = IndexBuilder::new();
        builder.add_document(1, &toks(&["cat", "sat"]));
        builder.add_document(2, &toks(&["cat", "ran"]));
        builder.finalize()
    }

    /// An index where "common" appears in 200 documents and "rare"
    /// in two of them, so skip hops pay off during the merge.
    fn skewed_index() -> Index {
        let mut builder = IndexBuilder::new();
        for doc_id in 1..=200u32 {
            let mut words = vec!["common".to_string()];
            if doc_id == 100 || doc_id == 200 {
                words.push("rare".to_string());
            }
            builder.add_document(doc_id, &words);
        }
        builder.finalize()
    }

    #[test]
    fn single_term_returns_its_postings_unmodified() {
        let index = tiny_index();
        let report = execute_and_query(&index, &toks(&["cat"]), 10).unwrap();
        assert_eq!(report.results, vec![1, 2]);
        assert_eq!(report.result_count, 2);
        assert_eq!(report.comparisons_plain, 0);
        assert_eq!(report.comparisons_skip, 0);
    }

    #[test]
    fn absent_term_short_circuits_to_empty() {
        let index = tiny_index();
        let report = execute_and_query(&index, &toks(&["cat", "unicorn"]), 10).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.result_count, 0);
        assert_eq!(report.comparisons_plain, 0);
        assert_eq!(report.comparisons_skip, 0);
    }

    #[test]
    fn two_term_example_merges_weights_and_counts() {
        let index = tiny_index();
        let (comparisons, merged) =
            daat_and(&index, &toks(&["cat", "sat"]), false, Ranking::TermFrequency).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].doc_id, 1);
        assert_eq!(merged[0].weight, 1.0);
        // One decision: both lists open on doc 1, which matches; then
        // "sat" is exhausted.
        assert_eq!(comparisons, 1);
    }

    #[test]
    fn merge_is_commutative_on_membership() {
        let index = skewed_index();
        let (_, ab) =
            daat_and(&index, &toks(&["common", "rare"]), false, Ranking::TermFrequency).unwrap();
        let (_, ba) =
            daat_and(&index, &toks(&["rare", "common"]), false, Ranking::TermFrequency).unwrap();
        let ids = |v: &[Posting]| v.iter().map(|p| p.doc_id).collect::<Vec<_>>();
        assert_eq!(ids(&ab), ids(&ba));
        assert_eq!(ids(&ab), vec![100, 200]);
    }

    #[test]
    fn skips_reduce_comparisons_without_changing_results() {
        let index = skewed_index();
        let report = execute_and_query(&index, &toks(&["common", "rare"]), 10).unwrap();
        assert_eq!(report.results, vec![100, 200]);
        assert!(
            report.comparisons_skip < report.comparisons_plain,
            "skip {} vs plain {}",
            report.comparisons_skip,
            report.comparisons_plain
        );
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let merged = vec![
            Posting { doc_id: 9, weight: 0.5 },
            Posting { doc_id: 3, weight: 0.5 },
            Posting { doc_id: 7, weight: 0.9 },
            Posting { doc_id: 5, weight: 0.5 },
        ];
        assert_eq!(top_n(&merged, 3), vec![7, 3, 5]);
    }

    #[test]
    fn top_n_truncates_to_n() {
        let merged: Vec<Posting> = (1..=20)
            .map(|doc_id| Posting {
                doc_id,
                weight: doc_id as f32,
            })
            .collect();
        assert_eq!(top_n(&merged, 3), vec![20, 19, 18]);
        assert!(top_n(&merged, 0).is_empty());
    }

    #[test]
    fn tfidf_ranking_scales_weights_by_idf() {
        let index = tiny_index();
        let (_, merged) =
            daat_and(&index, &toks(&["cat", "sat"]), false, Ranking::TfIdf).unwrap();
        assert_eq!(merged.len(), 1);
        // cat: df 2 of 2 docs, idf ln(2/3); sat: df 1, idf ln(2/2) = 0.
        let expected = 0.5 * (2.0f32 / 3.0).ln() + 0.5 * 0.0;
        assert!((merged[0].weight - expected).abs() < 1e-6);
    }

    #[test]
    fn full_report_carries_term_diagnostics() {
        let index = tiny_index();
        let report = run_query(&index, &toks(&["cat", "unicorn"]), 10).unwrap();
        assert_eq!(report.terms.len(), 2);
        assert_eq!(report.terms[0].postings, vec![1, 2]);
        assert!(report.terms[1].postings.is_empty());
        assert!(report.and_plain.results.is_empty());
        assert_eq!(report.and_skip.num_comparisons, 0);
    }
}
