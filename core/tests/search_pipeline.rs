use skipdex_core::corpus::parse_line;
use skipdex_core::tokenizer::tokenize;
use skipdex_core::{execute_and_query, run_query, IndexBuilder};

fn index_from_lines(lines: &[&str]) -> skipdex_core::Index {
    let mut builder = IndexBuilder::new();
    for line in lines {
        let (doc_id, body) = parse_line(line).unwrap();
        builder.add_document(doc_id, &tokenize(&body));
    }
    builder.finalize()
}

#[test]
fn end_to_end_two_document_corpus() {
    let index = index_from_lines(&["1\tThe cat sat.", "2\tThe cat ran."]);
    assert_eq!(index.num_docs(), 2);

    // "cat" appears in both docs with TF 1/2.
    let cat = index.get_postings("cat", false).unwrap();
    assert_eq!(cat.len(), 2);
    assert_eq!((cat[0].doc_id, cat[0].weight), (1, 0.5));
    assert_eq!((cat[1].doc_id, cat[1].weight), (2, 0.5));

    // AND over "cat sat" matches only doc 1, one merge decision.
    let terms = tokenize("the cat sat");
    assert_eq!(terms, vec!["cat", "sat"]);
    let report = execute_and_query(&index, &terms, 10).unwrap();
    assert_eq!(report.results, vec![1]);
    assert_eq!(report.result_count, 1);
    assert_eq!(report.comparisons_plain, 1);
}

#[test]
fn skip_and_plain_agree_on_a_larger_corpus() {
    let lines: Vec<String> = (1..=60)
        .map(|i| {
            let extra = if i % 3 == 0 { " fish" } else { "" };
            format!("{i}\tcats chase mice{extra}")
        })
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let index = index_from_lines(&refs);

    let terms = tokenize("cats fish");
    let report = execute_and_query(&index, &terms, 100).unwrap();
    let expected: Vec<u32> = (1..=60).filter(|i| i % 3 == 0).collect();
    let mut results = report.results.clone();
    results.sort_unstable();
    assert_eq!(results, expected);
    assert!(report.comparisons_skip <= report.comparisons_plain);
}

#[test]
fn query_report_covers_all_output_sections() {
    let index = index_from_lines(&["1\tThe cat sat.", "2\tThe cat ran."]);
    let report = run_query(&index, &tokenize("cat ran"), 10).unwrap();
    assert_eq!(report.terms.len(), 2);
    assert_eq!(report.and_plain.results, vec![2]);
    assert_eq!(report.and_skip.results, vec![2]);
    assert_eq!(report.and_plain_tfidf.results, vec![2]);
    assert_eq!(report.and_skip_tfidf.results, vec![2]);
    assert_eq!(report.and_plain.num_docs, 1);
}
