use std::collections::BTreeMap;

use promptrec_core::types::{Prompt, SourceKind, TagSet};
use promptrec_text::{KeywordRanker, TagExtractor};

fn prompt(id: &str, category: &str, keywords: &[&str]) -> Prompt {
    Prompt::new(id, format!("title {id}"), "body").with_category(category).with_keywords(keywords.iter().copied())
}

fn tags(categories: &[&str], keywords: &[&str]) -> TagSet {
    TagSet {
        categories: categories.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn fastapi_server_scenario_scores_four() {
    let mut dict = BTreeMap::new();
    dict.insert("backend".to_string(), vec!["fastapi".to_string(), "server".to_string()]);
    let extractor = TagExtractor::new(dict);
    let prompts = vec![prompt("1", "backend", &["fastapi", "server"])];

    let t = extractor.extract("fastapi server");
    assert_eq!(t, tags(&["backend"], &["fastapi", "server"]));

    let results = KeywordRanker::new().rank(&t, &prompts, 3);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), "1");
    assert_eq!(results[0].score, 4.0);
    assert_eq!(results[0].rank, 1);
    assert_eq!(results[0].source, SourceKind::Keyword);
}

#[test]
fn ties_keep_collection_order() {
    let t = tags(&["frontend"], &["react", "ui", "component", "form"]);
    let a = prompt("A", "frontend", &["react", "form"]);
    let b = prompt("B", "frontend", &["react", "ui", "component"]);
    let c = prompt("C", "frontend", &["react", "component"]);

    let results = KeywordRanker::new().rank(&t, &[a, b, c], 3);
    let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
    let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![5.0, 4.0, 4.0]);
}

#[test]
fn zero_scores_are_excluded_and_top_k_applies() {
    let t = tags(&["frontend"], &["react"]);
    let prompts = vec![
        prompt("cat_only", "frontend", &["other"]),
        prompt("none", "devops", &["docker"]),
        prompt("kw_only", "misc", &["react"]),
        prompt("both", "frontend", &["react", "react"]),
    ];
    let ranker = KeywordRanker::new();

    let all = ranker.rank(&t, &prompts, 10);
    let ids: Vec<&str> = all.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["both", "cat_only", "kw_only"], "duplicate prompt keywords count once");
    assert!(all.iter().all(|r| r.score > 0.0));
    assert!(all.windows(2).all(|w| w[0].score >= w[1].score));

    assert_eq!(ranker.rank(&t, &prompts, 1).len(), 1);
    assert!(ranker.rank(&t, &prompts, 0).is_empty());
}

#[test]
fn empty_inputs_give_empty_results() {
    let ranker = KeywordRanker::new();
    assert!(ranker.rank(&tags(&["frontend"], &["react"]), &[], 3).is_empty());
    assert!(ranker.rank(&TagSet::default(), &[prompt("1", "frontend", &["react"])], 3).is_empty());
}
