use promptrec_core::types::{Prompt, ScoredCandidate, SourceKind};
use promptrec_hybrid::{FusionWeights, HybridFuser};

fn cand(id: &str, score: f32, source: SourceKind) -> ScoredCandidate {
    ScoredCandidate { prompt: Prompt::new(id, format!("title {id}"), format!("body {id}")), score, rank: 0, source }
}

fn kw(ids: &[&str]) -> Vec<ScoredCandidate> {
    ids.iter().map(|id| cand(id, 1.0, SourceKind::Keyword)).collect()
}

fn approx(a: f32, b: f32) -> bool { (a - b).abs() < 1e-5 }

#[test]
fn shared_prompt_appears_once_with_summed_score() {
    let fuser = HybridFuser::default();
    let keyword = kw(&["a", "b"]);
    let vector = vec![cand("b", 0.9, SourceKind::Vector), cand("c", 0.5, SourceKind::Vector)];
    let fused = fuser.fuse(&keyword, &vector, 10);

    assert_eq!(fused.iter().filter(|c| c.id() == "b").count(), 1);
    let b = fused.iter().find(|c| c.id() == "b").expect("b fused");
    // position 1 of 2 -> (2 - 1) * 0.4, plus 0.9 * 0.6
    assert!(approx(b.score, 0.4 + 0.54), "got {}", b.score);

    let ids: Vec<&str> = fused.iter().map(ScoredCandidate::id).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert!(approx(fused[1].score, 0.8));
    assert!(approx(fused[2].score, 0.3));
    assert!(fused.iter().all(|c| c.source == SourceKind::Hybrid));
    assert_eq!(fused.iter().map(|c| c.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn keyword_side_is_rank_based_not_score_based() {
    let fuser = HybridFuser::new(FusionWeights { keyword: 1.0, vector: 1.0 });
    let keyword = vec![cand("x", 50.0, SourceKind::Keyword), cand("y", 2.0, SourceKind::Keyword)];
    let fused = fuser.fuse(&keyword, &[], 5);
    assert!(approx(fused[0].score, 2.0));
    assert!(approx(fused[1].score, 1.0));
}

#[test]
fn ties_keep_keyword_entries_first() {
    let fuser = HybridFuser::new(FusionWeights { keyword: 0.5, vector: 1.0 });
    // keyword "k" scores (1 - 0) * 0.5 = 0.5, vector "v" scores 0.5 * 1.0 = 0.5
    let fused = fuser.fuse(&kw(&["k"]), &[cand("v", 0.5, SourceKind::Vector)], 2);
    assert_eq!(fused[0].id(), "k");
    assert_eq!(fused[1].id(), "v");
}

#[test]
fn truncates_and_handles_empty_inputs() {
    let fuser = HybridFuser::default();
    assert!(fuser.fuse(&[], &[], 3).is_empty());
    assert!(fuser.fuse(&kw(&["a"]), &[], 0).is_empty());
    let fused = fuser.fuse(&kw(&["a", "b", "c", "d"]), &[], 2);
    assert_eq!(fused.len(), 2);
    assert_eq!(fused[0].id(), "a");
}

#[test]
fn vector_only_keeps_similarity_order() {
    let fuser = HybridFuser::default();
    let vector = vec![cand("p", 0.8, SourceKind::Vector), cand("q", 0.2, SourceKind::Vector)];
    let fused = fuser.fuse(&[], &vector, 5);
    assert_eq!(fused[0].id(), "p");
    assert!(approx(fused[0].score, 0.48));
}

#[test]
fn repeated_id_within_one_list_counts_once() {
    let fuser = HybridFuser::new(FusionWeights { keyword: 1.0, vector: 1.0 });
    let keyword = kw(&["a", "b", "a"]);
    let vector = vec![cand("c", 0.7, SourceKind::Vector), cand("c", 0.2, SourceKind::Vector)];
    let fused = fuser.fuse(&keyword, &vector, 10);

    let ids: Vec<&str> = fused.iter().map(ScoredCandidate::id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    // "a" keeps its first position in a two-entry list
    assert!(approx(fused[0].score, 2.0));
    assert!(approx(fused[1].score, 1.0));
    assert!(approx(fused[2].score, 0.7));
}
