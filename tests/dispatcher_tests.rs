mod common;

use std::collections::BTreeMap;

use serde_json::json;

use common::ScriptedEvaluator;
use repogate::{
    CatalogProcessor, Confidence, Dispatcher, EngineConfig, EvaluatorTier, Verdict,
};

fn content(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect()
}

#[tokio::test]
async fn test_structural_rules_resolved_without_evaluator() {
    let records = vec![
        json!({"id": "S1", "description": "README must exist", "type": "structural", "references": ["README.md"], "criticality": "high"}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();
    // An erroring evaluator proves no call is made for structural rules.
    let dispatcher = Dispatcher::new(ScriptedEvaluator::erroring(), EngineConfig::default());

    let outcomes = dispatcher
        .run(&catalog, &content(&[("README.md", "# Project")]))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].verdict, Verdict::Complies);
    assert_eq!(outcomes[0].tier, EvaluatorTier::Programmatic);
}

#[tokio::test]
async fn test_evaluator_errors_become_failing_outcomes() {
    let records = vec![
        json!({"id": "C1", "description": "changelog kept current", "type": "content", "references": ["CHANGELOG.md"]}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();
    let dispatcher = Dispatcher::new(ScriptedEvaluator::erroring(), EngineConfig::default());

    let outcomes = dispatcher
        .run(&catalog, &content(&[("CHANGELOG.md", "## 1.0.0")]))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].verdict, Verdict::Fails);
    assert_eq!(outcomes[0].confidence, Confidence::Low);
    assert!(outcomes[0].explanation.contains("simulated outage"));
    assert_eq!(dispatcher.stats().failed, 1);
}

#[tokio::test]
async fn test_missing_content_fails_without_evaluator_call() {
    let records = vec![
        json!({"id": "C1", "description": "api docs reviewed", "type": "semantic", "references": ["docs/api.md"], "criticality": "high"}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();
    let dispatcher = Dispatcher::new(ScriptedEvaluator::erroring(), EngineConfig::default());

    let outcomes = dispatcher.run(&catalog, &content(&[("README.md", "hi")])).await;

    assert_eq!(outcomes[0].verdict, Verdict::Fails);
    assert_eq!(outcomes[0].confidence, Confidence::High);
    assert!(outcomes[0].explanation.contains("docs/api.md"));
    assert_eq!(outcomes[0].content_size_analyzed, 0);
}

#[tokio::test]
async fn test_single_unit_rule_parses_reply() {
    let records = vec![
        json!({"id": "C1", "description": "readme complete", "type": "content", "references": ["README.md"]}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();
    let dispatcher = Dispatcher::new(
        ScriptedEvaluator::always("PARTIAL", "MEDIUM"),
        EngineConfig::default(),
    );

    let outcomes = dispatcher
        .run(&catalog, &content(&[("README.md", "# Project\nshort")]))
        .await;

    assert_eq!(outcomes[0].verdict, Verdict::Partial);
    assert_eq!(outcomes[0].confidence, Confidence::Medium);
    assert_eq!(outcomes[0].chunks_processed, 0);
}

#[tokio::test]
async fn test_chunked_high_criticality_fails_on_one_bad_chunk() {
    let records = vec![
        json!({"id": "M1", "description": "codebase consistent", "type": "semantic", "criticality": "high"}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();

    let mut config = EngineConfig::default();
    config.chunking.max_chunk_tokens = 100;
    let dispatcher = Dispatcher::new(ScriptedEvaluator::failing_chunks(&[2]), config);

    let big = "section content ".repeat(25);
    let outcomes = dispatcher
        .run(
            &catalog,
            &content(&[("a.txt", &big), ("b.txt", &big), ("c.txt", &big)]),
        )
        .await;

    assert_eq!(outcomes[0].chunks_processed, 3);
    assert_eq!(outcomes[0].verdict, Verdict::Fails);
    assert_eq!(outcomes[0].confidence, Confidence::Medium);
    assert!(outcomes[0].explanation.contains("[Chunk 2]"));
}

#[tokio::test]
async fn test_chunked_majority_passes_lower_criticality() {
    let records = vec![
        json!({"id": "M1", "description": "codebase consistent", "type": "semantic", "criticality": "low"}),
    ];
    let catalog = CatalogProcessor::default().process(&records).unwrap();

    let mut config = EngineConfig::default();
    config.chunking.max_chunk_tokens = 100;
    let dispatcher = Dispatcher::new(ScriptedEvaluator::failing_chunks(&[3]), config);

    let big = "section content ".repeat(25);
    let outcomes = dispatcher
        .run(
            &catalog,
            &content(&[
                ("a.txt", &big),
                ("b.txt", &big),
                ("c.txt", &big),
                ("d.txt", &big),
            ]),
        )
        .await;

    assert_eq!(outcomes[0].chunks_processed, 4);
    assert_eq!(outcomes[0].verdict, Verdict::Complies);
    assert_eq!(outcomes[0].confidence, Confidence::High);
}
