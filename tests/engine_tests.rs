//! End-to-end engine tests against an in-memory SQLite store
//!
//! Run with: cargo test --test engine_tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use memvault::embedding::{cosine_distance, EmbedTask, Embedder, TfIdfEmbedder};
use memvault::generation::Generator;
use memvault::intelligence::NO_MEMORIES_FOUND;
use memvault::resilience::{ResilientEmbedder, ResilientGenerator, RetryPolicy};
use memvault::{
    EngineConfig, ErrorKind, MemoryEngine, Metadata, MetadataValue, MemvaultError, NewMemory,
    RecallRequest, Result, SqliteBackend, WhereFilter,
};

// ============================================================================
// TEST DOUBLES
// ============================================================================

/// Reads the vector from the first two tokens of the text: "1 0 east" -> [1, 0]
struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn embed(&self, text: &str, _task: EmbedTask) -> Result<Vec<f32>> {
        let parsed: Vec<f32> = text
            .split_whitespace()
            .take(2)
            .filter_map(|t| t.parse().ok())
            .collect();
        if parsed.len() != 2 {
            return Err(MemvaultError::embedding(format!("not an axis text: {}", text)));
        }
        Ok(parsed)
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "axis"
    }
}

/// Counts calls and fails with queued errors before delegating
struct FlakyEmbedder {
    inner: TfIdfEmbedder,
    calls: Arc<AtomicUsize>,
    failures: Mutex<VecDeque<MemvaultError>>,
}

impl FlakyEmbedder {
    fn new(calls: Arc<AtomicUsize>, failures: Vec<MemvaultError>) -> Self {
        Self {
            inner: TfIdfEmbedder::new(64),
            calls,
            failures: Mutex::new(failures.into()),
        }
    }
}

impl Embedder for FlakyEmbedder {
    fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        self.inner.embed(text, task)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}

/// Scripted generation model that records every prompt
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String>>, prompts: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts,
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("default summary".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Fails the test if it is ever called
struct ForbiddenGenerator;

impl Generator for ForbiddenGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        panic!("generation model must not be called");
    }

    fn model_name(&self) -> &str {
        "forbidden"
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(1, Duration::ZERO)
}

fn engine_with(
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    config: EngineConfig,
) -> MemoryEngine {
    MemoryEngine::new(
        Arc::new(SqliteBackend::in_memory().unwrap()),
        embedder,
        generator,
        config,
    )
    .unwrap()
}

fn tfidf_engine() -> MemoryEngine {
    engine_with(
        Arc::new(TfIdfEmbedder::new(256)),
        None,
        EngineConfig::default(),
    )
}

fn metadata(pairs: &[(&str, MetadataValue)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn kind<T: std::fmt::Debug>(result: Result<T>) -> ErrorKind {
    result.unwrap_err().kind()
}

// ============================================================================
// MUTATIONS
// ============================================================================

mod mutation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_then_get_round_trips_text_and_metadata() {
        let engine = tfidf_engine();
        let meta = metadata(&[
            ("author", "X".into()),
            ("priority", 2i64.into()),
            ("score", 0.25f64.into()),
            ("pinned", true.into()),
        ]);

        engine
            .add_memory(
                NewMemory::new("Ownership moves values between bindings")
                    .doc_id("m1")
                    .metadata(meta.clone()),
            )
            .unwrap();

        let record = engine.get_memory_by_id("m1", None).unwrap();
        assert_eq!(record.text, "Ownership moves values between bindings");
        assert_eq!(record.metadata, meta);
    }

    #[test]
    fn same_doc_id_overwrites() {
        let engine = tfidf_engine();
        engine
            .add_memory(NewMemory::new("first version").doc_id("m1"))
            .unwrap();
        engine
            .add_memory(NewMemory::new("second version").doc_id("m1"))
            .unwrap();

        let ids = engine
            .list_collection_ids(engine.default_collection())
            .unwrap();
        assert_eq!(ids, vec!["m1".to_string()]);
        assert_eq!(
            engine.get_memory_by_id("m1", None).unwrap().text,
            "second version"
        );
    }

    #[test]
    fn generated_doc_id_is_uuid() {
        let engine = tfidf_engine();
        let added = engine.add_memory(NewMemory::new("no id given")).unwrap();
        assert!(uuid::Uuid::parse_str(&added.doc_id).is_ok());
        assert_eq!(added.collection, "agent_memory");
    }

    #[test]
    fn delete_missing_doc_is_not_found_and_not_idempotent() {
        let engine = tfidf_engine();
        engine
            .add_memory(NewMemory::new("keep me").doc_id("keep"))
            .unwrap();
        engine
            .add_memory(NewMemory::new("drop me").doc_id("drop"))
            .unwrap();

        assert_eq!(
            kind(engine.delete_memory("ghost", None)),
            ErrorKind::DocumentNotFound
        );

        engine.delete_memory("drop", None).unwrap();
        assert_eq!(
            kind(engine.delete_memory("drop", None)),
            ErrorKind::DocumentNotFound
        );
        assert!(engine.get_memory_by_id("keep", None).is_ok());
    }

    #[test]
    fn update_metadata_merges_and_keeps_text() {
        let engine = tfidf_engine();
        engine
            .add_memory(
                NewMemory::new("The sky is blue")
                    .doc_id("m1")
                    .metadata(metadata(&[("source", "observation".into())])),
            )
            .unwrap();

        engine
            .update_memory_metadata("m1", metadata(&[("author", "X".into())]), None)
            .unwrap();

        let record = engine.get_memory_by_id("m1", None).unwrap();
        assert_eq!(record.text, "The sky is blue");
        assert_eq!(
            record.metadata.get("author"),
            Some(&MetadataValue::String("X".into()))
        );
        assert_eq!(
            record.metadata.get("source"),
            Some(&MetadataValue::String("observation".into()))
        );

        // Recall still works after the metadata-only write
        let hits = engine
            .recall_memory(&RecallRequest::new("sky").top_k(1))
            .unwrap();
        assert_eq!(hits[0].doc_id, "m1");
    }

    #[test]
    fn list_collections_contains_default_only_after_write() {
        let engine = tfidf_engine();
        engine
            .add_memory(NewMemory::new("alpha").collection("a"))
            .unwrap();
        engine
            .add_memory(NewMemory::new("beta").collection("b"))
            .unwrap();
        assert_eq!(engine.list_collections().unwrap(), vec!["a", "b"]);

        engine.add_memory(NewMemory::new("gamma")).unwrap();
        assert_eq!(
            engine.list_collections().unwrap(),
            vec!["a", "agent_memory", "b"]
        );
    }

    #[test]
    fn delete_collection_removes_everything() {
        let engine = tfidf_engine();
        engine
            .add_memory(NewMemory::new("alpha").doc_id("x").collection("scratch"))
            .unwrap();
        engine.delete_collection("scratch").unwrap();

        assert!(engine.list_collections().unwrap().is_empty());
        assert_eq!(
            kind(engine.get_memory_by_id("x", Some("scratch"))),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            kind(engine.delete_collection("scratch")),
            ErrorKind::CollectionNotFound
        );
    }

    #[test]
    fn reads_on_missing_collection_do_not_create_it() {
        let engine = tfidf_engine();
        assert_eq!(
            kind(engine.recall_memory(&RecallRequest::new("x").collection("nowhere"))),
            ErrorKind::CollectionNotFound
        );
        assert_eq!(
            kind(engine.list_collection_ids("nowhere")),
            ErrorKind::CollectionNotFound
        );
        assert!(engine.list_collections().unwrap().is_empty());
    }

    #[test]
    fn empty_text_fails_without_creating_collection() {
        let engine = tfidf_engine();
        assert_eq!(
            kind(engine.add_memory(NewMemory::new("   ").collection("fresh"))),
            ErrorKind::EmbeddingError
        );
        assert!(engine.list_collections().unwrap().is_empty());
    }

    #[test]
    fn invalid_collection_name_is_rejected() {
        let engine = tfidf_engine();
        assert_eq!(
            kind(engine.add_memory(NewMemory::new("alpha").collection("bad name!"))),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn concurrent_adds_all_land() {
        let engine = tfidf_engine();
        std::thread::scope(|s| {
            for t in 0..4 {
                let engine = &engine;
                s.spawn(move || {
                    for i in 0..10 {
                        engine
                            .add_memory(
                                NewMemory::new(format!("note {} from thread {}", i, t))
                                    .doc_id(format!("t{}-{}", t, i)),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let ids = engine
            .list_collection_ids(engine.default_collection())
            .unwrap();
        assert_eq!(ids.len(), 40);
    }
}

// ============================================================================
// RETRIEVAL
// ============================================================================

mod retrieval_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> MemoryEngine {
        let engine = tfidf_engine();
        let memories = [
            ("m1", "The sky is blue", "X"),
            ("m2", "Rust borrow checker enforces ownership", "Y"),
            ("m3", "Python uses reference counting", "X"),
            ("m4", "Ownership and borrowing in Rust", "Z"),
        ];
        for (id, text, author) in memories {
            engine
                .add_memory(
                    NewMemory::new(text)
                        .doc_id(id)
                        .metadata(metadata(&[("author", author.into())])),
                )
                .unwrap();
        }
        engine
    }

    #[test]
    fn sky_scenario_returns_m1() {
        let engine = seeded();
        let hits = engine
            .recall_memory(&RecallRequest::new("sky color").top_k(1))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "m1");
    }

    #[test]
    fn recall_is_bounded_and_ordered() {
        let engine = seeded();
        for top_k in 1..=6 {
            let hits = engine
                .recall_memory_with_distance(&RecallRequest::new("rust ownership").top_k(top_k))
                .unwrap();
            assert!(hits.len() <= top_k);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn recall_uses_default_top_k() {
        let engine = seeded();
        let hits = engine.recall_memory(&RecallRequest::new("rust")).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn recall_applies_metadata_filter() {
        let engine = seeded();
        let hits = engine
            .recall_memory(
                &RecallRequest::new("anything at all")
                    .top_k(10)
                    .filter(WhereFilter::eq("author", "X")),
            )
            .unwrap();
        let mut ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[test]
    fn zero_top_k_and_blank_query_are_invalid() {
        let engine = seeded();
        assert_eq!(
            kind(engine.recall_memory(&RecallRequest::new("sky").top_k(0))),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(engine.recall_memory(&RecallRequest::new("  "))),
            ErrorKind::InvalidArgument
        );
        assert_eq!(kind(engine.check_memory("", None, None)), ErrorKind::InvalidArgument);
    }

    #[test]
    fn hybrid_with_unmatched_keyword_is_empty() {
        let engine = seeded();
        let hits = engine
            .recall_memory_hybrid(&RecallRequest::new("zebra migration").keyword("zebra"))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn hybrid_keyword_matches_text_and_metadata() {
        let engine = seeded();
        let hits = engine
            .recall_memory_hybrid(&RecallRequest::new("rust").keyword("OWNERSHIP").top_k(5))
            .unwrap();
        let mut ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["m2", "m4"]);

        // Metadata values are searched too
        let hits = engine
            .recall_memory_hybrid(&RecallRequest::new("sky").keyword("z").top_k(5))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "m4");
    }

    #[test]
    fn hybrid_without_keyword_is_plain_recall() {
        let engine = seeded();
        let request = RecallRequest::new("rust ownership").top_k(2);
        assert_eq!(
            engine.recall_memory_hybrid(&request).unwrap(),
            engine.recall_memory_with_distance(&request).unwrap()
        );
    }
}

// ============================================================================
// EXISTENCE CHECK
// ============================================================================

mod existence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn axis_engine(threshold: f32) -> MemoryEngine {
        let engine = engine_with(
            Arc::new(AxisEmbedder),
            None,
            EngineConfig {
                existence_threshold: threshold,
                ..Default::default()
            },
        );
        engine
            .add_memory(NewMemory::new("1 0 east").doc_id("east"))
            .unwrap();
        engine
    }

    fn boundary() -> f32 {
        cosine_distance(&[1.0, 1.732_050_8], &[1.0, 0.0])
    }

    #[test]
    fn distance_equal_to_threshold_exists() {
        let engine = axis_engine(boundary());
        let check = engine.check_memory("1 1.7320508", None, None).unwrap();
        assert!(check.exists);
        assert_eq!(check.doc_id.as_deref(), Some("east"));
        assert_eq!(check.distance, Some(boundary()));
    }

    #[test]
    fn distance_just_above_threshold_does_not_exist() {
        let engine = axis_engine(boundary() - 1e-6);
        let check = engine.check_memory("1 1.7320508", None, None).unwrap();
        assert!(!check.exists);
        assert_eq!(check.doc_id.as_deref(), Some("east"));
    }

    #[test]
    fn exact_match_exists() {
        let engine = axis_engine(0.5);
        let check = engine.check_memory("2 0", None, None).unwrap();
        assert!(check.exists);
        assert_eq!(check.distance, Some(0.0));
    }

    #[test]
    fn empty_collection_never_exists() {
        let engine = axis_engine(0.5);
        engine.delete_memory("east", None).unwrap();

        let check = engine.check_memory("1 0", None, None).unwrap();
        assert!(!check.exists);
        assert_eq!(check.distance, None);
        assert_eq!(check.doc_id, None);
    }
}

// ============================================================================
// SUMMARIZATION
// ============================================================================

mod summarization_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_collection_short_circuits_without_model() {
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(ForbiddenGenerator)),
            EngineConfig::default(),
        );
        engine
            .add_memory(NewMemory::new("temporary").doc_id("tmp"))
            .unwrap();
        engine.delete_memory("tmp", None).unwrap();

        let summary = engine.summarize_memory("anything", None, None, None).unwrap();
        assert_eq!(summary.summary, NO_MEMORIES_FOUND);
        assert!(!summary.found);
        assert_eq!(summary.source_count, 0);

        let summary = engine
            .summarize_collection(engine.default_collection(), None)
            .unwrap();
        assert_eq!(summary.summary, NO_MEMORIES_FOUND);
    }

    #[test]
    fn summary_prompt_carries_query_and_memories() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(vec![Ok("  The sky is blue.  ".into())], prompts.clone());
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(generator)),
            EngineConfig::default(),
        );
        engine
            .add_memory(NewMemory::new("The sky is blue").doc_id("m1"))
            .unwrap();

        let summary = engine.summarize_memory("sky color", Some(3), None, None).unwrap();
        assert_eq!(summary.summary, "The sky is blue.");
        assert_eq!(summary.source_count, 1);
        assert!(summary.found);

        let prompts = prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("'sky color'"));
        assert!(prompts[0].contains("---\nThe sky is blue\n---"));
    }

    #[test]
    fn transient_model_failure_is_retried_once() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(
            vec![
                Err(MemvaultError::summarization_transient("HTTP 503")),
                Ok("recovered".into()),
            ],
            prompts.clone(),
        );
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(ResilientGenerator::new(generator, fast_retry()))),
            EngineConfig::default(),
        );
        engine.add_memory(NewMemory::new("alpha beta")).unwrap();

        let summary = engine.summarize_memory("alpha", None, None, None).unwrap();
        assert_eq!(summary.summary, "recovered");
        assert_eq!(prompts.lock().len(), 2);
    }

    #[test]
    fn permanent_model_failure_is_not_retried() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(
            vec![Err(MemvaultError::summarization("HTTP 400"))],
            prompts.clone(),
        );
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(ResilientGenerator::new(generator, fast_retry()))),
            EngineConfig::default(),
        );
        engine.add_memory(NewMemory::new("alpha beta")).unwrap();

        assert_eq!(
            kind(engine.summarize_memory("alpha", None, None, None)),
            ErrorKind::SummarizationError
        );
        assert_eq!(prompts.lock().len(), 1);
    }

    #[test]
    fn blank_model_output_is_an_error() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(vec![Ok("   ".into())], prompts);
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(generator)),
            EngineConfig::default(),
        );
        engine.add_memory(NewMemory::new("alpha beta")).unwrap();

        assert_eq!(
            kind(engine.summarize_memory("alpha", None, None, None)),
            ErrorKind::SummarizationError
        );
    }

    #[test]
    fn summarize_collection_without_query_uses_store_order() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(vec![], prompts.clone());
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            Some(Arc::new(generator)),
            EngineConfig {
                summarize_top_k: 2,
                ..Default::default()
            },
        );
        for text in ["first note", "second note", "third note"] {
            engine
                .add_memory(NewMemory::new(text).collection("journal"))
                .unwrap();
        }

        let summary = engine.summarize_collection("journal", None).unwrap();
        assert_eq!(summary.source_count, 2);

        let prompts = prompts.lock();
        assert!(prompts[0].contains("key themes"));
        assert!(prompts[0].contains("first note\n---\nsecond note"));
        assert!(!prompts[0].contains("third note"));
    }

    #[test]
    fn oversized_context_drops_least_relevant() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let generator = ScriptedGenerator::new(vec![], prompts.clone());
        let engine = engine_with(
            Arc::new(AxisEmbedder),
            Some(Arc::new(generator)),
            EngineConfig {
                max_summary_input_chars: 20,
                ..Default::default()
            },
        );
        engine
            .add_memory(NewMemory::new("1 0 closest memory").doc_id("near"))
            .unwrap();
        engine
            .add_memory(NewMemory::new("0 1 farthest memory").doc_id("far"))
            .unwrap();

        let summary = engine.summarize_memory("1 0", None, None, None).unwrap();
        assert_eq!(summary.source_count, 1);
        assert!(prompts.lock()[0].contains("1 0 closest memory"));
    }
}

// ============================================================================
// EMBEDDING RESILIENCE
// ============================================================================

mod resilience_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transient_embedding_failure_is_retried_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky = FlakyEmbedder::new(
            calls.clone(),
            vec![MemvaultError::embedding_transient("connection reset")],
        );
        let engine = engine_with(
            Arc::new(ResilientEmbedder::new(flaky, fast_retry())),
            None,
            EngineConfig::default(),
        );

        engine.add_memory(NewMemory::new("alpha").doc_id("a")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn permanent_embedding_failure_surfaces_without_side_effects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky = FlakyEmbedder::new(
            calls.clone(),
            vec![MemvaultError::embedding("model rejected input")],
        );
        let engine = engine_with(
            Arc::new(ResilientEmbedder::new(flaky, fast_retry())),
            None,
            EngineConfig::default(),
        );

        assert_eq!(
            kind(engine.add_memory(NewMemory::new("alpha"))),
            ErrorKind::EmbeddingError
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(engine.list_collections().unwrap().is_empty());
    }

    #[test]
    fn second_transient_failure_surfaces() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky = FlakyEmbedder::new(
            calls.clone(),
            vec![
                MemvaultError::embedding_transient("timeout"),
                MemvaultError::embedding_transient("timeout"),
            ],
        );
        let engine = engine_with(
            Arc::new(ResilientEmbedder::new(flaky, fast_retry())),
            None,
            EngineConfig::default(),
        );

        assert_eq!(
            kind(engine.add_memory(NewMemory::new("alpha"))),
            ErrorKind::EmbeddingError
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

// ============================================================================
// PRIVILEGE GATE
// ============================================================================

mod privilege_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn grant_is_consumed_by_one_operation() {
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            None,
            EngineConfig {
                require_privilege: true,
                ..Default::default()
            },
        );
        engine
            .add_memory(NewMemory::new("alpha").collection("a"))
            .unwrap();

        assert_eq!(kind(engine.list_collections()), ErrorKind::PrivilegeRequired);

        engine.grant_privilege();
        assert_eq!(engine.list_collections().unwrap(), vec!["a"]);
        assert_eq!(kind(engine.delete_collection("a")), ErrorKind::PrivilegeRequired);

        engine.grant_privilege();
        engine.delete_collection("a").unwrap();
    }

    #[test]
    fn refusal_names_the_operation_once() {
        let engine = engine_with(
            Arc::new(TfIdfEmbedder::new(64)),
            None,
            EngineConfig {
                require_privilege: true,
                ..Default::default()
            },
        );

        let err = engine.list_collections().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation 'list_collections' requires privilege. Call 'grant_privilege' first."
        );
    }
}
