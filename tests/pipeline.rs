mod common;

use tempfile::TempDir;

use common::{config_in, write_pdf, FnGenerator, KeywordEmbedder, OfflineEmbedder};
use lexqa_lib::assistant::{AssistantContext, PipelineError, PromptTemplate, Session, TurnState};
use lexqa_lib::config::{ChunkingConfig, Config, DONT_KNOW_SENTINEL};
use lexqa_lib::embedding::Embedder;
use lexqa_lib::generation::{GenerationError, Generator};
use lexqa_lib::ingest::build_index;
use lexqa_lib::rag::{self, VectorIndex, VectorIndexError};

fn legal_corpus(temp: &TempDir) -> Config {
    let config = config_in(temp);
    write_pdf(
        &config.paths.source_dir.join("penal_code.pdf"),
        &[
            "Theft is punishable with imprisonment of up to three years.",
            "Murder is punishable with imprisonment for life.",
        ],
    );
    write_pdf(
        &config.paths.source_dir.join("contract_act.pdf"),
        &["A contract is void without the free consent of the parties."],
    );
    config
}

fn context_for(
    config: &Config,
    generator: impl Generator + 'static,
    top_k: usize,
) -> AssistantContext {
    let index = VectorIndex::load_for_model(&config.paths.index_path, &KeywordEmbedder).unwrap();
    AssistantContext::new(
        Box::new(KeywordEmbedder),
        index,
        Box::new(generator),
        PromptTemplate::default(),
        top_k,
    )
}

#[test]
fn chunk_count_matches_window_arithmetic() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let long_pages: Vec<String> = (0..10)
        .map(|p| {
            (0..40)
                .map(|s| format!("Section {}.{} deals with land tax.", p, s))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    let refs: Vec<&str> = long_pages.iter().map(String::as_str).collect();
    write_pdf(&config.paths.source_dir.join("revenue.pdf"), &refs);

    let pages = rag::load_directory(&config.paths.source_dir).unwrap();
    assert_eq!(pages.len(), 10);

    let expected: usize = pages
        .iter()
        .map(|page| rag::expected_chunk_count(&page.text, &config.chunking))
        .sum();
    assert!(expected > 10);

    let report = build_index(&config, &KeywordEmbedder).unwrap();
    assert_eq!(report.pages, 10);
    assert_eq!(report.chunks, expected);

    let index = VectorIndex::load(&config.paths.index_path).unwrap();
    assert_eq!(index.len(), expected);
    for chunk in index.chunks() {
        assert!(chunk.content.chars().count() <= config.chunking.chunk_size);
        assert!(chunk.metadata.page < 10);
    }
}

#[test]
fn rebuild_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);

    build_index(&config, &KeywordEmbedder).unwrap();
    let first = VectorIndex::load(&config.paths.index_path).unwrap();
    build_index(&config, &KeywordEmbedder).unwrap();
    let second = VectorIndex::load(&config.paths.index_path).unwrap();

    let query = KeywordEmbedder.embed("punishment for theft").unwrap();
    assert_eq!(first.search(&query, 3), second.search(&query, 3));
}

#[test]
fn answers_cite_retrieved_pages() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);
    build_index(&config, &KeywordEmbedder).unwrap();

    let context = context_for(
        &config,
        FnGenerator(|prompt: &str| {
            assert!(prompt.contains("Theft is punishable"));
            assert!(prompt.contains("What is the punishment for theft?"));
            Ok("Up to three years of imprisonment.".to_string())
        }),
        1,
    );

    let answer = context.answer("What is the punishment for theft?").unwrap();
    assert_eq!(answer.text, "Up to three years of imprisonment.");
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].source, "penal_code.pdf");
    assert_eq!(answer.citations[0].page, 0);
    assert_eq!(
        answer.render(),
        "Up to three years of imprisonment.\n\n**Sources:**\n- penal_code.pdf (page 0)"
    );
    assert_eq!(
        answer.trace,
        vec![
            TurnState::Idle,
            TurnState::EmbeddingQuery,
            TurnState::Searching,
            TurnState::Prompting,
            TurnState::Generating,
            TurnState::Responded,
        ]
    );
}

#[test]
fn citations_are_deduplicated_per_page() {
    let temp = TempDir::new().unwrap();
    let mut config = config_in(&temp);
    config.chunking = ChunkingConfig::new(40, 5).unwrap();
    write_pdf(
        &config.paths.source_dir.join("bail_rules.pdf"),
        &["Bail may be granted by the court. Bail may be refused for serious offences. Bail conditions apply."],
    );
    build_index(&config, &KeywordEmbedder).unwrap();

    let context = context_for(&config, FnGenerator(|_: &str| Ok("Yes.".to_string())), 10);
    let answer = context.answer("When is bail granted?").unwrap();

    assert!(answer.hits.len() > 1);
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].to_string(), "bail_rules.pdf (page 0)");
}

#[test]
fn unanswerable_question_passes_sentinel_through() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);
    build_index(&config, &KeywordEmbedder).unwrap();

    let context = context_for(
        &config,
        FnGenerator(|prompt: &str| {
            if prompt.to_lowercase().contains("arson is punishable") {
                Ok("Seven years.".to_string())
            } else {
                Ok(DONT_KNOW_SENTINEL.to_string())
            }
        }),
        3,
    );

    let answer = context.answer("What is the penalty for arson?").unwrap();
    assert_eq!(answer.text, DONT_KNOW_SENTINEL);
    assert!(answer.render().starts_with(DONT_KNOW_SENTINEL));
}

#[test]
fn retrieval_depth_edges() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);
    build_index(&config, &KeywordEmbedder).unwrap();
    let context = context_for(&config, FnGenerator(|_: &str| Ok("ok".to_string())), 3);

    // More requested than stored
    let hits = context.retrieve("murder", 50).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.metadata.page, 1);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

    assert!(context.retrieve("murder", 0).unwrap().is_empty());
}

#[test]
fn missing_index_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    match VectorIndex::load_for_model(&config.paths.index_path, &KeywordEmbedder) {
        Err(VectorIndexError::IndexNotFound { path, .. }) => {
            assert_eq!(path, config.paths.index_path)
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected a missing index"),
    }
}

#[test]
fn session_records_failed_turns_and_continues() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);
    build_index(&config, &KeywordEmbedder).unwrap();

    let context = context_for(
        &config,
        FnGenerator(|prompt: &str| {
            if prompt.contains("Is murder punished") {
                Err(GenerationError::RateLimited("slow down".to_string()))
            } else {
                Ok("Answered.".to_string())
            }
        }),
        1,
    );
    let mut session = Session::new(&context);

    let reply = session.ask("Is bail a right?");
    assert!(!reply.failed);
    assert!(reply.content.starts_with("Answered."));
    assert_eq!(reply.trace.last(), Some(&TurnState::Responded));

    let reply = session.ask("Is murder punished with life?");
    assert!(reply.failed);
    assert!(reply.content.starts_with("Error: "));

    assert_eq!(
        reply.trace.last(),
        Some(&TurnState::Failed),
        "generation failure ends the trace"
    );
    assert!(reply.trace.contains(&TurnState::Generating));

    let reply = session.ask("   ");
    assert!(reply.failed);
    assert_eq!(reply.trace, vec![TurnState::Idle, TurnState::Failed]);

    assert_eq!(session.transcript().len(), 6);
}

#[test]
fn embedding_failure_fails_the_turn() {
    let temp = TempDir::new().unwrap();
    let config = legal_corpus(&temp);
    build_index(&config, &KeywordEmbedder).unwrap();

    let index = VectorIndex::load_for_model(&config.paths.index_path, &KeywordEmbedder).unwrap();
    let context = AssistantContext::new(
        Box::new(OfflineEmbedder),
        index,
        Box::new(FnGenerator(|_: &str| -> Result<String, GenerationError> {
            panic!("generation must not run after an embedding failure")
        })),
        PromptTemplate::default(),
        3,
    );

    let (result, trace) = context.answer_traced("What is theft?", 3);
    match result {
        Err(err) => {
            assert!(matches!(err, PipelineError::Embedding(_)));
            assert_eq!(err.stage(), TurnState::EmbeddingQuery);
        }
        Ok(answer) => panic!("unexpected answer: {}", answer.text),
    }
    assert_eq!(
        trace,
        vec![TurnState::Idle, TurnState::EmbeddingQuery, TurnState::Failed]
    );

    let mut session = Session::new(&context);
    let reply = session.ask("What is theft?");
    assert!(reply.failed);
    assert!(reply.content.starts_with("Error: Embedding the question failed"));
    assert_eq!(reply.trace.last(), Some(&TurnState::Failed));
    assert_eq!(session.transcript().len(), 2);
}
