//! End-to-end runs of the pipeline against a scripted provider.

mod test_utils;

use redraft_core::{ChapterStatus, ChapterUpdate, Glossary, ProjectState};
use redraft_error::{ProviderError, ProviderErrorKind};
use redraft_interface::ProjectRepository;
use redraft_pipeline::{
    FIRST_CHAPTER, InMemoryRepository, NO_GLOSSARY, NO_SUMMARY, PipelineOrchestrator, RunOptions,
};
use redraft_storage::{FileSystemRepository, ProjectLayout};
use tempfile::TempDir;
use test_utils::{
    CallKind, MockProvider, book, book_responder, complete, executor, marker, repository,
    test_template,
};

fn alex_glossary() -> Glossary {
    let mut glossary = Glossary::new();
    glossary.insert("characters", vec!["Alex".to_string()]);
    glossary
}

async fn orchestrator(
    state: ProjectState,
    provider: &MockProvider,
    with_glossary: bool,
) -> (PipelineOrchestrator<MockProvider, InMemoryRepository>, InMemoryRepository) {
    let repo = repository(state);
    if with_glossary {
        repo.set_glossary(alex_glossary()).await;
    }
    let orchestrator = PipelineOrchestrator::new(
        "test-book",
        executor(provider.clone(), 1),
        repo.clone(),
        test_template(),
        "Terse and vivid.",
    );
    (orchestrator, repo)
}

/// Rewrite prompts keyed by the chapter whose original text they carry.
fn rewrite_prompts(provider: &MockProvider) -> Vec<(usize, String)> {
    provider
        .prompts()
        .into_iter()
        .filter(|p| CallKind::of(p) == CallKind::Rewrite)
        .map(|p| (marker(&p, "ORIGINAL").unwrap_or(0), p))
        .collect()
}

#[tokio::test]
async fn test_each_prompt_carries_the_previous_summary() {
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, repo) = orchestrator(book(3), &provider, true).await;

    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.completed(), &vec![1, 2, 3]);
    assert!(report.failed().is_empty());
    assert_eq!(
        provider.call_kinds(),
        vec![
            CallKind::Rewrite,
            CallKind::Summary,
            CallKind::Rewrite,
            CallKind::Summary,
            CallKind::Rewrite,
            CallKind::Summary,
        ]
    );

    let prompts = rewrite_prompts(&provider);
    assert_eq!(prompts[0].0, 1);
    assert!(prompts[0].1.contains(&format!("PREVIOUS: {FIRST_CHAPTER}")));
    assert!(prompts[1].1.contains("PREVIOUS: summary-1\n"));
    assert!(prompts[2].1.contains("PREVIOUS: summary-2\n"));
    assert!(prompts[2].1.contains("STYLE: Terse and vivid."));
    assert!(prompts[2].1.contains("- Characters: Alex"));

    assert_eq!(repo.text("chapter_003.txt").await.as_deref(), Some("REWRITTEN-3"));
    let state = repo.state().await.unwrap();
    assert_eq!(state.chapter(3).unwrap().summary(), "summary-3");
    assert_eq!(provider.temperatures(), vec![0.7, 0.3, 0.7, 0.3, 0.7, 0.3]);
}

#[tokio::test]
async fn test_resumed_run_skips_completed_chapters() {
    let mut state = book(3);
    complete(&mut state, &[1], "summary-1");
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, _repo) = orchestrator(state, &provider, true).await;

    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.completed(), &vec![2, 3]);
    assert_eq!(*report.backfilled(), None);
    let chapters: Vec<usize> = rewrite_prompts(&provider).iter().map(|(n, _)| *n).collect();
    assert_eq!(chapters, vec![2, 3]);
    assert!(rewrite_prompts(&provider)[0].1.contains("PREVIOUS: summary-1\n"));
}

#[tokio::test]
async fn test_missing_previous_summary_is_backfilled_once() {
    let mut state = book(5);
    complete(&mut state, &[1, 2, 3], "earlier");
    complete(&mut state, &[4], "");
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, repo) = orchestrator(state, &provider, true).await;
    repo.write_rewritten_text("chapter_004.txt", "REWRITTEN-4")
        .await
        .unwrap();

    let options = RunOptions::builder().start(5usize).build().unwrap();
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(*report.backfilled(), Some(4));
    assert_eq!(
        provider.call_kinds(),
        vec![CallKind::Summary, CallKind::Rewrite, CallKind::Summary]
    );
    assert!(provider.prompts()[0].contains("REWRITTEN-4"));
    assert!(provider.prompts()[1].contains("PREVIOUS: summary-4\n"));

    let state = repo.state().await.unwrap();
    assert_eq!(state.chapter(4).unwrap().summary(), "summary-4");
    assert_eq!(*state.chapter(4).unwrap().status(), ChapterStatus::Completed);
}

#[tokio::test]
async fn test_backfill_skipped_when_summary_present() {
    let mut state = book(3);
    complete(&mut state, &[1], "summary-1");
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, _repo) = orchestrator(state, &provider, true).await;

    let options = RunOptions::builder().start(2usize).end(2usize).build().unwrap();
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(*report.backfilled(), None);
    assert_eq!(report.completed(), &vec![2]);
    assert_eq!(provider.call_kinds(), vec![CallKind::Rewrite, CallKind::Summary]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_chapter_does_not_stop_the_run() {
    let provider = MockProvider::new_responder(book_responder(&[3]));
    let (mut orchestrator, repo) = orchestrator(book(5), &provider, true).await;

    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.completed(), &vec![1, 2, 4, 5]);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].0, 3);
    assert!(report.failed()[0].1.contains("connection reset on chapter 3"));

    // one retry for the failing chapter
    let chapter_three = rewrite_prompts(&provider)
        .iter()
        .filter(|(n, _)| *n == 3)
        .count();
    assert_eq!(chapter_three, 2);

    let prompts = rewrite_prompts(&provider);
    let four = prompts.iter().find(|(n, _)| *n == 4).unwrap();
    assert!(four.1.contains(&format!("PREVIOUS: {NO_SUMMARY}")));

    let state = repo.state().await.unwrap();
    let failed = state.chapter(3).unwrap();
    assert_eq!(*failed.status(), ChapterStatus::Failed);
    assert!(failed.error().as_deref().unwrap().contains("chapter 3"));
    assert_eq!(repo.text("chapter_003.txt").await, None);
    assert_eq!(*state.status_report().completed(), 4);
}

#[tokio::test]
async fn test_glossary_is_built_once_from_the_whole_book() {
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, repo) = orchestrator(book(2), &provider, false).await;

    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert!(*report.glossary_built());
    assert_eq!(provider.call_kinds()[0], CallKind::Glossary);
    let glossary_prompt = &provider.prompts()[0];
    assert!(glossary_prompt.contains("ORIGINAL-1"));
    assert!(glossary_prompt.contains("ORIGINAL-2"));
    assert_eq!(provider.temperatures()[0], 0.1);

    let saved = repo.glossary().await.unwrap();
    assert_eq!(saved.terms("characters").unwrap(), ["Alex".to_string()]);
    assert!(rewrite_prompts(&provider)
        .iter()
        .all(|(_, p)| p.contains("- Characters: Alex")));

    // second run finds the glossary and does not ask again
    let second = orchestrator.run(&RunOptions::default()).await.unwrap();
    assert!(!*second.glossary_built());
    assert!(second.completed().is_empty());
}

#[tokio::test]
async fn test_unparseable_glossary_is_saved_empty() {
    let responder = book_responder(&[]);
    let provider = MockProvider::new_responder(move |prompt| match CallKind::of(prompt) {
        CallKind::Glossary => Ok("I could not find any names, sorry.".to_string()),
        _ => responder(prompt),
    });
    let (mut orchestrator, repo) = orchestrator(book(1), &provider, false).await;

    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.completed(), &vec![1]);
    let saved = repo.glossary().await.unwrap();
    assert!(saved.is_empty());
    assert!(rewrite_prompts(&provider)[0]
        .1
        .contains(&format!("GLOSSARY: {NO_GLOSSARY}")));
}

#[tokio::test]
async fn test_malformed_glossary_file_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path(), "test-book");
    layout.create_dirs().await.unwrap();
    let repo = FileSystemRepository::new(layout.clone());
    repo.save_state(&book(2)).await.unwrap();
    std::fs::write(
        layout.glossary_file(),
        r#"{"characters": ["Alex"], "notes": "none"}"#,
    )
    .unwrap();

    let provider = MockProvider::new_responder(book_responder(&[]));
    let mut orchestrator = PipelineOrchestrator::new(
        "test-book",
        executor(provider.clone(), 0),
        repo,
        test_template(),
        "",
    );
    let report = orchestrator.run(&RunOptions::default()).await.unwrap();

    assert_eq!(report.completed(), &vec![1, 2]);
    assert!(!*report.glossary_built());
    assert!(!provider.call_kinds().contains(&CallKind::Glossary));
    for (_, prompt) in rewrite_prompts(&provider) {
        assert!(prompt.contains(&format!("GLOSSARY: {NO_GLOSSARY}")));
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_backfill_is_not_reported() {
    let mut state = book(3);
    complete(&mut state, &[1, 2], "");
    let responder = book_responder(&[]);
    let provider = MockProvider::new_responder(move |prompt| match CallKind::of(prompt) {
        CallKind::Summary => Err(ProviderError::new(ProviderErrorKind::Transport(
            "summary service down".to_string(),
        ))),
        _ => responder(prompt),
    });
    let (mut orchestrator, repo) = orchestrator(state, &provider, true).await;

    let options = RunOptions::builder().start(3usize).build().unwrap();
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(*report.backfilled(), None);
    assert_eq!(report.completed(), &vec![3]);
    assert!(rewrite_prompts(&provider)[0]
        .1
        .contains(&format!("PREVIOUS: {NO_SUMMARY}")));
    assert_eq!(repo.state().await.unwrap().chapter(2).unwrap().summary(), "");
}

#[tokio::test]
async fn test_failed_chapters_wait_for_retry_flag() {
    let mut state = book(3);
    complete(&mut state, &[1], "summary-1");
    state
        .apply(2, &ChapterUpdate::failed("earlier outage"))
        .unwrap();
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, repo) = orchestrator(state, &provider, true).await;

    let first = orchestrator.run(&RunOptions::default()).await.unwrap();
    assert_eq!(first.completed(), &vec![3]);
    assert!(first.requeued().is_empty());
    assert_eq!(
        *repo.state().await.unwrap().chapter(2).unwrap().status(),
        ChapterStatus::Failed
    );

    let options = RunOptions::builder().retry_failed(true).build().unwrap();
    let second = orchestrator.run(&options).await.unwrap();
    assert_eq!(second.requeued(), &vec![2]);
    assert_eq!(second.completed(), &vec![2]);
    let chapter = repo.state().await.unwrap().chapter(2).cloned().unwrap();
    assert_eq!(*chapter.status(), ChapterStatus::Completed);
    assert!(chapter.error().is_none());
}

#[tokio::test]
async fn test_prompt_log_is_reset_each_run() {
    let provider = MockProvider::new_responder(book_responder(&[]));
    let (mut orchestrator, repo) = orchestrator(book(4), &provider, true).await;

    let options = RunOptions::builder().max_chapters(2usize).build().unwrap();
    orchestrator.run(&options).await.unwrap();
    let first: Vec<usize> = repo.prompt_log().await.iter().map(|(i, _, _)| *i).collect();
    assert_eq!(first, vec![1, 2]);

    orchestrator.run(&options).await.unwrap();
    let log = repo.prompt_log().await;
    let second: Vec<usize> = log.iter().map(|(i, _, _)| *i).collect();
    assert_eq!(second, vec![3, 4]);
    // the mock counts whitespace-separated words
    let (_, tokens, prompt) = &log[0];
    assert_eq!(*tokens, prompt.split_whitespace().count());
}

#[tokio::test]
async fn test_run_without_state_fails() {
    let provider = MockProvider::new_responder(book_responder(&[]));
    let repo = InMemoryRepository::new();
    repo.set_glossary(alex_glossary()).await;
    let mut orchestrator = PipelineOrchestrator::new(
        "missing",
        executor(provider.clone(), 0),
        repo,
        test_template(),
        "",
    );

    assert!(orchestrator.run(&RunOptions::default()).await.is_err());
    assert_eq!(provider.call_count(), 0);
}
