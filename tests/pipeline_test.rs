//! End-to-end tests for the classification pipeline with a mocked service

use async_trait::async_trait;
use mockall::mock;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::Instant;
use tweet_triage::classifier::{ChatMessage, ClassificationService, Role, TweetClassifier};
use tweet_triage::models::{TweetOutcome, TweetRecord};
use tweet_triage::{Result, ResultTable, TriageError, TriagePipeline, TweetStore};

mock! {
    pub Service {}

    #[async_trait]
    impl ClassificationService for Service {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
    }
}

fn tweet(content: &str, timestamp: &str) -> TweetRecord {
    TweetRecord {
        content: content.to_string(),
        timestamp: timestamp.to_string(),
    }
}

#[tokio::test]
async fn test_single_tweet_end_to_end() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = TweetStore::from(vec![tweet("Ma facture est incorrecte", "1700000000000")]);

    let mut service = MockService::new();
    service
        .expect_complete()
        .withf(|messages| {
            messages.len() == 2 && messages[0].role == Role::System && messages[1].content == "Ma facture est incorrecte"
        })
        .times(1)
        .returning(|_| Ok("Note : 85\nSentiment : négatif\nProblème de facturation : oui".to_string()));

    let table = ResultTable::new(dir.path().join("model_responses.csv"));
    let mut pipeline = TriagePipeline::new(store, TweetClassifier::new(service), table);

    let record = pipeline.process_one(1).await.expect("process tweet");
    assert_eq!(record.id, 1);
    assert_eq!(record.date, "2023-11-14");
    assert_eq!(record.score, Some(85));
    assert_eq!(record.sentiment, "négatif");
    assert_eq!(record.category, "problème de facturation : oui");

    let rows = pipeline.table().read_all().expect("read back");
    assert_eq!(rows, vec![record]);
}

#[tokio::test]
async fn test_service_error_is_fatal_in_single_mode() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = TweetStore::from(vec![tweet("Panne", "1700000000000")]);

    let mut service = MockService::new();
    service
        .expect_complete()
        .returning(|_| Err(TriageError::ClassificationService("timeout".to_string())));

    let table = ResultTable::new(dir.path().join("model_responses.csv"));
    let mut pipeline = TriagePipeline::new(store, TweetClassifier::new(service), table);

    let err = pipeline.process_one(1).await.unwrap_err();
    assert!(matches!(err, TriageError::ClassificationService(_)));
    assert!(!pipeline.table().path().exists());
    assert_eq!(pipeline.metrics().classification_failures_total, 1);
}

#[tokio::test]
async fn test_batch_continues_after_failure() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = TweetStore::from(vec![
        tweet("Ma facture", "1700000000000"),
        tweet("Service injoignable", "1700000000000"),
        tweet("Merci", "2024-02-01"),
    ]);

    let mut calls = 0;
    let mut service = MockService::new();
    service.expect_complete().times(3).returning(move |_| {
        calls += 1;
        if calls == 2 {
            Err(TriageError::ClassificationService("503 Service Unavailable".to_string()))
        } else {
            Ok(format!("Note : {}\nSentiment : neutre\nCatégorie : Panne et urgences", calls * 10))
        }
    });

    let table = ResultTable::new(dir.path().join("model_responses.csv"));
    let mut pipeline = TriagePipeline::new(store, TweetClassifier::new(service), table);

    let mut lines = Vec::new();
    let report = pipeline
        .run_batch(1..=3, Duration::ZERO, |index, outcome| lines.push((index, outcome.clone())))
        .await
        .expect("batch should not abort");

    assert_eq!(report.recorded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 2);
    assert_eq!(report.attempted(), 3);
    assert_eq!(lines.len(), 3);
    assert!(matches!(lines[1].1, TweetOutcome::Failed { .. }));

    let rows = pipeline.table().read_all().expect("read back");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[1].id, 2);
    assert_eq!(rows[1].date, "2024-02-01");
    assert_eq!(rows[1].score, Some(30));
}

#[tokio::test]
async fn test_rerun_assigns_new_ids() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("model_responses.csv");

    for expected_id in 1..=2 {
        let store = TweetStore::from(vec![tweet("Panne", "1700000000000")]);
        let mut service = MockService::new();
        service
            .expect_complete()
            .returning(|_| Ok("Note : 50\nSentiment : négatif\nPanne et urgences".to_string()));
        let mut pipeline = TriagePipeline::new(store, TweetClassifier::new(service), ResultTable::new(&path));

        let record = pipeline.process_one(1).await.expect("process tweet");
        assert_eq!(record.id, expected_id);
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_waits_between_calls_only() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = TweetStore::from(vec![
        tweet("Panne", "1700000000000"),
        tweet("Facture", "1700000000000"),
        tweet("Compteur", "1700000000000"),
    ]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&calls);
    let mut service = MockService::new();
    service.expect_complete().times(3).returning(move |_| {
        seen.lock().expect("call log").push(Instant::now());
        Ok("Note : 20\nSentiment : neutre\nPanne et urgences".to_string())
    });

    let table = ResultTable::new(dir.path().join("model_responses.csv"));
    let mut pipeline = TriagePipeline::new(store, TweetClassifier::new(service), table);

    let start = Instant::now();
    let report = pipeline
        .run_batch(1..=3, Duration::from_secs(5), |_, _| {})
        .await
        .expect("batch");

    assert_eq!(report.recorded, 3);
    assert_eq!(start.elapsed(), Duration::from_secs(10));

    let calls = calls.lock().expect("call log");
    let offsets: Vec<Duration> = calls.iter().map(|at| at.duration_since(start)).collect();
    assert_eq!(
        offsets,
        vec![Duration::ZERO, Duration::from_secs(5), Duration::from_secs(10)]
    );
}
