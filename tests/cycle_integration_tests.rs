//! Integration tests for the poll cycle driver
//!
//! These tests verify:
//! - One cycle processes the listing snapshot in order
//! - Empty info is skipped, below-threshold torrents are kept
//! - Parse failures abort the cycle before any removal
//! - Fatal errors are alerted on the program error channel
//! - The run loop stops on shutdown

mod common;

use common::{
    MockDaemon, RecordingAlerter, SUCCESS_RESPONSE, info_block, settings_with_root, temp_root,
};
use std::fs;
use std::sync::atomic::Ordering;
use std::time::Duration;
use transmission_remove::Agent;
use transmission_remove::services::alerts::SUBJECT_PROGRAM_ERROR;
use transmission_remove::services::{CycleError, DaemonError, FilesOutcome, ParseError};

fn agent(
    daemon: MockDaemon,
    settings: transmission_remove::RemovalSettings,
    removal_alerts: &RecordingAlerter,
    error_alerts: &RecordingAlerter,
) -> Agent<MockDaemon> {
    Agent::with_alert_channels(
        daemon,
        settings,
        Box::new(removal_alerts.clone()),
        Some(Box::new(error_alerts.clone())),
    )
    .with_settle_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_cycle_removes_only_qualifying_torrents() {
    let (_temp_dir, root) = temp_root();
    fs::create_dir_all(root.join("complete/Done.Torrent")).unwrap();
    fs::create_dir_all(root.join("complete/Seeding.Torrent")).unwrap();

    let mut daemon = MockDaemon::new();
    let mut list_calls = 0;
    daemon.expect_list().times(2).returning(move || {
        list_calls += 1;
        if list_calls == 1 {
            Ok(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        } else {
            Ok(vec!["2".to_string(), "3".to_string()])
        }
    });
    daemon.expect_info().times(3).returning(|id| {
        Ok(match id {
            "1" => info_block("Done.Torrent", "2.5", "complete", "Idle"),
            "2" => Vec::new(),
            _ => info_block("Seeding.Torrent", "1.0", "complete", "Seeding"),
        })
    });
    daemon
        .expect_remove()
        .withf(|id| id == "1")
        .times(1)
        .returning(|_| Ok(vec![SUCCESS_RESPONSE.to_string()]));

    let removal_alerts = RecordingAlerter::default();
    let error_alerts = RecordingAlerter::default();
    let agent = agent(
        daemon,
        settings_with_root(&root, 2.0),
        &removal_alerts,
        &error_alerts,
    );

    let report = agent.run_cycle().await.unwrap();

    assert_eq!(report.inspected, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.kept, 1);
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].id, "1");
    assert_eq!(report.removed[0].name, "Done.Torrent");
    assert_eq!(report.removed[0].outcome.files, FilesOutcome::Deleted);

    assert!(!root.join("complete/Done.Torrent").exists());
    assert!(root.join("complete/Seeding.Torrent").exists());
    assert!(removal_alerts.alerts().is_empty());

    let metrics = agent.metrics();
    assert_eq!(metrics.torrents_inspected.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.torrents_skipped.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.torrents_removed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_parse_error_aborts_cycle_before_removal() {
    let (_temp_dir, root) = temp_root();

    let mut daemon = MockDaemon::new();
    daemon
        .expect_list()
        .times(1)
        .returning(|| Ok(vec!["1".to_string(), "2".to_string()]));
    daemon
        .expect_info()
        .withf(|id| id == "1")
        .times(1)
        .returning(|_| {
            Ok(vec![
                "  Name: Foo".to_string(),
                "  Ratio: 9.0".to_string(),
                "  Percent Done: 100%".to_string(),
                "  Location: complete".to_string(),
            ])
        });
    daemon.expect_info().withf(|id| id == "2").never();
    daemon.expect_remove().never();

    let removal_alerts = RecordingAlerter::default();
    let error_alerts = RecordingAlerter::default();
    let agent = agent(
        daemon,
        settings_with_root(&root, 2.0),
        &removal_alerts,
        &error_alerts,
    );

    match agent.run_cycle().await {
        Err(CycleError::Parse { id, source }) => {
            assert_eq!(id, "1");
            assert!(matches!(source, ParseError::Cardinality(_)));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fatal_error_sends_program_alert() {
    let (_temp_dir, root) = temp_root();

    let mut daemon = MockDaemon::new();
    daemon.expect_list().times(1).returning(|| {
        Err(DaemonError::NotInstalled {
            program: "transmission-remote".to_string(),
        })
    });

    let removal_alerts = RecordingAlerter::default();
    let error_alerts = RecordingAlerter::default();
    let agent = agent(
        daemon,
        settings_with_root(&root, 2.0),
        &removal_alerts,
        &error_alerts,
    );

    let err = agent.run_once().await.unwrap_err();
    assert!(format!("{:#}", err).contains("transmission-remote"));

    let sent = error_alerts.alerts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, SUBJECT_PROGRAM_ERROR);
    assert!(sent[0].body.contains("not able to detect an installed version"));
    assert!(removal_alerts.alerts().is_empty());
    assert_eq!(agent.metrics().cycles_failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_program_errors_not_alerted_when_disabled() {
    let (_temp_dir, root) = temp_root();

    let mut daemon = MockDaemon::new();
    daemon.expect_list().returning(|| {
        Err(DaemonError::CommandFailed {
            command: "transmission-remote localhost:9091 --list".to_string(),
            code: Some(1),
            stderr: "Couldn't connect to server".to_string(),
        })
    });

    let removal_alerts = RecordingAlerter::default();
    let agent = Agent::with_alert_channels(
        daemon,
        settings_with_root(&root, 2.0),
        Box::new(removal_alerts.clone()),
        None,
    );

    assert!(agent.run_once().await.is_err());
    assert!(removal_alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_run_forever_stops_on_shutdown() {
    let (_temp_dir, root) = temp_root();

    let mut daemon = MockDaemon::new();
    daemon.expect_list().returning(|| Ok(Vec::new()));

    let removal_alerts = RecordingAlerter::default();
    let error_alerts = RecordingAlerter::default();
    let agent = agent(
        daemon,
        settings_with_root(&root, 2.0),
        &removal_alerts,
        &error_alerts,
    );

    // remove_sleep is 300s in the sample settings, so only one cycle runs
    agent
        .run_forever(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert_eq!(agent.metrics().cycles_completed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_shutdown_waits_for_removal_in_progress() {
    let (_temp_dir, root) = temp_root();
    let content = root.join("complete/Done.Torrent");
    fs::create_dir_all(&content).unwrap();

    let mut daemon = MockDaemon::new();
    let mut list_calls = 0;
    daemon.expect_list().times(2).returning(move || {
        list_calls += 1;
        if list_calls == 1 {
            Ok(vec!["1".to_string()])
        } else {
            Ok(Vec::new())
        }
    });
    daemon
        .expect_info()
        .returning(|_| Ok(info_block("Done.Torrent", "3.0", "complete", "Idle")));
    daemon
        .expect_remove()
        .times(1)
        .returning(|_| Ok(vec![SUCCESS_RESPONSE.to_string()]));

    let removal_alerts = RecordingAlerter::default();
    let error_alerts = RecordingAlerter::default();
    let agent = Agent::with_alert_channels(
        daemon,
        settings_with_root(&root, 2.0),
        Box::new(removal_alerts.clone()),
        Some(Box::new(error_alerts.clone())),
    )
    .with_settle_delay(Duration::from_millis(200));

    // Shutdown fires during the first settle delay
    agent
        .run_forever(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert!(!content.exists());
    assert!(removal_alerts.alerts().is_empty());
    assert_eq!(agent.metrics().torrents_removed.load(Ordering::Relaxed), 1);
    assert_eq!(agent.metrics().cycles_completed.load(Ordering::Relaxed), 1);
}
