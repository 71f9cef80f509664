#![forbid(unsafe_code)]

mod common;

use common::{config_with, engine};
use orchestrator::ControlEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stops_after_max_cycles_on_timer() {
    let mut config = config_with(5);
    config.grid.reload_interval = Duration::from_millis(1);
    config.grid.max_cycles = Some(3);
    let (mut engine, _fetcher, observer) = engine(config);

    let (_tx, rx) = mpsc::unbounded_channel();
    tokio::time::timeout(
        Duration::from_secs(10),
        engine.run_until(CancellationToken::new(), rx),
    )
    .await
    .expect("run loop did not stop")
    .unwrap();

    assert_eq!(engine.coordinator().current_cycle(), 3);
    assert_eq!(observer.averages().len(), 3);
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reload_events_start_cycles() {
    let mut config = config_with(5);
    config.grid.max_cycles = Some(3);
    let (mut engine, _fetcher, _observer) = engine(config);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ControlEvent::DumpInfo).unwrap();
    tx.send(ControlEvent::Reload).unwrap();
    tx.send(ControlEvent::Reload).unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        engine.run_until(CancellationToken::new(), rx),
    )
    .await
    .expect("run loop did not stop")
    .unwrap();

    assert_eq!(engine.coordinator().current_cycle(), 3);
    assert_eq!(engine.coordinator().ceiling(), 3);
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stops_right_after_last_reload_without_timer() {
    let mut config = config_with(5);
    config.grid.max_cycles = Some(2);
    let (mut engine, _fetcher, observer) = engine(config);

    // the sender stays alive, so only the cycle limit can end the loop
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ControlEvent::Reload).unwrap();

    tokio::time::timeout(
        Duration::from_secs(1),
        engine.run_until(CancellationToken::new(), rx),
    )
    .await
    .expect("run loop kept waiting after the last cycle")
    .unwrap();

    assert_eq!(engine.coordinator().current_cycle(), 2);
    assert_eq!(observer.averages().len(), 2);
    drop(tx);
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dump_requests_do_not_delay_timed_reloads() {
    let mut config = config_with(5);
    config.grid.reload_interval = Duration::from_millis(100);
    config.grid.max_cycles = Some(3);
    let (mut engine, _fetcher, _observer) = engine(config);

    let (tx, rx) = mpsc::unbounded_channel();
    let chatter = tokio::spawn(async move {
        while tx.send(ControlEvent::DumpInfo).is_ok() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    });

    tokio::time::timeout(
        Duration::from_secs(5),
        engine.run_until(CancellationToken::new(), rx),
    )
    .await
    .expect("timed reloads starved by dump requests")
    .unwrap();

    assert_eq!(engine.coordinator().current_cycle(), 3);
    chatter.await.unwrap();
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn closed_control_channel_without_timer_stops() {
    let (mut engine, _fetcher, _observer) = engine(config_with(5));

    let (tx, rx) = mpsc::unbounded_channel::<ControlEvent>();
    drop(tx);
    engine
        .run_until(CancellationToken::new(), rx)
        .await
        .unwrap();

    assert_eq!(engine.coordinator().current_cycle(), 1);
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_stops_the_loop() {
    let (mut engine, _fetcher, _observer) = engine(config_with(5));
    let cancel = CancellationToken::new();
    let (_tx, rx) = mpsc::unbounded_channel();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(10), engine.run_until(cancel, rx))
        .await
        .expect("run loop ignored cancellation")
        .unwrap();
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn netlog_is_flushed_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with(3);
    config.netlog.enabled = true;
    config.netlog.dir = dir.path().to_owned();
    config.netlog.file = "net.log".into();
    let (mut engine, _fetcher, _observer) = engine(config);

    engine.load_cycle().await;
    engine.load_cycle().await;
    engine.shutdown().await;

    let contents = std::fs::read_to_string(dir.path().join("net.log")).unwrap();
    let kinds: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "cycle_started").count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == "request_succeeded").count(), 3);
    assert_eq!(kinds.iter().filter(|k| **k == "cycle_complete").count(), 2);
}
