mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{GB, Harness, PeerResponse, honest, transfer, xunlei};
use peerban_client_api::ClientError;
use peerban_primitives::{HOUR_SECS, unix_now};
use peerban_scanner::{ServiceConfig, ServiceError, SyncOutcome};

#[tokio::test]
async fn tick_pushes_only_on_change() {
    let h = Harness::new();
    h.client.add_transfer(
        transfer("a", GB),
        PeerResponse::Peers(vec![xunlei("198.51.100.20"), honest("192.0.2.1")]),
    );
    let service = h.service();

    let first = service.tick().await.unwrap();
    assert_eq!(first.pass.banned, 1);
    assert_eq!(first.sync, SyncOutcome::Pushed { addresses: 1 });
    assert_eq!(h.client.last_push(), Some(vec!["198.51.100.20".to_string()]));

    // Seeing the same peer again refreshes its ban, which counts as a change.
    let second = service.tick().await.unwrap();
    assert_eq!(second.sync, SyncOutcome::Pushed { addresses: 1 });

    // A pass without bans leaves the ledger clean.
    h.client.peers.lock().insert(
        "a".to_string(),
        PeerResponse::Peers(vec![honest("192.0.2.1")]),
    );
    let third = service.tick().await.unwrap();
    assert_eq!(third.pass.banned, 0);
    assert_eq!(third.sync, SyncOutcome::Unchanged);

    let fourth = service.tick().await.unwrap();
    assert_eq!(fourth.sync, SyncOutcome::Unchanged);
    assert_eq!(h.client.push_count(), 2);
}

#[tokio::test]
async fn expiry_triggers_push() {
    let h = Harness::new();
    let stale = unix_now() - 13 * HOUR_SECS;
    h.ledger.insert_at("192.0.2.66", stale);
    h.ledger.insert("192.0.2.77");
    h.ledger.take_dirty();

    let report = h.service().tick().await.unwrap();

    assert_eq!(report.sweep.expired_addresses, 1);
    assert_eq!(report.sync, SyncOutcome::Pushed { addresses: 1 });
    assert_eq!(h.client.last_push(), Some(vec!["192.0.2.77".to_string()]));
}

#[tokio::test]
async fn failed_scan_skips_push() {
    let h = Harness::new();
    h.client.add_transfer(
        transfer("a", GB),
        PeerResponse::Peers(vec![xunlei("198.51.100.20")]),
    );
    h.client.add_transfer(transfer("b", GB), PeerResponse::Forbidden);

    let err = h.service().tick().await.unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(h.client.push_count(), 0);
}

#[tokio::test]
async fn failed_push_is_retried_next_tick() {
    let h = Harness::new();
    h.client.add_transfer(
        transfer("a", GB),
        PeerResponse::Peers(vec![xunlei("198.51.100.20")]),
    );
    let service = h.service();
    *h.client.fail_push.lock() = true;

    let err = service.tick().await.unwrap_err();
    assert_matches!(err, ServiceError::Sync(ClientError::Transport(_)));
    assert!(h.ledger.is_dirty());

    *h.client.fail_push.lock() = false;
    h.client.peers.lock().clear();
    let report = service.tick().await.unwrap();
    assert_eq!(report.sync, SyncOutcome::Pushed { addresses: 1 });
}

#[tokio::test(start_paused = true)]
async fn tick_times_out() {
    let h = Harness::new();
    *h.client.hang_on_list.lock() = true;
    let service = h.service_with(ServiceConfig {
        interval: Duration::from_secs(10),
        pass_timeout: Duration::from_secs(10),
    });

    let err = service.tick().await.unwrap_err();

    assert_matches!(err, ServiceError::Timeout(d) if d == Duration::from_secs(10));
    assert!(!err.is_forbidden());
}

#[tokio::test]
async fn forbidden_triggers_login() {
    let h = Harness::new();
    *h.client.transfers_forbidden.lock() = true;
    let service = h.service();

    let err = service.tick().await.unwrap_err();
    service.recover(&err).await;
    assert_eq!(h.client.logins.load(Ordering::SeqCst), 1);

    service.tick().await.unwrap();
}

#[tokio::test]
async fn transport_failure_does_not_login() {
    let h = Harness::new();
    h.client
        .add_transfer(transfer("a", GB), PeerResponse::FailAfterStarted(1));
    let service = h.service();

    let err = service.tick().await.unwrap_err();
    service.recover(&err).await;

    assert_eq!(h.client.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn run_ticks_until_shutdown() {
    let h = Harness::new();
    h.client.add_transfer(
        transfer("a", GB),
        PeerResponse::Peers(vec![xunlei("198.51.100.20")]),
    );
    let service = h.service_with(ServiceConfig {
        interval: Duration::from_secs(10),
        pass_timeout: Duration::from_secs(10),
    });

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(service.run(async {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_secs(35)).await;
    tx.send(()).unwrap();
    handle.await.unwrap();

    // Ticks at 0s, 10s, 20s, 30s.
    assert_eq!(h.client.fetches.lock().len(), 4);
    assert!(h.client.push_count() >= 1);
}
