use std::sync::Arc;

use client_blockchain_core::{
    Address, CODE_USER_REJECTED, ChainDescriptor, ChainId, MockWallet, ProviderError,
    WalletProvider,
};
use runtime::repository::{SESSION_KEY, SessionRecord};
use runtime::{
    ConnectError, ConnectionEvent, ConnectionManager, ConnectionStatus, DisconnectReason, Event,
    EventBus, InMemoryStore, KeyValueStore, ManualClock, ReconnectOutcome, SessionStore, Topic,
};

const BSC: ChainId = 56;
const DAY_SECS: u64 = 24 * 60 * 60;
const START_SECS: u64 = 1_700_000_000;

fn bsc() -> ChainDescriptor {
    ChainDescriptor {
        chain_id: BSC,
        name: "BNB Smart Chain".into(),
        rpc_url: "https://bsc-dataseed.binance.org".into(),
        explorer_url: "https://bscscan.com".into(),
        native_symbol: "BNB".into(),
        native_decimals: 18,
    }
}

struct Harness {
    wallet: MockWallet,
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    bus: EventBus,
    manager: ConnectionManager,
}

impl Harness {
    fn new(wallet: MockWallet) -> Self {
        Self::with_store(wallet, Arc::new(InMemoryStore::new()))
    }

    fn with_store(wallet: MockWallet, store: Arc<InMemoryStore>) -> Self {
        let clock = Arc::new(ManualClock::at_secs(START_SECS));
        let bus = EventBus::new();
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let manager = ConnectionManager::new(
            Some(provider),
            SessionStore::new(store.clone()),
            clock.clone(),
            bsc(),
            bus.clone(),
        );
        Self {
            wallet,
            store,
            clock,
            bus,
            manager,
        }
    }

    fn stored_session(&self) -> Option<SessionRecord> {
        self.store
            .get(SESSION_KEY)
            .expect("store readable")
            .map(|raw| serde_json::from_str(&raw).expect("valid record"))
    }
}

fn user() -> Address {
    Address::repeat_byte(0x11)
}

/// Connect, persist, publish, then disconnect and forget.
#[tokio::test]
async fn test_connect_and_disconnect_round() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    let mut events = h.bus.subscribe(Topic::Connection);

    let address = h.manager.connect().await.expect("connect should succeed");
    assert_eq!(address, user());

    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Connected);
    assert_eq!(snapshot.address, Some(user()));
    assert_eq!(snapshot.chain_id, Some(BSC));
    assert_eq!(snapshot.signer.map(|s| s.address()), Some(user()));

    let record = h.stored_session().expect("session persisted");
    assert_eq!(record.address, user());
    assert_eq!(record.chain_id, "56");
    assert_eq!(record.timestamp, START_SECS as i64 * 1000);

    assert_eq!(
        events.try_recv().expect("connected event"),
        Event::Connection(ConnectionEvent::Connected {
            address: user(),
            chain_id: BSC
        })
    );

    h.manager.disconnect().await;
    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
    assert!(snapshot.address.is_none() && snapshot.signer.is_none());
    assert!(h.stored_session().is_none());
}

/// A user rejection leaves the state machine at `Disconnected`.
#[tokio::test]
async fn test_rejected_connect_is_silent() {
    let wallet = MockWallet::with_account(BSC, user());
    wallet.fail_request_accounts(Some(ProviderError::rpc(
        CODE_USER_REJECTED,
        "User rejected the request.",
    )));
    let h = Harness::new(wallet);

    let err = h.manager.connect().await.expect_err("connect should fail");
    assert_eq!(err, ConnectError::Rejected);
    assert!(err.is_silent());
    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
    assert!(h.stored_session().is_none());
}

#[tokio::test]
async fn test_connect_on_unsupported_network_fails() {
    let h = Harness::new(MockWallet::with_account(1, user()));

    let err = h.manager.connect().await.expect_err("wrong chain");
    assert_eq!(
        err,
        ConnectError::UnsupportedNetwork {
            expected: BSC,
            actual: 1
        }
    );
    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
    assert!(h.stored_session().is_none());
}

#[tokio::test]
async fn test_connect_without_wallet() {
    let manager = ConnectionManager::new(
        None,
        SessionStore::new(Arc::new(InMemoryStore::new())),
        Arc::new(ManualClock::at_secs(START_SECS)),
        bsc(),
        EventBus::new(),
    );

    assert_eq!(manager.connect().await, Err(ConnectError::Unavailable));
    assert_eq!(manager.snapshot().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_connect_with_empty_accounts() {
    let h = Harness::new(MockWallet::new(BSC));
    assert_eq!(h.manager.connect().await, Err(ConnectError::NoAccounts));
    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
}

/// Disconnecting twice only touches storage once.
#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager.connect().await.expect("connect");
    h.manager.disconnect().await;

    let mutations = h.store.mutations();
    h.manager.disconnect().await;
    assert_eq!(h.store.mutations(), mutations);
    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
}

/// A fresh session is restored without prompting.
#[tokio::test]
async fn test_silent_reconnect_restores_session() {
    let store = Arc::new(InMemoryStore::new());
    let first = Harness::with_store(MockWallet::with_account(BSC, user()), store.clone());
    first.manager.connect().await.expect("connect");
    drop(first);

    let h = Harness::with_store(MockWallet::with_account(BSC, user()), store);
    h.clock.advance_secs(6 * DAY_SECS);
    assert!(!h.manager.snapshot().wallet_ready);

    let outcome = h.manager.attempt_silent_reconnect().await;
    assert_eq!(outcome, ReconnectOutcome::Restored(user()));

    let snapshot = h.manager.snapshot();
    assert!(snapshot.wallet_ready);
    assert_eq!(snapshot.identity(), Some((user(), BSC)));
    assert!(h.wallet.sent_transactions().is_empty());
}

/// Sessions older than seven days are deleted and never restored.
#[tokio::test]
async fn test_silent_reconnect_rejects_expired_session() {
    let store = Arc::new(InMemoryStore::new());
    let first = Harness::with_store(MockWallet::with_account(BSC, user()), store.clone());
    first.manager.connect().await.expect("connect");
    drop(first);

    let h = Harness::with_store(MockWallet::with_account(BSC, user()), store);
    h.clock.advance_secs(7 * DAY_SECS + 1);

    assert_eq!(
        h.manager.attempt_silent_reconnect().await,
        ReconnectOutcome::Expired
    );
    assert!(h.stored_session().is_none());
    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
    assert!(snapshot.wallet_ready);
}

#[tokio::test]
async fn test_silent_reconnect_with_different_account() {
    let store = Arc::new(InMemoryStore::new());
    let first = Harness::with_store(MockWallet::with_account(BSC, user()), store.clone());
    first.manager.connect().await.expect("connect");
    drop(first);

    let other = Address::repeat_byte(0x22);
    let h = Harness::with_store(MockWallet::with_account(BSC, other), store);

    assert_eq!(
        h.manager.attempt_silent_reconnect().await,
        ReconnectOutcome::Mismatch
    );
    assert!(h.stored_session().is_none());
    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_silent_reconnect_without_session() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    assert_eq!(
        h.manager.attempt_silent_reconnect().await,
        ReconnectOutcome::NoSession
    );
    assert!(h.manager.snapshot().wallet_ready);
}

/// Revoking every account disconnects and clears the stored session.
#[tokio::test]
async fn test_accounts_revoked_disconnects() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager.connect().await.expect("connect");
    let mut events = h.bus.subscribe(Topic::Connection);

    h.manager
        .handle_wallet_event(client_blockchain_core::WalletEvent::AccountsChanged(vec![]))
        .await;

    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
    assert!(h.stored_session().is_none());
    assert_eq!(
        events.try_recv().expect("disconnect event"),
        Event::Connection(ConnectionEvent::Disconnected {
            reason: DisconnectReason::AccountsRevoked
        })
    );
}

#[tokio::test]
async fn test_switch_to_unsupported_chain_disconnects() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager.connect().await.expect("connect");

    h.wallet.set_chain_id(97);
    h.manager
        .handle_wallet_event(client_blockchain_core::WalletEvent::ChainChanged(97))
        .await;

    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
    assert!(snapshot.chain_id.is_none());
    assert!(h.stored_session().is_none());
}

/// Switching accounts re-keys the signer and the stored session.
#[tokio::test]
async fn test_account_change_rebinds_signer() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager.connect().await.expect("connect");

    let other = Address::repeat_byte(0x22);
    h.wallet.set_accounts(vec![other]);
    h.manager
        .handle_wallet_event(client_blockchain_core::WalletEvent::AccountsChanged(vec![other]))
        .await;

    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.identity(), Some((other, BSC)));
    assert_eq!(snapshot.signer.map(|s| s.address()), Some(other));
    assert_eq!(h.stored_session().map(|r| r.address), Some(other));
}

#[tokio::test]
async fn test_account_change_ignored_while_disconnected() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager
        .handle_wallet_event(client_blockchain_core::WalletEvent::AccountsChanged(vec![user()]))
        .await;

    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
    assert_eq!(h.store.mutations(), 0);
}

/// Wallet notifications flow through the spawned listener.
#[tokio::test]
async fn test_event_listener_forwards_wallet_events() {
    let h = Harness::new(MockWallet::with_account(BSC, user()));
    h.manager.connect().await.expect("connect");
    let listener = h.manager.spawn_event_listener().expect("wallet present");
    let mut states = h.manager.subscribe();
    states.borrow_and_update();

    h.wallet.change_accounts(vec![]);
    states.changed().await.expect("state update");

    assert_eq!(h.manager.snapshot().status, ConnectionStatus::Disconnected);
    listener.abort();
}

/// An unknown chain is added to the wallet before switching.
#[tokio::test]
async fn test_switch_network_adds_missing_chain() {
    let wallet = MockWallet::with_account(1, user());
    let h = Harness::new(wallet);

    h.manager
        .switch_to_supported_network()
        .await
        .expect("switch should succeed");
    assert_eq!(h.wallet.current_chain(), BSC);
}
