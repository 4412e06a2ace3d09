#![forbid(unsafe_code)]

use arbor_core::model::{ReadinessState, VersionCheck};
use arbor_gate::{BootstrapGate, GateConfig, GateError};
use arbor_storage::{DB_FILE_NAME, InitScript, SchemaInitializer, SqliteStore};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const NEVER: Duration = Duration::from_millis(100);

fn prepared_store(dir: &Path, username: Option<&str>, db_version: i64) {
    let mut store = SqliteStore::open(dir).expect("open fixture store");
    store
        .initialize_schema(&SchemaInitializer::default())
        .expect("init fixture schema");
    if let Some(username) = username {
        store.set_username(username).expect("set username");
    }
    store
        .set_option("db_version", &db_version.to_string())
        .expect("set version");
}

#[tokio::test]
async fn fresh_store_waits_for_user_setup() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));

    let state = gate.start_bootstrap().expect("bootstrap");

    assert_eq!(state, ReadinessState::AwaitingUserSetup);
    assert!(!gate.is_user_initialized().expect("probe"));
    assert!(gate.is_version_compatible().expect("probe"));
    assert!(
        timeout(NEVER, gate.await_ready()).await.is_err(),
        "fresh store must not resolve the ready signal"
    );
}

#[tokio::test]
async fn user_setup_completes_fresh_store() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));
    gate.start_bootstrap().expect("bootstrap");

    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.await_ready().await })
    };

    let store = gate.connected_store().expect("store is connected");
    store
        .with(|store| store.set_username("ada"))
        .expect("setup flow stores username");
    assert!(gate.is_user_initialized().expect("probe"));

    let state = gate.force_ready_from_user_setup().expect("force ready");
    assert_eq!(state, ReadinessState::Ready);

    let ready = waiter.await.expect("join").expect("ready signal");
    assert!(ready.same_store(&store));
}

#[tokio::test]
async fn force_ready_without_username_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));
    gate.start_bootstrap().expect("bootstrap");

    let err = gate
        .force_ready_from_user_setup()
        .expect_err("no username stored yet");
    assert!(matches!(err, GateError::UserNotInitialized));
    assert!(!err.is_fatal());
    assert_eq!(gate.state(), ReadinessState::AwaitingUserSetup);
}

#[tokio::test]
async fn force_ready_outside_user_setup_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));

    let err = gate
        .force_ready_from_user_setup()
        .expect_err("not started");
    assert!(matches!(
        err,
        GateError::InvalidTransition {
            from: ReadinessState::Connecting
        }
    ));
}

#[tokio::test]
async fn second_force_ready_keeps_ready_state() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));
    gate.start_bootstrap().expect("bootstrap");
    gate.connected_store()
        .expect("connected")
        .with(|store| store.set_username("ada"))
        .expect("username");

    let mut changes = gate.subscribe();
    changes.borrow_and_update();

    gate.force_ready_from_user_setup().expect("first call");
    assert!(changes.has_changed().expect("sender alive"));
    changes.borrow_and_update();

    let err = gate
        .force_ready_from_user_setup()
        .expect_err("second call must be rejected");
    assert!(matches!(
        err,
        GateError::InvalidTransition {
            from: ReadinessState::Ready
        }
    ));
    assert_eq!(gate.state(), ReadinessState::Ready);
    assert!(
        !changes.has_changed().expect("sender alive"),
        "ready signal must not fire twice"
    );
}

#[tokio::test]
async fn concurrent_force_ready_has_one_winner() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));
    gate.start_bootstrap().expect("bootstrap");
    gate.connected_store()
        .expect("connected")
        .with(|store| store.set_username("ada"))
        .expect("username");

    let tasks = (0..8)
        .map(|_| {
            let gate = gate.clone();
            tokio::task::spawn_blocking(move || gate.force_ready_from_user_setup())
        })
        .collect::<Vec<_>>();

    let mut winners = 0;
    for task in tasks {
        match task.await.expect("join") {
            Ok(ReadinessState::Ready) => winners += 1,
            Ok(other) => panic!("unexpected state {other}"),
            Err(GateError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(gate.state(), ReadinessState::Ready);
}

#[tokio::test]
async fn configured_store_becomes_ready_for_every_waiter() {
    let dir = TempDir::new().expect("temp dir");
    prepared_store(dir.path(), Some("ada"), 5);
    let gate = BootstrapGate::new(GateConfig::new(dir.path()).with_required_version(5));

    let waiters = (0..3)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.await_ready().await })
        })
        .collect::<Vec<_>>();

    assert_eq!(gate.start_bootstrap().expect("bootstrap"), ReadinessState::Ready);

    let store = gate.connected_store().expect("connected");
    for waiter in waiters {
        let ready = waiter.await.expect("join").expect("ready");
        assert!(ready.same_store(&store));
    }
    // Late subscribers see the resolved state immediately.
    let late = timeout(NEVER, gate.await_ready())
        .await
        .expect("already ready")
        .expect("ready");
    assert!(late.same_store(&store));
}

#[tokio::test]
async fn newer_store_version_is_accepted() {
    let dir = TempDir::new().expect("temp dir");
    prepared_store(dir.path(), Some("ada"), 8);
    let gate = BootstrapGate::new(GateConfig::new(dir.path()).with_required_version(5));

    assert_eq!(gate.start_bootstrap().expect("bootstrap"), ReadinessState::Ready);
}

#[tokio::test]
async fn outdated_store_halts_version_blocked() {
    let dir = TempDir::new().expect("temp dir");
    prepared_store(dir.path(), Some("ada"), 3);
    let gate = BootstrapGate::new(GateConfig::new(dir.path()).with_required_version(5));

    let expected = VersionCheck {
        persisted: 3,
        required: 5,
    };
    assert_eq!(
        gate.start_bootstrap().expect("bootstrap"),
        ReadinessState::VersionBlocked(expected)
    );
    assert_eq!(gate.version_status().expect("probe"), Some(expected));
    assert!(!gate.is_version_compatible().expect("probe"));
    assert!(gate.is_user_initialized().expect("probe"));
    assert!(timeout(NEVER, gate.await_ready()).await.is_err());

    let err = gate
        .force_ready_from_user_setup()
        .expect_err("setup trigger is invalid when version blocked");
    assert!(matches!(
        err,
        GateError::InvalidTransition {
            from: ReadinessState::VersionBlocked(_)
        }
    ));
}

#[tokio::test]
async fn existing_store_without_user_waits_for_setup() {
    let dir = TempDir::new().expect("temp dir");
    prepared_store(dir.path(), None, 5);
    let gate = BootstrapGate::new(GateConfig::new(dir.path()).with_required_version(5));

    assert_eq!(
        gate.start_bootstrap().expect("bootstrap"),
        ReadinessState::AwaitingUserSetup
    );
    assert!(!gate.is_user_initialized().expect("probe"));
}

#[tokio::test]
async fn user_setup_on_outdated_store_ends_version_blocked() {
    let dir = TempDir::new().expect("temp dir");
    prepared_store(dir.path(), None, 2);
    let gate = BootstrapGate::new(GateConfig::new(dir.path()).with_required_version(5));
    gate.start_bootstrap().expect("bootstrap");
    gate.connected_store()
        .expect("connected")
        .with(|store| store.set_username("ada"))
        .expect("username");

    let state = gate.force_ready_from_user_setup().expect("force ready");
    assert!(matches!(state, ReadinessState::VersionBlocked(check) if check.persisted == 2));
    assert!(timeout(NEVER, gate.await_ready()).await.is_err());
}

#[tokio::test]
async fn bootstrap_runs_once() {
    let dir = TempDir::new().expect("temp dir");
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));
    gate.start_bootstrap().expect("bootstrap");

    let err = gate.start_bootstrap().expect_err("second start");
    assert!(matches!(err, GateError::AlreadyStarted));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn unopenable_store_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").expect("write file");
    let gate = BootstrapGate::new(GateConfig::new(file.join("store")));

    let err = gate.start_bootstrap().expect_err("connect must fail");
    assert!(matches!(err, GateError::Connect(_)));
    assert!(err.is_fatal());
    assert_eq!(gate.state(), ReadinessState::Connecting);
    assert!(gate.connected_store().is_none());
}

#[tokio::test]
async fn partial_schema_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    {
        let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("raw db");
        conn.execute_batch("CREATE TABLE notes(note_id TEXT PRIMARY KEY);")
            .expect("partial table");
    }
    let gate = BootstrapGate::new(GateConfig::new(dir.path()));

    let err = gate.start_bootstrap().expect_err("partial schema");
    assert!(matches!(err, GateError::Detect(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn failed_initialization_is_fatal_and_rolled_back() {
    let dir = TempDir::new().expect("temp dir");
    let mut scripts = SchemaInitializer::default().scripts().to_vec();
    scripts.push(InitScript::new("broken", "THIS IS NOT SQL;"));
    let gate = BootstrapGate::with_initializer(
        GateConfig::new(dir.path()),
        SchemaInitializer::with_scripts(scripts, 5),
    );

    let err = gate.start_bootstrap().expect_err("init must fail");
    assert!(matches!(err, GateError::Initialize(_)));
    assert!(err.is_fatal());
    assert_eq!(gate.state(), ReadinessState::Initializing);

    let conn = Connection::open(dir.path().join(DB_FILE_NAME)).expect("inspect db");
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table'",
            [],
            |row| row.get(0),
        )
        .expect("count tables");
    assert_eq!(tables, 0);
}
