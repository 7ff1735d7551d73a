use axum::http::StatusCode;
use axum_test::TestServer;
use db::{MemoryCatalog, MemoryStatusStore};
use serde_json::{json, Value};
use server::config::AppConfig;
use server::{create_router, state::AppState};
use std::sync::Arc;
use tempfile::TempDir;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.coordinator.poll_interval_ms = 20;
    config
}

async fn setup_test_server(config: AppConfig) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = db::create_pool(&db_url).await.expect("Failed to create pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let state = AppState::new(pool, &config);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, temp_dir)
}

fn setup_memory_server(config: AppConfig) -> (TestServer, MemoryCatalog, MemoryStatusStore) {
    let catalog = MemoryCatalog::new();
    let store = MemoryStatusStore::new();
    let state = AppState::with_stores(Arc::new(catalog.clone()), Arc::new(store.clone()), &config);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, catalog, store)
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_waits"], 0);
        assert_eq!(body["duplicate_check"], true);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server.get("/api/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/sql"].is_object());
    }
}

mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_succeeds_and_registers() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE c1:t1 (id bigint) shards=2 rf=2" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["result"], "CREATE TABLE c1:t1 (id bigint) shards=2 rf=2");

        let response = server.get("/api/resources/t1").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["cluster"], "c1");
        assert_eq!(body["shard_count"], 2);

        let response = server.get("/api/resources/t1/status").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["key"], "resource:t1");
        assert_eq!(body["status"], "succeeded");
        assert_eq!(body["terminal"], true);
    }

    #[tokio::test]
    async fn test_forwarded_syntax_error_is_accepted() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server
            .post("/sql")
            .json(&json!({
                "query": "create table t1 shards='3' rf='1'",
                "error": "P03: syntax error, unexpected identifier near 'shards'",
                "path": "/cli"
            }))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_second_create_is_conflict() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;
        let query = json!({ "query": "CREATE TABLE c1:t1 shards=2 rf=2" });

        server.post("/sql").json(&query).await.assert_status_ok();

        let response = server.post("/sql").json(&query).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "duplicate_resource");
        assert_eq!(body["message"], "resource 't1' already exists");
    }

    #[tokio::test]
    async fn test_list_resources() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        for query in ["CREATE TABLE c1:b shards=1 rf=2", "CREATE TABLE a shards=4 rf=1"] {
            server
                .post("/sql")
                .json(&json!({ "query": query }))
                .await
                .assert_status_ok();
        }

        let response = server.get("/api/resources").await;
        response.assert_status_ok();
        let body: Value = response.json();
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}

mod rejected {
    use super::*;

    #[tokio::test]
    async fn test_unparsable_statement() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE t1" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "parse_error");
        assert_eq!(body["message"], "Failed to parse query");
    }

    #[tokio::test]
    async fn test_replication_without_cluster() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE t1 shards=2 rf=2" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_other_daemon_errors_are_not_supported() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        let response = server
            .post("/sql")
            .json(&json!({
                "query": "CREATE TABLE c1:t1 shards=2 rf=2",
                "error": "P01: unknown table"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_supported");
    }

    #[tokio::test]
    async fn test_existing_resource_never_reaches_fulfillment() {
        let (server, catalog, store) = setup_memory_server(test_config());
        let intent = shard_core::parse_create("CREATE TABLE c1:t1 shards=2 rf=2").unwrap();
        db::Catalog::register(&catalog, &shard_core::ResourceDescriptor::from_intent(&intent))
            .await
            .unwrap();

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE c1:t1 shards=2 rf=2" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let (server, _temp_dir) = setup_test_server(test_config()).await;

        server.get("/api/resources/missing").await.assert_status_not_found();

        let response = server.get("/api/resources/missing/status").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "processing");
        assert_eq!(body["terminal"], false);
    }
}

mod waiting {
    use super::*;

    #[tokio::test]
    async fn test_no_fulfiller_times_out() {
        let mut config = test_config();
        config.coordinator.timeout_secs = 1;
        config.coordinator.poll_interval_ms = 100;
        config.fulfillment.local = false;
        let (server, _catalog, store) = setup_memory_server(config);

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE t1 shards=1 rf=1" }))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["message"], "Waiting timeout exceeded.");
        assert!(store.reads() >= 5);
    }

    #[tokio::test]
    async fn test_failed_status_is_reported() {
        let mut config = test_config();
        config.fulfillment.local = false;
        let (server, _catalog, store) = setup_memory_server(config);

        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            db::StatusStore::put(
                &writer,
                "resource:t1",
                r#"{"status":"failed","result":"no quorum"}"#,
            )
            .await
            .unwrap();
        });

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE t1 shards=1 rf=1" }))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"], "create_failed");
        assert_eq!(body["message"], "no quorum");
    }

    #[tokio::test]
    async fn test_delayed_fulfillment() {
        let mut config = test_config();
        config.fulfillment.delay_ms = 200;
        let (server, catalog, _store) = setup_memory_server(config);

        let response = server
            .post("/sql")
            .json(&json!({ "query": "CREATE TABLE t1 shards=1 rf=1" }))
            .await;

        response.assert_status_ok();
        assert_eq!(catalog.lookups(), 1);
    }
}

mod racing {
    use super::*;
    use db::Catalog;
    use shard_core::parse_create;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_creates_of_one_name_have_one_winner() {
        let mut config = test_config();
        config.fulfillment.delay_ms = 200;
        let catalog = MemoryCatalog::new();
        let store = MemoryStatusStore::new();
        let state =
            AppState::with_stores(Arc::new(catalog.clone()), Arc::new(store.clone()), &config);
        let intent = parse_create("CREATE TABLE t1 shards=1 rf=1").unwrap();

        let (first, second) = tokio::join!(
            state.coordinator.execute(intent.clone()),
            state.coordinator.execute(intent),
        );

        let results = [first, second];
        let winners = results.iter().filter(|r| r.is_success()).count();
        assert_eq!(winners, 1, "{:?}", results);
        let loser = results.iter().find(|r| !r.is_success()).unwrap();
        assert_eq!(loser.message(), "resource 't1' already exists");
        assert!(catalog.describe("t1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_posts_of_one_name_have_one_winner() {
        let mut config = test_config();
        config.fulfillment.delay_ms = 100;
        let (server, catalog, _store) = setup_memory_server(config);
        let body = json!({ "query": "CREATE TABLE t1 shards=1 rf=1" });

        let (first, second) = tokio::join!(
            async { server.post("/sql").json(&body).await },
            async { server.post("/sql").json(&body).await },
        );

        let (won, lost) = if first.status_code() == StatusCode::OK {
            (first, second)
        } else {
            (second, first)
        };
        won.assert_status_ok();
        assert_ne!(lost.status_code(), StatusCode::OK);
        let body: Value = lost.json();
        assert_eq!(body["message"], "resource 't1' already exists");
        assert!(catalog.describe("t1").await.unwrap().is_some());
    }
}
