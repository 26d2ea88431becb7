//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`, so header injection,
//! GET/DELETE bodies and status classification are exercised on the wire.

use serde_json::{json, Value};

use app_search_core::{ApiError, AppSearchClient, ClientConfig, Options, Page, Search};

const API_KEY: &str = "private-integration-key";

/// Start the mock server on its own runtime thread and return a client
/// pointed at it.
fn start_server() -> (std::net::SocketAddr, AppSearchClient) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    let config = ClientConfig::new("", API_KEY)
        .with_base_endpoint(format!("{addr}/api/as/v1"))
        .with_https(false);
    (addr, AppSearchClient::new(config))
}

fn options(value: Value) -> Options {
    value.as_object().cloned().unwrap()
}

#[test]
fn document_lifecycle() {
    let (_, client) = start_server();

    // Step 1: create an engine.
    let engine = client.create_engine("videos", Some("en"), None).unwrap();
    assert_eq!(engine["name"], "videos");
    assert_eq!(engine["language"], "en");

    // Step 2: creating it again conflicts.
    let err = client.create_engine("videos", None, None).unwrap_err();
    assert!(matches!(err, ApiError::RecordAlreadyExists));

    // Step 3: index a batch; payload reaches the server intact.
    let documents = vec![
        json!({"id": "INscMGmhmX4", "title": "The Original Grumpy Cat", "tags": ["cat", "meme"]}),
        json!({"id": "JNDFojsd02", "title": "Grumpy Dog", "views": 42}),
    ];
    let statuses = client.index_documents("videos", &documents).unwrap();
    assert_eq!(
        statuses,
        json!([
            {"id": "INscMGmhmX4", "errors": []},
            {"id": "JNDFojsd02", "errors": []},
        ])
    );
    let fetched = client
        .get_documents("videos", &["INscMGmhmX4", "JNDFojsd02", "missing"])
        .unwrap();
    assert_eq!(fetched, json!([documents[0], documents[1], null]));

    // Step 4: single-document convenience path.
    let status = client
        .index_document("videos", &json!({"id": "single", "title": "Cat Nap"}))
        .unwrap();
    assert_eq!(Value::Object(status), json!({"id": "single"}));

    let bad = json!({"id": "bad", "Title": "Upper", "Other Field": 1});
    match client.index_document("videos", &bad).unwrap_err() {
        ApiError::InvalidDocument { message, document } => {
            assert_eq!(message, "Invalid field name: Other Field; Invalid field name: Title");
            assert_eq!(document, bad);
        }
        other => panic!("expected InvalidDocument, got {other:?}"),
    }

    // Step 5: partial update.
    let statuses = client
        .update_documents("videos", &[json!({"id": "JNDFojsd02", "views": 43})])
        .unwrap();
    assert_eq!(statuses[0]["errors"], json!([]));

    // Step 6: list with pagination.
    let page = client.list_documents("videos", Page::new(1, 2)).unwrap();
    assert_eq!(page["meta"]["page"]["total_results"], 3);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);

    // Step 7: schema picked up the text fields; add a number field.
    let schema = client
        .update_schema("videos", &json!({"views": "number"}))
        .unwrap();
    assert_eq!(schema["views"], "number");
    assert_eq!(client.get_schema("videos").unwrap()["title"], "text");
    let err = client
        .update_schema("videos", &json!({"views": "integer"}))
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(ref body) if body.contains("Invalid type for field views")));

    // Step 8: destroy documents.
    let destroyed = client
        .destroy_documents("videos", &["single", "missing"])
        .unwrap();
    assert_eq!(
        destroyed,
        json!([{"id": "single", "deleted": true}, {"id": "missing", "deleted": false}])
    );

    // Step 9: destroy the engine, then it is gone.
    assert_eq!(client.destroy_engine("videos").unwrap(), json!({"deleted": true}));
    let err = client.get_engine("videos").unwrap_err();
    assert!(matches!(err, ApiError::NonExistentRecord));
    let err = client.destroy_engine("videos").unwrap_err();
    assert!(matches!(err, ApiError::NonExistentRecord));
}

#[test]
fn search_and_analytics() {
    let (_, client) = start_server();
    client.create_engine("videos", None, None).unwrap();
    client
        .index_documents(
            "videos",
            &[
                json!({"id": "1", "title": "Cat Video"}),
                json!({"id": "2", "title": "Category Theory"}),
                json!({"id": "3", "title": "Dog Video"}),
            ],
        )
        .unwrap();

    let results = client.search("videos", "cat", None).unwrap();
    assert_eq!(results["meta"]["page"]["total_results"], 2);
    assert_eq!(results["results"][0]["title"]["raw"], "Cat Video");

    let paged = client
        .search("videos", "video", Some(&options(json!({"page": {"current": 2, "size": 1}}))))
        .unwrap();
    assert_eq!(paged["results"][0]["id"]["raw"], "3");

    let searches = vec![
        Search::new("cat"),
        Search::new("dog").with_options(options(json!({"page": {"size": 5}}))),
    ];
    let multi = client.multi_search("videos", &searches).unwrap();
    let multi = multi.as_array().unwrap();
    assert_eq!(multi.len(), 2);
    assert_eq!(multi[1]["meta"]["page"]["total_results"], 1);
    assert_eq!(multi[1]["meta"]["page"]["size"], 5);

    let suggestions = client.query_suggestion("videos", "cat", None).unwrap();
    assert_eq!(
        suggestions["results"]["documents"],
        json!([{"suggestion": "cat"}, {"suggestion": "category"}])
    );

    client
        .click("videos", &options(json!({"query": "cat", "document_id": "1"})))
        .unwrap();
    let err = client
        .click("videos", &options(json!({"query": "cat"})))
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));

    let logs = client.get_api_logs("videos", None).unwrap();
    assert_eq!(logs["meta"]["page"]["total_results"], 3);
    assert_eq!(
        logs["results"][2]["full_request_path"],
        "/api/as/v1/engines/videos/multi_search"
    );
}

#[test]
fn synonyms_settings_and_meta_engines() {
    let (_, client) = start_server();
    client.create_engine("books", None, None).unwrap();
    client.create_engine("films", None, None).unwrap();

    // Synonym sets.
    let created = client
        .create_synonym_set("books", &["novel", "book"])
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(client.get_synonym_set("books", &id).unwrap()["synonyms"], json!(["novel", "book"]));
    let updated = client
        .update_synonym_set("books", &id, &["novel", "book", "tome"])
        .unwrap();
    assert_eq!(updated["synonyms"], json!(["novel", "book", "tome"]));
    let listed = client.list_synonym_sets("books", Page::default()).unwrap();
    assert_eq!(listed["meta"]["page"]["total_results"], 1);
    assert_eq!(client.destroy_synonym_set("books", &id).unwrap(), json!({"deleted": true}));
    let err = client.get_synonym_set("books", &id).unwrap_err();
    assert!(matches!(err, ApiError::NonExistentRecord));

    // Search settings.
    client
        .update_schema("books", &json!({"title": "text"}))
        .unwrap();
    let defaults = client.get_search_settings("books").unwrap();
    let custom = json!({"search_fields": {"title": {"weight": 3}}, "boosts": {}});
    assert_eq!(client.update_search_settings("books", &custom).unwrap(), custom);
    assert_eq!(client.get_search_settings("books").unwrap(), custom);
    assert_eq!(client.reset_search_settings("books").unwrap(), defaults);

    // Meta engines.
    let meta = client.create_meta_engine("library", &["books"]).unwrap();
    assert_eq!(meta["type"], "meta");
    let meta = client.add_meta_engine_sources("library", &["films"]).unwrap();
    assert_eq!(meta["source_engines"], json!(["books", "films"]));
    let meta = client
        .delete_meta_engine_sources("library", &["books"])
        .unwrap();
    assert_eq!(meta["source_engines"], json!(["films"]));

    let engines = client.list_engines(Page::default()).unwrap();
    let names: Vec<&str> = engines["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|engine| engine["name"].as_str())
        .collect();
    assert_eq!(names, vec!["books", "films", "library"]);
}

#[test]
fn wrong_api_key_is_invalid_credentials() {
    let (addr, _) = start_server();
    let config = ClientConfig::new("", "not-the-key")
        .with_base_endpoint(format!("{addr}/api/as/v1"))
        .with_https(false);
    let client = AppSearchClient::new(config);

    let err = client.list_engines(Page::default()).unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials { ref reason } if reason == "Unauthorized"));
    assert!(err.is_app_search_error());
}

#[test]
fn unreachable_host_is_transport_error() {
    // Bind then drop so the port is closed.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = ClientConfig::new("", API_KEY)
        .with_base_endpoint(format!("{addr}/api/as/v1"))
        .with_https(false);

    let err = AppSearchClient::new(config).get_engine("videos").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.is_app_search_error());
}
