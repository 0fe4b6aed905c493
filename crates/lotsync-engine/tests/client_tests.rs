//! HTTP-level tests for the destination client against a mock server.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lotsync_engine::{CmsClient, CmsError, Credentials, DestinationIndex};

fn client(server: &MockServer) -> CmsClient {
    CmsClient::with_http_client(
        server.uri(),
        Credentials::bearer("test-token"),
        reqwest::Client::new(),
    )
}

fn item_json(id: &str, external_id: &str) -> Value {
    json!({
        "id": id,
        "isDraft": false,
        "isArchived": false,
        "fieldData": {
            "listing-id": external_id,
            "sync-fingerprint": format!("fp-{external_id}")
        }
    })
}

#[tokio::test]
async fn test_list_items_parses_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/listings/items"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item_json("item-1", "100"), item_json("item-2", "200")],
            "pagination": { "limit": 100, "offset": 0, "total": 2 }
        })))
        .mount(&server)
        .await;

    let page = client(&server)
        .list_items("listings", 0, 100)
        .await
        .expect("page parses");

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.items[0].external_id(), Some("100"));
}

#[tokio::test]
async fn test_index_build_paginates_until_short_page() {
    let server = MockServer::start().await;

    let full_page: Vec<Value> = (0..100)
        .map(|i| item_json(&format!("item-{i}"), &i.to_string()))
        .collect();
    let short_page: Vec<Value> = (100..140)
        .map(|i| item_json(&format!("item-{i}"), &i.to_string()))
        .collect();

    Mock::given(method("GET"))
        .and(path("/collections/listings/items"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": full_page,
            "pagination": { "limit": 100, "offset": 0, "total": 140 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/listings/items"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": short_page,
            "pagination": { "limit": 100, "offset": 100, "total": 140 }
        })))
        .mount(&server)
        .await;

    let cms = client(&server);
    let index = DestinationIndex::build(&cms, "listings")
        .await
        .expect("index builds");

    assert_eq!(index.len(), 140);
    assert!(index.get("0").is_some());
    assert!(index.get("139").is_some());
}

#[tokio::test]
async fn test_page_error_is_fatal_to_index_build() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/listings/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let cms = client(&server);
    let err = DestinationIndex::build(&cms, "listings")
        .await
        .expect_err("index build fails");
    assert!(matches!(err, CmsError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_error_taxonomy_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/missing/items"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such collection"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/limited/items"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "30")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let cms = client(&server);

    let err = cms.list_items("missing", 0, 100).await.expect_err("404");
    assert!(err.is_not_found());

    let err = cms.list_items("limited", 0, 100).await.expect_err("429");
    match err {
        CmsError::RateLimited { retry_after_secs } => {
            assert_eq!(retry_after_secs, Some(30));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_item_writes_undrafted_and_parses_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/collections/listings/items"))
        .and(body_partial_json(json!({
            "isDraft": false,
            "isArchived": false,
            "fieldData": { "name": "Sunlight A70" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(item_json("item-new", "100")))
        .mount(&server)
        .await;

    let mut fields = BTreeMap::new();
    fields.insert("name".to_string(), json!("Sunlight A70"));

    let item = client(&server)
        .create_item("listings", &fields)
        .await
        .expect("create succeeds");
    assert_eq!(item.id, "item-new");
    assert!(!item.is_draft);
}

#[tokio::test]
async fn test_publish_sends_item_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/collections/listings/items/publish"))
        .and(body_partial_json(json!({ "itemIds": ["item-1", "item-2"] })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "publishedItemIds": ["item-1", "item-2"] })))
        .mount(&server)
        .await;

    client(&server)
        .publish_items(
            "listings",
            &["item-1".to_string(), "item-2".to_string()],
        )
        .await
        .expect("publish succeeds");
}

#[tokio::test]
async fn test_publish_with_no_ids_is_a_local_noop() {
    // No mock mounted: a request would fail the test.
    let server = MockServer::start().await;
    client(&server)
        .publish_items("listings", &[])
        .await
        .expect("empty publish short-circuits");
}

#[tokio::test]
async fn test_unpublish_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/collections/listings/items/item-9/live"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/collections/listings/items/item-9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let cms = client(&server);
    cms.unpublish_item("listings", "item-9")
        .await
        .expect("unpublish succeeds");
    cms.delete_item("listings", "item-9")
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn test_patch_item_updates_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/collections/listings/items/item-1"))
        .and(body_partial_json(json!({ "fieldData": { "price": 99999 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("item-1", "100")))
        .mount(&server)
        .await;

    let mut fields = BTreeMap::new();
    fields.insert("price".to_string(), json!(99_999));

    let item = client(&server)
        .update_item("listings", "item-1", &fields)
        .await
        .expect("patch succeeds");
    assert_eq!(item.id, "item-1");
}
