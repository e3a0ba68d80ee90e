mod common;

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use common::*;
use image::ImageFormat;
use pretty_assertions::assert_eq;

fn names(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap().to_string())
        .collect()
}

fn seed(setup: &TestSetup) {
    let at = |minute| Utc.with_ymd_and_hms(2024, 6, 1, 9, minute, 0).unwrap();
    setup.store.insert("uploads/b.png", vec![0; 300], "image/png", at(3));
    setup.store.insert("uploads/a.jpg", vec![0; 100], "image/jpeg", at(7));
    setup.store.insert("uploads/c.txt", vec![0; 200], "text/plain", at(1));
    setup.store.insert("thumbnails/b.png", vec![0; 10], "image/png", at(3));
}

#[tokio::test]
async fn test_list_empty_store() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/v1/images").await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body = setup.parse_response_body(response).await.unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_returns_every_original_once() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup.send_get_request("/v1/images").await.unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    let listed: BTreeSet<String> = names(&body).into_iter().collect();
    let expected: BTreeSet<String> = ["a.jpg", "b.png", "c.txt"].map(String::from).into();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_entry_fields() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup.send_get_request("/v1/images?sort=name").await.unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    let entry = &body[1];
    assert_eq!(entry["name"], "b.png");
    assert_eq!(entry["size"], 300);
    assert_eq!(entry["lastModified"], "2024-06-01T09:03:00Z");

    let image_url = entry["imageUrl"].as_str().unwrap();
    let thumbnail_url = entry["thumbnailUrl"].as_str().unwrap();
    assert_eq!(setup.store.fetch_presigned(image_url).unwrap().body.len(), 300);
    assert_eq!(setup.store.fetch_presigned(thumbnail_url).unwrap().body.len(), 10);
}

#[tokio::test]
async fn test_missing_thumbnail_url_is_still_present() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup.send_get_request("/v1/images?sort=name").await.unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    let text_entry = &body[2];
    assert_eq!(text_entry["name"], "c.txt");
    let thumbnail_url = text_entry["thumbnailUrl"].as_str().unwrap();
    assert!(thumbnail_url.contains("thumbnails/c.txt"));
    assert!(setup.store.fetch_presigned(thumbnail_url).is_none());
}

#[tokio::test]
async fn test_sort_by_size_desc() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup
        .send_get_request("/v1/images?sort=size&order=desc")
        .await
        .unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    assert_eq!(names(&body), vec!["b.png", "c.txt", "a.jpg"]);
}

#[tokio::test]
async fn test_sort_by_last_modified_asc() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup
        .send_get_request("/v1/images?sort=lastModified")
        .await
        .unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    assert_eq!(names(&body), vec!["c.txt", "b.png", "a.jpg"]);
}

#[tokio::test]
async fn test_unknown_sort_key_keeps_store_order() {
    let setup = TestSetup::new();
    seed(&setup);

    let response = setup
        .send_get_request("/v1/images?sort=owner&order=desc")
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = setup.parse_response_body(response).await.unwrap();

    // The in-memory store lists in key order
    assert_eq!(names(&body), vec!["a.jpg", "b.png", "c.txt"]);
}

#[tokio::test]
async fn test_upload_then_list_round_trip() {
    let setup = TestSetup::new();
    let data = generate_test_image(500, 250, ImageFormat::Png);
    setup.upload("round.png", "image/png", data.clone()).await;

    let response = setup.send_get_request("/v1/images").await.unwrap();
    let body = setup.parse_response_body(response).await.unwrap();

    assert_eq!(names(&body), vec!["round.png"]);
    let entry = &body[0];
    assert_eq!(entry["size"], data.len());

    let original = setup
        .store
        .fetch_presigned(entry["imageUrl"].as_str().unwrap())
        .unwrap();
    assert_eq!(original.body, data);

    let thumbnail = setup
        .store
        .fetch_presigned(entry["thumbnailUrl"].as_str().unwrap())
        .unwrap();
    assert_eq!(image_dimensions(&thumbnail.body), (200, 100));
}

#[tokio::test]
async fn test_listing_failure_maps_to_service_unavailable() {
    let setup = TestSetup::new();
    setup.store.make_listing_unavailable();

    let response = setup.send_get_request("/v1/images").await.unwrap();

    assert_eq!(response.status(), 503);
    let body = setup.parse_response_body(response).await.unwrap();
    assert_eq!(body["error"]["code"], "upstream_error");
    assert_eq!(body["allowRetry"], true);
}
