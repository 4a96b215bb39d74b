/// Catalog CRUD through the admin API and the public read routes.
mod common;

use common::*;
use hyper::StatusCode;
use serde_json::{Value, json};

async fn create_artist(app: &TestApp, name: &str) -> Value {
    let res = app
        .send_admin_json(
            "POST",
            "/admin/api/artists",
            &json!({"name": name, "genres": ["pop"]}).to_string(),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    res.json()["data"].clone()
}

async fn create_release(app: &TestApp, artist_id: &str, title: &str, date: &str) -> Value {
    let res = app
        .send_admin_json(
            "POST",
            "/admin/api/releases",
            &json!({
                "artist_id": artist_id,
                "title": title,
                "release_type": "ep",
                "release_date": date,
            })
            .to_string(),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    res.json()["data"].clone()
}

// ---------------------------------------------------------------------------
// Artists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_artist_is_publicly_readable() {
    let app = app(None).await;
    let artist = create_artist(&app, "Nova Lights").await;
    assert_eq!(artist["slug"], "nova-lights");

    let list = app.send(get("/api/artists", None)).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.json()["data"][0]["name"], "Nova Lights");

    let by_slug = app.send(get("/api/artists/nova-lights", None)).await;
    assert_eq!(by_slug.json()["data"]["id"], artist["id"]);
}

#[tokio::test]
async fn artist_validation_and_conflicts() {
    let app = app(None).await;

    let res = app
        .send_admin_json("POST", "/admin/api/artists", r#"{"name": "   "}"#)
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["code"], "VALIDATION_FAILED");

    let res = app
        .send_admin_json("POST", "/admin/api/artists", "{broken")
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "INVALID_JSON");

    create_artist(&app, "Echo").await;
    let res = app
        .send_admin_json("POST", "/admin/api/artists", r#"{"name": "echo"}"#)
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_and_delete_artist() {
    let app = app(None).await;
    let artist = create_artist(&app, "Before").await;
    let id = artist["id"].as_str().unwrap();

    let res = app
        .send_admin_json(
            "PUT",
            &format!("/admin/api/artists/{}", id),
            r#"{"name": "After", "bio": "new bio"}"#,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"]["bio"], "new bio");
    assert_eq!(res.json()["data"]["created_at"], artist["created_at"]);

    let res = app
        .send_admin_json("DELETE", &format!("/admin/api/artists/{}", id), "")
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.send(get(&format!("/api/artists/{}", id), None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_artist_routes_are_404() {
    let app = app(None).await;
    let res = app
        .send_admin_json("PUT", "/admin/api/artists/nope", r#"{"name": "x"}"#)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.send(get("/api/artists/nope/releases", None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn releases_list_newest_first_and_filter_by_artist() {
    let app = app(None).await;
    let a = create_artist(&app, "A").await;
    let b = create_artist(&app, "B").await;
    let a_id = a["id"].as_str().unwrap();
    let b_id = b["id"].as_str().unwrap();

    create_release(&app, a_id, "Old", "2022-01-01").await;
    create_release(&app, a_id, "New", "2024-06-01").await;
    create_release(&app, b_id, "Other", "2023-01-01").await;

    let all = app.send(get("/api/releases", None)).await.json();
    let titles: Vec<&str> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["New", "Other", "Old"]);

    let only_a = app
        .send(get(&format!("/api/releases?artist_id={}", a_id), None))
        .await
        .json();
    assert_eq!(only_a["data"].as_array().unwrap().len(), 2);

    let nested = app
        .send(get(&format!("/api/artists/{}/releases", a_id), None))
        .await
        .json();
    assert_eq!(nested["data"][0]["title"], "New");
}

#[tokio::test]
async fn release_for_unknown_artist_is_422() {
    let app = app(None).await;
    let res = app
        .send_admin_json(
            "POST",
            "/admin/api/releases",
            r#"{"artist_id": "ghost", "title": "X", "release_date": "2024-01-01"}"#,
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_artist_cascades_to_releases() {
    let app = app(None).await;
    let artist = create_artist(&app, "Cascade").await;
    let id = artist["id"].as_str().unwrap();
    let release = create_release(&app, id, "Gone", "2024-01-01").await;

    let res = app
        .send_admin_json("DELETE", &format!("/admin/api/artists/{}", id), "")
        .await;
    assert_eq!(res.json()["data"]["releases_deleted"], 1);

    let rid = release["id"].as_str().unwrap();
    let res = app.send(get(&format!("/api/releases/{}", rid), None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_body_is_413() {
    let app = app_with_extra(None, "[server]\nmax_body_bytes = 64\n").await;
    let body = json!({"name": "x".repeat(200)}).to_string();
    let res = app
        .send_admin_json("POST", "/admin/api/artists", &body)
        .await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json()["code"], "PAYLOAD_TOO_LARGE");
}
