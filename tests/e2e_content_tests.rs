//! End-to-end tests for the public content pages and catalog submissions.

mod common;

use common::{
    TestClient, TestServer, ALBUM_1_ID, ALBUM_2_ID, ARTIST_1_ID, ARTIST_2_ID, MISSING_ID,
    SONG_1_ID, SONG_2_ID, SONG_3_ID,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_list_songs_newest_first() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let songs: Value = client.list_songs().await.json().await.unwrap();
    let ids: Vec<i64> = songs
        .as_array()
        .unwrap()
        .iter()
        .map(|song| song["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![SONG_3_ID, SONG_2_ID, SONG_1_ID]);
    assert_eq!(songs[0]["artist_name"], "Jazz Ensemble");
    assert_eq!(songs[0]["album_name"], "Jazz Collection");
}

#[tokio::test]
async fn test_get_song_page() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_song(SONG_1_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["song"]["song_name"], "Opening Track");
    assert_eq!(page["song"]["album_release_date"], "2001-02-03");
    assert_eq!(page["artist_stats"]["song_count"], 2);
    assert_eq!(page["artist_stats"]["album_count"], 1);
    assert!(page["artist_stats"]["average_score"].is_null());
    assert_eq!(page["notes"], json!([]));
}

#[tokio::test]
async fn test_get_artist_and_album_pages() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist: Value = client.get_artist(ARTIST_1_ID).await.json().await.unwrap();
    assert_eq!(artist["artist"]["artist_name"], "The Test Band");
    assert_eq!(artist["artist"]["info"], "Plays tests.");
    assert_eq!(artist["songs"].as_array().unwrap().len(), 2);

    let album: Value = client.get_album(ALBUM_2_ID).await.json().await.unwrap();
    assert_eq!(album["album"]["album_name"], "Jazz Collection");
    assert_eq!(album["album"]["artist_id"], ARTIST_2_ID);
    assert_eq!(album["songs"][0]["song_name"], "Smooth Interlude");
}

#[tokio::test]
async fn test_missing_content_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    assert_eq!(client.get_song(MISSING_ID).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(client.get_artist(MISSING_ID).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(client.get_album(MISSING_ID).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_artist_album_and_song() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.add_artist("  New Band ", "From the suburbs").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let artist_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client
        .add_album(json!({
            "artist_id": artist_id,
            "album_name": "Debut",
            "release_date": "2020-05-01"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let album_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();
    assert_eq!(location, format!("/v1/content/album/{}", album_id));

    let response = client
        .add_song(json!({
            "song_name": "Hit",
            "artist_id": artist_id,
            "album_id": album_id,
            "rating": { "score": 5, "review": "Instant classic" }
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let song_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let page: Value = client.get_song(song_id).await.json().await.unwrap();
    assert_eq!(page["song"]["artist_name"], "New Band");
    assert_eq!(page["artist_stats"]["rating_count"], 1);
    assert_eq!(page["artist_stats"]["average_score"], 5.0);
}

#[tokio::test]
async fn test_rejects_invalid_submissions() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.add_artist("The Test Band", "").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client.add_artist("   ", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .add_album(json!({ "artist_id": MISSING_ID, "album_name": "Ghost" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .add_album(json!({
            "artist_id": ARTIST_1_ID,
            "album_name": "Bad Date",
            "release_date": "yesterday"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Album of another artist.
    let response = client
        .add_song(json!({
            "song_name": "Mismatch",
            "artist_id": ARTIST_1_ID,
            "album_id": ALBUM_2_ID
        }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .add_song(json!({
            "song_name": "Out Of Range",
            "artist_id": ARTIST_1_ID,
            "album_id": ALBUM_1_ID,
            "rating": { "score": 6 }
        }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let songs: Value = client.list_songs().await.json().await.unwrap();
    assert_eq!(songs.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_hashtag_page_for_unknown_tag_is_empty() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_hashtag("nothing-here").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["hashtag"], "nothing-here");
    assert_eq!(page["songs"], json!([]));
}
