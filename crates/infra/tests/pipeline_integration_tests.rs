//! End-to-end tests of the catalog pipeline against a stub store
//!
//! Each test compiles, builds, signs and executes real HTTP requests
//! against a mockito server standing in for the document store.

use mockito::{Matcher, Server};
use movie_catalog_core::{CatalogConfig, CatalogError, GenreSet, Movie, SearchCriteria};
use movie_catalog_infra::{CachedCredentials, CatalogService, Credentials};
use std::sync::Arc;

const ACCESS_KEY: &str = "AKIDINTEGRATION";

fn service_for(server: &Server) -> CatalogService {
    let mut config = CatalogConfig::default();
    config.aws.endpoint = server.url();
    config.aws.region = "us-east-2".to_string();

    let credentials = Credentials::new(ACCESS_KEY, "integration-secret")
        .with_session_token("integration-token");
    CatalogService::new(&config, Arc::new(CachedCredentials::fixed(credentials))).unwrap()
}

fn signed_by_integration_key() -> Matcher {
    Matcher::Regex(format!(
        r"^AWS4-HMAC-SHA256 Credential={}/\d{{8}}/us-east-2/es/aws4_request, SignedHeaders=content-type;host;x-amz-date;x-amz-security-token, Signature=[0-9a-f]{{64}}$",
        ACCESS_KEY
    ))
}

fn heat() -> Movie {
    let mut movie = Movie::new(42, "Heat");
    movie.year = 1995;
    movie.genre = Some(GenreSet::from_iter(["Crime".to_string(), "Drama".to_string()]));
    movie
}

#[tokio::test]
async fn test_create_then_search_by_id() {
    let mut server = Server::new_async().await;

    let put = server
        .mock("PUT", "/movies/movie/42")
        .match_header("authorization", signed_by_integration_key())
        .match_header("x-amz-security-token", "integration-token")
        .match_body(Matcher::PartialJsonString(
            r#"{"id":42,"title":"Heat","year":1995,"genre":["Crime","Drama"]}"#.to_string(),
        ))
        .with_status(201)
        .with_body(r#"{"result":"created"}"#)
        .create_async()
        .await;

    let search = server
        .mock("GET", "/movies/_search")
        .match_query(Matcher::UrlEncoded(
            "filter_path".into(),
            "hits.hits._source".into(),
        ))
        .match_header("authorization", signed_by_integration_key())
        .match_body(r#"{"from":0,"size":100,"query":{"bool":{"must":[{"match":{"id":42}}]}}}"#)
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[{"_source":{"id":42,"title":"Heat","year":1995}}]}}"#)
        .create_async()
        .await;

    let service = service_for(&server);
    let title = service.create_or_overwrite(&heat()).await.unwrap();
    assert_eq!(title, "Heat");

    let body = service.search(&SearchCriteria::by_id(42)).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["hits"]["hits"][0]["_source"]["id"], 42);

    put.assert_async().await;
    search.assert_async().await;
}

#[tokio::test]
async fn test_update_missing_movie_does_not_write() {
    let mut server = Server::new_async().await;

    let search = server
        .mock("GET", "/movies/_search")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(
            r#"{"query":{"bool":{"must":[{"match":{"id":99}}]}}}"#.to_string(),
        ))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let write = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = service_for(&server)
        .update(99, &Movie::new(99, "Nowhere"))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::NotFound { .. }));
    search.assert_async().await;
    write.assert_async().await;
}

#[tokio::test]
async fn test_update_existing_movie_overwrites_under_path_id() {
    let mut server = Server::new_async().await;

    let _search = server
        .mock("GET", "/movies/_search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[{"_source":{"id":7}}]}}"#)
        .create_async()
        .await;
    let write = server
        .mock("PUT", "/movies/movie/7")
        .match_body(Matcher::PartialJsonString(
            r#"{"id":7,"title":"Ronin"}"#.to_string(),
        ))
        .with_status(200)
        .create_async()
        .await;

    // Body carries a different id; the path id wins
    let title = service_for(&server)
        .update(7, &Movie::new(1000, "Ronin"))
        .await
        .unwrap();

    assert_eq!(title, "Ronin");
    write.assert_async().await;
}

#[tokio::test]
async fn test_update_does_not_write_when_existence_check_fails() {
    let mut server = Server::new_async().await;

    let search = server
        .mock("GET", "/movies/_search")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body(r#"{"error":"cluster_block_exception"}"#)
        .create_async()
        .await;
    let write = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = service_for(&server)
        .update(99, &Movie::new(99, "Nowhere"))
        .await
        .unwrap_err();

    match err {
        CatalogError::Rejected { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("cluster_block_exception"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    search.assert_async().await;
    write.assert_async().await;
}

#[tokio::test]
async fn test_delete_id_with_separators_stays_one_document() {
    let mut server = Server::new_async().await;

    let index_delete = server
        .mock("DELETE", "/movies")
        .expect(0)
        .create_async()
        .await;
    let document_delete = server
        .mock("DELETE", Matcher::Regex(r"^/movies/movie/[^/]+$".to_string()))
        .match_header("authorization", signed_by_integration_key())
        .with_status(200)
        .create_async()
        .await;

    let status = service_for(&server)
        .delete("movies", "movie", "../../movies")
        .await
        .unwrap();

    assert_eq!(status, 200);
    index_delete.assert_async().await;
    document_delete.assert_async().await;
}

#[tokio::test]
async fn test_delete_sends_bare_signed_request() {
    let mut server = Server::new_async().await;

    // Without match_query the mock only matches a request with no query string
    let delete = server
        .mock("DELETE", "/movies/movie/42")
        .match_header("authorization", signed_by_integration_key())
        .match_body("")
        .with_status(200)
        .with_body(r#"{"result":"deleted"}"#)
        .create_async()
        .await;

    let status = service_for(&server)
        .delete("movies", "movie", "42")
        .await
        .unwrap();

    assert_eq!(status, 200);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_statistics_failure_reports_status_and_body() {
    let mut server = Server::new_async().await;

    let _stats = server
        .mock("GET", "/films/_stats")
        .with_status(404)
        .with_body(r#"{"error":"index_not_found_exception"}"#)
        .create_async()
        .await;

    let err = service_for(&server)
        .index_statistics("films")
        .await
        .unwrap_err();

    match err {
        CatalogError::Rejected { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("index_not_found_exception"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_multi_genre_search_nests_should_group() {
    let mut server = Server::new_async().await;

    let search = server
        .mock("GET", "/movies/_search")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJsonString(
            r#"{"query":{"bool":{"must":[{"match":{"year":1995}},{"bool":{"should":[{"match":{"genre":"Crime"}},{"match":{"genre":"Drama"}}]}}]}}}"#.to_string(),
        ))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let criteria = SearchCriteria::default()
        .with_year(1995)
        .with_genres(["Crime", "Drama"]);
    let body = service_for(&server).search(&criteria).await.unwrap();

    assert_eq!(body, "{}");
    search.assert_async().await;
}
