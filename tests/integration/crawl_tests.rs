//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, record, persist and discover cycle end-to-end.

use crate::common::{create_test_config, mount_page};
use chrono::{TimeZone, Utc};
use ripple_bfs::crawler::{crawl, crawl_until};
use ripple_bfs::storage::{PageRecord, ResultStore};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_seed_with_two_leaf_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let (a, b, c) = (
        format!("{}/", base_url),
        format!("{}/b", base_url),
        format!("{}/c", base_url),
    );

    mount_page(&mock_server, "/", "Home", &[b.clone(), c.clone()]).await;
    mount_page(&mock_server, "/b", "Page B", &[]).await;
    mount_page(&mock_server, "/c", "Page C", &[]).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(20, 5, &results_path);

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    let visited: HashSet<String> = summary.visited.iter().cloned().collect();
    assert_eq!(visited, HashSet::from([a.clone(), b.clone(), c.clone()]));
    assert_eq!(summary.visited[0], a);
    assert_eq!(summary.records_stored, 3);
    assert_eq!(summary.shutdown.abandoned, 0);
    assert!(!summary.interrupted);

    // The file on disk holds the same three records
    let records = ResultStore::load(&results_path).await.records().await;
    assert_eq!(records.len(), 3);
    let home = records.iter().find(|r| r.url == a).expect("home record");
    assert_eq!(home.title, "Home");
    assert_eq!(home.description, "About Home");
    assert_eq!(home.headers, "Home Section");
    assert!(home.fetched_at().is_some());
}

#[tokio::test]
async fn test_failed_fetch_is_visited_but_not_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let (a, x, y) = (
        format!("{}/", base_url),
        format!("{}/x", base_url),
        format!("{}/y", base_url),
    );

    mount_page(&mock_server, "/", "Home", &[x.clone(), y.clone()]).await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/y", "Page Y", &[]).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(20, 5, &results_path);

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    assert!(summary.visited.contains(&x));
    assert!(summary.visited.contains(&y));
    assert_eq!(summary.stats.fetch_failures, 1);

    let store = ResultStore::load(&results_path).await;
    assert!(!store.contains(&x).await);
    assert!(store.contains(&y).await);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_budget_of_one_never_admits_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);

    mount_page(&mock_server, "/", "Home", &[format!("{}/b", base_url)]).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(1, 5, &results_path);

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    assert_eq!(summary.visited, vec![a]);
    assert_eq!(summary.records_stored, 1);
    assert_eq!(summary.stats.links_admitted, 0);
}

#[tokio::test]
async fn test_prior_record_is_kept_unchanged() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);

    mount_page(&mock_server, "/", "Home", &[]).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");

    let prior = PageRecord::new(
        "https://z.example/",
        "Zed",
        "Old page",
        &["Old heading".to_string()],
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
    );
    ResultStore::empty(&results_path)
        .append(prior.clone())
        .await
        .unwrap();

    let config = create_test_config(20, 5, &results_path);
    let summary = crawl(&config, &a).await.expect("Crawl failed");
    assert_eq!(summary.records_stored, 2);

    let records = ResultStore::load(&results_path).await.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], prior);
    assert_eq!(records[1].url, a);
}

#[tokio::test]
async fn test_non_html_content_is_a_fetch_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);
    let pdf = format!("{}/document.pdf", base_url);

    mount_page(&mock_server, "/", "Home", &[pdf.clone()]).await;
    Mock::given(method("GET"))
        .and(path("/document.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x25, 0x50, 0x44, 0x46], "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.json");
    let config = create_test_config(20, 5, &results_path);

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    assert!(summary.visited.contains(&pdf));
    assert_eq!(summary.records_stored, 1);
    assert_eq!(summary.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_relative_links_resolved_against_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/docs/", base_url);

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Docs</title></head><body>
                <a href="intro">Intro</a>
                <a href="/about">About</a>
                <a href="mailto:docs@example.com">Mail</a>
            </body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/docs/intro", "Intro", &[]).await;
    mount_page(&mock_server, "/about", "About", &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(20, 2, &dir.path().join("results.json"));

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    let visited: HashSet<String> = summary.visited.into_iter().collect();
    assert_eq!(
        visited,
        HashSet::from([
            a.clone(),
            format!("{}/docs/intro", base_url),
            format!("{}/about", base_url),
        ])
    );
    assert_eq!(summary.records_stored, 3);
}

#[tokio::test]
async fn test_unwritable_results_path_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);

    mount_page(&mock_server, "/", "Home", &[format!("{}/b", base_url)]).await;
    mount_page(&mock_server, "/b", "Page B", &[]).await;

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("no-such-dir").join("results.json");
    let config = create_test_config(20, 5, &results_path);

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    assert_eq!(summary.visited.len(), 2);
    assert_eq!(summary.records_stored, 2);
    assert_eq!(summary.stats.save_failures, 2);
    assert!(!results_path.exists());
}

#[tokio::test]
async fn test_request_timeout_turns_hung_page_into_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);

    mount_page(&mock_server, "/", "Home", &[format!("{}/slow", base_url)]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(20, 5, &dir.path().join("results.json"));
    config.crawler.request_timeout_secs = 1;

    let summary = crawl(&config, &a).await.expect("Crawl failed");

    assert_eq!(summary.visited.len(), 2);
    assert_eq!(summary.records_stored, 1);
    assert_eq!(summary.stats.fetch_failures, 1);
    assert_eq!(summary.shutdown.abandoned, 0);
}

#[tokio::test]
async fn test_interrupt_abandons_slow_fetch_after_grace() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let a = format!("{}/", base_url);

    mount_page(&mock_server, "/", "Home", &[format!("{}/slow", base_url)]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(20, 5, &dir.path().join("results.json"));
    config.crawler.request_timeout_secs = 60;
    config.crawler.shutdown_grace_secs = 0;

    let summary = crawl_until(&config, &a, tokio::time::sleep(Duration::from_millis(500)))
        .await
        .expect("Crawl failed");

    assert!(summary.interrupted);
    assert_eq!(summary.records_stored, 1);
    assert_eq!(summary.shutdown.abandoned, 1);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected_before_crawling() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(20, 5, &dir.path().join("results.json"));

    let result = crawl(&config, "ftp://example.com/").await;
    assert!(matches!(
        result,
        Err(ripple_bfs::CrawlError::InvalidSeed { .. })
    ));
}
