//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the listing site and run the
//! full search -> review feed -> listing page cycle end-to-end.

use listing_harvest::config::{
    Config, CrawlerConfig, OutputConfig, SearchConfig, SiteConfig, UserAgentConfig,
};
use listing_harvest::crawler::{run_crawl, Coordinator, Stage};
use listing_harvest::output::{JsonLinesSink, MemorySink, MultiSink, SqliteSink};
use listing_harvest::storage::{RunStatus, SqliteStorage, Storage};
use listing_harvest::{BusinessRecord, CrawlPhase, SearchQuery};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        search: SearchConfig {
            category: "contractors".to_string(),
            location: "San Francisco, CA".to_string(),
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            minimum_request_interval: 0,
            max_retries: 1,
            retry_delay: 10, // Very short for testing
            request_timeout: 5,
            max_pages: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig::default(),
    }
}

fn business(id: &str, is_ad: bool) -> Value {
    json!({
        "bizId": id,
        "searchResultBusiness": {
            "name": format!("Business {}", id),
            "rating": 4.5,
            "reviewCount": 87,
            "businessUrl": format!("/biz/{}-sf", id),
            "isAd": is_ad
        }
    })
}

fn search_page(businesses: Vec<Value>, start: u64, per_page: u64, total: u64) -> Value {
    let mut components = vec![json!({"type": "header", "props": {"title": "Best Contractors"}})];
    components.extend(businesses);
    components.push(json!({
        "type": "pagination",
        "props": {"startResult": start, "resultsPerPage": per_page, "totalResults": total}
    }));
    json!({"searchPageProps": {"mainContentComponentsListProps": components}})
}

fn review_feed(count: usize) -> Value {
    let reviews: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "user": {
                    "markupDisplayName": format!("Reviewer {}", i),
                    "displayLocation": "Oakland, CA"
                },
                "localizedDate": format!("{}/1/2024", i + 1)
            })
        })
        .collect();
    json!({ "reviews": reviews, "pagination": {"totalResults": count} })
}

fn listing_page(website: Option<&str>) -> String {
    let link = match website {
        Some(site) => format!(
            r#"<a href="/biz_redir?url={}&amp;website_link_type=website">site</a>"#,
            url::form_urlencoded::byte_serialize(site.as_bytes()).collect::<String>()
        ),
        None => String::new(),
    };
    format!(
        "<html><head><title>Listing</title></head><body>{}</body></html>",
        link
    )
}

async fn mount_search_page(server: &MockServer, start: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path("/query/fragment"))
        .and(query_param("find_desc", "contractors"))
        .and(query_param("find_loc", "San Francisco, CA"))
        .and(query_param("start", start.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a review feed and listing page for `id`, each expected exactly once
async fn mount_business(server: &MockServer, id: &str, reviews: usize, website: Option<&str>) {
    Mock::given(method("GET"))
        .and(path(format!("/biz/{}/review_feed", id)))
        .and(query_param("rl", "en"))
        .and(query_param("order_by", "relevance_desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(review_feed(reviews)))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/biz/{}-sf", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(website))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn sorted_by_name(mut records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
    records.sort_by(|a, b| a.business_name.cmp(&b.business_name));
    records
}

#[tokio::test]
async fn test_two_page_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_search_page(
        &mock_server,
        0,
        search_page(
            vec![
                business("a1", false),
                business("promo", true),
                business("a2", false),
                business("a3", false),
            ],
            0,
            3,
            5,
        ),
    )
    .await;
    mount_search_page(
        &mock_server,
        3,
        search_page(vec![business("b1", false), business("b2", false)], 3, 3, 5),
    )
    .await;

    mount_business(&mock_server, "a1", 8, Some("https://a1.example.com")).await;
    mount_business(&mock_server, "a2", 2, None).await;
    mount_business(&mock_server, "a3", 5, Some("https://a3.example.com/home")).await;
    mount_business(&mock_server, "b1", 0, Some("https://b1.example.com")).await;
    mount_business(&mock_server, "b2", 1, None).await;

    // The advertisement must never be followed
    Mock::given(method("GET"))
        .and(path("/biz/promo/review_feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(review_feed(1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut sink = MemorySink::new();
    let report = run_crawl(&config, &mut sink).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.hits_found, 5);
    assert_eq!(report.records_emitted, 5);
    assert_eq!(report.websites_found, 3);
    assert!(report.failures.is_empty());
    assert!(sink.is_finalized());

    let records = sorted_by_name(sink.into_records());
    assert_eq!(records.len(), 5);

    let a1 = &records[0];
    assert_eq!(a1.business_name, "Business a1");
    assert_eq!(a1.business_rating, 4.5);
    assert_eq!(a1.number_of_reviews, 87);
    assert_eq!(a1.business_yelp_url, format!("{}/biz/a1-sf", base_url));
    assert_eq!(a1.business_website.as_deref(), Some("https://a1.example.com"));
    assert_eq!(a1.reviews.len(), 5);
    assert_eq!(a1.reviews[0].reviewer_name, "Reviewer 0");
    assert_eq!(a1.reviews[4].review_date, "5/1/2024");

    let a2 = &records[1];
    assert!(a2.business_website.is_none());
    assert_eq!(a2.reviews.len(), 2);

    let b1 = &records[3];
    assert!(b1.reviews.is_empty());
}

#[tokio::test]
async fn test_missing_reviews_fails_only_that_listing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_search_page(
        &mock_server,
        0,
        search_page(
            vec![business("good", false), business("broken", false)],
            0,
            10,
            2,
        ),
    )
    .await;
    mount_business(&mock_server, "good", 3, Some("https://good.example.com")).await;

    Mock::given(method("GET"))
        .and(path("/biz/broken/review_feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pagination": {}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    // A failed chain never reaches its listing page
    Mock::given(method("GET"))
        .and(path("/biz/broken-sf"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut sink = MemorySink::new();
    let report = run_crawl(&config, &mut sink).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(report.chains_failed(), 1);

    let failure = &report.failures[0];
    assert_eq!(failure.stage, Stage::Reviews);
    assert_eq!(failure.business.as_deref(), Some("Business broken"));
    assert!(failure.url.ends_with("/biz/broken/review_feed"));

    assert_eq!(sink.records()[0].business_name, "Business good");
    assert_eq!(sink.failures().len(), 1);
}

#[tokio::test]
async fn test_search_failure_aborts_run_but_keeps_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_search_page(
        &mock_server,
        0,
        search_page(vec![business("a1", false), business("a2", false)], 0, 2, 10),
    )
    .await;
    mount_business(&mock_server, "a1", 1, None).await;
    mount_business(&mock_server, "a2", 1, None).await;

    // Second page keeps failing: one attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/query/fragment"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let mut sink = MemorySink::new();
    let report = run_crawl(&config, &mut sink).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Aborted);
    assert!(report.is_aborted());
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.records_emitted, 2);
    assert_eq!(sink.records().len(), 2);

    let aborted_by = report.aborted_by.as_ref().unwrap();
    assert_eq!(aborted_by.stage, Stage::Search);
    assert!(aborted_by.message.contains("503"));
}

#[tokio::test]
async fn test_max_pages_stops_pagination() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_search_page(
        &mock_server,
        0,
        search_page(vec![business("a1", false)], 0, 1, 50),
    )
    .await;
    mount_business(&mock_server, "a1", 1, None).await;

    let mut config = create_test_config(&base_url);
    config.crawler.max_pages = 1;

    let mut sink = MemorySink::new();
    let report = run_crawl(&config, &mut sink).await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Done);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.records_emitted, 1);
}

#[tokio::test]
async fn test_records_written_to_jsonl_and_database() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let jsonl_path = temp_dir.path().join("records.jsonl");
    let db_path = temp_dir.path().join("harvest.db");

    mount_search_page(
        &mock_server,
        0,
        search_page(vec![business("a1", false), business("a2", false)], 0, 10, 2),
    )
    .await;
    mount_business(&mock_server, "a1", 4, Some("https://a1.example.com")).await;
    mount_business(&mock_server, "a2", 6, None).await;

    let config = create_test_config(&base_url);
    let query = SearchQuery::new(&config.search.category, &config.search.location);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let sqlite_sink = SqliteSink::start(storage, "test-hash", &query).unwrap();
    let run_id = sqlite_sink.run_id();
    let mut sink = MultiSink::new()
        .with(Box::new(JsonLinesSink::create(&jsonl_path).unwrap()))
        .with(Box::new(sqlite_sink));

    let coordinator = Coordinator::from_config(&config).unwrap();
    let report = coordinator.run(query, &mut sink).await.unwrap();
    assert_eq!(report.records_emitted, 2);
    drop(sink);

    // JSON Lines: one object per record, website always present
    let contents = fs::read_to_string(&jsonl_path).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line.as_object().unwrap().contains_key("business_website"));
        assert!(line["reviews"].as_array().unwrap().len() <= 5);
    }

    // Database: run closed as completed with both records and their reviews
    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pages_fetched, 1);
    assert_eq!(run.category, "contractors");
    assert_eq!(storage.count_businesses(run_id).unwrap(), 2);
    assert_eq!(storage.count_reviews(run_id).unwrap(), 9);
    assert_eq!(storage.count_websites(run_id).unwrap(), 1);
}

#[tokio::test]
async fn test_server_ignoring_start_does_not_loop() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Every search request gets the first page back, whatever `start` says
    Mock::given(method("GET"))
        .and(path("/query/fragment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(search_page(vec![business("a1", false)], 0, 10, 25)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_business(&mock_server, "a1", 1, None).await;

    let config = create_test_config(&base_url);
    let mut sink = MemorySink::new();
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        run_crawl(&config, &mut sink),
    )
    .await
    .expect("crawl did not terminate")
    .unwrap();

    assert_eq!(report.phase, CrawlPhase::Aborted);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.records_emitted, 1);
    let aborted_by = report.aborted_by.as_ref().unwrap();
    assert_eq!(aborted_by.stage, Stage::Search);
    assert!(aborted_by.message.contains("startResult"));
}
