//! Integration tests for jobscrape
//!
//! Run the real pipeline (reqwest client included) against a mockito fixture
//! server and assert on the resulting output tree.

use jobscrape::{
    config::{CrawlConfig, FetchConfig},
    scrape::{ArtifactWriter, Dispatcher, FailurePolicy, JobClient},
};
use mockito::Matcher;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

fn listing_html(cards: &[(&str, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(reference, title)| {
            format!(
                r#"<a class="SerpJob-link" data-mdref="{}">{}</a>"#,
                reference, title
            )
        })
        .collect();
    format!("<html><body><div class=\"SerpJobs\">{}</div></body></html>", body)
}

fn listing_mock(server: &mut mockito::Server, page: u32, body: String) -> mockito::Mock {
    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pn".into(), page.to_string()),
            Matcher::UrlEncoded("from".into(), "pagination".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
}

fn detail_mock(server: &mut mockito::Server, key: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/api/job")
        .match_query(Matcher::UrlEncoded("key".into(), key.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
}

fn dispatcher(
    server: &mockito::Server,
    output: &TempDir,
    page_limit: u32,
    workers: usize,
    on_error: FailurePolicy,
) -> Dispatcher<JobClient> {
    let base_url = Url::parse(&server.url()).unwrap();
    let client = JobClient::new(base_url, &FetchConfig::default()).unwrap();
    let config = CrawlConfig {
        base_url: server.url(),
        page_limit,
        workers,
        on_error,
    };
    Dispatcher::new(
        config,
        Arc::new(client),
        Arc::new(ArtifactWriter::new(output.path())),
    )
}

/// Full two-page crawl: one job on page 1, none on page 2. The artifact is
/// named from the detail title, not the listing-page title, and contains the
/// pretty-printed detail body.
#[tokio::test]
async fn end_to_end_two_page_crawl() {
    let mut server = mockito::Server::new_async().await;
    let output = TempDir::new().unwrap();

    let page1 = listing_mock(
        &mut server,
        1,
        listing_html(&[("/job/abc123?utm=x", "Backend Engineer")]),
    )
    .create_async()
    .await;
    let page2 = listing_mock(&mut server, 2, listing_html(&[]))
        .create_async()
        .await;
    let detail = detail_mock(
        &mut server,
        "abc123",
        r#"{"job":{"title":"Senior Backend Engineer"}}"#,
    )
    .create_async()
    .await;

    let stats = dispatcher(&server, &output, 2, 2, FailurePolicy::Abort)
        .run("Backend Engineer", "Manchester")
        .await
        .unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    detail.assert_async().await;

    assert_eq!(stats.pages_crawled, 2);
    assert_eq!(stats.jobs_found, 1);
    assert_eq!(stats.jobs_written, 1);

    // Named from the detail title, not the listing title
    let artifact = output.path().join("page_1/Senior_Backend_Engineer");
    assert!(artifact.is_file());
    assert!(!output.path().join("page_1/Backend_Engineer").exists());

    let content = std::fs::read_to_string(&artifact).unwrap();
    assert_eq!(
        content,
        "{\n\t\"job\": {\n\t\t\"title\": \"Senior Backend Engineer\"\n\t}\n}"
    );

    // The empty page still gets its directory
    let page2_dir = output.path().join("page_2");
    assert!(page2_dir.is_dir());
    assert_eq!(std::fs::read_dir(&page2_dir).unwrap().count(), 0);
}

/// A detail body that is not valid JSON ends the run under the abort policy.
#[tokio::test]
async fn invalid_detail_json_aborts_the_run() {
    let mut server = mockito::Server::new_async().await;
    let output = TempDir::new().unwrap();

    let _page1 = listing_mock(
        &mut server,
        1,
        listing_html(&[("/job/bad456?utm=x", "Broken Job")]),
    )
    .create_async()
    .await;
    let _detail = detail_mock(&mut server, "bad456", "<html>service unavailable</html>")
        .create_async()
        .await;

    let err = dispatcher(&server, &output, 1, 1, FailurePolicy::Abort)
        .run("Backend Engineer", "Manchester")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("page 1 failed"));
}

/// The same bad job under the skip policy is logged and skipped while the
/// rest of the page completes.
#[tokio::test]
async fn invalid_detail_json_is_skipped_with_keep_going() {
    let mut server = mockito::Server::new_async().await;
    let output = TempDir::new().unwrap();

    let _page1 = listing_mock(
        &mut server,
        1,
        listing_html(&[
            ("/job/bad456?utm=x", "Broken Job"),
            ("/job/ok789?utm=x", "Working Job"),
        ]),
    )
    .create_async()
    .await;
    let _bad = detail_mock(&mut server, "bad456", "<html>service unavailable</html>")
        .create_async()
        .await;
    let _ok = detail_mock(&mut server, "ok789", r#"{"job":{"title":"Data Engineer"}}"#)
        .create_async()
        .await;

    let stats = dispatcher(&server, &output, 1, 1, FailurePolicy::Skip)
        .run("Backend Engineer", "Manchester")
        .await
        .unwrap();

    assert_eq!(stats.jobs_found, 2);
    assert_eq!(stats.jobs_written, 1);
    assert_eq!(stats.jobs_skipped, 1);
    assert!(output.path().join("page_1/Data_Engineer").is_file());
}

/// A non-2xx listing response surfaces as a fetch error for that page.
#[tokio::test]
async fn listing_server_error_aborts_the_run() {
    let mut server = mockito::Server::new_async().await;
    let output = TempDir::new().unwrap();

    let _listing = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = dispatcher(&server, &output, 1, 1, FailurePolicy::Abort)
        .run("Backend Engineer", "Manchester")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("page 1 failed"));
}
