//! End-to-end crawl tests against a mock catalogue server

use jikiu_enrich::config::Config;
use jikiu_enrich::crawler::{run_batch, Coordinator};
use jikiu_enrich::record::InputRecord;
use jikiu_enrich::state::BatchState;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at the mock server, tuned so tests run fast.
fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.catalog.base_url = base_url.to_string();
    config.crawler.concurrency = 4;
    config.crawler.requests_per_second = 1000.0;
    config.crawler.max_attempts = 3;
    config.crawler.retry_base_delay_ms = 10;
    config.crawler.request_timeout_secs = 5;
    config
}

fn record(item_code: &str) -> InputRecord {
    InputRecord {
        brand: "555".to_string(),
        item_code: item_code.to_string(),
        ..InputRecord::default()
    }
}

/// Builds a catalogue part page with the given specifications and crosses.
fn part_page(item_code: &str, specs: &[(&str, &str)], crosses: &[(&str, &str)]) -> String {
    let spec_items: String = specs
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="specification-item"><span class="label">{}</span><span class="value">{}</span></div>"#,
                label, value
            )
        })
        .collect();

    let cross_rows: String = crosses
        .iter()
        .map(|(owner, number)| format!("<tr><td>{}</td><td>{}</td></tr>", owner, number))
        .collect();

    format!(
        r#"<html><body>
        <h1 class="part-number">{}</h1>
        <div class="specification">{}</div>
        <table class="crosses-table"><tr><th>Owner</th><th>Number</th></tr>{}</table>
        </body></html>"#,
        item_code, spec_items, cross_rows
    )
}

async fn mock_part(server: &MockServer, item_code: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .and(query_param("part", item_code))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_batch_with_mixed_outcomes() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    mock_part(
        &server,
        "SB-1234",
        part_page(
            "SB-1234",
            &[("Thread Size", "M10x1.25"), ("Ø (mm)", "42")],
            &[("TOYOTA", "48520-12345")],
        ),
    )
    .await;

    // Catalogue renders an empty search result page for this one
    mock_part(
        &server,
        "CB-9999",
        "<html><body>No results for your query</body></html>".to_string(),
    )
    .await;

    // And 404s this one
    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .and(query_param("part", "GONE-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // no retry on 404
        .mount(&server)
        .await;

    let records = vec![record("SB-1234"), record("CB-9999"), record("GONE-1")];
    let outcome = run_batch(test_config(&base_url), records).await.unwrap();

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.results.len(), 3);

    // Output order matches input order regardless of completion order
    assert_eq!(outcome.results[0].record.item_code, "SB-1234");
    assert_eq!(outcome.results[1].record.item_code, "CB-9999");
    assert_eq!(outcome.results[2].record.item_code, "GONE-1");

    let found = &outcome.results[0];
    assert!(found.found_in_jikiu);
    assert_eq!(found.thread_size, "M10x1.25");
    assert_eq!(found.diameter_mm, "42");
    assert_eq!(found.crosses.len(), 1);
    assert_eq!(found.crosses[0].owner, "TOYOTA");
    assert_eq!(found.jikiu_part_number, "SB-1234");

    // A content-level miss and a 404 look the same in the report
    assert!(!outcome.results[1].found_in_jikiu);
    assert!(!outcome.results[2].found_in_jikiu);
    assert!(outcome.results[2].jikiu_url.contains("part=GONE-1"));
}

#[tokio::test]
async fn test_empty_item_code_never_fetches() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    mock_part(
        &server,
        "ABC123",
        part_page("ABC123", &[("Thread Size", "M10")], &[]),
    )
    .await;

    // The end-to-end example: one real code, one empty
    let records = vec![record("ABC123"), record("")];
    let outcome = run_batch(test_config(&base_url), records).await.unwrap();

    assert_eq!(outcome.results.len(), 2);

    assert!(outcome.results[0].found_in_jikiu);
    assert_eq!(outcome.results[0].thread_size, "M10");
    assert!(outcome.results[0].crosses.is_empty());

    assert!(!outcome.results[1].found_in_jikiu);
    assert_eq!(outcome.results[1].thread_size, "");

    // Exactly one request was made: the empty code never hit the network
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    // Two failures, then success; with max-attempts 3 the lookup recovers
    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .and(query_param("part", "FLAKY-1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    mock_part(
        &server,
        "FLAKY-1",
        part_page("FLAKY-1", &[("Location", "Front")], &[]),
    )
    .await;

    let outcome = run_batch(test_config(&base_url), vec![record("FLAKY-1")])
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].found_in_jikiu);
    assert_eq!(outcome.results[0].location, "Front");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_degrade_to_not_found() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // exactly max-attempts requests
        .mount(&server)
        .await;

    let outcome = run_batch(test_config(&base_url), vec![record("DOWN-1")])
        .await
        .unwrap();

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.results.len(), 1);
    assert!(!outcome.results[0].found_in_jikiu);
    assert!(outcome.results[0].jikiu_url.contains("part=DOWN-1"));
}

#[tokio::test]
async fn test_output_order_is_independent_of_completion_order() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    // First record is slow, later ones fast; workers finish out of order
    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .and(query_param("part", "SLOW-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(part_page("SLOW-1", &[], &[]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    for code in ["FAST-1", "FAST-2", "FAST-3"] {
        mock_part(&server, code, part_page(code, &[], &[])).await;
    }

    let records = vec![
        record("SLOW-1"),
        record("FAST-1"),
        record("FAST-2"),
        record("FAST-3"),
    ];
    let outcome = run_batch(test_config(&base_url), records).await.unwrap();

    let codes: Vec<_> = outcome
        .results
        .iter()
        .map(|r| r.record.item_code.as_str())
        .collect();
    assert_eq!(codes, vec!["SLOW-1", "FAST-1", "FAST-2", "FAST-3"]);
}

#[tokio::test]
async fn test_progress_reaches_total_monotonically() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(part_page("ANY", &[], &[])))
        .mount(&server)
        .await;

    let coordinator = Arc::new(Coordinator::new(test_config(&base_url)).unwrap());
    let mut progress = coordinator.subscribe_progress();

    let observer = tokio::spawn(async move {
        let mut last = 0;
        let mut seen = Vec::new();
        while progress.changed().await.is_ok() {
            let snapshot = *progress.borrow();
            assert!(
                snapshot.current >= last,
                "progress went backwards: {} -> {}",
                last,
                snapshot.current
            );
            last = snapshot.current;
            seen.push(snapshot);
            if snapshot.total > 0 && snapshot.current == snapshot.total {
                break;
            }
        }
        seen
    });

    let records = (0..8).map(|i| record(&format!("P-{}", i))).collect();
    let outcome = coordinator.run(records).await.unwrap();

    assert_eq!(outcome.state, BatchState::Completed);
    assert_eq!(outcome.results.len(), 8);

    let seen = observer.await.unwrap();
    let final_snapshot = seen.last().unwrap();
    assert_eq!(final_snapshot.current, 8);
    assert_eq!(final_snapshot.total, 8);
}

#[tokio::test]
async fn test_cancellation_keeps_completed_results() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(part_page("ANY", &[], &[]))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&base_url);
    config.crawler.concurrency = 2;

    let coordinator = Arc::new(Coordinator::new(config).unwrap());
    let mut results = coordinator.take_result_stream().unwrap();
    let cancel = coordinator.cancellation_token();

    let runner = {
        let coordinator = coordinator.clone();
        let records = (0..12).map(|i| record(&format!("P-{}", i))).collect();
        tokio::spawn(async move { coordinator.run(records).await.unwrap() })
    };

    // Cancel as soon as the first result lands
    let mut delivered = 0;
    if results.recv().await.is_some() {
        delivered += 1;
    }
    cancel.cancel();

    // The stream drains whatever still completes, then closes
    while results.recv().await.is_some() {
        delivered += 1;
    }

    let outcome = runner.await.unwrap();

    assert_eq!(outcome.state, BatchState::Cancelled);
    assert_eq!(coordinator.state(), BatchState::Cancelled);
    assert!(
        outcome.results.len() < 12,
        "cancellation should stop the batch early, got {} results",
        outcome.results.len()
    );
    assert_eq!(delivered, outcome.results.len());

    // No lookups were started after the workers observed the signal
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.len() < 12,
        "expected fewer requests than records, got {}",
        requests.len()
    );
}

#[tokio::test]
async fn test_duplicate_item_codes_fetch_independently() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    mock_part(&server, "DUP-1", part_page("DUP-1", &[], &[])).await;

    let records = vec![record("DUP-1"), record("DUP-1")];
    let outcome = run_batch(test_config(&base_url), records).await.unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.found_in_jikiu));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_rate_limit_paces_requests() {
    let server = MockServer::start().await;
    let base_url = format!("{}/catalogue", server.uri());

    Mock::given(method("GET"))
        .and(path("/catalogue/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(part_page("ANY", &[], &[])))
        .mount(&server)
        .await;

    // 20 req/s and 6 lookups: the batch cannot finish faster than the
    // spacing allows even with 4 workers
    let mut config = test_config(&base_url);
    config.crawler.requests_per_second = 20.0;

    let records = (0..6).map(|i| record(&format!("P-{}", i))).collect();

    let start = std::time::Instant::now();
    let outcome = run_batch(config, records).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome.results.len(), 6);
    assert!(
        elapsed >= Duration::from_millis(250),
        "6 lookups at 20 req/s finished in {:?}",
        elapsed
    );
}
