mod common;

use common::{config_for, dir_entries, mount_index, read_fixture, serve, AAPL_DOC_PATH};
use sec_statements::edgar::EdgarClient;
use sec_statements::utils::error::EdgarError;
use sec_statements::{read_csv, run, AppError, RunOptions, StatementKind};
use std::fs;
use tokio_test::{assert_err, assert_ok};
use wiremock::MockServer;

fn options(dir: &std::path::Path) -> RunOptions {
    RunOptions { output_dir: dir.to_path_buf(), debug: false }
}

#[tokio::test]
async fn locates_the_latest_annual_filing() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    let client = EdgarClient::new(&config_for(&server)).unwrap();
    let filing = assert_ok!(client.locate_latest_filing("aapl").await);

    assert_eq!(filing.ticker, "AAPL");
    assert_eq!(filing.cik, 320193);
    assert_eq!(filing.company_name, "Apple Inc.");
    assert_eq!(filing.form_type, "10-K");
    assert_eq!(filing.filing_date.to_string(), "2024-11-01");
    assert_eq!(filing.accession_number, "0000320193-24-000123");
    assert_eq!(filing.primary_document, "aapl-20240928.htm");
}

#[tokio::test]
async fn fetched_document_keeps_its_source_url() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    serve(&server, AAPL_DOC_PATH, 200, read_fixture("aapl_10k.html")).await;

    let client = EdgarClient::new(&config_for(&server)).unwrap();
    let filing = client.locate_latest_filing("AAPL").await.unwrap();
    let document = assert_ok!(client.fetch_document(&filing).await);

    assert_eq!(document.url, format!("{}{}", server.uri(), AAPL_DOC_PATH));
    assert!(document.html.contains("CONSOLIDATED BALANCE SHEETS"));
}

#[tokio::test]
async fn issuer_without_annual_filing_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/files/company_tickers.json", 200, read_fixture("company_tickers.json")).await;
    serve(&server, "/submissions/CIK0000789019.json", 200, read_fixture("submissions_no_10k.json")).await;

    let client = EdgarClient::new(&config_for(&server)).unwrap();
    let err = assert_err!(client.locate_latest_filing("MSFT").await);
    assert!(matches!(err, EdgarError::NoFilingFound { cik: 789019, .. }), "{:?}", err);
}

#[tokio::test]
async fn full_run_writes_three_statements() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    serve(&server, AAPL_DOC_PATH, 200, read_fixture("aapl_10k.html")).await;

    let out = tempfile::tempdir().unwrap();
    // Output of an earlier run is replaced, not appended to
    fs::write(out.path().join("AAPL_income_statement.csv"), "label,value\nStale,1\n").unwrap();

    let output = assert_ok!(run(&config_for(&server), "AAPL", &options(out.path())).await);
    assert_eq!(output.filing.accession_number, "0000320193-24-000123");
    assert_eq!(output.files.len(), 3);

    for kind in StatementKind::ALL {
        let table = output.statements.get(kind);
        assert!(!table.is_empty(), "{} should not be empty", kind.name());

        let path = out.path().join(format!("AAPL_{}.csv", kind.file_stem()));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("label,value\n"));
        assert!(content.lines().count() >= 2);
        assert_eq!(read_csv(&path).unwrap(), table.items);
    }

    let income = &output.statements.income;
    assert_eq!(income.get("Net income"), Some(Some(93736.0)));
    assert_eq!(income.get("Stale"), None);
    assert_eq!(output.statements.balance_sheet.get("Total assets"), Some(Some(364980.0)));
}

#[tokio::test]
async fn missing_cash_flow_section_still_succeeds() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    let html = read_fixture("aapl_10k.html").replace("CONSOLIDATED STATEMENTS OF CASH FLOWS", "SUPPLEMENTAL INFORMATION");
    serve(&server, AAPL_DOC_PATH, 200, html).await;

    let out = tempfile::tempdir().unwrap();
    let output = assert_ok!(run(&config_for(&server), "AAPL", &options(out.path())).await);

    assert!(output.statements.cash_flow.is_empty());
    assert!(!output.statements.income.is_empty());
    assert!(!output.statements.balance_sheet.is_empty());

    let cash_flow = fs::read_to_string(out.path().join("AAPL_cash_flow_statement.csv")).unwrap();
    assert_eq!(cash_flow, "label,value\n");
}

#[tokio::test]
async fn unknown_ticker_writes_nothing() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("results");
    let err = assert_err!(run(&config_for(&server), "ZZZZ", &options(&target)).await);

    assert!(matches!(err, AppError::Edgar(EdgarError::UnknownTicker(_))), "{:?}", err);
    assert!(!target.exists());
}

#[tokio::test]
async fn http_failure_on_fetch_leaves_outputs_untouched() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    serve(&server, AAPL_DOC_PATH, 500, String::new()).await;

    let out = tempfile::tempdir().unwrap();
    let previous = out.path().join("AAPL_income_statement.csv");
    fs::write(&previous, "label,value\nNet income,1\n").unwrap();

    let err = assert_err!(run(&config_for(&server), "AAPL", &options(out.path())).await);
    match err {
        AppError::Edgar(e) => assert!(e.is_fetch_failure(), "{:?}", e),
        other => panic!("expected fetch failure, got {:?}", other),
    }
    assert_eq!(dir_entries(out.path()), vec![previous.clone()]);
    assert_eq!(fs::read_to_string(&previous).unwrap(), "label,value\nNet income,1\n");
}

#[tokio::test]
async fn network_failure_on_fetch_writes_nothing() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    let mut config = config_for(&server);
    // Nothing listens on port 1
    config.urls.archives = "http://127.0.0.1:1/Archives/edgar/data".to_string();

    let out = tempfile::tempdir().unwrap();
    let err = assert_err!(run(&config, "AAPL", &options(out.path())).await);
    assert!(matches!(err, AppError::Edgar(EdgarError::Network(_))), "{:?}", err);
    assert!(dir_entries(out.path()).is_empty());
}

#[tokio::test]
async fn requests_without_identification_are_refused() {
    let server = MockServer::start().await;
    mount_index(&server).await;

    // The mocks only answer the test User-Agent; anything else gets wiremock's 404
    let config = config_for(&server).with_user_agent_override(Some("someone-else other@example.com".to_string()));
    let client = EdgarClient::new(&config).unwrap();
    let err = assert_err!(client.locate_latest_filing("AAPL").await);
    assert!(matches!(err, EdgarError::Http { status, .. } if status == 404), "{:?}", err);
}

#[tokio::test]
async fn debug_mode_saves_the_filing() {
    let server = MockServer::start().await;
    mount_index(&server).await;
    serve(&server, AAPL_DOC_PATH, 200, read_fixture("aapl_10k.html")).await;

    let out = tempfile::tempdir().unwrap();
    let options = RunOptions { output_dir: out.path().to_path_buf(), debug: true };
    assert_ok!(run(&config_for(&server), "AAPL", &options).await);

    assert!(out.path().join("debug").join("AAPL_raw_filing.html").exists());
    assert!(out.path().join("debug").join("AAPL_filing_annotated.html").exists());
}
