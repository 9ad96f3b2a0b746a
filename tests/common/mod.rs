use sec_statements::utils::config::{AppConfig, EdgarUrls};
use std::{
    fs,
    path::{Path, PathBuf},
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_USER_AGENT: &str = "Test Agent test@example.com";
pub const AAPL_DOC_PATH: &str = "/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm";

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

pub fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default().with_user_agent_override(Some(TEST_USER_AGENT.to_string()));
    config.timeout_secs = 5;
    config.urls = EdgarUrls {
        tickers: format!("{}/files/company_tickers.json", server.uri()),
        submissions: format!("{}/submissions", server.uri()),
        archives: format!("{}/Archives/edgar/data", server.uri()),
    };
    config
}

/// Serves `body` at `route`, but only to requests carrying the test User-Agent.
pub async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("user-agent", TEST_USER_AGENT))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts the ticker map and Apple's submission index.
pub async fn mount_index(server: &MockServer) {
    serve(server, "/files/company_tickers.json", 200, read_fixture("company_tickers.json")).await;
    serve(server, "/submissions/CIK0000320193.json", 200, read_fixture("submissions_aapl.json")).await;
}

pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
