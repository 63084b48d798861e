use std::path::Path;

use testforge::browser::driver::{BrowserLauncher, PageDriver, PageGuard};
use testforge::browser::session::{BrowserRequest, BrowserResponse, BrowserSession, NodeLauncher};
use testforge::scout::discovery::discover;

mod common;
use crate::common::fakes::FakeLauncher;

// =========================================================================
// BrowserRequest serialization
// =========================================================================

#[test]
fn browser_request_navigate_waits_for_network_idle() {
    let req = BrowserRequest::navigate("https://example.com");
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "navigate");
    assert_eq!(json["url"], "https://example.com");
    assert_eq!(json["wait_until"], "networkidle");
}

#[test]
fn browser_request_evaluate_serializes_correctly() {
    let req = BrowserRequest::evaluate("document.title");
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "evaluate");
    assert_eq!(json["script"], "document.title");
    assert!(json.get("url").is_none());
}

#[test]
fn browser_request_screenshot_serializes_correctly() {
    let req = BrowserRequest::screenshot(Path::new("/tmp/out/vision.png"), true);
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "screenshot");
    assert_eq!(json["path"], "/tmp/out/vision.png");
    assert_eq!(json["full_page"], true);
}

#[test]
fn browser_request_quit_has_only_cmd() {
    let json = serde_json::to_string(&BrowserRequest::Quit).unwrap();
    assert_eq!(json, r#"{"cmd":"quit"}"#);
    assert_eq!(BrowserRequest::Quit.name(), "quit");
}

// =========================================================================
// BrowserResponse deserialization
// =========================================================================

#[test]
fn browser_response_ready_signal() {
    let resp: BrowserResponse = serde_json::from_str(r#"{"ok":true,"ready":true}"#).unwrap();
    assert!(resp.ok);
    assert_eq!(resp.ready, Some(true));
    assert!(resp.data.is_none());
}

#[test]
fn browser_response_with_data() {
    let resp: BrowserResponse =
        serde_json::from_str(r#"{"ok":true,"data":[{"index":0,"tag":"a"}]}"#).unwrap();
    assert_eq!(resp.data.unwrap()[0]["tag"], "a");
}

#[test]
fn browser_response_error() {
    let resp: BrowserResponse =
        serde_json::from_str(r#"{"ok":false,"error":"net::ERR_NAME_NOT_RESOLVED"}"#).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.error.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
}

// =========================================================================
// Session lifecycle
// =========================================================================

#[test]
fn launch_with_missing_driver_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = BrowserSession::launch(&dir.path().join("no_such_server.js"), true);
    assert!(result.is_err());
}

#[test]
fn page_guard_closes_on_drop() {
    let launcher = FakeLauncher::new(serde_json::json!([]));
    {
        let mut guard = PageGuard::new(launcher.launch().unwrap());
        guard.page().navigate("https://example.com").unwrap();
    }
    assert_eq!(launcher.log.closes.get(), 1);
}

#[test]
#[ignore] // requires node and Playwright's Chromium
fn live_session_discovers_elements() {
    let launcher = NodeLauncher {
        script: "driver/browser_server.js".into(),
        headless: true,
    };
    let mut page = launcher.launch().unwrap();

    let html = "<input id='user-name' name='user-name'><button class='btn primary'>Go</button>";
    page.navigate(&format!("data:text/html,{}", html)).unwrap();
    let elements = discover(page.as_mut()).unwrap();
    page.close().unwrap();

    let selectors: Vec<&str> = elements.iter().map(|e| e.selector.as_str()).collect();
    assert_eq!(selectors, ["input#user-name[name=\"user-name\"]", "button.btn"]);
}
