use testforge::error::ForgeError;
use testforge::intel::report::{capture, capture_with_existing_screenshot, load, sha1_hex};
use testforge::scout::element::{InteractiveElement, Point};

mod common;
use crate::common::fakes::FAKE_PNG;
use crate::common::utils::temp_context;

fn element(ordinal: u32, selector: &str) -> InteractiveElement {
    InteractiveElement {
        ordinal,
        tag_name: "input".into(),
        selector: selector.into(),
        text: String::new(),
        visible: true,
        center: Point { x: 100.0, y: 50.0 },
    }
}

fn login_elements() -> Vec<InteractiveElement> {
    vec![
        element(1, "input#user-name"),
        element(2, "input#password"),
        element(3, "input#login-button"),
    ]
}

// ============================================================================
// capture / load
// ============================================================================

#[test]
fn capture_writes_screenshot_and_record() {
    let (_dir, ctx) = temp_context();

    let report = capture(&ctx, "https://www.saucedemo.com/", login_elements(), FAKE_PNG).unwrap();

    assert!(ctx.report_path().is_file());
    assert_eq!(std::fs::read(&report.screenshot_path).unwrap(), FAKE_PNG);
    assert_eq!(report.element_count, 3);
    assert_eq!(report.screenshot_sha1.as_deref(), Some(sha1_hex(FAKE_PNG).as_str()));
}

#[test]
fn load_round_trips_captured_report() {
    let (_dir, ctx) = temp_context();
    let written = capture(&ctx, "https://www.saucedemo.com/", login_elements(), FAKE_PNG).unwrap();

    let loaded = load(&ctx).unwrap().expect("report should be present");

    assert_eq!(loaded, written);
    let selectors: Vec<&str> = loaded.elements.iter().map(|e| e.selector.as_str()).collect();
    assert_eq!(selectors, ["input#user-name", "input#password", "input#login-button"]);
}

#[test]
fn load_reports_absent_when_nothing_was_scanned() {
    let (_dir, ctx) = temp_context();
    assert!(load(&ctx).unwrap().is_none());
}

#[test]
fn deleting_screenshot_makes_report_absent() {
    let (_dir, ctx) = temp_context();
    capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();

    std::fs::remove_file(ctx.screenshot_path()).unwrap();

    assert!(load(&ctx).unwrap().is_none());
}

#[test]
fn deleting_record_makes_report_absent() {
    let (_dir, ctx) = temp_context();
    capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();

    std::fs::remove_file(ctx.report_path()).unwrap();

    assert!(load(&ctx).unwrap().is_none());
    assert!(ctx.screenshot_path().exists(), "screenshot alone is not a report");
}

#[test]
fn load_resolves_screenshot_through_context() {
    let (_dir, ctx) = temp_context();
    capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();

    // A record written relative to some other working directory
    let mut raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ctx.report_path()).unwrap()).unwrap();
    raw["screenshotPath"] = "output/vision_intel/vision.png".into();
    std::fs::write(ctx.report_path(), raw.to_string()).unwrap();

    let loaded = load(&ctx).unwrap().expect("record and screenshot are both present");
    assert_eq!(loaded.screenshot_path, ctx.screenshot_path());
}

#[test]
fn recorded_path_elsewhere_does_not_stand_in_for_missing_screenshot() {
    let (dir, ctx) = temp_context();
    capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();

    let elsewhere = dir.path().join("elsewhere.png");
    std::fs::write(&elsewhere, FAKE_PNG).unwrap();
    let mut raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ctx.report_path()).unwrap()).unwrap();
    raw["screenshotPath"] = elsewhere.display().to_string().into();
    std::fs::write(ctx.report_path(), raw.to_string()).unwrap();
    std::fs::remove_file(ctx.screenshot_path()).unwrap();

    assert!(load(&ctx).unwrap().is_none());
}

#[test]
fn recorded_screenshot_path_is_absolute() {
    let (_dir, ctx) = temp_context();
    let report = capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();
    assert!(report.screenshot_path.is_absolute());
}

#[test]
fn record_without_captured_screenshot_is_missing_screenshot() {
    let (_dir, ctx) = temp_context();
    ctx.prepare().unwrap();

    let err = capture_with_existing_screenshot(&ctx, "https://example.com", login_elements())
        .unwrap_err();

    match err {
        ForgeError::MissingScreenshot { path } => assert_eq!(path, ctx.screenshot_path()),
        other => panic!("expected MissingScreenshot, got {:?}", other),
    }
    assert!(!ctx.report_path().exists());
}

#[test]
fn corrupt_record_is_an_error_not_absence() {
    let (_dir, ctx) = temp_context();
    ctx.prepare().unwrap();
    std::fs::write(ctx.report_path(), "{ not json").unwrap();

    let err = load(&ctx).unwrap_err();
    assert!(matches!(err, ForgeError::JsonParse { .. }), "got {:?}", err);
}

#[test]
fn next_capture_overwrites_current_slot() {
    let (_dir, ctx) = temp_context();
    capture(&ctx, "https://first.example", login_elements(), FAKE_PNG).unwrap();
    capture(&ctx, "https://second.example", vec![element(1, "a.nav")], b"other").unwrap();

    let loaded = load(&ctx).unwrap().unwrap();
    assert_eq!(loaded.url, "https://second.example");
    assert_eq!(loaded.elements.len(), 1);
    assert_eq!(std::fs::read(ctx.screenshot_path()).unwrap(), b"other");
}

// ============================================================================
// On-disk format
// ============================================================================

#[test]
fn record_uses_camel_case_field_names() {
    let (_dir, ctx) = temp_context();
    capture(&ctx, "https://example.com", login_elements(), FAKE_PNG).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ctx.report_path()).unwrap()).unwrap();

    assert_eq!(raw["url"], "https://example.com");
    assert!(raw["screenshotPath"].is_string());
    assert!(raw["timestamp"].is_string());
    assert_eq!(raw["interactiveElements"].as_array().unwrap().len(), 3);
    assert_eq!(raw["interactiveElements"][0]["id"], 1);
    assert_eq!(raw["interactiveElements"][0]["tagName"], "input");
}

#[test]
fn record_without_optional_metadata_still_loads() {
    let (_dir, ctx) = temp_context();
    ctx.prepare().unwrap();
    std::fs::write(ctx.screenshot_path(), FAKE_PNG).unwrap();

    let legacy = serde_json::json!({
        "url": "https://www.saucedemo.com/",
        "timestamp": "2025-01-15T10:00:00.000Z",
        "screenshotPath": ctx.screenshot_path(),
        "interactiveElements": [
            { "id": 1, "tagName": "input", "selector": "input#user-name", "text": "",
              "isVisible": true, "center": { "x": 10.0, "y": 20.0 } }
        ]
    });
    std::fs::write(ctx.report_path(), legacy.to_string()).unwrap();

    let loaded = load(&ctx).unwrap().unwrap();
    assert_eq!(loaded.elements[0].selector, "input#user-name");
    assert!(loaded.screenshot_sha1.is_none());
}

#[test]
fn element_prefix_is_bounded() {
    let (_dir, ctx) = temp_context();
    let many: Vec<InteractiveElement> = (1..=60).map(|i| element(i, "a")).collect();
    let report = capture(&ctx, "https://example.com", many, FAKE_PNG).unwrap();

    assert_eq!(report.element_prefix(50).len(), 50);
    assert_eq!(report.element_prefix(50).last().unwrap().ordinal, 50);
    assert_eq!(report.element_prefix(100).len(), 60);
}
