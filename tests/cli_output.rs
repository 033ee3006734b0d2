//! CLI output formatting tests.
//!
//! JSON output must keep the wire shape (including explicit nulls); pretty
//! output is the default human-readable rendering.

use serde_json::json;
use systemlink::{AuthInfo, Feed, Field, PrettyPrint, Product};

fn make_test_product() -> Product {
    serde_json::from_value(json!({
        "id": "5e30934193cac8046851acb2",
        "partNumber": "156502A-11L",
        "name": "cRIO-9030",
        "family": "cRIO",
        "keywords": ["controller", "rt"],
        "properties": {"vendor": "NI", "slots": "4"},
        "fileIds": [],
        "workspace": null,
        "updatedAt": "2024-03-01T10:00:00Z"
    }))
    .unwrap()
}

fn make_test_feed() -> Feed {
    serde_json::from_value(json!({
        "id": "feed-1",
        "name": "Tools",
        "description": "Build tools",
        "platform": "WINDOWS",
        "workspace": "846e294a-a007-47ac-9fc2-fac07eab240e",
        "updatedAt": "2024-03-01T10:00:00Z",
        "createdAt": "2024-03-01T09:00:00Z",
        "packageSources": [],
        "deleted": false
    }))
    .unwrap()
}

fn make_test_auth() -> AuthInfo {
    serde_json::from_value(json!({
        "user": {
            "id": "user-1",
            "firstName": "Test",
            "lastName": "User",
            "email": "test.user@example.com",
            "status": "active"
        },
        "org": {"id": "org-1", "name": "Test Org"},
        "workspaces": [
            {"id": "ws-1", "name": "Default", "enabled": true, "default": true},
            {"id": "ws-2", "name": "Lab", "enabled": true, "default": false}
        ]
    }))
    .unwrap()
}

// ============================================================================
// JSON Output Tests
// ============================================================================

#[test]
fn test_json_output_keeps_explicit_nulls() {
    let product = make_test_product();
    let output = serde_json::to_string_pretty(&product).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["partNumber"], "156502A-11L");
    assert!(parsed["workspace"].is_null());
    // Never sent, so never printed
    assert!(parsed.get("createdAt").is_none());
}

#[test]
fn test_json_output_for_list_is_array() {
    let products = vec![make_test_product(), make_test_product()];
    let output = serde_json::to_string_pretty(&products).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[test]
fn test_json_output_round_trips_tri_state() {
    let product = make_test_product();
    let output = serde_json::to_string(&product).unwrap();
    let back: Product = serde_json::from_str(&output).unwrap();

    assert_eq!(back, product);
    assert!(back.workspace.is_null());
    assert_eq!(back.created_at, Field::Unset);
}

#[test]
fn test_feed_json_uses_wire_platform() {
    let output = serde_json::to_value(make_test_feed()).unwrap();
    assert_eq!(output["platform"], "WINDOWS");
}

// ============================================================================
// Pretty Output Tests
// ============================================================================

#[test]
fn test_product_pretty_print() {
    let output = make_test_product().pretty_print();

    assert!(output.starts_with("Product: 156502A-11L"));
    assert!(output.contains("Name:           cRIO-9030"));
    assert!(output.contains("Keywords:       controller, rt"));
    assert!(output.contains("Properties:     slots=4, vendor=NI"));
    assert!(output.contains("Workspace:      (null)"));
    assert!(output.contains("Updated:        2024-03-01 10:00:00 UTC"));
    assert!(!output.contains("Created:"));
}

#[test]
fn test_feed_pretty_print() {
    let output = make_test_feed().pretty_print();

    assert!(output.starts_with("Feed: Tools"));
    assert!(output.contains("Platform:       WINDOWS"));
    assert!(output.contains("Description:    Build tools"));
}

#[test]
fn test_auth_pretty_print_marks_default_workspace() {
    let output = make_test_auth().pretty_print();

    assert!(output.starts_with("User: Test User"));
    assert!(output.contains("Org:            Test Org"));
    assert!(output.contains("Workspace:      Default [ws-1] (default)"));
    assert!(
        output.contains("Workspace:      Lab [ws-2]\n")
            || output.ends_with("Workspace:      Lab [ws-2]")
    );
}
