//! End-to-end behaviour: declaration text in, validation results out.

use aegis::compiler::render_artifact;
use aegis::prelude::*;
use http::StatusCode;
use serde_json::{json, Value};

const MESSAGE_CONTRACT: &str = r#"
    type MessageQuery = { messageID: string };

    export default
        | { method: "DELETE", query: MessageQuery }
        | {
            method: "PATCH",
            query: MessageQuery,
            body: { content: string @minLength(1) @maxLength(20000) },
          };
"#;

fn registry(endpoint: &str, source: &str) -> ContractRegistry {
    let descriptor = ContractExtractor::default()
        .extract(endpoint, source)
        .unwrap();
    let compiled = SchemaCompiler::new().compile(&descriptor).unwrap();
    ContractRegistry::from_documents(
        [(compiled.endpoint, compiled.method_schema, compiled.request_schema)],
        ValidationConfig::default(),
    )
    .unwrap()
}

fn messages() -> ContractRegistry {
    registry("messages/[messageID]/index", MESSAGE_CONTRACT)
}

fn check(registry: &ContractRegistry, endpoint: &str, request: Value) -> Value {
    serde_json::to_value(registry.validate_request(endpoint, &request).unwrap()).unwrap()
}

// ==================== Concrete Scenario ====================

#[test]
fn test_put_is_not_allowed() {
    assert_eq!(
        check(&messages(), "messages/[messageID]/index", json!({"method": "PUT"})),
        json!({"valid": false, "errors": [{"pointer": "method", "message": "method not allowed"}]})
    );
}

#[test]
fn test_patch_with_empty_content() {
    assert_eq!(
        check(
            &messages(),
            "messages/[messageID]/index",
            json!({"method": "PATCH", "query": {"messageID": "abc"}, "body": {"content": ""}})
        ),
        json!({"valid": false, "errors": [{"pointer": "body.content", "message": "below minimum length 1"}]})
    );
}

#[test]
fn test_patch_with_content() {
    assert_eq!(
        check(
            &messages(),
            "messages/[messageID]/index",
            json!({"method": "PATCH", "query": {"messageID": "abc"}, "body": {"content": "hi"}})
        ),
        json!({"valid": true, "errors": []})
    );
}

#[test]
fn test_delete_without_body() {
    let result = messages()
        .validate(
            "messages/[messageID]/index",
            "DELETE",
            Some(&json!({"messageID": "abc"})),
            None,
        )
        .unwrap();
    assert!(result.valid, "{:?}", result.errors);
}

// ==================== Gate and Shape Tests ====================

#[test]
fn test_method_gate_precedes_shape() {
    let result = messages()
        .validate(
            "messages/[messageID]/index",
            "PUT",
            Some(&json!(42)),
            Some(&json!({"content": 42, "extra": true})),
        )
        .unwrap();
    assert_eq!(
        result.errors,
        vec![ValidationError::new("method", "method not allowed")]
    );
    let rejection = result.rejection().unwrap();
    assert!(matches!(rejection, RequestRejection::MethodNotAllowed { .. }));
    assert_eq!(rejection.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_strict_shape_rejection() {
    let registry = registry(
        "things/index",
        r#"export default { method: "POST", body: { a: number } };"#,
    );
    let result = registry
        .validate("things/index", "POST", None, Some(&json!({"a": 1, "b": 2})))
        .unwrap();
    assert_eq!(
        result.errors,
        vec![ValidationError::new("body.b", "unknown property")]
    );
    let rejection = result.rejection().unwrap();
    assert!(matches!(rejection, RequestRejection::ShapeViolation { .. }));
    assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_union_branch_follows_method() {
    // A DELETE-shaped request sent as PATCH is judged against the PATCH branch.
    let result = messages()
        .validate(
            "messages/[messageID]/index",
            "PATCH",
            Some(&json!({"messageID": "abc"})),
            None,
        )
        .unwrap();
    assert_eq!(
        result.errors,
        vec![ValidationError::new("body", "missing required property")]
    );
}

// ==================== Recursion Tests ====================

#[test]
fn test_recursive_partial_five_levels() {
    let registry = registry(
        "trees/index",
        r#"
        type Node = { label: string @minLength(1), child: Node };
        export default { method: "PATCH", body: Partial<Node> };
        "#,
    );

    let deep = json!({
        "method": "PATCH",
        "body": {"child": {"label": "2", "child": {"child": {"child": {"label": "5"}}}}}
    });
    assert_eq!(check(&registry, "trees/index", deep)["valid"], true);

    let bad = json!({
        "method": "PATCH",
        "body": {"child": {"child": {"child": {"child": {"label": 5}}}}}
    });
    assert_eq!(
        check(&registry, "trees/index", bad),
        json!({"valid": false, "errors": [{
            "pointer": "body.child.child.child.child.label",
            "message": "expected string, got number"
        }]})
    );
}

// ==================== Artifact Round-Trip Tests ====================

#[test]
fn test_artifact_round_trip_preserves_behaviour() {
    let descriptor = ContractExtractor::default()
        .extract("messages/[messageID]/index", MESSAGE_CONTRACT)
        .unwrap();
    let compiled = SchemaCompiler::new().compile(&descriptor).unwrap();

    let artifacts = compiled
        .artifacts()
        .iter()
        .map(|artifact| ArtifactLoader::from_json(&render_artifact(artifact).unwrap()).unwrap())
        .collect::<Vec<_>>();
    let loaded = ContractRegistry::from_artifacts(artifacts, ValidationConfig::default()).unwrap();
    let direct = messages();

    for request in [
        json!({"method": "PUT"}),
        json!({"method": "DELETE"}),
        json!({"method": "PATCH", "query": {"messageID": "abc"}, "body": {"content": ""}}),
        json!({"method": "PATCH", "query": {"messageID": "abc"}, "body": {"content": "hi"}}),
        json!({"method": "PATCH", "query": {"messageID": 7}, "body": {}, "cookies": {}}),
    ] {
        assert_eq!(
            check(&loaded, "messages/[messageID]/index", request.clone()),
            check(&direct, "messages/[messageID]/index", request)
        );
    }
}

#[test]
fn test_unknown_endpoint_fails_closed() {
    let err = messages()
        .validate("users/index", "GET", None, None)
        .unwrap_err();
    assert!(matches!(err, SentinelError::EndpointNotFound { .. }));
}
