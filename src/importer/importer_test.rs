use serde_json::json;

use super::*;
use crate::importer::format::DEFAULT_TITLE_PREFIX;

#[test]
fn test_normalize_canonical_identity() {
    let actual = normalize(&json!({
        "title": "T",
        "messages": [{"role": "user", "content": "hi"}]
    }));

    assert_eq!(
        actual,
        ChatImport {
            title: "T".to_string(),
            messages: vec![ChatTurn::new(Role::User, "hi")],
        }
    );
}

#[test]
fn test_normalize_flat_array_with_sender() {
    let actual = normalize(&json!([{"sender": "human", "text": "hey"}]));
    assert_eq!(actual.messages, vec![ChatTurn::new(Role::User, "hey")]);
}

#[test]
fn test_normalize_conversation_wrapper() {
    let actual = normalize(&json!({
        "conversation": [{"isUser": true, "text": "hi"}, {"text": "hello"}]
    }));

    assert!(actual.title.starts_with(DEFAULT_TITLE_PREFIX));
    assert_eq!(
        actual.messages,
        vec![
            ChatTurn::new(Role::User, "hi"),
            ChatTurn::new(Role::Assistant, "hello"),
        ]
    );
}

#[test]
fn test_normalize_empty_object() {
    let actual = normalize(&json!({}));
    assert!(actual.title.starts_with(DEFAULT_TITLE_PREFIX));
    assert_eq!(
        actual.messages,
        vec![ChatTurn::new(Role::User, "Imported chat with no messages")]
    );
}

#[test]
fn test_normalize_coerces_role_and_content() {
    let actual = normalize(&json!({
        "title": "Coerced",
        "messages": [
            {"role": "bot", "content": "x"},
            {"role": "assistant", "content": {"a": 1}},
        ]
    }));

    assert_eq!(
        actual.messages,
        vec![
            ChatTurn::new(Role::User, "x"),
            ChatTurn::new(Role::Assistant, "{\"a\":1}"),
        ]
    );
}

#[test]
fn test_normalize_text_float_content() {
    let actual =
        normalize_text(r#"{"title":"Numbers","messages":[{"role":"user","content":1.0}]}"#).unwrap();
    assert_eq!(actual.messages, vec![ChatTurn::new(Role::User, "1")]);
}

#[test]
fn test_normalize_flat_array_unknown_sender_is_system() {
    let actual = normalize(&json!([{"from": "moderator", "message": "be kind"}]));
    assert_eq!(actual.messages, vec![ChatTurn::new(Role::System, "be kind")]);
}

#[test]
fn test_normalize_unstructured_sender_is_sanitized() {
    let actual = normalize(&json!({"items": [{"text": "hey", "sender": "human"}]}));
    assert_eq!(actual.messages, vec![ChatTurn::new(Role::User, "hey")]);
}

#[test]
fn test_normalize_always_yields_valid_messages() {
    let inputs = vec![
        json!(null),
        json!(0),
        json!("just text"),
        json!([]),
        json!([null, 1, [], {}]),
        json!({"messages": []}),
        json!({"messages": [null, 3, "s"]}),
        json!({"conversation": []}),
        json!({"a": {"b": {"c": 1}}}),
        json!({"list": [[], {}, null]}),
        json!({"title": {"nested": true}, "messages": [{"role": 5, "content": [1]}]}),
    ];

    for input in inputs {
        let actual = normalize(&input);
        assert!(!actual.messages.is_empty(), "no messages for {}", input);
        assert!(!actual.title.is_empty(), "empty title for {}", input);
        for msg in &actual.messages {
            assert!(Role::ALL.contains(&msg.role));
        }
    }
}

#[test]
fn test_parse_payload_errors() {
    assert!(matches!(parse_payload(""), Err(ImportError::Empty)));
    assert!(matches!(parse_payload("  \n\t"), Err(ImportError::Empty)));
    assert!(matches!(
        parse_payload("{not json"),
        Err(ImportError::InvalidJson(_))
    ));

    let err = normalize_text("[1, 2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid JSON format. Please ensure your data is valid JSON."
    );
}

#[test]
fn test_normalize_text() {
    let actual = normalize_text(r#"{"title": "Parsed", "messages": [{"role": "system", "content": "rules"}]}"#)
        .expect("should parse");
    assert_eq!(actual.title, "Parsed");
    assert_eq!(actual.messages, vec![ChatTurn::new(Role::System, "rules")]);
}

#[test]
fn test_sample_payload_round_trips_through_normalizer() {
    let sample = sample_payload();
    assert_eq!(sample.title, "Sample Chat");
    assert_eq!(sample.messages.len(), 4);

    let actual = normalize_text(&sample_json()).expect("sample must be valid JSON");
    assert_eq!(actual, sample);
}
