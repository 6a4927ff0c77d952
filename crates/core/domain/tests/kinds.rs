use domain::{RegisterKind, TagValue, ValueKind};

#[test]
fn word_count_follows_value_kind() {
    assert_eq!(ValueKind::Bool.word_count(), 1);
    assert_eq!(ValueKind::UInt16.word_count(), 1);
    assert_eq!(ValueKind::Int16.word_count(), 1);
    assert_eq!(ValueKind::UInt32.word_count(), 2);
    assert_eq!(ValueKind::Int32.word_count(), 2);
    assert_eq!(ValueKind::Float32.word_count(), 2);
}

#[test]
fn register_kind_parses_snake_case() {
    let kind: RegisterKind = serde_json::from_str(r#""discrete_input""#).expect("parse");
    assert_eq!(kind, RegisterKind::DiscreteInput);
    assert!(kind.is_bit());
    assert!(!kind.is_writable());
    assert_eq!(RegisterKind::Input.read_function_code(), 4);
}

#[test]
fn value_kind_accepts_float_alias() {
    let kind: ValueKind = serde_json::from_str(r#""float""#).expect("parse");
    assert_eq!(kind, ValueKind::Float32);
    let kind: ValueKind = serde_json::from_str(r#""uint32""#).expect("parse");
    assert_eq!(kind, ValueKind::UInt32);
}

#[test]
fn tag_value_serializes_as_bare_value() {
    let value = serde_json::to_value(TagValue::Int16(-5)).expect("serialize");
    assert_eq!(value, serde_json::json!(-5));
    let value = serde_json::to_value(TagValue::Bool(true)).expect("serialize");
    assert_eq!(value, serde_json::json!(true));
    assert_eq!(TagValue::UInt32(7).kind(), ValueKind::UInt32);
}
