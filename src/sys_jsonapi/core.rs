//! JSON decoding with classified errors, and the response envelope. No hyper types here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::{Deserializer, Value};

use crate::error::{ToolkitError, ToolkitResult};

/// Standard envelope for JSON replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data,
        }
    }
}

/// Decode exactly one JSON value from `body`.
///
/// Anything but JSON whitespace after the first value is rejected. Unless
/// `allow_unknown_fields` is set, the first input key that `T` ignores while
/// deserializing is reported as an unknown field.
pub fn decode_json<T>(body: &[u8], allow_unknown_fields: bool) -> ToolkitResult<T>
where
    T: DeserializeOwned,
{
    if body.iter().all(|b| is_json_whitespace(*b)) {
        return Err(ToolkitError::EmptyJsonBody);
    }

    let mut de = Deserializer::from_slice(body);
    let mut ignored: Option<String> = None;
    let mut record_ignored = |path: serde_ignored::Path<'_>| {
        if ignored.is_none() {
            ignored = Some(path.to_string());
        }
    };
    let value: T = serde_path_to_error::deserialize(serde_ignored::Deserializer::new(
        &mut de,
        &mut record_ignored,
    ))
    .map_err(|e| classify_error(e, body))?;

    if let Some(field) = ignored.filter(|_| !allow_unknown_fields) {
        return Err(ToolkitError::UnknownJsonField(field));
    }

    de.end().map_err(|_| ToolkitError::MultipleJsonDocuments)?;
    Ok(value)
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn classify_error(err: serde_path_to_error::Error<serde_json::Error>, body: &[u8]) -> ToolkitError {
    let path = err.path().to_string();
    let err = err.into_inner();
    let offset = byte_offset(body, err.line(), err.column());
    match err.classify() {
        Category::Syntax | Category::Io => ToolkitError::MalformedJson { offset },
        Category::Eof => ToolkitError::MalformedJson { offset: None },
        Category::Data => {
            let message = err.to_string();
            // serde reports these against the enclosing object, naming the key in backticks
            if message.starts_with("unknown field") {
                ToolkitError::UnknownJsonField(join_path(&path, backticked(&message)))
            } else if message.starts_with("missing field") {
                ToolkitError::MissingJsonField(join_path(&path, backticked(&message)))
            } else {
                ToolkitError::JsonTypeMismatch {
                    field: (path != ".").then_some(path),
                    offset,
                }
            }
        }
    }
}

/// serde_json reports 1-based line/column; turn that back into a position in `body`.
fn byte_offset(body: &[u8], line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start = if line == 1 {
        0
    } else {
        body.iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map(|(idx, _)| idx + 1)?
    };
    Some(line_start + column)
}

fn backticked(message: &str) -> String {
    message
        .split('`')
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

fn join_path(parent: &str, key: String) -> String {
    if parent == "." {
        key
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: i32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Team {
        lead: Person,
    }

    #[test]
    fn test_decode_cases() {
        let cases: &[(&str, &str, bool, bool)] = &[
            ("good json", r#"{"name": "deb", "age": 90}"#, false, false),
            ("badly formatted json", r#"{"name": }"#, true, false),
            ("incorrect type json", r#"{"name": "deb", "age": "90"}"#, true, false),
            ("two jsons", r#"{"name": "deb", "age": 90} {"name": "deb", "age": 90}"#, true, false),
            ("empty body json", "", true, false),
            ("syntax json", r#"{"name": "deb" "age": 90}"#, true, false),
            ("dont allow unknown field json", r#"{"namyyy": "deb", "name": "x", "age": 90}"#, true, false),
            ("allow unknown field json", r#"{"nameyyy": "deb", "name": "x", "age": 90}"#, false, true),
            ("missing field json", r#"{name: "deb"}"#, true, true),
            ("not json", "hello world", true, true),
        ];

        for (name, body, error_expected, allow_unknown) in cases {
            let result = decode_json::<Person>(body.as_bytes(), *allow_unknown);
            assert_eq!(result.is_err(), *error_expected, "{name}: {result:?}");
        }
    }

    #[test]
    fn test_decode_populates_target() {
        let person: Person = decode_json(br#"{"name": "deb", "age": 90}"#, false).unwrap();
        assert_eq!(
            person,
            Person {
                name: "deb".to_string(),
                age: 90
            }
        );
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            decode_json::<Person>(br#"{"name": }"#, false),
            Err(ToolkitError::MalformedJson { offset: Some(_) })
        ));
        assert!(matches!(
            decode_json::<Person>(br#"{"name": "deb""#, false),
            Err(ToolkitError::MalformedJson { offset: None })
        ));
        assert!(matches!(
            decode_json::<Person>(br#"{"name": "deb", "age": "90"}"#, false),
            Err(ToolkitError::JsonTypeMismatch { offset: Some(_), .. })
        ));
        assert!(matches!(
            decode_json::<Person>(br#"{"name": "deb", "age": 90} {"name": "deb", "age": 90}"#, false),
            Err(ToolkitError::MultipleJsonDocuments)
        ));
        assert!(matches!(
            decode_json::<Person>(b"  \n ", false),
            Err(ToolkitError::EmptyJsonBody)
        ));
        assert!(matches!(
            decode_json::<Person>(br#"{"name": "deb"}"#, false),
            Err(ToolkitError::MissingJsonField(field)) if field == "age"
        ));
    }

    #[test]
    fn test_unknown_field_named() {
        match decode_json::<Person>(br#"{"name": "deb", "age": 90, "extra": 1}"#, false) {
            Err(ToolkitError::UnknownJsonField(field)) => assert_eq!(field, "extra"),
            other => panic!("expected UnknownJsonField, got {other:?}"),
        }

        match decode_json::<Team>(br#"{"lead": {"name": "deb", "age": 90, "nick": "d"}}"#, false) {
            Err(ToolkitError::UnknownJsonField(field)) => assert_eq!(field, "lead.nick"),
            other => panic!("expected UnknownJsonField, got {other:?}"),
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Signup {
        name: String,
        #[serde(skip_serializing)]
        password: String,
    }

    #[derive(Debug, Deserialize)]
    struct Aliased {
        #[serde(alias = "user_name")]
        name: String,
    }

    #[test]
    fn test_declared_fields_are_not_unknown() {
        let signup: Signup =
            decode_json(br#"{"name": "deb", "password": "hunter2"}"#, false).unwrap();
        assert_eq!(signup.password, "hunter2");

        let aliased: Aliased = decode_json(br#"{"user_name": "deb"}"#, false).unwrap();
        assert_eq!(aliased.name, "deb");

        assert!(matches!(
            decode_json::<Aliased>(br#"{"user_name": "deb", "nick": "d"}"#, false),
            Err(ToolkitError::UnknownJsonField(field)) if field == "nick"
        ));
    }

    #[test]
    fn test_type_mismatch_names_field() {
        match decode_json::<Person>(br#"{"name": "deb", "age": "90"}"#, false) {
            Err(ToolkitError::JsonTypeMismatch { field, offset }) => {
                assert_eq!(field.as_deref(), Some("age"));
                assert!(offset.is_some());
            }
            other => panic!("expected JsonTypeMismatch, got {other:?}"),
        }

        match decode_json::<Team>(br#"{"lead": {"name": "deb", "age": true}}"#, false) {
            Err(ToolkitError::JsonTypeMismatch { field, .. }) => {
                assert_eq!(field.as_deref(), Some("lead.age"));
            }
            other => panic!("expected JsonTypeMismatch, got {other:?}"),
        }

        assert!(matches!(
            decode_json::<Person>(b"42", false),
            Err(ToolkitError::JsonTypeMismatch { field: None, .. })
        ));
    }

    #[test]
    fn test_missing_nested_field() {
        assert!(matches!(
            decode_json::<Team>(br#"{"lead": {"name": "deb"}}"#, false),
            Err(ToolkitError::MissingJsonField(field)) if field == "lead.age"
        ));
    }

    #[test]
    fn test_form_feed_is_not_trailing_whitespace() {
        assert!(matches!(
            decode_json::<Person>(b"{\"name\": \"deb\", \"age\": 90}\x0c", false),
            Err(ToolkitError::MultipleJsonDocuments)
        ));
        assert!(matches!(
            decode_json::<Person>(b"\x0c", false),
            Err(ToolkitError::MalformedJson { .. })
        ));
    }

    #[test]
    fn test_trailing_whitespace_is_fine() {
        let person: Person = decode_json(b"{\"name\": \"deb\", \"age\": 90}\n\n", false).unwrap();
        assert_eq!(person.age, 90);
    }

    #[test]
    fn test_byte_offset_multiline() {
        let body = b"{\n  \"a\": }";
        assert_eq!(byte_offset(body, 2, 8), Some(10));
        assert_eq!(byte_offset(body, 1, 1), Some(1));
        assert_eq!(byte_offset(body, 0, 0), None);
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(JsonResponse::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": true, "message": "boom"}));
    }
}
