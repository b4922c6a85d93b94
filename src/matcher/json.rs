use bson::{Bson, Document};
use serde_json::Value;

use crate::matcher::context::MatchContext;
use crate::matcher::matcher::match_document;

#[derive(Debug)]
pub enum PatternError {
    ParseJsonError(serde_json::Error),
    NotADocument,
}

/// Copy of the text with single quotes replaced by double quotes, so test
/// literals can avoid escaping.
pub fn single_quotes_to_double(text: &str) -> String {
    text.chars().map(|c| if c == '\'' { '"' } else { c }).collect()
}

/// Parses a relaxed JSON pattern (single quotes accepted) into a document,
/// preserving key order. Integers that fit int32 become int32, larger ones
/// int64, and floats double.
pub fn pattern_from_str(pattern: &str) -> Result<Document, PatternError> {
    let double_quoted = single_quotes_to_double(pattern);
    let value: Value = match serde_json::from_str(&double_quoted) {
        Err(error) => return Err(PatternError::ParseJsonError(error)),
        Ok(value) => value,
    };
    match json_value_to_bson(&value) {
        Bson::Document(document) => Ok(document),
        _ => Err(PatternError::NotADocument),
    }
}

fn json_value_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(value) => Bson::Boolean(*value),
        Value::Number(number) => match number.as_i64() {
            Some(int) => {
                if int >= std::i32::MIN as i64 && int <= std::i32::MAX as i64 {
                    Bson::Int32(int as i32)
                } else {
                    Bson::Int64(int)
                }
            }
            None => match number.as_f64() {
                Some(float) => Bson::Double(float),
                None => Bson::Double(std::f64::NAN),
            },
        },
        Value::String(value) => Bson::String(value.clone()),
        Value::Array(values) => Bson::Array(values.iter().map(json_value_to_bson).collect()),
        Value::Object(map) => {
            let mut document = Document::new();
            for (key, value) in map {
                document.insert(key.clone(), json_value_to_bson(value));
            }
            Bson::Document(document)
        }
    }
}

/// Matches a document against a relaxed JSON pattern, with lax numeric
/// comparison. An empty pattern string means `{}`. On mismatch the
/// document, pattern and error trail go to stderr. Panics when the pattern
/// itself does not parse; that is a broken test, not a mismatch.
pub fn match_json(doc: Option<&Document>, is_command: bool, pattern_json: &str) -> bool {
    let pattern_json = if pattern_json.is_empty() {
        "{}"
    } else {
        pattern_json
    };
    let pattern = match pattern_from_str(pattern_json) {
        Err(error) => panic!("couldn't parse JSON {:?}: {:?}", pattern_json, error),
        Ok(pattern) => pattern,
    };
    let mut ctx = MatchContext::new();
    ctx.is_command = is_command;
    let matches = match_document(doc, &pattern, &mut ctx);
    if !matches {
        eprintln!(
            "match failed:\ndocument: {}\npattern : {}\nerror   : {}",
            doc.map(|doc| doc.to_string())
                .unwrap_or_else(|| String::from("{}")),
            pattern,
            ctx.errmsg
        );
    }
    matches
}

/// Asserting form of `match_bson`; panics with the error trail on mismatch.
pub fn assert_match_bson(doc: Option<&Document>, pattern: &Document, is_command: bool) {
    let mut ctx = MatchContext::new();
    ctx.strict_numeric_types = true;
    ctx.is_command = is_command;
    if !match_document(doc, pattern, &mut ctx) {
        panic!(
            "match failed:\ndocument: {}\npattern : {}\nerror   : {}",
            doc.map(|doc| doc.to_string())
                .unwrap_or_else(|| String::from("{}")),
            pattern,
            ctx.errmsg
        );
    }
}

#[cfg(test)]
mod json_tests {
    use bson::{doc, Bson};

    use crate::matcher::json::{
        assert_match_bson, match_json, pattern_from_str, single_quotes_to_double, PatternError,
    };

    #[test]
    fn test_single_quotes_to_double() {
        assert_eq!(
            single_quotes_to_double("{'ping': 1, 'msg': 'isdbgrid'}"),
            "{\"ping\": 1, \"msg\": \"isdbgrid\"}"
        );
    }

    #[test]
    fn test_pattern_from_str_numeric_mapping() {
        let pattern = pattern_from_str("{'a': 1, 'b': 5000000000, 'c': 1.5}").unwrap();
        assert_eq!(pattern.get("a"), Some(&Bson::Int32(1)));
        assert_eq!(pattern.get("b"), Some(&Bson::Int64(5_000_000_000)));
        assert_eq!(pattern.get("c"), Some(&Bson::Double(1.5)));
    }

    #[test]
    fn test_pattern_from_str_preserves_key_order() {
        let pattern = pattern_from_str("{'z': 1, 'a': 2, 'm': 3}").unwrap();
        let keys: Vec<&str> = pattern.keys().map(|key| key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_pattern_from_str_nested() {
        let pattern = pattern_from_str("{'a': {'b': [1, 'two', null, true]}}").unwrap();
        assert_eq!(
            pattern,
            doc! { "a": { "b": [1, "two", Bson::Null, true] } }
        );
    }

    #[test]
    fn test_pattern_from_str_parse_error() {
        match pattern_from_str("{'a': }") {
            Err(PatternError::ParseJsonError(_)) => (),
            other => panic!("expected ParseJsonError, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_from_str_not_a_document() {
        match pattern_from_str("[1, 2]") {
            Err(PatternError::NotADocument) => (),
            other => panic!("expected NotADocument, got {:?}", other),
        }
    }

    #[test]
    fn test_match_json_empty_pattern() {
        assert!(match_json(Some(&doc! { "a": 1 }), false, ""));
        assert!(match_json(None, false, ""));
        assert!(match_json(None, false, "{}"));
    }

    #[test]
    fn test_match_json_absent_document() {
        assert!(!match_json(None, false, "{'a': 1}"));
    }

    #[test]
    fn test_match_json_is_lax_about_numeric_types() {
        assert!(match_json(Some(&doc! { "n": 5_i64 }), false, "{'n': 5}"));
    }

    #[test]
    fn test_match_json_command() {
        assert!(match_json(
            Some(&doc! { "isMaster": 1 }),
            true,
            "{'ismaster': 1}"
        ));
    }

    #[test]
    #[should_panic]
    fn test_match_json_bad_pattern_panics() {
        match_json(Some(&doc! {}), false, "{'a': }");
    }

    #[test]
    fn test_assert_match_bson_passes() {
        assert_match_bson(Some(&doc! { "a": 1, "b": 2 }), &doc! { "a": 1 }, false);
    }

    #[test]
    #[should_panic]
    fn test_assert_match_bson_panics_on_mismatch() {
        assert_match_bson(Some(&doc! { "a": 1 }), &doc! { "a": 2 }, false);
    }
}
