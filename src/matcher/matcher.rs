use bson::spec::ElementType;
use bson::{Bson, Document};

use crate::matcher::context::{MatchAction, MatchContext};

/// Does `doc` match `pattern`?
///
/// `doc` matches `pattern` if its key-value pairs are a simple superset of
/// pattern's. Order matters for arrays, not for document keys. The first
/// key matches case-insensitively when `is_command`. Numeric kinds must
/// match exactly; use `match_document` with your own context for laxer
/// semantics.
pub fn match_bson(doc: Option<&Document>, pattern: &Document, is_command: bool) -> bool {
    let mut ctx = MatchContext::new();
    ctx.strict_numeric_types = true;
    ctx.is_command = is_command;
    match_document(doc, pattern, &mut ctx)
}

/// Pattern-driven recursive descent: only keys present in the pattern are
/// checked, extra keys in the actual document are ignored. An absent
/// document only matches an empty pattern. The first mismatch
/// short-circuits and leaves a description in `ctx.errmsg` with the
/// breadcrumb of keys in `ctx.path`.
///
/// Special pattern forms:
///   "field": {"$exists": true/false}
///   "field": {"$empty": true/false}
///   "field": {"$$type": "type alias"}
///   "field": null        (matches a null or absent value)
pub fn match_document(doc: Option<&Document>, pattern: &Document, ctx: &mut MatchContext) -> bool {
    if pattern.is_empty() {
        // an empty pattern matches anything, even an absent document
        return true;
    }
    let doc = match doc {
        Some(doc) => doc,
        None => {
            ctx.fail(String::from("document absent"));
            return false;
        }
    };
    let mut is_first = true;
    for (key, pattern_value) in pattern.iter() {
        let doc_value = find(doc, key, ctx.is_command && is_first, ctx.retain_dots_in_keys);
        let saved_path = ctx.push_path(key);
        let matched = match_field(key, pattern_value, doc_value, ctx);
        ctx.truncate_path(saved_path);
        if !matched {
            return false;
        }
        is_first = false;
    }
    true
}

fn match_field(
    key: &str,
    pattern_value: &Bson,
    doc_value: Option<&Bson>,
    ctx: &mut MatchContext,
) -> bool {
    let action = match ctx.visitor.as_mut() {
        Some(visitor) => visitor(key, pattern_value, doc_value),
        None => MatchAction::Continue,
    };
    match action {
        MatchAction::Abort => {
            if ctx.errmsg.is_empty() {
                ctx.fail(String::from("aborted by visitor"));
            }
            return false;
        }
        MatchAction::Skip => return true,
        MatchAction::Continue => (),
    }

    // pattern has "key": null; "key" may be null or absent in the doc
    if let Bson::Null = pattern_value {
        if let Some(value) = doc_value {
            if value.element_type() != ElementType::Null {
                ctx.fail(format!("{} should be null or absent", key));
                return false;
            }
        }
        return true;
    }

    if let Some(exists) = get_exists_operator(pattern_value) {
        if exists != doc_value.is_some() {
            ctx.fail(format!(
                "{}found",
                if doc_value.is_some() { "" } else { "not " }
            ));
            return false;
        }
        return true;
    }

    let doc_value = match doc_value {
        Some(value) => value,
        None => {
            ctx.fail(String::from("not found"));
            return false;
        }
    };

    if let Some(empty) = get_empty_operator(pattern_value) {
        if empty != is_empty_doc_or_array(doc_value) {
            ctx.fail(format!("{}found", if empty { "" } else { "not " }));
            return false;
        }
        return true;
    }

    if let Some(expected_type) = get_type_operator(pattern_value) {
        if doc_value.element_type() != expected_type {
            ctx.fail(String::from("incorrect type"));
            return false;
        }
        return true;
    }

    match_value(Some(doc_value), pattern_value, ctx)
}

/// Compares a single value against a pattern value. Placeholders and
/// numeric laxity apply here; documents and arrays recurse with the same
/// context.
pub fn match_value(doc_value: Option<&Bson>, pattern_value: &Bson, ctx: &mut MatchContext) -> bool {
    let doc_value = match doc_value {
        Some(value) => value,
        None => {
            ctx.fail(String::from("not found"));
            return false;
        }
    };

    if ctx.allow_placeholders && is_placeholder(pattern_value) {
        return true;
    }

    if is_number_type(doc_value) && is_number_type(pattern_value) && !ctx.strict_numeric_types {
        let doc_int64 = value_as_int64(doc_value);
        let pattern_int64 = value_as_int64(pattern_value);
        if doc_int64 != pattern_int64 {
            ctx.fail(format!("expected {}, got {}", pattern_int64, doc_int64));
            return false;
        }
        return true;
    }

    if doc_value.element_type() != pattern_value.element_type() {
        ctx.fail(format!(
            "expected type {}, got {}",
            bson_type_name(pattern_value.element_type()),
            bson_type_name(doc_value.element_type())
        ));
        return false;
    }

    match (doc_value, pattern_value) {
        (Bson::Document(document), Bson::Document(pattern)) => {
            let was_command = ctx.is_command;
            ctx.is_command = false;
            let matched = match_document(Some(document), pattern, ctx);
            ctx.is_command = was_command;
            matched
        }
        (Bson::Array(elements), Bson::Array(patterns)) => match_arrays(elements, patterns, ctx),
        (Bson::Double(doc), Bson::Double(pattern)) => {
            if doc != pattern {
                ctx.fail(format!("expected {}, got {}", pattern, doc));
                return false;
            }
            true
        }
        (Bson::Int32(doc), Bson::Int32(pattern)) => {
            if doc != pattern {
                ctx.fail(format!("expected {}, got {}", pattern, doc));
                return false;
            }
            true
        }
        (Bson::Int64(doc), Bson::Int64(pattern)) => {
            if doc != pattern {
                ctx.fail(format!("expected {}, got {}", pattern, doc));
                return false;
            }
            true
        }
        (Bson::String(doc), Bson::String(pattern)) => {
            if doc != pattern {
                ctx.fail(format!("expected \"{}\", got \"{}\"", pattern, doc));
                return false;
            }
            true
        }
        (Bson::Boolean(doc), Bson::Boolean(pattern)) => {
            if doc != pattern {
                ctx.fail(format!("expected {}, got {}", pattern, doc));
                return false;
            }
            true
        }
        (Bson::DateTime(doc), Bson::DateTime(pattern)) => {
            if doc != pattern {
                ctx.fail(format!(
                    "expected {}, got {}",
                    pattern.timestamp_millis(),
                    doc.timestamp_millis()
                ));
                return false;
            }
            true
        }
        (Bson::RegularExpression(doc), Bson::RegularExpression(pattern)) => {
            // pattern and options compare independently
            if doc.pattern != pattern.pattern || doc.options != pattern.options {
                ctx.fail(String::from("REGEX values mismatch"));
                return false;
            }
            true
        }
        (Bson::Timestamp(doc), Bson::Timestamp(pattern)) => {
            if doc.time != pattern.time || doc.increment != pattern.increment {
                ctx.fail(String::from("TIMESTAMP values mismatch"));
                return false;
            }
            true
        }
        (Bson::Binary(doc), Bson::Binary(pattern)) => {
            if doc.subtype != pattern.subtype || doc.bytes != pattern.bytes {
                ctx.fail(String::from("BINARY values mismatch"));
                return false;
            }
            true
        }
        (Bson::ObjectId(doc), Bson::ObjectId(pattern)) => {
            if doc != pattern {
                ctx.fail(String::from("OID values mismatch"));
                return false;
            }
            true
        }
        (Bson::Symbol(doc), Bson::Symbol(pattern)) => {
            if doc != pattern {
                ctx.fail(String::from("SYMBOL values mismatch"));
                return false;
            }
            true
        }
        (Bson::JavaScriptCode(doc), Bson::JavaScriptCode(pattern)) => {
            if doc != pattern {
                ctx.fail(String::from("CODE values mismatch"));
                return false;
            }
            true
        }
        (Bson::JavaScriptCodeWithScope(doc), Bson::JavaScriptCodeWithScope(pattern)) => {
            if doc.code != pattern.code || doc.scope != pattern.scope {
                ctx.fail(String::from("CODEWSCOPE values mismatch"));
                return false;
            }
            true
        }
        (Bson::Decimal128(doc), Bson::Decimal128(pattern)) => {
            if doc != pattern {
                ctx.fail(String::from(
                    "DECIMAL128 is not an exact binary match (though numeric values may be equal)",
                ));
                return false;
            }
            true
        }
        (Bson::DbPointer(doc), Bson::DbPointer(pattern)) => {
            if doc != pattern {
                ctx.fail(String::from("DBPOINTER values mismatch"));
                return false;
            }
            true
        }
        // empty types; two values of the same type are equal
        (Bson::Null, Bson::Null)
        | (Bson::Undefined, Bson::Undefined)
        | (Bson::MinKey, Bson::MinKey)
        | (Bson::MaxKey, Bson::MaxKey) => true,
        _ => {
            if doc_value != pattern_value {
                ctx.fail(format!(
                    "{} values mismatch",
                    bson_type_name(pattern_value.element_type())
                ));
                return false;
            }
            true
        }
    }
}

/// Arrays compare element by element in order; length must match exactly.
fn match_arrays(elements: &[Bson], patterns: &[Bson], ctx: &mut MatchContext) -> bool {
    if elements.len() != patterns.len() {
        ctx.fail(format!(
            "expected {} keys, not {}",
            patterns.len(),
            elements.len()
        ));
        return false;
    }
    for (index, (element, pattern)) in elements.iter().zip(patterns.iter()).enumerate() {
        let key = index.to_string();
        let saved_path = ctx.push_path(&key);
        let action = match ctx.visitor.as_mut() {
            Some(visitor) => visitor(&key, pattern, Some(element)),
            None => MatchAction::Continue,
        };
        let matched = match action {
            MatchAction::Abort => {
                if ctx.errmsg.is_empty() {
                    ctx.fail(String::from("aborted by visitor"));
                }
                false
            }
            MatchAction::Skip => true,
            MatchAction::Continue => match_value(Some(element), pattern, ctx),
        };
        ctx.truncate_path(saved_path);
        if !matched {
            return false;
        }
    }
    true
}

/// Finds the value for a key. A dotted key indicates a path into nested
/// documents (and arrays, for numeric segments) unless dots are retained;
/// a missing intermediate segment means the value is absent.
fn find<'a>(
    doc: &'a Document,
    key: &str,
    case_insensitive: bool,
    retain_dots: bool,
) -> Option<&'a Bson> {
    if !retain_dots && key.contains('.') {
        return find_descendant(doc, key);
    }
    if case_insensitive {
        return doc
            .iter()
            .find(|(doc_key, _)| doc_key.eq_ignore_ascii_case(key))
            .map(|(_, value)| value);
    }
    doc.get(key)
}

fn find_descendant<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut value = doc.get(first)?;
    for segment in segments {
        value = match value {
            Bson::Document(sub) => sub.get(segment)?,
            Bson::Array(elements) => elements.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn operator_value<'a>(value: &'a Bson, name: &str) -> Option<&'a Bson> {
    match value {
        Bson::Document(document) => document.get(name),
        _ => None,
    }
}

/// Is value a subdocument like {"$exists": bool}?
fn get_exists_operator(value: &Bson) -> Option<bool> {
    operator_value(value, "$exists").map(value_as_bool)
}

/// Is value a subdocument like {"$empty": bool}?
fn get_empty_operator(value: &Bson) -> Option<bool> {
    operator_value(value, "$empty").map(value_as_bool)
}

/// Is value a subdocument like {"$$type": "type alias"}?
fn get_type_operator(value: &Bson) -> Option<ElementType> {
    let alias = operator_value(value, "$$type")?;
    match alias {
        Bson::String(alias) => Some(element_type_for_alias(alias)),
        other => panic!("$$type requires a string alias, got {:?}", other),
    }
}

fn value_as_bool(value: &Bson) -> bool {
    match value {
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        _ => false,
    }
}

/// @see list of aliases on https://www.mongodb.com/docs/manual/reference/bson-types/
fn element_type_for_alias(alias: &str) -> ElementType {
    match alias.to_ascii_lowercase().as_str() {
        "double" => ElementType::Double,
        "string" => ElementType::String,
        "object" => ElementType::EmbeddedDocument,
        "array" => ElementType::Array,
        "bindata" => ElementType::Binary,
        "undefined" => ElementType::Undefined,
        "objectid" => ElementType::ObjectId,
        "bool" => ElementType::Boolean,
        "date" => ElementType::DateTime,
        "null" => ElementType::Null,
        "regex" => ElementType::RegularExpression,
        "dbpointer" => ElementType::DbPointer,
        "javascript" => ElementType::JavaScriptCode,
        "symbol" => ElementType::Symbol,
        "javascriptwithscope" => ElementType::JavaScriptCodeWithScope,
        "int" => ElementType::Int32,
        "timestamp" => ElementType::Timestamp,
        "long" => ElementType::Int64,
        "decimal" => ElementType::Decimal128,
        "minkey" => ElementType::MinKey,
        "maxkey" => ElementType::MaxKey,
        _ => panic!("unrecognized $$type value: {}", alias),
    }
}

fn is_empty_doc_or_array(value: &Bson) -> bool {
    match value {
        Bson::Document(document) => document.is_empty(),
        Bson::Array(elements) => elements.is_empty(),
        _ => false,
    }
}

fn is_number_type(value: &Bson) -> bool {
    match value {
        Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_) => true,
        _ => false,
    }
}

fn value_as_int64(value: &Bson) -> i64 {
    match value {
        Bson::Double(value) => *value as i64,
        Bson::Int32(value) => *value as i64,
        Bson::Int64(value) => *value,
        other => panic!("value_as_int64 called on value of type {:?}", other),
    }
}

/// The change streams spec tests use the value 42 as a placeholder.
fn is_placeholder(pattern: &Bson) -> bool {
    if is_number_type(pattern) && value_as_int64(pattern) == 42 {
        return true;
    }
    match pattern {
        Bson::String(value) => value == "42",
        _ => false,
    }
}

fn bson_type_name(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::Double => "DOUBLE",
        ElementType::String => "UTF8",
        ElementType::EmbeddedDocument => "DOCUMENT",
        ElementType::Array => "ARRAY",
        ElementType::Binary => "BINARY",
        ElementType::Undefined => "UNDEFINED",
        ElementType::ObjectId => "OID",
        ElementType::Boolean => "BOOL",
        ElementType::DateTime => "DATE_TIME",
        ElementType::Null => "NULL",
        ElementType::RegularExpression => "REGEX",
        ElementType::DbPointer => "DBPOINTER",
        ElementType::JavaScriptCode => "CODE",
        ElementType::Symbol => "SYMBOL",
        ElementType::JavaScriptCodeWithScope => "CODEWSCOPE",
        ElementType::Int32 => "INT32",
        ElementType::Timestamp => "TIMESTAMP",
        ElementType::Int64 => "INT64",
        ElementType::Decimal128 => "DECIMAL128",
        ElementType::MinKey => "MINKEY",
        ElementType::MaxKey => "MAXKEY",
    }
}
