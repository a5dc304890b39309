//! Indented rendering of JSON payloads for operator diagnostics.
//!
//! The layout puts every object entry and array element on its own line,
//! indented by four spaces per nesting level, with `"key" : value` pairs and
//! `,` line separators. Key order follows the input document.
//!
//! The output is valid JSON and parses back to the same value.

use std::fmt::Write as _;

use serde_json::Value;

/// Spaces added per nesting level.
const INDENT_WIDTH: usize = 4;

/// Parse a raw frame payload as a JSON value.
pub fn decode(payload: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Render a value in the indented diagnostic layout, newline-terminated.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out.push('\n');
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, child)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, depth + 1);
                push_quoted(out, key);
                out.push_str(" : ");
                write_value(out, child, depth + 1);
            }
            out.push('\n');
            push_indent(out, depth);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, child) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, depth + 1);
                write_value(out, child, depth + 1);
            }
            out.push('\n');
            push_indent(out, depth);
            out.push(']');
        }
        Value::String(s) => push_quoted(out, s),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
    }
}

fn push_indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth * INDENT_WIDTH));
}

/// Append `s` as a JSON string literal (quoted and escaped).
fn push_quoted(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        // Serializing a str is infallible; keep the text visible regardless.
        Err(_) => {
            let _ = write!(out, "{s:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Number, json};

    #[test]
    fn renders_nested_object_and_array() {
        let value = decode(br#"{"a":1,"b":[true,null]}"#).unwrap();
        let expected = "{\n    \"a\" : 1,\n    \"b\" : [\n        true,\n        null\n    ]\n}\n";
        assert_eq!(render(&value), expected);
    }

    #[test]
    fn preserves_key_order_from_input() {
        let value = decode(br#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        let out = render(&value);
        let zeta = out.find("\"zeta\"").unwrap();
        let alpha = out.find("\"alpha\"").unwrap();
        let mid = out.find("\"mid\"").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn scalars_render_on_one_line() {
        assert_eq!(render(&json!(42)), "42\n");
        assert_eq!(render(&json!(-7)), "-7\n");
        assert_eq!(render(&json!(1.5)), "1.5\n");
        assert_eq!(render(&json!(true)), "true\n");
        assert_eq!(render(&json!(false)), "false\n");
        assert_eq!(render(&Value::Null), "null\n");
        assert_eq!(render(&json!("hi")), "\"hi\"\n");
    }

    #[test]
    fn large_unsigned_integer_kept_exact() {
        let value = decode(b"18446744073709551615").unwrap();
        assert_eq!(render(&value), "18446744073709551615\n");
    }

    #[test]
    fn strings_and_keys_are_escaped() {
        let value = json!({"line\nbreak": "say \"hi\"\t"});
        assert_eq!(
            render(&value),
            "{\n    \"line\\nbreak\" : \"say \\\"hi\\\"\\t\"\n}\n"
        );
    }

    #[test]
    fn empty_collections_stay_inline() {
        assert_eq!(render(&json!({})), "{}\n");
        assert_eq!(render(&json!([])), "[]\n");
        assert_eq!(
            render(&json!({"a": [], "b": {}})),
            "{\n    \"a\" : [],\n    \"b\" : {}\n}\n"
        );
    }

    #[test]
    fn three_levels_of_nesting() {
        let value = decode(br#"[[{"k":"v"}]]"#).unwrap();
        let expected = "[\n    [\n        {\n            \"k\" : \"v\"\n        }\n    ]\n]\n";
        assert_eq!(render(&value), expected);
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(decode(b"not-json").is_err());
        assert!(decode(b"").is_err());
        assert!(decode(b"{\"a\":").is_err());
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(decode(&[0x22, 0xff, 0xfe, 0x22]).is_err());
    }

    #[test]
    fn decode_accepts_surrounding_whitespace() {
        let value = decode(b"  \n[1, 2]\t").unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<u64>().prop_map(Value::from),
            // Quarter steps are exact in binary, so text round-trips bit-for-bit.
            any::<i32>().prop_filter_map("finite float", |m| {
                Number::from_f64(f64::from(m) / 4.0).map(Value::Number)
            }),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec((".{0,8}", inner), 0..6)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn rendering_parses_back_to_the_same_value(value in arb_json()) {
            let text = render(&value);
            let parsed = decode(text.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }

        #[test]
        fn every_line_is_indented_by_multiples_of_four(value in arb_json()) {
            let text = render(&value);
            for line in text.lines() {
                let leading = line.len() - line.trim_start_matches(' ').len();
                prop_assert_eq!(leading % INDENT_WIDTH, 0);
            }
        }
    }
}
