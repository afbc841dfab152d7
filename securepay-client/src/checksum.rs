//! Checksum signing and verification for gateway field sets.
//!
//! A checksum is the lowercase hex HMAC-SHA256 of the field values joined
//! with `|` in ascending key order. The same canonical form is used for
//! outgoing requests and for responses and callbacks from the gateway.

use std::borrow::Cow;
use std::io;

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Key of the nested structure that needs legacy re-rendering before signing.
pub const PARAMS_FIELD: &str = "params";

/// Key under which the gateway sends the checksum in callbacks.
pub const CHECKSUM_FIELD: &str = "checksum";

/// Computes the checksum of `fields` with `token` as the HMAC key.
///
/// Insertion order of `fields` does not matter; values are joined in
/// byte-wise ascending key order.
pub fn generate_checksum<I, K, V>(fields: I, token: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = fields.into_iter().collect();
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    let canonical = pairs
        .iter()
        .map(|(_, value)| value.as_ref())
        .collect::<Vec<_>>()
        .join("|");

    sign(canonical.as_bytes(), token)
}

/// Verifies a gateway result against `expected` using `token`.
///
/// A non-blank `params` entry is replaced by its legacy rendering (see
/// [`legacy_params`]) before the checksum is recomputed.
pub fn verify_checksum_with_token(
    result: &Map<String, Value>,
    expected: &str,
    token: &str,
) -> bool {
    let mut fields: Vec<(&str, Cow<'_, str>)> = Vec::with_capacity(result.len());
    for (key, value) in result {
        let rendered = if key == PARAMS_FIELD && !is_blank(value) {
            Cow::Owned(legacy_params(value))
        } else {
            render_value(value)
        };
        fields.push((key.as_str(), rendered));
    }

    let actual = generate_checksum(fields, token);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Verifies a callback that carries its own `checksum` field.
///
/// The checksum entry is excluded from the signed set. Returns false when it
/// is missing or not a string.
pub fn verify_callback(fields: &Map<String, Value>, token: &str) -> bool {
    let Some(expected) = fields.get(CHECKSUM_FIELD).and_then(Value::as_str) else {
        return false;
    };

    let mut signed = fields.clone();
    signed.remove(CHECKSUM_FIELD);
    verify_checksum_with_token(&signed, expected, token)
}

/// Renders a nested `params` value the way the gateway signs it.
///
/// The value is encoded as compact JSON with `/` and non-ASCII characters
/// escaped, then every `":"` becomes `"=>"` and every `","` becomes `", "`.
pub fn legacy_params(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, EscapingFormatter);
    // Writing a Value into a Vec cannot fail.
    let _ = value.serialize(&mut ser);

    String::from_utf8_lossy(&buf)
        .replace("\":\"", "\"=>\"")
        .replace("\",\"", "\", \"")
}

fn sign(payload: &[u8], token: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(token.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Null, whitespace-only strings and empty collections count as blank.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null | Value::Bool(false) => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("1"),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Cow::Owned(render_float(f)),
            _ => Cow::Owned(n.to_string()),
        },
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Renders a float with 14 significant digits, trailing zeros dropped.
///
/// Exponents below -4 or from 14 upwards switch to `1.5E+20` notation, and a
/// bare mantissa gains `.0` (`1.0E-5`).
fn render_float(f: f64) -> String {
    const PRECISION: i32 = 14;

    if f.is_nan() {
        return "NAN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF".into() } else { "-INF".into() };
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".into() } else { "0".into() };
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, f);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let mut mantissa = trim_fraction(mantissa).to_string();
        if !mantissa.contains('.') {
            mantissa.push_str(".0");
        }
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}E{}{}", mantissa, sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy JSON escaping
// ─────────────────────────────────────────────────────────────────────────────

/// Compact formatter that also escapes `/` and every non-ASCII character
/// as `\uXXXX` (UTF-16 code units, lowercase hex).
struct EscapingFormatter;

impl serde_json::ser::Formatter for EscapingFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch != '/' && ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            if ch == '/' {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    const TOKEN: &str = "checksum-token";

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_known_vector() {
        let fields = [("b", "2"), ("a", "1")];
        assert_eq!(
            generate_checksum(fields, "secret"),
            "bf8be26b9f27b10cd3394683e53ff339a0b8a2f5450c2260eb655f2cfd1e78f7"
        );
    }

    #[test]
    fn test_payment_vector() {
        let mut fields = BTreeMap::new();
        fields.insert("uid".to_string(), "u-1".to_string());
        fields.insert("transaction_amount".to_string(), "10.00".to_string());
        fields.insert("buyer_name".to_string(), "Alice".to_string());
        fields.insert("order_number".to_string(), "ORD-1".to_string());
        fields.insert("buyer_email".to_string(), "alice@example.com".to_string());

        assert_eq!(
            generate_checksum(&fields, TOKEN),
            "d20b632a26e077494a64240d9bbd784d6fc91ec498157618b560ecb76bc7b0bc"
        );
    }

    #[test]
    fn test_empty_field_set() {
        let fields: [(&str, &str); 0] = [];
        assert_eq!(
            generate_checksum(fields, "k"),
            "8bb990c40a7d61cb97597a942125025be50ac8beb74436e3735b98893a7f6620"
        );
    }

    #[test]
    fn test_checksum_is_order_independent() {
        let forward = [("alpha", "1"), ("beta", "2"), ("gamma", "3")];
        let backward = [("gamma", "3"), ("alpha", "1"), ("beta", "2")];

        let first = generate_checksum(forward, TOKEN);
        assert_eq!(first, generate_checksum(forward, TOKEN));
        assert_eq!(first, generate_checksum(backward, TOKEN));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_keys_sort_bytewise() {
        // Uppercase sorts before lowercase.
        let fields = [("b", "lower"), ("B", "upper")];
        let expected = sign(b"upper|lower", TOKEN);
        assert_eq!(generate_checksum(fields, TOKEN), expected);
    }

    #[test]
    fn test_single_value_change_alters_checksum() {
        let base = [("amount", "10.00"), ("order", "ORD-1")];
        let changed = [("amount", "10.01"), ("order", "ORD-1")];
        assert_ne!(generate_checksum(base, TOKEN), generate_checksum(changed, TOKEN));
        assert_ne!(generate_checksum(base, TOKEN), generate_checksum(base, "other"));
    }

    #[test]
    fn test_verify_round_trip() {
        let result = object(json!({
            "order_number": "ORD-1",
            "payment_status": "true",
            "transaction_amount": "10.00",
        }));
        let fields: Vec<(&String, String)> = result
            .iter()
            .map(|(k, v)| (k, v.as_str().unwrap().to_string()))
            .collect();
        let checksum = generate_checksum(fields, TOKEN);

        assert!(verify_checksum_with_token(&result, &checksum, TOKEN));
        assert!(!verify_checksum_with_token(&result, &checksum.to_uppercase(), TOKEN));
        assert!(!verify_checksum_with_token(&result, &checksum, "wrong"));
    }

    #[test]
    fn test_legacy_params_substitution() {
        let params = json!({"a": "1", "b": "2"});
        assert_eq!(legacy_params(&params), r#"{"a"=>"1", "b"=>"2"}"#);
    }

    #[test]
    fn test_legacy_params_nested_and_escaped() {
        let params = json!({"url": "https://x.my/cb", "name": "Zoë", "n": 5, "list": ["x","y"]});
        assert_eq!(
            legacy_params(&params),
            r#"{"url"=>"https:\/\/x.my\/cb", "name"=>"Zo\u00eb", "n":5,"list":["x", "y"]}"#
        );
    }

    #[test]
    fn test_verify_with_params() {
        let result = object(json!({
            "status": "paid",
            "order_number": "ORD-9",
            "params": {"a": "1", "b": "2"},
            "amount": "10.00",
        }));
        let expected = "bf3725d90f9bc48c30aea01059d26f9c71c6b487b7907ffad276b8f9fc056d73";

        assert!(verify_checksum_with_token(&result, expected, TOKEN));
    }

    #[test]
    fn test_blank_params_are_signed_as_empty() {
        let result = object(json!({"order_number": "ORD-1", "params": null}));
        let checksum = generate_checksum([("order_number", "ORD-1"), ("params", "")], TOKEN);
        assert!(verify_checksum_with_token(&result, &checksum, TOKEN));

        let result = object(json!({"order_number": "ORD-1", "params": {}}));
        assert!(is_blank(&result["params"]));
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(render_value(&json!(true)), "1");
        assert_eq!(render_value(&json!(false)), "");
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(10.0)), "10");
        assert_eq!(render_value(&json!(10.5)), "10.5");
        assert_eq!(render_value(&json!(-2.5)), "-2.5");
    }

    #[test]
    fn test_float_rendering_uses_fourteen_digits() {
        assert_eq!(render_float(0.1 + 0.2), "0.3");
        assert_eq!(render_float(1e20), "1.0E+20");
        assert_eq!(render_float(1.5e20), "1.5E+20");
        assert_eq!(render_float(1e15), "1.0E+15");
        assert_eq!(render_float(1e-5), "1.0E-5");
        assert_eq!(render_float(0.0001), "0.0001");
        assert_eq!(render_float(123.456), "123.456");
        assert_eq!(render_float(0.0), "0");
    }

    #[test]
    fn test_verify_callback() {
        let fields = [("order_number", "ORD-1"), ("payment_status", "true")];
        let checksum = generate_checksum(fields, TOKEN);
        let mut callback = object(json!({
            "order_number": "ORD-1",
            "payment_status": "true",
        }));
        callback.insert(CHECKSUM_FIELD.into(), Value::String(checksum));

        assert!(verify_callback(&callback, TOKEN));

        callback.insert("payment_status".into(), json!("false"));
        assert!(!verify_callback(&callback, TOKEN));

        callback.remove(CHECKSUM_FIELD);
        assert!(!verify_callback(&callback, TOKEN));
    }
}
