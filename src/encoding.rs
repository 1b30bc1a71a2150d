//! Canonical encoding of blocks and transactions for identity hashing
//!
//! An encoding is an ordered list of byte chunks, fed to the hash engine one
//! after another. Plain string fields are their UTF-8 bytes, integers are
//! their decimal text, and structured values (`extra_data`, the transaction
//! list) are first written as compact JSON text and then expanded one byte
//! per UTF-16 code unit, keeping the low 8 bits of each unit.
//!
//! The JSON step is order-sensitive and works on the records as stored:
//! document key order, unknown keys and explicit `null`s are all kept.
//! Numbers are written the way an ECMAScript engine prints them, so `1.0`
//! becomes `1` and `1e21` becomes `1e+21`.

use crate::block::{Block, HeaderSchema};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Number, Value};
use std::io;

pub type Chunks = Vec<Vec<u8>>;

/// Integers up to this magnitude convert to a double without loss.
const EXACT_INTEGER_LIMIT: u64 = 1 << 53;

/// Encode a block header together with its owning block's transaction list.
pub fn encode_block(block: &Block, schema: HeaderSchema) -> Result<Chunks> {
    let header = &block.header;
    let number = header.number;
    let missing = |field: &str| {
        LedgerError::EncodingFailure(format!("block {} header is missing {}", number, field))
    };

    let mut chunks = Chunks::with_capacity(10);
    for (name, field) in [
        ("parent_hash", &header.parent_hash),
        ("miner", &header.miner),
        ("state_root", &header.state_root),
        ("transactions_root", &header.transactions_root),
    ] {
        chunks.push(text(field.as_deref().ok_or_else(|| missing(name))?));
    }

    if schema == HeaderSchema::Difficulty {
        let difficulty = header.difficulty.ok_or_else(|| missing("difficulty"))?;
        let total_difficulty = header
            .total_difficulty
            .ok_or_else(|| missing("total_difficulty"))?;
        chunks.push(decimal(difficulty));
        chunks.push(decimal(total_difficulty));
    }

    chunks.push(decimal(number));
    chunks.push(decimal(header.timestamp.ok_or_else(|| missing("timestamp"))?));

    if schema == HeaderSchema::Difficulty {
        chunks.push(decimal(header.nonce.ok_or_else(|| missing("nonce"))?));
    }

    let extra_data = header.extra_data.as_ref().ok_or_else(|| missing("extra_data"))?;
    chunks.push(char_code_bytes(&to_json(extra_data, number, "extra_data")?));
    chunks.push(char_code_bytes(&to_json(&block.txs, number, "txs")?));

    Ok(chunks)
}

/// Encode a transaction as sender, receiver, value, nonce, v, r, s.
///
/// Address and signature fields must be strings. `value` and `nonce` are
/// written as text, numbers in their ECMAScript form.
pub fn encode_transaction(tx: &Transaction) -> Result<Chunks> {
    let mut chunks = Chunks::with_capacity(7);
    for name in ["sender", "receiver"] {
        chunks.push(string_field(tx, name)?);
    }
    for name in ["value", "nonce"] {
        chunks.push(scalar_field(tx, name)?);
    }
    for name in ["v", "r", "s"] {
        chunks.push(string_field(tx, name)?);
    }
    Ok(chunks)
}

/// One byte per UTF-16 code unit, truncated to its low 8 bits.
pub fn char_code_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().map(|unit| unit as u8).collect()
}

/// A JSON number as an ECMAScript engine prints it.
pub fn number_text(number: &Number) -> String {
    if let Some(n) = number.as_u64() {
        if n <= EXACT_INTEGER_LIMIT {
            return n.to_string();
        }
        return float_text(n as f64);
    }
    if let Some(n) = number.as_i64() {
        if n.unsigned_abs() <= EXACT_INTEGER_LIMIT {
            return n.to_string();
        }
        return float_text(n as f64);
    }
    number.as_f64().map(float_text).unwrap_or_else(|| number.to_string())
}

/// Shortest round-trip digits laid out per ECMAScript Number::toString.
fn float_text(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return "null".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return format!("{}{}", sign, scientific),
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let e = if e >= 0 { format!("+{}", e) } else { e.to_string() };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}", first, e)
        } else {
            format!("{}.{}e{}", first, rest, e)
        }
    };
    format!("{}{}", sign, body)
}

/// Compact JSON with ECMAScript number text.
struct ScriptFormatter;

impl Formatter for ScriptFormatter {
    fn write_i64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: i64) -> io::Result<()> {
        writer.write_all(number_text(&Number::from(value)).as_bytes())
    }

    fn write_u64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: u64) -> io::Result<()> {
        writer.write_all(number_text(&Number::from(value)).as_bytes())
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(float_text(value).as_bytes())
    }
}

fn transaction_field<'a>(tx: &'a Transaction, name: &str) -> Result<&'a Value> {
    tx.field(name)
        .ok_or_else(|| LedgerError::EncodingFailure(format!("transaction is missing {}", name)))
}

fn string_field(tx: &Transaction, name: &str) -> Result<Vec<u8>> {
    match transaction_field(tx, name)? {
        Value::String(s) => Ok(text(s)),
        _ => Err(LedgerError::EncodingFailure(format!(
            "transaction field {} is not a string",
            name
        ))),
    }
}

fn scalar_field(tx: &Transaction, name: &str) -> Result<Vec<u8>> {
    match transaction_field(tx, name)? {
        Value::Number(n) => Ok(number_text(n).into_bytes()),
        Value::String(s) => Ok(text(s)),
        Value::Bool(b) => Ok(decimal(b)),
        _ => Err(LedgerError::EncodingFailure(format!(
            "transaction field {} is not a scalar",
            name
        ))),
    }
}

fn text(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

fn decimal<T: ToString>(value: T) -> Vec<u8> {
    value.to_string().into_bytes()
}

fn to_json<T: Serialize + ?Sized>(value: &T, number: u64, what: &str) -> Result<String> {
    let failure = |e: &dyn std::fmt::Display| {
        LedgerError::EncodingFailure(format!("block {}: cannot serialize {}: {}", number, what, e))
    };
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, ScriptFormatter);
    value.serialize(&mut serializer).map_err(|e| failure(&e))?;
    String::from_utf8(out).map_err(|e| failure(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::transaction::Signature;
    use serde_json::json;

    fn sample_block() -> Block {
        let header =
            BlockHeader::new("0xparent", "0xminer", "0xstate", "0xroot", 7, 1700, json!(["x"]));
        let tx = Transaction::new("A", "B", 10, 1, Signature::new("27", "0xr", "0xs"));
        Block::new(header, vec![tx])
    }

    #[test]
    fn test_legacy_block_layout() {
        let chunks = encode_block(&sample_block(), HeaderSchema::Legacy).unwrap();
        let as_text: Vec<String> = chunks
            .iter()
            .map(|c| String::from_utf8(c.clone()).unwrap())
            .collect();
        assert_eq!(
            as_text,
            vec![
                "0xparent",
                "0xminer",
                "0xstate",
                "0xroot",
                "7",
                "1700",
                r#"["x"]"#,
                r#"[{"sender":"A","receiver":"B","value":10,"nonce":1,"v":"27","r":"0xr","s":"0xs"}]"#,
            ]
        );
    }

    #[test]
    fn test_difficulty_block_layout() {
        let mut block = sample_block();
        block.header = block.header.with_difficulty(3, 30, 99);
        let chunks = encode_block(&block, HeaderSchema::Difficulty).unwrap();
        assert_eq!(chunks.len(), 11);
        assert_eq!(chunks[4], b"3".to_vec());
        assert_eq!(chunks[5], b"30".to_vec());
        assert_eq!(chunks[6], b"7".to_vec());
        assert_eq!(chunks[7], b"1700".to_vec());
        assert_eq!(chunks[8], b"99".to_vec());
    }

    #[test]
    fn test_legacy_ignores_difficulty_fields() {
        let plain = sample_block();
        let mut extended = sample_block();
        extended.header = extended.header.with_difficulty(3, 30, 99);
        assert_eq!(
            encode_block(&plain, HeaderSchema::Legacy).unwrap(),
            encode_block(&extended, HeaderSchema::Legacy).unwrap()
        );
    }

    #[test]
    fn test_difficulty_schema_requires_fields() {
        let err = encode_block(&sample_block(), HeaderSchema::Difficulty).unwrap_err();
        assert_eq!(
            err,
            LedgerError::EncodingFailure("block 7 header is missing difficulty".to_string())
        );
    }

    #[test]
    fn test_missing_header_field_fails_fast() {
        let mut block = sample_block();
        block.header.miner = None;
        let err = encode_block(&block, HeaderSchema::Legacy).unwrap_err();
        assert!(matches!(err, LedgerError::EncodingFailure(ref msg) if msg.contains("miner")));
    }

    #[test]
    fn test_missing_extra_data_differs_from_null() {
        let mut block = sample_block();
        block.header.extra_data = Some(serde_json::Value::Null);
        let chunks = encode_block(&block, HeaderSchema::Legacy).unwrap();
        assert_eq!(chunks[6], b"null".to_vec());

        block.header.extra_data = None;
        assert!(encode_block(&block, HeaderSchema::Legacy).is_err());
    }

    #[test]
    fn test_extra_data_keeps_key_order() {
        let mut block = sample_block();
        block.header.extra_data = Some(serde_json::from_str(r#"{"z":1,"a":2}"#).unwrap());
        let chunks = encode_block(&block, HeaderSchema::Legacy).unwrap();
        assert_eq!(chunks[6], br#"{"z":1,"a":2}"#.to_vec());
    }

    #[test]
    fn test_char_code_expansion_is_not_utf8() {
        assert_eq!(char_code_bytes("ab"), vec![b'a', b'b']);
        // U+00E9 is two bytes in UTF-8 but a single code unit here
        assert_eq!(char_code_bytes("\u{e9}"), vec![0xe9]);
        // U+20AC keeps only its low byte
        assert_eq!(char_code_bytes("\u{20ac}"), vec![0xac]);
        // astral characters expand to both surrogate halves
        assert_eq!(char_code_bytes("\u{1f980}"), vec![0x3e, 0x80]);
    }

    #[test]
    fn test_transaction_layout() {
        let tx = Transaction::new("A", "B", 10, 1, Signature::new("v", "r", "s"));
        let chunks = encode_transaction(&tx).unwrap();
        assert_eq!(chunks.concat(), b"AB101vrs".to_vec());
    }

    #[test]
    fn test_transaction_missing_nonce() {
        let mut tx = Transaction::new("A", "B", 10, 1, Signature::new("v", "r", "s"));
        tx.remove_field("nonce");
        assert_eq!(
            encode_transaction(&tx).unwrap_err(),
            LedgerError::EncodingFailure("transaction is missing nonce".to_string())
        );
    }

    #[test]
    fn test_transaction_list_is_encoded_as_stored() {
        let stored = r#"[{"sender":"A","receiver":"B","value":10,"v":"27","r":"0xr","s":"0xs","nonce":1,"hash":"abc","memo":null}]"#;
        let mut block = sample_block();
        block.txs = serde_json::from_str(stored).unwrap();
        let chunks = encode_block(&block, HeaderSchema::Legacy).unwrap();
        assert_eq!(chunks[7], stored.as_bytes().to_vec());
    }

    #[test]
    fn test_numbers_use_script_text() {
        let mut block = sample_block();
        block.header.extra_data = Some(
            serde_json::from_str(r#"{"gas":1.0,"big":1e21,"small":1.5e-7,"neg":-0.5,"max":18446744073709551615}"#)
                .unwrap(),
        );
        let chunks = encode_block(&block, HeaderSchema::Legacy).unwrap();
        assert_eq!(
            String::from_utf8(chunks[6].clone()).unwrap(),
            r#"{"gas":1,"big":1e+21,"small":1.5e-7,"neg":-0.5,"max":18446744073709552000}"#
        );
    }

    #[test]
    fn test_number_text_layouts() {
        let text = |raw: &str| number_text(&serde_json::from_str::<Number>(raw).unwrap());
        assert_eq!(text("0"), "0");
        assert_eq!(text("-0.0"), "0");
        assert_eq!(text("2.0"), "2");
        assert_eq!(text("123.456"), "123.456");
        assert_eq!(text("0.000001"), "0.000001");
        assert_eq!(text("2e-7"), "2e-7");
        assert_eq!(text("1.2345e25"), "1.2345e+25");
        assert_eq!(text("100000000000000000000"), "100000000000000000000");
        assert_eq!(text("9007199254740993"), "9007199254740992");
        assert_eq!(text("-42"), "-42");
    }

    #[test]
    fn test_transaction_numeric_fields_accept_text() {
        let tx = Transaction::from_record(json!({
            "sender": "A", "receiver": "B", "value": "10", "nonce": 1.0,
            "v": "v", "r": "r", "s": "s"
        }));
        assert_eq!(encode_transaction(&tx).unwrap().concat(), b"AB101vrs".to_vec());
    }

    #[test]
    fn test_transaction_null_and_mistyped_fields() {
        let mut tx = Transaction::new("A", "B", 10, 1, Signature::new("v", "r", "s"));
        tx.set_field("v", serde_json::Value::Null);
        assert_eq!(
            encode_transaction(&tx).unwrap_err(),
            LedgerError::EncodingFailure("transaction is missing v".to_string())
        );

        tx.set_field("v", 27);
        assert_eq!(
            encode_transaction(&tx).unwrap_err(),
            LedgerError::EncodingFailure("transaction field v is not a string".to_string())
        );
    }
}
