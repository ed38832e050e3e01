//! JSON and JSON-with-comments document loading
//!
//! Pipeline files are strict JSON. Plain `serde_json::Value` parsing keeps the
//! last of two equal keys without a trace, so [`parse_json`] goes through a
//! seed that records every repeated key at any depth. The interface document
//! may carry `//` and `/* */` comments; [`strip_comments`] removes them with a
//! string-aware scanner before parsing.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};
use thiserror::Error;

const BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("JSON syntax error: {0}")]
    Syntax(serde_json::Error),

    #[error("JSONC syntax error: {0}")]
    CommentedSyntax(serde_json::Error),
}

/// A parsed JSON document and the keys it repeated
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJson {
    pub value: Value,
    /// Repeated keys in order of appearance
    pub duplicate_keys: Vec<String>,
}

impl ParsedJson {
    /// Repeated keys, sorted and deduplicated
    pub fn unique_duplicates(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.duplicate_keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Decodes UTF-8, dropping a leading byte-order mark
pub fn decode(bytes: Vec<u8>) -> Result<String, DocumentError> {
    let text = String::from_utf8(bytes)?;
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Parses strict JSON, recording repeated object keys
pub fn parse_json(text: &str) -> Result<ParsedJson, DocumentError> {
    let mut duplicate_keys = Vec::new();
    let mut de = serde_json::Deserializer::from_str(text);

    let value = TrackingSeed {
        duplicates: &mut duplicate_keys,
    }
    .deserialize(&mut de)
    .map_err(DocumentError::Syntax)?;
    de.end().map_err(DocumentError::Syntax)?;

    Ok(ParsedJson {
        value,
        duplicate_keys,
    })
}

/// Parses JSON that may contain `//` and `/* */` comments
pub fn parse_jsonc(text: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(&strip_comments(text)).map_err(DocumentError::CommentedSyntax)
}

/// Reads and parses a pipeline file
pub fn load_json(path: &Path) -> Result<ParsedJson, DocumentError> {
    let text = decode(fs::read(path)?)?;
    parse_json(&text)
}

/// Reads and parses a JSON-with-comments file
pub fn load_jsonc(path: &Path) -> Result<Value, DocumentError> {
    let text = decode(fs::read(path)?)?;
    parse_jsonc(&text)
}

/// Removes comments outside string literals
///
/// Line comments keep their terminating newline and block comments are
/// dropped entirely, so line numbers of following content only shift for
/// multi-line block comments. An unterminated block comment swallows the
/// rest of the input.
pub fn strip_comments(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Str { escaped: bool },
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match state {
            State::LineComment => {
                if ch == '\n' {
                    out.push(ch);
                    State::Code
                } else {
                    State::LineComment
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    State::Code
                } else {
                    State::BlockComment
                }
            }
            State::Str { escaped } => {
                out.push(ch);
                if escaped {
                    State::Str { escaped: false }
                } else if ch == '\\' {
                    State::Str { escaped: true }
                } else if ch == '"' {
                    State::Code
                } else {
                    State::Str { escaped: false }
                }
            }
            State::Code => match (ch, chars.peek()) {
                ('/', Some('/')) => {
                    chars.next();
                    State::LineComment
                }
                ('/', Some('*')) => {
                    chars.next();
                    State::BlockComment
                }
                ('"', _) => {
                    out.push(ch);
                    State::Str { escaped: false }
                }
                _ => {
                    out.push(ch);
                    State::Code
                }
            },
        };
    }

    out
}

/// Builds a `Value` while collecting keys that repeat within one object
struct TrackingSeed<'a> {
    duplicates: &'a mut Vec<String>,
}

impl<'de> DeserializeSeed<'de> for TrackingSeed<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for TrackingSeed<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let duplicates = self.duplicates;
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(TrackingSeed {
            duplicates: &mut *duplicates,
        })? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let duplicates = self.duplicates;
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(TrackingSeed {
                duplicates: &mut *duplicates,
            })?;
            // Later value wins, as with a plain parse
            if object.insert(key.clone(), value).is_some() {
                duplicates.push(key);
            }
        }
        Ok(Value::Object(object))
    }
}
