//! JSON serializer
//!
//! Output is controlled by [`JsonFlags`], a bitmask that keeps the numeric
//! values of the classic `JSON_*` encoder options so that masks stored in
//! existing configuration keep their meaning.
//!
//! Serialization runs in two passes:
//!
//! 1. **prepare**: the [`Fields`] collection is turned into a
//!    [`serde_json::Value`] tree. Shape decisions happen here (list or object,
//!    numeric strings, zero fractions) together with the depth limit.
//! 2. **write**: the tree is written through [`EscapingFormatter`], which wraps
//!    serde_json's compact or pretty formatter and applies the string escaping
//!    options.

use super::Serializer;
use crate::error::{CodecError, CodecResult};
use crate::fields::Fields;
use crate::validation::{or_default, NON_NEGATIVE_DOUBLE_WORD, POSITIVE_INTEGER};
use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Map, Number, Value};
use std::io;

pub const FORMAT_NAME: &str = "ser_json";

/// Maximum nesting depth when none is configured
pub const DEFAULT_DEPTH: usize = 16;

const PRETTY_INDENT: &[u8] = b"    ";

bitflags! {
    /// JSON encoder options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JsonFlags: u32 {
        /// `<` and `>` as `\u003C` / `\u003E`
        const HEX_TAG = 1;
        /// `&` as `\u0026`
        const HEX_AMP = 2;
        /// `'` as `\u0027`
        const HEX_APOS = 4;
        /// `"` as `\u0022`
        const HEX_QUOT = 8;
        /// Lists are written as objects keyed `"0"`, `"1"`, ..
        const FORCE_OBJECT = 16;
        /// Numeric strings are written as numbers
        const NUMERIC_CHECK = 32;
        /// `/` is not escaped
        const UNESCAPED_SLASHES = 64;
        /// Four-space indentation and line breaks
        const PRETTY_PRINT = 128;
        /// Non-ASCII characters are written as-is
        const UNESCAPED_UNICODE = 256;
        /// Subtrees beyond the depth limit become `null` instead of an error
        const PARTIAL_OUTPUT_ON_ERROR = 512;
        /// Integral floats keep their `.0`
        const PRESERVE_ZERO_FRACTION = 1024;
    }
}

impl JsonFlags {
    /// `FORCE_OBJECT | NUMERIC_CHECK | UNESCAPED_UNICODE | PRESERVE_ZERO_FRACTION`
    pub const DEFAULT: Self = Self::FORCE_OBJECT
        .union(Self::NUMERIC_CHECK)
        .union(Self::UNESCAPED_UNICODE)
        .union(Self::PRESERVE_ZERO_FRACTION);

    /// Combine flags by name, e.g. `["FORCE_OBJECT", "JSON_PRETTY_PRINT"]`.
    ///
    /// Names are case-insensitive and may carry the `JSON_` prefix. Returns
    /// `None` if any name is unknown.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        names.into_iter().try_fold(Self::empty(), |flags, name| {
            let name = name.trim().to_ascii_uppercase();
            let name = name.strip_prefix("JSON_").unwrap_or(&name);
            Self::from_name(name).map(|flag| flags | flag)
        })
    }
}

impl Default for JsonFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static NUMERIC_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$")
        .expect("numeric pattern is a valid regex")
});

static INTEGER_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSerializer {
    flags: JsonFlags,
    depth: usize,
}

impl JsonSerializer {
    /// Create a JSON serializer.
    ///
    /// `flags` must fit an unsigned 32-bit mask and `depth` must be positive;
    /// anything else falls back to [`JsonFlags::DEFAULT`] and
    /// [`DEFAULT_DEPTH`]. Unknown bits are ignored.
    pub fn new(flags: Option<i64>, depth: Option<i64>) -> Self {
        let flags = or_default(
            "flags",
            flags,
            NON_NEGATIVE_DOUBLE_WORD.check(),
            i64::from(JsonFlags::DEFAULT.bits()),
        );
        let depth = or_default("depth", depth, POSITIVE_INTEGER.check(), DEFAULT_DEPTH as i64);

        Self {
            flags: JsonFlags::from_bits_truncate(u32::try_from(flags).unwrap_or_default()),
            depth: usize::try_from(depth).unwrap_or(DEFAULT_DEPTH),
        }
    }

    pub fn with_flags(flags: JsonFlags) -> Self {
        Self {
            flags,
            depth: DEFAULT_DEPTH,
        }
    }

    pub fn flags(&self) -> JsonFlags {
        self.flags
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Write an already prepared value
    pub(crate) fn write(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        if self.flags.contains(JsonFlags::PRETTY_PRINT) {
            let formatter =
                EscapingFormatter::new(PrettyFormatter::with_indent(PRETTY_INDENT), self.flags);
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut serializer)?;
        } else {
            let formatter = EscapingFormatter::new(CompactFormatter, self.flags);
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            value.serialize(&mut serializer)?;
        }
        Ok(out)
    }

    /// Shape `fields` into a value tree. The collection itself sits at level 1.
    pub(crate) fn prepare(&self, fields: &Fields) -> CodecResult<Value> {
        if !self.flags.contains(JsonFlags::FORCE_OBJECT) && fields.is_list() {
            let items = fields
                .values()
                .map(|value| self.prepare_value(value, 2))
                .collect::<CodecResult<Vec<_>>>()?;
            return Ok(Value::Array(items));
        }

        let mut object = Map::with_capacity(fields.len());
        for (offset, value) in fields {
            object.insert(offset.to_string(), self.prepare_value(value, 2)?);
        }
        Ok(Value::Object(object))
    }

    fn prepare_value(&self, value: &Value, level: usize) -> CodecResult<Value> {
        match value {
            Value::Array(_) | Value::Object(_) if level > self.depth => {
                if self.flags.contains(JsonFlags::PARTIAL_OUTPUT_ON_ERROR) {
                    Ok(Value::Null)
                } else {
                    Err(CodecError::depth_exceeded(level, self.depth))
                }
            }
            Value::Array(items) if self.flags.contains(JsonFlags::FORCE_OBJECT) => {
                let mut object = Map::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    object.insert(index.to_string(), self.prepare_value(item, level + 1)?);
                }
                Ok(Value::Object(object))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.prepare_value(item, level + 1))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(entries) => {
                let mut object = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    object.insert(key.clone(), self.prepare_value(item, level + 1)?);
                }
                Ok(Value::Object(object))
            }
            Value::String(text) if self.flags.contains(JsonFlags::NUMERIC_CHECK) => {
                Ok(numeric_string(text)
                    .map(|number| self.prepare_number(number))
                    .unwrap_or_else(|| value.clone()))
            }
            Value::Number(number) => Ok(self.prepare_number(number.clone())),
            other => Ok(other.clone()),
        }
    }

    fn prepare_number(&self, number: Number) -> Value {
        if !self.flags.contains(JsonFlags::PRESERVE_ZERO_FRACTION) && number.is_f64() {
            if let Some(float) = number.as_f64() {
                if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                    return Value::from(float as i64);
                }
            }
        }
        Value::Number(number)
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::with_flags(JsonFlags::DEFAULT)
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, fields: &Fields) -> CodecResult<Vec<u8>> {
        self.write(&self.prepare(fields)?)
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}

/// Number held by a numeric string, integers first
fn numeric_string(text: &str) -> Option<Number> {
    if !NUMERIC_STRING.is_match(text) {
        return None;
    }

    let trimmed = text.trim();
    if INTEGER_STRING.is_match(trimmed) {
        if let Ok(integer) = trimmed.parse::<i64>() {
            return Some(Number::from(integer));
        }
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// serde_json formatter that applies the escaping options of [`JsonFlags`]
/// and delegates layout to an inner formatter
struct EscapingFormatter<F> {
    inner: F,
    flags: JsonFlags,
}

impl<F: Formatter> EscapingFormatter<F> {
    fn new(inner: F, flags: JsonFlags) -> Self {
        Self { inner, flags }
    }

    fn escape_for(&self, c: char) -> Option<&'static str> {
        let escape = match c {
            '/' if !self.flags.contains(JsonFlags::UNESCAPED_SLASHES) => "\\/",
            '<' if self.flags.contains(JsonFlags::HEX_TAG) => "\\u003C",
            '>' if self.flags.contains(JsonFlags::HEX_TAG) => "\\u003E",
            '&' if self.flags.contains(JsonFlags::HEX_AMP) => "\\u0026",
            '\'' if self.flags.contains(JsonFlags::HEX_APOS) => "\\u0027",
            '\u{2028}' => "\\u2028",
            '\u{2029}' => "\\u2029",
            _ => return None,
        };
        Some(escape)
    }
}

impl<F: Formatter> Formatter for EscapingFormatter<F> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let escape_unicode = !self.flags.contains(JsonFlags::UNESCAPED_UNICODE);
        let mut start = 0;

        for (position, c) in fragment.char_indices() {
            let fixed = self.escape_for(c);
            if fixed.is_none() && (c.is_ascii() || !escape_unicode) {
                continue;
            }

            writer.write_all(fragment[start..position].as_bytes())?;
            start = position + c.len_utf8();

            match fixed {
                Some(escape) => writer.write_all(escape.as_bytes())?,
                None => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        write!(writer, "\\u{:04x}", unit)?;
                    }
                }
            }
        }

        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        char_escape: CharEscape,
    ) -> io::Result<()> {
        match char_escape {
            CharEscape::Quote if self.flags.contains(JsonFlags::HEX_QUOT) => {
                writer.write_all(b"\\u0022")
            }
            other => self.inner.write_char_escape(writer, other),
        }
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}
