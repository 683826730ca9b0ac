//! CSV row serializer
//!
//! Writes one field collection as one CSV row using the classic `fputcsv`
//! dialect:
//!
//! - a field is enclosed when it contains the separator, the enclosure, the
//!   escape character, `\n`, `\r`, `\t` or a space
//! - enclosure characters inside an enclosed field are doubled, unless the
//!   previous byte was an unconsumed escape character
//! - the row ends with `\n`
//!
//! An escape character consumes the byte after it, so `\\"` doubles the
//! quote: the output reads back the way `fgetcsv` scans it. `fputcsv` itself
//! leaves that quote single, which closes the field early on read.
//!
//! A field ending in an unconsumed escape character cannot be represented in
//! this dialect: the escape swallows the closing enclosure and the reader
//! merges the next field into it. The bytes are written unchanged, as
//! `fputcsv` does; disable the escape (`escape = ""`) when such values occur.
//!
//! Rows are assembled in a spooled temporary file which stays in memory up to
//! the configured limit and moves to disk beyond it, so very wide rows do not
//! pin large buffers.

use super::Serializer;
use crate::error::CodecResult;
use crate::fields::Fields;
use crate::validation::{is_not_blank, is_not_empty, or_default, NON_NEGATIVE_INTEGER};
use serde_json::Value;
use std::io::{Read, Seek, SeekFrom, Write};

pub const FORMAT_NAME: &str = "ser_csv";

pub const DEFAULT_SEPARATOR: u8 = b',';
pub const DEFAULT_ENCLOSURE: u8 = b'"';
pub const DEFAULT_ESCAPE: u8 = b'\\';

/// In-memory limit before the row buffer spills to disk (2 MiB)
pub const DEFAULT_MEMORY: usize = 2 * 1024 * 1024;

const ROW_TERMINATOR: &[u8] = b"\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSerializer {
    separator: u8,
    enclosure: u8,
    escape: Option<u8>,
    memory: usize,
}

impl CsvSerializer {
    /// Create a CSV serializer.
    ///
    /// - `separator`: first character of a non-empty string
    /// - `enclosure`: first character of a non-blank string
    /// - `escape`: first character of a non-blank string; a blank string
    ///   disables the escape mechanism, `None` selects `\`
    /// - `memory`: non-negative spill threshold in bytes
    ///
    /// Characters that do not fit a single printable byte fall back to the
    /// defaults.
    pub fn new(
        separator: Option<&str>,
        enclosure: Option<&str>,
        escape: Option<&str>,
        memory: Option<i64>,
    ) -> Self {
        let separator = or_default(
            "separator",
            separator.map(|s| s.chars().next().filter(|_| is_not_empty(s))),
            |c| c.and_then(single_byte).map_or(false, is_separator_byte),
            None,
        )
        .and_then(single_byte)
        .unwrap_or(DEFAULT_SEPARATOR);

        let enclosure = or_default(
            "enclosure",
            enclosure.map(|s| s.trim().chars().next()),
            |c| c.and_then(single_byte).map_or(false, |b| b.is_ascii_graphic()),
            None,
        )
        .and_then(single_byte)
        .unwrap_or(DEFAULT_ENCLOSURE);

        let escape = match escape {
            None => Some(DEFAULT_ESCAPE),
            Some(s) if !is_not_blank(s) => None,
            Some(s) => or_default(
                "escape",
                s.trim().chars().next(),
                |c| single_byte(*c).map_or(false, |b| b.is_ascii_graphic()),
                DEFAULT_ESCAPE as char,
            )
            .try_into()
            .ok(),
        };

        let memory = or_default("memory", memory, NON_NEGATIVE_INTEGER.check(), DEFAULT_MEMORY as i64);

        Self {
            separator,
            enclosure,
            escape,
            memory: usize::try_from(memory).unwrap_or(DEFAULT_MEMORY),
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    pub fn enclosure(&self) -> u8 {
        self.enclosure
    }

    pub fn escape(&self) -> Option<u8> {
        self.escape
    }

    pub fn memory(&self) -> usize {
        self.memory
    }

    /// Whether `field` has to be wrapped in enclosure characters
    fn needs_enclosure(&self, field: &[u8]) -> bool {
        field.iter().any(|&b| {
            b == self.separator
                || b == self.enclosure
                || Some(b) == self.escape
                || matches!(b, b'\n' | b'\r' | b'\t' | b' ')
        })
    }

    fn write_field<W: Write>(&self, out: &mut W, field: &[u8]) -> std::io::Result<()> {
        if !self.needs_enclosure(field) {
            return out.write_all(field);
        }

        let mut enclosed = Vec::with_capacity(field.len() + 2);
        enclosed.push(self.enclosure);

        // Tracks whether the previous byte was an escape that has not yet
        // consumed a byte
        let mut escaped = false;
        for &b in field {
            if !escaped && Some(b) == self.escape {
                escaped = true;
            } else if !escaped && b == self.enclosure {
                enclosed.push(self.enclosure);
            } else {
                escaped = false;
            }
            enclosed.push(b);
        }

        enclosed.push(self.enclosure);
        out.write_all(&enclosed)
    }
}

impl Default for CsvSerializer {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            enclosure: DEFAULT_ENCLOSURE,
            escape: Some(DEFAULT_ESCAPE),
            memory: DEFAULT_MEMORY,
        }
    }
}

impl Serializer for CsvSerializer {
    fn serialize(&self, fields: &Fields) -> CodecResult<Vec<u8>> {
        let mut buffer = tempfile::spooled_tempfile(self.memory);

        for (position, value) in fields.values().enumerate() {
            if position > 0 {
                buffer.write_all(&[self.separator])?;
            }
            self.write_field(&mut buffer, &render(value)?)?;
        }
        buffer.write_all(ROW_TERMINATOR)?;

        let mut row = Vec::new();
        buffer.seek(SeekFrom::Start(0))?;
        buffer.read_to_end(&mut row)?;
        Ok(row)
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}

/// Plain text form of a field value
fn render(value: &Value) -> CodecResult<Vec<u8>> {
    Ok(match value {
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::Bool(true) => b"1".to_vec(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
                (float as i64).to_string().into_bytes()
            }
            _ => number.to_string().into_bytes(),
        },
        Value::String(text) => text.as_bytes().to_vec(),
        nested @ (Value::Array(_) | Value::Object(_)) => serde_json::to_vec(nested)?,
    })
}

fn single_byte(c: char) -> Option<u8> {
    u8::try_from(c).ok().filter(u8::is_ascii)
}

fn is_separator_byte(b: u8) -> bool {
    b.is_ascii_graphic() || b == b' ' || b == b'\t'
}
