//! Line-delimited JSON serializer
//!
//! Same output as [`JsonSerializer`] followed by exactly one delimiter.

use super::json::JsonSerializer;
use super::Serializer;
use crate::error::CodecResult;
use crate::fields::Fields;
use crate::validation::{is_not_empty, or_default};

pub const FORMAT_NAME: &str = "ser_ndjson";

/// Named line endings accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\0`
    Nul,
    /// `\n`
    Lf,
    /// U+0085 next line
    Nel,
    /// U+2028 line separator
    Ls,
    /// U+2029 paragraph separator
    Ps,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    pub const ALL: [LineEnding; 6] = [
        Self::Nul,
        Self::Lf,
        Self::Nel,
        Self::Ls,
        Self::Ps,
        Self::CrLf,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nul => "nul",
            Self::Lf => "lf",
            Self::Nel => "nel",
            Self::Ls => "ls",
            Self::Ps => "ps",
            Self::CrLf => "crlf",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nul => "\0",
            Self::Lf => "\n",
            Self::Nel => "\u{85}",
            Self::Ls => "\u{2028}",
            Self::Ps => "\u{2029}",
            Self::CrLf => "\r\n",
        }
    }

    /// Line ending of the host platform
    pub const fn platform() -> Self {
        if cfg!(windows) {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// Look a line ending up by name, ignoring case
    pub fn decode(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|ending| ending.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDelimitedJsonSerializer {
    json: JsonSerializer,
    delimiter: String,
}

impl LineDelimitedJsonSerializer {
    /// Create an NDJSON serializer. An empty `delimiter` falls back to the
    /// platform line ending; `flags` and `depth` behave as for
    /// [`JsonSerializer::new`].
    pub fn new(delimiter: Option<&str>, flags: Option<i64>, depth: Option<i64>) -> Self {
        let delimiter = or_default(
            "delimiter",
            delimiter,
            |d| is_not_empty(d),
            LineEnding::platform().as_str(),
        );

        Self {
            json: JsonSerializer::new(flags, depth),
            delimiter: delimiter.to_string(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn json(&self) -> &JsonSerializer {
        &self.json
    }
}

impl Default for LineDelimitedJsonSerializer {
    fn default() -> Self {
        Self {
            json: JsonSerializer::default(),
            delimiter: LineEnding::platform().as_str().to_string(),
        }
    }
}

impl Serializer for LineDelimitedJsonSerializer {
    fn serialize(&self, fields: &Fields) -> CodecResult<Vec<u8>> {
        let mut line = self.json.serialize(fields)?;
        line.extend_from_slice(self.delimiter.as_bytes());
        Ok(line)
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}
