//! Tuples: mutable field collections that know how to serialize themselves
//!
//! A tuple is the first stage of the pipeline. The use case refills it for
//! every event (`clear` + `add_range`) and the record asks it for its
//! serialized form.

pub mod sequence;

pub use sequence::Sequence;

use crate::error::ExportResult;
use crate::registry::{Format, FormatMap, FormatRegistry, HookContext, Hooks};
use codec::serializer::Serializer;
use codec::{Fields, Offset};
use serde_json::Value;
use std::fmt::Debug;

/// Format group prefix shared by every tuple name
pub const FORMAT_GROUP: &str = "tpl";

pub trait Tuple: Send + Sync + Debug {
    /// Insert `value` at `offset`, or append it when `offset` is `None`
    fn add(&mut self, value: Value, offset: Option<Offset>) -> &mut dyn Tuple;

    /// Insert every entry of `fields`, keeping their offsets
    fn add_range(&mut self, fields: Fields) -> &mut dyn Tuple;

    /// Remove every entry
    fn clear(&mut self) -> &mut dyn Tuple;

    /// Serialize the current entries with the tuple's serializer
    fn serialize(&self) -> ExportResult<Vec<u8>>;

    fn fields(&self) -> &Fields;

    fn serializer(&self) -> &dyn Serializer;

    fn set_serializer(&mut self, serializer: Box<dyn Serializer>);

    /// Registry name of this tuple
    fn format_name(&self) -> &'static str;
}

/// Tuple constructor options
#[derive(Debug, Default)]
pub struct TupleOptions {
    /// Initial entries
    pub fields: Option<Fields>,
    /// Serializer; each tuple format has its own default
    pub serializer: Option<Box<dyn Serializer>>,
}

/// Built-in tuple formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleFormat {
    Sequence,
}

impl TupleFormat {
    pub const ALL: [TupleFormat; 1] = [Self::Sequence];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sequence => sequence::FORMAT_NAME,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sequence => "Sequence",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}

pub type TupleFactory = FormatRegistry<dyn Tuple, TupleOptions>;

impl FormatRegistry<dyn Tuple, TupleOptions> {
    pub fn new(hooks: Hooks<dyn Tuple, TupleOptions>) -> Self {
        Self::bound_to(hooks, HookContext::unbound())
    }

    pub(crate) fn bound_to(hooks: Hooks<dyn Tuple, TupleOptions>, context: HookContext) -> Self {
        Self::with_seed("tuple", tuple_seed, hooks, context)
    }
}

fn tuple_seed() -> FormatMap<dyn Tuple, TupleOptions> {
    TupleFormat::ALL
        .into_iter()
        .map(|format| {
            let entry = Format::new(format.label(), move |options| build_tuple(format, options));
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_tuple(format: TupleFormat, options: TupleOptions) -> ExportResult<Box<dyn Tuple>> {
    let tuple: Box<dyn Tuple> = match format {
        TupleFormat::Sequence => Box::new(Sequence::new(
            options.fields.unwrap_or_default(),
            options.serializer,
        )),
    };
    Ok(tuple)
}
