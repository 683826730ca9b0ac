//! Extension points of the pipeline
//!
//! An [`Extensions`] value collects the hooks of every family. It is built
//! once by the host and handed to the factories.

use crate::record::{Record, RecordOptions};
use crate::registry::{EncoderOptions, FormatMap, HookContext, Hooks, SerializerOptions};
use crate::stream::{Stream, StreamOptions};
use crate::tuple::{Tuple, TupleOptions};
use crate::use_case::{FieldsHook, Ticket, UseCase, UseCaseOptions};
use codec::encoder::Encoder;
use codec::serializer::Serializer;
use codec::Fields;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Extensions {
    pub serializers: Hooks<dyn Serializer, SerializerOptions>,
    pub encoders: Hooks<dyn Encoder, EncoderOptions>,
    pub tuples: Hooks<dyn Tuple, TupleOptions>,
    pub records: Hooks<dyn Record, RecordOptions>,
    pub streams: Hooks<dyn Stream, StreamOptions>,
    pub use_cases: Hooks<dyn UseCase, UseCaseOptions>,
    /// Run over every ticket row before export
    pub ticket_fields: Vec<FieldsHook>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_serializers(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn Serializer, SerializerOptions>, &HookContext)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.serializers.push(Arc::new(hook));
        self
    }

    pub fn on_encoders(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn Encoder, EncoderOptions>, &HookContext)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.encoders.push(Arc::new(hook));
        self
    }

    pub fn on_tuples(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn Tuple, TupleOptions>, &HookContext) + Send + Sync + 'static,
    ) -> &mut Self {
        self.tuples.push(Arc::new(hook));
        self
    }

    pub fn on_records(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn Record, RecordOptions>, &HookContext)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.records.push(Arc::new(hook));
        self
    }

    pub fn on_streams(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn Stream, StreamOptions>, &HookContext)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.streams.push(Arc::new(hook));
        self
    }

    pub fn on_use_cases(
        &mut self,
        hook: impl Fn(&mut FormatMap<dyn UseCase, UseCaseOptions>, &HookContext)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.use_cases.push(Arc::new(hook));
        self
    }

    pub fn on_ticket_fields(
        &mut self,
        hook: impl Fn(&mut Fields, &Ticket) + Send + Sync + 'static,
    ) -> &mut Self {
        self.ticket_fields.push(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("serializers", &self.serializers.len())
            .field("encoders", &self.encoders.len())
            .field("tuples", &self.tuples.len())
            .field("records", &self.records.len())
            .field("streams", &self.streams.len())
            .field("use_cases", &self.use_cases.len())
            .field("ticket_fields", &self.ticket_fields.len())
            .finish()
    }
}
