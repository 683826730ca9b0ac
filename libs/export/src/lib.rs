//! # Ticket Streamer Export Pipeline
//!
//! ## Purpose
//!
//! Turns host events into jobs on a work queue. Each stage is a pluggable
//! family created by name through a [`registry::FormatRegistry`]:
//!
//! - **Tuple** (`tpl_*`): the event fields plus the serializer that renders them
//! - **Record** (`rec_*`): transport envelope carrying the encoded tuple
//! - **Stream** (`stm_*`): transport client that submits the record
//! - **Use case**: orchestrator reacting to a host event
//!
//! ## Architecture Role
//!
//! ```text
//! HostEvent → UseCase → Tuple → Record → Stream → beanstalkd
//!                ↑        ↑        ↑        ↑
//!                └── BoundFactories ← ConfigSource + Extensions
//! ```
//!
//! ## Error Boundary
//!
//! Every stage returns [`ExportResult`]; only the use case swallows errors,
//! logging them at `warn` level so the host is never interrupted by an
//! export failure.
//!
//! ## What This Crate Does NOT Contain
//! - Serializers, encoders and validators (libs/codec)
//! - Configuration file loading (libs/config implements [`ConfigSource`])
//! - Process setup, CLI and logging subscribers (services/streamer)

pub mod bound;
pub mod error;
pub mod extensions;
pub mod record;
pub mod registry;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod tuple;
pub mod use_case;

pub use bound::{
    BoundEncoderFactory, BoundRecordFactory, BoundSerializerFactory, BoundStreamFactory,
    BoundTupleFactory, BoundUseCaseFactory, ConfigKey, ConfigSource, MapSource,
};
pub use error::{ExportError, ExportResult};
pub use extensions::Extensions;
pub use record::{KinesisRecord, Record, RecordFactory, RecordFormat, RecordOptions};
pub use registry::{
    EncoderFactory, EncoderOptions, Format, FormatMap, FormatRegistry, HookContext,
    SerializerFactory, SerializerOptions,
};
pub use stream::{BeanstalkStream, Stream, StreamFactory, StreamFormat, StreamOptions};
pub use tuple::{Sequence, Tuple, TupleFactory, TupleFormat, TupleOptions};
pub use use_case::{
    Dispatcher, HostEvent, Ticket, TicketsCreationUseCase, Trigger, UseCase, UseCaseFactory,
    UseCaseFormat, UseCaseOptions, UseCaseState,
};
