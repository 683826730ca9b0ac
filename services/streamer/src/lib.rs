//! Ticket streamer host
//!
//! Wires configuration, logging and event intake around the export
//! pipeline. The binary in `main.rs` is a thin CLI over these modules.

pub mod intake;
pub mod logging;

use export::bound::ConfigSource;
use export::extensions::Extensions;
use export::record::RecordFactory;
use export::registry::{EncoderFactory, SerializerFactory};
use export::stream::StreamFactory;
use export::tuple::TupleFactory;
use export::use_case::{Dispatcher, UseCaseFactory};
use export::BoundUseCaseFactory;
use indexmap::IndexMap;
use std::sync::Arc;

pub use intake::IntakeStats;

/// Registry family with its `name -> label` map
pub type FormatTable = (&'static str, IndexMap<String, String>);

/// Create the dispatcher holding every enabled use case
pub fn bootstrap(source: Arc<dyn ConfigSource>, extensions: &Extensions) -> Dispatcher {
    BoundUseCaseFactory::new(source, extensions).bootstrap()
}

/// Every registry with its `name -> label` map, in pipeline order
pub fn format_tables(extensions: &Extensions) -> Vec<FormatTable> {
    vec![
        (
            "serializers",
            SerializerFactory::new(extensions.serializers.clone()).formats(),
        ),
        (
            "encoders",
            EncoderFactory::new(extensions.encoders.clone()).formats(),
        ),
        ("tuples", TupleFactory::new(extensions.tuples.clone()).formats()),
        ("records", RecordFactory::new(extensions.records.clone()).formats()),
        ("streams", StreamFactory::new(extensions.streams.clone()).formats()),
        (
            "use cases",
            UseCaseFactory::new(
                extensions.use_cases.clone(),
                extensions.ticket_fields.clone(),
            )
            .formats(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use export::bound::MapSource;

    #[test]
    fn test_format_tables_cover_every_family() {
        let tables = format_tables(&Extensions::default());
        let families: Vec<&str> = tables.iter().map(|(family, _)| *family).collect();
        assert_eq!(
            families,
            vec!["serializers", "encoders", "tuples", "records", "streams", "use cases"]
        );
        assert_eq!(tables[0].1.len(), 3);
        assert_eq!(tables[5].1.get("tickets_creation").map(String::as_str), Some("Tickets creation"));
    }

    #[test]
    fn test_bootstrap_without_configuration_is_empty() {
        let dispatcher = bootstrap(Arc::new(MapSource::new()), &Extensions::default());
        assert!(dispatcher.is_empty());
    }
}
