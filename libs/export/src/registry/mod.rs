//! # Format Registries
//!
//! ## Purpose
//!
//! Every pluggable family of the pipeline (serializers, encoders, records,
//! streams, tuples, use cases) is created through a [`FormatRegistry`]: a
//! map from format name to a human readable label and a builder.
//!
//! ## Extension Hooks
//!
//! The built-in formats of a family come from a seed function. Each call to
//! [`FormatRegistry::formats`] or [`FormatRegistry::create`] starts from a
//! fresh copy of the seed and passes it through the registered [`Hook`]s,
//! in registration order, exactly once. A hook may add, replace or remove
//! entries, so third-party formats become available without touching the
//! built-ins:
//!
//! ```rust,ignore
//! let mut extensions = Extensions::default();
//! extensions.on_serializers(|formats, _ctx| {
//!     formats.insert("ser_tsv".to_string(), Format::new("TSV", |_options| {
//!         Ok(Box::new(CsvSerializer::new(Some("\t"), None, None, None)))
//!     }));
//! });
//! ```
//!
//! Hooks receive a [`HookContext`] naming the use case and the entity format
//! the registry was bound to, so the same hook can behave differently per
//! pipeline.

pub mod codecs;

pub use codecs::{EncoderFactory, EncoderOptions, SerializerFactory, SerializerOptions};

use crate::error::{ExportError, ExportResult};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Label reported for formats registered with a blank label
pub const UNKNOWN_LABEL: &str = "unknown";

type Builder<T, O> = dyn Fn(O) -> ExportResult<Box<T>> + Send + Sync;

type Seed<T, O> = dyn Fn() -> FormatMap<T, O> + Send + Sync;

/// A registered format: label plus builder
pub struct Format<T: ?Sized, O> {
    label: String,
    build: Arc<Builder<T, O>>,
}

impl<T: ?Sized, O> Format<T, O> {
    pub fn new(
        label: impl Into<String>,
        build: impl Fn(O) -> ExportResult<Box<T>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            build: Arc::new(build),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Build an instance from `options`
    pub fn build(&self, options: O) -> ExportResult<Box<T>> {
        (self.build)(options)
    }
}

impl<T: ?Sized, O> Clone for Format<T, O> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<T: ?Sized, O> fmt::Debug for Format<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format").field("label", &self.label).finish()
    }
}

/// Format name -> format, in registration order
pub type FormatMap<T, O> = IndexMap<String, Format<T, O>>;

/// Extension hook run over a fresh format map
pub type Hook<T, O> = Arc<dyn Fn(&mut FormatMap<T, O>, &HookContext) + Send + Sync>;

/// Ordered list of extension hooks for one family
pub type Hooks<T, O> = Vec<Hook<T, O>>;

/// Key passed to every hook invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookContext {
    /// Use case the registry builds for, if bound
    pub context: Option<String>,
    /// Format of the entity that owns the built instance, if bound
    pub format: Option<String>,
}

impl HookContext {
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn bound(context: Option<&str>, format: Option<&str>) -> Self {
        Self {
            context: context.map(str::to_string),
            format: format.map(str::to_string),
        }
    }
}

/// Name-keyed registry of one format family
pub struct FormatRegistry<T: ?Sized, O> {
    family: &'static str,
    seed: Arc<Seed<T, O>>,
    hooks: Hooks<T, O>,
    context: HookContext,
}

impl<T: ?Sized, O> FormatRegistry<T, O> {
    /// Create a registry for `family` from a seed and hooks
    pub fn with_seed(
        family: &'static str,
        seed: impl Fn() -> FormatMap<T, O> + Send + Sync + 'static,
        hooks: Hooks<T, O>,
        context: HookContext,
    ) -> Self {
        Self {
            family,
            seed: Arc::new(seed),
            hooks,
            context,
        }
    }

    /// Family name used in logs and errors, e.g. `serializer`
    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn context(&self) -> &HookContext {
        &self.context
    }

    /// Fresh seed map passed through every hook once
    pub fn resolve(&self) -> FormatMap<T, O> {
        let mut formats = (self.seed)();
        for hook in &self.hooks {
            hook(&mut formats, &self.context);
        }

        debug!(
            family = self.family,
            hooks = self.hooks.len(),
            formats = formats.len(),
            context = ?self.context.context,
            format = ?self.context.format,
            "Resolved format registry"
        );

        formats
    }

    /// Every available format name with its label
    pub fn formats(&self) -> IndexMap<String, String> {
        self.resolve()
            .into_iter()
            .map(|(name, format)| {
                let label = if format.label.trim().is_empty() {
                    UNKNOWN_LABEL.to_string()
                } else {
                    format.label
                };
                (name, label)
            })
            .collect()
    }

    /// Whether `name` is available after hooks ran
    pub fn contains(&self, name: &str) -> bool {
        self.resolve().contains_key(name)
    }

    /// Build the format registered as `name`
    pub fn create(&self, name: &str, options: O) -> ExportResult<Box<T>> {
        let format = self
            .resolve()
            .swap_remove(name)
            .ok_or_else(|| ExportError::unsupported_format(self.family, name))?;

        debug!(family = self.family, format = name, "Creating format instance");
        format.build(options)
    }
}

impl<T: ?Sized, O> fmt::Debug for FormatRegistry<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("family", &self.family)
            .field("hooks", &self.hooks.len())
            .field("context", &self.context)
            .finish()
    }
}

/// Wrap a closure as a [`Hook`]
pub fn hook<T: ?Sized, O>(
    f: impl Fn(&mut FormatMap<T, O>, &HookContext) + Send + Sync + 'static,
) -> Hook<T, O> {
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Widget(String);

    fn seed() -> FormatMap<Widget, Option<String>> {
        let mut formats = FormatMap::new();
        formats.insert(
            "wdg_plain".to_string(),
            Format::new("Plain", |name: Option<String>| {
                Ok(Box::new(Widget(name.unwrap_or_else(|| "plain".to_string()))))
            }),
        );
        formats
    }

    fn registry(hooks: Hooks<Widget, Option<String>>) -> FormatRegistry<Widget, Option<String>> {
        FormatRegistry::with_seed("widget", seed, hooks, HookContext::unbound())
    }

    #[test]
    fn test_create_builtin_with_defaults() {
        let widget = registry(vec![]).create("wdg_plain", None).unwrap();
        assert_eq!(*widget, Widget("plain".to_string()));
    }

    #[test]
    fn test_unknown_format_is_configuration_error() {
        let error = registry(vec![]).create("wdg_fancy", None).unwrap_err();
        assert!(matches!(
            &error,
            ExportError::UnsupportedFormat { family: "widget", name } if name == "wdg_fancy"
        ));
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_hook_adds_format() {
        let add = hook(|formats: &mut FormatMap<Widget, Option<String>>, _: &HookContext| {
            formats.insert(
                "wdg_fancy".to_string(),
                Format::new("Fancy", |_| Ok(Box::new(Widget("fancy".to_string())))),
            );
        });
        let registry = registry(vec![add]);

        let names: Vec<String> = registry.formats().into_keys().collect();
        assert_eq!(names, vec!["wdg_plain", "wdg_fancy"]);
        assert_eq!(*registry.create("wdg_fancy", None).unwrap(), Widget("fancy".to_string()));
    }

    #[test]
    fn test_hooks_run_in_order_once_per_call_on_fresh_map() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let count = hook(move |formats: &mut FormatMap<Widget, Option<String>>, _: &HookContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            // A fresh seed every time: never more than the built-in plus one
            assert_eq!(formats.len(), 1);
            formats.insert("wdg_extra".to_string(), Format::new("Extra", |_| {
                Ok(Box::new(Widget("extra".to_string())))
            }));
        });
        let remove = hook(|formats: &mut FormatMap<Widget, Option<String>>, _: &HookContext| {
            formats.shift_remove("wdg_plain");
        });
        let registry = registry(vec![count, remove]);

        assert_eq!(registry.formats().len(), 1);
        assert!(registry.create("wdg_plain", None).is_err());
        assert!(registry.create("wdg_extra", None).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_blank_label_reported_as_unknown() {
        let blank = hook(|formats: &mut FormatMap<Widget, Option<String>>, _: &HookContext| {
            formats.insert("wdg_blank".to_string(), Format::new("  ", |_| {
                Ok(Box::new(Widget(String::new())))
            }));
        });
        let formats = registry(vec![blank]).formats();
        assert_eq!(formats.get("wdg_blank").map(String::as_str), Some(UNKNOWN_LABEL));
        assert_eq!(formats.get("wdg_plain").map(String::as_str), Some("Plain"));
    }

    #[test]
    fn test_hooks_see_bound_context() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&seen);
        let record = hook(move |_: &mut FormatMap<Widget, Option<String>>, ctx: &HookContext| {
            *sink.lock().unwrap() = Some(ctx.clone());
        });
        let registry = FormatRegistry::with_seed(
            "widget",
            seed,
            vec![record],
            HookContext::bound(Some("tickets_creation"), Some("rec_kinesis")),
        );
        registry.formats();

        let ctx = seen.lock().unwrap().clone().unwrap();
        assert_eq!(ctx.context.as_deref(), Some("tickets_creation"));
        assert_eq!(ctx.format.as_deref(), Some("rec_kinesis"));
    }
}
