//! Bridge from `tracing` into a [`Logger`]
//!
//! Install [`LoggerLayer`] on a `tracing_subscriber` registry and `tracing::info!` and
//! friends end up in the same sinks, with the same format and threshold, as direct calls.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::level::Severity;
use super::logger::Logger;

/// `tracing_subscriber` layer forwarding events to a logger
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Arc<Logger>,
    with_target: bool,
}

impl LoggerLayer {
    /// Forward events to `logger`
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            with_target: false,
        }
    }

    /// Prefix each message with the event target (`target: message`)
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Severity::from(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();

        if self.with_target {
            self.logger
                .log(level, &format!("{}: {}", metadata.target(), message));
        } else {
            self.logger.log(level, &message);
        }
    }
}

/// Collects the `message` field and renders the rest as `name=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}
