//! Log lines tagged with the session operation they belong to.
//!
//! Every start, step and autoplay runs inside an `operation` span carrying `op`, `ticket` and
//! `session_id`. [`OperationTagLayer`] captures those fields when the span opens, and
//! [`OperationLine`] prints them as a fixed `[op=.. ticket=.. session=..]` prefix, so a
//! background autoplay can be told apart from REPL commands in the file log.

use std::fmt;

use tracing_core::field::{Field, Visit};
use tracing_core::span::{Attributes, Id, Record};
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Name of the span the session controller opens per operation.
pub const OPERATION_SPAN: &str = "operation";

/// Session ids are uuids; the first block is enough to tell sessions apart in one log.
const SESSION_PREFIX_LEN: usize = 8;

/// Fields of one `operation` span, stored in the span's extensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationTag {
    pub op: Option<String>,
    pub ticket: Option<String>,
    pub session: Option<String>,
}

impl OperationTag {
    fn set(&mut self, field: &Field, value: String) {
        match field.name() {
            "op" => self.op = Some(value),
            "ticket" => self.ticket = Some(value),
            "session_id" => {
                self.session = Some(value.chars().take(SESSION_PREFIX_LEN).collect());
            }
            _ => {}
        }
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unknown = "-";
        write!(
            f,
            "[op={} ticket={} session={}]",
            self.op.as_deref().unwrap_or(unknown),
            self.ticket.as_deref().unwrap_or(unknown),
            self.session.as_deref().unwrap_or(unknown),
        )
    }
}

impl Visit for OperationTag {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field, format!("{:?}", value));
    }
}

/// Captures the fields of `operation` spans so [`OperationLine`] can print them.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationTagLayer;

impl<S> Layer<S> for OperationTagLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != OPERATION_SPAN {
            return;
        }
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut tag = OperationTag::default();
        attrs.record(&mut tag);
        span.extensions_mut().insert(tag);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(tag) = extensions.get_mut::<OperationTag>() {
            values.record(tag);
        }
    }
}

/// Plain-text formatter: `TIMESTAMP LEVEL [op=.. ticket=.. session=..] target: fields`.
///
/// The prefix comes from the innermost `operation` span in scope and is left out for events
/// outside any operation. Needs [`OperationTagLayer`] on the same registry.
pub struct OperationLine {
    timer: SystemTime,
    with_target: bool,
}

impl Default for OperationLine {
    fn default() -> Self {
        Self {
            timer: SystemTime,
            with_target: true,
        }
    }
}

impl OperationLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the target (module path) column; `logging::init` turns it off unless verbose.
    pub fn with_target(mut self, on: bool) -> Self {
        self.with_target = on;
        self
    }
}

impl<S, N> FormatEvent<S, N> for OperationLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " {}:", event.metadata().level())?;

        let tag = ctx.event_scope().and_then(|scope| {
            scope.into_iter().find_map(|span| {
                let extensions = span.extensions();
                extensions.get::<OperationTag>().cloned()
            })
        });
        if let Some(tag) = tag {
            write!(writer, " {}", tag)?;
        }
        if self.with_target {
            write!(writer, " {}:", event.metadata().target())?;
        }
        write!(writer, " ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
