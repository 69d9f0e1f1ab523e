// Bracketed operational log line formatter

use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Formats events as `[YYYY-MM-DD HH:MM:SS] [LEVEL] message {fields}`.
///
/// Structured fields are collected into a JSON object appended after the
/// message; the object is left out when the event carries no fields.
#[derive(Debug, Clone)]
pub struct BracketedFormat {
    timestamp_format: String,
}

impl BracketedFormat {
    pub fn new() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }

    /// Override the chrono format string used for the timestamp.
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Render one line (without trailing newline) from its parts.
    pub fn render(&self, timestamp: &str, level: &Level, message: &str, fields: &Map<String, Value>) -> String {
        let mut line = format!("[{}] [{}] {}", timestamp, level_label(level), message);
        if !fields.is_empty() {
            line.push(' ');
            line.push_str(&Value::Object(fields.clone()).to_string());
        }
        line
    }
}

impl Default for BracketedFormat {
    fn default() -> Self {
        Self::new()
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

impl<S, N> FormatEvent<S, N> for BracketedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let timestamp = chrono::Local::now()
            .format(&self.timestamp_format)
            .to_string();
        let line = self.render(
            &timestamp,
            event.metadata().level(),
            &collector.message,
            &collector.fields,
        );

        writeln!(writer, "{}", line)
    }
}

/// Splits an event into its `message` and the remaining structured fields.
#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(BracketedFormat::new())
            .with_writer(buffer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_render_without_fields() {
        let line = BracketedFormat::new().render("2024-01-02 03:04:05", &Level::INFO, "hola", &Map::new());
        assert_eq!(line, "[2024-01-02 03:04:05] [INFO] hola");
    }

    #[test]
    fn test_render_with_fields() {
        let mut fields = Map::new();
        fields.insert("email".into(), Value::String("a@b.co".into()));
        let line = BracketedFormat::new().render("2024-01-02 03:04:05", &Level::WARN, "aviso", &fields);
        assert_eq!(line, r#"[2024-01-02 03:04:05] [WARNING] aviso {"email":"a@b.co"}"#);
    }

    #[test]
    fn test_event_is_one_line() {
        let out = capture(|| {
            tracing::error!(code = 500, "fallo de base de datos");
        });

        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with('['));
        assert!(out.contains("] [ERROR] fallo de base de datos {\"code\":500}"));
    }

    #[test]
    fn test_plain_message_has_no_context() {
        let out = capture(|| tracing::info!("servidor iniciado"));
        assert!(out.trim_end().ends_with("[INFO] servidor iniciado"));
    }
}
