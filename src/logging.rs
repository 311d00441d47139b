//! Logging setup on top of `tracing`.
//!
//! [`init`] installs a human-readable fmt pipeline filtered by `RUST_LOG`
//! (falling back to the given default). On unix, [`SocketLayer`] can be
//! stacked on any registry to forward every event as one JSON object to a
//! log-shipping program listening on a unix socket.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
pub use socket::SocketLayer;

/// Install the global subscriber. Returns false if one was already set.
pub fn init(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Like [`init`], additionally forwarding events to the unix socket at `path`.
#[cfg(unix)]
pub fn init_with_socket(default_filter: &str, path: impl Into<std::path::PathBuf>) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(SocketLayer::new(path))
        .try_init()
        .is_ok()
}

#[cfg(unix)]
mod socket {
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;

    use chrono::{SecondsFormat, Utc};
    use serde_json::{Map, Value};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};

    /// Writes each event as a JSON line to a unix socket, dialling per event.
    ///
    /// The reader on the other end is a program, so the format is always
    /// JSON regardless of how the terminal output is formatted. Failures to
    /// dial or write are reported on stderr and never reach the caller.
    #[derive(Debug, Clone)]
    pub struct SocketLayer {
        path: PathBuf,
    }

    impl SocketLayer {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        fn send(&self, line: &[u8]) {
            let mut stream = match UnixStream::connect(&self.path) {
                Ok(stream) => stream,
                Err(err) => {
                    eprintln!("unable to dial log socket {}: {}", self.path.display(), err);
                    return;
                }
            };
            if let Err(err) = stream.write_all(line) {
                eprintln!("unable to write to log socket {}: {}", self.path.display(), err);
            }
        }
    }

    #[derive(Default)]
    struct JsonVisitor {
        fields: Map<String, Value>,
    }

    impl JsonVisitor {
        fn insert(&mut self, field: &Field, value: Value) {
            let name = match field.name() {
                "message" => "msg",
                other => other,
            };
            self.fields.insert(name.to_string(), value);
        }
    }

    impl Visit for JsonVisitor {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.insert(field, Value::from(value));
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.insert(field, Value::from(value));
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.insert(field, Value::from(value));
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.insert(field, Value::from(value));
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.insert(field, Value::from(format!("{:?}", value)));
        }
    }

    fn format_event(event: &Event<'_>) -> Vec<u8> {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let mut fields = visitor.fields;
        fields.insert(
            "level".into(),
            Value::from(metadata.level().as_str().to_lowercase()),
        );
        fields.insert("target".into(), Value::from(metadata.target()));
        fields.insert(
            "time".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        let mut line = Value::Object(fields).to_string().into_bytes();
        line.push(b'\n');
        line
    }

    impl<S: Subscriber> Layer<S> for SocketLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.send(&format_event(event));
        }
    }

}
