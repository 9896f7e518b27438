//! Log output for the binaries: a console layer and, optionally, a plain-text
//! file layer tagged with source locations.

use std::{fs::File, io, path::Path, sync::Mutex};

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*, registry::LookupSpan};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str =
  "info,firehose_collector=debug,firehose_store_sqlite=debug";

/// Uncoloured fmt layer writing to `file`, with the emitting file and line.
pub fn file_layer<S>(file: File) -> impl Layer<S> + Send + Sync
where
  S: Subscriber + for<'a> LookupSpan<'a>,
{
  fmt::layer()
    .with_ansi(false)
    .with_file(true)
    .with_line_number(true)
    .with_writer(Mutex::new(file))
}

/// Install the global subscriber. An existing `log_file` is truncated.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
  let file = log_file.map(File::create).transpose()?;

  tracing_subscriber::registry()
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
    )
    .with(fmt::layer())
    .with(file.map(file_layer))
    .init();
  Ok(())
}
