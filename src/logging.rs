use std::sync::Mutex;

/// Install the global `tracing` subscriber. With a file, events are written
/// into it as JSON lines. Otherwise they go to stderr in a compact form.
pub fn logging_setup(level: &tracing::Level, file: Option<std::fs::File>) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(*level)
        .with_target(false);
    let res = match file {
        Some(file) => builder.json().with_writer(Mutex::new(file)).try_init(),
        None => builder
            .without_time()
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if let Err(err) = res {
        eprintln!("fail to setup logging: {err}");
    }
}
