use tracing::Level;

/// Install a compact subscriber writing to stderr. Safe to call multiple
/// times; later calls leave the first subscriber in place.
///
/// The library never installs a subscriber by itself. Embedding
/// applications that already route `tracing` elsewhere skip this.
pub fn init_default() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}

/// Like [`init_default`], but output goes through the test harness capture
/// so it only shows for failing tests.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}
