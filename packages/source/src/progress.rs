//! Progress reporting for snapshot loading.
//!
//! Loading reports one unit of work per snapshot file. Rendering is left to
//! the caller: the CLI draws an `indicatif` bar, tests stay silent with
//! [`NullProgress`].

/// Receives progress updates while snapshots are loaded.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of snapshot files to load.
    fn set_total(&self, total: u64);

    /// Advances by `delta` files.
    fn inc(&self, delta: u64);

    /// Shows the file currently being read.
    fn set_message(&self, msg: String);

    /// Marks loading as complete.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
