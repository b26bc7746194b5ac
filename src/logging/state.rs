use once_cell::sync::OnceCell;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

/// File writer guard; dropping it would stop the background log flusher
pub static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
/// Subscriber installation happens at most once per process
pub static INIT_ONCE: Once = Once::new();
/// Error from that single attempt, replayed to later callers
pub static INIT_ERROR: OnceCell<String> = OnceCell::new();
