use crate::error::{LeafBridgeError, Result};
use tracing::Level;

/// Parse a configured level name; `WARNING` is accepted as an alias of `WARN`
pub fn parse_log_level(name: &str) -> Result<Level> {
    match name.to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(LeafBridgeError::config(format!("Unknown log level '{}'", name))),
    }
}

// Higher is quieter
fn verbosity_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        Level::ERROR => 4,
    }
}

/// The more verbose of the console and file levels, used for the shared filter
pub fn min_level(console: Level, file: Level) -> Level {
    if verbosity_rank(console) <= verbosity_rank(file) {
        console
    } else {
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_run_from_trace_to_error() {
        assert!(verbosity_rank(Level::TRACE) < verbosity_rank(Level::DEBUG));
        assert!(verbosity_rank(Level::WARN) < verbosity_rank(Level::ERROR));
        assert_eq!(min_level(Level::ERROR, Level::ERROR), Level::ERROR);
    }
}
