//! Engine diagnostics with colored terminal output.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the parser, the query engine and the reference host to report
//! problems that do not abort the current operation.

use std::collections::HashSet;
use std::env;
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Environment variable enabling [`debug`] output.
pub const DEBUG_ENV: &str = "EXTCSS_DEBUG";

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about a recoverable problem (prints once per unique message)
///
/// # Example
/// ```ignore
/// warn_once("Query", "branch of :is() rejected by host: 'div:foo'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_print = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_print {
        eprintln!("{}", format!("[ExtCss {component}] ⚠ {message}").yellow());
    }
}

/// Report an error that is about to be returned to the caller.
pub fn error(component: &str, message: &str) {
    eprintln!("{}", format!("[ExtCss {component}] ✖ {message}").red());
}

/// Trace output, printed only when `EXTCSS_DEBUG` is set.
pub fn debug(component: &str, message: &str) {
    if debug_enabled() {
        eprintln!("{}", format!("[ExtCss {component}] {message}").dimmed());
    }
}

/// Whether [`debug`] output is enabled for this process.
#[must_use]
pub fn debug_enabled() -> bool {
    env::var_os(DEBUG_ENV).is_some_and(|v| !v.is_empty() && v != "0")
}

/// Clear all recorded warnings (call when switching documents)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Number of distinct warnings printed since the last [`clear_warnings`].
#[must_use]
pub fn warning_count() -> usize {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map_or(0, HashSet::len)
}
