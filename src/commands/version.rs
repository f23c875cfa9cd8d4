//! Command: print version information.

/// Version reported by the binary and written to log headers.
#[must_use]
pub fn version() -> &'static str {
    option_env!("PTOOLS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// The version line for `version`.
#[must_use]
pub fn line(version: &str) -> String {
    format!("ptools {version}")
}

/// Print the version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("{}", line(version()));
}
