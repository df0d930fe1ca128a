//! Command: print version information.

/// The version string baked in at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("PUNKT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the punkt version to stdout.
pub fn run() {
    println!("punkt {}", version());
}
