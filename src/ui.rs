//! Banner and version text.

const LOGO: &str = r"
   ___                   ____  ____  ____
  / _ \ _ __   ___ _ __ / ___||  _ \|  _ \
 | | | | '_ \ / _ \ '_ \\___ \| | | | | | |
 | |_| | |_) |  __/ | | |___) | |_| | |_| |
  \___/| .__/ \___|_| |_|____/|____/|____/
       |_|
";

/// ASCII logo, with leading and trailing newlines.
pub fn logo() -> &'static str {
    LOGO
}

/// Version injected at build time via `OSDD_VERSION`, or `dev`.
pub fn version() -> &'static str {
    option_env!("OSDD_VERSION").unwrap_or("dev")
}

/// Whether a release version was injected at build time.
pub fn version_is_set() -> bool {
    version() != "dev"
}

/// Lines printed by `osdd version` after the logo.
pub fn version_lines() -> Vec<String> {
    let mut lines = vec![format!("OpenSDD CLI version {}", version())];
    if !version_is_set() {
        lines.push("WARNING: Version not set at build time".to_string());
    }
    lines
}
