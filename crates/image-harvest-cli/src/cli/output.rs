//! Output mode shared by all subcommands.

use anyhow::Result;
use serde::Serialize;

const JSON_ENV: &str = "IMAGE_HARVEST_JSON";
const QUIET_ENV: &str = "IMAGE_HARVEST_QUIET";

/// True when `--json` was passed.
pub fn is_json() -> bool {
    std::env::var(JSON_ENV).is_ok_and(|v| v == "1")
}

/// True when `--quiet` was passed.
pub fn is_quiet() -> bool {
    std::env::var(QUIET_ENV).is_ok_and(|v| v == "1")
}

/// Record global output flags for the rest of the process.
pub fn set_flags(json: bool, quiet: bool) {
    if json {
        std::env::set_var(JSON_ENV, "1");
    }
    if quiet {
        std::env::set_var(QUIET_ENV, "1");
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
