//! Build script for aqua-insights
//!
//! Captures build identification reported by `GET /health`:
//! git commit hash (short form), build timestamp and build profile.

use std::process::Command;

fn main() {
    // Capture git commit hash (short form, 8 characters)
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    // RFC 3339 with local offset
    let build_timestamp = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);

    // Determine build profile
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    // Make values available to the binary via environment variables
    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // No rerun-if-changed directives: rerun on every build so the stamp stays current
}
