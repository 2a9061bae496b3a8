//! Exports the build identification that `main` logs at startup.
//!
//! `CRASHLENS_GIT_HASH` overrides the git lookup for builds made outside a
//! checkout (container images, source tarballs).

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_short_hash() -> Option<String> {
    if let Ok(hash) = env::var("CRASHLENS_GIT_HASH") {
        let hash = hash.trim();
        if !hash.is_empty() {
            return Some(hash.to_string());
        }
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}

fn export(name: &str, value: &str) {
    println!("cargo:rustc-env={}={}", name, value);
}

fn main() {
    export(
        "GIT_HASH",
        git_short_hash().as_deref().unwrap_or(UNKNOWN),
    );
    export(
        "BUILD_TIMESTAMP",
        &chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    export(
        "BUILD_PROFILE",
        &env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string()),
    );
}
