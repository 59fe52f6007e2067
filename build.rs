use std::env;
use std::process::Command;

/// Short commit id from git, or from `GIT_SHA` when building outside a checkout
fn commit_id() -> Option<String> {
    let from_git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    from_git
        .or_else(|| env::var("GIT_SHA").ok())
        .filter(|sha| !sha.is_empty())
}

fn flag_enabled(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn main() {
    let base = env!("CARGO_PKG_VERSION");

    let version = if flag_enabled("SERRE_NIGHTLY") {
        match commit_id() {
            Some(sha) => format!("{base}-nightly+{sha}"),
            None => format!("{base}-nightly"),
        }
    } else {
        base.to_string()
    };
    println!("cargo:rustc-env=APP_VERSION={version}");

    for var in ["SERRE_NIGHTLY", "GIT_SHA"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
}
