use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let values = [
        (
            "HASH",
            command_output("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(unknown),
        ),
        (
            "STATUS",
            command_output("git", &["status", "--porcelain"])
                .map(|out| if out.is_empty() { "clean" } else { "dirty" }.to_string())
                .unwrap_or_else(unknown),
        ),
        (
            "TIMESTAMP",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
        ("TARGET", env::var("TARGET").unwrap_or_else(|_| unknown())),
        ("PROFILE", env::var("PROFILE").unwrap_or_else(|_| unknown())),
        (
            "RUSTC",
            command_output("rustc", &["--version"]).unwrap_or_else(unknown),
        ),
    ];
    for (key, value) in values {
        println!("cargo:rustc-env=MEALBANK_BUILD_{key}={value}");
    }
}

/// Trimmed stdout of a successful command; `None` when it fails or is missing.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn unknown() -> String {
    "unknown".to_string()
}
