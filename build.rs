//! Build script for mp3repair
//!
//! Records build information for the `about` command and embeds version info
//! into the Windows executable.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    println!("cargo:rustc-env=MP3REPAIR_BUILD_TIMESTAMP={}", timestamp);

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let compiler = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown compiler".to_string());
    println!("cargo:rustc-env=MP3REPAIR_COMPILER={}", compiler);

    let manifest = std::env::var("CARGO_MANIFEST_DIR")
        .map(|dir| std::path::Path::new(&dir).join("Cargo.toml"))
        .ok()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default();
    println!(
        "cargo:rustc-env=MP3REPAIR_DEPENDENCIES={}",
        dependency_list(&manifest).join(";")
    );

    #[cfg(target_os = "windows")]
    {
        windows_build();
    }
}

/// Extract `name version` pairs from the `[dependencies]` table.
fn dependency_list(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut deps = Vec::new();
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.split('#').next().unwrap_or_default();
        let version = if let Some(start) = value.find("version") {
            value[start..].split('"').nth(1)
        } else {
            value.split('"').nth(1)
        };
        if let Some(version) = version {
            deps.push(format!("{} {}", name.trim(), version));
        }
    }
    deps
}

#[cfg(target_os = "windows")]
fn windows_build() {
    let mut res = winresource::WindowsResource::new();

    res.set("ProductName", "mp3repair");
    res.set("FileDescription", "MP3 library metadata repair tool");
    res.set("LegalCopyright", "MIT License");

    if let Err(e) = res.compile() {
        eprintln!("Failed to compile Windows resources: {}", e);
    }
}
