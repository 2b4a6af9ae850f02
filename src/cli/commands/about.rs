//! Version and build information command.

use super::Context;

const BUILD_TIMESTAMP: &str = env!("MP3REPAIR_BUILD_TIMESTAMP");
const COMPILER: &str = env!("MP3REPAIR_COMPILER");
const DEPENDENCIES: &str = env!("MP3REPAIR_DEPENDENCIES");

/// Print version, build time, compiler and dependencies in a box
pub fn cmd_about(ctx: &Context<'_>) -> anyhow::Result<()> {
    for line in framed(&about_lines()) {
        ctx.console.out(&line);
    }
    Ok(())
}

fn build_time(timestamp: &str) -> String {
    timestamp
        .parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "an unknown time".to_string())
}

fn about_lines() -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} version {}, built on {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            build_time(BUILD_TIMESTAMP)
        ),
        format!("Built with {}", COMPILER),
    ];
    let deps: Vec<&str> = DEPENDENCIES.split(';').filter(|d| !d.is_empty()).collect();
    if !deps.is_empty() {
        lines.push("Dependencies:".to_string());
        lines.extend(deps.iter().map(|d| format!("  {}", d)));
    }
    lines
}

/// Surround `lines` with a `+---+` / `| ... |` border.
fn framed(lines: &[String]) -> Vec<String> {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let border = format!("+{}+", "-".repeat(width + 2));
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(border.clone());
    for line in lines {
        let pad = width - line.chars().count();
        out.push(format!("| {}{} |", line, " ".repeat(pad)));
    }
    out.push(border);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::Harness;

    #[test]
    fn test_frame_pads_lines() {
        let out = framed(&["ab".to_string(), "abcd".to_string()]);
        assert_eq!(out, vec!["+------+", "| ab   |", "| abcd |", "+------+"]);
    }

    #[test]
    fn test_build_time_rendering() {
        assert_eq!(build_time("0"), "1970-01-01T00:00:00+00:00");
        assert_eq!(build_time("garbage"), "an unknown time");
    }

    #[test]
    fn test_about_output() {
        let h = Harness::new();
        cmd_about(&h.ctx()).unwrap();
        let out = h.console.out_lines();
        assert!(out[0].starts_with('+'));
        assert!(out.last().unwrap().starts_with('+'));
        assert!(out[1].contains(concat!("mp3repair version ", env!("CARGO_PKG_VERSION"))));
        assert!(out.iter().any(|l| l.contains("clap")));
    }
}
