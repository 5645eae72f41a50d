use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Crates that must build `no_std` for the ARM7TDMI target in isolation
/// (no `hardware` feature — that one's exercised separately against
/// `firmware`, since it's the only crate with a `[[bin]]`).
const NO_STD_CRATES: &[&str] = &[
    "hal",
    "alloc-pool",
    "storage",
    "bootloader",
    "audio-driver",
    "playback",
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking all crates...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for crate_name in NO_STD_CRATES {
        println!(
            "{}",
            format!("  Checking {crate_name} (no_std, armv4t-none-eabi)...").cyan()
        );
        let start = Instant::now();

        let output = Command::new("cargo")
            .args([
                "check",
                "-p",
                crate_name,
                "--target",
                "armv4t-none-eabi",
                "--no-default-features",
            ])
            .output()
            .with_context(|| format!("failed to check {crate_name}"))?;

        if !output.status.success() {
            eprintln!("{}", format!("  ✗ {crate_name} check failed").red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{crate_name} check failed");
        }

        println!(
            "{}",
            format!("  ✓ {crate_name} check passed in {:.2}s", start.elapsed().as_secs_f64())
                .green()
        );
        println!();
    }

    println!("{}", "  Checking firmware binary (hardware feature)...".cyan());
    let fw_start = Instant::now();

    let fw_output = Command::new("cargo")
        .args([
            "check",
            "-p",
            "firmware",
            "--target",
            "armv4t-none-eabi",
            "--features",
            "hardware",
        ])
        .output()
        .context("failed to check firmware hardware build")?;

    if !fw_output.status.success() {
        eprintln!("{}", "  ✗ Firmware hardware check failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&fw_output.stderr));
        anyhow::bail!("Firmware hardware check failed");
    }

    println!(
        "{}",
        format!("  ✓ Firmware check passed in {:.2}s", fw_start.elapsed().as_secs_f64()).green()
    );
    println!();

    println!("{}", "  Checking host test build (std feature)...".cyan());
    let host_start = Instant::now();

    let host_output = Command::new("cargo")
        .args(["check", "--workspace", "--tests"])
        .output()
        .context("failed to check host test build")?;

    if !host_output.status.success() {
        eprintln!("{}", "  ✗ Host test build failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&host_output.stderr));
        anyhow::bail!("Host test build failed");
    }

    println!(
        "{}",
        format!("  ✓ Host test build passed in {:.2}s", host_start.elapsed().as_secs_f64())
            .green()
    );
    println!();

    println!("{}", "  Running clippy lints...".cyan());
    let clippy_start = Instant::now();

    let clippy_output = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
        .output()
        .context("failed to run clippy")?;

    if !clippy_output.status.success() {
        eprintln!("{}", "  ✗ Clippy warnings found".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy_output.stderr));
        anyhow::bail!("Clippy check failed");
    }
    println!(
        "{}",
        format!("  ✓ Clippy passed in {:.2}s", clippy_start.elapsed().as_secs_f64()).green()
    );
    println!();

    println!("{}", "  Checking code formatting...".cyan());

    let fmt_output = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()
        .context("failed to run cargo fmt")?;

    if !fmt_output.status.success() {
        eprintln!("{}", "  ✗ Formatting issues found".red().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
        anyhow::bail!("Format check failed");
    }
    println!("{}", "  ✓ Formatting check passed".green());
    println!();

    println!(
        "{}",
        format!("✓ All checks completed in {:.2}s", total_start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();

    Ok(())
}
