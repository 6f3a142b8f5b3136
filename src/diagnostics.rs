//! System diagnostics and dependency checking.
//!
//! Verifies that the external tools the server shells out to are installed
//! before any job hits them.

use crate::config::Config;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("--version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but --version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Check for an NVIDIA GPU via `nvidia-smi`.
fn check_gpu() -> CheckResult {
    match Command::new("nvidia-smi")
        .arg("--query-gpu=gpu_name")
        .arg("--format=csv,noheader")
        .output()
    {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning("nvidia-smi found but query failed".to_string()),
        Err(_) => CheckResult::NotFound,
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies(config: &Config) {
    println!("Checking system dependencies...\n");

    print!("ffmpeg (media transcoding): ");
    match check_command("ffmpeg") {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
            println!("           sudo pacman -S ffmpeg    (Arch)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("{} (model host): ", config.models.sidecar_command);
    match check_command(&config.models.sidecar_command) {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  The model host must be on PATH or set via models.sidecar_command");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    if config.models.device == "cuda" {
        print!("NVIDIA GPU (device = cuda): ");
        match check_gpu() {
            CheckResult::Ok => println!("✓ OK"),
            CheckResult::NotFound => {
                println!("- nvidia-smi not found");
                println!("  Set models.device = \"cpu\" to run without a GPU");
            }
            CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
        }
    }
}
