//! Workspace tasks: `cargo run -p xtask -- ci` and `cargo run -p xtask -- package`.

use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

type TaskResult = Result<(), Box<dyn Error>>;

/// Binaries deployed as Lambda functions. Each zip holds one `bootstrap`.
const LAMBDA_BINARIES: [&str; 2] = ["relay_runtime", "caller_identity"];

#[derive(Parser)]
#[command(name = "xtask", about = "Credential relay workspace tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Formatting, clippy with warnings denied, and the workspace tests
    Ci,
    /// Build the Lambda binaries and zip each one as `bootstrap`
    Package {
        /// Target triple of the Lambda runtime
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving `<binary>.zip`
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> TaskResult {
    let command = args.join(" ");
    eprintln!("+ cargo {command}");
    let status = Command::new("cargo").args(args).status()?;
    if status.success() {
        return Ok(());
    }
    Err(format!("`cargo {command}` failed with {status}").into())
}

fn ci() -> TaskResult {
    step("Formatting");
    cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])?;

    step("Tests");
    cargo(&["test", "--workspace"])
}

fn package(target: &str, profile: BuildProfile, out_dir: &Path) -> TaskResult {
    require_target(target)?;

    step("Build Lambda binaries");
    let mut args = vec!["build", "-p", "cred_relay_lambda", "--target", target];
    for bin in LAMBDA_BINARIES {
        args.extend(["--bin", bin]);
    }
    args.extend(profile.cargo_flag());
    cargo(&args)?;

    step("Zip Lambda binaries");
    let build_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(out_dir)?;
    for bin in LAMBDA_BINARIES {
        let zip_path = out_dir.join(format!("{bin}.zip"));
        write_bootstrap_zip(&build_dir.join(bin), &zip_path)?;
        eprintln!("- {}", zip_path.display());
    }
    Ok(())
}

/// Checks the target is installed when rustup is around; without rustup the
/// build reports a missing target itself.
fn require_target(target: &str) -> TaskResult {
    let listing = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();
    let Ok(output) = listing else {
        eprintln!("warning: rustup not found, skipping the target check");
        return Ok(());
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        return Ok(());
    }
    let message = format!("target `{target}` is not installed, run `rustup target add {target}`");
    Err(message.into())
}

fn write_bootstrap_zip(binary: &Path, zip_path: &Path) -> TaskResult {
    let bytes = fs::read(binary)
        .map_err(|error| format!("cannot read {}: {error}", binary.display()))?;

    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)?;
    zip.write_all(&bytes)?;
    zip.finish()?;
    Ok(())
}

fn main() {
    let result = match Cli::parse().command {
        Commands::Ci => ci(),
        Commands::Package {
            target,
            profile,
            out_dir,
        } => package(&target, profile, &out_dir),
    };

    if let Err(error) = result {
        eprintln!("\nxtask failed: {error}");
        exit(1);
    }
}
