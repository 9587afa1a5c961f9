//! Rigsmith CLI - Command-line interface for rigging static GLB models

pub mod progress;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::Level;

use crate::converter::rig_glb::{
    RigOptions, RigProgress, default_output_path, rig_glb_file_with_progress,
};

#[derive(Parser, Debug)]
#[command(name = "rigsmith", version)]
#[command(about = "Rigsmith: add a humanoid skeleton, skin weights and animations to a GLB model", long_about = None)]
pub struct Cli {
    /// Static .glb model to rig
    pub input: PathBuf,

    /// Output file (default: <input-stem>_rigged<input-ext> next to the input)
    pub output: Option<PathBuf>,

    /// Bones bound to each vertex (above 4 adds JOINTS_1/WEIGHTS_1)
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub max_influences: u8,

    /// Name of the generated skin
    #[arg(long, default_value = "Armature")]
    pub skin_name: String,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Map the flags onto rigging options.
    #[must_use]
    pub fn options(&self) -> RigOptions {
        RigOptions::new()
            .with_max_influences(usize::from(self.max_influences))
            .with_skin_name(self.skin_name.clone())
    }

    fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

/// Run the Rigsmith CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    run(&cli)
}

/// The line printed to stderr when a run fails: `error: <Stage> failed: <cause>`.
#[must_use]
pub fn failure_line(err: &anyhow::Error) -> String {
    format!("{} {err}", console::style("error:").red().bold())
}

/// Rig `cli.input` as described by the parsed flags.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let output = match &cli.output {
        Some(path) => path.clone(),
        None => default_output_path(&cli.input)?,
    };
    let options = cli.options();
    let quiet = cli.quiet;

    let started = Instant::now();
    let report = move |p: &RigProgress| {
        if !quiet {
            progress::print_progress(p);
        }
    };
    let summary = rig_glb_file_with_progress(&cli.input, &output, &options, &report)?;

    if !quiet {
        println!();
        progress::print_detail(
            "Skeleton",
            &format!("{} bones, skin \"{}\"", summary.bones, options.skin_name),
        );
        progress::print_detail(
            "Skinned",
            &format!(
                "{} vertices in {} primitive(s), {} influences each",
                summary.vertices, summary.primitives, options.max_influences
            ),
        );
        progress::print_detail("Animations", &summary.clips.join(", "));
        progress::print_detail(
            "Output",
            &format!(
                "{} ({} payload)",
                output.display(),
                progress::human_bytes(summary.payload_bytes)
            ),
        );
        progress::print_done(started.elapsed());
    }

    Ok(())
}
