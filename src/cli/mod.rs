//! CLI Module
//!
//! Command-line interface for the dubmix mixer and compositor.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::compositor::ClipDescriptor;

/// Dubmix - bus mixer and surgical dialogue compositor
#[derive(Parser, Debug)]
#[command(name = "dubmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default bus configuration document
    #[command(name = "init-config")]
    InitConfig {
        /// Where to write the document
        path: PathBuf,
    },

    /// Print per-bus status for a configuration document
    #[command(name = "status")]
    Status {
        /// Bus configuration document
        config: PathBuf,
    },

    /// Mix WAV stems through the bus graph
    #[command(name = "mix")]
    Mix {
        /// Bus configuration document to apply first
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mixer settings (sample rate, normalization, ...)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Dialogue stem
        #[arg(long)]
        voice: Option<PathBuf>,

        /// Music stem
        #[arg(long)]
        music: Option<PathBuf>,

        /// Sound effects stem
        #[arg(long)]
        sfx: Option<PathBuf>,

        /// Ambience stem
        #[arg(long)]
        env: Option<PathBuf>,

        /// Output WAV
        #[arg(short, long)]
        output: PathBuf,

        /// Output bit depth (16, 24 or 32 float)
        #[arg(long, default_value_t = 24)]
        bit_depth: u16,
    },

    /// Replace dialogue segments in a background track
    #[command(name = "surgery")]
    Surgery {
        /// Background video or audio
        #[arg(short, long)]
        background: PathBuf,

        /// Replacement clip as <path>@<start seconds>, repeatable
        #[arg(long = "clip", value_parser = parse_clip)]
        clips: Vec<ClipDescriptor>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Compositor settings document
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Disable background ducking
        #[arg(long)]
        no_duck: bool,

        /// Fraction of the background removed while ducked
        #[arg(long)]
        duck_attenuation: Option<f32>,

        /// Mix WAV inputs in memory instead of calling ffmpeg
        #[arg(long)]
        offline: bool,
    },
}

fn parse_clip(value: &str) -> std::result::Result<ClipDescriptor, String> {
    value.parse().map_err(|e: crate::DubmixError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_surgery_arguments() {
        let cli = Cli::try_parse_from([
            "dubmix",
            "surgery",
            "--background",
            "ep01.mp4",
            "--clip",
            "l1.wav@1.5",
            "--clip",
            "l2.wav@4",
            "--output",
            "out.mp4",
            "--no-duck",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Surgery { clips, no_duck, .. }) => {
                assert_eq!(clips.len(), 2);
                assert_eq!(clips[1].start_time, 4.0);
                assert!(no_duck);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_clip_argument_is_rejected() {
        let result = Cli::try_parse_from([
            "dubmix",
            "surgery",
            "--background",
            "ep01.mp4",
            "--clip",
            "l1.wav",
            "--output",
            "out.mp4",
        ]);
        assert!(result.is_err());
    }
}
