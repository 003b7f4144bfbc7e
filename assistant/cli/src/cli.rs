//! Command-line arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use studyspace_core::StudyConfig;

/// Summaries, flashcards and quiz questions from any text
#[derive(Debug, Parser)]
#[command(name = "studyspace", version, about)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/studyspace/config.toml)
    #[arg(long, global = true, env = "STUDYSPACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ollama model to generate with
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Per-operation timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print responses as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize a passage, streaming the summary as it is generated
    Summarize(InputArgs),
    /// Generate flashcards from a summary
    Flashcards(InputArgs),
    /// Generate a multiple-choice question from a summary
    Quiz(InputArgs),
    /// Summarize a passage, then derive flashcards and a quiz from it
    Study(InputArgs),
    /// Report whether the model is available
    Status,
}

/// Where to read text from
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Read from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut StudyConfig) {
        if let Some(ref model) = self.model {
            config.model.clone_from(model);
        }
        if let Some(secs) = self.timeout {
            config.processing_timeout = Duration::from_secs(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_study_with_file() {
        let cli = Cli::try_parse_from(["studyspace", "--json", "study", "--file", "notes.txt"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Study(input) => assert_eq!(input.file, Some(PathBuf::from("notes.txt"))),
            other => panic!("Expected study command, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_beat_config() {
        let cli = Cli::try_parse_from(["studyspace", "quiz", "--model", "phi3", "--timeout", "9"])
            .unwrap();
        let mut config = StudyConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.model, "phi3");
        assert_eq!(config.processing_timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_status_takes_no_input() {
        assert!(Cli::try_parse_from(["studyspace", "status", "--file", "x"]).is_err());
    }
}
