//! Classify command: categorizes a single commit message.

use anyhow::Result;
use clap::Parser;

use crate::classify::categorize_commit;
use crate::data::yaml::OutputFormat;

use super::workspace::print_report;

/// Classify command options.
#[derive(Parser)]
pub struct ClassifyCommand {
    /// Commit message to classify.
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Changed file path; repeat for several files.
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<String>,

    /// Treats the commit as a merge commit.
    #[arg(long)]
    pub merge: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
}

impl ClassifyCommand {
    /// Executes the classify command.
    pub fn execute(self) -> Result<()> {
        let files = (!self.files.is_empty()).then_some(self.files.as_slice());
        let result = categorize_commit(&self.message, files, self.merge);
        print_report(&result, self.format)
    }
}
