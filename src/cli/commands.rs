// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands `record`, `summary` and
// `inspect` and their flags.

use clap::{Args, Subcommand};
use crate::application::record_use_case::RecordConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo MLP inside a recording window and save the result
    Record(RecordArgs),

    /// Print the module tree of a saved recording
    Summary(SummaryArgs),

    /// Browse a saved recording one module at a time
    Inspect(InspectArgs),
}

/// All arguments for the `record` command.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Where to write the recording (JSON)
    #[arg(long, default_value = "recordings/mlp.json")]
    pub output: String,

    /// Width of the network input
    #[arg(long, default_value_t = 16)]
    pub d_input: usize,

    /// Width of the hidden layer between fc1 and fc2
    #[arg(long, default_value_t = 32)]
    pub d_hidden: usize,

    /// Width of the network output
    #[arg(long, default_value_t = 4)]
    pub d_output: usize,

    /// Rows per random input batch
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Forward passes to record
    #[arg(long, default_value_t = 3)]
    pub steps: usize,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// The application layer never sees clap types.
impl From<RecordArgs> for RecordConfig {
    fn from(a: RecordArgs) -> Self {
        RecordConfig {
            output:     a.output,
            d_input:    a.d_input,
            d_hidden:   a.d_hidden,
            d_output:   a.d_output,
            batch_size: a.batch_size,
            steps:      a.steps,
            pretty:     a.pretty,
        }
    }
}

/// All arguments for the `summary` command
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Recording to read
    #[arg(long, default_value = "recordings/mlp.json")]
    pub input: String,
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Recording to read
    #[arg(long, default_value = "recordings/mlp.json")]
    pub input: String,

    /// Dotted module name to open first (defaults to the first root)
    #[arg(long)]
    pub module: Option<String>,
}
