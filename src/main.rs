use anyhow::Result;
use clap::Parser;
use dr_tensor::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dr_tensor=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
