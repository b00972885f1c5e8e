use clap::Parser;
use sigtrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    sigtrader::logging::init(cli.verbose);
    run(cli)
}
