use clap::Parser;
use paste_alignments::args::{Cli, Commands};
use paste_alignments::paste_process;

fn main() -> std::process::ExitCode {
    let args = Cli::parse();

    let result = match args.command {
        Commands::Paste(cmd_args) => paste_process(cmd_args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
