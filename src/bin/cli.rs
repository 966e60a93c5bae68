// src/bin/cli.rs
use top500_importer::cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let code = cli::run(std::env::args_os())?;
    std::process::exit(code);
}
