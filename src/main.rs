use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use textres::convert::{convert_file, ConvertOptions, Direction};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "textres",
    about = "Convert binary text resource files to JSON/YAML and back",
    after_help = "Direction is picked from the extensions: exactly one of INPUT and OUTPUT \
                  must end in .json, .yaml or .yml."
)]
struct Cli {
    /// Source file (binary resource, or .json/.yaml/.yml message list)
    input: PathBuf,
    /// Destination file
    output: PathBuf,
    /// Write to a temp file and rename it over OUTPUT when done
    #[arg(long)]
    atomic: bool,
    /// When OUTPUT is an existing binary file, keep its resource header
    #[arg(long)]
    preserve_header: bool,
    /// Log every record
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.verbose, cli.quiet) {
        (true, _)  => Level::DEBUG,
        (_, true)  => Level::ERROR,
        _          => Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(())   => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let opts = ConvertOptions {
        atomic:          cli.atomic,
        preserve_header: cli.preserve_header,
    };
    let report = convert_file(&cli.input, &cli.output, &opts)?;

    let what = match report.direction {
        Direction::BinaryToText(fmt) => format!("decoded to {}", fmt.name()),
        Direction::TextToBinary(fmt) => format!("encoded from {}", fmt.name()),
    };
    println!("{} messages {} → {}", report.messages, what, cli.output.display());
    if !report.duplicates.is_empty() {
        println!("  {} duplicate id(s)", report.duplicates.len());
    }
    Ok(())
}
