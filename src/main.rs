//! Main binary entry point for the vulnrep-converter.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use vulnrep_converter::errors::ConverterError;
use vulnrep_converter::formats::Format;
use vulnrep_converter::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    #[arg(short, long, value_name = "FILE", help = "Output file (default: stdout)")]
    output: Option<PathBuf>,

    #[arg(long, value_enum, help = "Input format (default: from extension)")]
    from: Option<Format>,

    #[arg(long, value_enum, help = "Output format (default: from extension, else json)")]
    to: Option<Format>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long, help = "Validate JSON input against the report schema first")]
    validate: bool,

    #[arg(long, help = "Only check the input for consistency problems")]
    check: bool,
}

fn setup_logging(verbose: bool) {
    let filter_level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, filter_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run_app() -> Result<(), ConverterError> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config {
        input_file: cli.input,
        output_file: cli.output,
        input_format: cli.from,
        output_format: cli.to,
        validate: cli.validate,
    };

    if cli.check {
        let report = vulnrep_converter::check(&config)?;
        report.print_colored();
        return match report.first_error() {
            Some(issue) => Err(ConverterError::validation(
                issue.location.clone().unwrap_or_else(|| "report".to_string()),
                issue.message.clone(),
            )),
            None => Ok(()),
        };
    }

    vulnrep_converter::run(config)
}

fn main() -> ExitCode {
    match run_app() {
        Ok(_) => {
            log::info!("Completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("A fatal error occurred:");
            log::error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                log::error!("  Caused by: {}", s);
                source = std::error::Error::source(s);
            }
            ExitCode::FAILURE
        }
    }
}
