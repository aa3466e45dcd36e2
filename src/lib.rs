//! Main library for the vulnerability report converter.
//!
//! This crate converts security advisories between CVRF 1.2 XML and a
//! CSAF-style JSON rendition through one in-memory [`model::Report`].
//! The core entry points are [`formats::decode`], [`formats::encode`] and
//! [`convert`]; [`run`] is the file-level driver used by the binary.

pub mod errors;
pub mod fidelity;
pub mod formats;
pub mod model;
pub mod schema;
pub mod validation;

use errors::ConverterError;
use formats::Format;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use validation::ValidationReport;

/// Formats for one in-memory conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub from: Format,
    pub to: Format,
}

/// Top-level configuration for a conversion run.
#[derive(Debug)]
pub struct Config {
    pub input_file: PathBuf,
    /// Standard output when `None`.
    pub output_file: Option<PathBuf>,
    pub input_format: Option<Format>,
    pub output_format: Option<Format>,
    pub validate: bool,
}

impl Config {
    /// Explicit format, else the input file's extension.
    pub fn resolved_input_format(&self) -> Result<Format, ConverterError> {
        match self.input_format {
            Some(format) => Ok(format),
            None => Format::from_extension(&self.input_file),
        }
    }

    /// Explicit format, else XML for a `.xml` output file and JSON otherwise.
    pub fn resolved_output_format(&self) -> Format {
        if let Some(format) = self.output_format {
            return format;
        }
        match &self.output_file {
            Some(path) if Format::from_extension(path).ok() == Some(Format::Xml) => Format::Xml,
            _ => Format::Json,
        }
    }
}

/// Decodes one document from `reader` and encodes it to `writer`.
pub fn convert<R: Read, W: Write>(
    reader: R,
    writer: W,
    options: &ConvertOptions,
) -> Result<(), ConverterError> {
    let report = formats::decode(options.from, reader)?;
    formats::encode(options.to, &report, writer)
}

/// The main entry point for the conversion logic.
///
/// The whole output is encoded in memory before the destination is opened,
/// so a failed conversion never leaves a partial file behind.
pub fn run(config: Config) -> Result<(), ConverterError> {
    let start_time = Instant::now();
    let input_format = config.resolved_input_format()?;
    let output_format = config.resolved_output_format();

    info!("Starting conversion");
    info!("  Input: {} ({:?})", config.input_file.display(), input_format);
    match &config.output_file {
        Some(path) => info!("  Output: {} ({:?})", path.display(), output_format),
        None => info!("  Output: <stdout> ({:?})", output_format),
    }

    let input = std::fs::read(&config.input_file)
        .map_err(|e| ConverterError::Io(e, "Failed to read input file".to_string()))?;

    // --- 1. Validation (Optional) ---
    if config.validate {
        let schema_start = Instant::now();
        if input_format == Format::Json {
            info!("Running schema pre-validation...");
            schema::validate_json_schema(schema::REPORT_SCHEMA, &input)?;
            info!(
                "Validation passed successfully. (Took {:.2?})",
                schema_start.elapsed()
            );
        } else {
            warn!("Schema validation only applies to JSON input; skipping.");
        }
    }

    // --- 2. Decode and encode in memory ---
    let conversion_start = Instant::now();
    let mut encoded = Vec::new();
    convert(
        input.as_slice(),
        &mut encoded,
        &ConvertOptions {
            from: input_format,
            to: output_format,
        },
    )?;
    info!(
        "Conversion finished. (Took {:.2?})",
        conversion_start.elapsed()
    );

    // --- 3. Write ---
    write_output(config.output_file.as_deref(), &encoded)?;

    info!("Total execution time: {:.2?}", start_time.elapsed());
    Ok(())
}

/// Decodes the input without failing on consistency errors and returns
/// every issue found.
pub fn check(config: &Config) -> Result<ValidationReport, ConverterError> {
    let input_format = config.resolved_input_format()?;
    let file = File::open(&config.input_file)
        .map_err(|e| ConverterError::Io(e, "Failed to open input file".to_string()))?;
    let report = formats::decode_lenient(input_format, BufReader::new(file))?;
    Ok(validation::validate_report(&report).with_file(&config.input_file))
}

/// Writes `bytes` to `path`, or to standard output.
///
/// When writing and releasing the destination both fail, the write error
/// is the one reported.
fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), ConverterError> {
    let Some(path) = path else {
        let mut stdout = io::stdout().lock();
        let written = stdout.write_all(bytes);
        let flushed = stdout.flush();
        return written
            .and(flushed)
            .map_err(|e| ConverterError::Io(e, "Failed to write to stdout".to_string()));
    };

    let file = File::create(path).map_err(|e| {
        ConverterError::Io(
            e,
            format!("Failed to create output file {}", path.display()),
        )
    })?;
    let mut writer = BufWriter::new(file);
    let written = writer
        .write_all(bytes)
        .map_err(|e| ConverterError::Io(e, "Failed to write output file".to_string()));
    written.and(release(writer))
}

fn release(writer: BufWriter<File>) -> Result<(), ConverterError> {
    let file = writer.into_inner().map_err(|e| {
        ConverterError::Io(e.into_error(), "Failed to flush output file".to_string())
    })?;
    file.sync_all()
        .map_err(|e| ConverterError::Io(e, "Failed to sync output file".to_string()))
}
