use clap::Parser;
use img_convert::{convert_images_in_directory, ConversionRequest, OutcomeStatus, TargetFormat};
use shared_utils::error_handler::{install_panic_handler, report_fatal};
use shared_utils::logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "img-convert")]
#[command(version, about = "Convert image files to JPEG or PNG.", long_about = None)]
struct Cli {
    /// The directory containing image files.
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Convert to JPEG instead of PNG.
    #[arg(short, long)]
    jpeg: bool,

    /// Output directory for converted images (default: DIRECTORY/converted_images).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Debug logging, echoed to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Directory for log files (default: system temp directory).
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,

    /// Number of log files kept after pruning.
    #[arg(long, value_name = "N", default_value_t = 5)]
    keep_logs: usize,
}

impl Cli {
    fn request(&self) -> ConversionRequest {
        let request = ConversionRequest::new(
            self.directory.clone(),
            TargetFormat::from_jpeg_flag(self.jpeg),
        );
        match &self.output {
            Some(dir) => request.with_output_directory(dir.clone()),
            None => request,
        }
    }

    fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::new().with_max_files(self.keep_logs);
        if let Some(dir) = &self.log_dir {
            config = config.with_log_dir(dir);
        }
        if self.verbose {
            config = config
                .with_level(Level::DEBUG)
                .with_stderr_level(Level::DEBUG);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = init_logging("img_convert", cli.log_config());
    install_panic_handler();

    run(&cli)
}

/// Fatal errors exit 1; per-file failures are reported but still exit 0.
fn run(cli: &Cli) -> ExitCode {
    match convert_images_in_directory(&cli.request()) {
        Ok(report) => {
            for outcome in &report.outcomes {
                if let Some(path) = &outcome.output_path {
                    tracing::debug!(source = %outcome.file_name, output = %path.display(), "Wrote");
                }
            }
            tracing::debug!(
                output = %report.output_dir.display(),
                converted = report.count(OutcomeStatus::Converted),
                failed = report.count(OutcomeStatus::Failed),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}
