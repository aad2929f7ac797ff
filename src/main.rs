use dl::errors::{AppError, AppResult};
use dl::{cli, logging};

fn run() -> AppResult<()> {
    let options = cli::parse_args()?;
    logging::init_logging(options.verbosity)?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| AppError::IoError(e.to_string()))?;
    rt.block_on(cli::run(&options))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("dl: {err}");
        std::process::exit(1);
    }
}
