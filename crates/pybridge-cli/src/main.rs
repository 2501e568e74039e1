use clap::Parser;
use pybridge_cli::ProtocolHandler;
use pybridge_logger as logger;
use pybridge_python::Interpreter;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pybridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Python plugin bridge",
    long_about = "Hosts Python plugin objects in an embedded interpreter and \
serves a line-delimited JSON request/response protocol on stdin/stdout."
)]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace); diagnostics go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extra directory added to the interpreter's sys.path (site semantics)
    #[arg(long, env = "PYBRIDGE_SITE_DIR")]
    site_dir: Option<PathBuf>,

    /// Log file path (defaults to the user config directory)
    #[arg(long, env = "PYBRIDGE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.verbose, cli.log_file.clone()) {
        eprintln!("warning: logger initialization failed: {}", e);
    }

    if let Err(e) = Interpreter::get(cli.site_dir.as_deref()) {
        logger::error(&format!("Failed to initialize Python interpreter: {}", e));
        return ExitCode::FAILURE;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut handler = ProtocolHandler::new();
    match handler.run(stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::error(&format!("Bridge terminated: {}", e));
            ExitCode::FAILURE
        }
    }
}
