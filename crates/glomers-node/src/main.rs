use std::io;
use std::process::ExitCode;

use glomers_config::Config;
use glomers_node::{Node, RunError, telemetry, workloads};
use tracing::error;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };

    if let Err(error) = telemetry::initialise(&config) {
        eprintln!("glomers-node: {error}");
        return ExitCode::FAILURE;
    }

    let mut node = Node::from_config(&config, io::stdout());
    workloads::register_all(&mut node);

    match node.run(io::stdin().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(RunError::Handshake(handshake_error)) => {
            error!(error = %handshake_error, "handshake failed; node stopped");
            ExitCode::FAILURE
        }
        // A broken input stream is not a clean shutdown either.
        Err(RunError::Input(input_error)) => {
            error!(error = %input_error, "standard input failed; node stopped");
            ExitCode::FAILURE
        }
    }
}
