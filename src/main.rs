//! yamlc - Compile YAML with !include directives into JSON

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = yamlc::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
