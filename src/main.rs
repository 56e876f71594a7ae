use std::process::ExitCode;

use chip8vm::Params;
use clap::Parser;

fn main() -> ExitCode {
    env_logger::init();
    let params = Params::parse();

    let result = chip8vm::run(params);

    // shove a newline on stdout to stop the shell prompt landing on the last frame
    println!();

    if let Err(e) = result {
        let mut chain = e.chain();

        match chain.next() {
            Some(e) => eprintln!("Error:\n    {}\n", e),
            None => eprintln!("Unknown error"),
        }

        let causes: Vec<_> = chain.collect();
        if !causes.is_empty() {
            eprintln!("Caused by:");
            for cause in causes {
                eprintln!("    {}", cause);
            }
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
