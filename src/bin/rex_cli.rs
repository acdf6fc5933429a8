use std::{env, process};

use rex_engine::cli::{run_cli, CliError, USAGE};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return;
    }

    match run_cli(args) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("Error: {err}");
                process::exit(1);
            }
        },
        Err(err @ CliError::Usage(_)) => {
            eprintln!("Error: {err}\n\n{USAGE}");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
