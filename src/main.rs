use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ansi_term::Colour::Red;
use clap::{arg, command, ArgAction};
use subc::error;
use subc::lang::Error;
use subc::mach::{compile, Listing, Runtime};

fn main() {
    env_logger::init();
    let matches = command!()
        .arg(arg!(<path> "Path to a source file"))
        .arg(
            arg!(--list "Print the compiled listing instead of running")
                .action(ArgAction::SetTrue),
        )
        .arg(arg!([args]... "Arguments passed through to the program"))
        .get_matches();

    let path = matches.get_one::<String>("path").unwrap();
    let list = matches.get_flag("list");
    let args: Vec<String> = matches
        .get_many::<String>("args")
        .unwrap_or_default()
        .cloned()
        .collect();

    match run(path, list, args) {
        Ok(status) => process::exit(status as i32),
        Err(error) => {
            eprintln!("{}", Red.paint(error.to_string()));
            process::exit(error.code() as i32);
        }
    }
}

fn run(path: &str, list: bool, args: Vec<String>) -> Result<i64, Error> {
    let source =
        std::fs::read_to_string(path).map_err(|e| error!(IoError; e.to_string()))?;
    let program = compile(&source)?;
    if list {
        print!("{}", Listing::new(&program));
        return Ok(0);
    }

    let mut runtime_args = vec![path.to_string()];
    runtime_args.extend(args);
    let mut runtime = Runtime::new(program, &runtime_args)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    runtime.set_interrupt(interrupted);

    runtime.run()
}
