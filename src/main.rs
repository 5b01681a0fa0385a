//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::io;
use std::process::exit;

use hufzip::tools::cli::{hufopts_init, run_unzip, run_zip, shell, Mode};

use log::{error, info, LevelFilter};
use simplelog::{Config, TermLogger, TerminalMode};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    // Available log levels are Error, Warn, Info, Debug, Trace
    if let Err(e) = TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stdout,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("Could not start logging: {}", e);
    }

    let options = hufopts_init();

    //----- Figure how what we need to do and go do it
    let ok = match (options.op_mode, &options.path) {
        (Mode::Zip, Some(path)) => run_zip(path),
        (Mode::Unzip, Some(path)) => run_unzip(path),
        _ => {
            let stdin = io::stdin();
            match shell(stdin.lock(), &mut io::stdout()) {
                Ok(()) => true,
                Err(e) => {
                    error!("{}", e);
                    false
                }
            }
        }
    };

    info!("Done.\n");
    if !ok {
        exit(1);
    }
}
