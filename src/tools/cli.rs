use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use super::paths::{unzip_path, zip_path};

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Errors,
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// Map the count of -q and -v flags onto a level. Info is the default.
    pub fn from_flags(quiet: u8, verbose: u8) -> Self {
        match (quiet, verbose) {
            (0, 0) => Verbosity::Info,
            (0, 1) => Verbosity::Debug,
            (0, _) => Verbosity::Trace,
            (1, _) => Verbosity::Warnings,
            (2, _) => Verbosity::Errors,
            _ => Verbosity::Quiet,
        }
    }

    pub fn level(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Off,
            Verbosity::Errors => log::LevelFilter::Error,
            Verbosity::Warnings => log::LevelFilter::Warn,
            Verbosity::Info => log::LevelFilter::Info,
            Verbosity::Debug => log::LevelFilter::Debug,
            Verbosity::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Zip, Unzip, or the interactive shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Shell,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug)]
pub struct HufOpts {
    /// Zip/Unzip/Shell
    pub op_mode: Mode,
    /// File, `dir/*.ext` or directory to work on. None in shell mode.
    pub path: Option<PathBuf>,
    /// Verbosity of user information
    pub verbose: Verbosity,
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "A Huffman coding file archiver",
    long_about = "
    Packs a file, every file of one type in a directory, or a whole directory tree into a
    single .huf archive, using one Huffman code built from all of the input.

    Run without a command to get an interactive prompt."
)]
pub struct Args {
    #[clap(subcommand)]
    command: Option<Command>,

    /// Sets verbosity. -v adds debug output, -vv adds trace output
    #[clap(short = 'v', long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Less output. -q shows warnings and errors, -qq errors only, -qqq nothing
    #[clap(short = 'q', long = "quiet", parse(from_occurrences))]
    quiet: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive a file, every `*.ext` file in a directory, or a whole directory
    Zip {
        /// Path to archive
        path: PathBuf,
    },
    /// Extract a .huf archive, or every .huf archive below a directory
    Unzip {
        /// Archive or directory of archives
        path: PathBuf,
    },
}

impl From<Args> for HufOpts {
    fn from(args: Args) -> Self {
        let (op_mode, path) = match args.command {
            Some(Command::Zip { path }) => (Mode::Zip, Some(path)),
            Some(Command::Unzip { path }) => (Mode::Unzip, Some(path)),
            None => (Mode::Shell, None),
        };
        HufOpts {
            op_mode,
            path,
            verbose: Verbosity::from_flags(args.quiet, args.verbose),
        }
    }
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse the command line and set the log level.
pub fn hufopts_init() -> HufOpts {
    let opts = HufOpts::from(Args::parse());
    log::set_max_level(opts.verbose.level());

    if opts.verbose != Verbosity::Quiet {
        println!("hufzip, a Huffman coding file archiver. Version {}", VERSION);
    }
    info!("Verbosity set to {}", log::max_level());
    info!("Operational mode set to {}", opts.op_mode);
    opts
}

/// Archive `path`. Returns false if no archive was produced.
pub fn run_zip(path: &Path) -> bool {
    match zip_path(path) {
        Ok((_, report)) => {
            for (name, e) in &report.skipped {
                warn!("Left out {}: {}", name, e);
            }
            true
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

/// Extract `path`. Returns false if any archive could not be extracted.
pub fn run_unzip(path: &Path) -> bool {
    match unzip_path(path) {
        Ok(outcomes) => outcomes.iter().all(|o| o.result.is_ok()),
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

/// Split a shell line into its command word and the rest, leading blanks trimmed.
fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim_start_matches(' ');
    let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
    match line.find(' ') {
        Some(at) => (&line[..at], line[at..].trim_start_matches(' ')),
        None => (line, ""),
    }
}

/// Interactive prompt: reads `zip <path>`, `unzip <path>` or `exit` until told to stop or
/// the input runs out.
pub fn shell<R: BufRead, W: Write>(mut input: R, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Enter one of the commands below:\nzip <path_to_file>\nunzip <path_to_file>\nexit"
    )?;
    let mut line = String::new();
    loop {
        write!(out, "\n> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        match split_command(&line) {
            ("zip", path) => {
                run_zip(Path::new(path));
            }
            ("unzip", path) => {
                run_unzip(Path::new(path));
            }
            ("exit", _) => return Ok(()),
            _ => writeln!(out, "Unknown command!")?,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_command_test() {
        assert_eq!(split_command("zip  some dir/a b.txt\n"), ("zip", "some dir/a b.txt"));
        assert_eq!(split_command("   exit\r\n"), ("exit", ""));
        assert_eq!(split_command(""), ("", ""));
    }

    #[test]
    fn verbosity_test() {
        assert_eq!(Verbosity::from_flags(0, 0), Verbosity::Info);
        assert_eq!(Verbosity::from_flags(0, 1), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(0, 4), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(1, 3), Verbosity::Warnings);
        assert_eq!(Verbosity::from_flags(2, 0), Verbosity::Errors);
        assert_eq!(Verbosity::from_flags(3, 0).level(), log::LevelFilter::Off);
    }

    #[test]
    fn verbose_levels_compiled_in_test() {
        // -vv must not ask for more than the build keeps
        assert!(Verbosity::from_flags(0, 2).level() <= log::STATIC_MAX_LEVEL);
    }

    #[test]
    fn args_test() {
        let opts = HufOpts::from(Args::parse_from(["hufzip", "-v", "zip", "docs"]));
        assert_eq!(opts.op_mode, Mode::Zip);
        assert_eq!(opts.path, Some(PathBuf::from("docs")));
        assert_eq!(opts.verbose, Verbosity::Debug);

        let opts = HufOpts::from(Args::parse_from(["hufzip", "-q"]));
        assert_eq!(opts.op_mode, Mode::Shell);
        assert_eq!(opts.path, None);
    }

    #[test]
    fn shell_test() {
        let input = "frobnicate\n\nexit\nzip never/reached\n".as_bytes();
        let mut out: Vec<u8> = vec![];
        shell(input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Unknown command!").count(), 2);
        assert_eq!(text.matches("\n> ").count(), 3);
    }
}
