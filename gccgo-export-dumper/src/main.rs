use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use log::{debug, Level, LevelFilter};

use goexport::Config;

const ABOUT: &str = "\
Works on either objects (.o files) or archives (.a files); dumps out
gccgo export data for a package in text form, to standard output. Example:

  cd $GOPATH/src/mumble
  go build -o mumble.a -compiler gccgo .
  gccgo-export-dumper mumble.a";

#[derive(Debug, Parser)]
#[command(version, about = "Dump gccgo export data", long_about = ABOUT)]
struct Args {
    /// Verbose trace output level
    #[arg(short = 'v', value_name = "LEVEL", default_value_t = 0)]
    verbose: u8,

    files: Vec<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| match record.level() {
            Level::Error => writeln!(buf, "error: {}", record.args()),
            Level::Warn => writeln!(buf, "warning: {}", record.args()),
            _ => writeln!(buf, "{}", record.args()),
        })
        .init();
}

fn usage(msg: &str) -> ! {
    eprintln!("error: {msg}");
    eprintln!("{}", Args::command().render_long_help());
    process::exit(2)
}

/// Stops at the first file that fails; later files are left untouched.
fn run(files: &[PathBuf], config: &Config) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for file in files {
        goexport::check_readable(file)?;
        goexport::examine(file, config, &mut out)?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!("in main");

    if args.files.is_empty() {
        usage("supply one or more objects/archives as arguments.");
    }

    let mut config = Config::default();
    if let Some(ar) = env::var_os("AR").filter(|ar| !ar.is_empty()) {
        config.archiver = ar;
    }

    if let Err(e) = run(&args.files, &config) {
        eprintln!("gccgo-export-dumper: {e}");
        process::exit(1);
    }
    debug!("leaving main");
}
