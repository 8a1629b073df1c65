//! The sunspots-mkdb executable builds and inspects record files:
//!
//! `sunspots-mkdb build <INPUT> <OUTPUT>`
//!
//!     Read a JSON array of `{"name": "...", "sunspots": N}` objects from INPUT and write
//!     them, in order, as a record file to OUTPUT.
//!
//! `sunspots-mkdb dump <FILE>`
//!
//!     Print the records of FILE as a JSON array.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::exit;

use clap::{crate_version, App, Arg, ArgMatches, SubCommand};
use sunspots::record::{read_records, write_records};
use sunspots::{Record, RecordEntry, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    subscriber_config();

    let matches = App::new("sunspots-mkdb")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("builds and dumps sunspots record files")
        .subcommands(vec![
            SubCommand::with_name("build")
                .about("Build a record file from a JSON listing")
                .arg(Arg::with_name("INPUT").required(true).index(1))
                .arg(Arg::with_name("OUTPUT").required(true).index(2)),
            SubCommand::with_name("dump")
                .about("Print the records of a record file as JSON")
                .arg(Arg::with_name("FILE").required(true).index(1)),
        ])
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("build", Some(args)) => build(
            args.value_of("INPUT").unwrap_or_default(),
            args.value_of("OUTPUT").unwrap_or_default(),
        ),
        ("dump", Some(args)) => dump(args.value_of("FILE").unwrap_or_default()),
        _ => {
            eprintln!("{}", matches.usage());
            exit(1);
        }
    }
}

/// converts the JSON listing at `input` into a record file at `output`
fn build(input: &str, output: &str) -> Result<()> {
    let entries: Vec<RecordEntry> = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let records = entries
        .iter()
        .map(RecordEntry::to_record)
        .collect::<Result<Vec<Record>>>()?;

    let mut writer = BufWriter::new(File::create(output)?);
    write_records(&mut writer, &records)?;
    info!("wrote {} records to {}", records.len(), output);
    Ok(())
}

/// prints the records of `file` as pretty JSON on stdout
fn dump(file: &str) -> Result<()> {
    let records = read_records(&mut BufReader::new(File::open(file)?))?;
    let entries: Vec<RecordEntry> = records.iter().map(RecordEntry::from).collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &entries)?;
    writeln!(out)?;
    Ok(())
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
