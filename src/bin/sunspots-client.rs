//! The sunspots-client executable supports the following command line arguments:
//!
//! `sunspots-client <HOST> <PORT>`
//!
//!     Connect to the server at HOST:PORT and print "Ready". Then every line read from stdin
//!     is sent to the server as a name and the reply is printed to stdout.
//!     A blank line or the end of stdin closes the connection and exits with 0.
//!     Print an error and exit with 1 on a usage or connection error, if a line cannot be
//!     sent, or if the server's reply is invalid.

use std::io::{self, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::process::exit;

use clap::{crate_version, App, Arg, ArgMatches};
use sunspots::{run_session, Result, SunspotsClient, SunspotsError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's resolved address
    addr: SocketAddr,
}

impl Opt {
    /// resolves `host` and `port` into an IPv4 socket address
    /// # Errors
    /// returns [`SunspotsError::Parsing`] if the port is invalid or the host has no IPv4
    /// address
    fn build(host: &str, port: &str) -> Result<Opt> {
        let port: u16 = port
            .parse()
            .map_err(|_| SunspotsError::Parsing(format!("could not parse {} into a port", port)))?;
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| SunspotsError::Parsing(format!("could not resolve {}: {}", host, e)))?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| SunspotsError::Parsing(format!("no IPv4 address for {}", host)))?;
        Ok(Opt { addr })
    }
}

fn main() {
    // configure a subscriber that will log warnings to STDERR
    subscriber_config();

    let matches = App::new("sunspots-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("looks up sunspot counts of names read from stdin")
        .arg(Arg::with_name("HOST").required(true).index(1))
        .arg(Arg::with_name("PORT").required(true).index(2))
        .get_matches();

    if let Err(e) = parse_options(&matches).and_then(run) {
        let _ = io::stdout().flush();
        eprintln!("{}", e);
        exit(1);
    }
}

/// connects and runs a session over stdin and stdout
fn run(opt: Opt) -> Result<()> {
    let mut client = SunspotsClient::connect(opt.addr)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(stdin.lock(), &mut stdout.lock(), &mut client)
}

fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let host = matches.value_of("HOST").unwrap_or_default();
    let port = matches.value_of("PORT").unwrap_or_default();
    Opt::build(host, port)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // stdout carries the replies, so only warnings and errors are logged
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
