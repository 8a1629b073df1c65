//! this binary starts the sunspots server
//!
//! `sunspots-server <PORT> <RECORD_FILE> [--backlog N]`
//!
//!     Listen on all IPv4 interfaces at PORT and answer lookups from RECORD_FILE.
//!     Runs until killed. Exits with 1 if the arguments are invalid or the socket cannot be
//!     set up.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::exit;

use clap::{crate_version, App, Arg, ArgMatches};
use sunspots::{Result, ServerConfig, SunspotsError, SunspotsServer, DEFAULT_BACKLOG};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    port: u16,
    record_file: PathBuf,
    backlog: i32,
}

impl Opt {
    /// validates the `port` and `backlog` parameters
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`SunspotsError::Parsing`] if one of the parameters is invalid
    ///
    fn build(port: &str, record_file: &str, backlog: Option<&str>) -> Result<Opt> {
        let port: u16 = port
            .parse()
            .map_err(|_| SunspotsError::Parsing(format!("could not parse {} into a port", port)))?;
        let backlog = match backlog {
            Some(b) => b
                .parse::<i32>()
                .ok()
                .filter(|b| *b > 0)
                .ok_or_else(|| SunspotsError::Parsing(format!("invalid backlog: {}", b)))?,
            None => DEFAULT_BACKLOG,
        };

        Ok(Opt {
            port,
            record_file: PathBuf::from(record_file),
            backlog,
        })
    }

    fn config(&self) -> ServerConfig {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        ServerConfig {
            addr,
            record_file: self.record_file.clone(),
            backlog: self.backlog,
        }
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    let matches = App::new("sunspots-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("answers sunspot lookups over TCP")
        .arg(Arg::with_name("PORT").required(true).index(1))
        .arg(Arg::with_name("RECORD_FILE").required(true).index(2))
        .arg(Arg::with_name("backlog")
            .long("backlog")
            .value_name("N")
            .help("sets the pending-connection backlog of the listening socket"))
        .get_matches();

    let opt = match parse_options(&matches) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server, this only returns on a setup failure
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("sunspots-server {}", env!("CARGO_PKG_VERSION"));
    info!("Record file: {:?}", opt.record_file);

    let server = SunspotsServer::bind(&opt.config())?;
    server.run()
}

fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let port = matches.value_of("PORT").unwrap_or_default();
    let record_file = matches.value_of("RECORD_FILE").unwrap_or_default();
    Opt::build(port, record_file, matches.value_of("backlog"))
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than DEBUG (e.g, info, warn, etc.)
        // will be written.
        .with_max_level(Level::DEBUG)
        // log to stderr, stdout stays free
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
