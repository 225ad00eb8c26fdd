use crate::swapi::DEFAULT_FILMS_URL;
use clap::{ArgAction, Parser};
use http::Uri;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Serve Star Wars film lookups and a static site
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Socket address to listen on
    pub listen: SocketAddr,

    /// Directory of static files to serve
    #[arg(short, long, default_value = "public")]
    pub root: PathBuf,

    /// Upstream film catalogue URL
    #[arg(long, default_value = DEFAULT_FILMS_URL, value_parser = Uri::from_str)]
    pub films_url: Uri,
}
