use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(
    name = "oauth2-debugd",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Walks an OAuth 2.0 authorization code flow and prints the issued tokens"
)]
pub struct Options {
    /// YAML file holding the client credentials and routes
    #[clap(short, long, env = "OAUTH2_DEBUG_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,
}
