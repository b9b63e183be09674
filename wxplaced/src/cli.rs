//! Module describing all possible commands and sub-commands to the `wxplaced` daemon
//!

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{crate_authors, crate_description, crate_name, crate_version, Parser};

use wxplace_engine::Mode;

/// CLI options
#[derive(Debug, Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Verbose mode.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Hierarchical log output.
    #[clap(long)]
    pub tree: bool,
    /// Also log into hourly files in this directory.
    #[clap(long)]
    pub log_dir: Option<String>,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// - `config`
/// - `render`
/// - `serve`
/// - `version`
///
#[derive(Debug, Parser, PartialEq)]
pub enum SubCommand {
    /// Display current config
    Config,
    /// Render a saved feed once
    Render(RenderOpts),
    /// Refresh and serve the placefile
    Serve(ServeOpts),
    /// List all package versions
    Version,
}

/// Options for `serve`
///
#[derive(Debug, Parser, PartialEq)]
pub struct ServeOpts {
    /// Runtime mode, `production` or `development`.
    #[clap(short = 'm', long, env = "WXPLACE_MODE", default_value = "production")]
    pub mode: Mode,
    /// Listening IP, overrides the configuration file.
    #[clap(short = 'L', long)]
    pub listen: Option<IpAddr>,
    /// Listening port, overrides the configuration file.
    #[clap(short = 'P', long)]
    pub port: Option<u16>,
}

/// Options for `render`
///
#[derive(Debug, Parser, PartialEq)]
pub struct RenderOpts {
    /// Output file, default is stdout.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Saved alert feed (GeoJSON).
    pub input: PathBuf,
}
