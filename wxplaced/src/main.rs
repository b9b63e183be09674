//! This is the `wxplaced` daemon
//!
//! It fetches active warnings from the NWS, turns them into a placefile and either serves it
//! over HTTP (production) or dumps it into a file (development).
//!

use std::fs;

use clap::{crate_authors, crate_version, Parser};
use eyre::Result;
use tracing::{debug, info, trace};

use wxplace_common::{init_logging, verbosity, ConfigFile};
use wxplace_engine::Mode;
use wxplace_formats::{render, AlertCollection};

use crate::cli::{Opts, RenderOpts, SubCommand};
pub use crate::config::*;
pub use crate::error::*;

mod cli;
mod config;
mod daemon;
mod error;
mod server;

/// Daemon name
const NAME: &str = env!("CARGO_BIN_NAME");

/// Daemon version
const VERSION: &str = crate_version!();

/// Authors
const AUTHORS: &str = crate_authors!();

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging early
    //
    init_logging(NAME, verbosity(opts.verbose), opts.tree, opts.log_dir.clone())?;
    trace!("Logging initialised.");

    let cfg = ConfigFile::<WxConfig>::load(opts.config.as_deref())?;
    cfg.inner().check()?;
    debug!("config from {:?}", cfg.source());

    match opts.subcmd {
        SubCommand::Serve(sopts) => daemon::serve(cfg.inner(), &sopts).await?,
        SubCommand::Render(ropts) => render_file(cfg.inner(), &ropts)?,
        SubCommand::Config => {
            match cfg.source() {
                Some(path) => println!("# {}", path.display()),
                None => println!("# built-in defaults ({:?} not found)", cfg.default_file()),
            }
            println!("{}", hcl::to_string(cfg.inner())?);
        }
        SubCommand::Version => {
            println!("{NAME}/{VERSION} by {AUTHORS}");
            println!(
                "Using {} {} {} {}",
                wxplace_common::version(),
                wxplace_formats::version(),
                wxplace_sources::version(),
                wxplace_engine::version(),
            );
        }
    }
    Ok(())
}

/// One-shot render of a saved feed, same rules as the daemon.
///
#[tracing::instrument(skip(cfg))]
fn render_file(cfg: &WxConfig, opts: &RenderOpts) -> Result<()> {
    let input = opts.input.display().to_string();
    let data = fs::read_to_string(&opts.input)
        .map_err(|e| Status::UnreadableInput(input.clone(), e.to_string()))?;
    let alerts = AlertCollection::from_json(&data)
        .map_err(|e| Status::UnreadableInput(input, e.to_string()))?;

    let opts_build = cfg
        .build_options()
        .refresh(cfg.refresh_for(Mode::Production));
    let doc = render(&alerts, &opts_build);
    match &opts.output {
        Some(out) => {
            fs::write(out, &doc)
                .map_err(|e| Status::CantWrite(out.display().to_string(), e.to_string()))?;
            info!("{} alerts written to {out:?}", alerts.len());
        }
        None => print!("{doc}"),
    }
    Ok(())
}
