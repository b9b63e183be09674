//! Wiring of the refresh engine and the responder for `serve`.
//!

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use eyre::Result;
use tracing::{error, info};

use wxplace_engine::{EngineStatus, Hook, Mode, Scheduler};
use wxplace_sources::{FileSnapshot, NwsFeed};

use crate::cli::ServeOpts;
use crate::server;
use crate::WxConfig;

/// Development mode side effect: keep a copy of every new document on disk.  Runs on the
/// blocking pool.
///
fn dump_to(path: PathBuf) -> Hook {
    Arc::new(move |doc: &str| match fs::write(&path, doc) {
        Ok(()) => info!("Updated placefile."),
        Err(e) => error!("Can not write {path:?}: {e}"),
    })
}

/// Build a scheduler out of the configuration.
///
#[tracing::instrument(skip(cfg))]
pub fn scheduler(cfg: &WxConfig, mode: Mode) -> Result<Scheduler> {
    let feed = NwsFeed::new(&cfg.feed)?;
    let snapshot = FileSnapshot::new(&cfg.snapshot);

    let sched = Scheduler::new(Box::new(feed), Box::new(snapshot))
        .with_refresh(cfg.refresh_for(mode))
        .with_tick(cfg.tick())
        .with_options(cfg.build_options());

    Ok(if mode.is_dev() {
        sched.with_hook(dump_to(cfg.dump.clone()))
    } else {
        sched
    })
}

/// Nothing to recover from, let whoever supervises us restart the daemon.
///
fn fatal(e: EngineStatus) -> ! {
    error!("ERROR GETTING ALERTS: {e}");
    std::process::exit(1);
}

/// Run until a fatal error.
///
#[tracing::instrument(skip(cfg))]
pub async fn serve(cfg: &WxConfig, opts: &ServeOpts) -> Result<()> {
    let mode = opts.mode;
    info!("Starting in {mode} mode");

    let sched = scheduler(cfg, mode)?;
    sched.prime().await;

    if mode.is_dev() {
        if let Err(e) = sched.run().await {
            fatal(e);
        }
        return Ok(());
    }

    let addr = cfg.addr(opts.listen, opts.port)?;
    let state = sched.state();
    tokio::select! {
        res = sched.run() => {
            if let Err(e) = res {
                fatal(e);
            }
        }
        res = server::serve(state, addr) => res?,
    }
    Ok(())
}
