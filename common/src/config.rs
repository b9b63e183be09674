//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default locations for the configuration file of `wxplace`.
//! This is a configuration file/struct neutral loading engine, storing only the base directory
//! and with `load()` read the proper file or the default one.
//!
//! This encapsulates the configuration file, available with `.inner()` or `.inner_mut()`.
//!

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use eyre::{eyre, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::makepath;

/// Main name for the directory base
const TAG: &str = "wxplace";

/// Every configuration file carries a version number.
///
pub trait Versioned {
    fn version(&self) -> usize;
}

/// Glue between a configuration struct and its on-disk file.
///
pub trait IntoConfig: Versioned {
    /// Name of the file inside the configuration directory.
    const FILENAME: &'static str;
}

/// Configuration for the daemon, wrapping whatever struct `T` is stored in the file.
///
#[derive(Debug)]
pub struct ConfigFile<T: Debug + Default + DeserializeOwned + IntoConfig> {
    /// Tag is the project name.
    tag: String,
    /// This is the base directory for all files.
    basedir: PathBuf,
    /// File actually read, if any.
    source: Option<PathBuf>,
    inner: T,
}

impl<T> ConfigFile<T>
where
    T: Debug + Default + DeserializeOwned + IntoConfig,
{
    #[tracing::instrument]
    fn new(tag: &str) -> Self {
        let basedir: PathBuf = match BaseDirs::new() {
            Some(base) => {
                #[cfg(unix)]
                let base: PathBuf = makepath!(base.home_dir(), ".config", tag);

                #[cfg(windows)]
                let base: PathBuf = makepath!(base.data_local_dir(), tag);

                base
            }
            None => {
                warn!("No home directory found, using current directory");
                makepath!(".", tag)
            }
        };
        debug!("base = {basedir:?}");
        ConfigFile {
            tag: String::from(tag),
            basedir,
            source: None,
            inner: T::default(),
        }
    }

    /// Returns the project tag
    ///
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the path of the default config directory
    ///
    pub fn config_path(&self) -> PathBuf {
        self.basedir.clone()
    }

    /// Returns the path of the default config file
    ///
    pub fn default_file(&self) -> PathBuf {
        self.config_path().join(T::FILENAME)
    }

    /// Returns the file we loaded from, `None` means built-in defaults.
    ///
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// Use the following search path:
    /// - file specified on CLI, which must exist
    /// - default basedir (based on $HOME or $LOCALAPPDATA), defaults if absent
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&Path>) -> Result<ConfigFile<T>> {
        let mut cfg = ConfigFile::<T>::new(TAG);

        let fname = match fname {
            Some(fname) => {
                if !fname.exists() {
                    return Err(eyre!("Unknown config file {:?}", fname));
                }
                fname.to_path_buf()
            }
            None => {
                let def = cfg.default_file();
                if !def.exists() {
                    debug!("No default file {:?}, using defaults", def);
                    return Ok(cfg);
                }
                def
            }
        };

        // Use a full path
        //
        let fname = fname.canonicalize()?;
        trace!("Loading config file {fname:?}");

        let data = fs::read_to_string(&fname)?;
        debug!("string data = {data}");

        cfg.inner = Self::parse(&data)?;
        debug!("struct data = {:?}", cfg.inner);

        cfg.source = Some(fname);
        Ok(cfg)
    }

    /// Parse HCL text into `T`.
    ///
    pub fn parse(data: &str) -> Result<T> {
        let data: T = hcl::from_str(data)?;
        Ok(data)
    }

    /// Return the inner configuration file
    ///
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Return the inner configuration file as putable
    ///
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}
