use std::{fs::write, path::PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use log::{debug, info};
use serde::Deserialize;

use crate::mount::MountOptions;

#[derive(Deserialize, Clone)]
pub struct Config {
    /// the address the server should bind to
    pub listen: String,
    /// if new accounts have to be confirmed before they can log in
    #[serde(default = "confirmable_by_default")]
    pub confirmable: bool,
    /// the resources to mount, in this order
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

#[derive(Deserialize, Clone)]
pub struct MountConfig {
    /// The name of the resource, e.g. ``User`` or ``Admin/Staff``
    pub resource: String,
    /// The path the schema is served at
    pub at: Option<String>,
    /// Mount only these operations
    #[serde(default)]
    pub only: Vec<String>,
    /// Mount every operation but these
    #[serde(default)]
    pub skip: Vec<String>,
    /// The type accounts of this resource are returned as
    pub authenticatable_type: Option<String>,
}

fn confirmable_by_default() -> bool {
    true
}

impl MountConfig {
    pub fn options(&self) -> MountOptions {
        let mut options = MountOptions::new()
            .only(self.only.iter().cloned())
            .skip(self.skip.iter().cloned());
        if let Some(at) = &self.at {
            options = options.at(at.clone());
        }
        if let Some(authenticatable_type) = &self.authenticatable_type {
            options = options.authenticatable_type(authenticatable_type.clone());
        }
        options
    }
}

impl Config {
    /// Load the configuration
    ///
    /// The default path is a file called `config.toml` in $PWD/config.toml
    pub fn load() -> anyhow::Result<Self> {
        // either read the path for the config from the env <CRATE_NAME>_CONFIG
        // or use the default path relative to the working directory
        let path: PathBuf = match std::env::var(concat!(env!("CARGO_CRATE_NAME"), "_CONFIG")) {
            Ok(path) => path.into(),
            Err(e) => {
                debug!("Cannot read env var for config path: {}", e);
                std::env::current_dir()?.join("config.toml")
            }
        };

        // write the sample config to the file only if it does not exist
        if !path.exists() {
            info!("Creating config with default options at {}", path.display());
            write(&path, include_str!("../other/config.sample"))?;
        }

        info!("Reading config from {}", path.display());
        Ok(Figment::new()
            // first read the config file
            .merge(Toml::file(path))
            // and then let the env overwrite options
            .merge(Env::prefixed(concat!(env!("CARGO_CRATE_NAME"), "_")))
            .extract()?)
    }
}
