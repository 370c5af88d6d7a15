//! Core manifest parsing.
//!
//! A manifest lists the controller instances of a design:
//!
//! ```toml
//! [[core]]
//! name = "sdram"
//!
//! [core.config]
//! family = "ecp5"
//! memtype = "DDR3"
//! module_name = "MT41K64M16"
//! module_bytes = 2
//! module_ranks = 1
//! input_clk_freq = 100000000
//! user_clk_freq = 50000000
//! init_clk_freq = 25000000
//! ```
//!
//! Board pin resources are listed in `[[pins]]` tables. A core binds one of them
//! by reference, e.g. `pins = { resource = "ddram", number = 0 }`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use dramctl_build::{request_pins, Core, PinBundle, PinProvider, PinTable};
use dramctl_model::{ConfigSpec, GeometryProvider};
use serde::Deserialize;

/// The top-level manifest structure.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreManifest {
    #[serde(rename = "core", default)]
    pub cores: Vec<CoreEntry>,
    /// Pin resources of the board.
    #[serde(default)]
    pub pins: Vec<PinBundle>,
}

/// One `[[core]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreEntry {
    /// Instance name; also the name of the generated Verilog module.
    pub name: String,
    /// Reuse the name even if another core already claimed it.
    #[serde(default)]
    pub name_force: bool,
    pub config: ConfigSpec,
    /// Optional DRAM pin binding.
    #[serde(default)]
    pub pins: Option<PinRef>,
}

/// Reference to a `[[pins]]` resource.
#[derive(Debug, Clone, Deserialize)]
pub struct PinRef {
    pub resource: String,
    #[serde(default)]
    pub number: u32,
}

impl CoreManifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(text)?;
        if manifest.cores.is_empty() {
            bail!("manifest defines no [[core]] tables");
        }
        tracing::debug!(
            cores = manifest.cores.len(),
            pins = manifest.pins.len(),
            "parsed core manifest"
        );
        Ok(manifest)
    }

    /// The board's pin resources as a lookup table.
    pub fn pin_table(&self) -> PinTable {
        let mut table = PinTable::new();
        for bundle in &self.pins {
            table.insert(bundle.clone());
        }
        table
    }
}

impl CoreEntry {
    /// Validate the configuration and create the controller instance.
    pub fn instantiate(
        &self,
        geometry: &dyn GeometryProvider,
        pins: &dyn PinProvider,
    ) -> Result<Core> {
        let config = self
            .config
            .validate()
            .with_context(|| format!("invalid configuration for core '{}'", self.name))?;
        let bundle = match &self.pins {
            Some(pin) => Some(
                request_pins(pins, &pin.resource, pin.number, config.family())
                    .with_context(|| format!("binding pins of core '{}'", self.name))?,
            ),
            None => None,
        };
        Core::new(config, self.name.clone(), geometry, bundle)
            .with_context(|| format!("creating core '{}'", self.name))
    }
}
