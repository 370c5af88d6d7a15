//! A single controller instance and its build lifecycle.
//!
//! A [`Core`] is constructed from a validated [`Config`]. Construction resolves
//! the module geometry, sizes the native data port and maps the whole DRAM
//! capacity onto it. The control bus only exists once a build has run and the
//! generator's register listing has been read back.

use std::path::PathBuf;

use dramctl_model::bits::log2_exact;
use dramctl_model::{
    Config, ControlBus, Geometry, GeometryProvider, MemoryMap, ModelError, NativePort, Placement,
};

use crate::builder::Builder;
use crate::error::Result;
use crate::listing::control_bus_from_listing;
use crate::pins::PinBundle;
use crate::plan::{BuildPlan, ScriptRunner};
use crate::products::{BuildProducts, LocalBuildProducts};

/// Name of the single data-port resource.
pub const USER_PORT_RESOURCE: &str = "user_port_0";

/// Options for [`Core::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Execute the plan. When false, the plan is returned unexecuted.
    pub do_build: bool,
    /// Directory the plan is executed in.
    pub build_dir: PathBuf,
    /// Replace the PHY with a simulation model.
    pub sim: bool,
    /// Allow reuse of a name already claimed by the builder.
    pub name_force: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            do_build: true,
            build_dir: PathBuf::from("build/litedram"),
            sim: false,
            name_force: false,
        }
    }
}

/// Result of [`Core::build`].
#[derive(Debug)]
pub enum BuildOutcome {
    /// The prepared, unexecuted plan.
    Plan(BuildPlan),
    /// Products of the executed plan.
    Products(LocalBuildProducts),
}

/// A DRAM controller instance.
#[derive(Debug, Clone)]
pub struct Core {
    name: String,
    config: Config,
    geometry: Geometry,
    capacity: u64,
    user_port: NativePort,
    control_bus: Option<ControlBus>,
    pins: Option<PinBundle>,
}

fn to_u32(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ModelError::config(field, value, "does not fit in 32 bits").into())
}

impl Core {
    /// Create an instance named `name`.
    ///
    /// `pins`, when given, must carry every signal the configured family needs.
    pub fn new(
        config: Config,
        name: impl Into<String>,
        geometry: &dyn GeometryProvider,
        pins: Option<PinBundle>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::config("name", &name, "must be a non-empty string").into());
        }
        if let Some(pins) = &pins {
            pins.validate(config.family())?;
        }

        let geometry = config.derive_geometry(geometry)?;
        let capacity = 1u64
            .checked_shl(geometry.address_bits())
            .and_then(|per_group| per_group.checked_mul(config.module_bytes()))
            .ok_or_else(|| {
                ModelError::config(
                    "module_bytes",
                    config.module_bytes(),
                    "capacity overflows 64 bits",
                )
            })?;

        let rank_bits = log2_exact(config.module_ranks()).ok_or_else(|| {
            ModelError::config("module_ranks", config.module_ranks(), "must be a power of two")
        })?;
        let bank_bits =
            log2_exact(geometry.nbanks).ok_or_else(|| ModelError::InternalInconsistency {
                detail: format!(
                    "module {} has {} banks, not a power of two",
                    config.module_name(),
                    geometry.nbanks
                ),
            })?;
        let user_addr_width = geometry.row_bits + geometry.col_bits + bank_bits + rank_bits.max(1);

        let data_width = to_u32("user_data_width", config.user_data_width())?;
        let data_bits = log2_exact(u64::from(data_width / 8)).ok_or_else(|| {
            ModelError::config(
                "user_data_width",
                data_width,
                "must be a power-of-two number of bytes",
            )
        })?;
        let port_addr_width =
            user_addr_width
                .checked_sub(data_bits)
                .ok_or_else(|| ModelError::DimensionMismatch {
                    detail: format!(
                        "{user_addr_width} address bits cannot address {data_width}-bit words"
                    ),
                })?;

        let mut user_port = NativePort::new(port_addr_width, data_width)?;
        let mut user_map = MemoryMap::new(user_addr_width, 8)?;
        user_map.add_resource(USER_PORT_RESOURCE, capacity, Placement::next())?;
        user_port.set_memory_map(user_map)?;

        tracing::debug!(
            core = %name,
            capacity,
            addr_width = port_addr_width,
            data_width,
            "created controller instance"
        );

        Ok(Self {
            name,
            config,
            geometry,
            capacity,
            user_port,
            control_bus: None,
            pins,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// DRAM capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn user_port(&self) -> &NativePort {
        &self.user_port
    }

    pub fn pins(&self) -> Option<&PinBundle> {
        self.pins.as_ref()
    }

    /// File name of the register listing the generator writes for this instance.
    pub fn listing_name(&self) -> String {
        format!("{}_csr.csv", self.name)
    }

    pub fn is_built(&self) -> bool {
        self.control_bus.is_some()
    }

    /// The control bus. Only available after a successful build.
    pub fn control_bus(&self) -> Result<&ControlBus> {
        self.control_bus.as_ref().ok_or_else(|| {
            ModelError::NotReady {
                what: "control bus".into(),
                detail: format!(
                    "the memory map of '{}' has not been populated; the core must be built first",
                    self.name
                ),
            }
            .into()
        })
    }

    /// Read this instance's register listing from `products` and attach the
    /// resulting control bus. On failure the instance is left unchanged.
    pub fn populate_control_bus(&mut self, products: &dyn BuildProducts) -> Result<()> {
        if self.control_bus.is_some() {
            return Err(ModelError::MapAlreadyAttached {
                port: format!("control bus of '{}'", self.name),
            }
            .into());
        }
        let listing = self.listing_name();
        let text = products.get_text(&listing)?;
        let csr_data_width = to_u32("csr_data_width", self.config.csr_data_width())?;
        let bus = control_bus_from_listing(&listing, &text, csr_data_width)?;
        tracing::info!(
            core = %self.name,
            registers = bus.memory_map().map(|m| m.resources().len()).unwrap_or(0),
            addr_width = bus.addr_width(),
            "populated control bus"
        );
        self.control_bus = Some(bus);
        Ok(())
    }

    /// Prepare a plan with `builder` and, if `options.do_build` is set, execute it
    /// in `options.build_dir` and populate the control bus from its products.
    pub fn build(
        &mut self,
        builder: &mut Builder,
        options: &BuildOptions,
        runner: &dyn ScriptRunner,
    ) -> Result<BuildOutcome> {
        let plan = builder.prepare(self, options.sim, options.name_force)?;
        if !options.do_build {
            return Ok(BuildOutcome::Plan(plan));
        }
        let products = plan.execute_local(&options.build_dir, runner)?;
        self.populate_control_bus(&products)?;
        Ok(BuildOutcome::Products(products))
    }
}
