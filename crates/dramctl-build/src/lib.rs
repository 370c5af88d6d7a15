//! Build orchestration for externally generated DRAM controller cores.
//!
//! The lifecycle of a [`Core`] is `prepare → execute → populate`:
//!
//! 1. [`Builder::prepare`] claims the core's name and renders a [`BuildPlan`]
//!    (build script plus generator configuration) from templates.
//! 2. [`BuildPlan::execute_local`] writes the plan and runs it through a
//!    [`ScriptRunner`], yielding [`LocalBuildProducts`].
//! 3. [`Core::populate_control_bus`] reads the generator's register listing back
//!    and attaches the control bus.
//!
//! [`Core::build`] runs all three steps.

pub mod builder;
pub mod connections;
pub mod error;
pub mod instance;
pub mod listing;
pub mod pins;
pub mod plan;
pub mod products;
pub mod template;

pub use crate::builder::{render_context, Builder, AUTOGENERATED};
pub use crate::connections::{Connection, PortDirection};
pub use crate::error::{BuildError, Result};
pub use crate::instance::{BuildOptions, BuildOutcome, Core, USER_PORT_RESOURCE};
pub use crate::listing::{
    control_bus_from_listing, parse_register_rows, RegisterRow, REGISTER_KINDS,
};
pub use crate::pins::{request_pins, IoRequest, PinBundle, PinProvider, PinTable};
pub use crate::plan::{BuildPlan, ScriptRunner, ShellRunner};
pub use crate::products::{BuildProducts, LocalBuildProducts};
pub use crate::template::{Context, Template, Value};
