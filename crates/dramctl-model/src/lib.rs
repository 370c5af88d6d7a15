//! Configuration and interface model for externally generated DRAM controller cores.
//!
//! - **Configuration:** validated memory and clocking parameters for each supported
//!   device family ([`config`]).
//! - **Geometry:** bank/row/column decomposition of DRAM parts, resolved through a
//!   [`GeometryProvider`] ([`geometry`]).
//! - **Memory maps:** named, non-overlapping address partitions ([`memory_map`]).
//! - **Ports:** the native data port and the Wishbone control bus, with the
//!   width checks that bind each to its memory map ([`port`]).

pub mod bits;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod memory_map;
pub mod port;

pub use config::{
    Artix7Params, Artix7Settings, Config, ConfigParams, ConfigSpec, Ecp5Params, Ecp5Settings,
    Family, FamilyParams, MemoryType, Rate, SpeedGrade,
};
pub use error::{ModelError, Result};
pub use geometry::{Geometry, GeometryProvider, ModuleCatalog, ModuleSpec};
pub use layout::{Direction, Field, Layout};
pub use memory_map::{MemoryMap, Placement, Resource};
pub use port::{ControlBus, NativePort, NATIVE_GRANULARITY};
