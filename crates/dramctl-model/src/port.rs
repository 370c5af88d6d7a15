//! Memory-mapped interfaces exposed by the controller.
//!
//! - [`NativePort`]: the streaming command / write-data / read-data port that
//!   gives user logic access to DRAM storage.
//! - [`ControlBus`]: the Wishbone register-access bus used to configure and
//!   monitor the controller.
//!
//! Each interface may own one [`MemoryMap`]. Attaching a map checks that its
//! dimensions agree with the interface's widths and then freezes it.

use serde::Serialize;

use crate::bits::log2_exact;
use crate::error::{ModelError, Result};
use crate::layout::{Direction, Field, Layout};
use crate::memory_map::MemoryMap;

/// Smallest transferable unit of a native port, in bits.
pub const NATIVE_GRANULARITY: u32 = 8;

/// Check that `map` has `granularity`-bit units and exactly
/// `max(1, addr_width + log2(data_width / granularity))` address bits.
fn check_map_dimensions(
    map: &MemoryMap,
    interface: &str,
    addr_width: u32,
    data_width: u32,
    granularity: u32,
) -> Result<()> {
    if map.data_width() != granularity {
        return Err(ModelError::DimensionMismatch {
            detail: format!(
                "memory map has data width {}, which is not the same as {interface} \
                 granularity {granularity}",
                map.data_width()
            ),
        });
    }
    let ratio = data_width / granularity;
    let granularity_bits =
        log2_exact(u64::from(ratio)).ok_or_else(|| ModelError::DimensionMismatch {
            detail: format!(
                "{interface} data width {data_width} is not a power-of-two multiple of \
                 granularity {granularity}"
            ),
        })?;
    let expected = (addr_width + granularity_bits).max(1);
    if map.addr_width() != expected {
        return Err(ModelError::DimensionMismatch {
            detail: format!(
                "memory map has address width {}, which is not the same as {interface} \
                 address width {expected} ({addr_width} address bits + {granularity_bits} \
                 granularity bits)",
                map.addr_width()
            ),
        });
    }
    Ok(())
}

/// Native data port.
///
/// Signals, from the point of view of user logic:
/// - `cmd.valid` (in), `cmd.ready` (out), `cmd.last` (in), `cmd.we` (in), `cmd.addr` (in)
/// - `w.valid` (in), `w.ready` (out), `w.data` (in), `w.we` (in, one bit per byte)
/// - `r.valid` (out), `r.ready` (in), `r.data` (out)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativePort {
    addr_width: u32,
    data_width: u32,
    memory_map: Option<MemoryMap>,
}

impl NativePort {
    /// Create a port. `addr_width` must be positive and `data_width` a positive power of two.
    pub fn new(addr_width: u32, data_width: u32) -> Result<Self> {
        if addr_width == 0 {
            return Err(ModelError::config("addr_width", addr_width, "must be a positive integer"));
        }
        if !data_width.is_power_of_two() {
            return Err(ModelError::config(
                "data_width",
                data_width,
                "must be a positive power of two integer",
            ));
        }
        Ok(Self {
            addr_width,
            data_width,
            memory_map: None,
        })
    }

    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn granularity(&self) -> u32 {
        NATIVE_GRANULARITY
    }

    /// Signal layout of the port.
    pub fn layout(&self) -> Layout {
        use Direction::{In, Out};
        Layout::new(vec![
            Field::new("cmd.valid", 1, In),
            Field::new("cmd.ready", 1, Out),
            Field::new("cmd.last", 1, In),
            Field::new("cmd.we", 1, In),
            Field::new("cmd.addr", self.addr_width, In),
            Field::new("w.valid", 1, In),
            Field::new("w.ready", 1, Out),
            Field::new("w.data", self.data_width, In),
            Field::new("w.we", self.data_width / NATIVE_GRANULARITY, In),
            Field::new("r.valid", 1, Out),
            Field::new("r.ready", 1, In),
            Field::new("r.data", self.data_width, Out),
        ])
    }

    /// The attached memory map.
    pub fn memory_map(&self) -> Result<&MemoryMap> {
        self.memory_map.as_ref().ok_or_else(|| ModelError::NotReady {
            what: "native port memory map".into(),
            detail: "no memory map has been attached to this port".into(),
        })
    }

    /// Attach `map`, freezing it.
    pub fn set_memory_map(&mut self, mut map: MemoryMap) -> Result<()> {
        if self.memory_map.is_some() {
            return Err(ModelError::MapAlreadyAttached {
                port: "native port".into(),
            });
        }
        check_map_dimensions(
            &map,
            "native port",
            self.addr_width,
            self.data_width,
            NATIVE_GRANULARITY,
        )?;
        map.freeze();
        self.memory_map = Some(map);
        Ok(())
    }
}

/// Wishbone control bus.
///
/// Signals, from the point of view of the bus initiator:
/// `adr`, `dat_w`, `sel`, `cyc`, `stb`, `we` (in) and `dat_r`, `ack` (out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlBus {
    addr_width: u32,
    data_width: u32,
    granularity: u32,
    memory_map: Option<MemoryMap>,
}

impl ControlBus {
    /// Create a bus. Data width and granularity must each be one of 8, 16, 32 or 64,
    /// with granularity no larger than data width.
    pub fn new(addr_width: u32, data_width: u32, granularity: u32) -> Result<Self> {
        const WIDTHS: [u32; 4] = [8, 16, 32, 64];
        if !WIDTHS.contains(&data_width) {
            return Err(ModelError::config(
                "data_width",
                data_width,
                "must be one of 8, 16, 32, 64",
            ));
        }
        if !WIDTHS.contains(&granularity) {
            return Err(ModelError::config(
                "granularity",
                granularity,
                "must be one of 8, 16, 32, 64",
            ));
        }
        if granularity > data_width {
            return Err(ModelError::config(
                "granularity",
                granularity,
                format!("must not be wider than data width {data_width}"),
            ));
        }
        Ok(Self {
            addr_width,
            data_width,
            granularity,
            memory_map: None,
        })
    }

    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    /// Signal layout of the bus.
    pub fn layout(&self) -> Layout {
        use Direction::{In, Out};
        Layout::new(vec![
            Field::new("adr", self.addr_width, In),
            Field::new("dat_w", self.data_width, In),
            Field::new("dat_r", self.data_width, Out),
            Field::new("sel", self.data_width / self.granularity, In),
            Field::new("cyc", 1, In),
            Field::new("stb", 1, In),
            Field::new("ack", 1, Out),
            Field::new("we", 1, In),
        ])
    }

    /// The attached memory map.
    pub fn memory_map(&self) -> Result<&MemoryMap> {
        self.memory_map.as_ref().ok_or_else(|| ModelError::NotReady {
            what: "control bus memory map".into(),
            detail: "no memory map has been attached to this bus".into(),
        })
    }

    /// Attach `map`, freezing it.
    pub fn set_memory_map(&mut self, mut map: MemoryMap) -> Result<()> {
        if self.memory_map.is_some() {
            return Err(ModelError::MapAlreadyAttached {
                port: "control bus".into(),
            });
        }
        check_map_dimensions(
            &map,
            "control bus",
            self.addr_width,
            self.data_width,
            self.granularity,
        )?;
        map.freeze();
        self.memory_map = Some(map);
        Ok(())
    }
}
