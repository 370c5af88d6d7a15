//! Memory maps.
//!
//! A [`MemoryMap`] partitions an address range into named, non-overlapping
//! resources. Addresses are counted in units of the map's data width. Ports use
//! their map to prove that the address space they expose matches the resources
//! behind it; once a port accepts a map, the map is frozen.

use serde::Serialize;

use crate::bits::bits_for;
use crate::error::{ModelError, Result};

/// A named resource occupying `[start, end)` in a memory map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Resource name, unique within its map.
    pub name: String,
    /// First address of the resource.
    pub start: u64,
    /// One past the last address of the resource.
    pub end: u64,
}

impl Resource {
    /// Number of map units spanned by the resource.
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }
}

/// Where a new resource should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Fixed address, or `None` to place after the last added resource.
    pub addr: Option<u64>,
    /// Grow the address width to fit the resource instead of rejecting it.
    pub extend: bool,
}

impl Placement {
    /// Place after the last added resource; fail if it does not fit.
    pub fn next() -> Self {
        Self::default()
    }

    /// Place at `addr`; fail if it does not fit.
    pub fn at(addr: u64) -> Self {
        Self {
            addr: Some(addr),
            extend: false,
        }
    }

    /// Place at `addr`, growing the map as needed.
    pub fn extend_at(addr: u64) -> Self {
        Self {
            addr: Some(addr),
            extend: true,
        }
    }
}

/// An address range partitioned into named resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryMap {
    addr_width: u32,
    data_width: u32,
    /// Kept sorted by start address.
    resources: Vec<Resource>,
    #[serde(skip)]
    next_addr: u64,
    #[serde(skip)]
    frozen: bool,
}

impl MemoryMap {
    /// Create an empty map spanning `2^addr_width` units of `data_width` bits.
    pub fn new(addr_width: u32, data_width: u32) -> Result<Self> {
        if addr_width == 0 || addr_width > 64 {
            return Err(ModelError::config(
                "addr_width",
                addr_width,
                "must be a positive integer no larger than 64",
            ));
        }
        if data_width == 0 {
            return Err(ModelError::config("data_width", data_width, "must be a positive integer"));
        }
        Ok(Self {
            addr_width,
            data_width,
            resources: Vec::new(),
            next_addr: 0,
            frozen: false,
        })
    }

    pub fn addr_width(&self) -> u32 {
        self.addr_width
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Number of addressable units (`2^addr_width`).
    pub fn span(&self) -> u128 {
        1u128 << self.addr_width
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Disallow further additions.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Add a resource of `size` units.
    ///
    /// Returns the `(start, end)` range the resource occupies.
    pub fn add_resource(
        &mut self,
        name: &str,
        size: u64,
        placement: Placement,
    ) -> Result<(u64, u64)> {
        let conflict = |detail: String| ModelError::ResourceConflict {
            resource: name.to_string(),
            detail,
        };

        if self.frozen {
            return Err(conflict("memory map has been frozen".into()));
        }
        if self.find_resource(name).is_some() {
            return Err(conflict("a resource with this name is already present".into()));
        }
        if size == 0 {
            return Err(conflict("size must be a positive integer".into()));
        }

        let start = placement.addr.unwrap_or(self.next_addr);
        let end = start
            .checked_add(size)
            .ok_or_else(|| conflict(format!("range {start:#x} + {size:#x} overflows 64 bits")))?;

        let mut addr_width = self.addr_width;
        if u128::from(end) > self.span() {
            if !placement.extend {
                return Err(conflict(format!(
                    "address range {start:#x}..{end:#x} out of bounds for memory map spanning \
                     range {:#x}..{:#x} ({} address bits)",
                    0,
                    self.span(),
                    self.addr_width
                )));
            }
            addr_width = bits_for(end);
        }

        if let Some(other) = self.resources.iter().find(|r| r.overlaps(start, end)) {
            return Err(conflict(format!(
                "address range {start:#x}..{end:#x} overlaps with resource '{}' at {:#x}..{:#x}",
                other.name, other.start, other.end
            )));
        }

        if addr_width != self.addr_width {
            tracing::debug!(
                resource = name,
                from = self.addr_width,
                to = addr_width,
                "extending memory map"
            );
            self.addr_width = addr_width;
        }

        let index = self.resources.partition_point(|r| r.start < start);
        self.resources.insert(
            index,
            Resource {
                name: name.to_string(),
                start,
                end,
            },
        );
        self.next_addr = end;
        Ok((start, end))
    }

    /// Resources in address order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Look up a resource by name.
    pub fn find_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// The resource containing `addr`, if any.
    pub fn decode_address(&self, addr: u64) -> Option<&Resource> {
        self.resources.iter().find(|r| r.start <= addr && addr < r.end)
    }
}
