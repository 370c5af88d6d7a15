//! DRAM module geometry.
//!
//! The controller needs to know how a module splits its address space into
//! banks, rows and columns. That knowledge lives outside the configuration, in a
//! [`GeometryProvider`]. [`ModuleCatalog`] is the built-in provider, covering the
//! parts commonly found on FPGA development boards.

use serde::Serialize;

use crate::bits::log2_exact;
use crate::config::{MemoryType, Rate};

/// Bank/row/column decomposition of a DRAM module's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    /// Memory type reported by the provider, for cross-checking.
    pub memtype: MemoryType,
    /// Number of bank address bits.
    pub bank_bits: u32,
    /// Number of row address bits.
    pub row_bits: u32,
    /// Number of column address bits.
    pub col_bits: u32,
    /// Number of banks.
    pub nbanks: u64,
}

impl Geometry {
    /// Total address bits of one byte group (`bank + row + col`).
    pub fn address_bits(&self) -> u32 {
        self.bank_bits + self.row_bits + self.col_bits
    }
}

/// Resolves a module identifier into its geometry.
pub trait GeometryProvider {
    /// Look up `module_name` for a controller running at `clk_freq` Hz with the given rate.
    ///
    /// Returns `None` if the module is unknown.
    fn lookup(&self, module_name: &str, clk_freq: u64, rate: Rate) -> Option<Geometry>;
}

/// Organization of a single DRAM part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    /// Part name (e.g. `"MT41K128M16"`).
    pub name: String,
    pub memtype: MemoryType,
    pub nbanks: u64,
    pub nrows: u64,
    pub ncols: u64,
}

impl ModuleSpec {
    /// Describe a part. Bank, row and column counts must be powers of two.
    pub fn new(
        name: impl Into<String>,
        memtype: MemoryType,
        nbanks: u64,
        nrows: u64,
        ncols: u64,
    ) -> Self {
        Self {
            name: name.into(),
            memtype,
            nbanks,
            nrows,
            ncols,
        }
    }

    /// Geometry of this part, or `None` if a dimension is not a power of two.
    pub fn geometry(&self) -> Option<Geometry> {
        Some(Geometry {
            memtype: self.memtype,
            bank_bits: log2_exact(self.nbanks)?,
            row_bits: log2_exact(self.nrows)?,
            col_bits: log2_exact(self.ncols)?,
            nbanks: self.nbanks,
        })
    }

    /// Capacity of one byte group of this part, in bytes.
    pub fn capacity_per_byte_group(&self) -> u64 {
        self.nbanks * self.nrows * self.ncols
    }
}

/// Table of known DRAM parts.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleSpec>,
}

impl ModuleCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of commonly used DDR2, DDR3 and DDR4 parts.
    pub fn builtin() -> Self {
        use MemoryType::{Ddr2, Ddr3, Ddr4};

        let mut catalog = Self::new();
        for (name, memtype, nbanks, nrows, ncols) in [
            // DDR2
            ("MT47H128M8", Ddr2, 8, 16384, 1024),
            ("MT47H32M16", Ddr2, 4, 8192, 1024),
            ("MT47H64M16", Ddr2, 8, 8192, 1024),
            ("P3R1GE4JGF", Ddr2, 8, 8192, 1024),
            // DDR3
            ("MT41K64M16", Ddr3, 8, 8192, 1024),
            ("MT41J128M16", Ddr3, 8, 16384, 1024),
            ("MT41K128M16", Ddr3, 8, 16384, 1024),
            ("MT41J256M16", Ddr3, 8, 32768, 1024),
            ("MT41K256M16", Ddr3, 8, 32768, 1024),
            ("MT41K512M16", Ddr3, 8, 65536, 1024),
            ("K4B1G0446F", Ddr3, 8, 16384, 1024),
            ("K4B2G1646F", Ddr3, 8, 32768, 1024),
            ("IS43TR16128B", Ddr3, 8, 16384, 1024),
            ("MT8JTF12864", Ddr3, 8, 16384, 1024),
            ("MT18KSF1G72HZ", Ddr3, 8, 65536, 1024),
            // DDR4 (bank groups folded into the bank count)
            ("MT40A256M16", Ddr4, 8, 32768, 1024),
            ("MT40A512M16", Ddr4, 8, 65536, 1024),
            ("MT40A512M8", Ddr4, 16, 32768, 1024),
            ("MT40A1G8", Ddr4, 16, 65536, 1024),
        ] {
            catalog.insert(ModuleSpec::new(name, memtype, nbanks, nrows, ncols));
        }
        catalog
    }

    /// Add or replace a part.
    pub fn insert(&mut self, spec: ModuleSpec) {
        self.modules.retain(|m| m.name != spec.name);
        self.modules.push(spec);
    }

    /// Look up a part by name.
    pub fn get(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// All parts, in insertion order.
    pub fn modules(&self) -> &[ModuleSpec] {
        &self.modules
    }
}

impl GeometryProvider for ModuleCatalog {
    fn lookup(&self, module_name: &str, _clk_freq: u64, _rate: Rate) -> Option<Geometry> {
        self.get(module_name)?.geometry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_lookup() {
        let catalog = ModuleCatalog::builtin();
        let g = catalog
            .lookup("MT41K128M16", 100_000_000, Rate::Quarter)
            .unwrap();
        assert_eq!(g.memtype, MemoryType::Ddr3);
        assert_eq!((g.bank_bits, g.row_bits, g.col_bits), (3, 14, 10));
        assert_eq!(g.address_bits(), 27);
        assert!(catalog.lookup("MT99X", 100_000_000, Rate::Quarter).is_none());
    }

    #[test]
    fn ddr4_bank_groups() {
        let g = ModuleCatalog::builtin()
            .lookup("MT40A512M8", 100_000_000, Rate::Quarter)
            .unwrap();
        assert_eq!(g.nbanks, 16);
        assert_eq!(g.bank_bits, 4);
    }

    #[test]
    fn insert_replaces_existing_part() {
        let mut catalog = ModuleCatalog::builtin();
        let before = catalog.modules().len();
        catalog.insert(ModuleSpec::new("MT41K64M16", MemoryType::Ddr3, 4, 8192, 512));
        assert_eq!(catalog.modules().len(), before);
        let g = catalog.lookup("MT41K64M16", 1, Rate::Quarter).unwrap();
        assert_eq!((g.bank_bits, g.col_bits), (2, 9));
    }

    #[test]
    fn non_power_of_two_part_has_no_geometry() {
        let spec = ModuleSpec::new("ODD", MemoryType::Ddr3, 6, 8192, 1024);
        assert!(spec.geometry().is_none());
        assert_eq!(spec.capacity_per_byte_group(), 6 * 8192 * 1024);
    }
}
