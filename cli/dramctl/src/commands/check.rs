//! `dramctl check`: validate every core of a manifest.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use dramctl_build::Core;
use dramctl_model::ModuleCatalog;

use crate::manifest::CoreManifest;

/// Validate every core and describe it.
pub fn run(manifest_path: &Path, out: &mut dyn Write) -> Result<()> {
    let manifest = CoreManifest::load(manifest_path)?;
    let catalog = ModuleCatalog::builtin();
    let pins = manifest.pin_table();
    for entry in &manifest.cores {
        let core = entry.instantiate(&catalog, &pins)?;
        describe(&core, out)?;
    }
    writeln!(out, "{} core(s) OK", manifest.cores.len())?;
    Ok(())
}

/// Print a summary of `core`.
pub fn describe(core: &Core, out: &mut dyn Write) -> Result<()> {
    let config = core.config();
    let geometry = core.geometry();
    let port = core.user_port();

    writeln!(out, "=== Core: {} ===", core.name())?;
    writeln!(out, "  Family:    {} ({})", config.family().tag(), config.phy_name())?;
    writeln!(
        out,
        "  Memory:    {} rate {} ({} DFI phases)",
        config.memtype(),
        config.rate().as_str(),
        config.rate().phases()
    )?;
    writeln!(
        out,
        "  Module:    {} x{} byte groups, {} rank(s)",
        config.module_name(),
        config.module_bytes(),
        config.module_ranks()
    )?;
    writeln!(
        out,
        "  Geometry:  {} bank / {} row / {} col bits",
        geometry.bank_bits, geometry.row_bits, geometry.col_bits
    )?;
    writeln!(
        out,
        "  Clocks:    input {} Hz ({}), user {} Hz ({})",
        config.input_clk_freq(),
        config.input_domain(),
        config.user_clk_freq(),
        config.user_domain()
    )?;
    writeln!(out, "  Capacity:  {} bytes", core.capacity())?;
    let layout = port.layout();
    writeln!(
        out,
        "  User port: {} address bits, {} data bits, {} signal bits",
        port.addr_width(),
        port.data_width(),
        layout.total_width()
    )?;
    write!(out, "{layout}")?;
    let map = port.memory_map()?;
    for res in map.resources() {
        writeln!(
            out,
            "    {}: 0x{:08X} - 0x{:08X} ({} address bits)",
            res.name,
            res.start,
            res.end,
            map.addr_width()
        )?;
    }
    if let Some(pins) = core.pins() {
        writeln!(
            out,
            "  Pins:      {}#{} ({} signals)",
            pins.resource,
            pins.number,
            pins.signals.len()
        )?;
    }
    writeln!(out)?;
    Ok(())
}
