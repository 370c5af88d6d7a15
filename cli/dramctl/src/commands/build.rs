//! `dramctl build`: generate every core and read back its control bus.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dramctl_build::{BuildOptions, Builder, Connection, Core, ScriptRunner};
use dramctl_model::{ControlBus, ModuleCatalog};
use serde::Serialize;

use crate::manifest::CoreManifest;

/// Machine-readable result of building one core.
#[derive(Debug, Serialize)]
struct CoreReport<'a> {
    name: &'a str,
    capacity: u64,
    control_bus: &'a ControlBus,
    connections: Vec<Connection>,
}

/// Build every core in `build_dir` and report its register map.
pub fn run(
    manifest_path: &Path,
    sim: bool,
    build_dir: &Path,
    format: &str,
    runner: &dyn ScriptRunner,
    out: &mut dyn Write,
) -> Result<()> {
    if format != "text" && format != "json" {
        bail!("unknown output format '{format}', expected 'text' or 'json'");
    }

    let manifest = CoreManifest::load(manifest_path)?;
    let catalog = ModuleCatalog::builtin();
    let pins = manifest.pin_table();
    let mut builder = Builder::new();
    let mut cores = Vec::with_capacity(manifest.cores.len());

    for entry in &manifest.cores {
        let mut core = entry.instantiate(&catalog, &pins)?;
        let options = BuildOptions {
            do_build: true,
            build_dir: build_dir.to_path_buf(),
            sim,
            name_force: entry.name_force,
        };
        core.build(&mut builder, &options, runner)
            .with_context(|| format!("building core '{}'", core.name()))?;
        cores.push(core);
    }

    match format {
        "json" => {
            let reports = cores.iter().map(report).collect::<Result<Vec<_>>>()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?;
        }
        _ => {
            for core in &cores {
                print_text(core, out)?;
            }
        }
    }
    Ok(())
}

fn report(core: &Core) -> Result<CoreReport<'_>> {
    Ok(CoreReport {
        name: core.name(),
        capacity: core.capacity(),
        control_bus: core.control_bus()?,
        connections: core.connections()?,
    })
}

fn print_text(core: &Core, out: &mut dyn Write) -> Result<()> {
    let bus = core.control_bus()?;
    writeln!(out, "=== Core: {} ===", core.name())?;
    writeln!(
        out,
        "  Control bus: {} address bits, {} data bits, granularity {}",
        bus.addr_width(),
        bus.data_width(),
        bus.granularity()
    )?;
    let map = bus.memory_map()?;
    for res in map.resources() {
        writeln!(out, "    0x{:08X} {:<40} {} bytes", res.start, res.name, res.size())?;
    }
    writeln!(out, "  Instance ports:")?;
    for conn in core.connections()? {
        writeln!(out, "    {conn}")?;
    }
    writeln!(out)?;
    Ok(())
}
