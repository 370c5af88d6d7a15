//! `dramctl plan`: render build plans without running them.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use dramctl_build::Builder;
use dramctl_model::ModuleCatalog;

use crate::manifest::CoreManifest;

/// Prepare a plan for every core through one builder. With `out_dir`, each
/// plan's files are written there.
pub fn run(
    manifest_path: &Path,
    sim: bool,
    out_dir: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let manifest = CoreManifest::load(manifest_path)?;
    let catalog = ModuleCatalog::builtin();
    let pins = manifest.pin_table();
    let mut builder = Builder::new();

    for entry in &manifest.cores {
        let core = entry.instantiate(&catalog, &pins)?;
        let plan = builder
            .prepare(&core, sim, entry.name_force)
            .with_context(|| format!("preparing build plan for core '{}'", core.name()))?;

        writeln!(out, "=== Plan: {} ===", core.name())?;
        writeln!(out, "  Script: {}.sh", plan.script())?;
        writeln!(out, "  Digest: {}", plan.digest())?;
        for (path, content) in plan.files() {
            writeln!(out, "    {path} ({} bytes)", content.len())?;
        }
        if let Some(dir) = out_dir {
            plan.write_local(dir)
                .with_context(|| format!("writing plan for core '{}'", core.name()))?;
            writeln!(out, "  Written to {}", dir.display())?;
        }
        writeln!(out)?;
    }
    Ok(())
}
