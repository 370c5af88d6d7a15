//! `dramctl modules`: list the built-in DRAM module catalog.

use std::io::Write;

use anyhow::Result;
use dramctl_model::ModuleCatalog;

pub fn run(out: &mut dyn Write) -> Result<()> {
    let catalog = ModuleCatalog::builtin();
    writeln!(out, "Built-in DRAM modules:")?;
    writeln!(out)?;
    writeln!(
        out,
        "  {:<16} {:<6} {:>6} {:>7} {:>6} {:>14}",
        "NAME", "TYPE", "BANKS", "ROWS", "COLS", "BYTES/GROUP"
    )?;
    for spec in catalog.modules() {
        writeln!(
            out,
            "  {:<16} {:<6} {:>6} {:>7} {:>6} {:>14}",
            spec.name,
            spec.memtype.as_str(),
            spec.nbanks,
            spec.nrows,
            spec.ncols,
            spec.capacity_per_byte_group()
        )?;
    }
    Ok(())
}
