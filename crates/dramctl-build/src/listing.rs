//! Register listings produced by the generator.
//!
//! A listing is line-delimited, comma-separated text:
//!
//! ```text
//! # comment
//! csr_base,sdram,0x00000000,,
//! csr_register,sdram_dfii_control,0x00000000,1,rw
//! constant,config_clock_frequency,100000000,,
//! ```
//!
//! Every data row has five fields: kind, name, address, size and attributes.
//! Only register rows are mapped. Their address is a byte address in hex and
//! their size counts control-bus words.

use dramctl_model::bits::log2_exact;
use dramctl_model::{ControlBus, MemoryMap, ModelError, Placement};

use crate::error::{BuildError, Result};

/// Row kinds that describe a control register.
pub const REGISTER_KINDS: [&str; 2] = ["csr_register", "register"];

/// Data width of the control bus memory map, in bits.
pub const CSR_MAP_DATA_WIDTH: u32 = 8;

/// A register row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRow {
    /// 1-based line number within the listing.
    pub line: usize,
    /// The row as it appeared in the listing.
    pub raw: String,
    pub name: String,
    /// Byte address.
    pub addr: u64,
    /// Size in control-bus words.
    pub size: u64,
    pub attrs: String,
}

fn parse_addr(field: &str) -> Option<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).ok()
}

/// Extract the register rows of `text`. `listing` names the listing in errors.
pub fn parse_register_rows(listing: &str, text: &str) -> Result<Vec<RegisterRow>> {
    let mut rows = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let malformed = |detail: String| BuildError::CsrParse {
            listing: listing.to_string(),
            line,
            row: raw.to_string(),
            detail,
        };

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let [kind, name, addr, size, attrs] = fields.as_slice() else {
            return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
        };
        if !REGISTER_KINDS.contains(kind) {
            continue;
        }
        if name.is_empty() {
            return Err(malformed("register name is empty".into()));
        }
        let addr = parse_addr(addr)
            .ok_or_else(|| malformed(format!("invalid hexadecimal address {addr:?}")))?;
        let size = size
            .parse::<u64>()
            .map_err(|_| malformed(format!("invalid decimal size {size:?}")))?;
        rows.push(RegisterRow {
            line,
            raw: raw.to_string(),
            name: name.to_string(),
            addr,
            size,
            attrs: attrs.to_string(),
        });
    }
    Ok(rows)
}

/// Build the control bus described by `text`.
///
/// Each register becomes a resource of `size * csr_data_width / 8` bytes at its
/// address; the map grows to fit. The bus address width is the map address width
/// less the bits addressing bytes within a word.
pub fn control_bus_from_listing(
    listing: &str,
    text: &str,
    csr_data_width: u32,
) -> Result<ControlBus> {
    let ratio = csr_data_width / CSR_MAP_DATA_WIDTH;
    let ratio_bits = log2_exact(u64::from(ratio)).ok_or_else(|| ModelError::DimensionMismatch {
        detail: format!(
            "control bus data width {csr_data_width} is not a power-of-two multiple of \
             {CSR_MAP_DATA_WIDTH}"
        ),
    })?;

    let mut map = MemoryMap::new(1, CSR_MAP_DATA_WIDTH)?;
    for row in parse_register_rows(listing, text)? {
        let units = row.size.checked_mul(u64::from(ratio));
        let added = units
            .ok_or_else(|| ModelError::ResourceConflict {
                resource: row.name.clone(),
                detail: "size overflows 64 bits".into(),
            })
            .and_then(|units| map.add_resource(&row.name, units, Placement::extend_at(row.addr)));
        let (start, end) = added.map_err(|err| BuildError::CsrParse {
            listing: listing.to_string(),
            line: row.line,
            row: row.raw.clone(),
            detail: err.to_string(),
        })?;
        tracing::debug!(register = %row.name, start, end, attrs = %row.attrs, "mapped register");
    }

    let addr_width = map
        .addr_width()
        .checked_sub(ratio_bits)
        .ok_or_else(|| ModelError::DimensionMismatch {
            detail: format!(
                "register map of {} address bits is too small for a {csr_data_width}-bit \
                 control bus",
                map.addr_width()
            ),
        })?;
    let mut bus = ControlBus::new(addr_width, csr_data_width, CSR_MAP_DATA_WIDTH)?;
    bus.set_memory_map(map)?;
    Ok(bus)
}
