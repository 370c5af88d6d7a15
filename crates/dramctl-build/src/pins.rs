//! Physical DRAM pin binding.
//!
//! The controller drives its own I/O buffers, so pins are requested raw: no
//! direction constraint and no register stage on any signal. Which signals a
//! binding must provide depends on the device family.

use std::collections::BTreeMap;

use dramctl_model::{Family, ModelError};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Signals every family requires.
pub const COMMON_SIGNALS: [&str; 9] = [
    "a", "ba", "ras", "cas", "we", "dm", "clk.p", "clk_en", "odt",
];

/// Signals connected only when the binding provides them.
pub const OPTIONAL_SIGNALS: [&str; 2] = ["cs", "rst"];

/// Family-specific required signals.
pub fn family_signals(family: &Family) -> &'static [&'static str] {
    match family {
        Family::Ecp5(_) => &["dq", "dqs.p"],
        Family::Artix7(_) => &["dq", "dqs.p", "dqs.n", "clk.n"],
    }
}

/// How an I/O is requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoRequest {
    /// Raw access, no buffer direction imposed.
    pub raw: bool,
    /// Number of register stages (0 = combinational).
    pub xdr: u32,
}

impl IoRequest {
    /// The request used for every DRAM I/O.
    pub const RAW: IoRequest = IoRequest { raw: true, xdr: 0 };
}

/// A resolved set of named pin signals, each with its width in bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinBundle {
    pub resource: String,
    #[serde(default)]
    pub number: u32,
    pub signals: BTreeMap<String, u32>,
}

impl PinBundle {
    pub fn new(resource: impl Into<String>, number: u32) -> Self {
        Self {
            resource: resource.into(),
            number,
            signals: BTreeMap::new(),
        }
    }

    /// Builder-style signal insertion.
    pub fn with_signal(mut self, name: impl Into<String>, width: u32) -> Self {
        self.signals.insert(name.into(), width);
        self
    }

    /// Width of `name`, if present.
    pub fn width(&self, name: &str) -> Option<u32> {
        self.signals.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    /// Check that every signal `family` requires is present with a positive width.
    pub fn validate(&self, family: &Family) -> Result<()> {
        let required = COMMON_SIGNALS.iter().chain(family_signals(family));
        let missing: Vec<&str> = required.copied().filter(|s| !self.has(s)).collect();
        if !missing.is_empty() {
            return Err(ModelError::config(
                "pins",
                &self.resource,
                format!(
                    "{} pins are missing signals required by the {} PHY: {}",
                    family.tag(),
                    family.phy_name(),
                    missing.join(", ")
                ),
            )
            .into());
        }
        if let Some((name, _)) = self.signals.iter().find(|(_, w)| **w == 0) {
            let reason = format!("signal '{name}' has zero width");
            return Err(ModelError::config("pins", &self.resource, reason).into());
        }
        Ok(())
    }
}

/// Resolves pin resources of a platform.
pub trait PinProvider {
    /// Request resource `name` number `number` with the given I/O settings.
    /// Returns `None` if the platform has no such resource.
    fn request(&self, name: &str, number: u32, io: IoRequest) -> Option<PinBundle>;
}

/// A fixed table of pin resources.
#[derive(Debug, Clone, Default)]
pub struct PinTable {
    bundles: Vec<PinBundle>,
}

impl PinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bundle: PinBundle) {
        self.bundles.retain(|b| !(b.resource == bundle.resource && b.number == bundle.number));
        self.bundles.push(bundle);
    }
}

impl PinProvider for PinTable {
    fn request(&self, name: &str, number: u32, _io: IoRequest) -> Option<PinBundle> {
        self.bundles
            .iter()
            .find(|b| b.resource == name && b.number == number)
            .cloned()
    }
}

/// Request DRAM pins for `family` and check them.
pub fn request_pins(
    provider: &dyn PinProvider,
    name: &str,
    number: u32,
    family: &Family,
) -> Result<PinBundle> {
    let bundle = provider.request(name, number, IoRequest::RAW).ok_or_else(|| {
        ModelError::config("pins", format!("{name}#{number}"), "no such pin resource")
    })?;
    bundle.validate(family)?;
    tracing::debug!(resource = name, number, signals = bundle.signals.len(), "bound DRAM pins");
    Ok(bundle)
}

#[cfg(test)]
pub(crate) mod tests {
    use dramctl_model::Ecp5Settings;

    use super::*;
    use crate::error::BuildError;

    pub(crate) fn ddr3_pins(family: &Family) -> PinBundle {
        let mut bundle = PinBundle::new("ddr3", 0)
            .with_signal("a", 13)
            .with_signal("ba", 3)
            .with_signal("ras", 1)
            .with_signal("cas", 1)
            .with_signal("we", 1)
            .with_signal("dm", 2)
            .with_signal("clk.p", 1)
            .with_signal("clk_en", 1)
            .with_signal("odt", 1)
            .with_signal("dq", 16)
            .with_signal("dqs.p", 2);
        if let Family::Artix7(_) = family {
            bundle = bundle.with_signal("dqs.n", 2).with_signal("clk.n", 1);
        }
        bundle
    }

    fn ecp5() -> Family {
        Family::Ecp5(Ecp5Settings { init_clk_freq: 25_000_000 })
    }

    #[test]
    fn accepts_complete_bundle() {
        let family = ecp5();
        ddr3_pins(&family).validate(&family).unwrap();
    }

    #[test]
    fn reports_missing_signals() {
        let family = ecp5();
        let mut bundle = ddr3_pins(&family);
        bundle.signals.remove("dqs.p");
        bundle.signals.remove("odt");
        let err = bundle.validate(&family).unwrap_err();
        match err {
            BuildError::Model(ModelError::Configuration { field, reason, .. }) => {
                assert_eq!(field, "pins");
                assert!(reason.contains("odt, dqs.p"), "{reason}");
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn table_lookup_requests_raw_io() {
        let family = ecp5();
        let mut table = PinTable::new();
        table.insert(ddr3_pins(&family));
        let bundle = request_pins(&table, "ddr3", 0, &family).unwrap();
        assert_eq!(bundle.width("dq"), Some(16));
        assert!(request_pins(&table, "ddr3", 1, &family).is_err());
    }
}
