//! Controller configuration model.
//!
//! A [`Config`] describes the DRAM device attached to the controller, its clocking,
//! and the widths of the user-facing interfaces. It is built from loosely typed
//! parameters ([`ConfigParams`] plus a [`FamilyParams`] variant) and validated
//! field by field in a fixed order. The first invalid field aborts construction.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::geometry::{Geometry, GeometryProvider};

/// DRAM memory type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MemoryType {
    #[serde(rename = "DDR2")]
    Ddr2,
    #[serde(rename = "DDR3")]
    Ddr3,
    #[serde(rename = "DDR4")]
    Ddr4,
}

/// Ratio between the controller clock and the DRAM clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rate {
    /// One controller cycle per two DRAM cycles.
    #[serde(rename = "1:2")]
    Half,
    /// One controller cycle per four DRAM cycles.
    #[serde(rename = "1:4")]
    Quarter,
}

impl Rate {
    /// The ratio as written by the generator (`"1:2"`, `"1:4"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Rate::Half => "1:2",
            Rate::Quarter => "1:4",
        }
    }

    /// Number of DFI phases per controller cycle.
    pub fn phases(&self) -> u32 {
        match self {
            Rate::Half => 2,
            Rate::Quarter => 4,
        }
    }
}

impl MemoryType {
    /// All supported memory types.
    pub const ALL: [MemoryType; 3] = [MemoryType::Ddr2, MemoryType::Ddr3, MemoryType::Ddr4];

    /// Parse a memory type name (`"DDR2"`, `"DDR3"` or `"DDR4"`).
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "DDR2" => Ok(MemoryType::Ddr2),
            "DDR3" => Ok(MemoryType::Ddr3),
            "DDR4" => Ok(MemoryType::Ddr4),
            other => Err(ModelError::config(
                "memtype",
                other,
                "must be one of \"DDR2\", \"DDR3\" or \"DDR4\"",
            )),
        }
    }

    /// Canonical name of this memory type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Ddr2 => "DDR2",
            MemoryType::Ddr3 => "DDR3",
            MemoryType::Ddr4 => "DDR4",
        }
    }

    /// Internal data rate implied by this memory type.
    pub fn rate(&self) -> Rate {
        match self {
            MemoryType::Ddr2 => Rate::Half,
            MemoryType::Ddr3 | MemoryType::Ddr4 => Rate::Quarter,
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FPGA speed grade accepted by the Artix-7 PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpeedGrade {
    #[serde(rename = "-1")]
    Minus1,
    #[serde(rename = "-2")]
    Minus2,
    #[serde(rename = "-2L")]
    Minus2L,
    #[serde(rename = "-2G")]
    Minus2G,
    #[serde(rename = "-3")]
    Minus3,
}

impl SpeedGrade {
    const NAMES: [&'static str; 5] = ["-1", "-2", "-2L", "-2G", "-3"];

    /// Parse a speed grade string such as `"-1"` or `"-2L"`.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "-1" => Ok(SpeedGrade::Minus1),
            "-2" => Ok(SpeedGrade::Minus2),
            "-2L" => Ok(SpeedGrade::Minus2L),
            "-2G" => Ok(SpeedGrade::Minus2G),
            "-3" => Ok(SpeedGrade::Minus3),
            other => Err(ModelError::config(
                "speedgrade",
                other,
                format!("must be one of '{}'", Self::NAMES.join("', '")),
            )),
        }
    }

    /// The speed grade as written in vendor documentation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedGrade::Minus1 => "-1",
            SpeedGrade::Minus2 => "-2",
            SpeedGrade::Minus2L => "-2L",
            SpeedGrade::Minus2G => "-2G",
            SpeedGrade::Minus3 => "-3",
        }
    }
}

/// Unvalidated parameters shared by every device family.
///
/// Numeric fields are signed so that out-of-range input reaches validation
/// and is reported against the field that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigParams {
    /// DRAM type (e.g. `"DDR3"`).
    pub memtype: String,
    /// DRAM module name, resolved through a [`GeometryProvider`].
    pub module_name: String,
    /// Number of byte groups of the DRAM interface.
    pub module_bytes: i64,
    /// Number of ranks (sets of chips sharing a chip-select).
    pub module_ranks: i64,
    /// Frequency of the input clock driving the internal PLL, in Hz.
    pub input_clk_freq: i64,
    /// Frequency of the user clock generated by the internal PLL, in Hz.
    pub user_clk_freq: i64,
    /// Input clock domain.
    #[serde(default = "default_input_domain")]
    pub input_domain: String,
    /// User clock domain.
    #[serde(default = "default_user_domain")]
    pub user_domain: String,
    /// User port data width.
    #[serde(default = "default_user_data_width")]
    pub user_data_width: i64,
    /// Command buffer depth.
    #[serde(default = "default_cmd_buffer_depth")]
    pub cmd_buffer_depth: i64,
    /// Control bus data width.
    #[serde(default = "default_csr_data_width")]
    pub csr_data_width: i64,
}

fn default_input_domain() -> String {
    "litedram_input".to_string()
}

fn default_user_domain() -> String {
    "litedram_user".to_string()
}

fn default_user_data_width() -> i64 {
    128
}

fn default_cmd_buffer_depth() -> i64 {
    16
}

fn default_csr_data_width() -> i64 {
    32
}

impl ConfigParams {
    /// Create parameters with the required fields set and every other field at its default.
    pub fn new(
        memtype: impl Into<String>,
        module_name: impl Into<String>,
        module_bytes: i64,
        module_ranks: i64,
        input_clk_freq: i64,
        user_clk_freq: i64,
    ) -> Self {
        Self {
            memtype: memtype.into(),
            module_name: module_name.into(),
            module_bytes,
            module_ranks,
            input_clk_freq,
            user_clk_freq,
            input_domain: default_input_domain(),
            user_domain: default_user_domain(),
            user_data_width: default_user_data_width(),
            cmd_buffer_depth: default_cmd_buffer_depth(),
            csr_data_width: default_csr_data_width(),
        }
    }
}

/// Unvalidated parameters specific to the ECP5 PHY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ecp5Params {
    /// Frequency of the PHY initialization clock, in Hz.
    pub init_clk_freq: i64,
}

/// Unvalidated parameters specific to the Artix-7 PHY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artix7Params {
    /// FPGA speed grade (e.g. `"-1"`).
    pub speedgrade: String,
    /// Additional command latency.
    pub cmd_latency: i64,
    /// Nominal termination impedance, in ohms.
    pub rtt_nom: i64,
    /// Write termination impedance, in ohms.
    pub rtt_wr: i64,
    /// Output driver impedance, in ohms.
    pub ron: i64,
    /// IODELAY reference clock frequency, in Hz.
    pub iodelay_clk_freq: i64,
}

/// Family-specific parameters, selected by the `family` key when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum FamilyParams {
    Ecp5(Ecp5Params),
    Artix7(Artix7Params),
}

/// Complete unvalidated configuration, as read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSpec {
    /// Parameters common to all families.
    #[serde(flatten)]
    pub base: ConfigParams,
    /// Family-specific parameters.
    #[serde(flatten)]
    pub family: FamilyParams,
}

impl ConfigSpec {
    /// Parse a configuration spec from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a configuration spec from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate into a [`Config`].
    pub fn validate(&self) -> Result<Config> {
        Config::new(&self.base, &self.family)
    }
}

/// Validated ECP5 settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ecp5Settings {
    /// Frequency of the PHY initialization clock, in Hz.
    pub init_clk_freq: u64,
}

/// Validated Artix-7 settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artix7Settings {
    pub speedgrade: SpeedGrade,
    pub cmd_latency: u64,
    pub rtt_nom: u64,
    pub rtt_wr: u64,
    pub ron: u64,
    pub iodelay_clk_freq: u64,
}

/// The closed set of supported device families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Family {
    /// Lattice ECP5.
    Ecp5(Ecp5Settings),
    /// Xilinx Artix-7.
    Artix7(Artix7Settings),
}

impl Family {
    /// Short family tag (`"ecp5"`, `"artix7"`).
    pub fn tag(&self) -> &'static str {
        match self {
            Family::Ecp5(_) => "ecp5",
            Family::Artix7(_) => "artix7",
        }
    }

    /// Name of the PHY the generator instantiates for this family.
    pub fn phy_name(&self) -> &'static str {
        match self {
            Family::Ecp5(_) => "ECP5DDRPHY",
            Family::Artix7(_) => "A7DDRPHY",
        }
    }
}

/// Validated, immutable controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    memtype: MemoryType,
    module_name: String,
    module_bytes: u64,
    module_ranks: u64,
    input_clk_freq: u64,
    user_clk_freq: u64,
    input_domain: String,
    user_domain: String,
    user_data_width: u64,
    cmd_buffer_depth: u64,
    csr_data_width: u64,
    #[serde(flatten)]
    family: Family,
}

fn positive(field: &'static str, value: i64) -> Result<u64> {
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(ModelError::config(field, value, "must be a positive integer"))
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64> {
    if value >= 0 {
        Ok(value as u64)
    } else {
        Err(ModelError::config(field, value, "must be a non-negative integer"))
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String> {
    if value.is_empty() {
        Err(ModelError::config(field, value, "must be a non-empty string"))
    } else {
        Ok(value.to_string())
    }
}

fn one_of(field: &'static str, value: i64, allowed: &[i64]) -> Result<u64> {
    if allowed.contains(&value) {
        Ok(value as u64)
    } else {
        let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
        Err(ModelError::config(
            field,
            value,
            format!("must be one of {}", names.join(", ")),
        ))
    }
}

impl Config {
    /// Validate `base` and then `family`, stopping at the first invalid field.
    pub fn new(base: &ConfigParams, family: &FamilyParams) -> Result<Self> {
        let memtype = MemoryType::parse(&base.memtype)?;
        let module_name = non_empty("module_name", &base.module_name)?;
        let module_bytes = positive("module_bytes", base.module_bytes)?;
        let module_ranks = positive("module_ranks", base.module_ranks)?;
        let input_clk_freq = positive("input_clk_freq", base.input_clk_freq)?;
        let user_clk_freq = positive("user_clk_freq", base.user_clk_freq)?;
        let input_domain = non_empty("input_domain", &base.input_domain)?;
        let user_domain = non_empty("user_domain", &base.user_domain)?;
        let user_data_width =
            one_of("user_data_width", base.user_data_width, &[8, 16, 32, 64, 128])?;
        let cmd_buffer_depth = positive("cmd_buffer_depth", base.cmd_buffer_depth)?;
        let csr_data_width = one_of("csr_data_width", base.csr_data_width, &[8, 16, 32, 64])?;

        let family = match family {
            FamilyParams::Ecp5(p) => Family::Ecp5(Ecp5Settings {
                init_clk_freq: positive("init_clk_freq", p.init_clk_freq)?,
            }),
            FamilyParams::Artix7(p) => Family::Artix7(Artix7Settings {
                speedgrade: SpeedGrade::parse(&p.speedgrade)?,
                cmd_latency: non_negative("cmd_latency", p.cmd_latency)?,
                rtt_nom: non_negative("rtt_nom", p.rtt_nom)?,
                rtt_wr: non_negative("rtt_wr", p.rtt_wr)?,
                ron: non_negative("ron", p.ron)?,
                iodelay_clk_freq: positive("iodelay_clk_freq", p.iodelay_clk_freq)?,
            }),
        };

        Ok(Self {
            memtype,
            module_name,
            module_bytes,
            module_ranks,
            input_clk_freq,
            user_clk_freq,
            input_domain,
            user_domain,
            user_data_width,
            cmd_buffer_depth,
            csr_data_width,
            family,
        })
    }

    /// Build an ECP5 configuration.
    pub fn ecp5(base: &ConfigParams, params: Ecp5Params) -> Result<Self> {
        Self::new(base, &FamilyParams::Ecp5(params))
    }

    /// Build an Artix-7 configuration.
    pub fn artix7(base: &ConfigParams, params: Artix7Params) -> Result<Self> {
        Self::new(base, &FamilyParams::Artix7(params))
    }

    /// Resolve the module geometry through `provider`.
    ///
    /// Fails with [`ModelError::Configuration`] if the module is unknown, and with
    /// [`ModelError::InternalInconsistency`] if the provider reports a memory type
    /// other than the configured one.
    pub fn derive_geometry(&self, provider: &dyn GeometryProvider) -> Result<Geometry> {
        let geometry = provider
            .lookup(&self.module_name, self.user_clk_freq, self.rate())
            .ok_or_else(|| {
                ModelError::config("module_name", &self.module_name, "is not a known DRAM module")
            })?;
        if geometry.memtype != self.memtype {
            return Err(ModelError::InternalInconsistency {
                detail: format!(
                    "module {} is described as {}, but the configuration requests {}",
                    self.module_name, geometry.memtype, self.memtype
                ),
            });
        }
        tracing::debug!(
            module = %self.module_name,
            bank_bits = geometry.bank_bits,
            row_bits = geometry.row_bits,
            col_bits = geometry.col_bits,
            "resolved module geometry"
        );
        Ok(geometry)
    }

    pub fn memtype(&self) -> MemoryType {
        self.memtype
    }

    /// Internal data rate implied by the memory type.
    pub fn rate(&self) -> Rate {
        self.memtype.rate()
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn module_bytes(&self) -> u64 {
        self.module_bytes
    }

    pub fn module_ranks(&self) -> u64 {
        self.module_ranks
    }

    pub fn input_clk_freq(&self) -> u64 {
        self.input_clk_freq
    }

    pub fn user_clk_freq(&self) -> u64 {
        self.user_clk_freq
    }

    pub fn input_domain(&self) -> &str {
        &self.input_domain
    }

    pub fn user_domain(&self) -> &str {
        &self.user_domain
    }

    pub fn user_data_width(&self) -> u64 {
        self.user_data_width
    }

    pub fn cmd_buffer_depth(&self) -> u64 {
        self.cmd_buffer_depth
    }

    pub fn csr_data_width(&self) -> u64 {
        self.csr_data_width
    }

    /// Family-specific settings.
    pub fn family(&self) -> &Family {
        &self.family
    }

    /// Name of the PHY the generator instantiates.
    pub fn phy_name(&self) -> &'static str {
        self.family.phy_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ModuleCatalog;

    fn ddr3_params() -> ConfigParams {
        ConfigParams::new("DDR3", "MT41K64M16", 1, 1, 100_000_000, 50_000_000)
    }

    fn ecp5() -> Ecp5Params {
        Ecp5Params {
            init_clk_freq: 25_000_000,
        }
    }

    fn artix7() -> Artix7Params {
        Artix7Params {
            speedgrade: "-1".into(),
            cmd_latency: 0,
            rtt_nom: 60,
            rtt_wr: 60,
            ron: 34,
            iodelay_clk_freq: 200_000_000,
        }
    }

    fn field_of(err: ModelError) -> &'static str {
        match err {
            ModelError::Configuration { field, .. } => field,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::ecp5(&ddr3_params(), ecp5()).unwrap();
        assert_eq!(config.input_domain(), "litedram_input");
        assert_eq!(config.user_domain(), "litedram_user");
        assert_eq!(config.user_data_width(), 128);
        assert_eq!(config.cmd_buffer_depth(), 16);
        assert_eq!(config.csr_data_width(), 32);
        assert_eq!(config.phy_name(), "ECP5DDRPHY");
    }

    #[test]
    fn memtype_implies_rate() {
        assert_eq!(MemoryType::Ddr2.rate(), Rate::Half);
        assert_eq!(MemoryType::Ddr3.rate(), Rate::Quarter);
        assert_eq!(MemoryType::Ddr4.rate().as_str(), "1:4");
        assert_eq!(Rate::Half.phases(), 2);
    }

    #[test]
    fn rejects_unknown_memtype() {
        let mut p = ddr3_params();
        p.memtype = "DDR5".into();
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "memtype");
    }

    #[test]
    fn rejects_zero_byte_groups() {
        let mut p = ddr3_params();
        p.module_bytes = 0;
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "module_bytes");
    }

    #[test]
    fn rejects_negative_ranks() {
        let mut p = ddr3_params();
        p.module_ranks = -1;
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "module_ranks");
    }

    #[test]
    fn rejects_non_power_of_two_user_width() {
        let mut p = ddr3_params();
        p.user_data_width = 96;
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "user_data_width");
    }

    #[test]
    fn rejects_wide_csr_bus() {
        let mut p = ddr3_params();
        p.csr_data_width = 128;
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "csr_data_width");
    }

    #[test]
    fn rejects_empty_domain() {
        let mut p = ddr3_params();
        p.user_domain = String::new();
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "user_domain");
    }

    #[test]
    fn first_invalid_field_wins() {
        let mut p = ddr3_params();
        p.module_bytes = 0;
        p.user_clk_freq = 0;
        p.csr_data_width = 7;
        assert_eq!(field_of(Config::ecp5(&p, ecp5()).unwrap_err()), "module_bytes");

        // Base fields are checked before family fields.
        let mut a = artix7();
        a.speedgrade = "-4".into();
        assert_eq!(field_of(Config::artix7(&p, a).unwrap_err()), "module_bytes");
    }

    #[test]
    fn ecp5_rejects_zero_init_clock() {
        let err = Config::ecp5(&ddr3_params(), Ecp5Params { init_clk_freq: 0 }).unwrap_err();
        assert_eq!(field_of(err), "init_clk_freq");
    }

    #[test]
    fn artix7_fields_are_validated_in_order() {
        let mut a = artix7();
        a.speedgrade = "-4".into();
        a.ron = -1;
        assert_eq!(field_of(Config::artix7(&ddr3_params(), a).unwrap_err()), "speedgrade");

        let mut a = artix7();
        a.rtt_wr = -5;
        a.iodelay_clk_freq = 0;
        assert_eq!(field_of(Config::artix7(&ddr3_params(), a).unwrap_err()), "rtt_wr");

        let mut a = artix7();
        a.iodelay_clk_freq = 0;
        assert_eq!(field_of(Config::artix7(&ddr3_params(), a).unwrap_err()), "iodelay_clk_freq");
    }

    #[test]
    fn artix7_accepts_zero_latency_and_impedances() {
        let mut a = artix7();
        a.cmd_latency = 0;
        a.rtt_nom = 0;
        a.rtt_wr = 0;
        a.ron = 0;
        let config = Config::artix7(&ddr3_params(), a).unwrap();
        assert_eq!(config.phy_name(), "A7DDRPHY");
        assert_eq!(config.family().tag(), "artix7");
    }

    #[test]
    fn geometry_is_resolved_from_catalog() {
        let config = Config::ecp5(&ddr3_params(), ecp5()).unwrap();
        let geometry = config.derive_geometry(&ModuleCatalog::builtin()).unwrap();
        assert_eq!(geometry.bank_bits, 3);
        assert_eq!(geometry.row_bits, 13);
        assert_eq!(geometry.col_bits, 10);
        assert_eq!(geometry.nbanks, 8);
    }

    #[test]
    fn unknown_module_is_a_configuration_error() {
        let mut p = ddr3_params();
        p.module_name = "NOT_A_PART".into();
        let config = Config::ecp5(&p, ecp5()).unwrap();
        let err = config.derive_geometry(&ModuleCatalog::builtin()).unwrap_err();
        assert_eq!(field_of(err), "module_name");
    }

    #[test]
    fn memtype_mismatch_is_an_internal_inconsistency() {
        let mut p = ddr3_params();
        p.memtype = "DDR2".into();
        let config = Config::ecp5(&p, ecp5()).unwrap();
        let err = config.derive_geometry(&ModuleCatalog::builtin()).unwrap_err();
        assert!(matches!(err, ModelError::InternalInconsistency { .. }));
    }

    #[test]
    fn parse_spec_from_toml() {
        let spec = ConfigSpec::from_toml(
            r#"
family = "artix7"
memtype = "DDR3"
module_name = "MT41K128M16"
module_bytes = 2
module_ranks = 1
input_clk_freq = 100000000
user_clk_freq = 100000000
speedgrade = "-1"
cmd_latency = 0
rtt_nom = 60
rtt_wr = 60
ron = 34
iodelay_clk_freq = 200000000
"#,
        )
        .unwrap();
        assert_eq!(spec.base.user_data_width, 128);
        let config = spec.validate().unwrap();
        assert_eq!(config.module_bytes(), 2);
        match config.family() {
            Family::Artix7(a) => assert_eq!(a.speedgrade, SpeedGrade::Minus1),
            other => panic!("unexpected family {other:?}"),
        }
    }

    #[test]
    fn parse_spec_reports_bad_values_by_field() {
        let spec = ConfigSpec::from_toml(
            r#"
family = "ecp5"
memtype = "DDR3"
module_name = "MT41K64M16"
module_bytes = -2
module_ranks = 1
input_clk_freq = 100000000
user_clk_freq = 50000000
init_clk_freq = 25000000
"#,
        )
        .unwrap();
        assert_eq!(field_of(spec.validate().unwrap_err()), "module_bytes");
    }

    #[test]
    fn parse_spec_requires_known_family() {
        let result = ConfigSpec::from_toml(
            r#"
family = "cyclone"
memtype = "DDR3"
module_name = "MT41K64M16"
module_bytes = 1
module_ranks = 1
input_clk_freq = 100000000
user_clk_freq = 50000000
"#,
        );
        assert!(matches!(result, Err(ModelError::Toml(_))));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigSpec::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }
}
