//! Turns controller instances into build plans.
//!
//! # Build products
//!
//! Executing a plan for an instance named `top` leaves, relative to the build
//! directory:
//!
//! - `top_csr.csv`: the register listing, read back to populate the control bus
//! - `top/build_top.sh`, `top/top.v`: generator script and Verilog core
//! - `top/software/include/generated/*.h`: register accessors and constants
//! - `top/top.lpf`, `top/top.ys` (ECP5) or `top/top.xdc`, `top/top.tcl` (Artix-7)
//!
//! # Name conflicts
//!
//! A [`Builder`] remembers every instance name it has prepared. Preparing a
//! second instance with a known name fails unless forced: two plans executed in
//! one directory would overwrite each other's products, and the name is also the
//! Verilog module name of the core.

use std::collections::BTreeSet;

use dramctl_model::Family;

use crate::error::{BuildError, Result};
use crate::instance::Core;
use crate::plan::BuildPlan;
use crate::template::{Context, Template};

/// Banner placed at the top of generated files.
pub const AUTOGENERATED: &str = "Automatically generated by dramctl. Do not edit.";

const SCRIPT_TEMPLATE: &str = r#"
    # {{autogenerated}}
    set -e
    {{commands}}
"#;

const CONFIG_TEMPLATE: &str = r#"
    # {{autogenerated}}
    {
        # General ------------------------------------------------------------------
        "cpu":              "None",
        {% if top.config.phy_name == "A7DDRPHY" %}
        "speedgrade":       {{top.config.speedgrade}},
        {% endif %}
        "memtype":          "{{top.config.memtype}}",

        # PHY ----------------------------------------------------------------------
        {% if top.config.phy_name == "A7DDRPHY" %}
        "cmd_latency":      {{top.config.cmd_latency}},
        {% endif %}
        "sdram_module":     "{{top.config.module_name}}",
        "sdram_module_nb":  {{top.config.module_bytes}},
        "sdram_rank_nb":    {{top.config.module_ranks}},
        "sdram_phy":        "{{top.config.phy_name}}",

        # Electrical ---------------------------------------------------------------
        {% if top.config.phy_name == "A7DDRPHY" %}
        "rtt_nom":          "{{top.config.rtt_nom}}ohm",
        "rtt_wr":           "{{top.config.rtt_wr}}ohm",
        "ron":              "{{top.config.ron}}ohm",
        {% endif %}

        # Frequency ----------------------------------------------------------------
        "input_clk_freq":   {{top.config.input_clk_freq}},
        "sys_clk_freq":     {{top.config.user_clk_freq}},
        {% if top.config.phy_name == "ECP5DDRPHY" %}
        "init_clk_freq":    {{top.config.init_clk_freq}},
        {% elif top.config.phy_name == "A7DDRPHY" %}
        "iodelay_clk_freq": {{top.config.iodelay_clk_freq}},
        {% endif %}

        # Core ---------------------------------------------------------------------
        "cmd_buffer_depth": {{top.config.cmd_buffer_depth}},
        "csr_data_width":   {{top.config.csr_data_width}},

        # User Ports ---------------------------------------------------------------
        "user_ports": {
            "0": {
                "type":       "native",
                "data_width": {{top.config.user_data_width}},
            },
        },
    }
"#;

const GENERATE_COMMAND: &str = r#"
    python -m litedram.gen
        --name {{top.name}}
        --output-dir {{top.name}}
        --gateware-dir {{top.name}}
        --csr-csv {{top.name}}_csr.csv
        {% if sim %}
        --sim
        {% endif %}
        {{top.name}}_config.yml
"#;

/// Prepares build plans and tracks the names it has handed out.
#[derive(Debug, Clone)]
pub struct Builder {
    namespace: BTreeSet<String>,
    file_templates: Vec<(String, String)>,
    command_templates: Vec<String>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::with_templates(
            vec![
                ("build_{{top.name}}.sh".to_string(), SCRIPT_TEMPLATE.to_string()),
                ("{{top.name}}_config.yml".to_string(), CONFIG_TEMPLATE.to_string()),
            ],
            vec![GENERATE_COMMAND.to_string()],
        )
    }
}

impl Builder {
    /// A builder with the default generator templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with custom templates.
    ///
    /// `file_templates` pairs a file name template with a content template.
    /// Rendered commands are joined, one per line, into the `commands` variable.
    pub fn with_templates(
        file_templates: Vec<(String, String)>,
        command_templates: Vec<String>,
    ) -> Self {
        Self {
            namespace: BTreeSet::new(),
            file_templates,
            command_templates,
        }
    }

    /// Names claimed so far.
    pub fn namespace(&self) -> &BTreeSet<String> {
        &self.namespace
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.namespace.contains(name)
    }

    /// Claim `core`'s name and render its build plan.
    ///
    /// The name stays claimed even if rendering fails afterwards.
    pub fn prepare(&mut self, core: &Core, sim: bool, name_force: bool) -> Result<BuildPlan> {
        let name = core.name();
        if self.namespace.contains(name) {
            if !name_force {
                return Err(BuildError::NameConflict { name: name.to_string() });
            }
            tracing::warn!(
                core = name,
                "reusing core name, previous build products may be overwritten"
            );
        }
        self.namespace.insert(name.to_string());
        tracing::info!(core = name, sim, "preparing build plan");

        let mut ctx = render_context(core, sim);

        let mut commands = Vec::with_capacity(self.command_templates.len());
        for (index, source) in self.command_templates.iter().enumerate() {
            let origin = format!("<command#{}>", index + 1);
            let rendered = Template::compile(source, origin)?.render(&ctx)?;
            commands.push(rendered.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        ctx.insert("commands", commands.join("\n"));

        let mut plan = BuildPlan::new(format!("build_{name}"));
        for (path_source, content_source) in &self.file_templates {
            let path = Template::compile(path_source, path_source.as_str())?.render(&ctx)?;
            let mut content =
                Template::compile(content_source, path_source.as_str())?.render(&ctx)?;
            if !content.ends_with('\n') {
                content.push('\n');
            }
            tracing::debug!(
                core = name,
                file = %path,
                bytes = content.len(),
                "rendered build file"
            );
            plan.add_file(path, content)?;
        }
        Ok(plan)
    }
}

/// Template variables describing `core`.
///
/// Instance values live under `top.` (`top.name`, `top.capacity`), configuration
/// values under `top.config.`. `sim` and `autogenerated` are top-level.
pub fn render_context(core: &Core, sim: bool) -> Context {
    let config = core.config();
    let mut ctx = Context::new();
    ctx.insert("autogenerated", AUTOGENERATED)
        .insert("sim", sim)
        .insert("top.name", core.name())
        .insert("top.capacity", core.capacity())
        .insert("top.user_port.addr_width", core.user_port().addr_width())
        .insert("top.user_port.data_width", core.user_port().data_width())
        .insert("top.config.family", config.family().tag())
        .insert("top.config.phy_name", config.phy_name())
        .insert("top.config.memtype", config.memtype().as_str())
        .insert("top.config.rate", config.rate().as_str())
        .insert("top.config.module_name", config.module_name())
        .insert("top.config.module_bytes", config.module_bytes())
        .insert("top.config.module_ranks", config.module_ranks())
        .insert("top.config.input_clk_freq", config.input_clk_freq())
        .insert("top.config.user_clk_freq", config.user_clk_freq())
        .insert("top.config.input_domain", config.input_domain())
        .insert("top.config.user_domain", config.user_domain())
        .insert("top.config.user_data_width", config.user_data_width())
        .insert("top.config.cmd_buffer_depth", config.cmd_buffer_depth())
        .insert("top.config.csr_data_width", config.csr_data_width());
    match config.family() {
        Family::Ecp5(ecp5) => {
            ctx.insert("top.config.init_clk_freq", ecp5.init_clk_freq);
        }
        Family::Artix7(a7) => {
            ctx.insert("top.config.speedgrade", a7.speedgrade.as_str())
                .insert("top.config.cmd_latency", a7.cmd_latency)
                .insert("top.config.rtt_nom", a7.rtt_nom)
                .insert("top.config.rtt_wr", a7.rtt_wr)
                .insert("top.config.ron", a7.ron)
                .insert("top.config.iodelay_clk_freq", a7.iodelay_clk_freq);
        }
    }
    ctx
}

#[cfg(test)]
mod tests {
    use dramctl_model::{Artix7Params, Config, ConfigParams, ModuleCatalog};

    use super::*;
    use crate::instance::tests::core;

    fn artix7_core(name: &str) -> Core {
        let params = ConfigParams::new("DDR3", "MT41K128M16", 2, 1, 100_000_000, 100_000_000);
        let config = Config::artix7(
            &params,
            Artix7Params {
                speedgrade: "-2L".into(),
                cmd_latency: 1,
                rtt_nom: 60,
                rtt_wr: 60,
                ron: 34,
                iodelay_clk_freq: 200_000_000,
            },
        )
        .unwrap();
        Core::new(config, name, &ModuleCatalog::builtin(), None).unwrap()
    }

    #[test]
    fn default_plan_files() {
        let mut builder = Builder::new();
        let plan = builder.prepare(&core("sdram"), false, false).unwrap();
        assert_eq!(plan.script(), "build_sdram");
        let names: Vec<&str> = plan.files().map(|(p, _)| p).collect();
        assert_eq!(names, ["build_sdram.sh", "sdram_config.yml"]);

        let script = plan.file("build_sdram.sh").unwrap();
        assert_eq!(
            script,
            format!(
                "# {AUTOGENERATED}\nset -e\npython -m litedram.gen --name sdram --output-dir sdram \
                 --gateware-dir sdram --csr-csv sdram_csr.csv sdram_config.yml\n"
            )
        );
    }

    #[test]
    fn sim_flag_reaches_command() {
        let mut builder = Builder::new();
        let plan = builder.prepare(&core("sdram"), true, false).unwrap();
        let script = plan.file("build_sdram.sh").unwrap();
        assert!(script.contains("--csr-csv sdram_csr.csv --sim sdram_config.yml"));
    }

    #[test]
    fn ecp5_config_file() {
        let mut builder = Builder::new();
        let plan = builder.prepare(&core("sdram"), false, false).unwrap();
        let yml = plan.file("sdram_config.yml").unwrap();
        assert!(yml.contains(r#""sdram_phy":        "ECP5DDRPHY","#));
        assert!(yml.contains(r#""init_clk_freq":    25000000,"#));
        assert!(yml.contains(r#""sys_clk_freq":     50000000,"#));
        assert!(!yml.contains("speedgrade"));
        assert!(!yml.contains("iodelay_clk_freq"));
        assert!(!yml.contains("{%"));
        assert!(yml.contains("        \"0\": {"));
    }

    #[test]
    fn artix7_config_file() {
        let mut builder = Builder::new();
        let plan = builder.prepare(&artix7_core("ddr"), false, false).unwrap();
        let yml = plan.file("ddr_config.yml").unwrap();
        assert!(yml.contains(r#""speedgrade":       -2L,"#));
        assert!(yml.contains(r#""cmd_latency":      1,"#));
        assert!(yml.contains(r#""rtt_nom":          "60ohm","#));
        assert!(yml.contains(r#""ron":              "34ohm","#));
        assert!(yml.contains(r#""iodelay_clk_freq": 200000000,"#));
        assert!(!yml.contains("init_clk_freq"));
    }

    #[test]
    fn name_conflicts() {
        let mut builder = Builder::new();
        builder.prepare(&core("sdram"), false, false).unwrap();
        let err = builder.prepare(&core("sdram"), false, false).unwrap_err();
        assert!(matches!(err, BuildError::NameConflict { ref name } if name == "sdram"));

        builder.prepare(&core("sdram"), false, true).unwrap();
        assert!(builder.is_claimed("sdram"));
        assert!(builder.prepare(&core("sdram"), false, false).is_err());

        builder.prepare(&core("other"), false, false).unwrap();
        assert_eq!(builder.namespace().len(), 2);
    }

    #[test]
    fn builders_do_not_share_names() {
        let mut a = Builder::new();
        let mut b = Builder::new();
        a.prepare(&core("sdram"), false, false).unwrap();
        b.prepare(&core("sdram"), false, false).unwrap();
    }

    #[test]
    fn template_errors_carry_origin() {
        let mut builder = Builder::with_templates(
            vec![("ok.txt".into(), "fine".into())],
            vec!["echo one".into(), "echo {{ top.name\n".into()],
        );
        let err = builder.prepare(&core("sdram"), false, false).unwrap_err();
        match err {
            BuildError::TemplateSyntax { origin, line, .. } => {
                assert_eq!(origin, "<command#2>");
                assert_eq!(line, 1);
            }
            other => panic!("expected a template error, got {other:?}"),
        }
        // the name was claimed before rendering
        assert!(builder.is_claimed("sdram"));
    }

    #[test]
    fn commands_are_joined_in_order() {
        let mut builder = Builder::with_templates(
            vec![("run.sh".into(), "{{commands}}".into())],
            vec!["echo   first\n  {{top.name}}".into(), "echo second".into()],
        );
        let plan = builder.prepare(&core("sdram"), false, false).unwrap();
        assert_eq!(plan.file("run.sh"), Some("echo first sdram\necho second\n"));
    }

    #[test]
    fn undefined_variable_in_file_template() {
        let mut builder =
            Builder::with_templates(vec![("{{top.name}}.txt".into(), "{{nope}}".into())], vec![]);
        let err = builder.prepare(&core("sdram"), false, false).unwrap_err();
        assert!(matches!(
            err,
            BuildError::TemplateSyntax { ref origin, .. } if origin == "{{top.name}}.txt"
        ));
    }
}
