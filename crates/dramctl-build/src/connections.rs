//! Port connections of the generated top-level module.
//!
//! The generator emits a module named after the core. Its ports are prefixed
//! with their direction (`i_`, `o_`, `io_`) and are wired to the clock domains,
//! the control bus, the native data port and, when bound, the DRAM pins.

use std::fmt;

use dramctl_model::Family;
use serde::Serialize;

use crate::error::Result;
use crate::instance::Core;

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    InOut,
}

impl PortDirection {
    pub fn prefix(self) -> &'static str {
        match self {
            PortDirection::Input => "i",
            PortDirection::Output => "o",
            PortDirection::InOut => "io",
        }
    }
}

/// One port of the module instance and what it connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    /// Port name including its direction prefix (e.g. `"i_wb_ctrl_adr"`).
    pub port: String,
    pub direction: PortDirection,
    pub width: u32,
    /// The signal the port is connected to (e.g. `"ctrl_bus.adr"`).
    pub target: String,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<28} {:>4}  <-> {}", self.port, self.width, self.target)
    }
}

/// Collects connections while the port list is assembled.
struct Ports(Vec<Connection>);

impl Ports {
    fn add(&mut self, direction: PortDirection, name: &str, width: u32, target: impl Into<String>) {
        self.0.push(Connection {
            port: format!("{}_{name}", direction.prefix()),
            direction,
            width,
            target: target.into(),
        });
    }
}

/// Native port signals in port order: (layout path, module port suffix).
const USER_PORT_SIGNALS: [(&str, &str); 11] = [
    ("cmd.valid", "cmd_valid"),
    ("cmd.ready", "cmd_ready"),
    ("cmd.we", "cmd_we"),
    ("cmd.addr", "cmd_addr"),
    ("w.valid", "wdata_valid"),
    ("w.ready", "wdata_ready"),
    ("w.we", "wdata_we"),
    ("w.data", "wdata_data"),
    ("r.valid", "rdata_valid"),
    ("r.ready", "rdata_ready"),
    ("r.data", "rdata_data"),
];

/// Pin signals driven by the controller: (pin signal, module port suffix).
const PIN_OUTPUTS: [(&str, &str); 9] = [
    ("a", "a"),
    ("ba", "ba"),
    ("ras", "ras_n"),
    ("cas", "cas_n"),
    ("we", "we_n"),
    ("dm", "dm"),
    ("clk.p", "clk_p"),
    ("clk_en", "cke"),
    ("odt", "odt"),
];

impl Core {
    /// Every port connection of this core's module instance.
    ///
    /// The control bus widths are only known after a build, so this fails with
    /// `NotReady` until the control bus has been populated.
    pub fn connections(&self) -> Result<Vec<Connection>> {
        use PortDirection::{InOut, Input, Output};

        let bus = self.control_bus()?;
        let config = self.config();
        let mut ports = Ports(Vec::new());

        ports.add(Input, "clk", 1, format!("clk@{}", config.input_domain()));
        ports.add(Input, "rst", 1, format!("rst@{}", config.input_domain()));
        ports.add(Output, "user_clk", 1, format!("clk@{}", config.user_domain()));
        ports.add(Output, "user_rst", 1, format!("rst@{}", config.user_domain()));

        for field in bus.layout().fields() {
            let direction = match field.direction {
                dramctl_model::Direction::In => Input,
                dramctl_model::Direction::Out => Output,
            };
            ports.add(
                direction,
                &format!("wb_ctrl_{}", field.path),
                field.width,
                format!("ctrl_bus.{}", field.path),
            );
        }

        let layout = self.user_port().layout();
        for (path, suffix) in USER_PORT_SIGNALS {
            if let Some(field) = layout.field(path) {
                let direction = match field.direction {
                    dramctl_model::Direction::In => Input,
                    dramctl_model::Direction::Out => Output,
                };
                ports.add(
                    direction,
                    &format!("user_port_0_{suffix}"),
                    field.width,
                    format!("user_port.{path}"),
                );
            }
        }

        if let Some(pins) = self.pins() {
            let mut pin = |direction: PortDirection, signal: &str, suffix: &str| {
                if let Some(width) = pins.width(signal) {
                    let port = format!("ddram_{suffix}");
                    ports.add(direction, &port, width, format!("pins.{signal}"));
                }
            };
            for (signal, suffix) in PIN_OUTPUTS {
                pin(Output, signal, suffix);
            }
            pin(Output, "cs", "cs_n");
            pin(Output, "rst", "reset_n");
            match config.family() {
                Family::Ecp5(_) => {
                    pin(Input, "dq", "dq");
                    pin(Input, "dqs.p", "dqs_p");
                }
                Family::Artix7(_) => {
                    pin(InOut, "dq", "dq");
                    pin(InOut, "dqs.p", "dqs_p");
                    pin(InOut, "dqs.n", "dqs_n");
                    pin(Output, "clk.n", "clk_n");
                }
            }
        }

        Ok(ports.0)
    }
}
