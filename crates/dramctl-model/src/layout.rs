//! Signal layouts of the controller's interfaces.

use std::fmt;

use serde::Serialize;

/// Direction of a signal, from the point of view of user logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Driven by user logic into the controller.
    In,
    /// Driven by the controller towards user logic.
    Out,
}

/// One signal of an interface layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Dotted path of the signal (e.g. `"cmd.addr"`).
    pub path: String,
    /// Width in bits.
    pub width: u32,
    pub direction: Direction,
}

impl Field {
    pub fn new(path: impl Into<String>, width: u32, direction: Direction) -> Self {
        Self {
            path: path.into(),
            width,
            direction,
        }
    }
}

/// An ordered list of signals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a signal by its dotted path.
    pub fn field(&self, path: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Sum of all signal widths.
    pub fn total_width(&self) -> u32 {
        self.fields.iter().map(|f| f.width).sum()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            let dir = match field.direction {
                Direction::In => "in",
                Direction::Out => "out",
            };
            writeln!(f, "  {:<12} {:>4}  {dir}", field.path, field.width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_width() {
        let layout = Layout::new(vec![
            Field::new("valid", 1, Direction::In),
            Field::new("data", 32, Direction::Out),
        ]);
        assert_eq!(layout.field("data").unwrap().width, 32);
        assert!(layout.field("ready").is_none());
        assert_eq!(layout.total_width(), 33);
    }

    #[test]
    fn display_lists_every_field() {
        let layout = Layout::new(vec![Field::new("cmd.addr", 24, Direction::In)]);
        let text = layout.to_string();
        assert!(text.contains("cmd.addr"));
        assert!(text.contains("24"));
        assert!(text.trim_end().ends_with("in"));
    }
}
