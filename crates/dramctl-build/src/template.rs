//! A small line-oriented template language for build artifacts.
//!
//! Templates are dedented and stripped before compilation. Two constructs exist:
//!
//! - `{{ name }}` substitutes a variable from the [`Context`]. Names may contain
//!   dots (`config.memtype`); a dot is part of the name, not an attribute access.
//! - `{% if cond %}`, `{% elif cond %}`, `{% else %}` and `{% endif %}` select
//!   lines. Each block tag must sit alone on its line, and that line is removed
//!   from the output.
//!
//! A condition is `name`, `not name`, `name == literal` or `name != literal`, where
//! a literal is a quoted string, an integer, `true` or `false`.
//!
//! Compilation and rendering failures are reported as
//! [`BuildError::TemplateSyntax`] with the template's origin and line number.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{BuildError, Result};

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(u64),
    Bool(bool),
}

impl Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(u64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Variables available to a template.
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Truthy(String),
    Not(String),
    Eq(String, Value),
    Ne(String, Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Line {
        line: usize,
        segments: Vec<Segment>,
    },
    If {
        branches: Vec<(usize, Condition, Vec<Node>)>,
        otherwise: Option<Vec<Node>>,
    },
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    origin: String,
    nodes: Vec<Node>,
}

/// Remove the longest common prefix of spaces and tabs from every non-blank line.
pub fn dedent(source: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in source.lines().filter(|l| !l.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        margin = Some(match margin {
            None => indent,
            Some(m) => {
                let common = m.bytes().zip(indent.bytes()).take_while(|(a, b)| a == b).count();
                &m[..common]
            }
        });
    }
    let indent = margin.map_or(0, str::len);
    source
        .lines()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Open `if` block under construction.
struct Frame {
    branches: Vec<(usize, Condition, Vec<Node>)>,
    otherwise: Option<Vec<Node>>,
    opened_at: usize,
}

impl Frame {
    fn body(&mut self) -> &mut Vec<Node> {
        match self.otherwise {
            Some(ref mut nodes) => nodes,
            None => match self.branches.last_mut() {
                Some((_, _, nodes)) => nodes,
                None => unreachable!("a frame always opens with one branch"),
            },
        }
    }
}

impl Template {
    /// Compile `source`. `origin` identifies the template in error messages.
    pub fn compile(source: &str, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let source = dedent(source);
        let source = source.trim();

        let syntax = |line: usize, message: String| BuildError::TemplateSyntax {
            origin: origin.clone(),
            line,
            message,
        };

        let mut top: Vec<Node> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut last_line = 1;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            last_line = line;
            let trimmed = raw.trim();

            if trimmed.starts_with("{%") {
                let inner = trimmed
                    .strip_suffix("%}")
                    .ok_or_else(|| {
                        syntax(line, "block tag must end with '%}' on the same line".into())
                    })?
                    .trim_start_matches("{%")
                    .trim();
                let (keyword, rest) = match inner.split_once(char::is_whitespace) {
                    Some((k, r)) => (k, r.trim()),
                    None => (inner, ""),
                };
                match keyword {
                    "if" => {
                        let cond = parse_condition(rest).map_err(|m| syntax(line, m))?;
                        stack.push(Frame {
                            branches: vec![(line, cond, Vec::new())],
                            otherwise: None,
                            opened_at: line,
                        });
                    }
                    "elif" => {
                        let frame = stack.last_mut().ok_or_else(|| {
                            syntax(line, "encountered 'elif' outside of an 'if' block".into())
                        })?;
                        if frame.otherwise.is_some() {
                            return Err(syntax(line, "encountered 'elif' after 'else'".into()));
                        }
                        let cond = parse_condition(rest).map_err(|m| syntax(line, m))?;
                        frame.branches.push((line, cond, Vec::new()));
                    }
                    "else" => {
                        let frame = stack.last_mut().ok_or_else(|| {
                            syntax(line, "encountered 'else' outside of an 'if' block".into())
                        })?;
                        if frame.otherwise.is_some() || !rest.is_empty() {
                            return Err(syntax(line, "unexpected 'else'".into()));
                        }
                        frame.otherwise = Some(Vec::new());
                    }
                    "endif" => {
                        let frame = stack.pop().ok_or_else(|| {
                            syntax(line, "encountered 'endif' without a matching 'if'".into())
                        })?;
                        if !rest.is_empty() {
                            return Err(syntax(line, "unexpected tokens after 'endif'".into()));
                        }
                        let node = Node::If {
                            branches: frame.branches,
                            otherwise: frame.otherwise,
                        };
                        match stack.last_mut() {
                            Some(parent) => parent.body().push(node),
                            None => top.push(node),
                        }
                    }
                    other => return Err(syntax(line, format!("encountered unknown tag '{other}'"))),
                }
                continue;
            }

            let segments = parse_line(raw).map_err(|m| syntax(line, m))?;
            let node = Node::Line { line, segments };
            match stack.last_mut() {
                Some(frame) => frame.body().push(node),
                None => top.push(node),
            }
        }

        if let Some(frame) = stack.last() {
            return Err(syntax(
                last_line,
                format!(
                    "unexpected end of template, expected 'endif' to close 'if' opened at line {}",
                    frame.opened_at
                ),
            ));
        }

        Ok(Self { origin, nodes: top })
    }

    /// Render with `ctx`. Fails if a substituted or tested variable is undefined.
    pub fn render(&self, ctx: &Context) -> Result<String> {
        let mut out = Vec::new();
        self.render_nodes(&self.nodes, ctx, &mut out)?;
        Ok(out.join("\n"))
    }

    fn render_nodes(&self, nodes: &[Node], ctx: &Context, out: &mut Vec<String>) -> Result<()> {
        for node in nodes {
            match node {
                Node::Line { line, segments } => {
                    let mut text = String::new();
                    for segment in segments {
                        match segment {
                            Segment::Literal(s) => text.push_str(s),
                            Segment::Var(name) => {
                                let value = self.lookup(ctx, name, *line)?;
                                text.push_str(&value.to_string());
                            }
                        }
                    }
                    out.push(text);
                }
                Node::If { branches, otherwise } => {
                    let mut taken = None;
                    for (line, cond, body) in branches {
                        if self.evaluate(cond, ctx, *line)? {
                            taken = Some(body);
                            break;
                        }
                    }
                    if let Some(body) = taken.or(otherwise.as_ref()) {
                        self.render_nodes(body, ctx, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup<'c>(&self, ctx: &'c Context, name: &str, line: usize) -> Result<&'c Value> {
        ctx.get(name).ok_or_else(|| BuildError::TemplateSyntax {
            origin: self.origin.clone(),
            line,
            message: format!("'{name}' is undefined"),
        })
    }

    fn evaluate(&self, cond: &Condition, ctx: &Context, line: usize) -> Result<bool> {
        Ok(match cond {
            Condition::Truthy(name) => self.lookup(ctx, name, line)?.is_truthy(),
            Condition::Not(name) => !self.lookup(ctx, name, line)?.is_truthy(),
            Condition::Eq(name, lit) => self.lookup(ctx, name, line)? == lit,
            Condition::Ne(name, lit) => self.lookup(ctx, name, line)? != lit,
        })
    }
}

fn parse_line(raw: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find("{{") {
        if rest[..open].contains("{%") {
            return Err("block tags must be on their own line".into());
        }
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| "unexpected end of line, expected '}}'".to_string())?;
        let expr = after[..close].trim();
        if !is_identifier(expr) {
            return Err(format!("invalid expression '{expr}'"));
        }
        segments.push(Segment::Var(expr.to_string()));
        rest = &after[close + 2..];
    }
    if rest.contains("{%") {
        return Err("block tags must be on their own line".into());
    }
    if !rest.is_empty() || segments.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

fn parse_literal(s: &str) -> std::result::Result<Value, String> {
    let quoted = |q: char| s.len() >= 2 && s.starts_with(q) && s.ends_with(q);
    if quoted('"') || quoted('\'') {
        return Ok(Value::Str(s[1..s.len() - 1].to_string()));
    }
    match s {
        "true" | "True" => return Ok(Value::Bool(true)),
        "false" | "False" => return Ok(Value::Bool(false)),
        _ => {}
    }
    s.parse::<u64>()
        .map(Value::Int)
        .map_err(|_| format!("invalid literal '{s}'"))
}

/// Position and kind of the first `==` or `!=` outside a quoted literal.
fn find_comparison(text: &str) -> Option<(usize, bool)> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if text[i..].starts_with("==") => return Some((i, true)),
            None if text[i..].starts_with("!=") => return Some((i, false)),
            None => {}
        }
    }
    None
}

fn parse_condition(text: &str) -> std::result::Result<Condition, String> {
    if text.is_empty() {
        return Err("expected a condition".into());
    }
    if let Some((at, is_eq)) = find_comparison(text) {
        let name = text[..at].trim();
        if !is_identifier(name) {
            return Err(format!("invalid expression '{name}'"));
        }
        let lit = parse_literal(text[at + 2..].trim())?;
        return Ok(if is_eq {
            Condition::Eq(name.to_string(), lit)
        } else {
            Condition::Ne(name.to_string(), lit)
        });
    }
    if let Some(name) = text.strip_prefix("not ") {
        let name = name.trim();
        if is_identifier(name) {
            return Ok(Condition::Not(name.to_string()));
        }
        return Err(format!("invalid expression '{name}'"));
    }
    if is_identifier(text) {
        Ok(Condition::Truthy(text.to_string()))
    } else {
        Err(format!("invalid condition '{text}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        let mut ctx = Context::new();
        ctx.insert("name", "sdram")
            .insert("freq", 100_000_000u64)
            .insert("sim", false)
            .insert("phy", "A7DDRPHY");
        ctx
    }

    fn syntax_line(err: BuildError) -> (String, usize) {
        match err {
            BuildError::TemplateSyntax { origin, line, .. } => (origin, line),
            other => panic!("expected a template syntax error, got {other:?}"),
        }
    }

    #[test]
    fn dedent_removes_common_indent() {
        assert_eq!(dedent("    a\n      b\n\n    c"), "a\n  b\n\nc");
    }

    #[test]
    fn dedent_only_strips_spaces_and_tabs() {
        assert_eq!(dedent("\u{3000}a\n b"), "\u{3000}a\n b");
        assert_eq!(dedent("\t  x\n\t y"), " x\ny");
        let t = Template::compile("\u{3000}a\n b", "t").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "a\n b");
    }

    #[test]
    fn substitutes_variables() {
        let t = Template::compile("build_{{name}}.sh", "<file>").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "build_sdram.sh");
        let t = Template::compile("\"f\": {{ freq }},", "<file>").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "\"f\": 100000000,");
    }

    #[test]
    fn block_lines_are_removed() {
        let src = r#"
            a
            {% if phy == "A7DDRPHY" %}
            b {{name}}
            {% elif phy == "ECP5DDRPHY" %}
            c
            {% else %}
            d
            {% endif %}
            e
        "#;
        let t = Template::compile(src, "<file>").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "a\nb sdram\ne");

        let mut other = ctx();
        other.insert("phy", "ECP5DDRPHY");
        assert_eq!(t.render(&other).unwrap(), "a\nc\ne");
        other.insert("phy", "none");
        assert_eq!(t.render(&other).unwrap(), "a\nd\ne");
    }

    #[test]
    fn nested_and_negated_conditions() {
        let src = "{% if not sim %}\n{% if freq != 0 %}\nhw\n{% endif %}\n{% endif %}";
        let t = Template::compile(src, "<file>").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "hw");
    }

    #[test]
    fn untaken_branches_may_reference_missing_variables() {
        let src = "{% if sim %}\n{{ missing }}\n{% endif %}\nok";
        let t = Template::compile(src, "<file>").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "ok");
    }

    #[test]
    fn undefined_variable_reports_line() {
        let t = Template::compile("a\nb {{ missing }}", "cfg.yml").unwrap();
        let (origin, line) = syntax_line(t.render(&ctx()).unwrap_err());
        assert_eq!(origin, "cfg.yml");
        assert_eq!(line, 2);
    }

    #[test]
    fn unterminated_substitution() {
        let err = Template::compile("x\ny {{ name", "<command#1>").unwrap_err();
        assert_eq!(syntax_line(err), ("<command#1>".to_string(), 2));
    }

    #[test]
    fn unclosed_if() {
        let err = Template::compile("{% if sim %}\nx", "t").unwrap_err();
        assert_eq!(syntax_line(err).1, 2);
        assert!(Template::compile("{% endif %}", "t").is_err());
        assert!(Template::compile("{% else %}", "t").is_err());
    }

    #[test]
    fn rejects_unknown_tags_and_bad_conditions() {
        let err = Template::compile("a\n{% for x in y %}\n{% endfor %}", "t").unwrap_err();
        assert_eq!(syntax_line(err).1, 2);
        assert!(Template::compile("{% if %}\n{% endif %}", "t").is_err());
        assert!(Template::compile("{% if a == b %}\n{% endif %}", "t").is_err());
        assert!(Template::compile("{% if 1x %}\n{% endif %}", "t").is_err());
    }

    #[test]
    fn rejects_inline_block_tags() {
        assert!(Template::compile("a {% if sim %} b {% endif %}", "t").is_err());
    }

    #[test]
    fn rejects_else_after_else_and_elif_after_else() {
        let twice = "{% if sim %}\n{% else %}\n{% else %}\n{% endif %}";
        assert!(Template::compile(twice, "t").is_err());
        let late_elif = "{% if sim %}\n{% else %}\n{% elif sim %}\n{% endif %}";
        assert!(Template::compile(late_elif, "t").is_err());
    }

    #[test]
    fn empty_lines_survive() {
        let t = Template::compile("a\n\nb", "t").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "a\n\nb");
    }

    #[test]
    fn operators_inside_quoted_literals() {
        let t = Template::compile("{% if phy != \"a==b\" %}\nyes\n{% endif %}", "t").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "yes");
        let src = "{% if phy == 'x!=y' %}\nno\n{% else %}\nyes\n{% endif %}";
        let t = Template::compile(src, "t").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "yes");
    }

    #[test]
    fn bool_literals_compare() {
        let t = Template::compile("{% if sim == false %}\nreal\n{% endif %}", "t").unwrap();
        assert_eq!(t.render(&ctx()).unwrap(), "real");
    }
}
