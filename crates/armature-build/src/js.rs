//! Typed JavaScript code generation.
//!
//! Generated modules are built as small syntax trees. Every dynamic string
//! is emitted through [`string_literal`], and identifiers are validated on
//! construction, so values can never break out of the position they are
//! placed in.

use std::fmt::Write;

use crate::error::BuildError;

/// Quote `value` as a JavaScript string literal.
///
/// Uses JSON escaping, and additionally escapes `<` (so the literal is safe
/// inside an inline `<script>`) and the U+2028 / U+2029 line separators.
pub fn string_literal(value: &str) -> String {
    let json = serde_json::Value::String(value.to_string()).to_string();
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// A validated JavaScript identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Validate `name` as an identifier (`[A-Za-z_$][A-Za-z0-9_$]*`).
    pub fn new(name: &str) -> Result<Self, BuildError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if valid_start && valid_rest {
            Ok(Self(name.to_string()))
        } else {
            Err(BuildError::InvalidIdent(name.to_string()))
        }
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed identifier known at compile time to be valid.
pub fn ident(name: &'static str) -> Ident {
    debug_assert!(Ident::new(name).is_ok(), "invalid identifier {name}");
    Ident(name.to_string())
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
    /// `===`
    StrictEq,
}

impl BinOp {
    fn as_str(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Nullish => "??",
            Self::StrictEq => "===",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `??=`
    NullishAssign,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal, escaped on emission.
    Str(String),
    /// A variable reference.
    Ident(Ident),
    /// `object.property`
    Member(Box<Expr>, Ident),
    /// `object[key]`
    Index(Box<Expr>, Box<Expr>),
    /// `callee(args...)`
    Call(Box<Expr>, Vec<Expr>),
    /// `{ key: value, ... }`
    Object(Vec<(Ident, Expr)>),
    /// `(params) => { body }`
    Arrow(Vec<Ident>, Vec<Stmt>),
    /// `(left op right)`
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// `!operand`
    Not(Box<Expr>),
    /// `(target op value)`
    Assign(Box<Expr>, AssignOp, Box<Expr>),
}

impl Expr {
    /// String literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// `self.property`
    pub fn member(self, property: Ident) -> Self {
        Self::Member(Box::new(self), property)
    }

    /// `self[key]`
    pub fn index(self, key: Expr) -> Self {
        Self::Index(Box::new(self), Box::new(key))
    }

    /// `self(args...)`
    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call(Box::new(self), args)
    }

    /// `self.method(args...)`
    pub fn method(self, name: Ident, args: Vec<Expr>) -> Self {
        self.member(name).call(args)
    }

    /// `(self op right)`
    pub fn binary(self, op: BinOp, right: Expr) -> Self {
        Self::Binary(Box::new(self), op, Box::new(right))
    }

    /// `!self`
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `(self op value)`
    pub fn assign(self, op: AssignOp, value: Expr) -> Self {
        Self::Assign(Box::new(self), op, Box::new(value))
    }
}

impl From<Ident> for Expr {
    fn from(ident: Ident) -> Self {
        Self::Ident(ident)
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import local from "source";`
    ImportDefault {
        /// Local binding.
        local: Ident,
        /// Module specifier.
        source: String,
    },
    /// `const name = value;`
    Const(Ident, Expr),
    /// `expr;`
    Expr(Expr),
    /// `if (test) { .. } else { .. }`
    If {
        /// Condition.
        test: Expr,
        /// Taken branch.
        then: Vec<Stmt>,
        /// Untaken branch; omitted when empty.
        otherwise: Vec<Stmt>,
    },
    /// `return value;`
    Return(Option<Expr>),
    /// `export default name;`
    ExportDefault(Ident),
}

impl Stmt {
    /// `if (test) { then }`
    pub fn when(test: Expr, then: Vec<Stmt>) -> Self {
        Self::If {
            test,
            then,
            otherwise: Vec::new(),
        }
    }
}

/// A generated module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    body: Vec<Stmt>,
}

impl Module {
    /// Create an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement.
    pub fn push(&mut self, stmt: Stmt) -> &mut Self {
        self.body.push(stmt);
        self
    }

    /// Statements in order.
    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    /// Emit JavaScript source.
    pub fn render(&self) -> String {
        self.render_at(0)
    }

    /// Emit JavaScript source nested `depth` levels deep, for splicing into
    /// a hand-written block.
    pub fn render_at(&self, depth: usize) -> String {
        let mut out = String::new();
        for stmt in &self.body {
            write_stmt(stmt, depth, &mut out);
        }
        out
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_block(body: &[Stmt], depth: usize, out: &mut String) {
    out.push_str("{\n");
    for stmt in body {
        write_stmt(stmt, depth + 1, out);
    }
    indent(depth, out);
    out.push('}');
}

fn write_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(depth, out);
    match stmt {
        Stmt::ImportDefault { local, source } => {
            let _ = write!(out, "import {} from {};", local.as_str(), string_literal(source));
        }
        Stmt::Const(name, value) => {
            let _ = write!(out, "const {} = ", name.as_str());
            write_expr(value, depth, out);
            out.push(';');
        }
        Stmt::Expr(expr) => {
            // A leading `{` would parse as a block.
            if matches!(expr, Expr::Object(_)) {
                out.push('(');
                write_expr(expr, depth, out);
                out.push(')');
            } else {
                write_expr(expr, depth, out);
            }
            out.push(';');
        }
        Stmt::If {
            test,
            then,
            otherwise,
        } => {
            out.push_str("if (");
            write_expr(test, depth, out);
            out.push_str(") ");
            write_block(then, depth, out);
            if !otherwise.is_empty() {
                out.push_str(" else ");
                write_block(otherwise, depth, out);
            }
        }
        Stmt::Return(value) => match value {
            Some(value) => {
                out.push_str("return ");
                write_expr(value, depth, out);
                out.push(';');
            }
            None => out.push_str("return;"),
        },
        Stmt::ExportDefault(name) => {
            let _ = write!(out, "export default {};", name.as_str());
        }
    }
    out.push('\n');
}

fn write_args(args: &[Expr], depth: usize, out: &mut String) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(arg, depth, out);
    }
    out.push(')');
}

fn write_expr(expr: &Expr, depth: usize, out: &mut String) {
    match expr {
        Expr::Null => out.push_str("null"),
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Expr::Str(s) => out.push_str(&string_literal(s)),
        Expr::Ident(ident) => out.push_str(ident.as_str()),
        Expr::Member(object, property) => {
            write_expr(object, depth, out);
            out.push('.');
            out.push_str(property.as_str());
        }
        Expr::Index(object, key) => {
            write_expr(object, depth, out);
            out.push('[');
            write_expr(key, depth, out);
            out.push(']');
        }
        Expr::Call(callee, args) => {
            write_expr(callee, depth, out);
            write_args(args, depth, out);
        }
        Expr::Object(fields) => {
            out.push('{');
            for (i, (key, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key.as_str());
                out.push_str(": ");
                write_expr(value, depth, out);
            }
            out.push('}');
        }
        Expr::Arrow(params, body) => {
            out.push_str("((");
            let names: Vec<&str> = params.iter().map(Ident::as_str).collect();
            out.push_str(&names.join(", "));
            out.push_str(") => ");
            write_block(body, depth, out);
            out.push(')');
        }
        Expr::Binary(left, op, right) => {
            out.push('(');
            write_expr(left, depth, out);
            let _ = write!(out, " {} ", op.as_str());
            write_expr(right, depth, out);
            out.push(')');
        }
        Expr::Not(operand) => {
            out.push('!');
            write_expr(operand, depth, out);
        }
        Expr::Assign(target, op, value) => {
            out.push('(');
            write_expr(target, depth, out);
            out.push_str(match op {
                AssignOp::Assign => " = ",
                AssignOp::NullishAssign => " ??= ",
            });
            write_expr(value, depth, out);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Escaping Tests ===

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("plain"), r#""plain""#);
        assert_eq!(string_literal("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(string_literal("line\nbreak"), r#""line\nbreak""#);
        assert_eq!(
            string_literal("</script><script>alert(1)</script>"),
            r#""\u003c/script>\u003cscript>alert(1)\u003c/script>""#
        );
        assert_eq!(string_literal("a\u{2028}b\u{2029}"), r#""a\u2028b\u2029""#);
    }

    #[test]
    fn test_ident_validation() {
        assert!(Ident::new("__armature_components").is_ok());
        assert!(Ident::new("$el1").is_ok());
        assert!(Ident::new("1st").is_err());
        assert!(Ident::new("a-b").is_err());
        assert!(Ident::new("x\"); alert(1); (\"").is_err());
        assert!(Ident::new("").is_err());
    }

    // === Emission Tests ===

    #[test]
    fn test_expressions() {
        let mut module = Module::new();
        module.push(Stmt::Const(
            ident("registry"),
            Expr::from(ident("globalThis"))
                .member(ident("__armature_components"))
                .assign(AssignOp::NullishAssign, Expr::Object(vec![])),
        ));
        module.push(Stmt::Expr(
            Expr::from(ident("registry"))
                .index(Expr::str("id"))
                .assign(AssignOp::Assign, Expr::Object(vec![(ident("layout"), Expr::Null)])),
        ));

        assert_eq!(
            module.render(),
            "const registry = (globalThis.__armature_components ??= {});\n\
             (registry[\"id\"] = {layout: null});\n"
        );
    }

    #[test]
    fn test_blocks_and_arrows() {
        let mut module = Module::new();
        module.push(Stmt::Expr(
            Expr::Arrow(
                vec![],
                vec![Stmt::If {
                    test: Expr::from(ident("a")).not().binary(BinOp::Or, ident("b").into()),
                    then: vec![Stmt::Return(None)],
                    otherwise: vec![Stmt::Expr(Expr::from(ident("go")).call(vec![Expr::Bool(true)]))],
                }],
            )
            .call(vec![]),
        ));

        assert_eq!(
            module.render(),
            "(() => {\n  if ((!a || b)) {\n    return;\n  } else {\n    go(true);\n  }\n})();\n"
        );
    }

    #[test]
    fn test_render_at_depth() {
        let mut module = Module::new();
        module.push(Stmt::when(
            Expr::from(ident("xs")).index(Expr::Int(-1)).not(),
            vec![Stmt::Return(Some(Expr::Int(0)))],
        ));

        assert_eq!(
            module.render_at(1),
            "  if (!xs[-1]) {\n    return 0;\n  }\n"
        );
    }

    #[test]
    fn test_import_source_is_escaped() {
        let mut module = Module::new();
        module.push(Stmt::ImportDefault {
            local: ident("Component"),
            source: "/app/routes/[id]/\"x\".tsx".to_string(),
        });
        module.push(Stmt::ExportDefault(ident("Component")));

        assert_eq!(
            module.render(),
            "import Component from \"/app/routes/[id]/\\\"x\\\".tsx\";\nexport default Component;\n"
        );
    }
}
