//! Literal roles, source positions, and literal normalization.
//!
//! A literal's *canonical value* is the post-normalization string the rest of
//! the pipeline keys on: the unquoted, unescaped text for string literals, and
//! the raw source text for numeric literals (`0x10` and `16` stay distinct).

use std::fmt;
use std::str::FromStr;

use proc_macro2::Span;
use serde::{Deserialize, Serialize};
use syn::spanned::Spanned;
use syn::{Expr, Lit, UnOp};

/// The syntactic position a literal occurrence was found in.
///
/// Roles drive both filtering (`exclude_roles`) and reporting (each issue
/// carries the role of its first occurrence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Right-hand side of a `let` binding or assignment: `let x = "foo";`
    Assignment,
    /// Operand of an equality comparison: `x == "foo"`
    Binary,
    /// Literal pattern in a `match` arm: `"foo" => ...`
    Case,
    /// Returned expression: `return "foo";`
    Return,
    /// Argument to a call, method call, or function-like macro: `f("foo")`
    Call,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Assignment,
        Role::Binary,
        Role::Case,
        Role::Return,
        Role::Call,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Assignment => "assignment",
            Role::Binary => "binary",
            Role::Case => "case",
            Role::Return => "return",
            Role::Call => "call",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "assignment" => Ok(Role::Assignment),
            "binary" => Ok(Role::Binary),
            "case" => Ok(Role::Case),
            "return" => Ok(Role::Return),
            "call" => Ok(Role::Call),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A source position: file, 1-based line, 1-based column, byte offset.
///
/// Ordering is lexicographic by (file, line, column), which is the rule used
/// to pick the "first defined" constant among several declarations sharing a
/// value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SourcePos {
    /// Build a position from a span within the named file.
    ///
    /// proc-macro2 columns are 0-based; ours are 1-based like the line.
    pub fn from_span(file: &str, span: Span) -> Self {
        let start = span.start();
        Self {
            file: file.to_string(),
            line: start.line,
            column: start.column + 1,
            offset: span.byte_range().start,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Kind of a supported literal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Str,
    Int,
    Float,
}

/// Normalize a literal token to its canonical value.
///
/// Strings are unquoted with escapes decoded (syn performs both, for regular
/// and raw string forms alike). Integer and float literals keep their source
/// text, suffix included. Returns `None` for empty strings and for token
/// kinds outside string/int/float.
pub fn normalize_literal(lit: &Lit) -> Option<(LiteralKind, String)> {
    match lit {
        Lit::Str(s) => {
            let value = s.value();
            if value.is_empty() {
                None
            } else {
                Some((LiteralKind::Str, value))
            }
        }
        Lit::Int(i) => Some((LiteralKind::Int, i.to_string())),
        Lit::Float(f) => Some((LiteralKind::Float, f.to_string())),
        _ => None,
    }
}

/// Extract a supported literal from an expression, if it is one.
///
/// Handles the bare literal and a literal behind a leading unary minus, whose
/// canonical value keeps the sign (`-5`). Anything else is not a literal
/// occurrence.
pub fn literal_of_expr(expr: &Expr) -> Option<(LiteralKind, String, Span)> {
    match expr {
        Expr::Lit(el) => {
            let (kind, value) = normalize_literal(&el.lit)?;
            Some((kind, value, el.lit.span()))
        }
        Expr::Unary(unary) => {
            if !matches!(unary.op, UnOp::Neg(_)) {
                return None;
            }
            if let Expr::Lit(el) = unary.expr.as_ref() {
                let (kind, value) = normalize_literal(&el.lit)?;
                if matches!(kind, LiteralKind::Int | LiteralKind::Float) {
                    return Some((kind, format!("-{}", value), unary.span()));
                }
            }
            None
        }
        _ => None,
    }
}

/// Parse a canonical value as an integer the way the numeric-range filter
/// understands integers: optional sign, `0x`/`0o`/`0b` base prefixes, `_`
/// digit separators, and an optional Rust integer type suffix.
///
/// Floats and anything else return `None` and are never range-filtered.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (negative, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let rest = strip_int_suffix(rest);
    if rest.is_empty() {
        return None;
    }

    let (radix, digits) = if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8, d)
    } else if let Some(d) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, d)
    } else {
        (10, rest)
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }

    let value = i64::from_str_radix(&cleaned, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Rust integer type suffixes recognized (and removed) before parsing.
const INT_SUFFIXES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

fn strip_int_suffix(text: &str) -> &str {
    for suffix in INT_SUFFIXES {
        if let Some(stripped) = text.strip_suffix(suffix) {
            // A bare suffix with no digits is not a number.
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(code: &str) -> Lit {
        syn::parse_str::<Lit>(code).unwrap()
    }

    #[test]
    fn test_normalize_string_unquotes() {
        let (kind, value) = normalize_literal(&lit("\"hello\"")).unwrap();
        assert_eq!(kind, LiteralKind::Str);
        assert_eq!(value, "hello");
    }

    #[test]
    fn test_normalize_string_decodes_escapes() {
        let (_, value) = normalize_literal(&lit(r#""a\nb\tc""#)).unwrap();
        assert_eq!(value, "a\nb\tc");
    }

    #[test]
    fn test_normalize_raw_string() {
        let (_, value) = normalize_literal(&lit(r##"r#"raw text"#"##)).unwrap();
        assert_eq!(value, "raw text");
    }

    #[test]
    fn test_normalize_escaped_and_raw_spellings_agree() {
        let (_, escaped) = normalize_literal(&lit(r#""a b""#)).unwrap();
        let (_, raw) = normalize_literal(&lit(r#"r"a b""#)).unwrap();
        assert_eq!(escaped, raw);
    }

    #[test]
    fn test_normalize_empty_string_rejected() {
        assert!(normalize_literal(&lit("\"\"")).is_none());
    }

    #[test]
    fn test_normalize_int_keeps_source_text() {
        let (kind, value) = normalize_literal(&lit("0x10")).unwrap();
        assert_eq!(kind, LiteralKind::Int);
        assert_eq!(value, "0x10");

        let (_, decimal) = normalize_literal(&lit("16")).unwrap();
        assert_eq!(decimal, "16");
    }

    #[test]
    fn test_normalize_float() {
        let (kind, value) = normalize_literal(&lit("3.14")).unwrap();
        assert_eq!(kind, LiteralKind::Float);
        assert_eq!(value, "3.14");
    }

    #[test]
    fn test_normalize_unsupported_kinds_rejected() {
        assert!(normalize_literal(&lit("true")).is_none());
        assert!(normalize_literal(&lit("'c'")).is_none());
        assert!(normalize_literal(&lit("b\"bytes\"")).is_none());
    }

    #[test]
    fn test_literal_of_expr_negative() {
        let expr: Expr = syn::parse_str("-5").unwrap();
        let (kind, value, _) = literal_of_expr(&expr).unwrap();
        assert_eq!(kind, LiteralKind::Int);
        assert_eq!(value, "-5");
    }

    #[test]
    fn test_literal_of_expr_not_a_literal() {
        let expr: Expr = syn::parse_str("foo()").unwrap();
        assert!(literal_of_expr(&expr).is_none());
        let negated: Expr = syn::parse_str("!flag").unwrap();
        assert!(literal_of_expr(&negated).is_none());
    }

    #[test]
    fn test_parse_integer_bases() {
        assert_eq!(parse_integer("16"), Some(16));
        assert_eq!(parse_integer("0x10"), Some(16));
        assert_eq!(parse_integer("0o20"), Some(16));
        assert_eq!(parse_integer("0b10000"), Some(16));
        assert_eq!(parse_integer("-42"), Some(-42));
    }

    #[test]
    fn test_parse_integer_separators_and_suffixes() {
        assert_eq!(parse_integer("1_000_000"), Some(1_000_000));
        assert_eq!(parse_integer("10u32"), Some(10));
        assert_eq!(parse_integer("255u8"), Some(255));
        assert_eq!(parse_integer("i32"), None);
    }

    #[test]
    fn test_parse_integer_rejects_non_numbers() {
        assert_eq!(parse_integer("hello"), None);
        assert_eq!(parse_integer("3.14"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("bogus".parse::<Role>().is_err());
    }

    #[test]
    fn test_source_pos_ordering() {
        let a = SourcePos {
            file: "a.rs".into(),
            line: 10,
            column: 1,
            offset: 100,
        };
        let b = SourcePos {
            file: "a.rs".into(),
            line: 2,
            column: 9,
            offset: 20,
        };
        let c = SourcePos {
            file: "b.rs".into(),
            line: 1,
            column: 1,
            offset: 0,
        };
        assert!(b < a);
        assert!(a < c);
        assert_eq!(a.to_string(), "a.rs:10:1");
    }
}
