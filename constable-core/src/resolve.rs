//! Best-effort resolution of constant declaration values that are
//! expressions rather than plain literals.
//!
//! `const API: &str = PREFIX + "api";` style concatenations and
//! `concat!(PREFIX, "api")` invocations resolve against constants already
//! seen in the same package. Resolution is silent on failure: an expression
//! that cannot be folded simply records nothing.

use syn::punctuated::Punctuated;
use syn::{BinOp, Expr, Lit, Token};

use crate::store::AggregationStore;

/// An external compile-time value oracle.
///
/// When supplied, it is consulted first for every expression; the internal
/// resolver only runs when the oracle returns nothing. This is the hook for
/// callers that can evaluate forms the internal resolver deliberately skips
/// (numeric arithmetic like `(1 << 10) + 0`).
pub trait ConstValueOracle: Send + Sync {
    /// Resolve an expression to its compile-time canonical value, if known.
    fn resolve(&self, expr: &Expr, package: &str) -> Option<String>;
}

/// Resolve a constant's value expression to a canonical string.
///
/// Internal strategy: string `+` concatenation of resolvable sides,
/// identifier lookup by `(name, package)` among already-recorded constants,
/// transparent parentheses, and `concat!` with resolvable arguments.
pub fn resolve_const_expr(
    expr: &Expr,
    package: &str,
    store: &AggregationStore,
    oracle: Option<&dyn ConstValueOracle>,
) -> Option<String> {
    if let Some(oracle) = oracle {
        if let Some(value) = oracle.resolve(expr, package) {
            return Some(value);
        }
    }
    resolve_internal(expr, package, store)
}

fn resolve_internal(expr: &Expr, package: &str, store: &AggregationStore) -> Option<String> {
    match expr {
        Expr::Lit(el) => match &el.lit {
            Lit::Str(s) => {
                let value = s.value();
                (!value.is_empty()).then_some(value)
            }
            _ => None,
        },

        // Reference to a constant seen earlier in the same package.
        Expr::Path(path) => {
            let ident = path.path.get_ident()?;
            store
                .lookup_constant(&ident.to_string(), package)
                .map(|v| v.to_string())
        }

        // String concatenation; both sides must resolve.
        Expr::Binary(bin) => {
            if !matches!(bin.op, BinOp::Add(_)) {
                return None;
            }
            let left = resolve_internal(&bin.left, package, store)?;
            let right = resolve_internal(&bin.right, package, store)?;
            Some(left + &right)
        }

        Expr::Paren(paren) => resolve_internal(&paren.expr, package, store),
        Expr::Group(group) => resolve_internal(&group.expr, package, store),

        // concat!(A, "b") is the idiomatic constant concatenation spelling.
        Expr::Macro(mac_expr) => {
            if !mac_expr.mac.path.is_ident("concat") {
                return None;
            }
            let args = mac_expr
                .mac
                .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
                .ok()?;
            let mut combined = String::new();
            for arg in &args {
                combined.push_str(&resolve_internal(arg, package, store)?);
            }
            (!combined.is_empty()).then_some(combined)
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::SourcePos;
    use crate::store::ConstantDef;
    use std::sync::Arc;

    fn store_with(name: &str, package: &str, value: &str) -> AggregationStore {
        let store = AggregationStore::new();
        store.add_constant(
            Arc::from(value),
            ConstantDef {
                name: Arc::from(name),
                package: Arc::from(package),
                pos: SourcePos {
                    file: "consts.rs".into(),
                    line: 1,
                    column: 1,
                    offset: 0,
                },
            },
        );
        store
    }

    fn expr(code: &str) -> Expr {
        syn::parse_str(code).unwrap()
    }

    #[test]
    fn test_resolve_plain_literal() {
        let store = AggregationStore::new();
        assert_eq!(
            resolve_const_expr(&expr("\"plain\""), "pkg", &store, None),
            Some("plain".to_string())
        );
    }

    #[test]
    fn test_resolve_identifier_in_package() {
        let store = store_with("PREFIX", "urls", "example.com/");
        assert_eq!(
            resolve_const_expr(&expr("PREFIX"), "urls", &store, None),
            Some("example.com/".to_string())
        );
        assert_eq!(resolve_const_expr(&expr("PREFIX"), "other", &store, None), None);
    }

    #[test]
    fn test_resolve_concatenation() {
        let store = store_with("PREFIX", "urls", "example.com/");
        assert_eq!(
            resolve_const_expr(&expr("PREFIX + \"api\""), "urls", &store, None),
            Some("example.com/api".to_string())
        );
    }

    #[test]
    fn test_resolve_parenthesized() {
        let store = store_with("PREFIX", "urls", "example.com/");
        assert_eq!(
            resolve_const_expr(&expr("(PREFIX) + (\"api\")"), "urls", &store, None),
            Some("example.com/api".to_string())
        );
    }

    #[test]
    fn test_resolve_concat_macro() {
        let store = store_with("PREFIX", "urls", "example.com/");
        assert_eq!(
            resolve_const_expr(&expr("concat!(PREFIX, \"api\")"), "urls", &store, None),
            Some("example.com/api".to_string())
        );
    }

    #[test]
    fn test_unresolvable_is_silent() {
        let store = AggregationStore::new();
        assert_eq!(resolve_const_expr(&expr("MISSING + \"x\""), "pkg", &store, None), None);
        assert_eq!(resolve_const_expr(&expr("compute()"), "pkg", &store, None), None);
        assert_eq!(resolve_const_expr(&expr("1 + 2"), "pkg", &store, None), None);
    }

    #[test]
    fn test_oracle_preferred() {
        struct Fixed;
        impl ConstValueOracle for Fixed {
            fn resolve(&self, _expr: &Expr, _package: &str) -> Option<String> {
                Some("1024".to_string())
            }
        }

        let store = AggregationStore::new();
        assert_eq!(
            resolve_const_expr(&expr("(1 << 10) + 0"), "pkg", &store, Some(&Fixed)),
            Some("1024".to_string())
        );
    }

    #[test]
    fn test_oracle_fallback_to_internal() {
        struct Silent;
        impl ConstValueOracle for Silent {
            fn resolve(&self, _expr: &Expr, _package: &str) -> Option<String> {
                None
            }
        }

        let store = store_with("PREFIX", "urls", "example.com/");
        assert_eq!(
            resolve_const_expr(&expr("PREFIX + \"api\""), "urls", &store, Some(&Silent)),
            Some("example.com/api".to_string())
        );
    }
}
