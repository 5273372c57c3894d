//! AST walking and literal-context classification.
//!
//! The walker visits every node of a parsed file and labels each literal it
//! cares about with the role its position plays. Exactly five roles produce
//! occurrences:
//!
//! - `Assignment`: `let x = "foo";` / `x = "foo";`
//! - `Binary`: operand of `==` or `!=`
//! - `Case`: literal pattern of a `match` arm
//! - `Return`: `return "foo";`
//! - `Call`: argument of a call, method call, or function-like macro
//!
//! Constant declarations (`const`, `static`, associated consts) feed the
//! constants map instead, and only when constant matching or duplicate
//! finding is enabled. Literals in any other position (struct fields, array
//! elements, index expressions, ...) are deliberately not occurrences; that
//! is the contract, not an oversight.

use std::sync::Arc;

use syn::punctuated::Punctuated;
use syn::visit::{self, Visit};
use syn::{
    Arm, BinOp, Expr, ExprAssign, ExprBinary, ExprCall, ExprMethodCall, ExprReturn, Ident,
    ImplItemConst, ItemConst, ItemStatic, Local, Macro, Pat, Token,
};

use crate::config::AnalyzerConfig;
use crate::filter::LiteralFilter;
use crate::intern::InternPool;
use crate::literal::{literal_of_expr, LiteralKind, Role, SourcePos};
use crate::resolve::{resolve_const_expr, ConstValueOracle};
use crate::store::{AggregationStore, ConstantDef, Occurrence};

/// One file's walk over the shared aggregation state.
pub struct LiteralWalker<'a> {
    file: &'a str,
    package: Arc<str>,
    store: &'a AggregationStore,
    intern: &'a InternPool,
    filter: &'a LiteralFilter,
    parse_numbers: bool,
    track_constants: bool,
    eval_const_expressions: bool,
    oracle: Option<&'a dyn ConstValueOracle>,
}

impl<'a> LiteralWalker<'a> {
    pub fn new(
        file: &'a str,
        package: &str,
        store: &'a AggregationStore,
        intern: &'a InternPool,
        filter: &'a LiteralFilter,
        config: &AnalyzerConfig,
        oracle: Option<&'a dyn ConstValueOracle>,
    ) -> Self {
        Self {
            file,
            package: intern.intern(package),
            store,
            intern,
            filter,
            parse_numbers: config.parse_numbers,
            track_constants: config.tracks_constants(),
            eval_const_expressions: config.eval_const_expressions,
            oracle,
        }
    }

    /// Walk a parsed file.
    pub fn walk(&mut self, ast: &syn::File) {
        self.visit_file(ast);
    }

    fn supported(&self, kind: LiteralKind) -> bool {
        match kind {
            LiteralKind::Str => true,
            LiteralKind::Int | LiteralKind::Float => self.parse_numbers,
        }
    }

    /// Record `expr` as an occurrence if it is a supported literal that
    /// survives the filters.
    fn try_record(&mut self, expr: &Expr, role: Role) {
        let Some((kind, value, span)) = literal_of_expr(expr) else {
            return;
        };
        if !self.supported(kind) {
            return;
        }
        if !self.filter.permits(&value, role) {
            return;
        }

        let value = self.intern.intern(&value);
        let occurrence = Occurrence {
            pos: SourcePos::from_span(self.file, span),
            package: self.package.clone(),
            role,
        };
        self.store.add_occurrence(value, occurrence);
    }

    /// Literal patterns are case labels; `|` alternatives each count.
    fn record_pattern(&mut self, pat: &Pat) {
        match pat {
            Pat::Lit(pl) => {
                self.try_record_lit(&pl.lit);
            }
            Pat::Or(por) => {
                for case in &por.cases {
                    self.record_pattern(case);
                }
            }
            Pat::Paren(pp) => self.record_pattern(&pp.pat),
            _ => {}
        }
    }

    fn try_record_lit(&mut self, lit: &syn::Lit) {
        let Some((kind, value)) = crate::literal::normalize_literal(lit) else {
            return;
        };
        if !self.supported(kind) {
            return;
        }
        if !self.filter.permits(&value, Role::Case) {
            return;
        }

        let value = self.intern.intern(&value);
        let occurrence = Occurrence {
            pos: SourcePos::from_span(self.file, lit.span()),
            package: self.package.clone(),
            role: Role::Case,
        };
        self.store.add_occurrence(value, occurrence);
    }

    /// Record a constant declaration's resolved value.
    fn record_const(&mut self, name: &Ident, expr: &Expr) {
        if !self.track_constants {
            return;
        }

        if let Some((kind, value, _)) = literal_of_expr(expr) {
            if self.supported(kind) {
                self.add_constant(name, value);
            }
            return;
        }

        if self.eval_const_expressions {
            if let Some(value) = resolve_const_expr(expr, &self.package, self.store, self.oracle) {
                self.add_constant(name, value);
            }
        }
    }

    fn add_constant(&mut self, name: &Ident, value: String) {
        if !self.filter.permits_constant(&value) {
            return;
        }

        let def = ConstantDef {
            name: self.intern.intern(&name.to_string()),
            package: self.package.clone(),
            pos: SourcePos::from_span(self.file, name.span()),
        };
        self.store.add_constant(self.intern.intern(&value), def);
    }

    /// A walker sharing this one's state, for subtrees parsed out of macro
    /// bodies (whose lifetimes are local, not `'ast`).
    fn subtree_walker(&self) -> LiteralWalker<'a> {
        LiteralWalker {
            file: self.file,
            package: self.package.clone(),
            store: self.store,
            intern: self.intern,
            filter: self.filter,
            parse_numbers: self.parse_numbers,
            track_constants: self.track_constants,
            eval_const_expressions: self.eval_const_expressions,
            oracle: self.oracle,
        }
    }
}

impl<'a, 'ast> Visit<'ast> for LiteralWalker<'a> {
    // const NAME: T = ...;
    fn visit_item_const(&mut self, node: &'ast ItemConst) {
        self.record_const(&node.ident, &node.expr);
        visit::visit_item_const(self, node);
    }

    // impl T { const NAME: U = ...; }
    fn visit_impl_item_const(&mut self, node: &'ast ImplItemConst) {
        self.record_const(&node.ident, &node.expr);
        visit::visit_impl_item_const(self, node);
    }

    // static NAME: T = ...;
    fn visit_item_static(&mut self, node: &'ast ItemStatic) {
        self.record_const(&node.ident, &node.expr);
        visit::visit_item_static(self, node);
    }

    // let x = "foo";
    fn visit_local(&mut self, node: &'ast Local) {
        if let Some(init) = &node.init {
            self.try_record(&init.expr, Role::Assignment);
        }
        visit::visit_local(self, node);
    }

    // x = "foo";
    fn visit_expr_assign(&mut self, node: &'ast ExprAssign) {
        self.try_record(&node.right, Role::Assignment);
        visit::visit_expr_assign(self, node);
    }

    // if x == "foo" { ... }
    fn visit_expr_binary(&mut self, node: &'ast ExprBinary) {
        if matches!(node.op, BinOp::Eq(_) | BinOp::Ne(_)) {
            self.try_record(&node.left, Role::Binary);
            self.try_record(&node.right, Role::Binary);
        }
        visit::visit_expr_binary(self, node);
    }

    // match x { "foo" => ... }
    fn visit_arm(&mut self, node: &'ast Arm) {
        self.record_pattern(&node.pat);
        visit::visit_arm(self, node);
    }

    // return "foo";
    fn visit_expr_return(&mut self, node: &'ast ExprReturn) {
        if let Some(expr) = &node.expr {
            self.try_record(expr, Role::Return);
        }
        visit::visit_expr_return(self, node);
    }

    // f("foo")
    fn visit_expr_call(&mut self, node: &'ast ExprCall) {
        for arg in &node.args {
            self.try_record(arg, Role::Call);
        }
        visit::visit_expr_call(self, node);
    }

    // x.method("foo")
    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        for arg in &node.args {
            self.try_record(arg, Role::Call);
        }
        visit::visit_expr_method_call(self, node);
    }

    // println!("foo") and friends. Macro token streams are opaque to syn's
    // default traversal, so argument lists that parse as comma-separated
    // expressions are walked through a subtree walker; bodies that do not
    // parse that way (macro_rules! definitions, custom DSLs) are skipped.
    fn visit_macro(&mut self, node: &'ast Macro) {
        if let Ok(args) = node.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            let mut sub = self.subtree_walker();
            for arg in &args {
                sub.try_record(arg, Role::Call);
                sub.visit_expr(arg);
            }
        }
        visit::visit_macro(self, node);
    }
}
