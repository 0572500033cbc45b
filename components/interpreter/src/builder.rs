//! Node tree construction.
//!
//! The free functions build individual nodes; [`FunctionBuilder`] wraps a
//! statement list into finished [`FunctionCode`]. Finishing runs the checks
//! a parser would run (early errors for misplaced `yield`, `await`,
//! `break` and `continue`), hoists declarations, and assigns a resume slot
//! to every node that contains a suspend point.
//!
//! # Examples
//!
//! ```
//! use interpreter::builder::*;
//! use interpreter::FunctionBuilder;
//!
//! // function* g() { let x = yield 1; yield x + 1; }
//! let g = FunctionBuilder::generator("g")
//!     .finish(vec![
//!         let_("x", Some(yield_(Some(int(1))))),
//!         expr_stmt(yield_(Some(add(ident("x"), int(1))))),
//!     ])
//!     .unwrap();
//! assert!(g.slot_count >= 2);
//! ```

use std::rc::Rc;
use std::sync::Arc;

use core_types::{ErrorKind, JsError, JsString, PropertyKey};

use crate::inline_cache::{GetCache, HasCache, SetCache};
use crate::node::{
    AssignTarget, BinaryOp, Block, CatchClause, DeclKind, Declarator, Expr, FunctionCode,
    FunctionKind, Literal, LogicalOp, ObjectProperty, Slot, Stmt, UnaryOp, UpdateOp,
};

fn name(s: &str) -> JsString {
    Arc::from(s)
}

fn boxed(e: Expr) -> Box<Expr> {
    Box::new(e)
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// `undefined`
pub fn undefined() -> Expr {
    Expr::Literal(Literal::Undefined)
}

/// `null`
pub fn null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// `true` / `false`
pub fn boolean(b: bool) -> Expr {
    Expr::Literal(Literal::Boolean(b))
}

/// Integer literal
pub fn int(n: i32) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Number literal; integral values become integer literals.
pub fn number(n: f64) -> Expr {
    if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 && !(n == 0.0 && n.is_sign_negative()) {
        int(n as i32)
    } else {
        Expr::Literal(Literal::Double(n))
    }
}

/// String literal
pub fn string(s: &str) -> Expr {
    Expr::Literal(Literal::String(name(s)))
}

/// Identifier read
pub fn ident(s: &str) -> Expr {
    Expr::Identifier(name(s))
}

/// `this`
pub fn this() -> Expr {
    Expr::This
}

/// `name = value`
pub fn assign(target: &str, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Identifier(name(target)),
        value: boxed(value),
        slot: None,
    }
}

/// `object.key = value`
pub fn assign_member(object: Expr, key: impl Into<PropertyKey>, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Member {
            object: boxed(object),
            key: key.into(),
            cache: SetCache::default(),
        },
        value: boxed(value),
        slot: None,
    }
}

/// `object[key] = value`
pub fn assign_element(object: Expr, key: Expr, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Element {
            object: boxed(object),
            key: boxed(key),
        },
        value: boxed(value),
        slot: None,
    }
}

/// `name op= value`
pub fn compound_assign(op: BinaryOp, target: &str, value: Expr) -> Expr {
    Expr::CompoundAssign {
        op,
        target: AssignTarget::Identifier(name(target)),
        value: boxed(value),
        slot: None,
    }
}

/// `object.key op= value`
pub fn compound_member(op: BinaryOp, object: Expr, key: impl Into<PropertyKey>, value: Expr) -> Expr {
    Expr::CompoundAssign {
        op,
        target: AssignTarget::Member {
            object: boxed(object),
            key: key.into(),
            cache: SetCache::default(),
        },
        value: boxed(value),
        slot: None,
    }
}

/// `object[key] op= value`
pub fn compound_element(op: BinaryOp, object: Expr, key: Expr, value: Expr) -> Expr {
    Expr::CompoundAssign {
        op,
        target: AssignTarget::Element {
            object: boxed(object),
            key: boxed(key),
        },
        value: boxed(value),
        slot: None,
    }
}

/// Binary operation
pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: boxed(left),
        right: boxed(right),
        slot: None,
    }
}

/// `left + right`
pub fn add(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Add, left, right)
}

/// `left - right`
pub fn sub(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Sub, left, right)
}

/// `left < right`
pub fn lt(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Lt, left, right)
}

/// `left === right`
pub fn strict_eq(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::StrictEq, left, right)
}

/// Short-circuit operation
pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: boxed(left),
        right: boxed(right),
        slot: None,
    }
}

/// Unary operation
pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: boxed(operand),
    }
}

/// `!operand`
pub fn not(operand: Expr) -> Expr {
    unary(UnaryOp::Not, operand)
}

/// `typeof operand`
pub fn type_of(operand: Expr) -> Expr {
    unary(UnaryOp::TypeOf, operand)
}

/// `++name`, `name++`, `--name`, `name--`
pub fn update(op: UpdateOp, prefix: bool, target: &str) -> Expr {
    Expr::Update {
        op,
        prefix,
        name: name(target),
    }
}

/// `test ? consequent : alternate`
pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
    Expr::Conditional {
        test: boxed(test),
        consequent: boxed(consequent),
        alternate: boxed(alternate),
        slot: None,
    }
}

/// `object.key`
pub fn member(object: Expr, key: impl Into<PropertyKey>) -> Expr {
    Expr::Member {
        object: boxed(object),
        key: key.into(),
        cache: GetCache::default(),
    }
}

/// `object[key]`
pub fn element(object: Expr, key: Expr) -> Expr {
    Expr::Element {
        object: boxed(object),
        key: boxed(key),
        slot: None,
    }
}

/// `key in object`; cached when `key` is a string or integer literal.
pub fn in_(key: Expr, object: Expr) -> Expr {
    let cache = match &key {
        Expr::Literal(Literal::String(_)) | Expr::Literal(Literal::Int(_)) => {
            Some(HasCache::default())
        }
        _ => None,
    };
    Expr::In {
        key: boxed(key),
        object: boxed(object),
        cache,
        slot: None,
    }
}

/// `delete object.key`
pub fn delete_member(object: Expr, key: &str) -> Expr {
    delete_element(object, string(key))
}

/// `delete object[key]`
pub fn delete_element(object: Expr, key: Expr) -> Expr {
    Expr::Delete {
        object: boxed(object),
        key: boxed(key),
        slot: None,
    }
}

/// `callee(args)`; a member or element callee is a method call.
pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: boxed(callee),
        args,
        slot: None,
    }
}

/// `new callee(args)`
pub fn new_(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::New {
        callee: boxed(callee),
        args,
        slot: None,
    }
}

/// Object literal
pub fn object(properties: Vec<ObjectProperty>) -> Expr {
    Expr::Object {
        properties,
        slot: None,
    }
}

/// `key: value` entry of an object literal
pub fn prop(key: impl Into<PropertyKey>, value: Expr) -> ObjectProperty {
    ObjectProperty::Data(key.into(), value)
}

/// `get key() {}` entry of an object literal
pub fn getter(key: impl Into<PropertyKey>, code: Rc<FunctionCode>) -> ObjectProperty {
    ObjectProperty::Getter(key.into(), code)
}

/// `set key(v) {}` entry of an object literal
pub fn setter(key: impl Into<PropertyKey>, code: Rc<FunctionCode>) -> ObjectProperty {
    ObjectProperty::Setter(key.into(), code)
}

/// Array literal
pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array {
        elements,
        slot: None,
    }
}

/// Closure creation
pub fn function(code: Rc<FunctionCode>) -> Expr {
    Expr::Function(code)
}

/// `yield operand`
pub fn yield_(operand: Option<Expr>) -> Expr {
    Expr::Yield {
        operand: operand.map(boxed),
        slot: None,
    }
}

/// `yield* operand`
pub fn yield_star(operand: Expr) -> Expr {
    Expr::YieldStar {
        operand: boxed(operand),
        slot: None,
    }
}

/// `await operand`
pub fn await_(operand: Expr) -> Expr {
    Expr::Await {
        operand: boxed(operand),
        slot: None,
    }
}

/// `import(specifier)`
pub fn import_(specifier: Expr) -> Expr {
    Expr::Import {
        specifier: boxed(specifier),
    }
}

/// `a, b, ...`
pub fn sequence(exprs: Vec<Expr>) -> Expr {
    Expr::Sequence { exprs, slot: None }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Expression statement
pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expression(expr)
}

/// Declaration with several declarators
pub fn declare(kind: DeclKind, declarators: Vec<(&str, Option<Expr>)>) -> Stmt {
    Stmt::Declaration {
        kind,
        declarators: declarators
            .into_iter()
            .map(|(n, init)| Declarator {
                name: name(n),
                init,
            })
            .collect(),
        slot: None,
    }
}

/// `var name = init`
pub fn var(n: &str, init: Option<Expr>) -> Stmt {
    declare(DeclKind::Var, vec![(n, init)])
}

/// `let name = init`
pub fn let_(n: &str, init: Option<Expr>) -> Stmt {
    declare(DeclKind::Let, vec![(n, init)])
}

/// `const name = init`
pub fn const_(n: &str, init: Expr) -> Stmt {
    declare(DeclKind::Const, vec![(n, Some(init))])
}

/// `function name() {}` declaration, named after the code
pub fn function_decl(code: Rc<FunctionCode>) -> Stmt {
    Stmt::FunctionDeclaration {
        name: Arc::clone(&code.name),
        code,
    }
}

fn new_block(body: Vec<Stmt>) -> Block {
    Block {
        body,
        scoped: true,
        lexicals: Vec::new(),
        slot: None,
    }
}

/// `{ body }`
pub fn block(body: Vec<Stmt>) -> Stmt {
    Stmt::Block(new_block(body))
}

/// `if (test) consequent else alternate`
pub fn if_(test: Expr, consequent: Stmt, alternate: Option<Stmt>) -> Stmt {
    Stmt::If {
        test,
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
        slot: None,
    }
}

/// `while (test) body`
pub fn while_(test: Expr, body: Stmt) -> Stmt {
    Stmt::While {
        test,
        body: Box::new(body),
        slot: None,
    }
}

/// `do body while (test)`
pub fn do_while(body: Stmt, test: Expr) -> Stmt {
    Stmt::DoWhile {
        body: Box::new(body),
        test,
        slot: None,
    }
}

/// `for (init; test; update) body`
pub fn for_(init: Option<Stmt>, test: Option<Expr>, update: Option<Expr>, body: Stmt) -> Stmt {
    Stmt::For {
        init: init.map(Box::new),
        test,
        update,
        body: Box::new(body),
        lexicals: Vec::new(),
        slot: None,
    }
}

/// `for (kind name of iterable) body`
pub fn for_of(kind: DeclKind, n: &str, iterable: Expr, body: Stmt) -> Stmt {
    Stmt::ForOf {
        kind,
        name: name(n),
        iterable,
        body: Box::new(body),
        slot: None,
    }
}

/// `break label?`
pub fn break_(label: Option<&str>) -> Stmt {
    Stmt::Break(label.map(name))
}

/// `continue label?`
pub fn continue_(label: Option<&str>) -> Stmt {
    Stmt::Continue(label.map(name))
}

/// `label: body`
pub fn labeled(label: &str, body: Stmt) -> Stmt {
    Stmt::Labeled {
        label: name(label),
        body: Box::new(body),
    }
}

/// `return value?`
pub fn return_(value: Option<Expr>) -> Stmt {
    Stmt::Return { value, slot: None }
}

/// `throw value`
pub fn throw(value: Expr) -> Stmt {
    Stmt::Throw(value)
}

/// `try { block } catch (param) { handler } finally { finalizer }`
pub fn try_(
    block: Vec<Stmt>,
    handler: Option<(Option<&str>, Vec<Stmt>)>,
    finalizer: Option<Vec<Stmt>>,
) -> Stmt {
    Stmt::Try {
        block: new_block(block),
        handler: handler.map(|(param, body)| CatchClause {
            param: param.map(name),
            body: new_block(body),
        }),
        finalizer: finalizer.map(new_block),
        slot: None,
    }
}

/// `;`
pub fn empty() -> Stmt {
    Stmt::Empty
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Builds [`FunctionCode`] from a statement list.
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    name: JsString,
    kind: FunctionKind,
    is_arrow: bool,
    strict: bool,
    params: Vec<JsString>,
}

impl FunctionBuilder {
    fn with_kind(n: &str, kind: FunctionKind) -> Self {
        Self {
            name: name(n),
            kind,
            is_arrow: false,
            strict: false,
            params: Vec::new(),
        }
    }

    /// Ordinary function
    pub fn new(n: &str) -> Self {
        Self::with_kind(n, FunctionKind::Normal)
    }

    /// Top-level script code
    pub fn script() -> Self {
        Self::with_kind("", FunctionKind::Normal)
    }

    /// `function*`
    pub fn generator(n: &str) -> Self {
        Self::with_kind(n, FunctionKind::Generator)
    }

    /// `async function`
    pub fn async_function(n: &str) -> Self {
        Self::with_kind(n, FunctionKind::Async)
    }

    /// `async function*`
    pub fn async_generator(n: &str) -> Self {
        Self::with_kind(n, FunctionKind::AsyncGenerator)
    }

    /// Arrow function (`async` when `is_async`)
    pub fn arrow(is_async: bool) -> Self {
        let kind = if is_async {
            FunctionKind::Async
        } else {
            FunctionKind::Normal
        };
        Self {
            is_arrow: true,
            ..Self::with_kind("", kind)
        }
    }

    /// Append a parameter.
    pub fn param(mut self, n: &str) -> Self {
        self.params.push(name(n));
        self
    }

    /// Mark the code strict (`"use strict"`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validate the body, hoist declarations and assign resume slots.
    pub fn finish(self, body: Vec<Stmt>) -> Result<Rc<FunctionCode>, JsError> {
        let mut body = Block {
            body,
            scoped: false,
            lexicals: Vec::new(),
            slot: None,
        };
        let mut analysis = Analysis {
            kind: self.kind,
            next_slot: 0,
            var_names: Vec::new(),
            labels: Vec::new(),
            loop_depth: 0,
            breakable_depth: 0,
        };
        analysis.block(&mut body)?;
        let slot_count = analysis.next_slot;
        tracing::trace!(
            function = %self.name,
            kind = ?self.kind,
            slots = slot_count,
            "function code finished"
        );
        Ok(Rc::new(FunctionCode {
            name: self.name,
            kind: self.kind,
            is_arrow: self.is_arrow,
            strict: self.strict,
            params: self.params,
            body,
            var_names: analysis.var_names,
            slot_count,
        }))
    }
}

fn syntax_error(message: impl Into<String>) -> JsError {
    JsError::new(ErrorKind::SyntaxError, message)
}

/// One pass over a function body: early errors, hoisting, slot assignment.
///
/// Every visit returns whether the visited node contains a suspend point.
struct Analysis {
    kind: FunctionKind,
    next_slot: u32,
    var_names: Vec<JsString>,
    labels: Vec<(JsString, bool)>,
    loop_depth: usize,
    breakable_depth: usize,
}

impl Analysis {
    fn assign(&mut self, slot: &mut Slot, suspends: bool) -> bool {
        if suspends {
            *slot = Some(self.next_slot);
            self.next_slot += 1;
        }
        suspends
    }

    fn add_var(&mut self, n: &JsString) {
        if !self.var_names.contains(n) {
            self.var_names.push(Arc::clone(n));
        }
    }

    fn exprs<'a>(&mut self, exprs: impl Iterator<Item = &'a mut Expr>) -> Result<bool, JsError> {
        let mut suspends = false;
        for e in exprs {
            suspends |= self.expr(e)?;
        }
        Ok(suspends)
    }

    fn target(&mut self, target: &mut AssignTarget) -> Result<bool, JsError> {
        match target {
            AssignTarget::Identifier(_) => Ok(false),
            AssignTarget::Member { object, .. } => self.expr(object),
            AssignTarget::Element { object, key } => Ok(self.expr(object)? | self.expr(key)?),
        }
    }

    fn expr(&mut self, expr: &mut Expr) -> Result<bool, JsError> {
        match expr {
            Expr::Literal(_)
            | Expr::Identifier(_)
            | Expr::This
            | Expr::Update { .. }
            | Expr::Function(_) => Ok(false),
            Expr::Assign {
                target,
                value,
                slot,
            }
            | Expr::CompoundAssign {
                target,
                value,
                slot,
                ..
            } => {
                let suspends = self.target(target)? | self.expr(value)?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Binary {
                left, right, slot, ..
            }
            | Expr::Logical {
                left, right, slot, ..
            } => {
                let suspends = self.expr(left)? | self.expr(right)?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Import { specifier } => self.expr(specifier),
            Expr::Conditional {
                test,
                consequent,
                alternate,
                slot,
            } => {
                let suspends =
                    self.expr(test)? | self.expr(consequent)? | self.expr(alternate)?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Member { object, .. } => self.expr(object),
            Expr::Element { object, key, slot }
            | Expr::Delete { object, key, slot } => {
                let suspends = self.expr(object)? | self.expr(key)?;
                Ok(self.assign(slot, suspends))
            }
            Expr::In {
                key, object, slot, ..
            } => {
                let suspends = self.expr(key)? | self.expr(object)?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Call { callee, args, slot } | Expr::New { callee, args, slot } => {
                let suspends = self.expr(callee)? | self.exprs(args.iter_mut())?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Object { properties, slot } => {
                let suspends = self.exprs(properties.iter_mut().filter_map(|p| match p {
                    ObjectProperty::Data(_, value) => Some(value),
                    _ => None,
                }))?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Array { elements, slot } => {
                let suspends = self.exprs(elements.iter_mut())?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Sequence { exprs, slot } => {
                let suspends = self.exprs(exprs.iter_mut())?;
                Ok(self.assign(slot, suspends))
            }
            Expr::Yield { operand, slot } => {
                if !matches!(self.kind, FunctionKind::Generator | FunctionKind::AsyncGenerator) {
                    return Err(syntax_error("yield is only valid in generator functions"));
                }
                if let Some(operand) = operand {
                    self.expr(operand)?;
                }
                Ok(self.assign(slot, true))
            }
            Expr::YieldStar { operand, slot } => {
                if self.kind != FunctionKind::Generator {
                    return Err(syntax_error(
                        "yield* is only supported in synchronous generator functions",
                    ));
                }
                self.expr(operand)?;
                Ok(self.assign(slot, true))
            }
            Expr::Await { operand, slot } => {
                if !matches!(self.kind, FunctionKind::Async | FunctionKind::AsyncGenerator) {
                    return Err(syntax_error(
                        "await is only valid in async functions and the top level bodies of modules",
                    ));
                }
                self.expr(operand)?;
                Ok(self.assign(slot, true))
            }
        }
    }

    fn block(&mut self, block: &mut Block) -> Result<bool, JsError> {
        let mut suspends = false;
        for stmt in &mut block.body {
            if let Stmt::Declaration {
                kind: kind @ (DeclKind::Let | DeclKind::Const),
                declarators,
                ..
            } = stmt
            {
                for d in declarators.iter() {
                    if block.lexicals.iter().any(|(n, _)| n == &d.name) {
                        return Err(syntax_error(format!(
                            "Identifier '{}' has already been declared",
                            d.name
                        )));
                    }
                    block.lexicals.push((Arc::clone(&d.name), *kind));
                }
            }
            suspends |= self.stmt(stmt)?;
        }
        Ok(self.assign(&mut block.slot, suspends))
    }

    fn loop_body(&mut self, body: &mut Stmt) -> Result<bool, JsError> {
        self.loop_depth += 1;
        self.breakable_depth += 1;
        let result = self.stmt(body);
        self.loop_depth -= 1;
        self.breakable_depth -= 1;
        result
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> Result<bool, JsError> {
        match stmt {
            Stmt::Expression(e) | Stmt::Throw(e) => self.expr(e),
            Stmt::Declaration {
                kind,
                declarators,
                slot,
            } => {
                let mut suspends = false;
                for d in declarators.iter_mut() {
                    if *kind == DeclKind::Var {
                        self.add_var(&d.name);
                    }
                    if let Some(init) = &mut d.init {
                        suspends |= self.expr(init)?;
                    }
                }
                Ok(self.assign(slot, suspends))
            }
            Stmt::FunctionDeclaration { .. } | Stmt::Empty => Ok(false),
            Stmt::Block(block) => self.block(block),
            Stmt::If {
                test,
                consequent,
                alternate,
                slot,
            } => {
                let mut suspends = self.expr(test)? | self.stmt(consequent)?;
                if let Some(alternate) = alternate {
                    suspends |= self.stmt(alternate)?;
                }
                Ok(self.assign(slot, suspends))
            }
            Stmt::While { test, body, slot } | Stmt::DoWhile { body, test, slot } => {
                let suspends = self.expr(test)? | self.loop_body(body)?;
                Ok(self.assign(slot, suspends))
            }
            Stmt::For {
                init,
                test,
                update,
                body,
                lexicals,
                slot,
            } => {
                let mut suspends = false;
                if let Some(init) = init {
                    if let Stmt::Declaration {
                        kind: kind @ (DeclKind::Let | DeclKind::Const),
                        declarators,
                        ..
                    } = init.as_ref()
                    {
                        lexicals.extend(declarators.iter().map(|d| (Arc::clone(&d.name), *kind)));
                    }
                    suspends |= self.stmt(init)?;
                }
                if let Some(test) = test {
                    suspends |= self.expr(test)?;
                }
                if let Some(update) = update {
                    suspends |= self.expr(update)?;
                }
                suspends |= self.loop_body(body)?;
                Ok(self.assign(slot, suspends))
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
                slot,
            } => {
                if *kind == DeclKind::Var {
                    self.add_var(name);
                }
                let suspends = self.expr(iterable)? | self.loop_body(body)?;
                Ok(self.assign(slot, suspends))
            }
            Stmt::Break(label) => {
                match label {
                    Some(label) if !self.labels.iter().any(|(l, _)| l == label) => {
                        return Err(syntax_error(format!("Undefined label '{}'", label)));
                    }
                    None if self.breakable_depth == 0 => {
                        return Err(syntax_error("Illegal break statement"));
                    }
                    _ => {}
                }
                Ok(false)
            }
            Stmt::Continue(label) => {
                match label {
                    Some(label) if !self.labels.iter().any(|(l, is_loop)| l == label && *is_loop) => {
                        return Err(syntax_error(format!("Undefined label '{}'", label)));
                    }
                    _ if self.loop_depth == 0 => {
                        return Err(syntax_error(
                            "Illegal continue statement: no surrounding iteration statement",
                        ));
                    }
                    _ => {}
                }
                Ok(false)
            }
            Stmt::Labeled { label, body } => {
                let is_loop = matches!(
                    body.as_ref(),
                    Stmt::While { .. } | Stmt::DoWhile { .. } | Stmt::For { .. } | Stmt::ForOf { .. }
                );
                self.labels.push((Arc::clone(label), is_loop));
                let result = self.stmt(body);
                self.labels.pop();
                result
            }
            Stmt::Return { value, slot } => {
                let suspends = match value {
                    Some(value) => self.expr(value)?,
                    None => false,
                };
                // async generators await the returned value
                let awaits = self.kind == FunctionKind::AsyncGenerator && value.is_some();
                Ok(self.assign(slot, suspends || awaits))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
                slot,
            } => {
                let mut suspends = self.block(block)?;
                if let Some(handler) = handler {
                    suspends |= self.block(&mut handler.body)?;
                }
                if let Some(finalizer) = finalizer {
                    suspends |= self.block(finalizer)?;
                }
                Ok(self.assign(slot, suspends))
            }
        }
    }
}
