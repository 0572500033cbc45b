//! Expression and statement node tree.
//!
//! The tree is built once by [`crate::builder`] and evaluated directly.
//! Nodes that may contain a `yield` or `await` carry a resume slot
//! (`slot`), an index into the per-coroutine state table where the node
//! saves its partial progress when evaluation suspends. Slots are assigned
//! by [`crate::FunctionBuilder::finish`]; nodes that cannot suspend keep
//! `None`.
//!
//! Property access nodes own their inline cache chains.

use std::rc::Rc;

use core_types::{JsString, PropertyKey};

use crate::inline_cache::{GetCache, HasCache, SetCache};

/// Resume slot of a node, `None` when the node cannot suspend.
pub type Slot = Option<u32>;

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer literal that fits in 32 bits
    Int(i32),
    /// Any other number
    Double(f64),
    /// String literal
    String(JsString),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Exp,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `instanceof`
    InstanceOf,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Coalesce,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `~`
    BitNot,
    /// `typeof`
    TypeOf,
    /// `void`
    Void,
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Left-hand side of an assignment.
#[derive(Debug)]
pub enum AssignTarget {
    /// `x = v`
    Identifier(JsString),
    /// `o.p = v`
    Member {
        /// Object expression
        object: Box<Expr>,
        /// Constant key
        key: PropertyKey,
        /// Set cache for this site
        cache: SetCache,
    },
    /// `o[k] = v`
    Element {
        /// Object expression
        object: Box<Expr>,
        /// Key expression
        key: Box<Expr>,
    },
}

/// One entry of an object literal.
#[derive(Debug)]
pub enum ObjectProperty {
    /// `key: value`
    Data(PropertyKey, Expr),
    /// `get key() {}`
    Getter(PropertyKey, Rc<FunctionCode>),
    /// `set key(v) {}`
    Setter(PropertyKey, Rc<FunctionCode>),
}

/// Expressions.
#[derive(Debug)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Identifier read
    Identifier(JsString),
    /// `this`
    This,
    /// `target = value`
    Assign {
        /// Assignment target
        target: AssignTarget,
        /// Right-hand side
        value: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `target op= value`
    CompoundAssign {
        /// Arithmetic operator applied
        op: BinaryOp,
        /// Assignment target
        target: AssignTarget,
        /// Right-hand side
        value: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// Arithmetic, comparison and equality
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `&&`, `||`, `??`
    Logical {
        /// Operator
        op: LogicalOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand, evaluated conditionally
        right: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// Unary operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ... on an identifier
    Update {
        /// Increment or decrement
        op: UpdateOp,
        /// Prefix form returns the new value
        prefix: bool,
        /// Target binding
        name: JsString,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// Condition
        test: Box<Expr>,
        /// Value when truthy
        consequent: Box<Expr>,
        /// Value when falsy
        alternate: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `o.p` with an inline cache
    Member {
        /// Object expression
        object: Box<Expr>,
        /// Constant key
        key: PropertyKey,
        /// Get cache for this site
        cache: GetCache,
    },
    /// `o[k]`
    Element {
        /// Object expression
        object: Box<Expr>,
        /// Key expression
        key: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `k in o`; `cache` is present when the key is a constant
    In {
        /// Key expression
        key: Box<Expr>,
        /// Object expression
        object: Box<Expr>,
        /// Has cache for constant keys
        cache: Option<HasCache>,
        /// Resume slot
        slot: Slot,
    },
    /// `delete o.p` / `delete o[k]`
    Delete {
        /// Object expression
        object: Box<Expr>,
        /// Key expression
        key: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// Function or method call. A `Member`/`Element` callee supplies `this`.
    Call {
        /// Callee expression
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `new C(args)`
    New {
        /// Constructor expression
        callee: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// Object literal
    Object {
        /// Properties in source order
        properties: Vec<ObjectProperty>,
        /// Resume slot
        slot: Slot,
    },
    /// Array literal
    Array {
        /// Elements
        elements: Vec<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// Closure creation (function, arrow, generator, async, async generator)
    Function(Rc<FunctionCode>),
    /// `yield value`
    Yield {
        /// Operand, `undefined` when absent
        operand: Option<Box<Expr>>,
        /// Resume slot
        slot: Slot,
    },
    /// `yield* iterable` (sync generators)
    YieldStar {
        /// Delegate iterable
        operand: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `await value`
    Await {
        /// Awaited operand
        operand: Box<Expr>,
        /// Resume slot
        slot: Slot,
    },
    /// `import(specifier)`
    Import {
        /// Module specifier expression
        specifier: Box<Expr>,
    },
    /// `a, b, c`
    Sequence {
        /// Expressions, the last one gives the value
        exprs: Vec<Expr>,
        /// Resume slot
        slot: Slot,
    },
}

/// `var`, `let` or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// Function-scoped
    Var,
    /// Block-scoped, mutable
    Let,
    /// Block-scoped, immutable
    Const,
}

/// One `name = init` of a declaration.
#[derive(Debug)]
pub struct Declarator {
    /// Bound name
    pub name: JsString,
    /// Initializer
    pub init: Option<Expr>,
}

/// A statement list with an optional scope of its own.
#[derive(Debug)]
pub struct Block {
    /// Statements
    pub body: Vec<Stmt>,
    /// Whether the block gets a new lexical scope
    pub scoped: bool,
    /// `let`/`const` names declared directly in this block
    pub lexicals: Vec<(JsString, DeclKind)>,
    /// Resume slot
    pub slot: Slot,
}

/// `catch (param) { body }`
#[derive(Debug)]
pub struct CatchClause {
    /// Binding for the exception, if any
    pub param: Option<JsString>,
    /// Handler body
    pub body: Block,
}

/// Statements.
#[derive(Debug)]
pub enum Stmt {
    /// Expression statement
    Expression(Expr),
    /// `var`/`let`/`const` declaration
    Declaration {
        /// Declaration kind
        kind: DeclKind,
        /// Declared names
        declarators: Vec<Declarator>,
        /// Resume slot
        slot: Slot,
    },
    /// `function name() {}` (hoisted to the enclosing block)
    FunctionDeclaration {
        /// Binding name
        name: JsString,
        /// Function code
        code: Rc<FunctionCode>,
    },
    /// `{ ... }`
    Block(Block),
    /// `if`
    If {
        /// Condition
        test: Expr,
        /// Branch taken when truthy
        consequent: Box<Stmt>,
        /// Branch taken when falsy
        alternate: Option<Box<Stmt>>,
        /// Resume slot
        slot: Slot,
    },
    /// `while (test) body`
    While {
        /// Condition
        test: Expr,
        /// Body
        body: Box<Stmt>,
        /// Resume slot
        slot: Slot,
    },
    /// `do body while (test)`
    DoWhile {
        /// Body
        body: Box<Stmt>,
        /// Condition
        test: Expr,
        /// Resume slot
        slot: Slot,
    },
    /// `for (init; test; update) body`
    For {
        /// Initializer statement (declaration or expression)
        init: Option<Box<Stmt>>,
        /// Condition
        test: Option<Expr>,
        /// Update expression
        update: Option<Expr>,
        /// Body
        body: Box<Stmt>,
        /// `let`/`const` names declared by `init`
        lexicals: Vec<(JsString, DeclKind)>,
        /// Resume slot
        slot: Slot,
    },
    /// `for (kind name of iterable) body`
    ForOf {
        /// Declaration kind of the loop variable
        kind: DeclKind,
        /// Loop variable
        name: JsString,
        /// Iterated expression
        iterable: Expr,
        /// Body
        body: Box<Stmt>,
        /// Resume slot
        slot: Slot,
    },
    /// `break label?`
    Break(Option<JsString>),
    /// `continue label?`
    Continue(Option<JsString>),
    /// `label: body`
    Labeled {
        /// Label
        label: JsString,
        /// Labeled statement
        body: Box<Stmt>,
    },
    /// `return value?`
    Return {
        /// Returned value
        value: Option<Expr>,
        /// Resume slot (async generators await the operand)
        slot: Slot,
    },
    /// `throw value`
    Throw(Expr),
    /// `try {} catch {} finally {}`
    Try {
        /// Protected block
        block: Block,
        /// Handler
        handler: Option<CatchClause>,
        /// Finalizer
        finalizer: Option<Block>,
        /// Resume slot
        slot: Slot,
    },
    /// `;`
    Empty,
}

/// What calling a function produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Ordinary function or arrow
    Normal,
    /// `function*`
    Generator,
    /// `async function`
    Async,
    /// `async function*`
    AsyncGenerator,
}

impl FunctionKind {
    /// Whether calls run the body on a resumable frame.
    pub fn is_resumable(self) -> bool {
        !matches!(self, FunctionKind::Normal)
    }
}

/// Finished code of one function or script.
#[derive(Debug)]
pub struct FunctionCode {
    /// Function name, empty for anonymous functions
    pub name: JsString,
    /// Call behavior
    pub kind: FunctionKind,
    /// Arrow functions capture `this` lexically and cannot be constructed
    pub is_arrow: bool,
    /// Strict mode code
    pub strict: bool,
    /// Parameter names
    pub params: Vec<JsString>,
    /// Function body; its lexicals live in the function scope
    pub body: Block,
    /// `var` names hoisted to the function scope
    pub var_names: Vec<JsString>,
    /// Number of resume slots used by the body
    pub slot_count: u32,
}
