//! Statement execution.
//!
//! Statements complete with `Ok(())` or an [`Abrupt`]. Loops consume
//! `break`/`continue` aimed at them (unlabeled, or labeled with one of the
//! labels directly enclosing the loop) and poll the cancellation token on
//! every back-edge.

use std::rc::Rc;

use core_types::{JsString, Value};

use crate::error::{Abrupt, Completion, Eval};
use crate::interpreter::Interpreter;
use crate::node::{Block, CatchClause, DeclKind, Declarator, Expr, FunctionKind, Slot, Stmt};
use crate::resumable::{ForPhase, NodeState, TryPhase};
use crate::scope::{Scope, ScopeRef};

/// What a loop does with an abrupt completion of its body.
enum LoopControl {
    Break,
    Continue,
    Exit(Abrupt),
}

fn loop_control(abrupt: Abrupt, labels: &[JsString]) -> LoopControl {
    match abrupt {
        Abrupt::Break(None) => LoopControl::Break,
        Abrupt::Continue(None) => LoopControl::Continue,
        Abrupt::Break(Some(label)) if labels.contains(&label) => LoopControl::Break,
        Abrupt::Continue(Some(label)) if labels.contains(&label) => LoopControl::Continue,
        other => LoopControl::Exit(other),
    }
}

impl Interpreter {
    /// Run a statement list, in a scope of its own when the block has one.
    pub(crate) fn exec_block(&mut self, block: &Block) -> Eval<()> {
        let (start, saved) = match self.take_state(block.slot) {
            Some(NodeState::Sequence { index, scope }) => (index, scope),
            _ => (0, None),
        };
        if !block.scoped {
            return self.exec_statements(block, start, None);
        }
        let outer = Rc::clone(&self.frame.scope);
        let scope = match saved {
            Some(scope) => scope,
            None => {
                let scope = Scope::new(Some(Rc::clone(&outer)), &self.realm.live);
                self.instantiate_block(block, &scope)?;
                scope
            }
        };
        self.frame.scope = Rc::clone(&scope);
        let result = self.exec_statements(block, start, Some(scope));
        self.frame.scope = outer;
        result
    }

    fn exec_statements(&mut self, block: &Block, start: usize, scope: Option<ScopeRef>) -> Eval<()> {
        for (index, stmt) in block.body.iter().enumerate().skip(start) {
            match self.exec_stmt(stmt) {
                Ok(()) => {}
                Err(Abrupt::Suspend) => {
                    return Err(self.suspend_with(block.slot, NodeState::Sequence { index, scope }))
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Run one statement.
    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Eval<()> {
        self.exec_labeled(stmt, &[])
    }

    fn exec_labeled(&mut self, stmt: &Stmt, labels: &[JsString]) -> Eval<()> {
        match stmt {
            Stmt::Expression(expr) => {
                if self.frame.completion.is_some() {
                    let value = self.eval_value(expr)?;
                    self.frame.completion = Some(value);
                    Ok(())
                } else {
                    self.eval_void(expr)
                }
            }
            Stmt::Declaration {
                kind,
                declarators,
                slot,
            } => self.exec_declaration(*kind, declarators, *slot),
            Stmt::FunctionDeclaration { .. } | Stmt::Empty => Ok(()),
            Stmt::Block(block) => self.exec_block(block),
            Stmt::If {
                test,
                consequent,
                alternate,
                slot,
            } => {
                let branch = match self.take_state(*slot) {
                    Some(NodeState::Branch(branch)) => branch,
                    _ => self.eval_boolean(test)?,
                };
                let chosen = if branch {
                    Some(&**consequent)
                } else {
                    alternate.as_deref()
                };
                let Some(chosen) = chosen else {
                    return Ok(());
                };
                match self.exec_stmt(chosen) {
                    Err(Abrupt::Suspend) => Err(self.suspend_with(*slot, NodeState::Branch(branch))),
                    result => result,
                }
            }
            Stmt::While { test, body, slot } => self.exec_while(test, body, *slot, false, labels),
            Stmt::DoWhile { body, test, slot } => self.exec_while(test, body, *slot, true, labels),
            Stmt::For {
                init,
                test,
                update,
                body,
                lexicals,
                slot,
            } => self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body, lexicals, *slot, labels),
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
                slot,
            } => self.exec_for_of(*kind, name, iterable, body, *slot, labels),
            Stmt::Break(label) => Err(Abrupt::Break(label.clone())),
            Stmt::Continue(label) => Err(Abrupt::Continue(label.clone())),
            Stmt::Labeled { label, body } => {
                let mut nested = labels.to_vec();
                nested.push(label.clone());
                match self.exec_labeled(body, &nested) {
                    Err(Abrupt::Break(Some(target))) if target == *label => Ok(()),
                    result => result,
                }
            }
            Stmt::Return { value, slot } => self.exec_return(value.as_ref(), *slot),
            Stmt::Throw(expr) => {
                let value = self.eval_value(expr)?;
                Err(Abrupt::Throw(value))
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
                slot,
            } => self.exec_try(block, handler.as_ref(), finalizer.as_ref(), *slot),
        }
    }

    fn exec_declaration(&mut self, kind: DeclKind, declarators: &[Declarator], slot: Slot) -> Eval<()> {
        let start = match self.take_state(slot) {
            Some(NodeState::Declaration { index }) => index,
            _ => 0,
        };
        for (index, declarator) in declarators.iter().enumerate().skip(start) {
            let value = match &declarator.init {
                Some(init) => match self.eval_value(init) {
                    Err(Abrupt::Suspend) => {
                        return Err(self.suspend_with(slot, NodeState::Declaration { index }))
                    }
                    result => Some(result?),
                },
                None => None,
            };
            match kind {
                DeclKind::Var => {
                    if let Some(value) = value {
                        self.write_binding(&declarator.name, value)?;
                    }
                }
                DeclKind::Let | DeclKind::Const => {
                    self.frame
                        .scope
                        .borrow_mut()
                        .initialize(&declarator.name, kind, value.unwrap_or_default());
                }
            }
        }
        Ok(())
    }

    /// `while` and `do-while`. `body_first` selects the `do` form.
    fn exec_while(
        &mut self,
        test: &Expr,
        body: &Stmt,
        slot: Slot,
        body_first: bool,
        labels: &[JsString],
    ) -> Eval<()> {
        let mut in_body = match self.take_state(slot) {
            Some(NodeState::Loop { in_body }) => in_body,
            _ => body_first,
        };
        loop {
            if !in_body {
                match self.eval_boolean(test) {
                    Ok(true) => {}
                    Ok(false) => return Ok(()),
                    Err(Abrupt::Suspend) => {
                        return Err(self.suspend_with(slot, NodeState::Loop { in_body: false }))
                    }
                    Err(other) => return Err(other),
                }
            }
            match self.exec_stmt(body) {
                Ok(()) => {}
                Err(Abrupt::Suspend) => {
                    return Err(self.suspend_with(slot, NodeState::Loop { in_body: true }))
                }
                Err(abrupt) => match loop_control(abrupt, labels) {
                    LoopControl::Break => return Ok(()),
                    LoopControl::Continue => {}
                    LoopControl::Exit(abrupt) => return Err(abrupt),
                },
            }
            in_body = false;
            self.check_cancelled()?;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        lexicals: &[(JsString, DeclKind)],
        slot: Slot,
        labels: &[JsString],
    ) -> Eval<()> {
        let outer = Rc::clone(&self.frame.scope);
        let (mut phase, mut scope) = match self.take_state(slot) {
            Some(NodeState::ForLoop { phase, scope }) => (phase, scope),
            _ => {
                let scope = (!lexicals.is_empty()).then(|| {
                    let scope = Scope::new(Some(Rc::clone(&outer)), &self.realm.live);
                    for (name, kind) in lexicals {
                        scope.borrow_mut().declare(name, *kind, Value::Undefined);
                    }
                    scope
                });
                (ForPhase::Init, scope)
            }
        };
        let result = self.for_steps(init, test, update, body, labels, &mut phase, &mut scope);
        self.frame.scope = outer;
        match result {
            Err(Abrupt::Suspend) => Err(self.suspend_with(slot, NodeState::ForLoop { phase, scope })),
            result => result,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn for_steps(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        labels: &[JsString],
        phase: &mut ForPhase,
        scope: &mut Option<ScopeRef>,
    ) -> Eval<()> {
        if let Some(scope) = scope {
            self.frame.scope = Rc::clone(scope);
        }
        loop {
            match *phase {
                ForPhase::Init => {
                    if let Some(init) = init {
                        self.exec_stmt(init)?;
                    }
                    self.next_iteration_scope(scope);
                    *phase = ForPhase::Test;
                }
                ForPhase::Test => {
                    if let Some(test) = test {
                        if !self.eval_boolean(test)? {
                            return Ok(());
                        }
                    }
                    *phase = ForPhase::Body;
                }
                ForPhase::Body => {
                    match self.exec_stmt(body) {
                        Ok(()) => {}
                        Err(Abrupt::Suspend) => return Err(Abrupt::Suspend),
                        Err(abrupt) => match loop_control(abrupt, labels) {
                            LoopControl::Break => return Ok(()),
                            LoopControl::Continue => {}
                            LoopControl::Exit(abrupt) => return Err(abrupt),
                        },
                    }
                    self.check_cancelled()?;
                    self.next_iteration_scope(scope);
                    *phase = ForPhase::Update;
                }
                ForPhase::Update => {
                    if let Some(update) = update {
                        self.eval_void(update)?;
                    }
                    *phase = ForPhase::Test;
                }
            }
        }
    }

    /// Fresh copy of the loop scope so closures from one iteration keep
    /// that iteration's bindings.
    fn next_iteration_scope(&mut self, scope: &mut Option<ScopeRef>) {
        if let Some(current) = scope {
            let copy = Scope::copy(current);
            self.frame.scope = Rc::clone(&copy);
            *current = copy;
        }
    }

    fn exec_for_of(
        &mut self,
        kind: DeclKind,
        name: &JsString,
        iterable: &Expr,
        body: &Stmt,
        slot: Slot,
        labels: &[JsString],
    ) -> Eval<()> {
        let outer = Rc::clone(&self.frame.scope);
        let (iterator, next, mut resumed) = match self.take_state(slot) {
            Some(NodeState::ForOf {
                iterator,
                next,
                scope,
            }) => (iterator, next, Some(scope)),
            _ => {
                let iterable = self.eval_value(iterable)?;
                let (iterator, next) = self.get_iterator(&iterable)?;
                (iterator, next, None)
            }
        };
        loop {
            let scope = match resumed.take() {
                Some(scope) => scope,
                None => {
                    self.check_cancelled()?;
                    let result = self.call(&next, iterator.clone(), &[])?;
                    self.require_iter_result(&result)?;
                    let (value, done) = self.iter_result(&result)?;
                    if done {
                        return Ok(());
                    }
                    self.bind_loop_variable(kind, name, value, &outer)?
                }
            };
            self.frame.scope = Rc::clone(&scope);
            let result = self.exec_stmt(body);
            self.frame.scope = Rc::clone(&outer);
            let abrupt = match result {
                Ok(()) => continue,
                Err(Abrupt::Suspend) => {
                    let state = NodeState::ForOf {
                        iterator,
                        next,
                        scope,
                    };
                    return Err(self.suspend_with(slot, state));
                }
                Err(abrupt) => abrupt,
            };
            match loop_control(abrupt, labels) {
                LoopControl::Continue => {}
                LoopControl::Break => return self.iterator_close(&iterator),
                LoopControl::Exit(abrupt) => {
                    if abrupt.runs_finally() {
                        let closed = self.iterator_close(&iterator);
                        if !matches!(abrupt, Abrupt::Throw(_)) {
                            closed?;
                        }
                    }
                    return Err(abrupt);
                }
            }
        }
    }

    /// Scope of one `for-of` iteration with the loop variable bound.
    fn bind_loop_variable(
        &mut self,
        kind: DeclKind,
        name: &JsString,
        value: Value,
        outer: &ScopeRef,
    ) -> Eval<ScopeRef> {
        if kind == DeclKind::Var {
            self.write_binding(name, value)?;
            return Ok(Rc::clone(outer));
        }
        let scope = Scope::new(Some(Rc::clone(outer)), &self.realm.live);
        scope.borrow_mut().initialize(name, kind, value);
        Ok(scope)
    }

    /// `return`. In an async generator the operand is awaited first.
    fn exec_return(&mut self, value: Option<&Expr>, slot: Slot) -> Eval<()> {
        let awaits = value.is_some() && self.resume_kind() == Some(FunctionKind::AsyncGenerator);
        if awaits {
            if let Some(NodeState::Suspended) = self.take_state(slot) {
                return match self.take_input()? {
                    Completion::Normal(value) | Completion::Return(value) => Err(Abrupt::Return(value)),
                    Completion::Throw(error) => Err(Abrupt::Throw(error)),
                };
            }
        }
        let value = match value {
            Some(expr) => self.eval_value(expr)?,
            None => Value::Undefined,
        };
        if awaits {
            self.start_await(value)?;
            return Err(self.suspend_with(slot, NodeState::Suspended));
        }
        Err(Abrupt::Return(value))
    }

    fn exec_try(
        &mut self,
        block: &Block,
        handler: Option<&CatchClause>,
        finalizer: Option<&Block>,
        slot: Slot,
    ) -> Eval<()> {
        let (mut phase, mut pending, mut scope) = match self.take_state(slot) {
            Some(NodeState::Try {
                phase,
                pending,
                scope,
            }) => (phase, pending, scope),
            _ => (TryPhase::Block, None, None),
        };
        loop {
            match phase {
                TryPhase::Block => match (self.exec_block(block), handler) {
                    (Err(Abrupt::Suspend), _) => {
                        return Err(self.suspend_with(slot, NodeState::Try { phase, pending, scope }))
                    }
                    (Err(Abrupt::Throw(error)), Some(handler)) => {
                        scope = handler.param.as_ref().map(|param| {
                            let scope = Scope::new(Some(Rc::clone(&self.frame.scope)), &self.realm.live);
                            scope.borrow_mut().initialize(param, DeclKind::Let, error);
                            scope
                        });
                        phase = TryPhase::Catch;
                    }
                    (Err(abrupt), _) if !abrupt.runs_finally() => return Err(abrupt),
                    (result, _) => {
                        pending = Some(result);
                        phase = TryPhase::Finally;
                    }
                },
                TryPhase::Catch => {
                    let Some(handler) = handler else {
                        return Err(Abrupt::fatal("catch phase without a handler"));
                    };
                    let outer = Rc::clone(&self.frame.scope);
                    if let Some(scope) = &scope {
                        self.frame.scope = Rc::clone(scope);
                    }
                    let result = self.exec_block(&handler.body);
                    self.frame.scope = outer;
                    match result {
                        Err(Abrupt::Suspend) => {
                            return Err(self.suspend_with(slot, NodeState::Try { phase, pending, scope }))
                        }
                        Err(abrupt) if !abrupt.runs_finally() => return Err(abrupt),
                        result => {
                            pending = Some(result);
                            scope = None;
                            phase = TryPhase::Finally;
                        }
                    }
                }
                TryPhase::Finally => {
                    let Some(finalizer) = finalizer else {
                        return pending.unwrap_or(Ok(()));
                    };
                    return match self.exec_block(finalizer) {
                        Ok(()) => pending.unwrap_or(Ok(())),
                        Err(Abrupt::Suspend) => {
                            Err(self.suspend_with(slot, NodeState::Try { phase, pending, scope }))
                        }
                        Err(abrupt) => Err(abrupt),
                    };
                }
            }
        }
    }
}
