//! The evaluability checker.
//!
//! One verdict rule per IR node kind, composed with short-circuiting: a
//! compound node is evaluable only if the policy admits it, every
//! evaluability-relevant child is evaluable, and any referenced enclosing
//! scope is on the current chain. Node kinds without an explicit rule are
//! not evaluable -- the checker fails closed and never errors.

use lark_ir::builtins;
use lark_ir::decl::{
    ClassId, ClassKind, DeclOrigin, DeclRef, EnumEntryId, FieldId, FunctionId, FunctionKind,
    MemberDecl, Module, PropertyId,
};
use lark_ir::expr::{
    Body, Branch, Call, Catch, Expr, FunctionAccess, Loop, Statement, SyntheticBodyKind,
    TypeOperator, ValueOrigin, VarargElement,
};
use lark_ir::types::{ClassifierRef, IrType};

use crate::mode::{CheckerConfig, EvaluationMode};
use crate::scope::{ScopeChain, ScopeItem};

/// Whether an expression reads a singleton object of non-nullable type.
/// Such receivers contribute no computation of their own.
fn is_access_to_non_null_object(expr: Option<&Expr>) -> bool {
    matches!(expr, Some(Expr::GetObject { ty, .. }) if !ty.nullable)
}

/// Decides whether IR subtrees are evaluable at compile time.
///
/// One checker may serve many queries; each call to [`is_evaluable`]
/// starts from the configured containing declaration (or nothing) and
/// threads its own scope chain, so queries never interfere.
///
/// [`is_evaluable`]: EvaluabilityChecker::is_evaluable
pub struct EvaluabilityChecker<'a> {
    module: &'a Module,
    mode: &'a dyn EvaluationMode,
    config: CheckerConfig,
    containing: Option<ScopeItem>,
}

impl<'a> EvaluabilityChecker<'a> {
    pub fn new(
        module: &'a Module,
        mode: &'a dyn EvaluationMode,
        config: CheckerConfig,
    ) -> EvaluabilityChecker<'a> {
        EvaluabilityChecker {
            module,
            mode,
            config,
            containing: None,
        }
    }

    /// A checker whose root chain already contains `containing`, for
    /// queries posed from inside a declaration body.
    pub fn with_containing(
        module: &'a Module,
        mode: &'a dyn EvaluationMode,
        config: CheckerConfig,
        containing: ScopeItem,
    ) -> EvaluabilityChecker<'a> {
        EvaluabilityChecker {
            module,
            mode,
            config,
            containing: Some(containing),
        }
    }

    /// The single entry point: is this subtree safe and meaningful to
    /// evaluate under the active policy?
    pub fn is_evaluable(&self, expr: &Expr) -> bool {
        match self.containing {
            Some(item) => {
                let root = ScopeChain::empty().entered(item);
                self.check_expr(expr, root.chain())
            }
            None => self.check_expr(expr, ScopeChain::empty()),
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    fn check_expr(&self, expr: &Expr, chain: ScopeChain<'_>) -> bool {
        match expr {
            Expr::Const { ty, .. } => self.check_const(ty),

            Expr::Call(call) => self.check_call(expr, call, chain),

            Expr::ConstructorCall(access) | Expr::EnumConstructorCall(access) => {
                self.check_constructor(access, chain)
            }

            Expr::DelegatingConstructorCall(access) => {
                // Delegation into the universal base type is a no-op.
                if self
                    .module
                    .function(access.callee)
                    .return_type
                    .is_any(self.module)
                {
                    true
                } else {
                    self.check_constructor(access, chain)
                }
            }

            Expr::InstanceInitializerCall { class } => {
                self.check_instance_initializer(*class, chain)
            }

            Expr::GetValue { target, .. } => {
                chain.contains_decl(self.module.variable(*target).parent)
            }

            Expr::SetValue { value, .. } => self.check_expr(value, chain),

            Expr::GetField { field, receiver } => {
                self.check_get_field(*field, receiver.as_deref(), chain)
            }

            Expr::SetField { field, value, .. } => self.check_set_field(*field, value, chain),

            // Reading the singleton itself computes nothing.
            Expr::GetObject { .. } => true,

            Expr::GetEnumValue { entry } => self.check_get_enum_value(expr, *entry, chain),

            Expr::StringConcat { parts } => {
                parts.iter().all(|part| self.check_concat_part(part, chain))
            }

            Expr::TypeOp {
                op,
                ty_operand,
                argument,
            } => self.check_type_op(*op, ty_operand, argument, chain),

            Expr::When { branches } => {
                self.mode.can_evaluate_expression(expr)
                    && branches.iter().all(|b| self.check_branch(b, chain))
            }

            Expr::While(l) | Expr::DoWhile(l) => self.check_loop(l, chain),

            Expr::Break { target } | Expr::Continue { target } => {
                chain.contains(ScopeItem::Loop(*target))
            }

            Expr::Return { target, value } => {
                chain.contains(ScopeItem::Function(*target)) && self.check_expr(value, chain)
            }

            Expr::Throw { value } => {
                self.mode.can_evaluate_expression(expr) && self.check_expr(value, chain)
            }

            Expr::Try {
                try_result,
                catches,
                finally,
            } => self.check_try(expr, try_result, catches, finally.as_deref(), chain),

            // A partial vararg array is still constructible, so any
            // evaluable element suffices -- unlike call arguments.
            Expr::Vararg { elements, .. } => elements
                .iter()
                .any(|element| self.check_vararg_element(element, chain)),

            Expr::Block { statements } => {
                self.mode.can_evaluate_block(expr) && self.check_statements(statements, chain)
            }

            Expr::Composite { statements } => {
                self.mode.can_evaluate_composite(expr) && self.check_statements(statements, chain)
            }

            Expr::FunctionReference {
                target,
                dispatch_receiver,
                extension_receiver,
                ..
            } => self.check_function_reference(
                expr,
                *target,
                dispatch_receiver.as_deref(),
                extension_receiver.as_deref(),
                chain,
            ),

            Expr::RawFunctionReference { .. } => false,

            Expr::PropertyReference {
                target,
                dispatch_receiver,
                extension_receiver,
            } => self.check_property_reference(
                expr,
                *target,
                dispatch_receiver.as_deref(),
                extension_receiver.as_deref(),
                chain,
            ),

            Expr::FunctionExpression { function, .. } => {
                self.check_function_expression(expr, *function, chain)
            }

            Expr::ClassReference { .. } => self.mode.can_evaluate_class_reference(expr),
        }
    }

    // ── Shared pieces ────────────────────────────────────────────────

    fn check_statements(&self, statements: &[Statement], chain: ScopeChain<'_>) -> bool {
        statements.iter().all(|s| self.check_statement(s, chain))
    }

    fn check_statement(&self, statement: &Statement, chain: ScopeChain<'_>) -> bool {
        match statement {
            Statement::Expr(expr) => self.check_expr(expr, chain),
            Statement::Variable(local) => local
                .initializer
                .as_ref()
                .map_or(true, |init| self.check_expr(init, chain)),
        }
    }

    fn check_fn_body(&self, body: &Body, chain: ScopeChain<'_>) -> bool {
        match body {
            Body::Block(statements) => self.check_statements(statements, chain),
            Body::Expression(expr) => self.check_expr(expr, chain),
            Body::Synthetic(kind) => matches!(
                kind,
                SyntheticBodyKind::EnumValues | SyntheticBodyKind::EnumValueOf
            ),
        }
    }

    /// Check a callee's body with the callee on the chain, unless the
    /// policy says the body never needs inspection. A missing body counts
    /// as evaluable; the policy is expected to have vetted externals.
    fn check_body_if_needed(&self, function: FunctionId, chain: ScopeChain<'_>) -> bool {
        if !self.mode.must_check_body_of(self.module, function) {
            return true;
        }
        let node = chain.entered(ScopeItem::Function(function));
        let inner = node.chain();
        match &self.module.function(function).body {
            Some(body) => self.check_fn_body(body, inner),
            None => true,
        }
    }

    /// All-match rule for call arguments: an absent (defaulted) argument
    /// is vacuously evaluable.
    fn check_value_args(&self, args: &[Option<Expr>], chain: ScopeChain<'_>) -> bool {
        args.iter()
            .all(|arg| arg.as_ref().map_or(true, |e| self.check_expr(e, chain)))
    }

    // ── Calls ────────────────────────────────────────────────────────

    fn is_getter_to_const_val(&self, call: &Call) -> bool {
        self.module
            .function(call.callee)
            .corresponding_property
            .map_or(false, |p| self.module.property(p).is_const)
    }

    fn check_call(&self, expr: &Expr, call: &Call, chain: ScopeChain<'_>) -> bool {
        if !self.mode.can_evaluate_expression(expr) {
            return false;
        }
        let callee = self.module.function(call.callee);
        if !self.mode.can_evaluate_function(self.module, call.callee) {
            return false;
        }

        // Float conversion narrows differently at runtime on this target;
        // never fold it, even through the shortcuts below.
        if callee.name == builtins::FLOAT_CONVERSION
            && self.config.suppress_float_conversion_folding
        {
            return false;
        }

        // A call through a singleton receiver reduces to "is this a
        // getter of a constant property" -- without descending into the
        // whole singleton initializer.
        if is_access_to_non_null_object(call.dispatch_receiver.as_deref()) {
            return self.is_getter_to_const_val(call);
        }

        let dispatch_ok = call
            .dispatch_receiver
            .as_deref()
            .map_or(true, |r| self.check_expr(r, chain));
        let extension_ok = call
            .extension_receiver
            .as_deref()
            .map_or(true, |r| self.check_expr(r, chain));
        if !self.check_value_args(&call.value_args, chain) {
            return false;
        }
        let body_ok = self.check_body_if_needed(call.callee, chain);
        dispatch_ok && extension_ok && body_ok
    }

    fn check_constructor(&self, access: &FunctionAccess, chain: ScopeChain<'_>) -> bool {
        if !self.mode.can_evaluate_function(self.module, access.callee) {
            return false;
        }
        if !self.check_value_args(&access.value_args, chain) {
            return false;
        }
        if !self.check_body_if_needed(access.callee, chain) {
            return false;
        }
        let class = match self.module.function(access.callee).parent {
            DeclRef::Class(class) => class,
            _ => return false,
        };
        self.module.anonymous_initializers(class).all(|id| {
            let init = self.module.initializer(id);
            init.is_static || self.check_statements(&init.body, chain)
        })
    }

    fn check_instance_initializer(&self, class: ClassId, chain: ScopeChain<'_>) -> bool {
        let initializers_ok = self.module.anonymous_initializers(class).all(|id| {
            let init = self.module.initializer(id);
            init.is_static || self.check_statements(&init.body, chain)
        });
        if !initializers_ok {
            return false;
        }
        self.module.member_properties(class).all(|property| {
            let Some(field) = self.module.property(property).backing_field else {
                return true;
            };
            match &self.module.field(field).initializer {
                // Parameter-seeded backing fields are filled by the
                // constructor itself, nothing to evaluate.
                Some(Expr::GetValue {
                    origin: Some(ValueOrigin::InitializedFromParameter),
                    ..
                }) => true,
                Some(init) => self.check_expr(init, chain),
                None => true,
            }
        })
    }

    // ── Enum entries ─────────────────────────────────────────────────

    fn check_get_enum_value(
        &self,
        expr: &Expr,
        entry: EnumEntryId,
        chain: ScopeChain<'_>,
    ) -> bool {
        if !self.mode.can_evaluate_enum_value(expr) {
            return false;
        }
        // An entry already on the chain is being defined right now: treat
        // the re-entrant read as evaluable instead of recursing forever
        // (e.g. `enum E(val s: String) { OK(OK.name) }`).
        if chain.contains(ScopeItem::EnumEntry(entry)) {
            return true;
        }
        let node = chain.entered(ScopeItem::EnumEntry(entry));
        let inner = node.chain();
        match &self.module.enum_entry(entry).initializer {
            Some(init) => self.check_expr(init, inner),
            None => false,
        }
    }

    // ── Fields ───────────────────────────────────────────────────────

    fn check_get_field(
        &self,
        field: FieldId,
        receiver: Option<&Expr>,
        chain: ScopeChain<'_>,
    ) -> bool {
        let field_decl = self.module.field(field);
        let property = field_decl
            .corresponding_property
            .map(|p| self.module.property(p));

        // Boxed-boolean statics on the platform stub carry no initializer
        // but are constants all the same.
        if field_decl.fq_name == builtins::BOXED_BOOL_TRUE
            || field_decl.fq_name == builtins::BOXED_BOOL_FALSE
        {
            return true;
        }

        let is_foreign_constant = field_decl.origin == DeclOrigin::ForeignStub
            && field_decl.is_static
            && field_decl.is_final
            && (field_decl.ty.is_primitive(self.module) || field_decl.ty.is_string(self.module));
        if is_foreign_constant {
            return field_decl
                .initializer
                .as_ref()
                .map_or(false, |init| self.check_expr(init, chain));
        }

        if receiver.is_none() {
            return property.map_or(false, |p| p.is_const)
                && field_decl
                    .initializer
                    .as_ref()
                    .map_or(false, |init| self.check_expr(init, chain));
        }

        if field_decl.origin == DeclOrigin::PropertyBackingField
            && property.map_or(false, |p| p.is_const)
        {
            let receiver_ok = receiver.map_or(true, |r| self.check_expr(r, chain))
                || is_access_to_non_null_object(receiver);
            let initializer_ok = field_decl
                .initializer
                .as_ref()
                .map_or(false, |init| self.check_expr(init, chain));
            return receiver_ok && initializer_ok;
        }

        // Fallthrough: the access sits inside the property's own getter,
        // which is on the chain during recursive property evaluation.
        let Some(property_id) = field_decl.corresponding_property else {
            return false;
        };
        if !self.property_declared_in_parent(field_decl.parent, property_id) {
            return false;
        }
        let Some(getter) = self.module.property(property_id).getter else {
            return false;
        };
        chain.contains(ScopeItem::Function(getter))
    }

    fn check_set_field(&self, field: FieldId, value: &Expr, chain: ScopeChain<'_>) -> bool {
        let field_decl = self.module.field(field);
        // Mutation of top-level or singleton state never folds.
        if self.accesses_top_level_or_object_field(field_decl.parent) {
            return false;
        }
        let Some(property_id) = field_decl.corresponding_property else {
            return false;
        };
        if !self.property_declared_in_parent(field_decl.parent, property_id) {
            return false;
        }
        let Some(setter) = self.module.property(property_id).setter else {
            return false;
        };
        chain.contains(ScopeItem::Function(setter)) && self.check_expr(value, chain)
    }

    fn accesses_top_level_or_object_field(&self, parent: DeclRef) -> bool {
        match parent {
            DeclRef::File => true,
            DeclRef::Class(class) => self.module.class(class).kind == ClassKind::Object,
            DeclRef::Function(_) => false,
        }
    }

    /// Whether the property is declared (exactly once) in the field's
    /// structural parent.
    fn property_declared_in_parent(&self, parent: DeclRef, property: PropertyId) -> bool {
        let DeclRef::Class(class) = parent else {
            return false;
        };
        self.module
            .class(class)
            .declarations
            .iter()
            .filter(|m| matches!(m, MemberDecl::Property(p) if *p == property))
            .count()
            == 1
    }

    // ── String concatenation ─────────────────────────────────────────

    fn check_concat_part(&self, part: &Expr, chain: ScopeChain<'_>) -> bool {
        match part {
            Expr::GetObject { class, .. } => {
                // Only the singleton's own zero-argument text conversion
                // needs to run; do not force the whole initializer.
                let Some(to_string) = self.single_to_string_member(*class) else {
                    return false;
                };
                self.mode.can_evaluate_function(self.module, to_string)
                    && self.check_body_if_needed(to_string, chain)
            }
            _ => self.check_expr(part, chain),
        }
    }

    fn single_to_string_member(&self, class: ClassId) -> Option<FunctionId> {
        let mut candidates = self.module.member_functions(class).filter(|f| {
            let function = self.module.function(*f);
            matches!(function.kind, FunctionKind::Simple)
                && function.name == builtins::TO_STRING
                && function.value_params.is_empty()
                && !function.has_extension_receiver
        });
        let found = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        Some(found)
    }

    // ── Type operators ───────────────────────────────────────────────

    fn check_type_op(
        &self,
        op: TypeOperator,
        ty_operand: &IrType,
        argument: &Expr,
        chain: ScopeChain<'_>,
    ) -> bool {
        match op {
            TypeOperator::InstanceOf
            | TypeOperator::NotInstanceOf
            | TypeOperator::ImplicitCoercionToUnit
            | TypeOperator::ImplicitNotNull
            | TypeOperator::SamConversion
            | TypeOperator::Cast
            | TypeOperator::ImplicitCast
            | TypeOperator::SafeCast => {
                // A type-parameter operand is unresolved unless its owner
                // is part of the current analysis.
                if let ClassifierRef::TypeParam(param) = ty_operand.classifier {
                    if !chain.contains_decl(self.module.type_param(param).parent) {
                        return false;
                    }
                }
                self.check_expr(argument, chain)
            }
            TypeOperator::ReinterpretCast => false,
        }
    }

    // ── Control flow ─────────────────────────────────────────────────

    fn check_branch(&self, branch: &Branch, chain: ScopeChain<'_>) -> bool {
        self.check_expr(&branch.condition, chain) && self.check_expr(&branch.result, chain)
    }

    fn check_loop(&self, l: &Loop, chain: ScopeChain<'_>) -> bool {
        // The loop goes on the chain before its condition and body so
        // nested break/continue can resolve it.
        let node = chain.entered(ScopeItem::Loop(l.id));
        let inner = node.chain();
        self.check_expr(&l.condition, inner)
            && l.body.as_deref().map_or(true, |b| self.check_expr(b, inner))
    }

    fn check_try(
        &self,
        expr: &Expr,
        try_result: &Expr,
        catches: &[Catch],
        finally: Option<&Expr>,
        chain: ScopeChain<'_>,
    ) -> bool {
        if !self.mode.can_evaluate_expression(expr) {
            return false;
        }
        if !self.check_expr(try_result, chain) {
            return false;
        }
        if let Some(finally) = finally {
            if !self.check_expr(finally, chain) {
                return false;
            }
        }
        catches.iter().all(|c| self.check_expr(&c.result, chain))
    }

    fn check_vararg_element(&self, element: &VarargElement, chain: ScopeChain<'_>) -> bool {
        match element {
            VarargElement::Element(expr) => self.check_expr(expr, chain),
            VarargElement::Spread(expr) => self.check_expr(expr, chain),
        }
    }

    // ── Constants ────────────────────────────────────────────────────

    fn check_const(&self, ty: &IrType) -> bool {
        // Unsigned constants box through their wrapper's constructor.
        if let Some(class) = ty.unsigned_class(self.module) {
            let mut constructors = self.module.constructors(class);
            let Some(constructor) = constructors.next() else {
                return false;
            };
            if constructors.next().is_some() {
                return false;
            }
            return self.mode.can_evaluate_function(self.module, constructor);
        }
        true
    }

    // ── Callable references and literals ─────────────────────────────

    fn check_function_reference(
        &self,
        expr: &Expr,
        target: FunctionId,
        dispatch_receiver: Option<&Expr>,
        extension_receiver: Option<&Expr>,
        chain: ScopeChain<'_>,
    ) -> bool {
        if !self.mode.can_evaluate_callable_reference(expr) {
            return false;
        }
        let dispatch_ok = dispatch_receiver.map_or(true, |r| self.check_expr(r, chain));
        let extension_ok = extension_receiver.map_or(true, |r| self.check_expr(r, chain));
        if !self.mode.can_evaluate_function(self.module, target) {
            return false;
        }
        let body_ok = self.check_body_if_needed(target, chain);
        dispatch_ok && extension_ok && body_ok
    }

    fn check_property_reference(
        &self,
        expr: &Expr,
        target: PropertyId,
        dispatch_receiver: Option<&Expr>,
        extension_receiver: Option<&Expr>,
        chain: ScopeChain<'_>,
    ) -> bool {
        if !self.mode.can_evaluate_callable_reference(expr) {
            return false;
        }
        let dispatch_ok = dispatch_receiver.map_or(true, |r| self.check_expr(r, chain));
        let extension_ok = extension_receiver.map_or(true, |r| self.check_expr(r, chain));
        let getter_ok = self
            .module
            .property(target)
            .getter
            .map_or(true, |g| self.mode.can_evaluate_function(self.module, g));
        dispatch_ok && extension_ok && getter_ok
    }

    fn check_function_expression(
        &self,
        expr: &Expr,
        function: FunctionId,
        chain: ScopeChain<'_>,
    ) -> bool {
        if !self.mode.can_evaluate_function_expression(expr) {
            return false;
        }
        let Some(body) = &self.module.function(function).body else {
            return false;
        };
        let node = chain.entered(ScopeItem::Function(function));
        let inner = node.chain();
        self.check_fn_body(body, inner)
    }
}
