//! Module bodies, inclusions, spawned lthreads, test modules, type
//! extensions, lifetime jobs, reception handlers and markup.

use std::sync::Arc;

use inox_core::context::TypeExtension;
use inox_core::errors::{self, EvalError};
use inox_core::value::{LThreadGroup, LifetimeJob, Mapping, MarkupElement, ReceptionHandler};
use inox_core::{ContextConfig, EvalResult, Heap, Permission, Value};
use inox_ir::{Module, ModuleKind, NodeId, NodeKind, SharedAst};

use super::{Interpreter, IterationChange};
use crate::environment::GlobalState;
use crate::manifest::permissions_from_listing;
use crate::spawn::{start_lthread, LThreadSpec};

/// Member of a namespace that turns markup elements into values.
pub const FROM_MARKUP_FACTORY: &str = "from_markup_elem";

/// Meta entries of a spawn expression.
#[derive(Default)]
struct SpawnMeta {
    group: Option<Heap<LThreadGroup>>,
    globals: Vec<(String, Value)>,
    allow: Option<Value>,
}

impl Interpreter {
    /// Body of a chunk or embedded module. Function declarations are
    /// hoisted; a top-level `return` or `yield` gives the module's value.
    pub(super) fn eval_module_body(
        &mut self,
        global_constants: Option<NodeId>,
        statements: &[NodeId],
    ) -> EvalResult {
        if let Some(constants) = global_constants {
            self.eval(constants)?;
        }
        let ast = Arc::clone(&self.ast);
        for statement in statements {
            if let NodeKind::FunctionDeclaration { name, function } = ast.kind(*statement) {
                self.declare_function(*name, *function)?;
            }
        }
        self.eval_statements(statements)?;
        Ok(match std::mem::take(&mut self.iteration_change) {
            IterationChange::Return(value) | IterationChange::Yield(value) => value,
            _ => Value::Nil,
        })
    }

    /// `import ./file.ix`: evaluates the included chunk in the current
    /// module. Errors are located at the import statement too.
    pub(super) fn eval_inclusion(&mut self, node: NodeId) -> EvalResult {
        let chunk = self
            .module
            .included_chunk(node)
            .ok_or_else(|| errors::invalid_argument("the included chunk was not loaded"))?;
        tracing::debug!(module = %self.module.name, "evaluating included chunk");
        match self.eval(chunk) {
            Ok(_) => Ok(Value::Nil),
            Err(mut error) => {
                error.positions.push_outer(self.ast.position(node));
                Err(error)
            }
        }
    }

    /// Entry of a meta object, if present.
    fn meta_entry(&self, meta: &Value, name: &str) -> Result<Option<Value>, EvalError> {
        match meta {
            Value::Nil => Ok(None),
            Value::Object(_) | Value::Record(_) => {
                if meta.property_names()?.iter().any(|n| n == name) {
                    meta.prop(&self.ctx, name).map(Some)
                } else {
                    Ok(None)
                }
            }
            other => Err(errors::type_mismatch("object", other.type_name())),
        }
    }

    fn spawn_meta(&self, meta: &Value) -> Result<SpawnMeta, EvalError> {
        let group = match self.meta_entry(meta, "group")? {
            None => None,
            Some(Value::LThreadGroup(group)) => Some(group),
            Some(other) => return Err(errors::type_mismatch("lthread group", other.type_name())),
        };
        let globals = match self.meta_entry(meta, "globals")? {
            None | Some(Value::Nil) => Vec::new(),
            Some(Value::KeyList(names)) => names
                .0
                .iter()
                .map(|name| {
                    let value = self
                        .global(name)
                        .ok_or_else(|| errors::undeclared_variable(name))?;
                    Ok((name.clone(), value))
                })
                .collect::<Result<Vec<_>, EvalError>>()?,
            Some(Value::Object(object)) => object.entries(),
            Some(Value::Record(record)) => record.entries(),
            Some(Value::Namespace(namespace)) => namespace.entries().to_vec(),
            Some(other) => {
                return Err(errors::type_mismatch(
                    "key list, object or namespace",
                    other.type_name(),
                ))
            }
        };
        let allow = self.meta_entry(meta, "allow")?;
        Ok(SpawnMeta {
            group,
            globals,
            allow,
        })
    }

    /// Configuration of a child context holding the parent's permissions
    /// except `lthread.create`, which is forbidden.
    fn remainder_context_config(&self) -> ContextConfig {
        let lthread_create = Permission::lthread_create();
        let permissions = self
            .ctx
            .granted_permissions()
            .into_iter()
            .filter(|permission| *permission != lthread_create)
            .collect();
        let mut forbidden_permissions = self.ctx.forbidden_permissions();
        forbidden_permissions.push(lthread_create);
        ContextConfig {
            permissions,
            forbidden_permissions,
            ..ContextConfig::default()
        }
    }

    /// Value passed to another lthread: functions and mappings capture the
    /// globals their body references.
    fn shareable(&self, value: Value) -> EvalResult {
        let from_module = |ast: &SharedAst| Arc::ptr_eq(ast, &self.module.ast);
        let with_captures = match &value {
            Value::InoxFunction(function)
                if function.captured_globals.is_empty() && from_module(&function.ast) =>
            {
                let names = self.static_data.fn_captured_globals(function.node);
                (!names.is_empty()).then(|| {
                    let mut function = (**function).clone();
                    function.captured_globals = self.capture_globals(names);
                    Value::inox_function(function)
                })
            }
            Value::Mapping(mapping)
                if mapping.captured_globals.is_empty() && from_module(&mapping.ast) =>
            {
                let names = self.static_data.mapping_captured_globals(mapping.node);
                (!names.is_empty()).then(|| {
                    Value::mapping(Mapping {
                        ast: Arc::clone(&mapping.ast),
                        node: mapping.node,
                        captured_globals: self.capture_globals(names),
                    })
                })
            }
            _ => None,
        };
        let shared = with_captures.unwrap_or(value);
        shared.share(&self.ctx)?;
        Ok(shared)
    }

    fn capture_globals(&self, names: &[String]) -> Vec<(String, Value)> {
        names
            .iter()
            .filter_map(|name| self.global(name).map(|value| (name.clone(), value)))
            .collect()
    }

    /// Globals of a new lthread: the start constants plus `extra`.
    fn lthread_globals(&self, extra: Vec<(String, Value)>) -> Result<GlobalState, EvalError> {
        let globals = GlobalState::new();
        for (name, value) in self.globals.start_constants() {
            globals.define_start_constant(name, self.shareable(value)?);
        }
        for (name, value) in extra {
            globals.define_constant(name, self.shareable(value)?);
        }
        Ok(globals)
    }

    /// `go {meta} do {...}`: runs the embedded module in a new lthread.
    ///
    /// With an `allow` listing the lthread gets exactly the listed
    /// permissions, each of which must be held here; otherwise it gets the
    /// remaining permissions minus `lthread.create`.
    pub(super) fn eval_spawn(&mut self, meta: Option<NodeId>, module: NodeId) -> EvalResult {
        if !matches!(self.ast.kind(module), NodeKind::EmbeddedModule { .. }) {
            return Err(errors::type_mismatch("embedded module", self.ast.kind(module).name()));
        }
        self.ctx.check_has_permission(&Permission::lthread_create())?;
        let meta = self.eval_optional(meta)?;
        let meta = self.spawn_meta(&meta)?;

        let config = match &meta.allow {
            Some(listing) => {
                let permissions = permissions_from_listing(listing)?;
                for permission in &permissions {
                    self.ctx.check_has_permission(permission)?;
                }
                ContextConfig {
                    permissions,
                    forbidden_permissions: self.ctx.forbidden_permissions(),
                    ..ContextConfig::default()
                }
            }
            None => self.remainder_context_config(),
        };
        let ctx = self.ctx.new_child(config)?;
        let globals = self.lthread_globals(meta.globals)?;

        let name = format!("{}:lthread-{}", self.module.name, module.raw());
        let module = Arc::new(Module {
            ast: Arc::clone(&self.ast),
            main_chunk: module,
            inclusions: self.module.inclusions.clone(),
            kind: ModuleKind::UserLThread,
            name: name.clone(),
        });
        let lthread = start_lthread(LThreadSpec {
            name,
            ctx,
            module,
            globals,
            static_data: Arc::clone(&self.static_data),
            config: Arc::clone(&self.config),
            self_value: None,
        })?;
        if let Some(group) = &meta.group {
            group.add(lthread.clone());
        }
        Ok(Value::LThread(lthread))
    }

    /// `testsuite "name" {...}` and `testcase "name" {...}`: runs the
    /// embedded module synchronously in a child context with a copy of the
    /// globals, then reports the outcome.
    pub(super) fn eval_test_module(
        &mut self,
        node: NodeId,
        meta: Option<NodeId>,
        module: NodeId,
        kind: ModuleKind,
    ) -> EvalResult {
        if !matches!(self.ast.kind(module), NodeKind::EmbeddedModule { .. }) {
            return Err(errors::type_mismatch("embedded module", self.ast.kind(module).name()));
        }
        let meta = self.eval_optional(meta)?;
        let name = match &meta {
            Value::Object(_) | Value::Record(_) => self
                .meta_entry(&meta, "name")?
                .and_then(|name| name.as_str().map(str::to_string)),
            other => other.as_str().map(str::to_string),
        }
        .unwrap_or_else(|| format!("test-{}", node.raw()));

        let ctx = self.ctx.new_child(ContextConfig {
            permissions: self.ctx.granted_permissions(),
            forbidden_permissions: self.ctx.forbidden_permissions(),
            ..ContextConfig::default()
        })?;
        let module = Arc::new(Module {
            ast: Arc::clone(&self.ast),
            main_chunk: module,
            inclusions: self.module.inclusions.clone(),
            kind,
            name: name.clone(),
        });
        let globals = self.globals.snapshot();
        crate::dispatcher::install(
            &ctx,
            &globals,
            Arc::clone(&module),
            Arc::clone(&self.static_data),
            Arc::clone(&self.config),
        );

        tracing::debug!(test = %name, ?kind, "running test module");
        let mut interpreter = super::InterpreterBuilder::new(ctx.clone(), module)
            .globals(globals)
            .static_data(Arc::clone(&self.static_data))
            .config(Arc::clone(&self.config))
            .build();
        let result = interpreter.run_module();
        ctx.shutdown();

        match result {
            Ok(_) => {
                self.output().println(&format!("[ok] {name}"));
                Ok(Value::Nil)
            }
            Err(error) => {
                self.output().println(&format!("[fail] {name}: {error}"));
                Err(error)
            }
        }
    }

    /// `extend pattern {...}`: registers the properties for the values
    /// matching the pattern. Evaluating the statement again is a no-op.
    pub(super) fn eval_extend(&mut self, node: NodeId, pattern: NodeId, extension: NodeId) -> EvalResult {
        let id = format!("extension-{}", node.raw());
        if self.ctx.type_extension(&id).is_some() {
            return Ok(Value::Nil);
        }
        let pattern = self.eval_pattern(pattern)?;
        let props = match self.eval(extension)? {
            Value::Object(object) => object.entries(),
            Value::Record(record) => record.entries(),
            other => return Err(errors::type_mismatch("object", other.type_name())),
        };
        tracing::debug!(extension = %id, "type extension registered");
        self.ctx.add_type_extension(TypeExtension { id, pattern, props });
        Ok(Value::Nil)
    }

    /// `value::name`. The symbolic checker tells which extension the
    /// expression uses; an expression it did not resolve is an error.
    pub(super) fn extension_member(&self, node: NodeId, name: &str) -> EvalResult {
        let id = self
            .config
            .hooks
            .as_ref()
            .and_then(|hooks| hooks.used_type_extension(node))
            .ok_or_else(|| errors::unresolved_extension_member(name))?;
        let extension = self.ctx.type_extension(&id).ok_or_else(|| {
            errors::invalid_argument(format!("type extension {id} is not registered"))
        })?;
        extension
            .prop(name)
            .cloned()
            .ok_or_else(|| errors::property_not_found(name))
    }

    /// `lifejob #name {...}`: the job starts when it is placed in an object
    /// literal.
    pub(super) fn make_lifetime_job(
        &mut self,
        meta: NodeId,
        subject: Option<NodeId>,
        module: NodeId,
    ) -> EvalResult {
        let meta = self.eval(meta)?;
        let subject = subject
            .map(|subject| self.eval_pattern(subject))
            .transpose()?;
        Ok(Value::lifetime_job(LifetimeJob {
            ast: Arc::clone(&self.ast),
            module,
            meta,
            subject,
            captured_globals: self.globals.start_constants(),
        }))
    }

    /// Run a lifetime job in a new lthread with `self` bound to `subject`.
    pub(super) fn start_lifetime_job(
        &mut self,
        job: &Heap<LifetimeJob>,
        subject: &Value,
    ) -> Result<(), EvalError> {
        if let Some(pattern) = &job.subject {
            if !pattern.test(&self.ctx, subject) {
                return Err(errors::type_mismatch(&pattern.to_string(), subject.type_name()));
            }
        }
        self.ctx.check_has_permission(&Permission::lthread_create())?;
        let ctx = self.ctx.new_child(self.remainder_context_config())?;
        let globals = GlobalState::new();
        for (name, value) in &job.captured_globals {
            globals.define_start_constant(name.as_str(), self.shareable(value.clone())?);
        }
        let name = match job.meta.as_str() {
            Some(name) => name.to_string(),
            None => format!("{}:lifejob-{}", self.module.name, job.module.raw()),
        };
        let module = Arc::new(Module {
            ast: Arc::clone(&job.ast),
            main_chunk: job.module,
            inclusions: self.module.inclusions.clone(),
            kind: ModuleKind::LifetimeJob,
            name: name.clone(),
        });
        start_lthread(LThreadSpec {
            name,
            ctx,
            module,
            globals,
            static_data: Arc::clone(&self.static_data),
            config: Arc::clone(&self.config),
            self_value: Some(subject.clone()),
        })?;
        Ok(())
    }

    pub(super) fn make_reception_handler(&mut self, pattern: NodeId, handler: NodeId) -> EvalResult {
        let pattern = self.eval_pattern(pattern)?;
        let handler = self.eval(handler)?;
        if !matches!(handler, Value::InoxFunction(_) | Value::HostFunction(_)) {
            return Err(errors::type_mismatch("function", handler.type_name()));
        }
        Ok(Value::reception_handler(ReceptionHandler { pattern, handler }))
    }

    /// `sendval value to receiver`: calls, in registration order, the
    /// receiver's handlers whose pattern matches the value.
    pub(super) fn eval_sendval(&mut self, value: NodeId, receiver: NodeId) -> EvalResult {
        let value = self.eval(value)?;
        let receiver = self.eval(receiver)?;
        let Value::Object(object) = &receiver else {
            return Err(errors::type_mismatch("object", receiver.type_name()));
        };
        for handler in object.reception_handlers() {
            if handler.pattern.test(&self.ctx, &value) {
                self.call_value(&handler.handler, vec![value.clone()], Some(receiver.clone()))?;
            }
        }
        Ok(Value::Nil)
    }

    /// Markup expression: without a namespace the element itself, otherwise
    /// what the namespace's markup factory makes of it.
    pub(super) fn eval_markup(&mut self, namespace: Option<NodeId>, element: NodeId) -> EvalResult {
        let element = self.eval(element)?;
        let Some(namespace) = namespace else {
            return Ok(element);
        };
        let namespace = self.eval(namespace)?;
        let factory = match &namespace {
            Value::Namespace(namespace) => namespace.get(FROM_MARKUP_FACTORY).cloned(),
            Value::Object(_) | Value::Record(_) => self.meta_entry(&namespace, FROM_MARKUP_FACTORY)?,
            other => return Err(errors::type_mismatch("namespace", other.type_name())),
        }
        .ok_or_else(|| {
            errors::invalid_argument(format!("the namespace has no {FROM_MARKUP_FACTORY} function"))
        })?;
        self.call_value(&factory, vec![element], None)
    }

    pub(super) fn eval_markup_element(&mut self, node: NodeId) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let NodeKind::MarkupElement {
            name,
            attributes,
            children,
        } = ast.kind(node)
        else {
            return Err(errors::type_mismatch("markup element", ast.kind(node).name()));
        };
        let mut evaluated_attributes = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let NodeKind::MarkupAttribute { name, value } = ast.kind(*attribute) else {
                continue;
            };
            let value = match value {
                Some(value) => self.eval(*value)?,
                None => Value::Bool(true),
            };
            evaluated_attributes.push((name.clone(), value));
        }
        let children = children
            .iter()
            .map(|child| self.eval(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::markup_element(MarkupElement {
            name: name.clone(),
            attributes: evaluated_attributes,
            children,
        }))
    }
}
