//! Execution contexts.
//!
//! A [`Context`] carries everything a running module is allowed to do: its
//! granted and forbidden permissions, limit buckets, named patterns and
//! pattern namespaces, type extensions, the current transaction and the
//! shared values it has locked. Contexts form a tree.
//!
//! # Design
//!
//! - **Completion flows down.** A context is done when it was cancelled or
//!   when any ancestor is done; `is_done` walks the parent chain, so a
//!   child never outlives its parent's cancellation.
//! - **Registries flow up.** Named patterns, pattern namespaces, type
//!   extensions and the call dispatcher are looked up in the context first,
//!   then in its ancestors up to the root.
//! - **Permissions narrow.** A child's granted permissions must be covered
//!   by its parent's remainder (granted minus forbidden); the parent's
//!   forbidden permissions are inherited.

mod limits;
mod permissions;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

pub use limits::{Limit, LimitKind, Limiters, TokenBucket};
pub use permissions::{HttpEntity, PathEntity, Permission, PermissionError, PermissionKind};

use crate::errors::{self, EvalError, EvalResult};
use crate::pattern::{Pattern, PatternNamespace};
use crate::value::{Heap, Mapping, Transaction, Value};

/// Identity of a context, used as the owner of smart locks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Calls back into the evaluator for user-defined callables.
///
/// The evaluator installs an implementation on the root context so that
/// code in this crate (mappings, dynamic values, pattern-based callbacks) can
/// invoke Inox functions without depending on the evaluator.
pub trait CallDispatcher: Send + Sync {
    fn call(&self, ctx: &Context, callee: &Value, args: Vec<Value>) -> EvalResult;

    fn compute_mapping(&self, ctx: &Context, mapping: &Mapping, key: &Value) -> EvalResult;
}

/// Properties added to the values matching a pattern (`extend pattern {...}`).
#[derive(Clone)]
pub struct TypeExtension {
    pub id: String,
    pub pattern: Heap<Pattern>,
    pub props: Vec<(String, Value)>,
}

impl TypeExtension {
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Registry failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("pattern %{0} is already defined")]
    DuplicatePattern(String),
    #[error("pattern namespace %{0}. is already defined")]
    DuplicatePatternNamespace(String),
    #[error("no call dispatcher is installed")]
    NoDispatcher,
    #[error("a transaction is already started")]
    TransactionAlreadyStarted,
    #[error("limit '{0}' is not defined in the context")]
    UnknownLimit(String),
}

impl From<ContextError> for EvalError {
    fn from(error: ContextError) -> Self {
        EvalError::new(error.to_string())
    }
}

/// Configuration of a new context.
#[derive(Clone, Debug, Default)]
pub struct ContextConfig {
    pub permissions: Vec<Permission>,
    pub forbidden_permissions: Vec<Permission>,
    pub limits: Vec<Limit>,
    /// Root contexts only: skip the default named patterns and namespaces.
    pub no_default_patterns: bool,
}

impl ContextConfig {
    pub fn with_permissions(permissions: Vec<Permission>) -> Self {
        ContextConfig {
            permissions,
            ..ContextConfig::default()
        }
    }
}

#[derive(Default)]
struct Registries {
    named_patterns: FxHashMap<String, Heap<Pattern>>,
    pattern_namespaces: FxHashMap<String, Heap<PatternNamespace>>,
    type_extensions: Vec<Arc<TypeExtension>>,
}

struct PermissionSet {
    granted: Vec<Permission>,
    forbidden: Vec<Permission>,
}

struct ContextInner {
    id: ContextId,
    parent: Option<Context>,
    done: AtomicBool,
    permissions: RwLock<PermissionSet>,
    limiters: Limiters,
    registries: RwLock<Registries>,
    dispatcher: RwLock<Option<Arc<dyn CallDispatcher>>>,
    transaction: Mutex<Option<Heap<Transaction>>>,
    /// Values locked by synchronized blocks, innermost last.
    locked_values: Mutex<Vec<Value>>,
}

/// Execution context; cloning yields another handle on the same context.
#[derive(Clone)]
pub struct Context(Arc<ContextInner>);

/// Non-owning handle on a context, held by patterns that resolve names
/// lazily.
#[derive(Clone, Default)]
pub struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub fn upgrade(&self) -> Option<Context> {
        self.0.upgrade().map(Context)
    }
}

impl Context {
    fn with_parent(config: ContextConfig, parent: Option<Context>) -> Self {
        let limiters = Limiters::new(&config.limits, parent.as_ref().map(|p| &p.0.limiters));
        Context(Arc::new(ContextInner {
            id: ContextId::next(),
            parent,
            done: AtomicBool::new(false),
            permissions: RwLock::new(PermissionSet {
                granted: config.permissions,
                forbidden: config.forbidden_permissions,
            }),
            limiters,
            registries: RwLock::new(Registries::default()),
            dispatcher: RwLock::new(None),
            transaction: Mutex::new(None),
            locked_values: Mutex::new(Vec::new()),
        }))
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext(Arc::downgrade(&self.0))
    }

    /// Root context; the default named patterns and namespaces are registered
    /// unless the configuration opts out.
    pub fn new_root(config: ContextConfig) -> Self {
        let seed_defaults = !config.no_default_patterns;
        let ctx = Self::with_parent(config, None);
        if seed_defaults {
            crate::default_patterns::register(&ctx);
        }
        tracing::trace!(id = ?ctx.id(), "root context created");
        ctx
    }

    /// Child context. Every requested permission must be held by `self`;
    /// forbidden permissions are inherited.
    pub fn new_child(&self, config: ContextConfig) -> Result<Context, EvalError> {
        if self.is_done() {
            return Err(errors::cancelled());
        }
        let mut config = config;
        {
            let permissions = self.0.permissions.read();
            for permission in &config.permissions {
                if !has_permission(&permissions, permission) {
                    return Err(PermissionError::NotHeldByParent(permission.clone()).into());
                }
            }
            for forbidden in &permissions.forbidden {
                if !config.forbidden_permissions.contains(forbidden) {
                    config.forbidden_permissions.push(forbidden.clone());
                }
            }
        }
        let child = Self::with_parent(config, Some(self.clone()));
        tracing::trace!(id = ?child.id(), parent = ?self.id(), "child context created");
        Ok(child)
    }

    pub fn id(&self) -> ContextId {
        self.0.id
    }

    pub fn parent(&self) -> Option<&Context> {
        self.0.parent.as_ref()
    }

    fn ancestors(&self) -> impl Iterator<Item = &Context> {
        std::iter::successors(Some(self), |&ctx| ctx.parent())
    }

    /// Whether the context or one of its ancestors was cancelled.
    pub fn is_done(&self) -> bool {
        self.ancestors().any(|ctx| ctx.0.done.load(Ordering::Acquire))
    }

    /// Cancel the context and, through `is_done`, all its descendants.
    pub fn cancel(&self) {
        if !self.0.done.swap(true, Ordering::AcqRel) {
            tracing::debug!(id = ?self.id(), "context cancelled");
        }
    }

    /// Fail with `Cancelled` if the context is done.
    pub fn check_not_done(&self) -> Result<(), EvalError> {
        if self.is_done() {
            Err(errors::cancelled())
        } else {
            Ok(())
        }
    }

    // Permissions

    pub fn has_permission(&self, permission: &Permission) -> bool {
        has_permission(&self.0.permissions.read(), permission)
    }

    /// Fails with `PermissionDenied` unless `permission` is covered by a
    /// granted permission and by no forbidden one.
    pub fn check_has_permission(&self, permission: &Permission) -> Result<(), EvalError> {
        self.check_not_done()?;
        if self.has_permission(permission) {
            return Ok(());
        }
        tracing::debug!(%permission, "permission denied");
        Err(errors::permission_denied(permission))
    }

    /// Remove every granted permission covered by one of `dropped` and forbid
    /// them. Children created earlier keep their own permissions.
    pub fn drop_permissions(&self, dropped: &[Permission]) {
        let mut permissions = self.0.permissions.write();
        permissions
            .granted
            .retain(|granted| !dropped.iter().any(|d| d.includes(granted)));
        for permission in dropped {
            if !permissions.forbidden.contains(permission) {
                permissions.forbidden.push(permission.clone());
            }
        }
    }

    pub fn granted_permissions(&self) -> Vec<Permission> {
        self.0.permissions.read().granted.clone()
    }

    pub fn forbidden_permissions(&self) -> Vec<Permission> {
        self.0.permissions.read().forbidden.clone()
    }

    // Limits

    /// Take `count` tokens from the bucket of `limit`.
    pub fn take(&self, limit: &str, count: i64) -> Result<(), EvalError> {
        self.check_not_done()?;
        let bucket = self
            .0
            .limiters
            .get(limit)
            .ok_or_else(|| ContextError::UnknownLimit(limit.to_string()))?;
        bucket.take(count, || self.is_done())
    }

    pub fn give_back(&self, limit: &str, count: i64) -> Result<(), EvalError> {
        let bucket = self
            .0
            .limiters
            .get(limit)
            .ok_or_else(|| ContextError::UnknownLimit(limit.to_string()))?;
        bucket.give_back(count);
        Ok(())
    }

    pub fn limits(&self) -> Vec<Limit> {
        self.0.limiters.limits()
    }

    // Registries

    pub fn resolve_named_pattern(&self, name: &str) -> Option<Heap<Pattern>> {
        self.ancestors()
            .find_map(|ctx| ctx.0.registries.read().named_patterns.get(name).cloned())
    }

    /// Register a named pattern; names are unique within one context.
    pub fn add_named_pattern(
        &self,
        name: impl Into<String>,
        pattern: Heap<Pattern>,
    ) -> Result<(), EvalError> {
        let name = name.into();
        let mut registries = self.0.registries.write();
        if registries.named_patterns.contains_key(&name) {
            return Err(ContextError::DuplicatePattern(name).into());
        }
        registries.named_patterns.insert(name, pattern);
        Ok(())
    }

    /// Names of the patterns visible from this context, sorted.
    pub fn named_pattern_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ancestors()
            .flat_map(|ctx| {
                ctx.0
                    .registries
                    .read()
                    .named_patterns
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn resolve_pattern_namespace(&self, name: &str) -> Option<Heap<PatternNamespace>> {
        self.ancestors().find_map(|ctx| {
            ctx.0
                .registries
                .read()
                .pattern_namespaces
                .get(name)
                .cloned()
        })
    }

    /// Names of the pattern namespaces visible from this context, sorted.
    pub fn pattern_namespace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ancestors()
            .flat_map(|ctx| {
                ctx.0
                    .registries
                    .read()
                    .pattern_namespaces
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn add_pattern_namespace(
        &self,
        name: impl Into<String>,
        namespace: Heap<PatternNamespace>,
    ) -> Result<(), EvalError> {
        let name = name.into();
        let mut registries = self.0.registries.write();
        if registries.pattern_namespaces.contains_key(&name) {
            return Err(ContextError::DuplicatePatternNamespace(name).into());
        }
        registries.pattern_namespaces.insert(name, namespace);
        Ok(())
    }

    pub fn add_type_extension(&self, extension: TypeExtension) {
        self.0
            .registries
            .write()
            .type_extensions
            .push(Arc::new(extension));
    }

    pub fn type_extension(&self, id: &str) -> Option<Arc<TypeExtension>> {
        self.ancestors().find_map(|ctx| {
            ctx.0
                .registries
                .read()
                .type_extensions
                .iter()
                .find(|e| e.id == id)
                .cloned()
        })
    }

    // Dispatcher

    pub fn set_dispatcher(&self, dispatcher: Arc<dyn CallDispatcher>) {
        *self.0.dispatcher.write() = Some(dispatcher);
    }

    pub fn dispatcher(&self) -> Result<Arc<dyn CallDispatcher>, EvalError> {
        self.ancestors()
            .find_map(|ctx| ctx.0.dispatcher.read().clone())
            .ok_or_else(|| ContextError::NoDispatcher.into())
    }

    // Transactions

    pub fn start_transaction(&self) -> Result<Heap<Transaction>, EvalError> {
        let mut slot = self.0.transaction.lock();
        if slot.is_some() {
            return Err(ContextError::TransactionAlreadyStarted.into());
        }
        let transaction = Heap::new(Transaction::new());
        *slot = Some(transaction.clone());
        tracing::debug!(transaction = %transaction.id(), "transaction started");
        Ok(transaction)
    }

    pub fn current_transaction(&self) -> Option<Heap<Transaction>> {
        self.0.transaction.lock().clone()
    }

    pub(crate) fn clear_transaction(&self, transaction: &Transaction) {
        let mut slot = self.0.transaction.lock();
        if slot
            .as_ref()
            .is_some_and(|current| std::ptr::eq::<Transaction>(&**current, transaction))
        {
            *slot = None;
        }
    }

    // Locked values

    /// Share `value`, lock it for this context and record it.
    pub fn lock_value(&self, value: &Value) -> Result<(), EvalError> {
        value.share(self)?;
        if let Some(lock) = value.smart_lock() {
            lock.lock(self)?;
            self.0.locked_values.lock().push(value.clone());
        }
        Ok(())
    }

    /// Unlock the most recently locked value.
    pub fn unlock_last_value(&self) {
        let value = self.0.locked_values.lock().pop();
        if let Some(lock) = value.as_ref().and_then(Value::smart_lock) {
            lock.unlock(self);
        }
    }

    pub fn locked_value_count(&self) -> usize {
        self.0.locked_values.lock().len()
    }

    /// Release every lock held by this context, innermost first.
    pub fn release_locked_values(&self) {
        let values = std::mem::take(&mut *self.0.locked_values.lock());
        for value in values.iter().rev() {
            if let Some(lock) = value.smart_lock() {
                lock.force_unlock(self);
            }
        }
    }

    /// End of an lthread: cancel, drop all permissions and release locks.
    pub fn shutdown(&self) {
        self.cancel();
        {
            let mut permissions = self.0.permissions.write();
            let granted = std::mem::take(&mut permissions.granted);
            permissions.forbidden.extend(granted);
        }
        self.release_locked_values();
    }
}

fn has_permission(permissions: &PermissionSet, permission: &Permission) -> bool {
    !permissions.forbidden.iter().any(|f| f.includes(permission))
        && permissions.granted.iter().any(|g| g.includes(permission))
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.0.id)
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
