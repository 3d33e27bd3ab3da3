//! Manifest to context configuration.
//!
//! The checker validates the shape of a manifest; this module interprets the
//! evaluated manifest object. Its `permissions` section maps permission kind
//! names to resource listings:
//!
//! ```text
//! permissions: {
//!     read: {globals: "*", env: "HOME", %/tmp/..., https://example.com/}
//!     create: {threads: {}}
//!     use: {commands: {git: {status: {}}}}
//! }
//! limits: {"fs/read": 10MB/s, "http/requests": 5x/s, "objects": 100}
//! ```

use inox_core::context::{HttpEntity, Limit, LimitKind, PathEntity, Permission, PermissionKind};
use inox_core::{errors, ContextConfig, EvalError, Value};

/// Invalid manifest content.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("the manifest should be an object, not a(n) {0}")]
    NotAnObject(&'static str),
    #[error("invalid permission kind '{0}'")]
    InvalidPermissionKind(String),
    #[error("unknown permission type '{0}'")]
    UnknownPermissionType(String),
    #[error("a(n) {0} is not a valid permission resource")]
    InvalidPermissionEntity(&'static str),
    #[error("invalid value for limit '{name}': a(n) {got}")]
    InvalidLimit { name: String, got: &'static str },
}

impl From<ManifestError> for EvalError {
    fn from(error: ManifestError) -> Self {
        errors::invalid_argument(error.to_string())
    }
}

/// Permissions every module gets on its own globals.
pub fn default_global_var_permissions() -> Vec<Permission> {
    [PermissionKind::READ, PermissionKind::USE, PermissionKind::CREATE]
        .into_iter()
        .map(|kind| Permission::global_var(kind, "*"))
        .collect()
}

/// Context configuration described by an evaluated manifest object.
pub fn manifest_to_context_config(manifest: &Value) -> Result<ContextConfig, ManifestError> {
    let Value::Object(object) = manifest else {
        return Err(ManifestError::NotAnObject(manifest.type_name()));
    };

    let mut permissions = match object.prop("permissions") {
        Some(listing) => permissions_from_listing(&listing)?,
        None => Vec::new(),
    };
    for permission in default_global_var_permissions() {
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }

    let limits = match object.prop("limits") {
        Some(Value::Object(limits)) => limits
            .entries()
            .into_iter()
            .map(|(name, value)| limit_from_value(name, &value))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(ManifestError::NotAnObject(other.type_name())),
        None => Vec::new(),
    };

    tracing::debug!(
        permissions = permissions.len(),
        limits = limits.len(),
        "manifest interpreted"
    );
    Ok(ContextConfig {
        permissions,
        limits,
        ..ContextConfig::default()
    })
}

fn limit_from_value(name: String, value: &Value) -> Result<Limit, ManifestError> {
    let (kind, amount) = match value {
        Value::ByteRate(rate) => (LimitKind::ByteRate, *rate),
        Value::SimpleRate(rate) => (LimitKind::SimpleRate, *rate),
        #[allow(clippy::cast_possible_truncation, reason = "rates are small positive numbers")]
        Value::Frequency(freq) => (LimitKind::SimpleRate, freq.round() as i64),
        Value::Int(n) => (LimitKind::Total, n.raw()),
        Value::ByteCount(count) => (LimitKind::Total, *count),
        other => {
            return Err(ManifestError::InvalidLimit {
                name,
                got: other.type_name(),
            })
        }
    };
    Ok(Limit::new(name, kind, amount))
}

/// Permissions described by a permission listing: an object whose keys are
/// permission kind names (`read`, `write`, `create`, `update`, `delete`,
/// `use`). `write` expands to create, update and delete.
pub fn permissions_from_listing(listing: &Value) -> Result<Vec<Permission>, ManifestError> {
    let Value::Object(object) = listing else {
        return Err(ManifestError::NotAnObject(listing.type_name()));
    };
    let mut permissions = Vec::new();
    for (kind_name, resources) in object.entries() {
        let kind = PermissionKind::from_manifest_name(&kind_name)
            .ok_or_else(|| ManifestError::InvalidPermissionKind(kind_name.clone()))?;
        for single_kind in kind.iter() {
            add_permissions_of_kind(single_kind, &resources, &mut permissions)?;
        }
    }
    Ok(permissions)
}

fn add_permissions_of_kind(
    kind: PermissionKind,
    resources: &Value,
    permissions: &mut Vec<Permission>,
) -> Result<(), ManifestError> {
    let mut push = |permission: Permission| {
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    };

    let Value::Object(object) = resources else {
        for element in elements(resources) {
            push(entity_permission(kind, &element)?);
        }
        return Ok(());
    };

    for (type_name, value) in object.entries() {
        match type_name.as_str() {
            "" => {
                for element in elements(&value) {
                    push(entity_permission(kind, &element)?);
                }
            }
            "globals" => {
                for name in names(&value)? {
                    push(Permission::GlobalVar { kind, name });
                }
            }
            "env" => {
                for name in names(&value)? {
                    push(Permission::EnvVar { kind, name });
                }
            }
            "threads" => push(Permission::LThread { kind }),
            "commands" => {
                for (name, subcommands) in command_chains(&value)? {
                    push(Permission::Command { name, subcommands });
                }
            }
            other => return Err(ManifestError::UnknownPermissionType(other.to_string())),
        }
    }
    Ok(())
}

/// A single value or the elements of a list or tuple.
fn elements(value: &Value) -> Vec<Value> {
    match value {
        Value::List(_) | Value::Tuple(_) => value.sequence_elements().unwrap_or_default(),
        other => vec![other.clone()],
    }
}

fn names(value: &Value) -> Result<Vec<String>, ManifestError> {
    elements(value)
        .iter()
        .map(|element| {
            element
                .as_str()
                .map(str::to_string)
                .ok_or(ManifestError::InvalidPermissionEntity(element.type_name()))
        })
        .collect()
}

fn entity_permission(kind: PermissionKind, entity: &Value) -> Result<Permission, ManifestError> {
    Ok(match entity {
        Value::Path(p) => Permission::Filesystem {
            kind,
            entity: PathEntity::Path(String::from(&**p)),
        },
        Value::PathPattern(p) => Permission::Filesystem {
            kind,
            entity: PathEntity::Pattern(String::from(&**p)),
        },
        Value::Url(u) => Permission::Http {
            kind,
            entity: HttpEntity::Url(String::from(&**u)),
        },
        Value::UrlPattern(u) => Permission::Http {
            kind,
            entity: HttpEntity::UrlPattern(String::from(&**u)),
        },
        Value::Host(h) => Permission::Http {
            kind,
            entity: HttpEntity::Host(String::from(&**h)),
        },
        Value::HostPattern(h) => Permission::Http {
            kind,
            entity: HttpEntity::HostPattern(String::from(&**h)),
        },
        other => return Err(ManifestError::InvalidPermissionEntity(other.type_name())),
    })
}

/// `(command, subcommand chain)` pairs of a `commands` entry: a command name,
/// a list of names, or an object nesting subcommands under their command.
fn command_chains(value: &Value) -> Result<Vec<(String, Vec<String>)>, ManifestError> {
    fn walk(
        prefix: &[String],
        value: &Value,
        out: &mut Vec<Vec<String>>,
    ) -> Result<(), ManifestError> {
        match value {
            Value::Object(object) => {
                let entries = object.entries();
                if entries.is_empty() && !prefix.is_empty() {
                    out.push(prefix.to_vec());
                }
                for (name, nested) in entries {
                    let mut chain = prefix.to_vec();
                    chain.push(name);
                    walk(&chain, &nested, out)?;
                }
                Ok(())
            }
            Value::List(_) | Value::Tuple(_) => {
                for element in elements(value) {
                    walk(prefix, &element, out)?;
                }
                Ok(())
            }
            Value::Nil => {
                if !prefix.is_empty() {
                    out.push(prefix.to_vec());
                }
                Ok(())
            }
            other => {
                let name = other
                    .as_str()
                    .ok_or(ManifestError::InvalidPermissionEntity(other.type_name()))?;
                let mut chain = prefix.to_vec();
                chain.push(name.to_string());
                out.push(chain);
                Ok(())
            }
        }
    }

    let mut chains = Vec::new();
    walk(&[], value, &mut chains)?;
    Ok(chains
        .into_iter()
        .filter_map(|mut chain| {
            if chain.is_empty() {
                return None;
            }
            let name = chain.remove(0);
            Some((name, chain))
        })
        .collect())
}

#[cfg(test)]
mod tests;
