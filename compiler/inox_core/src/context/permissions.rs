//! Permissions.
//!
//! A permission pairs a [`PermissionKind`] with a resource. A granted
//! permission covers a requested one when its kind bits include the
//! requested kind and its resource covers the requested resource (`*` for
//! names, glob or prefix patterns for paths, hosts and URLs).

use std::fmt;

use bitflags::bitflags;

use crate::errors::{EvalError, EvalErrorKind};
use crate::pattern::glob;

bitflags! {
    /// Operation kinds; `WRITE` is the union of create, update and delete.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PermissionKind: u8 {
        const READ = 1 << 0;
        const CREATE = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETE = 1 << 3;
        const USE = 1 << 4;
        const WRITE = Self::CREATE.bits() | Self::UPDATE.bits() | Self::DELETE.bits();
    }
}

impl PermissionKind {
    pub fn covers(self, other: PermissionKind) -> bool {
        self.contains(other)
    }

    /// Parses the manifest spelling (`read`, `write`, `create`, ...).
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Some(match name {
            "read" => Self::READ,
            "create" => Self::CREATE,
            "update" => Self::UPDATE,
            "delete" => Self::DELETE,
            "use" => Self::USE,
            "write" => Self::WRITE,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            k if k == Self::READ => "read",
            k if k == Self::CREATE => "create",
            k if k == Self::UPDATE => "update",
            k if k == Self::DELETE => "delete",
            k if k == Self::USE => "use",
            k if k == Self::WRITE => "write",
            _ => "mixed",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filesystem resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathEntity {
    Path(String),
    Pattern(String),
}

impl PathEntity {
    fn covers(&self, other: &PathEntity) -> bool {
        match (self, other) {
            (PathEntity::Path(a), PathEntity::Path(b)) => a == b,
            (PathEntity::Pattern(p), PathEntity::Path(path)) => glob::path_pattern_matches(p, path),
            (PathEntity::Pattern(p), PathEntity::Pattern(other)) => {
                glob::path_pattern_includes(p, other)
            }
            (PathEntity::Path(_), PathEntity::Pattern(_)) => false,
        }
    }
}

impl fmt::Display for PathEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathEntity::Path(s) | PathEntity::Pattern(s) => f.write_str(s),
        }
    }
}

/// Network resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HttpEntity {
    Url(String),
    UrlPattern(String),
    Host(String),
    HostPattern(String),
    Any,
}

impl HttpEntity {
    fn covers(&self, other: &HttpEntity) -> bool {
        match (self, other) {
            (HttpEntity::Any, _) => true,
            (_, HttpEntity::Any) => false,
            (HttpEntity::Url(a), HttpEntity::Url(b)) => {
                // A URL without a query covers the same URL with any query.
                if a.contains('?') {
                    a == b
                } else {
                    b.split('?').next() == Some(a.as_str())
                }
            }
            (HttpEntity::UrlPattern(p), HttpEntity::Url(u)) => glob::url_pattern_matches(p, u),
            (HttpEntity::UrlPattern(p), HttpEntity::UrlPattern(other)) => {
                p == other
                    || (glob::is_prefix_pattern(p) && glob::url_pattern_matches(p, other))
            }
            (HttpEntity::Host(h), HttpEntity::Host(other)) => h == other,
            (HttpEntity::Host(h), HttpEntity::Url(u) | HttpEntity::UrlPattern(u)) => {
                host_of_url(u).is_some_and(|host| host == *h)
            }
            (HttpEntity::HostPattern(p), HttpEntity::Host(h)) => glob::host_pattern_matches(p, h),
            (HttpEntity::HostPattern(p), HttpEntity::HostPattern(other)) => p == other,
            (HttpEntity::HostPattern(p), HttpEntity::Url(u)) => {
                host_of_url(u).is_some_and(|host| glob::host_pattern_matches(p, &host))
            }
            _ => false,
        }
    }
}

/// `scheme://host[:port]` of a URL.
fn host_of_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    })
}

impl fmt::Display for HttpEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpEntity::Url(s)
            | HttpEntity::UrlPattern(s)
            | HttpEntity::Host(s)
            | HttpEntity::HostPattern(s) => f.write_str(s),
            HttpEntity::Any => f.write_str("https://**:*"),
        }
    }
}

/// A permission: a kind applied to a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Access to a global variable; `"*"` names every global.
    GlobalVar { kind: PermissionKind, name: String },
    /// Creation of lthreads.
    LThread { kind: PermissionKind },
    Filesystem { kind: PermissionKind, entity: PathEntity },
    Http { kind: PermissionKind, entity: HttpEntity },
    /// Environment variable access; `"*"` names every variable.
    EnvVar { kind: PermissionKind, name: String },
    /// Execution of a command, optionally restricted to a subcommand chain.
    Command { name: String, subcommands: Vec<String> },
}

impl Permission {
    pub fn global_var(kind: PermissionKind, name: impl Into<String>) -> Self {
        Permission::GlobalVar {
            kind,
            name: name.into(),
        }
    }

    pub fn lthread_create() -> Self {
        Permission::LThread {
            kind: PermissionKind::CREATE,
        }
    }

    pub fn read_path(path: impl Into<String>) -> Self {
        Permission::Filesystem {
            kind: PermissionKind::READ,
            entity: PathEntity::Path(path.into()),
        }
    }

    pub fn kind(&self) -> PermissionKind {
        match self {
            Permission::GlobalVar { kind, .. }
            | Permission::LThread { kind }
            | Permission::Filesystem { kind, .. }
            | Permission::Http { kind, .. }
            | Permission::EnvVar { kind, .. } => *kind,
            Permission::Command { .. } => PermissionKind::USE,
        }
    }

    /// Whether holding `self` grants `other`.
    pub fn includes(&self, other: &Permission) -> bool {
        if !self.kind().covers(other.kind()) {
            return false;
        }
        match (self, other) {
            (
                Permission::GlobalVar { name, .. },
                Permission::GlobalVar {
                    name: other_name, ..
                },
            )
            | (
                Permission::EnvVar { name, .. },
                Permission::EnvVar {
                    name: other_name, ..
                },
            ) => name == "*" || name == other_name,
            (Permission::LThread { .. }, Permission::LThread { .. }) => true,
            (
                Permission::Filesystem { entity, .. },
                Permission::Filesystem {
                    entity: other_entity,
                    ..
                },
            ) => entity.covers(other_entity),
            (
                Permission::Http { entity, .. },
                Permission::Http {
                    entity: other_entity,
                    ..
                },
            ) => entity.covers(other_entity),
            (
                Permission::Command { name, subcommands },
                Permission::Command {
                    name: other_name,
                    subcommands: other_subcommands,
                },
            ) => {
                let name_covered = if glob::is_glob(name) || glob::is_prefix_pattern(name) {
                    glob::path_pattern_matches(name, other_name)
                } else {
                    name == other_name
                };
                name_covered && subcommands == other_subcommands
            }
            _ => false,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::GlobalVar { kind, name } => write!(f, "[{kind} global(s) '{name}']"),
            Permission::LThread { kind } => write!(f, "[{kind} threads]"),
            Permission::Filesystem { kind, entity } => write!(f, "[{kind} path(s) {entity}]"),
            Permission::Http { kind, entity } => write!(f, "[{kind} {entity}]"),
            Permission::EnvVar { kind, name } => write!(f, "[{kind} env '{name}']"),
            Permission::Command { name, subcommands } => {
                write!(f, "[exec command:{name}")?;
                if subcommands.is_empty() {
                    f.write_str(" <no subcommand>")?;
                }
                for subcommand in subcommands {
                    write!(f, " {subcommand}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Permission failures outside of a privileged call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("not allowed, missing permission: {0}")]
    NotAllowed(Permission),
    /// A child context asked for a permission its parent does not hold.
    #[error("cannot grant {0} to a child context: the parent does not hold it")]
    NotHeldByParent(Permission),
}

impl From<PermissionError> for EvalError {
    fn from(error: PermissionError) -> Self {
        let permission = match &error {
            PermissionError::NotAllowed(p) | PermissionError::NotHeldByParent(p) => p.to_string(),
        };
        let mut eval_error = EvalError::from_kind(EvalErrorKind::PermissionDenied { permission });
        eval_error.message = error.to_string();
        eval_error
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn write_covers_its_parts() {
        assert!(PermissionKind::WRITE.covers(PermissionKind::CREATE));
        assert!(PermissionKind::WRITE.covers(PermissionKind::DELETE));
        assert!(!PermissionKind::WRITE.covers(PermissionKind::READ));
        assert_eq!(PermissionKind::from_manifest_name("write"), Some(PermissionKind::WRITE));
    }

    #[test]
    fn global_wildcard() {
        let any = Permission::global_var(PermissionKind::READ, "*");
        assert!(any.includes(&Permission::global_var(PermissionKind::READ, "x")));
        assert!(!any.includes(&Permission::global_var(PermissionKind::UPDATE, "x")));
        let named = Permission::global_var(PermissionKind::READ, "x");
        assert!(!named.includes(&Permission::global_var(PermissionKind::READ, "y")));
    }

    #[test]
    fn filesystem_patterns() {
        let home = Permission::Filesystem {
            kind: PermissionKind::READ,
            entity: PathEntity::Pattern("/home/...".into()),
        };
        assert!(home.includes(&Permission::read_path("/home/user/notes.txt")));
        assert!(!home.includes(&Permission::read_path("/etc/passwd")));
        assert!(!Permission::read_path("/a").includes(&Permission::Filesystem {
            kind: PermissionKind::READ,
            entity: PathEntity::Pattern("/...".into()),
        }));
    }

    #[test]
    fn http_hosts_cover_their_urls() {
        let host = Permission::Http {
            kind: PermissionKind::READ,
            entity: HttpEntity::Host("https://example.com".into()),
        };
        let url = Permission::Http {
            kind: PermissionKind::READ,
            entity: HttpEntity::Url("https://example.com/index.html".into()),
        };
        assert!(host.includes(&url));

        let bare_url = Permission::Http {
            kind: PermissionKind::READ,
            entity: HttpEntity::Url("https://example.com/a".into()),
        };
        let with_query = Permission::Http {
            kind: PermissionKind::READ,
            entity: HttpEntity::Url("https://example.com/a?x=1".into()),
        };
        assert!(bare_url.includes(&with_query));
        assert!(!with_query.includes(&bare_url));
    }

    #[test]
    fn commands_compare_subcommands() {
        let git = Permission::Command {
            name: "git".into(),
            subcommands: vec!["status".into()],
        };
        assert!(git.includes(&git.clone()));
        assert!(!git.includes(&Permission::Command {
            name: "git".into(),
            subcommands: vec![],
        }));
    }

    #[test]
    fn display() {
        assert_eq!(
            Permission::global_var(PermissionKind::READ, "x").to_string(),
            "[read global(s) 'x']"
        );
        assert_eq!(Permission::lthread_create().to_string(), "[create threads]");
    }

    #[test]
    fn converts_into_permission_denied() {
        let error: EvalError = PermissionError::NotAllowed(Permission::lthread_create()).into();
        assert!(matches!(error.kind, EvalErrorKind::PermissionDenied { .. }));
        assert_eq!(error.message, "not allowed, missing permission: [create threads]");
    }
}
