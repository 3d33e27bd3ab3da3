use pretty_assertions::assert_eq;

use super::*;

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

#[test]
fn empty_manifest_grants_global_access_only() {
    let config = manifest_to_context_config(&object(vec![])).unwrap();
    assert_eq!(config.permissions, default_global_var_permissions());
    assert!(config.limits.is_empty());
}

#[test]
fn kinds_map_to_resources() {
    let listing = object(vec![
        (
            "read",
            object(vec![
                ("globals", Value::str("*")),
                ("", Value::list(vec![Value::path("/tmp/"), Value::host("https://example.com")])),
            ]),
        ),
        ("create", object(vec![("threads", object(vec![]))])),
    ]);
    let permissions = permissions_from_listing(&listing).unwrap();
    assert_eq!(
        permissions,
        vec![
            Permission::LThread {
                kind: PermissionKind::CREATE
            },
            Permission::Filesystem {
                kind: PermissionKind::READ,
                entity: PathEntity::Path("/tmp/".into()),
            },
            Permission::Http {
                kind: PermissionKind::READ,
                entity: HttpEntity::Host("https://example.com".into()),
            },
            Permission::global_var(PermissionKind::READ, "*"),
        ]
    );
}

#[test]
fn write_expands_to_create_update_delete() {
    let listing = object(vec![("write", Value::path_pattern("/tmp/..."))]);
    let kinds: Vec<PermissionKind> = permissions_from_listing(&listing)
        .unwrap()
        .iter()
        .map(Permission::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![PermissionKind::CREATE, PermissionKind::UPDATE, PermissionKind::DELETE]
    );
}

#[test]
fn commands_nest_subcommands() {
    let listing = object(vec![(
        "use",
        object(vec![(
            "commands",
            object(vec![("git", object(vec![("status", object(vec![]))])), ("ls", Value::Nil)]),
        )]),
    )]);
    let permissions = permissions_from_listing(&listing).unwrap();
    assert_eq!(
        permissions,
        vec![
            Permission::Command {
                name: "git".into(),
                subcommands: vec!["status".into()],
            },
            Permission::Command {
                name: "ls".into(),
                subcommands: vec![],
            },
        ]
    );
}

#[test]
fn unknown_kinds_and_types_are_rejected() {
    let bad_kind = object(vec![("fly", object(vec![]))]);
    assert_eq!(
        permissions_from_listing(&bad_kind).unwrap_err(),
        ManifestError::InvalidPermissionKind("fly".into())
    );
    let bad_type = object(vec![("read", object(vec![("planets", Value::str("*"))]))]);
    assert_eq!(
        permissions_from_listing(&bad_type).unwrap_err(),
        ManifestError::UnknownPermissionType("planets".into())
    );
}

#[test]
fn limits_take_their_kind_from_the_quantity() {
    let manifest = object(vec![(
        "limits",
        object(vec![
            ("fs/read", Value::ByteRate(1000)),
            ("http/requests", Value::SimpleRate(5)),
            ("objects", Value::int(100)),
        ]),
    )]);
    let config = manifest_to_context_config(&manifest).unwrap();
    let limits: Vec<(String, LimitKind, i64)> = config
        .limits
        .iter()
        .map(|limit| (limit.name.clone(), limit.kind, limit.value))
        .collect();
    assert_eq!(
        limits,
        vec![
            ("fs/read".to_string(), LimitKind::ByteRate, 1000),
            ("http/requests".to_string(), LimitKind::SimpleRate, 5),
            ("objects".to_string(), LimitKind::Total, 100),
        ]
    );
}

#[test]
fn non_object_manifests_are_rejected() {
    assert!(matches!(
        manifest_to_context_config(&Value::int(1)),
        Err(ManifestError::NotAnObject(_))
    ));
}
