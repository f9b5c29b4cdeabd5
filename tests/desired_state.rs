use base64::prelude::*;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service};

use wordpress_operator::desired::{PLAN, PASSWORD_KEY};
use wordpress_operator::{generate, ChildKind, ChildObject, ObjectKey, Wordpress, WordpressSpec};

fn demo() -> Wordpress {
    let mut wp = Wordpress::new("demo", WordpressSpec::new("s3cr3t"));
    wp.metadata.namespace = Some("default".to_string());
    wp.metadata.uid = Some("4a7d2c1e-0000-4000-8000-000000000001".to_string());
    wp
}

fn secret(kind: ChildKind) -> Secret {
    match generate(&demo(), kind).object {
        ChildObject::Secret(s) => s,
        other => panic!("expected Secret, got {other:?}"),
    }
}

fn deployment(kind: ChildKind) -> Deployment {
    match generate(&demo(), kind).object {
        ChildObject::Deployment(d) => d,
        other => panic!("expected Deployment, got {other:?}"),
    }
}

fn service(kind: ChildKind) -> Service {
    match generate(&demo(), kind).object {
        ChildObject::Service(s) => s,
        other => panic!("expected Service, got {other:?}"),
    }
}

#[test]
fn plan_order_is_fixed() {
    let kinds: Vec<ChildKind> = PLAN.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChildKind::Credential,
            ChildKind::DatabaseWorkload,
            ChildKind::DatabaseExposure,
            ChildKind::AppWorkload,
            ChildKind::AppExposure,
        ]
    );
}

#[test]
fn generation_is_deterministic() {
    for (kind, _) in PLAN {
        let a = generate(&demo(), kind);
        let b = generate(&demo(), kind);
        assert_eq!(a, b);

        let a = match a.object {
            ChildObject::Secret(o) => serde_json::to_vec(&o),
            ChildObject::Deployment(o) => serde_json::to_vec(&o),
            ChildObject::Service(o) => serde_json::to_vec(&o),
        };
        let b = match b.object {
            ChildObject::Secret(o) => serde_json::to_vec(&o),
            ChildObject::Deployment(o) => serde_json::to_vec(&o),
            ChildObject::Service(o) => serde_json::to_vec(&o),
        };
        assert_eq!(a.unwrap(), b.unwrap(), "{kind}");
    }
}

#[test]
fn every_child_is_owned_and_labelled() {
    for (kind, _) in PLAN {
        let child = generate(&demo(), kind);
        assert_eq!(child.key.namespace, "default");
        assert_eq!(child.labels.get("app").map(String::as_str), Some("wordpress"));
        assert_eq!(
            child.labels.get("wordpress_cr").map(String::as_str),
            Some("demo")
        );

        let owner = &child.owner_ref;
        assert_eq!(owner.kind, "Wordpress");
        assert_eq!(owner.api_version, "example.com/v1");
        assert_eq!(owner.name, "demo");
        assert_eq!(owner.uid, "4a7d2c1e-0000-4000-8000-000000000001");
        assert_eq!(owner.controller, Some(true));
        assert_eq!(owner.block_owner_deletion, Some(true));
    }
}

#[test]
fn credential_carries_encoded_password() {
    let child = generate(&demo(), ChildKind::Credential);
    assert_eq!(child.key, ObjectKey::new("default", "demo"));
    assert!(child.labels.get("tier").is_none());

    let secret = secret(ChildKind::Credential);
    assert_eq!(secret.type_.as_deref(), Some("Opaque"));

    let wire = serde_json::to_value(&secret).unwrap();
    assert_eq!(
        wire["data"][PASSWORD_KEY],
        serde_json::Value::String(BASE64_STANDARD.encode("s3cr3t"))
    );
}

#[test]
fn database_workload_reads_password_from_secret() {
    let child = generate(&demo(), ChildKind::DatabaseWorkload);
    assert_eq!(child.key, ObjectKey::new("default", "demo-mysql"));
    assert_eq!(child.labels.get("tier").map(String::as_str), Some("mysql"));

    let spec = deployment(ChildKind::DatabaseWorkload).spec.unwrap();
    assert_eq!(spec.selector.match_labels.as_ref(), Some(child.labels.inner()));
    let pod = spec.template.spec.unwrap();
    assert_eq!(pod.containers.len(), 1);

    let container = &pod.containers[0];
    assert_eq!(container.image.as_deref(), Some("mysql:5.6"));
    let ports = container.ports.as_ref().unwrap();
    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0].container_port, 3306);

    let env = container.env.as_ref().unwrap();
    assert_eq!(env.len(), 1);
    assert_eq!(env[0].name, "MYSQL_ROOT_PASSWORD");
    assert!(env[0].value.is_none());
    let secret_ref = env[0]
        .value_from
        .as_ref()
        .and_then(|source| source.secret_key_ref.as_ref())
        .unwrap();
    assert_eq!(secret_ref.name, "demo");
    assert_eq!(secret_ref.key, "password");
}

#[test]
fn app_workload_points_at_database_service() {
    let child = generate(&demo(), ChildKind::AppWorkload);
    assert_eq!(child.key, ObjectKey::new("default", "demo-wordpress"));
    assert_eq!(child.labels.get("tier").map(String::as_str), Some("frontend"));

    let pod = deployment(ChildKind::AppWorkload)
        .spec
        .unwrap()
        .template
        .spec
        .unwrap();
    let container = &pod.containers[0];
    assert_eq!(container.image.as_deref(), Some("wordpress:4.8-apache"));
    assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);

    let env = container.env.as_ref().unwrap();
    let password = env
        .iter()
        .find(|e| e.name == "WORDPRESS_DB_PASSWORD")
        .and_then(|e| e.value_from.as_ref())
        .and_then(|source| source.secret_key_ref.as_ref())
        .unwrap();
    assert_eq!(password.name, "demo");
    assert_eq!(password.key, "password");

    let host = env.iter().find(|e| e.name == "WORDPRESS_DB_HOST").unwrap();
    assert_eq!(host.value.as_deref(), Some("demo-mysql"));
}

#[test]
fn exposures_select_their_tier() {
    let db = service(ChildKind::DatabaseExposure).spec.unwrap();
    assert_eq!(db.type_.as_deref(), Some("ClusterIP"));
    assert_eq!(db.ports.as_ref().unwrap()[0].port, 3306);
    assert_eq!(
        db.selector.as_ref().and_then(|s| s.get("tier")).map(String::as_str),
        Some("mysql")
    );

    let app = service(ChildKind::AppExposure).spec.unwrap();
    assert_eq!(app.type_.as_deref(), Some("LoadBalancer"));
    assert_eq!(app.ports.as_ref().unwrap()[0].port, 80);
    assert_eq!(
        app.selector.as_ref().and_then(|s| s.get("tier")).map(String::as_str),
        Some("frontend")
    );
    assert_eq!(
        app.selector.as_ref().and_then(|s| s.get("wordpress_cr")).map(String::as_str),
        Some("demo")
    );
}

#[test]
fn spec_debug_redacts_password() {
    let rendered = format!("{:?}", WordpressSpec::new("s3cr3t"));
    assert!(!rendered.contains("s3cr3t"));
}
