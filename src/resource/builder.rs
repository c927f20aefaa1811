// src/resource/builder.rs

//! Pure construction of the runtime Deployment and Service.

use super::descriptor::{
    ClaimSource, Container, ContainerPort, DeploymentDescriptor, DeploymentSpec, EmptyDirSource,
    LabelSelectorSpec, ObjectMeta, PodSpec, PodTemplateSpec, SecurityContext, ServiceDescriptor,
    ServicePort, ServiceSpec, TemplateMeta, Volume, VolumeMount,
};
use super::spec::RuntimeTaskSpec;

const VOLUME_NAME: &str = "idp-volume";

fn metadata(spec: &RuntimeTaskSpec) -> ObjectMeta {
    ObjectMeta {
        name: spec.name.clone(),
        namespace: spec.namespace.clone(),
        labels: spec.labels.clone(),
    }
}

fn port_name(port: u16) -> String {
    format!("port-{port}")
}

/// Single-replica Deployment running the runtime container.
///
/// The workspace volume comes from the storage claim when one was resolved,
/// and from an `emptyDir` otherwise.
pub fn build_deployment(spec: &RuntimeTaskSpec) -> DeploymentDescriptor {
    let volume = match &spec.claim_name {
        Some(claim) => Volume {
            name: VOLUME_NAME.to_string(),
            persistent_volume_claim: Some(ClaimSource {
                claim_name: claim.clone(),
            }),
            empty_dir: None,
        },
        None => Volume {
            name: VOLUME_NAME.to_string(),
            persistent_volume_claim: None,
            empty_dir: Some(EmptyDirSource::default()),
        },
    };

    let sub_path = match (&spec.claim_name, spec.sub_path.is_empty()) {
        (Some(_), false) => Some(spec.sub_path.clone()),
        _ => None,
    };

    let container = Container {
        name: spec.container_name.clone(),
        image: spec.image.clone(),
        image_pull_policy: "Always",
        ports: spec
            .ports
            .iter()
            .map(|&p| ContainerPort {
                name: port_name(p),
                container_port: p,
            })
            .collect(),
        security_context: SecurityContext {
            privileged: spec.privileged,
        },
        volume_mounts: vec![VolumeMount {
            name: VOLUME_NAME.to_string(),
            mount_path: spec.mount_path.clone(),
            sub_path,
        }],
    };

    DeploymentDescriptor {
        api_version: "apps/v1",
        kind: "Deployment",
        metadata: metadata(spec),
        spec: DeploymentSpec {
            replicas: 1,
            selector: LabelSelectorSpec {
                match_labels: spec.selector().labels().clone(),
            },
            template: PodTemplateSpec {
                metadata: TemplateMeta {
                    labels: spec.labels.clone(),
                },
                spec: PodSpec {
                    service_account_name: spec.service_account.clone(),
                    containers: vec![container],
                    volumes: vec![volume],
                },
            },
        },
    }
}

/// Service routing to the runtime pods on every configured port.
pub fn build_service(spec: &RuntimeTaskSpec) -> ServiceDescriptor {
    ServiceDescriptor {
        api_version: "v1",
        kind: "Service",
        metadata: metadata(spec),
        spec: ServiceSpec {
            selector: spec.selector().labels().clone(),
            ports: spec
                .ports
                .iter()
                .map(|&p| ServicePort {
                    name: port_name(p),
                    port: p,
                    target_port: p,
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeSection;

    fn spec(claim: Option<&str>) -> RuntimeTaskSpec {
        let mut runtime = RuntimeSection::default();
        runtime.sub_path = "projects/myapp".into();
        RuntimeTaskSpec::new("MyApp", "dev", claim.map(str::to_string), &runtime)
    }

    #[test]
    fn deployment_is_single_privileged_replica() {
        let d = build_deployment(&spec(None));

        assert_eq!(d.metadata.name, "myapp-runtime");
        assert_eq!(d.metadata.namespace, "dev");
        assert_eq!(d.spec.replicas, 1);

        let c = &d.spec.template.spec.containers[0];
        assert_eq!(c.name, "runtime");
        assert!(c.security_context.privileged);
        assert_eq!(c.volume_mounts[0].mount_path, "/home/default/idp");
    }

    #[test]
    fn selectors_agree_across_descriptors() {
        let s = spec(None);
        let d = build_deployment(&s);
        let svc = build_service(&s);

        assert_eq!(d.spec.selector.match_labels, d.spec.template.metadata.labels);
        assert_eq!(svc.spec.selector, d.spec.selector.match_labels);
        assert_eq!(&svc.spec.selector, s.selector().labels());
    }

    #[test]
    fn without_claim_uses_empty_dir_and_ignores_sub_path() {
        let d = build_deployment(&spec(None));
        let vol = &d.spec.template.spec.volumes[0];
        assert!(vol.empty_dir.is_some());
        assert!(vol.persistent_volume_claim.is_none());
        assert_eq!(d.spec.template.spec.containers[0].volume_mounts[0].sub_path, None);
    }

    #[test]
    fn with_claim_mounts_claim_at_sub_path() {
        let d = build_deployment(&spec(Some("idp-pvc")));
        let vol = &d.spec.template.spec.volumes[0];
        assert_eq!(
            vol.persistent_volume_claim.as_ref().map(|c| c.claim_name.as_str()),
            Some("idp-pvc")
        );
        assert!(vol.empty_dir.is_none());
        assert_eq!(
            d.spec.template.spec.containers[0].volume_mounts[0].sub_path.as_deref(),
            Some("projects/myapp")
        );
    }

    #[test]
    fn building_twice_is_identical() {
        let s = spec(Some("idp-pvc"));
        assert_eq!(build_deployment(&s), build_deployment(&s));
        assert_eq!(build_service(&s), build_service(&s));
    }

    #[test]
    fn serializes_with_kubernetes_field_names() {
        let json = serde_json::to_value(build_deployment(&spec(None))).unwrap();
        assert_eq!(json["apiVersion"], "apps/v1");
        assert_eq!(json["kind"], "Deployment");
        assert_eq!(
            json["spec"]["selector"]["matchLabels"]["app"],
            "myapp-runtime-selector"
        );
        assert_eq!(
            json["spec"]["template"]["spec"]["containers"][0]["securityContext"]["privileged"],
            true
        );
        assert!(json["spec"]["template"]["spec"]["volumes"][0]["emptyDir"].is_object());

        let svc = serde_json::to_value(build_service(&spec(None))).unwrap();
        assert_eq!(svc["spec"]["ports"][0]["targetPort"], 9080);
    }
}
