use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use otel_inject::{
    clean, consts::*, inject, EnablementContext, InstrumentationConfig, JavaToolOptionsPolicy,
    WorkloadMeta,
};
use serde_json::json;

fn user_pod() -> PodSpec {
    serde_json::from_value(json!({
        "initContainers": [{ "name": "migrate", "image": "flyway:10" }],
        "volumes": [{ "name": "config", "configMap": { "name": "checkout" } }],
        "containers": [
            {
                "name": "app",
                "image": "registry.local/checkout:1.4",
                "env": [{ "name": "PORT", "value": "8080" }],
                "volumeMounts": [{ "name": "config", "mountPath": "/etc/checkout" }]
            },
            { "name": "sidecar", "image": "envoy:1.30" }
        ]
    }))
    .unwrap()
}

fn full_config() -> InstrumentationConfig {
    InstrumentationConfig::new("ghcr.io/otel/javaagent:1.32", "http://collector:4317")
        .with_traces_sampler("parentbased_traceidratio")
        .with_traces_sampler_arg("0.25")
        .with_resource_attribute("team", "payments")
}

fn env(pod: &PodSpec, name: &str) -> Option<String> {
    pod.containers[0]
        .env
        .as_ref()?
        .iter()
        .find(|var| var.name == name)
        .and_then(|var| var.value.clone())
}

#[test]
fn test_inject_is_idempotent() {
    let annotations: BTreeMap<String, String> =
        vec![("otel.tracesSamplerArg".to_string(), "0.75".to_string())]
            .into_iter()
            .collect();
    let workload = WorkloadMeta::new("checkout", "billing").with_annotations(&annotations);
    let config = full_config();

    for start in [user_pod(), PodSpec::default()] {
        let mut pod = start;
        if pod.containers.is_empty() {
            pod.containers.push(Default::default());
        }
        inject(&workload, &mut pod, &config).unwrap();
        let once = pod.clone();
        inject(&workload, &mut pod, &config).unwrap();
        assert_eq!(pod, once);
    }
}

#[test]
fn test_clean_reverts_inject() {
    for policy in [
        JavaToolOptionsPolicy::LeaveExisting,
        JavaToolOptionsPolicy::AppendFlag,
    ] {
        let original = user_pod();
        let mut pod = original.clone();
        let config = full_config().with_java_tool_options(policy);

        inject(&WorkloadMeta::new("checkout", "billing"), &mut pod, &config).unwrap();
        assert_ne!(pod, original);

        assert!(clean(&mut pod));
        assert_eq!(pod, original);
    }
}

#[test]
fn test_clean_reverts_inject_on_bare_pod() {
    let original: PodSpec =
        serde_json::from_value(json!({ "containers": [{ "name": "app" }] })).unwrap();
    let mut pod = original.clone();

    inject(
        &WorkloadMeta::new("checkout", "billing"),
        &mut pod,
        &full_config(),
    )
    .unwrap();
    assert!(clean(&mut pod));
    assert_eq!(pod, original);
}

#[test]
fn test_clean_reverts_appended_java_flag() {
    let mut original = user_pod();
    let java_tool_options: EnvVar =
        serde_json::from_value(json!({ "name": "JAVA_TOOL_OPTIONS", "value": "-Xmx512m" }))
            .unwrap();
    original.containers[0]
        .env
        .as_mut()
        .unwrap()
        .push(java_tool_options);
    let mut pod = original.clone();
    let config = full_config().with_java_tool_options(JavaToolOptionsPolicy::AppendFlag);

    inject(&WorkloadMeta::new("checkout", "billing"), &mut pod, &config).unwrap();
    assert_eq!(
        env(&pod, ENV_JAVA_TOOL_OPTIONS).as_deref(),
        Some("-Xmx512m -javaagent:/otel-auto-instrumentation/javaagent.jar")
    );

    assert!(clean(&mut pod));
    assert_eq!(pod, original);
}

#[test]
fn test_clean_on_uninstrumented_pod() {
    let mut pod = user_pod();

    assert!(!clean(&mut pod));
    assert_eq!(pod, user_pod());
}

#[test]
fn test_enabled_workload_in_plain_namespace() {
    let workload_meta: ObjectMeta = serde_json::from_value(json!({
        "name": "checkout",
        "namespace": "billing",
        "labels": { LABEL_ENABLED: "true" }
    }))
    .unwrap();
    let namespace_meta: ObjectMeta = serde_json::from_value(json!({
        "name": "billing",
        "labels": { "team": "payments" }
    }))
    .unwrap();

    assert!(EnablementContext::new(&workload_meta, &namespace_meta).is_enabled(LABEL_ENABLED));

    let config = InstrumentationConfig::new("ghcr.io/otel/javaagent:1.32", "http://collector:4317");
    let mut pod = user_pod();
    inject(&WorkloadMeta::from_object_meta(&workload_meta), &mut pod, &config).unwrap();

    let init = pod.init_containers.as_ref().unwrap();
    assert_eq!(init.len(), 2);
    assert_eq!(init[1].name, INSTRUMENTATION_NAME);

    let volumes = pod.volumes.as_ref().unwrap();
    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[1].name, INSTRUMENTATION_NAME);

    let mounts = pod.containers[0].volume_mounts.as_ref().unwrap();
    assert_eq!(mounts[1].name, INSTRUMENTATION_NAME);
    assert_eq!(mounts[1].mount_path, MOUNT_PATH);

    assert_eq!(env(&pod, ENV_JAVA_TOOL_OPTIONS).as_deref(), Some(JAVAAGENT_FLAG));
    assert_eq!(
        env(&pod, ENV_OTEL_EXPORTER_OTLP_ENDPOINT).as_deref(),
        Some("http://collector:4317")
    );
    assert_eq!(env(&pod, ENV_OTEL_SERVICE_NAME).as_deref(), Some("checkout"));
    assert_eq!(env(&pod, ENV_OTEL_TRACES_SAMPLER), None);
    assert_eq!(env(&pod, ENV_OTEL_TRACES_SAMPLER_ARG), None);
    assert_eq!(pod.containers[0].env.as_ref().unwrap().len(), 4);

    assert!(pod.containers[1].env.is_none());
}

fn with_java_tool_options(java_tool_options: serde_json::Value) -> PodSpec {
    let mut pod = user_pod();
    let var: EnvVar = serde_json::from_value(java_tool_options).unwrap();
    pod.containers[0].env.as_mut().unwrap().push(var);
    pod
}

#[test]
fn test_clean_reverts_inject_with_user_java_flags() {
    let original =
        with_java_tool_options(json!({ "name": "JAVA_TOOL_OPTIONS", "value": "-Xmx512m" }));
    let mut pod = original.clone();

    inject(&WorkloadMeta::new("checkout", "billing"), &mut pod, &full_config()).unwrap();
    assert_eq!(env(&pod, ENV_JAVA_TOOL_OPTIONS).as_deref(), Some("-Xmx512m"));

    assert!(clean(&mut pod));
    assert_eq!(pod, original);
}

#[test]
fn test_clean_reverts_inject_with_java_options_from_config_map() {
    let original = with_java_tool_options(json!({
        "name": "JAVA_TOOL_OPTIONS",
        "valueFrom": { "configMapKeyRef": { "name": "jvm", "key": "opts" } }
    }));

    for policy in [
        JavaToolOptionsPolicy::LeaveExisting,
        JavaToolOptionsPolicy::AppendFlag,
    ] {
        let mut pod = original.clone();
        let config = full_config().with_java_tool_options(policy);

        inject(&WorkloadMeta::new("checkout", "billing"), &mut pod, &config).unwrap();
        assert!(clean(&mut pod));
        assert_eq!(pod, original);
    }
}
