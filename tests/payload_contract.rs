//! Wire-contract tests for the public payload types.
//!
//! These exercise the JSON shapes exchanged with the containers API
//! end to end: spec serialization, response deserialization, and the
//! environment variable value union in all of its forms.

use std::collections::HashMap;

use serde_json::json;

use dtz_cloud::{
    EnvVariableValue, JobDetails, JobSpec, ScheduleType, ServiceDetails, ServiceLogin,
    ServiceSpec, normalize_image,
};

fn job_spec_with_env(env: HashMap<String, EnvVariableValue>) -> JobSpec {
    JobSpec {
        name: "test-job".to_string(),
        containerImage: normalize_image("nginx"),
        containerPullUser: Some("user".to_string()),
        containerPullPwd: Some("password".to_string()),
        scheduleType: ScheduleType::Relaxed,
        scheduleCron: Some("0 0 * * *".to_string()),
        scheduleRepeat: None,
        envVariables: Some(env),
    }
}

#[test]
fn job_create_request_matches_wire_contract() {
    let mut env = HashMap::new();
    env.insert("PORT".to_string(), EnvVariableValue::string("8080"));
    env.insert("ENV".to_string(), EnvVariableValue::string("test"));

    let value = serde_json::to_value(job_spec_with_env(env)).unwrap();

    assert_eq!(value["name"], json!("test-job"));
    assert_eq!(value["containerImage"], json!("nginx:latest"));
    assert_eq!(value["containerPullUser"], json!("user"));
    assert_eq!(value["containerPullPwd"], json!("password"));
    assert_eq!(value["scheduleType"], json!("relaxed"));
    assert_eq!(value["scheduleCron"], json!("0 0 * * *"));
    // Absent optionals must be omitted, not serialized as null.
    assert!(value.get("scheduleRepeat").is_none());
    // String values travel as bare strings.
    assert_eq!(value["envVariables"]["PORT"], json!("8080"));
    assert_eq!(value["envVariables"]["ENV"], json!("test"));
}

#[test]
fn job_request_round_trips_mixed_env_variables() {
    let mut env = HashMap::new();
    env.insert("LITERAL".to_string(), EnvVariableValue::string("value"));
    env.insert(
        "ENCRYPTED".to_string(),
        EnvVariableValue::encrypted("key-id", "ciphertext"),
    );
    env.insert("PLAIN".to_string(), EnvVariableValue::plain("secret"));

    let spec = job_spec_with_env(env.clone());
    let wire = serde_json::to_string(&spec).unwrap();
    let parsed: JobSpec = serde_json::from_str(&wire).unwrap();

    assert_eq!(parsed.envVariables.unwrap(), env);
}

#[test]
fn job_response_decodes_all_env_variable_shapes() {
    let details: JobDetails = serde_json::from_value(json!({
        "id": "job-1",
        "name": "test-job",
        "containerImage": "nginx:alpine",
        "containerPullUser": null,
        "containerPullPwd": null,
        "scheduleType": "precise",
        "scheduleRepeat": null,
        "scheduleCron": "0 0 * * *",
        "envVariables": {
            "PORT": "8080",
            "DB_PASSWORD": {"encryptionKey": "key-1", "encryptedValue": "deadbeef"},
            "API_TOKEN": {"plainValue": "secret"},
            "OVERSPECIFIED": {
                "string": "literal",
                "encryptionKey": "key-2",
                "encryptedValue": "cafe",
                "plainValue": "extra",
            },
        },
    }))
    .unwrap();

    assert_eq!(details.id, "job-1");
    assert_eq!(details.scheduleType, ScheduleType::Precise);

    let env = details.envVariables.unwrap();
    assert_eq!(env["PORT"], EnvVariableValue::string("8080"));
    assert_eq!(
        env["DB_PASSWORD"],
        EnvVariableValue::encrypted("key-1", "deadbeef")
    );
    assert_eq!(env["API_TOKEN"], EnvVariableValue::plain("secret"));
    assert_eq!(
        env["OVERSPECIFIED"],
        EnvVariableValue {
            string_value: Some("literal".to_string()),
            encryption_key: Some("key-2".to_string()),
            encrypted_value: Some("cafe".to_string()),
            plain_value: Some("extra".to_string()),
        }
    );
}

#[test]
fn job_response_rejects_malformed_env_variable() {
    let result = serde_json::from_value::<JobDetails>(json!({
        "id": "job-1",
        "name": "test-job",
        "containerImage": "nginx:alpine",
        "containerPullUser": null,
        "containerPullPwd": null,
        "scheduleType": "none",
        "scheduleRepeat": null,
        "scheduleCron": null,
        "envVariables": {"BROKEN": {"unknownField": "x"}},
    }));

    let error = result.unwrap_err().to_string();
    assert!(
        error.contains("unrecognized environment variable value format"),
        "unexpected error: {error}"
    );
}

#[test]
fn service_create_request_matches_wire_contract() {
    let mut env = HashMap::new();
    env.insert(
        "SESSION_KEY".to_string(),
        EnvVariableValue::encrypted("key-1", "ciphertext"),
    );

    let spec = ServiceSpec {
        prefix: "/app".to_string(),
        containerImage: normalize_image("cr.dtz.rocks:3214/image-name"),
        containerImageVersion: None,
        containerPullUser: None,
        containerPullPwd: None,
        envVariables: Some(env),
        login: Some(ServiceLogin {
            providerName: "dtz".to_string(),
        }),
    };

    let value = serde_json::to_value(spec).unwrap();
    assert_eq!(value["prefix"], json!("/app"));
    assert_eq!(
        value["containerImage"],
        json!("cr.dtz.rocks:3214/image-name:latest")
    );
    assert!(value.get("containerImageVersion").is_none());
    assert_eq!(
        value["envVariables"]["SESSION_KEY"],
        json!({"encryptionKey": "key-1", "encryptedValue": "ciphertext"})
    );
    assert_eq!(value["login"], json!({"providerName": "dtz"}));
}

#[test]
fn service_response_decodes_wire_shape() {
    let details: ServiceDetails = serde_json::from_value(json!({
        "contextId": "ctx-1",
        "serviceId": "svc-1",
        "created": "2024-01-01T00:00:00Z",
        "prefix": "/app",
        "containerImage": "cr.dtz.rocks:3214/image-name:v1.0",
        "containerImageVersion": null,
        "containerPullUser": null,
        "containerPullPwd": null,
        "envVariables": {"MODE": "production"},
        "login": {"providerName": "dtz"},
    }))
    .unwrap();

    assert_eq!(details.serviceId, "svc-1");
    assert_eq!(details.contextId, "ctx-1");
    assert_eq!(
        details.envVariables.unwrap()["MODE"],
        EnvVariableValue::string("production")
    );
    assert_eq!(details.login.unwrap().providerName, "dtz");
}

#[test]
fn service_response_tolerates_missing_optional_sections() {
    let details: ServiceDetails = serde_json::from_value(json!({
        "contextId": "ctx-1",
        "serviceId": "svc-2",
        "created": "2024-01-01T00:00:00Z",
        "prefix": "/",
        "containerImage": "nginx:latest",
        "containerImageVersion": null,
        "containerPullUser": null,
        "containerPullPwd": null,
        "login": null,
    }))
    .unwrap();

    assert!(details.envVariables.is_none());
    assert!(details.login.is_none());
}
