//! Typed task authoring.
//!
//! [`Task`] is the source-level form of a task. It deserializes from JSON or
//! YAML with the task kind in a `type` field, and lowers to an
//! [`EntityDescriptor`] whose attributes use the wire field names.

use crate::entity::{AttrValue, EntityDescriptor};
use blueprint_core::{
    ExpectedStatus, HeaderType, HttpMethod, Reference, ScalingType, SchemaKind, ScriptType,
    TaskKind,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

/// A task as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task name
    pub name: String,
    /// Free text description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Kind-specific fields
    #[serde(flatten)]
    pub spec: TaskSpec,
    /// Target the task runs against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Reference>,
    /// Login credential of script tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred: Option<Reference>,
    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Retry count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u64>,
}

/// Kind-specific task fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSpec {
    /// Run a script
    Exec {
        /// Script language
        script_type: ScriptType,
        /// Script body
        script: String,
    },
    /// Run a script and capture variables
    SetVariable {
        /// Script language
        script_type: ScriptType,
        /// Script body
        script: String,
        /// Variables read from the script output
        #[serde(default)]
        eval_variables: Vec<String>,
    },
    /// Sleep
    Delay {
        /// Interval in seconds
        #[serde(default)]
        interval_secs: u64,
    },
    /// Scale out or in
    Scaling {
        /// Direction
        scaling_type: ScalingType,
        /// Replica count
        #[serde(default = "default_scaling_count")]
        scaling_count: u64,
    },
    /// HTTP request
    Http(HttpSpec),
    /// Call another runbook
    CallRunbook {
        /// Runbook to call
        runbook: Reference,
    },
}

fn default_scaling_count() -> u64 {
    1
}

fn local_header() -> HeaderType {
    HeaderType::Local
}

impl TaskSpec {
    /// Task kind
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Exec { .. } => TaskKind::Exec,
            Self::SetVariable { .. } => TaskKind::SetVariable,
            Self::Delay { .. } => TaskKind::Delay,
            Self::Scaling { .. } => TaskKind::Scaling,
            Self::Http(_) => TaskKind::Http,
            Self::CallRunbook { .. } => TaskKind::CallRunbook,
        }
    }
}

/// Fields of an HTTP task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSpec {
    /// Method
    pub method: HttpMethod,
    /// Request URL
    pub url: String,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Content type of the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Connection timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<u64>,
    /// Retry count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u64>,
    /// Seconds between retries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
    /// Verify the server certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_verify: Option<bool>,
    /// Request headers
    #[serde(default)]
    pub headers: Vec<HttpHeaderSpec>,
    /// Status codes and the outcome each maps to
    #[serde(default)]
    pub expected_response_params: Vec<ResponseCode>,
    /// Variables set from JSON paths of the response
    #[serde(default)]
    pub response_paths: IndexMap<String, String>,
}

/// One HTTP request header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeaderSpec {
    /// Header name
    pub name: String,
    /// Plain or secret
    #[serde(rename = "type", default = "local_header")]
    pub kind: HeaderType,
    /// Header value
    #[serde(default)]
    pub value: String,
}

/// Expected response code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCode {
    /// HTTP status code
    pub code: u16,
    /// Outcome the code maps to
    pub status: ExpectedStatus,
}

impl HttpSpec {
    /// Request with no headers or expectations
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            request_body: None,
            content_type: None,
            connection_timeout: None,
            retry_count: None,
            retry_interval: None,
            tls_verify: None,
            headers: Vec::new(),
            expected_response_params: Vec::new(),
            response_paths: IndexMap::new(),
        }
    }

    /// Set the request body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Set the content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str, kind: HeaderType) -> Self {
        self.headers.push(HttpHeaderSpec {
            name: name.to_string(),
            kind,
            value: value.to_string(),
        });
        self
    }

    /// Map a status code to an outcome
    #[must_use]
    pub fn with_status(mut self, code: u16, status: ExpectedStatus) -> Self {
        self.expected_response_params.push(ResponseCode { code, status });
        self
    }

    /// Capture a response field into a variable
    #[must_use]
    pub fn with_response_path(mut self, variable: &str, path: &str) -> Self {
        self.response_paths.insert(variable.to_string(), path.to_string());
        self
    }

    fn write_attrs(&self, entity: &mut EntityDescriptor) {
        entity.set("method", self.method.as_str());
        entity.set("url", self.url.as_str());
        if let Some(body) = &self.request_body {
            entity.set("request_body", body.clone());
        }
        if let Some(content_type) = &self.content_type {
            entity.set("content_type", content_type.as_str());
        }
        for (key, value) in [
            ("connection_timeout", self.connection_timeout),
            ("retry_count", self.retry_count),
            ("retry_interval", self.retry_interval),
        ] {
            if let Some(value) = value {
                entity.set(key, json!(value));
            }
        }
        if let Some(verify) = self.tls_verify {
            entity.set("tls_verify", json!(verify));
        }

        let headers = self
            .headers
            .iter()
            .map(|header| {
                EntityDescriptor::new(SchemaKind::HttpHeader, header.name.as_str())
                    .with_attr("type", header.kind.as_str())
                    .with_attr("value", header.value.as_str())
                    .into()
            })
            .collect::<Vec<AttrValue>>();
        entity.set("headers", headers);

        let statuses = self
            .expected_response_params
            .iter()
            .map(|expected| {
                EntityDescriptor::new(SchemaKind::ResponseStatus, expected.code.to_string())
                    .with_attr("code", json!(expected.code))
                    .with_attr("status", expected.status.as_str())
                    .into()
            })
            .collect::<Vec<AttrValue>>();
        entity.set("expected_response_params", statuses);

        entity.set("response_paths", json!(self.response_paths));
    }
}

impl Task {
    fn with_spec(name: impl Into<String>, spec: TaskSpec) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            spec,
            target: None,
            cred: None,
            timeout_secs: None,
            retries: None,
        }
    }

    /// Script task
    #[must_use]
    pub fn exec(name: impl Into<String>, script_type: ScriptType, script: impl Into<String>) -> Self {
        Self::with_spec(
            name,
            TaskSpec::Exec {
                script_type,
                script: script.into(),
            },
        )
    }

    /// Variable-setting script task
    #[must_use]
    pub fn set_variable(
        name: impl Into<String>,
        script_type: ScriptType,
        script: impl Into<String>,
        eval_variables: Vec<String>,
    ) -> Self {
        Self::with_spec(
            name,
            TaskSpec::SetVariable {
                script_type,
                script: script.into(),
                eval_variables,
            },
        )
    }

    /// Delay task
    #[must_use]
    pub fn delay(name: impl Into<String>, interval_secs: u64) -> Self {
        Self::with_spec(name, TaskSpec::Delay { interval_secs })
    }

    /// Scale-out task
    #[must_use]
    pub fn scale_out(name: impl Into<String>, count: u64) -> Self {
        Self::with_spec(
            name,
            TaskSpec::Scaling {
                scaling_type: ScalingType::ScaleOut,
                scaling_count: count,
            },
        )
    }

    /// Scale-in task
    #[must_use]
    pub fn scale_in(name: impl Into<String>, count: u64) -> Self {
        Self::with_spec(
            name,
            TaskSpec::Scaling {
                scaling_type: ScalingType::ScaleIn,
                scaling_count: count,
            },
        )
    }

    /// HTTP task
    #[must_use]
    pub fn http(name: impl Into<String>, spec: HttpSpec) -> Self {
        Self::with_spec(name, TaskSpec::Http(spec))
    }

    /// Runbook call against a target
    #[must_use]
    pub fn call_runbook(name: impl Into<String>, runbook: Reference, target: Reference) -> Self {
        Self::with_spec(name, TaskSpec::CallRunbook { runbook }).with_target(target)
    }

    /// Set the target
    #[must_use]
    pub fn with_target(mut self, target: Reference) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the login credential
    #[must_use]
    pub fn with_cred(mut self, cred: Reference) -> Self {
        self.cred = Some(cred);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the retry count
    #[must_use]
    pub fn with_retries(mut self, retries: u64) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Task kind
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.spec.kind()
    }

    /// Lower to an entity descriptor
    #[must_use]
    pub fn to_descriptor(&self) -> EntityDescriptor {
        let mut entity = EntityDescriptor::new(SchemaKind::Task(self.kind()), self.name.as_str())
            .with_description(self.description.as_str());

        let takes_cred = match &self.spec {
            TaskSpec::Exec {
                script_type,
                script,
            } => {
                entity.set("script_type", script_type.as_str());
                entity.set("script", script.as_str());
                true
            }
            TaskSpec::SetVariable {
                script_type,
                script,
                eval_variables,
            } => {
                entity.set("script_type", script_type.as_str());
                entity.set("script", script.as_str());
                entity.set("eval_variables", json!(eval_variables));
                true
            }
            TaskSpec::Delay { interval_secs } => {
                entity.set("interval_secs", json!(interval_secs));
                false
            }
            TaskSpec::Scaling {
                scaling_type,
                scaling_count,
            } => {
                entity.set("scaling_type", scaling_type.as_str());
                entity.set("scaling_count", json!(scaling_count));
                false
            }
            TaskSpec::Http(http) => {
                http.write_attrs(&mut entity);
                false
            }
            TaskSpec::CallRunbook { runbook } => {
                entity.set("runbook_reference", runbook.clone());
                false
            }
        };

        match &self.cred {
            Some(cred) if takes_cred => {
                entity.set("login_credential_local_reference", cred.clone());
            }
            Some(cred) => {
                warn!(task = %self.name, kind = %self.kind(), cred = %cred, "credential ignored for task kind");
            }
            None => {}
        }

        if let Some(target) = &self.target {
            entity.set("target_any_local_reference", target.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            entity.set("timeout_secs", json!(timeout));
        }
        if let Some(retries) = self.retries {
            entity.set("retries", json!(retries));
        }
        entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::resolver::ReferenceResolver;
    use blueprint_core::{BlueprintError, Payload, RefKind};

    fn compiler() -> Compiler {
        Compiler::standard().unwrap().with_resolver(
            ReferenceResolver::new()
                .with_declared(RefKind::Credential, "admin")
                .with_declared(RefKind::Service, "Web")
                .with_declared(RefKind::Runbook, "Cleanup"),
        )
    }

    fn compile(task: &Task) -> Payload {
        compiler().compile(&task.to_descriptor()).unwrap()
    }

    #[test]
    fn test_deserialize_exec_task() {
        let task: Task = serde_json::from_value(json!({
            "name": "install",
            "type": "EXEC",
            "script_type": "sh",
            "script": "echo hi",
            "target": {"kind": "app_service", "name": "Web"},
            "cred": {"kind": "app_credential", "name": "admin"}
        }))
        .unwrap();
        assert_eq!(
            task,
            Task::exec("install", ScriptType::Shell, "echo hi")
                .with_target(Reference::service("Web"))
                .with_cred(Reference::credential("admin"))
        );
    }

    #[test]
    fn test_deserialize_http_task() {
        let task: Task = serde_json::from_value(json!({
            "name": "ping",
            "type": "HTTP",
            "method": "GET",
            "url": "https://example.com",
            "headers": [{"name": "Accept", "value": "application/json"}],
            "expected_response_params": [{"code": 200, "status": "SUCCESS"}]
        }))
        .unwrap();
        let TaskSpec::Http(http) = &task.spec else {
            panic!("expected http spec");
        };
        assert_eq!(http.headers[0].kind, HeaderType::Local);
        assert_eq!(http.expected_response_params[0].status, ExpectedStatus::Success);
    }

    #[test]
    fn test_deserialize_rejects_unknown_kind() {
        let result: Result<Task, _> = serde_json::from_value(json!({"name": "x", "type": "FOO"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_exec_compiles_with_cred() {
        let payload = compile(
            &Task::exec("install", ScriptType::Shell, "echo hi")
                .with_cred(Reference::credential("admin"))
                .with_target(Reference::service("Web")),
        );
        assert_eq!(
            payload.pointer("attrs.login_credential_local_reference.name"),
            Some(&json!("admin"))
        );
        assert_eq!(payload.pointer("target_any_local_reference.kind"), Some(&json!("app_service")));
    }

    #[test]
    fn test_set_variable_compiles() {
        let payload = compile(&Task::set_variable(
            "read",
            ScriptType::Static,
            "print('x=1')",
            vec!["x".to_string()],
        ));
        assert_eq!(payload.kind(), Some("SET_VARIABLE"));
        assert_eq!(payload.pointer("attrs.eval_variables"), Some(&json!(["x"])));
    }

    #[test]
    fn test_delay_and_scaling() {
        let delay = compile(&Task::delay("wait", 30).with_timeout(60));
        assert_eq!(delay.pointer("attrs.interval_secs"), Some(&json!(30)));
        assert_eq!(delay.get("timeout_secs"), Some(&json!("60")));

        let scale = compile(&Task::scale_in("shrink", 2));
        assert_eq!(scale.pointer("attrs.scaling_type"), Some(&json!("SCALEIN")));
        assert_eq!(scale.pointer("attrs.scaling_count"), Some(&json!(2)));
    }

    #[test]
    fn test_http_compiles_with_defaults() {
        let spec = HttpSpec::new(HttpMethod::Post, "https://example.com/api")
            .with_body(json!({"a": 1}))
            .with_header("Accept", "application/json", HeaderType::Local)
            .with_header("Token", "s3cr3t", HeaderType::Secret)
            .with_status(200, ExpectedStatus::Success)
            .with_response_path("id", "$.id");
        let payload = compile(&Task::http("create", spec));
        assert_eq!(payload.pointer("attrs.content_type"), Some(&json!("application/json")));
        assert_eq!(payload.pointer("attrs.connection_timeout"), Some(&json!(120)));
        assert_eq!(payload.pointer("attrs.request_body"), Some(&json!({"a": 1})));
        assert_eq!(payload.pointer("attrs.response_paths"), Some(&json!({"id": "$.id"})));
        assert_eq!(
            payload.pointer("attrs.headers"),
            Some(&json!([
                {"name": "Accept", "type": "LOCAL", "value": "application/json"},
                {"name": "Token", "type": "SECRET", "value": "s3cr3t"}
            ]))
        );
    }

    #[test]
    fn test_call_runbook_compiles() {
        let payload = compile(&Task::call_runbook(
            "cleanup",
            Reference::runbook("Cleanup"),
            Reference::service("Web"),
        ));
        assert_eq!(
            payload.pointer("attrs.runbook_reference"),
            Some(&json!({"kind": "app_runbook", "name": "Cleanup"}))
        );
    }

    #[test]
    fn test_cred_is_ignored_for_delay() {
        let entity = Task::delay("wait", 1)
            .with_cred(Reference::credential("admin"))
            .to_descriptor();
        assert!(entity.get("login_credential_local_reference").is_none());
    }

    #[test]
    fn test_unknown_runbook_dangles() {
        let task = Task::call_runbook("c", Reference::runbook("Missing"), Reference::service("Web"));
        let err = compiler().compile(&task.to_descriptor()).unwrap_err();
        assert!(matches!(err, BlueprintError::DanglingReference { kind, .. } if kind == "app_runbook"));
    }
}
