//! Template selection and context reshaping.
//!
//! A task payload is dispatched on its `type` and sub-kind field to one
//! template, and its fields are reshaped into the template's input mapping.

use crate::reverse::{ReverseResolver, RunbookActionMap, ref_expr};
use crate::script::{ScriptSink, escape_script};
use crate::template::{SubKind, TemplateContext, TemplateId};
use blueprint_core::{
    BlueprintError, BlueprintResult, ExpectedStatus, HeaderType, HttpMethod, Payload, Pointer,
    SchemaKind, ScalingType, ScriptType, TaskKind, correct_identifier,
};
use blueprint_schema::builtin::{DEFAULT_CONNECTION_TIMEOUT, DEFAULT_CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::str::FromStr;
use tracing::debug;

/// Chosen template and its input
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Template to render
    pub template: TemplateId,
    /// Reshaped input mapping
    pub context: TemplateContext,
}

#[derive(Deserialize)]
struct ScriptAttrs {
    script_type: String,
    #[serde(default)]
    script: String,
    #[serde(default)]
    eval_variables: Vec<String>,
}

#[derive(Deserialize)]
struct DelayAttrs {
    #[serde(default)]
    interval_secs: u64,
}

#[derive(Deserialize)]
struct ScalingAttrs {
    scaling_type: String,
    #[serde(default = "default_scaling_count")]
    scaling_count: Value,
}

/// Only an absent count defaults; an explicit null stays null
fn default_scaling_count() -> Value {
    json!(1)
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn default_connection_timeout() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT
}

fn default_one() -> u64 {
    1
}

#[derive(Deserialize)]
struct HttpAttrs {
    method: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    request_body: Option<Value>,
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(default = "default_connection_timeout")]
    connection_timeout: u64,
    #[serde(default = "default_one")]
    retry_count: u64,
    #[serde(default = "default_one")]
    retry_interval: u64,
    #[serde(default)]
    tls_verify: bool,
    #[serde(default)]
    headers: Vec<HeaderEntry>,
    #[serde(default)]
    expected_response_params: Vec<StatusEntry>,
    #[serde(default)]
    response_paths: Map<String, Value>,
}

#[derive(Deserialize)]
struct HeaderEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct StatusEntry {
    code: Value,
    status: String,
}

#[derive(Deserialize)]
struct RunbookAttrs {
    runbook_reference: Pointer,
}

/// Truthiness of a JSON value: null, false, zero, and empty values are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Selects templates for task payloads
pub struct TemplateSelector<'a> {
    reverse: &'a ReverseResolver,
    scripts: &'a dyn ScriptSink,
}

impl<'a> TemplateSelector<'a> {
    /// Selector over a reverse resolver and script sink
    #[must_use]
    pub fn new(reverse: &'a ReverseResolver, scripts: &'a dyn ScriptSink) -> Self {
        Self { reverse, scripts }
    }

    /// Select the template of a task payload and build its context
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::UnsupportedKind`] for an unknown kind or
    /// sub-kind, [`BlueprintError::UnresolvedRunbookAction`] for a runbook
    /// missing from the action map, [`BlueprintError::DanglingReference`] for
    /// an unknown credential, a schema violation for malformed fields, or a
    /// script write failure.
    pub fn select(&self, payload: &Payload, actions: &RunbookActionMap) -> BlueprintResult<Selection> {
        let kind = TaskKind::from_str(payload.kind().unwrap_or_default())?;
        let name = payload
            .name()
            .ok_or_else(|| BlueprintError::violation(&SchemaKind::Task(kind).tag(), "name", "missing task name"))?;
        let attrs = payload
            .get("attrs")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut context = TemplateContext::new();
        context.insert("name", name);

        if let Some(target) = payload
            .get("target_any_local_reference")
            .and_then(Pointer::from_value)
        {
            let identifier = self.reverse.reverse_resolve(&target, actions, name)?;
            context.insert("target", ref_expr(&identifier));
        }

        if let Some(cred) = attrs
            .get("login_credential_local_reference")
            .and_then(Pointer::from_value)
        {
            let var = self.reverse.reverse_resolve(&cred, actions, name)?;
            context.insert("cred", ref_expr(&var));
        }

        let template = match kind {
            TaskKind::Exec => self.exec(kind, attrs, &mut context)?,
            TaskKind::SetVariable => self.set_variable(kind, attrs, &mut context)?,
            TaskKind::Delay => {
                let attrs: DelayAttrs = parse_attrs(kind, attrs)?;
                context.insert("delay_seconds", attrs.interval_secs);
                TemplateId::Delay
            }
            TaskKind::Scaling => {
                let attrs: ScalingAttrs = parse_attrs(kind, attrs)?;
                if is_truthy(&attrs.scaling_count) {
                    context.insert("scaling_count", attrs.scaling_count);
                }
                let scaling = ScalingType::from_str(&attrs.scaling_type)?;
                template_for(kind, SubKind::Scaling(scaling))?
            }
            TaskKind::Http => self.http(kind, attrs, &mut context)?,
            TaskKind::CallRunbook => {
                context = self.call_runbook(payload, name, attrs, actions)?;
                TemplateId::CallRunbook
            }
        };

        debug!(task = name, kind = %kind, template = %template, "selected template");
        Ok(Selection { template, context })
    }

    fn exec(&self, kind: TaskKind, attrs: Value, context: &mut TemplateContext) -> BlueprintResult<TemplateId> {
        let attrs: ScriptAttrs = parse_attrs(kind, attrs)?;
        let script_type = ScriptType::from_str(&attrs.script_type)?;
        let template = template_for(kind, SubKind::Script(script_type))?;
        let filename = self
            .scripts
            .write_script(script_type, &escape_script(&attrs.script))?;
        context.insert("filename", filename);
        Ok(template)
    }

    fn set_variable(
        &self,
        kind: TaskKind,
        attrs: Value,
        context: &mut TemplateContext,
    ) -> BlueprintResult<TemplateId> {
        let attrs: ScriptAttrs = parse_attrs(kind, attrs)?;
        let script_type = ScriptType::from_str(&attrs.script_type)?;
        let template = template_for(kind, SubKind::Script(script_type))?;
        context.insert("script", escape_script(&attrs.script));
        if !attrs.eval_variables.is_empty() {
            context.insert("variables", attrs.eval_variables);
        }
        Ok(template)
    }

    fn http(&self, kind: TaskKind, attrs: Value, context: &mut TemplateContext) -> BlueprintResult<TemplateId> {
        let attrs: HttpAttrs = parse_attrs(kind, attrs)?;
        let method = HttpMethod::from_str(&attrs.method)?;
        let template = template_for(kind, SubKind::Method(method))?;

        let mut headers = Map::new();
        let mut secret_headers = Map::new();
        for (i, header) in attrs.headers.into_iter().enumerate() {
            let target = match HeaderType::parse(&header.kind) {
                Some(HeaderType::Local) => &mut headers,
                Some(HeaderType::Secret) => &mut secret_headers,
                None => {
                    return Err(BlueprintError::violation(
                        &SchemaKind::Task(kind).tag(),
                        &format!("attrs.headers[{}].type", i),
                        format!("expected one of {}", HeaderType::wire_values().join(", ")),
                    ));
                }
            };
            target.insert(header.name, Value::String(header.value));
        }

        let mut status_mapping = Map::new();
        for status in attrs.expected_response_params {
            let code = match status.code {
                Value::String(code) => code,
                other => other.to_string(),
            };
            let success = status.status == ExpectedStatus::Success.as_str();
            status_mapping.insert(code, Value::Bool(success));
        }

        let request_body = match (method, attrs.request_body) {
            (HttpMethod::Delete, body) if !body.as_ref().is_some_and(is_truthy) => Some(json!({})),
            (_, body) => body,
        };

        context.insert("url", attrs.url);
        if let Some(body) = request_body {
            context.insert("request_body", body);
        }
        context.insert("content_type", attrs.content_type);
        context.insert("connection_timeout", attrs.connection_timeout);
        context.insert("retry_count", attrs.retry_count);
        context.insert("retry_interval", attrs.retry_interval);
        context.insert("tls_verify", attrs.tls_verify);
        context.insert("headers", headers);
        context.insert("secret_headers", secret_headers);
        context.insert("status_mapping", status_mapping);
        context.insert("response_paths", attrs.response_paths);
        Ok(template)
    }

    fn call_runbook(
        &self,
        payload: &Payload,
        name: &str,
        attrs: Value,
        actions: &RunbookActionMap,
    ) -> BlueprintResult<TemplateContext> {
        let kind = TaskKind::CallRunbook;
        let attrs: RunbookAttrs = parse_attrs(kind, attrs)?;
        let action = self
            .reverse
            .reverse_resolve(&attrs.runbook_reference, actions, name)?;
        let target = payload
            .get("target_any_local_reference")
            .and_then(Pointer::from_value)
            .ok_or_else(|| {
                BlueprintError::violation(
                    &SchemaKind::Task(kind).tag(),
                    "target_any_local_reference",
                    "runbook call needs a target",
                )
            })?;

        let mut context = TemplateContext::new();
        context.insert("name", name);
        context.insert("action", action);
        context.insert("target", correct_identifier(&target.name));
        Ok(context)
    }
}

fn parse_attrs<T: DeserializeOwned>(kind: TaskKind, attrs: Value) -> BlueprintResult<T> {
    serde_json::from_value(attrs)
        .map_err(|err| BlueprintError::violation(&SchemaKind::Task(kind).tag(), "attrs", err.to_string()))
}

fn template_for(kind: TaskKind, sub: SubKind) -> BlueprintResult<TemplateId> {
    TemplateId::for_task(kind, Some(sub)).ok_or_else(|| BlueprintError::UnsupportedKind {
        kind: format!("{} {}", kind, sub),
    })
}
