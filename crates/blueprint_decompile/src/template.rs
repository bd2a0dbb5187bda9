//! Template identifiers and the embedded renderer.
//!
//! Every (task kind, sub-kind) pair maps to exactly one [`TemplateId`]. The
//! default renderer embeds the template sources and renders them with
//! minijinja.

use blueprint_core::{BlueprintError, BlueprintResult, HttpMethod, ScalingType, ScriptType, TaskKind};
use indexmap::IndexMap;
use minijinja::{Environment, Error, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Secondary discriminator of a task kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKind {
    /// Script language of script tasks
    Script(ScriptType),
    /// Direction of scaling tasks
    Scaling(ScalingType),
    /// Method of HTTP tasks
    Method(HttpMethod),
}

impl SubKind {
    /// Every sub-kind a task kind dispatches on, or `[None]` if it has none
    #[must_use]
    pub fn variants_of(kind: TaskKind) -> Vec<Option<SubKind>> {
        match kind {
            TaskKind::Exec | TaskKind::SetVariable => ScriptType::ALL
                .iter()
                .map(|s| Some(Self::Script(*s)))
                .collect(),
            TaskKind::Scaling => ScalingType::ALL
                .iter()
                .map(|s| Some(Self::Scaling(*s)))
                .collect(),
            TaskKind::Http => HttpMethod::ALL
                .iter()
                .map(|m| Some(Self::Method(*m)))
                .collect(),
            TaskKind::Delay | TaskKind::CallRunbook => vec![None],
        }
    }
}

impl fmt::Display for SubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(s) => s.fmt(f),
            Self::Scaling(s) => s.fmt(f),
            Self::Method(m) => m.fmt(f),
        }
    }
}

/// Rendering template of one task variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TemplateId {
    ExecShell,
    ExecEscript,
    ExecPowerShell,
    SetVariableShell,
    SetVariableEscript,
    SetVariablePowerShell,
    Delay,
    ScaleOut,
    ScaleIn,
    HttpGet,
    HttpPost,
    HttpPut,
    HttpDelete,
    CallRunbook,
}

/// Templates included by others, never selected directly
const PARTIALS: &[(&str, &str)] = &[
    ("_binding.jinja", include_str!("../templates/_binding.jinja")),
    ("_http.jinja", include_str!("../templates/_http.jinja")),
];

impl TemplateId {
    /// Every template
    pub const ALL: [TemplateId; 14] = [
        TemplateId::ExecShell,
        TemplateId::ExecEscript,
        TemplateId::ExecPowerShell,
        TemplateId::SetVariableShell,
        TemplateId::SetVariableEscript,
        TemplateId::SetVariablePowerShell,
        TemplateId::Delay,
        TemplateId::ScaleOut,
        TemplateId::ScaleIn,
        TemplateId::HttpGet,
        TemplateId::HttpPost,
        TemplateId::HttpPut,
        TemplateId::HttpDelete,
        TemplateId::CallRunbook,
    ];

    /// Template for a task kind and sub-kind, if the pair is valid
    #[must_use]
    pub fn for_task(kind: TaskKind, sub: Option<SubKind>) -> Option<Self> {
        use SubKind::{Method, Scaling, Script};
        let id = match (kind, sub) {
            (TaskKind::Exec, Some(Script(ScriptType::Shell))) => Self::ExecShell,
            (TaskKind::Exec, Some(Script(ScriptType::Static))) => Self::ExecEscript,
            (TaskKind::Exec, Some(Script(ScriptType::PowerShell))) => Self::ExecPowerShell,
            (TaskKind::SetVariable, Some(Script(ScriptType::Shell))) => Self::SetVariableShell,
            (TaskKind::SetVariable, Some(Script(ScriptType::Static))) => Self::SetVariableEscript,
            (TaskKind::SetVariable, Some(Script(ScriptType::PowerShell))) => {
                Self::SetVariablePowerShell
            }
            (TaskKind::Delay, None) => Self::Delay,
            (TaskKind::Scaling, Some(Scaling(ScalingType::ScaleOut))) => Self::ScaleOut,
            (TaskKind::Scaling, Some(Scaling(ScalingType::ScaleIn))) => Self::ScaleIn,
            (TaskKind::Http, Some(Method(HttpMethod::Get))) => Self::HttpGet,
            (TaskKind::Http, Some(Method(HttpMethod::Post))) => Self::HttpPost,
            (TaskKind::Http, Some(Method(HttpMethod::Put))) => Self::HttpPut,
            (TaskKind::Http, Some(Method(HttpMethod::Delete))) => Self::HttpDelete,
            (TaskKind::CallRunbook, None) => Self::CallRunbook,
            _ => return None,
        };
        Some(id)
    }

    /// Template name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExecShell => "exec_shell.jinja",
            Self::ExecEscript => "exec_escript.jinja",
            Self::ExecPowerShell => "exec_powershell.jinja",
            Self::SetVariableShell => "set_variable_shell.jinja",
            Self::SetVariableEscript => "set_variable_escript.jinja",
            Self::SetVariablePowerShell => "set_variable_powershell.jinja",
            Self::Delay => "delay.jinja",
            Self::ScaleOut => "scale_out.jinja",
            Self::ScaleIn => "scale_in.jinja",
            Self::HttpGet => "http_get.jinja",
            Self::HttpPost => "http_post.jinja",
            Self::HttpPut => "http_put.jinja",
            Self::HttpDelete => "http_delete.jinja",
            Self::CallRunbook => "call_runbook.jinja",
        }
    }

    /// Embedded template source
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::ExecShell => include_str!("../templates/exec_shell.jinja"),
            Self::ExecEscript => include_str!("../templates/exec_escript.jinja"),
            Self::ExecPowerShell => include_str!("../templates/exec_powershell.jinja"),
            Self::SetVariableShell => include_str!("../templates/set_variable_shell.jinja"),
            Self::SetVariableEscript => include_str!("../templates/set_variable_escript.jinja"),
            Self::SetVariablePowerShell => {
                include_str!("../templates/set_variable_powershell.jinja")
            }
            Self::Delay => include_str!("../templates/delay.jinja"),
            Self::ScaleOut => include_str!("../templates/scale_out.jinja"),
            Self::ScaleIn => include_str!("../templates/scale_in.jinja"),
            Self::HttpGet => include_str!("../templates/http_get.jinja"),
            Self::HttpPost => include_str!("../templates/http_post.jinja"),
            Self::HttpPut => include_str!("../templates/http_put.jinja"),
            Self::HttpDelete => include_str!("../templates/http_delete.jinja"),
            Self::CallRunbook => include_str!("../templates/call_runbook.jinja"),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input mapping of a template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext(IndexMap<String, Value>);

impl TemplateContext {
    /// Empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Get a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a text key
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Whether a key is set
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Renders a template with a context
pub trait TemplateRenderer {
    /// Whether the renderer has a template for the id
    fn supports(&self, template: TemplateId) -> bool;

    /// Render a template
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Render`] if rendering fails
    fn render(&self, template: TemplateId, context: &TemplateContext) -> BlueprintResult<String>;
}

/// Renderer over the embedded templates
#[derive(Debug)]
pub struct EmbeddedTemplates {
    env: Environment<'static>,
}

/// Render a value as a source literal
fn literal(value: minijinja::Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|err| Error::new(ErrorKind::InvalidOperation, err.to_string()))
}

fn render_error(template: &str, err: &Error) -> BlueprintError {
    BlueprintError::Render {
        template: template.to_string(),
        message: err.to_string(),
    }
}

impl EmbeddedTemplates {
    /// Load every embedded template
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Render`] if a template fails to parse
    pub fn new() -> BlueprintResult<Self> {
        let mut env = Environment::new();
        env.add_filter("literal", literal);
        for &(name, source) in PARTIALS {
            env.add_template(name, source)
                .map_err(|err| render_error(name, &err))?;
        }
        for id in TemplateId::ALL {
            env.add_template(id.name(), id.source())
                .map_err(|err| render_error(id.name(), &err))?;
        }
        Ok(Self { env })
    }
}

impl TemplateRenderer for EmbeddedTemplates {
    fn supports(&self, template: TemplateId) -> bool {
        self.env.get_template(template.name()).is_ok()
    }

    fn render(&self, template: TemplateId, context: &TemplateContext) -> BlueprintResult<String> {
        let tmpl = self
            .env
            .get_template(template.name())
            .map_err(|err| render_error(template.name(), &err))?;
        tmpl.render(context)
            .map_err(|err| render_error(template.name(), &err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_valid_pair_has_a_template() {
        for kind in TaskKind::ALL {
            for sub in SubKind::variants_of(*kind) {
                assert!(TemplateId::for_task(*kind, sub).is_some(), "{kind} {sub:?}");
            }
        }
    }

    #[test]
    fn test_invalid_pairs() {
        assert_eq!(TemplateId::for_task(TaskKind::Exec, None), None);
        assert_eq!(
            TemplateId::for_task(TaskKind::Delay, Some(SubKind::Method(HttpMethod::Get))),
            None
        );
    }

    #[test]
    fn test_embedded_templates_load() {
        let templates = EmbeddedTemplates::new().unwrap();
        for id in TemplateId::ALL {
            assert!(templates.supports(id), "{id}");
        }
    }

    #[test]
    fn test_render_exec_shell() {
        let templates = EmbeddedTemplates::new().unwrap();
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "install");
        ctx.insert("filename", "specs/task_file_abcd1234.sh");
        ctx.insert("cred", "ref(BP_CRED_admin)");
        ctx.insert("target", "ref(Web)");
        let text = templates.render(TemplateId::ExecShell, &ctx).unwrap();
        assert_eq!(
            text,
            "task \"install\" exec.shell {\n  file = \"specs/task_file_abcd1234.sh\"\n  cred = ref(BP_CRED_admin)\n  target = ref(Web)\n}"
        );
    }

    #[test]
    fn test_render_without_bindings() {
        let templates = EmbeddedTemplates::new().unwrap();
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "wait");
        ctx.insert("delay_seconds", 5);
        let text = templates.render(TemplateId::Delay, &ctx).unwrap();
        assert_eq!(text, "task \"wait\" delay {\n  seconds = 5\n}");
    }

    #[test]
    fn test_literal_keeps_quotes_readable() {
        let templates = EmbeddedTemplates::new().unwrap();
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "read");
        ctx.insert("script", "echo /'hi/'");
        ctx.insert("variables", json!(["x"]));
        let text = templates.render(TemplateId::SetVariableShell, &ctx).unwrap();
        assert!(text.contains("script = \"echo /'hi/'\""));
        assert!(text.contains("variables = [\"x\"]"));
    }

    #[test]
    fn test_context_keeps_insertion_order() {
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "a");
        ctx.insert("action", "b");
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["name", "action"]);
        assert_eq!(ctx.get_str("action"), Some("b"));
        assert!(!ctx.contains("target"));
    }
}
