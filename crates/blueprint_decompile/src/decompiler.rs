//! Task decompiler.

use crate::reverse::{CredentialTable, ReverseResolver, RunbookActionMap};
use crate::script::ScriptSink;
use crate::selector::{Selection, TemplateSelector};
use crate::template::TemplateRenderer;
use blueprint_core::{BlueprintResult, Payload};
use tracing::{debug, debug_span};

/// Turns task payloads back into declarative source
pub struct Decompiler<R, S> {
    renderer: R,
    scripts: S,
    reverse: ReverseResolver,
}

impl<R: TemplateRenderer, S: ScriptSink> Decompiler<R, S> {
    /// Decompiler with an empty credential table
    #[must_use]
    pub fn new(renderer: R, scripts: S) -> Self {
        Self {
            renderer,
            scripts,
            reverse: ReverseResolver::default(),
        }
    }

    /// Use a credential table for reverse resolution
    #[must_use]
    pub fn with_credentials(mut self, credentials: CredentialTable) -> Self {
        self.reverse = ReverseResolver::new(credentials);
        self
    }

    /// Reverse resolver in use
    #[must_use]
    pub fn reverse(&self) -> &ReverseResolver {
        &self.reverse
    }

    /// Select the template for a payload without rendering it
    ///
    /// # Errors
    ///
    /// See [`TemplateSelector::select`].
    pub fn select(&self, payload: &Payload, actions: &RunbookActionMap) -> BlueprintResult<Selection> {
        TemplateSelector::new(&self.reverse, &self.scripts).select(payload, actions)
    }

    /// Decompile a task payload into source text
    ///
    /// # Errors
    ///
    /// Returns any selection error, or [`blueprint_core::BlueprintError::Render`]
    /// if the template fails to render.
    pub fn decompile(&self, payload: &Payload, actions: &RunbookActionMap) -> BlueprintResult<String> {
        let span = debug_span!("decompile", task = payload.name().unwrap_or_default());
        let _enter = span.enter();

        let selection = self.select(payload, actions)?;
        let text = self.renderer.render(selection.template, &selection.context)?;
        debug!(template = %selection.template, lines = text.lines().count(), "rendered");
        Ok(text.trim().to_string())
    }
}
