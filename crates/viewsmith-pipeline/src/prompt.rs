//! Prompt construction
//!
//! Assembles the system and user instructions sent to the model service,
//! together with the sampling parameters for the request category. Every
//! constraint listed here - allowed hooks, allowed capability names, inline
//! styling, no module statements, a named function declaration, the stop
//! list - is a *hint* to the model. The normalizer is the enforcement point;
//! the model may and does violate any of these.

use serde::{Deserialize, Serialize};

use crate::classify::RequestCategory;
use crate::scope::ScopeDefinition;

/// System instruction shared by both categories.
const SYSTEM_PROMPT: &str = "\
You are a world-class React developer. You create components that are:
- Functional and work perfectly
- Visually appealing with modern design
- Styled with inline styles only
- Complete with proper event handlers and state management

CRITICAL REQUIREMENTS:
1. Return ONLY React function component code
2. NO explanations, NO markdown, NO backticks
3. Use function declaration: function ComponentName() { ... }
4. Use ONLY inline styles (style={{}} objects)
5. NO import statements, NO export statements
6. Make all functionality work perfectly";

/// Sampling parameters for a single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier understood by the gateway.
    pub model: String,
    pub temperature: f32,
    /// Output token budget. The model may be cut off mid-unit when this is
    /// reached; the normalizer has to cope with truncated text.
    pub max_output_units: u32,
    pub stop_sequences: Vec<String>,
}

/// A fully assembled prompt: instructions plus sampling parameters.
#[derive(Debug, Clone)]
pub struct PromptBundle {
    pub system: String,
    pub user: String,
    pub params: GenerationParams,
}

/// Builds category-appropriate prompts.
///
/// Holds the per-category model names so a lighter model serves simple
/// requests and a heavier one serves full applications.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    simple_model: String,
    complex_model: String,
}

impl PromptBuilder {
    pub fn new(simple_model: impl Into<String>, complex_model: impl Into<String>) -> Self {
        Self {
            simple_model: simple_model.into(),
            complex_model: complex_model.into(),
        }
    }

    /// Assemble the prompt for a classified request.
    ///
    /// The allowed-symbol lists are taken from the scope the unit will later
    /// be evaluated against, so instructions and enforcement never drift
    /// apart.
    pub fn build(
        &self,
        category: RequestCategory,
        request: &str,
        scope: &ScopeDefinition,
    ) -> PromptBundle {
        let hooks = scope.hook_symbols().join(", ");
        let icons = scope
            .symbols_of(crate::scope::CapabilityKind::Icon)
            .join(", ");

        let user = match category {
            RequestCategory::Simple => format!(
                "Create a functional React component: \"{request}\"\n\n\
                 REQUIREMENTS:\n\
                 - Single focused component\n\
                 - Use function declaration: function ComponentName() {{ ... }}\n\
                 - NO import/export statements\n\
                 - Inline styles only (style={{{{}}}} objects)\n\
                 - Available hooks: {hooks}\n\
                 - Available icons: {icons}\n\
                 - Make it work perfectly with proper event handlers\n\
                 - Focus on core functionality requested\n\
                 - Include proper state management if needed\n\n\
                 Return ONLY the component code, no explanations."
            ),
            RequestCategory::Complex => {
                let libraries = scope.library_symbols().join(", ");
                let charts = scope
                    .symbols_of(crate::scope::CapabilityKind::Charting)
                    .join(", ");
                format!(
                    "Create a complete React application: \"{request}\"\n\n\
                     REQUIREMENTS:\n\
                     - Multiple interconnected components\n\
                     - Use function declarations for all components\n\
                     - NO import/export statements\n\
                     - Inline styles only (style={{{{}}}} objects)\n\
                     - Complete functionality with navigation between sections\n\
                     - State management between components\n\
                     - Rich interactions and features\n\
                     - Available libraries: {libraries}\n\
                     - Available chart components: {charts}\n\
                     - Available hooks: {hooks}\n\
                     - Available icons: {icons}\n\
                     - Create a full-featured application experience\n\n\
                     Return ONLY the complete application code, no explanations."
                )
            }
        };

        PromptBundle {
            system: SYSTEM_PROMPT.to_string(),
            user,
            params: self.params_for(category),
        }
    }

    /// Sampling parameters per category: lower temperature and a smaller
    /// output budget for simple requests, the heavier model and a larger
    /// budget for applications. The only stop sequence is the code fence -
    /// stopping on `import`/`export` would truncate legitimate identifiers.
    fn params_for(&self, category: RequestCategory) -> GenerationParams {
        match category {
            RequestCategory::Simple => GenerationParams {
                model: self.simple_model.clone(),
                temperature: 0.1,
                max_output_units: 1500,
                stop_sequences: vec!["```".to_string()],
            },
            RequestCategory::Complex => GenerationParams {
                model: self.complex_model.clone(),
                temperature: 0.3,
                max_output_units: 4000,
                stop_sequences: vec!["```".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeRegistry;

    fn builder() -> PromptBuilder {
        PromptBuilder::new("llama3-8b-8192", "llama3-70b-8192")
    }

    #[test]
    fn test_simple_prompt_lists_restricted_hooks_only() {
        let registry = ScopeRegistry::new();
        let bundle = builder().build(
            RequestCategory::Simple,
            "a counter button",
            registry.restricted(),
        );
        assert!(bundle.user.contains("useState"));
        assert!(!bundle.user.contains("useMemo"));
        assert!(!bundle.user.contains("THREE"));
        assert_eq!(bundle.params.model, "llama3-8b-8192");
        assert_eq!(bundle.params.max_output_units, 1500);
    }

    #[test]
    fn test_complex_prompt_lists_expanded_capabilities() {
        let registry = ScopeRegistry::new();
        let bundle = builder().build(
            RequestCategory::Complex,
            "a music production dashboard",
            registry.expanded(),
        );
        assert!(bundle.user.contains("THREE"));
        assert!(bundle.user.contains("Tone"));
        assert!(bundle.user.contains("LineChart"));
        assert!(bundle.user.contains("useCallback"));
        assert_eq!(bundle.params.model, "llama3-70b-8192");
        assert_eq!(bundle.params.temperature, 0.3);
    }

    #[test]
    fn test_stop_list_is_fence_only() {
        let registry = ScopeRegistry::new();
        let bundle = builder().build(RequestCategory::Simple, "a toggle", registry.restricted());
        assert_eq!(bundle.params.stop_sequences, vec!["```".to_string()]);
    }

    #[test]
    fn test_request_text_embedded_verbatim() {
        let registry = ScopeRegistry::new();
        let request = "Create a button with hover effects";
        let bundle = builder().build(RequestCategory::Simple, request, registry.restricted());
        assert!(bundle.user.contains(request));
        assert!(bundle.system.contains("inline styles"));
    }
}
