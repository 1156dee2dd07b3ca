//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`) so
//! operators can tune castaway behaviour without recompiling. Each request
//! kind renders a system message and a user message from its own pair of
//! templates.

use minijinja::Environment;

use crate::error::OracleError;

/// Every template the engine requires, by file name.
const TEMPLATE_FILES: [&str; 6] = [
    "system.j2",
    "designer.j2",
    "goal.j2",
    "trade.j2",
    "invention.j2",
    "icon.j2",
];

/// The kind of prompt to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Choose a goal and plan.
    Goal,
    /// Answer a trade offer.
    Trade,
    /// Flesh out an invention concept.
    Invention,
    /// Draw an invention icon.
    Icon,
}

impl PromptKind {
    const fn system_template(self) -> &'static str {
        match self {
            Self::Goal | Self::Trade => "system",
            Self::Invention | Self::Icon => "designer",
        }
    }

    const fn user_template(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Trade => "trade",
            Self::Invention => "invention",
            Self::Icon => "icon",
        }
    }
}

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the role.
    pub system: String,
    /// User message carrying the situation and the task.
    pub user: String,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from `templates_dir`.
    ///
    /// The directory must contain `system.j2`, `designer.j2`, `goal.j2`,
    /// `trade.j2`, `invention.j2` and `icon.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, OracleError> {
        let mut env = Environment::new();
        for file in TEMPLATE_FILES {
            let source = load_template(templates_dir, file)?;
            let name = file.trim_end_matches(".j2");
            env.add_template_owned(name, source).map_err(|e| {
                OracleError::Template(format!("failed to add {name} template: {e}"))
            })?;
        }
        Ok(Self { env })
    }

    /// Render the prompt for `kind` from a JSON context.
    pub fn render(
        &self,
        kind: PromptKind,
        context: &serde_json::Value,
    ) -> Result<RenderedPrompt, OracleError> {
        Ok(RenderedPrompt {
            system: self.render_one(kind.system_template(), context)?,
            user: self.render_one(kind.user_template(), context)?,
        })
    }

    fn render_one(&self, name: &str, context: &serde_json::Value) -> Result<String, OracleError> {
        self.env
            .get_template(name)
            .map_err(|e| OracleError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| OracleError::Template(format!("{name} render failed: {e}")))
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, OracleError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| OracleError::Template(format!("failed to read {path}: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Write a minimal template set into a fresh temp directory.
    pub(crate) fn write_test_templates(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "castaway_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        let files = [
            ("system.j2", "You are {{ name }}, a castaway."),
            ("designer.j2", "You design primitive inventions."),
            (
                "goal.j2",
                "Time: {{ time }}\nHunger: {{ hunger }}\n{% for m in short_term_memory %}- {{ m }}\n{% endfor %}{% if critical %}CRITICAL{% endif %}",
            ),
            (
                "trade.j2",
                "{{ counterpart }} gives {{ offer.give_amount }} {{ offer.give }} for {{ offer.take_amount }} {{ offer.take }}. Turn {{ offer.turn }}/{{ max_turns }}.",
            ),
            ("invention.j2", "Concept: {{ category }}"),
            ("icon.j2", "Icon for {{ name }}: {{ description }}"),
        ];
        for (file, body) in files {
            std::fs::write(dir.join(file), body).ok();
        }
        dir
    }

    #[test]
    fn template_loading_and_rendering() {
        let dir = write_test_templates("prompt_render");
        let engine = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(engine.is_ok(), "PromptEngine::new should succeed with valid templates");
        let Ok(engine) = engine else { return };

        let context = serde_json::json!({
            "name": "Robinson",
            "time": "Day 3, 14:00",
            "hunger": "22.5",
            "short_term_memory": ["Gathered 2 Wood."],
            "critical": true
        });
        let prompt = engine.render(PromptKind::Goal, &context);
        assert!(prompt.is_ok(), "render should succeed");
        let Ok(prompt) = prompt else { return };

        assert!(prompt.system.contains("Robinson"));
        assert!(prompt.user.contains("Day 3, 14:00"));
        assert!(prompt.user.contains("Gathered 2 Wood."));
        assert!(prompt.user.contains("CRITICAL"));

        let icon = engine.render(
            PromptKind::Icon,
            &serde_json::json!({"name": "Net", "description": "Catches fish."}),
        );
        assert!(icon.is_ok_and(|p| p.system.contains("inventions") && p.user.contains("Net")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let unique = format!(
            "castaway_missing_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        std::fs::write(dir.join("system.j2"), "test").ok();

        let result = PromptEngine::new(dir.to_str().unwrap_or(""));
        assert!(result.is_err(), "should fail when templates are missing");

        std::fs::remove_dir_all(&dir).ok();
    }
}
