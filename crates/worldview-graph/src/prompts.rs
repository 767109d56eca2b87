use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful NASA Worldview assistant. \
Turn the user's Earth-observation request (a phenomenon, a place, a date range) into \
NASA Worldview imagery: name the layers you would show, the region and the dates, and \
give a Worldview link. When you reference a snapshot image, write it as a markdown image \
so it can be displayed. Keep answers short.";

pub const DEFAULT_USER_TEMPLATE: &str = "{input}";

/// System prompt plus the template that wraps each user turn
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    system: String,
    user_template: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_template: DEFAULT_USER_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Blank prompts fall back to the defaults
    pub fn new(system: impl Into<String>, user_template: impl Into<String>) -> Self {
        let system = system.into();
        let user_template = user_template.into();
        Self {
            system: if system.trim().is_empty() {
                DEFAULT_SYSTEM_PROMPT.to_string()
            } else {
                system.trim().to_string()
            },
            user_template: if user_template.trim().is_empty() {
                DEFAULT_USER_TEMPLATE.to_string()
            } else {
                user_template.trim().to_string()
            },
        }
    }

    /// Load prompt files; a path that is given but missing is an error
    pub fn from_files(system_path: Option<&Path>, user_path: Option<&Path>) -> Result<Self> {
        let read = |path: Option<&Path>| -> Result<String> {
            match path {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Prompt file not found: {}", path.display())),
                None => Ok(String::new()),
            }
        };
        Ok(Self::new(read(system_path)?, read(user_path)?))
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }

    /// Fill `{input}`; a template that renders blank yields the raw input
    pub fn render_user(&self, input: &str) -> String {
        let rendered = self.user_template.replace("{input}", input);
        if rendered.trim().is_empty() || input.trim().is_empty() {
            input.to_string()
        } else {
            rendered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_template_is_identity() {
        let prompts = PromptTemplates::default();
        assert_eq!(prompts.render_user("show wildfires"), "show wildfires");
        assert!(prompts.system_prompt().contains("Worldview"));
    }

    #[test]
    fn test_custom_template() {
        let prompts = PromptTemplates::new("sys", "Request: {input}\nAnswer briefly.");
        assert_eq!(
            prompts.render_user("dust storms"),
            "Request: dust storms\nAnswer briefly."
        );
    }

    #[test]
    fn test_blank_values_fall_back() {
        let prompts = PromptTemplates::new("   ", "");
        assert_eq!(prompts.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(prompts.render_user("x"), "x");
    }

    #[test]
    fn test_from_files() {
        let mut system = tempfile::NamedTempFile::new().unwrap();
        writeln!(system, "  Custom system  ").unwrap();

        let prompts = PromptTemplates::from_files(Some(system.path()), None).unwrap();
        assert_eq!(prompts.system_prompt(), "Custom system");
        assert_eq!(prompts.render_user("hi"), "hi");

        let missing = PromptTemplates::from_files(Some(Path::new("/no/such/prompt.txt")), None);
        assert!(missing.is_err());
    }
}
