use super::content::Content;
use serde::{Deserialize, Serialize};

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Message {
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
            name: None,
        }
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
            name: None,
        }
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: content.into(),
            name: None,
        }
    }

    /// Role as named by the chat-completions API
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Self::System { content, .. } | Self::Human { content, .. } | Self::AI { content, .. } => {
                content
            }
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Self::System { name, .. } | Self::Human { name, .. } | Self::AI { name, .. } => {
                name.as_deref()
            }
        }
    }

    /// OpenAI wire shape (Azure uses the same one)
    pub(crate) fn to_wire(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "role": self.role(),
            "content": self.content().to_wire(),
        });
        if let (Some(name), Some(map)) = (self.name(), obj.as_object_mut()) {
            map.insert("name".to_string(), serde_json::json!(name));
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_roles() {
        assert_eq!(Message::system("s").to_wire()["role"], "system");
        assert_eq!(Message::human("h").to_wire()["role"], "user");
        assert_eq!(Message::ai("a").to_wire()["role"], "assistant");
    }

    #[test]
    fn test_wire_name_only_when_set() {
        let plain = Message::human("hi").to_wire();
        assert!(plain.get("name").is_none());

        let named = Message::Human {
            content: "hi".into(),
            name: Some("alice".into()),
        }
        .to_wire();
        assert_eq!(named["name"], "alice");
    }
}
