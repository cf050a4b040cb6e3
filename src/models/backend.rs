use crate::models::{ChatTurn, Role};

#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub id: String,
    pub model: String,
    pub role: Role,
    pub content: String,
    pub usage: Option<BackendUsage>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BackendUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BackendPrompt {
    model: String,
    messages: Vec<ChatTurn>,
}

impl BackendPrompt {
    pub fn new(messages: Vec<ChatTurn>) -> BackendPrompt {
        BackendPrompt {
            model: String::new(),
            messages,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatTurn] {
        &self.messages
    }
}
