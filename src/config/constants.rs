pub const NEW_CHAT_TITLE: &str = "New Chat";

pub const LOG_LEVEL: &str = "info";

/// OpenRouter exposes the OpenAI compatible API under `/api`
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api";

pub const DEFAULT_MODEL: &str = "anthropic/claude-3-opus:beta";

pub const DEFAULT_REFERER: &str = "https://vercel.com";

pub const DEFAULT_APP_TITLE: &str = "Chat App";

/// Environment variable consulted when no api key is configured
pub const API_KEY_ENV: &str = "API_KEY";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Max size of an accepted request body (10MB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub const FALLBACK_MESSAGE_ID: &str = "fallback";

pub const FALLBACK_MESSAGE: &str = "I'm sorry, but there was an issue connecting to the AI service. Please check your API key configuration.";

pub const AUTH_FAILED_ERROR: &str =
    "Authentication failed with OpenRouter. Please check your API_KEY environment variable.";

pub const DEFAULT_DB_PATH: &str = "${HOME}/.local/share/chatport/chat.db";

/// Storage path keeping the database in memory only
pub const IN_MEMORY_DB: &str = ":memory:";
