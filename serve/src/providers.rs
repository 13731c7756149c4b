//! Provider catalog served by `GET /api/provider/{name}`.

use questline::ProviderInfo;

/// Names offered by the selection UI, in display order.
pub const PROVIDER_NAMES: &[&str] = &[
    "OpenAI (GPT)",
    "Anthropic (Claude)",
    "Google (Gemini)",
    "DeepSeek",
    "Ollama (Local)",
    "Groq",
    "LM Studio",
    "Custom Provider",
];

const FALLBACK: &str = "Custom Provider";

fn entry(
    api_url: &str,
    default_model: &str,
    models: &[&str],
    requires_key: bool,
    id: &str,
) -> ProviderInfo {
    ProviderInfo {
        models: models.iter().map(|m| m.to_string()).collect(),
        default_model: default_model.to_string(),
        requires_key,
        api_url: api_url.to_string(),
        provider: id.to_string(),
    }
}

/// Catalog entry for `name`; unknown names get the custom entry.
pub fn provider_config(name: &str) -> ProviderInfo {
    match name {
        "OpenAI (GPT)" => entry(
            "https://api.openai.com/v1/chat/completions",
            "gpt-4o-mini",
            &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
            true,
            "openai",
        ),
        "Anthropic (Claude)" => entry(
            "https://api.anthropic.com/v1/messages",
            "claude-3-haiku-20240307",
            &[
                "claude-3-5-sonnet-20241022",
                "claude-3-haiku-20240307",
                "claude-3-opus-20240229",
            ],
            true,
            "anthropic",
        ),
        "Google (Gemini)" => entry(
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
            "gemini-2.0-flash",
            &["gemini-2.5-flash-lite", "gemini-2.0-flash", "gemini-2.0-flash-lite"],
            true,
            "gemini",
        ),
        "DeepSeek" => entry(
            "https://api.deepseek.com/chat/completions",
            "deepseek-chat",
            &["deepseek-chat", "deepseek-coder", "deepseek-reasoner"],
            true,
            "deepseek",
        ),
        "Ollama (Local)" => entry(
            "http://localhost:11434/v1/chat/completions",
            "llama3.1",
            &["llama3.1", "llama3:latest", "mistral", "codellama", "vicuna", "gemma:2b"],
            false,
            "ollama",
        ),
        "Groq" => entry(
            "https://api.groq.com/openai/v1/chat/completions",
            "llama-3.1-8b-instant",
            &[
                "llama-3.1-8b-instant",
                "meta-llama/llama-4-scout-17b-16e-instruct",
                "gemma2-9b-it",
            ],
            true,
            "groq",
        ),
        "LM Studio" => entry(
            "http://localhost:1234/v1/chat/completions",
            "local-model",
            &["local-model"],
            false,
            "lmstudio",
        ),
        _ => {
            if name != FALLBACK {
                tracing::debug!(name, "unknown provider, using custom entry");
            }
            entry("", "custom-model", &["custom-model"], true, "custom")
        }
    }
}

/// Endpoint to use: the player's override when given, else the catalog URL.
pub fn resolve_api_url(provider: &str, override_url: &str) -> String {
    let trimmed = override_url.trim();
    if trimmed.is_empty() {
        provider_config(provider).api_url
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_provider_has_its_default_model() {
        for name in PROVIDER_NAMES {
            let info = provider_config(name);
            assert!(info.models.contains(&info.default_model), "{name}");
        }
    }

    #[test]
    fn unknown_falls_back_to_custom() {
        let info = provider_config("Nope");
        assert_eq!(info.provider, "custom");
        assert!(info.requires_key);
    }

    #[test]
    fn override_url_wins_when_set() {
        assert_eq!(
            resolve_api_url("Ollama (Local)", "  "),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(
            resolve_api_url("Ollama (Local)", " http://gpu:11434/v1 "),
            "http://gpu:11434/v1"
        );
    }
}
