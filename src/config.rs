use serde::Deserialize;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub ollama_base_url: String,
    pub ollama_model_text: String,
    pub ollama_model_vision: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model_text: String,
    pub openai_model_vision: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionConfig {
    pub api_url: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    pub clarification_round_limit: u32,
    pub conversation_ttl_secs: u64,
    pub report_all_days_cap: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub llm: LlmConfig,
    pub nutrition: NutritionConfig,
    pub orchestrator: OrchestratorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let redis_url = env_or("REDIS_URL", "redis://127.0.0.1:6379");
        let llm = LlmConfig {
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model_text: env_or("OLLAMA_MODEL_TEXT", "mistral"),
            ollama_model_vision: env_or("OLLAMA_MODEL_VISION", "llava:7b"),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model_text: env_or("OPENAI_MODEL_TEXT", "gpt-4-turbo-preview"),
            openai_model_vision: env_or("OPENAI_MODEL_VISION", "gpt-4o"),
            timeout_secs: env_parse("LLM_TIMEOUT_SECS", 30),
        };
        let nutrition = NutritionConfig {
            api_url: env_or(
                "NUTRITION_API_URL",
                "https://platform.fatsecret.com/rest/server.api",
            ),
            access_token: env_or("NUTRITION_ACCESS_TOKEN", ""),
        };
        let orchestrator = OrchestratorConfig {
            clarification_round_limit: env_parse("CLARIFICATION_ROUND_LIMIT", 5),
            conversation_ttl_secs: env_parse("CONVERSATION_TTL_SECS", 3600),
            report_all_days_cap: env_parse("REPORT_ALL_DAYS_CAP", 30),
        };
        Ok(Self {
            database_url,
            redis_url,
            llm,
            nutrition,
            orchestrator,
        })
    }
}
