use std::env;

const DEFAULT_CORS_ORIGINS: &str =
    "https://barbershop-miniapp-beta.automations.uz,https://barbershop-miniapp.automations.uz";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub eskiz_token: String,
    pub eskiz_sender: String,
    pub google_places_api_key: String,
    pub cors_origins: Vec<String>,
    /// Prefix for photo URLs handed to clients. Empty means relative URLs.
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "barbershop.db".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            eskiz_token: env::var("ESKIZ_TOKEN").unwrap_or_default(),
            eskiz_sender: env::var("ESKIZ_SENDER").unwrap_or_else(|_| "4546".to_string()),
            google_places_api_key: env::var("GOOGLE_PLACES_API_KEY").unwrap_or_default(),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_default(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = parse_origins(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn default_origins_cover_both_mini_apps() {
        let origins = parse_origins(DEFAULT_CORS_ORIGINS);
        assert_eq!(origins.len(), 2);
        assert!(origins.iter().all(|o| o.starts_with("https://barbershop-miniapp")));
    }
}
