use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub comments: CommentSettings,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct CommentSettings {
    // 最大嵌套层级，根评论是第 0 层；缺省表示不限
    pub max_level: Option<i64>,
    // 每页条数；缺省表示不分页
    pub per_page: Option<i64>,
    // 列表里是否带出已删除的评论（以占位文案展示）
    pub show_deleted: bool,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub admin_token: String,
}

impl Settings {
    pub fn new() -> Result<Self, ::config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/comments.db")?
            .set_default("comments.max_level", 7)?
            .set_default("comments.show_deleted", false)?
            .set_default("security.admin_token", "admin_secret_123")?
            .add_source(::config::File::with_name("config").required(false))
            .add_source(::config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(::config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                ::config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("COMMENTS_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("COMMENTS_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
