// src/config.rs

use std::{env, time::Duration};

use dotenvy::dotenv;

use crate::error::AppError;

/// How long an answered question stays on screen before the runner advances.
pub const DEFAULT_ANSWER_DELAY_MS: u64 = 2000;

pub const MIN_TIME_LIMIT_SECS: i32 = 5;
pub const MAX_TIME_LIMIT_SECS: i32 = 600;
pub const MIN_POINTS: i32 = 1;
pub const MAX_POINTS: i32 = 100;
pub const MIN_CHOICE_OPTIONS: usize = 2;
pub const MAX_CHOICE_OPTIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Expected `aud` claim. Supabase tokens carry `authenticated`.
    pub jwt_audience: Option<String>,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub quiz: QuizSettings,
}

/// Knobs of the quiz runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub answer_delay: Duration,
    /// When set, an expired question timer submits an empty answer.
    pub auto_submit_on_timeout: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            answer_delay: Duration::from_millis(DEFAULT_ANSWER_DELAY_MS),
            auto_submit_on_timeout: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_audience = env::var("JWT_AUDIENCE").ok().filter(|a| !a.is_empty());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = parsed("PORT")?.unwrap_or(3000);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let answer_delay = parsed("QUIZ_ANSWER_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_ANSWER_DELAY_MS));

        let auto_submit_on_timeout = parsed("QUIZ_AUTO_SUBMIT")?.unwrap_or(false);

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_audience,
            rust_log,
            port,
            cors_origins,
            quiz: QuizSettings {
                answer_delay,
                auto_submit_on_timeout,
            },
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::InternalServerError(format!("{} must be set", key)))
}

fn parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::InternalServerError(format!("{} has an invalid value", key))),
        Err(_) => Ok(None),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
