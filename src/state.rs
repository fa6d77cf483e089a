use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    quiz::{AnswerEvaluator, QuestionLoader, SessionRegistry},
    statistics::StatisticsService,
    store::{AnswerStore, CategoryStore, QuestionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub questions: Arc<dyn QuestionStore>,
    pub answers: Arc<dyn AnswerStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: QuestionStore + AnswerStore + CategoryStore + 'static,
    {
        Self {
            config,
            questions: store.clone(),
            answers: store.clone(),
            categories: store,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn loader(&self) -> QuestionLoader {
        QuestionLoader::new(self.questions.clone())
    }

    pub fn evaluator(&self) -> AnswerEvaluator {
        AnswerEvaluator::new(self.answers.clone())
    }

    pub fn statistics(&self) -> StatisticsService {
        StatisticsService::new(self.answers.clone())
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
