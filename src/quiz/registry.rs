// src/quiz/registry.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::quiz::runner::QuizRunner;

/// Running quizzes, one per student. Starting a new quiz replaces (and
/// exits) the student's previous one.
#[derive(Default)]
pub struct SessionRegistry {
    by_student: RwLock<HashMap<Uuid, Arc<QuizRunner>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, runner: Arc<QuizRunner>) {
        let previous = self
            .by_student
            .write()
            .await
            .insert(runner.student_id(), runner);

        if let Some(previous) = previous {
            previous.exit().await;
        }
    }

    /// The session, if it exists and belongs to `student_id`.
    pub async fn get(&self, session_id: Uuid, student_id: Uuid) -> Option<Arc<QuizRunner>> {
        self.by_student
            .read()
            .await
            .get(&student_id)
            .filter(|runner| runner.id() == session_id)
            .cloned()
    }

    pub async fn remove(&self, session_id: Uuid, student_id: Uuid) -> Option<Arc<QuizRunner>> {
        let mut sessions = self.by_student.write().await;
        let owned = sessions
            .get(&student_id)
            .is_some_and(|runner| runner.id() == session_id);

        if owned { sessions.remove(&student_id) } else { None }
    }
}
