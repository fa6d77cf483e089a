// src/quiz/mod.rs

pub mod evaluator;
pub mod loader;
pub mod registry;
pub mod runner;
pub mod session;

pub use evaluator::{AnswerEvaluator, SaveOutcome};
pub use loader::{LoadError, QuestionLoader};
pub use registry::SessionRegistry;
pub use runner::{QuizRunner, SubmitOutcome};
pub use session::{QuizPhase, QuizResults, QuizSession, QuizView};
