// src/statistics.rs

//! Dashboard statistics. Always recomputed from the stored answer records;
//! there are no counters to drift.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppResult, models::answer::CategorizedAnswer, store::AnswerStore};

/// `correct / total * 100`, or 0 when nothing was answered.
pub fn accuracy_percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 / total as f64) * 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnswerTally {
    pub total_answered: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub accuracy_percentage: f64,
}

impl AnswerTally {
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let (total, correct) = flags
            .into_iter()
            .fold((0, 0), |(t, c), ok| (t + 1, c + usize::from(ok)));

        AnswerTally {
            total_answered: total,
            correct_answers: correct,
            incorrect_answers: total - correct,
            accuracy_percentage: accuracy_percentage(correct, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStatistics {
    pub student_id: Uuid,
    #[serde(flatten)]
    pub overall: AnswerTally,
    /// Keyed by category name.
    pub by_category: BTreeMap<String, AnswerTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassOverview {
    pub students: usize,
    #[serde(flatten)]
    pub overall: AnswerTally,
    pub by_category: BTreeMap<String, AnswerTally>,
}

fn tally_by_category(records: &[CategorizedAnswer]) -> BTreeMap<String, AnswerTally> {
    let mut flags: BTreeMap<&str, Vec<bool>> = BTreeMap::new();
    for r in records {
        flags
            .entry(r.category_name.as_str())
            .or_default()
            .push(r.is_correct);
    }

    flags
        .into_iter()
        .map(|(name, f)| (name.to_string(), AnswerTally::from_flags(f)))
        .collect()
}

pub fn student_statistics(student_id: Uuid, records: &[CategorizedAnswer]) -> StudentStatistics {
    StudentStatistics {
        student_id,
        overall: AnswerTally::from_flags(records.iter().map(|r| r.is_correct)),
        by_category: tally_by_category(records),
    }
}

pub fn class_overview(records: &[CategorizedAnswer]) -> ClassOverview {
    let students: HashSet<Uuid> = records.iter().map(|r| r.student_id).collect();
    ClassOverview {
        students: students.len(),
        overall: AnswerTally::from_flags(records.iter().map(|r| r.is_correct)),
        by_category: tally_by_category(records),
    }
}

#[derive(Clone)]
pub struct StatisticsService {
    store: Arc<dyn AnswerStore>,
}

impl StatisticsService {
    pub fn new(store: Arc<dyn AnswerStore>) -> Self {
        Self { store }
    }

    pub async fn for_student(&self, student_id: Uuid) -> AppResult<StudentStatistics> {
        let records = self.store.answers_by_student(student_id).await?;
        Ok(student_statistics(student_id, &records))
    }

    pub async fn overview(&self) -> AppResult<ClassOverview> {
        let records = self.store.all_answers().await?;
        Ok(class_overview(&records))
    }
}
