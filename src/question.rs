//! Question model: a base question plus the multiple-choice variant,
//! collapsed into one struct with a `kind` tag rather than an inheritance
//! chain. Variant behaviour lives in the adapter, not in subclass overrides.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::answer::{Answer, AnswerView};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QuestionKind {
    PlainText,
    MultipleChoice {
        options: Vec<String>,
        correct_option: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub question_id: String,
    pub text: String,
    pub points: f64,
    pub duration: Duration,
    pub kind: QuestionKind,

    /// Set once the question becomes (or has been) current.
    pub send_at: Option<DateTime<Utc>>,

    /// Populated only at grading time, for historical questions.
    #[serde(skip)]
    pub answers: Vec<Answer>,

    pub graded: bool,
}

impl Question {
    pub fn new(
        question_id: impl Into<String>,
        text: impl Into<String>,
        points: f64,
        duration: Duration,
        kind: QuestionKind,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            text: text.into(),
            points,
            duration,
            kind,
            send_at: None,
            answers: Vec::new(),
            graded: false,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.send_at.map(|s| s + self.duration)
    }

    /// Read-only projection returned from `GET /matches/{id}`'s extended mode
    /// and from the current-question poll.
    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.question_id.clone(),
            text: self.text.clone(),
            sent_date: self.send_at,
            duration: self.duration.num_milliseconds() as f64 / 1000.0,
            options: match &self.kind {
                QuestionKind::MultipleChoice { options, .. } => Some(options.clone()),
                QuestionKind::PlainText => None,
            },
        }
    }

    pub fn answers_view(&self) -> Vec<AnswerView> {
        self.answers.iter().map(AnswerView::from).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    #[serde(rename = "sentDate")]
    pub sent_date: Option<DateTime<Utc>>,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}
