pub mod error;
pub mod generator;
pub mod parser;
pub mod session;

use log::{info, warn};

use error::QuizError;
use generator::QuestionGenerator;

/// Every question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub text: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_answer: String,
}

impl QuizQuestion {
    pub fn new(
        text: impl Into<String>,
        options: [String; OPTIONS_PER_QUESTION],
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }

    /// Returns the option matching `selected` after trimming, if any.
    pub fn option(&self, selected: &str) -> Option<&str> {
        let selected = selected.trim();
        self.options
            .iter()
            .map(|o| o.trim())
            .find(|o| *o == selected)
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        selected.trim() == self.correct_answer.trim()
    }
}

/// Asks the model for `count` questions about `topic` and parses the reply.
pub async fn generate_quiz(
    generator: &QuestionGenerator,
    topic: &str,
    count: usize,
) -> Result<Vec<QuizQuestion>, QuizError> {
    let raw = generator.generate(topic, count).await?;
    let questions = parser::parse(&raw)?;

    if questions.len() != count {
        warn!(
            "Asked for {} questions about {:?}, the model returned {}",
            count,
            topic,
            questions.len()
        );
    }
    info!("Parsed {} questions about {:?}", questions.len(), topic);

    Ok(questions)
}
