use std::fmt;

use log::debug;

use crate::quiz::error::SessionError;
use crate::quiz::QuizQuestion;

/// Where a session stands. A finished quiz is handed out as a [`QuizReport`]
/// and the session drops straight back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingAnswer(usize),
    Submitted(usize),
}

/// Outcome of a submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Answered { correct: bool, correct_answer: String },
    /// The current question was already answered; nothing was recorded.
    AlreadySubmitted,
    /// The last question was answered and the session has been reset.
    Finished(QuizReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    pub score: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

impl fmt::Display for QuizReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your score is: {}/{}", self.score, self.total)?;
        for result in &self.results {
            let verdict = if result.correct { "Correct" } else { "Incorrect" };
            write!(f, "\n{} - {}", result.question, verdict)?;
        }
        Ok(())
    }
}

/// One user's walk through a generated quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    correctness: Vec<bool>,
    submitted: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was in progress with a fresh quiz.
    pub fn start(&mut self, questions: Vec<QuizQuestion>) -> Result<(), SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        self.reset();
        self.questions = questions;
        debug!("Quiz started with {} questions", self.questions.len());
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn phase(&self) -> Phase {
        match (self.is_ready(), self.submitted) {
            (false, _) => Phase::Idle,
            (true, false) => Phase::AwaitingAnswer(self.current_index),
            (true, true) => Phase::Submitted(self.current_index),
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn can_advance(&self) -> bool {
        self.submitted && !self.is_last()
    }

    pub fn is_last(&self) -> bool {
        self.is_ready() && self.current_index == self.questions.len() - 1
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn correctness(&self) -> &[bool] {
        &self.correctness
    }

    /// Records the answer to the current question.
    ///
    /// `selected` must be one of the current options. Answering the last
    /// question ends the quiz and resets the session.
    pub fn submit(&mut self, selected: &str) -> Result<Submission, SessionError> {
        let question = self.current().ok_or(SessionError::NotReady)?;
        if self.submitted {
            return Ok(Submission::AlreadySubmitted);
        }

        let selected = question
            .option(selected)
            .ok_or_else(|| SessionError::UnknownOption(selected.trim().to_string()))?;
        let correct = question.is_correct(selected);
        let correct_answer = question.correct_answer.clone();

        self.correctness.push(correct);
        self.submitted = true;
        debug!(
            "Question {} answered, correct: {}",
            self.current_index + 1,
            correct
        );

        if self.is_last() {
            let report = self.report();
            self.reset();
            return Ok(Submission::Finished(report));
        }
        Ok(Submission::Answered {
            correct,
            correct_answer,
        })
    }

    /// Moves on to the next question once the current one is answered.
    pub fn advance(&mut self) -> Result<&QuizQuestion, SessionError> {
        if !self.is_ready() {
            return Err(SessionError::NotReady);
        }
        if !self.submitted {
            return Err(SessionError::NotSubmitted);
        }
        if self.is_last() {
            return Err(SessionError::NoNextQuestion);
        }

        self.current_index += 1;
        self.submitted = false;
        self.current().ok_or(SessionError::NoNextQuestion)
    }

    fn report(&self) -> QuizReport {
        let results = self
            .questions
            .iter()
            .zip(&self.correctness)
            .map(|(q, &correct)| QuestionResult {
                question: q.text.clone(),
                correct,
            })
            .collect::<Vec<_>>();

        QuizReport {
            score: self.correctness.iter().filter(|&&c| c).count(),
            total: self.questions.len(),
            results,
        }
    }
}
