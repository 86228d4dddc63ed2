//! Error types for quiz generation, parsing and the session state machine.

use thiserror::Error;

/// Failure while asking the model for questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("the model returned no choices")]
    EmptyResponse,
    #[error(transparent)]
    Client(#[from] chatgpt::err::Error),
}

impl GenerationError {
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::MissingApiKey => "missing_api_key",
            GenerationError::EmptyResponse => "empty_response",
            GenerationError::Client(_) => "client",
        }
    }
}

/// The model's reply deviates from the expected block grammar.
///
/// `question` is the 1-based number of the block being read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("no questions found in the reply")]
    NoQuestions,
    #[error("question {question} has {found} of the 5 lines that must follow it")]
    TruncatedBlock { question: usize, found: usize },
    #[error("question {question} has no answer line (got {line:?})")]
    MissingAnswerMarker { question: usize, line: String },
    #[error("answer {answer:?} of question {question} is not one of its options")]
    AnswerNotAnOption { question: usize, answer: String },
}

impl ParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::NoQuestions => "no_questions",
            ParseError::TruncatedBlock { .. } => "truncated_block",
            ParseError::MissingAnswerMarker { .. } => "missing_answer_marker",
            ParseError::AnswerNotAnOption { .. } => "answer_not_an_option",
        }
    }
}

/// An action that is not allowed in the session's current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no quiz is in progress")]
    NotReady,
    #[error("a quiz needs at least one question")]
    NoQuestions,
    #[error("{0:?} is not one of the options")]
    UnknownOption(String),
    #[error("the current question has not been answered yet")]
    NotSubmitted,
    #[error("there is no next question")]
    NoNextQuestion,
}

impl SessionError {
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::NotReady => "not_ready",
            SessionError::NoQuestions => "no_questions",
            SessionError::UnknownOption(_) => "unknown_option",
            SessionError::NotSubmitted => "not_submitted",
            SessionError::NoNextQuestion => "no_next_question",
        }
    }
}

/// Failure of the whole generate-then-parse cycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl QuizError {
    pub fn reason(&self) -> &'static str {
        match self {
            QuizError::Generation(e) => e.reason(),
            QuizError::Parse(e) => e.reason(),
        }
    }
}
