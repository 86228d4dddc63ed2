//! Line scanner for the model's free-text reply.
//!
//! A reply is a sequence of blocks, blank lines ignored:
//!
//! ```text
//! Q1. What is the capital of Jordan?
//! Amman
//! Baghdad
//! Jerusalem
//! Damascus
//! The correct answer is Amman
//! ```
//!
//! Lines outside a block (preambles, sign-offs) are skipped. Inside a block
//! every deviation is reported as a [`ParseError`].

use log::debug;

use crate::quiz::error::ParseError;
use crate::quiz::{QuizQuestion, OPTIONS_PER_QUESTION};

const HEADER_PREFIX: char = 'Q';
const ANSWER_MARKER: &str = "is ";
const BLOCK_LEN: usize = OPTIONS_PER_QUESTION + 2;

pub fn parse(raw: &str) -> Result<Vec<QuizQuestion>, ParseError> {
    let lines = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    let mut questions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !lines[i].starts_with(HEADER_PREFIX) {
            debug!("Skipping line outside of a question: {:?}", lines[i]);
            i += 1;
            continue;
        }

        let number = questions.len() + 1;
        let block = lines
            .get(i..i + BLOCK_LEN)
            .ok_or(ParseError::TruncatedBlock {
                question: number,
                found: lines.len() - i - 1,
            })?;
        questions.push(parse_block(number, block)?);
        i += BLOCK_LEN;
    }

    if questions.is_empty() {
        return Err(ParseError::NoQuestions);
    }
    Ok(questions)
}

fn parse_block(number: usize, block: &[&str]) -> Result<QuizQuestion, ParseError> {
    let options: [String; OPTIONS_PER_QUESTION] =
        std::array::from_fn(|k| block[1 + k].to_string());
    let answer_line = block[BLOCK_LEN - 1];

    let answer =
        answer_after_marker(answer_line).ok_or_else(|| ParseError::MissingAnswerMarker {
            question: number,
            line: answer_line.to_string(),
        })?;

    // Models sometimes change the case of the answer; keep the option's spelling.
    let correct_answer = options
        .iter()
        .find(|o| o.as_str() == answer)
        .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(answer)))
        .ok_or_else(|| ParseError::AnswerNotAnOption {
            question: number,
            answer: answer.to_string(),
        })?
        .clone();

    Ok(QuizQuestion::new(block[0], options, correct_answer))
}

/// Text after the first standalone "is ", so "This" or "basis" do not count.
fn answer_after_marker(line: &str) -> Option<&str> {
    line.match_indices(ANSWER_MARKER)
        .find(|(at, _)| {
            line[..*at]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace)
        })
        .map(|(at, _)| line[at + ANSWER_MARKER.len()..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "Q1. What is the capital of Jordan?
Amman
Baghdad
Jerusalem
Damascus

The correct answer is Amman

Q2. What country is to the west of Jordan?
Syria
Egypt
Palestine
Saudi Arabia

Correct answer is Palestine
";

    #[test]
    fn parses_a_single_block() {
        let questions = parse("Q1. X?\nA\nB\nC\nD\n\nThe correct answer is B").unwrap();

        assert_eq!(
            questions,
            vec![QuizQuestion::new(
                "Q1. X?",
                ["A".into(), "B".into(), "C".into(), "D".into()],
                "B"
            )]
        );
    }

    #[test]
    fn returns_one_question_per_block() {
        let questions = parse(TWO_QUESTIONS).unwrap();

        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.options.len() == 4));
        assert_eq!(questions[0].correct_answer, "Amman");
        assert_eq!(questions[1].text, "Q2. What country is to the west of Jordan?");
        assert_eq!(questions[1].correct_answer, "Palestine");
    }

    #[test]
    fn ten_blocks_yield_ten_questions() {
        let raw = (1..=10)
            .map(|n| format!("Q{n}. Question {n}?\nw\nx\ny\nz\nAnswer is y\n\n"))
            .collect::<String>();

        assert_eq!(parse(&raw).unwrap().len(), 10);
    }

    #[test]
    fn skips_preamble_and_trailing_chatter() {
        let raw = format!("Here are your questions:\n\n{TWO_QUESTIONS}\nGood luck!\n");

        assert_eq!(parse(&raw).unwrap().len(), 2);
    }

    #[test]
    fn trims_indented_lines() {
        let questions =
            parse("   Q1. Indented?\n  one \n two\nthree\n four\n  The answer is  three  ").unwrap();

        assert_eq!(questions[0].text, "Q1. Indented?");
        assert_eq!(questions[0].options[0], "one");
        assert_eq!(questions[0].correct_answer, "three");
    }

    #[test]
    fn options_starting_with_q_stay_options() {
        let questions =
            parse("Q1. Which is a province?\nQuebec\nTexas\nBavaria\nKent\nThe answer is Quebec")
                .unwrap();

        assert_eq!(questions[0].options[0], "Quebec");
        assert_eq!(questions[0].correct_answer, "Quebec");
    }

    #[test]
    fn answer_case_is_normalised_to_the_option() {
        let questions = parse("Q1. Capital of France?\nParis\nRome\nBerlin\nMadrid\nThe correct answer is paris")
            .unwrap();

        assert_eq!(questions[0].correct_answer, "Paris");
    }

    #[test]
    fn empty_reply_has_no_questions() {
        assert_eq!(parse(""), Err(ParseError::NoQuestions));
        assert_eq!(parse("\n\n  \n"), Err(ParseError::NoQuestions));
        assert_eq!(
            parse("An error occurred: rate limited"),
            Err(ParseError::NoQuestions)
        );
    }

    #[test]
    fn truncated_final_block_is_an_error() {
        let raw = format!("{TWO_QUESTIONS}\nQ3. Cut short?\nA\nB\n");

        assert_eq!(
            parse(&raw),
            Err(ParseError::TruncatedBlock {
                question: 3,
                found: 2
            })
        );
    }

    #[test]
    fn block_with_three_options_is_an_error() {
        let err = parse("Q1. Short?\nA\nB\nC\nThe answer is A").unwrap_err();

        assert_eq!(err.reason(), "truncated_block");
    }

    #[test]
    fn answer_line_without_marker_is_an_error() {
        let err = parse("Q1. X?\nA\nB\nC\nD\nAnswer: B").unwrap_err();

        assert_eq!(
            err,
            ParseError::MissingAnswerMarker {
                question: 1,
                line: "Answer: B".to_string()
            }
        );
    }

    #[test]
    fn answer_line_ending_in_marker_is_an_error() {
        assert_eq!(
            parse("Q1. X?\nA\nB\nC\nD\nThe answer is "),
            Err(ParseError::MissingAnswerMarker {
                question: 1,
                line: "The answer is".to_string()
            })
        );
    }

    #[test]
    fn answer_outside_the_options_is_an_error() {
        assert_eq!(
            parse("Q1. X?\nA\nB\nC\nD\nThe correct answer is E"),
            Err(ParseError::AnswerNotAnOption {
                question: 1,
                answer: "E".to_string()
            })
        );
    }

    #[test]
    fn answer_is_taken_after_the_first_marker() {
        let questions =
            parse("Q1. Pick one\nit is red\nblue\ngreen\nnone\nThe answer is it is red").unwrap();

        assert_eq!(questions[0].correct_answer, "it is red");
    }

    #[test]
    fn marker_inside_a_word_is_not_the_answer_marker() {
        let questions =
            parse("Q1. Capital?\nParis\nRome\nBerlin\nMadrid\nThis is Paris").unwrap();
        assert_eq!(questions[0].correct_answer, "Paris");

        let questions = parse(
            "Q1. Which word?\nbasis\nthesis\ncrisis\naxis\nOn this basis the answer is thesis",
        )
        .unwrap();
        assert_eq!(questions[0].correct_answer, "thesis");
    }

    #[test]
    fn marker_may_open_the_answer_line() {
        let questions = parse("Q1. X?\nA\nB\nC\nD\nis C").unwrap();

        assert_eq!(questions[0].correct_answer, "C");
    }
}
