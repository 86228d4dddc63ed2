use std::sync::Arc;

use log::{debug, info, warn};
use teloxide::{
    dispatching::{dialogue::ErasedStorage, UpdateHandler},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup},
    utils::command::BotCommands,
};

use crate::config::{MAX_QUESTIONS, MIN_QUESTIONS};
use crate::quiz::{
    self,
    error::{QuizError, SessionError},
    generator::QuestionGenerator,
    session::{Phase, QuizSession, Submission},
};

pub type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveTopic,
    ReceiveAmountOfQuestions {
        topic: String,
    },
    Quiz {
        session: QuizSession,
    },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "introduce the bot and pick a topic.")]
    Start,
    #[command(description = "show this text.")]
    Help,
    #[command(description = "start over with a new topic.")]
    Quiz,
    #[command(description = "abandon the current quiz.")]
    Cancel,
}

const GREETING_TEXT: &str = "Hi! I am a quiz bot. Give me a topic and I will write multiple-choice questions about it.";
const ASK_TOPIC_TEXT: &str = "What topic should the quiz be about?";
const NEXT_QUESTION: &str = "Next question";

pub fn schema() -> UpdateHandler<HandlerError> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Quiz].endpoint(new_quiz))
        .branch(case![Command::Cancel].endpoint(cancel));

    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(command_handler)
        .branch(case![State::Start].endpoint(start))
        .branch(case![State::ReceiveTopic].endpoint(receive_topic))
        .branch(
            case![State::ReceiveAmountOfQuestions { topic }]
                .endpoint(receive_amount_of_questions),
        )
        .branch(case![State::Quiz { session }].endpoint(receive_answer))
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    ask_topic(&bot, dialogue, msg.chat.id).await
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn new_quiz(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    ask_topic(&bot, dialogue, msg.chat.id).await
}

async fn cancel(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Quiz cancelled.").await?;
    ask_topic(&bot, dialogue, msg.chat.id).await
}

async fn ask_topic(bot: &Bot, dialogue: QuizDialogue, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, ASK_TOPIC_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;
    dialogue.update(State::ReceiveTopic).await?;
    Ok(())
}

async fn receive_topic(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let topic = match msg.text().map(str::trim) {
        Some(topic) if !topic.is_empty() => topic.to_string(),
        _ => {
            bot.send_message(msg.chat.id, "Please send the topic as text.")
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "How many questions?")
        .reply_markup(amount_keyboard())
        .await?;
    dialogue
        .update(State::ReceiveAmountOfQuestions { topic })
        .await?;
    Ok(())
}

async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: QuizDialogue,
    topic: String,
    msg: Message,
    generator: Arc<QuestionGenerator>,
) -> HandlerResult {
    let amount = match parse_amount(msg.text()) {
        Some(amount) => amount,
        None => {
            let text = format!(
                "Please enter a number from {} to {}.",
                MIN_QUESTIONS, MAX_QUESTIONS
            );
            bot.send_message(msg.chat.id, text).await?;
            return Ok(());
        }
    };

    // Only cosmetic, so a failure here is not worth aborting for.
    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    let questions = match quiz::generate_quiz(&generator, &topic, amount).await {
        Ok(questions) => questions,
        Err(err) => {
            warn!("Quiz about {:?} failed ({}): {}", topic, err.reason(), err);
            bot.send_message(msg.chat.id, failure_text(&err))
                .reply_markup(KeyboardRemove::new())
                .await?;
            return ask_topic(&bot, dialogue, msg.chat.id).await;
        }
    };

    let mut session = QuizSession::new();
    session.start(questions)?;
    info!(
        "Chat {} started a {}-question quiz about {:?}",
        msg.chat.id.0,
        session.question_count(),
        topic
    );

    send_question(&bot, msg.chat.id, &session).await?;
    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn receive_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please pick one of the options.")
            .await?;
        return Ok(());
    };

    debug!("Chat {} sent {:?} in {:?}", msg.chat.id.0, text, session.phase());

    if wants_next_question(&session, text) {
        match session.advance().map(|_| ()) {
            Ok(()) => {
                send_question(&bot, msg.chat.id, &session).await?;
                dialogue.update(State::Quiz { session }).await?;
            }
            Err(err) => {
                bot.send_message(msg.chat.id, err.to_string()).await?;
            }
        }
        return Ok(());
    }

    match session.submit(text) {
        Ok(Submission::Answered {
            correct,
            correct_answer,
        }) => {
            let verdict = if correct {
                "Correct!".to_string()
            } else {
                format!("Incorrect! The correct answer is {}", correct_answer)
            };
            bot.send_message(msg.chat.id, verdict)
                .reply_markup(after_answer_keyboard(&session))
                .await?;
            dialogue.update(State::Quiz { session }).await?;
        }
        Ok(Submission::AlreadySubmitted) => {
            bot.send_message(
                msg.chat.id,
                format!("You already answered this one. Tap \"{}\".", NEXT_QUESTION),
            )
            .reply_markup(after_answer_keyboard(&session))
            .await?;
        }
        Ok(Submission::Finished(report)) => {
            info!(
                "Chat {} finished a quiz with {}/{}",
                msg.chat.id.0, report.score, report.total
            );
            bot.send_message(msg.chat.id, report.to_string())
                .reply_markup(KeyboardRemove::new())
                .await?;
            ask_topic(&bot, dialogue, msg.chat.id).await?;
        }
        Err(SessionError::UnknownOption(_)) => {
            bot.send_message(msg.chat.id, "Please pick one of the options.")
                .await?;
            send_question(&bot, msg.chat.id, &session).await?;
        }
        Err(err) => {
            warn!(
                "Unexpected answer in chat {} ({}): {}",
                msg.chat.id.0,
                err.reason(),
                err
            );
            bot.send_message(msg.chat.id, err.to_string()).await?;
        }
    }
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, session: &QuizSession) -> HandlerResult {
    let Some(question) = session.current() else {
        return Ok(());
    };

    let rows = question
        .options
        .iter()
        .map(|option| vec![KeyboardButton::new(option.clone())])
        .collect::<Vec<_>>();

    bot.send_message(chat_id, question_text(session))
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

fn question_text(session: &QuizSession) -> String {
    let Some(question) = session.current() else {
        return String::new();
    };
    let mut text = format!(
        "Question {}/{}\n\n{}",
        session.current_index() + 1,
        session.question_count(),
        question.text
    );
    let answered = session.correctness();
    if !answered.is_empty() {
        let correct = answered.iter().filter(|&&c| c).count();
        text.push_str(&format!("\n\n{}/{} correct so far.", correct, answered.len()));
    }
    if session.is_last() {
        text.push_str("\n\nThis is the last question, your answer submits the quiz.");
    }
    text
}

fn parse_amount(text: Option<&str>) -> Option<usize> {
    text?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|amount| (MIN_QUESTIONS..=MAX_QUESTIONS).contains(amount))
}

fn failure_text(err: &QuizError) -> String {
    match err {
        QuizError::Generation(err) => format!("An error occurred: {}", err),
        QuizError::Parse(_) => "Could not parse the model's reply, please try again.".to_string(),
    }
}

fn amount_keyboard() -> KeyboardMarkup {
    let buttons = (MIN_QUESTIONS..=MAX_QUESTIONS)
        .map(|n| KeyboardButton::new(n.to_string()))
        .collect::<Vec<_>>();
    KeyboardMarkup::new(buttons.chunks(5).map(<[_]>::to_vec))
}

/// "Next question" is only offered once the answer is in and more questions remain.
fn after_answer_keyboard(session: &QuizSession) -> ReplyMarkup {
    if session.can_advance() {
        ReplyMarkup::Keyboard(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
            NEXT_QUESTION,
        )]]))
    } else {
        ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
    }
}

/// An option may itself read "Next question", so the button only counts
/// after the current question has been answered.
fn wants_next_question(session: &QuizSession, text: &str) -> bool {
    text == NEXT_QUESTION && matches!(session.phase(), Phase::Submitted(_))
}
