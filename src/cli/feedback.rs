//! The `[Y/N]` feedback prompt.

use std::io::{self, BufRead, Write};
use std::sync::{Mutex, OnceLock, mpsc};
use std::thread;

use crate::models::Feedback;

/// Question shown after the report.
pub const FEEDBACK_QUESTION: &str = "Did the suggested steps fix the error? [Y/N]: ";

/// Exit status for an interrupt outside the prompt.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// The prompt currently waiting for an answer; `None` outside a prompt.
static ACTIVE_PROMPT: Mutex<Option<mpsc::Sender<Option<String>>>> = Mutex::new(None);

static INTERRUPT_HANDLER: OnceLock<()> = OnceLock::new();

/// Source of the user's answer.
pub trait FeedbackSource {
    /// Asks for feedback. Cancellation counts as [`Feedback::No`].
    fn ask(&mut self) -> Feedback;

    /// Returns false when no question should be asked at all.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Never asks; used for redirected input and `--no-feedback`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl FeedbackSource for NoFeedback {
    fn ask(&mut self) -> Feedback {
        Feedback::No
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Reads one answer line from any reader, writing the question to `prompt`.
pub struct LineFeedback<R, W> {
    input: R,
    prompt: W,
}

impl<R: BufRead, W: Write> LineFeedback<R, W> {
    /// Creates a line-based feedback source.
    pub const fn new(input: R, prompt: W) -> Self {
        Self { input, prompt }
    }
}

impl<R: BufRead, W: Write> FeedbackSource for LineFeedback<R, W> {
    fn ask(&mut self) -> Feedback {
        if write!(self.prompt, "{FEEDBACK_QUESTION}")
            .and_then(|()| self.prompt.flush())
            .is_err()
        {
            return Feedback::No;
        }
        read_answer(&mut self.input).map_or(Feedback::No, |line| Feedback::parse(&line))
    }
}

/// Prompts on the terminal; Ctrl-C at the prompt counts as no feedback.
///
/// Once the prompt is answered, Ctrl-C exits the process again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalFeedback;

impl FeedbackSource for TerminalFeedback {
    fn ask(&mut self) -> Feedback {
        let mut stderr = io::stderr();
        if write!(stderr, "{FEEDBACK_QUESTION}")
            .and_then(|()| stderr.flush())
            .is_err()
        {
            return Feedback::No;
        }

        let (tx, rx) = mpsc::channel::<Option<String>>();
        install_interrupt_handler();
        set_active_prompt(Some(tx.clone()));

        thread::spawn(move || {
            let answer = read_answer(&mut io::stdin().lock());
            let _ = tx.send(answer);
        });

        let answer = rx.recv().ok().flatten();
        set_active_prompt(None);
        if answer.is_none() {
            tracing::debug!("Feedback prompt cancelled");
            let _ = writeln!(stderr);
        }
        answer.map_or(Feedback::No, |line| Feedback::parse(&line))
    }
}

/// What a Ctrl-C does at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// A prompt was waiting; it reads as no feedback.
    CancelPrompt,
    /// No prompt is open; the process exits.
    Exit,
}

/// Installs the process-wide handler once.
fn install_interrupt_handler() {
    INTERRUPT_HANDLER.get_or_init(|| {
        let installed = ctrlc::set_handler(|| {
            if route_interrupt() == InterruptAction::Exit {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        });
        if let Err(e) = installed {
            tracing::warn!(error = %e, "Could not install interrupt handler");
        }
    });
}

fn set_active_prompt(sender: Option<mpsc::Sender<Option<String>>>) {
    if let Ok(mut active) = ACTIVE_PROMPT.lock() {
        *active = sender;
    }
}

/// Cancels the open prompt, if any.
fn route_interrupt() -> InterruptAction {
    let waiting = ACTIVE_PROMPT.lock().ok().and_then(|mut active| active.take());
    match waiting {
        Some(tx) => {
            let _ = tx.send(None);
            InterruptAction::CancelPrompt
        },
        None => InterruptAction::Exit,
    }
}

/// Reads one line; `None` on end-of-input or a read error.
fn read_answer<R: BufRead>(input: &mut R) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}
