//! Interactive chat client for asking questions about a document.
//!
//! Upload a PDF or DOCX file to the document service, then ask questions;
//! answers are shown with the sources they were drawn from.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a service on http://localhost:8000/
//! docchat
//!
//! # Upload a file right away
//! docchat report.pdf
//!
//! # Point at another service and keep diagnostics in a file
//! RUST_LOG=docchat=debug docchat --base-url http://qa.internal:8000/ --log-file docchat.log
//! ```
//!
//! # Commands
//!
//! - `/upload <file>` - Upload a document
//! - `/status` - Show the upload status
//! - `/sources` - Show the sources of the latest answer
//! - `/history` - Print the conversation again
//! - `/quit` - Exit the application

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use arrrg::CommandLine;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing_subscriber::EnvFilter;

use docchat::chat::{
    ChatArgs, ChatCommand, ChatCompletion, ChatConfig, ChatSession, PlainTextRenderer, Renderer,
    UploadCompletion, help_text, parse_command,
};
use docchat::{UploadStatus, dedup_labels};

const PROMPT: &str = "You: ";

/// What the line editor thread reports.
enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Everything the event loop reacts to.
enum Event {
    Input(Input),
    Chat(ChatCompletion),
    Upload(UploadCompletion),
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Writes through rustyline's external printer so output lands above the
/// prompt instead of inside the line being typed.
struct PrinterWriter {
    printer: Box<dyn ExternalPrinter + Send>,
    buffer: Vec<u8>,
}

impl PrinterWriter {
    fn new(printer: Box<dyn ExternalPrinter + Send>) -> Self {
        Self {
            printer,
            buffer: Vec::new(),
        }
    }
}

impl Write for PrinterWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        if text.ends_with('\n') {
            text.pop();
        }
        self.printer
            .print(text)
            .map_err(|err| io::Error::other(err.to_string()))
    }
}

/// Main entry point for the docchat application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = ChatArgs::from_command_line_relaxed("docchat [OPTIONS] [FILE]");
    let startup_file = startup_file(&free)?;
    let config = ChatConfig::from_args(args)?;
    init_logging(&config)?;

    let mut session = ChatSession::connect(&config)?;
    let (events, mut inbox) = mpsc::unbounded_channel();
    let printer = spawn_line_editor(events.clone())?;
    let mut renderer = PlainTextRenderer::with_writer(PrinterWriter::new(printer), config.use_color);

    renderer.print_info(&format!("Document chat ({})", config.base_url));
    renderer.print_info("Type /help for commands, /quit to exit\n");
    for message in session.transcript() {
        renderer.print_message(message);
    }

    if let Some(path) = startup_file {
        start_upload(&mut session, &mut renderer, &events, path).await;
    }

    while let Some(event) = inbox.recv().await {
        match event {
            Event::Input(Input::Line(line)) => {
                if handle_line(&line, &mut session, &mut renderer, &events, &config).await
                    == Flow::Quit
                {
                    break;
                }
            }
            Event::Input(Input::Interrupted) => {
                // Ctrl+C at prompt - nothing to cancel
                continue;
            }
            Event::Input(Input::Eof) => {
                renderer.print_info("Goodbye!");
                break;
            }
            Event::Input(Input::Failed(err)) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
            Event::Chat(completion) => {
                if let Some(message) = session.finish_question(completion) {
                    renderer.print_message(message);
                }
            }
            Event::Upload(completion) => {
                let status = session.finish_upload(completion);
                let file_name = session.active_file().map(|f| f.file_name());
                renderer.print_upload_status(status, file_name);
            }
        }
    }

    Ok(())
}

/// The optional file to upload at startup. At most one may be given.
fn startup_file(free: &[String]) -> Result<Option<&str>, docchat::Error> {
    match free {
        [] => Ok(None),
        [path] => Ok(Some(path.as_str())),
        [_, extra @ ..] => Err(docchat::Error::validation(
            format!(
                "expected at most one FILE, got {} extra: {}",
                extra.len(),
                extra.join(" ")
            ),
            Some("FILE".to_string()),
        )),
    }
}

/// Install the diagnostics subscriber. Silent unless `RUST_LOG` asks for output.
fn init_logging(config: &ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

/// Run the line editor on its own thread, forwarding each line as an event.
///
/// Returns the printer the event loop uses for all output.
fn spawn_line_editor(
    events: UnboundedSender<Event>,
) -> Result<Box<dyn ExternalPrinter + Send>, Box<dyn std::error::Error>> {
    let (printer_tx, printer_rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(err) => {
                let _ = printer_tx.send(Err(err));
                return;
            }
        };
        match rl.create_external_printer() {
            Ok(printer) => {
                let printer: Box<dyn ExternalPrinter + Send> = Box::new(printer);
                let _ = printer_tx.send(Ok(printer));
            }
            Err(err) => {
                let _ = printer_tx.send(Err(err));
                return;
            }
        }
        loop {
            let input = match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted) => Input::Interrupted,
                Err(ReadlineError::Eof) => Input::Eof,
                Err(err) => Input::Failed(err.to_string()),
            };
            let last = matches!(input, Input::Eof | Input::Failed(_));
            if events.send(Event::Input(input)).is_err() || last {
                break;
            }
        }
    });
    Ok(printer_rx.recv()??)
}

async fn handle_line<R: Renderer>(
    line: &str,
    session: &mut ChatSession,
    renderer: &mut R,
    events: &UnboundedSender<Event>,
    config: &ChatConfig,
) -> Flow {
    let Some(cmd) = parse_command(line) else {
        ask(line, session, renderer, events);
        return Flow::Continue;
    };
    match cmd {
        ChatCommand::Quit => {
            renderer.print_info("Goodbye!");
            return Flow::Quit;
        }
        ChatCommand::Upload(path) => {
            start_upload(session, renderer, events, &path).await;
        }
        ChatCommand::Status => {
            let file_name = session.active_file().map(|f| f.file_name());
            renderer.print_upload_status(session.upload_status(), file_name);
            if let Some(receipt) = session.upload_receipt() {
                if let Some(chunks) = receipt.chunks {
                    renderer.print_info(&format!("    {chunks} chunks indexed"));
                }
                if let Some(error) = receipt.error.as_deref() {
                    renderer.print_info(&format!("    service reported: {error}"));
                }
            }
        }
        ChatCommand::Sources => match session.last_answer() {
            Some(answer) if !answer.sources().is_empty() => {
                let mut text = String::from("    Sources of the latest answer:");
                for label in dedup_labels(answer.sources()) {
                    text.push_str(&format!("\n      - {label}"));
                }
                renderer.print_info(&text);
            }
            _ => renderer.print_info("    No sources for the latest answer."),
        },
        ChatCommand::History => {
            for message in session.transcript() {
                renderer.print_message(message);
            }
        }
        ChatCommand::Stats => print_stats(session, renderer),
        ChatCommand::ShowConfig => print_config(config, renderer),
        ChatCommand::Help => {
            let text = help_text()
                .lines()
                .map(|line| format!("    {}", line))
                .collect::<Vec<_>>()
                .join("\n");
            renderer.print_info(&text);
        }
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    Flow::Continue
}

/// Send a question in the background; the answer comes back as an event.
fn ask<R: Renderer>(
    line: &str,
    session: &mut ChatSession,
    renderer: &mut R,
    events: &UnboundedSender<Event>,
) {
    match session.begin_question(line) {
        Some(pending) => {
            renderer.print_waiting();
            let service = session.service();
            let events = events.clone();
            tokio::spawn(async move {
                let completion = pending.send(service.as_ref()).await;
                let _ = events.send(Event::Chat(completion));
            });
        }
        None if session.is_pending() && !line.trim().is_empty() => {
            renderer.print_info("Still waiting for the previous answer.");
        }
        None => {}
    }
}

/// Pick `path` and upload it in the background.
async fn start_upload<R: Renderer>(
    session: &mut ChatSession,
    renderer: &mut R,
    events: &UnboundedSender<Event>,
    path: &str,
) {
    let file = match session.pick_file(expand_home(path)).await {
        Ok(file) => file,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return;
        }
    };
    let ticket = session.select_file(file);
    renderer.print_upload_status(UploadStatus::Uploading, Some(ticket.file().file_name()));
    let service = session.service();
    let events = events.clone();
    tokio::spawn(async move {
        let completion = ticket.send(service.as_ref()).await;
        let _ = events.send(Event::Upload(completion));
    });
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

fn print_stats<R: Renderer>(session: &ChatSession, renderer: &mut R) {
    let stats = session.stats();
    let mut lines = vec![
        "    Session Statistics:".to_string(),
        format!("      Messages: {}", stats.message_count),
        format!(
            "      Questions: {} sent, {} failed, {} rejected while waiting",
            stats.questions_sent, stats.questions_failed, stats.questions_rejected
        ),
        format!(
            "      Uploads: {} started, {} failed",
            stats.uploads_started, stats.uploads_failed
        ),
        format!(
            "      Waiting for answer: {}",
            if stats.pending { "yes" } else { "no" }
        ),
    ];
    match stats.active_file {
        Some(ref name) => lines.push(format!(
            "      Active file: {} ({})",
            name,
            describe_status(stats.upload_status)
        )),
        None => lines.push("      Active file: (none)".to_string()),
    }
    renderer.print_info(&lines.join("\n"));
}

fn print_config<R: Renderer>(config: &ChatConfig, renderer: &mut R) {
    let lines = [
        "    Current Configuration:".to_string(),
        format!("      Service: {}", config.base_url),
        format!("      Timeout: {}s", config.timeout.as_secs()),
        format!(
            "      Accepted files: {}",
            config.accepted_extensions.join(", ")
        ),
        format!(
            "      Colors: {}",
            if config.use_color { "on" } else { "off" }
        ),
        match config.log_file {
            Some(ref path) => format!("      Log file: {}", path.display()),
            None => "      Log file: (stderr)".to_string(),
        },
    ];
    renderer.print_info(&lines.join("\n"));
}

fn describe_status(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Idle => "idle",
        UploadStatus::Uploading => "uploading",
        UploadStatus::Success => "uploaded",
        UploadStatus::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn startup_file_is_optional() {
        assert_eq!(startup_file(&[]).unwrap(), None);
        let free = args(&["report.pdf"]);
        assert_eq!(startup_file(&free).unwrap(), Some("report.pdf"));
    }

    #[test]
    fn extra_startup_files_are_rejected() {
        let free = args(&["report.pdf", "notes.docx", "plan.pdf"]);
        let err = startup_file(&free).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("notes.docx plan.pdf"));
    }

    #[test]
    fn home_is_expanded() {
        assert_eq!(expand_home("/tmp/a.pdf"), PathBuf::from("/tmp/a.pdf"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/a.pdf"), PathBuf::from(home).join("a.pdf"));
        }
    }
}
