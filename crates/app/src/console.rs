use async_trait::async_trait;
use exam_core::model::{ArchivedTest, SlotKey, SlotView};
use exam_core::time::format_hms;
use exam_core::Progress;
use services::{
    ArchiveStats, ConfirmPrompt, DASHBOARD_RECENT, ExamController, ResumeOutcome, ServiceError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::commands::{self, Command, HELP};

/// Read stdin line by line on a background task.
pub fn spawn_stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Asks on stdout and takes the next input line as the answer.
struct LinePrompt<'a> {
    lines: &'a mut mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl ConfirmPrompt for LinePrompt<'_> {
    async fn confirm(&mut self, message: &str) -> bool {
        println!("{message} [y/N]");
        self.lines.recv().await.is_some_and(|line| is_yes(&line))
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

enum Flow {
    Continue,
    Quit,
}

/// Drive the controller from console input and its own periodic ticks.
///
/// # Errors
///
/// Returns storage failures hit while loading the dashboard.
pub async fn run(
    mut controller: ExamController,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> Result<(), ServiceError> {
    println!("Theme: {}", controller.theme().await?);
    print_dashboard(&controller).await?;

    let outcome = controller
        .resume_on_launch(&mut LinePrompt { lines: &mut lines })
        .await?;
    if outcome != ResumeOutcome::NothingToResume {
        report_resume(&controller, &outcome);
    }

    println!("Type `help` for commands.");
    loop {
        tokio::select! {
            event = controller.next_event() => {
                if let Some(elapsed) = controller.on_event(event).await {
                    trace!(elapsed, "tick");
                }
            }
            line = lines.recv() => {
                let Some(line) = line else { break };
                match commands::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => {
                        match execute(&mut controller, &mut lines, command).await {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Quit) => break,
                            Err(err) => println!("Error: {err}"),
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    if controller.is_active() {
        // Keep the latest elapsed time so the next launch can offer it.
        controller.on_autosave_tick().await;
    }
    debug!("console closed");
    Ok(())
}

async fn execute(
    controller: &mut ExamController,
    lines: &mut mpsc::UnboundedReceiver<String>,
    command: Command,
) -> Result<Flow, ServiceError> {
    match command {
        Command::Start { counts, name } => {
            let session = controller.start_test(&name, counts).await?;
            println!(
                "Started \"{}\" with {} questions per subject.",
                session.name(),
                counts.per_subject()
            );
            print_section(controller);
        }
        Command::Answer { key, index, value } => {
            match controller.answer(key, index, &value).await {
                Some(progress) => println!("{}", progress_line(progress)),
                None => println!("{}", ignored_reason(controller, key, index)),
            }
        }
        Command::Clear { key, index } => match controller.clear_answer(key, index).await {
            Some(progress) => println!("{}", progress_line(progress)),
            None => println!("{}", ignored_reason(controller, key, index)),
        },
        Command::Go(key) => {
            controller.navigate(key);
            print_section(controller);
        }
        Command::Show => print_section(controller),
        Command::Progress => println!("{}", progress_line(controller.progress())),
        Command::Time => println!("{}", controller.elapsed_display()),
        Command::End => {
            if !controller.is_active() {
                println!("No test in progress.");
                return Ok(Flow::Continue);
            }
            let confirmed = LinePrompt { lines }
                .confirm("Are you sure you want to end the test?")
                .await;
            if confirmed {
                let record = controller.end_test().await?;
                println!(
                    "Test completed successfully: {} in {}.",
                    record.display_name(),
                    format_hms(record.elapsed_seconds())
                );
            }
        }
        Command::Resume => {
            let outcome = controller.quick_resume(&mut LinePrompt { lines }).await?;
            report_resume(controller, &outcome);
        }
        Command::Reset => {
            controller.reset();
            println!("Test abandoned. It can still be resumed.");
        }
        Command::Recent(limit) => {
            let recent = controller.recent(limit.unwrap_or(DASHBOARD_RECENT)).await?;
            if recent.is_empty() {
                println!("No archived tests yet.");
            }
            for record in recent.iter() {
                println!("{}", card_line(record));
            }
        }
        Command::Stats => println!("{}", stats_line(controller.stats().await?)),
        Command::Theme => println!("Theme: {}", controller.toggle_theme().await?),
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn print_dashboard(controller: &ExamController) -> Result<(), ServiceError> {
    println!("{}", stats_line(controller.stats().await?));
    for record in controller.recent(DASHBOARD_RECENT).await?.iter() {
        println!("{}", card_line(record));
    }
    Ok(())
}

fn report_resume(controller: &ExamController, outcome: &ResumeOutcome) {
    match outcome {
        ResumeOutcome::Resumed(snapshot) => {
            println!(
                "Resumed \"{}\" at {}.",
                snapshot.session().name(),
                controller.elapsed_display()
            );
            print_section(controller);
        }
        ResumeOutcome::Declined => {}
        ResumeOutcome::NothingToResume => println!("No previous test found to resume"),
    }
}

fn print_section(controller: &ExamController) {
    if !controller.is_active() {
        println!("No test in progress.");
        return;
    }
    let key = controller.cursor();
    println!("{}", section_header(key, controller.section_progress(key)));
    for line in slot_lines(&controller.slot_views(key)) {
        println!("{line}");
    }
    println!("{}  {}", progress_line(controller.progress()), controller.elapsed_display());
}

fn ignored_reason(controller: &ExamController, key: SlotKey, index: usize) -> String {
    if controller.is_active() {
        format!("{key} has no question {}.", index + 1)
    } else {
        "No test in progress.".to_owned()
    }
}

fn section_header(key: SlotKey, progress: Progress) -> String {
    format!(
        "── {} / {} ({}/{}) ──",
        key.subject, key.section, progress.answered, progress.total
    )
}

fn slot_lines(views: &[SlotView<'_>]) -> Vec<String> {
    views
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let value = match (view.choice, view.custom) {
                (Some(choice), _) => format!("[{choice}]"),
                (None, Some(text)) => format!("\"{text}\""),
                (None, None) => "-".to_owned(),
            };
            format!("{:>3}. {value}", i + 1)
        })
        .collect()
}

fn progress_line(progress: Progress) -> String {
    format!("{}% Complete", progress.rounded_percent())
}

fn card_line(record: &ArchivedTest) -> String {
    format!(
        "{} | {} | {} | {} Questions",
        record.display_name(),
        record.completion_label(),
        format_hms(record.elapsed_seconds()),
        record.question_count()
    )
}

fn stats_line(stats: ArchiveStats) -> String {
    format!(
        "Total tests: {}  Completed: {}  Fully answered: {}",
        stats.total, stats.completed, stats.fully_answered
    )
}
