//! The `dojo exam` command: a timed session driven by commands on stdin.

use std::time::Duration;

use anyhow::{Context as _, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use dojo_core::model::QuestionRecord;
use dojo_core::session::{format_elapsed, ExamSession, TimerSnapshot, Urgency};

use super::{score, Context};

const HELP: &str = "Commands: status, flag <id>, flags, stop, score, quit";

pub async fn execute(ctx: &Context, exam_id: &str, start_question: u32) -> Result<()> {
    let catalog = ctx.catalog_for(exam_id)?;
    let config = catalog.config(exam_id);
    let questions = catalog.questions(exam_id);
    let engine = ctx.engine(catalog);

    let session = ExamSession::new();
    let started = session.start(&config, start_question);
    println!(
        "Started {} ({} min, {} questions, {} points). Begin with question {}.",
        config.exam_name,
        config.duration_minutes,
        questions.len(),
        config.total_points,
        started.start_question
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "status" => print_status(&session.status()),
            "flag" => match session.toggle_flag(arg) {
                Ok(flagged) => {
                    let verb = if flagged { "Flagged" } else { "Unflagged" };
                    match topic_of(&questions, arg) {
                        Some(topic) => println!("{verb} question {arg} ({topic})"),
                        None => println!("{verb} question {arg}"),
                    }
                }
                Err(e) => println!("Cannot flag: {e}"),
            },
            "flags" => {
                let flags = session.flags();
                if flags.is_empty() {
                    println!("No flagged questions");
                } else {
                    println!("Flagged: {}", flags.join(", "));
                }
            }
            "stop" => {
                let stopped = session.stop();
                match (stopped.was_running, stopped.elapsed) {
                    (true, Some(elapsed)) => {
                        println!("Timer stopped after {}", format_elapsed(elapsed))
                    }
                    _ => println!("Timer is not running"),
                }
            }
            "score" => {
                let result = engine.score(&session, Some(exam_id)).await;
                return score::report(&result, false);
            }
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            other => println!("Unknown command: {other}. {HELP}"),
        }
    }

    Ok(())
}

fn topic_of<'a>(questions: &'a [QuestionRecord], id: &str) -> Option<&'a str> {
    questions
        .iter()
        .find(|q| q.id == id)
        .map(|q| q.topic.as_str())
}

fn print_status(snapshot: &TimerSnapshot) {
    if !snapshot.running {
        if snapshot.elapsed_seconds > 0 {
            println!("Time is up");
        } else {
            println!("Timer is not running");
        }
        return;
    }

    let remaining = format_elapsed(Duration::from_secs(snapshot.remaining_seconds));
    let elapsed = format_elapsed(Duration::from_secs(snapshot.elapsed_seconds));
    let marker = match snapshot.urgency {
        Urgency::Normal => "",
        Urgency::Warning => " [warning]",
        Urgency::Danger => " [hurry]",
    };
    println!("{remaining} remaining, {elapsed} elapsed{marker}");
}
