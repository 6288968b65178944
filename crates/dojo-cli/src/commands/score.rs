//! The `dojo score` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use dojo_core::scoring::ScoreResult;
use dojo_core::session::ExamSession;

use super::Context;

pub async fn execute(ctx: &Context, exam_id: &str, json: bool) -> Result<()> {
    let engine = ctx.engine(ctx.catalog_for(exam_id)?);
    let result = engine.score(&ExamSession::new(), Some(exam_id)).await;
    report(&result, json)
}

/// Print a score result; a failed run becomes the command's error.
pub fn report(result: &ScoreResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.success {
        print_summary(result);
    }

    match (&result.error, result.success) {
        (_, true) => Ok(()),
        (Some(error), false) => anyhow::bail!("{error}"),
        (None, false) => anyhow::bail!("scoring failed"),
    }
}

fn print_summary(result: &ScoreResult) {
    if !result.items.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Question", "Score", "Topic", ""]);
        for item in &result.items {
            table.add_row(vec![
                Cell::new(&item.id),
                Cell::new(format!("{}/{}", item.score, item.max_score)),
                Cell::new(&item.topic),
                Cell::new(if item.passed { "ok" } else { "" }),
            ]);
        }
        println!("{table}");
    }

    println!(
        "Total: {} / {} ({}%)",
        result.total_score, result.max_score, result.percentage
    );
    if let Some(elapsed) = &result.elapsed_formatted {
        println!("Time: {elapsed}");
    }
    println!(
        "Result: {} (passing score {}%)",
        if result.passed { "PASS" } else { "FAIL" },
        result.passing_percentage
    );
    if result.solutions_available {
        if let Some(exam_id) = &result.exam_id {
            println!("Solutions: dojo solutions -e {exam_id}");
        }
    }
}
