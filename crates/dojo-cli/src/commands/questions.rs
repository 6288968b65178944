//! The `dojo questions` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::Context;

pub fn execute(ctx: &Context, exam_id: &str, json: bool) -> Result<()> {
    let questions = ctx.catalog_for(exam_id)?.questions(exam_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No questions found for {exam_id}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Topic", "Points", "Namespace", "Files"]);
    for q in &questions {
        let id = if q.is_preview {
            format!("{} (preview)", q.id)
        } else {
            q.id.clone()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(&q.topic),
            Cell::new(q.points),
            Cell::new(&q.namespace),
            Cell::new(&q.files),
        ]);
    }

    println!("{table}");
    println!(
        "{} question(s), {} point(s)",
        questions.len(),
        questions.iter().map(|q| q.points).sum::<u32>()
    );
    Ok(())
}
