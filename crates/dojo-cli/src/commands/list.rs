//! The `dojo list` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog();
    let exams = catalog.list();

    if exams.is_empty() {
        println!("No exams found in {}", catalog.exams_dir().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Exam", "Name", "Duration", "Questions", "Points"]);
    for exam in &exams {
        table.add_row(vec![
            Cell::new(&exam.id),
            Cell::new(&exam.name),
            Cell::new(format!("{} min", exam.duration)),
            Cell::new(exam.questions),
            Cell::new(exam.points),
        ]);
    }

    println!("{table}");
    Ok(())
}
