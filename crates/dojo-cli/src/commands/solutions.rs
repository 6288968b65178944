//! The `dojo solutions` command.

use anyhow::Result;

use super::Context;

pub fn execute(ctx: &Context, exam_id: &str, question: Option<&str>, json: bool) -> Result<()> {
    let catalog = ctx.catalog_for(exam_id)?;

    if let Some(question_id) = question {
        let Some(solution) = catalog.solution(exam_id, question_id) else {
            anyhow::bail!("no solution for question {question_id} in {exam_id}");
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&solution)?);
        } else {
            println!("## Solution {} | {}\n", solution.id, solution.topic);
            println!("{}", solution.content);
        }
        return Ok(());
    }

    let solutions = catalog.solutions(exam_id);
    if json {
        println!("{}", serde_json::to_string_pretty(&solutions)?);
        return Ok(());
    }

    if solutions.is_empty() {
        println!("No solutions available for {exam_id}");
        return Ok(());
    }

    for s in &solutions {
        println!("  {:<6} {}", s.id, s.topic);
    }
    println!("\nUse --question <id> to show one solution.");
    Ok(())
}
