//! The `dojo info` command.

use anyhow::Result;

use super::Context;

pub fn execute(ctx: &Context, exam_id: &str) -> Result<()> {
    let catalog = ctx.catalog_for(exam_id)?;
    let config = catalog.config(exam_id);

    println!("Exam: {} ({})", config.exam_name, config.exam_id);
    if let Some(version) = &config.version {
        println!("Version: {version}");
    }
    println!("Duration: {} min", config.duration_minutes);
    println!("Warning at: {} min remaining", config.warning_minutes);
    println!("Questions: {}", config.total_questions);
    if config.preview_questions > 0 {
        println!("Preview questions: {}", config.preview_questions);
    }
    println!("Points: {}", config.total_points);
    println!("Passing: {}%", config.passing_percentage);
    println!(
        "Solutions: {}",
        if catalog.solutions_available(exam_id) {
            "available"
        } else {
            "not available"
        }
    );

    Ok(())
}
