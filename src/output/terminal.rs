// Colored terminal output for ranked authors and batch-pass summaries.
//
// This module handles all terminal-specific formatting. The main.rs
// display code delegates here.

use colored::Colorize;

use crate::db::models::RankedAuthor;
use crate::pipeline::PassSummary;

/// Display a ranked author list in the terminal.
pub fn display_ranked_authors(authors: &[RankedAuthor]) {
    if authors.is_empty() {
        println!("No matching authors. The query keywords' neighborhoods");
        println!("intersect no stored publication fingerprints.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Ranked Authors ({} results) ===", authors.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<40} {:>12}",
        "Rank".dimmed(),
        "Author".dimmed(),
        "Score".dimmed(),
    );
    println!("  {}", "-".repeat(60).dimmed());

    for (i, author) in authors.iter().enumerate() {
        let score = format!("{:>12.3}", author.score);
        let colored_score = if i == 0 {
            score.bright_green()
        } else {
            score.normal()
        };
        println!("  {:>4}. {:<40} {}", i + 1, author.name, colored_score);
    }
    println!();
}

/// Display the outcome counts of a batch pass.
pub fn display_pass_summary(label: &str, summary: &PassSummary) {
    println!("\n{}", format!("=== {label} ===").bold());
    println!("  Processed: {}", summary.processed);
    println!("  Assigned:  {}", summary.assigned);
    println!("  Skipped:   {}", summary.skipped);
    if summary.failed > 0 {
        println!("  {} {}", "Failed:".red(), summary.failed);
    } else {
        println!("  Failed:    0");
    }
}
