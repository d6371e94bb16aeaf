//! The `ldscreen start` and `ldscreen submit` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use ldscreen_core::attempt::Submission;
use ldscreen_core::model::ItemSet;
use ldscreen_core::parser::{find_set, load_item_banks};
use ldscreen_core::results::{Outcome, ScoredResult};

use super::open_engine;

pub fn start(
    config: Option<PathBuf>,
    user: String,
    item_bank: PathBuf,
    set_id: String,
) -> Result<()> {
    let banks = load_item_banks(&item_bank)?;
    let set = find_set(&banks, &set_id)
        .with_context(|| format!("set '{set_id}' not found in {}", item_bank.display()))?;
    if set.items.is_empty() {
        anyhow::bail!("set '{set_id}' has no items");
    }

    let (_, engine) = open_engine(config)?;
    let attempt = engine.start_attempt(&user, set.items.clone(), Utc::now())?;

    println!("Attempt: {}", attempt.id);
    println!(
        "{} test '{}', submit before {}",
        attempt.domain().label(),
        set_id,
        attempt.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    print_items(&attempt.items);
    Ok(())
}

fn print_items(items: &ItemSet) {
    match items {
        ItemSet::Math { items } => {
            for (i, item) in items.iter().enumerate() {
                println!("{:>3}. {} = ?", i + 1, item);
            }
        }
        ItemSet::Grammar { items } => print_choices(items),
        ItemSet::Scenario { story, items } => {
            if !story.is_empty() {
                println!("{story}\n");
            }
            print_choices(items);
        }
        ItemSet::Reading { passage } => {
            println!("Read aloud, then submit the transcript with --text:\n");
            println!("{passage}");
        }
        ItemSet::Memory { sequence } => {
            let digits: Vec<String> = sequence.iter().map(ToString::to_string).collect();
            println!("Memorize: {}", digits.join(" "));
            println!("Submit the recalled digits with --text.");
        }
    }
}

fn print_choices(items: &[ldscreen_core::model::ChoiceItem]) {
    for (i, item) in items.iter().enumerate() {
        println!("{:>3}. {}", i + 1, item.prompt);
        if !item.options.is_empty() {
            println!("     options: {}", item.options.join(" / "));
        }
    }
}

pub fn submit(
    config: Option<PathBuf>,
    user: String,
    attempt_id: Uuid,
    answers: Vec<String>,
    text: Option<String>,
) -> Result<()> {
    let submission = match text {
        Some(text) => Submission::text(attempt_id, text),
        None => Submission::answers(attempt_id, answers.into_iter().enumerate()),
    };

    let (_, engine) = open_engine(config)?;
    let result = engine.submit(&user, &submission, Utc::now())?;
    print_result(&result);
    Ok(())
}

fn print_result(result: &ScoredResult) {
    println!(
        "{} test graded in {} seconds.",
        result.domain.label(),
        result.duration_seconds
    );

    match &result.outcome {
        Outcome::Items {
            correct_count,
            total_count,
            details,
        } => {
            println!("Score: {correct_count} / {total_count}");
            let mut table = Table::new();
            table.set_header(vec!["#", "Item", "Your answer", "Correct", "Result"]);
            for (i, d) in details.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&d.item),
                    Cell::new(d.given.as_ref().map(ToString::to_string).unwrap_or_default()),
                    Cell::new(&d.expected),
                    Cell::new(if d.is_correct { "OK" } else { "WRONG" }),
                ]);
            }
            println!("\n{table}");
        }
        Outcome::Memory {
            correct_count,
            total_count,
            target_sequence,
            recalled_sequence,
        } => {
            println!("Score: {correct_count} / {total_count}");
            println!("Target:   {target_sequence:?}");
            println!("Recalled: {recalled_sequence:?}");
        }
        Outcome::Reading(detail) => {
            println!("WPM: {:.1}", detail.words_per_minute);
            println!("Accuracy: {:.2}", detail.token_overlap_accuracy);
        }
    }
}
