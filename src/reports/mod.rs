use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use m209_analyzer::attack::AttackSummary;
use m209_analyzer::error::AttackResult;
use m209_analyzer::machine::symbols_to_text;

const PREVIEW_LEN: usize = 60;

pub fn print_summary(summary: &AttackSummary, json: bool) -> AttackResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
        return Ok(());
    }
    print_best_list(summary);
    print_best_key(summary);
    Ok(())
}

pub fn print_best_list(summary: &AttackSummary) {
    let simulated = summary.original_key.is_some();
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Score").fg(Color::Cyan),
    ];
    if simulated {
        header.push(Cell::new("Pins ✗").fg(Color::Red));
        header.push(Cell::new("Lugs ✗").fg(Color::Red));
    }
    header.push(Cell::new("Decryption").add_attribute(Attribute::Bold));
    table.add_row(header);

    let numeric_cols = if simulated { 3 } else { 1 };
    for i in 0..=numeric_cols {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for (rank, entry) in summary.entries.iter().enumerate() {
        let preview: String = symbols_to_text(&entry.decryption)
            .chars()
            .take(PREVIEW_LEN)
            .collect();
        let mut row = vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:.2}", entry.score)).fg(Color::Cyan),
        ];
        if let Some(original) = &summary.original_key {
            row.push(Cell::new(entry.key.incorrect_pins(original)));
            row.push(Cell::new(entry.key.incorrect_lugs(original)));
        }
        row.push(Cell::new(preview));
        table.add_row(row);
    }

    println!(
        "\n{} attack: {} evaluations in {:.1}s on {} worker(s){}",
        summary.attack_type,
        summary.evaluations,
        summary.elapsed.as_secs_f64(),
        summary.workers,
        if summary.cancelled { " (stopped)" } else { "" }
    );
    if let Some(score) = summary.original_score {
        println!("Original key score: {:.2}", score);
    }
    println!("{}", table);
}

fn print_best_key(summary: &AttackSummary) {
    if let Some(best) = summary.best() {
        println!("\nBest key:\n{}", best.key);
        println!("\nPlaintext:\n{}", symbols_to_text(&best.decryption));
    } else {
        println!("\nNo candidates found.");
    }
}
