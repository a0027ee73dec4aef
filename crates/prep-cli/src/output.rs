use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use prep_lock::LockedResource;
use prep_model::{Action, Identifiable, Preparation, Step};

pub fn print_preparations(preparations: &[Preparation]) {
    let mut table = styled_table(&["Id", "Name", "Data set", "Author", "Modified"]);
    for preparation in preparations {
        table.add_row(vec![
            Cell::new(short(preparation.id())),
            Cell::new(&preparation.name),
            Cell::new(&preparation.data_set_id),
            Cell::new(&preparation.author),
            dim_cell(timestamp(preparation.last_modified_at)),
        ]);
    }
    println!("{table}");
}

pub fn print_preparation(preparation: &Preparation, steps: usize) {
    println!("Preparation: {}", preparation.id());
    println!("Name:        {}", preparation.name);
    println!("Data set:    {}", preparation.data_set_id);
    println!("Author:      {}", preparation.author);
    println!("Head:        {}", preparation.head_id);
    println!("Steps:       {steps}");
    println!("Created:     {}", timestamp(preparation.created_at));
    println!("Modified:    {}", timestamp(preparation.last_modified_at));
}

pub fn print_steps(steps: &[Step], head_id: &str) {
    let mut table = styled_table(&["#", "Step", "Parent", "Created columns"]);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, step) in steps.iter().enumerate() {
        let id = if step.id() == head_id {
            Cell::new(format!("{} (head)", step.id()))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(step.id())
        };
        table.add_row(vec![
            Cell::new(index),
            id,
            step.parent().map_or_else(|| dim_cell("root"), |p| Cell::new(short(p))),
            Cell::new(step.diff().created_columns.join(", ")),
        ]);
    }
    println!("{table}");
}

pub fn print_actions(actions: &[Action]) {
    if actions.is_empty() {
        println!("No actions.");
        return;
    }
    let mut table = styled_table(&["#", "Action", "Column", "Parameters"]);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, action) in actions.iter().enumerate() {
        let parameters: Vec<String> = action
            .parameters
            .iter()
            .filter(|(key, _)| key.as_str() != prep_model::COLUMN_ID)
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&action.name),
            action.column_id().map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(parameters.join(" ")),
        ]);
    }
    println!("{table}");
}

pub fn print_locks(locks: &[LockedResource], now: i64) {
    if locks.is_empty() {
        println!("No locks.");
        return;
    }
    let mut table = styled_table(&["Resource", "Owner", "Expires"]);
    for lock in locks {
        let expires = DateTime::<Utc>::from_timestamp(lock.expiration_time, 0)
            .map_or_else(|| lock.expiration_time.to_string(), timestamp);
        let expires = if lock.is_expired(now) {
            dim_cell(format!("{expires} (expired)"))
        } else {
            Cell::new(expires)
        };
        table.add_row(vec![
            Cell::new(short(&lock.resource_id)),
            Cell::new(&lock.owner_id),
            expires,
        ]);
    }
    println!("{table}");
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(headers.iter().map(|label| header_cell(label)).collect::<Vec<_>>());
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

/// Ids are 64 hex characters; 12 are enough to tell them apart on screen.
fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
