//! Text output for the terminal.
//!
//! Renderers take library records and return plain `String`s; handlers decide
//! where to print them. Styling goes through `console`, which drops ANSI codes
//! when stdout is not a terminal, so tests can compare text directly.

use chrono::{DateTime, Utc};
use console::Style;
use plantshelfapp::api::{LineageView, ShelfView};
use plantshelfapp::grid::Occupancy;
use plantshelfapp::model::{Plant, PlantId, Shelf, ShelfId};
use plantshelfapp::search::TagCount;
use std::collections::HashMap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Characters of an id shown in listings. Longer than the accepted prefix.
const SHORT_ID: usize = 8;
const NAME_WIDTH: usize = 28;
const CELL_WIDTH: usize = 10;

fn muted() -> Style {
    Style::new().dim()
}

fn title() -> Style {
    Style::new().bold()
}

fn tag_style() -> Style {
    Style::new().cyan()
}

pub fn short_id(id: &impl ToString) -> String {
    id.to_string().chars().take(SHORT_ID).collect()
}

/// Truncates to at most `max` display columns, marking cuts with `…`.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Pads with spaces to exactly `width` display columns (after truncation).
pub fn pad_to_width(text: &str, width: usize) -> String {
    let text = truncate_to_width(text, width);
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

pub fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now()
        .signed_duration_since(timestamp)
        .to_std()
        .unwrap_or_default();
    timeago::Formatter::new().convert(elapsed)
}

fn tag_list(plant: &Plant) -> String {
    plant
        .tags
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn position_label(plant: &Plant, shelf_names: &HashMap<ShelfId, String>) -> String {
    match plant.position {
        Some(pos) => {
            let shelf = shelf_names
                .get(&pos.shelf_id)
                .cloned()
                .unwrap_or_else(|| short_id(&pos.shelf_id));
            format!("{} [{},{}]", shelf, pos.row, pos.column)
        }
        None => "unplaced".to_string(),
    }
}

/// One line per plant: id, name, where it sits, tags, last change.
pub fn plant_list(plants: &[Plant], shelf_names: &HashMap<ShelfId, String>) -> String {
    if plants.is_empty() {
        return muted().apply_to("No plants.").to_string();
    }
    plants
        .iter()
        .map(|p| {
            format!(
                "{}  {}  {}  {}  {}",
                muted().apply_to(short_id(&p.id)),
                pad_to_width(&p.name, NAME_WIDTH),
                pad_to_width(&position_label(p, shelf_names), 18),
                tag_style().apply_to(tag_list(p)),
                muted().apply_to(format_time_ago(p.updated_at)),
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn plant_detail(
    plant: &Plant,
    shelf_names: &HashMap<ShelfId, String>,
    plant_names: &HashMap<PlantId, String>,
) -> String {
    let mut lines = vec![
        format!("{}  {}", title().apply_to(&plant.name), muted().apply_to(plant.id)),
    ];
    if !plant.description.is_empty() {
        lines.push(plant.description.clone());
    }
    lines.push(format!("visibility: {}", plant.visibility));
    if let Some(owner) = &plant.owner_id {
        lines.push(format!("owner:      {}", owner));
    }
    lines.push(format!("position:   {}", position_label(plant, shelf_names)));
    if let Some(parent) = plant.parent_id {
        let name = plant_names.get(&parent).cloned().unwrap_or_default();
        lines.push(format!("parent:     {} {}", short_id(&parent), name));
    }
    if !plant.tags.is_empty() {
        lines.push(format!("tags:       {}", tag_style().apply_to(tag_list(plant))));
    }
    if let Some(at) = plant.care.last_watered {
        lines.push(format!("watered:    {}", format_time_ago(at)));
    }
    if let Some(due) = plant.care.next_watering_due {
        lines.push(format!("next water: {}", due.format("%Y-%m-%d")));
    }
    for image in &plant.images {
        lines.push(format!("image:      {}", image.uri));
    }
    lines.push(format!(
        "{}",
        muted().apply_to(format!(
            "created {}, updated {}",
            format_time_ago(plant.created_at),
            format_time_ago(plant.updated_at)
        ))
    ));
    lines.join("\n")
}

pub fn shelf_list(shelves: &[(Shelf, Occupancy)]) -> String {
    if shelves.is_empty() {
        return muted().apply_to("No shelves.").to_string();
    }
    shelves
        .iter()
        .map(|(shelf, occ)| {
            format!(
                "{}  {}  {}x{}  {}/{} occupied",
                muted().apply_to(short_id(&shelf.id)),
                pad_to_width(&shelf.name, NAME_WIDTH),
                shelf.rows,
                shelf.columns,
                occ.occupied,
                occ.total,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The shelf as a grid of fixed-width cells, `·` for empty ones.
pub fn shelf_grid(view: &ShelfView, plant_names: &HashMap<PlantId, String>) -> String {
    let mut lines = vec![format!(
        "{}  {}x{}  {}/{} occupied",
        title().apply_to(&view.shelf.name),
        view.shelf.rows,
        view.shelf.columns,
        view.occupancy.occupied,
        view.occupancy.total
    )];

    let header: String = (0..view.shelf.columns)
        .map(|c| pad_to_width(&c.to_string(), CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(format!("    {}", header).trim_end().to_string());

    for (row, cells) in view.layout.iter().enumerate() {
        let rendered: Vec<String> = cells
            .iter()
            .map(|cell| match cell {
                Some(id) => {
                    let name = plant_names.get(id).cloned().unwrap_or_else(|| short_id(id));
                    pad_to_width(&name, CELL_WIDTH)
                }
                None => pad_to_width("·", CELL_WIDTH),
            })
            .collect();
        lines.push(format!("{:>3} {}", row, rendered.join(" ")).trim_end().to_string());
    }
    lines.join("\n")
}

pub fn lineage_tree(view: &LineageView, plant_names: &HashMap<PlantId, String>) -> String {
    let label = |id: &PlantId| {
        format!(
            "{} {}",
            short_id(id),
            plant_names.get(id).map(String::as_str).unwrap_or("?")
        )
    };

    let mut lines = Vec::new();
    let chain: Vec<&PlantId> = view.ancestors.iter().rev().collect();
    for (depth, id) in chain.iter().enumerate() {
        lines.push(format!("{}{}", "  ".repeat(depth), muted().apply_to(label(*id))));
    }
    let depth = chain.len();
    lines.push(format!(
        "{}{}",
        "  ".repeat(depth),
        title().apply_to(label(&view.plant.id))
    ));
    for child in &view.children {
        lines.push(format!("{}└─ {}", "  ".repeat(depth), label(child)));
    }
    let indirect = view.descendants.len().saturating_sub(view.children.len());
    if indirect > 0 {
        lines.push(format!(
            "{}{}",
            "  ".repeat(depth + 1),
            muted().apply_to(format!("+{} more descendants", indirect))
        ));
    }
    lines.join("\n")
}

pub fn tag_counts(counts: &[TagCount]) -> String {
    if counts.is_empty() {
        return muted().apply_to("No tags.").to_string();
    }
    counts
        .iter()
        .map(|c| format!("{:>4}  {}", c.count, tag_style().apply_to(format!("#{}", c.tag))))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn watering_due(plants: &[Plant]) -> String {
    if plants.is_empty() {
        return muted().apply_to("Nothing to water.").to_string();
    }
    plants
        .iter()
        .map(|p| {
            let due = p
                .care
                .next_watering_due
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!("{}  {}  due {}", muted().apply_to(short_id(&p.id)), pad_to_width(&p.name, NAME_WIDTH), due)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn success(message: &str) -> String {
    Style::new().green().apply_to(message).to_string()
}
