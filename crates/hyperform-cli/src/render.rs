//! Plain-text rendering of resources, tables and templates.

use serde_json::Value;

use hyperform::{
    categorize_templates, visible_properties, CollectionView, FieldType, PageLinks, PaginationInfo, Resource,
    ValidationError,
};

/// Cells wider than this are truncated with an ellipsis.
pub const MAX_CELL_WIDTH: usize = 40;

/// Placeholder for missing or null values.
pub const EMPTY_CELL: &str = "-";

/// Format one value for a table cell.
pub fn format_cell(value: Option<&Value>, field_type: FieldType) -> String {
    let text = match value {
        None | Some(Value::Null) => return EMPTY_CELL.to_string(),
        Some(Value::Bool(b)) if field_type == FieldType::Boolean => {
            (if *b { "yes" } else { "no" }).to_string()
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    };
    truncate(&text, MAX_CELL_WIDTH)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

/// Render the visible columns of a collection as an aligned table.
pub fn render_table(view: &CollectionView<'_>) -> String {
    let mut columns: Vec<_> = view.columns.iter().filter(|c| !c.hidden).collect();
    columns.sort_by_key(|c| c.priority);
    if columns.is_empty() || view.items.is_empty() {
        return "(no items)".to_string();
    }

    let header: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
    let rows: Vec<Vec<String>> = view
        .items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|c| format_cell(item.get(&c.key), c.field_type))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(cell, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&header)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(rows.iter().map(|r| line(r)));
    out.join("\n")
}

/// Pager summary, or `None` when the resource carries no paging data.
pub fn render_pagination(info: Option<&PaginationInfo>, pages: &PageLinks) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(info) = info {
        let mut summary = format!("page {} (size {})", info.page, info.size);
        if let Some(total) = info.total {
            summary.push_str(&format!(", {total} total"));
        }
        if let Some(count) = info.total_pages() {
            summary.push_str(&format!(", {count} pages"));
        }
        parts.push(summary);
    }
    for (rel, href) in [
        ("first", &pages.first),
        ("prev", &pages.prev),
        ("next", &pages.next),
        ("last", &pages.last),
    ] {
        if let Some(href) = href {
            parts.push(format!("{rel}: {href}"));
        }
    }
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// One line per link: relation, href, and a marker for templated links.
pub fn render_links(resource: &Resource) -> String {
    let width = resource.links.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let mut out = Vec::new();
    for (rel, relation) in &resource.links {
        for link in relation.as_slice() {
            let mut row = format!("{}  {}", pad(rel, width), link.href);
            if link.templated {
                row.push_str("  (templated)");
            }
            out.push(row);
        }
    }
    if out.is_empty() {
        return "(no links)".to_string();
    }
    out.join("\n")
}

/// One line per template: key, category, method, target and visible fields.
pub fn render_templates(resource: &Resource) -> String {
    let categorized = categorize_templates(resource);
    if categorized.is_empty() {
        return "(no templates)".to_string();
    }
    let width = categorized.iter().map(|c| c.key.chars().count()).max().unwrap_or(0);

    categorized
        .iter()
        .map(|c| {
            let target = c.template.target.as_deref().unwrap_or("(self)");
            let mut row = format!(
                "{}  {}  {}  {}",
                pad(c.key, width),
                pad(c.category.as_str(), 10),
                pad(&c.template.method_upper(), 6),
                target
            );
            let fields: Vec<&str> = visible_properties(c.template).map(|p| p.name.as_str()).collect();
            if !fields.is_empty() {
                row.push_str(&format!("  [{}]", fields.join(", ")));
            }
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bullet list of validation failures.
pub fn render_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}
