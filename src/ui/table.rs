use tabled::{settings::Style, Table, Tabled};
use crate::model::NoteRevision;
use crate::storage::TableCount;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    rows: usize,
}

#[derive(Tabled)]
struct RevisionRow {
    #[tabled(rename = "Rev")]
    rev_no: u32,
    #[tabled(rename = "Content hash")]
    content_hash: String,
    #[tabled(rename = "Chain hash")]
    chain_hash: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

pub fn table_counts_table(counts: &[TableCount]) -> String {
    let rows: Vec<CountRow> = counts
        .iter()
        .map(|c| CountRow {
            table: c.table.clone(),
            rows: c.rows,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn revisions_table(revisions: &[NoteRevision]) -> String {
    if revisions.is_empty() {
        return String::new();
    }
    let rows: Vec<RevisionRow> = revisions
        .iter()
        .map(|r| RevisionRow {
            rev_no: r.rev_no,
            content_hash: abbreviate(&r.content_hash),
            chain_hash: abbreviate(&r.chain_hash),
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn abbreviate(hash: &str) -> String {
    match hash.get(..16) {
        Some(head) if hash.len() > 16 => format!("{head}…"),
        _ => hash.to_string(),
    }
}
