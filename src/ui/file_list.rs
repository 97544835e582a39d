use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    widgets::{Block, Row, Table},
};

use super::Colors;
use crate::buffer::FileHandle;

/// ファイル一覧（名前, サイズ, パス）
pub fn file_table<'a>(
    files: impl Iterator<Item = &'a FileHandle>,
    selected: Option<usize>,
) -> Table<'a> {
    let rows: Vec<Row> = files
        .enumerate()
        .map(|(i, file)| {
            let row = Row::new(vec![
                file.name().to_string(),
                file.display_size(),
                file.id().to_string(),
            ]);
            if Some(i) == selected {
                row.style(Style::default().bg(Colors::SELECTED_BG))
            } else {
                row
            }
        })
        .collect();
    let count = rows.len();

    Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Fill(1),
        ],
    )
    .header(
        Row::new(vec!["Name", "Size", "Path"]).style(
            Style::default()
                .fg(Colors::HEADER)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(
        Block::bordered()
            .title(format!(" Files ({}) ", count))
            .border_style(Style::default().fg(Colors::BORDER)),
    )
}
