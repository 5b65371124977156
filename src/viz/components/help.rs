use ratatui::{prelude::*, widgets::*};

fn key_line(key: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::from(key).light_cyan().bold(),
        Span::raw(description),
    ])
}

/// Draw the key bindings of the selected tab in a centered popup
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let mut lines = vec![
        key_line("  q  ", " : Quit"),
        key_line("  h  ", " : Toggle help popup"),
        key_line(" Tab ", " : Switch tabs"),
    ];

    match selected_tab {
        0 => lines.extend([
            key_line("  s  ", " : Start learning from the start cell"),
            key_line("  r  ", " : Reset the maze and forget everything learned"),
            key_line("⬆ / ⬇", " : Select alpha or epsilon"),
            key_line("⬅ / ➡", " : Lower/raise the selected value by 0.01"),
        ]),
        1 => lines.extend([
            key_line("  t  ", " : Toggle the target selector"),
            key_line("  f  ", " : Toggle focus on the selected target only"),
            key_line("⬆ / ⬇", " : Switch log target"),
            key_line("⬅ / ➡", " : Reduce/increase shown log messages by one level"),
            key_line("- / +", " : Reduce/increase captured log messages by one level"),
            key_line("PgUp ", " : Page mode, scroll up in log history"),
            key_line("PgDn ", " : In page mode, scroll down in log history"),
            key_line(" Esc ", " : Leave page mode"),
        ]),
        _ => {}
    }

    let [_, center_vert, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(lines.len() as u16 + 4),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(72),
        Constraint::Fill(1),
    ])
    .areas(center_vert);

    Clear.render(center, buf);

    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::proportional(1))
                .title("Help"),
        )
        .wrap(Wrap { trim: false })
        .render(center, buf);
}
