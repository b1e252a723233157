use crate::entry::Selection;
use crate::model::Location;
use crate::ui::app::{App, AppState, ScanStatus};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::fmt::Write as _;

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let disk_info = app
        .disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"));

    let disk_text = if let Some(disk) = disk_info {
        let total = disk.total_space();
        let available = disk.available_space();
        format!(
            "Free: {} / {}",
            format_size(available, BINARY),
            format_size(total, BINARY)
        )
    } else {
        "Disk: N/A".to_string()
    };

    let xcodes = match app.files.installed() {
        [] => "Xcode: none found".to_string(),
        installed => installed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    };

    let mut header_text = format!(
        "xcleaner v{} | {disk_text} | {xcodes} | Cleaned so far: {}",
        env!("CARGO_PKG_VERSION"),
        format_size(app.preferences.total_bytes_cleaned(), BINARY)
    );
    let skipped = app.files.skipped();
    if skipped > 0 {
        let _ = write!(header_text, " | Unreadable: {skipped}");
    }
    let title = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

pub fn render_scanning(f: &mut Frame, app: &App, area: Rect) {
    let mut text = String::from("Scanning Xcode files...\n\n");
    for location in app.scope.locations() {
        let status = app
            .scan_progress
            .get(&location)
            .copied()
            .unwrap_or(ScanStatus::Waiting);
        let _ = writeln!(text, " {:<16} {}", location.name(), status.label());
    }
    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Scan"));
    f.render_widget(paragraph, area);
}

pub fn render_tree(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .rows()
        .into_iter()
        .filter_map(|row| {
            let entry = app.entry(row)?;
            let marker = if entry.is_leaf() {
                " "
            } else if app.expanded.contains(&(row.location, row.id)) {
                "▾"
            } else {
                "▸"
            };
            let label = format!(
                "{:indent$}{marker} {} {}",
                "",
                entry.selection().checkbox(),
                entry.name,
                indent = row.depth * 2
            );
            let style = match entry.selection() {
                Selection::On => Style::default().fg(Color::Green),
                Selection::Mixed => Style::default().fg(Color::Yellow),
                Selection::Off => Style::default(),
            };
            Some(ListItem::new(Line::from(vec![
                Span::styled(format!("{label:<48}"), style),
                Span::raw(format!("{:>10}", format_size(entry.size(), BINARY))),
            ])))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Xcode Files"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

pub fn render_usage_chart(f: &mut Frame, app: &App, area: Rect) {
    let data: Vec<(&str, u64)> = Location::ALL
        .iter()
        .map(|location| {
            let size = app.files.tree(*location).map_or(0, |t| t.total_size());
            (location.short_name(), size / 1024 / 1024)
        })
        .collect();

    let barchart = BarChart::default()
        .block(Block::default().title("Usage (MB)").borders(Borders::ALL))
        .data(&data)
        .bar_width(8)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::White).bg(Color::Cyan));

    f.render_widget(barchart, area);
}

pub fn render_details_text(f: &mut Frame, app: &App, area: Rect) {
    let Some((row, entry)) = app
        .highlighted()
        .and_then(|row| app.entry(row).map(|e| (row, e)))
    else {
        f.render_widget(Block::default().borders(Borders::ALL).title("Details"), area);
        return;
    };

    let mut text = String::new();
    if let Some(path) = entry.path() {
        let _ = writeln!(text, "Path: {}", path.display());
    }
    if let Some(detail) = &entry.detail {
        let _ = writeln!(text, "{detail}");
    }
    let _ = writeln!(
        text,
        "Size: {} ({} selected)",
        format_size(entry.size(), BINARY),
        format_size(entry.selected_size(), BINARY)
    );
    if entry.parent().is_none() {
        let _ = writeln!(text, "\n{}", row.location.description());
        if let Some(tree) = app.files.tree(row.location)
            && tree.skipped() > 0
        {
            let _ = writeln!(text, "{} unreadable path(s) were skipped.", tree.skipped());
        }
    }

    let details = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Details: {}", entry.name)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(details, area);
}

pub fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_usage_chart(f, app, right_chunks[0]);
    render_details_text(f, app, right_chunks[1]);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let selected = format_size(app.total_selected_size(), BINARY);
    let total = format_size(app.files.total_size(), BINARY);
    let footer_text = match app.state {
        AppState::Browsing => format!(
            "Selected: {selected} of {total} | [Space] Toggle [l/h] Expand/Collapse [a/n] All/None [r] Rescan [Enter] Clean [q] Quit"
        ),
        AppState::Confirming => format!(
            "DELETE {selected}? | [y/Enter] Confirm [n/Esc] Cancel"
        ),
        AppState::Cleaning => {
            let progress = &app.cleaning_progress;
            format!(
                "Cleaning {}... {}/{} | {} of {} freed ({} failed)",
                progress.current.as_deref().unwrap_or(""),
                progress.done,
                progress.total,
                format_size(progress.bytes_done, BINARY),
                format_size(progress.bytes_total, BINARY),
                progress.failed
            )
        }
        AppState::Scanning => "Scanning... [q] Quit".to_string(),
        AppState::Done(_) => "Done! [Press key to continue]".to_string(),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_popup(f: &mut Frame, app: &App) {
    if let AppState::Cleaning = app.state
        && !app.cleaning_progress.failures.is_empty()
    {
        let failures = &app.cleaning_progress.failures;
        let block = Block::default()
            .title(format!("Failed ({})", failures.len()))
            .borders(Borders::ALL);
        let area = centered_rect(60, 30, f.area());
        let rows = usize::from(area.height.saturating_sub(2)).max(1);
        // Newest last, like a log.
        let text = failures[failures.len().saturating_sub(rows)..].join("\n");
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            area,
        );
        return;
    }
    if let AppState::Done(ref msg) = app.state {
        let block = Block::default()
            .title("Clean Completed")
            .borders(Borders::ALL);
        let area = centered_rect(60, 30, f.area());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(msg.clone())
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
