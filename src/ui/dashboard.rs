use crate::color::{status_color, Rgb};
use crate::model::property::format_number;
use crate::model::{ComplianceStatus, Space, VentilationResult};
use crate::store::grouping::ALL_GROUP;
use crate::ui::app::{App, CalculationRow, ExchangeRow, FilterRow, GroupingRow, Notice, Tab};
use crate::ui::prompt::Metric;
use crate::ui::viewer::draw_viewer;
use ratatui::{
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table, Tabs, Wrap,
    },
    Frame,
};

// Brand colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
pub(crate) const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
pub(crate) const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);
const BRAND_RED: Color = Color::Rgb(0xE7, 0x4C, 0x3C);

// Styles
const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const COUNT_COLOR: Color = BRAND_GREEN;

/// Screen regions of the main view.
#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub sidebar: Rect,
    pub viewer: Rect,
    pub footer: Rect,
}

#[must_use]
pub fn layout(area: Rect) -> Areas {
    let rows = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Footer
    ])
    .split(area);
    let columns = Layout::horizontal([
        Constraint::Percentage(40), // Sidebar
        Constraint::Percentage(60), // Viewer
    ])
    .split(rows[1]);

    Areas {
        header: rows[0],
        sidebar: columns[0],
        viewer: columns[1],
        footer: rows[2],
    }
}

/// Area inside a bordered block.
#[must_use]
pub fn inner(area: Rect) -> Rect {
    area.inner(Margin::new(1, 1))
}

pub fn draw_app(frame: &mut Frame, app: &App, areas: &Areas) {
    draw_header(frame, areas.header, app);
    draw_sidebar(frame, areas.sidebar, app);
    draw_viewer(frame, areas.viewer, app);
    draw_footer(frame, areas.footer, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(" IFC Space Viewer ", HEADER_STYLE)];

    if let Some(info) = app.repository.model_info() {
        spans.push(Span::raw("| "));
        spans.push(Span::raw(info.filename.clone()));
        if let Some(project) = info.project_name() {
            spans.push(Span::styled(format!(" ({project})"), Style::default().fg(BRAND_MUTED)));
        }
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{} spaces", app.repository.spaces().len()),
            Style::default().fg(COUNT_COLOR),
        ));
        spans.push(Span::raw(" "));
    }
    if app.is_loading {
        spans.push(Span::styled("| loading… ", Style::default().fg(BRAND_ORANGE)));
    }

    // connectivity banner
    match app.backend_connected {
        Some(false) => spans.push(Span::styled(
            format!("| Cannot connect to backend at {} ", app.config.api_url),
            Style::default().fg(BRAND_RED).add_modifier(Modifier::BOLD),
        )),
        Some(true) => spans.push(Span::styled("| backend ok ", Style::default().fg(BRAND_GREEN))),
        None => spans.push(Span::styled("| checking backend… ", Style::default().fg(BRAND_MUTED))),
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).split(area);

    let titles: Vec<&str> = Tab::ALL.iter().map(|tab| tab.title()).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .highlight_style(SELECTED_STYLE)
        .divider("|")
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(tabs, chunks[0]);

    let body = chunks[1];
    match app.tab {
        Tab::Spaces => draw_spaces(frame, body, app),
        Tab::Properties => draw_properties(frame, body, app),
        Tab::Filter => draw_filter(frame, body, app),
        Tab::Grouping => draw_grouping(frame, body, app),
        Tab::Calculation => draw_calculation(frame, body, app),
        Tab::Exchange => draw_exchange(frame, body, app),
    }
}

fn focus_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND_ORANGE))
}

fn row_style(is_cursor: bool) -> Style {
    if is_cursor {
        SELECTED_STYLE
    } else {
        Style::default()
    }
}

fn swatch(color: Rgb) -> Span<'static> {
    let Rgb(r, g, b) = color;
    Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b)))
}

fn optional_number(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{} {unit}", format_number(v)))
}

fn draw_spaces(frame: &mut Frame, area: Rect, app: &App) {
    let groups = app.repository.grouped_spaces();
    let grouped = !(groups.len() == 1 && groups[0].label == ALL_GROUP);
    let cursor = app.cursor();

    let mut rows: Vec<Row> = Vec::new();
    let mut cursor_line = 0;
    let mut index = 0;
    for group in &groups {
        if grouped {
            let stats = group.stats();
            rows.push(
                Row::new(vec![
                    format!("▸ {}", group.label),
                    format!("{} rooms", stats.count),
                    format!("{} m²", format_number((stats.total_area * 10.0).round() / 10.0)),
                ])
                .style(Style::default().fg(BRAND_MUTED).add_modifier(Modifier::ITALIC)),
            );
        }
        for space in &group.spaces {
            let selected = app.repository.selection().contains(&space.id);
            if index == cursor {
                cursor_line = rows.len();
            }
            let marker = if selected { "● " } else { "  " };
            let mut style = row_style(index == cursor);
            if selected && index != cursor {
                style = style.fg(BRAND_ORANGE);
            }
            let status = app
                .calculations
                .status_for(&space.id)
                .map(ComplianceStatus::label)
                .unwrap_or_default();
            rows.push(
                Row::new(vec![
                    format!("{marker}{}", space.display_name()),
                    space.floor_level.clone().unwrap_or_default(),
                    optional_number(space.area, "m²"),
                    status.to_string(),
                ])
                .style(style),
            );
            index += 1;
        }
    }

    let visible = (area.height as usize).saturating_sub(3);
    let offset = cursor_line.saturating_sub(visible.saturating_sub(1));
    let total = rows.len();
    let rows: Vec<Row> = rows.into_iter().skip(offset).take(visible).collect();

    let header = Row::new(vec!["Name", "Level", "Area", "Status"]).style(HEADER_STYLE);
    let widths = [
        Constraint::Percentage(45),
        Constraint::Percentage(15),
        Constraint::Percentage(22),
        Constraint::Percentage(18),
    ];
    let title = format!(
        " Spaces ({}/{}) · {} selected ",
        index,
        app.repository.spaces().len(),
        app.repository.selection().len()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(focus_block(title));
    frame.render_widget(table, area);

    if total > visible {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut state = ScrollbarState::new(total).position(cursor_line);
        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 2,
            width: 1,
            height: area.height.saturating_sub(3),
        };
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut state);
    }
}

fn draw_properties(frame: &mut Frame, area: Rect, app: &App) {
    let selected = app.repository.selected_spaces();
    let lines = match selected.as_slice() {
        [] => vec![Line::from(Span::styled(
            "Select a space in the list or the viewer.",
            Style::default().fg(BRAND_MUTED),
        ))],
        [space] => space_detail_lines(app, space),
        many => {
            let area_sum: f64 = many.iter().filter_map(|s| s.area).sum();
            let volume_sum: f64 = many.iter().filter_map(|s| s.volume).sum();
            vec![
                Line::from(format!("{} spaces selected", many.len())),
                Line::from(format!("Total area:   {} m²", format_number(area_sum))),
                Line::from(format!("Total volume: {} m³", format_number(volume_sum))),
            ]
        }
    };

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(focus_block(" Properties · r reload ".to_string()));
    frame.render_widget(paragraph, area);
}

fn space_detail_lines(app: &App, space: &Space) -> Vec<Line<'static>> {
    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(BRAND_MUTED)),
            Span::raw(value),
        ])
    };
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        Line::from(Span::styled(space.display_name().to_string(), HEADER_STYLE)),
        field("ID", space.id.clone()),
        field("GlobalId", text(&space.global_id)),
        field("Name", space.name.clone()),
        field("Level", text(&space.floor_level)),
        field("Usage", text(&space.usage)),
        field("Area", optional_number(space.area, "m²")),
        field("Volume", optional_number(space.volume, "m³")),
        field("Height", optional_number(space.height, "m")),
        field(
            "Occupancy",
            space.occupancy.map_or_else(|| "-".to_string(), |o| o.to_string()),
        ),
    ];
    if let Some(description) = &space.description {
        lines.push(field("Description", description.clone()));
    }

    if !space.properties.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("── Properties ──", Style::default().fg(BRAND_MUTED))));
        for (key, value) in &space.properties {
            lines.push(Line::from(vec![
                Span::styled(format!("{key}: "), Style::default().fg(BRAND_MUTED)),
                Span::raw(value.to_string()),
            ]));
        }
    }

    if let Some(result) = app.calculations.result_for(&space.id) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("── Ventilation ──", Style::default().fg(BRAND_MUTED))));
        lines.extend(result_lines(result));
    }
    lines
}

fn result_lines(result: &VentilationResult) -> Vec<Line<'static>> {
    let status = result.compliance_status;
    let mut lines = vec![
        Line::from(format!("Required:     {:.1} m³/h", result.required_ventilation)),
        Line::from(format!("Air changes:  {:.2} /h", result.air_change_rate)),
        Line::from(format!(
            "Standard:     {}",
            result.applied_standard.clone().unwrap_or_default()
        )),
        Line::from(vec![
            Span::raw("Compliance:   "),
            swatch(status_color(status)),
            Span::raw(status.label()),
        ]),
    ];
    if let Some(notes) = &result.compliance_notes {
        lines.push(Line::from(Span::styled(notes.clone(), Style::default().fg(BRAND_MUTED))));
    }
    lines
}

fn draw_filter(frame: &mut Frame, area: Rect, app: &App) {
    let filters = app.repository.filters();
    let cursor = app.cursor();

    let items: Vec<ListItem> = app
        .filter_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let text = match row {
                FilterRow::Level(level) => {
                    let on = filters.floor_levels.contains(&level);
                    format!("[{}] Level {level}", if on { "x" } else { " " })
                }
                FilterRow::Bound { metric, max } => {
                    let range = match metric {
                        Metric::Area => filters.area,
                        Metric::Volume => filters.volume,
                        Metric::Height => filters.height,
                    };
                    let value = if max { range.max } else { range.min };
                    format!(
                        "{} {}: {}",
                        if max { "Max" } else { "Min" },
                        metric.label(),
                        value.map_or_else(|| "-".to_string(), format_number)
                    )
                }
                FilterRow::Custom(key) => {
                    let value = filters.custom.get(&key).map_or("-", String::as_str);
                    format!("{key} = {value}")
                }
                FilterRow::Reset => "Reset filters".to_string(),
            };
            ListItem::new(text).style(row_style(i == cursor))
        })
        .collect();

    let title = format!(
        " Filter · {} of {} spaces ",
        app.repository.filtered_spaces().len(),
        app.repository.spaces().len()
    );
    frame.render_widget(List::new(items).block(focus_block(title)), area);
}

fn draw_grouping(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)]).split(area);
    let grouping = app.repository.grouping();
    let cursor = app.cursor();

    let items: Vec<ListItem> = app
        .grouping_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let text = match row {
                GroupingRow::Enabled => format!(
                    "[{}] Group spaces",
                    if grouping.enabled { "x" } else { " " }
                ),
                GroupingRow::Key(key) => {
                    let grouped = grouping.active_key() == Some(key.as_str());
                    let colored = app.repository.color_by() == Some(key.as_str());
                    format!(
                        "  {} {key}{}",
                        if grouped { "◉" } else { "○" },
                        if colored { "  (color)" } else { "" }
                    )
                }
            };
            ListItem::new(text).style(row_style(i == cursor))
        })
        .collect();
    let list = List::new(items).block(focus_block(
        " Grouping · Enter group by · Space color by ".to_string(),
    ));
    frame.render_widget(list, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    if grouping.active_key().is_some() {
        for group in app.repository.grouped_spaces() {
            let stats = group.stats();
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", group.label), HEADER_STYLE),
                Span::styled(format!("({})", stats.count), Style::default().fg(COUNT_COLOR)),
            ]));
            lines.push(Line::from(format!(
                "  area {:.1} m² · volume {:.1} m³ · avg height {:.2} m",
                stats.total_area, stats.total_volume, stats.average_height
            )));
        }
    }
    if let Some(palette) = app.palette() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Colors by {}", palette.key),
            Style::default().fg(BRAND_MUTED),
        )));
        for (value, color) in palette.entries() {
            lines.push(Line::from(vec![swatch(color), Span::raw(value.to_string())]));
        }
    }
    let summary = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Groups ").borders(Borders::ALL));
    frame.render_widget(summary, chunks[1]);
}

fn draw_calculation(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([Constraint::Length(8), Constraint::Min(4)]).split(area);
    let cursor = app.cursor();
    let spaces = app.repository.spaces().len();

    let items: Vec<ListItem> = app
        .calculation_rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let text = match row {
                CalculationRow::Method(method) => format!(
                    "{} {}",
                    if method == app.method { "◉" } else { "○" },
                    method.label()
                ),
                CalculationRow::CalculateAll if app.calculations.is_calculating => {
                    "Calculating…".to_string()
                }
                CalculationRow::CalculateAll => format!("▶ Calculate all spaces ({spaces})"),
                CalculationRow::CalculateSelected => format!(
                    "▶ Calculate selected ({})",
                    app.repository.selection().len()
                ),
            };
            ListItem::new(text).style(row_style(i == cursor))
        })
        .collect();
    frame.render_widget(
        List::new(items).block(focus_block(" Ventilation · a all · m method ".to_string())),
        chunks[0],
    );

    let lines = match app
        .repository
        .selection()
        .single()
        .and_then(|id| app.calculations.result_for(id))
    {
        Some(result) => {
            let mut lines = vec![Line::from(Span::styled(result.space_name.clone(), HEADER_STYLE))];
            lines.extend(result_lines(result));
            lines
        }
        None if app.calculations.is_empty() => vec![Line::from(Span::styled(
            "No results yet.",
            Style::default().fg(BRAND_MUTED),
        ))],
        None => {
            let summary = app.calculations.summary();
            [
                (ComplianceStatus::Ok, summary.ok),
                (ComplianceStatus::Warning, summary.warning),
                (ComplianceStatus::Ng, summary.ng),
            ]
            .into_iter()
            .map(|(status, count)| {
                Line::from(vec![
                    swatch(status_color(status)),
                    Span::raw(format!("{:<8}{count}", status.label())),
                ])
            })
            .collect()
        }
    };
    let results = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Results ").borders(Borders::ALL));
    frame.render_widget(results, chunks[1]);
}

fn draw_exchange(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([Constraint::Length(8), Constraint::Min(3)]).split(area);
    let cursor = app.cursor();
    let filtered = app.repository.filtered_spaces().len();

    let items: Vec<ListItem> = app
        .exchange_rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let text = match row {
                ExchangeRow::Export(format) => {
                    format!("Export {} ({filtered} filtered spaces)", format.label())
                }
                ExchangeRow::Import => "Import properties (.csv, .json, .xlsx)".to_string(),
                ExchangeRow::Upload => "Upload IFC model".to_string(),
                ExchangeRow::NewProject => "New project".to_string(),
            };
            ListItem::new(text).style(row_style(i == cursor))
        })
        .collect();
    frame.render_widget(List::new(items).block(focus_block(" Export/Import ".to_string())), chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(error) = &app.upload_error {
        lines.push(Line::from(Span::styled(
            format!("Upload failed: {error}"),
            Style::default().fg(BRAND_RED),
        )));
    }
    for warning in &app.upload_warnings {
        lines.push(Line::from(Span::styled(
            format!("⚠ {warning}"),
            Style::default().fg(BRAND_ORANGE),
        )));
    }
    let messages = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Messages ").borders(Borders::ALL));
    frame.render_widget(messages, chunks[1]);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(prompt) = &app.prompt {
        Line::from(vec![
            Span::styled(format!(" {}: ", prompt.kind.label()), HEADER_STYLE),
            Span::raw(prompt.input.clone()),
            Span::styled("█", Style::default().fg(BRAND_ORANGE)),
        ])
    } else {
        match &app.notice {
            Some(Notice::Error(message)) => {
                Line::from(Span::styled(format!(" {message}"), Style::default().fg(BRAND_RED)))
            }
            Some(Notice::Info(message)) => {
                Line::from(Span::styled(format!(" {message}"), Style::default().fg(BRAND_GREEN)))
            }
            None => Line::from(Span::styled(
                " Tab Panel | ↑↓ Move | Space Toggle | Enter Select | Esc Clear | v 2D/3D | f Fit | \
                 Shift+←→↑↓ Orbit | +/- Zoom | u Upload | i Import | e/x/c Export | n New | a Calc | q Quit ",
                Style::default().fg(BRAND_MUTED),
            )),
        }
    };

    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
