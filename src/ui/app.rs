use super::prompt::{parse_bound, Metric, Prompt, PromptKind, PromptOutcome};
use super::tasks::{AppEvent, LoadedModel, Tasks};
use super::viewer::{cell_to_ndc, viewport_of, TerminalSurface};
use crate::color::{Appearance, ColorMapper, Palette, DEFAULT_COLOR, DEFAULT_OPACITY};
use crate::config::Config;
use crate::error::ApiError;
use crate::exchange::{self, Format};
use crate::model::{Space, VentilationInput, VentilationMethod};
use crate::scene::{ClickAction, SceneController};
use crate::store::{CalculationCache, GroupingConfig, SpaceRepository};
use color_eyre::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::{DefaultTerminal, Frame};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const HEALTH_INTERVAL: Duration = Duration::from_secs(15);
const ORBIT_STEP: f64 = PI / 12.0;
const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Spaces,
    Properties,
    Filter,
    Grouping,
    Calculation,
    Exchange,
}

impl Tab {
    pub const ALL: [Self; 6] = [
        Self::Spaces,
        Self::Properties,
        Self::Filter,
        Self::Grouping,
        Self::Calculation,
        Self::Exchange,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Spaces => "Spaces",
            Self::Properties => "Properties",
            Self::Filter => "Filter",
            Self::Grouping => "Grouping",
            Self::Calculation => "Calculation",
            Self::Exchange => "Export/Import",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// One actionable row of the Filter tab.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterRow {
    Level(String),
    Bound { metric: Metric, max: bool },
    Custom(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupingRow {
    Enabled,
    Key(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalculationRow {
    Method(VentilationMethod),
    CalculateAll,
    CalculateSelected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExchangeRow {
    Export(Format),
    Import,
    Upload,
    NewProject,
}

const EXCHANGE_ROWS: [ExchangeRow; 6] = [
    ExchangeRow::Export(Format::Csv),
    ExchangeRow::Export(Format::Json),
    ExchangeRow::Export(Format::Excel),
    ExchangeRow::Import,
    ExchangeRow::Upload,
    ExchangeRow::NewProject,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct App {
    pub config: Config,
    pub repository: SpaceRepository,
    pub calculations: CalculationCache,
    pub scene: SceneController<TerminalSurface>,
    pub tab: Tab,
    cursors: [usize; 6],
    pub method: VentilationMethod,
    pub prompt: Option<Prompt>,
    pub notice: Option<Notice>,
    pub upload_error: Option<String>,
    pub upload_warnings: Vec<String>,
    pub backend_connected: Option<bool>,
    pub is_loading: bool,
    viewer_inner: Rect,
    tasks: Option<Tasks>,
    events: Option<UnboundedReceiver<AppEvent>>,
    last_health_check: Instant,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let surface = TerminalSurface::new(config.viewer_enabled);
        Self {
            method: config.method,
            config,
            repository: SpaceRepository::new(),
            calculations: CalculationCache::new(),
            scene: SceneController::new(surface),
            tab: Tab::Spaces,
            cursors: [0; 6],
            prompt: None,
            notice: None,
            upload_error: None,
            upload_warnings: Vec::new(),
            backend_connected: None,
            is_loading: false,
            viewer_inner: Rect::default(),
            tasks: None,
            events: None,
            last_health_check: Instant::now(),
            should_quit: false,
        }
    }

    #[must_use]
    pub fn with_tasks(mut self, tasks: Tasks, events: UnboundedReceiver<AppEvent>) -> Self {
        self.tasks = Some(tasks);
        self.events = Some(events);
        self
    }

    /// Brings up the viewer, probes the backend and uploads the start-up file.
    pub fn start(&mut self) {
        if let Err(err) = self.scene.initialize() {
            warn!(error = %err, "viewer disabled");
        }
        self.refresh_scene();
        self.check_health();
        if let Some(path) = self.config.initial_file.clone() {
            self.begin_upload(path);
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
            self.drain_app_events();
            if self.last_health_check.elapsed() >= HEALTH_INTERVAL {
                self.check_health();
            }
        }
        self.scene.dispose();
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let areas = super::dashboard::layout(frame.area());
        let inner = super::dashboard::inner(areas.viewer);
        if inner != self.viewer_inner {
            self.viewer_inner = inner;
            self.scene.resize(viewport_of(inner));
        }
        super::dashboard::draw_app(frame, self, &areas);
    }

    fn handle_events(&mut self) -> Result<()> {
        if !event::poll(POLL_INTERVAL)? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        Ok(())
    }

    fn drain_app_events(&mut self) {
        let mut pending = Vec::new();
        if let Some(events) = self.events.as_mut() {
            while let Ok(event) = events.try_recv() {
                pending.push(event);
            }
        }
        for event in pending {
            self.apply_event(event);
        }
    }

    fn check_health(&mut self) {
        self.last_health_check = Instant::now();
        if let Some(tasks) = &self.tasks {
            tasks.check_health();
        }
    }

    /// Applies the outcome of a background request.
    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Health(alive) => {
                if self.backend_connected != Some(alive) {
                    info!(alive, "backend connectivity changed");
                }
                self.backend_connected = Some(alive);
            }
            AppEvent::ModelLoaded(Ok(model)) => self.finish_upload(model),
            AppEvent::ModelLoaded(Err(err)) => self.fail_upload(&err),
            AppEvent::CalculatedAll(result) => self.finish_calculation(result, true),
            AppEvent::CalculatedSome(result) => self.finish_calculation(result, false),
            AppEvent::SpaceRefreshed(Ok(space)) => {
                let name = space.display_name().to_string();
                if self.repository.replace_space(space) {
                    self.notice = Some(Notice::Info(format!("Reloaded {name}")));
                    self.refresh_scene();
                }
            }
            AppEvent::SpaceRefreshed(Err(err)) => self.report_api_error("Reload failed", &err),
        }
    }

    fn finish_upload(&mut self, model: LoadedModel) {
        self.is_loading = false;
        self.backend_connected = Some(true);
        let count = model.spaces.len();
        info!(model_id = %model.info.model_id, spaces = count, "model loaded");
        self.upload_warnings = model.upload.warnings;
        self.calculations.clear();
        self.repository.load(model.spaces, model.info);
        self.cursors = [0; 6];
        self.notice = Some(Notice::Info(format!(
            "Loaded {} ({count} spaces)",
            model.upload.filename
        )));
        self.refresh_scene();
    }

    /// A failed upload chain leaves no partial model behind.
    fn fail_upload(&mut self, err: &ApiError) {
        warn!(error = %err, "upload failed");
        self.is_loading = false;
        if err.is_connectivity() {
            self.backend_connected = Some(false);
        }
        self.repository.reset();
        self.calculations.clear();
        self.upload_warnings.clear();
        self.upload_error = Some(err.user_message());
        self.refresh_scene();
    }

    fn finish_calculation(
        &mut self,
        result: std::result::Result<crate::model::VentilationBatchResult, ApiError>,
        replace: bool,
    ) {
        self.calculations.is_calculating = false;
        match result {
            Ok(batch) => {
                let count = batch.results.len();
                if replace {
                    self.calculations.set_results(batch.results);
                } else {
                    for result in batch.results {
                        self.calculations.set_result(result);
                    }
                }
                let summary = self.calculations.summary();
                self.notice = Some(Notice::Info(format!(
                    "Calculated {count} spaces: {} OK, {} WARNING, {} NG",
                    summary.ok, summary.warning, summary.ng
                )));
                self.recolor();
            }
            Err(err) => self.report_api_error("Calculation failed", &err),
        }
    }

    fn report_api_error(&mut self, context: &str, err: &ApiError) {
        warn!(error = %err, "{context}");
        if err.is_connectivity() {
            self.backend_connected = Some(false);
        }
        self.notice = Some(Notice::Error(format!("{context}: {}", err.user_message())));
    }

    pub fn begin_upload(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }
        info!(path = %path.display(), "starting upload");
        self.is_loading = true;
        self.upload_error = None;
        self.notice = Some(Notice::Info(format!("Uploading {} ...", path.display())));
        if let Some(tasks) = &self.tasks {
            tasks.upload(path);
        }
    }

    pub fn calculate_all(&mut self) {
        let Some(model_id) = self.repository.model_id().map(str::to_string) else {
            self.notice = Some(Notice::Error("Load a model first".to_string()));
            return;
        };
        if self.calculations.is_calculating {
            return;
        }
        self.calculations.is_calculating = true;
        if let Some(tasks) = &self.tasks {
            tasks.calculate_all(model_id, self.method);
        }
    }

    pub fn calculate_selected(&mut self) {
        let Some(model_id) = self.repository.model_id().map(str::to_string) else {
            self.notice = Some(Notice::Error("Load a model first".to_string()));
            return;
        };
        let inputs: Vec<VentilationInput> = self
            .repository
            .selected_spaces()
            .into_iter()
            .map(|s| VentilationInput::from_space(s, self.method))
            .collect();
        if inputs.is_empty() {
            self.notice = Some(Notice::Error("Select at least one space".to_string()));
            return;
        }
        if self.calculations.is_calculating {
            return;
        }
        self.calculations.is_calculating = true;
        if let Some(tasks) = &self.tasks {
            tasks.calculate_batch(model_id, inputs);
        }
    }

    fn refresh_selected(&mut self) {
        let (Some(model_id), Some(space_id)) =
            (self.repository.model_id(), self.repository.selection().single())
        else {
            self.notice = Some(Notice::Error("Select a single space to reload".to_string()));
            return;
        };
        if let Some(tasks) = &self.tasks {
            tasks.refresh_space(model_id.to_string(), space_id.to_string());
        }
    }

    pub fn export(&mut self, format: Format, path: &std::path::Path) {
        let spaces = self.repository.filtered_spaces();
        let notice = match exchange::export_file(format, &spaces, path) {
            Ok(()) => Notice::Info(format!(
                "Exported {} spaces to {}",
                spaces.len(),
                path.display()
            )),
            Err(err) => {
                warn!(error = %err, "export failed");
                Notice::Error(format!("Export failed: {err}"))
            }
        };
        self.notice = Some(notice);
    }

    /// Merges the property maps of an import file into matching spaces.
    pub fn import(&mut self, path: &std::path::Path) {
        let updates = exchange::import_file(path).and_then(exchange::into_updates);
        match updates {
            Ok(updates) => {
                let amended = self.repository.mutate_many(&updates);
                self.notice = Some(Notice::Info(format!(
                    "Imported {} records, updated {amended} spaces",
                    updates.len()
                )));
                self.refresh_scene();
            }
            Err(err) => {
                warn!(error = %err, "import failed");
                self.notice = Some(Notice::Error(format!("Import failed: {err}")));
            }
        }
    }

    /// Discards the model and every derived state.
    pub fn new_project(&mut self) {
        if let (Some(tasks), Some(model_id)) = (&self.tasks, self.repository.model_id()) {
            tasks.delete_model(model_id.to_string());
        }
        self.repository.reset();
        self.calculations.clear();
        self.upload_error = None;
        self.upload_warnings.clear();
        self.cursors = [0; 6];
        self.notice = Some(Notice::Info("Started a new project".to_string()));
        self.refresh_scene();
    }

    /// Rebuilds the shapes from the filtered spaces.
    pub fn refresh_scene(&mut self) {
        if !self.scene.is_usable() {
            return;
        }
        self.scene.populate(&self.repository.filtered_spaces());
        self.recolor();
    }

    /// Re-resolves every shape's appearance.
    pub fn recolor(&mut self) {
        let filtered = self.repository.filtered_spaces();
        let palette = self
            .repository
            .color_by()
            .map(|key| Palette::build(key, filtered.iter().copied()));
        let by_id: HashMap<&str, &Space> = filtered.iter().map(|s| (s.id.as_str(), *s)).collect();
        let mapper = ColorMapper {
            selection: self.repository.selection(),
            palette: palette.as_ref(),
            calculations: &self.calculations,
        };
        self.scene.recolor(|id| {
            by_id.get(id).map_or(
                Appearance {
                    color: DEFAULT_COLOR,
                    opacity: DEFAULT_OPACITY,
                },
                |space| mapper.resolve(space),
            )
        });
    }

    /// Palette for the current color-by property over the filtered spaces.
    #[must_use]
    pub fn palette(&self) -> Option<Palette> {
        self.repository
            .color_by()
            .map(|key| Palette::build(key, self.repository.filtered_spaces()))
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(prompt) = self.prompt.as_mut() {
            match prompt.handle_key(key.code) {
                PromptOutcome::Editing => {}
                PromptOutcome::Cancelled => self.prompt = None,
                PromptOutcome::Submitted(input) => {
                    if let Some(prompt) = self.prompt.take() {
                        self.submit_prompt(prompt.kind, &input);
                    }
                }
            }
            return;
        }

        if key.modifiers.contains(KeyModifiers::SHIFT) {
            let orbit = match key.code {
                KeyCode::Left => Some((-ORBIT_STEP, 0.0)),
                KeyCode::Right => Some((ORBIT_STEP, 0.0)),
                KeyCode::Up => Some((0.0, -ORBIT_STEP)),
                KeyCode::Down => Some((0.0, ORBIT_STEP)),
                _ => None,
            };
            if let Some((azimuth, polar)) = orbit {
                self.scene.rig_mut().rotate(azimuth, polar);
                return;
            }
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.previous(),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Esc => {
                self.repository.clear_selection();
                self.recolor();
            }
            KeyCode::Char(' ') => self.activate_row(false),
            KeyCode::Enter => self.activate_row(true),
            KeyCode::Char('v') => self.scene.toggle_mode(),
            KeyCode::Char('f') => self.scene.fit_view(),
            KeyCode::Char('+' | '=') => self.scene.rig_mut().zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('-') => self.scene.rig_mut().zoom(ZOOM_STEP),
            KeyCode::Char('u') => self.prompt = Some(Prompt::new(PromptKind::Upload)),
            KeyCode::Char('i') => self.prompt = Some(Prompt::new(PromptKind::Import)),
            KeyCode::Char('e') => self.open_export_prompt(Format::Json),
            KeyCode::Char('x') => self.open_export_prompt(Format::Excel),
            KeyCode::Char('c') => self.open_export_prompt(Format::Csv),
            KeyCode::Char('n') => self.prompt = Some(Prompt::new(PromptKind::ConfirmReset)),
            KeyCode::Char('a') => self.calculate_all(),
            KeyCode::Char('r') if self.tab == Tab::Properties => self.refresh_selected(),
            KeyCode::Char('m') if self.tab == Tab::Calculation => self.method = self.method.next(),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some((x, y)) = cell_to_ndc(self.viewer_inner, mouse.column, mouse.row) else {
            return;
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let modifier = mouse.modifiers.contains(KeyModifiers::CONTROL);
                let action = self.scene.click(x, y, modifier);
                self.apply_click(action);
            }
            MouseEventKind::ScrollUp => self.scene.rig_mut().zoom(1.0 / ZOOM_STEP),
            MouseEventKind::ScrollDown => self.scene.rig_mut().zoom(ZOOM_STEP),
            _ => {}
        }
    }

    pub fn apply_click(&mut self, action: ClickAction) {
        match action {
            ClickAction::Replace(id) => self.repository.select_only([id]),
            ClickAction::Toggle(id) => self.repository.toggle_selected(&id),
            ClickAction::Clear => self.repository.clear_selection(),
            ClickAction::Nothing => return,
        }
        self.recolor();
    }

    fn open_export_prompt(&mut self, format: Format) {
        let default = match format {
            Format::Csv => "spaces.csv",
            Format::Json => "spaces.json",
            Format::Excel => "spaces.xlsx",
        };
        self.prompt = Some(Prompt::with_input(PromptKind::Export(format), default));
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: &str) {
        match kind {
            PromptKind::Upload if !input.is_empty() => self.begin_upload(PathBuf::from(input)),
            PromptKind::Import if !input.is_empty() => self.import(std::path::Path::new(input)),
            PromptKind::Export(format) if !input.is_empty() => {
                self.export(format, std::path::Path::new(input));
            }
            PromptKind::Bound { metric, max } => match parse_bound(input) {
                Ok(value) => {
                    let filters = self.repository.filters_mut();
                    let range = match metric {
                        Metric::Area => &mut filters.area,
                        Metric::Volume => &mut filters.volume,
                        Metric::Height => &mut filters.height,
                    };
                    if max {
                        range.max = value;
                    } else {
                        range.min = value;
                    }
                    self.refresh_scene();
                }
                Err(message) => self.notice = Some(Notice::Error(message)),
            },
            PromptKind::CustomFilter(key) => {
                self.repository.filters_mut().set_custom(&key, input);
                self.refresh_scene();
            }
            PromptKind::ConfirmReset => self.new_project(),
            PromptKind::Upload | PromptKind::Import | PromptKind::Export(_) => {}
        }
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursors[self.tab.index()]
    }

    fn row_count(&self) -> usize {
        match self.tab {
            Tab::Spaces => self.space_rows().len(),
            Tab::Properties => 0,
            Tab::Filter => self.filter_rows().len(),
            Tab::Grouping => self.grouping_rows().len(),
            Tab::Calculation => self.calculation_rows().len(),
            Tab::Exchange => EXCHANGE_ROWS.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let count = self.row_count();
        let cursor = &mut self.cursors[self.tab.index()];
        if count == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(count - 1);
    }

    /// Spaces in list order: filtered, then grouped.
    #[must_use]
    pub fn space_rows(&self) -> Vec<&Space> {
        self.repository
            .grouped_spaces()
            .into_iter()
            .flat_map(|group| group.spaces)
            .collect()
    }

    #[must_use]
    pub fn filter_rows(&self) -> Vec<FilterRow> {
        let mut rows: Vec<FilterRow> = self
            .repository
            .available_floor_levels()
            .into_iter()
            .map(FilterRow::Level)
            .collect();
        for metric in Metric::ALL {
            rows.push(FilterRow::Bound { metric, max: false });
            rows.push(FilterRow::Bound { metric, max: true });
        }
        rows.extend(
            self.repository
                .available_property_keys()
                .into_iter()
                .map(FilterRow::Custom),
        );
        rows.push(FilterRow::Reset);
        rows
    }

    #[must_use]
    pub fn grouping_rows(&self) -> Vec<GroupingRow> {
        std::iter::once(GroupingRow::Enabled)
            .chain(
                self.repository
                    .available_property_keys()
                    .into_iter()
                    .map(GroupingRow::Key),
            )
            .collect()
    }

    #[must_use]
    pub fn calculation_rows(&self) -> Vec<CalculationRow> {
        VentilationMethod::ALL
            .into_iter()
            .map(CalculationRow::Method)
            .chain([CalculationRow::CalculateAll, CalculationRow::CalculateSelected])
            .collect()
    }

    #[must_use]
    pub fn exchange_rows(&self) -> &'static [ExchangeRow] {
        &EXCHANGE_ROWS
    }

    /// Space (`enter = false`) or Enter (`enter = true`) on
    /// the row under the cursor.
    fn activate_row(&mut self, enter: bool) {
        let cursor = self.cursor();
        match self.tab {
            Tab::Spaces => {
                let Some(id) = self.space_rows().get(cursor).map(|s| s.id.clone()) else {
                    return;
                };
                if enter {
                    self.repository.select_only([id]);
                } else {
                    self.repository.toggle_selected(&id);
                }
                self.recolor();
            }
            Tab::Properties => {}
            Tab::Filter => {
                if let Some(row) = self.filter_rows().into_iter().nth(cursor) {
                    self.activate_filter_row(row);
                }
            }
            Tab::Grouping => {
                if let Some(row) = self.grouping_rows().into_iter().nth(cursor) {
                    self.activate_grouping_row(row, enter);
                }
            }
            Tab::Calculation => match self.calculation_rows().get(cursor) {
                Some(CalculationRow::Method(method)) => self.method = *method,
                Some(CalculationRow::CalculateAll) => self.calculate_all(),
                Some(CalculationRow::CalculateSelected) => self.calculate_selected(),
                None => {}
            },
            Tab::Exchange => match EXCHANGE_ROWS.get(cursor) {
                Some(ExchangeRow::Export(format)) => self.open_export_prompt(*format),
                Some(ExchangeRow::Import) => self.prompt = Some(Prompt::new(PromptKind::Import)),
                Some(ExchangeRow::Upload) => self.prompt = Some(Prompt::new(PromptKind::Upload)),
                Some(ExchangeRow::NewProject) => {
                    self.prompt = Some(Prompt::new(PromptKind::ConfirmReset));
                }
                None => {}
            },
        }
    }

    fn activate_filter_row(&mut self, row: FilterRow) {
        match row {
            FilterRow::Level(level) => {
                self.repository.filters_mut().toggle_floor_level(&level);
                self.refresh_scene();
            }
            FilterRow::Bound { metric, max } => {
                let filters = self.repository.filters();
                let range = match metric {
                    Metric::Area => filters.area,
                    Metric::Volume => filters.volume,
                    Metric::Height => filters.height,
                };
                let current = if max { range.max } else { range.min };
                let input = current.map(crate::model::property::format_number).unwrap_or_default();
                self.prompt = Some(Prompt::with_input(PromptKind::Bound { metric, max }, input));
            }
            FilterRow::Custom(key) => {
                let input = self.repository.filters().custom.get(&key).cloned().unwrap_or_default();
                self.prompt = Some(Prompt::with_input(PromptKind::CustomFilter(key), input));
            }
            FilterRow::Reset => {
                self.repository.reset_filters();
                self.refresh_scene();
            }
        }
    }

    /// Space toggles, Enter picks. On a key row, Enter groups by the key and
    /// Space toggles coloring by it.
    fn activate_grouping_row(&mut self, row: GroupingRow, enter: bool) {
        match row {
            GroupingRow::Enabled => {
                let mut grouping = self.repository.grouping().clone();
                grouping.enabled = !grouping.enabled;
                self.repository.set_grouping(grouping);
            }
            GroupingRow::Key(key) => {
                if !self.repository.grouping().enabled {
                    self.notice = Some(Notice::Error("Enable grouping first".to_string()));
                    return;
                }
                if enter {
                    self.repository.set_grouping(GroupingConfig {
                        enabled: true,
                        property_key: Some(key),
                    });
                } else if self.repository.color_by() == Some(key.as_str()) {
                    self.repository.set_color_by_property(None);
                } else {
                    self.repository.set_color_by_property(Some(key));
                }
            }
        }
        self.recolor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{HIGHLIGHT_COLOR, SELECTED_OPACITY};
    use crate::model::UploadResponse;
    use crate::store::repository::model_info;
    use pretty_assertions::assert_eq;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn loaded_model(spaces: Vec<Space>) -> LoadedModel {
        LoadedModel {
            upload: UploadResponse {
                model_id: "m1".into(),
                filename: "tower.ifc".into(),
                file_size: 1024,
                uploaded_at: "2024-01-01T00:00:00".into(),
                total_spaces: spaces.len(),
                total_equipment: 0,
                ifc_schema: Some("IFC4".into()),
                project_name: None,
                parse_status: "success".into(),
                warnings: vec![],
            },
            info: model_info("m1"),
            spaces,
        }
    }

    fn spaces() -> Vec<Space> {
        [("a", 30.0, "1F"), ("b", 75.0, "1F"), ("c", 150.0, "2F")]
            .into_iter()
            .map(|(id, area, level)| {
                let mut s = Space::new(id, id.to_uppercase());
                s.area = Some(area);
                s.floor_level = Some(level.into());
                s
            })
            .collect()
    }

    fn started_app() -> App {
        let mut app = App::new(Config::default());
        app.start();
        app.apply_event(AppEvent::ModelLoaded(Ok(loaded_model(spaces()))));
        app
    }

    #[test]
    fn rejected_upload_leaves_repository_empty() {
        let mut app = App::new(Config::default());
        app.start();
        app.begin_upload(PathBuf::from("huge.ifc"));
        assert!(app.is_loading);

        app.apply_event(AppEvent::ModelLoaded(Err(ApiError::PayloadTooLarge)));

        assert!(!app.is_loading);
        assert!(!app.repository.is_loaded());
        assert!(app.repository.spaces().is_empty());
        assert!(app.upload_error.as_deref().unwrap().contains("100 MB"));
        assert_eq!(app.scene.backend().live_shapes(), 0);
    }

    #[test]
    fn failed_upload_discards_previous_model() {
        let mut app = started_app();
        assert_eq!(app.repository.spaces().len(), 3);

        app.begin_upload(PathBuf::from("broken.ifc"));
        app.apply_event(AppEvent::ModelLoaded(Err(ApiError::Server {
            detail: Some("Failed to parse IFC".into()),
        })));
        assert!(!app.repository.is_loaded());
        assert_eq!(app.upload_error.as_deref(), Some("Failed to parse IFC"));
    }

    #[test]
    fn connection_failure_marks_backend_down() {
        let mut app = App::new(Config::default());
        app.apply_event(AppEvent::Health(true));
        app.apply_event(AppEvent::ModelLoaded(Err(ApiError::Connection {
            url: "http://localhost:8000".into(),
            message: "refused".into(),
        })));
        assert_eq!(app.backend_connected, Some(false));
    }

    #[test]
    fn loaded_model_populates_scene() {
        let app = started_app();
        assert_eq!(app.scene.backend().live_shapes(), 3);
        assert_eq!(app.upload_error, None);
    }

    #[test]
    fn list_keys_drive_selection() {
        let mut app = started_app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.repository.selection().single(), Some("b"));

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.repository.selection().len(), 2);

        let (_, handle) = app.scene.shapes().find(|(s, _)| s.space_id == "b").unwrap();
        let appearance = app.scene.backend().appearance(handle).unwrap();
        assert_eq!(appearance.color, HIGHLIGHT_COLOR);
        assert_eq!(appearance.opacity, SELECTED_OPACITY);

        press(&mut app, KeyCode::Esc);
        assert!(app.repository.selection().is_empty());
    }

    #[test]
    fn area_bounds_filter_the_scene() {
        let mut app = started_app();
        app.tab = Tab::Filter;
        // rows: 1F, 2F, then min area
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(matches!(
            app.prompt.as_ref().map(|p| &p.kind),
            Some(PromptKind::Bound {
                metric: Metric::Area,
                max: false
            })
        ));
        for c in "50".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        for c in "100".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        let ids: Vec<&str> = app.space_rows().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(app.scene.backend().live_shapes(), 1);
    }

    #[test]
    fn click_actions_update_selection() {
        let mut app = started_app();
        app.apply_click(ClickAction::Replace("a".into()));
        app.apply_click(ClickAction::Toggle("c".into()));
        assert_eq!(app.repository.selection().iter().collect::<Vec<_>>(), vec!["a", "c"]);
        app.apply_click(ClickAction::Nothing);
        assert_eq!(app.repository.selection().len(), 2);
        app.apply_click(ClickAction::Clear);
        assert!(app.repository.selection().is_empty());
    }

    #[test]
    fn new_project_needs_confirmation() {
        let mut app = started_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('x'));
        assert!(app.repository.is_loaded());

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('y'));
        assert!(!app.repository.is_loaded());
        assert_eq!(app.scene.backend().live_shapes(), 0);
    }

    #[test]
    fn calculation_requires_a_model() {
        let mut app = App::new(Config::default());
        app.calculate_all();
        assert!(!app.calculations.is_calculating);
        assert!(matches!(app.notice, Some(Notice::Error(_))));
    }

    #[test]
    fn import_merges_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.csv");
        std::fs::write(&path, "id,Zone\na,North\nzz,South\n").unwrap();

        let mut app = started_app();
        app.import(&path);
        assert_eq!(
            app.repository.space("a").unwrap().property_text("Zone"),
            Some("North".to_string())
        );
        assert_eq!(app.repository.spaces().len(), 3);
        assert!(matches!(app.notice, Some(Notice::Info(_))));
    }

    #[test]
    fn disabled_viewer_keeps_panels_working() {
        let mut app = App::new(Config {
            viewer_enabled: false,
            ..Config::default()
        });
        app.start();
        app.apply_event(AppEvent::ModelLoaded(Ok(loaded_model(spaces()))));
        assert!(!app.scene.is_usable());
        assert_eq!(app.space_rows().len(), 3);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.repository.selection().single(), Some("a"));
    }
}
