//! Terminal render surface for the scene: shapes are drawn as projected
//! outlines on a braille canvas.

use super::app::App;
use super::dashboard::{BRAND_MUTED, BRAND_ORANGE};
use crate::color::{Appearance, Rgb, DEFAULT_COLOR, DEFAULT_OPACITY};
use crate::error::SceneError;
use crate::scene::camera::project_with;
use crate::scene::{RenderBackend, SceneState, ShapeHandle, SpaceShape, Viewport};
use nalgebra::Point3;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine},
        Block, Borders, Paragraph, Wrap,
    },
    Frame,
};
use std::collections::HashMap;

/// Braille dots per terminal cell.
const DOTS_X: f64 = 2.0;
const DOTS_Y: f64 = 4.0;

/// Materials of the shapes currently on screen.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    enabled: bool,
    next_handle: u64,
    materials: HashMap<ShapeHandle, Appearance>,
}

impl TerminalSurface {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn appearance(&self, handle: ShapeHandle) -> Option<Appearance> {
        self.materials.get(&handle).copied()
    }

    #[must_use]
    pub fn live_shapes(&self) -> usize {
        self.materials.len()
    }
}

impl RenderBackend for TerminalSurface {
    fn probe(&mut self) -> Result<Viewport, SceneError> {
        if !self.enabled {
            return Err(SceneError::Unavailable {
                reason: "the 3D viewer is disabled".to_string(),
            });
        }
        Ok(Viewport {
            width: 160.0,
            height: 96.0,
        })
    }

    fn create(&mut self, _shape: &SpaceShape) -> ShapeHandle {
        self.next_handle += 1;
        let handle = ShapeHandle(self.next_handle);
        self.materials.insert(
            handle,
            Appearance {
                color: DEFAULT_COLOR,
                opacity: DEFAULT_OPACITY,
            },
        );
        handle
    }

    fn set_appearance(&mut self, handle: ShapeHandle, appearance: Appearance) {
        if let Some(material) = self.materials.get_mut(&handle) {
            *material = appearance;
        }
    }

    fn release(&mut self, handle: ShapeHandle) {
        self.materials.remove(&handle);
    }
}

/// Viewport of a pane's inner area, in braille dots.
#[must_use]
pub fn viewport_of(inner: Rect) -> Viewport {
    Viewport {
        width: f64::from(inner.width.max(1)) * DOTS_X,
        height: f64::from(inner.height.max(1)) * DOTS_Y,
    }
}

/// Normalized device coordinates of a terminal cell inside `inner`.
#[must_use]
pub fn cell_to_ndc(inner: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if inner.width == 0
        || inner.height == 0
        || column < inner.x
        || row < inner.y
        || column >= inner.x + inner.width
        || row >= inner.y + inner.height
    {
        return None;
    }
    let x = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
    let y = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
    Some((x * 2.0 - 1.0, 1.0 - y * 2.0))
}

/// Color as seen through the material's opacity over a dark background.
#[must_use]
pub fn shaded(appearance: Appearance) -> Color {
    let Rgb(r, g, b) = appearance.color;
    let alpha = f64::from(appearance.opacity.clamp(0.0, 1.0));
    let scale = |c: u8| (f64::from(c) * alpha).round() as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

pub fn draw_viewer(frame: &mut Frame, area: Rect, app: &App) {
    let scene = &app.scene;
    let title = format!(
        " Viewer · {} · {} shapes ",
        scene.mode().label(),
        scene.shapes().count()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND_MUTED));

    if let SceneState::Failed(err) = scene.state() {
        let message = Paragraph::new(format!("{err}\n\nThe panels on the left remain usable."))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(BRAND_ORANGE))
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let view_projection = scene.rig().view_projection();
    let grid = scene.rig().grid.lines();

    // selected shapes last so the highlight stays on top
    let mut shapes: Vec<(&SpaceShape, Appearance)> = scene
        .shapes()
        .filter_map(|(shape, handle)| scene.backend().appearance(handle).map(|a| (shape, a)))
        .collect();
    shapes.sort_by(|a, b| a.1.opacity.total_cmp(&b.1.opacity));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (from, to) in &grid {
                draw_segment(ctx, &view_projection, from, to, Color::DarkGray);
            }
            for (shape, appearance) in &shapes {
                let color = shaded(*appearance);
                for [a, b] in &shape.edges {
                    draw_segment(ctx, &view_projection, &shape.vertices[*a], &shape.vertices[*b], color);
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_segment(
    ctx: &mut Context<'_>,
    view_projection: &nalgebra::Matrix4<f64>,
    from: &Point3<f64>,
    to: &Point3<f64>,
    color: Color,
) {
    let (Some(a), Some(b)) = (project_with(view_projection, from), project_with(view_projection, to))
    else {
        return;
    };
    // drop segments behind the near plane or far outside the view
    if a.z.abs() > 1.0 || b.z.abs() > 1.0 || a.x.abs().max(b.x.abs()) > 4.0 || a.y.abs().max(b.y.abs()) > 4.0 {
        return;
    }
    ctx.draw(&CanvasLine {
        x1: a.x,
        y1: a.y,
        x2: b.x,
        y2: b.y,
        color,
    });
}
