use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout as Split};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use caretline::model::config::EngineConfig;
use caretline::model::document::RopeDocument;
use caretline::model::layout::MonospaceLayout;
use caretline::model::words::IdentifierWords;
use caretline::{
    Buttons, Document, DragAction, DragData, EffectMask, GestureState, InputDispatcher, Key, Layout,
    Modifiers, Point, PointerButton, Position, Rect, RulerAlignment, ScrollIndicator, Surface,
    TextSource, ViewportGeometry,
};

use crate::msg::Msg;

const WELCOME: &str = "\
caretline: pointer interaction demo

Drag with the left button to select text.
Double-click selects a word; keep dragging to extend word by word.
Press in the line-number column to select whole lines.
Hold Alt while dragging for a rectangular selection, Shift to keep the anchor.
Ctrl-click in the line-number column selects everything.

Drag a selection to move it. Hold Ctrl when releasing to copy instead.
Dragging near the top or bottom edge scrolls the view.

Press the middle button to start auto-scroll. Move away from the mark to
scroll faster. Any key, wheel or button press stops it.

Esc cancels, Ctrl-R toggles read-only, Ctrl-Z undoes, q quits.
";

/// Host-side double-click detection: a second primary press close in time and space.
#[derive(Debug, Default)]
struct ClickTracker {
    last_click: Option<(Point, Instant)>,
}

impl ClickTracker {
    const SLOP: i32 = 1;

    /// Registers a primary press; returns whether it completes a double click.
    fn click(&mut self, point: Point, now: Instant, window: Duration) -> bool {
        let double = self.last_click.is_some_and(|(last, at)| {
            !last.exceeds(point, Self::SLOP) && now.duration_since(at) < window
        });
        // A double click does not start a triple.
        self.last_click = if double { None } else { Some((point, now)) };
        double
    }
}

/// The terminal plays drag service for drags that stay inside it.
#[derive(Debug)]
struct LocalDrag {
    data: DragData,
    inside: bool,
}

pub struct App {
    pub config: EngineConfig,
    doc: RopeDocument,
    layout: MonospaceLayout,
    words: IdentifierWords,
    engine: InputDispatcher,
    clicks: ClickTracker,
    drag: Option<LocalDrag>,
    status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: EngineConfig, path: Option<&Path>, size: (u16, u16)) -> Result<Self> {
        let doc = match path {
            Some(path) => RopeDocument::from_file(path)?,
            None => RopeDocument::from_text(WELCOME),
        };
        let geometry = viewport_geometry(&config, &doc, size);
        Ok(Self {
            layout: MonospaceLayout::new(geometry, 1, 1),
            words: IdentifierWords,
            engine: InputDispatcher::new(config.clone()),
            clicks: ClickTracker::default(),
            drag: None,
            status: None,
            should_quit: false,
            config,
            doc,
        })
    }

    fn with_engine<R>(&mut self, f: impl FnOnce(&mut InputDispatcher, &mut Surface<'_>, Instant) -> R) -> R {
        let mut surface = Surface::new(&mut self.doc, &mut self.layout, &self.words);
        f(&mut self.engine, &mut surface, Instant::now())
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Mouse(mouse) => self.handle_mouse(mouse),
            Msg::Resize(w, h) => {
                let geometry = viewport_geometry(&self.config, &self.doc, (w, h));
                self.layout.set_geometry(geometry);
            }
            Msg::FocusLost => {
                self.cancel_local_drag();
                self.with_engine(|e, s, _| e.focus_lost(s));
            }
            Msg::FocusGained => {}
            Msg::Tick => self.with_engine(|e, s, now| e.tick(s, now)),
        }
        Ok(())
    }

    /// Whether anything on screen changed since the last call.
    pub fn needs_redraw(&mut self) -> bool {
        self.layout.take_redraw()
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Esc {
            self.cancel_local_drag();
            self.with_engine(|e, s, _| e.key_pressed(s, Key::Escape));
            return;
        }
        if self.drag.is_some() {
            return;
        }
        if self.with_engine(|e, s, _| e.key_pressed(s, Key::Other)).is_handled() {
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                self.should_quit = true;
            }
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => {
                let read_only = !self.doc.is_read_only();
                self.doc.set_read_only(read_only);
                self.set_status(if read_only { "read-only" } else { "writable" });
            }
            (KeyCode::Char('z'), KeyModifiers::CONTROL) => {
                let undone = self.doc.undo();
                self.set_status(if undone { "undone" } else { "nothing to undo" });
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = Point::new(i32::from(mouse.column), i32::from(mouse.row));
        let modifiers = modifiers_from(mouse.modifiers);

        if self.drag.is_some() {
            self.drive_local_drag(mouse.kind, point, modifiers);
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(button) => {
                let button = pointer_button(button);
                let double = button == PointerButton::Primary
                    && self.clicks.click(point, Instant::now(), self.config.double_click_window());
                if double {
                    self.with_engine(|e, s, now| e.pointer_double_clicked(s, point, button, modifiers, now));
                } else {
                    self.with_engine(|e, s, now| e.pointer_pressed(s, point, button, modifiers, now));
                }
            }
            MouseEventKind::Up(button) => {
                let button = pointer_button(button);
                self.with_engine(|e, s, now| e.pointer_released(s, point, button, now));
            }
            MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                self.with_engine(|e, s, now| e.pointer_moved(s, point, now));
                if let Some(data) = self.engine.take_started_drag() {
                    let effect = self.with_engine(|e, s, now| e.drag_enter(s, &data, point, modifiers, now));
                    tracing::debug!(?effect, "local drag started");
                    self.drag = Some(LocalDrag { data, inside: true });
                }
            }
            MouseEventKind::ScrollDown => {
                self.with_engine(|e, s, _| e.wheel_rotated(s, 0, 3));
            }
            MouseEventKind::ScrollUp => {
                self.with_engine(|e, s, _| e.wheel_rotated(s, 0, -3));
            }
            MouseEventKind::ScrollLeft => {
                self.with_engine(|e, s, _| e.wheel_rotated(s, -3, 0));
            }
            MouseEventKind::ScrollRight => {
                self.with_engine(|e, s, _| e.wheel_rotated(s, 3, 0));
            }
        }
    }

    /// Runs one step of the in-terminal drag loop.
    fn drive_local_drag(&mut self, kind: MouseEventKind, point: Point, modifiers: Modifiers) {
        let Some(mut drag) = self.drag.take() else {
            return;
        };
        let buttons = match kind {
            MouseEventKind::Up(_) => Buttons::empty(),
            MouseEventKind::Down(MouseButton::Right) => Buttons::PRIMARY | Buttons::SECONDARY,
            _ => Buttons::PRIMARY,
        };

        match self.engine.query_continue(false, buttons) {
            DragAction::Cancel => {
                if drag.inside {
                    self.with_engine(|e, s, now| e.drag_leave(s, now));
                }
                self.finish_local_drag(EffectMask::empty());
            }
            DragAction::Drop => {
                let effect = if drag.inside {
                    self.with_engine(|e, s, now| e.drop(s, &drag.data, point, modifiers, now))
                } else {
                    EffectMask::empty()
                };
                self.finish_local_drag(effect);
            }
            DragAction::Continue => {
                let inside = self.layout.geometry().bounds.contains(point);
                match (drag.inside, inside) {
                    (false, true) => {
                        self.with_engine(|e, s, now| e.drag_enter(s, &drag.data, point, modifiers, now));
                    }
                    (true, false) => self.with_engine(|e, s, now| e.drag_leave(s, now)),
                    (true, true) => {
                        self.with_engine(|e, s, now| e.drag_over(s, point, modifiers, now));
                    }
                    (false, false) => {}
                }
                drag.inside = inside;
                self.drag = Some(drag);
            }
        }
    }

    fn cancel_local_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        debug_assert_eq!(self.engine.query_continue(true, Buttons::PRIMARY), DragAction::Cancel);
        if drag.inside {
            self.with_engine(|e, s, now| e.drag_leave(s, now));
        }
        self.finish_local_drag(EffectMask::empty());
    }

    fn finish_local_drag(&mut self, effect: EffectMask) {
        self.with_engine(|e, s, now| e.end_drag(s, effect, now));
        let outcome = if effect.contains(EffectMask::MOVE) {
            "moved"
        } else if effect.contains(EffectMask::COPY) {
            "copied"
        } else {
            "drop had no effect"
        };
        self.set_status(outcome);
    }

    fn set_status(&mut self, status: &str) {
        self.status = Some(status.to_string());
        self.layout.request_redraw();
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Split::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // viewport
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_viewport(frame, chunks[0]);
        self.render_status_bar(frame, chunks[1]);
    }

    fn render_viewport(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let geometry = *self.layout.geometry();
        let selection = self.doc.selection();
        let top = self.layout.top_line;
        let columns = self.layout.visible_columns();
        let number_width = geometry.line_numbers_width.max(0) as usize;

        let lines: Vec<Line<'static>> = (0..area.height as usize)
            .map(|row| {
                let line = top + row;
                if line >= self.doc.line_count() {
                    return Line::from("");
                }
                let region = selection.region();
                let last_selected = if region.end().column == 0 && region.end().line > region.beginning().line {
                    region.end().line - 1
                } else {
                    region.end().line
                };
                let in_selection = !selection.is_empty() && (region.beginning().line..=last_selected).contains(&line);

                let gutter = Span::styled(
                    (if in_selection { "▌" } else { " " }).repeat(geometry.gutter_width.max(0) as usize),
                    Style::default().fg(Color::Cyan),
                );
                let number = Span::styled(
                    if number_width > 0 {
                        format!("{:>width$} ", line + 1, width = number_width.saturating_sub(1))
                    } else {
                        String::new()
                    },
                    Style::default().fg(Color::DarkGray),
                );
                let padding = Span::raw(" ".repeat(geometry.text_padding.max(0) as usize));

                let mut text: Vec<Span<'static>> = self
                    .doc
                    .line_text(line)
                    .chars()
                    .enumerate()
                    .skip(self.layout.left_column)
                    .take(columns)
                    .map(|(column, c)| {
                        let style = if selection.covers(Position::new(line, column)) {
                            Style::default().add_modifier(Modifier::REVERSED)
                        } else {
                            Style::default()
                        };
                        Span::styled(c.to_string(), style)
                    })
                    .collect();

                match geometry.ruler_alignment {
                    RulerAlignment::Left => {
                        let mut spans = vec![gutter, number, padding];
                        spans.append(&mut text);
                        Line::from(spans)
                    }
                    RulerAlignment::Right => {
                        let used: usize = text.iter().map(|s| s.content.chars().count()).sum();
                        text.push(Span::raw(" ".repeat(columns.saturating_sub(used))));
                        text.extend([padding, number, gutter]);
                        Line::from(text)
                    }
                }
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);

        if let (Some(origin), Some(indicator)) =
            (self.engine.auto_scroll_origin(), self.engine.auto_scroll_indicator())
        {
            let mark = match indicator {
                ScrollIndicator::Upward => "▲",
                ScrollIndicator::Downward => "▼",
                ScrollIndicator::Neutral => "◆",
            };
            let (x, y) = (origin.x.max(0) as u16, origin.y.max(0) as u16);
            if x < area.x + area.width && y < area.y + area.height {
                let cell = ratatui::layout::Rect::new(x, y, 1, 1);
                let style = Style::default().fg(Color::Black).bg(Color::Yellow);
                frame.render_widget(Paragraph::new(Span::styled(mark, style)), cell);
            }
        }

        if self.engine.state().is_idle() && self.drag.is_none() {
            let caret = self.layout.point_for(&self.doc, self.doc.selection().active);
            if self.layout.geometry().text_area().contains(caret) {
                frame.set_cursor_position((caret.x as u16, caret.y as u16));
            }
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let state = self.engine.state();
        let state_style = match state {
            GestureState::Idle => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            GestureState::DraggingOut(_) | GestureState::DragTargetHover(_) => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };
        let state_span = Span::styled(format!(" {} ", state.label()), state_style);

        let file_name = self
            .doc
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[welcome]".to_string());
        let read_only = if self.doc.is_read_only() { " [RO]" } else { "" };
        let selection = self.doc.selection();
        let shape = if selection.is_rectangular() { " rect" } else { "" };
        let status = self
            .status
            .as_deref()
            .map(|s| format!(" | {s}"))
            .unwrap_or_default();

        let info = Span::styled(
            format!(
                " {file_name}{read_only}  {}{shape}  top {}{status} ",
                selection.region(),
                self.layout.top_line + 1,
            ),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![state_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

/// Viewport partition for a terminal of `size`, leaving the last row for the status bar.
fn viewport_geometry(config: &EngineConfig, doc: &RopeDocument, size: (u16, u16)) -> ViewportGeometry {
    let (width, height) = size;
    let line_numbers_width = if config.viewport.line_numbers {
        doc.line_count().max(1).to_string().len() as i32 + 1
    } else {
        0
    };
    ViewportGeometry {
        bounds: Rect::new(0, 0, i32::from(width), i32::from(height.saturating_sub(1))),
        gutter_width: i32::from(config.viewport.gutter_width),
        line_numbers_width,
        text_padding: i32::from(config.viewport.text_padding),
        top_margin: 0,
        bottom_margin: 0,
        ruler_alignment: config.viewport.ruler_alignment,
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
    }
}

fn modifiers_from(keys: KeyModifiers) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, keys.contains(KeyModifiers::SHIFT));
    modifiers.set(Modifiers::CONTROL, keys.contains(KeyModifiers::CONTROL));
    modifiers.set(Modifiers::ALT, keys.contains(KeyModifiers::ALT));
    modifiers.set(Modifiers::META, keys.intersects(KeyModifiers::META | KeyModifiers::SUPER));
    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_click_inside_window_is_a_double_click() {
        let mut clicks = ClickTracker::default();
        let start = Instant::now();
        let window = Duration::from_millis(400);
        assert!(!clicks.click(Point::new(10, 4), start, window));
        assert!(clicks.click(Point::new(11, 4), start + Duration::from_millis(150), window));
        // The next press starts over.
        assert!(!clicks.click(Point::new(11, 4), start + Duration::from_millis(200), window));
        assert!(!clicks.click(Point::new(30, 4), start + Duration::from_millis(250), window));
        assert!(!clicks.click(Point::new(30, 4), start + Duration::from_millis(900), window));
    }

    #[test]
    fn geometry_reserves_status_row_and_number_column() {
        let config = EngineConfig::default();
        let doc = RopeDocument::from_text(&"x\n".repeat(120));
        let geometry = viewport_geometry(&config, &doc, (80, 24));
        assert_eq!(geometry.bounds, Rect::new(0, 0, 80, 23));
        assert_eq!(geometry.line_numbers_width, 4);
        assert_eq!(geometry.text_area().left, 6);
    }

    #[test]
    fn terminal_modifiers_map_to_engine_flags() {
        let mapped = modifiers_from(KeyModifiers::CONTROL | KeyModifiers::ALT);
        assert_eq!(mapped, Modifiers::CONTROL | Modifiers::ALT);
    }
}
