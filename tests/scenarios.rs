use std::time::{Duration, Instant};

use caretline::model::document::RopeDocument;
use caretline::model::layout::MonospaceLayout;
use caretline::model::words::IdentifierWords;
use caretline::{
    CursorShape, Document, DragData, EditError, EffectMask, EngineConfig, Format, GestureState, Handled,
    InputDispatcher, Key, Modifiers, Point, PointerButton, Position, Rect, Region, RulerAlignment,
    ScrollIndicator, Selection, SelectionShape, Surface, TextSource, ViewportGeometry,
};

/// An 80x10 terminal-style viewport: gutter at x = 0, line numbers at 1..5,
/// text from x = 6. One cell per character and per line.
struct Harness {
    doc: RopeDocument,
    layout: MonospaceLayout,
    words: IdentifierWords,
    engine: InputDispatcher,
    now: Instant,
}

fn viewport() -> MonospaceLayout {
    let geometry = ViewportGeometry {
        bounds: Rect::new(0, 0, 80, 10),
        gutter_width: 1,
        line_numbers_width: 4,
        text_padding: 1,
        top_margin: 0,
        bottom_margin: 0,
        ruler_alignment: RulerAlignment::Left,
    };
    MonospaceLayout::new(geometry, 1, 1)
}

impl Harness {
    fn new(text: &str) -> Self {
        Self {
            doc: RopeDocument::from_text(text),
            layout: viewport(),
            words: IdentifierWords,
            engine: InputDispatcher::new(EngineConfig::default()),
            now: Instant::now(),
        }
    }

    fn tall(lines: usize) -> Self {
        let text: String = (0..lines)
            .map(|i| format!("line {i:03} the quick brown fox jumps\n"))
            .collect();
        Self::new(&text)
    }

    /// Viewport point of the cell at (`line`, `column`) with no scrolling.
    fn at(&self, line: i32, column: i32) -> Point {
        Point::new(6 + column, line)
    }

    fn advance(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
    }

    fn with<R>(&mut self, f: impl FnOnce(&mut InputDispatcher, &mut Surface<'_>, Instant) -> R) -> R {
        let mut surface = Surface::new(&mut self.doc, &mut self.layout, &self.words);
        f(&mut self.engine, &mut surface, self.now)
    }

    fn press(&mut self, point: Point, button: PointerButton, modifiers: Modifiers) -> Handled {
        self.with(|e, s, now| e.pointer_pressed(s, point, button, modifiers, now))
    }

    fn double_click(&mut self, point: Point) -> Handled {
        self.with(|e, s, now| e.pointer_double_clicked(s, point, PointerButton::Primary, Modifiers::empty(), now))
    }

    fn move_to(&mut self, point: Point) -> Handled {
        self.with(|e, s, now| e.pointer_moved(s, point, now))
    }

    fn release(&mut self, point: Point, button: PointerButton) -> Handled {
        self.with(|e, s, now| e.pointer_released(s, point, button, now))
    }

    fn tick(&mut self) {
        self.with(|e, s, now| e.tick(s, now));
    }

    fn selection(&self) -> Selection {
        caretline::Document::selection(&self.doc)
    }

    fn select(&mut self, anchor: (usize, usize), active: (usize, usize), shape: SelectionShape) {
        caretline::Document::select(
            &mut self.doc,
            Position::new(anchor.0, anchor.1),
            Position::new(active.0, active.1),
            shape,
        );
    }

    /// Presses over the selection and moves far enough to start dragging it.
    fn start_drag(&mut self, from: Point) -> DragData {
        assert_eq!(self.press(from, PointerButton::Primary, Modifiers::empty()), Handled::Yes);
        assert!(matches!(self.engine.state(), GestureState::ApproachingDrag { .. }));
        self.move_to(Point::new(from.x + 5, from.y));
        self.engine.take_started_drag().expect("drag should have started")
    }
}

fn region(a: (usize, usize), b: (usize, usize)) -> Region {
    Region::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
}

#[test]
fn scenario_a_character_selection() {
    let mut h = Harness::tall(20);
    let press = h.at(3, 5);
    assert_eq!(h.press(press, PointerButton::Primary, Modifiers::empty()), Handled::Yes);
    assert_eq!(h.engine.state(), &GestureState::ExtendingCharacter);
    assert!(h.engine.has_capture());

    h.move_to(h.at(3, 10));
    h.release(h.at(3, 10), PointerButton::Primary);

    let selection = h.selection();
    assert_eq!(selection.region(), region((3, 5), (3, 10)));
    assert_eq!(selection.shape, SelectionShape::Linear);
    assert!(h.engine.state().is_idle());
    assert!(!h.engine.has_capture());
    assert!(h.engine.scheduler().is_empty());
}

#[test]
fn scenario_b_line_selection_from_line_numbers() {
    let mut h = Harness::tall(20);
    h.press(Point::new(3, 2), PointerButton::Primary, Modifiers::empty());
    assert_eq!(h.engine.state(), &GestureState::ExtendingLine { initial_line: 2 });
    assert_eq!(h.selection().region(), region((2, 0), (3, 0)));

    h.move_to(h.at(5, 12));
    assert_eq!(h.selection().region(), region((2, 0), (6, 0)));

    // Dragging above the initial line anchors after it.
    h.move_to(h.at(0, 3));
    let selection = h.selection();
    assert_eq!(selection.anchor, Position::new(3, 0));
    assert_eq!(selection.active, Position::new(0, 0));
}

#[test]
fn line_selection_on_last_line_clamps_to_document_end() {
    let mut h = Harness::new("first\nsecond\nlast");
    h.press(Point::new(0, 2), PointerButton::Primary, Modifiers::empty());
    assert_eq!(h.selection().region(), region((2, 0), (2, 4)));
}

#[test]
fn scenario_c_word_selection_keeps_initial_word() {
    let mut h = Harness::new("the alpha beta\nsecond\n");
    h.double_click(h.at(0, 6));
    assert_eq!(
        h.engine.state(),
        &GestureState::ExtendingWord { initial_line: 0, initial_word_columns: 4..9 }
    );
    assert_eq!(h.selection().region(), region((0, 4), (0, 9)));

    h.move_to(h.at(0, 0));
    assert_eq!(h.selection().region(), region((0, 0), (0, 9)));

    h.move_to(h.at(0, 12));
    assert_eq!(h.selection().region(), region((0, 4), (0, 14)));

    h.move_to(h.at(0, 7));
    assert_eq!(h.selection().region(), region((0, 4), (0, 9)));
}

#[test]
fn scenario_d_drop_onto_read_only_document_has_no_effect() {
    let mut h = Harness::new("zero\none line\ntwo\nthree\nfour\n");
    h.select((1, 0), (1, 4), SelectionShape::Linear);
    let data = h.start_drag(h.at(1, 1));
    assert_eq!(data.plain_text(), Ok("one "));
    assert!(matches!(h.engine.state(), GestureState::DraggingOut(_)));

    h.doc.set_read_only(true);
    let target = h.at(3, 2);
    let entered = h.with(|e, s, now| e.drag_enter(s, &data, target, Modifiers::empty(), now));
    assert_eq!(entered, EffectMask::empty());
    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    h.with(|e, s, now| e.end_drag(s, effect, now));

    assert_eq!(h.doc.text(), "zero\none line\ntwo\nthree\nfour\n");
    assert_eq!(h.selection().region(), region((1, 0), (1, 4)));
    assert!(h.engine.state().is_idle());
}

#[test]
fn scenario_e_auto_scroll_scrolls_toward_pointer() {
    let mut h = Harness::tall(100);
    let origin = h.at(2, 10);
    assert_eq!(h.press(origin, PointerButton::Middle, Modifiers::empty()), Handled::Yes);
    assert_eq!(h.engine.auto_scroll_origin(), Some(origin));

    h.move_to(Point::new(origin.x, origin.y + 4));
    match h.engine.state() {
        GestureState::AutoScrollDragging(t) => assert_eq!(t.degree, 4),
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(h.engine.auto_scroll_indicator(), Some(ScrollIndicator::Downward));

    h.tick();
    assert_eq!(h.layout.top_line, 1);
    h.advance(100);
    h.tick();
    assert_eq!(h.layout.top_line, 1, "degree 4 reschedules after 125 ms");
    h.advance(25);
    h.tick();
    assert_eq!(h.layout.top_line, 2);

    h.release(Point::new(origin.x, origin.y + 4), PointerButton::Middle);
    assert!(h.engine.state().is_idle());
    assert_eq!(h.engine.auto_scroll_origin(), None);
    h.advance(1000);
    h.tick();
    assert_eq!(h.layout.top_line, 2);
}

#[test]
fn timed_auto_scroll_ends_on_second_middle_press() {
    let mut h = Harness::tall(100);
    let origin = h.at(5, 10);
    h.press(origin, PointerButton::Middle, Modifiers::empty());
    h.release(origin, PointerButton::Middle);
    assert!(matches!(h.engine.state(), GestureState::AutoScrollTimed(_)));
    assert!(h.engine.has_capture());

    // Neutral: no scrolling while the pointer rests at the origin.
    h.tick();
    assert_eq!(h.layout.top_line, 0);

    h.move_to(Point::new(origin.x, origin.y - 3));
    assert_eq!(h.engine.auto_scroll_indicator(), Some(ScrollIndicator::Upward));
    let shape = h.with(|e, s, _| e.cursor_shape(s, Point::new(20, 2)));
    assert_eq!(shape, CursorShape::AutoScrollUp);

    assert_eq!(h.press(origin, PointerButton::Middle, Modifiers::empty()), Handled::Yes);
    assert!(h.engine.state().is_idle());
    assert!(!h.engine.has_capture());
}

#[test]
fn auto_scroll_ends_on_wheel_and_keys() {
    let mut h = Harness::tall(100);
    let origin = h.at(5, 10);
    h.press(origin, PointerButton::Middle, Modifiers::empty());
    h.release(origin, PointerButton::Middle);
    assert_eq!(h.with(|e, s, _| e.wheel_rotated(s, 0, 3)), Handled::Yes);
    assert!(h.engine.state().is_idle());
    assert_eq!(h.layout.top_line, 0, "the wheel only ends auto-scroll");

    h.press(origin, PointerButton::Middle, Modifiers::empty());
    h.release(origin, PointerButton::Middle);
    assert_eq!(h.with(|e, s, _| e.key_pressed(s, Key::Other)), Handled::Yes);
    assert!(h.engine.state().is_idle());
    assert!(h.engine.scheduler().is_empty());
}

#[test]
fn auto_scroll_needs_a_document_taller_than_the_viewport() {
    let mut h = Harness::new("short\ndocument\n");
    assert_eq!(h.press(h.at(0, 1), PointerButton::Middle, Modifiers::empty()), Handled::No);
    assert!(h.engine.state().is_idle());
}

#[test]
fn sub_threshold_moves_do_not_start_a_drag() {
    let mut h = Harness::new("zero\none line\ntwo\n");
    h.select((1, 0), (1, 8), SelectionShape::Linear);
    let origin = h.at(1, 3);
    h.press(origin, PointerButton::Primary, Modifiers::empty());
    for (dx, dy) in [(1, 0), (2, 2), (-2, 1), (0, -2)] {
        h.move_to(Point::new(origin.x + dx, origin.y + dy));
        assert!(matches!(h.engine.state(), GestureState::ApproachingDrag { .. }));
        assert!(h.engine.take_started_drag().is_none());
    }
    h.move_to(Point::new(origin.x, origin.y + 3));
    assert!(matches!(h.engine.state(), GestureState::DraggingOut(_)));
    assert!(h.engine.take_started_drag().is_some());
}

#[test]
fn release_before_dragging_collapses_the_caret() {
    let mut h = Harness::new("zero\none line\ntwo\n");
    h.select((1, 0), (1, 8), SelectionShape::Linear);
    h.press(h.at(1, 3), PointerButton::Primary, Modifiers::empty());
    h.release(h.at(1, 4), PointerButton::Primary);
    assert_eq!(h.selection(), Selection::caret(Position::new(1, 4)));
    assert!(h.engine.state().is_idle());
}

#[test]
fn same_viewport_drop_moves_text_as_one_edit() {
    let mut h = Harness::new("the alpha beta\nsecond line\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    let data = h.start_drag(h.at(0, 5));

    let target = h.at(1, 6);
    let hover = h.with(|e, s, now| e.drag_enter(s, &data, target, Modifiers::empty(), now));
    assert_eq!(hover, EffectMask::MOVE);
    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::MOVE);
    assert!(matches!(h.engine.state(), GestureState::DraggingOut(_)));
    h.with(|e, s, now| e.end_drag(s, effect, now));

    assert_eq!(h.doc.text(), "the  beta\nsecondalpha line\n");
    assert_eq!(h.selection().region(), region((1, 6), (1, 11)));
    assert_eq!(h.doc.undo_depth(), 1);
    assert!(h.engine.state().is_idle());

    assert!(h.doc.undo());
    assert_eq!(h.doc.text(), "the alpha beta\nsecond line\n");
}

#[test]
fn copy_modifier_copies_instead_of_moving() {
    let mut h = Harness::new("the alpha beta\nsecond line\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    let data = h.start_drag(h.at(0, 5));
    let target = h.at(1, 6);
    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::CONTROL, now));
    assert_eq!(effect, EffectMask::COPY);
    h.with(|e, s, now| e.end_drag(s, effect, now));
    assert_eq!(h.doc.text(), "the alpha beta\nsecondalpha line\n");
    assert_eq!(h.selection().region(), region((1, 6), (1, 11)));
}

#[test]
fn dropping_onto_own_selection_only_moves_the_caret() {
    let mut h = Harness::new("the alpha beta\nsecond line\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    let data = h.start_drag(h.at(0, 5));
    let effect = h.with(|e, s, now| e.drop(s, &data, Point::new(6 + 7, 0), Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    assert_eq!(h.selection(), Selection::caret(Position::new(0, 7)));
    assert_eq!(h.doc.text(), "the alpha beta\nsecond line\n");
}

#[test]
fn external_move_removes_the_source_text() {
    let mut h = Harness::new("the alpha beta\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    h.start_drag(h.at(0, 5));
    h.with(|e, s, now| e.end_drag(s, EffectMask::MOVE, now));
    assert_eq!(h.doc.text(), "the  beta\n");
    assert!(h.engine.state().is_idle());
}

#[test]
fn external_drop_inserts_and_selects() {
    let mut h = Harness::new("one\ntwo\nthree\n");
    let data = DragData::text("XY");
    let target = h.at(1, 1);
    let hover = h.with(|e, s, now| e.drag_enter(s, &data, target, Modifiers::empty(), now));
    assert_eq!(hover, EffectMask::MOVE);
    assert!(matches!(h.engine.state(), GestureState::DragTargetHover(_)));

    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::CONTROL, now));
    assert_eq!(effect, EffectMask::COPY);
    assert_eq!(h.doc.text(), "one\ntXYwo\nthree\n");
    assert_eq!(h.selection().region(), region((1, 1), (1, 3)));
    assert!(h.engine.state().is_idle());
}

#[test]
fn rectangular_drop_is_refused_over_bidirectional_lines() {
    let mut h = Harness::new("abc\nabc\nשלום\nxyz");
    let data = DragData::rectangle("12\n34");

    let over_bidi = h.at(1, 1);
    let effect = h.with(|e, s, now| e.drag_enter(s, &data, over_bidi, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    let dropped = h.with(|e, s, now| e.drop(s, &data, over_bidi, Modifiers::empty(), now));
    assert_eq!(dropped, EffectMask::empty());
    assert_eq!(h.doc.text(), "abc\nabc\nשלום\nxyz");

    let clear = h.at(3, 1);
    let effect = h.with(|e, s, now| e.drag_enter(s, &data, clear, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::MOVE);
    let dropped = h.with(|e, s, now| e.drop(s, &data, clear, Modifiers::empty(), now));
    assert_eq!(dropped, EffectMask::MOVE);
    assert_eq!(h.doc.text(), "abc\nabc\nשלום\nx12yz\n 34");
    let selection = h.selection();
    assert_eq!(selection.shape, SelectionShape::Rectangular);
    assert_eq!(selection.region(), region((3, 1), (4, 3)));
}

#[test]
fn drops_outside_the_accessible_region_or_without_text_are_refused() {
    let mut h = Harness::new("one\ntwo\nthree\n");
    h.doc.narrow_to(Some(region((1, 0), (1, 3))));
    let text = DragData::text("XY");
    let outside = h.at(2, 1);
    h.with(|e, s, now| e.drag_enter(s, &text, outside, Modifiers::empty(), now));
    let effect = h.with(|e, s, now| e.drop(s, &text, outside, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());

    let image = DragData::new().with(Format::Other("image/png".into()), vec![0x89, 0x50]);
    let inside = h.at(1, 1);
    let effect = h.with(|e, s, now| e.drag_enter(s, &image, inside, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    h.with(|e, s, now| e.drag_leave(s, now));
    assert!(h.engine.state().is_idle());
    assert_eq!(h.doc.text(), "one\ntwo\nthree\n");
}

#[test]
fn hovering_in_the_edge_band_keeps_scrolling() {
    let mut h = Harness::tall(100);
    let data = DragData::text("x");
    let bottom = Point::new(20, 9);
    let effect = h.with(|e, s, now| e.drag_enter(s, &data, bottom, Modifiers::empty(), now));
    assert!(effect.contains(EffectMask::SCROLL));
    assert_eq!(h.layout.top_line, 1);

    // A second hover before the drag-scroll timer fires does not scroll again.
    let effect = h.with(|e, s, now| e.drag_over(s, bottom, Modifiers::empty(), now));
    assert!(effect.contains(EffectMask::SCROLL));
    assert_eq!(h.layout.top_line, 1);

    h.advance(50);
    h.tick();
    assert_eq!(h.layout.top_line, 2);

    h.with(|e, s, now| e.drag_leave(s, now));
    h.advance(200);
    h.tick();
    assert_eq!(h.layout.top_line, 2);
}

#[test]
fn selection_observer_scrolls_toward_pointer_outside_text_area() {
    let mut h = Harness::tall(100);
    h.press(h.at(5, 4), PointerButton::Primary, Modifiers::empty());
    h.move_to(Point::new(10, 12));

    // Three rows below the text area: three lines per tick.
    h.advance(100);
    h.tick();
    assert_eq!(h.layout.top_line, 3);
    assert_eq!(h.selection().active, Position::new(12, 4));

    h.advance(100);
    h.tick();
    assert_eq!(h.layout.top_line, 6);
    assert_eq!(h.selection().active, Position::new(15, 4));

    // Just below the edge only scrolls one line.
    h.move_to(Point::new(10, 10));
    h.advance(100);
    h.tick();
    assert_eq!(h.layout.top_line, 7);

    h.release(Point::new(10, 10), PointerButton::Primary);
    h.advance(100);
    h.tick();
    assert_eq!(h.layout.top_line, 7);
}

#[test]
fn word_modifier_in_line_numbers_selects_everything() {
    let mut h = Harness::new("one\ntwo\nthree");
    assert_eq!(h.press(Point::new(3, 1), PointerButton::Primary, Modifiers::CONTROL), Handled::Yes);
    assert_eq!(h.selection().region(), region((0, 0), (2, 5)));
    assert!(h.engine.state().is_idle());
    assert!(!h.engine.has_capture());
}

#[test]
fn alternative_modifier_makes_a_rectangle() {
    let mut h = Harness::tall(20);
    h.press(h.at(1, 2), PointerButton::Primary, Modifiers::ALT);
    h.move_to(h.at(3, 6));
    let selection = h.selection();
    assert_eq!(selection.shape, SelectionShape::Rectangular);
    assert_eq!(selection.rectangle_columns(), 2..6);
}

#[test]
fn keep_anchor_modifier_extends_existing_selection() {
    let mut h = Harness::tall(20);
    h.select((2, 3), (2, 3), SelectionShape::Linear);
    h.press(h.at(4, 1), PointerButton::Primary, Modifiers::SHIFT);
    assert_eq!(h.selection().region(), region((2, 3), (4, 1)));
}

#[test]
fn cancellation_is_idempotent_and_never_edits() {
    let mut h = Harness::new("the alpha beta\nsecond line\n");
    h.press(h.at(0, 2), PointerButton::Primary, Modifiers::empty());
    h.move_to(h.at(1, 3));
    let during = h.selection();

    assert_eq!(h.with(|e, s, _| e.key_pressed(s, Key::Escape)), Handled::Yes);
    assert_eq!(h.with(|e, s, _| e.key_pressed(s, Key::Escape)), Handled::No);
    h.with(|e, s, _| e.focus_lost(s));
    h.with(|e, s, _| e.capture_lost(s));
    assert!(h.engine.state().is_idle());
    assert!(!h.engine.has_capture());
    assert_eq!(h.selection(), during);

    h.select((0, 4), (0, 9), SelectionShape::Linear);
    h.start_drag(h.at(0, 5));
    h.with(|e, s, _| e.capture_lost(s));
    assert!(h.engine.state().is_idle());
    assert_eq!(h.doc.text(), "the alpha beta\nsecond line\n");
    assert_eq!(h.doc.undo_depth(), 0);
}

#[test]
fn primary_press_interrupts_running_gesture() {
    let mut h = Harness::tall(20);
    h.press(h.at(1, 1), PointerButton::Primary, Modifiers::empty());
    h.move_to(h.at(2, 4));
    // A fresh press without a release, e.g. after a lost release event.
    h.press(h.at(6, 2), PointerButton::Primary, Modifiers::empty());
    assert_eq!(h.engine.state(), &GestureState::ExtendingCharacter);
    assert_eq!(h.selection(), Selection::caret(Position::new(6, 2)));
}

#[test]
fn cursor_shape_reflects_zone_and_selection() {
    let mut h = Harness::new("the alpha beta\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    let (over, beside) = (h.at(0, 5), h.at(0, 1));
    let shape_at = |h: &mut Harness, p: Point| h.with(|e, s, _| e.cursor_shape(s, p));
    assert_eq!(shape_at(&mut h, Point::new(2, 0)), CursorShape::LineSelect);
    assert_eq!(shape_at(&mut h, over), CursorShape::Arrow);
    assert_eq!(shape_at(&mut h, beside), CursorShape::IBeam);
}

#[test]
fn wheel_scrolls_when_no_auto_scroll_is_active() {
    let mut h = Harness::tall(50);
    assert_eq!(h.with(|e, s, _| e.wheel_rotated(s, 0, 3)), Handled::Yes);
    assert_eq!(h.layout.top_line, 3);
    assert_eq!(h.doc.line_count(), 51);
}

#[test]
fn modified_press_over_selection_still_approaches_a_drag() {
    let mut h = Harness::new("the alpha beta\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    assert_eq!(h.press(h.at(0, 5), PointerButton::Primary, Modifiers::CONTROL), Handled::Yes);
    assert!(matches!(h.engine.state(), GestureState::ApproachingDrag { .. }));
    assert_eq!(h.selection().region(), region((0, 4), (0, 9)));
}

#[test]
fn keep_anchor_in_line_numbers_extends_from_the_anchor_line() {
    let mut h = Harness::tall(20);
    h.select((2, 3), (2, 3), SelectionShape::Linear);
    h.press(Point::new(3, 6), PointerButton::Primary, Modifiers::SHIFT);
    assert_eq!(h.engine.state(), &GestureState::ExtendingLine { initial_line: 2 });
    assert_eq!(h.selection().region(), region((2, 0), (7, 0)));
}

#[test]
fn word_and_keep_anchor_select_words_from_the_anchor() {
    // "line 002 the quick brown fox jumps": "the" is 9..12, "quick" is 13..18.
    let mut h = Harness::tall(20);
    h.select((2, 10), (2, 10), SelectionShape::Linear);
    h.press(h.at(4, 14), PointerButton::Primary, Modifiers::CONTROL | Modifiers::SHIFT);
    assert_eq!(
        h.engine.state(),
        &GestureState::ExtendingWord {
            initial_line: 2,
            initial_word_columns: 9..12
        }
    );
    let selection = h.selection();
    assert_eq!(selection.anchor, Position::new(2, 9));
    assert_eq!(selection.active, Position::new(4, 18));
    h.release(h.at(4, 14), PointerButton::Primary);

    h.press(h.at(6, 14), PointerButton::Primary, Modifiers::CONTROL | Modifiers::ALT);
    let selection = h.selection();
    assert_eq!(selection.shape, SelectionShape::Rectangular);
    assert_eq!(selection.region(), region((6, 13), (6, 18)));
}

#[test]
fn extra_buttons_are_not_handled_and_respect_capture() {
    let mut h = Harness::tall(20);
    assert_eq!(h.press(h.at(1, 1), PointerButton::Extra1, Modifiers::empty()), Handled::No);
    assert!(h.engine.state().is_idle());

    h.press(h.at(1, 1), PointerButton::Primary, Modifiers::empty());
    assert_eq!(h.press(h.at(2, 2), PointerButton::Extra2, Modifiers::empty()), Handled::No);
    assert_eq!(h.release(h.at(2, 2), PointerButton::Extra2), Handled::No);
    assert_eq!(h.engine.state(), &GestureState::ExtendingCharacter);
    assert!(h.engine.has_capture());
}

#[test]
fn rectangular_drop_must_fit_inside_the_accessible_region() {
    let mut h = Harness::new("one\ntwo\nthree\nfour\n");
    h.doc.narrow_to(Some(region((1, 0), (1, 3))));
    let data = DragData::rectangle("AA\nBB\nCC");
    let target = h.at(1, 1);
    let hover = h.with(|e, s, now| e.drag_enter(s, &data, target, Modifiers::empty(), now));
    assert_eq!(hover, EffectMask::empty());
    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    assert_eq!(h.doc.text(), "one\ntwo\nthree\nfour\n");
    assert_eq!(h.doc.undo_depth(), 0);
}

#[test]
fn refused_move_leaves_document_and_selection_untouched() {
    let mut h = Harness::new("the alpha beta\nsecond line\n");
    h.select((0, 4), (0, 9), SelectionShape::Linear);
    let data = h.start_drag(h.at(0, 5));

    // The target accepts drops but the source text may no longer be edited.
    h.doc.narrow_to(Some(region((1, 0), (1, 11))));
    let target = h.at(1, 6);
    let hover = h.with(|e, s, now| e.drag_enter(s, &data, target, Modifiers::empty(), now));
    assert_eq!(hover, EffectMask::MOVE);
    let effect = h.with(|e, s, now| e.drop(s, &data, target, Modifiers::empty(), now));
    assert_eq!(effect, EffectMask::empty());
    h.with(|e, s, now| e.end_drag(s, effect, now));

    assert_eq!(h.doc.text(), "the alpha beta\nsecond line\n");
    assert_eq!(h.doc.undo_depth(), 0);
    assert_eq!(h.selection().region(), region((0, 4), (0, 9)));
    assert!(h.engine.state().is_idle());
}

/// A document that accepts every check but refuses to insert.
struct RefusingDocument {
    inner: RopeDocument,
}

impl TextSource for RefusingDocument {
    fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    fn line_length(&self, line: usize) -> usize {
        self.inner.line_length(line)
    }

    fn line_text(&self, line: usize) -> String {
        self.inner.line_text(line)
    }
}

impl Document for RefusingDocument {
    fn selection(&self) -> Selection {
        self.inner.selection()
    }

    fn select(&mut self, anchor: Position, active: Position, shape: SelectionShape) {
        self.inner.select(anchor, active, shape);
    }

    fn replace_selection(&mut self, _text: &str, _rectangular: bool) -> Result<Region, EditError> {
        Err(EditError::InvalidPosition(self.inner.selection().active))
    }

    fn move_selection_to(&mut self, destination: Position) -> Result<Region, EditError> {
        Err(EditError::InvalidPosition(destination))
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn can_paste(&self) -> bool {
        true
    }

    fn accessible_region(&self) -> Region {
        self.inner.accessible_region()
    }

    fn selected_text(&self) -> String {
        self.inner.selected_text()
    }
}

#[test]
fn refused_insert_restores_the_previous_selection() {
    let mut doc = RefusingDocument {
        inner: RopeDocument::from_text("one\ntwo\n"),
    };
    doc.select(Position::new(0, 0), Position::new(0, 2), SelectionShape::Linear);
    let mut layout = viewport();
    let words = IdentifierWords;
    let mut engine = InputDispatcher::new(EngineConfig::default());
    let now = Instant::now();
    let mut surface = Surface::new(&mut doc, &mut layout, &words);

    let data = DragData::text("XY");
    let target = Point::new(6 + 1, 1);
    let hover = engine.drag_enter(&mut surface, &data, target, Modifiers::empty(), now);
    assert_eq!(hover, EffectMask::MOVE);
    let effect = engine.drop(&mut surface, &data, target, Modifiers::CONTROL, now);
    assert_eq!(effect, EffectMask::empty());
    assert!(engine.state().is_idle());

    assert_eq!(doc.inner.text(), "one\ntwo\n");
    assert_eq!(doc.inner.undo_depth(), 0);
    assert_eq!(doc.selection().region(), region((0, 0), (0, 2)));
}
