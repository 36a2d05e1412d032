//! Event sequences and tracing output of the public `Grid`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cardgrid::{
    ArrangeOptions, Arrangement, CancelReason, ChangeKind, ChangeSource, Error, Grid, GridEvent,
    GridItem, GridOptions, GridRect, Guide, GuideAxis, InteractionKind, ItemId, ItemPatch,
    PixelPoint, ResizeHandle,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::Instant;

const CONTAINER_WIDTH: f64 = 1330.0;

fn grid() -> Grid {
    let mut grid = Grid::new(GridOptions::default()).expect("grid");
    grid.set_container_width(CONTAINER_WIDTH).expect("width");
    grid
}

fn recording(grid: &mut Grid) -> Arc<Mutex<Vec<GridEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    grid.on(move |event| sink.lock().expect("log").push(event.clone()));
    log
}

fn names(log: &Arc<Mutex<Vec<GridEvent>>>) -> Vec<&'static str> {
    log.lock().expect("log").iter().map(GridEvent::name).collect()
}

/// Pointer a few pixels inside the top-left corner of a cell.
fn pointer_at(grid: &Grid, x: u16, y: u16) -> PixelPoint {
    let rect = grid.to_pixels(GridRect::new(x, y, 1, 1));
    PixelPoint::new(rect.left + 4.0, rect.top + 4.0)
}

fn side_by_side() -> Grid {
    let mut grid = grid();
    grid.add_item(GridItem::new("a", 4, 2).at(0, 0)).expect("a");
    grid.add_item(GridItem::new("b", 4, 2).at(4, 0)).expect("b");
    grid
}

#[test]
fn add_emits_added_then_change() {
    let mut grid = grid();
    let log = recording(&mut grid);
    grid.add_item(GridItem::new("a", 4, 2)).expect("add");

    let events = log.lock().expect("log");
    assert_eq!(
        events[0],
        GridEvent::Added {
            items: vec!["a".into()]
        }
    );
    assert_eq!(
        events[1],
        GridEvent::Change {
            kind: ChangeKind::Add,
            items: vec!["a".into()],
            source: ChangeSource::Api,
        }
    );
}

#[test]
fn drag_lifecycle_reports_collateral_moves() {
    let mut grid = side_by_side();
    let log = recording(&mut grid);

    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
        .expect("move");
    assert_eq!(grid.item("a").map(GridItem::rect), Some(GridRect::new(0, 0, 4, 2)));
    assert_eq!(grid.pixel_rect("a").map(|px| px.left), Some(450.0));
    grid.release().expect("release");

    assert_eq!(names(&log), ["drag_start", "drag", "drag_end", "change"]);
    let events = log.lock().expect("log");
    match &events[2] {
        GridEvent::DragEnd {
            item,
            rect,
            displaced,
            rejected,
        } => {
            assert_eq!(item.as_str(), "a");
            assert_eq!(*rect, GridRect::new(4, 0, 4, 2));
            assert_eq!(displaced.as_slice(), [ItemId::new("b")]);
            assert!(rejected.is_none());
        }
        other => panic!("unexpected event {other:?}"),
    }
    match &events[3] {
        GridEvent::Change { kind, items, source } => {
            assert_eq!(*kind, ChangeKind::Move);
            assert_eq!(*source, ChangeSource::User);
            assert!(items.contains(&"a".into()) && items.contains(&"b".into()));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(grid.item("b").map(|item| item.y), Some(2));
}

#[test]
fn drop_on_static_card_is_rejected() {
    let mut grid = grid();
    grid.add_item(GridItem::new("a", 4, 2).at(0, 0)).expect("a");
    grid.add_item(GridItem::new("s", 4, 2).at(4, 0).with_static(true))
        .expect("s");
    let log = recording(&mut grid);

    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
        .expect("move");
    grid.release().expect("release");

    let events = log.lock().expect("log");
    assert!(events.iter().any(|event| matches!(
        event,
        GridEvent::DragEnd {
            rejected: Some(_),
            ..
        }
    )));
    assert_eq!(grid.item("a").map(GridItem::rect), Some(GridRect::new(0, 0, 4, 2)));
    assert_eq!(grid.item("s").map(GridItem::rect), Some(GridRect::new(4, 0, 4, 2)));
}

#[test]
fn cancel_restores_and_emits_cancel() {
    let mut grid = side_by_side();
    let before = grid.save();
    let log = recording(&mut grid);

    grid.begin_resize("a", ResizeHandle::Se, pointer_at(&grid, 3, 1))
        .expect("begin");
    grid.pointer_move(pointer_at(&grid, 6, 1), Instant::now())
        .expect("move");
    grid.cancel_interaction().expect("cancel");

    assert_eq!(names(&log), ["resize_start", "resize", "resize_cancel"]);
    assert_eq!(grid.save(), before);
    assert!(!grid.is_interacting());
}

#[test]
fn vetoed_start_reports_cancel() {
    let mut grid = side_by_side();
    grid.set_start_guard(Some(Box::new(|item: &GridItem, _kind: InteractionKind| {
        item.id.as_str() != "a"
    })));
    let log = recording(&mut grid);

    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    assert!(!grid.is_interacting());
    assert_eq!(
        log.lock().expect("log").as_slice(),
        [GridEvent::DragCancel {
            item: "a".into(),
            reason: CancelReason::Vetoed
        }]
    );
}

#[test]
fn removing_dragged_item_abandons_gesture() {
    let mut grid = side_by_side();
    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    let log = recording(&mut grid);

    assert!(grid.remove_item("a").is_some());
    assert!(!grid.is_interacting());
    assert_eq!(names(&log)[..2], ["drag_cancel", "removed"]);
    assert!(matches!(grid.release(), Err(Error::Interaction(_))));
}

#[test]
fn host_mutation_cancels_live_gesture() {
    let mut grid = side_by_side();
    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
        .expect("move");
    let log = recording(&mut grid);

    grid.add_item(GridItem::new("c", 4, 2).at(4, 0)).expect("add c");
    assert!(!grid.is_interacting());
    assert_eq!(names(&log), ["drag_cancel", "added", "change"]);
    assert!(matches!(grid.cancel_interaction(), Err(Error::Interaction(_))));
    assert_eq!(grid.item("a").map(GridItem::rect), Some(GridRect::new(0, 0, 4, 2)));
    assert!(grid.store().check_invariants().is_ok());
}

#[test]
fn batch_emits_single_change() {
    let mut grid = side_by_side();
    let log = recording(&mut grid);
    grid.batch(|batch| {
        batch.move_item("a", 0, 4);
        batch.update_item("b", &ItemPatch::default().size(2, 1));
    });

    let events = log.lock().expect("log");
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        GridEvent::Change {
            kind: ChangeKind::Batch,
            ..
        }
    ));
}

#[test]
fn batch_reports_adds_and_removals() {
    let mut grid = side_by_side();
    grid.begin_drag("b", pointer_at(&grid, 4, 0)).expect("begin");
    let log = recording(&mut grid);

    let added = grid.batch(|batch| {
        let id = batch.add_item(GridItem::new("c", 4, 2)).expect("add c");
        assert!(batch.remove_item("a").is_some());
        id
    });
    assert_eq!(added.as_str(), "c");
    assert!(!grid.is_interacting());
    assert_eq!(names(&log), ["drag_cancel", "added", "removed", "change"]);

    let events = log.lock().expect("log");
    assert_eq!(events[1], GridEvent::Added {
        items: vec!["c".into()]
    });
    assert_eq!(events[2], GridEvent::Removed {
        items: vec!["a".into()]
    });
}

#[test]
fn arrange_emits_arrange_then_change() {
    let mut grid = side_by_side();
    let log = recording(&mut grid);
    let moved = grid
        .arrange(Arrangement::Columns, &ArrangeOptions::default())
        .expect("arrange");

    // Four tracks of three columns each.
    assert_eq!(grid.item("a").map(GridItem::rect), Some(GridRect::new(0, 0, 3, 2)));
    assert_eq!(grid.item("b").map(GridItem::rect), Some(GridRect::new(3, 0, 3, 2)));
    assert_eq!(moved.len(), 2);
    assert_eq!(names(&log), ["arrange", "change"]);
}

#[test]
fn alignment_guides_follow_the_candidate() {
    let mut grid = side_by_side();
    assert!(grid.alignment_guides(1).is_empty());

    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
        .expect("move");
    assert_eq!(grid.alignment_guides(1), vec![
        Guide {
            axis: GuideAxis::Vertical,
            position: 4
        },
        Guide {
            axis: GuideAxis::Vertical,
            position: 8
        },
    ]);
}

#[test]
fn save_and_load_round_trip_through_json() {
    let grid = side_by_side();
    let json = grid.save_json().expect("save");

    let mut restored = Grid::new(GridOptions::default()).expect("grid");
    let log = recording(&mut restored);
    restored.load_json(&json).expect("load");

    assert_eq!(restored.items(), grid.items());
    let events = log.lock().expect("log");
    assert!(matches!(
        &events[0],
        GridEvent::Change {
            kind: ChangeKind::Batch,
            source: ChangeSource::Load,
            ..
        }
    ));
}

#[test]
fn failed_load_leaves_layout_untouched() {
    let mut grid = side_by_side();
    let before = grid.save();
    let bad = r#"{"schemaVersion":1,"items":[{"id":"x","x":0,"y":0,"w":0,"h":1}]}"#;
    assert!(matches!(grid.load_json(bad), Err(Error::Snapshot(_))));
    assert!(grid.load_json("not json").is_err());
    assert_eq!(grid.save(), before);
}

#[test]
fn surface_height_covers_rows_and_preview() {
    let mut grid = side_by_side();
    let resting = grid.surface_height();
    // Two 80px rows, one gap, two margins.
    assert!((resting - 190.0).abs() < 1e-9);

    grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
    grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
        .expect("move");
    assert!(grid.surface_height() > resting);
    grid.cancel_interaction().expect("cancel");
    assert!((grid.surface_height() - resting).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Tracing capture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl SpanCapture {
    fn new() -> (Self, CaptureHandle) {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let handle = CaptureHandle {
            spans: Arc::clone(&spans),
            events: Arc::clone(&events),
        };
        (Self { spans, events }, handle)
    }
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().expect("spans").clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("events").clone()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().expect("spans").push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().expect("events").push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = SpanCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

#[test]
fn add_and_commit_open_spans() {
    let handle = with_captured_tracing(|| {
        let mut grid = side_by_side();
        grid.begin_drag("a", pointer_at(&grid, 0, 0)).expect("begin");
        grid.pointer_move(pointer_at(&grid, 4, 0), Instant::now())
            .expect("move");
        grid.release().expect("release");
    });

    let spans = handle.spans();
    let adds: Vec<_> = spans.iter().filter(|s| s.name == "layout.add").collect();
    assert_eq!(adds.len(), 2);
    assert_eq!(adds[0].fields.get("id").map(String::as_str), Some("a"));

    let commit = spans
        .iter()
        .find(|s| s.name == "interaction.commit")
        .expect("commit span");
    assert_eq!(commit.fields.get("x").map(String::as_str), Some("4"));
}

#[test]
fn load_logs_info_event() {
    let json = side_by_side().save_json().expect("save");
    let handle = with_captured_tracing(|| {
        let mut grid = Grid::new(GridOptions::default()).expect("grid");
        grid.load_json(&json).expect("load");
    });

    let loaded = handle
        .events()
        .into_iter()
        .find(|e| {
            e.target == "cardgrid"
                && e.fields
                    .get("message")
                    .is_some_and(|m| m.contains("layout loaded"))
        })
        .expect("load event");
    assert_eq!(loaded.level, tracing::Level::INFO);
    assert_eq!(loaded.fields.get("items").map(String::as_str), Some("2"));
}
