#![forbid(unsafe_code)]

//! End-to-end tests for `TreeGrid`: loading, toggling, filtering, windowing,
//! structural edits and the two-step lazy fetch.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use treegrid_core::{
    FilterChange, GridHooks, GridOptions, InvalidState, NodeId, NodePayload, SourceData,
    SourceError, StaticSource, ToggleOutcome, TreeError, TreeGrid,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Captures `(level, message)` for every event.
struct EventCapture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

fn with_captured_events<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: Arc::clone(&events),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    (result, captured)
}

fn library() -> SourceData {
    SourceData::Roots(vec![
        NodePayload::folder(
            "Fiction",
            vec![
                NodePayload::leaf("Around the World in 80 Days")
                    .with_id(11)
                    .with_field("person", "Jules Verne"),
                NodePayload::leaf("Twenty Thousand Leagues").with_id(12),
                NodePayload::folder("Classics", vec![NodePayload::leaf("Moby Dick").with_id(131)])
                    .with_id(13),
            ],
        )
        .with_id(1),
        NodePayload::folder("Remote", vec![]).with_id(2),
        NodePayload::leaf("Atlas of the World").with_id(3),
    ])
}

fn grid_with(window: usize) -> TreeGrid {
    let mut grid = TreeGrid::new(
        GridOptions::default().with_window_size(window),
        GridHooks::new(),
    )
    .unwrap();
    grid.load(library()).unwrap();
    grid
}

fn window_titles(grid: &TreeGrid) -> Vec<String> {
    grid.window_rows()
        .unwrap()
        .iter()
        .map(|row| row.payload.title().to_owned())
        .collect()
}

// ============================================================================
// Flatten and toggle
// ============================================================================

#[test]
fn closed_folder_example() {
    let mut grid = TreeGrid::new(GridOptions::default(), GridHooks::new()).unwrap();
    grid.load(SourceData::Roots(vec![
        NodePayload::folder("F", vec![NodePayload::leaf("L1"), NodePayload::leaf("L2")]),
        NodePayload::leaf("L3"),
    ]))
    .unwrap();
    let shown: Vec<bool> = grid.rows().iter().map(|r| r.show()).collect();
    assert_eq!(shown, vec![true, false, false, true]);

    assert_eq!(grid.toggle_folder(0).unwrap(), ToggleOutcome::Opened);
    let shown: Vec<bool> = grid.rows().iter().map(|r| r.show()).collect();
    assert_eq!(shown, vec![true; 4]);
    assert_eq!(grid.window().visible_count(), 4);
}

#[test]
fn window_example_short_last_window() {
    let mut grid = TreeGrid::new(GridOptions::default().with_window_size(2), GridHooks::new())
        .unwrap();
    grid.load(SourceData::Roots(
        (0..5).map(|i| NodePayload::leaf(format!("row {i}"))).collect(),
    ))
    .unwrap();
    assert_eq!(grid.window().visible_indexes(), &[0, 1, 2, 3, 4]);
    grid.refresh_range(3).unwrap();
    assert_eq!(grid.window().current_window(), &[3, 4]);
    assert!(matches!(
        grid.refresh_range(5),
        Err(TreeError::InvalidState(InvalidState::WindowOutOfBounds { .. }))
    ));
}

#[test]
fn collapse_keeps_nested_branch_state() {
    let mut grid = grid_with(20);
    grid.toggle_folder(0).unwrap();
    // Fiction, 80 Days, Leagues, Classics, Remote, Atlas; Moby Dick stays hidden.
    assert_eq!(grid.window().visible_count(), 6);

    assert_eq!(grid.toggle_folder(0).unwrap(), ToggleOutcome::Closed);
    assert_eq!(grid.window().visible_count(), 3);
    grid.toggle_folder(0).unwrap();
    assert_eq!(grid.window().visible_count(), 6);
    assert!(!grid.rows().get(4).unwrap().show());
}

// ============================================================================
// Filter
// ============================================================================

#[test]
fn filter_matches_hidden_rows_and_restores_window() {
    let mut grid = grid_with(2);
    grid.toggle_folder(0).unwrap();
    grid.refresh_range(3).unwrap();

    // Two matches: the start is kept but clamped to the last match.
    assert_eq!(grid.set_filter("WORLD"), FilterChange::Activated);
    assert_eq!(grid.window().visible_count(), 2);
    assert_eq!(grid.window().window_start(), 1);
    assert_eq!(window_titles(&grid), ["Atlas of the World"]);

    assert_eq!(grid.set_filter("moby"), FilterChange::Updated);
    assert_eq!(grid.window().window_start(), 0);
    assert_eq!(window_titles(&grid), ["Moby Dick"]);

    assert_eq!(grid.set_filter(""), FilterChange::Cleared { restore: 3 });
    assert_eq!(grid.window().window_start(), 3);
    assert_eq!(grid.window().visible_count(), 6);
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn move_into_descendant_is_rejected_unchanged() {
    let mut grid = grid_with(20);
    let before: Vec<NodeId> = grid.rows().iter().map(|r| r.id()).collect();
    assert!(matches!(
        grid.move_node(NodeId(1), NodeId(13)),
        Err(TreeError::Cycle { .. })
    ));
    assert!(matches!(
        grid.move_node(NodeId(1), NodeId(1)),
        Err(TreeError::Cycle { .. })
    ));
    let after: Vec<NodeId> = grid.rows().iter().map(|r| r.id()).collect();
    assert_eq!(before, after);
}

#[test]
fn move_reparents_once_and_reflattens() {
    let mut grid = grid_with(20);
    let generation = grid.generation();
    grid.move_node(NodeId(3), NodeId(13)).unwrap();
    assert_eq!(grid.generation(), generation + 1);

    let tree = grid.tree();
    assert_eq!(tree.get(NodeId(13)).unwrap().children(), &[NodeId(131), NodeId(3)]);
    assert_eq!(tree.get(NodeId(3)).unwrap().depth(), 3);
    let root_children = tree.get(tree.root_id()).unwrap().children();
    assert!(!root_children.contains(&NodeId(3)));
    assert_eq!(grid.rows().len(), 7);
}

#[test]
fn add_and_delete_fire_hooks() {
    let deleted = Rc::new(RefCell::new(Vec::new()));
    let clicked = Rc::new(RefCell::new(Vec::new()));
    let (d, c) = (Rc::clone(&deleted), Rc::clone(&clicked));
    let hooks = GridHooks::new()
        .on_delete(move |parent| d.borrow_mut().push(parent.id()))
        .on_click(move |node| c.borrow_mut().push(node.payload().title().to_owned()));
    let mut grid = TreeGrid::new(GridOptions::default(), hooks).unwrap();
    grid.load(library()).unwrap();

    let id = grid
        .add_node(NodeId(2), NodePayload::leaf("Fresh"))
        .unwrap();
    let pos = grid.position_of(id).unwrap();
    assert!(grid.rows().get(pos).unwrap().show());

    grid.select(pos).unwrap();
    assert_eq!(*clicked.borrow(), ["Fresh"]);

    grid.delete_node(id).unwrap();
    assert_eq!(*deleted.borrow(), [NodeId(2)]);
    assert!(grid.detail_item().is_none());
    assert!(grid.position_of(id).is_none());
}

// ============================================================================
// Lazy fetch
// ============================================================================

#[test]
fn lazy_fetch_splices_children() {
    let mut grid = grid_with(20);
    let ticket = match grid.toggle_folder(5).unwrap() {
        ToggleOutcome::FetchRequired(ticket) => ticket,
        other => panic!("expected fetch, got {other:?}"),
    };
    assert_eq!(ticket.node(), NodeId(2));
    assert_eq!(grid.toggle_folder(5).unwrap(), ToggleOutcome::FetchPending);

    let data = SourceData::Node(NodePayload::folder(
        "Remote",
        vec![
            NodePayload::leaf("r1").with_id(21),
            NodePayload::folder("r2", vec![NodePayload::leaf("r2a")]).with_id(22),
        ],
    ));
    assert_eq!(grid.complete_fetch(ticket, Ok(data)).unwrap(), 3);
    assert!(!grid.is_pending(NodeId(2)));
    assert!(grid.tree().get(NodeId(2)).unwrap().is_open());

    let titles: Vec<&str> = grid.rows().iter().map(|r| r.payload().title()).collect();
    assert_eq!(
        &titles[5..],
        ["Remote", "r1", "r2", "r2a", "Atlas of the World"]
    );
    assert_eq!(grid.rows().get(6).unwrap().depth(), 2);
    assert!(!grid.rows().get(8).unwrap().show());
}

#[test]
fn fetched_duplicate_ids_are_reassigned() {
    let mut grid = grid_with(20);
    let mut source = StaticSource::new(library()).with_fallback(SourceData::Roots(vec![
        NodePayload::leaf("again").with_id(3),
    ]));
    assert_eq!(
        grid.expand_from(5, &mut source).unwrap(),
        ToggleOutcome::Opened
    );
    let added = grid.tree().get(NodeId(2)).unwrap().children()[0];
    assert_ne!(added, NodeId(3));
    assert_eq!(grid.rows().len(), 8);
}

#[test]
fn stale_ticket_is_discarded() {
    let mut grid = grid_with(20);
    let ToggleOutcome::FetchRequired(ticket) = grid.toggle_folder(5).unwrap() else {
        panic!("expected fetch");
    };
    grid.add_node(NodeId(1), NodePayload::leaf("bump")).unwrap();

    let data = SourceData::Roots(vec![NodePayload::leaf("late")]);
    let (result, events) = with_captured_events(|| grid.complete_fetch(ticket, Ok(data)));
    assert!(matches!(
        result,
        Err(TreeError::InvalidState(InvalidState::StaleFetch { node: NodeId(2), .. }))
    ));
    assert!(
        events
            .iter()
            .any(|(level, msg)| *level == Level::WARN && msg.contains("stale fetch"))
    );
    assert!(!grid.is_pending(NodeId(2)));
    assert!(!grid.tree().get(NodeId(2)).unwrap().is_open());
    assert!(grid.tree().get(NodeId(2)).unwrap().children().is_empty());
}

#[test]
fn stale_completion_keeps_newer_ticket_for_same_folder() {
    let mut grid = grid_with(20);
    let ToggleOutcome::FetchRequired(first) = grid.toggle_folder(5).unwrap() else {
        panic!("expected fetch");
    };
    grid.load(library()).unwrap();
    let ToggleOutcome::FetchRequired(second) = grid.toggle_folder(5).unwrap() else {
        panic!("expected a fresh fetch after reload");
    };
    assert_ne!(first.generation(), second.generation());

    let late = SourceData::Roots(vec![NodePayload::leaf("late")]);
    assert!(matches!(
        grid.complete_fetch(first, Ok(late)),
        Err(TreeError::InvalidState(InvalidState::StaleFetch { .. }))
    ));
    assert!(grid.is_pending(NodeId(2)));
    assert_eq!(grid.toggle_folder(5).unwrap(), ToggleOutcome::FetchPending);

    let fresh = SourceData::Roots(vec![NodePayload::leaf("fresh")]);
    assert_eq!(grid.complete_fetch(second, Ok(fresh)).unwrap(), 1);
    assert!(!grid.is_pending(NodeId(2)));
    assert!(grid.tree().get(NodeId(2)).unwrap().is_open());
    assert_eq!(grid.rows().get(6).unwrap().payload().title(), "fresh");
}

#[test]
fn structural_change_lets_folder_refetch() {
    let mut grid = grid_with(20);
    let ToggleOutcome::FetchRequired(first) = grid.toggle_folder(5).unwrap() else {
        panic!("expected fetch");
    };
    grid.add_node(NodeId(1), NodePayload::leaf("bump")).unwrap();
    assert!(!grid.is_pending(NodeId(2)));

    // The old ticket may never come back; the folder must not stay stuck.
    let row = grid.position_of(NodeId(2)).unwrap();
    let ToggleOutcome::FetchRequired(second) = grid.toggle_folder(row).unwrap() else {
        panic!("expected a fresh fetch");
    };
    assert!(grid.complete_fetch(first, Ok(SourceData::Roots(vec![]))).is_err());
    assert!(grid.is_pending(NodeId(2)));

    let data = SourceData::Roots(vec![NodePayload::leaf("r1")]);
    assert_eq!(grid.complete_fetch(second, Ok(data)).unwrap(), 1);
    assert!(grid.tree().get(NodeId(2)).unwrap().is_open());
}

#[test]
fn failed_fetch_leaves_folder_closed() {
    let mut grid = grid_with(20);
    let mut source = StaticSource::new(library());
    let err = grid.expand_from(5, &mut source).unwrap_err();
    assert!(matches!(err, TreeError::Source(SourceError::Unavailable(_))));
    assert!(!grid.is_pending(NodeId(2)));
    assert!(!grid.tree().get(NodeId(2)).unwrap().is_open());

    // A retry issues a fresh ticket.
    assert!(matches!(
        grid.toggle_folder(5).unwrap(),
        ToggleOutcome::FetchRequired(_)
    ));
}

#[test]
fn load_emits_debug_event() {
    let (_, events) = with_captured_events(|| grid_with(5));
    assert!(
        events
            .iter()
            .any(|(level, msg)| *level == Level::DEBUG && msg == "tree loaded")
    );
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn resizing_window_keeps_start() {
    let mut grid = grid_with(2);
    grid.toggle_folder(0).unwrap();
    grid.refresh_range(4).unwrap();
    assert_eq!(window_titles(&grid), ["Remote", "Atlas of the World"]);

    grid.set_window_size(3).unwrap();
    assert_eq!(grid.options().window_size, 3);
    assert_eq!(grid.window().window_start(), 4);
    assert_eq!(window_titles(&grid), ["Remote", "Atlas of the World"]);

    assert!(grid.set_window_size(0).is_err());
    assert_eq!(grid.window().window_size(), 3);
}

#[test]
fn pagination_walks_pages() {
    let mut grid = grid_with(2);
    grid.toggle_folder(0).unwrap();
    grid.refresh_range(1).unwrap();
    grid.set_paginate(true);
    assert_eq!(grid.window().window_start(), 0);
    assert_eq!(grid.window().total_pages(), 3);

    assert!(grid.page_up());
    assert!(grid.page_up());
    assert_eq!(window_titles(&grid), ["Remote", "Atlas of the World"]);
    assert!(!grid.page_up());
    grid.jump_to_page(1).unwrap();
    assert!(!grid.page_down());
    assert!(grid.jump_to_page(4).is_err());
}
