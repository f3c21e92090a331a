use std::cell::RefCell;
use std::rc::Rc;

use dock_wm::host::HeadlessHost;
use dock_wm::layout::{
    DropAction, DropPosition, DropTarget, LayoutPresentation, NodeId, Pane, Side,
};
use dock_wm::part::PartId;
use dock_wm::window::{FloatRect, WindowRef};
use ratatui::layout::Rect;

fn id(value: &str) -> PartId {
    PartId::new(value)
}

/// Main window `h(V1, V2)` at 80x20, with V3 floating in its own window.
fn arranged() -> LayoutPresentation {
    dock_wm::tracing_sub::init_for_tests();
    let mut p = LayoutPresentation::new(Rc::new(RefCell::new(HeadlessHost::new(true))));
    for name in ["V1", "V2", "V3"] {
        p.add_pane(Pane::view(name)).unwrap();
    }
    p.detach(&id("V3"), FloatRect::new(100, 0, 60, 60)).unwrap();
    p.layout(Rect::new(0, 0, 80, 20));
    let windows: Vec<_> = p.detached_windows().map(|window| window.id()).collect();
    for window in windows {
        p.regions(WindowRef::Detached(window), None);
    }
    p
}

fn pane(p: &LayoutPresentation, name: &str) -> NodeId {
    p.find_pane(&id(name)).unwrap()
}

fn floating_folder(p: &LayoutPresentation) -> NodeId {
    p.detached_windows().next().unwrap().folder()
}

#[test]
fn drop_into_another_window_never_docks() {
    let p = arranged();
    let decision = p.evaluate_drop(
        pane(&p, "V1"),
        DropTarget::Node(floating_folder(&p)),
        (30, 30),
    );
    assert_eq!(decision.position, DropPosition::Offscreen);
    assert!(matches!(decision.action, DropAction::Detach { .. }));

    let decision = p.evaluate_drop(pane(&p, "V3"), DropTarget::Node(pane(&p, "V1")), (5, 10));
    assert_eq!(decision.position, DropPosition::Offscreen);
    assert!(matches!(decision.action, DropAction::MoveWindow { .. }));
}

#[test]
fn drop_outside_detaches_at_pointer_with_source_size() {
    let p = arranged();
    let decision = p.evaluate_drop(pane(&p, "V1"), DropTarget::Outside, (200, 40));
    assert_eq!(
        decision.action,
        DropAction::Detach {
            at: FloatRect::new(200, 40, 40, 20)
        }
    );
}

#[test]
fn without_floating_support_offscreen_drops_are_invalid() {
    let mut p = LayoutPresentation::new(Rc::new(RefCell::new(HeadlessHost::new(false))));
    p.add_pane(Pane::view("V1")).unwrap();
    p.add_pane(Pane::view("V2")).unwrap();
    p.layout(Rect::new(0, 0, 80, 20));
    let decision = p.evaluate_drop(pane(&p, "V1"), DropTarget::Outside, (200, 40));
    assert_eq!(decision.position, DropPosition::Invalid);
    assert!(!decision.is_accepted());
}

#[test]
fn edge_zones_split_and_center_stacks() {
    let mut p = arranged();
    let v1 = pane(&p, "V1");
    let v2 = pane(&p, "V2");

    let right = p.evaluate_drop(v1, DropTarget::Node(v2), (78, 10));
    assert_eq!(right.position, DropPosition::Right);
    assert_eq!(
        right.action,
        DropAction::Split {
            target: v2,
            side: Side::Right
        }
    );

    let center = p.evaluate_drop(v1, DropTarget::Node(v2), (60, 10));
    assert_eq!(center.action, DropAction::Stack { target: v2 });
    assert!(p.apply_drop(&center).unwrap());
    assert!(p.describe().starts_with("main: h(tabs[V2, *V1] 1.00)\n"));
}

#[test]
fn drop_onto_itself_is_rejected() {
    let p = arranged();
    let v1 = pane(&p, "V1");
    let decision = p.evaluate_drop(v1, DropTarget::Node(v1), (20, 10));
    assert_eq!(decision.action, DropAction::Reject);
}

#[test]
fn floating_targets_always_stack() {
    let mut p = arranged();
    p.add_pane(Pane::view("V4")).unwrap();
    p.stack(&id("V4"), &id("V3")).unwrap();
    let window = p.detached_windows().next().unwrap().id();
    p.regions(WindowRef::Detached(window), None);

    let v3 = pane(&p, "V3");
    let decision = p.evaluate_drop(pane(&p, "V4"), DropTarget::Node(v3), (1, 1));
    assert_eq!(decision.position, DropPosition::Center);
    assert_eq!(decision.action, DropAction::Stack { target: v3 });
}

#[test]
fn shortcut_bar_takes_views_as_fast_views() {
    let mut p = arranged();
    let decision = p.evaluate_drop(pane(&p, "V2"), DropTarget::ShortcutBar, (0, 0));
    assert_eq!(decision.action, DropAction::Minimize);
    assert!(p.apply_drop(&decision).unwrap());
    assert!(p.is_fast(&id("V2")));
    assert!(p.find_placeholder(&id("V2")).is_some());

    let mut e = LayoutPresentation::new(Rc::new(RefCell::new(HeadlessHost::new(true))));
    e.add_pane(Pane::editor("a.rs")).unwrap();
    e.layout(Rect::new(0, 0, 80, 20));
    let decision = e.evaluate_drop(pane(&e, "a.rs"), DropTarget::ShortcutBar, (0, 0));
    assert_eq!(decision.action, DropAction::Reject);
}

/// Editor area beside `v(tabs[V1, V3], V2)`, laid out at 120x40.
fn beside_editors() -> (LayoutPresentation, NodeId, NodeId) {
    let mut p = LayoutPresentation::with_editor_area(Rc::new(RefCell::new(HeadlessHost::new(true))));
    p.add_pane(Pane::editor("a.rs")).unwrap();
    for name in ["V1", "V2", "V3"] {
        p.add_pane(Pane::view(name)).unwrap();
    }
    p.stack(&id("V3"), &id("V1")).unwrap();
    p.move_pane(&id("V2"), Side::Bottom, &id("V1")).unwrap();
    p.layout(Rect::new(0, 0, 120, 40));
    let folder = p.node(pane(&p, "V1")).and_then(|node| node.parent()).unwrap();
    let area = p.editor_area().unwrap();
    (p, folder, area)
}

fn is_under(p: &LayoutPresentation, node: NodeId, ancestor: NodeId) -> bool {
    let mut current = p.node(node).and_then(|n| n.parent());
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = p.node(parent).and_then(|n| n.parent());
    }
    false
}

#[test]
fn views_dropped_on_editor_area_edges_dock_beside_it() {
    for side in [Side::Left, Side::Right, Side::Top, Side::Bottom] {
        let (mut p, folder, area) = beside_editors();
        assert!(!is_under(&p, folder, area));
        let b = p.node(area).unwrap().bounds();
        let (x, y) = (i32::from(b.x), i32::from(b.y));
        let (w, h) = (i32::from(b.width), i32::from(b.height));
        let pointer = match side {
            Side::Left => (x + 1, y + h / 2),
            Side::Right => (x + w - 2, y + h / 2),
            Side::Top => (x + w / 2, y + 1),
            Side::Bottom => (x + w / 2, y + h - 2),
        };

        let decision = p.evaluate_drop(folder, DropTarget::Node(area), pointer);
        assert_eq!(decision.action, DropAction::Split { target: area, side });
        assert!(p.apply_drop(&decision).unwrap());

        assert!(!is_under(&p, folder, area), "{side:?}: {}", p.describe());
        assert_eq!(
            p.node(folder).and_then(|n| n.parent()),
            p.node(area).and_then(|n| n.parent())
        );
        assert!(p.describe().contains("editors:h(tabs[*a.rs] 1.00)"));

        let editor = p.add_pane(Pane::editor("b.rs")).unwrap();
        assert!(is_under(&p, editor, area));
        assert!(p.describe().contains("editors:h(tabs[a.rs, *b.rs] 1.00)"));
        assert!(p.describe().contains("tabs[V1, *V3]"));
    }
}
