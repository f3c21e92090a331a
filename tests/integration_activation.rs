use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;

use dock_wm::events::PageEvent;
use dock_wm::page::{ActivationHistory, DeferredAction, Page};
use dock_wm::{ActivationPolicy, Environment, Part, PartId, PartKind, PartRef, ViewRegistry};
use proptest::prelude::*;

struct Doc {
    id: PartId,
    kind: PartKind,
    focused: Cell<usize>,
}

impl Part for Doc {
    fn id(&self) -> PartId {
        self.id.clone()
    }

    fn kind(&self) -> PartKind {
        self.kind
    }

    fn request_focus(&self) {
        self.focused.set(self.focused.get() + 1);
    }
}

fn editor(id: &str) -> Rc<Doc> {
    Rc::new(Doc {
        id: PartId::new(id),
        kind: PartKind::Editor,
        focused: Cell::new(0),
    })
}

fn views() -> ViewRegistry {
    let mut views = ViewRegistry::new();
    for primary in ["view.outline", "view.console"] {
        views.register(primary, PartKind::View, |id| {
            Ok(Rc::new(Doc {
                id: id.clone(),
                kind: PartKind::View,
                focused: Cell::new(0),
            }) as PartRef)
        });
    }
    views
}

fn page(policy: ActivationPolicy) -> Page {
    dock_wm::tracing_sub::init_for_tests();
    Page::new(Environment::headless(views()).with_policy(policy))
}

fn id(value: &str) -> PartId {
    PartId::new(value)
}

/// Activation events only, as `(activated, part, forced)`.
fn switches(rx: &Receiver<PageEvent>) -> Vec<(bool, String, bool)> {
    rx.try_iter()
        .filter_map(|event| match event {
            PageEvent::PartActivated { part, forced } => Some((true, part.to_string(), forced)),
            PageEvent::PartDeactivated { part, forced } => Some((false, part.to_string(), forced)),
            _ => None,
        })
        .collect()
}

#[test]
fn type_change_policy_forces_only_across_descriptors() {
    let mut page = page(ActivationPolicy::TypeChange);
    let rx = page.subscribe();
    page.show_view(&id("view.console:1")).unwrap();
    page.show_view(&id("view.console:2")).unwrap();
    page.show_view(&id("view.outline")).unwrap();
    assert_eq!(
        switches(&rx),
        vec![
            (true, "view.console:1".to_string(), true),
            (false, "view.console:1".to_string(), false),
            (true, "view.console:2".to_string(), false),
            (false, "view.console:2".to_string(), true),
            (true, "view.outline".to_string(), true),
        ]
    );
}

#[test]
fn never_policy_never_forces() {
    let mut page = page(ActivationPolicy::Never);
    let rx = page.subscribe();
    page.open_editor(editor("a.rs"));
    page.show_view(&id("view.outline")).unwrap();
    assert!(switches(&rx).iter().all(|(_, _, forced)| !forced));
}

#[test]
fn activation_requests_focus_and_records_history() {
    let mut page = page(ActivationPolicy::default());
    let a = editor("a.rs");
    let b = editor("b.rs");
    page.open_editor(a.clone());
    page.open_editor(b.clone());
    assert_eq!(b.focused.get(), 1);
    assert!(page.activate(&id("a.rs")));
    assert!(!page.activate(&id("a.rs")));
    assert_eq!(a.focused.get(), 2);
    assert_eq!(page.history().current(), Some(&id("a.rs")));
    assert_eq!(page.history().previous(), Some(&id("b.rs")));
}

#[test]
fn unowned_parts_are_ignored_silently() {
    let mut page = page(ActivationPolicy::default());
    let rx = page.subscribe();
    let ghost = id("ghost.rs");
    assert!(!page.activate(&ghost));
    assert!(!page.bring_to_top(&ghost));
    assert!(!page.close_editor(&ghost));
    assert!(!page.hide_view(&ghost));
    assert!(!page.zoom_in(&ghost));
    assert!(!page.toggle_fast_view(&ghost));
    assert!(page.begin_operation(&ghost).is_none());
    assert!(rx.try_recv().is_err());
}

#[test]
fn bring_to_top_is_ignored_while_zoomed_elsewhere() {
    let mut page = Page::new(Environment::headless(views()).without_editor_area());
    let rx = page.subscribe();
    page.show_view(&id("view.outline")).unwrap();
    page.show_view(&id("view.console:1")).unwrap();
    page.show_view(&id("view.console:2")).unwrap();
    assert!(page.stack(&id("view.console:2"), &id("view.console:1")));
    assert_eq!(
        page.presentation().describe(),
        "main: h(view.outline 0.50, tabs[view.console:1, *view.console:2] 0.50)\n"
    );

    assert!(page.zoom_in(&id("view.outline")));
    assert!(!page.bring_to_top(&id("view.console:1")));
    assert!(page.zoom_out());
    rx.try_iter().for_each(drop);

    assert!(page.bring_to_top(&id("view.console:1")));
    assert_eq!(page.active_part(), Some(&id("view.console:2")));
    assert!(
        rx.try_iter()
            .any(|event| event == PageEvent::PartBroughtToTop(id("view.console:1")))
    );
}

#[test]
fn hiding_a_shared_view_still_takes_it_off_the_page() {
    let mut page = page(ActivationPolicy::default());
    let outline = id("view.outline");
    let console = id("view.console:1");
    page.show_view(&outline).unwrap();
    page.show_view(&console).unwrap();
    page.show_view(&console).unwrap();
    assert_eq!(page.active_part(), Some(&console));

    assert!(page.hide_view(&console));
    assert_eq!(page.active_part(), Some(&outline));
    assert!(!page.history().contains(&console));
    assert!(page.presentation().find_pane(&console).is_none());
    assert!(page.presentation().find_placeholder(&console).is_some());
    assert_eq!(page.factory().reference_count(&console), 1);
    assert!(!page.hide_view(&console));
}

#[test]
fn cycling_two_editors_back_and_forth_restores_the_active_one() {
    let mut page = page(ActivationPolicy::default());
    page.open_editor(editor("a.rs"));
    page.open_editor(editor("b.rs"));
    page.show_view(&id("view.outline")).unwrap();
    page.activate(&id("b.rs"));

    assert_eq!(page.cycle_editors(true), Some(id("a.rs")));
    assert_eq!(page.active_part(), Some(&id("a.rs")));
    assert_eq!(page.cycle_editors(false), Some(id("b.rs")));
    assert_eq!(page.active_part(), Some(&id("b.rs")));
}

#[test]
fn stale_completion_is_dropped() {
    let mut page = page(ActivationPolicy::default());
    page.open_editor(editor("a.rs"));
    page.open_editor(editor("b.rs"));
    let token = page.begin_operation(&id("a.rs")).unwrap();

    page.close_editor(&id("a.rs"));
    page.open_editor(editor("a.rs"));
    page.activate(&id("b.rs"));
    assert!(!page.complete_operation(&token, DeferredAction::Activate));
    assert_eq!(page.active_part(), Some(&id("b.rs")));

    let fresh = page.begin_operation(&id("a.rs")).unwrap();
    assert!(page.complete_operation(&fresh, DeferredAction::Activate));
    assert_eq!(page.active_part(), Some(&id("a.rs")));
}

#[test]
fn cancelled_completion_leaves_page_untouched() {
    let mut page = page(ActivationPolicy::default());
    page.open_editor(editor("a.rs"));
    let token = page.begin_operation(&id("a.rs")).unwrap();
    let flag = token.cancel_flag();
    std::thread::spawn(move || flag.store(true, Ordering::SeqCst))
        .join()
        .unwrap();

    assert!(!page.complete_operation(&token, DeferredAction::CloseEditor));
    assert!(page.is_owned(&id("a.rs")));

    let token = page.begin_operation(&id("a.rs")).unwrap();
    assert!(page.complete_operation(&token, DeferredAction::CloseEditor));
    assert!(!page.is_owned(&id("a.rs")));
    assert_eq!(page.active_part(), None);
}

#[derive(Debug, Clone)]
enum Step {
    Activated(usize),
    Opened(usize),
    Removed(usize),
    Minimized(usize, bool),
}

fn part(index: usize) -> (PartId, PartKind) {
    let kind = if index % 2 == 0 {
        PartKind::Editor
    } else {
        PartKind::View
    };
    (PartId::new(format!("p{index}")), kind)
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..5usize).prop_map(Step::Activated),
        1 => (0..5usize).prop_map(Step::Opened),
        1 => (0..5usize).prop_map(Step::Removed),
        2 => (0..5usize, any::<bool>()).prop_map(|(i, on)| Step::Minimized(i, on)),
    ]
}

proptest! {
    #[test]
    fn recency_queries_skip_minimized_parts(steps in prop::collection::vec(step(), 1..40)) {
        let mut history = ActivationHistory::new();
        for step in &steps {
            match step {
                Step::Activated(i) => {
                    let (id, kind) = part(*i);
                    history.record_activated(id, kind);
                }
                Step::Opened(i) => {
                    let (id, kind) = part(*i);
                    history.record_opened(id, kind);
                }
                Step::Removed(i) => {
                    history.remove(&part(*i).0);
                }
                Step::Minimized(i, on) => history.set_minimized(&part(*i).0, *on),
            }
            for found in [history.current(), history.previous()].into_iter().flatten() {
                prop_assert!(!history.is_minimized(found));
                prop_assert!(history.contains(found));
            }
        }
    }

    #[test]
    fn cycle_backward_undoes_cycle_forward(
        order in Just(vec!["e1", "e2", "v1", "v2"]).prop_shuffle(),
    ) {
        let mut history = ActivationHistory::new();
        for name in &order {
            let kind = if name.starts_with('e') { PartKind::Editor } else { PartKind::View };
            history.record_activated(PartId::new(*name), kind);
        }
        let last_editor = order
            .iter()
            .rev()
            .find(|name| name.starts_with('e'))
            .map(|name| PartId::new(*name));

        prop_assert!(history.cycle(true).is_some());
        prop_assert_eq!(history.cycle(false), last_editor);
    }
}
