use std::rc::Rc;

use dock_wm::persist::Memento;
use dock_wm::window::FloatRect;
use dock_wm::{Environment, Page, Part, PartId, PartKind, PartRef, ViewRegistry};
use indoc::indoc;

struct Tool(PartId);

impl Part for Tool {
    fn id(&self) -> PartId {
        self.0.clone()
    }

    fn kind(&self) -> PartKind {
        PartKind::View
    }

    fn request_focus(&self) {}
}

fn views() -> ViewRegistry {
    let mut views = ViewRegistry::new();
    for primary in ["view.outline", "view.console", "view.tasks"] {
        views.register(primary, PartKind::View, |id| {
            Ok(Rc::new(Tool(id.clone())) as PartRef)
        });
    }
    views
}

fn page() -> Page {
    dock_wm::tracing_sub::init_for_tests();
    Page::new(Environment::headless(views()).without_editor_area())
}

fn id(value: &str) -> PartId {
    PartId::new(value)
}

fn show(page: &mut Page, names: &[&str]) {
    for name in names {
        page.show_view(&id(name)).unwrap();
    }
}

/// Save through JSON text so the document survives a real round trip.
fn through_json(memento: &Memento) -> Memento {
    let text = serde_json::to_string_pretty(memento).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn saved_page_comes_back_on_a_fresh_page() {
    let mut original = page();
    show(&mut original, &["view.outline", "view.console:1", "view.console:2", "view.tasks"]);
    assert!(original.stack(&id("view.console:2"), &id("view.console:1")));
    assert!(
        original
            .detach(&id("view.tasks"), FloatRect::new(90, 10, 60, 50))
            .is_some()
    );
    assert!(original.activate(&id("view.console:1")));
    let expected = original.presentation().describe();
    assert!(expected.contains("tabs[*view.console:1, view.console:2]"));
    assert!(expected.ends_with("detached 0 @ 90,10 60x50: tabs[*view.tasks]\n"));
    let saved = through_json(&original.save_state());

    let mut restored = page();
    show(&mut restored, &["view.tasks", "view.console:2", "view.console:1", "view.outline"]);
    assert_ne!(restored.presentation().describe(), expected);
    assert!(restored.restore_state(&saved));
    assert_eq!(restored.presentation().describe(), expected);
    assert_eq!(restored.active_part(), Some(&id("view.console:1")));
    assert_eq!(restored.history().current(), Some(&id("view.console:1")));
}

#[test]
fn panes_of_parts_not_open_stay_as_placeholders() {
    let mut original = page();
    show(&mut original, &["view.outline", "view.console:1"]);
    let saved = through_json(&original.save_state());

    let mut restored = page();
    show(&mut restored, &["view.outline"]);
    assert!(restored.restore_state(&saved));
    assert_eq!(
        restored.presentation().describe(),
        "main: h(view.outline 0.50, ?view.console:1 0.50)\n"
    );
    assert_eq!(restored.active_part(), Some(&id("view.outline")));
    assert!(!restored.history().contains(&id("view.console:1")));

    restored.show_view(&id("view.console:1")).unwrap();
    assert_eq!(
        restored.presentation().describe(),
        "main: h(view.outline 0.50, view.console:1 0.50)\n"
    );
}

#[test]
fn malformed_document_falls_back_to_the_default_layout() {
    let mut page = page();
    show(&mut page, &["view.outline"]);
    assert!(!page.restore_state(&Memento::new("page")));
    assert_eq!(page.presentation().describe(), "main: h(view.outline 1.00)\n");
    assert_eq!(page.active_part(), Some(&id("view.outline")));
}

#[test]
fn reset_keeps_part_instances_and_places_strays_by_default() {
    let mut template_page = page();
    show(&mut template_page, &["view.console:1", "view.outline"]);
    let template = template_page
        .save_state()
        .child("layout")
        .cloned()
        .unwrap();

    let mut page = page();
    let outline = page.show_view(&id("view.outline")).unwrap();
    show(&mut page, &["view.console:1", "view.tasks"]);
    assert!(page.reset_layout(&template));
    assert_eq!(
        page.presentation().describe(),
        "main: h(view.console:1 0.33, view.outline 0.33, view.tasks 0.33)\n"
    );
    let kept = page.factory().peek(&id("view.outline")).unwrap();
    assert!(Rc::ptr_eq(&outline, &kept));
    assert_eq!(page.factory().reference_count(&id("view.outline")), 1);
}

#[test]
fn fast_views_of_parts_not_open_are_dropped() {
    let mut original = page();
    show(&mut original, &["view.outline", "view.console:1"]);
    assert!(original.toggle_fast_view(&id("view.console:1")));
    assert_eq!(original.active_part(), Some(&id("view.outline")));
    assert_eq!(
        original.presentation().describe(),
        indoc! {"
            main: h(view.outline 0.50, ?view.console:1 0.50)
            fast: view.console:1
        "}
    );
    let saved = through_json(&original.save_state());

    let mut kept = page();
    show(&mut kept, &["view.console:1", "view.outline"]);
    assert!(kept.restore_state(&saved));
    assert!(kept.presentation().is_fast(&id("view.console:1")));

    let mut pruned = page();
    show(&mut pruned, &["view.outline"]);
    assert!(pruned.restore_state(&saved));
    assert_eq!(
        pruned.presentation().describe(),
        "main: h(view.outline 0.50, ?view.console:1 0.50)\n"
    );
}
