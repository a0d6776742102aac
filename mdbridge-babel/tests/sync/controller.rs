use mdbridge_babel::extensions::ExtensionRegistry;
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::model::DocumentNode;
use mdbridge_babel::sync::{DocumentEngine, ManualClock, MemoryEngine, SyncController, SyncOptions};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn controller_with(
    options: SyncOptions,
) -> (SyncController<MemoryEngine, ManualClock>, MemoryEngine, ManualClock) {
    let engine = MemoryEngine::default();
    let clock = ManualClock::new();
    let controller = SyncController::with_clock(
        engine.clone(),
        Arc::new(ExtensionRegistry::with_defaults()),
        options,
        clock.clone(),
    );
    (controller, engine, clock)
}

fn type_paragraph(engine: &MemoryEngine, text: &str) {
    let text = text.to_string();
    engine.apply(move |tree| {
        tree.content
            .push(DocumentNode::paragraph(vec![DocumentNode::text(text)]))
    });
}

#[test]
fn test_set_markdown_bypasses_the_debounce() {
    let (mut sync, engine, _clock) = controller_with(SyncOptions::default());
    sync.set_markdown("# Title");
    assert_eq!(sync.get_markdown(), "# Title");
    assert!(!sync.is_pending());
    assert_eq!(engine.tree().find("heading").map(|h| h.text_content()), Some("Title".to_string()));
}

#[test]
fn test_destroy_cancels_an_armed_export() {
    let (mut sync, engine, clock) = controller_with(SyncOptions::default());
    type_paragraph(&engine, "draft");
    sync.handle_update();
    assert!(sync.is_pending());
    sync.destroy();
    clock.advance_ms(10_000);
    assert!(!sync.poll());
    assert_eq!(sync.export_count(), 0);
    assert_eq!(sync.get_markdown(), "");
}

#[test]
fn test_burst_of_edits_exports_once() {
    let (sync, engine, clock) = controller_with(SyncOptions::default());
    let exports = Rc::new(RefCell::new(Vec::new()));
    let sink = exports.clone();
    let shared = {
        let mut sync = sync;
        sync.subscribe(move |text| sink.borrow_mut().push(text.to_string()));
        sync.attach()
    };

    for i in 0..10 {
        type_paragraph(&engine, &format!("p{i}"));
        clock.advance_ms(50);
        assert!(!shared.poll());
    }
    clock.advance_ms(300);
    assert!(shared.poll());
    assert!(!shared.poll());
    assert_eq!(exports.borrow().len(), 1);
    assert!(exports.borrow()[0].starts_with("p0\n\np1\n\n"));
}

#[test]
fn test_import_does_not_echo_as_an_export() {
    let (sync, engine, clock) = controller_with(SyncOptions::default());
    let shared = sync.attach();
    shared.set_markdown("Imported *text*");
    assert!(!shared.is_pending());
    clock.advance_ms(1_000);
    assert!(!shared.poll());
    assert_eq!(shared.get_markdown(), "Imported *text*");

    type_paragraph(&engine, "edited");
    clock.advance_ms(300);
    assert!(shared.poll());
    assert_eq!(shared.get_markdown(), "Imported _text_\n\nedited\n");
}

#[test]
fn test_flavor_and_diagram_options() {
    let options = SyncOptions {
        debounce_ms: 0,
        transform_diagrams_on_import: false,
        flavor: Flavor::Docusaurus,
    };
    let (mut sync, engine, _clock) = controller_with(options);
    sync.set_markdown("```mermaid\ngraph TD\n```\n\n> [!NOTE]\n> hi");
    assert!(engine.tree().find("diagram").is_none());
    assert_eq!(
        sync.flush(),
        "```mermaid\ngraph TD\n```\n\n:::info\nhi\n:::\n"
    );
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: SyncOptions =
        serde_json::from_str(r#"{ "flavor": "obsidian" }"#).expect("valid options");
    assert_eq!(options.flavor, Flavor::Obsidian);
    assert_eq!(options.debounce_ms, 300);
    assert!(options.transform_diagrams_on_import);

    let options: SyncOptions =
        serde_json::from_str(r#"{ "flavor": "wiki", "debounce_ms": 50 }"#).expect("lenient");
    assert_eq!(options.flavor, Flavor::Gfm);
    assert_eq!(options.debounce_ms, 50);
}
