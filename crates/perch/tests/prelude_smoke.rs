use perch::prelude::*;

#[test]
fn prelude_covers_a_full_popup_cycle() {
    let backend = SimulatedBackend::new();
    let registry = ObserverRegistry::new(backend.clone());
    let trigger = ElementRef::from(BoxElement::new("trigger", Rect::new(590.0, 670.0, 100.0, 40.0)));
    let panel = ElementRef::from(BoxElement::new("panel", Rect::new(512.0, 726.0, 256.0, 256.0)));

    let mut popup = Popup::new(registry.clone(), trigger, PopupConfig::default().offset(16.0));
    popup.toggle();
    popup.mount_content(panel).unwrap();
    backend.flush(Rect::new(0.0, 0.0, 1280.0, 720.0), 0.0);
    assert_eq!(popup.side(), Side::Top);

    popup.toggle();
    assert_eq!(registry.entry_count(), 0);
}

#[test]
fn evaluator_reexports_agree() {
    let query = FitQuery::new(
        Rect::new(590.0, 670.0, 100.0, 40.0),
        Rect::new(0.0, 0.0, 256.0, 256.0),
        Rect::new(0.0, 0.0, 1280.0, 720.0),
    )
    .offset(16.0);
    assert_eq!(first_fit(&SidePriority::default(), &query), Some(Side::Top));
    assert!(!fits(
        Side::Bottom,
        query.container,
        query.content,
        query.viewport,
        query.offset
    ));
    assert_eq!(perch::core::Side::ALL.len(), 4);
}
