#![forbid(unsafe_code)]

//! Popup placement controller.
//!
//! A [`Popup`] owns one trigger element (the container) and, while open,
//! one floating content element. Once content is mounted it subscribes to
//! visibility reports through the shared [`ObserverRegistry`]; on every
//! report it re-runs the side-fit evaluator against the reported viewport
//! and commits the first side of its priority that keeps the content on
//! screen.
//!
//! # Invariants
//!
//! 1. The committed side is always a member of the configured priority.
//! 2. The initial side is the first side of the priority.
//! 3. When no side fits, or the report carries no root bounds, the committed
//!    side is left unchanged.
//! 4. Closing the popup unmounts the content and releases its subscription.
//!
//! # Example
//!
//! ```ignore
//! use perch_widgets::{Popup, PopupConfig};
//!
//! let mut popup = Popup::new(registry, trigger, PopupConfig::default().offset(16.0));
//! popup.toggle();
//! popup.mount_content(panel)?;
//! backend.flush(viewport, now);
//! render_at(popup.side());
//! ```

use std::cell::Cell;
use std::env;
use std::fmt;
use std::rc::Rc;

use perch_core::{FitQuery, Side, SidePriority};
use perch_runtime::{
    ElementRef, IntersectionEntry, ObserverConfig, ObserverRegistry, RegistryError, RootMargin,
    Subscription,
};
use tracing::{debug, trace};

const ENV_POPUP_OFFSET: &str = "PERCH_POPUP_OFFSET";
const ENV_POPUP_ANCHORS: &str = "PERCH_POPUP_ANCHORS";
const ENV_POPUP_THRESHOLD: &str = "PERCH_POPUP_THRESHOLD";
const ENV_POPUP_ROOT_MARGIN: &str = "PERCH_POPUP_ROOT_MARGIN";

/// Popup configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupConfig {
    /// Element whose box acts as the viewport (default: host viewport).
    pub root: Option<ElementRef>,
    /// Margin grown around the root box before fitting.
    pub root_margin: Option<String>,
    /// Visibility threshold passed to the observer (default: 1.0).
    pub threshold: Option<f64>,
    /// Sides to try, in order (default: bottom, top, right, left).
    pub anchor_positions: SidePriority,
    /// Gap between container and content (default: 0).
    pub offset: f64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: None,
            threshold: Some(1.0),
            anchor_positions: SidePriority::default(),
            offset: 0.0,
        }
    }
}

impl PopupConfig {
    /// Use `root`'s box as the viewport.
    #[must_use]
    pub fn root(mut self, root: ElementRef) -> Self {
        self.root = Some(root);
        self
    }

    #[must_use]
    pub fn root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = Some(margin.into());
        self
    }

    /// Set the visibility threshold; `None` leaves it to the backend default.
    #[must_use]
    pub fn threshold(mut self, threshold: Option<f64>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the side priority.
    #[must_use]
    pub fn anchor_positions(mut self, priority: SidePriority) -> Self {
        self.anchor_positions = priority;
        self
    }

    /// Set the container-to-content gap.
    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Observer options derived from this config.
    #[must_use]
    pub fn observer_config(&self) -> ObserverConfig {
        ObserverConfig {
            root: self.root.clone(),
            root_margin: self.root_margin.clone(),
            threshold: self.threshold,
        }
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> PopupConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> PopupConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<PopupConfigError>> {
        let mut errors = Vec::new();
        if !self.offset.is_finite() || self.offset < 0.0 {
            errors.push(PopupConfigError::new(
                "offset",
                self.offset.to_string(),
                "must be finite and >= 0",
            ));
        }
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                errors.push(PopupConfigError::new(
                    "threshold",
                    threshold.to_string(),
                    "must be within [0, 1]",
                ));
            }
        }
        if let Some(margin) = &self.root_margin {
            if let Err(err) = RootMargin::parse(margin) {
                errors.push(PopupConfigError::new(
                    "root_margin",
                    margin.clone(),
                    err.to_string(),
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Short human-readable summary for debug overlays.
    #[must_use]
    pub fn summary_short(&self) -> String {
        let threshold = self
            .threshold
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        format!(
            "Popup: {} · offset {} · threshold {threshold}",
            self.anchor_positions, self.offset
        )
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct PopupConfigParse {
    pub config: PopupConfig,
    pub errors: Vec<PopupConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl PopupConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PopupConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for PopupConfigError {}

fn from_env_with<F>(mut get: F) -> PopupConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = PopupConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_POPUP_OFFSET) {
        match parse_f64(&value) {
            Some(parsed) => config.offset = parsed,
            None => errors.push(PopupConfigError::new(
                "offset",
                value,
                "expected number",
            )),
        }
    }

    if let Some(value) = get(ENV_POPUP_ANCHORS) {
        match value.parse::<SidePriority>() {
            Ok(parsed) => config.anchor_positions = parsed,
            Err(err) => errors.push(PopupConfigError::new(
                "anchor_positions",
                value,
                err.to_string(),
            )),
        }
    }

    if let Some(value) = get(ENV_POPUP_THRESHOLD) {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            config.threshold = None;
        } else {
            match parse_f64(trimmed) {
                Some(parsed) => config.threshold = Some(parsed),
                None => errors.push(PopupConfigError::new(
                    "threshold",
                    value,
                    "expected number in [0, 1] or none",
                )),
            }
        }
    }

    if let Some(value) = get(ENV_POPUP_ROOT_MARGIN) {
        let trimmed = value.trim();
        config.root_margin = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    if let Err(mut validation) = config.validate() {
        errors.append(&mut validation);
    }

    PopupConfigParse { config, errors }
}

#[inline]
fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Auto-repositioning popup anchored to a container element.
#[derive(Debug)]
pub struct Popup {
    registry: ObserverRegistry,
    container: ElementRef,
    config: PopupConfig,
    side: Rc<Cell<Side>>,
    open: bool,
    content: Option<ElementRef>,
    subscription: Option<Subscription>,
}

impl Popup {
    /// Create a closed popup. The initial side is the first of the priority.
    #[must_use]
    pub fn new(registry: ObserverRegistry, container: ElementRef, config: PopupConfig) -> Self {
        let side = config.anchor_positions.first();
        Self {
            registry,
            container,
            config,
            side: Rc::new(Cell::new(side)),
            open: false,
            content: None,
            subscription: None,
        }
    }

    /// Currently committed side.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side.get()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether content is mounted and being tracked.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.content.is_some()
    }

    #[must_use]
    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    #[must_use]
    pub fn container(&self) -> &ElementRef {
        &self.container
    }

    #[must_use]
    pub fn content(&self) -> Option<&ElementRef> {
        self.content.as_ref()
    }

    /// Flip the open flag.
    pub fn toggle(&mut self) {
        self.set_open(!self.open);
    }

    /// Open or close. Closing unmounts the content.
    pub fn set_open(&mut self, open: bool) {
        if self.open == open {
            return;
        }
        self.open = open;
        trace!(container = ?self.container, open, "popup open state changed");
        if !open {
            self.unmount_content();
        }
    }

    /// Start tracking `content`. A previously mounted element is unmounted
    /// first. Mounting opens a closed popup, so a mounted popup is always
    /// open.
    ///
    /// When the host has no visibility tracking, placement runs once right
    /// here against a synthesized report.
    pub fn mount_content(&mut self, content: ElementRef) -> Result<(), RegistryError> {
        self.unmount_content();
        if !self.open {
            self.open = true;
            trace!(container = ?self.container, open = true, "popup opened by mount");
        }
        let handler = placement_handler(
            self.container.clone(),
            self.config.anchor_positions,
            self.config.offset,
            Rc::clone(&self.side),
        );
        let subscription =
            self.registry
                .subscribe(&content, &self.config.observer_config(), handler)?;
        self.content = Some(content);
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Stop tracking the mounted content. Idempotent.
    pub fn unmount_content(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.content = None;
    }
}

fn placement_handler(
    container: ElementRef,
    priority: SidePriority,
    offset: f64,
    side: Rc<Cell<Side>>,
) -> impl Fn(&IntersectionEntry) + 'static {
    move |entry: &IntersectionEntry| {
        let Some(viewport) = entry.root_bounds else {
            trace!(target_el = ?entry.target, "no root bounds; placement unchanged");
            return;
        };
        let query = FitQuery::new(
            container.bounding_client_rect(),
            entry.bounding_client_rect,
            viewport,
        )
        .offset(offset);

        let current = side.get();
        match query.first_fit(&priority) {
            Some(next) if next != current => {
                debug_assert!(priority.contains(next));
                debug!(from = %current, to = %next, "popup side changed");
                side.set(next);
            }
            Some(_) => {}
            None => trace!(side = %current, "no side fits; placement unchanged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::Rect;
    use perch_runtime::{BoxElement, SimulatedBackend, UnsupportedBackend};
    use std::collections::HashMap;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 800.0)
    }

    fn element(name: &str, rect: Rect) -> (Rc<BoxElement>, ElementRef) {
        let node = BoxElement::new(name, rect);
        let el = ElementRef::from(Rc::clone(&node));
        (node, el)
    }

    fn env_parse(pairs: &[(&'static str, &str)]) -> PopupConfigParse {
        let env: HashMap<&str, String> = pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        from_env_with(|key| env.get(key).cloned())
    }

    #[test]
    fn config_defaults() {
        let config = PopupConfig::default();
        assert_eq!(config.threshold, Some(1.0));
        assert_eq!(config.offset, 0.0);
        assert_eq!(config.anchor_positions, SidePriority::default());
        assert!(config.root.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_builder_chaining() {
        let priority = SidePriority::new(&[Side::Right, Side::Left]).unwrap();
        let config = PopupConfig::default()
            .offset(8.0)
            .threshold(None)
            .root_margin("4px")
            .anchor_positions(priority);
        assert_eq!(config.offset, 8.0);
        assert_eq!(config.threshold, None);
        assert_eq!(config.anchor_positions, priority);

        let observer = config.observer_config();
        assert_eq!(observer.root_margin.as_deref(), Some("4px"));
        assert_eq!(observer.threshold, None);
    }

    #[test]
    fn config_env_parsing() {
        let parsed = env_parse(&[
            (ENV_POPUP_OFFSET, "16"),
            (ENV_POPUP_ANCHORS, "top, left"),
            (ENV_POPUP_THRESHOLD, "0.5"),
            (ENV_POPUP_ROOT_MARGIN, " 10px 5% "),
        ]);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let config = parsed.config;
        assert_eq!(config.offset, 16.0);
        assert_eq!(
            config.anchor_positions,
            SidePriority::new(&[Side::Top, Side::Left]).unwrap()
        );
        assert_eq!(config.threshold, Some(0.5));
        assert_eq!(config.root_margin.as_deref(), Some("10px 5%"));
    }

    #[test]
    fn config_env_threshold_none_and_empty_margin() {
        let parsed = env_parse(&[(ENV_POPUP_THRESHOLD, "None"), (ENV_POPUP_ROOT_MARGIN, "  ")]);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config.threshold, None);
        assert_eq!(parsed.config.root_margin, None);
    }

    #[test]
    fn config_invalid_values_reported() {
        let parsed = env_parse(&[
            (ENV_POPUP_OFFSET, "wide"),
            (ENV_POPUP_ANCHORS, "top,top"),
            (ENV_POPUP_THRESHOLD, "lots"),
        ]);
        assert!(parsed.errors.iter().any(|err| err.field == "offset"));
        assert!(parsed.errors.iter().any(|err| err.field == "anchor_positions"));
        assert!(parsed.errors.iter().any(|err| err.field == "threshold"));
        assert_eq!(parsed.config.anchor_positions, SidePriority::default());
    }

    #[test]
    fn config_validation_errors() {
        let parsed = env_parse(&[
            (ENV_POPUP_OFFSET, "-4"),
            (ENV_POPUP_THRESHOLD, "1.5"),
            (ENV_POPUP_ROOT_MARGIN, "3em"),
        ]);
        let fields: Vec<_> = parsed.errors.iter().map(|err| err.field).collect();
        assert_eq!(fields, vec!["offset", "threshold", "root_margin"]);
        assert_eq!(
            parsed.errors[0].to_string(),
            "offset=-4 (must be finite and >= 0)"
        );
    }

    #[test]
    fn summary_mentions_priority() {
        let summary = PopupConfig::default().offset(16.0).summary_short();
        assert_eq!(summary, "Popup: bottom,top,right,left · offset 16 · threshold 1");
    }

    #[test]
    fn initial_side_is_first_priority() {
        let registry = ObserverRegistry::new(SimulatedBackend::new());
        let (_, container) = element("trigger", Rect::new(0.0, 0.0, 10.0, 10.0));
        let priority = SidePriority::new(&[Side::Left, Side::Top]).unwrap();
        let popup = Popup::new(
            registry,
            container,
            PopupConfig::default().anchor_positions(priority),
        );
        assert_eq!(popup.side(), Side::Left);
        assert!(!popup.is_open());
        assert!(!popup.is_mounted());
    }

    #[test]
    fn toggle_flips_and_closing_unmounts() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(400.0, 100.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(322.0, 156.0, 256.0, 256.0));
        let mut popup = Popup::new(registry.clone(), container, PopupConfig::default());

        popup.toggle();
        assert!(popup.is_open());
        popup.mount_content(content.clone()).unwrap();
        assert!(popup.is_mounted());
        assert!(registry.is_observed(&content));

        popup.toggle();
        assert!(!popup.is_open());
        assert!(!popup.is_mounted());
        assert_eq!(registry.entry_count(), 0);
        assert_eq!(backend.live_observer_count(), 0);

        popup.unmount_content();
        assert!(!popup.is_mounted());
    }

    #[test]
    fn flips_to_top_near_bottom_edge() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(450.0, 700.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(372.0, 756.0, 256.0, 256.0));
        let mut popup = Popup::new(registry, container, PopupConfig::default().offset(16.0));

        popup.set_open(true);
        popup.mount_content(content).unwrap();
        assert_eq!(popup.side(), Side::Bottom);

        backend.flush(viewport(), 0.0);
        assert_eq!(popup.side(), Side::Top);
    }

    #[test]
    fn mounting_a_closed_popup_opens_it() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(450.0, 700.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(372.0, 756.0, 256.0, 256.0));
        let mut popup =
            Popup::new(registry.clone(), container, PopupConfig::default().offset(16.0));

        popup.mount_content(content).unwrap();
        assert!(popup.is_open());
        assert!(popup.is_mounted());
        assert_eq!(registry.entry_count(), 1);

        popup.set_open(false);
        assert!(!popup.is_mounted());
        assert_eq!(registry.entry_count(), 0);

        // Closed popups never commit a side.
        backend.flush(viewport(), 0.0);
        assert_eq!(popup.side(), Side::Bottom);
    }

    #[test]
    fn nothing_fits_keeps_side() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(0.0, 0.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(0.0, 56.0, 2000.0, 2000.0));
        let mut popup = Popup::new(registry, container, PopupConfig::default());

        popup.set_open(true);
        popup.mount_content(content).unwrap();
        backend.flush(viewport(), 0.0);
        assert_eq!(popup.side(), Side::Bottom);
    }

    #[test]
    fn missing_root_bounds_keeps_side() {
        let (_, container) = element("trigger", Rect::new(450.0, 700.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(372.0, 756.0, 256.0, 256.0));
        let side = Rc::new(Cell::new(Side::Bottom));
        let handler = placement_handler(container, SidePriority::default(), 16.0, Rc::clone(&side));

        let mut entry = IntersectionEntry::synthesized(&content, Some(1.0));
        entry.root_bounds = None;
        handler(&entry);
        assert_eq!(side.get(), Side::Bottom);
    }

    #[test]
    fn remount_replaces_subscription() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(400.0, 100.0, 100.0, 40.0));
        let (_, first) = element("first", Rect::new(322.0, 156.0, 256.0, 256.0));
        let (_, second) = element("second", Rect::new(322.0, 156.0, 256.0, 256.0));
        let mut popup = Popup::new(registry.clone(), container, PopupConfig::default());

        popup.set_open(true);
        popup.mount_content(first.clone()).unwrap();
        popup.mount_content(second.clone()).unwrap();
        assert!(!registry.is_observed(&first));
        assert!(registry.is_observed(&second));
        assert_eq!(registry.callback_count(&second), 1);
        assert_eq!(popup.content(), Some(&second));

        popup.mount_content(second.clone()).unwrap();
        assert_eq!(registry.callback_count(&second), 1);
    }

    #[test]
    fn degraded_backend_places_immediately() {
        let registry = ObserverRegistry::new(UnsupportedBackend);
        let (_, container) = element("trigger", Rect::new(0.0, 0.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(0.0, 56.0, 256.0, 256.0));
        let mut popup = Popup::new(registry.clone(), container, PopupConfig::default());

        popup.set_open(true);
        popup.mount_content(content).unwrap();
        // The content box doubles as the viewport, so no side has room.
        assert_eq!(popup.side(), Side::Bottom);
        assert_eq!(registry.entry_count(), 0);
        popup.set_open(false);
    }

    #[test]
    fn dropping_popup_releases_subscription() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(0.0, 0.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(0.0, 56.0, 256.0, 256.0));
        {
            let mut popup = Popup::new(registry.clone(), container, PopupConfig::default());
            popup.set_open(true);
            popup.mount_content(content).unwrap();
            assert_eq!(registry.entry_count(), 1);
        }
        assert_eq!(registry.entry_count(), 0);
        assert_eq!(backend.live_observer_count(), 0);
    }

    #[test]
    #[tracing_test::traced_test]
    fn side_change_is_logged() {
        let backend = SimulatedBackend::new();
        let registry = ObserverRegistry::new(backend.clone());
        let (_, container) = element("trigger", Rect::new(450.0, 700.0, 100.0, 40.0));
        let (_, content) = element("panel", Rect::new(372.0, 756.0, 256.0, 256.0));
        let mut popup = Popup::new(registry, container, PopupConfig::default().offset(16.0));
        popup.set_open(true);
        popup.mount_content(content).unwrap();
        backend.flush(viewport(), 0.0);
        assert!(logs_contain("popup side changed"));
    }
}
