#![forbid(unsafe_code)]

//! Observation configuration and its parsed root margin.
//!
//! An [`ObserverConfig`] is passed through verbatim to the visibility
//! backend. Two configs are equivalent when every defined field matches,
//! with `root` compared by element identity.

use std::fmt;

use perch_core::{Insets, Rect};

use crate::element::ElementRef;

/// Options for one underlying visibility observer.
#[derive(Debug, Clone, Default)]
pub struct ObserverConfig {
    /// Element whose box acts as the viewport. `None` means the host
    /// viewport.
    pub root: Option<ElementRef>,
    /// CSS-style margin grown around the root box (e.g. `"10px 5%"`).
    pub root_margin: Option<String>,
    /// Visible ratio at which the observer reports, in `[0, 1]`.
    pub threshold: Option<f64>,
}

impl ObserverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

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

    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Parse [`Self::root_margin`]; an unset margin is zero on all edges.
    pub fn parsed_root_margin(&self) -> Result<RootMargin, RootMarginError> {
        match &self.root_margin {
            Some(margin) => RootMargin::parse(margin),
            None => Ok(RootMargin::default()),
        }
    }
}

impl PartialEq for ObserverConfig {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.root_margin == other.root_margin
            && self.threshold == other.threshold
    }
}

/// Deterministic identity string for an [`ObserverConfig`].
///
/// Built by the registry from the config's defined fields; see
/// [`crate::registry::ObserverRegistry::config_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(String);

impl ConfigId {
    pub(crate) fn new(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One edge of a root margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Pixels(f64),
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent(f64),
}

impl Default for MarginValue {
    fn default() -> Self {
        MarginValue::Pixels(0.0)
    }
}

impl MarginValue {
    fn parse(token: &str) -> Result<Self, RootMarginError> {
        let invalid = || RootMarginError::InvalidValue(token.to_string());
        let value = if let Some(num) = token.strip_suffix('%') {
            MarginValue::Percent(num.parse::<f64>().map_err(|_| invalid())?)
        } else if let Some(num) = token.strip_suffix("px") {
            MarginValue::Pixels(num.parse::<f64>().map_err(|_| invalid())?)
        } else {
            MarginValue::Pixels(token.parse::<f64>().map_err(|_| invalid())?)
        };
        match value {
            MarginValue::Pixels(v) | MarginValue::Percent(v) if !v.is_finite() => Err(invalid()),
            _ => Ok(value),
        }
    }

    /// Resolve against the reference length (root width or height).
    #[must_use]
    pub fn to_pixels(self, reference: f64) -> f64 {
        match self {
            MarginValue::Pixels(px) => px,
            MarginValue::Percent(pct) => reference * pct / 100.0,
        }
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginValue::Pixels(px) => write!(f, "{px}px"),
            MarginValue::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Parsed root margin, in CSS `margin` shorthand order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    /// Parse 1–4 whitespace separated components (`px`, `%` or bare numbers).
    pub fn parse(margin: &str) -> Result<Self, RootMarginError> {
        let parts = margin
            .split_whitespace()
            .map(MarginValue::parse)
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [] => Ok(Self::default()),
            [all] => Ok(Self {
                top: *all,
                right: *all,
                bottom: *all,
                left: *all,
            }),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            more => Err(RootMarginError::TooManyComponents(more.len())),
        }
    }

    /// Pixel insets for a given root box.
    #[must_use]
    pub fn resolve(&self, root: Rect) -> Insets {
        Insets {
            top: self.top.to_pixels(root.height),
            right: self.right.to_pixels(root.width),
            bottom: self.bottom.to_pixels(root.height),
            left: self.left.to_pixels(root.width),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Why a root margin string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootMarginError {
    InvalidValue(String),
    TooManyComponents(usize),
}

impl fmt::Display for RootMarginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(v) => write!(f, "invalid root margin component '{v}'"),
            Self::TooManyComponents(n) => {
                write!(f, "root margin takes 1 to 4 components, got {n}")
            }
        }
    }
}

impl std::error::Error for RootMarginError {}
