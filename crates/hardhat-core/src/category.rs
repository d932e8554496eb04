use std::fmt;

use crate::component::Component;

/// Routing decision for a cleared player order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Build(Component),
    Chat,
}

impl Category {
    /// The closed label set the router accepts from the classifier.
    pub const LABELS: [&'static str; 5] = ["FOUNDATION", "FRAMING", "ELECTRICAL", "ROOF", "CHAT"];

    /// Normalize a raw classifier reply (trim + uppercase). Anything outside
    /// the label set maps to `Chat`.
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim().to_uppercase();
        match label.parse::<Component>() {
            Ok(component) => Self::Build(component),
            Err(_) => Self::Chat,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Build(c) => c.as_str(),
            Self::Chat => "CHAT",
        }
    }

    pub fn component(&self) -> Option<Component> {
        match self {
            Self::Build(c) => Some(*c),
            Self::Chat => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
