use std::fmt;
use std::str::FromStr;

/// A structural component of the house. Stored by its uppercase name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Foundation,
    Framing,
    Electrical,
    Roof,
}

impl Component {
    /// Build order used for "what's next" hints and the banner.
    pub const ALL: [Component; 4] = [
        Component::Foundation,
        Component::Framing,
        Component::Electrical,
        Component::Roof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Foundation => "FOUNDATION",
            Self::Framing => "FRAMING",
            Self::Electrical => "ELECTRICAL",
            Self::Roof => "ROOF",
        }
    }

    /// The component that must already stand before this one can be built.
    pub fn prerequisite(&self) -> Option<Component> {
        match self {
            Self::Framing => Some(Self::Foundation),
            Self::Roof => Some(Self::Framing),
            Self::Foundation | Self::Electrical => None,
        }
    }

    /// Title-case name used in failure reasons ("MISSING_DEPENDENCY: Foundation").
    pub fn title(&self) -> &'static str {
        match self {
            Self::Foundation => "Foundation",
            Self::Framing => "Framing",
            Self::Electrical => "Electrical",
            Self::Roof => "Roof",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOUNDATION" => Ok(Self::Foundation),
            "FRAMING" => Ok(Self::Framing),
            "ELECTRICAL" => Ok(Self::Electrical),
            "ROOF" => Ok(Self::Roof),
            other => Err(format!("unknown component: {other}")),
        }
    }
}
