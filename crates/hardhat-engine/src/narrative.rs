use std::collections::BTreeSet;
use std::fmt;

use hardhat_core::Component;

/// Who said a line of the turn's narrative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    Client,
    SafetyOfficer,
    Site,
    Crew,
    Inspector,
    PermitOffice,
    Supervisor,
}

/// One line of narrative produced during a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narrative {
    pub speaker: Speaker,
    pub text: String,
}

impl Narrative {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// Inspection results and fines are both issued by the inspector.
    pub fn is_inspection(&self) -> bool {
        self.speaker == Speaker::Inspector
    }
}

/// Built components in build order, e.g. `[FOUNDATION, FRAMING]`.
pub fn site_list(site: &BTreeSet<Component>) -> String {
    let names: Vec<&str> = site.iter().map(|c| c.as_str()).collect();
    format!("[{}]", names.join(", "))
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_list_is_in_build_order() {
        let site: BTreeSet<Component> = [Component::Roof, Component::Foundation].into_iter().collect();
        assert_eq!(site_list(&site), "[FOUNDATION, ROOF]");
        assert_eq!(site_list(&BTreeSet::new()), "[]");
    }
}
