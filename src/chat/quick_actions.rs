//! Canned chat shortcuts shown under the greeting.

/// One quick-action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAction {
    FoundDog,
    FoundCat,
    MedicalHelp,
    WhereToTake,
    FosterInfo,
    /// Leaves the chat for an empty report form.
    SkipToForm,
}

impl QuickAction {
    pub const ALL: &'static [QuickAction] = &[
        QuickAction::FoundDog,
        QuickAction::FoundCat,
        QuickAction::MedicalHelp,
        QuickAction::WhereToTake,
        QuickAction::FosterInfo,
        QuickAction::SkipToForm,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoundDog => "Found a dog",
            Self::FoundCat => "Found a cat",
            Self::MedicalHelp => "Medical help",
            Self::WhereToTake => "Where to take?",
            Self::FosterInfo => "Foster info",
            Self::SkipToForm => "Skip to form",
        }
    }

    /// Text sent as a user message, or `None` for navigation-only actions.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::FoundDog => Some("I found a stray dog"),
            Self::FoundCat => Some("I found a stray cat"),
            Self::MedicalHelp => Some("The animal needs medical attention"),
            Self::WhereToTake => Some("Where can I take this animal?"),
            Self::FosterInfo => Some("I want to become a foster"),
            Self::SkipToForm => None,
        }
    }

    /// Look an action up by its 1-based menu position.
    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl std::fmt::Display for QuickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_skip_to_form_lacks_prompt() {
        let without: Vec<_> = QuickAction::ALL
            .iter()
            .filter(|a| a.prompt().is_none())
            .collect();
        assert_eq!(without, vec![&QuickAction::SkipToForm]);
    }

    #[test]
    fn menu_positions_are_one_based() {
        assert_eq!(QuickAction::from_index(1), Some(QuickAction::FoundDog));
        assert_eq!(QuickAction::from_index(6), Some(QuickAction::SkipToForm));
        assert_eq!(QuickAction::from_index(0), None);
        assert_eq!(QuickAction::from_index(7), None);
    }
}
