use crate::geo::FeatureId;

/// Which feature, if any, the pointer is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HighlightState {
    #[default]
    None,
    Hovering(FeatureId),
}

impl HighlightState {
    pub fn from_hit(hit: Option<FeatureId>) -> Self {
        match hit {
            Some(id) => Self::Hovering(id),
            None => Self::None,
        }
    }

    pub fn target(&self) -> Option<FeatureId> {
        match self {
            Self::Hovering(id) => Some(*id),
            Self::None => None,
        }
    }

    pub fn is_highlighted(&self, id: FeatureId) -> bool {
        *self == Self::Hovering(id)
    }

    /// Move to the state for `hit`. Returns `true` only if the value changed,
    /// which is the only case that needs a redraw.
    pub fn apply(&mut self, hit: Option<FeatureId>) -> bool {
        let next = Self::from_hit(hit);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.apply(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_report_changes_only() {
        let mut state = HighlightState::default();
        assert!(!state.apply(None));

        assert!(state.apply(Some(FeatureId(1))));
        assert_eq!(state, HighlightState::Hovering(FeatureId(1)));
        assert!(!state.apply(Some(FeatureId(1))));

        assert!(state.apply(Some(FeatureId(2))));
        assert!(state.is_highlighted(FeatureId(2)));
        assert!(!state.is_highlighted(FeatureId(1)));

        assert!(state.clear());
        assert_eq!(state.target(), None);
        assert!(!state.clear());
    }
}
