//! Wizard phases, steps and navigation targets.

use std::fmt;
use storybook_core::models::{ChildInfo, PersonalizationDraft};

/// Visible step of the wizard. Linear: book, child info, preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Book,
    ChildInfo,
    Preview,
}

impl WizardStep {
    pub fn index(&self) -> usize {
        match self {
            WizardStep::Book => 0,
            WizardStep::ChildInfo => 1,
            WizardStep::Preview => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Book => "book",
            WizardStep::ChildInfo => "child-info",
            WizardStep::Preview => "preview",
        }
    }

    /// Step indicators only allow the current step or an earlier, completed one.
    pub fn can_navigate_to(&self, target: WizardStep) -> bool {
        target.index() <= self.index()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the caller should take the user next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Cart,
    Step(WizardStep),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Cart => "/cart",
            Route::Step(step) => step.as_str(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Explicit wizard state. Operations that are in flight are phases of their own,
/// so e.g. submitting twice or adding to cart while submitting cannot happen.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Book not loaded yet, or the user went back to the book page.
    Book,
    ChildInfo {
        /// Previously submitted data the form was reset to.
        prefill: Option<ChildInfo>,
        /// Draft from the previous submission; photo uploads target it.
        draft: Option<PersonalizationDraft>,
    },
    SubmittingChildInfo {
        form: ChildInfo,
    },
    Preview {
        form: ChildInfo,
        draft: Option<PersonalizationDraft>,
    },
    /// Single draft-creation retry at add-to-cart time.
    RetryingDraft {
        form: ChildInfo,
    },
    AddingToCart {
        form: ChildInfo,
        draft: PersonalizationDraft,
    },
    /// Add-to-cart failed; form and draft are kept so the user can retry.
    Failed {
        reason: String,
        form: Option<ChildInfo>,
        draft: Option<PersonalizationDraft>,
    },
}

impl Phase {
    pub fn step(&self) -> WizardStep {
        match self {
            Phase::Book => WizardStep::Book,
            Phase::ChildInfo { .. } | Phase::SubmittingChildInfo { .. } => WizardStep::ChildInfo,
            Phase::Preview { .. }
            | Phase::RetryingDraft { .. }
            | Phase::AddingToCart { .. }
            | Phase::Failed { .. } => WizardStep::Preview,
        }
    }

    /// Whether a network operation owned by the wizard is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Phase::SubmittingChildInfo { .. } | Phase::RetryingDraft { .. } | Phase::AddingToCart { .. }
        )
    }

    pub fn is_creating_personalization(&self) -> bool {
        matches!(self, Phase::SubmittingChildInfo { .. } | Phase::RetryingDraft { .. })
    }

    pub fn is_adding_to_cart(&self) -> bool {
        matches!(self, Phase::AddingToCart { .. })
    }

    /// Form data the preview renders from, if any.
    pub fn form(&self) -> Option<&ChildInfo> {
        match self {
            Phase::SubmittingChildInfo { form }
            | Phase::Preview { form, .. }
            | Phase::RetryingDraft { form }
            | Phase::AddingToCart { form, .. } => Some(form),
            Phase::Failed { form, .. } => form.as_ref(),
            Phase::ChildInfo { prefill, .. } => prefill.as_ref(),
            Phase::Book => None,
        }
    }

    pub fn draft(&self) -> Option<&PersonalizationDraft> {
        match self {
            Phase::ChildInfo { draft, .. }
            | Phase::Preview { draft, .. }
            | Phase::Failed { draft, .. } => draft.as_ref(),
            Phase::AddingToCart { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_current_or_earlier_steps_are_reachable() {
        assert!(WizardStep::Preview.can_navigate_to(WizardStep::ChildInfo));
        assert!(WizardStep::ChildInfo.can_navigate_to(WizardStep::ChildInfo));
        assert!(!WizardStep::ChildInfo.can_navigate_to(WizardStep::Preview));
        assert!(!WizardStep::Book.can_navigate_to(WizardStep::ChildInfo));
    }

    #[test]
    fn step_is_derived_from_phase() {
        assert_eq!(Phase::Book.step(), WizardStep::Book);
        assert_eq!(
            Phase::ChildInfo { prefill: None, draft: None }.step(),
            WizardStep::ChildInfo
        );
        let failed = Phase::Failed {
            reason: "boom".to_string(),
            form: None,
            draft: None,
        };
        assert_eq!(failed.step(), WizardStep::Preview);
        assert!(!failed.is_busy());
    }

    #[test]
    fn routes_have_paths() {
        assert_eq!(Route::Cart.to_string(), "/cart");
        assert_eq!(Route::Step(WizardStep::ChildInfo).path(), "child-info");
    }
}
