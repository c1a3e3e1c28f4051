//! Click handling for a mounted menu
//!
//! [`MenuController`] ties a [`MenuSession`] to the host collaborators from
//! [`crate::navigation`] and turns menu clicks into session operations:
//!
//! | Click on | Vertical layout | Horizontal layout |
//! |---|---|---|
//! | unknown or disabled entry | ignored | ignored |
//! | branch | accordion toggle | exclusive top-level toggle |
//! | leaf | select, navigate, run action | select, navigate, run action |
//!
//! Clicks coming from the expand-all overlay always select and navigate.

use crate::navigation::{
    dispatch, ActionCallback, ErrorReporter, NavigationOutcome, NavigationTarget, Navigator,
    TracingReporter,
};
use crate::session::{MenuSession, ReconcileOutcome};
use crate::types::{DataStatus, Layout};
use std::sync::Arc;
use tracing::{debug, instrument};

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Unknown or disabled entry
    Ignored,
    /// A branch was expanded or collapsed
    Toggled,
    /// A leaf became active
    Selected {
        /// Navigation result; `None` when the entry has no target
        navigation: Option<NavigationOutcome>,
    },
}

/// Menu session plus host collaborators
pub struct MenuController {
    session: MenuSession,
    navigator: Arc<dyn Navigator>,
    reporter: Arc<dyn ErrorReporter>,
    action: Option<Arc<dyn ActionCallback>>,
    overlay_open: bool,
}

impl MenuController {
    /// Create a controller reporting errors through `tracing`
    pub fn new(session: MenuSession, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            navigator,
            reporter: Arc::new(TracingReporter),
            action: None,
            overlay_open: false,
        }
    }

    /// Replace the error reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run `action` after every menu selection
    pub fn with_action(mut self, action: Arc<dyn ActionCallback>) -> Self {
        self.action = Some(action);
        self
    }

    /// Underlying session
    pub fn session(&self) -> &MenuSession {
        &self.session
    }

    /// Underlying session, mutably
    pub fn session_mut(&mut self) -> &mut MenuSession {
        &mut self.session
    }

    /// Take the session back
    pub fn into_session(self) -> MenuSession {
        self.session
    }

    /// Forward a data status to the session
    pub fn on_data(&mut self, status: DataStatus) -> ReconcileOutcome {
        self.session.on_data(status)
    }

    /// Handle a click in the regular menu
    #[instrument(skip(self))]
    pub fn click(&mut self, id: &str) -> ClickOutcome {
        let Some(node) = self.session.forest().find(id) else {
            debug!("Ignoring click on unknown menu {}", id);
            return ClickOutcome::Ignored;
        };
        if !node.is_enabled() {
            debug!("Ignoring click on disabled menu {}", id);
            return ClickOutcome::Ignored;
        }

        if node.has_children() {
            match self.session.config().layout {
                Layout::Vertical => self.session.toggle_expand(id),
                Layout::Horizontal => self.session.toggle_top_level_expand(id),
            }
            return ClickOutcome::Toggled;
        }

        let resource = node.resource_url().map(str::to_string);
        self.select_and_navigate(id, resource.as_deref())
    }

    /// Handle a click inside the expand-all overlay
    ///
    /// Branches are selected like leaves; the overlay closes afterwards.
    #[instrument(skip(self))]
    pub fn click_from_overlay(&mut self, id: &str) -> ClickOutcome {
        let Some(node) = self.session.forest().find(id) else {
            return ClickOutcome::Ignored;
        };
        if !node.is_enabled() {
            return ClickOutcome::Ignored;
        }

        let resource = node.resource_url().map(str::to_string);
        let outcome = self.select_and_navigate(id, resource.as_deref());
        self.overlay_open = false;
        outcome
    }

    /// Clear the active entry and open the home page
    pub fn home(&mut self) -> NavigationOutcome {
        self.session.clear_active();
        self.overlay_open = false;
        let target = NavigationTarget::page(self.session.config().home_page.clone());
        dispatch(self.navigator.as_ref(), self.reporter.as_ref(), &target)
    }

    /// Open the expand-all overlay, expanding every branch
    pub fn open_overlay(&mut self) {
        self.session.expand_all();
        self.overlay_open = true;
    }

    /// Close the overlay, collapsing every branch
    pub fn close_overlay(&mut self) {
        self.session.collapse_all();
        self.overlay_open = false;
    }

    /// Whether the expand-all overlay is showing
    pub fn is_overlay_open(&self) -> bool {
        self.overlay_open
    }

    fn select_and_navigate(&mut self, id: &str, resource: Option<&str>) -> ClickOutcome {
        if self.session.config().close_on_navigate {
            self.session.collapse_all();
        }
        self.session.select(id);

        let navigation = resource
            .and_then(NavigationTarget::from_resource)
            .map(|target| dispatch(self.navigator.as_ref(), self.reporter.as_ref(), &target));

        if let Some(action) = &self.action {
            if action.can_execute() {
                action.execute();
            }
        }

        ClickOutcome::Selected { navigation }
    }
}
