//! Navigation targets and the host-side collaborators
//!
//! The host supplies a [`Navigator`] that can redirect to a URL or open a page
//! by reference, an optional [`ErrorReporter`] and an optional
//! [`ActionCallback`] fired after a menu selection. [`dispatch`] sends one
//! [`NavigationTarget`] and never fails: any error is reported and followed by
//! a redirect to [`FALLBACK_URL`].

use crate::error::{NavError, Result};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, warn};

/// Safe root-relative target used when a navigation fails
pub const FALLBACK_URL: &str = "/";

/// Page parameters passed to [`Navigator::open_page`]
pub type PageParams = BTreeMap<String, String>;

/// Where a menu entry leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Absolute or root-relative URL
    Url(String),
    /// Host page reference
    Page {
        /// Page identifier understood by the host
        page: String,
        /// Page parameters
        params: PageParams,
    },
}

impl NavigationTarget {
    /// Classify a resource reference
    ///
    /// Blank references have no target. References starting with `/` or
    /// `http` are URLs; everything else is a host page.
    ///
    /// ```rust
    /// use navtree::navigation::NavigationTarget;
    ///
    /// assert_eq!(NavigationTarget::from_resource("  "), None);
    /// assert_eq!(
    ///     NavigationTarget::from_resource("/orders"),
    ///     Some(NavigationTarget::Url("/orders".to_string()))
    /// );
    /// assert!(matches!(
    ///     NavigationTarget::from_resource("Orders/Overview.page.xml"),
    ///     Some(NavigationTarget::Page { .. })
    /// ));
    /// ```
    pub fn from_resource(resource: &str) -> Option<Self> {
        let resource = resource.trim();
        if resource.is_empty() {
            None
        } else if resource.starts_with('/') || resource.starts_with("http") {
            Some(NavigationTarget::Url(resource.to_string()))
        } else {
            Some(Self::page(resource))
        }
    }

    /// Page target without parameters
    pub fn page(page: impl Into<String>) -> Self {
        NavigationTarget::Page {
            page: page.into(),
            params: PageParams::new(),
        }
    }

    /// Reject targets that must not be handed to the host
    ///
    /// # Errors
    ///
    /// [`NavError::MalformedTarget`] for empty targets or targets with
    /// whitespace or control characters.
    pub fn validate(&self) -> Result<()> {
        let raw = match self {
            NavigationTarget::Url(url) => url,
            NavigationTarget::Page { page, .. } => page,
        };
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(NavError::MalformedTarget(raw.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Url(url) => write!(f, "url {}", url),
            NavigationTarget::Page { page, .. } => write!(f, "page {}", page),
        }
    }
}

/// Host navigation API
pub trait Navigator: Send + Sync {
    /// Navigate the whole view to `url`
    fn redirect(&self, url: &str) -> Result<()>;

    /// Open a host page by reference
    fn open_page(&self, page: &str, params: &PageParams) -> Result<()>;
}

/// Sink for errors that were recovered locally
pub trait ErrorReporter: Send + Sync {
    /// Record one error
    fn report(&self, error: &NavError);
}

/// Reporter that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &NavError) {
        error!("Navigation error: {}", error);
    }
}

/// Host action run after a menu selection
pub trait ActionCallback: Send + Sync {
    /// Run the action
    fn execute(&self);

    /// Whether the action may run right now
    fn can_execute(&self) -> bool {
        true
    }
}

impl<F> ActionCallback for F
where
    F: Fn() + Send + Sync,
{
    fn execute(&self) {
        self()
    }
}

/// How a [`dispatch`] call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The target was delivered to the host
    Delivered,
    /// The target failed and the fallback redirect succeeded
    FellBack,
    /// Both the target and the fallback failed
    Failed,
}

/// Send `target` to the host, falling back to [`FALLBACK_URL`] on failure
pub fn dispatch(
    navigator: &dyn Navigator,
    reporter: &dyn ErrorReporter,
    target: &NavigationTarget,
) -> NavigationOutcome {
    let result = target.validate().and_then(|()| match target {
        NavigationTarget::Url(url) => navigator.redirect(url),
        NavigationTarget::Page { page, params } => navigator.open_page(page, params),
    });

    let Err(e) = result else {
        debug!("Navigated to {}", target);
        return NavigationOutcome::Delivered;
    };

    warn!("Navigation to {} failed, falling back to {}", target, FALLBACK_URL);
    reporter.report(&e);
    match navigator.redirect(FALLBACK_URL) {
        Ok(()) => NavigationOutcome::FellBack,
        Err(fallback_err) => {
            reporter.report(&fallback_err);
            NavigationOutcome::Failed
        }
    }
}
