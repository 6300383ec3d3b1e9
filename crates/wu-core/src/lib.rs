//! Page runtime for the WU wrestler/promoter marketplace.
//!
//! A page is an owned [`dom::Document`]. [`boot::Boot`] runs the shared
//! modules against it (configuration, API client, optimistic paint, partial
//! includes, authoritative auth with role gating, profile links), resolves
//! the page identity, and runs that page's guards and controllers.
//!
//! Role gating here is presentation only. It decides what the page shows;
//! the backend decides what a caller may do.

pub mod auth;
pub mod boot;
pub mod config;
pub mod dom;
pub mod error;
pub mod gating;
pub mod guard;
pub mod pages;
pub mod partials;
pub mod summary;

pub use auth::{AuthResolver, AuthState, Role};
pub use boot::{Boot, BootContext, BootReport, Module, PageIdentity, PageKind, PageLocation};
pub use config::ClientConfig;
pub use dom::Document;
pub use error::{BootError, FragmentError, TokenError};
pub use gating::{GatingReport, RoleGate, apply_role_gated_ui};
pub use guard::{GuardOutcome, HomeRedirect, PageGuard};
pub use partials::{
    DirFragmentSource, FragmentSource, HttpFragmentSource, MemoryFragmentSource, PartialReport,
    PartialResolver,
};
pub use summary::{SummaryCache, UserSummary};
