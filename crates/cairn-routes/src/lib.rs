//! Routable slugs for Cairn objects.
//!
//! An [`ObjectRoute`] maps a human-readable slug plus a locale onto a target
//! object. Active routes are unique per `(slug, lang)`; the
//! [`SlugResolver`] enforces that at persist time by suffixing `-1`, `-2`,
//! ... until the slug is free, or by adopting the identity of an existing
//! route that already points at the same target.
//!
//! # Modules
//!
//! - [`route`]: the [`ObjectRoute`] model
//! - [`slug`]: [`slugify`] and [`validate_slug`]
//! - [`resolver`]: the uniqueness algorithm
//! - [`hooks`]: [`RouteHook`], running the resolver inside a lifecycle
//! - [`lookup`]: read-side queries by slug or by target
//!
//! Two concurrent resolutions of the same slug can both pass the check; a
//! backend that needs strict uniqueness must enforce it itself.

pub mod error;
pub mod hooks;
pub mod lookup;
pub mod resolver;
pub mod route;
pub mod slug;

pub use error::{RouteError, RouteResult};
pub use hooks::RouteHook;
pub use lookup::RouteLookup;
pub use resolver::SlugResolver;
pub use route::{ObjectRoute, ROUTE_TYPE};
pub use slug::{slugify, validate_slug};
