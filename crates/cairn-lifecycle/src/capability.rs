//! Capability traits a model implements to opt into lifecycle behaviors.
//!
//! Each capability is independent. A concrete model composes the ones it
//! needs and the matching hook is registered on its
//! [`LifecycleBuilder`](crate::LifecycleBuilder).

use cairn_store::Model;
use cairn_types::Timestamp;

/// Field names written by a soft delete or restore.
pub const SOFT_DELETE_FIELDS: &[&str] = &["deleted_date", "deleted_by"];

/// Creation and modification instants.
pub trait Timestampable {
    fn created(&self) -> Option<Timestamp>;
    fn set_created(&mut self, at: Option<Timestamp>);
    fn last_modified(&self) -> Option<Timestamp>;
    fn set_last_modified(&mut self, at: Option<Timestamp>);
}

/// Users who created and last modified the object.
pub trait Authorable {
    fn created_by(&self) -> Option<&str>;
    fn set_created_by(&mut self, user: Option<String>);
    fn last_modified_by(&self) -> Option<&str>;
    fn set_last_modified_by(&mut self, user: Option<String>);
}

/// Objects whose prior state is snapshotted before each update.
pub trait Revisionable: Model {
    /// Per-instance switch. Defaults to on.
    fn revision_enabled(&self) -> bool {
        true
    }
}

/// Objects that can be moved to the trash instead of being removed.
///
/// An object is trashed iff `deleted_date` is set.
pub trait SoftDeletable {
    fn deleted_date(&self) -> Option<Timestamp>;
    fn set_deleted_date(&mut self, at: Option<Timestamp>);
    fn deleted_by(&self) -> Option<&str>;
    fn set_deleted_by(&mut self, user: Option<String>);

    fn is_trashed(&self) -> bool {
        self.deleted_date().is_some()
    }

    /// Properties persisted by the soft delete and restore paths.
    fn soft_delete_fields(&self) -> &'static [&'static str] {
        SOFT_DELETE_FIELDS
    }
}

/// A model the [`Lifecycle`](crate::Lifecycle) can persist.
///
/// `soft_deletable` is how the lifecycle decides between the soft and hard
/// delete paths without knowing the concrete type.
pub trait Storable: Model {
    fn soft_deletable(&self) -> Option<&dyn SoftDeletable> {
        None
    }
}
