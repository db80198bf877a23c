//! Mediashelf Collections
//!
//! Named media collections attached to owning entities. An owner registers its
//! collections as `CollectionPolicy` values; the `Reconciler` validates a batch of
//! add/update/delete operations against those policies and only then applies it.
//! `FileViewService` serves files of non-public disks after a permission check and
//! `UrlResolver` decides which of the two routes a record's URL takes.

pub mod context;
pub mod gate;
pub mod owner;
pub mod policy;
pub mod reconciler;
pub mod registry;
pub mod store;
pub mod thumbs;
pub mod url;
pub mod validator;
pub mod view;

pub use context::MediaContext;
pub use gate::{authorize_optional, AccessGate, PermissionGate};
pub use owner::{MediaOwner, OwnerResolver, OwnerTypeRegistry};
pub use policy::{CollectionDefaults, CollectionPolicy};
pub use reconciler::{ProcessReport, Reconciler};
pub use registry::{CollectionRegistry, Conversion, ConversionRegistry, Fit, THUMB_200};
pub use store::{InMemoryMediaStore, MediaStore};
pub use thumbs::{thumbs_200_for_collection, ThumbEntry};
pub use url::UrlResolver;
pub use view::{FileView, FileViewService};
