pub mod builder;
pub mod model;
pub mod naming;
pub mod render;
pub mod types;

pub use builder::{AssociationKind, ClassBuilder, Ownership, OwnershipTracker};
pub use model::{ClassProperty, EntityClass, Import, ImportTable};
pub use render::render_class;
pub use types::TypeSignature;
