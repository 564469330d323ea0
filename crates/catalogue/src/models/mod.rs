mod package;
mod reference;
mod slot;

pub(crate) use self::package::{IndexRow, PackageRow};
pub use self::package::{IndexEntry, NewPackage, Package};
pub(crate) use self::reference::ReferenceRow;
pub use self::reference::{ListFilter, Reference};
pub use self::slot::DirtySlot;
