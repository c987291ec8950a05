//! Normalized discretionary access control lists.
//!
//! A discretionary access control list (DACL) is an ordered list of access control entries
//! (ACEs). Each entry grants or denies a set of rights to a trustee, that is a user or a group.
//! This crate keeps such a list in memory, lets it be built from several shapes of input, edited
//! like a vector, and rendered into the canonical form an operating system expects.
//!
//! # Entries
//!
//! An [`Ace`] is a normalized `(trustee, rights, access type)` triple. Entries are built through
//! [`ace`], which accepts a plain tuple, a native entry or an existing `Ace`:
//!
//! * the *trustee* is kept as given: a name, a resolved [`Account`] or a [`Sid`].
//! * the *rights* are a mask or a name known to the [`RightsRegistry`], like `"R"` (read),
//!   `"W"` (write), `"X"` (execute), `"M"` (modify) or `"F"` (full control).
//! * the *access type* is `Allow` or `Deny`, in any casing.
//!
//! ```rust
//! # use dacl::{ace, AccessType};
//! let entry = ace(("Everyone", "R", "allow"))?;
//!
//! assert_eq!(entry.access_type(), AccessType::Allow);
//! assert!(entry == ("Everyone", "R", "ALLOW"));
//! assert!(entry != ("Everyone", "F", "Allow"));
//! # Ok::<(), dacl::Error>(())
//! ```
//!
//! # Lists
//!
//! [`acl`] builds an [`Acl`] from nothing, from an existing `Acl` (which is handed back as it is),
//! from a native list, or from any iterable of entries:
//!
//! ```rust
//! # use dacl::{acl, ace};
//! let mut list = acl(vec![("Everyone", "R", "Allow"), ("Administrators", "F", "Deny")])?;
//!
//! assert_eq!(list.len(), 2);
//! assert!(list.contains(("Administrators", "F", "deny"))?);
//! # Ok::<(), dacl::Error>(())
//! ```
//!
//! ## Two orders
//!
//! Entries are *stored* in the order they were added; indexing, `set` and `delete` use that
//! order. Iterating yields the *canonical* order instead: all deny entries before all allow
//! entries, each group in insertion order. Operating systems evaluate entries first to last, so
//! only the canonical order lets a deny override an allow.
//!
//! ```rust
//! # use dacl::{acl, ace};
//! let mut list = acl(vec![("Everyone", "R", "Allow"), ("Administrators", "F", "Deny")])?;
//!
//! // stored order
//! assert!(list[0] == ("Everyone", "R", "Allow"));
//!
//! // canonical order
//! let names: Vec<String> = list.iter().map(|e| e.trustee().to_string()).collect();
//! assert_eq!(names, vec!["Administrators", "Everyone"]);
//!
//! list.delete(0)?;
//! assert!(list[0] == ("Administrators", "F", "Deny"));
//! # Ok::<(), dacl::Error>(())
//! ```
//!
//! # Native lists
//!
//! [`Acl::to_native`] resolves every trustee through a [`TrusteeResolver`] and writes the entries
//! into a [`NativeAcl`]. An `Acl` built from a native list writes its new entries back into that
//! same list. Resolution happens only here, so an unknown trustee fails with
//! [`Error::AccountNotFound`] at conversion, never while building entries.
//!
//! ```rust
//! # use dacl::{acl, AccountTable, NativeAcl};
//! let list = acl(vec![("Everyone", "R", "Allow"), ("Administrators", "F", "Deny")])?;
//! let native = list.to_native(&AccountTable::well_known())?.unwrap();
//!
//! assert_eq!(native.borrow().ace_count(), 2);
//! assert!(native.borrow().get_ace(0)?.is_denied());
//! # Ok::<(), dacl::Error>(())
//! ```
//!
//! # Presets
//!
//! [`Acl::public`] grants full control to everyone, [`Acl::private`] grants it to the current
//! user only.

pub mod ace;
pub mod acl;
pub mod error;
pub mod native;
pub mod rights;
pub mod trustee;

pub use crate::ace::{ace, ace_with, AccessType, Ace, AceSource, RawAccess, RawAce};
pub use crate::acl::{acl, Acl, AclSource};
pub use crate::error::{Error, Result};
pub use crate::native::{NativeAce, NativeAcl, NativeAclBuf, NativeHandle};
pub use crate::rights::{Rights, RightsRegistry, FULL_CONTROL};
pub use crate::trustee::{
    Account, AccountTable, SystemSession, SessionIdentity, Sid, Trustee, TrusteeResolver,
};
