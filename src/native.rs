//! The boundary to an operating system's own ACL structure.
//!
//! The crate never interprets a native ACL beyond the `NativeAcl` capability: count entries,
//! read an entry, and add one. `NativeAclBuf` is an in-memory structure with that capability,
//! used as the default target of `Acl::to_native`.

use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::trustee::Sid;


/// Native ACE type codes.
pub mod ace_type {
    pub const ACCESS_ALLOWED:                 u8 = 0x00;
    pub const ACCESS_DENIED:                  u8 = 0x01;
    pub const SYSTEM_AUDIT:                   u8 = 0x02;
    pub const SYSTEM_ALARM:                   u8 = 0x03;
    pub const ACCESS_ALLOWED_COMPOUND:        u8 = 0x04;
    pub const ACCESS_ALLOWED_OBJECT:          u8 = 0x05;
    pub const ACCESS_DENIED_OBJECT:           u8 = 0x06;
    pub const SYSTEM_AUDIT_OBJECT:            u8 = 0x07;
    pub const SYSTEM_ALARM_OBJECT:            u8 = 0x08;
    pub const ACCESS_ALLOWED_CALLBACK:        u8 = 0x09;
    pub const ACCESS_DENIED_CALLBACK:         u8 = 0x0A;
    pub const ACCESS_ALLOWED_CALLBACK_OBJECT: u8 = 0x0B;
    pub const ACCESS_DENIED_CALLBACK_OBJECT:  u8 = 0x0C;
} // mod ace_type

/// ACL revision written by `NativeAclBuf::new`.
pub const ACL_REVISION: u8 = 2;

/// ACL revision supporting object ACEs.
pub const ACL_REVISION_DS: u8 = 4;

/// Shared handle to a native ACL. The wrapping `Acl` and the caller both hold it, so changes
/// made by `Acl::to_native` are visible through the caller's copy.
pub type NativeHandle<N> = Rc<RefCell<N>>;

/// One entry as the native structure stores it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeAce {
    pub ace_type: u8,
    pub flags:    u8,
    pub mask:     u32,
    pub sid:      Sid,
} // struct NativeAce

impl NativeAce {

    pub fn allowed(mask: u32, sid: Sid) -> Self {
        NativeAce{ace_type: ace_type::ACCESS_ALLOWED, flags: 0, mask, sid}
    } // allowed

    pub fn denied(mask: u32, sid: Sid) -> Self {
        NativeAce{ace_type: ace_type::ACCESS_DENIED, flags: 0, mask, sid}
    } // denied

    /// True for every type in the access-denied family.
    pub fn is_denied(&self) -> bool {
        matches!(
            self.ace_type,
            ace_type::ACCESS_DENIED
                | ace_type::ACCESS_DENIED_OBJECT
                | ace_type::ACCESS_DENIED_CALLBACK
                | ace_type::ACCESS_DENIED_CALLBACK_OBJECT
        )
    } // is_denied

} // impl NativeAce

/// What a native ACL must offer to be wrapped by, or produced from, an `Acl`.
pub trait NativeAcl {
    fn ace_count(&self) -> usize;

    /// Returns the entry at `index` in the structure's own order.
    fn get_ace(&self, index: usize) -> Result<NativeAce>;

    /// Appends an entry.
    fn add_ace(&mut self, ace: NativeAce) -> Result<()>;

    /// Inserts an entry before `index`; `index == ace_count()` appends.
    fn insert_ace(&mut self, index: usize, ace: NativeAce) -> Result<()>;
} // trait NativeAcl


// NativeAclBuf ///////////////////////////////////////////////////////////////////////////////////


/// In-memory native ACL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeAclBuf {
    revision: u8,
    aces:     Vec<NativeAce>,
} // struct NativeAclBuf

impl NativeAclBuf {

    pub fn new() -> Self {
        NativeAclBuf::with_revision(ACL_REVISION)
    } // new

    pub fn with_revision(revision: u8) -> Self {
        NativeAclBuf{revision, aces: Vec::new()}
    } // with_revision

    /// Wraps the buffer into a shared handle, ready to pass to `acl`.
    pub fn into_handle(self) -> NativeHandle<NativeAclBuf> {
        Rc::new(RefCell::new(self))
    } // into_handle

    #[inline]
    pub fn revision(&self) -> u8 {
        self.revision
    } // revision

    #[inline]
    pub fn aces(&self) -> &[NativeAce] {
        &self.aces
    } // aces

    /// True if no denied entry follows an allowed one.
    pub fn is_canonical(&self) -> bool {
        let first_allow = self.aces.iter().position(|a| !a.is_denied());

        match first_allow {
            None    => true,
            Some(i) => !self.aces[i..].iter().any(NativeAce::is_denied),
        } // match
    } // is_canonical

} // impl NativeAclBuf

impl Default for NativeAclBuf {
    fn default() -> Self {
        NativeAclBuf::new()
    } // default
} // impl Default for NativeAclBuf

impl NativeAcl for NativeAclBuf {

    #[inline]
    fn ace_count(&self) -> usize {
        self.aces.len()
    } // ace_count

    fn get_ace(&self, index: usize) -> Result<NativeAce> {
        self.aces.get(index).cloned().ok_or(Error::IndexOutOfRange{index, len: self.aces.len()})
    } // get_ace

    fn add_ace(&mut self, ace: NativeAce) -> Result<()> {
        trace!("native acl: appending {:?}", ace);
        self.aces.push(ace);
        Ok(())
    } // add_ace

    fn insert_ace(&mut self, index: usize, ace: NativeAce) -> Result<()> {
        if index > self.aces.len() {
            return Err(Error::IndexOutOfRange{index, len: self.aces.len()});
        } // if
        trace!("native acl: inserting {:?} at {}", ace, index);
        self.aces.insert(index, ace);
        Ok(())
    } // insert_ace

} // impl NativeAcl for NativeAclBuf


// Tests //////////////////////////////////////////////////////////////////////////////////////////


#[cfg(test)]
mod tests {

    use super::*;
    use test_env_log::test;

    #[test]
    fn buffer() {
        let mut buf = NativeAclBuf::new();

        assert_eq!(buf.revision(), ACL_REVISION);
        assert!(buf.add_ace(NativeAce::allowed(1, Sid::everyone())).is_ok());
        assert!(buf.insert_ace(0, NativeAce::denied(2, Sid::everyone())).is_ok());
        assert_eq!(buf.ace_count(), 2);
        assert_eq!(buf.get_ace(0), Ok(NativeAce::denied(2, Sid::everyone())));
        assert_eq!(buf.get_ace(2), Err(Error::IndexOutOfRange{index: 2, len: 2}));
        assert_eq!(
            buf.insert_ace(3, NativeAce::allowed(1, Sid::everyone())),
            Err(Error::IndexOutOfRange{index: 3, len: 2})
        );
    } // buffer

    #[test]
    fn canonical() {
        let mut buf = NativeAclBuf::with_revision(ACL_REVISION_DS);

        assert!(buf.is_canonical());
        buf.add_ace(NativeAce::denied(1, Sid::everyone())).unwrap();
        buf.add_ace(NativeAce::allowed(1, Sid::everyone())).unwrap();
        assert!(buf.is_canonical());
        buf.add_ace(NativeAce{ace_type: ace_type::ACCESS_DENIED_OBJECT, flags: 0, mask: 1, sid: Sid::everyone()}).unwrap();
        assert!(!buf.is_canonical());
    } // canonical

} // mod tests
