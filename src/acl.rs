//! The access control list container.
//!
//! An `Acl` keeps two orders apart. Indexed access (`get`, `set`, `delete`, `acl[i]`) works on
//! the order entries were added in. Iteration, serialization and conversion to the native form
//! use the canonical order: every deny entry before every allow entry, otherwise stable.

use log::{trace, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use crate::ace::{ace, AccessType, Ace, AceSource};
use crate::error::{Error, Result};
use crate::native::{NativeAcl, NativeAce, NativeAclBuf, NativeHandle};
use crate::rights::FULL_CONTROL;
use crate::trustee::{SystemSession, SessionIdentity, Trustee, TrusteeResolver};


// AclSource //////////////////////////////////////////////////////////////////////////////////////


/// Everything [`acl`] accepts, tried in this order.
pub enum AclSource<'a, N = NativeAclBuf> {
    /// Nothing: an empty list with no native counterpart.
    Empty,
    /// An existing list, handed back unchanged.
    Acl(Acl<N>),
    /// A native list to wrap; its entries are read at construction.
    Native(NativeHandle<N>),
    /// Entries to normalize, drained once.
    Entries(Box<dyn Iterator<Item = AceSource> + 'a>),
} // enum AclSource

impl<'a, N> AclSource<'a, N> {

    /// Boxes any iterable of entries, lazy ones included.
    pub fn entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: 'a,
        S: Into<AceSource> + 'a,
    {
        AclSource::Entries(Box::new(entries.into_iter().map(Into::into)))
    } // entries

    /// Reads `null` or an array of `[trustee, rights, access type]` triples.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null         => Ok(AclSource::Empty),
            Value::Array(items) => {
                let entries = items.iter()
                    .map(AceSource::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(AclSource::Entries(Box::new(entries.into_iter())))
            }, // Array
            other               => {
                warn!("invalid acl source: {}", other);
                Err(Error::InvalidAclSource(other.to_string()))
            }, // other
        } // match
    } // from_value

} // impl AclSource

impl<'a, N> From<Acl<N>> for AclSource<'a, N> {
    fn from(acl: Acl<N>) -> Self {
        AclSource::Acl(acl)
    } // from
} // impl From<Acl<N>> for AclSource

impl<'a, N> From<NativeHandle<N>> for AclSource<'a, N> {
    fn from(handle: NativeHandle<N>) -> Self {
        AclSource::Native(handle)
    } // from
} // impl From<NativeHandle<N>> for AclSource

impl<'a, N, S> From<Vec<S>> for AclSource<'a, N>
where
    S: Into<AceSource> + 'a,
{
    fn from(entries: Vec<S>) -> Self {
        AclSource::entries(entries)
    } // from
} // impl From<Vec<S>> for AclSource

impl<'a, N, S, const K: usize> From<[S; K]> for AclSource<'a, N>
where
    S: Into<AceSource> + 'a,
{
    fn from(entries: [S; K]) -> Self {
        AclSource::entries(entries)
    } // from
} // impl From<[S; K]> for AclSource

impl<'a, N> fmt::Debug for AclSource<'a, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AclSource::Empty      => f.write_str("Empty"),
            AclSource::Acl(acl)   => f.debug_tuple("Acl").field(&acl.entries).finish(),
            AclSource::Native(_)  => f.write_str("Native"),
            AclSource::Entries(_) => f.write_str("Entries"),
        } // match
    } // fmt
} // impl fmt::Debug for AclSource


// Acl ////////////////////////////////////////////////////////////////////////////////////////////


/// Ordered, mutable list of access control entries, optionally wrapping a native list.
pub struct Acl<N = NativeAclBuf> {
    entries: Vec<Ace>,
    native:  Option<NativeHandle<N>>,
} // struct Acl

impl Acl<NativeAclBuf> {

    /// A single entry granting full control to everyone.
    pub fn public() -> Self {
        trace!("creating public acl");
        Acl{
            entries: vec![Ace::new(Trustee::everyone(), FULL_CONTROL, AccessType::Allow)],
            native:  None,
        } // Acl
    } // public

    /// A single entry granting full control to the user `session` reports. The session is asked
    /// anew on every call.
    pub fn private<S: SessionIdentity + ?Sized>(session: &S) -> Result<Self> {
        let me = session.current_user()?;

        trace!("creating private acl for {}", me);
        Ok(Acl{entries: vec![Ace::new(me, FULL_CONTROL, AccessType::Allow)], native: None})
    } // private

    /// `private` for the user the process runs as.
    #[inline]
    pub fn private_current() -> Result<Self> {
        Acl::private(&SystemSession)
    } // private_current

    /// Parses a JSON document, see [`AclSource::from_value`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            warn!("unparsable acl document: {}", e);
            Error::InvalidAclSource(e.to_string())
        })?;

        Acl::from_source(AclSource::<NativeAclBuf>::from_value(value)?)
    } // from_json

} // impl Acl<NativeAclBuf>

impl<N> Acl<N> {

    /// Creates an empty list with no native counterpart.
    pub fn new() -> Self {
        trace!("creating new acl");
        Acl{entries: Vec::new(), native: None}
    } // new

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    } // len

    /// True without entries, whether or not a native list is wrapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    } // is_empty

    /// Entries in insertion order.
    #[inline]
    pub fn entries(&self) -> &[Ace] {
        &self.entries
    } // entries

    /// The wrapped native list, if this one was built from one.
    #[inline]
    pub fn native(&self) -> Option<&NativeHandle<N>> {
        self.native.as_ref()
    } // native

    fn out_of_range(&self, index: usize) -> Error {
        warn!("index {} out of range for acl of length {}", index, self.entries.len());
        Error::IndexOutOfRange{index, len: self.entries.len()}
    } // out_of_range

    /// Returns the entry at `index` in insertion order.
    pub fn get(&self, index: usize) -> Result<&Ace> {
        self.entries.get(index).ok_or_else(|| self.out_of_range(index))
    } // get

    /// Replaces the entry at `index` in insertion order and returns the old one.
    pub fn set<S: Into<AceSource>>(&mut self, index: usize, value: S) -> Result<Ace> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        } // if
        let entry = ace(value)?;

        trace!("replacing entry {} with {}", index, entry);
        Ok(std::mem::replace(&mut self.entries[index], entry))
    } // set

    /// Removes and returns the entry at `index` in insertion order.
    pub fn delete(&mut self, index: usize) -> Result<Ace> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        } // if
        trace!("deleting entry {}", index);
        Ok(self.entries.remove(index))
    } // delete

    /// Normalizes `value` and adds it after the last entry.
    pub fn append<S: Into<AceSource>>(&mut self, value: S) -> Result<()> {
        let entry = ace(value)?;

        trace!("appending entry {}", entry);
        self.entries.push(entry);
        Ok(())
    } // append

    /// Appends every entry of `values`. Stops at the first entry that fails to normalize; the
    /// entries before it stay appended.
    pub fn extend<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<AceSource>,
    {
        for value in values {
            self.append(value)?;
        } // for
        Ok(())
    } // extend

    /// True if `value` normalizes to an entry of this list, in whatever position.
    pub fn contains<S: Into<AceSource>>(&self, value: S) -> Result<bool> {
        let entry = ace(value)?;

        Ok(self.entries.contains(&entry))
    } // contains

    /// Entries in canonical order: deny before allow, insertion order otherwise.
    pub fn produce_sequence(&self) -> Vec<&Ace> {
        let mut sequence: Vec<&Ace> = self.entries.iter().collect();

        sequence.sort_by_key(|entry| entry.access_type().canonical_rank());
        sequence
    } // produce_sequence

    /// Iterates in canonical order.
    #[inline]
    pub fn iter(&self) -> std::vec::IntoIter<&Ace> {
        self.produce_sequence().into_iter()
    } // iter

    /// Canonical entries as a JSON array of `[trustee, mask, access type]`.
    pub fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Ace::to_value).collect())
    } // to_value

} // impl Acl<N>

impl<N: NativeAcl + Default> Acl<N> {

    /// Builds a list from `source`, see [`AclSource`].
    pub fn from_source<'a, S: Into<AclSource<'a, N>>>(source: S) -> Result<Self> {
        match source.into() {
            AclSource::Acl(acl)        => Ok(acl),
            AclSource::Empty           => Ok(Acl::new()),
            AclSource::Native(handle)  => Acl::wrap(handle),
            AclSource::Entries(values) => {
                trace!("creating acl from entries");
                let entries = values.map(ace).collect::<Result<Vec<_>>>()?;
                Ok(Acl{entries, native: None})
            }, // Entries
        } // match
    } // from_source

    fn wrap(handle: NativeHandle<N>) -> Result<Self> {
        let entries = {
            let native = handle.try_borrow().map_err(|_| Error::NativeHandleBusy)?;

            trace!("wrapping native acl with {} entries", native.ace_count());
            (0..native.ace_count())
                .map(|i| native.get_ace(i).and_then(ace))
                .collect::<Result<Vec<_>>>()?
        }; // entries

        Ok(Acl{entries, native: Some(handle)})
    } // wrap

    /// Renders the native form, resolving every trustee through `resolver`.
    ///
    /// Returns `None` for an empty list that wraps nothing. A wrapped native list is updated in
    /// place and returned: entries it already holds are left alone, missing deny entries go in
    /// front of its first allow entry, missing allow entries go at its end. Otherwise a new
    /// native list is filled in canonical order.
    ///
    /// The merge only ever adds to a wrapped native list. An entry read from it and later
    /// removed with `delete`, or replaced with `set`, stays in the native list. An entry whose
    /// native form is already there is skipped, so a duplicate appended to this list is written
    /// at most once. Build a fresh list with [`acl`] from the entries to drop native entries.
    pub fn to_native<R: TrusteeResolver + ?Sized>(&self, resolver: &R) -> Result<Option<NativeHandle<N>>> {
        let handle = match &self.native {
            Some(handle)                    => Rc::clone(handle),
            None if self.entries.is_empty() => return Ok(None),
            None                            => {
                let mut native = N::default();

                trace!("converting {} entries into a new native acl", self.entries.len());
                for entry in self.iter() {
                    native.add_ace(entry.to_native(resolver)?)?;
                } // for
                return Ok(Some(Rc::new(RefCell::new(native))));
            }, // None
        }; // match

        {
            let mut native = handle.try_borrow_mut().map_err(|_| Error::NativeHandleBusy)?;
            let mut present = (0..native.ace_count())
                .map(|i| native.get_ace(i))
                .collect::<Result<Vec<NativeAce>>>()?;

            trace!("merging {} entries into native acl of {}", self.entries.len(), present.len());
            for entry in self.iter() {
                let converted = entry.to_native(resolver)?;

                if present.contains(&converted) {
                    continue;
                } // if
                if entry.is_denied() {
                    let index = present.iter().position(|a| !a.is_denied()).unwrap_or(present.len());

                    native.insert_ace(index, converted.clone())?;
                    present.insert(index, converted);
                } else {
                    native.add_ace(converted.clone())?;
                    present.push(converted);
                } // else
            } // for
        }
        Ok(Some(handle))
    } // to_native

} // impl Acl<N: NativeAcl + Default>

impl<N> Default for Acl<N> {
    fn default() -> Self {
        Acl::new()
    } // default
} // impl Default for Acl

impl<N> Index<usize> for Acl<N> {
    type Output = Ace;

    /// Insertion order. Panics if `index` is out of range.
    fn index(&self, index: usize) -> &Ace {
        &self.entries[index]
    } // index
} // impl Index<usize> for Acl

impl<'a, N> IntoIterator for &'a Acl<N> {
    type Item = &'a Ace;
    type IntoIter = std::vec::IntoIter<&'a Ace>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    } // into_iter
} // impl IntoIterator for &Acl

impl<N> fmt::Debug for Acl<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acl")
            .field("entries", &self.entries)
            .field("native", &self.native.is_some())
            .finish()
    } // fmt
} // impl fmt::Debug for Acl


// Factory ////////////////////////////////////////////////////////////////////////////////////////


/// Builds an `Acl` over the in-memory native list from any [`AclSource`].
#[inline]
pub fn acl<'a, S: Into<AclSource<'a>>>(source: S) -> Result<Acl> {
    Acl::from_source(source)
} // acl


// Tests //////////////////////////////////////////////////////////////////////////////////////////


// mod tests
