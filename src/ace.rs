//! Access control entries and their normalization.
//!
//! Every entry entering an `Acl` goes through [`ace`] (or [`ace_with`] for a custom
//! [`RightsRegistry`]). Normalization turns the rights into a mask and the access type into an
//! [`AccessType`]. The trustee is kept verbatim; resolving it is left to `Acl::to_native`.

use log::{trace, warn};
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::native::{ace_type, NativeAce};
use crate::rights::{Rights, RightsRegistry};
use crate::trustee::{Trustee, TrusteeResolver};


// AccessType /////////////////////////////////////////////////////////////////////////////////////


/// Allow or deny the rights of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccessType {
    Allow,
    Deny
} // enum AccessType

impl AccessType {

    /// Sort key of the canonical order: deny entries come first.
    #[inline]
    pub fn canonical_rank(self) -> u8 {
        match self {
            AccessType::Deny  => 0,
            AccessType::Allow => 1,
        } // match
    } // canonical_rank

    /// Maps a native ace type onto allow or deny. Audit and alarm types have no counterpart.
    pub fn from_native(code: u8) -> Result<AccessType> {
        match code {
            ace_type::ACCESS_ALLOWED
            | ace_type::ACCESS_ALLOWED_COMPOUND
            | ace_type::ACCESS_ALLOWED_OBJECT
            | ace_type::ACCESS_ALLOWED_CALLBACK
            | ace_type::ACCESS_ALLOWED_CALLBACK_OBJECT => Ok(AccessType::Allow),
            ace_type::ACCESS_DENIED
            | ace_type::ACCESS_DENIED_OBJECT
            | ace_type::ACCESS_DENIED_CALLBACK
            | ace_type::ACCESS_DENIED_CALLBACK_OBJECT  => Ok(AccessType::Deny),
            other => {
                warn!("unsupported native ace type: {:#04x}", other);
                Err(Error::UnsupportedAceType(other))
            }, // other
        } // match
    } // from_native

    #[inline]
    pub fn native_type(self) -> u8 {
        match self {
            AccessType::Allow => ace_type::ACCESS_ALLOWED,
            AccessType::Deny  => ace_type::ACCESS_DENIED,
        } // match
    } // native_type

} // impl AccessType

impl FromStr for AccessType {
    type Err = Error;

    /// Accepts `allow` and `deny` in any casing.
    fn from_str(s: &str) -> Result<AccessType> {
        if s.eq_ignore_ascii_case("allow") {
            Ok(AccessType::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Ok(AccessType::Deny)
        } else {
            warn!("invalid access type: {}", s);
            Err(Error::InvalidAccessType(String::from(s)))
        } // else
    } // from_str
} // impl FromStr for AccessType

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccessType::Allow => f.write_str("Allow"),
            AccessType::Deny  => f.write_str("Deny"),
        } // match
    } // fmt
} // impl fmt::Display for AccessType


// Sources ////////////////////////////////////////////////////////////////////////////////////////


/// Unnormalized access type: already typed or a token still to be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawAccess {
    Type(AccessType),
    Token(String),
} // enum RawAccess

impl From<AccessType> for RawAccess {
    fn from(access: AccessType) -> Self {
        RawAccess::Type(access)
    } // from
} // impl From<AccessType> for RawAccess

impl From<&str> for RawAccess {
    fn from(token: &str) -> Self {
        RawAccess::Token(String::from(token))
    } // from
} // impl From<&str> for RawAccess

impl From<String> for RawAccess {
    fn from(token: String) -> Self {
        RawAccess::Token(token)
    } // from
} // impl From<String> for RawAccess

/// A `(trustee, rights, access type)` triple before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAce {
    pub trustee: Trustee,
    pub rights:  Rights,
    pub access:  RawAccess,
} // struct RawAce

impl TryFrom<NativeAce> for RawAce {
    type Error = Error;

    /// Fails with `UnsupportedAceType` for audit and alarm entries.
    fn try_from(native: NativeAce) -> Result<Self> {
        Ok(RawAce{
            trustee: Trustee::Sid(native.sid),
            rights:  Rights::Mask(native.mask),
            access:  RawAccess::Type(AccessType::from_native(native.ace_type)?),
        }) // RawAce
    } // try_from
} // impl TryFrom<NativeAce> for RawAce

/// Everything [`ace`] accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum AceSource {
    Raw(RawAce),
    Ace(Ace),
    Native(NativeAce),
} // enum AceSource

impl AceSource {

    /// Reads a `[trustee, rights, access type]` JSON array. Rights may be a name or a mask.
    pub fn from_value(value: &Value) -> Result<AceSource> {
        let invalid = || {
            warn!("invalid ace source: {}", value);
            Error::InvalidAceSource(value.to_string())
        };
        let items = match value {
            Value::Array(items) if items.len() == 3 => items,
            _                                        => return Err(invalid()),
        }; // match
        let trustee = items[0].as_str().ok_or_else(invalid)?;
        let rights  = match &items[1] {
            Value::String(symbol) => Rights::from(symbol.as_str()),
            Value::Number(number) => number.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Rights::Mask)
                .ok_or_else(invalid)?,
            _                     => return Err(invalid()),
        }; // match
        let access = items[2].as_str().ok_or_else(invalid)?;

        Ok(AceSource::from((trustee, rights, access)))
    } // from_value

} // impl AceSource

impl From<Ace> for AceSource {
    fn from(ace: Ace) -> Self {
        AceSource::Ace(ace)
    } // from
} // impl From<Ace> for AceSource

impl From<&Ace> for AceSource {
    fn from(ace: &Ace) -> Self {
        AceSource::Ace(ace.clone())
    } // from
} // impl From<&Ace> for AceSource

impl From<NativeAce> for AceSource {
    fn from(native: NativeAce) -> Self {
        AceSource::Native(native)
    } // from
} // impl From<NativeAce> for AceSource

impl From<RawAce> for AceSource {
    fn from(raw: RawAce) -> Self {
        AceSource::Raw(raw)
    } // from
} // impl From<RawAce> for AceSource

impl<T, R, A> From<(T, R, A)> for AceSource
where
    T: Into<Trustee>,
    R: Into<Rights>,
    A: Into<RawAccess>,
{
    fn from((trustee, rights, access): (T, R, A)) -> Self {
        AceSource::Raw(RawAce{trustee: trustee.into(), rights: rights.into(), access: access.into()})
    } // from
} // impl From<(T, R, A)> for AceSource


// Ace ////////////////////////////////////////////////////////////////////////////////////////////


/// A normalized access control entry. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ace {
    trustee:     Trustee,
    rights:      u32,
    access_type: AccessType,
} // struct Ace

impl Ace {

    /// Builds an entry from already normalized parts.
    pub fn new<T: Into<Trustee>>(trustee: T, rights: u32, access_type: AccessType) -> Self {
        Ace{trustee: trustee.into(), rights, access_type}
    } // new

    #[inline]
    pub fn trustee(&self) -> &Trustee {
        &self.trustee
    } // trustee

    #[inline]
    pub fn rights(&self) -> u32 {
        self.rights
    } // rights

    #[inline]
    pub fn access_type(&self) -> AccessType {
        self.access_type
    } // access_type

    #[inline]
    pub fn is_denied(&self) -> bool {
        self.access_type == AccessType::Deny
    } // is_denied

    /// Compares with anything `ace` accepts by normalizing it first. Input that fails to
    /// normalize never matches.
    pub fn matches<S: Into<AceSource>>(&self, other: S) -> bool {
        match ace(other) {
            Ok(other) => *self == other,
            Err(_)    => false,
        } // match
    } // matches

    /// Renders the entry as a `[trustee, mask, access type]` JSON array, the same shape it
    /// serializes to.
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.trustee.to_string()),
            Value::from(self.rights),
            Value::String(self.access_type.to_string()),
        ])
    } // to_value

    /// Resolves the trustee and renders the native form of this entry.
    pub fn to_native<R: TrusteeResolver + ?Sized>(&self, resolver: &R) -> Result<NativeAce> {
        let account = resolver.resolve(&self.trustee)?;

        Ok(NativeAce{
            ace_type: self.access_type.native_type(),
            flags:    0,
            mask:     self.rights,
            sid:      account.sid,
        }) // NativeAce
    } // to_native

} // impl Ace

impl<T, R, A> PartialEq<(T, R, A)> for Ace
where
    T: Into<Trustee> + Clone,
    R: Into<Rights> + Clone,
    A: Into<RawAccess> + Clone,
{
    fn eq(&self, other: &(T, R, A)) -> bool {
        self.matches(other.clone())
    } // eq
} // impl PartialEq<(T, R, A)> for Ace

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, ", self.trustee)?;
        match RightsRegistry::global().name_from_value(self.rights) {
            Some(name) => f.write_str(name)?,
            None       => write!(f, "{:#010x}", self.rights)?,
        } // match
        write!(f, ", {})", self.access_type)
    } // fmt
} // impl fmt::Display for Ace

impl Serialize for Ace {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;

        tuple.serialize_element(&self.trustee)?;
        tuple.serialize_element(&self.rights)?;
        tuple.serialize_element(&self.access_type)?;
        tuple.end()
    } // serialize
} // impl Serialize for Ace


// Factory ////////////////////////////////////////////////////////////////////////////////////////


/// Normalizes `source` against the process-wide standard rights registry.
#[inline]
pub fn ace<S: Into<AceSource>>(source: S) -> Result<Ace> {
    ace_with(source, RightsRegistry::global())
} // ace

/// Normalizes `source` against `registry`. An `Ace` is returned as it is.
pub fn ace_with<S: Into<AceSource>>(source: S, registry: &RightsRegistry) -> Result<Ace> {
    let raw = match source.into() {
        AceSource::Ace(ace)       => return Ok(ace),
        AceSource::Native(native) => RawAce::try_from(native)?,
        AceSource::Raw(raw)       => raw,
    }; // match

    trace!("normalizing ace for {} with {} rights", raw.trustee, raw.rights);
    let rights = registry.lookup(&raw.rights)?;
    let access_type = match raw.access {
        RawAccess::Type(access)  => access,
        RawAccess::Token(token)  => token.parse()?,
    }; // match

    Ok(Ace{trustee: raw.trustee, rights, access_type})
} // ace_with


// Tests //////////////////////////////////////////////////////////////////////////////////////////


// mod tests
