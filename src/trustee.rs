//! Trustees and the collaborators that resolve them.
//!
//! An `Ace` keeps its trustee exactly as given. Only when an `Acl` is converted to its native
//! form is a `TrusteeResolver` asked to turn the trustee into an `Account`, that is a canonical
//! name paired with a security identifier.

use log::{trace, warn};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};


// Sid ////////////////////////////////////////////////////////////////////////////////////////////


/// Security identifier in its string form, e.g. `S-1-5-32-544`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sid(String);

impl Sid {

    pub const EVERYONE:                &'static str = "S-1-1-0";
    pub const CREATOR_OWNER:           &'static str = "S-1-3-0";
    pub const AUTHENTICATED_USERS:     &'static str = "S-1-5-11";
    pub const LOCAL_SYSTEM:            &'static str = "S-1-5-18";
    pub const BUILTIN_ADMINISTRATORS:  &'static str = "S-1-5-32-544";
    pub const BUILTIN_USERS:           &'static str = "S-1-5-32-545";
    pub const BUILTIN_GUESTS:          &'static str = "S-1-5-32-546";

    /// Parses `S-1-<authority>(-<subauthority>)*`. Returns an error if the revision is not 1 or
    /// any component is not a number.
    pub fn parse(s: &str) -> Result<Sid> {
        let mut parts = s.split('-');
        let valid = parts.next().map_or(false, |p| p.eq_ignore_ascii_case("S"))
            && parts.next() == Some("1")
            && parts.next().map_or(false, |p| p.parse::<u64>().is_ok())
            && parts.all(|p| p.parse::<u32>().is_ok());

        if !valid {
            warn!("rejecting malformed sid: {}", s);
            return Err(Error::InvalidSid(String::from(s)));
        } // if
        Ok(Sid(s.to_uppercase()))
    } // parse

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    } // as_str

    pub fn everyone() -> Sid {
        Sid(String::from(Sid::EVERYONE))
    } // everyone

} // impl Sid

impl FromStr for Sid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Sid> {
        Sid::parse(s)
    } // from_str
} // impl FromStr for Sid

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    } // fmt
} // impl fmt::Display for Sid


// Account ////////////////////////////////////////////////////////////////////////////////////////


/// A resolved identity: canonical account name and its security identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Account {
    pub name: String,
    pub sid:  Sid,
} // struct Account

impl Account {

    pub fn new(name: &str, sid: Sid) -> Self {
        Account{name: String::from(name), sid}
    } // new

} // impl Account


// Trustee ////////////////////////////////////////////////////////////////////////////////////////


/// The identity an entry applies to. Kept opaque: equality is structural, so a name and the
/// sid it resolves to are different trustees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Trustee {
    Name(String),
    Account(Account),
    Sid(Sid),
} // enum Trustee

impl Trustee {

    pub fn everyone() -> Trustee {
        Trustee::Name(String::from("Everyone"))
    } // everyone

} // impl Trustee

impl From<&str> for Trustee {
    fn from(name: &str) -> Self {
        Trustee::Name(String::from(name))
    } // from
} // impl From<&str> for Trustee

impl From<String> for Trustee {
    fn from(name: String) -> Self {
        Trustee::Name(name)
    } // from
} // impl From<String> for Trustee

impl From<Sid> for Trustee {
    fn from(sid: Sid) -> Self {
        Trustee::Sid(sid)
    } // from
} // impl From<Sid> for Trustee

impl From<Account> for Trustee {
    fn from(account: Account) -> Self {
        Trustee::Account(account)
    } // from
} // impl From<Account> for Trustee

impl fmt::Display for Trustee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Trustee::Name(name)       => f.write_str(name),
            Trustee::Account(account) => f.write_str(&account.name),
            Trustee::Sid(sid)         => write!(f, "{}", sid),
        } // match
    } // fmt
} // impl fmt::Display for Trustee

impl Serialize for Trustee {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    } // serialize
} // impl Serialize for Trustee


// Resolution /////////////////////////////////////////////////////////////////////////////////////


/// Resolves a trustee to an account.
pub trait TrusteeResolver {
    fn resolve(&self, trustee: &Trustee) -> Result<Account>;
} // trait TrusteeResolver

/// In-memory account table. Names are matched case-insensitively and a `DOMAIN\` prefix is
/// ignored when the qualified name itself is unknown.
#[derive(Clone, Debug, Default)]
pub struct AccountTable {
    by_name: BTreeMap<String, Account>,
    by_sid:  BTreeMap<Sid, Account>,
} // struct AccountTable

impl AccountTable {

    pub fn new() -> Self {
        AccountTable::default()
    } // new

    /// Creates a table holding the well-known local accounts and groups.
    pub fn well_known() -> Self {
        let mut table = AccountTable::new();

        for (name, sid) in &[
            ("Everyone",            Sid::EVERYONE),
            ("CREATOR OWNER",       Sid::CREATOR_OWNER),
            ("Authenticated Users", Sid::AUTHENTICATED_USERS),
            ("SYSTEM",              Sid::LOCAL_SYSTEM),
            ("Administrators",      Sid::BUILTIN_ADMINISTRATORS),
            ("Users",               Sid::BUILTIN_USERS),
            ("Guests",              Sid::BUILTIN_GUESTS),
        ] {
            table.insert(Account::new(name, Sid(String::from(*sid))));
        } // for
        table
    } // well_known

    /// Registers an account. A later account with the same name or sid replaces the earlier.
    pub fn insert(&mut self, account: Account) {
        trace!("registering account {} as {}", account.name, account.sid);
        self.by_name.insert(account.name.to_lowercase(), account.clone());
        self.by_sid.insert(account.sid.clone(), account);
    } // insert

    fn by_name(&self, name: &str) -> Option<&Account> {
        let key = name.to_lowercase();

        self.by_name.get(&key).or_else(|| {
            key.rsplit_once('\\').and_then(|(_, short)| self.by_name.get(short))
        })
    } // by_name

} // impl AccountTable

impl TrusteeResolver for AccountTable {

    fn resolve(&self, trustee: &Trustee) -> Result<Account> {
        trace!("resolving trustee {}", trustee);
        let found = match trustee {
            Trustee::Account(account) => return Ok(account.clone()),
            Trustee::Sid(sid)         => Some(
                self.by_sid.get(sid).cloned()
                    .unwrap_or_else(|| Account::new(sid.as_str(), sid.clone()))
            ),
            Trustee::Name(name)       => self.by_name(name).cloned(),
        }; // match

        found.ok_or_else(|| {
            warn!("account not found: {}", trustee);
            Error::AccountNotFound(trustee.to_string())
        })
    } // resolve

} // impl TrusteeResolver for AccountTable


// Session identity ///////////////////////////////////////////////////////////////////////////////


/// Supplies the identity of the user the process runs as.
pub trait SessionIdentity {
    fn current_user(&self) -> Result<Trustee>;
} // trait SessionIdentity

/// Asks the operating system for the user the process runs as, on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemSession;

impl SessionIdentity for SystemSession {

    fn current_user(&self) -> Result<Trustee> {
        let user = whoami::username();

        if user.is_empty() {
            warn!("the session reports no user name");
            return Err(Error::AccountNotFound(String::from("current user")));
        } // if
        trace!("current session user is {}", user);
        Ok(Trustee::Name(user))
    } // current_user

} // impl SessionIdentity for SystemSession


// Tests //////////////////////////////////////////////////////////////////////////////////////////


#[cfg(test)]
mod tests {

    use super::*;
    use test_env_log::test;

    #[test]
    fn sid_parse() {
        assert_eq!(Sid::parse("S-1-5-32-544").unwrap().as_str(), "S-1-5-32-544");
        assert_eq!(Sid::parse("s-1-1-0").unwrap(), Sid::everyone());
        assert_eq!(Sid::parse("S-2-1-0"), Err(Error::InvalidSid(String::from("S-2-1-0"))));
        assert!(Sid::parse("S-1").is_err());
        assert!(Sid::parse("S-1-5-x").is_err());
        assert!(Sid::parse("Everyone").is_err());
    } // sid_parse

    #[test]
    fn resolve_names() {
        let table = AccountTable::well_known();

        let account = table.resolve(&Trustee::from("everyone")).unwrap();
        assert_eq!(account.name, "Everyone");
        assert_eq!(account.sid, Sid::everyone());

        let account = table.resolve(&Trustee::from("BUILTIN\\Administrators")).unwrap();
        assert_eq!(account.sid.as_str(), Sid::BUILTIN_ADMINISTRATORS);
    } // resolve_names

    #[test]
    fn resolve_sids_and_accounts() {
        let table = AccountTable::well_known();

        let account = table.resolve(&Trustee::from(Sid::parse("S-1-5-18").unwrap())).unwrap();
        assert_eq!(account.name, "SYSTEM");

        let unknown = Sid::parse("S-1-5-21-1-2-3-1001").unwrap();
        let account = table.resolve(&Trustee::from(unknown.clone())).unwrap();
        assert_eq!(account, Account::new("S-1-5-21-1-2-3-1001", unknown.clone()));

        let given = Account::new("HOST\\alice", unknown);
        assert_eq!(table.resolve(&Trustee::from(given.clone())), Ok(given));
    } // resolve_sids_and_accounts

    #[test]
    fn account_not_found() {
        let table = AccountTable::well_known();

        assert_eq!(
            table.resolve(&Trustee::from("nobody")),
            Err(Error::AccountNotFound(String::from("nobody")))
        );
    } // account_not_found

    #[test]
    fn system_session() {
        let me = SystemSession.current_user().unwrap();

        assert_eq!(me, Trustee::from(whoami::username()));
        assert_eq!(SystemSession.current_user().unwrap(), me);
    } // system_session

    #[test]
    fn registered_account() {
        let mut table = AccountTable::new();
        let sid = Sid::parse("S-1-5-21-1-2-3-1001").unwrap();

        table.insert(Account::new("HOST\\alice", sid.clone()));
        assert_eq!(table.resolve(&Trustee::from("host\\ALICE")).unwrap().sid, sid);
        assert!(table.resolve(&Trustee::from("alice")).is_err());
    } // registered_account

} // mod tests
