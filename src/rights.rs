//! Rights masks and the registry translating shorthand names into them.
//!
//! A `RightsRegistry` acts like a table of named constants. Names are stored upper-cased and
//! looked up case-insensitively, so `"r"`, `"R"` and `Rights::from("R")` all resolve to the
//! same mask. Numeric input passes straight through.
//!
//! The reverse lookups accept shell-style name patterns (`FILE_*`, `*_READ`), matched
//! case-insensitively against the whole name.

use glob::{MatchOptions, Pattern};
use log::{trace, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};


// Masks //////////////////////////////////////////////////////////////////////////////////////////


pub const GENERIC_READ:           u32 = 0x8000_0000;
pub const GENERIC_WRITE:          u32 = 0x4000_0000;
pub const GENERIC_EXECUTE:        u32 = 0x2000_0000;
pub const GENERIC_ALL:            u32 = 0x1000_0000;

pub const DELETE:                 u32 = 0x0001_0000;
pub const READ_CONTROL:           u32 = 0x0002_0000;
pub const WRITE_DAC:              u32 = 0x0004_0000;
pub const WRITE_OWNER:            u32 = 0x0008_0000;
pub const SYNCHRONIZE:            u32 = 0x0010_0000;
pub const ACCESS_SYSTEM_SECURITY: u32 = 0x0100_0000;
pub const MAXIMUM_ALLOWED:        u32 = 0x0200_0000;

pub const STANDARD_RIGHTS_READ:     u32 = READ_CONTROL;
pub const STANDARD_RIGHTS_WRITE:    u32 = READ_CONTROL;
pub const STANDARD_RIGHTS_REQUIRED: u32 = 0x000F_0000;

pub const FILE_READ_DATA:         u32 = 0x0001;
pub const FILE_WRITE_DATA:        u32 = 0x0002;
pub const FILE_APPEND_DATA:       u32 = 0x0004;
pub const FILE_READ_EA:           u32 = 0x0008;
pub const FILE_WRITE_EA:          u32 = 0x0010;
pub const FILE_EXECUTE:           u32 = 0x0020;
pub const FILE_DELETE_CHILD:      u32 = 0x0040;
pub const FILE_READ_ATTRIBUTES:   u32 = 0x0080;
pub const FILE_WRITE_ATTRIBUTES:  u32 = 0x0100;

pub const FILE_GENERIC_READ: u32 =
    READ_CONTROL | FILE_READ_DATA | FILE_READ_ATTRIBUTES | FILE_READ_EA | SYNCHRONIZE;
pub const FILE_GENERIC_WRITE: u32 =
    READ_CONTROL | FILE_WRITE_DATA | FILE_WRITE_ATTRIBUTES | FILE_WRITE_EA | FILE_APPEND_DATA | SYNCHRONIZE;
pub const FILE_GENERIC_EXECUTE: u32 =
    READ_CONTROL | FILE_READ_ATTRIBUTES | FILE_EXECUTE | SYNCHRONIZE;
pub const FILE_ALL_ACCESS: u32 = STANDARD_RIGHTS_REQUIRED | SYNCHRONIZE | 0x01FF;

/// Read, write, execute and delete: what the shell calls "modify".
pub const FILE_MODIFY: u32 = FILE_GENERIC_READ | FILE_GENERIC_WRITE | FILE_GENERIC_EXECUTE | DELETE;

/// Mask granted by the `public` and `private` presets.
pub const FULL_CONTROL: u32 = FILE_ALL_ACCESS;


// Rights /////////////////////////////////////////////////////////////////////////////////////////


/// Unnormalized rights as given by a caller: either a mask or a symbolic name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rights {
    Mask(u32),
    Symbol(String),
} // enum Rights

impl From<u32> for Rights {
    fn from(mask: u32) -> Self {
        Rights::Mask(mask)
    } // from
} // impl From<u32> for Rights

impl From<&str> for Rights {
    fn from(symbol: &str) -> Self {
        Rights::Symbol(String::from(symbol))
    } // from
} // impl From<&str> for Rights

impl From<String> for Rights {
    fn from(symbol: String) -> Self {
        Rights::Symbol(symbol)
    } // from
} // impl From<String> for Rights

impl fmt::Display for Rights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rights::Mask(mask)     => write!(f, "{:#010x}", mask),
            Rights::Symbol(symbol) => f.write_str(symbol),
        } // match
    } // fmt
} // impl fmt::Display for Rights


// Patterns ///////////////////////////////////////////////////////////////////////////////////////


const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive:              false,
    require_literal_separator:   false,
    require_literal_leading_dot: false,
};

fn compile(patterns: &[&str]) -> Result<Vec<Pattern>> {
    patterns.iter()
        .map(|pattern| Pattern::new(pattern).map_err(|err| {
            warn!("invalid name pattern {}: {}", pattern, err);
            Error::InvalidPattern(String::from(*pattern))
        }))
        .collect()
} // compile

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
} // matches_any

// The part of `name` standing in for the wildcards: what lies between the text before the first
// `*` and the text after the last one. A pattern without `*` keeps the name whole.
fn distinguished<'n>(pattern: &str, name: &'n str) -> &'n str {
    match (pattern.find('*'), pattern.rfind('*')) {
        (Some(first), Some(last)) => {
            let tail = pattern.len() - last - 1;
            if first + tail >= name.len() {
                return name;
            } // if
            name.get(first..name.len() - tail).unwrap_or(name)
        }, // Some
        _ => name,
    } // match
} // distinguished


// RightsRegistry /////////////////////////////////////////////////////////////////////////////////


/// Named rights masks. Deserializes from a JSON object such as `{"READ": 1, "ALL": 511}`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, u32>")]
pub struct RightsRegistry {
    names: BTreeMap<String, u32>,
} // struct RightsRegistry

impl RightsRegistry {

    /// Creates an empty registry.
    pub fn new() -> Self {
        RightsRegistry{names: BTreeMap::new()}
    } // new

    /// Creates a registry holding the generic, standard and file rights together with the
    /// shorthands `R`, `W`, `X`, `M` and `F`.
    pub fn standard() -> Self {
        let mut registry = RightsRegistry::new();

        for (name, mask) in &[
            ("GENERIC_READ",           GENERIC_READ),
            ("GENERIC_WRITE",          GENERIC_WRITE),
            ("GENERIC_EXECUTE",        GENERIC_EXECUTE),
            ("GENERIC_ALL",            GENERIC_ALL),
            ("DELETE",                 DELETE),
            ("READ_CONTROL",           READ_CONTROL),
            ("WRITE_DAC",              WRITE_DAC),
            ("WRITE_OWNER",            WRITE_OWNER),
            ("SYNCHRONIZE",            SYNCHRONIZE),
            ("ACCESS_SYSTEM_SECURITY", ACCESS_SYSTEM_SECURITY),
            ("MAXIMUM_ALLOWED",        MAXIMUM_ALLOWED),
            ("STANDARD_RIGHTS_READ",   STANDARD_RIGHTS_READ),
            ("STANDARD_RIGHTS_WRITE",  STANDARD_RIGHTS_WRITE),
            ("FILE_READ_DATA",         FILE_READ_DATA),
            ("FILE_WRITE_DATA",        FILE_WRITE_DATA),
            ("FILE_APPEND_DATA",       FILE_APPEND_DATA),
            ("FILE_READ_EA",           FILE_READ_EA),
            ("FILE_WRITE_EA",          FILE_WRITE_EA),
            ("FILE_EXECUTE",           FILE_EXECUTE),
            ("FILE_DELETE_CHILD",      FILE_DELETE_CHILD),
            ("FILE_READ_ATTRIBUTES",   FILE_READ_ATTRIBUTES),
            ("FILE_WRITE_ATTRIBUTES",  FILE_WRITE_ATTRIBUTES),
            ("FILE_GENERIC_READ",      FILE_GENERIC_READ),
            ("FILE_GENERIC_WRITE",     FILE_GENERIC_WRITE),
            ("FILE_GENERIC_EXECUTE",   FILE_GENERIC_EXECUTE),
            ("FILE_ALL_ACCESS",        FILE_ALL_ACCESS),
            ("R",                      FILE_GENERIC_READ),
            ("W",                      FILE_GENERIC_WRITE),
            ("X",                      FILE_GENERIC_EXECUTE),
            ("M",                      FILE_MODIFY),
            ("F",                      FULL_CONTROL),
        ] {
            registry.insert(name, *mask);
        } // for
        registry
    } // standard

    /// Builds a registry from the names of `source` matching `pattern`, leaving out `excluded`.
    /// Each name is shortened to the part matched by the wildcards, so `FILE_GENERIC_*` yields
    /// `READ`, `WRITE` and `EXECUTE`.
    pub fn from_pattern(pattern: &str, excluded: &[&str], source: &RightsRegistry) -> Result<Self> {
        let compiled = compile(&[pattern])?;
        let excluded: Vec<String> = excluded.iter().map(|name| name.to_uppercase()).collect();
        let mut registry = RightsRegistry::new();

        for (name, mask) in &source.names {
            if matches_any(&compiled, name) && !excluded.contains(name) {
                registry.insert(distinguished(&pattern.to_uppercase(), name), *mask);
            } // if
        } // for
        trace!("{} rights match {}", registry.len(), pattern);
        Ok(registry)
    } // from_pattern

    /// The process-wide standard registry, built on first use and never modified.
    pub fn global() -> &'static RightsRegistry {
        static GLOBAL: OnceLock<RightsRegistry> = OnceLock::new();
        GLOBAL.get_or_init(RightsRegistry::standard)
    } // global

    /// Adds or replaces a named mask.
    pub fn insert(&mut self, name: &str, mask: u32) {
        trace!("registering right {} as {:#010x}", name, mask);
        self.names.insert(name.to_uppercase(), mask);
    } // insert

    /// Merges every name of `other` into this registry; names of `other` win.
    pub fn update(&mut self, other: &RightsRegistry) {
        for (name, mask) in &other.names {
            self.names.insert(name.clone(), *mask);
        } // for
    } // update

    /// Returns true if `name` is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_uppercase())
    } // contains

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    } // len

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    } // is_empty

    /// Resolves a name or a decimal literal to its mask.
    pub fn constant(&self, value: &str) -> Result<u32> {
        if let Ok(mask) = value.trim().parse::<u32>() {
            return Ok(mask);
        } // if
        match self.names.get(&value.to_uppercase()) {
            Some(mask) => Ok(*mask),
            None       => {
                warn!("unknown right: {}", value);
                Err(Error::UnknownRight(String::from(value)))
            }, // None
        } // match
    } // constant

    /// Normalizes rights to a mask. Masks pass through unchanged.
    pub fn lookup(&self, rights: &Rights) -> Result<u32> {
        match rights {
            Rights::Mask(mask)     => Ok(*mask),
            Rights::Symbol(symbol) => self.constant(symbol),
        } // match
    } // lookup

    /// Iterates over the registered names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    } // names

    /// Returns the names matching at least one of `patterns`, in alphabetical order.
    pub fn names_matching(&self, patterns: &[&str]) -> Result<Vec<&str>> {
        let compiled = compile(patterns)?;

        Ok(self.names().filter(|name| matches_any(&compiled, name)).collect())
    } // names_matching

    /// Returns the names sharing at least one bit with `mask`.
    pub fn names_from_value(&self, mask: u32) -> Vec<&str> {
        self.names.iter()
            .filter(|(_, value)| **value & mask != 0)
            .map(|(name, _)| name.as_str())
            .collect()
    } // names_from_value

    /// `names_from_value` restricted to the names matching one of `patterns`.
    pub fn names_from_value_matching(&self, mask: u32, patterns: &[&str]) -> Result<Vec<&str>> {
        let compiled = compile(patterns)?;

        Ok(self.names_from_value(mask).into_iter().filter(|name| matches_any(&compiled, name)).collect())
    } // names_from_value_matching

    /// Returns the masks of the names sharing at least one bit with `mask`, ordered by name.
    pub fn values_from_value(&self, mask: u32) -> Vec<u32> {
        self.names.values().copied().filter(|value| value & mask != 0).collect()
    } // values_from_value

    /// `values_from_value` restricted to the names matching one of `patterns`.
    pub fn values_from_value_matching(&self, mask: u32, patterns: &[&str]) -> Result<Vec<u32>> {
        Ok(self.names_from_value_matching(mask, patterns)?
            .into_iter()
            .filter_map(|name| self.names.get(name).copied())
            .collect())
    } // values_from_value_matching

    /// Returns the shortest name whose mask equals `mask` exactly. Ties go to the name that
    /// sorts first.
    pub fn name_from_value(&self, mask: u32) -> Option<&str> {
        self.names.iter()
            .filter(|(_, value)| **value == mask)
            .map(|(name, _)| name.as_str())
            .min_by_key(|name| name.len())
    } // name_from_value

    /// `name_from_value` restricted to the names matching one of `patterns`.
    pub fn name_from_value_matching(&self, mask: u32, patterns: &[&str]) -> Result<Option<&str>> {
        let compiled = compile(patterns)?;

        Ok(self.names.iter()
            .filter(|(name, value)| **value == mask && matches_any(&compiled, name))
            .map(|(name, _)| name.as_str())
            .min_by_key(|name| name.len()))
    } // name_from_value_matching

} // impl RightsRegistry

impl From<BTreeMap<String, u32>> for RightsRegistry {
    fn from(map: BTreeMap<String, u32>) -> Self {
        let mut registry = RightsRegistry::new();

        for (name, mask) in map {
            registry.insert(&name, mask);
        } // for
        registry
    } // from
} // impl From<BTreeMap<String, u32>> for RightsRegistry


// Tests //////////////////////////////////////////////////////////////////////////////////////////


#[cfg(test)]
mod tests {

    use super::*;
    use test_env_log::test;

    #[test]
    fn shorthands() {
        let registry = RightsRegistry::standard();

        assert_eq!(registry.lookup(&Rights::from("R")), Ok(0x0012_0089));
        assert_eq!(registry.lookup(&Rights::from("W")), Ok(0x0012_0116));
        assert_eq!(registry.lookup(&Rights::from("X")), Ok(0x0012_00A0));
        assert_eq!(registry.lookup(&Rights::from("M")), Ok(0x0013_01BF));
        assert_eq!(registry.lookup(&Rights::from("F")), Ok(0x001F_01FF));
    } // shorthands

    #[test]
    fn case_insensitive() {
        let registry = RightsRegistry::global();

        assert_eq!(registry.constant("file_read_data"), Ok(FILE_READ_DATA));
        assert_eq!(registry.constant("f"), Ok(FULL_CONTROL));
        assert!(registry.contains("generic_all"));
    } // case_insensitive

    #[test]
    fn masks_pass_through() {
        let registry = RightsRegistry::new();

        assert_eq!(registry.lookup(&Rights::Mask(0xdead)), Ok(0xdead));
        assert_eq!(registry.constant("17"), Ok(17));
    } // masks_pass_through

    #[test]
    fn unknown_right() {
        let registry = RightsRegistry::standard();

        assert_eq!(
            registry.lookup(&Rights::from("Q")),
            Err(Error::UnknownRight(String::from("Q")))
        );
    } // unknown_right

    #[test]
    fn reverse_lookup() {
        let registry = RightsRegistry::standard();

        assert_eq!(registry.name_from_value(FULL_CONTROL), Some("F"));
        assert_eq!(registry.name_from_value(FILE_READ_DATA), Some("FILE_READ_DATA"));
        assert_eq!(registry.name_from_value(0x0000_0200), None);

        let names = registry.names_from_value(FILE_READ_DATA | DELETE);

        assert!(names.contains(&"FILE_READ_DATA"));
        assert!(names.contains(&"DELETE"));
        assert!(names.contains(&"R"));
        assert!(!names.contains(&"WRITE_DAC"));
    } // reverse_lookup

    #[test]
    fn update_and_deserialize() {
        let mut registry = RightsRegistry::standard();
        let extra: RightsRegistry = serde_json::from_str(r#"{"query": 1, "f": 7}"#).unwrap();

        assert_eq!(extra.len(), 2);
        registry.update(&extra);
        assert_eq!(registry.constant("QUERY"), Ok(1));
        assert_eq!(registry.constant("F"), Ok(7));
    } // update_and_deserialize

    #[test]
    fn name_patterns() {
        let registry = RightsRegistry::standard();

        assert_eq!(
            registry.names_matching(&["file_generic_*"]),
            Ok(vec!["FILE_GENERIC_EXECUTE", "FILE_GENERIC_READ", "FILE_GENERIC_WRITE"])
        );
        assert_eq!(registry.names_matching(&["R", "W"]), Ok(vec!["R", "W"]));
        assert_eq!(registry.names_matching(&["["]), Err(Error::InvalidPattern(String::from("["))));
    } // name_patterns

    #[test]
    fn reverse_lookup_with_patterns() {
        let registry = RightsRegistry::standard();

        let names = registry.names_from_value_matching(FILE_READ_DATA | DELETE, &["FILE_*"]).unwrap();
        assert!(names.contains(&"FILE_READ_DATA"));
        assert!(names.contains(&"FILE_GENERIC_READ"));
        assert!(!names.contains(&"R"));
        assert!(!names.contains(&"DELETE"));

        assert_eq!(registry.name_from_value_matching(FULL_CONTROL, &["FILE_*"]), Ok(Some("FILE_ALL_ACCESS")));
        assert_eq!(registry.name_from_value_matching(FULL_CONTROL, &["GENERIC_*"]), Ok(None));

        assert_eq!(
            registry.values_from_value_matching(FILE_READ_DATA | DELETE, &["DELETE", "FILE_READ_DATA"]),
            Ok(vec![DELETE, FILE_READ_DATA])
        );
        assert!(registry.values_from_value(WRITE_DAC).iter().all(|value| value & WRITE_DAC != 0));
        assert_eq!(
            registry.values_from_value(FILE_DELETE_CHILD),
            vec![FULL_CONTROL, FILE_ALL_ACCESS, FILE_DELETE_CHILD]
        );
    } // reverse_lookup_with_patterns

    #[test]
    fn registry_from_pattern() {
        let file = RightsRegistry::from_pattern("FILE_GENERIC_*", &[], RightsRegistry::global()).unwrap();

        assert_eq!(file.names().collect::<Vec<_>>(), vec!["EXECUTE", "READ", "WRITE"]);
        assert_eq!(file.constant("read"), Ok(FILE_GENERIC_READ));

        let generic = RightsRegistry::from_pattern("GENERIC_*", &["generic_all"], RightsRegistry::global()).unwrap();
        assert_eq!(generic.names().collect::<Vec<_>>(), vec!["EXECUTE", "READ", "WRITE"]);
        assert_eq!(generic.constant("WRITE"), Ok(GENERIC_WRITE));

        let kept = RightsRegistry::from_pattern("DELETE", &[], RightsRegistry::global()).unwrap();
        assert_eq!(kept.constant("DELETE"), Ok(DELETE));
    } // registry_from_pattern

} // mod tests
