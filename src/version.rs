//! Debian-style (`dpkg --compare-versions`) package version parsing and
//! comparison.
//!
//! A version string is `[epoch:]upstream_version[-debian_revision]`. Epoch
//! defaults to 0 when absent. Comparison orders by epoch, then
//! `upstream_version`, then `debian_revision`, each of the latter two
//! compared with the same alternating digit-run/non-digit-run algorithm.

use std::cmp::Ordering;
use std::fmt;

/// A parsed Debian-style package version.
#[derive(Debug, Clone, Eq)]
pub struct DpkgVersion {
    epoch: u64,
    upstream_version: String,
    debian_revision: String,
}

impl DpkgVersion {
    /// Parses a version string of the form `[epoch:]upstream[-revision]`.
    ///
    /// Returns `None` if `epoch` is present but not a valid non-negative
    /// integer, if `upstream_version` is empty or doesn't start with a
    /// digit, or if either fragment contains a character outside its
    /// allowed class (`[A-Za-z0-9.+~:-]` for `upstream_version`,
    /// `[A-Za-z0-9.+~]` for `debian_revision`).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        if input.is_empty() {
            return None;
        }

        let (epoch, rest) = match input.split_once(':') {
            Some((epoch_str, rest)) => (epoch_str.parse::<u64>().ok()?, rest),
            None => (0, input),
        };

        if rest.is_empty() {
            return None;
        }

        let (upstream_version, debian_revision) = match rest.rfind('-') {
            Some(idx) => (rest[..idx].to_string(), rest[idx + 1..].to_string()),
            None => (rest.to_string(), String::new()),
        };

        if !upstream_version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        if !upstream_version.chars().all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '+' | '~' | ':' | '-')) {
            return None;
        }
        if !debian_revision.chars().all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '+' | '~')) {
            return None;
        }

        Some(Self { epoch, upstream_version, debian_revision })
    }

    /// Reconstitutes the canonical string form: `epoch:upstream-revision`,
    /// omitting the epoch when zero and the revision when empty, matching
    /// how `dpkg` itself prints versions.
    #[must_use]
    pub fn format(&self) -> String {
        let mut out = String::new();
        if self.epoch != 0 {
            out.push_str(&self.epoch.to_string());
            out.push(':');
        }
        out.push_str(&self.upstream_version);
        if !self.debian_revision.is_empty() {
            out.push('-');
            out.push_str(&self.debian_revision);
        }
        out
    }

    /// The epoch (0 if not specified).
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The upstream version component.
    #[must_use]
    pub fn upstream_version(&self) -> &str {
        &self.upstream_version
    }

    /// The Debian revision component (empty string if not specified).
    #[must_use]
    pub fn debian_revision(&self) -> &str {
        &self.debian_revision
    }
}

impl fmt::Display for DpkgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl PartialEq for DpkgVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for DpkgVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DpkgVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_fragment(&self.upstream_version, &other.upstream_version))
            .then_with(|| compare_fragment(&self.debian_revision, &other.debian_revision))
    }
}

/// The weight assigned to a non-alphanumeric character, or to the
/// end-of-string sentinel, when comparing the non-digit runs of two
/// fragments. Letters sort above all non-letters; `~` sorts below
/// everything, including the empty string, so that `1.0~rc1 < 1.0`.
fn char_weight(c: Option<char>) -> i32 {
    match c {
        None => 0,
        Some('~') => -1,
        Some(c) if c.is_ascii_alphabetic() => c as i32 + 256,
        Some(c) => c as i32,
    }
}

/// Compares the non-digit run `a` against `b` character by character using
/// [`char_weight`], the way `dpkg`'s `order()` function does.
fn compare_non_digits(a: &str, b: &str) -> Ordering {
    let mut ac = a.chars();
    let mut bc = b.chars();
    loop {
        let ca = ac.next();
        let cb = bc.next();
        if ca.is_none() && cb.is_none() {
            return Ordering::Equal;
        }
        let ord = char_weight(ca).cmp(&char_weight(cb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Compares two digit runs numerically (treating absent digits as zero, and
/// ignoring leading zeros), the way `dpkg` compares digit runs.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let na: u64 = if a.is_empty() { 0 } else { a.parse().unwrap_or(u64::MAX) };
    let nb: u64 = if b.is_empty() { 0 } else { b.parse().unwrap_or(u64::MAX) };
    na.cmp(&nb)
}

/// Splits a leading run of the same class (digit vs. non-digit) off `s`,
/// returning `(run, rest)`.
fn take_run(s: &str, digits: bool) -> (&str, &str) {
    let end = s.find(|c: char| c.is_ascii_digit() != digits).unwrap_or(s.len());
    s.split_at(end)
}

/// Compares one `upstream_version`- or `debian_revision`-shaped fragment
/// against another, alternating between non-digit and digit runs starting
/// with a non-digit run (possibly empty).
fn compare_fragment(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        let (a_non_digit, a_rest) = take_run(a, false);
        let (b_non_digit, b_rest) = take_run(b, false);
        let ord = compare_non_digits(a_non_digit, b_non_digit);
        if ord != Ordering::Equal {
            return ord;
        }
        a = a_rest;
        b = b_rest;

        let (a_digit, a_rest) = take_run(a, true);
        let (b_digit, b_rest) = take_run(b, true);
        let ord = compare_digits(a_digit, b_digit);
        if ord != Ordering::Equal {
            return ord;
        }
        a = a_rest;
        b = b_rest;

        if a.is_empty() && b.is_empty() {
            return Ordering::Equal;
        }
    }
}

/// Compares two version strings, returning a negative number, zero, or a
/// positive number as `a` is less than, equal to, or greater than `b`,
/// matching `dpkg --compare-versions`' three-way-comparison convention.
/// Unparseable strings sort equal to each other and less than any
/// successfully parsed version.
#[must_use]
pub fn compare_version_string(a: &str, b: &str) -> i32 {
    match (DpkgVersion::parse(a), DpkgVersion::parse(b)) {
        (Some(va), Some(vb)) => match va.cmp(&vb) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        },
        (None, None) => 0,
        (None, Some(_)) => -1,
        (Some(_), None) => 1,
    }
}
