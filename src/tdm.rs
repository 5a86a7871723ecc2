//! TDM monitoring and test-pattern code tables.
//!
//! Integer codes used by the TDM monitor and generator columns, as typed
//! enums that convert to and from [`Value`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::Value;

/// Error-performance standard applied by the TDM monitor
/// (`tdmMonPerformanceStandard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceStandard {
    None = 0,
    G821 = 1,
    G826 = 2,
    M2100 = 3,
}

impl PerformanceStandard {
    const ALL: [PerformanceStandard; 4] = [Self::None, Self::G821, Self::G826, Self::M2100];

    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|standard| *standard as i32 == code)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::G821 => "g821",
            Self::G826 => "g826",
            Self::M2100 => "m2100",
        }
    }
}

impl TryFrom<i32> for PerformanceStandard {
    /// The unrecognised code.
    type Error = i32;

    fn try_from(code: i32) -> std::result::Result<Self, i32> {
        Self::from_i32(code).ok_or(code)
    }
}

impl fmt::Display for PerformanceStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PerformanceStandard {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|standard| standard.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown performance standard: {s}").into()).boxed())
    }
}

impl From<PerformanceStandard> for Value {
    fn from(standard: PerformanceStandard) -> Self {
        Value::Integer(standard.as_i32())
    }
}

/// Test pattern codes of the TDM generator and analyser.
///
/// `*Inv` variants are the bit-inverted forms of the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestPattern {
    Prbs11 = 0,
    Prbs11Inv = 1,
    Prbs15 = 2,
    Prbs15Inv = 3,
    Prbs20 = 4,
    Prbs20Inv = 5,
    Prbs23 = 6,
    Prbs23Inv = 7,
    Rpat = 8,
    Jpat = 9,
    Spat = 10,
    Hfpat = 11,
    Lfpat = 12,
    Mfpat = 13,
    Lcrpat = 14,
    Scrpat = 15,
    All0 = 16,
    All1 = 17,
    User = 18,
    Prbs6 = 19,
    Prbs6Inv = 20,
    Prbs7 = 21,
    Prbs7Inv = 22,
    Prbs9 = 23,
    Prbs9Inv = 24,
    Prbs31 = 25,
    Prbs31Inv = 26,
    Qrss = 27,
    QrssInv = 28,
    Qbf = 29,
    /// Follow the pattern detected on the receive side.
    MatchRx = 30,
}

impl TestPattern {
    const ALL: [TestPattern; 31] = [
        Self::Prbs11,
        Self::Prbs11Inv,
        Self::Prbs15,
        Self::Prbs15Inv,
        Self::Prbs20,
        Self::Prbs20Inv,
        Self::Prbs23,
        Self::Prbs23Inv,
        Self::Rpat,
        Self::Jpat,
        Self::Spat,
        Self::Hfpat,
        Self::Lfpat,
        Self::Mfpat,
        Self::Lcrpat,
        Self::Scrpat,
        Self::All0,
        Self::All1,
        Self::User,
        Self::Prbs6,
        Self::Prbs6Inv,
        Self::Prbs7,
        Self::Prbs7Inv,
        Self::Prbs9,
        Self::Prbs9Inv,
        Self::Prbs31,
        Self::Prbs31Inv,
        Self::Qrss,
        Self::QrssInv,
        Self::Qbf,
        Self::MatchRx,
    ];

    /// All patterns in code order.
    pub fn all() -> impl Iterator<Item = TestPattern> {
        Self::ALL.into_iter()
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        // Codes are dense from zero.
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i)).copied()
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Short lowercase name (`prbs15i`, `qrss`, `matchrx`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Prbs6 => "prbs6",
            Self::Prbs6Inv => "prbs6i",
            Self::Prbs7 => "prbs7",
            Self::Prbs7Inv => "prbs7i",
            Self::Prbs9 => "prbs9",
            Self::Prbs9Inv => "prbs9i",
            Self::Prbs11 => "prbs11",
            Self::Prbs11Inv => "prbs11i",
            Self::Prbs15 => "prbs15",
            Self::Prbs15Inv => "prbs15i",
            Self::Prbs20 => "prbs20",
            Self::Prbs20Inv => "prbs20i",
            Self::Prbs23 => "prbs23",
            Self::Prbs23Inv => "prbs23i",
            Self::Prbs31 => "prbs31",
            Self::Prbs31Inv => "prbs31i",
            Self::Qrss => "qrss",
            Self::QrssInv => "qrssi",
            Self::Qbf => "qbf",
            Self::Rpat => "rpat",
            Self::Jpat => "jpat",
            Self::Spat => "spat",
            Self::Hfpat => "hfpat",
            Self::Lfpat => "lfpat",
            Self::Mfpat => "mfpat",
            Self::Lcrpat => "lcrpat",
            Self::Scrpat => "scrpat",
            Self::All0 => "all0",
            Self::All1 => "all1",
            Self::User => "user",
            Self::MatchRx => "matchrx",
        }
    }
}

impl TryFrom<i32> for TestPattern {
    /// The unrecognised code.
    type Error = i32;

    fn try_from(code: i32) -> std::result::Result<Self, i32> {
        Self::from_i32(code).ok_or(code)
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestPattern {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .find(|pattern| pattern.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown test pattern: {s}").into()).boxed())
    }
}

impl From<TestPattern> for Value {
    fn from(pattern: TestPattern) -> Self {
        Value::Integer(pattern.as_i32())
    }
}
