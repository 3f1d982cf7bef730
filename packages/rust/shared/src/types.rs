//! Core domain types: tower identities, operators, and resolved locations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TowerMapError;

/// Mobile country code for Iran, used in every lookup request.
pub const IRAN_MCC: u16 = 432;

// ---------------------------------------------------------------------------
// TowerRecord
// ---------------------------------------------------------------------------

/// One spreadsheet row: a cell tower identified by its CID and LAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Cell ID.
    pub cid: u64,
    /// Location area code.
    pub lac: u32,
}

impl TowerRecord {
    pub fn new(cid: u64, lac: u32) -> Self {
        Self { cid, lac }
    }
}

impl fmt::Display for TowerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LAC {} / CID {}", self.lac, self.cid)
    }
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Iranian mobile network operators selectable for a lookup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    #[default]
    IrMci,
    Tkc,
    Mtce,
    Taliya,
    Irancell,
    Tci,
    Iraphone,
}

impl Operator {
    /// All operators, in menu order.
    pub const ALL: [Operator; 7] = [
        Operator::IrMci,
        Operator::Tkc,
        Operator::Mtce,
        Operator::Taliya,
        Operator::Irancell,
        Operator::Tci,
        Operator::Iraphone,
    ];

    /// Human-readable carrier name.
    pub fn name(self) -> &'static str {
        match self {
            Self::IrMci => "IR-MCI",
            Self::Tkc => "TKC",
            Self::Mtce => "MTCE",
            Self::Taliya => "Taliya",
            Self::Irancell => "Irancell",
            Self::Tci => "TCI",
            Self::Iraphone => "Iraphone",
        }
    }

    /// Mobile network code sent as `mnc` in lookup requests.
    pub fn mnc(self) -> u16 {
        match self {
            Self::IrMci => 11,
            Self::Tkc => 14,
            Self::Mtce => 19,
            Self::Taliya => 32,
            Self::Irancell => 35,
            Self::Tci => 70,
            Self::Iraphone => 93,
        }
    }

    /// The operator after this one in menu order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// The operator before this one in menu order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = TowerMapError;

    /// Parse a carrier name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|o| o.name()).collect();
                TowerMapError::validation(format!(
                    "unknown operator '{wanted}': expected one of {}",
                    known.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Operator {
    type Error = TowerMapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.name().to_string()
    }
}

// ---------------------------------------------------------------------------
// ResolvedLocation
// ---------------------------------------------------------------------------

/// A tower whose coordinates were found by the lookup service.
///
/// Coordinates are kept verbatim as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub record: TowerRecord,
    pub operator: Operator,
    pub latitude: String,
    pub longitude: String,
}

impl ResolvedLocation {
    /// Pop-up text shown on the map marker.
    pub fn info(&self) -> String {
        format!(
            "MCC:{IRAN_MCC}<br>MNC:{}<br>LAC:{}<br>CID:{}<br><br>lat:{}<br>lon:{}",
            self.operator.mnc(),
            self.record.lac,
            self.record.cid,
            self.latitude,
            self.longitude,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_codes_match_table() {
        let codes: Vec<(&str, u16)> = Operator::ALL.iter().map(|o| (o.name(), o.mnc())).collect();
        assert_eq!(
            codes,
            vec![
                ("IR-MCI", 11),
                ("TKC", 14),
                ("MTCE", 19),
                ("Taliya", 32),
                ("Irancell", 35),
                ("TCI", 70),
                ("Iraphone", 93),
            ]
        );
    }

    #[test]
    fn operator_parse_is_case_insensitive() {
        assert_eq!("ir-mci".parse::<Operator>().unwrap(), Operator::IrMci);
        assert_eq!(" Irancell ".parse::<Operator>().unwrap(), Operator::Irancell);
        let err = "Vodafone".parse::<Operator>().unwrap_err();
        assert!(err.to_string().contains("unknown operator 'Vodafone'"));
    }

    #[test]
    fn operator_cycling_wraps() {
        assert_eq!(Operator::Iraphone.next(), Operator::IrMci);
        assert_eq!(Operator::IrMci.prev(), Operator::Iraphone);
        assert_eq!(Operator::default(), Operator::IrMci);
    }

    #[test]
    fn info_text_lists_identity_and_coordinates() {
        let loc = ResolvedLocation {
            record: TowerRecord::new(1001, 2002),
            operator: Operator::IrMci,
            latitude: "35.70".into(),
            longitude: "51.40".into(),
        };
        assert_eq!(
            loc.info(),
            "MCC:432<br>MNC:11<br>LAC:2002<br>CID:1001<br><br>lat:35.70<br>lon:51.40"
        );
    }
}
