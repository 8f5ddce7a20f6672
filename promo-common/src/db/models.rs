//! Domain enumerations and value types shared by every promo crate

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Canonical sales area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Area {
    Kupang,
    Kabupaten,
    Sumba,
}

impl Area {
    pub const ALL: [Area; 3] = [Area::Kupang, Area::Kabupaten, Area::Sumba];

    /// Stored code (`KUPANG`, `KABUPATEN`, `SUMBA`)
    pub fn code(&self) -> &'static str {
        match self {
            Area::Kupang => "KUPANG",
            Area::Kabupaten => "KABUPATEN",
            Area::Sumba => "SUMBA",
        }
    }

    /// Employee identifier prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Area::Kupang => "KPG",
            Area::Kabupaten => "KAB",
            Area::Sumba => "SMB",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Area {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Area::ALL
            .into_iter()
            .find(|a| a.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown area code: {}", s)))
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    TopAdmin,
    #[serde(rename = "manager_area")]
    AreaManager,
    #[serde(rename = "spv_area")]
    AreaSupervisor,
    #[serde(rename = "sator")]
    SatorLead,
    #[serde(rename = "promotor")]
    Promoter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TopAdmin => "admin",
            Role::AreaManager => "manager_area",
            Role::AreaSupervisor => "spv_area",
            Role::SatorLead => "sator",
            Role::Promoter => "promotor",
        }
    }

    /// Field agents authenticate with a 4-digit PIN, everyone else with a password
    pub fn uses_pin(&self) -> bool {
        matches!(self, Role::Promoter)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "admin" => Ok(Role::TopAdmin),
            "manager_area" => Ok(Role::AreaManager),
            "spv_area" => Ok(Role::AreaSupervisor),
            "sator" => Ok(Role::SatorLead),
            "promotor" => Ok(Role::Promoter),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Canonical sale outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Closed-won
    Acc,
    /// Closed-pending
    Pending,
    /// Closed-rejected
    Reject,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Acc => "acc",
            SaleStatus::Pending => "pending",
            SaleStatus::Reject => "reject",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a fact table removes rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Set `deleted_at`, keep the row
    Soft,
    /// Remove the row
    Hard,
}

/// The two sales fact tables either side of the cutover seam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactTable {
    /// Pre-cutover table (`legacy_sales`)
    Legacy,
    /// Post-cutover table (`sales`)
    Successor,
}

impl FactTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            FactTable::Legacy => "legacy_sales",
            FactTable::Successor => "sales",
        }
    }

    /// The table on the other side of the seam
    pub fn other(&self) -> FactTable {
        match self {
            FactTable::Legacy => FactTable::Successor,
            FactTable::Successor => FactTable::Legacy,
        }
    }

    pub fn delete_mode(&self) -> DeleteMode {
        match self {
            FactTable::Legacy => DeleteMode::Soft,
            FactTable::Successor => DeleteMode::Hard,
        }
    }

    /// Whether `date` belongs on this table's side of `cutover`
    pub fn accepts(&self, date: NaiveDate, cutover: NaiveDate) -> bool {
        match self {
            FactTable::Legacy => date < cutover,
            FactTable::Successor => date >= cutover,
        }
    }
}

impl fmt::Display for FactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for FactTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "legacy_sales" => Ok(FactTable::Legacy),
            "successor" | "sales" => Ok(FactTable::Successor),
            other => Err(Error::InvalidInput(format!("Unknown fact table: {}", other))),
        }
    }
}

/// Closed calendar-date window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "Window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whole window lies on `table`'s side of `cutover`
    pub fn fits(&self, table: FactTable, cutover: NaiveDate) -> bool {
        table.accepts(self.start, cutover) && table.accepts(self.end, cutover)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}
