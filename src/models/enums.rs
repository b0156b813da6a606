//! Enumerated values stored as text columns.
//!
//! Rows carry these as plain strings; the typed enums live at the validation
//! boundary, where an invalid value is rejected before any query runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a text value does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEnumValue {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for InvalidEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value '{}'", self.field, self.value)
    }
}

impl std::error::Error for InvalidEnumValue {}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(InvalidEnumValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(
    /// Kind of legal matter.
    CaseType, "case_type" {
        AutoAccident => "auto_accident",
        SlipAndFall => "slip_and_fall",
        MedicalMalpractice => "medical_malpractice",
        WorkersCompensation => "workers_compensation",
        ProductLiability => "product_liability",
        WrongfulDeath => "wrongful_death",
        Other => "other",
    }
);

text_enum!(
    /// Where a case sits in its lifecycle.
    CaseStatus, "status" {
        Intake => "intake",
        Active => "active",
        Litigation => "litigation",
        Settlement => "settlement",
        Closed => "closed",
    }
);

text_enum!(
    TaskStatus, "status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

text_enum!(
    IncidentSeverity, "severity" {
        Minor => "minor",
        Moderate => "moderate",
        Severe => "severe",
        Fatal => "fatal",
    }
);

text_enum!(
    InjurySeverity, "severity" {
        Minor => "minor",
        Moderate => "moderate",
        Severe => "severe",
        Catastrophic => "catastrophic",
    }
);

text_enum!(
    ProviderStatus, "status" {
        Active => "active",
        Completed => "completed",
        Discontinued => "discontinued",
    }
);

text_enum!(
    PolicyType, "policy_type" {
        Auto => "auto",
        Health => "health",
        Liability => "liability",
        Umbrella => "umbrella",
        WorkersComp => "workers_comp",
        Property => "property",
        Other => "other",
    }
);

text_enum!(
    PolicyStatus, "status" {
        Active => "active",
        Expired => "expired",
        Cancelled => "cancelled",
        Pending => "pending",
    }
);

text_enum!(
    ClaimStatus, "status" {
        Open => "open",
        Closed => "closed",
        Pending => "pending",
        Denied => "denied",
    }
);

text_enum!(
    DocumentType, "document_type" {
        Pleading => "pleading",
        Correspondence => "correspondence",
        MedicalRecord => "medical_record",
        Bill => "bill",
        Insurance => "insurance",
        Evidence => "evidence",
        Photo => "photo",
        Other => "other",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_values() {
        assert_eq!("auto".parse::<PolicyType>().unwrap(), PolicyType::Auto);
        assert_eq!(
            "workers_comp".parse::<PolicyType>().unwrap(),
            PolicyType::WorkersComp
        );
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "boat".parse::<PolicyType>().unwrap_err();
        assert_eq!(err.field, "policy_type");
        assert_eq!(err.value, "boat");
    }

    #[test]
    fn display_round_trips() {
        let severity = InjurySeverity::Catastrophic;
        assert_eq!(severity.to_string().parse::<InjurySeverity>().unwrap(), severity);
    }
}
