//! Status vocabularies. Each enum serializes to its English name and also
//! accepts the Indonesian labels the staff forms have always sent. The
//! `as_str` form is what the database stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

/// Approval axis of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[default]
    #[serde(alias = "Menunggu")]
    Pending,
    #[serde(alias = "Disetujui", alias = "approved")]
    Approved,
    #[serde(alias = "Ditolak")]
    Rejected,
}

text_enum!(ApprovalStatus {
    Pending => "Pending",
    Approved => "Approved",
    Rejected => "Rejected",
});

/// Derived from amount paid against the total price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "Belum")]
    Unpaid,
    #[serde(alias = "DP")]
    Deposit,
    #[serde(alias = "Lunas")]
    Paid,
}

text_enum!(PaymentStatus {
    Unpaid => "Unpaid",
    Deposit => "Deposit",
    Paid => "Paid",
});

/// Whether finance staff confirmed the recorded payment. Kept apart from
/// `PaymentStatus` so verifying never hides how much was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[default]
    #[serde(alias = "Belum Diverifikasi")]
    Unverified,
    #[serde(alias = "Terverifikasi")]
    Verified,
}

text_enum!(VerificationStatus {
    Unverified => "Unverified",
    Verified => "Verified",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    #[default]
    Manual,
    Transfer,
    Gateway,
}

text_enum!(PaymentSource {
    Manual => "manual",
    Transfer => "transfer",
    Gateway => "gateway",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomStatus {
    #[default]
    #[serde(alias = "Aktif")]
    Active,
    #[serde(alias = "Tidak Aktif")]
    Inactive,
}

text_enum!(RoomStatus {
    Active => "Active",
    Inactive => "Inactive",
});
