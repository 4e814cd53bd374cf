// src/types/enums.rs
//! Plaintext enums. Discriminants match the values the web client encrypts, so an
//! `Education` threshold of `Master` is the encrypted scalar `1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} value: {value}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: u8,
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            pub fn as_u8(self) -> u8 {
                self as u8
            }

            pub fn as_u32(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u8> for $name {
            type Error = InvalidEnumValue;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(InvalidEnumValue { kind: stringify!($name), value }),
                }
            }
        }
    };
}

wire_enum!(
    /// Highest completed education. Ordered, so `>=` thresholds are meaningful.
    Education {
        Bachelor = 0,
        Master = 1,
        PhD = 2,
        Other = 3,
    }
);

wire_enum!(Sex {
    Male = 0,
    Female = 1,
    Other = 2,
});

wire_enum!(WorkPreference {
    Remote = 0,
    Hybrid = 1,
    OnSite = 2,
});

wire_enum!(PrimaryField {
    Software = 0,
    Banking = 1,
    AI = 2,
    Web3 = 3,
    Other = 4,
});

wire_enum!(
    /// Active mode of an address in the client.
    Role {
        None = 0,
        Individual = 1,
        Company = 2,
    }
);
