//! Typed GPay records
//!
//! Each model renders to the document encoding the collection validators
//! check (`$date` timestamps, `$numberDecimal` amounts, `$oid` references).
//! Enum string forms are the single source for the schema enum lists.

/// Declares a string-valued enum with `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($what:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

mod payment_method;
mod transaction;
mod user;
mod wallet;

pub use payment_method::{PaymentMethod, PaymentMethodType};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{User, UserStatus};
pub use wallet::{Currency, Wallet};

/// String forms of every variant, for schema enum lists
pub fn enum_values<T: Copy>(all: &[T], as_str: fn(&T) -> &'static str) -> Vec<String> {
    all.iter().map(|v| as_str(v).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_values() {
        assert_eq!(
            enum_values(UserStatus::ALL, UserStatus::as_str),
            vec!["ACTIVE", "INACTIVE", "SUSPENDED"]
        );
        assert_eq!(
            enum_values(PaymentMethodType::ALL, PaymentMethodType::as_str),
            vec!["CREDIT_CARD", "DEBIT_CARD", "BANK_ACCOUNT", "UPI"]
        );
    }
}
