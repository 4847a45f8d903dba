//! Helpers for enums that are stored as TEXT columns.
//!
//! Statuses live in TEXT columns rather than Postgres enum types because
//! every tenant schema would otherwise get its own enum OID.

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum using
/// the same snake_case spelling serde uses.
///
/// ```rust,ignore
/// text_enum!(ItemStatus, "item status" {
///     Pending => "pending",
///     Started => "started",
/// });
/// ```
macro_rules! text_enum {
    ($ty:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// The persisted spelling of this value.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::error::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err($crate::error::ValidationError::InvalidFormat {
                        field: $field.to_string(),
                        reason: format!("unknown value '{}'", other),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;
