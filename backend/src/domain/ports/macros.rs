//! `define_port_error!` builds the error enums returned by driven ports.
//!
//! Each variant lists its display template after `=>`. Prefixing the template
//! with `transient` marks failures worth retrying (lost connections, upstream
//! timeouts); services use [`is_transient`](#generated-methods) to decide
//! between a 503 and a hard failure.
//!
//! # Generated methods
//!
//! - one snake_case constructor per variant whose `String` fields accept
//!   anything `Into<String>`;
//! - `is_transient(&self) -> bool`.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum SmsGatewayError {
//!         Offline { message: String } => transient "sms gateway offline: {message}",
//!         Refused { code: u16 } => "sms gateway refused message ({code})",
//!     }
//! }
//!
//! assert!(SmsGatewayError::offline("dns").is_transient());
//! ```

macro_rules! define_port_error {
    (
        $(#[$attr:meta])*
        pub enum $error:ident {
            $(
                $(#[$doc:meta])*
                $case:ident $( { $($arg:ident : $arg_ty:ty),* $(,)? } )?
                    => $($transient:ident)? $template:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $error {
            $(
                $(#[$doc])*
                #[error($template)]
                $case $( { $($arg : $arg_ty),* } )?,
            )+
        }

        impl $error {
            $(
                define_port_error!(@constructor $case $( ; $($arg : $arg_ty),* )?);
            )+

            /// Whether retrying the same call may succeed.
            #[allow(dead_code, reason = "not every port consults retryability")]
            pub const fn is_transient(&self) -> bool {
                match self {
                    $( Self::$case { .. } => define_port_error!(@retry $($transient)?), )+
                }
            }
        }
    };

    (@retry transient) => { true };
    (@retry) => { false };

    (@constructor $case:ident) => {
        ::paste::paste! {
            #[allow(dead_code, reason = "constructors are generated for every variant")]
            pub fn [<$case:snake>]() -> Self {
                Self::$case
            }
        }
    };

    (@constructor $case:ident ; $($arg:ident : $arg_ty:ty),*) => {
        ::paste::paste! {
            #[allow(dead_code, reason = "constructors are generated for every variant")]
            pub fn [<$case:snake>]($($arg: impl Into<$arg_ty>),*) -> Self {
                Self::$case { $($arg: $arg.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;
