//! Defines helper macros for generating domain port error enums.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated port error constructors.
    define_port_error! {
        pub enum SamplePortError {
            Missing => "record is missing",
            Unavailable { message: String } => "store unavailable: {message}",
            Lagging { shard: String, behind: u32 } => "shard {shard} is {behind} writes behind",
        }
    }

    #[test]
    fn unit_variants_get_snake_case_constructors() {
        let err = SamplePortError::missing();
        assert_eq!(err, SamplePortError::Missing);
        assert_eq!(err.to_string(), "record is missing");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::unavailable("timeout");
        assert_eq!(err.to_string(), "store unavailable: timeout");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SamplePortError::lagging("eu-1", 3_u32);
        assert_eq!(err.to_string(), "shard eu-1 is 3 writes behind");
    }
}
