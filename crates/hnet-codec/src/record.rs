//! Named records and opaque aliases.

/// Declare a struct that travels as a record of its fields.
///
/// Fields are written back to back in declaration order, exactly like the
/// tuple of their types, and the descriptor carries the declared names.
/// Up to twelve fields are supported.
///
/// ```
/// hnet_codec::wire_record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Quote {
///         pub symbol: String,
///         pub bid: f64,
///         pub ask: f64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fvis:vis $field:ident : $fty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $fty),+
        }

        impl $crate::Codec for $name {
            type DecodeState = <($($fty,)+) as $crate::Codec>::DecodeState;

            const ZERO_WIDTH: bool = <($($fty,)+) as $crate::Codec>::ZERO_WIDTH;

            fn describe() -> $crate::TypeDesc {
                $crate::TypeDesc::record([
                    $((stringify!($field), <$fty as $crate::Codec>::describe())),+
                ])
            }

            fn write<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> $crate::Result<()> {
                $($crate::Codec::write(&self.$field, w)?;)+
                Ok(())
            }

            fn read<R: ::std::io::Read + ?Sized>(r: &mut R) -> $crate::Result<Self> {
                let ($($field,)+) = <($($fty,)+) as $crate::Codec>::read(r)?;
                Ok(Self { $($field),+ })
            }

            fn prepare() -> Self::DecodeState {
                <($($fty,)+) as $crate::Codec>::prepare()
            }

            fn resume<S: $crate::PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> $crate::Result<::std::task::Poll<Self>> {
                Ok(<($($fty,)+) as $crate::Codec>::resume(src, state)?
                    .map(|($($field,)+)| Self { $($field),+ }))
            }
        }
    };
}

/// Declare a newtype that travels exactly like its inner type.
///
/// Only the descriptor differs: it names the alias and carries the inner
/// type as its representation.
///
/// ```
/// hnet_codec::wire_alias! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub struct Timestamp(pub u64) as "timestamp";
/// }
/// ```
#[macro_export]
macro_rules! wire_alias {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($ivis:vis $inner:ty) as $alias:literal;
    ) => {
        $(#[$meta])*
        $vis struct $name($ivis $inner);

        impl $crate::Codec for $name {
            type DecodeState = <$inner as $crate::Codec>::DecodeState;

            const BULK_WIDTH: Option<usize> = <$inner as $crate::Codec>::BULK_WIDTH;
            const ZERO_WIDTH: bool = <$inner as $crate::Codec>::ZERO_WIDTH;

            fn describe() -> $crate::TypeDesc {
                $crate::TypeDesc::alias($alias, <$inner as $crate::Codec>::describe())
            }

            fn write<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> $crate::Result<()> {
                $crate::Codec::write(&self.0, w)
            }

            fn read<R: ::std::io::Read + ?Sized>(r: &mut R) -> $crate::Result<Self> {
                Ok(Self(<$inner as $crate::Codec>::read(r)?))
            }

            fn prepare() -> Self::DecodeState {
                <$inner as $crate::Codec>::prepare()
            }

            fn resume<S: $crate::PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> $crate::Result<::std::task::Poll<Self>> {
                Ok(<$inner as $crate::Codec>::resume(src, state)?.map(Self))
            }
        }
    };
}
