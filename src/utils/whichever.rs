/// A macro to define an enum similar to Either, but with any number of
/// variants, each containing a known (not generic) type. An invocation will
/// contain:
/// 1. The enum definition, with any number of outer attributes, an optional
///    visibility specifier, and the variants
/// 2. The traits to implement, using `impl Trait {}`. Currently, we support
///    `Read`. The braces should be left empty (the implementation will be
///    filled automatically).
macro_rules! define_whichever {
    (
        $(#[$meta:meta])*
        $vis:vis enum $struct_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident($ty:ty)
            ),+
            $(,)?
        }
        $(impl $trait:ident for $struct_name2:ident {$($impl_block:tt)*}),*
    ) => {
        macro_rules! match_macro {
            ($value:expr, $pattern:pat => $result:expr) => {
                match $value {
                    $(
                        $struct_name::$variant($pattern) => $result,
                    )+
                }
            };
        }

        $(#[$meta])*
        $vis enum $struct_name {
            $(
                $(#[$variant_meta])*
                $variant($ty),
            )+
        }

        $(define_whichever!(@impl_trait $struct_name2, $trait, $($impl_block)*);)*
    };

    (@impl_trait $struct_name:ident, Read, $($impl_block:tt)*) => {
        impl ::std::io::Read for $struct_name {
            $($impl_block)*

            #[inline]
            fn read(&mut self, buf: &mut [u8]) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.read(buf))
            }

            #[inline]
            fn read_vectored(&mut self, bufs: &mut [::std::io::IoSliceMut<'_>]) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.read_vectored(bufs))
            }

            #[inline]
            fn read_to_end(&mut self, buf: &mut ::std::vec::Vec<u8>) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.read_to_end(buf))
            }

            #[inline]
            fn read_to_string(&mut self, buf: &mut ::std::string::String) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.read_to_string(buf))
            }

            #[inline]
            fn read_exact(&mut self, buf: &mut [u8]) -> ::std::io::Result<()> {
                match_macro!(self, inner => inner.read_exact(buf))
            }
        }
    };

    (@impl_trait $struct_name:ident, Write, $($impl_block:tt)*) => {
        impl ::std::io::Write for $struct_name {
            $($impl_block)*

            #[inline]
            fn write(&mut self, buf: &[u8]) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.write(buf))
            }

            #[inline]
            fn write_vectored(&mut self, bufs: &[::std::io::IoSlice<'_>]) -> ::std::io::Result<usize> {
                match_macro!(self, inner => inner.write_vectored(bufs))
            }

            #[inline]
            fn flush(&mut self) -> ::std::io::Result<()> {
                match_macro!(self, inner => inner.flush())
            }

            #[inline]
            fn write_all(&mut self, buf: &[u8]) -> ::std::io::Result<()> {
                match_macro!(self, inner => inner.write_all(buf))
            }
        }
    };

    (@impl_trait $struct_name:ident, $other:ident) => {
        compile_error!(concat!("Unsupported trait: ", stringify!($other)));
    };
}

pub(crate) use define_whichever;
