/// Configuration-time setters shared by every select variant.
macro_rules! select_attributes {
    () => {
        /// Apply a registered [`ResultMap`](crate::config::ResultMap) to each row.
        #[must_use]
        pub fn result_map(mut self, result_map: impl Into<String>) -> Self {
            self.meta.set_result_map(result_map.into());
            self
        }

        /// Row fetch hint forwarded to the engine.
        #[must_use]
        pub fn fetch_size(mut self, fetch_size: u32) -> Self {
            self.meta.set_fetch_size(fetch_size);
            self
        }

        #[must_use]
        pub fn result_set_type(
            mut self,
            result_set_type: $crate::statement::ResultSetType,
        ) -> Self {
            self.meta.set_result_set_type(result_set_type);
            self
        }

        #[must_use]
        pub fn use_cache(mut self, use_cache: bool) -> Self {
            self.meta.set_use_cache(use_cache);
            self
        }

        #[must_use]
        pub fn flush_cache(mut self, flush_cache: bool) -> Self {
            self.meta.set_flush_cache(flush_cache);
            self
        }
    };
}

/// `MappedStatement` and `Debug` for a statement struct with a `meta` field.
macro_rules! statement_impls {
    ($name:ident < $($g:ident),+ >) => {
        impl<$($g),+> $crate::statement::MappedStatement for $name<$($g),+> {
            fn meta(&self) -> &$crate::statement::StatementMeta {
                &self.meta
            }
        }

        impl<$($g),+> ::std::fmt::Debug for $name<$($g),+> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("id", &self.meta.id())
                    .field("parameter", &self.meta.parameter_type())
                    .field("result", &self.meta.result_type())
                    .finish()
            }
        }
    };
}

pub(crate) use select_attributes;
pub(crate) use statement_impls;
