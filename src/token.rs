//! Statically declared parameter/result types.
//!
//! A statement names its parameter and result types once, as generic
//! arguments. [`TypeToken`] carries that choice as a value and
//! [`TypeDescriptor`] is its erased form, stored in statement metadata and in
//! the configuration registry.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Erased description of a declared type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: &'static str,
    id: TypeId,
}

impl TypeDescriptor {
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// The "no value" descriptor.
    #[must_use]
    pub fn void() -> Self {
        Self::of::<()>()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// True when the declared type is `()`: no parameter, or no typed result.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.id == TypeId::of::<()>()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Zero-sized token for a declared type `T`.
pub struct TypeToken<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized + 'static> TypeToken<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    #[must_use]
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        TypeId::of::<T>() == TypeId::of::<()>()
    }
}

impl<T: ?Sized + 'static> Default for TypeToken<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for TypeToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for TypeToken<T> {}

impl<T: ?Sized + 'static> fmt::Debug for TypeToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken<{}>", self.type_name())
    }
}
