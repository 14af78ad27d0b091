//! Admission rules for keys and values
//!
//! `put` refuses anything that is not [`Validate::is_valid`]. Rust has no
//! null, so `Option::None` plays that role. Empty strings and collections
//! are ordinary values.

use std::rc::Rc;
use std::sync::Arc;

/// Decides whether a key or value may be stored in the cache
pub trait Validate {
    /// `false` for null-like inputs
    fn is_valid(&self) -> bool {
        true
    }
}

macro_rules! always_valid {
    ($($t:ty),* $(,)?) => {
        $(impl Validate for $t {})*
    };
}

always_valid!(
    (), bool, char, f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    str, String,
);

impl<T: Validate> Validate for Option<T> {
    fn is_valid(&self) -> bool {
        self.as_ref().is_some_and(Validate::is_valid)
    }
}

impl<T: Validate> Validate for [T] {
    fn is_valid(&self) -> bool {
        self.iter().all(Validate::is_valid)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn is_valid(&self) -> bool {
        self.as_slice().is_valid()
    }
}

impl<T: Validate + ?Sized> Validate for &T {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

impl<T: Validate + ?Sized> Validate for Rc<T> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

impl<T: Validate + ?Sized> Validate for Arc<T> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

macro_rules! tuple_valid {
    ($($name:ident),+) => {
        impl<$($name: Validate),+> Validate for ($($name,)+) {
            #[allow(non_snake_case)]
            fn is_valid(&self) -> bool {
                let ($($name,)+) = self;
                true $(&& $name.is_valid())+
            }
        }
    };
}

tuple_valid!(A);
tuple_valid!(A, B);
tuple_valid!(A, B, C);
tuple_valid!(A, B, C, D);
