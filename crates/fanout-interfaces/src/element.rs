//! Buffer element types

use fanout_types::{values_match, DataType};
use std::fmt::{Debug, Display};

/// A value that can live in a device buffer
pub trait Element: Copy + Default + PartialEq + Debug + Display + Send + Sync + 'static {
    const DTYPE: DataType;

    /// Compare against an expected value; integers compare exactly, floats
    /// with relative `tolerance`
    fn same_value(self, expected: Self, tolerance: f64) -> bool;

    fn to_f64(self) -> f64;
}

macro_rules! int_element {
    ($($t:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: DataType = DataType::$dtype;

                fn same_value(self, expected: Self, _tolerance: f64) -> bool {
                    self == expected
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

macro_rules! float_element {
    ($($t:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: DataType = DataType::$dtype;

                fn same_value(self, expected: Self, tolerance: f64) -> bool {
                    values_match(self as f64, expected as f64, tolerance)
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

int_element!(i32 => INT32, i64 => INT64, u32 => UINT32, u64 => UINT64);
float_element!(f32 => FP32, f64 => FP64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_compare_exactly() {
        assert!(7i32.same_value(7, 0.5));
        assert!(!7i32.same_value(8, 0.5));
        assert_eq!(i64::DTYPE.size_bytes(), 8);
    }

    #[test]
    fn test_floats_use_relative_tolerance() {
        assert!(1.00009f64.same_value(1.0, 1e-4));
        assert!(!1.00011f64.same_value(1.0, 1e-4));
        assert!(!f32::NAN.same_value(f32::NAN, 1e-4));
    }
}
