use num_traits::{Bounded, NumCast};

/// Numeric type of a single image channel.
///
/// Interpolation runs in `f64`; the result is written back through
/// [`PixelValue::from_f64_saturating`], which rounds and clamps integer
/// channels to their representable range.
pub trait PixelValue: Copy + Default + Send + Sync + 'static {
    /// Widen the channel value to double precision.
    fn to_f64(self) -> f64;

    /// Narrow a double precision value into the channel type.
    ///
    /// Integer channels are rounded to the nearest value and clamped to
    /// `[T::MIN, T::MAX]`. Floating point channels are stored as is. NaN maps to zero.
    fn from_f64_saturating(value: f64) -> Self;
}

macro_rules! impl_pixel_value_int {
    ($($t:ty),*) => {
        $(
            impl PixelValue for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64_saturating(value: f64) -> Self {
                    if value.is_nan() {
                        return 0;
                    }
                    let lo = <$t as Bounded>::min_value() as f64;
                    let hi = <$t as Bounded>::max_value() as f64;
                    <$t as NumCast>::from(value.round().clamp(lo, hi)).unwrap_or_default()
                }
            }
        )*
    };
}

macro_rules! impl_pixel_value_float {
    ($($t:ty),*) => {
        $(
            impl PixelValue for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64_saturating(value: f64) -> Self {
                    if value.is_nan() {
                        return 0.0;
                    }
                    value as $t
                }
            }
        )*
    };
}

impl_pixel_value_int!(u8, u16);
impl_pixel_value_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::PixelValue;

    #[test]
    fn u8_rounds_and_clamps() {
        assert_eq!(u8::from_f64_saturating(127.49), 127);
        assert_eq!(u8::from_f64_saturating(127.5), 128);
        assert_eq!(u8::from_f64_saturating(-12.0), 0);
        assert_eq!(u8::from_f64_saturating(300.7), 255);
        assert_eq!(u8::from_f64_saturating(f64::NAN), 0);
    }

    #[test]
    fn u16_clamps_to_range() {
        assert_eq!(u16::from_f64_saturating(70_000.0), u16::MAX);
        assert_eq!(u16::from_f64_saturating(-0.4), 0);
        assert_eq!(u16::from_f64_saturating(1023.6), 1024);
    }

    #[test]
    fn float_passes_through() {
        assert_eq!(f32::from_f64_saturating(-1.25), -1.25f32);
        assert_eq!(f32::from_f64_saturating(f64::NAN), 0.0);
        assert_eq!(0.5f32.to_f64(), 0.5);
    }
}
