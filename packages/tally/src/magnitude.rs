/// A number that can be recorded as a counter delta or counter value.
///
/// Implemented for every primitive integer and float, so counters can be fed straight
/// from `usize` lengths or `u64` byte counts without casting at the call site.
///
/// Counters are stored as `f64`. Integers beyond 2^53 in magnitude lose precision in
/// the conversion.
///
/// # Example
///
/// ```
/// use tally::{CategoryId, Collector, EventKind};
///
/// let collector = Collector::builder().enabled(true).build();
///
/// let payload = vec![0_u8; 1500];
/// collector.record_counter_delta(CategoryId::DEFAULT, "bytes_sent", payload.len());
///
/// let collection = collector.create_collection();
/// let kinds = collection.events().map(|e| e.kind()).collect::<Vec<_>>();
/// assert_eq!(kinds, [EventKind::CounterDelta(1500.0)]);
/// ```
pub trait CounterMagnitude {
    /// The number as stored in a counter event.
    fn to_counter_magnitude(self) -> f64;
}

macro_rules! exact_magnitude {
    ($($t:ty),*) => {
        $(
            impl CounterMagnitude for $t {
                #[inline]
                fn to_counter_magnitude(self) -> f64 {
                    f64::from(self)
                }
            }
        )*
    };
}

macro_rules! rounded_magnitude {
    ($($t:ty),*) => {
        $(
            impl CounterMagnitude for $t {
                #[inline]
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "counters are f64, precision loss above 2^53 is documented"
                )]
                fn to_counter_magnitude(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

exact_magnitude!(u8, u16, u32, i8, i16, i32, f32, f64);
rounded_magnitude!(u64, u128, usize, i64, i128, isize);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::float_cmp, reason = "all values are exactly representable")]

    use super::*;

    #[test]
    fn exact_conversions() {
        assert_eq!(7_u8.to_counter_magnitude(), 7.0);
        assert_eq!((-3_i32).to_counter_magnitude(), -3.0);
        assert_eq!(0.5_f32.to_counter_magnitude(), 0.5);
        assert_eq!(2.25_f64.to_counter_magnitude(), 2.25);
    }

    #[test]
    fn wide_integer_conversions() {
        assert_eq!(1_000_000_u64.to_counter_magnitude(), 1_000_000.0);
        assert_eq!(42_usize.to_counter_magnitude(), 42.0);
        assert_eq!((-42_i64).to_counter_magnitude(), -42.0);
        assert_eq!((-1_isize).to_counter_magnitude(), -1.0);
        assert_eq!(u128::from(u32::MAX).to_counter_magnitude(), 4_294_967_295.0);
    }
}
