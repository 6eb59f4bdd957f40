/// Min-max scaling over one comparison set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    pub(crate) fn over<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |range, value| match range {
            None => Some(Self {
                min: value,
                max: value,
            }),
            Some(Self { min, max }) => Some(Self {
                min: min.min(value),
                max: max.max(value),
            }),
        })
    }

    /// Position of `value` in `[0, 1]`; zero when every value in the set is equal.
    pub(crate) fn scale(&self, value: f64) -> f64 {
        let spread = self.max - self.min;
        if spread <= f64::EPSILON * self.max.abs().max(1.0) {
            return 0.0;
        }
        ((value - self.min) / spread).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_range() {
        assert!(MinMax::over(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn equal_values_scale_to_zero() {
        let range = MinMax::over([4.0, 4.0]).expect("range");
        assert_eq!(range.scale(4.0), 0.0);
    }

    #[test]
    fn endpoints_scale_to_unit_interval() {
        let range = MinMax::over([10.0, 30.0, 20.0]).expect("range");
        assert_eq!(range.scale(10.0), 0.0);
        assert_eq!(range.scale(30.0), 1.0);
        assert_eq!(range.scale(20.0), 0.5);
    }
}
