pub(crate) trait TestHelper {
    fn assert_approx_eq<const N: usize>(&self, expected: [f64; N]);
}

impl TestHelper for [f64] {
    fn assert_approx_eq<const N: usize>(&self, expected: [f64; N]) {
        assert_eq!(self.len(), N, "length mismatch: {self:?} vs {expected:?}");
        for (i, (actual, expected)) in self.iter().zip(expected).enumerate() {
            assert!(
                (actual - expected).abs() <= 1e-5 * expected.abs().max(1.0),
                "index {i}: {actual} != {expected}"
            );
        }
    }
}

impl TestHelper for f64 {
    fn assert_approx_eq<const N: usize>(&self, expected: [f64; N]) {
        std::slice::from_ref(self).assert_approx_eq(expected);
    }
}
