//! Unit tests for kmc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ClusterId, SiteId, WalkerId};

    #[test]
    fn index_roundtrip() {
        let id = SiteId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(SiteId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(SiteId(0) < SiteId(1));
        assert!(ClusterId(100) > ClusterId(99));
    }

    #[test]
    fn unassigned_sentinels_are_max() {
        assert_eq!(SiteId::UNASSIGNED.0, u32::MAX);
        assert_eq!(ClusterId::UNASSIGNED.0, u32::MAX);
        assert_eq!(WalkerId::UNASSIGNED.0, u32::MAX);
        assert!(!ClusterId::UNASSIGNED.is_assigned());
        assert!(ClusterId(0).is_assigned());
    }

    #[test]
    fn default_is_unassigned() {
        assert_eq!(ClusterId::default(), ClusterId::UNASSIGNED);
    }

    #[test]
    fn display() {
        assert_eq!(SiteId(7).to_string(), "SiteId(7)");
        assert_eq!(ClusterId(3).to_string(), "ClusterId(3)");
    }
}

#[cfg(test)]
mod rng {
    use crate::FeatureRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = FeatureRng::new(12345);
        let mut r2 = FeatureRng::new(12345);
        for _ in 0..100 {
            assert_eq!(r1.uniform(), r2.uniform());
        }
    }

    #[test]
    fn consecutive_seeds_diverge() {
        let mut r0 = FeatureRng::new(7);
        let mut r1 = FeatureRng::new(8);
        assert_ne!(r0.uniform(), r1.uniform(), "adjacent seeds should diverge");
    }

    #[test]
    fn uniform_in_half_open_interval() {
        let mut rng = FeatureRng::new(0);
        for _ in 0..1000 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn exp_deviate_is_finite_and_positive() {
        let mut rng = FeatureRng::new(1);
        for _ in 0..1000 {
            let t = rng.exp_deviate();
            assert!(t.is_finite());
            assert!(t >= 0.0);
        }
    }

    #[test]
    fn exp_deviate_mean_near_one() {
        let mut rng = FeatureRng::new(99);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| rng.exp_deviate()).sum::<f64>() / n as f64;
        assert!((mean - 1.0).abs() < 0.05, "got mean {mean}");
    }
}
