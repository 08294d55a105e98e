//! Unit tests for kmc-lattice.

#[cfg(test)]
mod cubic {
    use kmc_core::SiteId;

    use crate::{BoundarySetting, Cubic, LatticeError};

    #[test]
    fn index_position_roundtrip() {
        let lattice = Cubic::new(3, 4, 5).unwrap();
        assert_eq!(lattice.site_count(), 60);
        for x in 0..3 {
            for y in 0..4 {
                for z in 0..5 {
                    let site = lattice.index(x, y, z).unwrap();
                    assert_eq!(lattice.position(site).unwrap(), (x, y, z));
                }
            }
        }
    }

    #[test]
    fn bad_dimensions_rejected() {
        assert!(matches!(
            Cubic::new(0, 4, 5),
            Err(LatticeError::BadDimensions { .. })
        ));
        assert!(Cubic::with_spacing(3, 3, 3, 0.0).is_err());
    }

    #[test]
    fn fixed_boundary_rejects_out_of_range() {
        let lattice = Cubic::new(2, 2, 2).unwrap();
        assert!(matches!(
            lattice.index(2, 0, 0),
            Err(LatticeError::OutOfBounds { .. })
        ));
        assert!(lattice.index(-1, 0, 0).is_err());
        assert!(matches!(
            lattice.position(SiteId(8)),
            Err(LatticeError::BadIndex(8))
        ));
    }

    #[test]
    fn periodic_boundary_wraps() {
        let lattice = Cubic::with_boundaries(
            3,
            3,
            3,
            1.0,
            BoundarySetting::Periodic,
            BoundarySetting::Fixed,
            BoundarySetting::Fixed,
        )
        .unwrap();
        assert_eq!(lattice.index(3, 0, 0).unwrap(), lattice.index(0, 0, 0).unwrap());
        assert_eq!(lattice.index(-1, 1, 1).unwrap(), lattice.index(2, 1, 1).unwrap());
        // y stays fixed.
        assert!(lattice.index(0, 3, 0).is_err());
    }

    #[test]
    fn nearest_neighbors_at_unit_cutoff() {
        let lattice = Cubic::new(3, 3, 3).unwrap();
        let center = lattice.index(1, 1, 1).unwrap();
        let neighbors = lattice.neighbors(center, 1.0).unwrap();
        assert_eq!(neighbors.len(), 6);

        // A corner only sees its three in-lattice neighbors.
        let corner = lattice.index(0, 0, 0).unwrap();
        assert_eq!(lattice.neighbors(corner, 1.0).unwrap().len(), 3);
    }

    #[test]
    fn wider_cutoff_reaches_diagonals() {
        let lattice = Cubic::new(3, 3, 3).unwrap();
        let center = lattice.index(1, 1, 1).unwrap();
        // √2 covers face and edge diagonals: 6 + 12.
        let neighbors = lattice.neighbors(center, std::f64::consts::SQRT_2).unwrap();
        assert_eq!(neighbors.len(), 18);
    }

    #[test]
    fn distance_scales_with_spacing() {
        let lattice = Cubic::with_spacing(4, 4, 4, 0.5).unwrap();
        let a = lattice.index(0, 0, 0).unwrap();
        let b = lattice.index(3, 0, 0).unwrap();
        assert!((lattice.distance(a, b).unwrap() - 1.5).abs() < 1e-12);

        let c = lattice.index(1, 1, 0).unwrap();
        let expected = 0.5 * std::f64::consts::SQRT_2;
        assert!((lattice.distance(a, c).unwrap() - expected).abs() < 1e-12);
    }
}

#[cfg(test)]
mod marcus {
    use crate::Marcus;

    #[test]
    fn invalid_parameters_rejected() {
        assert!(Marcus::new(0.0, 0.01, 300.0).is_err());
        assert!(Marcus::new(-0.1, 0.01, 300.0).is_err());
        assert!(Marcus::new(0.2, 0.0, 300.0).is_err());
        assert!(Marcus::new(0.2, 0.01, 0.0).is_err());
    }

    #[test]
    fn activationless_transfer_is_fastest() {
        let marcus = Marcus::new(0.2, 0.01, 300.0).unwrap();
        // The rate peaks where ΔE = −λ (barrierless inverted-region onset).
        let peak = marcus.rate(-0.2);
        assert!(peak > marcus.rate(0.0));
        assert!(peak > marcus.rate(-0.4));
        // Symmetric about the peak.
        assert!((marcus.rate(-0.1) - marcus.rate(-0.3)).abs() / peak < 1e-12);
    }

    #[test]
    fn rates_satisfy_detailed_balance() {
        let marcus = Marcus::new(0.15, 0.005, 300.0).unwrap();
        let delta = 0.05;
        let forward = marcus.rate(delta);
        let backward = marcus.rate(-delta);
        // k(+ΔE)/k(−ΔE) = exp(−ΔE/kT).
        let k_t = 8.617_333_262e-5 * 300.0;
        let expected = (-delta / k_t).exp();
        assert!(
            ((forward / backward) / expected - 1.0).abs() < 1e-9,
            "ratio {} vs {}",
            forward / backward,
            expected
        );
    }

    #[test]
    fn magnitude_is_physical() {
        // Typical organic-semiconductor parameters land within a few orders
        // of 10^12 1/s for barrierless transfer.
        let marcus = Marcus::new(0.2, 0.01, 300.0).unwrap();
        let rate = marcus.rate(0.0);
        assert!(rate > 1e9 && rate < 1e15, "got {rate}");
    }
}
