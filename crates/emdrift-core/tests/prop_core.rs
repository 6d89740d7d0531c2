// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Property-Based Tests (proptest) for emdrift-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for emdrift-core using proptest.
//!
//! Covers: boundary flattening, profile normalisation, electrostatic Apar.

mod common;

use common::{config, seed_state, test_grid};
use emdrift_core::boundary::{flatten_inner, flatten_outer};
use emdrift_core::comms::ChannelComm;
use emdrift_core::model::TwoFluidModel;
use emdrift_core::normalize::{Normalization, ReferenceScales};
use emdrift_types::config::TwoFluidOptions;
use ndarray::{Array2, Array3, Axis};
use proptest::prelude::*;

proptest! {
    /// Flattening twice equals flattening once, and every guard row
    /// matches its neighbouring core row afterwards.
    #[test]
    fn flatten_is_idempotent(
        nx in 5usize..12,
        ny in 2usize..6,
        nz in 1usize..5,
        mxg in 1usize..3,
        seed in 0.0f64..10.0,
    ) {
        let mut f = Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| {
            (seed + i as f64 * 1.3 + j as f64 * 0.7 - k as f64).sin()
        });
        flatten_inner(&mut f, mxg);
        flatten_outer(&mut f, mxg);
        let once = f.clone();
        flatten_inner(&mut f, mxg);
        flatten_outer(&mut f, mxg);
        prop_assert_eq!(&f, &once);

        let first = f.index_axis(Axis(0), mxg).to_owned();
        let last = f.index_axis(Axis(0), nx - mxg - 1).to_owned();
        for x in 0..mxg {
            prop_assert_eq!(f.index_axis(Axis(0), x), first.view());
            prop_assert_eq!(f.index_axis(Axis(0), nx - 1 - x), last.view());
        }
    }
}

proptest! {
    /// normalize then denormalize recovers the dimensional profile.
    #[test]
    fn profile_normalisation_round_trip(
        te_x in 1.0f64..1000.0,
        ni_x in 0.01f64..10.0,
        bmag in 0.1f64..5.0,
        value in 0.01f64..100.0,
    ) {
        let scales = ReferenceScales { te_x, ti_x: te_x, ni_x, bmag };
        let norm = Normalization::compute(&scales, &TwoFluidOptions::default())
            .expect("positive scales");
        let f = Array2::from_shape_fn((3, 4), |(i, j)| value * (1.0 + 0.1 * (i + j) as f64));

        let n = norm.denormalize_density(&norm.normalize_density(&f));
        let t = norm.denormalize_temperature(&norm.normalize_temperature(&f));
        for ((a, b), c) in f.iter().zip(n.iter()).zip(t.iter()) {
            prop_assert!((a - b).abs() <= 1e-12 * a.abs());
            prop_assert!((a - c).abs() <= 1e-12 * a.abs());
        }
    }

    /// Non-positive reference scales are rejected.
    #[test]
    fn non_positive_scale_rejected(te_x in -10.0f64..=0.0) {
        let scales = ReferenceScales { te_x, ti_x: 10.0, ni_x: 1.0, bmag: 1.0 };
        prop_assert!(Normalization::compute(&scales, &TwoFluidOptions::default()).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Electrostatic runs never produce a vector potential, whatever the
    /// mesh size and whether Ajpar is evolved.
    #[test]
    fn electrostatic_apar_stays_zero(
        nx in 6usize..10,
        ny in 4usize..8,
        evolve in any::<bool>(),
    ) {
        let mut cfg = config();
        cfg.two_fluid.estatic = true;
        cfg.ajpar.evolve = evolve;
        let comm = ChannelComm::single(ny, cfg.mesh.myg, false).expect("comm");
        let mut model = TwoFluidModel::new(&cfg, &test_grid(nx, ny), comm).expect("model");
        seed_state(&mut model);
        model.evaluate(0.0).expect("step");

        let st = model.state();
        prop_assert!(st.apar.iter().all(|v| *v == 0.0));
        prop_assert!(st.phi.iter().any(|v| *v != 0.0));
        if !evolve {
            prop_assert!(st.f_ajpar.iter().all(|v| *v == 0.0));
        }
    }
}
