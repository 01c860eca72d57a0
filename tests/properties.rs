#![cfg(feature = "alloc")]

use packmat::eval::funs::{Abs, Clamp, Div, Ge, MulAdd, Sqrt, Sub};
use packmat::eval::{self, tag};
use packmat::simd::{DefaultKind, ScalarKind};
use packmat::{DynMatrix, MaskPack, Pack, PackOf, Real};
use proptest::prelude::*;

type P32 = PackOf<f32, DefaultKind>;
type P64 = PackOf<f64, DefaultKind>;

fn lanes32(v: &[f32; 8]) -> P32 {
    P32::from_fn(|i| v[i])
}

fn lanes64(v: &[f64; 8]) -> P64 {
    P64::from_fn(|i| v[i])
}

fn matrix(nrows: usize, ncols: usize, vals: &[f64]) -> DynMatrix<f64> {
    DynMatrix::from_fn(nrows, ncols, |i, j| vals[(i + j * nrows) % vals.len()])
}

fn bits(m: &DynMatrix<f64>) -> Vec<u64> {
    m.iter().map(|x| x.to_bits()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Lane i of every full-width op depends only on lane i of its operands.
    #[test]
    fn f32_lanes_independent(
        x in prop::array::uniform8(-1.0e3f32..1.0e3),
        y in prop::array::uniform8(-1.0e3f32..1.0e3),
    ) {
        let (a, b) = (lanes32(&x), lanes32(&y));
        let sum = a + b;
        let prod = a * b;
        let lo = a.min(b);
        let hi = a.max(b);
        let root = a.abs().sqrt();
        let rounded = a.round();
        let lt = a.cmp_lt(b);
        for i in 0..P32::WIDTH {
            prop_assert_eq!(sum.extract(i), x[i] + y[i]);
            prop_assert_eq!(prod.extract(i), x[i] * y[i]);
            prop_assert_eq!(lo.extract(i), x[i].lane_min(y[i]));
            prop_assert_eq!(hi.extract(i), x[i].lane_max(y[i]));
            prop_assert_eq!(root.extract(i), x[i].abs().sqrt());
            prop_assert_eq!(rounded.extract(i), x[i].round_even());
            prop_assert_eq!(lt.lane(i), x[i] < y[i]);
        }
        prop_assert_eq!(lt.count(), (0..P32::WIDTH).filter(|&i| x[i] < y[i]).count());
    }

    #[test]
    fn f64_lanes_independent(
        x in prop::array::uniform8(-1.0e6f64..1.0e6),
        y in prop::array::uniform8(1.0f64..1.0e3),
    ) {
        let (a, b) = (lanes64(&x), lanes64(&y));
        let q = a / b;
        let fl = a.floor();
        let tr = a.trunc();
        let picked = P64::select(a.cmp_gt(b), a, b);
        for i in 0..P64::WIDTH {
            prop_assert_eq!(q.extract(i), x[i] / y[i]);
            prop_assert_eq!(fl.extract(i), x[i].floor());
            prop_assert_eq!(tr.extract(i), x[i].trunc());
            prop_assert_eq!(picked.extract(i), if x[i] > y[i] { x[i] } else { y[i] });
        }
    }

    // Partial stores never touch memory past the window.
    #[test]
    fn partial_store_window(x in prop::array::uniform8(-10.0f32..10.0), n in 0usize..=8) {
        let n = n.min(P32::WIDTH);
        let mut buf = [f32::NAN; 8];
        unsafe { lanes32(&x).store_partial(n, buf.as_mut_ptr()) };
        for i in 0..8 {
            if i < n {
                prop_assert_eq!(buf[i], x[i]);
            } else {
                prop_assert!(buf[i].is_nan());
            }
        }
        let back = unsafe { P32::load_partial(n, x.as_ptr()) };
        for i in 0..P32::WIDTH {
            prop_assert_eq!(back.extract(i), if i < n { x[i] } else { 0.0 });
        }
    }

    // Every policy writes the same bits, for every shape.
    #[test]
    fn policies_bit_identical(
        nrows in 0usize..24,
        ncols in 0usize..5,
        vals in prop::collection::vec(-50.0f64..50.0, 1..64),
    ) {
        let a = matrix(nrows, ncols, &vals);
        let b = matrix(nrows, ncols, &vals[vals.len() / 2..]);
        let lo = eval::constant(-10.0, nrows, ncols);
        let hi = eval::constant(10.0, nrows, ncols);
        let expr = || {
            eval::map3(
                Clamp,
                eval::map3(MulAdd, &a, &b, eval::map(Sqrt, eval::map(Abs, &a))),
                lo,
                hi,
            )
        };

        let mut reference = DynMatrix::zeros(nrows, ncols, 0.0);
        eval::evaluate_with::<ScalarKind, tag::ScalarLinear, _, _>(expr(), &mut reference).unwrap();
        let mut out = DynMatrix::zeros(nrows, ncols, 0.0);
        eval::evaluate_with::<DefaultKind, tag::SimdLinear, _, _>(expr(), &mut out).unwrap();
        prop_assert_eq!(bits(&out), bits(&reference));
        let mut out = DynMatrix::zeros(nrows, ncols, 0.0);
        eval::evaluate_with::<DefaultKind, tag::SimdPercol, _, _>(expr(), &mut out).unwrap();
        prop_assert_eq!(bits(&out), bits(&reference));
        let mut out = DynMatrix::zeros(nrows, ncols, 0.0);
        eval::evaluate(expr(), &mut out);
        prop_assert_eq!(bits(&out), bits(&reference));
    }

    // Per-column traversal over a block view matches scalar evaluation.
    #[test]
    fn block_view_matches_scalar(
        rows in 1usize..20,
        vals in prop::collection::vec(-5.0f64..5.0, 1..40),
    ) {
        let big = matrix(rows + 3, 6, &vals);
        let view = || big.view((2, 1), (rows, 4));
        let denom = eval::constant(3.0, rows, 4);
        let shift = DynMatrix::fill(rows, 4, 0.25);
        let mut reference = DynMatrix::zeros(rows, 4, 0.0);
        eval::evaluate_with::<ScalarKind, tag::ScalarPercol, _, _>(
            eval::map2(Div, eval::map2(Sub, view(), &shift), denom),
            &mut reference,
        ).unwrap();
        let mut out = DynMatrix::zeros(rows, 4, 0.0);
        eval::evaluate_with::<DefaultKind, tag::SimdPercol, _, _>(
            eval::map2(Div, eval::map2(Sub, view(), &shift), denom),
            &mut out,
        ).unwrap();
        prop_assert_eq!(bits(&out), bits(&reference));
    }

    // Vector sums stay within the reassociation error of a scalar sum.
    #[test]
    fn sum_close_to_scalar(vals in prop::collection::vec(-100.0f64..100.0, 0..200)) {
        let a = DynMatrix::from_vec(vals.len(), 1, vals.clone());
        let scalar: f64 = vals.iter().sum();
        let bound: f64 = vals.iter().map(|x| x.abs()).sum::<f64>() * 1e-13;
        prop_assert!((eval::sum(&a) - scalar).abs() <= bound + 1e-300);
        let zero = eval::constant(0.0, vals.len(), 1);
        prop_assert_eq!(
            eval::count_of(eval::test2(Ge, &a, zero)),
            vals.iter().filter(|&&x| x >= 0.0).count()
        );
    }
}
