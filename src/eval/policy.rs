//! Execution policies and the static policy selector.
//!
//! A policy fixes two things: whether the destination is traversed as one
//! flat run (*linear*) or column by column (*per-column*), and whether full
//! vector packs or width-1 packs are used. The choice is a `const` computed
//! from the expression and destination types, so it is made once per type
//! pairing and never per call.

use core::fmt::Debug;

use crate::simd::{OpSet, Pack, PackElement, PackOf, SimdKind, has_vector_form};

use super::expr::MatExpr;

/// Statically known run length below which a vector policy is only used if
/// the run divides evenly into packs. Tunable.
pub const SMALL_STATIC_LEN: usize = 16;

/// The four execution strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    ScalarLinear,
    ScalarPercol,
    SimdLinear,
    SimdPercol,
}

impl Policy {
    #[inline]
    pub const fn is_linear(self) -> bool {
        matches!(self, Policy::ScalarLinear | Policy::SimdLinear)
    }

    #[inline]
    pub const fn is_simd(self) -> bool {
        matches!(self, Policy::SimdLinear | Policy::SimdPercol)
    }
}

/// Zero-size policy marker, for forcing a policy at a call site.
pub trait AccessPolicy: Copy + Default + Debug + 'static {
    const POLICY: Policy;
}

/// Zero-size markers implementing [`AccessPolicy`].
pub mod tag {
    use super::{AccessPolicy, Policy};

    #[derive(Clone, Copy, Debug, Default)]
    pub struct ScalarLinear;
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ScalarPercol;
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SimdLinear;
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SimdPercol;

    impl AccessPolicy for ScalarLinear {
        const POLICY: Policy = Policy::ScalarLinear;
    }
    impl AccessPolicy for ScalarPercol {
        const POLICY: Policy = Policy::ScalarPercol;
    }
    impl AccessPolicy for SimdLinear {
        const POLICY: Policy = Policy::SimdLinear;
    }
    impl AccessPolicy for SimdPercol {
        const POLICY: Policy = Policy::SimdPercol;
    }
}

/// Memory layout capabilities of an expression or destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Whole storage is one contiguous column-major run.
    pub linear: bool,
    /// Each column is contiguous.
    pub percol: bool,
}

impl Layout {
    pub const CONTIGUOUS: Layout = Layout { linear: true, percol: true };
    pub const PER_COLUMN: Layout = Layout { linear: false, percol: true };
    pub const STRIDED: Layout = Layout { linear: false, percol: false };

    /// Layout supported by both `self` and `other`.
    #[inline]
    pub const fn and(self, other: Layout) -> Layout {
        Layout {
            linear: self.linear && other.linear,
            percol: self.percol && other.percol,
        }
    }
}

/// Combine two static dimensions. Conflicting known values fail to build.
pub const fn merge_dim(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => {
            if x != y {
                panic!("operands have different static dimensions");
            }
            Some(x)
        }
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Choose a policy.
///
/// 1. A statically known run that is shorter than [`SMALL_STATIC_LEN`] and
///    not a multiple of `width` runs scalar.
/// 2. Linear layout with vector forms for every op runs `SimdLinear`.
/// 3. Per-column layout with the same runs `SimdPercol`.
/// 4. Otherwise `ScalarLinear` if the layout is linear, else `ScalarPercol`.
///
/// The run is `rows * cols` for linear layouts and `rows` for per-column.
pub const fn select_policy(
    vector_ops: bool,
    layout: Layout,
    rows: Option<usize>,
    cols: Option<usize>,
    width: usize,
) -> Policy {
    let fallback = if layout.linear {
        Policy::ScalarLinear
    } else {
        Policy::ScalarPercol
    };
    if width <= 1 || !vector_ops || !layout.percol {
        return fallback;
    }
    let run = if layout.linear {
        match (rows, cols) {
            (Some(r), Some(c)) => Some(r * c),
            _ => None,
        }
    } else {
        rows
    };
    if let Some(n) = run {
        if n % width != 0 && n < SMALL_STATIC_LEN {
            return fallback;
        }
    }
    if layout.linear {
        Policy::SimdLinear
    } else {
        Policy::SimdPercol
    }
}

/// Policy chosen for evaluating `E` into `D` with packs of kind `K`.
pub const fn preferred_policy<E, D, K>() -> Policy
where
    E: MatExpr,
    D: MatExpr<Elem = E::Elem>,
    K: SimdKind,
    E::Elem: PackElement<K>,
{
    select_policy(
        has_vector_form::<E::Elem, K>(E::OPS.union(D::OPS)),
        E::LAYOUT.and(D::LAYOUT),
        merge_dim(E::ROWS, D::ROWS),
        merge_dim(E::COLS, D::COLS),
        <PackOf<E::Elem, K> as Pack>::WIDTH,
    )
}

/// Policy chosen for reducing `E` with packs of kind `K`, for a reduction
/// using `ops`.
pub const fn reduce_policy<E, K>(ops: OpSet) -> Policy
where
    E: MatExpr,
    K: SimdKind,
    E::Elem: PackElement<K>,
{
    select_policy(
        has_vector_form::<E::Elem, K>(E::OPS.union(ops)),
        E::LAYOUT,
        E::ROWS,
        E::COLS,
        <PackOf<E::Elem, K> as Pack>::WIDTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_small_static_prefers_scalar() {
        let p = select_policy(true, Layout::CONTIGUOUS, Some(3), Some(3), 4);
        assert_eq!(p, Policy::ScalarLinear);
        let p = select_policy(true, Layout::PER_COLUMN, Some(3), Some(100), 4);
        assert_eq!(p, Policy::ScalarPercol);
    }

    #[test]
    fn small_but_divisible_stays_simd() {
        let p = select_policy(true, Layout::CONTIGUOUS, Some(2), Some(4), 4);
        assert_eq!(p, Policy::SimdLinear);
    }

    #[test]
    fn large_static_stays_simd() {
        let p = select_policy(true, Layout::CONTIGUOUS, Some(17), Some(1), 4);
        assert_eq!(p, Policy::SimdLinear);
    }

    #[test]
    fn runtime_shapes() {
        assert_eq!(select_policy(true, Layout::CONTIGUOUS, None, None, 8), Policy::SimdLinear);
        assert_eq!(select_policy(true, Layout::PER_COLUMN, None, None, 8), Policy::SimdPercol);
        assert_eq!(select_policy(true, Layout::STRIDED, None, None, 8), Policy::ScalarPercol);
        // row count known, column count not: linear run length unknown
        assert_eq!(select_policy(true, Layout::CONTIGUOUS, Some(3), None, 4), Policy::SimdLinear);
    }

    #[test]
    fn missing_vector_form_falls_back() {
        assert_eq!(select_policy(false, Layout::CONTIGUOUS, None, None, 4), Policy::ScalarLinear);
        assert_eq!(select_policy(false, Layout::PER_COLUMN, None, None, 4), Policy::ScalarPercol);
        assert_eq!(select_policy(true, Layout::CONTIGUOUS, None, None, 1), Policy::ScalarLinear);
    }

    #[test]
    fn layout_and() {
        assert_eq!(Layout::CONTIGUOUS.and(Layout::PER_COLUMN), Layout::PER_COLUMN);
        assert_eq!(Layout::PER_COLUMN.and(Layout::STRIDED), Layout::STRIDED);
    }

    #[test]
    fn dims() {
        assert_eq!(merge_dim(Some(3), None), Some(3));
        assert_eq!(merge_dim(None, None), None);
        assert_eq!(merge_dim(Some(2), Some(2)), Some(2));
    }

    #[test]
    fn policy_flags() {
        assert!(Policy::SimdLinear.is_linear() && Policy::SimdLinear.is_simd());
        assert!(!Policy::ScalarPercol.is_linear() && !Policy::ScalarPercol.is_simd());
    }
}
