//! Property-based tests for polynomial arithmetic
//!
//! Checks the ring laws the decoders rely on over GF(65537) and GF(2^8).

use nttec::{BinExtension, Field, Poly, Prime};
use proptest::prelude::*;

fn prime() -> Prime<u32> {
    Prime::new(65537).unwrap()
}

fn gf256() -> BinExtension<u32> {
    BinExtension::new(8).unwrap()
}

fn coefficients(max: u32) -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0..max, 0..12)
}

proptest! {
    /// Property: (a + b) - b = a
    #[test]
    fn prop_add_then_sub_is_identity(
        a in coefficients(65537),
        b in coefficients(65537),
    ) {
        let field = prime();
        let a = Poly::from_coefficients(field, &a);
        let b = Poly::from_coefficients(field, &b);

        let mut sum = a.clone();
        sum.add(&b);
        sum.sub(&b);
        prop_assert_eq!(sum, a);
    }

    /// Property: a = (a / d)·d + a % d with deg(a % d) < deg(d)
    #[test]
    fn prop_division_identity(
        a in coefficients(65537),
        d in coefficients(65537),
    ) {
        let field = prime();
        let a = Poly::from_coefficients(field, &a);
        let d = Poly::from_coefficients(field, &d);
        prop_assume!(!d.is_zero());

        let mut q = Poly::new(field);
        let mut r = Poly::new(field);
        Poly::div_into(Some(&mut q), Some(&mut r), &a, &d).unwrap();
        prop_assert!(r.is_zero() || r.degree() < d.degree());

        let mut rebuilt = Poly::new(field);
        Poly::mul_into(&mut rebuilt, &q, &d);
        rebuilt.add(&r);
        prop_assert_eq!(rebuilt, a);
    }

    /// Property: division identity also holds in characteristic 2
    #[test]
    fn prop_division_identity_gf256(
        a in coefficients(256),
        d in coefficients(256),
    ) {
        let field = gf256();
        let a = Poly::from_coefficients(field, &a);
        let d = Poly::from_coefficients(field, &d);
        prop_assume!(!d.is_zero());

        let mut q = a.clone();
        q.div(&d).unwrap();
        let mut r = a.clone();
        r.rem(&d).unwrap();
        prop_assert!(r.is_zero() || r.degree() < d.degree());

        q.mul(&d);
        q.add(&r);
        prop_assert_eq!(q, a);
    }

    /// Property: (a + b)' = a' + b'
    #[test]
    fn prop_derivative_is_linear(
        a in coefficients(65537),
        b in coefficients(65537),
    ) {
        let field = prime();
        let a = Poly::from_coefficients(field, &a);
        let b = Poly::from_coefficients(field, &b);

        let mut sum = a.clone();
        sum.add(&b);
        sum.derivative();

        let mut da = a.clone();
        da.derivative();
        let mut db = b.clone();
        db.derivative();
        da.add(&db);

        prop_assert_eq!(sum, da);
    }

    /// Property: evaluation is a ring homomorphism, (a·b)(x) = a(x)·b(x)
    #[test]
    fn prop_eval_of_product(
        a in coefficients(65537),
        b in coefficients(65537),
        x in 0u32..65537,
    ) {
        let field = prime();
        let a = Poly::from_coefficients(field, &a);
        let b = Poly::from_coefficients(field, &b);

        let mut product = Poly::new(field);
        Poly::mul_into(&mut product, &a, &b);
        prop_assert_eq!(product.eval(x), field.mul(a.eval(x), b.eval(x)));
    }

    /// Property: the product of (x + c_i) vanishes exactly at every -c_i
    #[test]
    fn prop_mul_to_x_plus_coef_roots(
        roots in prop::collection::vec(1u32..65537, 1..8),
    ) {
        let field = prime();
        let mut p = Poly::one(field);
        for &c in &roots {
            p.mul_to_x_plus_coef(c);
        }
        prop_assert_eq!(p.degree(), roots.len());
        for &c in &roots {
            prop_assert_eq!(p.eval(field.neg(c)), 0);
        }
    }
}
