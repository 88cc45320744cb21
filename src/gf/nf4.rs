//! NF4: several GF(65537) lanes packed into one element
//!
//! An element holds `lanes` (1 to 4) independent GF(65537) values, lane `i`
//! at bits `[32i, 32i + 32)`. Every operation works lane-wise. Data words use
//! a denser layout, lane `i` at bits `[16i, 16i + 16)`; [`Nf4::pack`] and
//! [`Nf4::unpack`] convert between the two.
//!
//! A 16-bit data value cannot represent 65536, the largest lane value, so
//! packing and unpacking carry a per-lane flag: bit `i` of the flag is set
//! exactly when lane `i` equals 65536.
//!
//! With 128-bit elements the arithmetic runs on the lane-parallel kernels
//! in [`crate::simd`].

use super::{Field, Prime};
use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::simd;
use std::marker::PhantomData;

/// Lane modulus
pub const MODULUS: u32 = simd::MODULUS;

/// Lane value that does not fit in a 16-bit data lane
pub const SENTINEL: u32 = MODULUS - 1;

pub const MAX_LANES: u32 = 4;

/// Raw 16-bit lanes together with the sentinel flag recovered by [`Nf4::unpack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupedValues<T> {
    pub values: T,
    pub flag: u32,
}

#[derive(Debug)]
pub struct Nf4<T> {
    lanes: u32,
    sub_field: Prime<u32>,
    _elem: PhantomData<T>,
}

impl<T> Clone for Nf4<T> {
    fn clone(&self) -> Self {
        Self {
            lanes: self.lanes,
            sub_field: self.sub_field,
            _elem: PhantomData,
        }
    }
}

impl<T: Element> Nf4<T> {
    pub fn new(lanes: u32) -> FecResult<Self> {
        if lanes == 0 || lanes > MAX_LANES {
            return Err(FecError::invalid(format!(
                "NF4 supports 1 to {} lanes, got {}",
                MAX_LANES, lanes
            )));
        }
        if T::BITS < 32 * lanes {
            return Err(FecError::invalid(format!(
                "{}-bit elements cannot hold {} NF4 lanes",
                T::BITS,
                lanes
            )));
        }
        Ok(Self {
            lanes,
            sub_field: Prime::new(MODULUS as u64)?,
            _elem: PhantomData,
        })
    }

    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    /// GF(65537), the field each lane lives in
    pub fn sub_field(&self) -> &Prime<u32> {
        &self.sub_field
    }

    /// Value of lane `i`
    #[inline]
    pub fn get(&self, a: T, i: u32) -> u32 {
        (a >> (32 * i)).as_u64() as u32
    }

    #[inline]
    fn build(&self, lane: impl Fn(u32) -> u32) -> T {
        (0..self.lanes).fold(T::ZERO, |acc, i| {
            acc | (T::from_u64(lane(i) as u64) << (32 * i))
        })
    }

    #[inline]
    fn map2(&self, a: T, b: T, op: impl Fn(u32, u32) -> u32) -> T {
        self.build(|i| op(self.get(a, i), self.get(b, i)))
    }

    /// `v` in every active lane
    pub fn replicate(&self, v: u32) -> T {
        self.build(|_| v)
    }

    /// Element built from explicit lane values; missing lanes are zero
    pub fn from_lanes(&self, values: &[u32]) -> T {
        self.build(|i| values.get(i as usize).copied().unwrap_or(0))
    }

    /// Spread 16-bit data lanes to 32-bit field lanes, restoring flagged sentinels
    pub fn pack(&self, a: T, flag: u32) -> T {
        self.build(|i| {
            if flag >> i & 1 == 1 {
                SENTINEL
            } else {
                ((a >> (16 * i)).as_u64() & 0xFFFF) as u32
            }
        })
    }

    /// Compress field lanes to 16-bit data lanes, flagging sentinels
    pub fn unpack(&self, a: T) -> GroupedValues<T> {
        let mut values = T::ZERO;
        let mut flag = 0u32;
        for i in 0..self.lanes {
            let lane = self.get(a, i);
            if lane == SENTINEL {
                flag |= 1 << i;
            }
            values = values | (T::from_u64((lane & 0xFFFF) as u64) << (16 * i));
        }
        GroupedValues { values, flag }
    }

    #[inline]
    fn wide(a: T) -> Option<u128> {
        (T::BITS == 128).then(|| bytemuck::cast(a))
    }
}

impl<T: Element> Field for Nf4<T> {
    type Elem = T;

    fn card(&self) -> u64 {
        MODULUS as u64
    }

    fn characteristic(&self) -> u64 {
        MODULUS as u64
    }

    fn check(&self, a: T) -> bool {
        let used = 32 * self.lanes;
        if used < T::BITS && a >> used != T::ZERO {
            return false;
        }
        (0..self.lanes).all(|i| self.get(a, i) < MODULUS)
    }

    fn one(&self) -> T {
        self.replicate(1)
    }

    #[inline]
    fn add(&self, a: T, b: T) -> T {
        if let (Some(x), Some(y)) = (Self::wide(a), Self::wide(b)) {
            return bytemuck::cast(simd::add(x, y));
        }
        self.map2(a, b, |x, y| self.sub_field.add(x, y))
    }

    #[inline]
    fn sub(&self, a: T, b: T) -> T {
        if let (Some(x), Some(y)) = (Self::wide(a), Self::wide(b)) {
            return bytemuck::cast(simd::sub(x, y));
        }
        self.map2(a, b, |x, y| self.sub_field.sub(x, y))
    }

    #[inline]
    fn mul(&self, a: T, b: T) -> T {
        if let (Some(x), Some(y)) = (Self::wide(a), Self::wide(b)) {
            return bytemuck::cast(simd::mul(x, y));
        }
        self.map2(a, b, |x, y| self.sub_field.mul(x, y))
    }

    fn inv(&self, a: T) -> FecResult<T> {
        let mut out = T::ZERO;
        for i in 0..self.lanes {
            let lane = self.sub_field.inv(self.get(a, i))?;
            out = out | (T::from_u64(lane as u64) << (32 * i));
        }
        Ok(out)
    }

    fn from_integer(&self, i: u64) -> T {
        self.replicate((i % MODULUS as u64) as u32)
    }

    fn primitive_root(&self) -> T {
        self.replicate(self.sub_field.primitive_root())
    }

    fn hadamard_mul(&self, x: &mut [T], y: &[T]) {
        if T::BITS == 128 {
            simd::hadamard_mul(bytemuck::cast_slice_mut(x), bytemuck::cast_slice(y));
            return;
        }
        for (a, &b) in x.iter_mut().zip(y) {
            *a = self.mul(*a, b);
        }
    }
}
