// src/optimus.rs

//! Reversible integer scrambling
//!
//! Turns a sequential counter into non-sequential working directory names.
//! `encode(n) = ((n * prime) mod 2^size) xor random`, which is a bijection on
//! `size`-bit integers because the multiplier is odd. Not cryptographic.

use rand::{Rng, RngCore};
use thiserror::Error;

/// Largest supported width in bits
pub const MAX_SIZE: u32 = 31;

/// Smallest supported width in bits
pub const MIN_SIZE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OptimusError {
    #[error("Optimus size ({0}) cannot be less than 3")]
    TooSmall(u32),

    #[error("Optimus size greater than 31 ({0}) not supported")]
    TooLarge(u32),
}

/// A keyed permutation of `size`-bit integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimus {
    prime: u64,
    inverse: u64,
    random: u32,
    max: u64,
}

impl Optimus {
    /// A fresh 31-bit permutation seeded from the thread RNG
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let max = (1u64 << MAX_SIZE) - 1;
        let prime = random_prime(&mut rng, MAX_SIZE);
        let random = rng.next_u32() & max as u32;
        Self::new(prime, random, max)
    }

    /// A fresh `size`-bit permutation drawn from `rng`
    pub fn generate_with<R: Rng>(rng: &mut R, size: u32) -> Result<Self, OptimusError> {
        let max = max_for(size)?;
        let prime = random_prime(rng, size);
        let random = rng.next_u32() & max as u32;
        Ok(Self::new(prime, random, max))
    }

    fn new(prime: u64, random: u32, max: u64) -> Self {
        Self {
            prime,
            inverse: mod_inverse(prime) & max,
            random,
            max,
        }
    }

    pub fn encode(&self, n: u32) -> u32 {
        ((u64::from(n).wrapping_mul(self.prime) & self.max) as u32) ^ self.random
    }

    /// Inverse of [`encode`](Self::encode) for values within the width
    pub fn decode(&self, n: u32) -> u32 {
        (u64::from(n ^ self.random).wrapping_mul(self.inverse) & self.max) as u32
    }
}

fn max_for(size: u32) -> Result<u64, OptimusError> {
    if size < MIN_SIZE {
        return Err(OptimusError::TooSmall(size));
    }
    if size > MAX_SIZE {
        return Err(OptimusError::TooLarge(size));
    }
    Ok((1u64 << size) - 1)
}

/// A prime with exactly `size` significant bits
fn random_prime<R: Rng>(rng: &mut R, size: u32) -> u64 {
    let low = 1u64 << (size - 1);
    let high = 1u64 << size;
    loop {
        let candidate = rng.gen_range(low..high) | 1;
        if is_prime(candidate) {
            return candidate;
        }
    }
}

/// Deterministic Miller-Rabin, exact for all n < 2^32
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in [2u64, 3, 5, 7, 11, 13] {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in [2u64, 7, 61] {
        if a % n == 0 {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = x * x % n;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut result = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exp >>= 1;
    }
    result
}

/// Inverse of an odd `a` modulo 2^64 (Newton iteration)
fn mod_inverse(a: u64) -> u64 {
    let mut inv = a;
    for _ in 0..6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(a.wrapping_mul(inv)));
    }
    inv
}
