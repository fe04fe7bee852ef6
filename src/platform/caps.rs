//! CPU capability flags relevant to lane-width selection.

/// A set of CPU features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Caps(u32);

impl Caps {
    pub const NONE: Self = Self(0);
    /// 256-bit integer SIMD (x86_64).
    pub const AVX2: Self = Self(1 << 0);
    /// 512-bit integer SIMD (x86_64).
    pub const AVX512F: Self = Self(1 << 1);
    /// 128-bit SIMD (aarch64).
    pub const NEON: Self = Self(1 << 2);

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when every feature in `required` is present.
    #[inline]
    #[must_use]
    pub const fn has(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Features of the running CPU.
    ///
    /// With `std` this is a runtime query; without it only the features the
    /// crate was compiled for are reported.
    #[allow(unused_mut)]
    #[must_use]
    pub fn detect() -> Self {
        let mut caps = Self::NONE;

        #[cfg(all(feature = "std", target_arch = "x86_64"))]
        {
            if std::arch::is_x86_feature_detected!("avx2") {
                caps = caps.union(Self::AVX2);
            }
            if std::arch::is_x86_feature_detected!("avx512f") {
                caps = caps.union(Self::AVX512F);
            }
        }

        #[cfg(all(not(feature = "std"), target_arch = "x86_64"))]
        {
            if cfg!(target_feature = "avx2") {
                caps = caps.union(Self::AVX2);
            }
            if cfg!(target_feature = "avx512f") {
                caps = caps.union(Self::AVX512F);
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if cfg!(target_feature = "neon") {
                caps = caps.union(Self::NEON);
            }
        }

        caps
    }
}
