//! Index types for mesh elements.
//!
//! Vertices, half-edges and faces are addressed through typed wrappers so that a
//! face index can never be passed where a vertex index is expected. Dense
//! spectral operators are `n x n`, so most meshes fit `u32`; `u16` keeps small
//! test meshes compact.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer storage for mesh element ids.
///
/// Implemented for `u16`, `u32` and `u64`. The all-ones value is reserved as
/// the invalid sentinel.
pub trait MeshIndex: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Sentinel for a missing element (a boundary half-edge's face, say).
    const INVALID: Self;

    /// Narrow a `usize`. Overflow is checked in debug builds.
    fn from_usize(v: usize) -> Self;

    /// Widen to `usize`.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($($ty:ty),*) => {$(
        impl MeshIndex for $ty {
            const INVALID: Self = <$ty>::MAX;

            #[inline]
            fn from_usize(v: usize) -> Self {
                debug_assert!(
                    (v as u128) < <$ty>::MAX as u128,
                    "index {} too large for {}",
                    v,
                    stringify!($ty)
                );
                v as $ty
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    )*};
}

impl_mesh_index!(u16, u32, u64);

/// A type-safe vertex index. Also the row of the vertex in every operator.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_id {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Wrap a dense position.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The sentinel id.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Dense position as `usize`.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// False for the sentinel.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != I::INVALID
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.is_valid() {
                    true => write!(f, "{}{}", $tag, self.index()),
                    false => write!(f, "{}-", $tag),
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

impl_id!(VertexId, "v");
impl_id!(HalfEdgeId, "h");
impl_id!(FaceId, "f");
