//! Arena handles.
//!
//! Stream nodes and unit operations live in separate arenas, so each gets its
//! own handle type and one cannot be used to index the other.

use core::fmt;
use core::num::NonZeroU32;

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Handle for arena slot `index`. Saturates at `u32::MAX - 1`.
            pub fn from_index(index: u32) -> Self {
                Self(NonZeroU32::MIN.saturating_add(index))
            }

            pub fn index(self) -> u32 {
                self.0.get() - 1
            }

            pub fn slot(self) -> usize {
                self.index() as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "({})"), self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }
    };
}

arena_handle!(
    /// Stream node in a flowsheet's node arena.
    NodeId,
    "Node"
);

arena_handle!(
    /// Unit operation in a flowsheet's unit registry.
    UnitId,
    "Unit"
);
