//! Render Flag Surface
//!
//! The show-flag toggles a viewport renders with, and the capabilities the
//! controller needs from the host to change them:
//! - [`ShowFlags`]: bitset of named boolean toggles
//! - [`RenderFlagSurface`]: "can set a named flag", "can select a view mode"
//! - [`RenderTargetProvider`]: hands out the currently active surface
//!
//! # Example
//!
//! ```
//! use void_viewmode::flags::{ShowFlags, ViewModeIndex};
//!
//! let mut flags = ShowFlags::default();
//! flags.apply_view_mode(ViewModeIndex::Unlit);
//! assert!(!flags.contains(ShowFlags::LIGHTING));
//!
//! flags.set(ShowFlags::VISUALIZE_BUFFER, true);
//! assert!(flags.contains(ShowFlags::VISUALIZE_BUFFER));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Show flags (bitflags-style)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ShowFlags(u32);

impl ShowFlags {
    /// No flags
    pub const NONE: Self = Self(0);

    /// Render surface materials
    pub const MATERIALS: Self = Self(1 << 0);

    /// Apply scene lighting
    pub const LIGHTING: Self = Self(1 << 1);

    /// Replace the final image with a buffer visualization target
    pub const VISUALIZE_BUFFER: Self = Self(1 << 2);

    /// Show solid geometry triangles
    pub const BSP_TRIANGLES: Self = Self(1 << 3);

    /// Show per-vertex colors
    pub const VERTEX_COLORS: Self = Self(1 << 4);

    /// Run the post-processing chain
    pub const POST_PROCESSING: Self = Self(1 << 5);

    /// Apply head-mounted display lens distortion
    pub const HMD_DISTORTION: Self = Self(1 << 6);

    const NAMED: [(Self, &'static str); 7] = [
        (Self::MATERIALS, "materials"),
        (Self::LIGHTING, "lighting"),
        (Self::VISUALIZE_BUFFER, "visualize_buffer"),
        (Self::BSP_TRIANGLES, "bsp_triangles"),
        (Self::VERTEX_COLORS, "vertex_colors"),
        (Self::POST_PROCESSING, "post_processing"),
        (Self::HMD_DISTORTION, "hmd_distortion"),
    ];

    /// Create empty flags
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Check if contains flag
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Insert a flag
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Remove a flag
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set a flag to a specific state
    #[inline]
    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Reset the flags a standard view mode owns.
    ///
    /// Lighting follows the mode, buffer visualization and solid-geometry
    /// display are cleared and post-processing is re-enabled. Materials are
    /// left to the caller.
    pub fn apply_view_mode(&mut self, index: ViewModeIndex) {
        self.set(Self::LIGHTING, index == ViewModeIndex::Lit);
        self.remove(Self::VISUALIZE_BUFFER);
        self.remove(Self::BSP_TRIANGLES);
        self.insert(Self::POST_PROCESSING);
    }
}

impl Default for ShowFlags {
    /// Game defaults: lit, textured, post-processed
    fn default() -> Self {
        Self::MATERIALS | Self::LIGHTING | Self::POST_PROCESSING | Self::HMD_DISTORTION
    }
}

impl fmt::Display for ShowFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

impl core::ops::BitOr for ShowFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for ShowFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl core::ops::BitAnd for ShowFlags {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Standard view mode a viewport can be switched to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewModeIndex {
    #[default]
    Lit,
    Unlit,
}

/// Which vertex color channel is displayed when vertex colors are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexColorViewMode {
    #[default]
    Invalid,
    Color,
    Alpha,
    Red,
    Green,
    Blue,
}

/// Buffer visualization channel selectable through the target variable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferTarget {
    SceneDepth,
    WorldNormal,
}

/// The flag-setting capability of a render target.
///
/// The controller only calls these from a task on the state-owning thread,
/// through a shared reference. Implementations still own their
/// synchronization for readers on other threads.
pub trait RenderFlagSurface: Send + Sync {
    /// Set a single named flag
    fn set_flag(&self, flag: ShowFlags, enabled: bool);

    /// Select a standard view mode
    fn set_view_mode_index(&self, index: ViewModeIndex);

    /// Select the global vertex color display channel
    fn set_vertex_color_view_mode(&self, mode: VertexColorViewMode);
}

/// Supplies the currently active render target
pub trait RenderTargetProvider: Send + Sync {
    fn active_target(&self) -> Option<Arc<dyn RenderFlagSurface>>;
}
