//! View modes and the mode registry
//!
//! Every [`Mode`] maps to a [`ModeHandler`], a plain function that writes the
//! mode's mutation recipe. The table is a literal built once; lookups never
//! branch on strings outside of [`ModeRegistry::resolve`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::flags::{BufferTarget, ShowFlags, VertexColorViewMode, ViewModeIndex};

/// Visualization mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Lit,
    Unlit,
    Depth,
    Normal,
    Object,
}

impl Mode {
    /// All modes, in registration order
    pub const ALL: [Mode; 5] = [Mode::Lit, Mode::Unlit, Mode::Depth, Mode::Normal, Mode::Object];

    /// Canonical lowercase name
    pub const fn name(&self) -> &'static str {
        match self {
            Mode::Lit => "lit",
            Mode::Unlit => "unlit",
            Mode::Depth => "depth",
            Mode::Normal => "normal",
            Mode::Object => "object",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single render-state mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagMutation {
    /// Select a standard view mode
    ViewMode(ViewModeIndex),
    /// Set a show flag
    Flag(ShowFlags, bool),
    /// Select the global vertex color channel
    VertexColorMode(VertexColorViewMode),
    /// Write the buffer visualization target variable (state-owning thread only)
    VisualizationTarget(BufferTarget),
}

/// Ordered list of mutations produced by a handler
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipe {
    mutations: Vec<FlagMutation>,
}

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: FlagMutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn view_mode(&mut self, index: ViewModeIndex) -> &mut Self {
        self.push(FlagMutation::ViewMode(index))
    }

    pub fn flag(&mut self, flag: ShowFlags, enabled: bool) -> &mut Self {
        self.push(FlagMutation::Flag(flag, enabled))
    }

    pub fn vertex_color_mode(&mut self, mode: VertexColorViewMode) -> &mut Self {
        self.push(FlagMutation::VertexColorMode(mode))
    }

    pub fn visualization_target(&mut self, target: BufferTarget) -> &mut Self {
        self.push(FlagMutation::VisualizationTarget(target))
    }

    /// Mutations in recipe order
    pub fn mutations(&self) -> &[FlagMutation] {
        &self.mutations
    }

    /// The visualization target this recipe writes, if any
    pub fn visualization_target_write(&self) -> Option<BufferTarget> {
        self.mutations.iter().find_map(|m| match m {
            FlagMutation::VisualizationTarget(target) => Some(*target),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Writes a mode's mutations into a recipe
pub type ModeHandler = fn(&mut Recipe);

fn depth(recipe: &mut Recipe) {
    recipe
        .flag(ShowFlags::VISUALIZE_BUFFER, true)
        .visualization_target(BufferTarget::SceneDepth);
}

fn normal(recipe: &mut Recipe) {
    recipe
        .flag(ShowFlags::VISUALIZE_BUFFER, true)
        .visualization_target(BufferTarget::WorldNormal);
}

fn lit(recipe: &mut Recipe) {
    recipe
        .view_mode(ViewModeIndex::Lit)
        .flag(ShowFlags::MATERIALS, true);
}

fn unlit(recipe: &mut Recipe) {
    recipe
        .view_mode(ViewModeIndex::Unlit)
        .flag(ShowFlags::MATERIALS, false);
}

fn object(recipe: &mut Recipe) {
    // Start from lit, then strip shading down to flat vertex colors
    recipe
        .view_mode(ViewModeIndex::Lit)
        .flag(ShowFlags::MATERIALS, false)
        .flag(ShowFlags::LIGHTING, false)
        .flag(ShowFlags::BSP_TRIANGLES, true)
        .flag(ShowFlags::VERTEX_COLORS, true)
        .flag(ShowFlags::POST_PROCESSING, false)
        .flag(ShowFlags::HMD_DISTORTION, false)
        .vertex_color_mode(VertexColorViewMode::Color);
}

const HANDLERS: [(Mode, ModeHandler); 5] = [
    (Mode::Lit, lit),
    (Mode::Unlit, unlit),
    (Mode::Depth, depth),
    (Mode::Normal, normal),
    (Mode::Object, object),
];

/// Registry entry
#[derive(Clone, Copy)]
struct ModeEntry {
    mode: Mode,
    handler: ModeHandler,
}

/// Maps mode names to handlers
#[derive(Clone)]
pub struct ModeRegistry {
    entries: Vec<ModeEntry>,
}

impl ModeRegistry {
    /// Build the dispatch table
    pub fn new() -> Self {
        Self {
            entries: HANDLERS
                .iter()
                .map(|&(mode, handler)| ModeEntry { mode, handler })
                .collect(),
        }
    }

    /// Resolve a case-insensitive name
    pub fn resolve(&self, name: &str) -> Option<Mode> {
        let lower = name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.mode.name() == lower)
            .map(|entry| entry.mode)
    }

    /// Handler for a mode
    pub fn handler(&self, mode: Mode) -> ModeHandler {
        self.entries
            .iter()
            .find(|entry| entry.mode == mode)
            .map(|entry| entry.handler)
            // The table covers the closed set
            .unwrap_or_else(|| unreachable!("no handler registered for {}", mode))
    }

    /// Run a mode's handler into a fresh recipe
    pub fn recipe(&self, mode: Mode) -> Recipe {
        let mut recipe = Recipe::new();
        (self.handler(mode))(&mut recipe);
        recipe
    }

    /// Valid names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.mode.name())
    }

    /// Valid names joined for messages
    pub fn names_joined(&self) -> String {
        self.names().collect::<Vec<_>>().join(", ")
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_case_insensitive() {
        let registry = ModeRegistry::new();
        assert_eq!(registry.resolve("depth"), Some(Mode::Depth));
        assert_eq!(registry.resolve("DePtH"), Some(Mode::Depth));
        assert_eq!(registry.resolve("OBJECT"), Some(Mode::Object));
        assert_eq!(registry.resolve("foo"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_names() {
        let registry = ModeRegistry::new();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["lit", "unlit", "depth", "normal", "object"]);
        assert_eq!(registry.names_joined(), "lit, unlit, depth, normal, object");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Unlit.to_string(), "unlit");
        assert_eq!(ModeRegistry::new().resolve("Normal"), Some(Mode::Normal));
    }

    #[test]
    fn test_depth_recipe() {
        let recipe = ModeRegistry::new().recipe(Mode::Depth);
        assert_eq!(
            recipe.mutations(),
            &[
                FlagMutation::Flag(ShowFlags::VISUALIZE_BUFFER, true),
                FlagMutation::VisualizationTarget(BufferTarget::SceneDepth),
            ]
        );
        assert_eq!(recipe.visualization_target_write(), Some(BufferTarget::SceneDepth));
    }

    #[test]
    fn test_object_recipe_starts_lit() {
        let recipe = ModeRegistry::new().recipe(Mode::Object);
        assert_eq!(recipe.mutations()[0], FlagMutation::ViewMode(ViewModeIndex::Lit));
        assert_eq!(
            recipe.mutations().last(),
            Some(&FlagMutation::VertexColorMode(VertexColorViewMode::Color))
        );
        assert_eq!(recipe.visualization_target_write(), None);
    }

    #[test]
    fn test_handlers_are_repeatable() {
        let registry = ModeRegistry::new();
        for mode in Mode::ALL {
            assert_eq!(registry.recipe(mode), registry.recipe(mode));
            assert!(!registry.recipe(mode).is_empty());
        }
    }
}
