//! Recursive page composition model.
//!
//! A page is a tree of sections, each holding containers, each holding typed
//! blocks. Every node carries per-breakpoint style overrides. The tree is the
//! unit of storage, editing, and rendering; it must survive serde round-trips
//! byte-for-byte stable in meaning.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root of a page's content.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PageTree {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A horizontal band of the page. Sections stack vertically and are the unit
/// of reordering in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Section {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default)]
    pub styles: Styles,
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A flex wrapper inside a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Container {
    pub id: String,
    #[serde(default)]
    pub styles: Styles,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// A leaf (or, for grids, a nested branch) of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub styles: Styles,
    pub kind: BlockKind,
}

/// Typed block payloads, dispatched on the `type` tag.
///
/// `Grid` is the recursive case: a block that lays out nested blocks in
/// columns. Everything else is a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockKind {
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    /// Markdown source, rendered to HTML at display time.
    RichText { markdown: String },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Button {
        label: String,
        href: String,
        #[serde(default)]
        new_tab: bool,
    },
    Divider {},
    /// Vertical whitespace in pixels.
    Spacer { height: u32 },
    Video {
        src: String,
        #[serde(default)]
        autoplay: bool,
        #[serde(default = "default_true")]
        controls: bool,
    },
    /// Raw HTML. Escaped on render unless `trusted` is set by an editor.
    Embed {
        html: String,
        #[serde(default)]
        trusted: bool,
    },
    Grid {
        columns: u8,
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

fn default_heading_level() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

impl BlockKind {
    /// Stable kind name matching the serde `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::RichText { .. } => "richText",
            Self::Image { .. } => "image",
            Self::Button { .. } => "button",
            Self::Divider {} => "divider",
            Self::Spacer { .. } => "spacer",
            Self::Video { .. } => "video",
            Self::Embed { .. } => "embed",
            Self::Grid { .. } => "grid",
        }
    }
}

/// The three fixed rendering breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Desktop,
    Tablet,
    Mobile,
}

/// Per-breakpoint style overrides. Desktop is the base; tablet and mobile are
/// partial overrides applied in cascade order desktop → tablet → mobile.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Styles {
    pub desktop: StyleProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tablet: Option<StyleProps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<StyleProps>,
}

impl Styles {
    /// Fully resolved properties at a breakpoint.
    ///
    /// Tablet inherits from desktop; mobile inherits from the resolved tablet
    /// set, so a tablet override carries down unless mobile overrides again.
    pub fn resolve(&self, breakpoint: Breakpoint) -> StyleProps {
        match breakpoint {
            Breakpoint::Desktop => self.desktop.clone(),
            Breakpoint::Tablet => match &self.tablet {
                Some(tablet) => self.desktop.merged_with(tablet),
                None => self.desktop.clone(),
            },
            Breakpoint::Mobile => {
                let tablet = self.resolve(Breakpoint::Tablet);
                match &self.mobile {
                    Some(mobile) => tablet.merged_with(mobile),
                    None => tablet,
                }
            }
        }
    }

    /// The raw override set for a non-desktop breakpoint, if any.
    pub fn override_for(&self, breakpoint: Breakpoint) -> Option<&StyleProps> {
        match breakpoint {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => self.tablet.as_ref(),
            Breakpoint::Mobile => self.mobile.as_ref(),
        }
    }
}

/// Partial visual property set. Every field optional; `None` means "inherit
/// from the previous breakpoint" (or the browser default on desktop).
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StyleProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<AxisAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify: Option<AxisAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl StyleProps {
    /// Field-wise override merge: `over` wins wherever it is `Some`.
    pub fn merged_with(&self, over: &Self) -> Self {
        macro_rules! pick {
            ($field:ident) => {
                over.$field.clone().or_else(|| self.$field.clone())
            };
        }
        Self {
            direction: pick!(direction),
            gap: pick!(gap),
            padding: pick!(padding),
            margin: pick!(margin),
            width: pick!(width),
            max_width: pick!(max_width),
            align: pick!(align),
            justify: pick!(justify),
            font_size: pick!(font_size),
            font_weight: pick!(font_weight),
            text_align: pick!(text_align),
            color: pick!(color),
            background: pick!(background),
            border_radius: pick!(border_radius),
            hidden: pick!(hidden),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Flex main-axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Row,
    Column,
}

impl Direction {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

/// Flex axis alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AxisAlign {
    Start,
    Center,
    End,
    Stretch,
}

impl AxisAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Start => "flex-start",
            Self::Center => "center",
            Self::End => "flex-end",
            Self::Stretch => "stretch",
        }
    }
}

/// Text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Structural bounds enforced before a tree is accepted for storage.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_sections: usize,
    pub max_containers_per_section: usize,
    pub max_blocks_per_container: usize,
    pub max_grid_depth: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_sections: 64,
            max_containers_per_section: 16,
            max_blocks_per_container: 64,
            max_grid_depth: 4,
        }
    }
}

/// Structural validation failures. Surfaced as 422-style API errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Empty node id")]
    EmptyId,
    #[error("Duplicate node id `{id}`")]
    DuplicateId { id: String },
    #[error("Too many sections: {count} exceeds {limit}")]
    TooManySections { count: usize, limit: usize },
    #[error("Section `{section}` has too many containers: {count} exceeds {limit}")]
    TooManyContainers { section: String, count: usize, limit: usize },
    #[error("Container `{container}` has too many blocks: {count} exceeds {limit}")]
    TooManyBlocks { container: String, count: usize, limit: usize },
    #[error("Grid `{id}` nested deeper than {limit} levels")]
    GridTooDeep { id: String, limit: usize },
    #[error("Heading `{id}` level {level} outside 1..=6")]
    HeadingLevel { id: String, level: u8 },
    #[error("Grid `{id}` columns {columns} outside 1..=12")]
    GridColumns { id: String, columns: u8 },
}

impl PageTree {
    /// Validates the whole tree against `limits`.
    ///
    /// Checks ids (non-empty, unique across the tree including grid
    /// children), per-level counts, grid nesting depth, and per-kind payload
    /// ranges. An empty tree is valid.
    pub fn validate(&self, limits: &TreeLimits) -> Result<(), TreeError> {
        if self.sections.len() > limits.max_sections {
            return Err(TreeError::TooManySections {
                count: self.sections.len(),
                limit: limits.max_sections,
            });
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            claim_id(&section.id, &mut seen)?;
            if section.containers.len() > limits.max_containers_per_section {
                return Err(TreeError::TooManyContainers {
                    section: section.id.clone(),
                    count: section.containers.len(),
                    limit: limits.max_containers_per_section,
                });
            }
            for container in &section.containers {
                claim_id(&container.id, &mut seen)?;
                if container.blocks.len() > limits.max_blocks_per_container {
                    return Err(TreeError::TooManyBlocks {
                        container: container.id.clone(),
                        count: container.blocks.len(),
                        limit: limits.max_blocks_per_container,
                    });
                }
                for block in &container.blocks {
                    validate_block(block, 0, limits, &mut seen)?;
                }
            }
        }

        Ok(())
    }

    /// Every node id in document order, grid children included.
    pub fn collect_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for section in &self.sections {
            ids.push(section.id.as_str());
            for container in &section.containers {
                ids.push(container.id.as_str());
                for block in &container.blocks {
                    collect_block_ids(block, &mut ids);
                }
            }
        }
        ids
    }

    /// Finds a block anywhere in the tree by id.
    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.sections
            .iter()
            .flat_map(|s| &s.containers)
            .flat_map(|c| &c.blocks)
            .find_map(|b| find_in_block(b, id))
    }
}

fn claim_id<'a>(id: &'a str, seen: &mut HashSet<&'a str>) -> Result<(), TreeError> {
    if id.is_empty() {
        return Err(TreeError::EmptyId);
    }
    if !seen.insert(id) {
        return Err(TreeError::DuplicateId { id: id.to_owned() });
    }
    Ok(())
}

fn validate_block<'a>(
    block: &'a Block,
    grid_depth: usize,
    limits: &TreeLimits,
    seen: &mut HashSet<&'a str>,
) -> Result<(), TreeError> {
    claim_id(&block.id, seen)?;

    match &block.kind {
        BlockKind::Heading { level, .. } if !(1..=6).contains(level) => {
            Err(TreeError::HeadingLevel { id: block.id.clone(), level: *level })
        }
        BlockKind::Grid { columns, blocks } => {
            if !(1..=12).contains(columns) {
                return Err(TreeError::GridColumns { id: block.id.clone(), columns: *columns });
            }
            if grid_depth >= limits.max_grid_depth {
                return Err(TreeError::GridTooDeep {
                    id: block.id.clone(),
                    limit: limits.max_grid_depth,
                });
            }
            if blocks.len() > limits.max_blocks_per_container {
                return Err(TreeError::TooManyBlocks {
                    container: block.id.clone(),
                    count: blocks.len(),
                    limit: limits.max_blocks_per_container,
                });
            }
            for child in blocks {
                validate_block(child, grid_depth + 1, limits, seen)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn collect_block_ids<'a>(block: &'a Block, ids: &mut Vec<&'a str>) {
    ids.push(block.id.as_str());
    if let BlockKind::Grid { blocks, .. } = &block.kind {
        for child in blocks {
            collect_block_ids(child, ids);
        }
    }
}

fn find_in_block<'a>(block: &'a Block, id: &str) -> Option<&'a Block> {
    if block.id == id {
        return Some(block);
    }
    if let BlockKind::Grid { blocks, .. } = &block.kind {
        return blocks.iter().find_map(|b| find_in_block(b, id));
    }
    None
}
