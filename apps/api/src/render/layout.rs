use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const LAYOUT_JSON: &str = include_str!("templates/layout.json");

/// Static layout templates bundled into the binary.
pub mod templates {
    pub const SKELETON: &str = include_str!("templates/skeleton.tex");
    pub const PREAMBLE: &str = include_str!("templates/preamble.tex");
    pub const MACROS: &str = include_str!("templates/macros.tex");
    pub const TITLE: &str = include_str!("templates/title.tex");
    pub const SECTION: &str = include_str!("templates/section.tex");
    pub const SKILLS: &str = include_str!("templates/skills.tex");
}

/// Vertical spacing knobs, in points. Pure numbers, no behavior attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub space_between_sections_pt: i32,
    pub space_between_sub_sections_pt: i32,
    pub space_between_title_and_content_pt: i32,
    pub space_between_bullet_points_pt: i32,
}

impl LayoutConfig {
    /// Parses the layout mapping bundled with the templates.
    pub fn bundled() -> Result<Self> {
        serde_json::from_str(LAYOUT_JSON).context("bundled layout.json is invalid")
    }

    pub fn section_gap(&self) -> Spacing {
        Spacing(self.space_between_sections_pt)
    }

    pub fn sub_section_gap(&self) -> Spacing {
        Spacing(self.space_between_sub_sections_pt)
    }

    pub fn title_gap(&self) -> Spacing {
        Spacing(self.space_between_title_and_content_pt)
    }

    pub fn bullet_gap(&self) -> Spacing {
        Spacing(self.space_between_bullet_points_pt)
    }
}

/// A vertical spacing directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing(pub i32);

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\vspace{{{}pt}}\n\n", self.0)
    }
}

/// Replaces `<KEY>` placeholders in a single scan of `template`.
///
/// Substituted values are never rescanned, so user text that happens to
/// contain `<KEY>` stays literal. Unknown placeholders are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = values.iter().find_map(|(key, value)| {
            let placeholder_len = key.len() + 2;
            (tail.len() >= placeholder_len
                && tail[1..].starts_with(key)
                && tail[1 + key.len()..].starts_with('>'))
            .then_some((placeholder_len, *value))
        });
        match hit {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
