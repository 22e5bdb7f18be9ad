use std::fmt::Write as _;

use anyhow::Result;

use crate::models::portfolio::PortfolioRecords;
use crate::models::user::User;
use crate::render::contact::render_title_block;
use crate::render::formatter::format_sections;
use crate::render::fragment::Section;
use crate::render::layout::{fill_template, templates, LayoutConfig};

/// Composes the title block and formatted sections into one complete
/// document from the bundled skeleton.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    layout: LayoutConfig,
}

impl DocumentAssembler {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn bundled() -> Result<Self> {
        Ok(Self::new(LayoutConfig::bundled()?))
    }

    pub fn assemble(&self, user: &User, records: &PortfolioRecords) -> String {
        let sections = format_sections(records, &self.layout);
        self.assemble_sections(user, &sections)
    }

    /// Empty sections are omitted; a section-gap directive separates every
    /// pair of emitted parts.
    pub fn assemble_sections(&self, user: &User, sections: &[Section]) -> String {
        let parts = std::iter::once(render_title_block(user)).chain(
            sections
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.render(&self.layout)),
        );

        let mut body = String::new();
        for (i, part) in parts.enumerate() {
            if i > 0 {
                let _ = write!(body, "{}", self.layout.section_gap());
            }
            body.push_str(&part);
            body.push('\n');
        }

        fill_template(
            templates::SKELETON,
            &[
                ("PREAMBLE", templates::PREAMBLE),
                ("MACROS", templates::MACROS),
                ("RESUME_BODY", &body),
            ],
        )
    }
}
