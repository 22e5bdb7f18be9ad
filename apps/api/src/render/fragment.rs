//! Fragment and section values produced by the formatter and consumed by the
//! assembler. Text stored here is already escaped.

use std::fmt::Write as _;

use crate::render::layout::{fill_template, templates, LayoutConfig, Spacing};

/// One line of a fragment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLine {
    Bullet(String),
    Space(Spacing),
}

/// One formatted entry: heading, date column and bullet body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub heading: String,
    pub dates: String,
    /// Carried for layouts with a second subheading row; the one-column
    /// layout leaves that row empty.
    pub secondary: Option<String>,
    pub body: Vec<BodyLine>,
}

impl Fragment {
    #[cfg(test)]
    pub fn bullets(&self) -> impl Iterator<Item = &str> {
        self.body.iter().filter_map(|line| match line {
            BodyLine::Bullet(text) => Some(text.as_str()),
            BodyLine::Space(_) => None,
        })
    }

    pub fn render(&self, layout: &LayoutConfig, out: &mut String) {
        out.push_str("        \\resumeSubheading\n");
        let _ = writeln!(out, "            {{{}}}{{{}}}", self.heading, self.dates);
        out.push_str("            {}{}\n");
        let _ = write!(out, "{}", layout.title_gap());
        out.push_str("        \\resumeItemListStart\n");
        for line in &self.body {
            match line {
                BodyLine::Bullet(text) => {
                    let _ = writeln!(out, "            \\resumeItem{{{text}}}");
                }
                BodyLine::Space(spacing) => {
                    let _ = write!(out, "{spacing}");
                }
            }
        }
        out.push_str("        \\resumeItemListEnd\n");
    }
}

/// Splits already-escaped `lines` into a bullet body.
///
/// Each line is trimmed and blank lines produce no bullet, but a spacing
/// directive is emitted before every line with index > 0 whether or not
/// that line survived.
pub fn bullet_body<'a>(lines: impl IntoIterator<Item = &'a str>, gap: Spacing) -> Vec<BodyLine> {
    let mut body = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            body.push(BodyLine::Space(gap));
        }
        let line = line.trim();
        if !line.is_empty() {
            body.push(BodyLine::Bullet(line.to_string()));
        }
    }
    body
}

/// Resume sections, in the order they appear in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKind {
    Skills,
    Experience,
    Education,
    Projects,
    Achievements,
    Certifications,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 6] = [
        SectionKind::Skills,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Projects,
        SectionKind::Achievements,
        SectionKind::Certifications,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Skills => "SKILLS",
            SectionKind::Experience => "EXPERIENCE",
            SectionKind::Education => "EDUCATION",
            SectionKind::Projects => "PROJECTS",
            SectionKind::Achievements => "ACHIEVEMENTS",
            SectionKind::Certifications => "CERTIFICATIONS",
        }
    }
}

/// One category line of the skills section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillLine {
    pub category: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Skills(Vec<SkillLine>),
    Entries(Vec<Fragment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

impl Section {
    pub fn entries(kind: SectionKind, fragments: Vec<Fragment>) -> Self {
        Self {
            kind,
            body: SectionBody::Entries(fragments),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            SectionBody::Skills(lines) => lines.is_empty(),
            SectionBody::Entries(fragments) => fragments.is_empty(),
        }
    }

    pub fn render(&self, layout: &LayoutConfig) -> String {
        let mut body = String::new();
        let template = match &self.body {
            SectionBody::Skills(lines) => {
                for line in lines {
                    let _ = writeln!(
                        body,
                        "        \\item{{\\textbf{{\\normalsize{{{}:}}}} {{ \\normalsize{{{}}}}}}}",
                        line.category,
                        line.names.join(", ")
                    );
                    let _ = write!(body, "{}", layout.bullet_gap());
                }
                templates::SKILLS
            }
            SectionBody::Entries(fragments) => {
                for (i, fragment) in fragments.iter().enumerate() {
                    if i > 0 {
                        let _ = write!(body, "{}", layout.sub_section_gap());
                    }
                    fragment.render(layout, &mut body);
                }
                templates::SECTION
            }
        };
        fill_template(
            template,
            &[("SECTION_TITLE", self.kind.title()), ("SECTION_BODY", &body)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> LayoutConfig {
        LayoutConfig::bundled().unwrap()
    }

    #[test]
    fn test_bullet_body_skips_blank_lines() {
        let body = bullet_body(["first", "  ", "second "], Spacing(-2));
        let bullets: Vec<_> = body
            .iter()
            .filter(|l| matches!(l, BodyLine::Bullet(_)))
            .collect();
        assert_eq!(bullets.len(), 2);
    }

    /// A blank line still contributes its spacing directive.
    #[test]
    fn test_bullet_body_spacing_counts_blank_lines() {
        let gap = Spacing(-2);
        let body = bullet_body(["a", "", "b"], gap);
        assert_eq!(
            body,
            vec![
                BodyLine::Bullet("a".into()),
                BodyLine::Space(gap),
                BodyLine::Space(gap),
                BodyLine::Bullet("b".into()),
            ]
        );
    }

    #[test]
    fn test_bullet_body_leading_blank_line_has_no_spacing() {
        let gap = Spacing(-1);
        let body = bullet_body(["", "only"], gap);
        assert_eq!(
            body,
            vec![BodyLine::Space(gap), BodyLine::Bullet("only".into())]
        );
    }

    #[test]
    fn test_fragment_render_shape() {
        let fragment = Fragment {
            heading: "Engineer (Acme)".into(),
            dates: "Jan 1, 2020 -- Present".into(),
            secondary: None,
            body: vec![BodyLine::Bullet("Shipped things".into())],
        };
        let mut out = String::new();
        fragment.render(&layout(), &mut out);
        assert!(out.contains("{Engineer (Acme)}{Jan 1, 2020 -- Present}"));
        assert!(out.contains("\\resumeItem{Shipped things}"));
        assert!(out.contains("\\vspace{-6pt}"));
        assert!(out.trim_end().ends_with("\\resumeItemListEnd"));
    }

    #[test]
    fn test_section_spacing_between_fragments_only() {
        let fragment = Fragment {
            heading: "H".into(),
            dates: "D".into(),
            secondary: None,
            body: Vec::new(),
        };
        let section = Section::entries(
            SectionKind::Experience,
            vec![fragment.clone(), fragment.clone(), fragment],
        );
        let rendered = section.render(&layout());
        assert!(rendered.starts_with("\\section{EXPERIENCE}"));
        assert_eq!(rendered.matches("\\vspace{-2pt}").count(), 2);
    }

    #[test]
    fn test_skills_section_lines() {
        let section = Section {
            kind: SectionKind::Skills,
            body: SectionBody::Skills(vec![SkillLine {
                category: "Languages".into(),
                names: vec!["Rust".into(), "Go".into()],
            }]),
        };
        let rendered = section.render(&layout());
        assert!(rendered
            .contains("\\item{\\textbf{\\normalsize{Languages:}} { \\normalsize{Rust, Go}}}"));
    }

    #[test]
    fn test_section_order_is_fixed() {
        let mut kinds = SectionKind::ORDER.to_vec();
        kinds.reverse();
        kinds.sort();
        assert_eq!(kinds, SectionKind::ORDER.to_vec());
    }
}
