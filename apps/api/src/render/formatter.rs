//! Record formatter: portfolio records → escaped resume fragments.
//!
//! Experience, education and projects are listed newest first; awards and
//! certifications keep their input order.

use std::cmp::Reverse;

use chrono::NaiveDate;

use crate::models::portfolio::{
    Award, Certification, Dated, Education, Experience, PortfolioRecords, Project, Skill,
};
use crate::render::dates::{date_range, format_naive};
use crate::render::escape::escape_latex;
use crate::render::fragment::{
    bullet_body, BodyLine, Fragment, Section, SectionBody, SectionKind, SkillLine,
};
use crate::render::layout::LayoutConfig;

const UNCATEGORIZED: &str = "Other";

/// Sort key: end date, falling back to the start date for open-ended
/// entries.
fn recency_key<T: Dated>(record: &T) -> Reverse<NaiveDate> {
    Reverse(record.end_date().unwrap_or_else(|| record.start_date()))
}

/// Stable newest-first ordering.
pub fn sort_newest_first<T: Dated>(records: &mut [T]) {
    records.sort_by_key(recency_key);
}

fn description_body(
    description: &str,
    extra: Option<String>,
    layout: &LayoutConfig,
) -> Vec<BodyLine> {
    let escaped = escape_latex(description);
    let mut lines: Vec<&str> = escaped.split('\n').collect();
    if let Some(extra) = extra.as_deref() {
        lines.push(extra);
    }
    bullet_body(lines, layout.bullet_gap())
}

pub fn experience_fragment(exp: &Experience, layout: &LayoutConfig) -> Fragment {
    Fragment {
        heading: format!("{} ({})", escape_latex(&exp.title), escape_latex(&exp.company)),
        dates: date_range(Some(exp.start_date), exp.end_date),
        secondary: None,
        body: description_body(&exp.description, None, layout),
    }
}

pub fn education_fragment(edu: &Education, layout: &LayoutConfig) -> Fragment {
    Fragment {
        heading: escape_latex(&edu.institution),
        dates: date_range(Some(edu.start_date), edu.end_date),
        secondary: Some(escape_latex(&edu.degree)),
        body: description_body(&edu.description, None, layout),
    }
}

pub fn project_fragment(project: &Project, layout: &LayoutConfig) -> Fragment {
    let technologies = (!project.technologies.is_empty()).then(|| {
        let joined = project
            .technologies
            .iter()
            .map(|t| escape_latex(t))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Technologies: {joined}")
    });
    Fragment {
        heading: escape_latex(&project.title),
        dates: date_range(Some(project.start_date), project.end_date),
        secondary: None,
        body: description_body(&project.description, technologies, layout),
    }
}

/// Shared shape for awards and certifications: `{name} ({issuer})` with a
/// single issue-date column.
fn credential_fragment(
    name: &str,
    issuer: &str,
    issued: Option<NaiveDate>,
    description: Option<&str>,
    layout: &LayoutConfig,
) -> Fragment {
    Fragment {
        heading: format!("{} ({})", escape_latex(name), escape_latex(issuer)),
        dates: format_naive(issued),
        secondary: None,
        body: description_body(description.unwrap_or(""), None, layout),
    }
}

pub fn award_fragment(award: &Award, layout: &LayoutConfig) -> Fragment {
    credential_fragment(
        &award.name,
        &award.issuer,
        award.issue_date,
        award.description.as_deref(),
        layout,
    )
}

pub fn certification_fragment(cert: &Certification, layout: &LayoutConfig) -> Fragment {
    credential_fragment(
        &cert.name,
        &cert.issuer,
        cert.issue_date,
        cert.description.as_deref(),
        layout,
    )
}

/// Groups skills by category, categories in first-seen order.
pub fn skill_lines(skills: &[Skill]) -> Vec<SkillLine> {
    let mut lines: Vec<SkillLine> = Vec::new();
    for skill in skills {
        let category = match skill.category.trim() {
            "" => UNCATEGORIZED,
            c => c,
        };
        let category = escape_latex(category);
        let name = escape_latex(&skill.name);
        match lines.iter_mut().find(|line| line.category == category) {
            Some(line) => line.names.push(name),
            None => lines.push(SkillLine {
                category,
                names: vec![name],
            }),
        }
    }
    lines
}

/// Formats every section of the resume body in document order.
pub fn format_sections(records: &PortfolioRecords, layout: &LayoutConfig) -> Vec<Section> {
    let mut experiences = records.experiences.clone();
    let mut educations = records.educations.clone();
    let mut projects = records.projects.clone();
    sort_newest_first(&mut experiences);
    sort_newest_first(&mut educations);
    sort_newest_first(&mut projects);

    SectionKind::ORDER
        .iter()
        .map(|&kind| match kind {
            SectionKind::Skills => Section {
                kind,
                body: SectionBody::Skills(skill_lines(&records.skills)),
            },
            SectionKind::Experience => Section::entries(
                kind,
                experiences.iter().map(|e| experience_fragment(e, layout)).collect(),
            ),
            SectionKind::Education => Section::entries(
                kind,
                educations.iter().map(|e| education_fragment(e, layout)).collect(),
            ),
            SectionKind::Projects => Section::entries(
                kind,
                projects.iter().map(|p| project_fragment(p, layout)).collect(),
            ),
            SectionKind::Achievements => Section::entries(
                kind,
                records.awards.iter().map(|a| award_fragment(a, layout)).collect(),
            ),
            SectionKind::Certifications => Section::entries(
                kind,
                records
                    .certifications
                    .iter()
                    .map(|c| certification_fragment(c, layout))
                    .collect(),
            ),
        })
        .collect()
}
