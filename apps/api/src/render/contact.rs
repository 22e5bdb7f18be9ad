//! Title block: full name, headline and the clickable contact line.

use std::fmt::Write as _;

use crate::models::user::User;
use crate::render::escape::{escape_latex, escape_opt};
use crate::render::layout::{fill_template, templates};

/// Items per row before a forced line break.
const LINKS_PER_ROW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Phone,
    Email,
    LinkedIn,
    GitHub,
    HackerRank,
    LeetCode,
    Website,
}

impl Channel {
    fn url_prefix(self) -> &'static str {
        match self {
            Channel::Phone => "tel:",
            Channel::Email => "mailto:",
            _ => "",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Channel::Phone => "Phone",
            Channel::Email => "Envelope",
            Channel::LinkedIn => "LinkedinSquare",
            Channel::GitHub => "Github",
            Channel::HackerRank | Channel::LeetCode => "Code",
            Channel::Website => "Globe",
        }
    }

    fn label(self, value: &str) -> String {
        let label = strip_scheme(value);
        match self {
            Channel::LeetCode => format!("LeetCode: {label}"),
            _ => label.to_string(),
        }
    }
}

fn strip_scheme(value: &str) -> &str {
    let value = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    value.strip_prefix("www.").unwrap_or(value)
}

/// Percent-encodes characters that TeX would interpret inside `\href{...}`,
/// plus whitespace and controls.
fn encode_url(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let special = matches!(
            c,
            '{' | '}' | '\\' | '%' | '#' | '~' | '^' | '$' | '&' | '_' | '"' | '<' | '>'
        );
        if special || c.is_whitespace() || c.is_control() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    pub channel: Channel,
    pub url: String,
    pub label: String,
}

/// Candidate channels in fixed order, absent or blank values dropped.
pub fn contact_links(user: &User) -> Vec<ContactLink> {
    [
        (Channel::Phone, &user.phone),
        (Channel::Email, &Some(user.email.clone())),
        (Channel::LinkedIn, &user.linkedin_url),
        (Channel::GitHub, &user.github_url),
        (Channel::HackerRank, &user.hackerrank_url),
        (Channel::LeetCode, &user.leetcode_url),
        (Channel::Website, &user.website_url),
    ]
    .into_iter()
    .filter_map(|(channel, value)| {
        let value = value.as_deref()?.trim();
        (!value.is_empty()).then(|| ContactLink {
            channel,
            url: format!("{}{}", channel.url_prefix(), encode_url(value)),
            label: channel.label(value),
        })
    })
    .collect()
}

/// Renders links as `\href` items, breaking the line before every third.
pub fn render_links(links: &[ContactLink]) -> String {
    let mut out = String::new();
    for (i, link) in links.iter().enumerate() {
        if i > 0 && i % LINKS_PER_ROW == 0 {
            out.push_str("    \\\\\n");
        }
        let _ = write!(
            out,
            "    \\href{{{}}}{{\\fa{}~{}}}",
            link.url,
            link.channel.icon(),
            escape_latex(&link.label)
        );
        out.push_str(if i + 1 < links.len() {
            " \\hspace{10pt}\n"
        } else {
            "\n"
        });
    }
    out
}

pub fn render_title_block(user: &User) -> String {
    let headline = escape_opt(user.portfolio_title.as_deref().map(str::trim));
    let headline = if headline.is_empty() {
        headline
    } else {
        format!("{headline} \\\\")
    };
    fill_template(
        templates::TITLE,
        &[
            ("FULL_NAME", &escape_latex(&user.full_name())),
            ("HEADLINE", &headline),
            ("CONTACT_LINKS", &render_links(&contact_links(user))),
        ],
    )
}
