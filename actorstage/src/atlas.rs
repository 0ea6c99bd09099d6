//! Compact atlas parser.
//!
//! The stage only needs to know which page images an atlas references and
//! which region names it defines; geometry stays with the authoring format.

use crate::Error;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasSummary {
    /// Page image file names, in declaration order.
    pub pages: Vec<String>,
    /// Region names, in declaration order.
    pub regions: Vec<String>,
}

impl AtlasSummary {
    pub fn parse(asset: &str, input: &str) -> Result<Self, Error> {
        parse_atlas(input).map_err(|message| Error::AtlasParse {
            asset: asset.to_string(),
            message,
        })
    }
}

fn parse_atlas(input: &str) -> Result<AtlasSummary, String> {
    let mut summary = AtlasSummary::default();
    let mut expect_page = true;
    let mut saw_page = false;

    for raw_line in input.lines() {
        let raw_line = raw_line.trim_end_matches(['\r', '\n']);
        if raw_line.trim().is_empty() {
            // A blank line after a page's regions starts the next page.
            if saw_page {
                expect_page = true;
            }
            continue;
        }

        let indented = raw_line.starts_with(' ') || raw_line.starts_with('\t');
        let line = raw_line.trim();

        // Indented lines and `key: value` pairs are page or region properties.
        if indented || line.contains(':') {
            if !saw_page {
                return Err(format!("property line before any page: '{line}'"));
            }
            continue;
        }

        if expect_page {
            summary.pages.push(line.to_string());
            saw_page = true;
            expect_page = false;
        } else {
            summary.regions.push(line.to_string());
        }
    }

    if summary.pages.is_empty() {
        return Err("atlas declares no pages".to_string());
    }
    Ok(summary)
}
