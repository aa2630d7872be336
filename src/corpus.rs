use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::data_models::ShakespeareWork;

/// Marks the end of the plays in the Gutenberg edition; everything after it is license text.
const CONTENT_END_MARKER: &str = "* CONTENT NOTE (added in 2017) *";

/// The table of contents and the headings in the body disagree on a few titles.
/// Maps the table-of-contents spelling to the heading spelling.
const TITLE_CONVERSIONS: &[(&str, &str)] = &[
    ("THE TRAGEDY OF ANTONY AND CLEOPATRA", "ANTONY AND CLEOPATRA"),
    ("THE LIFE OF KING HENRY THE FIFTH", "THE LIFE OF KING HENRY V"),
    ("THE TWO NOBLE KINSMEN", "THE TWO NOBLE KINSMEN:"),
    ("TWELFTH NIGHT; OR, WHAT YOU WILL", "TWELFTH NIGHT: OR, WHAT YOU WILL"),
    ("THE TRAGEDY OF OTHELLO, MOOR OF VENICE", "OTHELLO, THE MOOR OF VENICE"),
    ("THE TRAGEDY OF MACBETH", "MACBETH"),
];

fn convert_title(line: &str) -> String {
    TITLE_CONVERSIONS
        .iter()
        .find(|(from, _)| *from == line)
        .map_or(line, |(_, to)| *to)
        .to_string()
}

/// Reads the table of contents.
///
/// Skips everything up to the `Contents` line, then collects one title per
/// non-blank line until a title shows up a second time (the heading of the
/// first work). That heading line is consumed, so `lines` is left positioned
/// at the start of the first work's text.
pub fn parse_titles<I, S>(lines: &mut I) -> Vec<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let mut titles: Vec<String> = Vec::new();
    let mut is_contents = false;
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if line == "Contents" {
            is_contents = true;
            continue;
        }
        if titles.iter().any(|t| t == line) {
            return titles;
        }
        if is_contents {
            titles.push(convert_title(line));
        }
    }
    titles
}

/// Splits the remaining text into works, one per title, sorted by title.
pub fn parse_works<I, S>(titles: &[String], lines: &mut I) -> Vec<ShakespeareWork>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let Some(first) = titles.first() else {
        return Vec::new();
    };
    let titles_set: HashSet<&str> = titles.iter().map(String::as_str).collect();
    let mut current_title = first.as_str();
    let mut work_map: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for line in lines {
        let line = line.as_ref();
        let stripped = line.trim();
        if stripped == CONTENT_END_MARKER {
            break;
        }
        if let Some(title) = titles_set.get(stripped) {
            if *title != current_title {
                current_title = *title;
                continue;
            }
        }
        work_map
            .entry(current_title)
            .or_default()
            .push(line.to_string());
    }

    work_map
        .into_iter()
        .map(|(title, content)| ShakespeareWork {
            id: 0,
            title: title.to_string(),
            content: content.join("\n"),
        })
        .collect()
}

/// Parses the complete works text file into per-work records.
pub fn parse_complete_works(text: &str) -> Vec<ShakespeareWork> {
    let mut lines = text.lines();
    let titles = parse_titles(&mut lines);
    log::info!("Found {} titles in table of contents", titles.len());
    parse_works(&titles, &mut lines)
}

/// Gives every work without an id (id 0) the next free id, in file order.
pub fn assign_ids(works: &mut [ShakespeareWork]) {
    let mut next_id = works.iter().map(|w| w.id).max().unwrap_or(0);
    for work in works.iter_mut().filter(|w| w.id == 0) {
        next_id += 1;
        work.id = next_id;
    }
}

pub fn read_works(path: impl AsRef<Path>) -> Result<Vec<ShakespeareWork>> {
    let path = path.as_ref();
    log::info!("Reading data from {}", path.display());
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut works: Vec<ShakespeareWork> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse works from {}", path.display()))?;
    assign_ids(&mut works);
    log::info!("Total {} works found", works.len());
    Ok(works)
}

pub fn write_works(path: impl AsRef<Path>, works: &[ShakespeareWork]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(works)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} works to {}", works.len(), path.display());
    Ok(())
}
