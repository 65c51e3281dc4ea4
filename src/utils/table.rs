//! Plain-text tables for CLI listings. Column widths follow the widest cell
//! in terminal columns, ignoring ANSI colour sequences.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// `s` without ANSI colour sequences.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    match ANSI_ESCAPE.as_ref() {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}

/// Terminal columns taken by `s`: wide glyphs count double, escapes count zero.
fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_ref())
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(visible_width(cell));
            }
        }

        let line = |cells: &[String]| {
            let mut out = String::new();
            for (i, w) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                out.push_str(cell);
                out.push_str(&" ".repeat(w - visible_width(cell) + 2));
            }
            out.trim_end().to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        out.push_str(&"-".repeat(widths.iter().map(|w| w + 2).sum::<usize>()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_despite_colour_codes() {
        let mut t = Table::new(["ID", "STATUS"]);
        t.add_row(vec!["1".into(), "\x1b[32mapproved\x1b[0m".into()]);
        t.add_row(vec!["12".into(), "pending".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID  STATUS");
        assert!(lines[3].starts_with("12  pending"));
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        let mut t = Table::new(["NAME", "ID"]);
        t.add_row(vec!["東京本社".into(), "a".into()]);
        t.add_row(vec!["HQ".into(), "b".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();

        let col = |line: &str, cell: &str| {
            let at = line.find(cell).unwrap();
            UnicodeWidthStr::width(&line[..at])
        };
        assert_eq!(col(lines[2], "a"), 10);
        assert_eq!(col(lines[3], "b"), 10);
        assert_eq!(col(lines[0], "ID"), 10);
    }

    #[test]
    fn strip_ansi_leaves_plain_text() {
        assert_eq!(strip_ansi("\x1b[1;31mlate\x1b[0m"), "late");
        assert_eq!(strip_ansi("on time"), "on time");
    }
}
