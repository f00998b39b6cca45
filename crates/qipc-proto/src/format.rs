//! Text and HTML projections of values.
//!
//! Formatting is kept outside the value model. [`AsciiFormatter`] produces
//! a fixed-width rendering (numpy-like: the middle of a long table is
//! elided with a `...` row), [`HtmlFormatter`] a `<table>`/`<dl>`
//! rendering with escaped cell text. Both take the symbol context as a
//! parameter.
//!
//! Null sentinels render as empty strings, integer infinities as
//! `0W`/`-0W`, and temporal atoms in their q-native textual forms.

use chrono::{NaiveDate, TimeDelta};

use crate::context::SymbolContext;
use crate::value::{Atom, Dict, K, Table, Vector};

/// Fixed-width text rendering.
#[derive(Debug, Clone)]
pub struct AsciiFormatter {
    height: usize,
}

impl Default for AsciiFormatter {
    fn default() -> Self {
        Self { height: 10 }
    }
}

impl AsciiFormatter {
    /// Create a formatter with default geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered height in rows before the middle of a table is elided.
    #[must_use]
    pub fn height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// Render a value.
    #[must_use]
    pub fn format(&self, k: &K, ctx: &SymbolContext) -> String {
        match k {
            K::Table(t) => self.format_table(t, ctx).join("\n"),
            K::Dict(d) if matches!(d.keys(), K::Table(_)) => self.format_keyed(d, ctx),
            K::Dict(d) => self.format_dict(d, ctx),
            other => scalar_text(other, ctx),
        }
    }

    fn format_table(&self, t: &Table, ctx: &SymbolContext) -> Vec<String> {
        let rows = self.select_rows(t.len());
        format_table_rows(t, &rows, ctx)
    }

    fn format_keyed(&self, d: &Dict, ctx: &SymbolContext) -> String {
        let (K::Table(kt), K::Table(vt)) = (d.keys(), d.values()) else {
            return scalar_text(&K::Dict(d.clone()), ctx);
        };
        // sides conform by dict construction: row counts are equal
        let rows = self.select_rows(kt.len());
        let left = format_table_rows(kt, &rows, ctx);
        let right = format_table_rows(vt, &rows, ctx);
        let mut gutter = vec![" ", "-"];
        gutter.resize(left.len(), " ");
        left.iter()
            .zip(&right)
            .zip(&gutter)
            .map(|((ll, rr), g)| format!("{ll}|{g}{rr}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_dict(&self, d: &Dict, ctx: &SymbolContext) -> String {
        let rows = self.select_rows(d.len());
        let cells: Vec<(String, String)> = rows
            .iter()
            .map(|r| match r {
                Some(i) => (cell_text(d.keys(), *i, ctx), cell_text(d.values(), *i, ctx)),
                None => ("...".to_owned(), String::new()),
            })
            .collect();
        let key_width = cells.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        cells
            .iter()
            .map(|(k, v)| format!("{k:<key_width$}| {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // row indices to render, with None marking the elision row
    fn select_rows(&self, rowcount: usize) -> Vec<Option<usize>> {
        if rowcount < self.height.saturating_sub(2) {
            (0..rowcount).map(Some).collect()
        } else {
            let chunk = self.height.saturating_sub(3) / 2;
            (0..chunk)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((rowcount - chunk..rowcount).map(Some))
                .collect()
        }
    }
}

fn format_table_rows(t: &Table, rows: &[Option<usize>], ctx: &SymbolContext) -> Vec<String> {
    let names = t.column_names(ctx);
    let columns: &[K] = match t.dict().values() {
        K::List { items, .. } => items,
        _ => &[],
    };

    let mut widths: Vec<usize> = names.iter().map(String::len).collect();
    let mut sample: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for r in rows {
        let mut cells = Vec::with_capacity(columns.len());
        for (c, column) in columns.iter().enumerate() {
            let s = match r {
                Some(i) => cell_text(column, *i, ctx),
                None if c == 0 => "...".to_owned(),
                None => String::new(),
            };
            widths[c] = widths[c].max(s.len());
            cells.push(s);
        }
        sample.push(cells);
    }

    let pad_join = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(s, w)| format!("{s:<w$}"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let headers = pad_join(&names);
    let dashes = "-".repeat(headers.len());
    let mut lines = vec![headers, dashes];
    for cells in &sample {
        lines.push(pad_join(cells));
    }
    lines
}

/// HTML rendering of tables, keyed tables and dictionaries.
#[derive(Debug, Clone)]
pub struct HtmlFormatter {
    table_class: Option<String>,
    indent: usize,
    height: usize,
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self { table_class: None, indent: 2, height: 10 }
    }
}

impl HtmlFormatter {
    /// Create a formatter with no table class and two-space indent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for the `class` attribute of rendered tables.
    #[must_use]
    pub fn table_class(mut self, class: &str) -> Self {
        self.table_class = Some(class.to_owned());
        self
    }

    /// Spaces per nesting level.
    #[must_use]
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Render a value.
    #[must_use]
    pub fn format(&self, k: &K, ctx: &SymbolContext) -> String {
        match k {
            K::Table(t) => self.table_html(None, t, ctx),
            K::Dict(d) => match (d.keys(), d.values()) {
                (K::Table(kt), K::Table(vt)) => self.table_html(Some(kt), vt, ctx),
                _ => self.dict_html(d, ctx),
            },
            other => escape(&scalar_text(other, ctx)),
        }
    }

    fn table_html(&self, keyed: Option<&Table>, t: &Table, ctx: &SymbolContext) -> String {
        let rows = AsciiFormatter::new().height(self.height).select_rows(t.len());
        let mut out = Vec::new();
        match &self.table_class {
            Some(class) => out.push(format!("<table class=\"{class}\">")),
            None => out.push("<table>".to_owned()),
        }
        out.push(format!("{}<thead>", self.pad(1)));
        out.push(format!("{}<tr>", self.pad(2)));
        if let Some(kt) = keyed {
            for name in kt.column_names(ctx) {
                out.push(format!("{}<th>{}</th>", self.pad(3), escape(&name)));
            }
        }
        for name in t.column_names(ctx) {
            out.push(format!("{}<th>{}</th>", self.pad(3), escape(&name)));
        }
        out.push(format!("{}</tr>", self.pad(2)));
        out.push(format!("{}</thead>", self.pad(1)));

        for r in &rows {
            out.push(format!("{}<tr>", self.pad(1)));
            if let Some(kt) = keyed {
                for cell in row_cells(kt, *r, ctx) {
                    out.push(format!("{}<th>{}</th>", self.pad(2), escape(&cell)));
                }
            }
            for cell in row_cells(t, *r, ctx) {
                out.push(format!("{}<td>{}</td>", self.pad(2), escape(&cell)));
            }
            out.push(format!("{}</tr>", self.pad(1)));
        }
        out.push("</table>".to_owned());
        out.join("\n")
    }

    fn dict_html(&self, d: &Dict, ctx: &SymbolContext) -> String {
        let mut out = vec!["<dl>".to_owned()];
        for i in 0..d.len() {
            out.push(format!("{}<dt>{}</dt>", self.pad(1), escape(&cell_text(d.keys(), i, ctx))));
            out.push(format!("{}<dd>{}</dd>", self.pad(1), escape(&cell_text(d.values(), i, ctx))));
        }
        out.push("</dl>".to_owned());
        out.join("\n")
    }

    fn pad(&self, level: usize) -> String {
        " ".repeat(self.indent * level)
    }
}

fn row_cells(t: &Table, row: Option<usize>, ctx: &SymbolContext) -> Vec<String> {
    let columns: &[K] = match t.dict().values() {
        K::List { items, .. } => items,
        _ => &[],
    };
    columns
        .iter()
        .enumerate()
        .map(|(c, column)| match row {
            Some(i) => cell_text(column, i, ctx),
            None if c == 0 => "...".to_owned(),
            None => String::new(),
        })
        .collect()
}

/// HTML-escape cell text.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// One element of a column (vector or list) as display text.
fn cell_text(column: &K, row: usize, ctx: &SymbolContext) -> String {
    match column {
        K::Vector(Vector::EnumSyms { items, .. }) => {
            items.get(row).map(|&j| long_text(j)).unwrap_or_default()
        },
        K::Vector(v) => v.get_atom(row).map(|a| atom_text(&a, ctx)).unwrap_or_default(),
        K::List { items, .. } => items.get(row).map(|k| scalar_text(k, ctx)).unwrap_or_default(),
        _ => String::new(),
    }
}

// Non-container values as display text.
fn scalar_text(k: &K, ctx: &SymbolContext) -> String {
    match k {
        K::Atom(a) => atom_text(a, ctx),
        K::Vector(Vector::Char(_, s)) => s.clone(),
        K::Vector(v) => {
            let len = v.len();
            let elem = |i: usize| cell_text(k, i, ctx);
            if len > 8 {
                format!("{} {} ... {} {}", elem(0), elem(1), elem(len - 2), elem(len - 1))
            } else {
                (0..len).map(elem).collect::<Vec<_>>().join(" ")
            }
        },
        K::List { items, .. } => {
            let body = items.iter().map(|it| scalar_text(it, ctx)).collect::<Vec<_>>().join(", ");
            format!("[{body}]")
        },
        K::Dict(d) => format!("{}!{}", scalar_text(d.keys(), ctx), scalar_text(d.values(), ctx)),
        K::Table(t) => format!("flip {}", scalar_text(&K::Dict(t.dict().clone()), ctx)),
        K::Lambda(l) => l.body().to_owned(),
        K::Nil => "::".to_owned(),
        K::Operator(op) => op.to_string(),
        K::Error(msg) => format!("'{msg}"),
    }
}

fn atom_text(a: &Atom, ctx: &SymbolContext) -> String {
    match a {
        Atom::Bool(b) => u8::from(*b).to_string(),
        Atom::Guid(u) => u.to_string(),
        Atom::Byte(v) => v.to_string(),
        Atom::Char(c) => char::from(*c).to_string(),
        Atom::Short(v) => int_text(i64::from(*v), i64::from(i16::MIN), i64::from(i16::MAX)),
        Atom::Int(v) => int_text(i64::from(*v), i64::from(i32::MIN), i64::from(i32::MAX)),
        Atom::Long(v) => long_text(*v),
        Atom::Real(v) => float_text(f64::from(*v)),
        Atom::Float(v) => float_text(*v),
        Atom::Sym(idx) => ctx.lookup_str(*idx).unwrap_or_default(),
        Atom::Timestamp(v) => temporal(*v, timestamp_text),
        Atom::Timespan(v) => temporal(*v, timespan_text),
        Atom::Month(v) => temporal_i32(*v, month_text),
        Atom::Date(v) => temporal_i32(*v, date_text),
        Atom::Minute(v) => temporal_i32(*v, minute_text),
        Atom::Second(v) => temporal_i32(*v, second_text),
        Atom::Time(v) => temporal_i32(*v, time_text),
        Atom::Datetime(v) => {
            if v.is_nan() {
                String::new()
            } else {
                datetime_text(*v)
            }
        },
    }
}

fn int_text(v: i64, min: i64, max: i64) -> String {
    if v == min {
        String::new()
    } else if v == max {
        "0W".to_owned()
    } else if v == min + 1 {
        "-0W".to_owned()
    } else {
        v.to_string()
    }
}

fn long_text(v: i64) -> String {
    int_text(v, i64::MIN, i64::MAX)
}

fn float_text(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else if v == f64::INFINITY {
        "0w".to_owned()
    } else if v == f64::NEG_INFINITY {
        "-0w".to_owned()
    } else {
        v.to_string()
    }
}

fn temporal(v: i64, render: fn(i64) -> Option<String>) -> String {
    match v {
        i64::MIN => String::new(),
        i64::MAX => "0W".to_owned(),
        v if v == i64::MIN + 1 => "-0W".to_owned(),
        v => render(v).unwrap_or_else(|| v.to_string()),
    }
}

fn temporal_i32(v: i32, render: fn(i32) -> Option<String>) -> String {
    match v {
        i32::MIN => String::new(),
        i32::MAX => "0W".to_owned(),
        v if v == i32::MIN + 1 => "-0W".to_owned(),
        v => render(v).unwrap_or_else(|| v.to_string()),
    }
}

fn k_epoch() -> Option<chrono::NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)
}

// 2000.01.01D00:00:01:000000000
fn timestamp_text(ns: i64) -> Option<String> {
    let dt = k_epoch()?.checked_add_signed(TimeDelta::nanoseconds(ns))?;
    let frac = ns.rem_euclid(1_000_000_000);
    Some(format!("{}:{frac:09}", dt.format("%Y.%m.%dD%H:%M:%S")))
}

// 0D00:00:00.000000001
fn timespan_text(ns: i64) -> Option<String> {
    let secs = ns.div_euclid(1_000_000_000);
    let frac = ns.rem_euclid(1_000_000_000);
    let mins = secs.div_euclid(60);
    let hours = mins.div_euclid(60);
    let days = hours.div_euclid(24);
    Some(format!(
        "{days}D{:02}:{:02}:{:02}.{frac:09}",
        hours.rem_euclid(24),
        mins.rem_euclid(60),
        secs.rem_euclid(60)
    ))
}

// 2000.01m
fn month_text(m: i32) -> Option<String> {
    let y = 2000 + m.div_euclid(12);
    let mo = m.rem_euclid(12) + 1;
    Some(format!("{y:04}.{mo:02}m"))
}

// 2024.05.14
fn date_text(d: i32) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(2000, 1, 1)?
        .checked_add_signed(TimeDelta::days(i64::from(d)))?;
    Some(date.format("%Y.%m.%d").to_string())
}

// 23:59
fn minute_text(m: i32) -> Option<String> {
    Some(format!("{:02}:{:02}", m.div_euclid(60), m.rem_euclid(60)))
}

// 23:59:00
fn second_text(s: i32) -> Option<String> {
    Some(format!("{}:{:02}", minute_text(s.div_euclid(60))?, s.rem_euclid(60)))
}

// 23:59:00.000
fn time_text(ms: i32) -> Option<String> {
    Some(format!("{}.{:03}", second_text(ms.div_euclid(1000))?, ms.rem_euclid(1000)))
}

// 2000.01.01T00:00:00.000
fn datetime_text(days: f64) -> String {
    let millis = (days * 86_400_000.0).round();
    if !millis.is_finite() {
        return days.to_string();
    }
    k_epoch()
        .and_then(|epoch| epoch.checked_add_signed(TimeDelta::milliseconds(millis as i64)))
        .map_or_else(|| days.to_string(), |dt| dt.format("%Y.%m.%dT%H:%M:%S%.3f").to_string())
}
