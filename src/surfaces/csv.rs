//! Plain-text export of surface lists, one surface per row.
//!
//! A row starts with the optional property columns chosen by
//! [`CsvFields`], followed by the coordinates. Standard exports give, for
//! each tetrahedron `t`, the columns `Tt:0`..`Tt:3`, `Qt:01/23`,
//! `Qt:02/13`, `Qt:03/12` and, for lists with octagons, `Kt:01/23`,
//! `Kt:02/13`, `Kt:03/12`. Edge weight exports give `E0`, `E1`, and so on.
//! Infinite coordinates print as `inf`.

use core::ops::BitOr;
use std::io::{BufRead, Write};

use crate::maths::integer::LargeInteger;
use crate::surfaces::encoding::NormalEncoding;
use crate::surfaces::list::NormalSurfaces;
use crate::surfaces::NormalSurface;
use crate::tri_error::TriError;

/// Optional property columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CsvFields(u16);

impl CsvFields {
    pub const NONE: CsvFields = CsvFields(0);
    pub const NAME: CsvFields = CsvFields(0x01);
    pub const EULER: CsvFields = CsvFields(0x02);
    pub const ORIENT: CsvFields = CsvFields(0x04);
    pub const SIDES: CsvFields = CsvFields(0x08);
    pub const BDRY: CsvFields = CsvFields(0x10);
    pub const LINK: CsvFields = CsvFields(0x20);
    pub const TYPE: CsvFields = CsvFields(0x40);
    pub const ALL: CsvFields = CsvFields(0x7f);

    #[inline]
    pub fn has(&self, flag: CsvFields) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl Default for CsvFields {
    fn default() -> Self {
        CsvFields::ALL
    }
}

impl BitOr for CsvFields {
    type Output = CsvFields;

    fn bitor(self, rhs: CsvFields) -> CsvFields {
        CsvFields(self.0 | rhs.0)
    }
}

const COLUMNS: [(CsvFields, &str); 7] = [
    (CsvFields::NAME, "name"),
    (CsvFields::EULER, "euler"),
    (CsvFields::ORIENT, "orient"),
    (CsvFields::SIDES, "sides"),
    (CsvFields::BDRY, "bdry"),
    (CsvFields::LINK, "link"),
    (CsvFields::TYPE, "type"),
];

const QUAD_LABELS: [&str; 3] = ["01/23", "02/13", "03/12"];

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Quote a cell, doubling embedded quotes.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn bool_cell(v: Result<bool, TriError>) -> String {
    match v {
        Ok(true) => "TRUE".into(),
        Ok(false) => "FALSE".into(),
        Err(_) => String::new(),
    }
}

fn property_cells(s: &NormalSurface, fields: CsvFields) -> Vec<String> {
    let mut cells = Vec::new();
    if fields.has(CsvFields::NAME) {
        cells.push(quote(s.name()));
    }
    if fields.has(CsvFields::EULER) {
        cells.push(s.euler_char().map(|e| e.to_string()).unwrap_or_default());
    }
    if fields.has(CsvFields::ORIENT) {
        cells.push(bool_cell(s.is_orientable()));
    }
    if fields.has(CsvFields::SIDES) {
        cells.push(match s.is_two_sided() {
            Ok(true) => "2".into(),
            Ok(false) => "1".into(),
            Err(_) => String::new(),
        });
    }
    if fields.has(CsvFields::BDRY) {
        let b = if !s.is_compact() {
            "spun"
        } else if s.has_real_boundary() {
            "real"
        } else {
            "closed"
        };
        cells.push(b.into());
    }
    if fields.has(CsvFields::LINK) {
        let link = if let Some(v) = s.is_vertex_link() {
            format!("Vertex {v}")
        } else {
            match s.is_thin_edge_link() {
                (Some(a), Some(b)) => format!("Thin edges {a}, {b}"),
                (Some(a), None) => format!("Thin edge {a}"),
                _ => String::new(),
            }
        };
        cells.push(quote(&link));
    }
    if fields.has(CsvFields::TYPE) {
        let mut kind = Vec::new();
        if s.is_splitting() {
            kind.push("Splitting".to_string());
        }
        if let Some(n) = s.is_central() {
            kind.push(format!("Central ({n})"));
        }
        if let Some((t, k)) = s.oct_position() {
            kind.push(format!("Octagon ({t}: {})", QUAD_LABELS[k]));
        }
        cells.push(quote(&kind.join(", ")));
    }
    cells
}

fn header_cells(fields: CsvFields) -> Vec<String> {
    COLUMNS
        .iter()
        .filter(|(f, _)| fields.has(*f))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn write_row(out: &mut impl Write, cells: &[String]) -> Result<(), TriError> {
    writeln!(out, "{}", cells.join(","))?;
    Ok(())
}

/// Write the list in standard (triangle-quad, plus octagon) coordinates.
///
/// # Errors
/// `Io` if writing fails.
pub fn write_csv_standard(list: &NormalSurfaces, out: &mut impl Write, fields: CsvFields) -> Result<(), TriError> {
    let n = list.triangulation().size();
    let octs = NormalEncoding::new(list.coords()).is_ok_and(|e| e.stores_octagons());

    let mut header = header_cells(fields);
    for t in 0..n {
        header.extend((0..4).map(|v| format!("T{t}:{v}")));
        header.extend(QUAD_LABELS.iter().map(|q| format!("Q{t}:{q}")));
        if octs {
            header.extend(QUAD_LABELS.iter().map(|q| format!("K{t}:{q}")));
        }
    }
    write_row(out, &header)?;

    for s in list {
        let mut cells = property_cells(s, fields);
        for t in 0..n {
            cells.extend((0..4).map(|v| s.triangles(t, v).to_string()));
            cells.extend((0..3).map(|k| s.quads(t, k).to_string()));
            if octs {
                cells.extend((0..3).map(|k| s.octs(t, k).to_string()));
            }
        }
        write_row(out, &cells)?;
    }
    Ok(())
}

/// Write the list as edge weights.
///
/// # Errors
/// `Io` if writing fails.
pub fn write_csv_edge_weight(list: &NormalSurfaces, out: &mut impl Write, fields: CsvFields) -> Result<(), TriError> {
    let edges = list.triangulation().count_edges();
    let mut header = header_cells(fields);
    header.extend((0..edges).map(|e| format!("E{e}")));
    write_row(out, &header)?;

    for s in list {
        let mut cells = property_cells(s, fields);
        for e in 0..edges {
            cells.push(s.edge_weight(e)?.to_string());
        }
        write_row(out, &cells)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One parsed row of a standard export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvRow {
    pub name: Option<String>,
    /// Coordinates in the order of the header: 7 per tetrahedron, or 10
    /// when octagon columns are present.
    pub vector: Vec<LargeInteger>,
}

/// Split one line into cells, honouring quotes.
fn split_cells(line: &str) -> Result<Vec<String>, TriError> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cur.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if cur.is_empty() => quoted = true,
            (',', false) => cells.push(core::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    if quoted {
        return Err(TriError::InvalidArgument(format!("unterminated quote in {line:?}")));
    }
    cells.push(cur);
    Ok(cells)
}

/// Next CSV record; a quoted cell may run over several lines.
fn next_record(lines: &mut impl Iterator<Item = std::io::Result<String>>) -> Result<Option<String>, TriError> {
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    let mut record = first?;
    while record.matches('"').count() % 2 == 1 {
        let Some(more) = lines.next() else { break };
        record.push('\n');
        record.push_str(&more?);
    }
    Ok(Some(record))
}

/// Parse a standard export back into coordinate vectors.
///
/// # Errors
/// `InvalidArgument` for a malformed header or cell, `Io` if reading fails.
pub fn read_csv_standard(input: impl BufRead) -> Result<Vec<CsvRow>, TriError> {
    let mut lines = input.lines();
    let header = match next_record(&mut lines)? {
        Some(line) => split_cells(&line)?,
        None => return Err(TriError::InvalidArgument("empty CSV input".into())),
    };
    let first = header
        .iter()
        .position(|h| h.starts_with('T') && h.contains(':'))
        .unwrap_or(header.len());
    let name_col = header[..first].iter().position(|h| h == "name");
    if header[first..].iter().any(|h| !(h.starts_with('T') || h.starts_with('Q') || h.starts_with('K'))) {
        return Err(TriError::InvalidArgument("unexpected coordinate column".into()));
    }
    let width = header.len() - first;

    let mut rows = Vec::new();
    while let Some(line) = next_record(&mut lines)? {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_cells(&line)?;
        if cells.len() != header.len() {
            return Err(TriError::InvalidArgument(format!(
                "row has {} cells, header has {}",
                cells.len(),
                header.len()
            )));
        }
        let vector = cells[first..]
            .iter()
            .map(|c| c.parse::<LargeInteger>())
            .collect::<Result<Vec<_>, _>>()?;
        debug_assert_eq!(vector.len(), width);
        rows.push(CsvRow {
            name: name_col.map(|i| cells[i].clone()),
            vector,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::surfaces::{NormalAlg, NormalCoords, NormalList};
    use crate::triangulation::example;

    #[test]
    fn quotes_survive_a_round_trip() {
        let cells = split_cells(r#""a ""b"", c",2,inf"#).unwrap();
        assert_eq!(cells, vec![r#"a "b", c"#.to_string(), "2".into(), "inf".into()]);
        assert_eq!(quote(r#"x"y"#), r#""x""y""#);
        assert!(split_cells("\"open").is_err());
    }

    #[test]
    fn names_may_span_lines() {
        let name = "two\nlines, \"quoted\"";
        let text = format!(
            "name,T0:0,T0:1,T0:2,T0:3,Q0:01/23,Q0:02/13,Q0:03/12\n{},1,1,1,1,0,0,0\n\"\",0,0,0,0,1,0,0\n",
            quote(name)
        );
        let rows = read_csv_standard(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some(name));
        assert_eq!(rows[1].name.as_deref(), Some(""));
        assert_eq!(rows[1].vector[4], LargeInteger::from(1));
        assert!(read_csv_standard("name,T0:0\n\"open,1\n".as_bytes()).is_err());
    }

    #[test]
    fn standard_export_reads_back() {
        let tri = Arc::new(example::twisted_kxi());
        let list = NormalSurfaces::enumerate(tri, NormalCoords::Standard, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        let mut buf = Vec::new();
        list.write_csv_standard(&mut buf, CsvFields::ALL).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("name,euler,orient,sides,bdry,link,type,T0:0,T0:1,T0:2,T0:3,Q0:01/23"));
        assert_eq!(text.lines().count(), list.size() + 1);

        let rows = read_csv_standard(buf.as_slice()).unwrap();
        let vectors: Vec<&[LargeInteger]> = rows.iter().map(|r| r.vector.as_slice()).collect();
        assert_eq!(vectors, list.vectors().collect::<Vec<_>>());
        assert!(rows.iter().all(|r| r.name.as_deref() == Some("")));
    }

    #[test]
    fn spun_surfaces_print_infinity() {
        let tri = Arc::new(example::figure_eight());
        let list = NormalSurfaces::enumerate(tri, NormalCoords::Quad, NormalList::default(), NormalAlg::default(), None)
            .unwrap();
        let mut buf = Vec::new();
        list.write_csv_standard(&mut buf, CsvFields::BDRY | CsvFields::EULER).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("euler,bdry,T0:0"));
        assert_eq!(text.lines().filter(|l| l.starts_with(",spun,")).count(), 4);
        assert!(text.contains("inf"));

        let mut weights = Vec::new();
        list.write_csv_edge_weight(&mut weights, CsvFields::NONE).unwrap();
        assert!(String::from_utf8(weights).unwrap().starts_with("E0,E1\n"));
    }
}
