//! Plain-text and CSV renderings of a result list.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::domain::Resource;

const BASE_HEADERS: [&str; 4] = ["Name", "Category", "Distance_km", "Address"];
const CONTACT_HEADERS: [&str; 2] = ["Phone", "Hours"];

fn row(resource: &Resource, include_contact: bool) -> Vec<String> {
    let mut cells = vec![
        resource.name.clone(),
        resource.category.clone(),
        format!("{:.2}", resource.distance_km),
        resource.address.clone(),
    ];
    if include_contact {
        cells.push(resource.phone.clone());
        cells.push(resource.hours.clone());
    }
    cells
}

fn headers(include_contact: bool) -> Vec<&'static str> {
    let mut h = BASE_HEADERS.to_vec();
    if include_contact {
        h.extend(CONTACT_HEADERS);
    }
    h
}

/// Write the visible columns as CSV, one row per resource, in list order.
pub fn write_csv<W: io::Write>(
    writer: W,
    resources: &[Resource],
    include_contact: bool,
) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(headers(include_contact))?;
    for resource in resources {
        csv.write_record(row(resource, include_contact))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(
    path: &Path,
    resources: &[Resource],
    include_contact: bool,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_csv(file, resources, include_contact).context("Failed to write CSV")
}

/// Fixed-width text table for terminal output
pub fn render_table(resources: &[Resource], include_contact: bool) -> String {
    let headers = headers(include_contact);
    let rows: Vec<Vec<String>> = resources.iter().map(|r| row(r, include_contact)).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut out = format_line(&header_cells);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for cells in &rows {
        out.push_str(&format_line(cells));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, ElementKind, ElementRef};

    fn resource(name: &str, distance_km: f64, address: &str) -> Resource {
        Resource {
            name: name.to_string(),
            category: "Pharmacy".to_string(),
            coordinate: Coordinate::new(17.386, 78.4867),
            distance_km,
            address: address.to_string(),
            phone: "N/A".to_string(),
            hours: "24/7".to_string(),
            source: ElementRef {
                kind: ElementKind::Node,
                id: 1,
            },
        }
    }

    #[test]
    fn test_csv_visible_columns() {
        let mut buf = Vec::new();
        write_csv(
            &mut buf,
            &[resource("MedPlus", 0.1, "Abids, Hyderabad")],
            false,
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Name,Category,Distance_km,Address\nMedPlus,Pharmacy,0.10,\"Abids, Hyderabad\"\n"
        );
    }

    #[test]
    fn test_csv_with_contact_columns() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[resource("MedPlus", 1.5, "Abids")], true).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Category,Distance_km,Address,Phone,Hours")
        );
        assert_eq!(lines.next(), Some("MedPlus,Pharmacy,1.50,Abids,N/A,24/7"));
    }

    #[test]
    fn test_csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.csv");

        write_csv_file(&path, &[resource("A", 0.2, "X"), resource("B", 0.3, "Y")], false)
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let names: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(
            &[resource("MedPlus", 0.1, "Abids"), resource("Apollo Pharmacy", 2.0, "Koti")],
            false,
        );
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Name             Category"));
        assert!(lines[2].starts_with("MedPlus          Pharmacy  0.10"));
        assert!(lines[3].starts_with("Apollo Pharmacy  Pharmacy  2.00"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_table(&[], false);
        assert_eq!(table.lines().count(), 2);
    }
}
