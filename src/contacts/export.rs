use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;

use crate::model::Contact;

#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "Contact Name")]
    name: &'a str,
    #[serde(rename = "Company")]
    company: &'a str,
    #[serde(rename = "Position")]
    position: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Phone Number")]
    phone: &'a str,
}

const HEADER: [&str; 5] = ["Contact Name", "Company", "Position", "Email", "Phone Number"];

/// The header row is written even when there are no contacts.
pub fn write_csv<W: Write>(out: W, contacts: &[&Contact]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(HEADER)?;
    for c in contacts {
        writer.serialize(Row {
            name: &c.name,
            company: &c.company,
            position: &c.position,
            email: &c.email,
            phone: &c.phone,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `contacts` to a timestamped CSV file in `dir`.
pub fn export_to_dir(dir: &Path, org_id: &str, contacts: &[&Contact]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).wrap_err_with(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!(
        "contacts-{}-{}.csv",
        org_id,
        Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = File::create(&path).wrap_err_with(|| format!("creating {}", path.display()))?;
    write_csv(file, contacts)?;
    tracing::info!(path = %path.display(), rows = contacts.len(), "contacts exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let ada = Contact {
            name: "Ada Lovelace".into(),
            company: "Engines, Ltd".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        };
        let mut buf = Vec::new();
        write_csv(&mut buf, &[&ada]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Contact Name,Company,Position,Email,Phone Number\n\
             Ada Lovelace,\"Engines, Ltd\",,ada@example.com,\n"
        );
    }

    #[test]
    fn empty_export_still_has_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Contact Name,Company,Position,Email,Phone Number\n"
        );
    }
}
