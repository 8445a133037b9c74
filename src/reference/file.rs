use anyhow::{anyhow, ensure, Context as _, Result};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek as _, SeekFrom, Write as _};
use std::path::Path;

use super::{Entry, ReferenceKind};

const DELIMITER: u8 = b';';

/// Reads a reference table. Returns Ok(None) if the file doesn't exist yet.
pub fn load(path: &Path, kind: ReferenceKind) -> Result<Option<Vec<Entry>>> {
    log::info!("Loading reference file {}...", path.display());
    if !path.try_exists()? {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| anyhow!("Failed to read reference file {}", path.display()))?;
    let entries = parse(&content, kind)
        .with_context(|| anyhow!("Failed to parse reference file {}", path.display()))?;
    log::info!("Loading reference file...done ({} entries)", entries.len());
    Ok(Some(entries))
}

pub fn parse(content: &str, kind: ReferenceKind) -> Result<Vec<Entry>> {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    ensure!(
        headers == [kind.key_header(), kind.value_header()],
        "Reference file must have exactly 2 columns: '{}' and '{}', found {:?}",
        kind.key_header(),
        kind.value_header(),
        headers,
    );

    let mut entries = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let name = record.get(0).unwrap_or_default();
        let code = record.get(1).unwrap_or_default().trim();
        if name.trim().is_empty() && code.is_empty() {
            continue;
        }
        if name.trim().is_empty() || code.is_empty() {
            // +2: header line and 1-based numbering
            log::warn!(
                "Ignoring incomplete reference line {}: {:?}",
                index + 2,
                record
            );
            continue;
        }
        entries.push(Entry::new(kind, name, code));
    }
    Ok(entries)
}

pub fn render(entries: &[Entry], kind: ReferenceKind) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(vec![]);
    writer.write_record([kind.key_header(), kind.value_header()])?;
    for entry in entries {
        writer.write_record([&entry.name, &entry.code])?;
    }
    let bytes = writer.into_inner().map_err(|err| anyhow!("{}", err))?;
    Ok(String::from_utf8(bytes)?)
}

/// Appends a single entry and flushes it to disk before returning.
pub fn append(path: &Path, entry: &Entry) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .with_context(|| anyhow!("Failed to open reference file {}", path.display()))?;

    // A hand-edited file may lack the final newline
    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(&mut file);
    writer.write_record([&entry.name, &entry.code])?;
    writer.flush()?;
    drop(writer);
    file.sync_data()?;
    Ok(())
}

pub fn save(entries: &[Entry], path: &Path, kind: ReferenceKind) -> Result<()> {
    log::info!("Saving reference file {}...", path.display());
    let content = render(entries, kind)?;

    // First write to temporary file so we don't lose data if writing fails halfway
    let filename = path
        .file_name()
        .ok_or_else(|| anyhow!("Path has no filename"))?
        .to_str()
        .ok_or_else(|| anyhow!("Filename isn't valid utf-8"))?;
    let tmppath = path.with_file_name(format!("{}.temp", filename));
    fs::write(&tmppath, content)?;

    // Ok, writing succeeded, let's now replace the real file with the tmpfile
    fs::rename(&tmppath, path)?;

    log::info!("Saving reference file...done");
    Ok(())
}
