//! Text rendering of the conflict log

use std::io::{self, Write};

use crate::conflict::{Classification, ConflictEntry, ConflictLog};
use crate::module::ModuleRecord;
use crate::registry::Registry;

/// Render one entry as report lines. `NEW_MODULE` entries render nothing.
pub fn render_entry(entry: &ConflictEntry) -> Vec<String> {
    let class = entry.classification;
    match class {
        Classification::NewModule => Vec::new(),
        Classification::NewRevision => entry
            .modules
            .first()
            .map(|m| vec![format!("New rev     {}/{}", m.name(), m.effective_revision())])
            .unwrap_or_default(),
        Classification::KnownRevision => entry
            .modules
            .first()
            .map(|m| vec![format!("=           {}/{}", m.name(), m.effective_revision())])
            .unwrap_or_default(),
        _ => {
            let mut lines = vec![format!("ERROR {} ==>  {}", class.code(), class.headline())];
            lines.extend(entry.modules.iter().map(|m| module_line(class, m)));
            lines
        }
    }
}

fn module_line(class: Classification, m: &ModuleRecord) -> String {
    match class.detail(m) {
        Some(detail) => format!(
            "             {}/{} {} from {} {}",
            m.name(),
            m.effective_revision(),
            detail,
            m.release(),
            m.filename()
        ),
        None => format!(
            "             {}/{} from {} {}",
            m.name(),
            m.effective_revision(),
            m.release(),
            m.filename()
        ),
    }
}

/// Write the log, focused on `release` when given
pub fn write_log<W: Write>(out: &mut W, log: &ConflictLog, release: Option<&str>) -> io::Result<()> {
    match release {
        Some(r) => writeln!(out, "Focusing on release {}", r)?,
        None => writeln!(out, "Showing results for all releases")?,
    }
    for entry in log.filter(release) {
        for line in render_entry(entry) {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

/// Write every record currently held by the registry
pub fn write_scan_results<W: Write>(out: &mut W, registry: &Registry) -> io::Result<()> {
    writeln!(out, "===== Scan results =====")?;
    for m in registry.modules() {
        writeln!(out, "{}", m)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, prefix: &str, release: &str) -> ModuleRecord {
        ModuleRecord::new(name, "2020-01-01")
            .with_prefix(prefix)
            .with_release(release)
            .with_filename(format!("{}.yang", name))
    }

    #[test]
    fn test_new_module_is_silent() {
        let entry = ConflictEntry {
            classification: Classification::NewModule,
            modules: vec![module("a", "a", "r1")],
        };
        assert!(render_entry(&entry).is_empty());
    }

    #[test]
    fn test_prefix_collision_lines() {
        let entry = ConflictEntry {
            classification: Classification::CollPrefix,
            modules: vec![module("a", "x", "r1"), module("b", "x", "r2")],
        };
        let lines = render_entry(&entry);
        assert_eq!(lines[0], "ERROR 4 ==>  Prefix collision between");
        assert_eq!(lines[1], "             a/2020-01-01 x from r1 a.yang");
        assert_eq!(lines[2], "             b/2020-01-01 x from r2 b.yang");
    }

    #[test]
    fn test_write_log_focus() {
        let mut log = ConflictLog::new();
        log.append(
            Classification::DiffPrefix,
            vec![module("a", "x", "r1"), module("a", "y", "r2")],
        );
        log.append(Classification::ErrorBase, vec![module("c", "c", "r3")]);

        let mut out = Vec::new();
        write_log(&mut out, &log, Some("r2")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Focusing on release r2\n"));
        assert!(text.contains("ERROR 6 ==>"));
        assert!(!text.contains("c/2020-01-01"));

        let mut out = Vec::new();
        write_log(&mut out, &log, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ERROR 3 ==>  Generic error with"));
        assert!(text.contains("             c/2020-01-01 from r3 c.yang"));
    }
}
