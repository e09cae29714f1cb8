//! Golden tests for the DMM codec.
//!
//! These tests read and write whole maps and check the exact bytes, the
//! deduplication guarantees and the atomic save behaviour.

use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use dmm_codec::{
    resolve_atom, write_atomically, AtomInstance, AtomRegistry, AtomType, DmmReader, DmmWriter,
    InMemoryAtomRegistry, InstanceLookup, MapDocument, ReadError, TileId, Value, WriteError,
    WriterOptions,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

const SIMPLE_MAP: &str = "\"aaa\" = (/turf/space,/area)\n\
                          \"aab\" = (/turf/simulated/floor,/area)\n\
                          \n\
                          (1,1,1) = {\"\n\
                          aaaaab\n\
                          \"}\n";

fn registry() -> InMemoryAtomRegistry {
    InMemoryAtomRegistry::new()
        .with(AtomType::new("/area"))
        .with(AtomType::new("/turf/space"))
        .with(AtomType::new("/turf/simulated/floor").with_property("dir", Value::int(2)))
        .with(
            AtomType::new("/obj/sign")
                .with_property("name", Value::string("sign"))
                .with_property("desc", Value::null()),
        )
}

fn read(text: &str) -> MapDocument {
    let reg = registry();
    let mut doc = MapDocument::new();
    DmmReader::with_defaults(&reg).read_str(text, &mut doc).unwrap();
    doc
}

/// Writer that fails once `remaining` bytes have gone through.
struct FailAfter<'a, W: Write> {
    inner: &'a mut W,
    remaining: usize,
}

impl<W: Write> Write for FailAfter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        let n = buf.len().min(self.remaining);
        self.remaining -= n;
        self.inner.write(&buf[..n])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Round trips
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_simple_map_reads_and_writes_back_identically() {
    let mut doc = read(SIMPLE_MAP);

    assert_eq!(doc.tile_at(0, 0, 0).unwrap().orig_id, "aaa");
    assert_eq!(doc.tile_at(1, 0, 0).unwrap().orig_id, "aab");

    let written = DmmWriter::default().write_string(&mut doc).unwrap();
    assert_eq!(written, SIMPLE_MAP);
}

#[test]
fn test_round_trip_without_clean_preserves_topology() {
    let text = "\"a\" = (/obj/sign{name = \"exit, left\"; desc = \"go\"},/turf/space,/area)\n\
                \"b\" = (/turf/simulated/floor{dir = 4},/area)\n\
                \"c\" = (/turf/simulated/floor{dir = 2},/area)\n\
                \"d\" = (/turf/space,/area)\n\
                \n\
                (1,1,1) = {\"\n\
                abcd\n\
                dcba\n\
                \"}\n\
                \n\
                (1,1,2) = {\"\n\
                dd\n\
                \"}\n";
    let mut doc = read(text);
    let before = doc.topology_fingerprint();

    let options = WriterOptions { clean: false, ..WriterOptions::default() };
    let written = DmmWriter::new(options).write_string(&mut doc).unwrap();
    let reread = read(&written);

    assert_eq!(reread.topology_fingerprint(), before);
    assert_eq!(reread.grid.depth(), 2);
    // The floor with a default dir is written without overrides.
    assert!(written.contains("(/turf/simulated/floor,/area)"));
    assert!(written.contains("(/obj/sign{name = \"exit, left\"; desc = \"go\"},/turf/space,/area)"));
}

#[test]
fn test_identical_content_gets_one_legend_line() {
    // "b" and "c" differ only by an override equal to the default.
    let text = "\"a\" = (/turf/space,/area)\n\
                \"b\" = (/turf/simulated/floor,/area)\n\
                \"c\" = (/turf/simulated/floor{dir = 2},/area)\n\
                (1,1,1) = {\"\n\
                abca\n\
                \"}\n";
    let mut doc = read(text);
    let written = DmmWriter::default().write_string(&mut doc).unwrap();

    let legend: Vec<&str> = written
        .lines()
        .filter(|l| l.starts_with('"') && l.contains("\" = ("))
        .collect();
    assert_eq!(legend, vec!["\"a\" = (/turf/space,/area)", "\"b\" = (/turf/simulated/floor,/area)"]);
    assert!(written.contains("\nabba\n"));
}

#[test]
fn test_wide_legend_uses_two_character_keys() {
    let reg = registry();
    let mut doc = MapDocument::new();
    let area = doc.add_instance(reg.canonical_instance("/area").unwrap());
    let sign_type = reg.get_atom("/obj/sign").unwrap();

    doc.create_z_level(1, 60);
    for i in 0..60 {
        let mut sign = AtomInstance::from_type(sign_type);
        sign.properties.insert("name".into(), Value::string(format!("sign {}", i)));
        sign.map_specified.push("name".into());
        let sign = doc.add_instance(Arc::new(sign));
        let mut tile = doc.create_tile();
        tile.instances = vec![sign, area];
        let id = doc.update_tile(tile);
        doc.set_tile_id(i, 0, 0, id).unwrap();
    }

    let report = DmmWriter::default().write_to(&mut doc, &mut Vec::new()).unwrap();
    assert_eq!(report.key_width, 2);
    assert_eq!(report.legend_entries, 60);

    let written = DmmWriter::default().write_string(&mut doc).unwrap();
    assert!(written.starts_with("\"aa\" = (/obj/sign{name = \"sign 0\"},/area)\n"));
    let reread = read(&written);
    assert_eq!(reread.key_width(), 2);
    assert_eq!(reread.topology_fingerprint(), doc.topology_fingerprint());
}

#[test]
fn test_edited_tile_is_written_with_override() {
    let reg = registry();
    let mut doc = read(SIMPLE_MAP);

    // Rotate the floor at (1, 0, 0).
    let floor = resolve_atom("/turf/simulated/floor{dir = 8}", &reg).unwrap();
    let floor = doc.add_instance(floor);
    let area = doc.tile_at(1, 0, 0).unwrap().instances[1];
    let mut tile = doc.create_tile();
    tile.instances = vec![floor, area];
    let id = doc.update_tile(tile);
    doc.set_tile_id(1, 0, 0, id).unwrap();

    let written = DmmWriter::default().write_string(&mut doc).unwrap();
    assert_eq!(
        written,
        "\"aaa\" = (/turf/space,/area)\n\
         \"aab\" = (/turf/simulated/floor{dir = 8},/area)\n\
         \n\
         (1,1,1) = {\"\n\
         aaaaab\n\
         \"}\n"
    );
    assert_eq!(doc.instance(floor).unwrap().map_specified, vec!["dir"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_write_path_then_read_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("station.dmm");
    let reg = registry();

    let mut doc = read(SIMPLE_MAP);
    DmmWriter::default().write_path(&mut doc, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), SIMPLE_MAP);

    let mut reread = MapDocument::new();
    let report = DmmReader::with_defaults(&reg).read_path(&path, &mut reread).unwrap();
    assert_eq!(report.tiles, 2);
    assert_eq!(reread.topology_fingerprint(), doc.topology_fingerprint());
    assert!(!dir.path().join("station.dmm.tmp").exists());
}

#[test]
fn test_failure_during_row_emission_keeps_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("station.dmm");
    fs::write(&path, SIMPLE_MAP).unwrap();

    let mut doc = read(SIMPLE_MAP);
    doc.resize(0, 2, 40);
    let writer = DmmWriter::default();

    // Enough room for the legend and a few rows, not the whole grid.
    let result = write_atomically(&path, ".tmp", |out| {
        let mut failing = FailAfter { inner: out, remaining: 120 };
        writer.write_to(&mut doc, &mut failing)
    });

    assert!(matches!(result, Err(WriteError::Io(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), SIMPLE_MAP);
    assert!(!dir.path().join("station.dmm.tmp").exists());
}

#[test]
fn test_missing_file_is_empty_map() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry();
    let mut doc = MapDocument::new();
    let report = DmmReader::with_defaults(&reg)
        .read_path(&dir.path().join("absent.dmm"), &mut doc)
        .unwrap();
    assert_eq!(report.z_levels, 0);
    assert_eq!(doc.tiles().len(), 0);
}

#[test]
fn test_registry_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let types = dir.path().join("types.json");
    fs::write(
        &types,
        r#"[
            {"path": "/area"},
            {"path": "/turf/space"},
            {"path": "/turf/simulated/floor", "vars": {"dir": "2"}}
        ]"#,
    )
    .unwrap();

    let reg = InMemoryAtomRegistry::from_path(&types).unwrap();
    let mut doc = MapDocument::new();
    DmmReader::with_defaults(&reg).read_str(SIMPLE_MAP, &mut doc).unwrap();
    assert_eq!(DmmWriter::default().write_string(&mut doc).unwrap(), SIMPLE_MAP);
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_legend_reference_is_fatal() {
    let reg = registry();
    let mut doc = MapDocument::new();
    let text = "\"aaa\" = (/turf/space,/area)\n(1,1,1) = {\"\naaaaac\n\"}\n";
    let err = DmmReader::with_defaults(&reg).read_str(text, &mut doc).unwrap_err();
    assert!(matches!(err, ReadError::UnknownLegendReference { line: 3, ref key } if key == "aac"));
}

#[test]
fn test_ragged_rows_are_fatal() {
    let reg = registry();
    let mut doc = MapDocument::new();
    let text = "\"a\" = (/turf/space,/area)\n(1,1,1) = {\"\naa\naaa\n\"}\n";
    let err = DmmReader::with_defaults(&reg).read_str(text, &mut doc).unwrap_err();
    assert!(matches!(err, ReadError::MalformedGrid { line: 4, .. }));
}

#[test]
fn test_unknown_atoms_dropped_but_grid_kept() {
    let text = "\"a\" = (/obj/machinery/unknown{dir = 4},/turf/space,/area)\n\
                (1,1,1) = {\"\n\
                aa\n\
                \"}\n";
    let reg = registry();
    let mut doc = MapDocument::new();
    let report = DmmReader::with_defaults(&reg).read_str(text, &mut doc).unwrap();
    assert_eq!(report.unknown_atoms.len(), 1);
    assert_eq!(doc.grid.get(1, 0, 0), Some(TileId(0)));

    let written = DmmWriter::default().write_string(&mut doc).unwrap();
    assert!(written.starts_with("\"a\" = (/turf/space,/area)\n"));
}

#[test]
fn test_tile_of_only_unknown_atoms_reads_back() {
    let text = "\"a\" = (/turf/space,/area)\n\
                \"b\" = (/obj/gone)\n\
                (1,1,1) = {\"\n\
                ab\n\
                \"}\n";
    let reg = registry();
    let mut doc = MapDocument::new();
    let report = DmmReader::with_defaults(&reg).read_str(text, &mut doc).unwrap();
    assert!(report.unknown_atoms.contains("/obj/gone"));
    let before = doc.topology_fingerprint();

    let options = WriterOptions { clean: false, ..WriterOptions::default() };
    let written = DmmWriter::new(options).write_string(&mut doc).unwrap();
    assert!(written.contains("\" = ()\n"));

    let reread = read(&written);
    assert_eq!(reread.topology_fingerprint(), before);
    assert!(reread.tile_at(1, 0, 0).unwrap().instances.is_empty());
}
