mod common;

use std::{fs, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use xml_file_batch::{
    clock::ManualClock,
    config::XmlReaderConfig,
    coordinator::{RunCoordinator, RunState},
    item::{json::JsonItemWriterBuilder, xml::XmlRecord},
    tracking::{JsonFileTables, LocalFileSystem, ProcessedFileTracker, TableProvider},
};

use common::{Fixture, TABLE, day, init_logger};

fn json_coordinator(fixture: &Fixture) -> RunCoordinator {
    RunCoordinator::new(
        Arc::new(JsonFileTables::new(fixture.dir.path().join("tables"))),
        Arc::new(LocalFileSystem),
    )
    .with_clock(Arc::new(ManualClock::new(day(0))))
}

fn records(path: &std::path::Path) -> Result<Vec<XmlRecord>> {
    fs::read_to_string(path)?
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[test]
fn records_should_carry_offset_filename_and_node() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&[]);
    let content = "<catalog>\n  <book id=\"1\"><price>10</price></book>\n  <book id=\"2\"/>\n</catalog>";
    fixture.add_file("catalog.xml", content);
    let out = fixture.dir.path().join("out.jsonl");
    let writer = JsonItemWriterBuilder::new().from_path(&out)?;

    let outcome = json_coordinator(&fixture).run(&fixture.config(), day(0), &writer, 10)?;
    assert_eq!(outcome.state, RunState::Committed);

    let records = records(&out)?;
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.filename, "catalog.xml");
        assert!(content[record.offset as usize..].starts_with("<book"));
    }
    assert_eq!(records[0].record, "<book id=\"1\"><price>10</price></book>");
    assert_eq!(records[1].record, "<book id=\"2\"/>");

    let line: Value = serde_json::from_str(fs::read_to_string(&out)?.lines().next().unwrap_or("{}"))?;
    assert_eq!(line["offset"], 12);
    Ok(())
}

#[test]
fn processed_files_should_survive_across_coordinators() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["a.xml"]);
    let out = fixture.dir.path().join("out.jsonl");
    let writer = JsonItemWriterBuilder::new().append(true).from_path(&out)?;

    json_coordinator(&fixture).run(&fixture.config(), day(0), &writer, 10)?;
    fixture.add_file("b.xml", "<catalog><book id=\"b\"/></catalog>");
    let outcome = json_coordinator(&fixture).run(&fixture.config(), day(1), &writer, 10)?;

    assert_eq!(outcome.committed.len(), 1);
    assert!(outcome.committed.contains("b.xml"));
    assert_eq!(records(&out)?.len(), 3);

    let tables = JsonFileTables::new(fixture.dir.path().join("tables"));
    let tracker = ProcessedFileTracker::new(tables.open_or_create(TABLE)?);
    assert_eq!(tracker.processed_at("a.xml")?, Some(day(0)));
    Ok(())
}

#[test]
fn pattern_should_filter_file_names() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["catalog1.xml", "catalog2.xml", "orders.xml"]);
    let config = XmlReaderConfig {
        pattern: Some("^catalog".to_string()),
        ..fixture.config()
    };
    let out = fixture.dir.path().join("out.jsonl");
    let writer = JsonItemWriterBuilder::new().from_path(&out)?;

    let outcome = json_coordinator(&fixture).run(&config, day(0), &writer, 10)?;

    assert_eq!(outcome.committed.len(), 2);
    assert!(!outcome.committed.contains("orders.xml"));
    assert!(records(&out)?.iter().all(|r| r.filename.starts_with("catalog")));
    Ok(())
}

#[test]
fn delete_action_should_remove_consumed_files() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["a.xml", "b.xml"]);
    let config = XmlReaderConfig {
        action_after_process: Some("delete".to_string()),
        ..fixture.config()
    };
    let writer = JsonItemWriterBuilder::new().from_path(fixture.dir.path().join("out.jsonl"))?;

    let outcome = json_coordinator(&fixture).run(&config, day(0), &writer, 1)?;

    assert_eq!(outcome.committed.len(), 2);
    assert_eq!(fs::read_dir(fixture.input_dir())?.count(), 0);
    Ok(())
}

#[test]
fn move_action_should_relocate_consumed_files() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["a.xml"]);
    let target = fixture.dir.path().join("done");
    fs::create_dir(&target)?;
    let config = XmlReaderConfig {
        action_after_process: Some("MOVE".to_string()),
        target_folder: Some(target.display().to_string()),
        ..fixture.config()
    };
    let writer = JsonItemWriterBuilder::new().from_path(fixture.dir.path().join("out.jsonl"))?;

    json_coordinator(&fixture).run(&config, day(0), &writer, 10)?;

    assert!(!fixture.input_dir().join("a.xml").exists());
    assert!(target.join("a.xml").exists());
    Ok(())
}

#[cfg(feature = "zip")]
#[test]
fn archive_action_should_zip_consumed_files() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["a.xml"]);
    let target = fixture.dir.path().join("archive");
    fs::create_dir(&target)?;
    let config = XmlReaderConfig {
        action_after_process: Some("Archive".to_string()),
        target_folder: Some(target.display().to_string()),
        ..fixture.config()
    };
    let writer = JsonItemWriterBuilder::new().from_path(fixture.dir.path().join("out.jsonl"))?;

    json_coordinator(&fixture).run(&config, day(0), &writer, 10)?;

    assert!(!fixture.input_dir().join("a.xml").exists());
    let archive = zip::ZipArchive::new(fs::File::open(target.join("a.xml.zip"))?)?;
    assert_eq!(archive.len(), 1);
    Ok(())
}

#[test]
fn malformed_file_should_fail_the_run_without_commit() -> Result<()> {
    init_logger();
    let fixture = Fixture::with_files(&["a.xml"]);
    fixture.add_file("broken.xml", "<catalog><book></catalog>");
    let writer = JsonItemWriterBuilder::new().from_path(fixture.dir.path().join("out.jsonl"))?;

    let outcome = json_coordinator(&fixture).run(&fixture.config(), day(0), &writer, 10)?;

    assert_eq!(outcome.state, RunState::Failed);
    assert!(outcome.committed.is_empty());
    assert!(fixture.input_dir().join("broken.xml").exists());
    assert_eq!(fixture.staging_areas(), 0);
    Ok(())
}
