//! `LoggerService` writing through the file-backed record store.

use std::fs;

use combustion_logger::adapters::datafile::DataFileStore;
use combustion_logger::app::ports::{RecordStore, RecordStream};
use combustion_logger::app::service::LoggerService;
use combustion_logger::config::SystemConfig;

use crate::mock_hw::{MockHardware, RecordingSink};

const T0: i64 = 1_700_003_640; // 2023-11-14 23:14:00 UTC

#[test]
fn idle_minute_lands_in_the_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = SystemConfig {
        site_name: "bbbMPLS".into(),
        write_units_line: true,
        save_path: dir.path().to_path_buf(),
        ..SystemConfig::default()
    };
    let mut store = DataFileStore::new(dir.path(), &config.site_name, config.max_file_size).unwrap();
    let mut svc = LoggerService::new(config);
    let mut hw = MockHardware::new(80.0);
    let mut sink = RecordingSink::default();

    svc.start(T0, &mut hw, &mut store, &mut sink).unwrap();
    for now in T0 + 1..=T0 + 60 {
        svc.tick(now, &mut hw, &mut store, &mut sink).unwrap();
    }
    svc.shutdown(&mut hw, &mut store, &mut sink).unwrap();

    let path = store.current_path(RecordStream::Data).unwrap().to_path_buf();
    assert_eq!(
        path.file_name().unwrap(),
        "2023-11-14_23_14_00_bbbMPLS_scanData.dat"
    );
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "header, units, one close-out");
    assert!(lines[0].starts_with("site,time,rec_num,t_whburner"));
    assert!(lines[1].starts_with(",UTC,integer,deg. F"));
    assert!(lines[2].starts_with("bbbMPLS,\"2023-11-14 23:15:00\",1,80.0"));
    assert_eq!(store.current_file_size(RecordStream::Data), text.len() as u64);

    let diag = store.current_path(RecordStream::Diagnostics).unwrap();
    assert!(diag.to_string_lossy().ends_with("_bbbMPLS_scanInfo.csv"));
}

#[test]
fn oversize_data_file_rotates_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let config = SystemConfig {
        max_file_size: 100,
        save_path: dir.path().to_path_buf(),
        ..SystemConfig::default()
    };
    let mut store = DataFileStore::new(dir.path(), &config.site_name, config.max_file_size).unwrap();
    let mut svc = LoggerService::new(config);
    let mut hw = MockHardware::new(80.0);
    let mut sink = RecordingSink::default();

    svc.start(T0, &mut hw, &mut store, &mut sink).unwrap();
    let first = store.current_path(RecordStream::Data).unwrap().to_path_buf();
    for now in T0 + 1..=T0 + 61 {
        svc.tick(now, &mut hw, &mut store, &mut sink).unwrap();
    }
    let second = store.current_path(RecordStream::Data).unwrap().to_path_buf();
    assert_ne!(first, second);

    let header = fs::read_to_string(&first).unwrap().lines().next().unwrap().to_owned();
    let rotated = fs::read_to_string(&second).unwrap();
    assert_eq!(rotated.lines().collect::<Vec<_>>(), vec![header.as_str()]);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
}
