use mdc_console::device_registry::{
    load_devices, persist_devices, DeviceRecord, DeviceRegistry, ImportSummary,
};
use mdc_console::interchange::{export_csv, export_json, parse_import};

fn rec(ip: &str, id: u8, site: &str) -> DeviceRecord {
    DeviceRecord::new(ip, id).with_site(site)
}

#[test]
fn upsert_persist_and_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("saved_devices.json");

    let registry = DeviceRegistry::open(&path)?;
    assert!(registry.is_empty());
    assert!(registry.upsert(rec("10.0.0.1", 1, "Lobby"))?);
    assert!(registry.upsert(rec("10.0.0.2", 2, "Hall"))?);
    // same address replaces in place
    assert!(!registry.upsert(rec(" 10.0.0.1 ", 5, "Lobby East"))?);

    let reopened = DeviceRegistry::open(&path)?;
    assert_eq!(reopened.list(), registry.list());
    assert_eq!(
        reopened.list(),
        vec![rec("10.0.0.1", 5, "Lobby East"), rec("10.0.0.2", 2, "Hall")]
    );
    assert_eq!(
        reopened.find_by_address("10.0.0.2").map(|d| d.numeric_id),
        Some(2)
    );
    Ok(())
}

#[test]
fn single_record_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("saved_devices.json");
    let registry = DeviceRegistry::open(&path)?;
    registry.upsert(rec("10.0.0.5", 1, "Lobby"))?;
    registry.persist()?;
    assert_eq!(load_devices(&path)?, vec![rec("10.0.0.5", 1, "Lobby")]);
    Ok(())
}

#[test]
fn delete_missing_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let registry = DeviceRegistry::open(&path)?;
    assert!(!registry.delete("10.9.9.9")?);
    assert!(!path.exists(), "nothing should be written");

    registry.upsert(rec("10.0.0.1", 0, ""))?;
    assert!(registry.delete("10.0.0.1")?);
    assert!(registry.is_empty());
    assert!(load_devices(&path)?.is_empty());
    Ok(())
}

#[test]
fn import_batch_merges_by_address() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let registry = DeviceRegistry::open(&path)?;
    registry.upsert(rec("A", 0, ""))?;

    let summary = registry.import_batch([rec("A", 5, ""), rec("B", 1, "")])?;
    assert_eq!(
        summary,
        ImportSummary {
            added: 1,
            updated: 1
        }
    );
    assert_eq!(registry.list(), vec![rec("A", 5, ""), rec("B", 1, "")]);
    assert_eq!(load_devices(&path)?, registry.list());
    Ok(())
}

#[test]
fn malformed_entries_are_dropped_on_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    std::fs::write(
        &path,
        r#"[
  {"ip": "10.0.0.1", "id": 3, "site": " Lobby ", "description": "left"},
  {"ip": "   "},
  "garbage",
  {"id": 4},
  {"ip": "10.0.0.2", "id": "x"}
]"#,
    )?;
    let devices = load_devices(&path)?;
    assert_eq!(
        devices,
        vec![
            rec("10.0.0.1", 3, "Lobby").with_description("left"),
            rec("10.0.0.2", 0, ""),
        ]
    );
    Ok(())
}

#[test]
fn missing_file_loads_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    assert!(load_devices(&dir.path().join("nope.json"))?.is_empty());
    Ok(())
}

#[test]
fn persist_then_load_is_identity() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let devices = vec![
        rec("10.0.0.1", 0, "").with_description("x"),
        rec("fe80::1", 255, "Roof"),
    ];
    persist_devices(&path, &devices)?;
    assert_eq!(load_devices(&path)?, devices);
    // overwriting keeps the file whole
    persist_devices(&path, &devices[..1])?;
    assert_eq!(load_devices(&path)?, devices[..1].to_vec());
    Ok(())
}

#[test]
fn csv_headers_are_case_insensitive() -> Result<(), Box<dyn std::error::Error>> {
    let lower = "ip,id,site,description\n10.0.0.1,2,Lobby,left\n,3,Nowhere,\n";
    let upper = "IP,ID,SITE,DESCRIPTION\n10.0.0.1,2,Lobby,left\n,3,Nowhere,\n";
    let a = parse_import("devices.csv", lower.as_bytes())?;
    let b = parse_import("DEVICES.CSV", upper.as_bytes())?;
    assert_eq!(a, b);
    assert_eq!(a, vec![rec("10.0.0.1", 2, "Lobby").with_description("left")]);
    Ok(())
}

#[test]
fn export_formats_reimport() -> Result<(), Box<dyn std::error::Error>> {
    let devices = vec![rec("10.0.0.1", 2, "Lobby"), rec("10.0.0.2", 0, "")];
    let json = export_json(&devices)?;
    assert!(json.contains("\"ip\": \"10.0.0.1\""));
    assert_eq!(parse_import("out.json", json.as_bytes())?, devices);

    let csv = export_csv(&devices)?;
    assert!(csv.starts_with("ip,id,site,description\n"));
    assert_eq!(parse_import("out.csv", csv.as_bytes())?, devices);
    Ok(())
}

#[test]
fn truncated_file_opens_empty_and_is_set_aside() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("saved_devices.json");
    let truncated = r#"[{"ip":"10.0.0.1"},"#;
    std::fs::write(&path, truncated)?;

    let registry = DeviceRegistry::open(&path)?;
    assert!(registry.is_empty());
    let aside = dir.path().join("saved_devices.json.corrupt");
    assert_eq!(std::fs::read_to_string(&aside)?, truncated);

    // a later save must not clobber the unreadable copy
    registry.upsert(rec("10.0.0.2", 1, ""))?;
    assert_eq!(std::fs::read_to_string(&aside)?, truncated);
    assert_eq!(load_devices(&path)?, vec![rec("10.0.0.2", 1, "")]);
    Ok(())
}

#[test]
fn import_batch_trims_and_skips_empty_addresses() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let registry = DeviceRegistry::open(&path)?;
    registry.upsert(rec("A", 0, ""))?;

    let padded = DeviceRecord {
        address: " A ".into(),
        numeric_id: 5,
        site: " Lobby ".into(),
        description: String::new(),
    };
    let blank = DeviceRecord {
        address: "   ".into(),
        numeric_id: 1,
        site: String::new(),
        description: String::new(),
    };
    let summary = registry.import_batch([padded, blank])?;
    assert_eq!(
        summary,
        ImportSummary {
            added: 0,
            updated: 1
        }
    );
    assert_eq!(registry.list(), vec![rec("A", 5, "Lobby")]);
    assert_eq!(load_devices(&path)?, registry.list());
    Ok(())
}

#[test]
fn reload_never_reverts_concurrent_upserts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("devices.json");
    let registry = DeviceRegistry::open(&path)?;

    std::thread::scope(|s| {
        let writer = s.spawn(|| {
            for i in 0..40u8 {
                registry
                    .upsert(rec(&format!("10.0.1.{i}"), i, ""))
                    .expect("upsert");
            }
        });
        let reloader = s.spawn(|| {
            for _ in 0..40 {
                registry.reload().expect("reload");
            }
        });
        writer.join().expect("writer thread");
        reloader.join().expect("reload thread");
    });

    let addresses: Vec<_> = registry.list().into_iter().map(|d| d.address).collect();
    for i in 0..40u8 {
        assert!(
            addresses.contains(&format!("10.0.1.{i}")),
            "10.0.1.{i} lost"
        );
    }
    assert_eq!(load_devices(&path)?, registry.list());
    Ok(())
}
