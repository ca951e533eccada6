use mdc_console::coercion::{
    coerce, coerce_arguments, coerce_selection, split_raw_override, Arguments, TypedValue,
};
use mdc_console::command_catalog::{CommandCatalog, Operation};
use mdc_console::error::CoercionError;
use mdc_console::field::FieldKind;
use std::net::IpAddr;

fn catalog() -> CommandCatalog {
    CommandCatalog::builtin().expect("embedded commands.toml")
}

#[test]
fn integer_range_edges() {
    let catalog = catalog();
    let field = &catalog.lookup("volume").unwrap().fields[0];
    assert_eq!(coerce(field, "0"), Ok(TypedValue::Integer(0)));
    assert_eq!(coerce(field, " 100 "), Ok(TypedValue::Integer(100)));
    assert_eq!(
        coerce(field, "101"),
        Err(CoercionError::OutOfRange {
            field: "VOLUME".into(),
            value: 101,
            lower: 0,
            upper: 100
        })
    );
    assert!(matches!(
        coerce(field, "-1"),
        Err(CoercionError::OutOfRange { value: -1, .. })
    ));
    let err = coerce(field, "loud").unwrap_err();
    assert!(matches!(err, CoercionError::NotANumber { .. }));
    assert_eq!(err.field(), "VOLUME");
}

#[test]
fn every_ranged_integer_field_rejects_just_outside() {
    let catalog = catalog();
    let mut checked = 0;
    for cmd in catalog.iter() {
        for field in &cmd.fields {
            let FieldKind::Integer { range: Some(b) } = field.kind else {
                continue;
            };
            for v in [b.lower, (b.lower + b.upper) / 2, b.upper] {
                assert_eq!(coerce(field, &v.to_string()), Ok(TypedValue::Integer(v)));
            }
            for v in [b.lower - 1, b.upper + 1] {
                assert!(
                    matches!(coerce(field, &v.to_string()), Err(CoercionError::OutOfRange { .. })),
                    "{}.{} accepted {v}",
                    cmd.id,
                    field.name
                );
            }
            checked += 1;
        }
    }
    assert!(checked > 10);
}

#[test]
fn every_enumeration_symbol_is_accepted_in_any_case() {
    let catalog = catalog();
    for cmd in catalog.iter() {
        for field in &cmd.fields {
            let FieldKind::Enumeration { symbols } = &field.kind else {
                continue;
            };
            for sym in symbols {
                let expected = TypedValue::Symbol {
                    name: sym.name.clone(),
                    code: sym.code,
                };
                assert_eq!(coerce(field, &sym.name.to_ascii_lowercase()), Ok(expected.clone()));
                assert_eq!(coerce(field, &sym.name), Ok(expected));
            }
            assert!(matches!(
                coerce(field, "NOT_A_SYMBOL"),
                Err(CoercionError::UnknownSymbol { .. })
            ));
        }
    }
}

#[test]
fn enumeration_is_case_insensitive() {
    let catalog = catalog();
    let field = &catalog.lookup("input_source").unwrap().fields[0];
    for raw in ["hdmi1", "HDMI1", "Hdmi1"] {
        assert_eq!(
            coerce(field, raw),
            Ok(TypedValue::Symbol {
                name: "HDMI1".into(),
                code: 0x21
            })
        );
    }
    assert!(matches!(
        coerce(field, "HDMI9"),
        Err(CoercionError::UnknownSymbol { .. })
    ));
}

#[test]
fn bitmask_order_and_empty_input() {
    let catalog = catalog();
    let field = &catalog.lookup("weekly_restart").unwrap().fields[0];
    let a = coerce(field, "MON,WED").unwrap();
    let b = coerce(field, "WED,MON").unwrap();
    assert_eq!(a, b);
    assert_eq!(
        a,
        TypedValue::Bitmask {
            members: vec!["MON".into(), "WED".into()],
            bits: 0x05
        }
    );
    assert_eq!(
        coerce(field, ""),
        Ok(TypedValue::Bitmask {
            members: vec![],
            bits: 0
        })
    );
    assert!(matches!(
        coerce(field, "MON,FUNDAY"),
        Err(CoercionError::UnknownSymbol { raw, .. }) if raw == "FUNDAY"
    ));
}

#[test]
fn booleans_times_and_addresses() {
    let catalog = catalog();
    let osd = &catalog.lookup("osd").unwrap().fields[0];
    assert_eq!(coerce(osd, "true"), Ok(TypedValue::Boolean(true)));
    assert_eq!(coerce(osd, "0"), Ok(TypedValue::Boolean(false)));
    assert!(matches!(
        coerce(osd, "maybe"),
        Err(CoercionError::InvalidBoolean { .. })
    ));

    let weekly = catalog.lookup("weekly_restart").unwrap();
    assert_eq!(
        coerce(&weekly.fields[1], "23:59"),
        Ok(TypedValue::Time {
            hour: 23,
            minute: 59
        })
    );
    assert!(matches!(
        coerce(&weekly.fields[1], "24:00"),
        Err(CoercionError::BadTimeFormat { .. })
    ));

    let net = catalog.lookup("network_configuration").unwrap();
    assert_eq!(
        coerce(&net.fields[0], "192.168.1.10"),
        Ok(TypedValue::IpAddress("192.168.1.10".parse::<IpAddr>().unwrap()))
    );
    assert!(coerce(&net.fields[0], "fe80::1").is_ok());
    assert!(matches!(
        coerce(&net.fields[0], "192.168.1"),
        Err(CoercionError::BadIpFormat { .. })
    ));
}

#[test]
fn composite_xy_checks_each_axis() {
    let catalog = catalog();
    let field = &catalog.lookup("video_wall_model").unwrap().fields[0];
    assert_eq!(coerce(field, "2, 3"), Ok(TypedValue::Xy { x: 2, y: 3 }));
    assert!(matches!(
        coerce(field, "2,16"),
        Err(CoercionError::OutOfRange { value: 16, .. })
    ));
    assert!(matches!(
        coerce(field, "2"),
        Err(CoercionError::NotANumber { .. })
    ));
}

#[test]
fn strings_pass_through() {
    let catalog = catalog();
    let ticker = catalog.lookup("ticker").unwrap();
    let message = ticker.field("MESSAGE").unwrap();
    assert_eq!(
        coerce(message, " hello, world "),
        Ok(TypedValue::TextCoded(" hello, world ".into()))
    );
}

#[test]
fn arity_is_checked() {
    let catalog = catalog();
    let net = catalog.lookup("network_configuration").unwrap();
    assert_eq!(
        coerce_arguments(net, &["10.0.0.2"]),
        Err(CoercionError::ArityMismatch {
            command: "network_configuration".into(),
            expected: 4,
            got: 1
        })
    );
    let clear = catalog.lookup("clear_menu").unwrap();
    assert_eq!(coerce_arguments::<&str>(clear, &[]), Ok(vec![]));

    let args = coerce_arguments(net, &["10.0.0.2", "255.255.255.0", "10.0.0.1", "8.8.8.8"]).unwrap();
    assert_eq!(args.len(), 4);
}

#[test]
fn manual_text_wins_over_picker() {
    let catalog = catalog();
    let mute = catalog.lookup("mute").unwrap();
    assert_eq!(
        coerce_selection(mute, Some("OFF"), " on "),
        Ok(Arguments::Typed(vec![TypedValue::Symbol {
            name: "ON".into(),
            code: 1
        }]))
    );
    assert_eq!(
        coerce_selection(mute, Some("OFF"), "  "),
        Ok(Arguments::Typed(vec![TypedValue::Symbol {
            name: "OFF".into(),
            code: 0
        }]))
    );
    assert!(matches!(
        coerce_selection(mute, None, ""),
        Err(CoercionError::ArityMismatch { got: 0, .. })
    ));
}

#[test]
fn manual_text_keeps_commas_inside_values() {
    let catalog = catalog();
    let wall = catalog.lookup("video_wall_model").unwrap();
    assert_eq!(
        coerce_selection(wall, None, "2,3 5"),
        Ok(Arguments::Typed(vec![
            TypedValue::Xy { x: 2, y: 3 },
            TypedValue::Integer(5)
        ]))
    );

    let weekly = catalog.lookup("weekly_restart").unwrap();
    assert_eq!(
        coerce_selection(weekly, None, " MON,WED  03:30 "),
        Ok(Arguments::Typed(vec![
            TypedValue::Bitmask {
                members: vec!["MON".into(), "WED".into()],
                bits: 0x05
            },
            TypedValue::Time {
                hour: 3,
                minute: 30
            }
        ]))
    );
}

#[test]
fn manual_text_quotes_group_spaces() {
    let catalog = catalog();
    let ticker = catalog.lookup("ticker").unwrap();
    let manual = r#"ON "9:00 AM" "5:30 PM" CENTER TOP ON LEFT NORMAL STANDARD WHITE BLACK SOLID SOLID "Welcome, guests""#;
    let Ok(Arguments::Typed(values)) = coerce_selection(ticker, None, manual) else {
        panic!("ticker manual text should coerce");
    };
    assert_eq!(values.len(), ticker.fields.len());
    assert_eq!(
        values[1],
        TypedValue::Time12h {
            hour: 9,
            minute: 0,
            pm: false
        }
    );
    assert_eq!(
        values.last(),
        Some(&TypedValue::TextCoded("Welcome, guests".into()))
    );

    assert!(matches!(
        coerce_selection(ticker, None, r#"ON "9:00 AM"#),
        Err(CoercionError::UnbalancedQuotes { .. })
    ));
}

#[test]
fn raw_override_is_unchecked_write() {
    let args = Arguments::raw_override(" 0x21 , ,HDMI1");
    assert_eq!(
        args,
        Arguments::Unchecked(vec!["0x21".into(), "HDMI1".into()])
    );
    assert_eq!(args.operation(), Operation::Write);
    assert!(split_raw_override(",,").is_empty());
}
