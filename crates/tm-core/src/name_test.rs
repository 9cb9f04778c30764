use super::*;

#[test]
fn construct_keeps_label_as_suffix() {
    let name = MigrationName::construct("create_users").unwrap();
    assert_eq!(name.label(), "create_users");
    assert!(name.as_str().ends_with("_create_users"));
    assert_eq!(name.as_str().len(), 14 + 1 + "create_users".len());
}

#[test]
fn construct_is_unique_and_sortable() {
    let names: Vec<MigrationName> = (0..5)
        .map(|_| MigrationName::construct("same").unwrap())
        .collect();

    for pair in names.windows(2) {
        assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        assert!(pair[0].timestamp() < pair[1].timestamp());
    }
}

#[test]
fn construct_prefix_is_not_older_than_now() {
    let before = Utc::now().naive_utc() - chrono::Duration::seconds(1);
    let name = MigrationName::construct("later").unwrap();
    assert!(name.timestamp() >= before);
}

#[test]
fn construct_rejects_empty_label() {
    let err = MigrationName::construct("").unwrap_err();
    assert!(matches!(err, CoreError::InvalidLabel { .. }));
    assert!(err.to_string().contains("cannot be empty"));
}

#[test]
fn construct_rejects_bad_characters() {
    for label in ["has space", "dash-ed", "dot.ted", "slash/ed", "ünï"] {
        assert!(
            MigrationName::construct(label).is_err(),
            "label {label:?} should be rejected"
        );
    }
}

#[test]
fn parse_accepts_well_formed_names() {
    let name = MigrationName::parse("20240102030405_add_orders").unwrap();
    assert_eq!(name.label(), "add_orders");
    assert_eq!(
        name.timestamp(),
        NaiveDateTime::parse_from_str("20240102030405", STAMP_FORMAT).unwrap()
    );
    assert_eq!(name.module_ident(), "m20240102030405_add_orders");
}

#[test]
fn parse_keeps_underscores_in_label() {
    let name = MigrationName::parse("20240102030405_add_orders_index").unwrap();
    assert_eq!(name.label(), "add_orders_index");
}

#[test]
fn parse_rejects_malformed_names() {
    for raw in [
        "",
        "create_users",
        "2024010203040_short",
        "20240102030405",
        "20240102030405_",
        "20241302030405_bad_month",
        "x20240102030405_prefix",
    ] {
        assert!(MigrationName::parse(raw).is_err(), "{raw:?} should not parse");
    }
}

#[test]
fn deserialize_validates() {
    let ok: MigrationName = serde_json::from_str("\"20240102030405_a\"").unwrap();
    assert_eq!(ok, "20240102030405_a");
    assert!(serde_json::from_str::<MigrationName>("\"nope\"").is_err());
}

#[test]
fn parse_rejects_non_ascii_digit_stamps() {
    for raw in ["००००००००००००००_x", "２０２４０１０２０３０４０５_x"] {
        assert!(
            matches!(MigrationName::parse(raw), Err(CoreError::InvalidName { .. })),
            "{raw:?} should not parse"
        );
    }
}
