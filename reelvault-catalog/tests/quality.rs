use reelvault_catalog::quality::*;

#[test]
fn blob_is_compact_and_quality_first() {
    let blob = QualityModel::new(Quality::BLURAY_1080P).to_blob().unwrap();
    assert_eq!(blob, r#"{"quality":7,"revision":{"version":1,"real":0}}"#);
}

#[test]
fn serialized_blob_contains_its_fragment() {
    for quality in Quality::ALL {
        let blob = QualityModel::new(*quality).with_revision(2, 1).to_blob().unwrap();
        assert!(
            blob_has_quality(&blob, quality.id),
            "blob {} should carry fragment for {}",
            blob,
            quality.id
        );
    }
}

#[test]
fn fragment_does_not_match_longer_ids() {
    let blob = QualityModel::new(Quality::REMUX_1080P).to_blob().unwrap();
    assert!(blob_has_quality(&blob, 30));
    assert!(!blob_has_quality(&blob, 3));
    assert!(!blob_has_quality(&blob, 0));
}

#[test]
fn fragment_format() {
    assert_eq!(quality_fragment(4), r#""quality":4,"#);
}

#[test]
fn from_blob_tolerates_whitespace_and_missing_revision() {
    let parsed = QualityModel::from_blob("{ \"quality\": 4 }").unwrap();
    assert_eq!(parsed.quality, 4);
    assert_eq!(parsed.revision, Revision::default());
}

#[test]
fn from_blob_rejects_garbage() {
    let err = QualityModel::from_blob("not json").unwrap_err();
    assert_eq!(err.blob, "not json");
}

#[test]
fn quality_lookup() {
    assert_eq!(Quality::find(19), Some(Quality::BLURAY_2160P));
    assert_eq!(Quality::find(999), None);
    assert_eq!(Quality::name_of(999), "Unknown");
    assert_eq!(QualityModel::new(Quality::DVD).name(), "DVD");
}
