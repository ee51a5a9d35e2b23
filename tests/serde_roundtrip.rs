use normcore::maths::perm::Perm4;
use normcore::surfaces::{NormalAlg, NormalCoords, NormalEncoding, NormalList};

#[test]
fn permutations_travel_as_image_strings() {
    let p = Perm4::from_images([0, 2, 3, 1]).unwrap();
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "\"0231\"");
    let back: Perm4 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
    assert!(serde_json::from_str::<Perm4>("\"0011\"").is_err());
    assert!(serde_json::from_str::<Perm4>("\"012\"").is_err());
}

#[test]
fn enumeration_settings_round_trip() {
    for coords in [NormalCoords::Standard, NormalCoords::QuadOct, NormalCoords::EdgeWeight] {
        let json = serde_json::to_string(&coords).unwrap();
        assert_eq!(serde_json::from_str::<NormalCoords>(&json).unwrap(), coords);
    }
    let enc = NormalEncoding::new(NormalCoords::AlmostNormal).unwrap();
    let back: NormalEncoding = serde_json::from_str(&serde_json::to_string(&enc).unwrap()).unwrap();
    assert_eq!(back, enc);

    let list = NormalList::FUNDAMENTAL | NormalList::EMBEDDED_ONLY;
    let back: NormalList = serde_json::from_str(&serde_json::to_string(&list).unwrap()).unwrap();
    assert_eq!(back, list);
    let alg: NormalAlg = serde_json::from_str(&serde_json::to_string(&NormalAlg::QuadToStandard).unwrap()).unwrap();
    assert_eq!(alg, NormalAlg::QuadToStandard);
}
