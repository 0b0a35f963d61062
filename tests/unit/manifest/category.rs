use super::*;

#[test]
fn keys_round_trip_through_from_key() {
    for c in Category::ALL {
        assert_eq!(Category::from_key(c.as_str()), Some(c));
    }
    assert_eq!(Category::from_key("ghosts"), None);
    assert_eq!(Category::from_key("Pictures"), None);
}

#[test]
fn indices_are_dense_and_ordered() {
    for (i, c) in Category::ALL.iter().enumerate() {
        assert_eq!(c.index(), i);
    }
}

#[test]
fn display_and_parse_use_manifest_keys() {
    assert_eq!(Category::SvEnemies.to_string(), "sv_enemies");
    assert_eq!("battlebacks2".parse::<Category>().unwrap(), Category::Battlebacks2);
}

#[test]
fn folder_layout() {
    assert_eq!(Category::Titles1.folder(), "img/titles1/");
    assert_eq!(Category::SvActors.folder(), "img/sv_actors/");
}

#[test]
fn parse_unknown_is_manifest_error() {
    let err = "nope".parse::<Category>().unwrap_err();
    assert!(err.to_string().contains("unknown category"));
}
