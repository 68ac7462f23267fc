use digit_mlp::persist::{self, SAVE_EXTENSION};
use digit_mlp::{ActivationFunction, Error, Network, SaveDir};

fn net(seed: u64) -> Network {
    Network::new_with_seed(
        &[4, 3, 2],
        &[ActivationFunction::LeakyReLU, ActivationFunction::Sigmoid],
        seed,
    )
    .unwrap()
}

#[test]
fn save_load_list_delete() {
    let dir = tempfile::tempdir().unwrap();
    let saves = SaveDir::open(dir.path()).unwrap();
    assert!(saves.names().unwrap().is_empty());

    let a = net(1);
    let b = net(2);
    let path_a = saves.save(&a, "alpha").unwrap();
    let path_b = saves.save(&b, "beta").unwrap();
    assert_eq!(path_a, dir.path().join(format!("0.{SAVE_EXTENSION}")));
    assert_eq!(path_b, dir.path().join(format!("1.{SAVE_EXTENSION}")));
    assert_eq!(saves.names().unwrap(), vec!["alpha", "beta"]);

    let loaded = saves.load("beta").unwrap();
    assert_eq!(loaded, b);
    assert_eq!(loaded.name(), Some("beta"));
    assert_eq!(loaded.activation_functions(), b.activation_functions());

    assert!(saves.delete("alpha").unwrap());
    assert!(!saves.delete("alpha").unwrap());
    assert_eq!(saves.names().unwrap(), vec!["beta"]);

    // The freed slot is reused.
    assert_eq!(saves.save(&a, "gamma").unwrap(), path_a);
}

#[test]
fn saving_an_existing_name_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let saves = SaveDir::open(dir.path()).unwrap();

    let first = saves.save(&net(1), "model").unwrap();
    let second = saves.save(&net(5), "model").unwrap();
    assert_eq!(first, second);
    assert_eq!(saves.names().unwrap(), vec!["model"]);
    assert_eq!(saves.load("model").unwrap(), net(5));
}

#[test]
fn unknown_and_invalid_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let saves = SaveDir::open(dir.path().join("nested")).unwrap();
    assert!(saves.root().is_dir());

    assert!(matches!(saves.load("missing"), Err(Error::InvalidConfig(_))));
    assert!(matches!(
        saves.save(&net(0), "bad name"),
        Err(Error::InvalidConfig(_))
    ));
    assert!(saves.names().unwrap().is_empty());
}

#[test]
fn other_files_are_ignored_and_corrupt_saves_surface() {
    let dir = tempfile::tempdir().unwrap();
    let saves = SaveDir::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a network").unwrap();
    saves.save(&net(3), "kept").unwrap();
    assert_eq!(saves.names().unwrap(), vec!["kept"]);

    std::fs::write(dir.path().join(format!("7.{SAVE_EXTENSION}")), [0, 0]).unwrap();
    assert!(matches!(saves.names(), Err(Error::InvalidData(_))));
}

#[test]
fn standalone_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.sb");
    let original = net(11);

    persist::save(&original, "single", &path).unwrap();
    let loaded = persist::load(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.name(), Some("single"));
}
