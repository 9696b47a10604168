//! World data loading and graph construction from files.

use std::collections::BTreeSet;
use std::io::Write;

use conquest::board::LinkTable;
use conquest::{GameError, TerritoryGraph, TerritoryId, WorldData, DEFAULT_LINKS};

/// Every territory name mentioned by the default link table.
fn linked_names() -> BTreeSet<&'static str> {
    let mut names = BTreeSet::new();
    for &(from, targets) in DEFAULT_LINKS.iter() {
        names.insert(from);
        names.extend(targets.iter().copied());
    }
    names
}

/// JSON world with one isolated unit square per name.
fn scattered_world_json(names: &[&str]) -> String {
    let entries: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let x = -170.0 + (i % 30) as f64 * 10.0;
            let y = -80.0 + (i / 30) as f64 * 10.0;
            format!(
                "{:?}: [[{x}, {y}], [{x1}, {y}], [{x1}, {y1}], [{x}, {y1}]]",
                name,
                x = x,
                y = y,
                x1 = x + 1.0,
                y1 = y + 1.0
            )
        })
        .collect();
    format!("{{{}}}", entries.join(",\n"))
}

#[test]
fn default_links_resolve_against_a_complete_world() {
    let names: Vec<&str> = linked_names().into_iter().collect();
    let world = WorldData::from_json_str(&scattered_world_json(&names)).unwrap();
    let graph = TerritoryGraph::build(&world, DEFAULT_LINKS).unwrap();
    assert_eq!(graph.len(), names.len());

    // Squares are far apart, so every edge comes from the link table.
    for &(from, targets) in DEFAULT_LINKS.iter() {
        let a = graph.id_of(from).unwrap();
        for &to in targets {
            let b = graph.id_of(to).unwrap();
            assert!(graph.is_adjacent(a, b), "{} -> {}", from, to);
            assert!(graph.is_adjacent(b, a), "{} <- {}", from, to);
        }
    }
    for a in graph.ids() {
        for &b in graph.neighbors(a).unwrap() {
            assert_ne!(a, b);
            assert!(graph.is_adjacent(b, a));
        }
    }

    let cuba = graph.id_of("Cuba").unwrap();
    let bahamas = graph.id_of("The Bahamas").unwrap();
    let turks = graph.id_of("Turks and Caicos Islands").unwrap();
    assert!(graph.is_adjacent(bahamas, turks));
    assert!(graph.is_adjacent(cuba, bahamas));
}

#[test]
fn loads_world_from_file() {
    let json = r#"{
        "Lakeland": [[0, 0], [4, 0], [4, 4], [0, 4]],
        "Highland": [[4, 0], [8, 0], [8, 4], [4, 4]],
        "Archipelago": [[[20, 20], [21, 20], [21, 21]], [[23, 20], [24, 20], [24, 21]]]
    }"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();

    let world = WorldData::from_path(file.path()).unwrap();
    assert_eq!(world.names(), ["Archipelago", "Highland", "Lakeland"]);

    let links: &LinkTable<'_> = &[("Archipelago", &["Highland"])];
    let graph = TerritoryGraph::build(&world, links).unwrap();
    let [archipelago, highland, lakeland] = [0u16, 1, 2].map(TerritoryId);
    assert_eq!(graph.neighbors(highland).unwrap(), [archipelago, lakeland]);
    assert_eq!(graph.neighbors(lakeland).unwrap(), [highland]);
    assert_eq!(graph.edge_count(), 2);

    assert_eq!(world.territory_at(2.0, 2.0), Some(lakeland));
    assert_eq!(world.territory_at(23.7, 20.2), Some(archipelago));
    assert_eq!(world.territory_at(50.0, 50.0), None);
}

#[test]
fn reader_and_string_loading_agree() {
    let json = r#"{ "Solo": [[0, 0], [1, 0], [1, 1]], "Duo": [[5, 5], [6, 5], [6, 6]] }"#;
    let from_str = WorldData::from_json_str(json).unwrap();
    let from_reader = WorldData::from_reader(json.as_bytes()).unwrap();
    assert_eq!(from_str.names(), from_reader.names());
    assert_eq!(
        from_str.shape(TerritoryId(1)),
        from_reader.shape(TerritoryId(1))
    );
}

#[test]
fn missing_file_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = WorldData::from_path(&dir.path().join("world.json")).unwrap_err();
    assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("world.json")));
}

#[test]
fn malformed_documents_are_rejected() {
    let cases = [
        "[]",
        "{}",
        r#"{ "Nowhere": [] }"#,
        r#"{ "Bad": "not a ring" }"#,
        r#"{ "Flat": [[0, 0], [1, 1]] }"#,
        r#"{ "": [[0, 0], [1, 0], [1, 1]] }"#,
        r#"{ "Polar": [[0, 0], [1, 95], [1, 1]] }"#,
    ];
    for json in cases {
        let err = WorldData::from_json_str(json).unwrap_err();
        assert!(err.is_fatal(), "accepted {}", json);
    }
}
