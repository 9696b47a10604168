//! Territory adjacency graph.
//!
//! Adjacency comes from two sources: geometric intersection of territory
//! polygons, and a hand-maintained link table for territories whose real
//! neighbours do not share a polygon edge (islands, enclaves, straits). The
//! link table lists edges one way per entry; the graph stores the symmetric
//! closure with self-loops dropped, so `a` neighbours `b` exactly when `b`
//! neighbours `a`.
//!
//! Neighbour lists are sorted `TerritoryId` vectors, giving ordered iteration
//! and `O(log n)` membership.

use std::collections::HashMap;

use tracing::debug;

use super::territory::TerritoryId;
use super::world::WorldData;
use crate::error::GameError;

/// A manual link table: each entry links a territory to the listed names.
pub type LinkTable<'a> = [(&'a str, &'a [&'a str])];

/// Links for the world map that polygon intersection misses.
///
/// Only valid against the full world dataset: every name must be present or
/// graph construction fails.
pub static DEFAULT_LINKS: &LinkTable<'static> = &[
    ("United States of America", &["Canada", "Mexico"]),
    ("Canada", &["United States of America"]),
    ("Mexico", &["United States of America", "Belize", "Guatemala"]),
    ("Belize", &["Mexico", "Guatemala"]),
    ("Guatemala", &["Mexico", "Belize", "Honduras", "El Salvador"]),
    ("Honduras", &["Guatemala", "El Salvador", "Nicaragua"]),
    ("El Salvador", &["Guatemala", "Honduras"]),
    ("Nicaragua", &["Honduras", "Costa Rica"]),
    ("Costa Rica", &["Nicaragua", "Panama"]),
    ("Panama", &["Costa Rica"]),
    ("Cuba", &["Haiti", "Jamaica", "The Bahamas"]),
    ("Haiti", &["Dominican Republic", "Cuba"]),
    ("Dominican Republic", &["Haiti"]),
    ("Jamaica", &["Cuba"]),
    ("The Bahamas", &["Cuba"]),
    ("Puerto Rico", &["Dominican Republic", "US Virgin Islands"]),
    ("US Virgin Islands", &["Puerto Rico", "British Virgin Islands"]),
    ("British Virgin Islands", &["US Virgin Islands", "Anguilla"]),
    ("Anguilla", &["British Virgin Islands", "Saint Martin"]),
    ("Saint Martin", &["Sint Maarten", "Anguilla", "Saint Barthelemy"]),
    ("Sint Maarten", &["Saint Martin"]),
    ("Saint Barthelemy", &["Saint Martin"]),
    ("Antigua and Barbuda", &["Saint Kitts and Nevis", "Montserrat"]),
    ("Montserrat", &["Antigua and Barbuda"]),
    ("Saint Kitts and Nevis", &["Antigua and Barbuda"]),
    ("Dominica", &["Guadeloupe", "Martinique"]),
    ("Saint Lucia", &["Martinique", "Saint Vincent and the Grenadines"]),
    ("Saint Vincent and the Grenadines", &["Saint Lucia", "Barbados"]),
    ("Barbados", &["Saint Vincent and the Grenadines"]),
    ("Grenada", &["Trinidad and Tobago"]),
    ("Trinidad and Tobago", &["Grenada"]),
    ("Aruba", &["Curaçao"]),
    ("Curaçao", &["Aruba"]),
    ("Greenland", &["Canada"]),
    ("Cayman Islands", &["Jamaica"]),
    ("Turks and Caicos Islands", &["The Bahamas"]),
    ("Saint Pierre and Miquelon", &["Canada"]),
];

/// Symmetric adjacency over the territories of one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerritoryGraph {
    names: Vec<String>,
    index: HashMap<String, TerritoryId>,
    neighbors: Vec<Vec<TerritoryId>>,
}

impl TerritoryGraph {
    /// Builds the graph from world geometry plus a manual link table.
    pub fn build(world: &WorldData, links: &LinkTable<'_>) -> Result<Self, GameError> {
        let names = world.names().to_vec();
        let index = name_index(&names)?;
        let geometric = world.touching_pairs();
        let manual = resolve_links(&index, links)?;
        debug!(
            territories = names.len(),
            geometric = geometric.len(),
            manual = manual.len(),
            "building territory graph"
        );
        Ok(Self::assemble(names, index, geometric.into_iter().chain(manual)))
    }

    /// Builds the graph from names and undirected edges, without geometry.
    pub fn from_edges<S: AsRef<str>>(names: &[S], edges: &[(&str, &str)]) -> Result<Self, GameError> {
        if names.is_empty() {
            return Err(GameError::DataIntegrity("graph has no territories".into()));
        }
        if names.len() > usize::from(u16::MAX) {
            return Err(GameError::DataIntegrity(format!(
                "graph has {} territories, at most {} are supported",
                names.len(),
                u16::MAX
            )));
        }
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(GameError::DataIntegrity("territory with a blank name".into()));
        }
        let index = name_index(&names)?;
        let mut pairs = Vec::with_capacity(edges.len());
        for &(a, b) in edges {
            pairs.push((lookup_link(&index, a)?, lookup_link(&index, b)?));
        }
        Ok(Self::assemble(names, index, pairs.into_iter()))
    }

    fn assemble(
        names: Vec<String>,
        index: HashMap<String, TerritoryId>,
        pairs: impl Iterator<Item = (usize, usize)>,
    ) -> Self {
        let mut neighbors: Vec<Vec<TerritoryId>> = vec![Vec::new(); names.len()];
        for (a, b) in pairs {
            if a == b {
                continue;
            }
            neighbors[a].push(TerritoryId(b as u16));
            neighbors[b].push(TerritoryId(a as u16));
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        TerritoryGraph {
            names,
            index,
            neighbors,
        }
    }

    /// Neighbours of a territory, sorted by id.
    pub fn neighbors(&self, id: TerritoryId) -> Result<&[TerritoryId], GameError> {
        self.neighbors
            .get(id.index())
            .map(Vec::as_slice)
            .ok_or_else(|| GameError::UnknownTerritory(id.to_string()))
    }

    /// Returns true if both territories exist and are adjacent.
    pub fn is_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.neighbors
            .get(a.index())
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Looks up a territory by name.
    pub fn id_of(&self, name: &str) -> Result<TerritoryId, GameError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GameError::UnknownTerritory(name.to_string()))
    }

    /// Name of a territory.
    pub fn name(&self, id: TerritoryId) -> Result<&str, GameError> {
        self.names
            .get(id.index())
            .map(String::as_str)
            .ok_or_else(|| GameError::UnknownTerritory(id.to_string()))
    }

    pub fn contains(&self, id: TerritoryId) -> bool {
        id.index() < self.names.len()
    }

    /// Number of territories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All territory ids in order.
    pub fn ids(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        (0..self.names.len()).map(|i| TerritoryId(i as u16))
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }
}

fn name_index(names: &[String]) -> Result<HashMap<String, TerritoryId>, GameError> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.clone(), TerritoryId(i as u16)).is_some() {
            return Err(GameError::DataIntegrity(format!(
                "duplicate territory '{}'",
                name
            )));
        }
    }
    Ok(index)
}

fn lookup_link(index: &HashMap<String, TerritoryId>, name: &str) -> Result<usize, GameError> {
    index.get(name).map(|id| id.index()).ok_or_else(|| {
        GameError::DataIntegrity(format!("link references unknown territory '{}'", name))
    })
}

fn resolve_links(
    index: &HashMap<String, TerritoryId>,
    links: &LinkTable<'_>,
) -> Result<Vec<(usize, usize)>, GameError> {
    let mut pairs = Vec::new();
    for &(from, targets) in links {
        let a = lookup_link(index, from)?;
        for &to in targets {
            pairs.push((a, lookup_link(index, to)?));
        }
    }
    Ok(pairs)
}
